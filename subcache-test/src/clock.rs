//! Manually advanced clock.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use chrono::{DateTime, TimeDelta, Utc};
use subcache_core::Clock;

/// Clock that only moves when [`advance`](ManualClock::advance) is called.
///
/// Share one instance between the cache and a [`MockStore`](crate::MockStore)
/// so entry ages and store expiry move together.
#[derive(Debug)]
pub struct ManualClock {
    now: Mutex<DateTime<Utc>>,
}

impl ManualClock {
    /// Clock frozen at the current system time.
    pub fn new() -> Arc<Self> {
        Self::starting_at(Utc::now())
    }

    /// Clock frozen at `start`.
    pub fn starting_at(start: DateTime<Utc>) -> Arc<Self> {
        Arc::new(Self {
            now: Mutex::new(start),
        })
    }

    /// Moves the clock forward.
    pub fn advance(&self, by: Duration) {
        let delta = TimeDelta::from_std(by).expect("duration out of range");
        *self.now.lock().unwrap() += delta;
    }

    /// Moves the clock forward by whole seconds.
    pub fn advance_secs(&self, secs: u64) {
        self.advance(Duration::from_secs(secs));
    }
}

impl Clock for ManualClock {
    fn now(&self) -> DateTime<Utc> {
        *self.now.lock().unwrap()
    }
}
