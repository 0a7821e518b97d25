//! Time source abstraction.
//!
//! Entry ages are computed against an injected [`Clock`] so tests can move
//! time forward deterministically instead of sleeping.

use std::fmt::Debug;
use std::sync::Arc;

use chrono::{DateTime, Utc};

/// Source of the current wall-clock time.
pub trait Clock: Send + Sync + Debug {
    /// Returns the current time.
    fn now(&self) -> DateTime<Utc>;
}

/// Production clock backed by the system time.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// Shared, type-erased clock.
pub type SharedClock = Arc<dyn Clock>;
