use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, TimeDelta, Utc};
use dashmap::DashMap;
use subcache_backend::{DeleteStatus, Store, StoreIdentity, StoreResult};
use subcache_core::{Raw, SharedClock, SystemClock};

#[derive(Debug, Default)]
pub struct StoreCounters {
    pub lookup_count: AtomicUsize,
    pub lookup_hit_count: AtomicUsize,
    pub lookup_miss_count: AtomicUsize,
    pub put_count: AtomicUsize,
    pub delete_count: AtomicUsize,
}

impl StoreCounters {
    pub fn lookup_count(&self) -> usize {
        self.lookup_count.load(Ordering::SeqCst)
    }

    pub fn lookup_hit_count(&self) -> usize {
        self.lookup_hit_count.load(Ordering::SeqCst)
    }

    pub fn lookup_miss_count(&self) -> usize {
        self.lookup_miss_count.load(Ordering::SeqCst)
    }

    pub fn put_count(&self) -> usize {
        self.put_count.load(Ordering::SeqCst)
    }

    pub fn delete_count(&self) -> usize {
        self.delete_count.load(Ordering::SeqCst)
    }

    pub fn reset(&self) {
        self.lookup_count.store(0, Ordering::SeqCst);
        self.lookup_hit_count.store(0, Ordering::SeqCst);
        self.lookup_miss_count.store(0, Ordering::SeqCst);
        self.put_count.store(0, Ordering::SeqCst);
        self.delete_count.store(0, Ordering::SeqCst);
    }
}

/// A raw entry and when it stops being served.
#[derive(Debug, Clone)]
pub struct MockEntry {
    pub raw: Raw,
    pub ttl: Duration,
    pub expires_at: DateTime<Utc>,
}

/// In-memory store with operation counters and clock-driven expiry.
///
/// An entry written with TTL `t` at time `s` is served while `now < s + t`.
#[derive(Clone, Debug)]
pub struct MockStore {
    pub entries: Arc<DashMap<String, MockEntry>>,
    pub counters: Arc<StoreCounters>,
    clock: SharedClock,
}

impl Default for MockStore {
    fn default() -> Self {
        Self::new()
    }
}

impl MockStore {
    pub fn new() -> Self {
        Self::with_clock(Arc::new(SystemClock))
    }

    pub fn with_clock(clock: SharedClock) -> Self {
        Self {
            entries: Arc::new(DashMap::new()),
            counters: Arc::new(StoreCounters::default()),
            clock,
        }
    }

    pub fn lookup_count(&self) -> usize {
        self.counters.lookup_count()
    }

    pub fn lookup_hit_count(&self) -> usize {
        self.counters.lookup_hit_count()
    }

    pub fn lookup_miss_count(&self) -> usize {
        self.counters.lookup_miss_count()
    }

    pub fn put_count(&self) -> usize {
        self.counters.put_count()
    }

    pub fn delete_count(&self) -> usize {
        self.counters.delete_count()
    }

    pub fn reset_counters(&self) {
        self.counters.reset();
    }

    pub fn entry_count(&self) -> usize {
        self.entries.len()
    }

    /// TTL the entry at `url` was written with.
    pub fn ttl_of(&self, url: &str) -> Option<Duration> {
        self.entries.get(url).map(|entry| entry.ttl)
    }

    /// Raw bytes stored at `url`, expired or not.
    pub fn raw(&self, url: &str) -> Option<Raw> {
        self.entries.get(url).map(|entry| entry.raw.clone())
    }

    /// Replaces the raw bytes at `url`, keeping a one minute TTL.
    pub fn insert_raw(&self, url: &str, raw: Raw) {
        let ttl = Duration::from_secs(60);
        let expires_at = self.clock.now() + TimeDelta::seconds(60);
        self.entries.insert(
            url.to_owned(),
            MockEntry {
                raw,
                ttl,
                expires_at,
            },
        );
    }
}

#[async_trait]
impl Store for MockStore {
    async fn lookup(&self, identity: &StoreIdentity) -> StoreResult<Option<Raw>> {
        self.counters.lookup_count.fetch_add(1, Ordering::SeqCst);
        let now = self.clock.now();
        let result = self
            .entries
            .get(identity.url())
            .filter(|entry| now < entry.expires_at)
            .map(|entry| entry.raw.clone());
        if result.is_some() {
            self.counters.lookup_hit_count.fetch_add(1, Ordering::SeqCst);
        } else {
            self.counters.lookup_miss_count.fetch_add(1, Ordering::SeqCst);
        }
        Ok(result)
    }

    async fn put(&self, identity: &StoreIdentity, value: Raw, ttl: Duration) -> StoreResult<()> {
        self.counters.put_count.fetch_add(1, Ordering::SeqCst);
        let now = self.clock.now();
        let expires_at = TimeDelta::from_std(ttl)
            .ok()
            .and_then(|ttl| now.checked_add_signed(ttl))
            .unwrap_or(DateTime::<Utc>::MAX_UTC);
        self.entries.insert(
            identity.url().to_owned(),
            MockEntry {
                raw: value,
                ttl,
                expires_at,
            },
        );
        Ok(())
    }

    async fn delete(&self, identity: &StoreIdentity) -> StoreResult<DeleteStatus> {
        self.counters.delete_count.fetch_add(1, Ordering::SeqCst);
        match self.entries.remove(identity.url()) {
            Some(_) => Ok(DeleteStatus::Deleted(1)),
            None => Ok(DeleteStatus::Missing),
        }
    }

    fn name(&self) -> &str {
        "mock"
    }
}
