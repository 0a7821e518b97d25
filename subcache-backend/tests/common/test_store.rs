//! Simple in-memory test store and clock.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, TimeDelta, Utc};
use dashmap::DashMap;
use subcache_backend::{DeleteStatus, Store, StoreError, StoreIdentity, StoreResult};
use subcache_core::{Clock, Raw};

/// Simple in-memory store for testing using DashMap.
///
/// Cheap to clone; clones share the same map.
#[derive(Clone, Default)]
pub struct TestStore {
    entries: Arc<DashMap<String, (Raw, Duration)>>,
}

#[allow(dead_code)]
impl TestStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn has(&self, identity: &str) -> bool {
        self.entries.contains_key(identity)
    }

    pub fn ttl(&self, identity: &str) -> Option<Duration> {
        self.entries.get(identity).map(|entry| entry.1)
    }

    pub fn raw(&self, identity: &str) -> Option<Raw> {
        self.entries.get(identity).map(|entry| entry.0.clone())
    }

    pub fn insert_raw(&self, identity: &str, raw: Raw) {
        self.entries
            .insert(identity.to_owned(), (raw, Duration::from_secs(60)));
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }
}

#[async_trait]
impl Store for TestStore {
    async fn lookup(&self, identity: &StoreIdentity) -> StoreResult<Option<Raw>> {
        Ok(self.entries.get(identity.url()).map(|entry| entry.0.clone()))
    }

    async fn put(&self, identity: &StoreIdentity, value: Raw, ttl: Duration) -> StoreResult<()> {
        self.entries.insert(identity.url().to_owned(), (value, ttl));
        Ok(())
    }

    async fn delete(&self, identity: &StoreIdentity) -> StoreResult<DeleteStatus> {
        Ok(match self.entries.remove(identity.url()) {
            Some(_) => DeleteStatus::Deleted(1),
            None => DeleteStatus::Missing,
        })
    }

    fn name(&self) -> &str {
        "test"
    }
}

/// Store whose every operation fails with a connection error.
#[allow(dead_code)]
#[derive(Clone, Copy, Default)]
pub struct BrokenStore;

#[async_trait]
impl Store for BrokenStore {
    async fn lookup(&self, _identity: &StoreIdentity) -> StoreResult<Option<Raw>> {
        Err(StoreError::connection(std::io::Error::other("lookup refused")))
    }

    async fn put(&self, _identity: &StoreIdentity, _value: Raw, _ttl: Duration) -> StoreResult<()> {
        Err(StoreError::connection(std::io::Error::other("put refused")))
    }

    async fn delete(&self, _identity: &StoreIdentity) -> StoreResult<DeleteStatus> {
        Err(StoreError::connection(std::io::Error::other("delete refused")))
    }
}

/// Clock that only moves when told to.
#[derive(Debug)]
pub struct TestClock {
    now: Mutex<DateTime<Utc>>,
}

#[allow(dead_code)]
impl TestClock {
    pub fn new() -> Arc<Self> {
        Arc::new(Self {
            now: Mutex::new(Utc::now()),
        })
    }

    pub fn advance(&self, by: Duration) {
        let delta = TimeDelta::from_std(by).unwrap();
        *self.now.lock().unwrap() += delta;
    }
}

impl Clock for TestClock {
    fn now(&self) -> DateTime<Utc> {
        *self.now.lock().unwrap()
    }
}
