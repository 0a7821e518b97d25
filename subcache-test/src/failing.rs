//! Store that fails on demand.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use subcache_backend::{DeleteStatus, Store, StoreError, StoreIdentity, StoreResult};
use subcache_core::Raw;

use crate::MockStore;

#[derive(Debug, Default)]
struct Failures {
    lookup: AtomicBool,
    put: AtomicBool,
    delete: AtomicBool,
    errors: AtomicUsize,
}

/// Wraps a [`MockStore`] and fails selected operations with a
/// connection error.
#[derive(Clone, Debug)]
pub struct FailingStore {
    inner: MockStore,
    failures: Arc<Failures>,
}

impl FailingStore {
    /// A store where every operation fails.
    pub fn new() -> Self {
        let store = Self::wrap(MockStore::new());
        store.fail_lookups(true).fail_puts(true).fail_deletes(true)
    }

    /// Wraps `inner`; nothing fails until configured.
    pub fn wrap(inner: MockStore) -> Self {
        Self {
            inner,
            failures: Arc::new(Failures::default()),
        }
    }

    pub fn fail_lookups(self, fail: bool) -> Self {
        self.failures.lookup.store(fail, Ordering::SeqCst);
        self
    }

    pub fn fail_puts(self, fail: bool) -> Self {
        self.failures.put.store(fail, Ordering::SeqCst);
        self
    }

    pub fn fail_deletes(self, fail: bool) -> Self {
        self.failures.delete.store(fail, Ordering::SeqCst);
        self
    }

    /// Number of operations that failed.
    pub fn error_count(&self) -> usize {
        self.failures.errors.load(Ordering::SeqCst)
    }

    /// The wrapped store.
    pub fn inner(&self) -> &MockStore {
        &self.inner
    }

    fn fail(&self, operation: &str) -> StoreError {
        self.failures.errors.fetch_add(1, Ordering::SeqCst);
        StoreError::connection(std::io::Error::new(
            std::io::ErrorKind::ConnectionRefused,
            format!("{operation} refused"),
        ))
    }
}

impl Default for FailingStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Store for FailingStore {
    async fn lookup(&self, identity: &StoreIdentity) -> StoreResult<Option<Raw>> {
        if self.failures.lookup.load(Ordering::SeqCst) {
            return Err(self.fail("lookup"));
        }
        self.inner.lookup(identity).await
    }

    async fn put(&self, identity: &StoreIdentity, value: Raw, ttl: Duration) -> StoreResult<()> {
        if self.failures.put.load(Ordering::SeqCst) {
            return Err(self.fail("put"));
        }
        self.inner.put(identity, value, ttl).await
    }

    async fn delete(&self, identity: &StoreIdentity) -> StoreResult<DeleteStatus> {
        if self.failures.delete.load(Ordering::SeqCst) {
            return Err(self.fail("delete"));
        }
        self.inner.delete(identity).await
    }

    fn name(&self) -> &str {
        "failing"
    }
}
