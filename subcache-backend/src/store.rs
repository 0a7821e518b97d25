use std::{sync::Arc, time::Duration};

use async_trait::async_trait;
use subcache_core::Raw;

use crate::{StoreError, StoreIdentity};

/// Result type for store operations.
pub type StoreResult<T> = Result<T, StoreError>;

/// Status of deleting result.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeleteStatus {
    /// Record successfully deleted.
    Deleted(u32),
    /// Record already missing.
    Missing,
}

/// A request-keyed byte store with per-entry expiry.
///
/// Implementations may evict entries early, but must not serve an entry after
/// the TTL it was written with has elapsed.
#[async_trait]
pub trait Store: Sync + Send {
    /// Returns the raw entry filed under `identity`, if any.
    async fn lookup(&self, identity: &StoreIdentity) -> StoreResult<Option<Raw>>;

    /// Files `value` under `identity`, replacing any previous entry.
    async fn put(&self, identity: &StoreIdentity, value: Raw, ttl: Duration) -> StoreResult<()>;

    /// Removes the entry filed under `identity`.
    async fn delete(&self, identity: &StoreIdentity) -> StoreResult<DeleteStatus>;

    /// Returns the name of this store, used in logs, metrics and
    /// [`ResponseSource`](subcache_core::ResponseSource).
    fn name(&self) -> &str {
        "store"
    }
}

#[async_trait]
impl Store for &dyn Store {
    async fn lookup(&self, identity: &StoreIdentity) -> StoreResult<Option<Raw>> {
        (*self).lookup(identity).await
    }

    async fn put(&self, identity: &StoreIdentity, value: Raw, ttl: Duration) -> StoreResult<()> {
        (*self).put(identity, value, ttl).await
    }

    async fn delete(&self, identity: &StoreIdentity) -> StoreResult<DeleteStatus> {
        (*self).delete(identity).await
    }

    fn name(&self) -> &str {
        (*self).name()
    }
}

#[async_trait]
impl Store for Box<dyn Store> {
    async fn lookup(&self, identity: &StoreIdentity) -> StoreResult<Option<Raw>> {
        (**self).lookup(identity).await
    }

    async fn put(&self, identity: &StoreIdentity, value: Raw, ttl: Duration) -> StoreResult<()> {
        (**self).put(identity, value, ttl).await
    }

    async fn delete(&self, identity: &StoreIdentity) -> StoreResult<DeleteStatus> {
        (**self).delete(identity).await
    }

    fn name(&self) -> &str {
        (**self).name()
    }
}

#[async_trait]
impl Store for Arc<dyn Store + Send + 'static> {
    async fn lookup(&self, identity: &StoreIdentity) -> StoreResult<Option<Raw>> {
        (**self).lookup(identity).await
    }

    async fn put(&self, identity: &StoreIdentity, value: Raw, ttl: Duration) -> StoreResult<()> {
        (**self).put(identity, value, ttl).await
    }

    async fn delete(&self, identity: &StoreIdentity) -> StoreResult<DeleteStatus> {
        (**self).delete(identity).await
    }

    fn name(&self) -> &str {
        (**self).name()
    }
}
