//! Moka store implementation.

use std::time::Duration;

use async_trait::async_trait;
use moka::future::Cache;
use subcache_backend::{DeleteStatus, Store, StoreIdentity, StoreResult};
use subcache_core::{Raw, StoreLabel};
use tracing::trace;

use crate::metrics;

/// A stored envelope together with the TTL it was written with.
#[derive(Clone, Debug)]
pub struct StoredBlob {
    /// Encoded envelope.
    pub raw: Raw,
    /// Physical TTL requested by the writer.
    pub ttl: Duration,
}

/// In-memory store powered by Moka.
///
/// `MokaStore` provides a concurrent in-memory store with per-entry
/// expiration: every entry lives exactly as long as the TTL passed to
/// [`Store::put`], measured from the write.
///
/// # Examples
///
/// ```
/// use subcache_moka::MokaStore;
///
/// let store = MokaStore::builder().max_entries(10_000).build();
/// ```
///
/// # Caveats
///
/// - Data is **not persisted**; the store is lost on process restart
/// - Data is **not shared** across processes
/// - Entries may be evicted before their TTL when capacity is exceeded
#[derive(Clone)]
pub struct MokaStore {
    /// The underlying Moka async cache, keyed by identity URL.
    pub cache: Cache<String, StoredBlob>,
    /// Label identifying this store in logs and metrics.
    pub label: StoreLabel,
}

impl std::fmt::Debug for MokaStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MokaStore")
            .field("label", &self.label)
            .field("cache", &self.cache)
            .finish()
    }
}

impl MokaStore {
    /// Creates a new builder for `MokaStore`.
    ///
    /// Capacity must be configured with
    /// [`max_entries`](crate::MokaStoreBuilder::max_entries) or
    /// [`max_bytes`](crate::MokaStoreBuilder::max_bytes) before building.
    pub fn builder() -> crate::builder::MokaStoreBuilder<crate::builder::NoCapacity> {
        crate::builder::MokaStoreBuilder::new()
    }

    /// The underlying Moka cache.
    pub fn cache(&self) -> &Cache<String, StoredBlob> {
        &self.cache
    }

    fn record_capacity(&self) {
        metrics::record_capacity(
            self.label.as_str(),
            self.cache.entry_count(),
            self.cache.weighted_size(),
        );
    }
}

#[async_trait]
impl Store for MokaStore {
    async fn lookup(&self, identity: &StoreIdentity) -> StoreResult<Option<Raw>> {
        Ok(self.cache.get(identity.url()).await.map(|blob| blob.raw))
    }

    async fn put(&self, identity: &StoreIdentity, value: Raw, ttl: Duration) -> StoreResult<()> {
        trace!(identity = %identity, ttl_ms = ttl.as_millis() as u64, "moka insert");
        self.cache
            .insert(identity.url().to_owned(), StoredBlob { raw: value, ttl })
            .await;
        self.record_capacity();
        Ok(())
    }

    async fn delete(&self, identity: &StoreIdentity) -> StoreResult<DeleteStatus> {
        let value = self.cache.remove(identity.url()).await;
        self.record_capacity();
        match value {
            Some(_) => Ok(DeleteStatus::Deleted(1)),
            None => Ok(DeleteStatus::Missing),
        }
    }

    fn name(&self) -> &str {
        self.label.as_str()
    }
}
