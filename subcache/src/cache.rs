//! Stale-while-revalidate orchestration.
//!
//! [`Cache::run_with_cache`] wraps one computation:
//!
//! | stored entry | returned value | background work |
//! |---|---|---|
//! | fresh | stored | none |
//! | stale | stored | one revalidation per key |
//! | missing | computed inline | write of the computed value |
//!
//! A no-store strategy or a cache without a store runs the computation and
//! touches nothing else.

use std::fmt::Display;
use std::future::Future;
use std::sync::Arc;
use std::time::Instant;

use serde::{Serialize, de::DeserializeOwned};
use subcache_backend::{
    CacheStore, DEFAULT_IDENTITY_BASE, DeleteStatus, Lookup, SealedEntry, Store, StoreError,
    StoredValue,
};
use subcache_core::{
    CacheContext, CacheKey, CacheStatus, CachingStrategy, Offload, ResponseSource, SharedClock,
    SystemClock,
};
use tracing::{debug, error, warn};

use crate::config::CacheSettings;
use crate::error::{CacheError, RevalidationError};
use crate::lock::{RevalidationLock, RevalidationPermit};
use crate::metrics;
use crate::offload::OffloadManager;

/// Task kind for background revalidations.
pub const REVALIDATE_TASK: &str = "revalidate";
/// Task kind for deferred store writes.
pub const CACHE_WRITE_TASK: &str = "cache_write";

/// Stale-while-revalidate cache for arbitrary async computations.
///
/// Cheap to clone; clones share the store, the offload sink and the
/// revalidation lock set.
#[derive(Clone, Debug)]
pub struct Cache<O = OffloadManager> {
    store: CacheStore,
    offload: O,
    lock: RevalidationLock,
}

impl Cache<OffloadManager> {
    /// Builder with the tokio offload manager and the system clock.
    pub fn builder() -> CacheBuilder<OffloadManager> {
        CacheBuilder::new()
    }

    /// Cache over `store` with default settings.
    pub fn new<S>(store: S) -> Self
    where
        S: Store + 'static,
    {
        Self::builder().store(store).build()
    }

    /// Cache without a store: every call runs its computation.
    pub fn disabled() -> Self {
        Self::builder().build()
    }
}

impl<O> Cache<O>
where
    O: Offload + 'static,
{
    /// The store adapter.
    pub fn store(&self) -> &CacheStore {
        &self.store
    }

    /// The deferred-execution sink.
    pub fn offload(&self) -> &O {
        &self.offload
    }

    /// The revalidation lock set.
    pub fn lock(&self) -> &RevalidationLock {
        &self.lock
    }

    /// Runs `compute` through the cache.
    ///
    /// `should_cache` decides whether a successful result is written. Errors
    /// from `compute` on a miss are returned unchanged and never cached;
    /// errors from a background revalidation are logged and leave the stale
    /// entry in place. Store failures never surface: the call degrades to
    /// running `compute` without caching.
    pub async fn run_with_cache<T, E, F, Fut, P>(
        &self,
        key: impl Into<CacheKey>,
        strategy: &CachingStrategy,
        should_cache: P,
        compute: F,
    ) -> Result<(T, CacheContext), E>
    where
        T: Serialize + DeserializeOwned + Send + 'static,
        E: Display + Send + 'static,
        F: FnOnce() -> Fut + Send + 'static,
        Fut: Future<Output = Result<T, E>> + Send + 'static,
        P: Fn(&T) -> bool + Send + Sync + 'static,
    {
        let start = Instant::now();
        let key = key.into();

        if strategy.is_no_store() || !self.store.is_enabled() {
            debug!(key = %key, no_store = strategy.is_no_store(), "cache bypassed");
            let value = compute().await?;
            let ctx = CacheContext::bypass();
            metrics::record_context_metrics(&ctx, start.elapsed());
            return Ok((value, ctx));
        }

        let lookup = match self.store.get::<T>(&key).await {
            Ok(lookup) => lookup,
            Err(StoreError::Format(err)) => {
                warn!(key = %key, error = %err, "stored entry could not be decoded, treating as miss");
                Lookup::Miss
            }
            Err(err) => {
                warn!(key = %key, error = %err, "store lookup failed, bypassing cache");
                metrics::record_store_error("lookup");
                let value = compute().await?;
                let ctx = CacheContext {
                    bypassed: true,
                    ..CacheContext::for_key(key.canonical())
                };
                metrics::record_context_metrics(&ctx, start.elapsed());
                return Ok((value, ctx));
            }
        };

        let (value, ctx) = match lookup {
            Lookup::Hit(stored) => self.serve(&key, stored, CacheStatus::Hit),
            Lookup::Stale(stored) => {
                let (value, mut ctx) = self.serve(&key, stored, CacheStatus::Stale);
                match self.lock.try_acquire(&key) {
                    Some(permit) => {
                        self.schedule_revalidation(
                            key.clone(),
                            strategy.clone(),
                            should_cache,
                            compute,
                            permit,
                        );
                        ctx.revalidation_scheduled = true;
                    }
                    None => {
                        debug!(key = %key, "revalidation already in flight");
                        metrics::record_revalidation_deduplicated();
                    }
                }
                (value, ctx)
            }
            Lookup::Miss => {
                debug!(key = %key, "cache miss");
                let value = compute().await?;
                let written = should_cache(&value) && self.schedule_write(&key, &value, strategy);
                let ctx = CacheContext {
                    cache_control: written.then(|| strategy.header()),
                    ..CacheContext::for_key(key.canonical())
                };
                (value, ctx)
            }
        };

        metrics::record_context_metrics(&ctx, start.elapsed());
        Ok((value, ctx))
    }

    fn serve<T>(
        &self,
        key: &CacheKey,
        stored: StoredValue<T>,
        status: CacheStatus,
    ) -> (T, CacheContext) {
        let source = self
            .store
            .label()
            .map(ResponseSource::Store)
            .unwrap_or_default();
        let ctx = CacheContext {
            status,
            source,
            age: Some(stored.age),
            cache_control: Some(stored.entry.real_cache_control.clone()),
            ..CacheContext::for_key(key.canonical())
        };
        (stored.into_value(), ctx)
    }

    /// Seals `value` and queues the store write. Returns whether a write was queued.
    fn schedule_write<T>(&self, key: &CacheKey, value: &T, strategy: &CachingStrategy) -> bool
    where
        T: Serialize,
    {
        match self.store.seal(key, value, strategy) {
            Ok(Some(sealed)) => {
                let store = self.store.clone();
                self.offload
                    .spawn(CACHE_WRITE_TASK, async move { write_sealed(&store, sealed).await });
                true
            }
            Ok(None) => false,
            Err(err) => {
                warn!(key = %key, error = %err, "value could not be encoded, not cached");
                metrics::record_store_error("encode");
                false
            }
        }
    }

    fn schedule_revalidation<T, E, F, Fut, P>(
        &self,
        key: CacheKey,
        strategy: CachingStrategy,
        should_cache: P,
        compute: F,
        permit: RevalidationPermit,
    ) where
        T: Serialize + Send + 'static,
        E: Display + Send + 'static,
        F: FnOnce() -> Fut + Send + 'static,
        Fut: Future<Output = Result<T, E>> + Send + 'static,
        P: Fn(&T) -> bool + Send + Sync + 'static,
    {
        let store = self.store.clone();
        metrics::record_revalidation_spawned();
        debug!(key = %key, "scheduling revalidation");
        self.offload.spawn(REVALIDATE_TASK, async move {
            // Held for the whole task; dropping it releases the key.
            let _permit = permit;
            let value = match compute().await {
                Ok(value) => value,
                Err(err) => {
                    let err = RevalidationError::new(key.canonical(), err);
                    error!(key = %err.key, "{err}");
                    metrics::record_revalidation_failed();
                    return;
                }
            };
            if !should_cache(&value) {
                debug!(key = %key, "revalidated value rejected by should_cache");
                return;
            }
            let sealed = store.seal(&key, &value, &strategy);
            match sealed {
                Ok(Some(sealed)) => write_sealed(&store, sealed).await,
                Ok(None) => {}
                Err(err) => {
                    warn!(key = %key, error = %err, "revalidated value could not be encoded");
                    metrics::record_store_error("encode");
                }
            }
        });
    }

    /// Reads the entry for `key` without computing anything.
    pub async fn get<T>(&self, key: &CacheKey) -> Result<Lookup<T>, CacheError>
    where
        T: DeserializeOwned,
    {
        Ok(self.store.get(key).await?)
    }

    /// Writes `value` under `key` for `strategy`, waiting for the store.
    pub async fn set<T>(
        &self,
        key: &CacheKey,
        value: &T,
        strategy: &CachingStrategy,
    ) -> Result<(), CacheError>
    where
        T: Serialize + ?Sized,
    {
        Ok(self.store.set(key, value, strategy).await?)
    }

    /// Removes the entry for `key`.
    pub async fn delete(&self, key: &CacheKey) -> Result<DeleteStatus, CacheError> {
        Ok(self.store.delete(key).await?)
    }
}

async fn write_sealed(store: &CacheStore, sealed: SealedEntry) {
    let identity = sealed.identity().clone();
    if let Err(err) = store.put_sealed(sealed).await {
        warn!(identity = %identity, error = %err, "store write failed");
        metrics::record_store_error("write");
    }
}

/// Builder for [`Cache`].
pub struct CacheBuilder<O> {
    store: Option<Arc<dyn Store>>,
    offload: O,
    clock: SharedClock,
    identity_base: Arc<str>,
}

impl CacheBuilder<OffloadManager> {
    /// Builder with no store, the tokio offload manager and the system clock.
    pub fn new() -> Self {
        Self {
            store: None,
            offload: OffloadManager::with_defaults(),
            clock: Arc::new(SystemClock),
            identity_base: Arc::from(DEFAULT_IDENTITY_BASE),
        }
    }

    /// Builder configured from `settings`.
    pub fn from_settings(settings: &CacheSettings) -> Self {
        Self::new()
            .offload(OffloadManager::new(settings.offload.clone()))
            .identity_base(settings.identity_base.as_str())
    }
}

impl Default for CacheBuilder<OffloadManager> {
    fn default() -> Self {
        Self::new()
    }
}

impl<O> CacheBuilder<O> {
    /// Store to cache into.
    pub fn store<S>(mut self, store: S) -> Self
    where
        S: Store + 'static,
    {
        let store: Arc<dyn Store> = Arc::new(store);
        self.store = Some(store);
        self
    }

    /// Already shared, possibly absent store.
    pub fn shared_store(mut self, store: Option<Arc<dyn Store>>) -> Self {
        self.store = store;
        self
    }

    /// Deferred-execution sink for revalidations and writes.
    pub fn offload<O2>(self, offload: O2) -> CacheBuilder<O2>
    where
        O2: Offload,
    {
        CacheBuilder {
            store: self.store,
            offload,
            clock: self.clock,
            identity_base: self.identity_base,
        }
    }

    /// Clock used for entry ages.
    pub fn clock(mut self, clock: SharedClock) -> Self {
        self.clock = clock;
        self
    }

    /// Base of synthetic store identities.
    pub fn identity_base(mut self, base: impl Into<Arc<str>>) -> Self {
        self.identity_base = base.into();
        self
    }

    /// Builds the cache.
    pub fn build(self) -> Cache<O> {
        Cache {
            store: CacheStore::from_shared(self.store)
                .with_clock(self.clock)
                .with_identity_base(self.identity_base),
            offload: self.offload,
            lock: RevalidationLock::new(),
        }
    }
}
