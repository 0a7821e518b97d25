//! Typed, clock-aware view over an optional [`Store`].
//!
//! [`CacheStore`] is the only place that decides what happens when no store
//! was configured: lookups miss and writes are dropped.

use std::sync::Arc;
use std::time::Duration;

use serde::{Serialize, de::DeserializeOwned};
use subcache_core::{
    CacheKey, CacheStatus, CachingStrategy, Raw, SharedClock, StoreLabel, SystemClock,
};
use tracing::{debug, trace};

use crate::entry::{CacheDebugInfo, CacheEntry};
use crate::format::JsonFormat;
use crate::identity::{DEFAULT_IDENTITY_BASE, StoreIdentity};
use crate::metrics::{self, Codec, Op, Timer};
use crate::store::{DeleteStatus, Store, StoreResult};

/// Physical TTL for entries written under `strategy`: the fresh window plus
/// twice the stale window. Missing fields count as zero; the sum saturates
/// at [`Duration::MAX`].
pub fn physical_ttl(strategy: &CachingStrategy) -> Duration {
    let max_age = strategy.max_age().unwrap_or(Duration::ZERO);
    let swr = strategy.stale_while_revalidate().unwrap_or(Duration::ZERO);
    max_age.saturating_add(swr.saturating_mul(2))
}

/// A decoded entry together with its age at read time.
#[derive(Debug, Clone, PartialEq)]
pub struct StoredValue<T> {
    /// The decoded envelope.
    pub entry: CacheEntry<T>,
    /// Time elapsed since the entry was written.
    pub age: Duration,
}

impl<T> StoredValue<T> {
    /// Consumes the stored value, returning the cached value.
    pub fn into_value(self) -> T {
        self.entry.value
    }
}

/// Outcome of a typed lookup.
#[derive(Debug, Clone, PartialEq)]
pub enum Lookup<T> {
    /// Nothing stored, or no store configured.
    Miss,
    /// Stored and within its fresh window.
    Hit(StoredValue<T>),
    /// Stored but past its fresh window.
    Stale(StoredValue<T>),
}

impl<T> Lookup<T> {
    /// The status this lookup maps to.
    pub fn status(&self) -> CacheStatus {
        match self {
            Lookup::Miss => CacheStatus::Miss,
            Lookup::Hit(_) => CacheStatus::Hit,
            Lookup::Stale(_) => CacheStatus::Stale,
        }
    }
}

/// An encoded entry, ready to be written.
///
/// Sealing happens synchronously so the value does not have to outlive the
/// call that produced it; the write itself can then be deferred.
#[derive(Debug, Clone)]
pub struct SealedEntry {
    identity: StoreIdentity,
    raw: Raw,
    ttl: Duration,
    cache_control: String,
}

impl SealedEntry {
    /// Identity the entry will be written under.
    pub fn identity(&self) -> &StoreIdentity {
        &self.identity
    }

    /// Physical TTL.
    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// `Cache-Control` recorded in the envelope.
    pub fn cache_control(&self) -> &str {
        &self.cache_control
    }

    /// Encoded envelope size in bytes.
    pub fn len(&self) -> usize {
        self.raw.len()
    }

    /// Whether the encoded envelope is empty.
    pub fn is_empty(&self) -> bool {
        self.raw.is_empty()
    }
}

/// Typed adapter over an optional store.
#[derive(Clone)]
pub struct CacheStore {
    store: Option<Arc<dyn Store>>,
    clock: SharedClock,
    identity_base: Arc<str>,
    format: JsonFormat,
}

impl std::fmt::Debug for CacheStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CacheStore")
            .field("store", &self.store.as_ref().map(|store| store.name()))
            .field("clock", &self.clock)
            .field("identity_base", &self.identity_base)
            .finish()
    }
}

impl CacheStore {
    /// Adapter over `store`.
    pub fn new<S>(store: S) -> Self
    where
        S: Store + 'static,
    {
        let store: Arc<dyn Store> = Arc::new(store);
        Self::from_shared(Some(store))
    }

    /// Adapter without a store: every call is a pass-through.
    pub fn disabled() -> Self {
        Self::from_shared(None)
    }

    /// Adapter over an already shared, possibly absent store.
    pub fn from_shared(store: Option<Arc<dyn Store>>) -> Self {
        Self {
            store,
            clock: Arc::new(SystemClock),
            identity_base: Arc::from(DEFAULT_IDENTITY_BASE),
            format: JsonFormat,
        }
    }

    /// Replaces the clock used for ages and write timestamps.
    pub fn with_clock(mut self, clock: SharedClock) -> Self {
        self.clock = clock;
        self
    }

    /// Replaces the base of synthetic store identities.
    pub fn with_identity_base(mut self, base: impl Into<Arc<str>>) -> Self {
        self.identity_base = base.into();
        self
    }

    /// Whether a store is configured.
    #[inline]
    pub fn is_enabled(&self) -> bool {
        self.store.is_some()
    }

    /// Label of the configured store.
    pub fn label(&self) -> Option<StoreLabel> {
        self.store.as_ref().map(|store| StoreLabel::new(store.name()))
    }

    /// The clock in use.
    pub fn clock(&self) -> &SharedClock {
        &self.clock
    }

    /// Identity `key` is filed under.
    pub fn identity(&self, key: &CacheKey) -> StoreIdentity {
        StoreIdentity::new(&self.identity_base, key)
    }

    /// Reads and classifies the entry for `key`.
    ///
    /// Store and decode errors are returned; the caller decides whether to
    /// degrade.
    pub async fn get<T>(&self, key: &CacheKey) -> StoreResult<Lookup<T>>
    where
        T: DeserializeOwned,
    {
        let Some(store) = &self.store else {
            return Ok(Lookup::Miss);
        };
        let name = store.name();
        let identity = self.identity(key);

        let timer = Timer::new();
        let raw = match store.lookup(&identity).await {
            Ok(raw) => raw,
            Err(error) => {
                metrics::record_call_error(name, Op::Lookup);
                return Err(error);
            }
        };
        metrics::record_call(name, Op::Lookup, timer.elapsed());

        let Some(raw) = raw else {
            trace!(key = %key, "store lookup returned nothing");
            return Ok(Lookup::Miss);
        };
        metrics::record_bytes(name, Op::Lookup, raw.len());

        let timer = Timer::new();
        let entry: CacheEntry<T> = self.format.decode(&raw)?;
        metrics::record_codec(name, Codec::Decode, timer.elapsed());

        let now = self.clock.now();
        let age = entry.age(now);
        let status = entry.status(now);
        debug!(
            key = %key,
            status = status.as_str(),
            age_ms = age.as_millis() as u64,
            cache_control = %entry.real_cache_control,
            "store lookup"
        );
        let stored = StoredValue { entry, age };
        Ok(match status {
            CacheStatus::Stale => Lookup::Stale(stored),
            _ => Lookup::Hit(stored),
        })
    }

    /// Encodes `value` for a later [`put_sealed`](Self::put_sealed).
    ///
    /// Returns `Ok(None)` when nothing should be written: no store, a
    /// no-store strategy, or a zero physical TTL.
    pub fn seal<T>(
        &self,
        key: &CacheKey,
        value: &T,
        strategy: &CachingStrategy,
    ) -> StoreResult<Option<SealedEntry>>
    where
        T: Serialize + ?Sized,
    {
        let Some(store) = &self.store else {
            return Ok(None);
        };
        if strategy.is_no_store() {
            return Ok(None);
        }
        let ttl = physical_ttl(strategy);
        if ttl.is_zero() {
            debug!(key = %key, "zero physical ttl, entry not written");
            return Ok(None);
        }

        let cache_control = strategy.header();
        let entry = CacheEntry::new(value, self.clock.now(), cache_control.clone())
            .with_debug_info(CacheDebugInfo {
                key: key.canonical().to_owned(),
                physical_ttl: ttl.as_secs(),
                name: key.display_name().map(str::to_owned),
            });

        let timer = Timer::new();
        let raw = self.format.encode(&entry)?;
        metrics::record_codec(store.name(), Codec::Encode, timer.elapsed());

        Ok(Some(SealedEntry {
            identity: self.identity(key),
            raw,
            ttl,
            cache_control,
        }))
    }

    /// Writes a sealed entry.
    pub async fn put_sealed(&self, sealed: SealedEntry) -> StoreResult<()> {
        let Some(store) = &self.store else {
            return Ok(());
        };
        let name = store.name();
        let bytes = sealed.raw.len();
        let timer = Timer::new();
        match store.put(&sealed.identity, sealed.raw, sealed.ttl).await {
            Ok(()) => {
                metrics::record_call(name, Op::Put, timer.elapsed());
                metrics::record_bytes(name, Op::Put, bytes);
                debug!(
                    identity = %sealed.identity,
                    ttl_secs = sealed.ttl.as_secs(),
                    "store write"
                );
                Ok(())
            }
            Err(error) => {
                metrics::record_call_error(name, Op::Put);
                Err(error)
            }
        }
    }

    /// Encodes and writes `value` under `key` for `strategy`.
    pub async fn set<T>(
        &self,
        key: &CacheKey,
        value: &T,
        strategy: &CachingStrategy,
    ) -> StoreResult<()>
    where
        T: Serialize + ?Sized,
    {
        match self.seal(key, value, strategy)? {
            Some(sealed) => self.put_sealed(sealed).await,
            None => Ok(()),
        }
    }

    /// Removes the entry for `key`.
    pub async fn delete(&self, key: &CacheKey) -> StoreResult<DeleteStatus> {
        let Some(store) = &self.store else {
            return Ok(DeleteStatus::Missing);
        };
        let name = store.name();
        let timer = Timer::new();
        match store.delete(&self.identity(key)).await {
            Ok(status) => {
                metrics::record_call(name, Op::Delete, timer.elapsed());
                debug!(key = %key, status = ?status, "store delete");
                Ok(status)
            }
            Err(error) => {
                metrics::record_call_error(name, Op::Delete);
                Err(error)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use subcache_core::StrategyOptions;

    #[test]
    fn physical_ttl_is_max_age_plus_twice_swr() {
        let short = CachingStrategy::short(StrategyOptions::default()).unwrap();
        assert_eq!(physical_ttl(&short), Duration::from_secs(19));

        let long = CachingStrategy::long(StrategyOptions::default()).unwrap();
        assert_eq!(physical_ttl(&long), Duration::from_secs(3600 + 2 * 82800));

        assert_eq!(physical_ttl(&CachingStrategy::no_store()), Duration::ZERO);
    }

    #[test]
    fn physical_ttl_saturates_instead_of_overflowing() {
        let huge_swr = CachingStrategy::custom(
            StrategyOptions::new()
                .max_age(Duration::from_secs(1))
                .stale_while_revalidate(Duration::from_secs(u64::MAX / 2 + 1)),
        );
        assert_eq!(physical_ttl(&huge_swr), Duration::MAX);

        let max_everything = CachingStrategy::custom(
            StrategyOptions::new()
                .max_age(Duration::MAX)
                .stale_while_revalidate(Duration::MAX),
        );
        assert_eq!(physical_ttl(&max_everything), Duration::MAX);
    }

    #[test]
    fn disabled_adapter_never_seals() {
        let store = CacheStore::disabled();
        let key = CacheKey::from("k");
        let sealed = store
            .seal(&key, &1u32, &CachingStrategy::default())
            .unwrap();
        assert!(sealed.is_none());
        assert!(!store.is_enabled());
        assert_eq!(store.label(), None);
    }
}
