//! Builder for configuring [`MokaStore`].

use std::time::{Duration, Instant};

use moka::Expiry;
use moka::future::{Cache, CacheBuilder};
use moka::policy::EvictionPolicy;
use subcache_core::StoreLabel;

use crate::store::{MokaStore, StoredBlob};

/// Approximate per-entry overhead, in bytes, added to the key and value
/// lengths by the byte weigher.
const ENTRY_OVERHEAD: usize = 64;

/// Longest expiry handed to moka; longer TTLs are clamped.
pub(crate) const MAX_TTL: Duration = Duration::from_secs(100 * 365 * 24 * 60 * 60);

/// Expiration policy that reads the TTL recorded with each entry.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
struct Expiration;

impl Expiry<String, StoredBlob> for Expiration {
    fn expire_after_create(
        &self,
        _key: &String,
        value: &StoredBlob,
        _created_at: Instant,
    ) -> Option<Duration> {
        Some(value.ttl.min(MAX_TTL))
    }

    fn expire_after_update(
        &self,
        _key: &String,
        value: &StoredBlob,
        _updated_at: Instant,
        _duration_until_expiry: Option<Duration>,
    ) -> Option<Duration> {
        // Moka's default keeps the old deadline; a rewrite must restart the TTL.
        Some(value.ttl.min(MAX_TTL))
    }
}

/// Marker type: capacity has not been configured yet.
///
/// This is the initial state of a [`MokaStoreBuilder`]. You must call either
/// [`max_entries()`](MokaStoreBuilder::max_entries) or
/// [`max_bytes()`](MokaStoreBuilder::max_bytes) before calling `build()`.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoCapacity;

/// Marker type: entry-count capacity has been configured.
#[derive(Debug, Clone, Copy)]
pub struct EntryCapacity(pub(crate) u64);

/// Marker type: byte-based capacity has been configured.
#[derive(Debug, Clone, Copy)]
pub struct ByteCapacity(pub(crate) u64);

/// Builder for creating and configuring a [`MokaStore`].
///
/// Use [`MokaStore::builder`] to create a new builder instance.
///
/// # Capacity Configuration (Required)
///
/// Configure capacity using exactly one of:
/// - [`max_entries(n)`](Self::max_entries) - limit by entry count
/// - [`max_bytes(n)`](Self::max_bytes) - limit by approximate memory usage
///
/// `build()` is only available after setting capacity.
///
/// # Examples
///
/// ```
/// use subcache_moka::MokaStore;
///
/// let store = MokaStore::builder()
///     .label("subrequests")
///     .max_bytes(100 * 1024 * 1024)
///     .build();
/// ```
pub struct MokaStoreBuilder<Cap> {
    capacity: Cap,
    label: StoreLabel,
    eviction_policy: Option<EvictionPolicy>,
}

impl MokaStoreBuilder<NoCapacity> {
    /// Creates a new builder with no capacity configured.
    pub fn new() -> Self {
        Self {
            capacity: NoCapacity,
            label: StoreLabel::new_static("moka"),
            eviction_policy: None,
        }
    }

    /// Sets the maximum number of entries the store can hold.
    pub fn max_entries(self, capacity: u64) -> MokaStoreBuilder<EntryCapacity> {
        MokaStoreBuilder {
            capacity: EntryCapacity(capacity),
            label: self.label,
            eviction_policy: self.eviction_policy,
        }
    }

    /// Sets the maximum memory budget in bytes.
    ///
    /// The weight of an entry is its identity length plus its encoded
    /// envelope length plus a fixed overhead.
    pub fn max_bytes(self, bytes: u64) -> MokaStoreBuilder<ByteCapacity> {
        MokaStoreBuilder {
            capacity: ByteCapacity(bytes),
            label: self.label,
            eviction_policy: self.eviction_policy,
        }
    }
}

impl Default for MokaStoreBuilder<NoCapacity> {
    fn default() -> Self {
        Self::new()
    }
}

impl<Cap> MokaStoreBuilder<Cap> {
    /// Sets a custom label for this store.
    ///
    /// # Default
    ///
    /// `"moka"`
    pub fn label(mut self, label: impl Into<StoreLabel>) -> Self {
        self.label = label.into();
        self
    }

    /// Sets the eviction policy.
    ///
    /// # Default
    ///
    /// - entry-based capacity: [`EvictionPolicy::tiny_lfu()`]
    /// - byte-based capacity: [`EvictionPolicy::lru()`], since TinyLFU's
    ///   admission policy can reject new weighted entries outright
    pub fn eviction_policy(mut self, policy: EvictionPolicy) -> Self {
        self.eviction_policy = Some(policy);
        self
    }
}

impl MokaStoreBuilder<EntryCapacity> {
    /// Builds the [`MokaStore`] with entry-count based capacity.
    pub fn build(self) -> MokaStore {
        let policy = self
            .eviction_policy
            .unwrap_or_else(EvictionPolicy::tiny_lfu);
        let cache: Cache<String, StoredBlob> = CacheBuilder::new(self.capacity.0)
            .eviction_policy(policy)
            .expire_after(Expiration)
            .build();

        MokaStore {
            cache,
            label: self.label,
        }
    }
}

impl MokaStoreBuilder<ByteCapacity> {
    /// Builds the [`MokaStore`] with byte-based capacity.
    pub fn build(self) -> MokaStore {
        let policy = self.eviction_policy.unwrap_or_else(EvictionPolicy::lru);
        let cache: Cache<String, StoredBlob> = CacheBuilder::new(self.capacity.0)
            .weigher(byte_weigher)
            .eviction_policy(policy)
            .expire_after(Expiration)
            .build();

        MokaStore {
            cache,
            label: self.label,
        }
    }
}

/// Approximate byte cost of an entry.
pub(crate) fn byte_weigher(key: &String, value: &StoredBlob) -> u32 {
    (key.len() + value.raw.len() + ENTRY_OVERHEAD).min(u32::MAX as usize) as u32
}
