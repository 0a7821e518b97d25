//! Stale-while-revalidate caching for async sub-requests.
//!
//! Wrap any async computation in [`Cache::run_with_cache`]: fresh entries
//! are served from the store, stale entries are served immediately while a
//! single background task refreshes them, and misses compute inline and
//! write the result in the background.
//!
//! ```ignore
//! use subcache::{Cache, CacheKey, CachingStrategy, KeyPart, StrategyOptions};
//! use subcache_moka::MokaStore;
//!
//! let cache = Cache::new(MokaStore::builder().max_entries(10_000).build());
//! let strategy = CachingStrategy::short(StrategyOptions::default())?;
//! let key: CacheKey = ["products", "featured"].into_iter().map(KeyPart::from).collect();
//! let (products, ctx) = cache
//!     .run_with_cache(key, &strategy, |_| true, || async {
//!         fetch_products().await
//!     })
//!     .await?;
//! ```
#![warn(missing_docs)]
#![cfg_attr(docsrs, feature(doc_cfg))]

/// The orchestrator and its builder.
pub mod cache;

/// Deserializable instance settings.
pub mod config;

/// Error types for cache operations.
///
/// Defines [`CacheError`] for the direct store API and
/// [`RevalidationError`] for failed background refreshes.
pub mod error;

/// Single-flight guard for background revalidations.
pub mod lock;

/// Metrics collection for cache observability.
///
/// When the `metrics` feature is enabled, this module records counters
/// and histograms for:
/// - Cache hits, misses, stale responses and bypasses
/// - Revalidations scheduled, deduplicated and failed
/// - Offload task lifecycle
pub mod metrics;

/// Background task offloading.
///
/// Provides the [`OffloadManager`](offload::OffloadManager), the tokio-backed
/// implementation of [`Offload`].
pub mod offload;

pub use cache::{CACHE_WRITE_TASK, Cache, CacheBuilder, REVALIDATE_TASK};
pub use config::CacheSettings;
pub use error::{CacheError, RevalidationError};
pub use lock::{RevalidationLock, RevalidationPermit};
pub use offload::{OffloadConfig, OffloadManager, TimeoutPolicy};

pub use subcache_backend::{
    CacheEntry, CacheStore, DeleteStatus, Lookup, Store, StoreError, StoreIdentity, StoreResult,
    StoredValue,
};
pub use subcache_core::{
    CacheContext, CacheControl, CacheKey, CacheMode, CacheStatus, CachingStrategy, Clock,
    KeyPart, Offload, ResponseSource, SharedClock, StoreLabel, StrategyError, StrategyOptions,
    SystemClock,
};

/// The `subcache` prelude.
///
/// ```rust
/// use subcache::prelude::*;
/// ```
pub mod prelude {
    pub use crate::{Cache, CacheContext, CacheKey, CacheStatus, CachingStrategy, StrategyOptions};
}
