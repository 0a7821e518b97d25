//! Error types for cache operations.

use subcache_backend::StoreError;
use subcache_core::StrategyError;
use thiserror::Error;

/// Errors returned by the direct [`Cache`](crate::Cache) API.
///
/// [`Cache::run_with_cache`](crate::Cache::run_with_cache) never returns these:
/// store failures degrade to pass-through there.
#[derive(Debug, Error)]
pub enum CacheError {
    /// Strategy construction or parsing error.
    #[error(transparent)]
    Strategy(#[from] StrategyError),

    /// Store interaction error.
    #[error(transparent)]
    Store(#[from] StoreError),
}

/// A background revalidation whose computation failed.
///
/// Only ever logged; the stale entry stays in place until it expires or a
/// later revalidation succeeds.
#[derive(Debug, Error)]
#[error("SWR revalidation failed: {message}")]
pub struct RevalidationError {
    /// Canonical key of the entry being revalidated.
    pub key: String,
    /// Rendered error of the failed computation.
    pub message: String,
}

impl RevalidationError {
    /// Wraps the computation error for `key`.
    pub fn new(key: impl Into<String>, error: impl std::fmt::Display) -> Self {
        Self {
            key: key.into(),
            message: error.to_string(),
        }
    }
}
