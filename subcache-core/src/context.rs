//! Cache context types for tracking cache operation results.
//!
//! Every orchestrated call returns a [`CacheContext`] next to its value. The
//! context is the structured trace of what happened: the lookup status, where
//! the value came from, how old it was and which `Cache-Control` governed the
//! decision.

use std::fmt;
use std::time::Duration;

use smol_str::SmolStr;

use crate::label::StoreLabel;

/// Whether the request resulted in a cache hit, miss, or stale data.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum CacheStatus {
    /// Cache hit - valid cached data was found and returned.
    Hit,
    /// Cache miss - no cached data was found.
    #[default]
    Miss,
    /// Stale data - cached data was found but has exceeded its freshness window.
    Stale,
}

impl CacheStatus {
    /// Returns the status as a string slice.
    #[inline]
    pub const fn as_str(&self) -> &'static str {
        match self {
            CacheStatus::Hit => "hit",
            CacheStatus::Miss => "miss",
            CacheStatus::Stale => "stale",
        }
    }

    /// Upper-case form used in `x-cache-status` style headers.
    #[inline]
    pub const fn as_header_value(&self) -> &'static str {
        match self {
            CacheStatus::Hit => "HIT",
            CacheStatus::Miss => "MISS",
            CacheStatus::Stale => "STALE",
        }
    }
}

impl fmt::Display for CacheStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Source of the value - either freshly computed or read from a store.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum ResponseSource {
    /// Value came from running the computation (miss or bypass).
    #[default]
    Compute,
    /// Value came from the store with the given label.
    Store(StoreLabel),
}

impl ResponseSource {
    /// Returns the source as a string slice.
    #[inline]
    pub fn as_str(&self) -> &str {
        match self {
            ResponseSource::Compute => "compute",
            ResponseSource::Store(label) => label.as_str(),
        }
    }
}

/// Context information about a cache operation.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CacheContext {
    /// Whether the request resulted in a cache hit, miss, or stale data.
    pub status: CacheStatus,
    /// Source of the value.
    pub source: ResponseSource,
    /// Canonical key, absent when caching was bypassed.
    pub key: Option<SmolStr>,
    /// Age of the stored entry at read time.
    pub age: Option<Duration>,
    /// `Cache-Control` recorded with the stored entry, or the one about to be
    /// written on a miss. `None` on a miss whose value is not written.
    pub cache_control: Option<String>,
    /// Whether a background revalidation was scheduled by this call.
    pub revalidation_scheduled: bool,
    /// Whether the cache was bypassed (no-store strategy, no store, or store failure).
    pub bypassed: bool,
}

impl CacheContext {
    /// Context for a call that never touched the store.
    pub fn bypass() -> Self {
        Self {
            bypassed: true,
            ..Self::default()
        }
    }

    /// Context for a call addressed by `key`.
    pub fn for_key(key: impl Into<SmolStr>) -> Self {
        Self {
            key: Some(key.into()),
            ..Self::default()
        }
    }

    /// Whether the value was served from the store.
    #[inline]
    pub fn is_cached(&self) -> bool {
        matches!(self.status, CacheStatus::Hit | CacheStatus::Stale)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bypass_context_is_a_compute_miss() {
        let ctx = CacheContext::bypass();
        assert_eq!(ctx.status, CacheStatus::Miss);
        assert_eq!(ctx.source, ResponseSource::Compute);
        assert!(ctx.bypassed);
        assert!(!ctx.is_cached());
    }

    #[test]
    fn status_renders_header_values() {
        assert_eq!(CacheStatus::Stale.as_header_value(), "STALE");
        assert_eq!(CacheStatus::Hit.to_string(), "hit");
    }
}
