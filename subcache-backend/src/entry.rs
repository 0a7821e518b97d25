//! Stored entry envelope.

use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use subcache_core::{CacheControl, CacheStatus};

/// Diagnostic information stored alongside an entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CacheDebugInfo {
    /// Canonical key the entry was written under.
    pub key: String,
    /// Physical TTL, in seconds, the entry was written with.
    pub physical_ttl: u64,
    /// Display name the caller attached to the key.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
}

/// What the store holds for one key: the value plus the metadata needed to
/// decide freshness on read.
///
/// The on-store layout is
/// `{"value": .., "stored_at": .., "real_cache_control": .., "debug_info": ..}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CacheEntry<T> {
    /// The cached value.
    pub value: T,
    /// Write time.
    pub stored_at: DateTime<Utc>,
    /// `Cache-Control` rendered from the strategy active at write time.
    pub real_cache_control: String,
    /// Diagnostics.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub debug_info: Option<CacheDebugInfo>,
}

impl<T> CacheEntry<T> {
    /// Creates an envelope for `value` written at `stored_at`.
    pub fn new(value: T, stored_at: DateTime<Utc>, real_cache_control: impl Into<String>) -> Self {
        Self {
            value,
            stored_at,
            real_cache_control: real_cache_control.into(),
            debug_info: None,
        }
    }

    /// Attaches diagnostics.
    pub fn with_debug_info(mut self, debug_info: CacheDebugInfo) -> Self {
        self.debug_info = Some(debug_info);
        self
    }

    /// Time elapsed since the entry was written, clamped at zero when the
    /// clock went backwards.
    pub fn age(&self, now: DateTime<Utc>) -> Duration {
        (now - self.stored_at).to_std().unwrap_or(Duration::ZERO)
    }

    /// Freshness window recorded with the entry.
    pub fn fresh_for(&self) -> Duration {
        CacheControl::parse(&self.real_cache_control).fresh_for()
    }

    /// `Hit` while `age <= fresh_for`, `Stale` afterwards.
    pub fn status(&self, now: DateTime<Utc>) -> CacheStatus {
        if self.age(now) <= self.fresh_for() {
            CacheStatus::Hit
        } else {
            CacheStatus::Stale
        }
    }

    /// Consumes the envelope, returning the value.
    pub fn into_value(self) -> T {
        self.value
    }
}
