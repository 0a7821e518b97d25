//! Capacity gauges for [`MokaStore`](crate::MokaStore).
//!
//! With the `metrics` feature enabled, every write and delete refreshes:
//!
//! - `subcache_moka_entries`: entries currently held
//! - `subcache_moka_size_bytes`: weighted size (bytes for `max_bytes` stores,
//!   entries otherwise)
//!
//! Both carry a `store` label with the store's name.

#[cfg(feature = "metrics")]
use lazy_static::lazy_static;

#[cfg(feature = "metrics")]
lazy_static! {
    /// Entry count gauge.
    pub static ref MOKA_ENTRIES: &'static str = {
        metrics::describe_gauge!("subcache_moka_entries", "Entries held by a Moka store.");
        "subcache_moka_entries"
    };

    /// Weighted size gauge.
    pub static ref MOKA_SIZE_BYTES: &'static str = {
        metrics::describe_gauge!(
            "subcache_moka_size_bytes",
            "Weighted size of a Moka store."
        );
        "subcache_moka_size_bytes"
    };
}

/// Publishes the current size of `store`.
#[cfg(feature = "metrics")]
#[inline]
pub fn record_capacity(store: &str, entries: u64, weighted_size: u64) {
    let label = store.to_owned();
    metrics::gauge!(*MOKA_ENTRIES, "store" => label.clone()).set(entries as f64);
    metrics::gauge!(*MOKA_SIZE_BYTES, "store" => label).set(weighted_size as f64);
}

/// Publishes the current size of `store` (no-op without `metrics`).
#[cfg(not(feature = "metrics"))]
#[inline]
pub fn record_capacity(_store: &str, _entries: u64, _weighted_size: u64) {}
