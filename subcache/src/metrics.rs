//! Metrics declaration and initialization.
//!
//! Every recorder below is a no-op unless the `metrics` feature is enabled.

use std::time::Duration;

use subcache_core::CacheContext;

#[cfg(feature = "metrics")]
use lazy_static::lazy_static;

#[cfg(feature = "metrics")]
lazy_static! {
    // Cache status metrics

    /// Track number of cache hit events.
    pub static ref CACHE_HIT_COUNTER: &'static str = {
        metrics::describe_counter!(
            "subcache_cache_hit_total",
            "Total number of cache hit events."
        );
        "subcache_cache_hit_total"
    };
    /// Track number of cache miss events.
    pub static ref CACHE_MISS_COUNTER: &'static str = {
        metrics::describe_counter!(
            "subcache_cache_miss_total",
            "Total number of cache miss events."
        );
        "subcache_cache_miss_total"
    };
    /// Track number of cache stale events.
    pub static ref CACHE_STALE_COUNTER: &'static str = {
        metrics::describe_counter!(
            "subcache_cache_stale_total",
            "Total number of cache stale events."
        );
        "subcache_cache_stale_total"
    };
    /// Track number of calls that bypassed the cache.
    pub static ref CACHE_BYPASS_COUNTER: &'static str = {
        metrics::describe_counter!(
            "subcache_cache_bypass_total",
            "Total number of calls that bypassed the cache."
        );
        "subcache_cache_bypass_total"
    };
    /// Track store failures that degraded a call to pass-through.
    pub static ref CACHE_STORE_ERRORS: &'static str = {
        metrics::describe_counter!(
            "subcache_cache_store_failures_total",
            "Total number of store failures absorbed by the orchestrator."
        );
        "subcache_cache_store_failures_total"
    };

    // Latency metrics

    /// Histogram of orchestrated call duration.
    pub static ref CACHE_REQUEST_DURATION: &'static str = {
        metrics::describe_histogram!(
            "subcache_request_duration_seconds",
            metrics::Unit::Seconds,
            "Duration of orchestrated calls in seconds."
        );
        "subcache_request_duration_seconds"
    };

    // Revalidation metrics

    /// Track number of revalidations scheduled.
    pub static ref REVALIDATIONS_SPAWNED: &'static str = {
        metrics::describe_counter!(
            "subcache_revalidations_spawned_total",
            "Total number of background revalidations scheduled."
        );
        "subcache_revalidations_spawned_total"
    };
    /// Track number of revalidations skipped because one was in flight.
    pub static ref REVALIDATIONS_DEDUPLICATED: &'static str = {
        metrics::describe_counter!(
            "subcache_revalidations_deduplicated_total",
            "Total number of revalidations skipped because one was already in flight."
        );
        "subcache_revalidations_deduplicated_total"
    };
    /// Track number of failed revalidations.
    pub static ref REVALIDATIONS_FAILED: &'static str = {
        metrics::describe_counter!(
            "subcache_revalidations_failed_total",
            "Total number of background revalidations whose computation failed."
        );
        "subcache_revalidations_failed_total"
    };

    // Offload manager metrics

    /// Track number of offload tasks spawned.
    pub static ref OFFLOAD_TASKS_SPAWNED: &'static str = {
        metrics::describe_counter!(
            "subcache_offload_tasks_spawned_total",
            "Total number of offload tasks spawned."
        );
        "subcache_offload_tasks_spawned_total"
    };
    /// Track number of offload tasks completed.
    pub static ref OFFLOAD_TASKS_COMPLETED: &'static str = {
        metrics::describe_counter!(
            "subcache_offload_tasks_completed_total",
            "Total number of offload tasks completed."
        );
        "subcache_offload_tasks_completed_total"
    };
    /// Track number of offload tasks that timed out.
    pub static ref OFFLOAD_TASKS_TIMEOUT: &'static str = {
        metrics::describe_counter!(
            "subcache_offload_tasks_timeout_total",
            "Total number of offload tasks that timed out."
        );
        "subcache_offload_tasks_timeout_total"
    };
    /// Gauge of currently active offload tasks.
    pub static ref OFFLOAD_TASKS_ACTIVE: &'static str = {
        metrics::describe_gauge!(
            "subcache_offload_tasks_active",
            "Number of currently active offload tasks."
        );
        "subcache_offload_tasks_active"
    };
    /// Histogram of offload task duration.
    pub static ref OFFLOAD_TASK_DURATION: &'static str = {
        metrics::describe_histogram!(
            "subcache_offload_task_duration_seconds",
            metrics::Unit::Seconds,
            "Duration of offload tasks in seconds."
        );
        "subcache_offload_task_duration_seconds"
    };
}

/// Record metrics from a [`CacheContext`] after an orchestrated call.
///
/// When the `metrics` feature is disabled, this function is a no-op
/// and will be eliminated by the compiler.
#[cfg(feature = "metrics")]
#[inline]
pub fn record_context_metrics(ctx: &CacheContext, duration: Duration) {
    let status = ctx.status.as_str();
    let source = ctx.source.as_str().to_string();

    metrics::histogram!(
        *CACHE_REQUEST_DURATION,
        "status" => status,
        "source" => source.clone()
    )
    .record(duration.as_secs_f64());

    if ctx.bypassed {
        metrics::counter!(*CACHE_BYPASS_COUNTER).increment(1);
        return;
    }

    let counter = match ctx.status {
        subcache_core::CacheStatus::Hit => *CACHE_HIT_COUNTER,
        subcache_core::CacheStatus::Miss => *CACHE_MISS_COUNTER,
        subcache_core::CacheStatus::Stale => *CACHE_STALE_COUNTER,
    };
    metrics::counter!(counter, "source" => source).increment(1);
}

/// No-op version when metrics feature is disabled.
#[cfg(not(feature = "metrics"))]
#[inline]
pub fn record_context_metrics(_ctx: &CacheContext, _duration: Duration) {}

/// Record a store failure absorbed by the orchestrator.
#[cfg(feature = "metrics")]
#[inline]
pub fn record_store_error(operation: &'static str) {
    metrics::counter!(*CACHE_STORE_ERRORS, "operation" => operation).increment(1);
}

/// No-op version when metrics feature is disabled.
#[cfg(not(feature = "metrics"))]
#[inline]
pub fn record_store_error(_operation: &'static str) {}

/// Record a scheduled revalidation.
#[cfg(feature = "metrics")]
#[inline]
pub fn record_revalidation_spawned() {
    metrics::counter!(*REVALIDATIONS_SPAWNED).increment(1);
}

/// No-op version when metrics feature is disabled.
#[cfg(not(feature = "metrics"))]
#[inline]
pub fn record_revalidation_spawned() {}

/// Record a revalidation skipped by the lock.
#[cfg(feature = "metrics")]
#[inline]
pub fn record_revalidation_deduplicated() {
    metrics::counter!(*REVALIDATIONS_DEDUPLICATED).increment(1);
}

/// No-op version when metrics feature is disabled.
#[cfg(not(feature = "metrics"))]
#[inline]
pub fn record_revalidation_deduplicated() {}

/// Record a failed revalidation.
#[cfg(feature = "metrics")]
#[inline]
pub fn record_revalidation_failed() {
    metrics::counter!(*REVALIDATIONS_FAILED).increment(1);
}

/// No-op version when metrics feature is disabled.
#[cfg(not(feature = "metrics"))]
#[inline]
pub fn record_revalidation_failed() {}
