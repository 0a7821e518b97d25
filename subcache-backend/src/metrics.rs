//! Store call metrics recorded by [`CacheStore`](crate::CacheStore).
//!
//! Without the `metrics` feature every recorder is a no-op and [`Timer`]
//! is zero-sized.
//!
//! | metric | kind | labels |
//! |---|---|---|
//! | `subcache_store_calls_total` | counter | `store`, `op` |
//! | `subcache_store_call_duration_seconds` | histogram | `store`, `op` |
//! | `subcache_store_call_errors_total` | counter | `store`, `op` |
//! | `subcache_store_bytes_total` | counter | `store`, `op` |
//! | `subcache_store_codec_duration_seconds` | histogram | `store`, `step` |
//!
//! `op` is one of `lookup`, `put`, `delete`; `step` is `encode` or `decode`.

use std::time::Duration;

#[cfg(feature = "metrics")]
use std::time::Instant;

#[cfg(feature = "metrics")]
use lazy_static::lazy_static;

/// Store call being measured.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Op {
    /// [`Store::lookup`](crate::Store::lookup).
    Lookup,
    /// [`Store::put`](crate::Store::put).
    Put,
    /// [`Store::delete`](crate::Store::delete).
    Delete,
}

impl Op {
    /// Label value.
    pub const fn as_str(self) -> &'static str {
        match self {
            Op::Lookup => "lookup",
            Op::Put => "put",
            Op::Delete => "delete",
        }
    }
}

/// Envelope codec step.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Codec {
    /// Value to bytes.
    Encode,
    /// Bytes to value.
    Decode,
}

impl Codec {
    /// Label value.
    pub const fn as_str(self) -> &'static str {
        match self {
            Codec::Encode => "encode",
            Codec::Decode => "decode",
        }
    }
}

/// Stopwatch that only reads the clock when metrics are compiled in.
#[derive(Debug, Default)]
pub struct Timer {
    #[cfg(feature = "metrics")]
    start: Option<Instant>,
}

impl Timer {
    /// Starts timing.
    #[inline]
    pub fn new() -> Self {
        Self {
            #[cfg(feature = "metrics")]
            start: Some(Instant::now()),
        }
    }

    /// Time since [`Timer::new`]; zero without the `metrics` feature.
    #[inline]
    pub fn elapsed(&self) -> Duration {
        #[cfg(feature = "metrics")]
        {
            self.start.map(|start| start.elapsed()).unwrap_or_default()
        }
        #[cfg(not(feature = "metrics"))]
        {
            Duration::ZERO
        }
    }
}

#[cfg(feature = "metrics")]
lazy_static! {
    /// Store calls, by operation.
    pub static ref STORE_CALLS: &'static str = {
        metrics::describe_counter!("subcache_store_calls_total", "Store calls that succeeded.");
        "subcache_store_calls_total"
    };

    /// Store call latency, by operation.
    pub static ref STORE_CALL_DURATION: &'static str = {
        metrics::describe_histogram!(
            "subcache_store_call_duration_seconds",
            metrics::Unit::Seconds,
            "Latency of successful store calls."
        );
        "subcache_store_call_duration_seconds"
    };

    /// Failed store calls, by operation.
    pub static ref STORE_CALL_ERRORS: &'static str = {
        metrics::describe_counter!("subcache_store_call_errors_total", "Store calls that failed.");
        "subcache_store_call_errors_total"
    };

    /// Envelope bytes moved, by operation.
    pub static ref STORE_BYTES: &'static str = {
        metrics::describe_counter!(
            "subcache_store_bytes_total",
            metrics::Unit::Bytes,
            "Encoded envelope bytes read by lookups and written by puts."
        );
        "subcache_store_bytes_total"
    };

    /// Envelope encode/decode time.
    pub static ref STORE_CODEC_DURATION: &'static str = {
        metrics::describe_histogram!(
            "subcache_store_codec_duration_seconds",
            metrics::Unit::Seconds,
            "Time spent encoding and decoding entry envelopes."
        );
        "subcache_store_codec_duration_seconds"
    };
}

/// Records a successful call.
#[cfg(feature = "metrics")]
#[inline]
pub fn record_call(store: &str, op: Op, duration: Duration) {
    metrics::counter!(*STORE_CALLS, "store" => store.to_owned(), "op" => op.as_str())
        .increment(1);
    metrics::histogram!(*STORE_CALL_DURATION, "store" => store.to_owned(), "op" => op.as_str())
        .record(duration.as_secs_f64());
}

/// Records a successful call (no-op).
#[cfg(not(feature = "metrics"))]
#[inline]
pub fn record_call(_store: &str, _op: Op, _duration: Duration) {}

/// Records a failed call.
#[cfg(feature = "metrics")]
#[inline]
pub fn record_call_error(store: &str, op: Op) {
    metrics::counter!(*STORE_CALL_ERRORS, "store" => store.to_owned(), "op" => op.as_str())
        .increment(1);
}

/// Records a failed call (no-op).
#[cfg(not(feature = "metrics"))]
#[inline]
pub fn record_call_error(_store: &str, _op: Op) {}

/// Records envelope bytes read or written.
#[cfg(feature = "metrics")]
#[inline]
pub fn record_bytes(store: &str, op: Op, bytes: usize) {
    metrics::counter!(*STORE_BYTES, "store" => store.to_owned(), "op" => op.as_str())
        .increment(bytes as u64);
}

/// Records envelope bytes (no-op).
#[cfg(not(feature = "metrics"))]
#[inline]
pub fn record_bytes(_store: &str, _op: Op, _bytes: usize) {}

/// Records envelope codec time.
#[cfg(feature = "metrics")]
#[inline]
pub fn record_codec(store: &str, step: Codec, duration: Duration) {
    metrics::histogram!(*STORE_CODEC_DURATION, "store" => store.to_owned(), "step" => step.as_str())
        .record(duration.as_secs_f64());
}

/// Records envelope codec time (no-op).
#[cfg(not(feature = "metrics"))]
#[inline]
pub fn record_codec(_store: &str, _step: Codec, _duration: Duration) {}
