//! Tests for verifying store metrics.
//!
//! These tests verify that the expected metrics are recorded with the store
//! label when going through the adapter.

#![cfg(feature = "metrics")]

mod common;

use common::test_store::{BrokenStore, TestStore};
use metrics_util::debugging::{DebugValue, DebuggingRecorder};
use metrics_util::{CompositeKey, MetricKind};
use subcache_backend::CacheStore;
use subcache_core::{CacheKey, CachingStrategy};

/// Type alias for snapshot entries
type SnapshotEntry = (
    CompositeKey,
    Option<metrics::Unit>,
    Option<metrics::SharedString>,
    DebugValue,
);

fn has_labels(key: &CompositeKey, labels: &[(&str, &str)]) -> bool {
    labels.iter().all(|(name, expected)| {
        key.key()
            .labels()
            .any(|label| label.key() == *name && label.value() == *expected)
    })
}

/// Counter value for `name` carrying all of `labels`.
fn counter(entries: &[SnapshotEntry], name: &str, labels: &[(&str, &str)]) -> Option<u64> {
    entries.iter().find_map(|(key, _, _, value)| match value {
        DebugValue::Counter(v)
            if key.kind() == MetricKind::Counter
                && key.key().name() == name
                && has_labels(key, labels) =>
        {
            Some(*v)
        }
        _ => None,
    })
}

/// Number of histogram samples for `name` carrying all of `labels`.
fn samples(entries: &[SnapshotEntry], name: &str, labels: &[(&str, &str)]) -> usize {
    entries
        .iter()
        .find_map(|(key, _, _, value)| match value {
            DebugValue::Histogram(v)
                if key.kind() == MetricKind::Histogram
                    && key.key().name() == name
                    && has_labels(key, labels) =>
            {
                Some(v.len())
            }
            _ => None,
        })
        .unwrap_or(0)
}

fn run<F: std::future::Future<Output = ()>>(future: F) {
    // Single-threaded runtime so all async code runs on the local recorder's thread
    let rt = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .unwrap();
    rt.block_on(future);
}

#[test]
fn write_read_delete_record_store_metrics() {
    let recorder = DebuggingRecorder::new();
    let snapshotter = recorder.snapshotter();

    metrics::with_local_recorder(&recorder, || {
        run(async {
            let cache = CacheStore::new(TestStore::new());
            let key = CacheKey::from("metrics");
            cache
                .set(&key, &"value", &CachingStrategy::default())
                .await
                .unwrap();
            cache.get::<String>(&key).await.unwrap();
            cache.delete(&key).await.unwrap();
        })
    });

    // Histograms are drained by a snapshot, so take exactly one.
    let entries = snapshotter.snapshot().into_vec();
    let calls = "subcache_store_calls_total";

    assert_eq!(counter(&entries, calls, &[("store", "test"), ("op", "put")]), Some(1));
    assert_eq!(counter(&entries, calls, &[("store", "test"), ("op", "lookup")]), Some(1));
    assert_eq!(counter(&entries, calls, &[("store", "test"), ("op", "delete")]), Some(1));
    assert_eq!(
        samples(
            &entries,
            "subcache_store_call_duration_seconds",
            &[("store", "test"), ("op", "delete")]
        ),
        1
    );

    let written = counter(&entries, "subcache_store_bytes_total", &[("op", "put")]).unwrap();
    let read = counter(&entries, "subcache_store_bytes_total", &[("op", "lookup")]).unwrap();
    assert!(written > 0);
    assert_eq!(written, read);

    let codec = "subcache_store_codec_duration_seconds";
    assert_eq!(samples(&entries, codec, &[("store", "test"), ("step", "encode")]), 1);
    assert_eq!(samples(&entries, codec, &[("store", "test"), ("step", "decode")]), 1);
}

#[test]
fn failing_store_records_errors_per_operation() {
    let recorder = DebuggingRecorder::new();
    let snapshotter = recorder.snapshotter();

    metrics::with_local_recorder(&recorder, || {
        run(async {
            let cache = CacheStore::new(BrokenStore);
            let key = CacheKey::from("metrics");
            let _ = cache.get::<String>(&key).await;
            let _ = cache.set(&key, &"value", &CachingStrategy::default()).await;
            let _ = cache.delete(&key).await;
        })
    });

    let entries = snapshotter.snapshot().into_vec();
    let errors = "subcache_store_call_errors_total";
    for op in ["lookup", "put", "delete"] {
        assert_eq!(
            counter(&entries, errors, &[("store", "store"), ("op", op)]),
            Some(1),
            "{op}"
        );
    }
    assert_eq!(counter(&entries, "subcache_store_calls_total", &[("store", "store")]), None);
}
