//! OffloadManager implementation for background task execution.

use std::fmt;
use std::future::Future;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, Instant};

use dashmap::DashMap;
use smol_str::SmolStr;
use subcache_core::Offload;
use tokio::sync::oneshot;
use tokio::task::JoinHandle;
use tracing::{Instrument, info_span, warn};

use super::policy::{OffloadConfig, TimeoutPolicy};

#[cfg(feature = "metrics")]
use crate::metrics::{
    OFFLOAD_TASK_DURATION, OFFLOAD_TASKS_ACTIVE, OFFLOAD_TASKS_COMPLETED, OFFLOAD_TASKS_SPAWNED,
    OFFLOAD_TASKS_TIMEOUT,
};

/// Identifier of an offloaded task.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct TaskKey {
    /// Kind of the task (e.g., "revalidate", "cache_write").
    pub kind: SmolStr,
    /// Unique identifier within the manager.
    pub id: u64,
}

impl fmt::Display for TaskKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}#{}", self.kind, self.id)
    }
}

/// Handle to a spawned offload task.
#[derive(Debug)]
pub struct OffloadHandle {
    handle: JoinHandle<()>,
}

impl OffloadHandle {
    /// Check if the task is finished.
    pub fn is_finished(&self) -> bool {
        self.handle.is_finished()
    }

    /// Abort the task.
    pub fn abort(&self) {
        self.handle.abort();
    }
}

/// Internal state shared across clones.
#[derive(Debug)]
struct OffloadManagerInner {
    config: OffloadConfig,
    tasks: DashMap<TaskKey, OffloadHandle>,
    key_counter: AtomicU64,
}

/// Tokio-backed deferred-execution sink.
///
/// Cheap to clone; clones share the task registry so any of them can
/// [`wait_all`](Self::wait_all).
#[derive(Clone, Debug)]
pub struct OffloadManager {
    inner: Arc<OffloadManagerInner>,
}

impl OffloadManager {
    /// Create a new OffloadManager with the given configuration.
    pub fn new(config: OffloadConfig) -> Self {
        Self {
            inner: Arc::new(OffloadManagerInner {
                config,
                tasks: DashMap::new(),
                key_counter: AtomicU64::new(0),
            }),
        }
    }

    /// Create a new OffloadManager with default configuration.
    pub fn with_defaults() -> Self {
        Self::new(OffloadConfig::default())
    }

    /// Configuration in use.
    pub fn config(&self) -> &OffloadConfig {
        &self.inner.config
    }

    fn next_key(&self, kind: impl Into<SmolStr>) -> TaskKey {
        let id = self.inner.key_counter.fetch_add(1, Ordering::Relaxed);
        TaskKey {
            kind: kind.into(),
            id,
        }
    }

    /// Spawn a task of the given kind and return its key.
    ///
    /// The kind is used for metrics labels and tracing.
    pub fn spawn<F>(&self, kind: impl Into<SmolStr>, task: F) -> TaskKey
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let key = self.next_key(kind);

        #[cfg(feature = "metrics")]
        {
            metrics::counter!(*OFFLOAD_TASKS_SPAWNED, "kind" => key.kind.to_string()).increment(1);
            metrics::gauge!(*OFFLOAD_TASKS_ACTIVE, "kind" => key.kind.to_string()).increment(1.0);
        }

        // The task waits for its own registration, so its removal always
        // happens after the insert.
        let (registered, on_registered) = oneshot::channel();
        let handle = self.spawn_inner(task, key.clone(), on_registered);
        self.inner.tasks.insert(key.clone(), handle);
        let _ = registered.send(());
        key
    }

    /// Get the number of currently active tasks.
    pub fn active_task_count(&self) -> usize {
        self.inner.tasks.iter().filter(|e| !e.is_finished()).count()
    }

    /// Clean up finished task handles.
    pub fn cleanup_finished(&self) {
        self.inner.tasks.retain(|_, handle| !handle.is_finished());
    }

    /// Cancel all running tasks.
    pub fn cancel_all(&self) {
        for entry in self.inner.tasks.iter() {
            entry.abort();
        }
    }

    /// Check if the task with the given key is in flight.
    pub fn is_in_flight(&self, key: &TaskKey) -> bool {
        self.inner.tasks.get(key).is_some_and(|h| !h.is_finished())
    }

    /// Wait for all currently tracked tasks to complete.
    ///
    /// Tasks spawned while waiting are waited for as well.
    pub async fn wait_all(&self) {
        loop {
            self.cleanup_finished();
            if self.inner.tasks.is_empty() {
                break;
            }
            tokio::task::yield_now().await;
        }
    }

    /// Wait for all tasks with a timeout.
    ///
    /// Returns `true` if all tasks completed within the timeout,
    /// `false` if the timeout was reached.
    pub async fn wait_all_timeout(&self, timeout: Duration) -> bool {
        tokio::time::timeout(timeout, self.wait_all()).await.is_ok()
    }

    fn spawn_inner<F>(
        &self,
        task: F,
        key: TaskKey,
        registered: oneshot::Receiver<()>,
    ) -> OffloadHandle
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let inner = self.inner.clone();
        let span = info_span!("offload_task", kind = %key.kind, id = key.id);

        let handle = match self.inner.config.timeout_policy {
            TimeoutPolicy::None => tokio::spawn(
                async move {
                    let _ = registered.await;
                    let start = Instant::now();
                    task.await;
                    inner.tasks.remove(&key);
                    record_completion(start, &key.kind);
                }
                .instrument(span),
            ),
            TimeoutPolicy::Cancel(duration) => tokio::spawn(
                async move {
                    let _ = registered.await;
                    let start = Instant::now();
                    match tokio::time::timeout(duration, task).await {
                        Ok(()) => record_completion(start, &key.kind),
                        Err(_) => {
                            warn!(task = %key, "Offload task cancelled due to timeout");
                            record_timeout(start, &key.kind);
                        }
                    }
                    inner.tasks.remove(&key);
                }
                .instrument(span),
            ),
            TimeoutPolicy::Warn(duration) => tokio::spawn(
                async move {
                    let _ = registered.await;
                    let start = Instant::now();
                    task.await;
                    let elapsed = start.elapsed();
                    if elapsed > duration {
                        warn!(
                            task = %key,
                            elapsed_ms = elapsed.as_millis() as u64,
                            threshold_ms = duration.as_millis() as u64,
                            "Offload task exceeded timeout threshold"
                        );
                    }
                    inner.tasks.remove(&key);
                    record_completion(start, &key.kind);
                }
                .instrument(span),
            ),
        };

        OffloadHandle { handle }
    }
}

#[cfg(feature = "metrics")]
fn record_completion(start: Instant, kind: &SmolStr) {
    let duration = start.elapsed().as_secs_f64();
    metrics::counter!(*OFFLOAD_TASKS_COMPLETED, "kind" => kind.to_string()).increment(1);
    metrics::gauge!(*OFFLOAD_TASKS_ACTIVE, "kind" => kind.to_string()).decrement(1.0);
    metrics::histogram!(*OFFLOAD_TASK_DURATION, "kind" => kind.to_string()).record(duration);
}

#[cfg(not(feature = "metrics"))]
fn record_completion(_start: Instant, _kind: &SmolStr) {}

#[cfg(feature = "metrics")]
fn record_timeout(start: Instant, kind: &SmolStr) {
    let duration = start.elapsed().as_secs_f64();
    metrics::counter!(*OFFLOAD_TASKS_TIMEOUT, "kind" => kind.to_string()).increment(1);
    metrics::gauge!(*OFFLOAD_TASKS_ACTIVE, "kind" => kind.to_string()).decrement(1.0);
    metrics::histogram!(*OFFLOAD_TASK_DURATION, "kind" => kind.to_string()).record(duration);
}

#[cfg(not(feature = "metrics"))]
fn record_timeout(_start: Instant, _kind: &SmolStr) {}

impl Default for OffloadManager {
    fn default() -> Self {
        Self::with_defaults()
    }
}

impl Offload for OffloadManager {
    fn spawn<F>(&self, kind: impl Into<SmolStr>, future: F)
    where
        F: Future<Output = ()> + Send + 'static,
    {
        OffloadManager::spawn(self, kind, future);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::AtomicUsize;

    #[tokio::test]
    async fn spawned_tasks_run_to_completion() {
        let manager = OffloadManager::with_defaults();
        let counter = Arc::new(AtomicUsize::new(0));
        for _ in 0..3 {
            let counter = counter.clone();
            manager.spawn("cache_write", async move {
                counter.fetch_add(1, Ordering::SeqCst);
            });
        }
        manager.wait_all().await;
        assert_eq!(counter.load(Ordering::SeqCst), 3);
        assert_eq!(manager.active_task_count(), 0);
    }

    #[tokio::test]
    async fn cancel_policy_stops_slow_tasks() {
        let manager = OffloadManager::new(
            OffloadConfig::builder()
                .timeout(Duration::from_millis(20))
                .build(),
        );
        let finished = Arc::new(AtomicUsize::new(0));
        let flag = finished.clone();
        manager.spawn("revalidate", async move {
            tokio::time::sleep(Duration::from_secs(5)).await;
            flag.fetch_add(1, Ordering::SeqCst);
        });
        assert!(manager.wait_all_timeout(Duration::from_secs(2)).await);
        assert_eq!(finished.load(Ordering::SeqCst), 0);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn finished_tasks_leave_the_registry() {
        let manager = OffloadManager::with_defaults();
        for _ in 0..5_000 {
            manager.spawn("cache_write", async {});
        }

        let deadline = Instant::now() + Duration::from_secs(5);
        while !manager.inner.tasks.is_empty() && Instant::now() < deadline {
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        assert_eq!(manager.inner.tasks.len(), 0);
    }

    #[tokio::test]
    async fn task_keys_are_unique_per_kind() {
        let manager = OffloadManager::with_defaults();
        let first = manager.spawn("revalidate", async {});
        let second = manager.spawn("revalidate", async {});
        assert_ne!(first, second);
        assert_eq!(first.kind, "revalidate");
        manager.wait_all().await;
    }

    #[tokio::test]
    async fn spawn_outlives_the_spawning_future() {
        let manager = OffloadManager::with_defaults();
        let counter = Arc::new(AtomicUsize::new(0));
        {
            let counter = counter.clone();
            let spawner = manager.clone();
            let call = async move {
                Offload::spawn(&spawner, "cache_write", async move {
                    tokio::task::yield_now().await;
                    counter.fetch_add(1, Ordering::SeqCst);
                });
            };
            call.await;
        }
        manager.wait_all().await;
        assert_eq!(counter.load(Ordering::SeqCst), 1);
    }
}
