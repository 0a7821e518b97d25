//! Deferred-execution sink.
//!
//! Revalidations and store writes run after the caller already has its
//! value. They are handed to an [`Offload`] implementation, which must keep
//! running them even if the future that scheduled them is dropped.

use std::future::Future;

use smol_str::SmolStr;

/// Runs detached background work for a cache.
///
/// `subcache::OffloadManager` is the tokio-backed implementation. Hosts
/// with their own lifetime hook (a serverless `waitUntil`, a task tracker
/// drained on shutdown) implement this trait around it.
///
/// Clones must share state, so a cache and its clones schedule into the
/// same sink.
///
/// ```
/// use std::future::Future;
/// use subcache_core::{Offload, SmolStr};
///
/// #[derive(Clone)]
/// struct TokioOffload;
///
/// impl Offload for TokioOffload {
///     fn spawn<F>(&self, _kind: impl Into<SmolStr>, future: F)
///     where
///         F: Future<Output = ()> + Send + 'static,
///     {
///         tokio::spawn(future);
///     }
/// }
/// ```
pub trait Offload: Send + Sync + Clone {
    /// Schedules `future`.
    ///
    /// `kind` names the work (`"revalidate"`, `"cache_write"`) for spans and
    /// metrics.
    fn spawn<F>(&self, kind: impl Into<SmolStr>, future: F)
    where
        F: Future<Output = ()> + Send + 'static;
}
