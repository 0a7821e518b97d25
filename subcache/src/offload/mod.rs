//! Offload manager for background task execution.
//!
//! Stale entries are returned immediately while their revalidation runs here,
//! and fresh values are written to the store after the caller already has
//! them. Tasks are detached: dropping the call that spawned them does not
//! cancel them.
//!
//! # Example
//!
//! ```ignore
//! use subcache::offload::{OffloadManager, OffloadConfig};
//!
//! let manager = OffloadManager::new(OffloadConfig::default());
//!
//! manager.spawn("revalidate", async {
//!     // Revalidation logic here
//! });
//! manager.wait_all().await;
//! ```

mod manager;
mod policy;

pub use manager::{OffloadHandle, OffloadManager, TaskKey};
pub use policy::{OffloadConfig, OffloadConfigBuilder, TimeoutPolicy};
