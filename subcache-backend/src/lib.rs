#![warn(missing_docs)]
//! Store contract and cache store adapter for subcache.
//!
//! If you want to plug in your own store, implement [`Store`]: three async
//! operations over opaque bytes addressed by a [`StoreIdentity`]. Everything
//! typed lives in [`CacheStore`], which encodes values into a
//! [`CacheEntry`] envelope, computes physical TTLs and classifies lookups
//! as hit, stale or miss.
mod adapter;
pub mod entry;
mod error;
pub mod format;
mod identity;
pub mod metrics;
mod store;

pub use adapter::{CacheStore, Lookup, SealedEntry, StoredValue, physical_ttl};
pub use entry::{CacheDebugInfo, CacheEntry};
pub use error::StoreError;
pub use format::{FormatError, JsonFormat};
pub use identity::{DEFAULT_IDENTITY_BASE, StoreIdentity};
pub use store::{DeleteStatus, Store, StoreResult};
