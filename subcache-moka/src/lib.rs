//! In-memory [`Store`](subcache_backend::Store) backed by
//! [Moka](https://docs.rs/moka).
//!
//! Entries expire after the physical TTL they were written with; a rewrite
//! restarts the TTL.
#![warn(missing_docs)]
#![cfg_attr(docsrs, feature(doc_cfg))]

mod builder;
pub mod metrics;
mod store;

pub use builder::{ByteCapacity, EntryCapacity, MokaStoreBuilder, NoCapacity};
pub use moka::policy::EvictionPolicy;
pub use store::{MokaStore, StoredBlob};
