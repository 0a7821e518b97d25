#![warn(missing_docs)]
//! # subcache-core
//!
//! Core types for the subcache stale-while-revalidate sub-request cache.
//!
//! This crate holds everything that is independent of storage and runtime:
//!
//! - **Decide** how long values live ([`CachingStrategy`], [`CacheControl`])
//! - **Address** stored values ([`CacheKey`], [`KeyPart`])
//! - **Report** what happened ([`CacheStatus`], [`CacheContext`])
//! - **Read** the time ([`Clock`])
//! - **Execute** background tasks ([`Offload`])

pub mod cache_control;
pub mod clock;
pub mod context;
pub mod key;
pub mod label;
pub mod offload;
pub mod strategy;

pub use cache_control::CacheControl;
pub use clock::{Clock, SharedClock, SystemClock};
pub use context::{CacheContext, CacheStatus, ResponseSource};
pub use key::{CacheKey, KeyPart, canonicalize};
pub use label::StoreLabel;
pub use offload::Offload;
#[doc(hidden)]
pub use smol_str::SmolStr;
pub use strategy::{CacheMode, CachingStrategy, StrategyError, StrategyOptions};

/// Raw byte data type used for serialized cache entries.
/// Using `Bytes` provides efficient zero-copy cloning via reference counting.
pub type Raw = bytes::Bytes;
