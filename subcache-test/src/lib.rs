//! Test support for subcache.
//!
//! - [`MockStore`]: in-memory store with operation counters and expiry driven
//!   by an injected clock
//! - [`ManualClock`]: clock that only moves when told to
//! - [`FailingStore`]: store that fails selected operations
//! - [`tracing`]: log and span capture

mod clock;
mod failing;
mod mock_store;
pub mod tracing;

pub use clock::ManualClock;
pub use failing::FailingStore;
pub use mock_store::{MockEntry, MockStore, StoreCounters};
