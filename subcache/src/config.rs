//! Deserializable cache settings.
//!
//! ```yaml
//! identity_base: https://cache.example.internal/
//! offload:
//!   timeout_policy:
//!     warn: 2s
//! ```

use serde::{Deserialize, Serialize};
use subcache_backend::DEFAULT_IDENTITY_BASE;

use crate::offload::OffloadConfig;

fn default_identity_base() -> String {
    DEFAULT_IDENTITY_BASE.to_owned()
}

/// Instance-wide settings for a [`Cache`](crate::Cache).
///
/// Per-call behavior is decided by the
/// [`CachingStrategy`](subcache_core::CachingStrategy) passed to each call.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CacheSettings {
    /// Base of the synthetic URLs entries are filed under.
    #[serde(default = "default_identity_base")]
    pub identity_base: String,
    /// Background task settings.
    #[serde(default)]
    pub offload: OffloadConfig,
}

impl Default for CacheSettings {
    fn default() -> Self {
        Self {
            identity_base: default_identity_base(),
            offload: OffloadConfig::default(),
        }
    }
}
