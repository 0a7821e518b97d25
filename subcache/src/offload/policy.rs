//! Offload task policies and configuration.

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Policy for handling task timeouts.
///
/// Deserializes from `none`, `{cancel: 5s}` or `{warn: 500ms}`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TimeoutPolicy {
    /// No timeout - task runs until completion.
    #[default]
    None,
    /// Cancel task after specified duration.
    Cancel(#[serde(with = "humantime_serde")] Duration),
    /// Log warning after duration but let task continue.
    Warn(#[serde(with = "humantime_serde")] Duration),
}

/// Configuration for the OffloadManager.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct OffloadConfig {
    /// Timeout policy for spawned tasks.
    #[serde(default)]
    pub timeout_policy: TimeoutPolicy,
}

impl OffloadConfig {
    /// Create a new builder for OffloadConfig.
    pub fn builder() -> OffloadConfigBuilder {
        OffloadConfigBuilder::default()
    }
}

/// Builder for OffloadConfig.
#[derive(Debug, Clone, Default)]
pub struct OffloadConfigBuilder {
    timeout_policy: TimeoutPolicy,
}

impl OffloadConfigBuilder {
    /// Set timeout policy.
    pub fn timeout_policy(self, policy: TimeoutPolicy) -> Self {
        Self {
            timeout_policy: policy,
        }
    }

    /// Set timeout with cancel policy.
    pub fn timeout(self, duration: Duration) -> Self {
        self.timeout_policy(TimeoutPolicy::Cancel(duration))
    }

    /// Set timeout with warn policy.
    pub fn warn_after(self, duration: Duration) -> Self {
        self.timeout_policy(TimeoutPolicy::Warn(duration))
    }

    /// Build the OffloadConfig.
    pub fn build(self) -> OffloadConfig {
        OffloadConfig {
            timeout_policy: self.timeout_policy,
        }
    }
}
