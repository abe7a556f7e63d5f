//! Resync executor settings.

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// What happens to a resync that runs too long.
///
/// In YAML: `None`, `{ Cancel: 5s }` or `{ Warn: 500ms }`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum TimeoutPolicy {
    /// Resyncs run to completion however long they take.
    #[default]
    None,
    /// Drop the resync once the deadline passes; the store write may be lost.
    Cancel(#[serde(with = "humantime_serde")] Duration),
    /// Let the resync finish and log that it was slow.
    Warn(#[serde(with = "humantime_serde")] Duration),
}

/// Settings for [`OffloadManager`](super::OffloadManager).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct OffloadConfig {
    /// Upper bound on resyncs running at once; absent means unbounded.
    pub max_concurrent_tasks: Option<usize>,
    /// Deadline handling per resync.
    pub timeout_policy: TimeoutPolicy,
}

impl OffloadConfig {
    /// Starts from unbounded concurrency and no deadline.
    pub fn builder() -> OffloadConfigBuilder {
        OffloadConfigBuilder::default()
    }
}

/// Fluent construction of an [`OffloadConfig`].
#[derive(Debug, Clone, Default)]
pub struct OffloadConfigBuilder {
    max_concurrent_tasks: Option<usize>,
    timeout_policy: TimeoutPolicy,
}

impl OffloadConfigBuilder {
    /// Caps how many resyncs may hold a permit at once.
    pub fn max_concurrent_tasks(self, max: usize) -> Self {
        Self {
            max_concurrent_tasks: Some(max),
            ..self
        }
    }

    /// Chooses the deadline handling.
    pub fn timeout_policy(self, policy: TimeoutPolicy) -> Self {
        Self {
            timeout_policy: policy,
            ..self
        }
    }

    /// Shorthand for [`TimeoutPolicy::Cancel`].
    pub fn timeout(self, duration: Duration) -> Self {
        self.timeout_policy(TimeoutPolicy::Cancel(duration))
    }

    /// Finishes the config.
    pub fn build(self) -> OffloadConfig {
        OffloadConfig {
            max_concurrent_tasks: self.max_concurrent_tasks,
            timeout_policy: self.timeout_policy,
        }
    }
}
