//! Pipeline settings.

use serde::{Deserialize, Serialize};

use crate::engine::{ConcurrencyLimit, RetryPolicy};

/// Tunables of a run. Every field has a default, so a partial document
/// deserializes.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineSettings {
    /// Maximum lookups in flight (default 10, never below 1).
    pub concurrency: ConcurrencyLimit,

    /// Retry policy applied to each lookup.
    pub retry: RetryPolicy,
}

impl PipelineSettings {
    pub fn with_concurrency(mut self, concurrency: ConcurrencyLimit) -> Self {
        self.concurrency = concurrency;
        self
    }

    pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }
}
