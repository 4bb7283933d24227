//! RecordSource port - lists candidate records.

use async_trait::async_trait;

use crate::domain::{HarvestError, PolicyRecord};

/// Lists every candidate record.
///
/// Failure here is fatal to the pipeline and is not retried: an unreachable
/// source or a payload that cannot be parsed must surface as an error.
#[async_trait]
pub trait RecordSource: Send + Sync {
    async fn list_records(&self) -> Result<Vec<PolicyRecord>, HarvestError>;
}
