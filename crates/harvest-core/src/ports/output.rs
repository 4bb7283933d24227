//! OutputSink port - where the final result goes.

use async_trait::async_trait;

use crate::domain::{AggregateOutput, Delivery, HarvestError, Summary};

/// Delivers the aggregate output once resolution is complete.
///
/// Failure is fatal to the pipeline: the data is resolved but cannot be
/// persisted.
#[async_trait]
pub trait OutputSink: Send + Sync {
    async fn deliver(
        &self,
        summary: &Summary,
        output: &AggregateOutput,
    ) -> Result<Delivery, HarvestError>;
}
