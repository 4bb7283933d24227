//! Sinks that discard everything. Used when no sink is configured.

use crate::domain::HarvestEvent;
use crate::ports::{EventSink, ProgressSink};

#[derive(Debug, Clone, Copy, Default)]
pub struct NoopProgress;

impl ProgressSink for NoopProgress {
    fn start(&self, _total: u64) {}
    fn advance(&self) {}
    fn stop(&self) {}
}

#[derive(Debug, Clone, Copy, Default)]
pub struct NoopEventSink;

impl EventSink for NoopEventSink {
    fn emit(&self, _event: HarvestEvent) {}
}
