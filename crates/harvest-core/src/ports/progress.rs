//! ProgressSink port.

/// Receives progress for a run.
///
/// `advance` is called from concurrently running tasks, once per task
/// completion (success or failure).
pub trait ProgressSink: Send + Sync {
    fn start(&self, total: u64);
    fn advance(&self);
    fn stop(&self);
}
