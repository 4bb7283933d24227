//! EventSink port - status notifications for humans.

use crate::domain::HarvestEvent;

/// Receives status notifications.
///
/// Called from concurrently running tasks; implementations must not assume
/// any relative ordering between events of different tasks.
pub trait EventSink: Send + Sync {
    fn emit(&self, event: HarvestEvent);
}
