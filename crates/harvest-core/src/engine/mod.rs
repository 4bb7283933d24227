//! Execution engine: retry runner, tasks, and the bounded-concurrency scheduler.

mod retry;
mod scheduler;
mod task;

pub use retry::{RetryPolicy, RetryRunner, retry_everything};
pub use scheduler::{ConcurrencyLimit, ConcurrencyScheduler, ExecutionResult};
pub use task::{Task, TaskFuture, TaskList};
