//! Task: one deferred unit of work.

use std::fmt;
use std::future::Future;
use std::pin::Pin;

use crate::domain::Outcome;

/// Boxed future produced by starting a task.
pub type TaskFuture<T> = Pin<Box<dyn Future<Output = Outcome<T>> + Send + 'static>>;

/// A zero-argument, one-shot unit of work.
///
/// Nothing runs until the scheduler calls `start`. A task's identity is its
/// index in the `TaskList` it was scheduled with.
pub struct Task<T> {
    run: Box<dyn FnOnce() -> TaskFuture<T> + Send>,
}

/// Ordered tasks, fixed when scheduling starts.
pub type TaskList<T> = Vec<Task<T>>;

impl<T: Send + 'static> Task<T> {
    pub fn new<F, Fut>(f: F) -> Self
    where
        F: FnOnce() -> Fut + Send + 'static,
        Fut: Future<Output = Outcome<T>> + Send + 'static,
    {
        Self {
            run: Box::new(move || Box::pin(f())),
        }
    }

    /// Consume the task and obtain the future that performs it.
    pub fn start(self) -> TaskFuture<T> {
        (self.run)()
    }
}

impl<T> fmt::Debug for Task<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Task").finish_non_exhaustive()
    }
}
