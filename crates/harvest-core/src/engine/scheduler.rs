//! Bounded-concurrency scheduler.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use tokio::task::JoinSet;
use tracing::{trace, warn};

use super::task::TaskList;
use crate::domain::{FailureReason, Outcome};

/// Maximum number of tasks in flight. Always at least 1.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "i64", into = "u64")]
pub struct ConcurrencyLimit(usize);

impl ConcurrencyLimit {
    pub const DEFAULT: ConcurrencyLimit = ConcurrencyLimit(10);

    /// Zero or negative requests are clamped to 1 (serial execution).
    pub fn new(requested: i64) -> Self {
        Self(usize::try_from(requested).unwrap_or(0).max(1))
    }

    pub fn get(self) -> usize {
        self.0
    }
}

impl Default for ConcurrencyLimit {
    fn default() -> Self {
        Self::DEFAULT
    }
}

impl From<i64> for ConcurrencyLimit {
    fn from(requested: i64) -> Self {
        Self::new(requested)
    }
}

impl From<ConcurrencyLimit> for u64 {
    fn from(limit: ConcurrencyLimit) -> Self {
        limit.0 as u64
    }
}

impl std::fmt::Display for ConcurrencyLimit {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        self.0.fmt(f)
    }
}

/// Outcomes of a run, addressed by task index.
///
/// `outcomes[i]` belongs to task `i` of the input list, whatever order the
/// tasks finished in.
#[derive(Debug, Clone, PartialEq)]
pub struct ExecutionResult<T> {
    outcomes: Vec<Outcome<T>>,
}

impl<T> ExecutionResult<T> {
    fn from_slots(slots: Vec<Option<Outcome<T>>>) -> Self {
        let outcomes = slots
            .into_iter()
            .map(|slot| {
                slot.unwrap_or_else(|| {
                    Outcome::Failure(FailureReason::Aborted {
                        reason: "task never reported".to_string(),
                    })
                })
            })
            .collect();
        Self { outcomes }
    }

    pub fn len(&self) -> usize {
        self.outcomes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.outcomes.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&Outcome<T>> {
        self.outcomes.get(index)
    }

    pub fn succeeded(&self) -> usize {
        self.outcomes.iter().filter(|o| o.is_success()).count()
    }

    pub fn into_outcomes(self) -> Vec<Outcome<T>> {
        self.outcomes
    }

    /// Successful values in input order; failures are dropped.
    pub fn into_successes(self) -> Vec<T> {
        self.outcomes.into_iter().filter_map(Outcome::success).collect()
    }
}

/// Runs a task list with at most `limit` tasks in flight.
///
/// Admission is greedy and FIFO by index: whenever a running task finishes,
/// the next not-yet-started task is spawned. The scheduler performs no retry
/// and does not interpret outcomes. A task that panics is recorded as
/// `FailureReason::Aborted` at its own index; the others are unaffected.
#[derive(Debug, Clone, Copy, Default)]
pub struct ConcurrencyScheduler {
    limit: ConcurrencyLimit,
}

impl ConcurrencyScheduler {
    pub fn new(limit: ConcurrencyLimit) -> Self {
        Self { limit }
    }

    pub fn limit(&self) -> ConcurrencyLimit {
        self.limit
    }

    pub async fn run<T: Send + 'static>(&self, tasks: TaskList<T>) -> ExecutionResult<T> {
        let total = tasks.len();
        let limit = self.limit.get();

        let mut slots: Vec<Option<Outcome<T>>> =
            std::iter::repeat_with(|| None).take(total).collect();
        let mut index_of = HashMap::with_capacity(limit.min(total));
        let mut queued = tasks.into_iter().enumerate();
        let mut running = JoinSet::new();

        loop {
            while running.len() < limit {
                let Some((index, task)) = queued.next() else {
                    break;
                };
                let handle = running.spawn(task.start());
                index_of.insert(handle.id(), index);
                trace!(index, in_flight = running.len(), "task admitted");
            }

            let Some(joined) = running.join_next_with_id().await else {
                break;
            };
            let (id, outcome) = match joined {
                Ok((id, outcome)) => (id, outcome),
                Err(err) => {
                    warn!(error = %err, "task did not complete");
                    let reason = err.to_string();
                    (err.id(), Outcome::Failure(FailureReason::Aborted { reason }))
                }
            };

            if let Some(index) = index_of.remove(&id) {
                trace!(index, "task finished");
                slots[index] = Some(outcome);
            }
        }

        ExecutionResult::from_slots(slots)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::task::Task;
    use rstest::rstest;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::{Arc, Mutex};
    use std::time::Duration;

    /// Counts tasks currently running and remembers the peak.
    #[derive(Default)]
    struct InFlight {
        now: AtomicUsize,
        peak: AtomicUsize,
    }

    impl InFlight {
        fn enter(&self) {
            let now = self.now.fetch_add(1, Ordering::SeqCst) + 1;
            self.peak.fetch_max(now, Ordering::SeqCst);
        }

        fn leave(&self) {
            self.now.fetch_sub(1, Ordering::SeqCst);
        }
    }

    /// Task `i` sleeps longer the earlier it is, so completion order is the
    /// reverse of admission order within each wave.
    fn instrumented(
        n: usize,
        gauge: &Arc<InFlight>,
        started: &Arc<Mutex<Vec<usize>>>,
    ) -> TaskList<usize> {
        (0..n)
            .map(|i| {
                let gauge = Arc::clone(gauge);
                let started = Arc::clone(started);
                Task::new(move || async move {
                    gauge.enter();
                    started.lock().unwrap().push(i);
                    tokio::time::sleep(Duration::from_millis((n - i) as u64 * 10)).await;
                    gauge.leave();
                    Outcome::Success(i * 100)
                })
            })
            .collect()
    }

    #[rstest]
    #[case::serial(7, 1)]
    #[case::small_cap(20, 3)]
    #[case::cap_equals_len(5, 5)]
    #[case::cap_exceeds_len(4, 10)]
    #[case::single(1, 10)]
    #[tokio::test(start_paused = true)]
    async fn results_are_index_aligned_and_cap_holds(#[case] n: usize, #[case] cap: i64) {
        let gauge = Arc::new(InFlight::default());
        let started = Arc::new(Mutex::new(Vec::new()));
        let scheduler = ConcurrencyScheduler::new(ConcurrencyLimit::new(cap));

        let result = scheduler.run(instrumented(n, &gauge, &started)).await;

        assert_eq!(result.len(), n);
        assert_eq!(result.succeeded(), n);
        let values = result.into_successes();
        assert_eq!(values, (0..n).map(|i| i * 100).collect::<Vec<_>>());

        let peak = gauge.peak.load(Ordering::SeqCst);
        assert!(peak <= cap as usize, "peak {peak} exceeds cap {cap}");
        assert_eq!(peak, n.min(cap as usize));
        assert_eq!(gauge.now.load(Ordering::SeqCst), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn admission_is_fifo_by_index() {
        let gauge = Arc::new(InFlight::default());
        let started = Arc::new(Mutex::new(Vec::new()));
        let scheduler = ConcurrencyScheduler::new(ConcurrencyLimit::new(2));

        scheduler.run(instrumented(6, &gauge, &started)).await;

        assert_eq!(*started.lock().unwrap(), vec![0, 1, 2, 3, 4, 5]);
    }

    #[tokio::test]
    async fn empty_list_completes_immediately() {
        let scheduler = ConcurrencyScheduler::default();
        let result = scheduler.run(TaskList::<u8>::new()).await;
        assert!(result.is_empty());
        assert_eq!(result.succeeded(), 0);
    }

    #[tokio::test]
    async fn failures_are_collected_untouched() {
        let tasks: TaskList<u32> = (0..4u32)
            .map(|i| {
                Task::new(move || async move {
                    if i % 2 == 0 {
                        Outcome::Success(i)
                    } else {
                        Outcome::Failure(FailureReason::MalformedPayload {
                            error: format!("task {i}"),
                        })
                    }
                })
            })
            .collect();

        let result = ConcurrencyScheduler::new(ConcurrencyLimit::new(2)).run(tasks).await;

        assert_eq!(result.len(), 4);
        assert_eq!(result.succeeded(), 2);
        assert_eq!(result.get(0), Some(&Outcome::Success(0)));
        assert_eq!(
            result.get(3).and_then(Outcome::failure),
            Some(&FailureReason::MalformedPayload {
                error: "task 3".to_string()
            })
        );
    }

    #[tokio::test]
    async fn panicking_task_becomes_aborted_at_its_index() {
        let tasks: TaskList<u32> = (0..3u32)
            .map(|i| {
                Task::new(move || async move {
                    if i == 1 {
                        panic!("boom");
                    }
                    Outcome::Success(i)
                })
            })
            .collect();

        let result = ConcurrencyScheduler::new(ConcurrencyLimit::new(1)).run(tasks).await;
        let outcomes = result.into_outcomes();

        assert_eq!(outcomes[0], Outcome::Success(0));
        assert!(matches!(
            outcomes[1],
            Outcome::Failure(FailureReason::Aborted { .. })
        ));
        assert_eq!(outcomes[2], Outcome::Success(2));
    }

    #[rstest]
    #[case::zero(0, 1)]
    #[case::negative(-4, 1)]
    #[case::one(1, 1)]
    #[case::many(32, 32)]
    fn concurrency_limit_is_clamped(#[case] requested: i64, #[case] expected: usize) {
        assert_eq!(ConcurrencyLimit::new(requested).get(), expected);
    }

    #[test]
    fn concurrency_limit_deserializes_with_clamping() {
        let limit: ConcurrencyLimit = serde_json::from_str("-3").unwrap();
        assert_eq!(limit.get(), 1);
        assert_eq!(ConcurrencyLimit::default().get(), 10);
        assert_eq!(serde_json::to_string(&ConcurrencyLimit::new(4)).unwrap(), "4");
    }
}
