//! Retry policy and runner: bounded retry with randomized backoff.

use std::fmt::Display;
use std::future::Future;
use std::time::Duration;

use rand::Rng;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::domain::{ErrorKind, FailureReason, Outcome};

/// Retry policy for a fallible call.
///
/// The delay before each retry is drawn uniformly from
/// `[base_delay, base_delay + max_jitter)`. There is no exponential growth:
/// the lookup is rate-sensitive, and spreading retries randomly matters more
/// than backing off further on each attempt.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RetryPolicy {
    /// Retries after the initial attempt (total attempts = max_retries + 1).
    pub max_retries: u32,

    /// Fixed part of every backoff delay.
    pub base_delay: Duration,

    /// Upper bound (exclusive) of the random part of every backoff delay.
    pub max_jitter: Duration,
}

impl Default for RetryPolicy {
    /// 3 retries, 2s base + up to 5s jitter.
    fn default() -> Self {
        Self {
            max_retries: 3,
            base_delay: Duration::from_millis(2000),
            max_jitter: Duration::from_millis(5000),
        }
    }
}

impl RetryPolicy {
    pub fn new(max_retries: u32, base_delay: Duration, max_jitter: Duration) -> Self {
        Self {
            max_retries,
            base_delay,
            max_jitter,
        }
    }

    /// No waiting between attempts.
    pub fn immediate(max_retries: u32) -> Self {
        Self::new(max_retries, Duration::ZERO, Duration::ZERO)
    }

    pub fn max_attempts(&self) -> u32 {
        self.max_retries.saturating_add(1)
    }

    /// Draw the delay to wait before the next retry.
    pub fn next_delay(&self) -> Duration {
        let jitter_ms = self.max_jitter.as_millis() as u64;
        if jitter_ms == 0 {
            return self.base_delay;
        }
        let jitter = rand::thread_rng().gen_range(0..jitter_ms);
        self.base_delay + Duration::from_millis(jitter)
    }
}

/// Classifier that treats every error as transient.
pub fn retry_everything<E>(_error: &E) -> ErrorKind {
    ErrorKind::Transient
}

/// Wraps a fallible async operation with the retry policy.
///
/// Never panics and never returns an error: exhausting the attempts yields
/// `Outcome::Failure`.
#[derive(Debug, Clone, Default)]
pub struct RetryRunner {
    policy: RetryPolicy,
}

impl RetryRunner {
    pub fn new(policy: RetryPolicy) -> Self {
        Self { policy }
    }

    pub fn policy(&self) -> &RetryPolicy {
        &self.policy
    }

    /// Retry on any error.
    ///
    /// `on_retry` receives the 1-based retry number right before each retry.
    pub async fn run<T, E, F, Fut>(&self, op: F, on_retry: impl FnMut(u32)) -> Outcome<T>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, E>>,
        E: Display,
    {
        self.run_classified(op, retry_everything::<E>, on_retry).await
    }

    /// Retry only errors that `classify` reports as transient.
    ///
    /// A permanent error ends the loop at once with
    /// `FailureReason::LookupRejected`.
    pub async fn run_classified<T, E, F, Fut, C>(
        &self,
        mut op: F,
        classify: C,
        mut on_retry: impl FnMut(u32),
    ) -> Outcome<T>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, E>>,
        E: Display,
        C: Fn(&E) -> ErrorKind,
    {
        let max_attempts = self.policy.max_attempts();
        let mut attempt = 0;

        loop {
            attempt += 1;
            let error = match op().await {
                Ok(value) => return Outcome::Success(value),
                Err(error) => error,
            };

            if classify(&error) == ErrorKind::Permanent {
                debug!(attempt, %error, "permanent failure, not retrying");
                return Outcome::Failure(FailureReason::LookupRejected {
                    attempts: attempt,
                    error: error.to_string(),
                });
            }

            if attempt >= max_attempts {
                debug!(attempt, %error, "retries exhausted");
                return Outcome::Failure(FailureReason::LookupExhausted {
                    attempts: attempt,
                    last_error: error.to_string(),
                });
            }

            let delay = self.policy.next_delay();
            debug!(attempt, ?delay, %error, "attempt failed, backing off");
            tokio::time::sleep(delay).await;
            on_retry(attempt);
        }
    }
}
