//! RecordResolver - the body of one fetch task.
//!
//! # Flow
//! 1. Look up `(Arn, DefaultVersionId)` through the retry runner
//! 2. Parse the payload (never retried: parsing is local and deterministic)
//! 3. Attach `Document`/`VersionId` to the record
//! 4. Advance progress, whatever the outcome (panics and cancellation included)

use std::sync::Arc;

use tracing::{debug, warn};

use crate::domain::{
    FailureReason, HarvestEvent, LookupError, Outcome, PolicyRecord, ResolvedVersion,
};
use crate::engine::{RetryRunner, Task};
use crate::ports::{EventSink, ProgressSink, VersionLookup};

/// Resolves records one at a time. Cheap to clone: every field is shared.
#[derive(Clone)]
pub struct RecordResolver {
    lookup: Arc<dyn VersionLookup>,
    retry: RetryRunner,
    progress: Arc<dyn ProgressSink>,
    events: Arc<dyn EventSink>,
}

impl RecordResolver {
    pub fn new(
        lookup: Arc<dyn VersionLookup>,
        retry: RetryRunner,
        progress: Arc<dyn ProgressSink>,
        events: Arc<dyn EventSink>,
    ) -> Self {
        Self {
            lookup,
            retry,
            progress,
            events,
        }
    }

    /// Wrap the resolution of `record` as a deferred task.
    pub fn task(&self, record: PolicyRecord) -> Task<PolicyRecord> {
        let resolver = self.clone();
        Task::new(move || async move { resolver.resolve(record).await })
    }

    /// Resolve one record and signal one unit of progress.
    pub async fn resolve(&self, record: PolicyRecord) -> Outcome<PolicyRecord> {
        let mut guard = Completion {
            progress: &*self.progress,
            events: &*self.events,
            policy: record.display_key().to_string(),
            finished: false,
        };
        let outcome = self.resolve_record(record).await;
        guard.finished = true;
        outcome
    }

    async fn resolve_record(&self, mut record: PolicyRecord) -> Outcome<PolicyRecord> {
        let policy = record.display_key().to_string();
        let Some((arn, version_id)) = record.lookup_key() else {
            return Outcome::Failure(FailureReason::LookupRejected {
                attempts: 0,
                error: format!("{policy} has no Arn or DefaultVersionId"),
            });
        };

        let lookup = &*self.lookup;
        let events = &*self.events;

        let fetched = self
            .retry
            .run_classified(
                move || async move {
                    lookup
                        .get_version(arn, version_id)
                        .await
                        .inspect_err(|e| {
                            debug!(arn, error = %e, "lookup attempt failed");
                            events.emit(HarvestEvent::LookupAttemptFailed {
                                arn: arn.to_string(),
                                error: e.message().to_string(),
                            });
                        })
                },
                LookupError::kind,
                |retry| {
                    events.emit(HarvestEvent::Retrying {
                        policy: policy.clone(),
                        retry,
                    })
                },
            )
            .await;

        let raw = match fetched {
            Outcome::Success(raw) => raw,
            Outcome::Failure(reason) => {
                warn!(policy = %policy, %reason, "skipping policy");
                events.emit(HarvestEvent::LookupFailed {
                    policy,
                    attempts: reason.attempts(),
                    error: reason.to_string(),
                });
                return Outcome::Failure(reason);
            }
        };

        match ResolvedVersion::parse(&raw) {
            Ok(version) => {
                debug!(policy = %policy, version = %version.version_id, "policy resolved");
                record.attach(version);
                Outcome::Success(record)
            }
            Err(err) => {
                warn!(policy = %policy, error = %err, "unparseable policy version payload");
                events.emit(HarvestEvent::ParseFailed { policy, raw });
                Outcome::Failure(FailureReason::MalformedPayload {
                    error: err.to_string(),
                })
            }
        }
    }
}

/// Advances progress once when a resolution ends, however it ends.
///
/// A resolution dropped before finishing (the lookup panicked or the task was
/// cancelled) is also reported as a failed lookup.
struct Completion<'a> {
    progress: &'a dyn ProgressSink,
    events: &'a dyn EventSink,
    policy: String,
    finished: bool,
}

impl Drop for Completion<'_> {
    fn drop(&mut self) {
        if !self.finished {
            warn!(policy = %self.policy, "resolution aborted");
            self.events.emit(HarvestEvent::LookupFailed {
                policy: std::mem::take(&mut self.policy),
                attempts: 0,
                error: "resolution aborted".to_string(),
            });
        }
        self.progress.advance();
    }
}
