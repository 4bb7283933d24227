//! ResolutionPipeline - list, resolve in parallel, aggregate, deliver.
//!
//! # Flow
//! 1. `RecordSource::list_records()` (fatal on error)
//! 2. Keep records with both `Arn` and `DefaultVersionId`
//! 3. One `RecordResolver` task per record, run by the `ConcurrencyScheduler`
//! 4. Successful records become the `AggregateOutput`
//! 5. `OutputSink::deliver()` (only in `run`)

use std::sync::Arc;

use chrono::{DateTime, Utc};
use tracing::{Instrument, debug, info, info_span};

use super::builder::PipelineBuilder;
use super::config::PipelineSettings;
use super::resolver::RecordResolver;
use crate::domain::{
    AggregateOutput, Delivery, HarvestError, HarvestEvent, PolicyRecord, RunId, Summary,
};
use crate::engine::{ConcurrencyScheduler, RetryRunner, TaskList};
use crate::ports::{EventSink, OutputSink, ProgressSink, RecordSource, VersionLookup};

/// Result of `ResolutionPipeline::resolve`.
#[derive(Debug, Clone, PartialEq)]
pub struct Resolution {
    pub summary: Summary,
    pub output: AggregateOutput,
}

/// Result of a full `ResolutionPipeline::run`.
#[derive(Debug, Clone, PartialEq)]
pub struct PipelineReport {
    pub run_id: RunId,
    pub summary: Summary,
    pub delivery: Delivery,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
}

pub struct ResolutionPipeline {
    source: Arc<dyn RecordSource>,
    lookup: Arc<dyn VersionLookup>,
    output: Arc<dyn OutputSink>,
    progress: Arc<dyn ProgressSink>,
    events: Arc<dyn EventSink>,
    settings: PipelineSettings,
}

impl ResolutionPipeline {
    pub(crate) fn new(
        source: Arc<dyn RecordSource>,
        lookup: Arc<dyn VersionLookup>,
        output: Arc<dyn OutputSink>,
        progress: Arc<dyn ProgressSink>,
        events: Arc<dyn EventSink>,
        settings: PipelineSettings,
    ) -> Self {
        Self {
            source,
            lookup,
            output,
            progress,
            events,
            settings,
        }
    }

    pub fn builder() -> PipelineBuilder {
        PipelineBuilder::new()
    }

    pub fn settings(&self) -> &PipelineSettings {
        &self.settings
    }

    /// Resolve every eligible record without delivering the result.
    ///
    /// Only a source failure is fatal. Lookup and parse failures shrink the
    /// output and the `succeeded` count; they never abort the run.
    pub async fn resolve(&self) -> Result<Resolution, HarvestError> {
        self.events.emit(HarvestEvent::ListingRecords);
        let candidates = self.source.list_records().await?;
        let candidate_count = candidates.len();

        let records: Vec<PolicyRecord> = candidates
            .into_iter()
            .filter(PolicyRecord::is_eligible)
            .collect();
        let total = records.len();
        debug!(
            candidates = candidate_count,
            eligible = total,
            "records listed"
        );
        self.events.emit(HarvestEvent::RecordsListed {
            candidates: candidate_count,
            eligible: total,
        });

        let resolver = RecordResolver::new(
            self.lookup.clone(),
            RetryRunner::new(self.settings.retry.clone()),
            self.progress.clone(),
            self.events.clone(),
        );
        let tasks: TaskList<PolicyRecord> = records
            .into_iter()
            .map(|record| resolver.task(record))
            .collect();

        self.progress.start(total as u64);
        let results = ConcurrencyScheduler::new(self.settings.concurrency)
            .run(tasks)
            .await;
        self.progress.stop();

        let resolved = results.into_successes();
        let summary = Summary::new(resolved.len(), total);
        let output = AggregateOutput::from_resolved(resolved);

        info!(
            succeeded = summary.succeeded,
            failed = summary.failed(),
            keys = output.len(),
            "resolution finished"
        );
        self.events.emit(HarvestEvent::Resolved(summary));

        Ok(Resolution { summary, output })
    }

    /// Resolve, then hand the output to the output sink.
    pub async fn run(&self) -> Result<PipelineReport, HarvestError> {
        let run_id = RunId::generate();
        let span = info_span!("harvest", %run_id, concurrency = %self.settings.concurrency);

        async move {
            let started_at = Utc::now();
            let Resolution { summary, output } = self.resolve().await?;

            let delivery = self.output.deliver(&summary, &output).await?;
            self.events.emit(HarvestEvent::Delivered {
                count: summary.succeeded,
                delivery: delivery.clone(),
            });

            Ok::<_, HarvestError>(PipelineReport {
                run_id,
                summary,
                delivery,
                started_at,
                finished_at: Utc::now(),
            })
        }
        .instrument(span)
        .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::ErrorKind;
    use crate::engine::{ConcurrencyLimit, RetryPolicy};
    use crate::impls::{
        CountingProgress, FileOutput, InMemorySource, MemoryOutput, RecordingEventSink, Script,
        ScriptedLookup,
    };
    use rstest::rstest;
    use serde_json::json;

    fn arn(name: &str) -> String {
        format!("arn:aws:iam::aws:policy/{name}")
    }

    fn record(name: &str) -> PolicyRecord {
        PolicyRecord::new(name, arn(name), "v1")
    }

    fn payload(name: &str) -> String {
        ScriptedLookup::version_payload("v1", json!({"Sid": name}))
    }

    fn lookup_for(names: &[&str]) -> ScriptedLookup {
        names.iter().fold(ScriptedLookup::new(), |lookup, name| {
            lookup.with(arn(name), Script::Respond(payload(name)))
        })
    }

    struct Harness {
        progress: Arc<CountingProgress>,
        events: Arc<RecordingEventSink>,
        output: Arc<MemoryOutput>,
        pipeline: ResolutionPipeline,
    }

    fn harness(
        records: Vec<PolicyRecord>,
        lookup: Arc<ScriptedLookup>,
        settings: PipelineSettings,
    ) -> Harness {
        let progress = Arc::new(CountingProgress::new());
        let events = Arc::new(RecordingEventSink::new());
        let output = Arc::new(MemoryOutput::new());
        let pipeline = ResolutionPipeline::builder()
            .source(Arc::new(InMemorySource::new(records)))
            .lookup(lookup)
            .output(output.clone())
            .progress(progress.clone())
            .events(events.clone())
            .settings(settings)
            .build()
            .unwrap();
        Harness {
            progress,
            events,
            output,
            pipeline,
        }
    }

    #[tokio::test(start_paused = true)]
    async fn failed_record_is_skipped_and_the_rest_delivered() {
        let lookup = Arc::new(
            lookup_for(&["A", "C"]).with(arn("B"), Script::AlwaysFail(ErrorKind::Transient)),
        );
        let h = harness(
            vec![record("A"), record("B"), record("C")],
            lookup.clone(),
            PipelineSettings::default(),
        );

        let report = h.pipeline.run().await.unwrap();

        assert_eq!(report.summary, Summary::new(2, 3));
        assert_eq!(report.summary.to_string(), "2 out of 3");
        assert_eq!(report.delivery, Delivery::Stdout);
        assert!(report.finished_at >= report.started_at);
        assert_eq!(h.progress.total(), 3);
        assert_eq!(h.progress.current(), 3);
        assert!(h.progress.was_stopped());
        assert_eq!(lookup.calls(&arn("B")), 4);

        let (summary, output) = h.output.delivered().unwrap();
        assert_eq!(summary, report.summary);
        assert_eq!(output.keys().collect::<Vec<_>>(), vec!["A", "C"]);
        assert!(output.iter().all(|(_, record)| record.is_resolved()));

        assert!(matches!(
            h.events.events().last(),
            Some(HarvestEvent::Delivered { count: 2, .. })
        ));
    }

    #[tokio::test]
    async fn panicking_lookup_is_counted_as_a_failure() {
        let lookup = Arc::new(lookup_for(&["A", "C"]).with(arn("B"), Script::Panic));
        let h = harness(
            vec![record("A"), record("B"), record("C")],
            lookup,
            PipelineSettings::default(),
        );

        let resolution = h.pipeline.resolve().await.unwrap();

        assert_eq!(resolution.summary, Summary::new(2, 3));
        assert_eq!(resolution.output.keys().collect::<Vec<_>>(), vec!["A", "C"]);
        assert_eq!(h.progress.current(), h.progress.total());
        assert_eq!(h.progress.current(), 3);
        assert!(h.events.events().iter().any(
            |e| matches!(e, HarvestEvent::LookupFailed { policy, .. } if policy == "B")
        ));
    }

    #[tokio::test]
    async fn empty_listing_delivers_an_empty_object() {
        let h = harness(
            vec![],
            Arc::new(ScriptedLookup::new()),
            PipelineSettings::default(),
        );

        let report = h.pipeline.run().await.unwrap();

        assert_eq!(report.summary, Summary::new(0, 0));
        assert!(h.progress.was_started());
        assert_eq!(h.progress.total(), 0);
        let (_, output) = h.output.delivered().unwrap();
        assert_eq!(output.to_pretty_json().unwrap(), b"{}");
    }

    #[tokio::test]
    async fn ineligible_records_are_neither_fetched_nor_counted() {
        let no_version = record("B").without(PolicyRecord::DEFAULT_VERSION_ID);
        let no_arn = record("C").without(PolicyRecord::ARN);
        let lookup = Arc::new(lookup_for(&["A", "B", "C"]));
        let h = harness(
            vec![record("A"), no_version, no_arn],
            lookup.clone(),
            PipelineSettings::default(),
        );

        let resolution = h.pipeline.resolve().await.unwrap();

        assert_eq!(resolution.summary, Summary::new(1, 1));
        assert_eq!(lookup.calls(&arn("B")), 0);
        assert_eq!(h.progress.total(), 1);
        assert!(h.events.events().contains(&HarvestEvent::RecordsListed {
            candidates: 3,
            eligible: 1,
        }));
    }

    #[tokio::test]
    async fn output_is_sorted_regardless_of_listing_order() {
        let names = ["zeta", "Alpha", "beta", "Gamma"];
        let h = harness(
            names.iter().map(|n| record(n)).collect(),
            Arc::new(lookup_for(&names)),
            PipelineSettings::default(),
        );

        let resolution = h.pipeline.resolve().await.unwrap();

        assert_eq!(
            resolution.output.keys().collect::<Vec<_>>(),
            vec!["Alpha", "Gamma", "beta", "zeta"]
        );
        assert_eq!(
            resolution.output.get("beta").unwrap().document(),
            Some(&json!({"Sid": "beta"}))
        );
    }

    #[rstest]
    #[case::zero(0)]
    #[case::negative(-3)]
    #[case::one(1)]
    #[case::wider_than_input(64)]
    #[tokio::test]
    async fn output_does_not_depend_on_concurrency(#[case] concurrency: i64) {
        let names = ["A", "B", "C", "D", "E"];
        let records: Vec<_> = names.iter().map(|n| record(n)).collect();

        let baseline = harness(
            records.clone(),
            Arc::new(lookup_for(&names)),
            PipelineSettings::default(),
        );
        let other = harness(
            records,
            Arc::new(lookup_for(&names)),
            PipelineSettings::default().with_concurrency(ConcurrencyLimit::new(concurrency)),
        );

        assert_eq!(
            baseline.pipeline.resolve().await.unwrap(),
            other.pipeline.resolve().await.unwrap()
        );
    }

    #[tokio::test]
    async fn repeated_runs_are_identical() {
        let names = ["A", "B"];
        let h = harness(
            names.iter().map(|n| record(n)).collect(),
            Arc::new(lookup_for(&names)),
            PipelineSettings::default(),
        );

        let first = h.pipeline.resolve().await.unwrap();
        let second = h.pipeline.resolve().await.unwrap();

        assert_eq!(first, second);
        assert_eq!(
            first.output.to_pretty_json().unwrap(),
            second.output.to_pretty_json().unwrap()
        );
    }

    #[tokio::test]
    async fn source_failure_aborts_before_any_work() {
        let progress = Arc::new(CountingProgress::new());
        let output = Arc::new(MemoryOutput::new());
        let pipeline = ResolutionPipeline::builder()
            .source(Arc::new(InMemorySource::failing("credentials expired")))
            .lookup(Arc::new(ScriptedLookup::new()))
            .output(output.clone())
            .progress(progress.clone())
            .build()
            .unwrap();

        let err = pipeline.run().await.unwrap_err();

        assert!(matches!(err, HarvestError::Source(msg) if msg == "credentials expired"));
        assert!(!progress.was_started());
        assert!(output.delivered().is_none());
    }

    #[tokio::test]
    async fn malformed_payload_is_excluded_from_output() {
        let lookup = Arc::new(
            lookup_for(&["A"]).with(arn("B"), Script::Respond("<html>oops</html>".to_string())),
        );
        let h = harness(
            vec![record("A"), record("B")],
            lookup.clone(),
            PipelineSettings::default(),
        );

        let resolution = h.pipeline.resolve().await.unwrap();

        assert_eq!(resolution.summary, Summary::new(1, 2));
        assert!(resolution.output.get("B").is_none());
        assert_eq!(lookup.calls(&arn("B")), 1);
        assert!(h.events.events().contains(&HarvestEvent::ParseFailed {
            policy: "B".to_string(),
            raw: "<html>oops</html>".to_string(),
        }));
    }

    #[tokio::test]
    async fn retries_follow_configured_policy() {
        let lookup = Arc::new(ScriptedLookup::new().with(
            arn("A"),
            Script::FailThenRespond {
                failures: 1,
                payload: payload("A"),
            },
        ));
        let h = harness(
            vec![record("A")],
            lookup.clone(),
            PipelineSettings::default().with_retry(RetryPolicy::immediate(0)),
        );

        let resolution = h.pipeline.resolve().await.unwrap();

        assert_eq!(resolution.summary, Summary::new(0, 1));
        assert_eq!(lookup.calls(&arn("A")), 1);
    }

    #[tokio::test]
    async fn unwritable_output_is_fatal() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("missing").join("policies.json");
        let pipeline = ResolutionPipeline::builder()
            .source(Arc::new(InMemorySource::new(vec![record("A")])))
            .lookup(Arc::new(lookup_for(&["A"])))
            .output(Arc::new(FileOutput::new(&path)))
            .build()
            .unwrap();

        let err = pipeline.run().await.unwrap_err();

        assert!(matches!(err, HarvestError::Output { path: p, .. } if p == path));
    }

    #[tokio::test]
    async fn file_delivery_reports_path() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("policies.json");
        let pipeline = ResolutionPipeline::builder()
            .source(Arc::new(InMemorySource::new(vec![record("A")])))
            .lookup(Arc::new(lookup_for(&["A"])))
            .output(Arc::new(FileOutput::new(&path)))
            .build()
            .unwrap();

        let report = pipeline.run().await.unwrap();

        assert_eq!(report.delivery, Delivery::File(path.clone()));
        let written: serde_json::Value =
            serde_json::from_slice(&std::fs::read(&path).unwrap()).unwrap();
        assert_eq!(written["A"]["Document"], json!({"Sid": "A"}));
        assert_eq!(written["A"]["VersionId"], "v1");
    }
}
