//! PipelineBuilder - wiring of a `ResolutionPipeline`.
//!
//! Fail-fast: `build()` refuses to produce a pipeline without a record
//! source, a version lookup and an output sink. Progress and event sinks are
//! optional and default to no-ops.

use std::sync::Arc;

use super::config::PipelineSettings;
use super::pipeline::ResolutionPipeline;
use crate::engine::{ConcurrencyLimit, RetryPolicy};
use crate::impls::{NoopEventSink, NoopProgress};
use crate::ports::{EventSink, OutputSink, ProgressSink, RecordSource, VersionLookup};

/// BuildError is returned when required collaborators are missing.
#[derive(Debug, thiserror::Error)]
pub enum BuildError {
    #[error("Missing collaborators: {0:?}. A pipeline needs a source, a lookup and an output.")]
    MissingCollaborators(Vec<String>),
}

/// Assembles a `ResolutionPipeline`.
///
/// # Example
/// ```ignore
/// let pipeline = PipelineBuilder::new()
///     .source(Arc::new(AwsCliSource::default()))
///     .lookup(Arc::new(AwsCliLookup::default()))
///     .output(Arc::new(StdoutOutput))
///     .concurrency(ConcurrencyLimit::new(20))
///     .build()?;
/// ```
#[derive(Default)]
pub struct PipelineBuilder {
    source: Option<Arc<dyn RecordSource>>,
    lookup: Option<Arc<dyn VersionLookup>>,
    output: Option<Arc<dyn OutputSink>>,
    progress: Option<Arc<dyn ProgressSink>>,
    events: Option<Arc<dyn EventSink>>,
    settings: PipelineSettings,
}

impl PipelineBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn source(mut self, source: Arc<dyn RecordSource>) -> Self {
        self.source = Some(source);
        self
    }

    pub fn lookup(mut self, lookup: Arc<dyn VersionLookup>) -> Self {
        self.lookup = Some(lookup);
        self
    }

    pub fn output(mut self, output: Arc<dyn OutputSink>) -> Self {
        self.output = Some(output);
        self
    }

    pub fn progress(mut self, progress: Arc<dyn ProgressSink>) -> Self {
        self.progress = Some(progress);
        self
    }

    pub fn events(mut self, events: Arc<dyn EventSink>) -> Self {
        self.events = Some(events);
        self
    }

    pub fn settings(mut self, settings: PipelineSettings) -> Self {
        self.settings = settings;
        self
    }

    pub fn concurrency(mut self, concurrency: ConcurrencyLimit) -> Self {
        self.settings.concurrency = concurrency;
        self
    }

    pub fn retry_policy(mut self, retry: RetryPolicy) -> Self {
        self.settings.retry = retry;
        self
    }

    pub fn build(self) -> Result<ResolutionPipeline, BuildError> {
        let (source, lookup, output) = match (self.source, self.lookup, self.output) {
            (Some(source), Some(lookup), Some(output)) => (source, lookup, output),
            (source, lookup, output) => {
                let missing = [
                    ("source", source.is_none()),
                    ("lookup", lookup.is_none()),
                    ("output", output.is_none()),
                ]
                .into_iter()
                .filter_map(|(name, absent)| absent.then(|| name.to_string()))
                .collect();
                return Err(BuildError::MissingCollaborators(missing));
            }
        };

        Ok(ResolutionPipeline::new(
            source,
            lookup,
            output,
            self.progress.unwrap_or_else(|| Arc::new(NoopProgress)),
            self.events.unwrap_or_else(|| Arc::new(NoopEventSink)),
            self.settings,
        ))
    }
}
