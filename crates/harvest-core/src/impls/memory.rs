//! In-memory collaborators for development and tests.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicU32, AtomicU64, Ordering};
use std::sync::{Mutex, PoisonError};

use async_trait::async_trait;
use serde_json::{Value, json};

use crate::domain::{
    AggregateOutput, Delivery, ErrorKind, HarvestError, HarvestEvent, LookupError, PolicyRecord,
    Summary,
};
use crate::ports::{EventSink, OutputSink, ProgressSink, RecordSource, VersionLookup};

/// Record source backed by a fixed list (or a fixed failure).
#[derive(Debug, Clone)]
pub struct InMemorySource {
    records: Result<Vec<PolicyRecord>, String>,
}

impl InMemorySource {
    pub fn new(records: Vec<PolicyRecord>) -> Self {
        Self {
            records: Ok(records),
        }
    }

    /// A source that is always unreachable.
    pub fn failing(message: impl Into<String>) -> Self {
        Self {
            records: Err(message.into()),
        }
    }
}

#[async_trait]
impl RecordSource for InMemorySource {
    async fn list_records(&self) -> Result<Vec<PolicyRecord>, HarvestError> {
        self.records.clone().map_err(HarvestError::Source)
    }
}

/// How a scripted ARN responds.
#[derive(Debug, Clone)]
pub enum Script {
    /// Return this payload on every call.
    Respond(String),

    /// Fail with a transient error `failures` times, then return the payload.
    FailThenRespond { failures: u32, payload: String },

    /// Fail on every call with the given classification.
    AlwaysFail(ErrorKind),

    /// Panic inside the lookup.
    Panic,
}

/// Version lookup that answers from per-ARN scripts and counts calls.
///
/// An ARN without a script fails transiently.
#[derive(Debug, Default)]
pub struct ScriptedLookup {
    scripts: HashMap<String, (Script, AtomicU32)>,
}

impl ScriptedLookup {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, arn: impl Into<String>, script: Script) -> Self {
        self.scripts.insert(arn.into(), (script, AtomicU32::new(0)));
        self
    }

    /// Number of `get_version` calls made for `arn`.
    pub fn calls(&self, arn: &str) -> u32 {
        self.scripts
            .get(arn)
            .map(|(_, calls)| calls.load(Ordering::SeqCst))
            .unwrap_or(0)
    }

    /// A well-formed `get-policy-version` payload.
    pub fn version_payload(version_id: &str, document: Value) -> String {
        json!({
            "PolicyVersion": {
                "Document": document,
                "VersionId": version_id,
                "IsDefaultVersion": true,
            }
        })
        .to_string()
    }
}

#[async_trait]
impl VersionLookup for ScriptedLookup {
    async fn get_version(&self, arn: &str, version_id: &str) -> Result<String, LookupError> {
        let Some((script, calls)) = self.scripts.get(arn) else {
            return Err(LookupError::transient(arn, "no script for arn"));
        };
        let call = calls.fetch_add(1, Ordering::SeqCst) + 1;

        match script {
            Script::Respond(payload) => Ok(payload.clone()),
            Script::FailThenRespond { failures, payload } => {
                if call <= *failures {
                    Err(LookupError::transient(
                        arn,
                        format!("scripted failure {call}/{failures} for {version_id}"),
                    ))
                } else {
                    Ok(payload.clone())
                }
            }
            Script::AlwaysFail(ErrorKind::Transient) => {
                Err(LookupError::transient(arn, "scripted transient failure"))
            }
            Script::AlwaysFail(ErrorKind::Permanent) => {
                Err(LookupError::permanent(arn, "scripted permanent failure"))
            }
            Script::Panic => panic!("scripted panic for {arn}"),
        }
    }
}

/// Progress sink that only counts.
#[derive(Debug, Default)]
pub struct CountingProgress {
    total: AtomicU64,
    current: AtomicU64,
    started: AtomicBool,
    stopped: AtomicBool,
}

impl CountingProgress {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn total(&self) -> u64 {
        self.total.load(Ordering::SeqCst)
    }

    pub fn current(&self) -> u64 {
        self.current.load(Ordering::SeqCst)
    }

    pub fn was_started(&self) -> bool {
        self.started.load(Ordering::SeqCst)
    }

    pub fn was_stopped(&self) -> bool {
        self.stopped.load(Ordering::SeqCst)
    }
}

impl ProgressSink for CountingProgress {
    fn start(&self, total: u64) {
        self.total.store(total, Ordering::SeqCst);
        self.current.store(0, Ordering::SeqCst);
        self.started.store(true, Ordering::SeqCst);
    }

    fn advance(&self) {
        self.current.fetch_add(1, Ordering::SeqCst);
    }

    fn stop(&self) {
        self.stopped.store(true, Ordering::SeqCst);
    }
}

/// Event sink that keeps every event.
#[derive(Debug, Default)]
pub struct RecordingEventSink {
    events: Mutex<Vec<HarvestEvent>>,
}

impl RecordingEventSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn events(&self) -> Vec<HarvestEvent> {
        self.events
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

impl EventSink for RecordingEventSink {
    fn emit(&self, event: HarvestEvent) {
        self.events
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(event);
    }
}

/// Output sink that keeps the last delivery in memory.
#[derive(Debug, Default)]
pub struct MemoryOutput {
    delivered: Mutex<Option<(Summary, AggregateOutput)>>,
}

impl MemoryOutput {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn delivered(&self) -> Option<(Summary, AggregateOutput)> {
        self.delivered
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

#[async_trait]
impl OutputSink for MemoryOutput {
    async fn deliver(
        &self,
        summary: &Summary,
        output: &AggregateOutput,
    ) -> Result<Delivery, HarvestError> {
        *self
            .delivered
            .lock()
            .unwrap_or_else(PoisonError::into_inner) = Some((*summary, output.clone()));
        Ok(Delivery::Stdout)
    }
}
