//! Errors and their operational classification.

use std::path::PathBuf;

use thiserror::Error;

/// Operational classification of a failed call.
///
/// - Transient: may succeed if tried again (network, throttling, process spawn).
/// - Permanent: retrying cannot help (unknown policy, bad input, access denied).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    Transient,
    Permanent,
}

/// Failure of a single version lookup call.
#[derive(Debug, Clone, Error)]
#[error("lookup failed for {arn} ({kind:?}): {message}")]
pub struct LookupError {
    arn: String,
    kind: ErrorKind,
    message: String,
}

impl LookupError {
    pub fn transient(arn: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            arn: arn.into(),
            kind: ErrorKind::Transient,
            message: message.into(),
        }
    }

    pub fn permanent(arn: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            arn: arn.into(),
            kind: ErrorKind::Permanent,
            message: message.into(),
        }
    }

    pub fn arn(&self) -> &str {
        &self.arn
    }

    pub fn kind(&self) -> ErrorKind {
        self.kind
    }

    pub fn message(&self) -> &str {
        &self.message
    }
}

/// Pipeline-fatal errors.
///
/// Per-record failures never show up here: they are recovered locally and
/// reported as `Outcome::Failure`.
#[derive(Debug, Error)]
pub enum HarvestError {
    #[error("record source unavailable: {0}")]
    Source(String),

    #[error("record source returned unparseable data: {0}")]
    SourcePayload(#[source] serde_json::Error),

    #[error("failed to serialize output: {0}")]
    Serialize(#[source] serde_json::Error),

    #[error("failed to write output to {path}: {source}")]
    Output {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to write output to stdout: {0}")]
    Stdout(#[source] std::io::Error),
}
