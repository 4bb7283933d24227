//! Outcome model: the terminal result of a task.
//!
//! Every layer (retry runner, scheduler, resolver) reports through this type so
//! that a failure can never be confused with a legitimate value.

use serde::{Deserialize, Serialize};

/// Why a task produced no value.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum FailureReason {
    /// Every attempt failed with a transient error.
    LookupExhausted { attempts: u32, last_error: String },

    /// The lookup failed with a permanent error; retrying stopped early.
    LookupRejected { attempts: u32, error: String },

    /// The lookup succeeded but its payload could not be parsed.
    MalformedPayload { error: String },

    /// The task panicked or was cancelled by the runtime.
    Aborted { reason: String },
}

impl FailureReason {
    /// Number of lookup attempts spent before giving up (0 when not applicable).
    pub fn attempts(&self) -> u32 {
        match self {
            FailureReason::LookupExhausted { attempts, .. }
            | FailureReason::LookupRejected { attempts, .. } => *attempts,
            FailureReason::MalformedPayload { .. } | FailureReason::Aborted { .. } => 0,
        }
    }
}

impl std::fmt::Display for FailureReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            FailureReason::LookupExhausted {
                attempts,
                last_error,
            } => write!(f, "gave up after {attempts} attempts: {last_error}"),
            FailureReason::LookupRejected { attempts, error } => {
                write!(f, "rejected on attempt {attempts}: {error}")
            }
            FailureReason::MalformedPayload { error } => write!(f, "malformed payload: {error}"),
            FailureReason::Aborted { reason } => write!(f, "aborted: {reason}"),
        }
    }
}

/// Success with a value, or failure with a reason.
#[derive(Debug, Clone, PartialEq)]
pub enum Outcome<T> {
    Success(T),
    Failure(FailureReason),
}

impl<T> Outcome<T> {
    pub fn is_success(&self) -> bool {
        matches!(self, Outcome::Success(_))
    }

    pub fn success(self) -> Option<T> {
        match self {
            Outcome::Success(value) => Some(value),
            Outcome::Failure(_) => None,
        }
    }

    pub fn failure(&self) -> Option<&FailureReason> {
        match self {
            Outcome::Success(_) => None,
            Outcome::Failure(reason) => Some(reason),
        }
    }
}
