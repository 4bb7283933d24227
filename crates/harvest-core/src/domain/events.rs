//! Events - human-facing status notifications emitted during a run.

use std::path::PathBuf;

use super::aggregate::Summary;

/// Where the aggregate output ended up.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Delivery {
    File(PathBuf),
    Stdout,
}

/// Status notifications.
///
/// These feed the console (status lines), not the tracing log: a sink may
/// drop them entirely without affecting the run.
#[derive(Debug, Clone, PartialEq)]
pub enum HarvestEvent {
    /// Listing candidates from the record source has started.
    ListingRecords,

    /// Candidates listed; `eligible` of them will be scheduled.
    RecordsListed { candidates: usize, eligible: usize },

    /// A single lookup call failed.
    LookupAttemptFailed { arn: String, error: String },

    /// A lookup is about to be retried (1-based retry number).
    Retrying { policy: String, retry: u32 },

    /// A record could not be looked up at all.
    LookupFailed {
        policy: String,
        attempts: u32,
        error: String,
    },

    /// A record's payload could not be parsed; `raw` is the payload as received.
    ParseFailed { policy: String, raw: String },

    /// Resolution finished.
    Resolved(Summary),

    /// Output delivered.
    Delivered { count: usize, delivery: Delivery },
}
