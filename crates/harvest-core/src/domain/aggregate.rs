//! Final, deterministic view of a run.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use super::record::PolicyRecord;

/// Resolved records keyed by policy name, in ascending key order.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AggregateOutput {
    entries: BTreeMap<String, PolicyRecord>,
}

impl AggregateOutput {
    /// Build from successfully resolved records.
    ///
    /// Records are stable-sorted by key and folded in that order, so when two
    /// records share a name the later one overwrites the earlier.
    pub fn from_resolved(mut records: Vec<PolicyRecord>) -> Self {
        records.sort_by(|a, b| a.display_key().cmp(b.display_key()));

        let entries = records.into_iter().fold(BTreeMap::new(), |mut acc, record| {
            acc.insert(record.display_key().to_string(), record);
            acc
        });
        Self { entries }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn get(&self, key: &str) -> Option<&PolicyRecord> {
        self.entries.get(key)
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &PolicyRecord)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// Tab-indented JSON, the format written to files and stdout.
    pub fn to_pretty_json(&self) -> Result<Vec<u8>, serde_json::Error> {
        let mut buf = Vec::new();
        let formatter = serde_json::ser::PrettyFormatter::with_indent(b"\t");
        let mut ser = serde_json::Serializer::with_formatter(&mut buf, formatter);
        self.serialize(&mut ser)?;
        Ok(buf)
    }
}

/// Counts reported at the end of a run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Summary {
    pub succeeded: usize,
    pub total: usize,
}

impl Summary {
    pub fn new(succeeded: usize, total: usize) -> Self {
        Self { succeeded, total }
    }

    pub fn failed(&self) -> usize {
        self.total.saturating_sub(self.succeeded)
    }
}

impl std::fmt::Display for Summary {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} out of {}", self.succeeded, self.total)
    }
}
