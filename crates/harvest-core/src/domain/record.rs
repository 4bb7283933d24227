//! Policy records as returned by the record source, and the version payload
//! that resolves them.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// A managed policy entry, kept as the JSON object the source returned.
///
/// Field order is preserved on the way back out: source fields stay where
/// they were and `Document`/`VersionId` are appended on resolution.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PolicyRecord {
    fields: Map<String, Value>,
}

impl PolicyRecord {
    pub const POLICY_NAME: &'static str = "PolicyName";
    pub const ARN: &'static str = "Arn";
    pub const DEFAULT_VERSION_ID: &'static str = "DefaultVersionId";
    pub const DOCUMENT: &'static str = "Document";
    pub const VERSION_ID: &'static str = "VersionId";

    pub fn new(
        policy_name: impl Into<String>,
        arn: impl Into<String>,
        default_version_id: impl Into<String>,
    ) -> Self {
        Self::default()
            .with(Self::POLICY_NAME, policy_name.into())
            .with(Self::ARN, arn.into())
            .with(Self::DEFAULT_VERSION_ID, default_version_id.into())
    }

    /// Set `key`, keeping its position if it already exists.
    pub fn with(mut self, key: &str, value: impl Into<Value>) -> Self {
        self.fields.insert(key.to_string(), value.into());
        self
    }

    pub fn without(mut self, key: &str) -> Self {
        self.fields.shift_remove(key);
        self
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.fields.get(key)
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.fields.keys().map(String::as_str)
    }

    fn str_field(&self, key: &str) -> Option<&str> {
        self.fields.get(key).and_then(Value::as_str)
    }

    pub fn policy_name(&self) -> Option<&str> {
        self.str_field(Self::POLICY_NAME)
    }

    pub fn arn(&self) -> Option<&str> {
        self.str_field(Self::ARN)
    }

    pub fn default_version_id(&self) -> Option<&str> {
        self.str_field(Self::DEFAULT_VERSION_ID)
    }

    /// Set only once the record has been resolved.
    pub fn document(&self) -> Option<&Value> {
        self.fields.get(Self::DOCUMENT)
    }

    /// Set only once the record has been resolved.
    pub fn version_id(&self) -> Option<&str> {
        self.str_field(Self::VERSION_ID)
    }

    /// `(Arn, DefaultVersionId)` when both are present.
    pub fn lookup_key(&self) -> Option<(&str, &str)> {
        match (self.arn(), self.default_version_id()) {
            (Some(arn), Some(version)) => Some((arn, version)),
            _ => None,
        }
    }

    /// A record can be scheduled only if it carries both lookup fields.
    pub fn is_eligible(&self) -> bool {
        self.lookup_key().is_some()
    }

    /// Key used in the aggregate output. Falls back to the ARN for the rare
    /// entry without a name.
    pub fn display_key(&self) -> &str {
        self.policy_name().or(self.arn()).unwrap_or_default()
    }

    pub fn is_resolved(&self) -> bool {
        self.document().is_some() && self.version_id().is_some()
    }

    pub fn attach(&mut self, version: ResolvedVersion) {
        self.fields
            .insert(Self::DOCUMENT.to_string(), version.document);
        self.fields
            .insert(Self::VERSION_ID.to_string(), Value::String(version.version_id));
    }
}

/// The part of a `get-policy-version` payload the pipeline keeps.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct ResolvedVersion {
    pub document: Value,
    pub version_id: String,
}

#[derive(Deserialize)]
#[serde(rename_all = "PascalCase")]
struct VersionPayload {
    policy_version: ResolvedVersion,
}

impl ResolvedVersion {
    /// Parse a raw payload of the form
    /// `{"PolicyVersion": {"Document": .., "VersionId": ..}}`.
    pub fn parse(raw: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str::<VersionPayload>(raw).map(|p| p.policy_version)
    }
}
