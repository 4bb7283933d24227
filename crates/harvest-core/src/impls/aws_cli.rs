//! Collaborators backed by the `aws` command line.
//!
//! - `AwsCliSource`: `aws iam list-policies --scope AWS`
//! - `AwsCliLookup`: `aws iam get-policy-version --policy-arn <arn> --version-id <id>`
//!
//! Credentials and region come from the CLI's own configuration chain.

use std::ffi::OsStr;
use std::path::{Path, PathBuf};
use std::process::{Output, Stdio};

use async_trait::async_trait;
use serde::Deserialize;
use tokio::process::Command;
use tracing::debug;

use crate::domain::{ErrorKind, HarvestError, LookupError, PolicyRecord};
use crate::ports::{RecordSource, VersionLookup};

/// Error codes for which retrying the same call cannot succeed.
const PERMANENT_ERROR_CODES: &[&str] = &["NoSuchEntity", "InvalidInput", "AccessDenied"];

/// Location of the `aws` executable.
#[derive(Debug, Clone)]
pub struct AwsCli {
    program: PathBuf,
}

impl Default for AwsCli {
    fn default() -> Self {
        Self::new("aws")
    }
}

impl AwsCli {
    pub fn new(program: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
        }
    }

    pub fn program(&self) -> &Path {
        &self.program
    }

    async fn exec<I, S>(&self, args: I) -> std::io::Result<Output>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<OsStr>,
    {
        Command::new(&self.program)
            .args(args)
            .args(["--output", "json"])
            .env("AWS_PAGER", "")
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .output()
            .await
    }
}

#[derive(Deserialize)]
#[serde(rename_all = "PascalCase")]
struct ListPoliciesResponse {
    #[serde(default)]
    policies: Vec<PolicyRecord>,
}

/// Lists every AWS managed policy.
#[derive(Debug, Clone, Default)]
pub struct AwsCliSource {
    cli: AwsCli,
}

impl AwsCliSource {
    pub fn new(cli: AwsCli) -> Self {
        Self { cli }
    }
}

#[async_trait]
impl RecordSource for AwsCliSource {
    async fn list_records(&self) -> Result<Vec<PolicyRecord>, HarvestError> {
        let output = self
            .cli
            .exec(["iam", "list-policies", "--scope", "AWS"])
            .await
            .map_err(|e| {
                HarvestError::Source(format!(
                    "failed to run {}: {e}",
                    self.cli.program().display()
                ))
            })?;

        if !output.status.success() {
            return Err(HarvestError::Source(failure_message(&output)));
        }

        let response: ListPoliciesResponse =
            serde_json::from_slice(&output.stdout).map_err(HarvestError::SourcePayload)?;
        debug!(count = response.policies.len(), "listed managed policies");
        Ok(response.policies)
    }
}

/// Fetches one policy version.
#[derive(Debug, Clone, Default)]
pub struct AwsCliLookup {
    cli: AwsCli,
}

impl AwsCliLookup {
    pub fn new(cli: AwsCli) -> Self {
        Self { cli }
    }
}

#[async_trait]
impl VersionLookup for AwsCliLookup {
    async fn get_version(&self, arn: &str, version_id: &str) -> Result<String, LookupError> {
        let output = self
            .cli
            .exec([
                "iam",
                "get-policy-version",
                "--policy-arn",
                arn,
                "--version-id",
                version_id,
            ])
            .await
            .map_err(|e| LookupError::transient(arn, format!("failed to run aws: {e}")))?;

        if output.status.success() {
            return Ok(String::from_utf8_lossy(&output.stdout).into_owned());
        }

        let message = failure_message(&output);
        Err(match classify_stderr(&message) {
            ErrorKind::Permanent => LookupError::permanent(arn, message),
            ErrorKind::Transient => LookupError::transient(arn, message),
        })
    }
}

fn failure_message(output: &Output) -> String {
    let stderr = String::from_utf8_lossy(&output.stderr);
    let stderr = stderr.trim();
    if stderr.is_empty() {
        format!("aws exited with {}", output.status)
    } else {
        stderr.to_string()
    }
}

/// Classify an `aws` error message by the service error code it mentions.
pub(crate) fn classify_stderr(message: &str) -> ErrorKind {
    if PERMANENT_ERROR_CODES
        .iter()
        .any(|code| message.contains(&format!("({code})")))
    {
        ErrorKind::Permanent
    } else {
        ErrorKind::Transient
    }
}
