//! VersionLookup port - the slow, rate-sensitive per-record call.

use async_trait::async_trait;

use crate::domain::LookupError;

/// Fetches the raw payload for one policy version.
///
/// The payload is returned unparsed; parsing is the resolver's job so that a
/// malformed payload is never mistaken for a failed (retryable) call.
/// Implementations classify their errors via `LookupError::kind`.
#[async_trait]
pub trait VersionLookup: Send + Sync {
    async fn get_version(&self, arn: &str, version_id: &str) -> Result<String, LookupError>;
}
