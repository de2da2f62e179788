use async_trait::async_trait;

use crate::model::{Repository, RepositorySummary};
use crate::settings::SourceCredentials;

use super::errors::Result;

/// Read-only access to an external repository host.
///
/// Implementations hold no per-call state and perform no retries; each call
/// is one network round trip that either yields a value or a [`SourceError`].
///
/// [`SourceError`]: super::SourceError
#[async_trait]
pub trait RepositorySource: Send + Sync {
    /// Short name for logs, e.g. `"azure"`.
    fn source_name(&self) -> &'static str;

    /// List the repositories of `credentials.organization`/`credentials.project`.
    async fn list_repositories(
        &self,
        credentials: &SourceCredentials,
    ) -> Result<Vec<RepositorySummary>>;

    /// Fetch one repository's full detail.
    ///
    /// The returned value's `last_updated` is the local time the detail was
    /// decoded, not a field of the remote payload.
    async fn fetch_repository_detail(
        &self,
        credentials: &SourceCredentials,
        repository_id: &str,
    ) -> Result<Repository>;
}
