//! Azure DevOps Git REST payloads.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::Deserialize;

use crate::model::{Repository, RepositorySummary};

/// Envelope returned by list endpoints: `{"count": n, "value": [...]}`.
#[derive(Debug, Deserialize)]
pub(crate) struct ListResponse<T> {
    pub value: Vec<T>,
}

/// A Git repository as returned by `_apis/git/repositories`.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct AzureRepository {
    pub id: String,
    pub name: String,
    /// Full ref, e.g. `refs/heads/main`. Absent for empty repositories.
    #[serde(default)]
    pub default_branch: Option<String>,
    #[serde(default)]
    pub remote_url: Option<String>,
    #[serde(default)]
    pub languages: Option<HashMap<String, u64>>,
}

impl AzureRepository {
    pub fn into_summary(self) -> RepositorySummary {
        RepositorySummary::new(self.id, self.name)
    }

    pub fn into_repository(self, enriched_at: DateTime<Utc>) -> Repository {
        Repository {
            id: self.id,
            name: self.name,
            default_branch: self
                .default_branch
                .as_deref()
                .map(branch_name)
                .unwrap_or_default()
                .to_string(),
            remote_url: self.remote_url.unwrap_or_default(),
            last_updated: enriched_at,
            languages: self.languages,
        }
    }
}

/// Strip the `refs/heads/` prefix Azure puts on branch names.
pub(crate) fn branch_name(git_ref: &str) -> &str {
    git_ref.strip_prefix("refs/heads/").unwrap_or(git_ref)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn branch_name_strips_heads_prefix_only() {
        assert_eq!(branch_name("refs/heads/main"), "main");
        assert_eq!(branch_name("refs/heads/feature/x"), "feature/x");
        assert_eq!(branch_name("develop"), "develop");
    }

    #[test]
    fn into_repository_fills_missing_optionals_with_empty_values() {
        let raw: AzureRepository =
            serde_json::from_str(r#"{"id":"r1","name":"empty-repo"}"#).unwrap();
        let at = Utc::now();

        let repo = raw.into_repository(at);

        assert_eq!(repo.default_branch, "");
        assert_eq!(repo.remote_url, "");
        assert_eq!(repo.last_updated, at);
        assert!(repo.languages.is_none());
    }
}
