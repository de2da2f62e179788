//! Domain values shared by storage, the source client, and the sync engine.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::Serialize;

/// A tracked repository, the unit of synchronization.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Repository {
    /// Source-assigned identifier, stable across syncs.
    pub id: String,
    pub name: String,
    pub default_branch: String,
    pub remote_url: String,
    /// When this repository was last enriched locally, not when it last changed upstream.
    pub last_updated: DateTime<Utc>,
    /// Language name to byte count, when the source reports it.
    ///
    /// Not persisted; the storage schema has no column for it.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub languages: Option<HashMap<String, u64>>,
}

impl Repository {
    /// Build a repository with no language breakdown.
    #[must_use]
    pub fn new(
        id: impl Into<String>,
        name: impl Into<String>,
        default_branch: impl Into<String>,
        remote_url: impl Into<String>,
        last_updated: DateTime<Utc>,
    ) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            default_branch: default_branch.into(),
            remote_url: remote_url.into(),
            last_updated,
            languages: None,
        }
    }
}

/// An entry from the source's repository list, before enrichment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RepositorySummary {
    pub id: String,
    pub name: String,
}

impl RepositorySummary {
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
        }
    }
}

/// A repository ranked by recent commit activity. Derived, never stored.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ActiveRepository {
    pub id: String,
    pub name: String,
    pub activity_count: u64,
}

/// A commit attributed to a stored repository.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Commit {
    pub id: String,
    pub repository_id: String,
    pub date: DateTime<Utc>,
}
