//! Sync pass options, results, and constants.

use std::fmt;

use serde::Serialize;

use crate::settings::SourceCredentials;

/// Default number of concurrent enrichment workers.
pub const DEFAULT_CONCURRENCY: usize = 10;

/// Branch recorded for repositories whose source reports none.
pub const DEFAULT_BRANCH: &str = "main";

/// Buffer size of the channel between enrichment workers and the collector.
pub const OUTCOME_CHANNEL_BUFFER_SIZE: usize = 64;

/// Options for one sync pass.
#[derive(Debug, Clone)]
pub struct SyncOptions {
    /// Maximum number of enrichment calls in flight. Zero is treated as one.
    pub concurrency: usize,
    /// Caller-supplied values laid over the configured credentials. Empty
    /// fields leave the configured value in place.
    pub overrides: SourceCredentials,
    /// Branch stored when the source reports an empty default branch.
    pub default_branch: String,
}

impl SyncOptions {
    /// Number of workers to spawn for `total` queued repositories.
    #[must_use]
    pub fn worker_count(&self, total: usize) -> usize {
        self.concurrency.max(1).min(total)
    }
}

impl Default for SyncOptions {
    fn default() -> Self {
        Self {
            concurrency: DEFAULT_CONCURRENCY,
            overrides: SourceCredentials::default(),
            default_branch: DEFAULT_BRANCH.to_string(),
        }
    }
}

/// Where a repository failed during a pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SyncStage {
    /// The detail fetch failed.
    Enrich,
    /// The detail was fetched but the upsert failed.
    Persist,
}

impl fmt::Display for SyncStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SyncStage::Enrich => f.write_str("enrich"),
            SyncStage::Persist => f.write_str("persist"),
        }
    }
}

/// A per-repository failure. Collected into the summary, never raised.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SyncFailure {
    pub repository_id: String,
    pub repository_name: String,
    pub stage: SyncStage,
    pub message: String,
}

/// Outcome of one sync pass.
#[derive(Debug, Default, Clone, Serialize)]
#[must_use = "SyncSummary may contain per-repository failures that should be reported"]
pub struct SyncSummary {
    /// The group that was synced.
    pub group: String,
    /// Repositories returned by the list call.
    pub total: usize,
    /// Repositories enriched and persisted.
    pub succeeded: usize,
    /// Repositories that failed, in collection order.
    pub failures: Vec<SyncFailure>,
}

impl SyncSummary {
    #[inline]
    pub fn failed(&self) -> usize {
        self.failures.len()
    }

    /// Whether every listed repository was persisted.
    #[inline]
    pub fn is_clean(&self) -> bool {
        self.failures.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_options_use_default_concurrency() {
        let options = SyncOptions::default();

        assert_eq!(options.concurrency, DEFAULT_CONCURRENCY);
        assert_eq!(options.overrides, SourceCredentials::default());
        assert_eq!(options.default_branch, DEFAULT_BRANCH);
    }

    #[test]
    fn worker_count_is_bounded_by_queue_length() {
        let options = SyncOptions {
            concurrency: 10,
            ..SyncOptions::default()
        };

        assert_eq!(options.worker_count(3), 3);
        assert_eq!(options.worker_count(25), 10);
        assert_eq!(options.worker_count(0), 0);
    }

    #[test]
    fn zero_concurrency_still_runs_one_worker() {
        let options = SyncOptions {
            concurrency: 0,
            ..SyncOptions::default()
        };

        assert_eq!(options.worker_count(5), 1);
    }

    #[test]
    fn summary_counts_failures() {
        let summary = SyncSummary {
            group: "team".to_string(),
            total: 3,
            succeeded: 2,
            failures: vec![SyncFailure {
                repository_id: "r3".to_string(),
                repository_name: "broken".to_string(),
                stage: SyncStage::Enrich,
                message: "Remote error (HTTP 500): boom".to_string(),
            }],
        };

        assert_eq!(summary.failed(), 1);
        assert!(!summary.is_clean());
        assert!(SyncSummary::default().is_clean());
    }

    #[test]
    fn stage_displays_lowercase() {
        assert_eq!(SyncStage::Enrich.to_string(), "enrich");
        assert_eq!(SyncStage::Persist.to_string(), "persist");
    }
}
