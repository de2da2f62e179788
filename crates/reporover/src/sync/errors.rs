use thiserror::Error;

use crate::settings::ConfigStoreError;
use crate::source::SourceError;
use crate::storage::StorageError;

/// Errors that abort a whole sync pass.
///
/// Per-repository failures are not errors; they are reported in
/// [`SyncSummary::failures`](super::SyncSummary::failures).
#[derive(Debug, Error)]
pub enum SyncError {
    /// Required source settings are still empty after applying overrides.
    #[error("missing source configuration: {}", missing.join(", "))]
    Config { missing: Vec<&'static str> },

    /// Reading or writing the configuration collaborator failed.
    #[error("configuration store error: {0}")]
    ConfigStore(#[from] ConfigStoreError),

    /// The group's database could not be opened.
    #[error("storage for group '{group}' is unavailable: {source}")]
    StorageUnavailable {
        group: String,
        #[source]
        source: StorageError,
    },

    /// The repository list could not be fetched.
    #[error("failed to list repositories: {0}")]
    Fetch(#[source] SourceError),

    /// The collector task crashed or never finished.
    #[error("result collector failed: {0}")]
    Collector(String),
}

impl SyncError {
    /// Whether this is a configuration problem the user can fix by editing settings.
    #[inline]
    pub fn is_config(&self) -> bool {
        matches!(self, Self::Config { .. } | Self::ConfigStore(_))
    }
}

/// Result type for sync operations.
pub type Result<T> = std::result::Result<T, SyncError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn config_error_lists_missing_fields() {
        let err = SyncError::Config {
            missing: vec!["organization", "token"],
        };

        assert_eq!(
            err.to_string(),
            "missing source configuration: organization, token"
        );
        assert!(err.is_config());
    }

    #[test]
    fn fetch_error_keeps_source_message() {
        let err = SyncError::Fetch(SourceError::Auth {
            status: 401,
            message: "bad pat".to_string(),
        });

        assert!(err.to_string().contains("bad pat"));
        assert!(!err.is_config());
    }
}
