use reporover::sync::SyncProgress;

/// Logging reporter using tracing for structured output.
pub struct LoggingReporter;

impl LoggingReporter {
    pub fn new() -> Self {
        Self
    }

    pub fn handle(&self, event: SyncProgress) {
        match event {
            SyncProgress::ListingRepositories { group } => {
                tracing::info!(group = %group, "Listing repositories");
            }

            SyncProgress::ListComplete { total } => {
                tracing::info!(total, "Listed repositories");
            }

            SyncProgress::EnrichingRepositories { count, concurrency } => {
                tracing::info!(count, concurrency, "Enriching repositories");
            }

            SyncProgress::Enriched { id, name } => {
                tracing::debug!(repository_id = %id, repo = %name, "Fetched detail");
            }

            SyncProgress::EnrichError { id, name, error } => {
                tracing::warn!(repository_id = %id, repo = %name, error = %error, "Failed to fetch detail");
            }

            SyncProgress::Persisted { id, name } => {
                tracing::debug!(repository_id = %id, repo = %name, "Saved to database");
            }

            SyncProgress::PersistError { id, name, error } => {
                tracing::error!(repository_id = %id, repo = %name, error = %error, "Failed to save");
            }

            SyncProgress::PassComplete { succeeded, failed } => {
                tracing::info!(succeeded, failed, "Sync pass complete");
            }

            _ => {}
        }
    }
}

impl Default for LoggingReporter {
    fn default() -> Self {
        Self::new()
    }
}
