//! Progress reporting types for sync passes.
//!
//! The engine never renders anything itself; callers pass a
//! [`ProgressCallback`] and decide whether to draw a progress bar, write log
//! lines, or ignore the events entirely.

/// Progress events emitted during a sync pass.
#[derive(Debug, Clone)]
#[non_exhaustive]
pub enum SyncProgress {
    /// Requesting the repository list from the source.
    ListingRepositories {
        /// The group being synced.
        group: String,
    },

    /// The repository list arrived.
    ListComplete {
        /// Number of repositories to enrich.
        total: usize,
    },

    /// Enrichment workers are starting.
    EnrichingRepositories {
        /// Number of repositories queued.
        count: usize,
        /// Number of workers pulling from the queue.
        concurrency: usize,
    },

    /// A repository's detail was fetched.
    Enriched { id: String, name: String },

    /// Fetching a repository's detail failed.
    EnrichError {
        id: String,
        name: String,
        error: String,
    },

    /// A repository was written to storage.
    Persisted { id: String, name: String },

    /// Writing a repository to storage failed.
    PersistError {
        id: String,
        name: String,
        error: String,
    },

    /// Every dispatched repository has been accounted for.
    PassComplete {
        /// Repositories enriched and persisted.
        succeeded: usize,
        /// Repositories that failed at either stage.
        failed: usize,
    },
}

/// Callback for progress updates during sync passes.
pub type ProgressCallback = Box<dyn Fn(SyncProgress) + Send + Sync>;

/// Helper to emit progress events.
///
/// This is a convenience function that handles the `Option` check.
#[inline]
pub fn emit(on_progress: Option<&ProgressCallback>, event: SyncProgress) {
    if let Some(cb) = on_progress {
        cb(event);
    }
}
