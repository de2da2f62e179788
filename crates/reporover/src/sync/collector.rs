//! Single-writer collector for enrichment outcomes.
//!
//! Enrichment workers send one [`EnrichOutcome`] per repository over a
//! bounded channel. The collector task is the only writer to storage during a
//! pass: it upserts each success as it arrives and records every failure,
//! then returns its tally once all senders are dropped.
//!
//! ```text
//! queue → workers (fetch detail) → outcome channel → collector → storage
//! ```

use std::sync::Arc;
use std::time::Instant;

use tokio::sync::mpsc;
use tokio::task::{JoinError, JoinHandle};

use crate::model::{Repository, RepositorySummary};
use crate::storage::{self, StoreHandle};

use super::errors::SyncError;
use super::progress::{ProgressCallback, SyncProgress, emit};
use super::types::{SyncFailure, SyncStage};

/// One worker's result for one repository.
#[derive(Debug)]
pub(crate) struct EnrichOutcome {
    pub summary: RepositorySummary,
    pub result: Result<Repository, String>,
}

/// Tally produced by the collector.
#[derive(Debug, Default)]
#[must_use = "CollectorReport carries failures that must be reported"]
pub(crate) struct CollectorReport {
    pub succeeded: usize,
    pub failures: Vec<SyncFailure>,
}

impl CollectorReport {
    fn record_failure(&mut self, summary: RepositorySummary, stage: SyncStage, message: String) {
        self.failures.push(SyncFailure {
            repository_id: summary.id,
            repository_name: summary.name,
            stage,
            message,
        });
    }
}

/// Spawn the collector task draining `rx` into the group database.
pub(crate) fn spawn_collector(
    db: StoreHandle,
    mut rx: mpsc::Receiver<EnrichOutcome>,
    on_progress: Option<Arc<ProgressCallback>>,
) -> JoinHandle<CollectorReport> {
    tokio::spawn(async move {
        let mut report = CollectorReport::default();
        let started = Instant::now();
        let on_progress = on_progress.as_deref();

        while let Some(EnrichOutcome { summary, result }) = rx.recv().await {
            let repo = match result {
                Ok(repo) => repo,
                Err(error) => {
                    tracing::warn!(
                        repository_id = %summary.id,
                        name = %summary.name,
                        error = %error,
                        "Failed to enrich repository"
                    );
                    emit(
                        on_progress,
                        SyncProgress::EnrichError {
                            id: summary.id.clone(),
                            name: summary.name.clone(),
                            error: error.clone(),
                        },
                    );
                    report.record_failure(summary, SyncStage::Enrich, error);
                    continue;
                }
            };

            emit(
                on_progress,
                SyncProgress::Enriched {
                    id: summary.id.clone(),
                    name: summary.name.clone(),
                },
            );

            match storage::upsert_repository(&db, &repo).await {
                Ok(()) => {
                    report.succeeded += 1;
                    tracing::debug!(repository_id = %repo.id, name = %repo.name, "Persisted repository");
                    emit(
                        on_progress,
                        SyncProgress::Persisted {
                            id: summary.id,
                            name: summary.name,
                        },
                    );
                }
                Err(e) => {
                    let error = e.to_string();
                    tracing::warn!(
                        repository_id = %summary.id,
                        name = %summary.name,
                        error = %error,
                        "Failed to persist repository"
                    );
                    emit(
                        on_progress,
                        SyncProgress::PersistError {
                            id: summary.id.clone(),
                            name: summary.name.clone(),
                            error: error.clone(),
                        },
                    );
                    report.record_failure(summary, SyncStage::Persist, error);
                }
            }
        }

        tracing::debug!(
            succeeded = report.succeeded,
            failed = report.failures.len(),
            elapsed_ms = started.elapsed().as_millis(),
            "Collector drained"
        );
        report
    })
}

/// Wait for the collector to drain every outstanding outcome.
///
/// There is no deadline here: slow upserts still end up in the report. A
/// panic in the collector becomes [`SyncError::Collector`].
pub(crate) async fn await_collector(
    handle: JoinHandle<CollectorReport>,
) -> Result<CollectorReport, SyncError> {
    handle.await.map_err(|e| {
        let message = join_error_message(e);
        tracing::error!(error = %message, "Collector task failed");
        SyncError::Collector(message)
    })
}

/// Describe a failed task, extracting the panic payload when there is one.
pub(crate) fn join_error_message(e: JoinError) -> String {
    if e.is_panic() {
        let payload = e.into_panic();
        if let Some(s) = payload.downcast_ref::<&str>() {
            format!("task panicked: {s}")
        } else if let Some(s) = payload.downcast_ref::<String>() {
            format!("task panicked: {s}")
        } else {
            "task panicked".to_string()
        }
    } else if e.is_cancelled() {
        "task was cancelled".to_string()
    } else {
        format!("task failed: {e}")
    }
}
