//! Sync pass orchestration.
//!
//! One pass resolves credentials, opens the group database, lists the
//! project's repositories, and then enriches them with a bounded worker pool.
//! Workers pull from a shared queue and hand every outcome to the collector,
//! which is the only writer for the pass.

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};
use std::time::Instant;

use tokio::sync::mpsc;
use tokio::task::JoinHandle;

use crate::model::RepositorySummary;
use crate::settings::{ConfigStore, SourceCredentials};
use crate::source::RepositorySource;
use crate::storage::GroupStores;

use super::collector::{EnrichOutcome, await_collector, join_error_message, spawn_collector};
use super::errors::{Result, SyncError};
use super::progress::{ProgressCallback, SyncProgress, emit};
use super::types::{OUTCOME_CHANNEL_BUFFER_SIZE, SyncOptions, SyncSummary};

type WorkQueue = Arc<Mutex<VecDeque<RepositorySummary>>>;

/// Resolve the credentials for a pass.
///
/// Overlays `overrides` on the configured values and fails with
/// [`SyncError::Config`] if any required field is still empty. The merged
/// values are written back to `config` only when an override was given, so a
/// plain pass never rewrites stored settings.
pub fn resolve_credentials(
    config: &dyn ConfigStore,
    overrides: &SourceCredentials,
) -> Result<SourceCredentials> {
    let credentials = config.source_credentials()?.merged_with(overrides);

    let missing = credentials.missing_fields();
    if !missing.is_empty() {
        return Err(SyncError::Config { missing });
    }

    if !overrides.is_empty() {
        config.save_source_credentials(&credentials)?;
    }
    Ok(credentials)
}

/// Run one sync pass for `group`.
///
/// Fatal errors (configuration, opening storage, the list call) abort the
/// pass. Everything after the list call is isolated per repository: failures
/// are returned in [`SyncSummary::failures`] and never cancel sibling work.
///
/// # Arguments
///
/// * `stores` - Handle cache the group database is opened through
/// * `config` - Configuration collaborator for credentials
/// * `source` - Repository host to list and enrich from
/// * `group` - Group to sync
/// * `options` - Concurrency bound and credential overrides
/// * `on_progress` - Optional progress callback
///
/// # Example
///
/// ```ignore
/// let stores = GroupStores::new(groups_root);
/// let source = Arc::new(AzureDevOpsClient::new("")?);
/// let summary = sync_group(&stores, &config, source, "team", &SyncOptions::default(), None).await?;
/// println!("{} succeeded, {} failed", summary.succeeded, summary.failed());
/// ```
#[tracing::instrument(skip_all, fields(group = %group, concurrency = options.concurrency))]
pub async fn sync_group<S>(
    stores: &GroupStores,
    config: &dyn ConfigStore,
    source: Arc<S>,
    group: &str,
    options: &SyncOptions,
    on_progress: Option<Arc<ProgressCallback>>,
) -> Result<SyncSummary>
where
    S: RepositorySource + ?Sized + 'static,
{
    let started = Instant::now();
    let progress = on_progress.as_deref();

    let credentials = resolve_credentials(config, &options.overrides)?;

    let db = stores
        .open(group)
        .await
        .map_err(|e| SyncError::StorageUnavailable {
            group: group.to_string(),
            source: e,
        })?;

    emit(
        progress,
        SyncProgress::ListingRepositories {
            group: group.to_string(),
        },
    );
    tracing::info!(
        source = source.source_name(),
        organization = %credentials.organization,
        project = %credentials.project,
        "Starting sync pass"
    );

    let summaries = source
        .list_repositories(&credentials)
        .await
        .map_err(SyncError::Fetch)?;
    let total = summaries.len();
    emit(progress, SyncProgress::ListComplete { total });

    let workers = options.worker_count(total);
    emit(
        progress,
        SyncProgress::EnrichingRepositories {
            count: total,
            concurrency: workers,
        },
    );

    let (tx, rx) = mpsc::channel(OUTCOME_CHANNEL_BUFFER_SIZE);
    let collector = spawn_collector(db, rx, on_progress.clone());

    let queue: WorkQueue = Arc::new(Mutex::new(summaries.into()));
    let credentials = Arc::new(credentials);
    let fallback_branch: Arc<str> = Arc::from(options.default_branch.as_str());
    let handles: Vec<JoinHandle<()>> = (0..workers)
        .map(|worker| {
            spawn_worker(
                worker,
                Arc::clone(&queue),
                Arc::clone(&source),
                Arc::clone(&credentials),
                Arc::clone(&fallback_branch),
                tx.clone(),
            )
        })
        .collect();
    // Workers hold the remaining senders; the collector finishes when they exit.
    drop(tx);

    for handle in handles {
        if let Err(e) = handle.await {
            tracing::error!(error = %join_error_message(e), "Enrichment worker failed");
        }
    }

    let report = await_collector(collector).await?;
    let summary = SyncSummary {
        group: group.to_string(),
        total,
        succeeded: report.succeeded,
        failures: report.failures,
    };

    emit(
        progress,
        SyncProgress::PassComplete {
            succeeded: summary.succeeded,
            failed: summary.failed(),
        },
    );
    tracing::info!(
        total,
        succeeded = summary.succeeded,
        failed = summary.failed(),
        elapsed_ms = started.elapsed().as_millis(),
        "Sync pass complete"
    );

    Ok(summary)
}

/// Spawn one enrichment worker.
///
/// The worker pops repositories until the queue is empty. Each detail fetch
/// runs in its own task so a panicking source is reported as a failure for
/// that repository instead of silently dropping it. Details without a
/// default branch get `fallback_branch`.
fn spawn_worker<S>(
    worker: usize,
    queue: WorkQueue,
    source: Arc<S>,
    credentials: Arc<SourceCredentials>,
    fallback_branch: Arc<str>,
    tx: mpsc::Sender<EnrichOutcome>,
) -> JoinHandle<()>
where
    S: RepositorySource + ?Sized + 'static,
{
    tokio::spawn(async move {
        let mut handled = 0usize;

        while let Some(summary) = next_item(&queue) {
            let fetch = {
                let source = Arc::clone(&source);
                let credentials = Arc::clone(&credentials);
                let id = summary.id.clone();
                tokio::spawn(async move { source.fetch_repository_detail(&credentials, &id).await })
            };

            let result = match fetch.await {
                Ok(Ok(mut repo)) => {
                    if repo.default_branch.trim().is_empty() {
                        repo.default_branch = fallback_branch.to_string();
                    }
                    Ok(repo)
                }
                Ok(Err(e)) => Err(e.to_string()),
                Err(e) => Err(join_error_message(e)),
            };

            handled += 1;
            if tx.send(EnrichOutcome { summary, result }).await.is_err() {
                tracing::error!(worker, "Collector closed early; stopping worker");
                break;
            }
        }

        tracing::debug!(worker, handled, "Enrichment worker finished");
    })
}

fn next_item(queue: &WorkQueue) -> Option<RepositorySummary> {
    match queue.lock() {
        Ok(mut queue) => queue.pop_front(),
        Err(poisoned) => poisoned.into_inner().pop_front(),
    }
}
