//! Sync command: one pass of a group against Azure DevOps.

use std::sync::Arc;

use console::style;

use reporover::azure::AzureDevOpsClient;
use reporover::sync::{DEFAULT_BRANCH, SyncFailure, SyncOptions, SyncSummary, sync_group};
use reporover::{ConfigStore, GroupRegistry, GroupStores, SourceCredentials};

use super::{OutputFormat, resolve_group};
use crate::config::Config;
use crate::progress::ProgressReporter;

/// How many failures are listed individually before summarizing the rest.
const MAX_FAILURES_SHOWN: usize = 10;

/// Options for the sync command.
#[derive(Debug, Clone, clap::Args)]
pub struct SyncArgs {
    /// Group to sync (defaults to the active group)
    #[arg(short, long)]
    group: Option<String>,

    /// Azure DevOps organization (overrides and updates config)
    #[arg(long)]
    org: Option<String>,

    /// Azure DevOps project (overrides and updates config)
    #[arg(long)]
    project: Option<String>,

    /// Personal access token (overrides and updates config)
    #[arg(long)]
    pat: Option<String>,

    /// Maximum concurrent detail requests (default from config or 10)
    #[arg(short = 'c', long)]
    concurrency: Option<usize>,

    /// Output format for the pass summary
    #[arg(short, long, value_enum, default_value_t = OutputFormat::Table)]
    output: OutputFormat,
}

impl SyncArgs {
    fn options(&self, config: &Config) -> SyncOptions {
        SyncOptions {
            concurrency: self.concurrency.unwrap_or(config.concurrency),
            overrides: SourceCredentials {
                organization: self.org.clone().unwrap_or_default(),
                project: self.project.clone().unwrap_or_default(),
                token: self.pat.clone().unwrap_or_default(),
            },
            default_branch: match config.default_branch.trim() {
                "" => DEFAULT_BRANCH.to_string(),
                branch => branch.to_string(),
            },
        }
    }
}

/// Handle the sync command.
///
/// Returns an error after printing the summary when any repository failed,
/// so the exit status reflects partial failure.
pub async fn handle_sync(
    args: SyncArgs,
    config: &Config,
    registry: &GroupRegistry,
    stores: &GroupStores,
    store: &dyn ConfigStore,
) -> Result<(), Box<dyn std::error::Error>> {
    let group = resolve_group(args.group.clone(), registry, store)?;
    let options = args.options(config);

    if !config.integrations.azure.enabled {
        tracing::warn!("integrations.azure.enabled is false; syncing anyway");
    }

    let client = Arc::new(AzureDevOpsClient::new(&config.integrations.azure.url)?);
    let reporter = Arc::new(ProgressReporter::new());

    let result = sync_group(
        stores,
        store,
        client,
        &group,
        &options,
        Some(reporter.as_callback()),
    )
    .await;
    reporter.finish();

    let summary = result?;
    match args.output {
        OutputFormat::Table => print_summary(&summary),
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&summary)?),
    }

    if summary.is_clean() {
        Ok(())
    } else {
        Err(format!(
            "{} of {} repositories failed to sync",
            summary.failed(),
            summary.total
        )
        .into())
    }
}

fn print_summary(summary: &SyncSummary) {
    let mark = if summary.is_clean() {
        style("✓").green().bold()
    } else {
        style("⚠").yellow().bold()
    };
    println!(
        "{} Synced group '{}': {} succeeded, {} failed",
        mark,
        style(&summary.group).cyan(),
        summary.succeeded,
        summary.failed()
    );

    for line in failure_lines(&summary.failures, MAX_FAILURES_SHOWN) {
        println!("  {line}");
    }
}

/// One line per failure up to `limit`, then a count of the rest.
fn failure_lines(failures: &[SyncFailure], limit: usize) -> Vec<String> {
    let mut lines: Vec<String> = failures
        .iter()
        .take(limit)
        .map(|f| {
            format!(
                "{} {} ({}) [{}]: {}",
                style("✗").red(),
                f.repository_name,
                f.repository_id,
                f.stage,
                f.message
            )
        })
        .collect();

    if failures.len() > limit {
        lines.push(format!("... and {} more", failures.len() - limit));
    }
    lines
}
