//! Report commands over a group's stored repositories.

use chrono::{DateTime, Utc};
use clap::Subcommand;
use console::style;
use serde::Serialize;
use tabled::{Table, Tabled, settings::Style};

use reporover::storage::{self, ACTIVITY_WINDOW_DAYS, STALE_AFTER_MONTHS};
use reporover::{ActiveRepository, Commit, ConfigStore, GroupRegistry, GroupStores, Repository};

use super::{OutputFormat, resolve_group};

/// Report subcommands.
#[derive(Subcommand)]
pub enum ReportAction {
    /// List every stored repository
    List {
        /// Group to report on (defaults to the active group)
        #[arg(short, long)]
        group: Option<String>,

        /// Output format
        #[arg(short, long, value_enum, default_value_t = OutputFormat::Table)]
        output: OutputFormat,
    },
    /// Repositories not updated in more than six months
    Stale {
        /// Group to report on (defaults to the active group)
        #[arg(short, long)]
        group: Option<String>,

        /// Output format
        #[arg(short, long, value_enum, default_value_t = OutputFormat::Table)]
        output: OutputFormat,
    },
    /// Repositories ranked by commits in the last 30 days
    Active {
        /// Group to report on (defaults to the active group)
        #[arg(short, long)]
        group: Option<String>,

        /// Output format
        #[arg(short, long, value_enum, default_value_t = OutputFormat::Table)]
        output: OutputFormat,
    },
    /// Record a commit against a stored repository
    RecordCommit {
        /// Repository id as stored by sync
        repository_id: String,

        /// Commit id
        commit_id: String,

        /// Commit date, RFC 3339 (defaults to now)
        #[arg(short, long)]
        date: Option<DateTime<Utc>>,

        /// Group holding the repository (defaults to the active group)
        #[arg(short, long)]
        group: Option<String>,
    },
}

/// Display struct for repository rows.
#[derive(Debug, Serialize, Tabled)]
struct RepositoryDisplay {
    #[tabled(rename = "ID")]
    id: String,
    #[tabled(rename = "Name")]
    name: String,
    #[tabled(rename = "Branch")]
    default_branch: String,
    #[tabled(rename = "Last Updated")]
    last_updated: String,
    #[tabled(rename = "Remote URL")]
    remote_url: String,
}

impl From<&Repository> for RepositoryDisplay {
    fn from(repo: &Repository) -> Self {
        Self {
            id: repo.id.clone(),
            name: repo.name.clone(),
            default_branch: repo.default_branch.clone(),
            last_updated: repo.last_updated.format("%Y-%m-%d %H:%M").to_string(),
            remote_url: repo.remote_url.clone(),
        }
    }
}

/// Display struct for activity ranking rows.
#[derive(Debug, Serialize, Tabled)]
struct ActivityDisplay {
    #[tabled(rename = "Rank")]
    rank: usize,
    #[tabled(rename = "ID")]
    id: String,
    #[tabled(rename = "Name")]
    name: String,
    #[tabled(rename = "Commits")]
    commits: u64,
}

fn activity_rows(active: &[ActiveRepository]) -> Vec<ActivityDisplay> {
    active
        .iter()
        .enumerate()
        .map(|(i, a)| ActivityDisplay {
            rank: i + 1,
            id: a.id.clone(),
            name: a.name.clone(),
            commits: a.activity_count,
        })
        .collect()
}

/// Handle report commands.
pub async fn handle_report(
    action: ReportAction,
    registry: &GroupRegistry,
    stores: &GroupStores,
    config: &dyn ConfigStore,
) -> Result<(), Box<dyn std::error::Error>> {
    match action {
        ReportAction::List { group, output } => {
            let group = resolve_group(group, registry, config)?;
            let db = stores.open(&group).await?;
            let repos = storage::list_repositories(&db).await?;
            print_repositories(&repos, output, "No repositories stored. Run: reporover sync")?;
        }
        ReportAction::Stale { group, output } => {
            let group = resolve_group(group, registry, config)?;
            let db = stores.open(&group).await?;
            let repos = storage::list_stale_repositories(&db).await?;
            let empty = format!("No repositories older than {STALE_AFTER_MONTHS} months.");
            print_repositories(&repos, output, &empty)?;
        }
        ReportAction::Active { group, output } => {
            let group = resolve_group(group, registry, config)?;
            let db = stores.open(&group).await?;
            let active = storage::list_most_active_repositories(&db).await?;
            let rows = activity_rows(&active);

            match output {
                OutputFormat::Table if rows.is_empty() => {
                    println!("No commits recorded in the last {ACTIVITY_WINDOW_DAYS} days.");
                }
                OutputFormat::Table => {
                    let mut table = Table::new(rows);
                    table.with(Style::rounded());
                    println!("{}", table);
                }
                OutputFormat::Json => {
                    println!("{}", serde_json::to_string_pretty(&active)?);
                }
            }
        }
        ReportAction::RecordCommit {
            repository_id,
            commit_id,
            date,
            group,
        } => {
            let group = resolve_group(group, registry, config)?;
            let db = stores.open(&group).await?;
            let commit = Commit {
                id: commit_id,
                repository_id,
                date: date.unwrap_or_else(Utc::now),
            };
            storage::record_commit(&db, &commit).await?;
            println!(
                "{} Recorded commit {} for '{}'",
                style("✓").green().bold(),
                commit.id,
                style(&commit.repository_id).cyan()
            );
        }
    }
    Ok(())
}

fn print_repositories(
    repos: &[Repository],
    output: OutputFormat,
    empty_message: &str,
) -> Result<(), Box<dyn std::error::Error>> {
    match output {
        OutputFormat::Table if repos.is_empty() => println!("{empty_message}"),
        OutputFormat::Table => {
            let displays: Vec<RepositoryDisplay> = repos.iter().map(RepositoryDisplay::from).collect();
            let mut table = Table::new(displays);
            table.with(Style::rounded());
            println!("{}", table);
        }
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(repos)?),
    }
    Ok(())
}
