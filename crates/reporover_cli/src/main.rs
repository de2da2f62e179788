//! RepoRover CLI - command-line interface for the group sync engine.

mod commands;
mod config;
#[cfg(feature = "azure")]
mod progress;

use std::collections::BTreeMap;
use std::path::PathBuf;

use clap::{CommandFactory, Parser, Subcommand};
use console::Term;
use tracing_subscriber::EnvFilter;

use reporover::{ConfigStore, GroupRegistry, GroupStores};

use crate::commands::config::ConfigAction;
use crate::commands::group::GroupAction;
use crate::commands::report::ReportAction;
#[cfg(feature = "azure")]
use crate::commands::sync::SyncArgs;
use crate::config::{Config, FileConfigStore};

#[derive(Parser)]
#[command(name = "reporover")]
#[command(version)]
#[command(about = "Track groups of repositories in local databases")]
#[command(
    long_about = "RepoRover keeps named groups of repositories, each backed by its own \
SQLite database. A sync pass lists a project's repositories on Azure DevOps, fetches \
every repository's detail concurrently, and stores the results. Reports query the \
stored data for stale and recently active repositories."
)]
#[command(after_long_help = r#"EXAMPLES
    Create a group and make it active:
        $ reporover group create platform --default

    Sync the active group, saving credentials for next time:
        $ reporover sync --org acme --project platform --pat "$AZURE_DEVOPS_PAT"

    Sync another group with fewer concurrent requests:
        $ reporover sync --group web -c 4

    Show repositories untouched for six months:
        $ reporover report stale

    Generate shell completions:
        $ reporover completions bash > ~/.local/share/bash-completion/completions/reporover

CONFIGURATION
    RepoRover reads configuration from, lowest precedence first:
      1. Built-in defaults
      2. ~/.config/reporover/config.toml (or $XDG_CONFIG_HOME/reporover/config.toml)
      3. ./reporover.toml
      4. Environment variables (REPOROVER_* prefix, '__' between nested keys)
      5. .env file in current directory
    String values may reference $VAR or ${VAR}.

    Aliases in the [aliases] table expand the first argument:
        [aliases]
        up = "sync --group platform"

ENVIRONMENT VARIABLES
    REPOROVER_ACTIVE_GROUP                      Active group
    REPOROVER_CONCURRENCY                       Concurrent detail requests (default: 10)
    REPOROVER_PATHS__GROUPS_ROOT                Groups directory (default: ~/.local/share/reporover/groups)
    REPOROVER_INTEGRATIONS__AZURE__URL          Azure DevOps host (default: https://dev.azure.com)
    REPOROVER_INTEGRATIONS__AZURE__ORGANIZATION Azure DevOps organization
    REPOROVER_INTEGRATIONS__AZURE__PROJECT      Azure DevOps project
    REPOROVER_INTEGRATIONS__AZURE__API_TOKEN    Azure DevOps personal access token
    RUST_LOG                                    Log filter (default: reporover=info,reporover_cli=info)
"#)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Manage groups
    Group {
        #[command(subcommand)]
        action: GroupAction,
    },
    /// Sync a group's repositories from Azure DevOps
    #[cfg(feature = "azure")]
    Sync(SyncArgs),
    /// Query a group's stored repositories
    Report {
        #[command(subcommand)]
        action: ReportAction,
    },
    /// Inspect configuration
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
    /// Generate shell completion scripts
    Completions {
        /// Shell to generate completions for
        shell: clap_complete::Shell,
    },
    /// Generate man page(s)
    Man {
        /// Output directory for man pages (prints to stdout if not specified)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
}

/// Replace a leading alias with its expansion. Built-in subcommands win
/// over aliases of the same name.
fn expand_alias(args: Vec<String>, aliases: &BTreeMap<String, String>) -> Vec<String> {
    let Some(first) = args.get(1) else {
        return args;
    };
    if Cli::command().find_subcommand(first).is_some() {
        return args;
    }
    let Some(expansion) = aliases.get(first) else {
        return args;
    };

    tracing::debug!(alias = %first, expansion = %expansion, "Expanding alias");
    let mut expanded = Vec::with_capacity(args.len() + 4);
    expanded.push(args[0].clone());
    expanded.extend(expansion.split_whitespace().map(str::to_string));
    expanded.extend(args.into_iter().skip(2));
    expanded
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenvy::dotenv().ok();

    // Initialize tracing for non-TTY mode (structured logging)
    // Only initialize if not connected to a TTY
    if !Term::stdout().is_term() {
        let env_filter = match EnvFilter::try_from_default_env() {
            Ok(filter) => filter,
            Err(_) => EnvFilter::new("reporover=info,reporover_cli=info"),
        };

        tracing_subscriber::fmt()
            .with_env_filter(env_filter)
            .with_target(false)
            .init();
    }

    // Load configuration (defaults -> config files -> env vars)
    let config = Config::load();

    let cli = Cli::parse_from(expand_alias(std::env::args().collect(), &config.aliases));

    // Handle commands that don't touch groups first
    match &cli.command {
        Commands::Completions { shell } => return commands::meta::handle_completions(*shell),
        Commands::Man { output } => return commands::meta::handle_man(output.as_deref()),
        Commands::Config { action } => return commands::config::handle_config(action, &config),
        _ => {}
    }

    let store = FileConfigStore::open_default(config.clone())?;
    let registry = GroupRegistry::new(&config.paths.groups_root);
    let stores = GroupStores::new(registry.root());

    let result = run(cli.command, &config, &registry, &stores, &store).await;

    if let Err(e) = stores.close_all().await {
        tracing::warn!(error = %e, "Failed to close group databases");
    }
    result
}

async fn run(
    command: Commands,
    #[cfg_attr(not(feature = "azure"), allow(unused_variables))] config: &Config,
    registry: &GroupRegistry,
    stores: &GroupStores,
    store: &dyn ConfigStore,
) -> Result<(), Box<dyn std::error::Error>> {
    match command {
        Commands::Group { action } => {
            commands::group::handle_group(action, registry, stores, store).await
        }
        #[cfg(feature = "azure")]
        Commands::Sync(args) => {
            commands::sync::handle_sync(args, config, registry, stores, store).await
        }
        Commands::Report { action } => {
            commands::report::handle_report(action, registry, stores, store).await
        }
        Commands::Config { .. } | Commands::Completions { .. } | Commands::Man { .. } => Ok(()),
    }
}
