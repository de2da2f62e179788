//! Group management commands.
//!
//! Commands for registering, listing, activating, and removing groups.

use clap::Subcommand;
use console::style;
use serde::Serialize;
use tabled::{Table, Tabled, settings::Style};

use reporover::{ConfigStore, GroupRegistry, GroupStores};

use super::{OutputFormat, confirm};

/// Group management subcommands.
#[derive(Subcommand)]
pub enum GroupAction {
    /// Register a new group
    Create {
        /// Group name (letters, digits, '-', '_' and '.')
        name: String,

        /// Make the new group the active group
        #[arg(short, long)]
        default: bool,
    },
    /// List registered groups
    List {
        /// Output format
        #[arg(short, long, value_enum, default_value_t = OutputFormat::Table)]
        output: OutputFormat,
    },
    /// Delete a group and its database
    Delete {
        /// Group name
        name: String,

        /// Skip the confirmation prompt
        #[arg(short, long)]
        yes: bool,
    },
    /// Make a group the active group
    #[command(visible_aliases = ["init", "activate"])]
    Use {
        /// Group name
        name: String,
    },
    /// Show the active group
    Default,
}

/// Display struct for group listings.
#[derive(Debug, Serialize, Tabled)]
struct GroupDisplay {
    #[tabled(rename = "Name")]
    name: String,
    #[tabled(rename = "Active")]
    #[serde(rename = "active")]
    active_marker: String,
    #[tabled(rename = "Path")]
    path: String,
}

/// Handle group commands.
pub async fn handle_group(
    action: GroupAction,
    registry: &GroupRegistry,
    stores: &GroupStores,
    config: &dyn ConfigStore,
) -> Result<(), Box<dyn std::error::Error>> {
    match action {
        GroupAction::Create { name, default } => create_group(registry, config, &name, default),
        GroupAction::List { output } => list_groups(registry, config, output),
        GroupAction::Delete { name, yes } => {
            delete_group(registry, stores, config, &name, yes).await
        }
        GroupAction::Use { name } => {
            registry.set_default_group(&name, config)?;
            println!(
                "{} Active group is now '{}'",
                style("✓").green().bold(),
                style(&name).cyan()
            );
            Ok(())
        }
        GroupAction::Default => {
            match registry.default_group(config)? {
                Some(name) => println!("{name}"),
                None => println!("No active group set."),
            }
            Ok(())
        }
    }
}

fn create_group(
    registry: &GroupRegistry,
    config: &dyn ConfigStore,
    name: &str,
    make_default: bool,
) -> Result<(), Box<dyn std::error::Error>> {
    let dir = registry.create_group(name)?;
    println!(
        "{} Created group '{}' at {}",
        style("✓").green().bold(),
        style(name).cyan(),
        dir.display()
    );

    if make_default {
        registry.set_default_group(name, config)?;
        println!("  Set as the active group");
    }
    Ok(())
}

fn list_groups(
    registry: &GroupRegistry,
    config: &dyn ConfigStore,
    output: OutputFormat,
) -> Result<(), Box<dyn std::error::Error>> {
    let names = registry.list_groups()?;

    if names.is_empty() && output == OutputFormat::Table {
        println!("No groups registered.");
        println!();
        println!("Create one with:");
        println!("  reporover group create <name> --default");
        return Ok(());
    }

    let active = registry.default_group(config)?;
    let displays = group_rows(registry, &names, active.as_deref());

    match output {
        OutputFormat::Table => {
            let mut table = Table::new(displays);
            table.with(Style::rounded());
            println!("{}", table);
        }
        OutputFormat::Json => {
            println!("{}", serde_json::to_string_pretty(&displays)?);
        }
    }
    Ok(())
}

fn group_rows(registry: &GroupRegistry, names: &[String], active: Option<&str>) -> Vec<GroupDisplay> {
    names
        .iter()
        .map(|name| GroupDisplay {
            name: name.clone(),
            active_marker: if active == Some(name.as_str()) { "*" } else { "" }.to_string(),
            path: registry.group_dir(name).display().to_string(),
        })
        .collect()
}

async fn delete_group(
    registry: &GroupRegistry,
    stores: &GroupStores,
    config: &dyn ConfigStore,
    name: &str,
    skip_confirm: bool,
) -> Result<(), Box<dyn std::error::Error>> {
    if !registry.exists(name) {
        return Err(reporover::RegistryError::NotFound(name.to_string()).into());
    }

    if !skip_confirm {
        println!(
            "{} About to delete group '{}' and everything under {}",
            style("⚠").yellow().bold(),
            style(name).cyan(),
            registry.group_dir(name).display()
        );
        if !confirm("Continue?")? {
            println!("Aborted.");
            return Ok(());
        }
    }

    stores.close(name).await?;
    registry.delete_group(name, config)?;

    println!(
        "{} Deleted group '{}'",
        style("✓").green().bold(),
        style(name).cyan()
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use reporover::MemoryConfigStore;
    use tempfile::TempDir;

    use super::*;

    #[test]
    fn rows_mark_only_the_active_group() {
        let dir = TempDir::new().unwrap();
        let registry = GroupRegistry::new(dir.path());
        let names = vec!["a".to_string(), "b".to_string()];

        let rows = group_rows(&registry, &names, Some("b"));

        let markers: Vec<&str> = rows.iter().map(|r| r.active_marker.as_str()).collect();
        assert_eq!(markers, vec!["", "*"]);
        assert!(rows[0].path.ends_with('a'));
    }

    #[tokio::test]
    async fn create_with_default_activates_the_group() {
        let dir = TempDir::new().unwrap();
        let registry = GroupRegistry::new(dir.path());
        let stores = GroupStores::new(registry.root());
        let config = MemoryConfigStore::new();

        handle_group(
            GroupAction::Create {
                name: "team".into(),
                default: true,
            },
            &registry,
            &stores,
            &config,
        )
        .await
        .unwrap();

        assert!(registry.exists("team"));
        assert_eq!(config.active_group().unwrap().as_deref(), Some("team"));
    }

    #[tokio::test]
    async fn delete_closes_an_open_handle_first() {
        let dir = TempDir::new().unwrap();
        let registry = GroupRegistry::new(dir.path());
        let stores = GroupStores::new(registry.root());
        let config = MemoryConfigStore::new();
        registry.create_group("team").unwrap();
        registry.set_default_group("team", &config).unwrap();
        stores.open("team").await.unwrap();

        handle_group(
            GroupAction::Delete {
                name: "team".into(),
                yes: true,
            },
            &registry,
            &stores,
            &config,
        )
        .await
        .unwrap();

        assert!(!stores.is_open("team").await);
        assert!(!registry.exists("team"));
        assert_eq!(config.active_group().unwrap(), None);
    }

    #[tokio::test]
    async fn use_rejects_unknown_groups() {
        let dir = TempDir::new().unwrap();
        let registry = GroupRegistry::new(dir.path());
        let stores = GroupStores::new(registry.root());
        let config = MemoryConfigStore::new();

        let result = handle_group(
            GroupAction::Use {
                name: "ghost".into(),
            },
            &registry,
            &stores,
            &config,
        )
        .await;

        assert!(result.is_err());
        assert_eq!(config.active_group().unwrap(), None);
    }
}
