pub(crate) mod config;
pub(crate) mod group;
pub(crate) mod meta;
pub(crate) mod report;
#[cfg(feature = "azure")]
pub(crate) mod sync;

use std::io::{self, Write};

use clap::ValueEnum;
use reporover::{ConfigStore, GroupRegistry, RegistryError};

/// Output format for listings.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum)]
pub(crate) enum OutputFormat {
    /// Display as a formatted table (default)
    #[default]
    Table,
    /// Display as JSON
    Json,
}

/// Pick the group a command operates on: the `--group` flag, else the
/// active group. The group must be registered.
pub(crate) fn resolve_group(
    flag: Option<String>,
    registry: &GroupRegistry,
    config: &dyn ConfigStore,
) -> Result<String, Box<dyn std::error::Error>> {
    let name = match flag {
        Some(name) => name,
        None => registry.default_group(config)?.ok_or(
            "No group given and no active group set. \
             Create one with: reporover group create <name> --default",
        )?,
    };

    if !registry.exists(&name) {
        return Err(RegistryError::NotFound(name).into());
    }
    Ok(name)
}

/// Ask a yes/no question on stdin. Anything but "y" declines.
pub(crate) fn confirm(prompt: &str) -> io::Result<bool> {
    print!("{prompt} [y/N] ");
    io::stdout().flush()?;

    let mut input = String::new();
    io::stdin().read_line(&mut input)?;
    Ok(input.trim().eq_ignore_ascii_case("y"))
}

#[cfg(test)]
mod tests {
    use reporover::MemoryConfigStore;
    use tempfile::TempDir;

    use super::*;

    #[test]
    fn flag_wins_over_the_active_group() {
        let dir = TempDir::new().unwrap();
        let registry = GroupRegistry::new(dir.path());
        let config = MemoryConfigStore::new();
        registry.create_group("a").unwrap();
        registry.create_group("b").unwrap();
        registry.set_default_group("a", &config).unwrap();

        assert_eq!(resolve_group(Some("b".into()), &registry, &config).unwrap(), "b");
        assert_eq!(resolve_group(None, &registry, &config).unwrap(), "a");
    }

    #[test]
    fn unknown_or_missing_groups_are_errors() {
        let dir = TempDir::new().unwrap();
        let registry = GroupRegistry::new(dir.path());
        let config = MemoryConfigStore::new();

        let err = resolve_group(None, &registry, &config).unwrap_err();
        assert!(err.to_string().contains("no active group"));

        let err = resolve_group(Some("ghost".into()), &registry, &config).unwrap_err();
        assert!(err.to_string().contains("Group not found: ghost"));
    }
}
