//! Filesystem-backed catalog of groups.
//!
//! Each group owns one directory under the groups root:
//!
//! ```text
//! <root>/<name>/<name>.db    embedded database
//! <root>/<name>/<name>.toml  group-local settings (reserved)
//! ```
//!
//! The registry only touches the filesystem. Opening the database is left to
//! [`crate::storage::GroupStores`].

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use thiserror::Error;

use crate::settings::{ConfigStore, ConfigStoreError};

/// Errors that can occur during registry operations.
#[derive(Debug, Error)]
pub enum RegistryError {
    #[error("Group already exists: {0}")]
    AlreadyExists(String),

    #[error("Group not found: {0}")]
    NotFound(String),

    #[error("Invalid group name {name:?}: {reason}")]
    InvalidName { name: String, reason: &'static str },

    #[error("I/O error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("Configuration error: {0}")]
    Config(#[from] ConfigStoreError),
}

impl RegistryError {
    fn io(path: &Path, source: io::Error) -> Self {
        Self::Io {
            path: path.to_path_buf(),
            source,
        }
    }
}

/// Result type alias for registry operations.
pub type Result<T> = std::result::Result<T, RegistryError>;

/// Check that `name` is usable as a directory and file stem: ASCII letters,
/// digits, `-`, `_` and `.`, excluding `.` and `..`.
pub fn validate_group_name(name: &str) -> Result<()> {
    let invalid = |reason| RegistryError::InvalidName {
        name: name.to_string(),
        reason,
    };

    if name.trim().is_empty() {
        return Err(invalid("name must not be empty"));
    }
    if name == "." || name == ".." {
        return Err(invalid("name must not be a relative path component"));
    }
    if name.contains(['/', '\\']) {
        return Err(invalid("name must not contain path separators"));
    }
    if !name
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.'))
    {
        return Err(invalid("name may only contain letters, digits, '-', '_' and '.'"));
    }
    Ok(())
}

/// Catalog of groups rooted at one directory.
#[derive(Debug, Clone)]
pub struct GroupRegistry {
    root: PathBuf,
}

impl GroupRegistry {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    #[must_use]
    pub fn group_dir(&self, name: &str) -> PathBuf {
        self.root.join(name)
    }

    #[must_use]
    pub fn database_path(&self, name: &str) -> PathBuf {
        database_path(&self.root, name)
    }

    #[must_use]
    pub fn settings_path(&self, name: &str) -> PathBuf {
        self.group_dir(name).join(format!("{name}.toml"))
    }

    #[must_use]
    pub fn exists(&self, name: &str) -> bool {
        validate_group_name(name).is_ok() && self.group_dir(name).is_dir()
    }

    /// Register a new group by creating its directory and placeholder files.
    ///
    /// # Errors
    /// Returns `RegistryError::AlreadyExists` if the group directory is present.
    pub fn create_group(&self, name: &str) -> Result<PathBuf> {
        validate_group_name(name)?;
        let dir = self.group_dir(name);
        if dir.exists() {
            return Err(RegistryError::AlreadyExists(name.to_string()));
        }

        fs::create_dir_all(&dir).map_err(|e| RegistryError::io(&dir, e))?;

        for path in [self.database_path(name), self.settings_path(name)] {
            fs::File::create(&path).map_err(|e| RegistryError::io(&path, e))?;
        }

        tracing::info!(group = %name, path = %dir.display(), "Created group");
        Ok(dir)
    }

    /// Names of all registered groups, sorted. Empty if the root does not exist.
    pub fn list_groups(&self) -> Result<Vec<String>> {
        let entries = match fs::read_dir(&self.root) {
            Ok(entries) => entries,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(RegistryError::io(&self.root, e)),
        };

        let mut names = Vec::new();
        for entry in entries {
            let entry = entry.map_err(|e| RegistryError::io(&self.root, e))?;
            let file_type = entry
                .file_type()
                .map_err(|e| RegistryError::io(&entry.path(), e))?;
            if file_type.is_dir() {
                names.push(entry.file_name().to_string_lossy().into_owned());
            }
        }
        names.sort();
        Ok(names)
    }

    /// Remove a group's directory and everything in it.
    ///
    /// Clears the active group in `config` when it referred to this group.
    /// Callers holding an open handle for the group should close it first.
    pub fn delete_group(&self, name: &str, config: &dyn ConfigStore) -> Result<()> {
        validate_group_name(name)?;
        let dir = self.group_dir(name);
        if !dir.is_dir() {
            return Err(RegistryError::NotFound(name.to_string()));
        }

        fs::remove_dir_all(&dir).map_err(|e| RegistryError::io(&dir, e))?;

        if config.clear_active_group_if_matches(name)? {
            tracing::info!(group = %name, "Cleared active group");
        }
        tracing::info!(group = %name, "Deleted group");
        Ok(())
    }

    /// Make `name` the active group. The group must exist.
    pub fn set_default_group(&self, name: &str, config: &dyn ConfigStore) -> Result<()> {
        validate_group_name(name)?;
        if !self.exists(name) {
            return Err(RegistryError::NotFound(name.to_string()));
        }
        config.set_active_group(name)?;
        Ok(())
    }

    pub fn default_group(&self, config: &dyn ConfigStore) -> Result<Option<String>> {
        Ok(config.active_group()?)
    }
}

/// Path of a group's database file under `root`.
pub(crate) fn database_path(root: &Path, name: &str) -> PathBuf {
    root.join(name).join(format!("{name}.db"))
}
