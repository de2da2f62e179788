//! Registry of open group databases.
//!
//! One handle is kept per group name until it is closed. The first caller for
//! a name pays for opening and migrating the database; later callers share the
//! same connection pool.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use sea_orm::DatabaseConnection;
use tokio::sync::Mutex;

use crate::db;
use crate::group::{database_path, validate_group_name};

use super::errors::{Result, StorageError};

/// Shared handle to one group's database.
pub type StoreHandle = Arc<DatabaseConnection>;

/// Explicit get-or-open cache of group database handles.
///
/// Pass it by reference to whatever needs storage and call
/// [`GroupStores::close_all`] during teardown.
#[derive(Debug)]
pub struct GroupStores {
    root: PathBuf,
    handles: Mutex<HashMap<String, StoreHandle>>,
}

impl GroupStores {
    /// Create a cache for groups stored under `root`.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            handles: Mutex::new(HashMap::new()),
        }
    }

    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Path of the database file for `group`.
    #[must_use]
    pub fn database_path(&self, group: &str) -> PathBuf {
        database_path(&self.root, group)
    }

    /// Get the open handle for `group`, opening it on first use.
    ///
    /// Opening resolves `<root>/<group>/<group>.db`, creates missing
    /// directories, creates the file if absent, and applies the schema.
    ///
    /// # Errors
    /// - `StorageError::Unavailable` if the directory or file cannot be created or opened
    /// - `StorageError::Schema` if applying the schema fails
    pub async fn open(&self, group: &str) -> Result<StoreHandle> {
        validate_group_name(group).map_err(|_| StorageError::InvalidGroup(group.to_string()))?;

        let mut handles = self.handles.lock().await;
        if let Some(handle) = handles.get(group) {
            tracing::debug!(group = %group, "Reusing open database handle");
            return Ok(Arc::clone(handle));
        }

        let handle = Arc::new(open_database(&self.database_path(group)).await?);
        handles.insert(group.to_string(), Arc::clone(&handle));
        tracing::debug!(group = %group, "Opened database handle");
        Ok(handle)
    }

    /// Whether a handle for `group` is currently cached.
    pub async fn is_open(&self, group: &str) -> bool {
        self.handles.lock().await.contains_key(group)
    }

    /// Release the cached handle for `group`. Closing an unknown or already
    /// closed group is a no-op.
    ///
    /// If another caller still holds a clone of the handle, the pool closes
    /// once that last clone is dropped.
    pub async fn close(&self, group: &str) -> Result<()> {
        let handle = self.handles.lock().await.remove(group);
        match handle {
            Some(handle) => close_handle(group, handle).await,
            None => Ok(()),
        }
    }

    /// Release every cached handle. Attempts all of them and returns the
    /// first error encountered.
    pub async fn close_all(&self) -> Result<()> {
        let drained: Vec<(String, StoreHandle)> = self.handles.lock().await.drain().collect();

        let mut first_error = None;
        for (group, handle) in drained {
            if let Err(e) = close_handle(&group, handle).await {
                tracing::warn!(group = %group, error = %e, "Failed to close database");
                first_error.get_or_insert(e);
            }
        }

        match first_error {
            Some(e) => Err(e),
            None => Ok(()),
        }
    }
}

async fn open_database(path: &Path) -> Result<DatabaseConnection> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).map_err(|e| StorageError::unavailable(parent, e))?;
    }

    let db = db::connect(&db::sqlite_url(path))
        .await
        .map_err(|e| StorageError::unavailable(path, e))?;

    db::apply_schema(&db).await.map_err(StorageError::Schema)?;
    Ok(db)
}

async fn close_handle(group: &str, handle: StoreHandle) -> Result<()> {
    match Arc::try_unwrap(handle) {
        Ok(db) => {
            db.close().await?;
            tracing::debug!(group = %group, "Closed database handle");
        }
        Err(_) => {
            tracing::debug!(group = %group, "Handle still in use; released cache reference");
        }
    }
    Ok(())
}
