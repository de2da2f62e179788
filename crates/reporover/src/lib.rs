//! RepoRover - group synchronization and storage engine.
//!
//! Repositories are tracked in named groups. Every group has its own SQLite
//! database under a groups root, and a sync pass reconciles that database
//! against an external repository host.
//!
//! # Features
//!
//! - `azure` (default) - Azure DevOps implementation of [`RepositorySource`]
//!   backed by reqwest.
//!
//! # Example
//!
//! ```ignore
//! use std::sync::Arc;
//! use reporover::{GroupRegistry, GroupStores, MemoryConfigStore, storage, sync};
//!
//! let registry = GroupRegistry::new("/var/lib/reporover/groups");
//! registry.create_group("team")?;
//!
//! let stores = GroupStores::new(registry.root());
//! let config = MemoryConfigStore::with_credentials(credentials);
//! let summary = sync::sync_group(&stores, &config, Arc::new(client), "team", &Default::default(), None).await?;
//!
//! let db = stores.open("team").await?;
//! let stale = storage::list_stale_repositories(&db).await?;
//! stores.close_all().await?;
//! ```

pub mod db;
pub mod entity;
pub mod group;
pub mod http;
pub mod migration;
pub mod model;
pub mod settings;
pub mod source;
pub mod storage;
pub mod sync;

#[cfg(feature = "azure")]
pub mod azure;

pub use db::{connect, connect_and_migrate};
pub use group::{GroupRegistry, RegistryError};
pub use model::{ActiveRepository, Commit, Repository, RepositorySummary};
pub use settings::{ConfigStore, ConfigStoreError, MemoryConfigStore, SourceCredentials};
pub use source::{RepositorySource, SourceError};
pub use storage::{GroupStores, StorageError, StoreHandle};
pub use sync::{SyncError, SyncOptions, SyncProgress, SyncSummary, sync_group};
