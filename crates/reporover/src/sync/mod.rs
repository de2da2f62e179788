//! Sync engine: list, enrich, and persist one group's repositories.
//!
//! # Module Structure
//!
//! - [`types`] - Core types: `SyncOptions`, `SyncSummary`, `SyncFailure`, constants
//! - [`progress`] - Progress reporting: `SyncProgress`, `ProgressCallback`, `emit()`
//! - [`engine`] - Pass orchestration and the bounded worker pool: `sync_group()`
//! - `collector` - The single writer that drains enrichment outcomes into storage
//!
//! # Example
//!
//! ```ignore
//! use std::sync::Arc;
//! use reporover::azure::AzureDevOpsClient;
//! use reporover::storage::GroupStores;
//! use reporover::sync::{SyncOptions, sync_group};
//!
//! async fn sync(stores: &GroupStores, config: &dyn reporover::ConfigStore) -> Result<(), Box<dyn std::error::Error>> {
//!     let client = Arc::new(AzureDevOpsClient::new("")?);
//!     let summary = sync_group(stores, config, client, "team", &SyncOptions::default(), None).await?;
//!     println!("{} succeeded, {} failed", summary.succeeded, summary.failed());
//!     Ok(())
//! }
//! ```

mod collector;
pub mod engine;
mod errors;
mod progress;
mod types;

pub use engine::{resolve_credentials, sync_group};
pub use errors::{Result, SyncError};
pub use progress::{ProgressCallback, SyncProgress, emit};
pub use types::{
    DEFAULT_BRANCH, DEFAULT_CONCURRENCY, OUTCOME_CHANNEL_BUFFER_SIZE, SyncFailure, SyncOptions,
    SyncStage, SyncSummary,
};
