//! Per-group storage engine.
//!
//! Each group has its own SQLite database. [`GroupStores`] owns the open
//! handles; the free functions below operate on one handle and are safe to
//! call concurrently for different repository ids.

mod cache;
mod codec;
mod errors;
mod query;
mod single;

pub use cache::{GroupStores, StoreHandle};
pub use errors::{Result, StorageError};
pub use query::{
    ACTIVITY_WINDOW_DAYS, STALE_AFTER_MONTHS, list_most_active_repositories,
    list_most_active_repositories_at, list_stale_repositories, list_stale_repositories_at,
    stale_cutoff,
};
pub use single::{
    count_repositories, find_repository, list_repositories, record_commit, upsert_repository,
};
