//! The external repository source seam.
//!
//! The sync engine only needs two calls from a host: list a project's
//! repositories and fetch one repository's detail. [`RepositorySource`]
//! captures that; [`crate::azure`] implements it for Azure DevOps.

mod errors;
mod types;

pub use errors::{Result, SourceError, short_error_message};
pub use types::RepositorySource;
