//! Azure DevOps implementation of [`crate::source::RepositorySource`].
//!
//! Requests go to `<host>/<org>/<project>/_apis/git/repositories[/<id>]`
//! with basic auth (empty user, personal access token as password).

mod client;
mod types;

pub use client::{API_VERSION, AzureDevOpsClient, DEFAULT_HOST};
