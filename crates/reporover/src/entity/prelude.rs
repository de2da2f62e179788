//! Common re-exports for convenient entity usage.

pub use super::commit::{
    ActiveModel as CommitActiveModel, Column as CommitColumn, Entity as Commit,
    Model as CommitModel,
};
pub use super::repository::{
    ActiveModel as RepositoryActiveModel, Column as RepositoryColumn, Entity as RepositoryEntity,
    Model as RepositoryModel,
};
