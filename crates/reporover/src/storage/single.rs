use sea_orm::{
    ActiveValue::Set, DatabaseConnection, EntityTrait, PaginatorTrait, sea_query::OnConflict,
};

use crate::entity::commit::{ActiveModel as CommitActiveModel, Entity as CommitEntity};
use crate::entity::repository::{
    ActiveModel as RepositoryActiveModel, Column, Entity as RepositoryEntity, Model,
};
use crate::model::{Commit, Repository};

use super::codec::{decode_timestamp, encode_timestamp};
use super::errors::{Result, StorageError};

// ─── Single Record Operations ────────────────────────────────────────────────

/// Insert a repository, or overwrite every mutable field when its id exists.
///
/// Uses `INSERT ... ON CONFLICT(id) DO UPDATE`, so re-syncing the same id
/// never creates a second row. Concurrent upserts of the same id are
/// last-write-wins.
pub async fn upsert_repository(db: &DatabaseConnection, repo: &Repository) -> Result<()> {
    let model = RepositoryActiveModel {
        id: Set(repo.id.clone()),
        name: Set(Some(repo.name.clone())),
        default_branch: Set(Some(repo.default_branch.clone())),
        remote_url: Set(Some(repo.remote_url.clone())),
        last_updated: Set(Some(encode_timestamp(repo.last_updated))),
    };

    RepositoryEntity::insert(model)
        .on_conflict(build_upsert_on_conflict())
        .exec_without_returning(db)
        .await?;
    Ok(())
}

/// All stored repositories. Order is stable within one call only.
pub async fn list_repositories(db: &DatabaseConnection) -> Result<Vec<Repository>> {
    let models = RepositoryEntity::find().all(db).await?;
    models.into_iter().map(to_repository).collect()
}

/// Find a repository by its source id.
pub async fn find_repository(db: &DatabaseConnection, id: &str) -> Result<Option<Repository>> {
    RepositoryEntity::find_by_id(id.to_string())
        .one(db)
        .await?
        .map(to_repository)
        .transpose()
}

/// Number of stored repositories.
pub async fn count_repositories(db: &DatabaseConnection) -> Result<u64> {
    Ok(RepositoryEntity::find().count(db).await?)
}

/// Record a commit against a stored repository.
///
/// # Errors
/// Returns `StorageError::Query` if the repository does not exist (foreign
/// key) or the commit id is already recorded.
pub async fn record_commit(db: &DatabaseConnection, commit: &Commit) -> Result<()> {
    let model = CommitActiveModel {
        id: Set(commit.id.clone()),
        repository_id: Set(Some(commit.repository_id.clone())),
        date: Set(encode_timestamp(commit.date)),
    };

    CommitEntity::insert(model).exec_without_returning(db).await?;
    Ok(())
}

pub(crate) fn build_upsert_on_conflict() -> OnConflict {
    OnConflict::column(Column::Id)
        .update_columns([
            Column::Name,
            Column::DefaultBranch,
            Column::RemoteUrl,
            Column::LastUpdated,
        ])
        .to_owned()
}

/// Convert a stored row into a domain value.
pub(crate) fn to_repository(model: Model) -> Result<Repository> {
    let context = format!("repository {}", model.id);
    let last_updated = match model.last_updated.as_deref() {
        Some(value) => decode_timestamp(value, context)?,
        None => {
            return Err(StorageError::Encoding {
                context,
                value: String::new(),
                message: "last_updated is NULL".to_string(),
            });
        }
    };

    Ok(Repository {
        id: model.id,
        name: model.name.unwrap_or_default(),
        default_branch: model.default_branch.unwrap_or_default(),
        remote_url: model.remote_url.unwrap_or_default(),
        last_updated,
        languages: None,
    })
}
