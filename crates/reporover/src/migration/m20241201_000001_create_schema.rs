//! Initial migration creating the `repositories` and `commits` tables.
//!
//! The DDL is written out by hand: the `DATETIME` columns hold RFC 3339 text
//! and the table shapes must match existing group databases exactly.

use sea_orm_migration::prelude::*;

const CREATE_REPOSITORIES: &str = r#"
CREATE TABLE IF NOT EXISTS repositories (
    id TEXT PRIMARY KEY,
    name TEXT,
    default_branch TEXT,
    remote_url TEXT,
    last_updated DATETIME
)"#;

const CREATE_COMMITS: &str = r#"
CREATE TABLE IF NOT EXISTS commits (
    id TEXT PRIMARY KEY,
    repository_id TEXT,
    date DATETIME NOT NULL,
    FOREIGN KEY(repository_id) REFERENCES repositories(id)
)"#;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        let db = manager.get_connection();
        db.execute_unprepared(CREATE_REPOSITORIES).await?;
        db.execute_unprepared(CREATE_COMMITS).await?;
        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(Commits::Table).if_exists().to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Repositories::Table).if_exists().to_owned())
            .await?;
        Ok(())
    }
}

#[derive(DeriveIden)]
enum Repositories {
    Table,
}

#[derive(DeriveIden)]
enum Commits {
    Table,
}
