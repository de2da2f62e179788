//! Database connection utilities.

use sea_orm::{ConnectionTrait, Database, DatabaseConnection, DbErr, Statement};
use sea_orm_migration::MigratorTrait;

use crate::migration::Migrator;

/// Configure SQLite-specific pragmas.
///
/// This sets:
/// - `journal_mode=WAL` - readers don't block the collector while it writes
/// - `busy_timeout=5000` - wait up to 5 seconds for locks instead of failing immediately
/// - `synchronous=NORMAL` - safe with WAL and faster than FULL
/// - `foreign_keys=ON` - commits must reference an existing repository
async fn configure_sqlite(db: &DatabaseConnection) -> Result<(), DbErr> {
    for pragma in [
        "PRAGMA journal_mode=WAL",
        "PRAGMA busy_timeout=5000",
        "PRAGMA synchronous=NORMAL",
        "PRAGMA foreign_keys=ON",
    ] {
        db.execute(Statement::from_string(
            db.get_database_backend(),
            pragma.to_string(),
        ))
        .await?;
    }

    Ok(())
}

/// Build the connection URL for a SQLite file, creating it if absent.
#[must_use]
pub fn sqlite_url(path: &std::path::Path) -> String {
    format!("sqlite://{}?mode=rwc", path.display())
}

/// Establish a connection to a SQLite database and configure its pragmas.
///
/// # Arguments
/// * `database_url` - Connection string, e.g. `sqlite:///path/to/group.db?mode=rwc` or `sqlite::memory:`
///
/// # Errors
/// Returns `DbErr` if the connection cannot be established.
pub async fn connect(database_url: &str) -> Result<DatabaseConnection, DbErr> {
    let db = Database::connect(database_url).await?;

    if database_url.starts_with("sqlite:") {
        configure_sqlite(&db).await?;
    }

    Ok(db)
}

/// Apply all pending schema migrations. Safe to call on an up-to-date database.
pub async fn apply_schema(db: &DatabaseConnection) -> Result<(), DbErr> {
    Migrator::up(db, None).await
}

/// Connect and bring the schema up to date in one step.
///
/// # Example
/// ```ignore
/// let db = reporover::connect_and_migrate("sqlite::memory:").await?;
/// ```
pub async fn connect_and_migrate(database_url: &str) -> Result<DatabaseConnection, DbErr> {
    let db = connect(database_url).await?;
    apply_schema(&db).await?;
    Ok(db)
}
