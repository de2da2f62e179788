//! Report queries over a group database.
//!
//! Timestamps are stored as RFC 3339 text. Rows written by other tools may
//! carry a local offset (`+02:00`) instead of `Z`, so every time filter
//! compares through `julianday()` rather than as text.

use chrono::{DateTime, Duration, Months, Utc};
use sea_orm::sea_query::Expr;
use sea_orm::{
    ConnectionTrait, DatabaseConnection, EntityTrait, FromQueryResult, QueryFilter, Statement,
};

use crate::entity::repository::Entity as RepositoryEntity;
use crate::model::{ActiveRepository, Repository};

use super::codec::encode_timestamp;
use super::errors::Result;
use super::single::to_repository;

/// Calendar months after which a repository counts as stale.
pub const STALE_AFTER_MONTHS: u32 = 6;

/// Trailing window, in days, used for activity ranking.
pub const ACTIVITY_WINDOW_DAYS: i64 = 30;

/// Commits per repository inside the window. Inner join: repositories with
/// no commits in the window are omitted rather than reported with zero.
const MOST_ACTIVE_SQL: &str = r#"
SELECT r.id AS id, r.name AS name, COUNT(c.id) AS activity_count
FROM commits c
JOIN repositories r ON c.repository_id = r.id
WHERE julianday(c.date) >= julianday(?)
GROUP BY r.id, r.name
ORDER BY activity_count DESC"#;

#[derive(Debug, FromQueryResult)]
struct ActiveRepositoryRow {
    id: String,
    name: Option<String>,
    activity_count: i64,
}

impl From<ActiveRepositoryRow> for ActiveRepository {
    fn from(row: ActiveRepositoryRow) -> Self {
        Self {
            id: row.id,
            name: row.name.unwrap_or_default(),
            activity_count: u64::try_from(row.activity_count).unwrap_or(0),
        }
    }
}

// ─── Query Operations ────────────────────────────────────────────────────────

/// The instant before which a repository is stale, relative to `now`.
#[must_use]
pub fn stale_cutoff(now: DateTime<Utc>) -> DateTime<Utc> {
    now.checked_sub_months(Months::new(STALE_AFTER_MONTHS))
        .unwrap_or(DateTime::<Utc>::MIN_UTC)
}

/// Repositories whose last enrichment is more than six calendar months old.
pub async fn list_stale_repositories(db: &DatabaseConnection) -> Result<Vec<Repository>> {
    list_stale_repositories_at(db, Utc::now()).await
}

/// Like [`list_stale_repositories`], evaluated at a fixed instant.
pub async fn list_stale_repositories_at(
    db: &DatabaseConnection,
    now: DateTime<Utc>,
) -> Result<Vec<Repository>> {
    let cutoff = encode_timestamp(stale_cutoff(now));
    let models = RepositoryEntity::find()
        .filter(Expr::cust_with_values(
            "julianday(last_updated) < julianday(?)",
            [cutoff],
        ))
        .all(db)
        .await?;
    models.into_iter().map(to_repository).collect()
}

/// Repositories ranked by commit count over the last 30 days, busiest first.
pub async fn list_most_active_repositories(
    db: &DatabaseConnection,
) -> Result<Vec<ActiveRepository>> {
    list_most_active_repositories_at(db, Utc::now()).await
}

/// Like [`list_most_active_repositories`], evaluated at a fixed instant.
pub async fn list_most_active_repositories_at(
    db: &DatabaseConnection,
    now: DateTime<Utc>,
) -> Result<Vec<ActiveRepository>> {
    let since = encode_timestamp(now - Duration::days(ACTIVITY_WINDOW_DAYS));
    let rows = ActiveRepositoryRow::find_by_statement(Statement::from_sql_and_values(
        db.get_database_backend(),
        MOST_ACTIVE_SQL,
        [since.into()],
    ))
    .all(db)
    .await?;

    Ok(rows.into_iter().map(ActiveRepository::from).collect())
}

#[cfg(test)]
mod tests {
    use chrono::{FixedOffset, TimeZone};

    use crate::db::connect_and_migrate;
    use crate::model::Commit;
    use crate::storage::{record_commit, upsert_repository};

    use super::*;

    async fn setup_db() -> DatabaseConnection {
        connect_and_migrate("sqlite::memory:")
            .await
            .expect("test db should migrate")
    }

    fn repo(id: &str, last_updated: DateTime<Utc>) -> Repository {
        Repository::new(id, format!("name-{id}"), "main", "https://x", last_updated)
    }

    async fn commits(db: &DatabaseConnection, repository_id: &str, dates: &[DateTime<Utc>]) {
        for (i, date) in dates.iter().enumerate() {
            record_commit(
                db,
                &Commit {
                    id: format!("{repository_id}-{i}"),
                    repository_id: repository_id.to_string(),
                    date: *date,
                },
            )
            .await
            .expect("commit should insert");
        }
    }

    #[test]
    fn stale_cutoff_uses_calendar_months() {
        let now = Utc.with_ymd_and_hms(2024, 8, 31, 12, 0, 0).unwrap();
        // February has no 31st; chrono clamps to the last day of the month.
        assert_eq!(
            stale_cutoff(now),
            Utc.with_ymd_and_hms(2024, 2, 29, 12, 0, 0).unwrap()
        );
    }

    #[tokio::test]
    async fn stale_includes_seven_months_and_excludes_one_month() {
        let db = setup_db().await;
        let now = Utc::now();
        let old = now.checked_sub_months(Months::new(7)).unwrap();
        let fresh = now.checked_sub_months(Months::new(1)).unwrap();
        upsert_repository(&db, &repo("old", old)).await.unwrap();
        upsert_repository(&db, &repo("fresh", fresh)).await.unwrap();

        let stale = list_stale_repositories(&db).await.unwrap();

        let ids: Vec<_> = stale.iter().map(|r| r.id.as_str()).collect();
        assert_eq!(ids, vec!["old"]);
    }

    #[tokio::test]
    async fn stale_at_fixed_instant_is_strictly_before_cutoff() {
        let db = setup_db().await;
        let now = Utc.with_ymd_and_hms(2024, 12, 1, 0, 0, 0).unwrap();
        let cutoff = stale_cutoff(now);
        upsert_repository(&db, &repo("edge", cutoff)).await.unwrap();
        upsert_repository(&db, &repo("past", cutoff - Duration::seconds(1)))
            .await
            .unwrap();

        let stale = list_stale_repositories_at(&db, now).await.unwrap();

        let ids: Vec<_> = stale.iter().map(|r| r.id.as_str()).collect();
        assert_eq!(ids, vec!["past"]);
    }

    async fn set_text(db: &DatabaseConnection, sql: &str, value: String, id: &str) {
        db.execute(Statement::from_sql_and_values(
            db.get_database_backend(),
            sql,
            [value.into(), id.into()],
        ))
        .await
        .expect("raw update should apply");
    }

    #[tokio::test]
    async fn stale_compares_offset_timestamps_as_instants() {
        let db = setup_db().await;
        let now = Utc.with_ymd_and_hms(2024, 12, 1, 12, 0, 0).unwrap();
        let cutoff = stale_cutoff(now);
        let plus_two = FixedOffset::east_opt(2 * 3600).unwrap();
        let minus_five = FixedOffset::west_opt(5 * 3600).unwrap();
        upsert_repository(&db, &repo("before", now)).await.unwrap();
        upsert_repository(&db, &repo("after", now)).await.unwrap();

        // One hour before the cutoff, but textually after it.
        let before = (cutoff - Duration::hours(1)).with_timezone(&plus_two);
        // One hour after the cutoff, but textually before it.
        let after = (cutoff + Duration::hours(1)).with_timezone(&minus_five);
        let update = "UPDATE repositories SET last_updated = ? WHERE id = ?";
        set_text(&db, update, before.to_rfc3339(), "before").await;
        set_text(&db, update, after.to_rfc3339(), "after").await;

        let stale = list_stale_repositories_at(&db, now).await.unwrap();

        let ids: Vec<_> = stale.iter().map(|r| r.id.as_str()).collect();
        assert_eq!(ids, vec!["before"]);
        assert_eq!(stale[0].last_updated, cutoff - Duration::hours(1));
    }

    #[tokio::test]
    async fn activity_window_compares_offset_commit_dates_as_instants() {
        let db = setup_db().await;
        let now = Utc.with_ymd_and_hms(2024, 12, 1, 12, 0, 0).unwrap();
        let since = now - Duration::days(ACTIVITY_WINDOW_DAYS);
        upsert_repository(&db, &repo("r1", now)).await.unwrap();
        commits(&db, "r1", &[now, now]).await;

        let minus_five = FixedOffset::west_opt(5 * 3600).unwrap();
        let plus_two = FixedOffset::east_opt(2 * 3600).unwrap();
        let update = "UPDATE commits SET date = ? WHERE id = ?";
        // Inside the window, written with a negative offset.
        let inside = (since + Duration::hours(1)).with_timezone(&minus_five);
        // Outside the window, written with a positive offset.
        let outside = (since - Duration::hours(1)).with_timezone(&plus_two);
        set_text(&db, update, inside.to_rfc3339(), "r1-0").await;
        set_text(&db, update, outside.to_rfc3339(), "r1-1").await;

        let active = list_most_active_repositories_at(&db, now).await.unwrap();

        assert_eq!(active.len(), 1);
        assert_eq!(active[0].activity_count, 1);
    }

    #[tokio::test]
    async fn most_active_orders_by_count_and_omits_idle_repositories() {
        let db = setup_db().await;
        let now = Utc::now();
        for id in ["r1", "r2", "r3"] {
            upsert_repository(&db, &repo(id, now)).await.unwrap();
        }
        let recent = |days| now - Duration::days(days);
        commits(&db, "r2", &[recent(1), recent(2)]).await;
        commits(
            &db,
            "r1",
            &[recent(1), recent(3), recent(5), recent(10), recent(29)],
        )
        .await;
        // Outside the window; r3 has no recent activity.
        commits(&db, "r3", &[recent(45), recent(90)]).await;

        let active = list_most_active_repositories(&db).await.unwrap();

        assert_eq!(
            active,
            vec![
                ActiveRepository {
                    id: "r1".to_string(),
                    name: "name-r1".to_string(),
                    activity_count: 5,
                },
                ActiveRepository {
                    id: "r2".to_string(),
                    name: "name-r2".to_string(),
                    activity_count: 2,
                },
            ]
        );
    }

    #[tokio::test]
    async fn most_active_is_empty_without_commits() {
        let db = setup_db().await;
        upsert_repository(&db, &repo("lonely", Utc::now()))
            .await
            .unwrap();

        assert!(list_most_active_repositories(&db).await.unwrap().is_empty());
    }
}
