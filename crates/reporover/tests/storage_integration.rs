//! Integration tests for the group registry and per-group storage.
//!
//! These exercise the on-disk layout: registering a group, opening its
//! database through the handle cache, querying it, and deleting it again.

use chrono::{Duration, Months, Utc};
use reporover::group::{GroupRegistry, RegistryError};
use reporover::settings::{ConfigStore, MemoryConfigStore};
use reporover::storage::{self, GroupStores, StorageError};
use reporover::{Commit, Repository};
use tempfile::TempDir;

fn repo(id: &str, last_updated: chrono::DateTime<Utc>) -> Repository {
    Repository::new(
        id,
        format!("name-{id}"),
        "main",
        format!("https://dev.example.com/_git/{id}"),
        last_updated,
    )
}

#[tokio::test]
async fn created_group_opens_at_the_registered_path() {
    let dir = TempDir::new().unwrap();
    let registry = GroupRegistry::new(dir.path().join("groups"));
    let stores = GroupStores::new(registry.root());

    registry.create_group("team").unwrap();
    assert_eq!(registry.list_groups().unwrap(), vec!["team"]);
    assert_eq!(stores.database_path("team"), registry.database_path("team"));

    // The placeholder file left by the registry is a valid empty database.
    let db = stores.open("team").await.unwrap();
    storage::upsert_repository(&db, &repo("r1", Utc::now()))
        .await
        .unwrap();
    assert_eq!(storage::count_repositories(&db).await.unwrap(), 1);

    stores.close_all().await.unwrap();
}

#[tokio::test]
async fn data_survives_closing_and_reopening() {
    let dir = TempDir::new().unwrap();
    let stores = GroupStores::new(dir.path());
    let when = Utc::now();

    let db = stores.open("team").await.unwrap();
    storage::upsert_repository(&db, &repo("r1", when))
        .await
        .unwrap();
    drop(db);
    stores.close("team").await.unwrap();

    let db = stores.open("team").await.unwrap();
    let found = storage::find_repository(&db, "r1")
        .await
        .unwrap()
        .expect("row persisted across handles");
    assert_eq!(found.last_updated.timestamp(), when.timestamp());
    assert_eq!(found.default_branch, "main");
}

#[tokio::test]
async fn groups_do_not_share_rows() {
    let dir = TempDir::new().unwrap();
    let stores = GroupStores::new(dir.path());

    let a = stores.open("alpha").await.unwrap();
    let b = stores.open("beta").await.unwrap();
    storage::upsert_repository(&a, &repo("r1", Utc::now()))
        .await
        .unwrap();

    assert_eq!(storage::count_repositories(&a).await.unwrap(), 1);
    assert_eq!(storage::count_repositories(&b).await.unwrap(), 0);
}

#[tokio::test]
async fn deleting_a_group_removes_it_and_clears_the_active_reference() {
    let dir = TempDir::new().unwrap();
    let registry = GroupRegistry::new(dir.path());
    let stores = GroupStores::new(registry.root());
    let config = MemoryConfigStore::new();

    registry.create_group("team").unwrap();
    registry.create_group("other").unwrap();
    registry.set_default_group("team", &config).unwrap();
    stores.open("team").await.unwrap();

    stores.close("team").await.unwrap();
    registry.delete_group("team", &config).unwrap();

    assert_eq!(registry.list_groups().unwrap(), vec!["other"]);
    assert!(!registry.database_path("team").exists());
    assert_eq!(config.active_group().unwrap(), None);
    assert!(matches!(
        registry.delete_group("team", &config),
        Err(RegistryError::NotFound(_))
    ));
}

#[tokio::test]
async fn stale_and_active_reports_reflect_stored_data() {
    let dir = TempDir::new().unwrap();
    let stores = GroupStores::new(dir.path());
    let db = stores.open("team").await.unwrap();
    let now = Utc::now();

    let seven_months_ago = now.checked_sub_months(Months::new(7)).unwrap();
    let one_month_ago = now.checked_sub_months(Months::new(1)).unwrap();
    storage::upsert_repository(&db, &repo("old", seven_months_ago))
        .await
        .unwrap();
    storage::upsert_repository(&db, &repo("fresh", one_month_ago))
        .await
        .unwrap();
    storage::upsert_repository(&db, &repo("quiet", now))
        .await
        .unwrap();

    let stale: Vec<String> = storage::list_stale_repositories(&db)
        .await
        .unwrap()
        .into_iter()
        .map(|r| r.id)
        .collect();
    assert_eq!(stale, vec!["old"]);

    let mut n = 0;
    for (repo_id, count) in [("fresh", 4), ("old", 1)] {
        for _ in 0..count {
            n += 1;
            storage::record_commit(
                &db,
                &Commit {
                    id: format!("c{n}"),
                    repository_id: repo_id.to_string(),
                    date: now - Duration::days(2),
                },
            )
            .await
            .unwrap();
        }
    }
    // Outside the 30-day window.
    storage::record_commit(
        &db,
        &Commit {
            id: "ancient".to_string(),
            repository_id: "quiet".to_string(),
            date: now - Duration::days(90),
        },
    )
    .await
    .unwrap();

    let active = storage::list_most_active_repositories(&db).await.unwrap();
    let ranking: Vec<(&str, u64)> = active
        .iter()
        .map(|a| (a.id.as_str(), a.activity_count))
        .collect();
    assert_eq!(ranking, vec![("fresh", 4), ("old", 1)]);
}

#[tokio::test]
async fn commits_for_unknown_repositories_are_rejected() {
    let dir = TempDir::new().unwrap();
    let stores = GroupStores::new(dir.path());
    let db = stores.open("team").await.unwrap();

    let err = storage::record_commit(
        &db,
        &Commit {
            id: "c1".to_string(),
            repository_id: "ghost".to_string(),
            date: Utc::now(),
        },
    )
    .await
    .unwrap_err();

    assert!(matches!(err, StorageError::Query(_)), "{err:?}");
}
