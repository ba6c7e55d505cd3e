//! Integration tests for database initialization and catalog import
//!
//! Covers:
//! - Automatic database creation with default schema and seed data
//! - Transactional import apply (create / update / last-line-wins)
//! - Idempotence of repeated imports
//! - Field preservation on title updates

use podio_common::db::catalog::{self, DEFAULT_DURATION_MINUTES, DEFAULT_TOPIC};
use podio_common::db::init::init_database;
use podio_common::import::parse_talk_list;
use sqlx::SqlitePool;
use tempfile::TempDir;

async fn setup_test_db() -> (TempDir, SqlitePool) {
    let dir = TempDir::new().expect("Should create temp dir");
    let db_path = dir.path().join("podio-test.db");
    let pool = init_database(&db_path)
        .await
        .expect("Database initialization failed");
    (dir, pool)
}

#[tokio::test]
async fn test_database_creation_when_missing() {
    let dir = TempDir::new().unwrap();
    let db_path = dir.path().join("podio-new.db");
    assert!(!db_path.exists());

    let result = init_database(&db_path).await;
    assert!(result.is_ok(), "Database initialization failed: {:?}", result.err());
    assert!(db_path.exists(), "Database file was not created");
}

#[tokio::test]
async fn test_database_opens_existing() {
    let dir = TempDir::new().unwrap();
    let db_path = dir.path().join("podio-existing.db");

    let pool1 = init_database(&db_path).await;
    assert!(pool1.is_ok());
    drop(pool1);

    let pool2 = init_database(&db_path).await;
    assert!(pool2.is_ok(), "Failed to open existing database: {:?}", pool2.err());
}

#[tokio::test]
async fn test_default_settings_initialized() {
    let (_dir, pool) = setup_test_db().await;

    let limit: Option<String> =
        sqlx::query_scalar("SELECT value FROM settings WHERE key = 'import_display_limit'")
            .fetch_optional(&pool)
            .await
            .unwrap();

    assert_eq!(limit.as_deref(), Some("5"));
}

#[tokio::test]
async fn test_seed_creates_admin_and_congregation() {
    let (_dir, pool) = setup_test_db().await;

    let congregations: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM congregations")
        .fetch_one(&pool)
        .await
        .unwrap();
    assert_eq!(congregations, 1);

    let admin: Option<String> =
        sqlx::query_scalar("SELECT guid FROM users WHERE username = 'admin'")
            .fetch_optional(&pool)
            .await
            .unwrap();
    assert!(admin.is_some(), "admin user not seeded");
}

#[tokio::test]
async fn test_import_creates_entries_with_defaults() {
    let (_dir, pool) = setup_test_db().await;

    let outcome = parse_talk_list("1. Topic One\n2. Topic Two").unwrap();
    let summary = catalog::apply_import(&pool, &outcome.talks).await.unwrap();

    assert_eq!(summary.created, 2);
    assert_eq!(summary.updated, 0);

    let talk = catalog::find_by_number(&pool, 1).await.unwrap().unwrap();
    assert_eq!(talk.title, "Topic One");
    assert_eq!(talk.topic, DEFAULT_TOPIC);
    assert_eq!(talk.description, "Public talk #1");
    assert_eq!(talk.duration_minutes, DEFAULT_DURATION_MINUTES);
    assert!(!talk.locked);
    assert!(talk.active);
}

#[tokio::test]
async fn test_reimport_is_idempotent() {
    let (_dir, pool) = setup_test_db().await;

    let outcome = parse_talk_list("1. Topic One\n2. Topic Two").unwrap();
    let first = catalog::apply_import(&pool, &outcome.talks).await.unwrap();
    assert_eq!(first.created, 2);

    let second = catalog::apply_import(&pool, &outcome.talks).await.unwrap();
    assert_eq!(second.created, 0);
    assert_eq!(second.updated, 2);

    let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM talks")
        .fetch_one(&pool)
        .await
        .unwrap();
    assert_eq!(count, 2);
}

#[tokio::test]
async fn test_update_preserves_other_fields() {
    let (_dir, pool) = setup_test_db().await;

    let outcome = parse_talk_list("10. Original Title").unwrap();
    catalog::apply_import(&pool, &outcome.talks).await.unwrap();

    // Curate the entry, then lock it
    sqlx::query(
        "UPDATE talks SET topic = 'Curated Topic', description = 'Curated', \
         duration_minutes = 45, locked = 1 WHERE number = 10",
    )
    .execute(&pool)
    .await
    .unwrap();

    let outcome = parse_talk_list("10. Revised Title").unwrap();
    let summary = catalog::apply_import(&pool, &outcome.talks).await.unwrap();
    assert_eq!(summary.updated, 1);

    let talk = catalog::find_by_number(&pool, 10).await.unwrap().unwrap();
    assert_eq!(talk.title, "Revised Title");
    assert_eq!(talk.topic, "Curated Topic");
    assert_eq!(talk.description, "Curated");
    assert_eq!(talk.duration_minutes, 45);
    assert!(talk.locked);
}

#[tokio::test]
async fn test_duplicate_number_in_batch_last_line_wins() {
    let (_dir, pool) = setup_test_db().await;

    let outcome = parse_talk_list("5. First Title\n5. Second Title").unwrap();
    let summary = catalog::apply_import(&pool, &outcome.talks).await.unwrap();

    // First line creates, second line updates the same entry
    assert_eq!(summary.created, 1);
    assert_eq!(summary.updated, 1);

    let talk = catalog::find_by_number(&pool, 5).await.unwrap().unwrap();
    assert_eq!(talk.title, "Second Title");

    let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM talks WHERE number = 5")
        .fetch_one(&pool)
        .await
        .unwrap();
    assert_eq!(count, 1);
}

#[tokio::test]
async fn test_full_example_scenario() {
    let (_dir, pool) = setup_test_db().await;

    let input = "1. Topic One\n2. Topic Two\nabc. Bad Line\n500. Out of Range";
    let outcome = parse_talk_list(input).unwrap();
    let summary = catalog::apply_import(&pool, &outcome.talks).await.unwrap();

    assert_eq!(summary.created, 2);
    assert_eq!(summary.updated, 0);
    assert_eq!(outcome.rejected.len(), 2);

    // Re-run: same rejections, everything becomes an update
    let outcome = parse_talk_list(input).unwrap();
    let summary = catalog::apply_import(&pool, &outcome.talks).await.unwrap();
    assert_eq!(summary.created, 0);
    assert_eq!(summary.updated, 2);
    assert_eq!(outcome.rejected.len(), 2);
}

#[tokio::test]
async fn test_empty_batch_is_a_noop() {
    let (_dir, pool) = setup_test_db().await;

    let summary = catalog::apply_import(&pool, &[]).await.unwrap();
    assert_eq!(summary.created, 0);
    assert_eq!(summary.updated, 0);
}
