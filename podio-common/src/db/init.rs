//! Database initialization
//!
//! Creates the schema on first run and opens it idempotently afterwards.
//! Also seeds the default congregation and administrator account when the
//! database is empty, and ensures default settings exist.

use crate::auth;
use crate::Result;
use sqlx::{sqlite::SqlitePoolOptions, SqlitePool};
use std::path::Path;
use tracing::{info, warn};
use uuid::Uuid;

/// Initialize database connection and create tables if needed
pub async fn init_database(db_path: &Path) -> Result<SqlitePool> {
    let newly_created = !db_path.exists();

    // Create parent directory if it doesn't exist
    if let Some(parent) = db_path.parent() {
        std::fs::create_dir_all(parent)?;
    }

    let db_url = format!("sqlite://{}?mode=rwc", db_path.display());
    let pool = SqlitePoolOptions::new()
        .max_connections(10)
        .connect(&db_url)
        .await?;

    if newly_created {
        info!("Initialized new database: {}", db_path.display());
    } else {
        info!("Opened existing database: {}", db_path.display());
    }

    configure_connection(&pool).await?;
    create_schema(&pool).await?;
    init_default_settings(&pool).await?;
    seed_initial_data(&pool).await?;

    Ok(pool)
}

/// Connection pragmas: foreign keys, WAL, busy timeout
async fn configure_connection(pool: &SqlitePool) -> Result<()> {
    sqlx::query("PRAGMA foreign_keys = ON").execute(pool).await?;

    // WAL allows concurrent readers with one writer
    sqlx::query("PRAGMA journal_mode = WAL").execute(pool).await?;

    sqlx::query("PRAGMA busy_timeout = 5000").execute(pool).await?;

    Ok(())
}

/// Create all tables (idempotent - safe to call multiple times)
async fn create_schema(pool: &SqlitePool) -> Result<()> {
    create_schema_version_table(pool).await?;
    create_settings_table(pool).await?;
    create_congregations_table(pool).await?;
    create_users_table(pool).await?;
    create_sessions_table(pool).await?;
    create_talks_table(pool).await?;
    create_speakers_table(pool).await?;
    create_events_table(pool).await?;
    create_schedule_table(pool).await?;
    create_talk_history_table(pool).await?;
    create_coordinators_table(pool).await?;
    create_speaker_accounts_table(pool).await?;
    create_talk_assignments_table(pool).await?;
    Ok(())
}

async fn create_schema_version_table(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS schema_version (
            version INTEGER PRIMARY KEY,
            applied_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP
        )
        "#,
    )
    .execute(pool)
    .await?;

    Ok(())
}

/// Create the settings table
///
/// Stores application configuration key-value pairs.
pub async fn create_settings_table(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS settings (
            key TEXT PRIMARY KEY,
            value TEXT,
            updated_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP
        )
        "#,
    )
    .execute(pool)
    .await?;

    Ok(())
}

async fn create_congregations_table(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS congregations (
            guid TEXT PRIMARY KEY,
            name TEXT NOT NULL,
            locality TEXT NOT NULL,
            active INTEGER NOT NULL DEFAULT 1,
            created_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP,
            updated_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP
        )
        "#,
    )
    .execute(pool)
    .await?;

    Ok(())
}

async fn create_users_table(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS users (
            guid TEXT PRIMARY KEY,
            username TEXT NOT NULL UNIQUE,
            password_hash TEXT NOT NULL,
            password_salt TEXT NOT NULL,
            display_name TEXT NOT NULL,
            congregation_id TEXT REFERENCES congregations(guid),
            active INTEGER NOT NULL DEFAULT 1,
            created_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP,
            updated_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP
        )
        "#,
    )
    .execute(pool)
    .await?;

    Ok(())
}

async fn create_sessions_table(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS sessions (
            token TEXT PRIMARY KEY,
            user_guid TEXT NOT NULL REFERENCES users(guid) ON DELETE CASCADE,
            created_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP,
            expires_at INTEGER NOT NULL
        )
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query("CREATE INDEX IF NOT EXISTS idx_sessions_user ON sessions(user_guid)")
        .execute(pool)
        .await?;

    Ok(())
}

/// Create the talks catalog table
///
/// `number` is the public identity of a talk; the import path relies on
/// its UNIQUE constraint to update-in-place instead of duplicating.
pub async fn create_talks_table(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS talks (
            guid TEXT PRIMARY KEY,
            number INTEGER NOT NULL UNIQUE,
            title TEXT NOT NULL,
            topic TEXT NOT NULL DEFAULT 'Topic to be defined',
            description TEXT NOT NULL DEFAULT '',
            duration_minutes INTEGER NOT NULL DEFAULT 30,
            locked INTEGER NOT NULL DEFAULT 0,
            active INTEGER NOT NULL DEFAULT 1,
            created_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP,
            updated_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP,
            CHECK (number >= 1 AND number <= 200),
            CHECK (duration_minutes > 0)
        )
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query("CREATE INDEX IF NOT EXISTS idx_talks_number ON talks(number)")
        .execute(pool)
        .await?;

    Ok(())
}

async fn create_speakers_table(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS speakers (
            guid TEXT PRIMARY KEY,
            name TEXT NOT NULL,
            congregation_id TEXT NOT NULL REFERENCES congregations(guid),
            host INTEGER NOT NULL DEFAULT 0,
            phone TEXT,
            email TEXT,
            approved INTEGER NOT NULL DEFAULT 0,
            active INTEGER NOT NULL DEFAULT 1,
            created_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP,
            updated_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP
        )
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query("CREATE INDEX IF NOT EXISTS idx_speakers_congregation ON speakers(congregation_id)")
        .execute(pool)
        .await?;

    Ok(())
}

async fn create_events_table(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS events (
            guid TEXT PRIMARY KEY,
            kind TEXT NOT NULL,
            title TEXT NOT NULL,
            description TEXT,
            start_date DATE NOT NULL,
            end_date DATE NOT NULL,
            blocks_schedule INTEGER NOT NULL DEFAULT 0,
            special_talks INTEGER NOT NULL DEFAULT 0,
            congregation_id TEXT REFERENCES congregations(guid),
            created_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP,
            CHECK (end_date >= start_date)
        )
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query("CREATE INDEX IF NOT EXISTS idx_events_dates ON events(start_date, end_date)")
        .execute(pool)
        .await?;

    Ok(())
}

async fn create_schedule_table(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS schedule (
            guid TEXT PRIMARY KEY,
            talk_date DATE NOT NULL,
            start_time TEXT NOT NULL,
            talk_id TEXT NOT NULL REFERENCES talks(guid),
            speaker_id TEXT NOT NULL REFERENCES speakers(guid),
            congregation_id TEXT NOT NULL REFERENCES congregations(guid),
            host_id TEXT REFERENCES speakers(guid),
            completed INTEGER NOT NULL DEFAULT 0,
            notes TEXT,
            created_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP,
            updated_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP
        )
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query("CREATE INDEX IF NOT EXISTS idx_schedule_date ON schedule(talk_date)")
        .execute(pool)
        .await?;
    sqlx::query("CREATE INDEX IF NOT EXISTS idx_schedule_congregation ON schedule(congregation_id)")
        .execute(pool)
        .await?;

    Ok(())
}

async fn create_talk_history_table(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS talk_history (
            guid TEXT PRIMARY KEY,
            realized_on DATE NOT NULL,
            talk_id TEXT NOT NULL REFERENCES talks(guid),
            speaker_id TEXT NOT NULL REFERENCES speakers(guid),
            congregation_id TEXT NOT NULL REFERENCES congregations(guid),
            notes TEXT,
            created_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP
        )
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query("CREATE INDEX IF NOT EXISTS idx_history_date ON talk_history(realized_on)")
        .execute(pool)
        .await?;
    sqlx::query("CREATE INDEX IF NOT EXISTS idx_history_speaker ON talk_history(speaker_id)")
        .execute(pool)
        .await?;

    Ok(())
}

async fn create_coordinators_table(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS coordinators (
            guid TEXT PRIMARY KEY,
            congregation_id TEXT NOT NULL REFERENCES congregations(guid),
            speaker_id TEXT NOT NULL REFERENCES speakers(guid),
            phone TEXT,
            active INTEGER NOT NULL DEFAULT 1,
            start_date DATE NOT NULL,
            end_date DATE
        )
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query(
        "CREATE INDEX IF NOT EXISTS idx_coordinators_congregation ON coordinators(congregation_id)",
    )
    .execute(pool)
    .await?;

    Ok(())
}

async fn create_speaker_accounts_table(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS speaker_accounts (
            guid TEXT PRIMARY KEY,
            speaker_id TEXT NOT NULL UNIQUE REFERENCES speakers(guid),
            username TEXT NOT NULL UNIQUE,
            password_hash TEXT NOT NULL,
            password_salt TEXT NOT NULL,
            active INTEGER NOT NULL DEFAULT 1,
            created_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP
        )
        "#,
    )
    .execute(pool)
    .await?;

    Ok(())
}

async fn create_talk_assignments_table(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS talk_assignments (
            guid TEXT PRIMARY KEY,
            speaker_id TEXT NOT NULL REFERENCES speakers(guid),
            talk_id TEXT NOT NULL REFERENCES talks(guid),
            accepted INTEGER NOT NULL DEFAULT 0,
            accepted_at TIMESTAMP,
            prepared INTEGER NOT NULL DEFAULT 0,
            notes TEXT,
            created_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP,
            UNIQUE (speaker_id, talk_id)
        )
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query(
        "CREATE INDEX IF NOT EXISTS idx_talk_assignments_speaker ON talk_assignments(speaker_id)",
    )
    .execute(pool)
    .await?;

    Ok(())
}

/// Initialize or update default settings
async fn init_default_settings(pool: &SqlitePool) -> Result<()> {
    ensure_setting(pool, "session_timeout_seconds", "2592000").await?; // 30 days
    ensure_setting(pool, "import_display_limit", "5").await?;
    ensure_setting(pool, "dashboard_upcoming_limit", "5").await?;

    info!("Default settings initialized");
    Ok(())
}

/// Ensure a setting exists with the specified default value
///
/// If the setting doesn't exist, it will be created with the default.
/// If the setting exists but has a NULL value, it will be reset to the default.
async fn ensure_setting(pool: &SqlitePool, key: &str, default_value: &str) -> Result<()> {
    let exists: bool = sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM settings WHERE key = ?)")
        .bind(key)
        .fetch_one(pool)
        .await?;

    if !exists {
        sqlx::query("INSERT OR IGNORE INTO settings (key, value) VALUES (?, ?)")
            .bind(key)
            .bind(default_value)
            .execute(pool)
            .await?;
        return Ok(());
    }

    let value: Option<String> = sqlx::query_scalar("SELECT value FROM settings WHERE key = ?")
        .bind(key)
        .fetch_one(pool)
        .await?;

    if value.is_none() {
        sqlx::query("UPDATE settings SET value = ? WHERE key = ?")
            .bind(default_value)
            .bind(key)
            .execute(pool)
            .await?;

        warn!("Setting '{}' was NULL, reset to default: {}", key, default_value);
    }

    Ok(())
}

/// Seed the default congregation and administrator on an empty database.
///
/// The admin password comes from PODIO_ADMIN_PASSWORD when set; the
/// fallback is only meant for first login and should be changed.
async fn seed_initial_data(pool: &SqlitePool) -> Result<()> {
    let congregation_count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM congregations")
        .fetch_one(pool)
        .await?;

    if congregation_count > 0 {
        return Ok(());
    }

    let congregation_guid = Uuid::new_v4().to_string();
    sqlx::query("INSERT INTO congregations (guid, name, locality) VALUES (?, ?, ?)")
        .bind(&congregation_guid)
        .bind("Central Congregation")
        .bind("Main Locality")
        .execute(pool)
        .await?;

    let password =
        std::env::var("PODIO_ADMIN_PASSWORD").unwrap_or_else(|_| "admin123".to_string());
    let salt = auth::generate_salt();
    let hash = auth::hash_password(&password, &salt);

    sqlx::query(
        r#"
        INSERT INTO users (guid, username, password_hash, password_salt, display_name, congregation_id)
        VALUES (?, 'admin', ?, ?, 'Administrator', ?)
        "#,
    )
    .bind(Uuid::new_v4().to_string())
    .bind(&hash)
    .bind(&salt)
    .bind(&congregation_guid)
    .execute(pool)
    .await?;

    if std::env::var("PODIO_ADMIN_PASSWORD").is_err() {
        warn!("Seeded 'admin' user with the default password; set PODIO_ADMIN_PASSWORD to override");
    } else {
        info!("Seeded 'admin' user and default congregation");
    }

    Ok(())
}
