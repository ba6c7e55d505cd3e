//! Schedule repository helpers
//!
//! Completion moves an agenda entry into the history log; both writes
//! happen in one transaction so a crash cannot leave an entry completed
//! without its history row (or the reverse).

use crate::db::models::ScheduleEntry;
use crate::{Error, Result};
use chrono::NaiveDate;
use sqlx::SqlitePool;
use uuid::Uuid;

const SELECT_COLUMNS: &str = "guid, talk_date, start_time, talk_id, speaker_id, \
     congregation_id, host_id, completed, notes";

/// Fetch one schedule entry by guid
pub async fn find_entry(pool: &SqlitePool, guid: &str) -> Result<Option<ScheduleEntry>> {
    let entry = sqlx::query_as::<_, ScheduleEntry>(&format!(
        "SELECT {SELECT_COLUMNS} FROM schedule WHERE guid = ?"
    ))
    .bind(guid)
    .fetch_optional(pool)
    .await?;

    Ok(entry)
}

/// True when a blocking event covers the given date for the congregation
/// (events without a congregation block every congregation).
pub async fn date_is_blocked(
    pool: &SqlitePool,
    date: NaiveDate,
    congregation_id: &str,
) -> Result<bool> {
    let blocked: bool = sqlx::query_scalar(
        r#"
        SELECT EXISTS(
            SELECT 1 FROM events
            WHERE blocks_schedule = 1
              AND start_date <= ? AND end_date >= ?
              AND (congregation_id IS NULL OR congregation_id = ?)
        )
        "#,
    )
    .bind(date)
    .bind(date)
    .bind(congregation_id)
    .fetch_one(pool)
    .await?;

    Ok(blocked)
}

/// Mark a schedule entry completed and write its history row.
///
/// Idempotence: completing an already-completed entry is a conflict, so
/// the history log never gets a duplicate row for the same delivery.
pub async fn complete_entry(
    pool: &SqlitePool,
    guid: &str,
    notes: Option<&str>,
) -> Result<ScheduleEntry> {
    let entry = find_entry(pool, guid)
        .await?
        .ok_or_else(|| Error::NotFound(format!("schedule entry {}", guid)))?;

    if entry.completed {
        return Err(Error::Conflict(format!(
            "schedule entry {} is already completed",
            guid
        )));
    }

    let mut tx = pool.begin().await?;

    sqlx::query(
        "UPDATE schedule SET completed = 1, updated_at = CURRENT_TIMESTAMP WHERE guid = ?",
    )
    .bind(guid)
    .execute(&mut *tx)
    .await?;

    sqlx::query(
        r#"
        INSERT INTO talk_history (guid, realized_on, talk_id, speaker_id, congregation_id, notes)
        VALUES (?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(Uuid::new_v4().to_string())
    .bind(entry.talk_date)
    .bind(&entry.talk_id)
    .bind(&entry.speaker_id)
    .bind(&entry.congregation_id)
    .bind(notes.or(entry.notes.as_deref()))
    .execute(&mut *tx)
    .await?;

    tx.commit().await?;

    find_entry(pool, guid)
        .await?
        .ok_or_else(|| Error::Internal("completed entry vanished".to_string()))
}
