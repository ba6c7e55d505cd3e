//! Talk catalog repository
//!
//! Owns the reconciliation half of the bulk import: parsed `(number,
//! title)` records are applied against the catalog in one transaction,
//! updating titles of existing numbers and inserting the rest with
//! default metadata.

use crate::db::models::Talk;
use crate::import::ParsedTalk;
use crate::Result;
use serde::Serialize;
use sqlx::SqlitePool;
use tracing::info;
use uuid::Uuid;

/// Topic placeholder for entries created by import
pub const DEFAULT_TOPIC: &str = "Topic to be defined";

/// Default duration for entries created by import
pub const DEFAULT_DURATION_MINUTES: i64 = 30;

/// Counters reported back after an import batch
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ImportSummary {
    pub created: u32,
    pub updated: u32,
}

/// Look up a catalog entry by its public number
pub async fn find_by_number(pool: &SqlitePool, number: i64) -> Result<Option<Talk>> {
    let talk = sqlx::query_as::<_, Talk>(
        r#"
        SELECT guid, number, title, topic, description, duration_minutes, locked, active
        FROM talks WHERE number = ?
        "#,
    )
    .bind(number)
    .fetch_optional(pool)
    .await?;

    Ok(talk)
}

/// List catalog entries ordered by number
pub async fn list_talks(pool: &SqlitePool, active_only: bool) -> Result<Vec<Talk>> {
    let sql = if active_only {
        "SELECT guid, number, title, topic, description, duration_minutes, locked, active
         FROM talks WHERE active = 1 ORDER BY number"
    } else {
        "SELECT guid, number, title, topic, description, duration_minutes, locked, active
         FROM talks ORDER BY number"
    };

    let talks = sqlx::query_as::<_, Talk>(sql).fetch_all(pool).await?;
    Ok(talks)
}

/// Apply parsed import records against the catalog.
///
/// The whole batch runs in one transaction: either every record is
/// applied or none are. Existing numbers get only their title
/// overwritten (topic, description, duration and locked state are
/// preserved); missing numbers are inserted with default metadata.
/// Records are applied in order, so a number repeated within one batch
/// resolves last-line-wins.
pub async fn apply_import(pool: &SqlitePool, talks: &[ParsedTalk]) -> Result<ImportSummary> {
    let mut summary = ImportSummary::default();
    let mut tx = pool.begin().await?;

    for talk in talks {
        let existing: Option<String> = sqlx::query_scalar("SELECT guid FROM talks WHERE number = ?")
            .bind(talk.number)
            .fetch_optional(&mut *tx)
            .await?;

        match existing {
            Some(guid) => {
                sqlx::query(
                    "UPDATE talks SET title = ?, updated_at = CURRENT_TIMESTAMP WHERE guid = ?",
                )
                .bind(&talk.title)
                .bind(&guid)
                .execute(&mut *tx)
                .await?;
                summary.updated += 1;
            }
            None => {
                sqlx::query(
                    r#"
                    INSERT INTO talks (guid, number, title, topic, description, duration_minutes, locked)
                    VALUES (?, ?, ?, ?, ?, ?, 0)
                    "#,
                )
                .bind(Uuid::new_v4().to_string())
                .bind(talk.number)
                .bind(&talk.title)
                .bind(DEFAULT_TOPIC)
                .bind(format!("Public talk #{}", talk.number))
                .bind(DEFAULT_DURATION_MINUTES)
                .execute(&mut *tx)
                .await?;
                summary.created += 1;
            }
        }
    }

    tx.commit().await?;

    info!(
        "Catalog import applied: {} created, {} updated",
        summary.created, summary.updated
    );

    Ok(summary)
}
