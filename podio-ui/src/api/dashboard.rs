//! Dashboard summary endpoint

use axum::{extract::State, Json};
use chrono::{Datelike, NaiveDate, Utc};
use serde::Serialize;

use super::ApiError;
use crate::AppState;

#[derive(Debug, Serialize)]
pub struct UpcomingTalk {
    pub guid: String,
    pub talk_date: NaiveDate,
    pub start_time: String,
    pub talk_number: i64,
    pub talk_title: String,
    pub speaker_name: String,
    pub congregation_name: String,
}

#[derive(Debug, Serialize)]
pub struct DashboardResponse {
    pub active_speakers: i64,
    pub scheduled_talks: i64,
    pub talks_this_month: i64,
    pub active_congregations: i64,
    pub catalog_size: i64,
    pub upcoming: Vec<UpcomingTalk>,
}

/// GET /api/dashboard
pub async fn dashboard(
    State(state): State<AppState>,
) -> Result<Json<DashboardResponse>, ApiError> {
    let today = Utc::now().date_naive();
    let month_start = NaiveDate::from_ymd_opt(today.year(), today.month(), 1)
        .ok_or_else(|| ApiError::Internal("invalid month start".to_string()))?;

    let active_speakers: i64 =
        sqlx::query_scalar("SELECT COUNT(*) FROM speakers WHERE active = 1")
            .fetch_one(&state.db)
            .await?;

    let scheduled_talks: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM schedule")
        .fetch_one(&state.db)
        .await?;

    let talks_this_month: i64 =
        sqlx::query_scalar("SELECT COUNT(*) FROM schedule WHERE talk_date >= ?")
            .bind(month_start)
            .fetch_one(&state.db)
            .await?;

    let active_congregations: i64 =
        sqlx::query_scalar("SELECT COUNT(*) FROM congregations WHERE active = 1")
            .fetch_one(&state.db)
            .await?;

    let catalog_size: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM talks")
        .fetch_one(&state.db)
        .await?;

    let limit: i64 = sqlx::query_scalar(
        "SELECT CAST(value AS INTEGER) FROM settings WHERE key = 'dashboard_upcoming_limit'",
    )
    .fetch_optional(&state.db)
    .await?
    .unwrap_or(5);

    let upcoming = sqlx::query_as::<_, (String, NaiveDate, String, i64, String, String, String)>(
        r#"
        SELECT s.guid, s.talk_date, s.start_time, t.number, t.title, sp.name, c.name
        FROM schedule s
        JOIN talks t ON t.guid = s.talk_id
        JOIN speakers sp ON sp.guid = s.speaker_id
        JOIN congregations c ON c.guid = s.congregation_id
        WHERE s.talk_date >= ? AND s.completed = 0
        ORDER BY s.talk_date, s.start_time
        LIMIT ?
        "#,
    )
    .bind(today)
    .bind(limit)
    .fetch_all(&state.db)
    .await?
    .into_iter()
    .map(
        |(guid, talk_date, start_time, talk_number, talk_title, speaker_name, congregation_name)| {
            UpcomingTalk {
                guid,
                talk_date,
                start_time,
                talk_number,
                talk_title,
                speaker_name,
                congregation_name,
            }
        },
    )
    .collect();

    Ok(Json(DashboardResponse {
        active_speakers,
        scheduled_talks,
        talks_this_month,
        active_congregations,
        catalog_size,
        upcoming,
    }))
}
