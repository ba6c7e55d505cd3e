//! Special event handlers
//!
//! Events with the blocks_schedule flag prevent agenda entries from
//! being created within their date span.

use axum::{
    extract::{Path, State},
    Json,
};
use chrono::NaiveDate;
use serde::Deserialize;
use uuid::Uuid;

use podio_common::db::models::EventEntry;

use super::ApiError;
use crate::AppState;

const SELECT_COLUMNS: &str = "guid, kind, title, description, start_date, end_date, \
     blocks_schedule, special_talks, congregation_id";

/// GET /api/events
pub async fn list_events(
    State(state): State<AppState>,
) -> Result<Json<Vec<EventEntry>>, ApiError> {
    let rows = sqlx::query_as::<_, EventEntry>(&format!(
        "SELECT {SELECT_COLUMNS} FROM events ORDER BY start_date"
    ))
    .fetch_all(&state.db)
    .await?;
    Ok(Json(rows))
}

#[derive(Debug, Deserialize)]
pub struct CreateEventRequest {
    pub kind: String,
    pub title: String,
    pub description: Option<String>,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    #[serde(default)]
    pub blocks_schedule: bool,
    #[serde(default)]
    pub special_talks: i64,
    pub congregation_id: Option<String>,
}

/// POST /api/events
pub async fn create_event(
    State(state): State<AppState>,
    Json(req): Json<CreateEventRequest>,
) -> Result<Json<EventEntry>, ApiError> {
    if req.end_date < req.start_date {
        return Err(ApiError::BadRequest("end_date precedes start_date".to_string()));
    }

    let guid = Uuid::new_v4().to_string();
    sqlx::query(
        r#"
        INSERT INTO events (guid, kind, title, description, start_date, end_date,
                            blocks_schedule, special_talks, congregation_id)
        VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(&guid)
    .bind(&req.kind)
    .bind(&req.title)
    .bind(&req.description)
    .bind(req.start_date)
    .bind(req.end_date)
    .bind(req.blocks_schedule)
    .bind(req.special_talks)
    .bind(&req.congregation_id)
    .execute(&state.db)
    .await?;

    fetch_event(&state, &guid).await.map(Json)
}

#[derive(Debug, Deserialize)]
pub struct UpdateEventRequest {
    pub kind: Option<String>,
    pub title: Option<String>,
    pub description: Option<String>,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
    pub blocks_schedule: Option<bool>,
    pub special_talks: Option<i64>,
}

/// PUT /api/events/:guid
pub async fn update_event(
    State(state): State<AppState>,
    Path(guid): Path<String>,
    Json(req): Json<UpdateEventRequest>,
) -> Result<Json<EventEntry>, ApiError> {
    let existing = fetch_event(&state, &guid).await?;

    let start_date = req.start_date.unwrap_or(existing.start_date);
    let end_date = req.end_date.unwrap_or(existing.end_date);
    if end_date < start_date {
        return Err(ApiError::BadRequest("end_date precedes start_date".to_string()));
    }

    sqlx::query(
        "UPDATE events SET kind = ?, title = ?, description = ?, start_date = ?, \
         end_date = ?, blocks_schedule = ?, special_talks = ? WHERE guid = ?",
    )
    .bind(req.kind.unwrap_or(existing.kind))
    .bind(req.title.unwrap_or(existing.title))
    .bind(req.description.or(existing.description))
    .bind(start_date)
    .bind(end_date)
    .bind(req.blocks_schedule.unwrap_or(existing.blocks_schedule))
    .bind(req.special_talks.unwrap_or(existing.special_talks))
    .bind(&guid)
    .execute(&state.db)
    .await?;

    fetch_event(&state, &guid).await.map(Json)
}

/// DELETE /api/events/:guid
pub async fn delete_event(
    State(state): State<AppState>,
    Path(guid): Path<String>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let result = sqlx::query("DELETE FROM events WHERE guid = ?")
        .bind(&guid)
        .execute(&state.db)
        .await?;

    if result.rows_affected() == 0 {
        return Err(ApiError::NotFound(format!("event {}", guid)));
    }

    Ok(Json(serde_json::json!({ "status": "deleted" })))
}

async fn fetch_event(state: &AppState, guid: &str) -> Result<EventEntry, ApiError> {
    sqlx::query_as::<_, EventEntry>(&format!(
        "SELECT {SELECT_COLUMNS} FROM events WHERE guid = ?"
    ))
    .bind(guid)
    .fetch_optional(&state.db)
    .await?
    .ok_or_else(|| ApiError::NotFound(format!("event {}", guid)))
}
