//! Agenda (schedule) handlers
//!
//! Creation validates the booking: the date must not be covered by a
//! blocking event, the talk must be active and unlocked, and the
//! speaker must be active and approved. Completion delegates to the
//! transactional helper that also writes the history row.

use axum::{
    extract::{Path, Query, State},
    Json,
};
use chrono::NaiveDate;
use serde::Deserialize;
use uuid::Uuid;

use podio_common::db::models::ScheduleEntry;
use podio_common::db::schedule as schedule_repo;

use super::ApiError;
use crate::AppState;

const SELECT_COLUMNS: &str = "guid, talk_date, start_time, talk_id, speaker_id, \
     congregation_id, host_id, completed, notes";

#[derive(Debug, Deserialize)]
pub struct ListScheduleQuery {
    pub congregation_id: Option<String>,
    pub from: Option<NaiveDate>,
    pub to: Option<NaiveDate>,
    /// When true, only entries not yet completed are returned
    #[serde(default)]
    pub pending_only: bool,
}

/// GET /api/schedule
pub async fn list_schedule(
    State(state): State<AppState>,
    Query(query): Query<ListScheduleQuery>,
) -> Result<Json<Vec<ScheduleEntry>>, ApiError> {
    let mut sql = format!("SELECT {SELECT_COLUMNS} FROM schedule WHERE 1=1");
    if query.congregation_id.is_some() {
        sql.push_str(" AND congregation_id = ?");
    }
    if query.from.is_some() {
        sql.push_str(" AND talk_date >= ?");
    }
    if query.to.is_some() {
        sql.push_str(" AND talk_date <= ?");
    }
    if query.pending_only {
        sql.push_str(" AND completed = 0");
    }
    sql.push_str(" ORDER BY talk_date, start_time");

    let mut q = sqlx::query_as::<_, ScheduleEntry>(&sql);
    if let Some(congregation_id) = &query.congregation_id {
        q = q.bind(congregation_id);
    }
    if let Some(from) = query.from {
        q = q.bind(from);
    }
    if let Some(to) = query.to {
        q = q.bind(to);
    }

    let rows = q.fetch_all(&state.db).await?;
    Ok(Json(rows))
}

/// GET /api/schedule/:guid
pub async fn get_schedule_entry(
    State(state): State<AppState>,
    Path(guid): Path<String>,
) -> Result<Json<ScheduleEntry>, ApiError> {
    schedule_repo::find_entry(&state.db, &guid)
        .await?
        .map(Json)
        .ok_or_else(|| ApiError::NotFound(format!("schedule entry {}", guid)))
}

#[derive(Debug, Deserialize)]
pub struct CreateScheduleRequest {
    pub talk_date: NaiveDate,
    pub start_time: String,
    pub talk_number: i64,
    pub speaker_id: String,
    pub congregation_id: String,
    pub host_id: Option<String>,
    pub notes: Option<String>,
}

/// POST /api/schedule
pub async fn create_schedule_entry(
    State(state): State<AppState>,
    Json(req): Json<CreateScheduleRequest>,
) -> Result<Json<ScheduleEntry>, ApiError> {
    if schedule_repo::date_is_blocked(&state.db, req.talk_date, &req.congregation_id).await? {
        return Err(ApiError::Conflict(format!(
            "date {} is blocked by an event",
            req.talk_date
        )));
    }

    let talk = podio_common::db::catalog::find_by_number(&state.db, req.talk_number)
        .await?
        .ok_or_else(|| ApiError::BadRequest(format!("unknown talk {}", req.talk_number)))?;
    if !talk.active {
        return Err(ApiError::Conflict(format!("talk {} is inactive", talk.number)));
    }
    if talk.locked {
        return Err(ApiError::Conflict(format!("talk {} is locked", talk.number)));
    }

    let speaker: Option<(bool, bool)> =
        sqlx::query_as("SELECT active, approved FROM speakers WHERE guid = ?")
            .bind(&req.speaker_id)
            .fetch_optional(&state.db)
            .await?;
    match speaker {
        None => {
            return Err(ApiError::BadRequest(format!("unknown speaker {}", req.speaker_id)))
        }
        Some((active, approved)) if !active || !approved => {
            return Err(ApiError::Conflict(
                "speaker is inactive or not approved".to_string(),
            ));
        }
        Some(_) => {}
    }

    let guid = Uuid::new_v4().to_string();
    sqlx::query(
        r#"
        INSERT INTO schedule (guid, talk_date, start_time, talk_id, speaker_id,
                              congregation_id, host_id, notes)
        VALUES (?, ?, ?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(&guid)
    .bind(req.talk_date)
    .bind(&req.start_time)
    .bind(&talk.guid)
    .bind(&req.speaker_id)
    .bind(&req.congregation_id)
    .bind(&req.host_id)
    .bind(&req.notes)
    .execute(&state.db)
    .await?;

    get_schedule_entry(State(state), Path(guid)).await
}

#[derive(Debug, Deserialize)]
pub struct UpdateScheduleRequest {
    pub talk_date: Option<NaiveDate>,
    pub start_time: Option<String>,
    pub host_id: Option<String>,
    pub notes: Option<String>,
}

/// PUT /api/schedule/:guid
pub async fn update_schedule_entry(
    State(state): State<AppState>,
    Path(guid): Path<String>,
    Json(req): Json<UpdateScheduleRequest>,
) -> Result<Json<ScheduleEntry>, ApiError> {
    let existing = schedule_repo::find_entry(&state.db, &guid)
        .await?
        .ok_or_else(|| ApiError::NotFound(format!("schedule entry {}", guid)))?;

    if existing.completed {
        return Err(ApiError::Conflict("completed entries cannot be edited".to_string()));
    }

    let talk_date = req.talk_date.unwrap_or(existing.talk_date);
    if talk_date != existing.talk_date
        && schedule_repo::date_is_blocked(&state.db, talk_date, &existing.congregation_id).await?
    {
        return Err(ApiError::Conflict(format!("date {} is blocked by an event", talk_date)));
    }

    sqlx::query(
        "UPDATE schedule SET talk_date = ?, start_time = ?, host_id = ?, notes = ?, \
         updated_at = CURRENT_TIMESTAMP WHERE guid = ?",
    )
    .bind(talk_date)
    .bind(req.start_time.unwrap_or(existing.start_time))
    .bind(req.host_id.or(existing.host_id))
    .bind(req.notes.or(existing.notes))
    .bind(&guid)
    .execute(&state.db)
    .await?;

    get_schedule_entry(State(state), Path(guid)).await
}

#[derive(Debug, Deserialize, Default)]
pub struct CompleteScheduleRequest {
    pub notes: Option<String>,
}

/// POST /api/schedule/:guid/complete
///
/// Marks the entry completed and writes the talk_history row in one
/// transaction.
pub async fn complete_schedule_entry(
    State(state): State<AppState>,
    Path(guid): Path<String>,
    body: Option<Json<CompleteScheduleRequest>>,
) -> Result<Json<ScheduleEntry>, ApiError> {
    let req = body.map(|Json(r)| r).unwrap_or_default();
    let entry = schedule_repo::complete_entry(&state.db, &guid, req.notes.as_deref()).await?;
    Ok(Json(entry))
}

/// DELETE /api/schedule/:guid
pub async fn delete_schedule_entry(
    State(state): State<AppState>,
    Path(guid): Path<String>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let result = sqlx::query("DELETE FROM schedule WHERE guid = ? AND completed = 0")
        .bind(&guid)
        .execute(&state.db)
        .await?;

    if result.rows_affected() == 0 {
        return Err(ApiError::NotFound(format!(
            "schedule entry {} (or already completed)",
            guid
        )));
    }

    Ok(Json(serde_json::json!({ "status": "deleted" })))
}
