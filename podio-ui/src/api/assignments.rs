//! Talk acceptance workflow handlers
//!
//! An assignment records a speaker taking on a catalog talk; the
//! acceptance and prepared flags are set as the speaker works through
//! it.

use axum::{
    extract::{Path, Query, State},
    Json,
};
use serde::Deserialize;
use uuid::Uuid;

use podio_common::db::models::TalkAssignment;

use super::ApiError;
use crate::AppState;

const SELECT_COLUMNS: &str = "guid, speaker_id, talk_id, accepted, accepted_at, \
     prepared, notes, created_at";

#[derive(Debug, Deserialize)]
pub struct ListAssignmentsQuery {
    pub speaker_id: Option<String>,
}

/// GET /api/assignments
pub async fn list_assignments(
    State(state): State<AppState>,
    Query(query): Query<ListAssignmentsQuery>,
) -> Result<Json<Vec<TalkAssignment>>, ApiError> {
    let rows = if let Some(speaker_id) = &query.speaker_id {
        sqlx::query_as::<_, TalkAssignment>(&format!(
            "SELECT {SELECT_COLUMNS} FROM talk_assignments WHERE speaker_id = ? ORDER BY created_at"
        ))
        .bind(speaker_id)
        .fetch_all(&state.db)
        .await?
    } else {
        sqlx::query_as::<_, TalkAssignment>(&format!(
            "SELECT {SELECT_COLUMNS} FROM talk_assignments ORDER BY created_at"
        ))
        .fetch_all(&state.db)
        .await?
    };

    Ok(Json(rows))
}

#[derive(Debug, Deserialize)]
pub struct CreateAssignmentRequest {
    pub speaker_id: String,
    pub talk_number: i64,
    pub notes: Option<String>,
}

/// POST /api/assignments
pub async fn create_assignment(
    State(state): State<AppState>,
    Json(req): Json<CreateAssignmentRequest>,
) -> Result<Json<TalkAssignment>, ApiError> {
    let talk = podio_common::db::catalog::find_by_number(&state.db, req.talk_number)
        .await?
        .ok_or_else(|| ApiError::BadRequest(format!("unknown talk {}", req.talk_number)))?;

    let speaker_exists: bool =
        sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM speakers WHERE guid = ? AND active = 1)")
            .bind(&req.speaker_id)
            .fetch_one(&state.db)
            .await?;
    if !speaker_exists {
        return Err(ApiError::BadRequest(format!(
            "unknown or inactive speaker {}",
            req.speaker_id
        )));
    }

    let exists: bool = sqlx::query_scalar(
        "SELECT EXISTS(SELECT 1 FROM talk_assignments WHERE speaker_id = ? AND talk_id = ?)",
    )
    .bind(&req.speaker_id)
    .bind(&talk.guid)
    .fetch_one(&state.db)
    .await?;
    if exists {
        return Err(ApiError::Conflict(
            "speaker already has an assignment for this talk".to_string(),
        ));
    }

    let guid = Uuid::new_v4().to_string();
    sqlx::query(
        "INSERT INTO talk_assignments (guid, speaker_id, talk_id, notes) VALUES (?, ?, ?, ?)",
    )
    .bind(&guid)
    .bind(&req.speaker_id)
    .bind(&talk.guid)
    .bind(&req.notes)
    .execute(&state.db)
    .await?;

    fetch_assignment(&state, &guid).await.map(Json)
}

/// POST /api/assignments/:guid/accept
pub async fn accept_assignment(
    State(state): State<AppState>,
    Path(guid): Path<String>,
) -> Result<Json<TalkAssignment>, ApiError> {
    let result = sqlx::query(
        "UPDATE talk_assignments SET accepted = 1, accepted_at = CURRENT_TIMESTAMP \
         WHERE guid = ? AND accepted = 0",
    )
    .bind(&guid)
    .execute(&state.db)
    .await?;

    if result.rows_affected() == 0 {
        return Err(ApiError::NotFound(format!(
            "pending assignment {} (missing or already accepted)",
            guid
        )));
    }

    fetch_assignment(&state, &guid).await.map(Json)
}

/// POST /api/assignments/:guid/prepared
pub async fn mark_assignment_prepared(
    State(state): State<AppState>,
    Path(guid): Path<String>,
) -> Result<Json<TalkAssignment>, ApiError> {
    let assignment = fetch_assignment(&state, &guid).await?;
    if !assignment.accepted {
        return Err(ApiError::Conflict(
            "assignment must be accepted before it can be marked prepared".to_string(),
        ));
    }

    sqlx::query("UPDATE talk_assignments SET prepared = 1 WHERE guid = ?")
        .bind(&guid)
        .execute(&state.db)
        .await?;

    fetch_assignment(&state, &guid).await.map(Json)
}

async fn fetch_assignment(state: &AppState, guid: &str) -> Result<TalkAssignment, ApiError> {
    sqlx::query_as::<_, TalkAssignment>(&format!(
        "SELECT {SELECT_COLUMNS} FROM talk_assignments WHERE guid = ?"
    ))
    .bind(guid)
    .fetch_optional(&state.db)
    .await?
    .ok_or_else(|| ApiError::NotFound(format!("assignment {}", guid)))
}
