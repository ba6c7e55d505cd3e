//! Talk coordinator assignment handlers

use axum::{
    extract::{Path, Query, State},
    Json,
};
use chrono::{NaiveDate, Utc};
use serde::Deserialize;
use uuid::Uuid;

use podio_common::db::models::Coordinator;

use super::ApiError;
use crate::AppState;

const SELECT_COLUMNS: &str =
    "guid, congregation_id, speaker_id, phone, active, start_date, end_date";

#[derive(Debug, Deserialize)]
pub struct ListCoordinatorsQuery {
    pub congregation_id: Option<String>,
    #[serde(default)]
    pub active_only: bool,
}

/// GET /api/coordinators
pub async fn list_coordinators(
    State(state): State<AppState>,
    Query(query): Query<ListCoordinatorsQuery>,
) -> Result<Json<Vec<Coordinator>>, ApiError> {
    let mut sql = format!("SELECT {SELECT_COLUMNS} FROM coordinators WHERE 1=1");
    if query.congregation_id.is_some() {
        sql.push_str(" AND congregation_id = ?");
    }
    if query.active_only {
        sql.push_str(" AND active = 1");
    }
    sql.push_str(" ORDER BY start_date DESC");

    let mut q = sqlx::query_as::<_, Coordinator>(&sql);
    if let Some(congregation_id) = &query.congregation_id {
        q = q.bind(congregation_id);
    }

    let rows = q.fetch_all(&state.db).await?;
    Ok(Json(rows))
}

#[derive(Debug, Deserialize)]
pub struct AssignCoordinatorRequest {
    pub congregation_id: String,
    pub speaker_id: String,
    pub phone: Option<String>,
    pub start_date: Option<NaiveDate>,
}

/// POST /api/coordinators
///
/// A congregation has at most one active coordinator: assigning a new
/// one closes the current assignment in the same transaction.
pub async fn assign_coordinator(
    State(state): State<AppState>,
    Json(req): Json<AssignCoordinatorRequest>,
) -> Result<Json<Coordinator>, ApiError> {
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

    let start_date = req.start_date.unwrap_or_else(|| Utc::now().date_naive());
    let guid = Uuid::new_v4().to_string();

    let mut tx = state.db.begin().await?;

    sqlx::query(
        "UPDATE coordinators SET active = 0, end_date = ? \
         WHERE congregation_id = ? AND active = 1",
    )
    .bind(start_date)
    .bind(&req.congregation_id)
    .execute(&mut *tx)
    .await?;

    sqlx::query(
        "INSERT INTO coordinators (guid, congregation_id, speaker_id, phone, start_date) \
         VALUES (?, ?, ?, ?, ?)",
    )
    .bind(&guid)
    .bind(&req.congregation_id)
    .bind(&req.speaker_id)
    .bind(&req.phone)
    .bind(start_date)
    .execute(&mut *tx)
    .await?;

    tx.commit().await?;

    fetch_coordinator(&state, &guid).await.map(Json)
}

/// POST /api/coordinators/:guid/end
pub async fn end_coordinator(
    State(state): State<AppState>,
    Path(guid): Path<String>,
) -> Result<Json<Coordinator>, ApiError> {
    let result = sqlx::query(
        "UPDATE coordinators SET active = 0, end_date = ? WHERE guid = ? AND active = 1",
    )
    .bind(Utc::now().date_naive())
    .bind(&guid)
    .execute(&state.db)
    .await?;

    if result.rows_affected() == 0 {
        return Err(ApiError::NotFound(format!(
            "active coordinator assignment {}",
            guid
        )));
    }

    fetch_coordinator(&state, &guid).await.map(Json)
}

async fn fetch_coordinator(state: &AppState, guid: &str) -> Result<Coordinator, ApiError> {
    sqlx::query_as::<_, Coordinator>(&format!(
        "SELECT {SELECT_COLUMNS} FROM coordinators WHERE guid = ?"
    ))
    .bind(guid)
    .fetch_optional(&state.db)
    .await?
    .ok_or_else(|| ApiError::NotFound(format!("coordinator assignment {}", guid)))
}
