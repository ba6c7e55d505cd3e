//! Speaker CRUD handlers

use axum::{
    extract::{Path, Query, State},
    Json,
};
use serde::Deserialize;
use uuid::Uuid;

use podio_common::db::models::Speaker;

use super::ApiError;
use crate::AppState;

const SELECT_COLUMNS: &str =
    "guid, name, congregation_id, host, phone, email, approved, active";

#[derive(Debug, Deserialize)]
pub struct ListSpeakersQuery {
    pub congregation_id: Option<String>,
    #[serde(default)]
    pub active_only: bool,
}

/// GET /api/speakers
pub async fn list_speakers(
    State(state): State<AppState>,
    Query(query): Query<ListSpeakersQuery>,
) -> Result<Json<Vec<Speaker>>, ApiError> {
    let mut sql = format!("SELECT {SELECT_COLUMNS} FROM speakers WHERE 1=1");
    if query.active_only {
        sql.push_str(" AND active = 1");
    }
    if query.congregation_id.is_some() {
        sql.push_str(" AND congregation_id = ?");
    }
    sql.push_str(" ORDER BY name");

    let mut q = sqlx::query_as::<_, Speaker>(&sql);
    if let Some(congregation_id) = &query.congregation_id {
        q = q.bind(congregation_id);
    }

    let rows = q.fetch_all(&state.db).await?;
    Ok(Json(rows))
}

/// GET /api/speakers/:guid
pub async fn get_speaker(
    State(state): State<AppState>,
    Path(guid): Path<String>,
) -> Result<Json<Speaker>, ApiError> {
    sqlx::query_as::<_, Speaker>(&format!(
        "SELECT {SELECT_COLUMNS} FROM speakers WHERE guid = ?"
    ))
    .bind(&guid)
    .fetch_optional(&state.db)
    .await?
    .map(Json)
    .ok_or_else(|| ApiError::NotFound(format!("speaker {}", guid)))
}

#[derive(Debug, Deserialize)]
pub struct CreateSpeakerRequest {
    pub name: String,
    pub congregation_id: String,
    #[serde(default)]
    pub host: bool,
    pub phone: Option<String>,
    pub email: Option<String>,
}

/// POST /api/speakers
pub async fn create_speaker(
    State(state): State<AppState>,
    Json(req): Json<CreateSpeakerRequest>,
) -> Result<Json<Speaker>, ApiError> {
    if req.name.trim().is_empty() {
        return Err(ApiError::BadRequest("name must not be empty".to_string()));
    }

    let congregation_exists: bool =
        sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM congregations WHERE guid = ?)")
            .bind(&req.congregation_id)
            .fetch_one(&state.db)
            .await?;
    if !congregation_exists {
        return Err(ApiError::BadRequest(format!(
            "unknown congregation {}",
            req.congregation_id
        )));
    }

    let guid = Uuid::new_v4().to_string();
    sqlx::query(
        "INSERT INTO speakers (guid, name, congregation_id, host, phone, email) \
         VALUES (?, ?, ?, ?, ?, ?)",
    )
    .bind(&guid)
    .bind(req.name.trim())
    .bind(&req.congregation_id)
    .bind(req.host)
    .bind(&req.phone)
    .bind(&req.email)
    .execute(&state.db)
    .await?;

    get_speaker(State(state), Path(guid)).await
}

#[derive(Debug, Deserialize)]
pub struct UpdateSpeakerRequest {
    pub name: Option<String>,
    pub congregation_id: Option<String>,
    pub host: Option<bool>,
    pub phone: Option<String>,
    pub email: Option<String>,
    pub active: Option<bool>,
}

/// PUT /api/speakers/:guid
pub async fn update_speaker(
    State(state): State<AppState>,
    Path(guid): Path<String>,
    Json(req): Json<UpdateSpeakerRequest>,
) -> Result<Json<Speaker>, ApiError> {
    let existing = sqlx::query_as::<_, Speaker>(&format!(
        "SELECT {SELECT_COLUMNS} FROM speakers WHERE guid = ?"
    ))
    .bind(&guid)
    .fetch_optional(&state.db)
    .await?
    .ok_or_else(|| ApiError::NotFound(format!("speaker {}", guid)))?;

    sqlx::query(
        "UPDATE speakers SET name = ?, congregation_id = ?, host = ?, phone = ?, \
         email = ?, active = ?, updated_at = CURRENT_TIMESTAMP WHERE guid = ?",
    )
    .bind(req.name.unwrap_or(existing.name))
    .bind(req.congregation_id.unwrap_or(existing.congregation_id))
    .bind(req.host.unwrap_or(existing.host))
    .bind(req.phone.or(existing.phone))
    .bind(req.email.or(existing.email))
    .bind(req.active.unwrap_or(existing.active))
    .bind(&guid)
    .execute(&state.db)
    .await?;

    get_speaker(State(state), Path(guid)).await
}

/// POST /api/speakers/:guid/approve
pub async fn approve_speaker(
    State(state): State<AppState>,
    Path(guid): Path<String>,
) -> Result<Json<Speaker>, ApiError> {
    let result = sqlx::query(
        "UPDATE speakers SET approved = 1, updated_at = CURRENT_TIMESTAMP WHERE guid = ?",
    )
    .bind(&guid)
    .execute(&state.db)
    .await?;

    if result.rows_affected() == 0 {
        return Err(ApiError::NotFound(format!("speaker {}", guid)));
    }

    get_speaker(State(state), Path(guid)).await
}

/// DELETE /api/speakers/:guid
///
/// Soft delete: clears the active flag.
pub async fn deactivate_speaker(
    State(state): State<AppState>,
    Path(guid): Path<String>,
) -> Result<Json<Speaker>, ApiError> {
    let result = sqlx::query(
        "UPDATE speakers SET active = 0, updated_at = CURRENT_TIMESTAMP WHERE guid = ?",
    )
    .bind(&guid)
    .execute(&state.db)
    .await?;

    if result.rows_affected() == 0 {
        return Err(ApiError::NotFound(format!("speaker {}", guid)));
    }

    get_speaker(State(state), Path(guid)).await
}
