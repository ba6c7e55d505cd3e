//! Congregation CRUD handlers

use axum::{
    extract::{Path, Query, State},
    Json,
};
use serde::Deserialize;
use uuid::Uuid;

use podio_common::db::models::Congregation;

use super::ApiError;
use crate::AppState;

const SELECT_COLUMNS: &str = "guid, name, locality, active";

#[derive(Debug, Deserialize)]
pub struct ListCongregationsQuery {
    #[serde(default)]
    pub active_only: bool,
}

/// GET /api/congregations
pub async fn list_congregations(
    State(state): State<AppState>,
    Query(query): Query<ListCongregationsQuery>,
) -> Result<Json<Vec<Congregation>>, ApiError> {
    let sql = if query.active_only {
        format!("SELECT {SELECT_COLUMNS} FROM congregations WHERE active = 1 ORDER BY name")
    } else {
        format!("SELECT {SELECT_COLUMNS} FROM congregations ORDER BY name")
    };

    let rows = sqlx::query_as::<_, Congregation>(&sql)
        .fetch_all(&state.db)
        .await?;
    Ok(Json(rows))
}

/// GET /api/congregations/:guid
pub async fn get_congregation(
    State(state): State<AppState>,
    Path(guid): Path<String>,
) -> Result<Json<Congregation>, ApiError> {
    sqlx::query_as::<_, Congregation>(&format!(
        "SELECT {SELECT_COLUMNS} FROM congregations WHERE guid = ?"
    ))
    .bind(&guid)
    .fetch_optional(&state.db)
    .await?
    .map(Json)
    .ok_or_else(|| ApiError::NotFound(format!("congregation {}", guid)))
}

#[derive(Debug, Deserialize)]
pub struct CreateCongregationRequest {
    pub name: String,
    pub locality: String,
}

/// POST /api/congregations
pub async fn create_congregation(
    State(state): State<AppState>,
    Json(req): Json<CreateCongregationRequest>,
) -> Result<Json<Congregation>, ApiError> {
    if req.name.trim().is_empty() {
        return Err(ApiError::BadRequest("name must not be empty".to_string()));
    }

    let guid = Uuid::new_v4().to_string();
    sqlx::query("INSERT INTO congregations (guid, name, locality) VALUES (?, ?, ?)")
        .bind(&guid)
        .bind(req.name.trim())
        .bind(req.locality.trim())
        .execute(&state.db)
        .await?;

    get_congregation(State(state), Path(guid)).await
}

#[derive(Debug, Deserialize)]
pub struct UpdateCongregationRequest {
    pub name: Option<String>,
    pub locality: Option<String>,
    pub active: Option<bool>,
}

/// PUT /api/congregations/:guid
pub async fn update_congregation(
    State(state): State<AppState>,
    Path(guid): Path<String>,
    Json(req): Json<UpdateCongregationRequest>,
) -> Result<Json<Congregation>, ApiError> {
    let existing = sqlx::query_as::<_, Congregation>(&format!(
        "SELECT {SELECT_COLUMNS} FROM congregations WHERE guid = ?"
    ))
    .bind(&guid)
    .fetch_optional(&state.db)
    .await?
    .ok_or_else(|| ApiError::NotFound(format!("congregation {}", guid)))?;

    sqlx::query(
        "UPDATE congregations SET name = ?, locality = ?, active = ?, \
         updated_at = CURRENT_TIMESTAMP WHERE guid = ?",
    )
    .bind(req.name.unwrap_or(existing.name))
    .bind(req.locality.unwrap_or(existing.locality))
    .bind(req.active.unwrap_or(existing.active))
    .bind(&guid)
    .execute(&state.db)
    .await?;

    get_congregation(State(state), Path(guid)).await
}

/// DELETE /api/congregations/:guid
///
/// Soft delete: clears the active flag.
pub async fn deactivate_congregation(
    State(state): State<AppState>,
    Path(guid): Path<String>,
) -> Result<Json<Congregation>, ApiError> {
    let result = sqlx::query(
        "UPDATE congregations SET active = 0, updated_at = CURRENT_TIMESTAMP WHERE guid = ?",
    )
    .bind(&guid)
    .execute(&state.db)
    .await?;

    if result.rows_affected() == 0 {
        return Err(ApiError::NotFound(format!("congregation {}", guid)));
    }

    get_congregation(State(state), Path(guid)).await
}
