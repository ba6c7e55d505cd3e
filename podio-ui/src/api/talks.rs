//! Talk catalog handlers, including the bulk import endpoint

use axum::{
    extract::{Path, Query, State},
    Form, Json,
};
use serde::{Deserialize, Serialize};
use tracing::warn;

use podio_common::db::catalog;
use podio_common::db::models::Talk;
use podio_common::import::{parse_talk_list, RejectedLine};

use super::ApiError;
use crate::AppState;

#[derive(Debug, Deserialize)]
pub struct ListTalksQuery {
    /// When true, only active catalog entries are returned
    #[serde(default)]
    pub active_only: bool,
}

/// GET /api/talks
pub async fn list_talks(
    State(state): State<AppState>,
    Query(query): Query<ListTalksQuery>,
) -> Result<Json<Vec<Talk>>, ApiError> {
    let talks = catalog::list_talks(&state.db, query.active_only).await?;
    Ok(Json(talks))
}

/// GET /api/talks/:number
pub async fn get_talk(
    State(state): State<AppState>,
    Path(number): Path<i64>,
) -> Result<Json<Talk>, ApiError> {
    catalog::find_by_number(&state.db, number)
        .await?
        .map(Json)
        .ok_or_else(|| ApiError::NotFound(format!("talk {}", number)))
}

#[derive(Debug, Deserialize)]
pub struct UpdateTalkRequest {
    pub title: Option<String>,
    pub topic: Option<String>,
    pub description: Option<String>,
    pub duration_minutes: Option<i64>,
}

/// PUT /api/talks/:number
pub async fn update_talk(
    State(state): State<AppState>,
    Path(number): Path<i64>,
    Json(req): Json<UpdateTalkRequest>,
) -> Result<Json<Talk>, ApiError> {
    let talk = catalog::find_by_number(&state.db, number)
        .await?
        .ok_or_else(|| ApiError::NotFound(format!("talk {}", number)))?;

    if let Some(duration) = req.duration_minutes {
        if duration <= 0 {
            return Err(ApiError::BadRequest("duration must be positive".to_string()));
        }
    }

    sqlx::query(
        r#"
        UPDATE talks
        SET title = ?, topic = ?, description = ?, duration_minutes = ?,
            updated_at = CURRENT_TIMESTAMP
        WHERE number = ?
        "#,
    )
    .bind(req.title.unwrap_or(talk.title))
    .bind(req.topic.unwrap_or(talk.topic))
    .bind(req.description.unwrap_or(talk.description))
    .bind(req.duration_minutes.unwrap_or(talk.duration_minutes))
    .bind(number)
    .execute(&state.db)
    .await?;

    get_talk(State(state), Path(number)).await
}

/// POST /api/talks/:number/lock
pub async fn lock_talk(
    State(state): State<AppState>,
    Path(number): Path<i64>,
) -> Result<Json<Talk>, ApiError> {
    set_talk_flag(&state, number, "locked", true).await?;
    get_talk(State(state), Path(number)).await
}

/// POST /api/talks/:number/unlock
pub async fn unlock_talk(
    State(state): State<AppState>,
    Path(number): Path<i64>,
) -> Result<Json<Talk>, ApiError> {
    set_talk_flag(&state, number, "locked", false).await?;
    get_talk(State(state), Path(number)).await
}

/// DELETE /api/talks/:number
///
/// Catalog entries are never hard-deleted; this clears the active flag.
pub async fn deactivate_talk(
    State(state): State<AppState>,
    Path(number): Path<i64>,
) -> Result<Json<Talk>, ApiError> {
    set_talk_flag(&state, number, "active", false).await?;
    get_talk(State(state), Path(number)).await
}

async fn set_talk_flag(
    state: &AppState,
    number: i64,
    column: &str,
    value: bool,
) -> Result<(), ApiError> {
    // column is a compile-time constant from the handlers above
    let result = sqlx::query(&format!(
        "UPDATE talks SET {} = ?, updated_at = CURRENT_TIMESTAMP WHERE number = ?",
        column
    ))
    .bind(value)
    .bind(number)
    .execute(&state.db)
    .await?;

    if result.rows_affected() == 0 {
        return Err(ApiError::NotFound(format!("talk {}", number)));
    }
    Ok(())
}

/// Bulk import form: one text block, one "N. Title" entry per line
#[derive(Debug, Deserialize)]
pub struct ImportForm {
    pub lista_discursos: String,
}

/// Bulk import response
///
/// `warnings` holds the first 5 rejection messages for display; the
/// full rejection list is in `rejected`.
#[derive(Debug, Serialize)]
pub struct ImportResponse {
    pub message: String,
    pub created: u32,
    pub updated: u32,
    pub warnings: Vec<String>,
    pub rejected: Vec<RejectedLine>,
    pub rejected_total: usize,
}

/// POST /api/talks/import
///
/// Parses the pasted talk list and reconciles it against the catalog in
/// one transaction. Malformed lines are reported, never fatal; an empty
/// body or a storage failure aborts with no changes applied.
pub async fn import_talks(
    State(state): State<AppState>,
    Form(form): Form<ImportForm>,
) -> Result<Json<ImportResponse>, ApiError> {
    let outcome = parse_talk_list(&form.lista_discursos)
        .map_err(|e| ApiError::BadRequest(format!("Import error: {}", e)))?;

    let summary = catalog::apply_import(&state.db, &outcome.talks)
        .await
        .map_err(|e| ApiError::Internal(format!("Import error: {}", e)))?;

    if !outcome.rejected.is_empty() {
        warn!(
            "Talk import rejected {} line(s): {:?}",
            outcome.rejected.len(),
            outcome.warning_messages()
        );
    }

    Ok(Json(ImportResponse {
        message: format!(
            "Import complete! {} new and {} updated.",
            summary.created, summary.updated
        ),
        created: summary.created,
        updated: summary.updated,
        warnings: outcome.warning_messages(),
        rejected_total: outcome.rejected.len(),
        rejected: outcome.rejected,
    }))
}
