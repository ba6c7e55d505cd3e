//! History log handlers

use axum::{
    extract::{Query, State},
    Json,
};
use chrono::NaiveDate;
use serde::Deserialize;

use podio_common::db::models::HistoryEntry;

use super::ApiError;
use crate::AppState;

#[derive(Debug, Deserialize)]
pub struct ListHistoryQuery {
    pub congregation_id: Option<String>,
    pub speaker_id: Option<String>,
    pub from: Option<NaiveDate>,
    pub to: Option<NaiveDate>,
}

/// GET /api/history
pub async fn list_history(
    State(state): State<AppState>,
    Query(query): Query<ListHistoryQuery>,
) -> Result<Json<Vec<HistoryEntry>>, ApiError> {
    let mut sql = String::from(
        "SELECT guid, realized_on, talk_id, speaker_id, congregation_id, notes, created_at \
         FROM talk_history WHERE 1=1",
    );
    if query.congregation_id.is_some() {
        sql.push_str(" AND congregation_id = ?");
    }
    if query.speaker_id.is_some() {
        sql.push_str(" AND speaker_id = ?");
    }
    if query.from.is_some() {
        sql.push_str(" AND realized_on >= ?");
    }
    if query.to.is_some() {
        sql.push_str(" AND realized_on <= ?");
    }
    sql.push_str(" ORDER BY realized_on DESC");

    let mut q = sqlx::query_as::<_, HistoryEntry>(&sql);
    if let Some(congregation_id) = &query.congregation_id {
        q = q.bind(congregation_id);
    }
    if let Some(speaker_id) = &query.speaker_id {
        q = q.bind(speaker_id);
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
