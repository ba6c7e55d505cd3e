//! Speaker self-service account handlers

use axum::{
    extract::{Path, State},
    Json,
};
use serde::Deserialize;
use uuid::Uuid;

use podio_common::auth::{generate_salt, hash_password};
use podio_common::db::models::SpeakerAccount;

use super::ApiError;
use crate::AppState;

const SELECT_COLUMNS: &str =
    "guid, speaker_id, username, password_hash, password_salt, active, created_at";

#[derive(Debug, Deserialize)]
pub struct CreateSpeakerAccountRequest {
    pub speaker_id: String,
    pub username: String,
    pub password: String,
}

/// POST /api/speaker-accounts
///
/// One account per speaker; usernames are globally unique.
pub async fn create_speaker_account(
    State(state): State<AppState>,
    Json(req): Json<CreateSpeakerAccountRequest>,
) -> Result<Json<SpeakerAccount>, ApiError> {
    if req.username.trim().is_empty() || req.password.is_empty() {
        return Err(ApiError::BadRequest(
            "username and password must not be empty".to_string(),
        ));
    }

    let speaker_exists: bool =
        sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM speakers WHERE guid = ?)")
            .bind(&req.speaker_id)
            .fetch_one(&state.db)
            .await?;
    if !speaker_exists {
        return Err(ApiError::BadRequest(format!("unknown speaker {}", req.speaker_id)));
    }

    let taken: bool = sqlx::query_scalar(
        "SELECT EXISTS(SELECT 1 FROM speaker_accounts WHERE speaker_id = ? OR username = ?)",
    )
    .bind(&req.speaker_id)
    .bind(req.username.trim())
    .fetch_one(&state.db)
    .await?;
    if taken {
        return Err(ApiError::Conflict(
            "speaker already has an account or username is taken".to_string(),
        ));
    }

    let salt = generate_salt();
    let hash = hash_password(&req.password, &salt);
    let guid = Uuid::new_v4().to_string();

    sqlx::query(
        "INSERT INTO speaker_accounts (guid, speaker_id, username, password_hash, password_salt) \
         VALUES (?, ?, ?, ?, ?)",
    )
    .bind(&guid)
    .bind(&req.speaker_id)
    .bind(req.username.trim())
    .bind(&hash)
    .bind(&salt)
    .execute(&state.db)
    .await?;

    fetch_account(&state, &guid).await.map(Json)
}

#[derive(Debug, Deserialize)]
pub struct SetAccountActiveRequest {
    pub active: bool,
}

/// PUT /api/speaker-accounts/:guid
pub async fn set_speaker_account_active(
    State(state): State<AppState>,
    Path(guid): Path<String>,
    Json(req): Json<SetAccountActiveRequest>,
) -> Result<Json<SpeakerAccount>, ApiError> {
    let result = sqlx::query("UPDATE speaker_accounts SET active = ? WHERE guid = ?")
        .bind(req.active)
        .bind(&guid)
        .execute(&state.db)
        .await?;

    if result.rows_affected() == 0 {
        return Err(ApiError::NotFound(format!("speaker account {}", guid)));
    }

    fetch_account(&state, &guid).await.map(Json)
}

async fn fetch_account(state: &AppState, guid: &str) -> Result<SpeakerAccount, ApiError> {
    sqlx::query_as::<_, SpeakerAccount>(&format!(
        "SELECT {SELECT_COLUMNS} FROM speaker_accounts WHERE guid = ?"
    ))
    .bind(guid)
    .fetch_optional(&state.db)
    .await?
    .ok_or_else(|| ApiError::NotFound(format!("speaker account {}", guid)))
}
