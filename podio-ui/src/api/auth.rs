//! Login, logout and session middleware
//!
//! Sessions are opaque random tokens stored in the sessions table;
//! protected routes present them as `Authorization: Bearer <token>`.

use axum::{
    extract::{Request, State},
    middleware::Next,
    response::Response,
    Json,
};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use podio_common::auth::{generate_session_token, verify_password};

use super::ApiError;
use crate::AppState;

/// Authenticated user attached to the request after middleware runs
#[derive(Debug, Clone)]
pub struct CurrentUser {
    pub guid: String,
    pub username: String,
    pub congregation_id: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}

#[derive(Debug, Serialize)]
pub struct LoginResponse {
    pub token: String,
    pub username: String,
    pub display_name: String,
}

/// POST /api/login
pub async fn login(
    State(state): State<AppState>,
    Json(req): Json<LoginRequest>,
) -> Result<Json<LoginResponse>, ApiError> {
    let row: Option<(String, String, String, String)> = sqlx::query_as(
        r#"
        SELECT guid, password_hash, password_salt, display_name
        FROM users WHERE username = ? AND active = 1
        "#,
    )
    .bind(&req.username)
    .fetch_optional(&state.db)
    .await?;

    let (guid, hash, salt, display_name) = match row {
        Some(row) => row,
        None => {
            warn!("Login failed for unknown or inactive user '{}'", req.username);
            return Err(ApiError::Unauthorized("Invalid username or password".to_string()));
        }
    };

    if !verify_password(&req.password, &salt, &hash) {
        warn!("Login failed for user '{}'", req.username);
        return Err(ApiError::Unauthorized("Invalid username or password".to_string()));
    }

    let timeout: i64 = sqlx::query_scalar(
        "SELECT CAST(value AS INTEGER) FROM settings WHERE key = 'session_timeout_seconds'",
    )
    .fetch_optional(&state.db)
    .await?
    .unwrap_or(2_592_000);

    let token = generate_session_token();
    let expires_at = Utc::now().timestamp() + timeout;

    sqlx::query("INSERT INTO sessions (token, user_guid, expires_at) VALUES (?, ?, ?)")
        .bind(&token)
        .bind(&guid)
        .bind(expires_at)
        .execute(&state.db)
        .await?;

    info!("User '{}' logged in", req.username);

    Ok(Json(LoginResponse {
        token,
        username: req.username,
        display_name,
    }))
}

/// POST /api/logout
///
/// Deletes the presented session token. Runs behind the session
/// middleware, so the token is known to be valid here.
pub async fn logout(
    State(state): State<AppState>,
    request: Request,
) -> Result<Json<serde_json::Value>, ApiError> {
    if let Some(token) = bearer_token(&request) {
        sqlx::query("DELETE FROM sessions WHERE token = ?")
            .bind(token)
            .execute(&state.db)
            .await?;
    }

    Ok(Json(serde_json::json!({ "status": "logged out" })))
}

/// Session middleware for protected routes
///
/// Validates the bearer token against the sessions table and attaches
/// the resolved [`CurrentUser`] to request extensions.
pub async fn session_middleware(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let token = bearer_token(&request)
        .ok_or_else(|| ApiError::Unauthorized("Missing session token".to_string()))?
        .to_string();

    let now = Utc::now().timestamp();
    let row: Option<(String, String, Option<String>)> = sqlx::query_as(
        r#"
        SELECT u.guid, u.username, u.congregation_id
        FROM sessions s
        JOIN users u ON u.guid = s.user_guid
        WHERE s.token = ? AND s.expires_at > ? AND u.active = 1
        "#,
    )
    .bind(&token)
    .bind(now)
    .fetch_optional(&state.db)
    .await?;

    let (guid, username, congregation_id) = row.ok_or_else(|| {
        ApiError::Unauthorized("Invalid or expired session token".to_string())
    })?;

    request.extensions_mut().insert(CurrentUser {
        guid,
        username,
        congregation_id,
    });

    Ok(next.run(request).await)
}

fn bearer_token(request: &Request) -> Option<&str> {
    request
        .headers()
        .get(axum::http::header::AUTHORIZATION)?
        .to_str()
        .ok()?
        .strip_prefix("Bearer ")
}
