//! HTTP API handlers for podio-ui

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;

pub mod accounts;
pub mod assignments;
pub mod auth;
pub mod congregations;
pub mod coordinators;
pub mod dashboard;
pub mod events;
pub mod health;
pub mod history;
pub mod reports;
pub mod schedule;
pub mod speakers;
pub mod talks;

pub use accounts::{create_speaker_account, set_speaker_account_active};
pub use assignments::{
    accept_assignment, create_assignment, list_assignments, mark_assignment_prepared,
};
pub use auth::{login, logout, session_middleware};
pub use congregations::{
    create_congregation, deactivate_congregation, get_congregation, list_congregations,
    update_congregation,
};
pub use coordinators::{assign_coordinator, end_coordinator, list_coordinators};
pub use dashboard::dashboard;
pub use events::{create_event, delete_event, list_events, update_event};
pub use health::health_routes;
pub use history::list_history;
pub use reports::{history_report_csv, schedule_report_csv, talks_report_csv};
pub use schedule::{
    complete_schedule_entry, create_schedule_entry, delete_schedule_entry, get_schedule_entry,
    list_schedule, update_schedule_entry,
};
pub use speakers::{
    approve_speaker, create_speaker, deactivate_speaker, get_speaker, list_speakers,
    update_speaker,
};
pub use talks::{
    deactivate_talk, get_talk, import_talks, list_talks, lock_talk, unlock_talk, update_talk,
};

/// API errors shared by all handlers
#[derive(Debug)]
pub enum ApiError {
    BadRequest(String),
    Unauthorized(String),
    NotFound(String),
    Conflict(String),
    Internal(String),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            ApiError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg),
            ApiError::Unauthorized(msg) => (StatusCode::UNAUTHORIZED, msg),
            ApiError::NotFound(msg) => (StatusCode::NOT_FOUND, msg),
            ApiError::Conflict(msg) => (StatusCode::CONFLICT, msg),
            ApiError::Internal(msg) => (StatusCode::INTERNAL_SERVER_ERROR, msg),
        };

        let body = Json(json!({
            "error": message,
        }));

        (status, body).into_response()
    }
}

impl From<podio_common::Error> for ApiError {
    fn from(err: podio_common::Error) -> Self {
        use podio_common::Error;
        match err {
            Error::InvalidInput(msg) => ApiError::BadRequest(msg),
            Error::NotFound(msg) => ApiError::NotFound(msg),
            Error::Conflict(msg) => ApiError::Conflict(msg),
            other => ApiError::Internal(other.to_string()),
        }
    }
}

impl From<sqlx::Error> for ApiError {
    fn from(err: sqlx::Error) -> Self {
        match err {
            sqlx::Error::RowNotFound => ApiError::NotFound("row not found".to_string()),
            other => ApiError::Internal(format!("Database error: {}", other)),
        }
    }
}
