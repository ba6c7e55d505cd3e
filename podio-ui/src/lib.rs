//! podio-ui library - HTTP service for the Podio scheduling system
//!
//! Exposes the CRUD surface over congregations, speakers, the talk
//! catalog (including bulk import), the agenda, the history log and the
//! coordinator/acceptance workflows, plus CSV report export.

use axum::Router;
use sqlx::SqlitePool;

pub mod api;

/// Application state shared across HTTP handlers
#[derive(Clone)]
pub struct AppState {
    /// Database connection pool
    pub db: SqlitePool,
}

impl AppState {
    /// Create new application state
    pub fn new(db: SqlitePool) -> Self {
        Self { db }
    }
}

/// Build application router
///
/// `/health` and `/api/login` are public; everything else requires a
/// valid session token.
pub fn build_router(state: AppState) -> Router {
    use axum::middleware;
    use axum::routing::{get, post, put};

    let protected = Router::new()
        .route("/api/logout", post(api::logout))
        .route("/api/dashboard", get(api::dashboard))
        .route(
            "/api/congregations",
            get(api::list_congregations).post(api::create_congregation),
        )
        .route(
            "/api/congregations/:guid",
            get(api::get_congregation)
                .put(api::update_congregation)
                .delete(api::deactivate_congregation),
        )
        .route("/api/speakers", get(api::list_speakers).post(api::create_speaker))
        .route(
            "/api/speakers/:guid",
            get(api::get_speaker)
                .put(api::update_speaker)
                .delete(api::deactivate_speaker),
        )
        .route("/api/speakers/:guid/approve", post(api::approve_speaker))
        .route("/api/talks", get(api::list_talks))
        .route("/api/talks/import", post(api::import_talks))
        .route(
            "/api/talks/:number",
            get(api::get_talk).put(api::update_talk).delete(api::deactivate_talk),
        )
        .route("/api/talks/:number/lock", post(api::lock_talk))
        .route("/api/talks/:number/unlock", post(api::unlock_talk))
        .route("/api/schedule", get(api::list_schedule).post(api::create_schedule_entry))
        .route(
            "/api/schedule/:guid",
            get(api::get_schedule_entry)
                .put(api::update_schedule_entry)
                .delete(api::delete_schedule_entry),
        )
        .route("/api/schedule/:guid/complete", post(api::complete_schedule_entry))
        .route("/api/history", get(api::list_history))
        .route("/api/events", get(api::list_events).post(api::create_event))
        .route(
            "/api/events/:guid",
            put(api::update_event).delete(api::delete_event),
        )
        .route("/api/coordinators", get(api::list_coordinators).post(api::assign_coordinator))
        .route("/api/coordinators/:guid/end", post(api::end_coordinator))
        .route("/api/speaker-accounts", post(api::create_speaker_account))
        .route("/api/speaker-accounts/:guid", put(api::set_speaker_account_active))
        .route(
            "/api/assignments",
            get(api::list_assignments).post(api::create_assignment),
        )
        .route("/api/assignments/:guid/accept", post(api::accept_assignment))
        .route("/api/assignments/:guid/prepared", post(api::mark_assignment_prepared))
        .route("/api/reports/schedule.csv", get(api::schedule_report_csv))
        .route("/api/reports/history.csv", get(api::history_report_csv))
        .route("/api/reports/talks.csv", get(api::talks_report_csv))
        .layer(middleware::from_fn_with_state(
            state.clone(),
            api::session_middleware,
        ));

    let public = Router::new()
        .route("/api/login", post(api::login))
        .merge(api::health_routes());

    Router::new()
        .merge(protected)
        .merge(public)
        .layer(tower_http::trace::TraceLayer::new_for_http())
        .with_state(state)
}
