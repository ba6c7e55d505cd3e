//! Integration tests for podio-ui API endpoints
//!
//! Tests cover:
//! - Health endpoint (no auth required)
//! - Session authentication middleware
//! - Bulk talk import (counts, warnings, error cases)
//! - Congregation / speaker / schedule CRUD paths
//! - Blocking events and schedule completion
//! - CSV report export

use axum::{
    body::Body,
    http::{header, Request, StatusCode},
};
use podio_common::auth::{generate_salt, hash_password};
use podio_common::db::init_database;
use serde_json::{json, Value};
use sqlx::SqlitePool;
use tempfile::TempDir;
use tower::util::ServiceExt; // for `oneshot` method
use uuid::Uuid;

use podio_ui::{build_router, AppState};

struct TestApp {
    _dir: TempDir,
    app: axum::Router,
    db: SqlitePool,
    token: String,
}

/// Test helper: fresh database, router and logged-in session
async fn setup() -> TestApp {
    let dir = TempDir::new().expect("Should create temp dir");
    let db_path = dir.path().join("podio-test.db");
    let db = init_database(&db_path)
        .await
        .expect("Database initialization failed");

    // Create a user with a known password instead of relying on seed env vars
    let salt = generate_salt();
    let hash = hash_password("correct horse", &salt);
    sqlx::query(
        "INSERT INTO users (guid, username, password_hash, password_salt, display_name) \
         VALUES (?, 'testadmin', ?, ?, 'Test Admin')",
    )
    .bind(Uuid::new_v4().to_string())
    .bind(&hash)
    .bind(&salt)
    .execute(&db)
    .await
    .unwrap();

    let app = build_router(AppState::new(db.clone()));

    let response = app
        .clone()
        .oneshot(json_request(
            "POST",
            "/api/login",
            json!({ "username": "testadmin", "password": "correct horse" }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = extract_json(response.into_body()).await;
    let token = body["token"].as_str().unwrap().to_string();

    TestApp { _dir: dir, app, db, token }
}

fn json_request(method: &str, uri: &str, body: Value) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

fn authed_json(method: &str, uri: &str, token: &str, body: Value) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json")
        .header(header::AUTHORIZATION, format!("Bearer {}", token))
        .body(Body::from(body.to_string()))
        .unwrap()
}

fn authed_get(uri: &str, token: &str) -> Request<Body> {
    Request::builder()
        .method("GET")
        .uri(uri)
        .header(header::AUTHORIZATION, format!("Bearer {}", token))
        .body(Body::empty())
        .unwrap()
}

/// Form-encoded import request (the endpoint takes an HTML form field)
fn import_request(token: &str, encoded_list: &str) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri("/api/talks/import")
        .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded")
        .header(header::AUTHORIZATION, format!("Bearer {}", token))
        .body(Body::from(format!("lista_discursos={}", encoded_list)))
        .unwrap()
}

async fn extract_json(body: Body) -> Value {
    let bytes = axum::body::to_bytes(body, usize::MAX)
        .await
        .expect("Should read body");
    serde_json::from_slice(&bytes).expect("Should parse JSON")
}

async fn seeded_congregation(db: &SqlitePool) -> String {
    sqlx::query_scalar("SELECT guid FROM congregations LIMIT 1")
        .fetch_one(db)
        .await
        .unwrap()
}

async fn create_speaker(t: &TestApp, congregation: &str, name: &str) -> String {
    let response = t
        .app
        .clone()
        .oneshot(authed_json(
            "POST",
            "/api/speakers",
            &t.token,
            json!({ "name": name, "congregation_id": congregation }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = extract_json(response.into_body()).await;
    let guid = body["guid"].as_str().unwrap().to_string();

    // Scheduling requires approval
    let response = t
        .app
        .clone()
        .oneshot(authed_json(
            "POST",
            &format!("/api/speakers/{}/approve", guid),
            &t.token,
            json!({}),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    guid
}

// =============================================================================
// Health and authentication
// =============================================================================

#[tokio::test]
async fn test_health_endpoint_no_auth_required() {
    let t = setup().await;

    let request = Request::builder()
        .method("GET")
        .uri("/health")
        .body(Body::empty())
        .unwrap();
    let response = t.app.clone().oneshot(request).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);

    let body = extract_json(response.into_body()).await;
    assert_eq!(body["status"], "ok");
    assert_eq!(body["module"], "podio-ui");
    assert!(body["version"].is_string());
}

#[tokio::test]
async fn test_protected_route_requires_token() {
    let t = setup().await;

    let request = Request::builder()
        .method("GET")
        .uri("/api/dashboard")
        .body(Body::empty())
        .unwrap();
    let response = t.app.clone().oneshot(request).await.unwrap();

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_login_rejects_bad_password() {
    let t = setup().await;

    let response = t
        .app
        .clone()
        .oneshot(json_request(
            "POST",
            "/api/login",
            json!({ "username": "testadmin", "password": "wrong" }),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_logout_invalidates_session() {
    let t = setup().await;

    let response = t
        .app
        .clone()
        .oneshot(authed_json("POST", "/api/logout", &t.token, json!({})))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let response = t
        .app
        .clone()
        .oneshot(authed_get("/api/dashboard", &t.token))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

// =============================================================================
// Bulk talk import
// =============================================================================

#[tokio::test]
async fn test_import_example_scenario() {
    let t = setup().await;

    let encoded = "1.+Topic+One%0A2.+Topic+Two%0Aabc.+Bad+Line%0A500.+Out+of+Range";
    let response = t.app.clone().oneshot(import_request(&t.token, encoded)).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = extract_json(response.into_body()).await;

    assert_eq!(body["created"], 2);
    assert_eq!(body["updated"], 0);
    assert_eq!(body["message"], "Import complete! 2 new and 0 updated.");
    assert_eq!(body["rejected_total"], 2);

    let warnings = body["warnings"].as_array().unwrap();
    assert_eq!(warnings.len(), 2);
    assert_eq!(warnings[0], "Line 3: invalid number - 'abc. Bad Line'");
    assert_eq!(warnings[1], "Line 4: number out of range - '500. Out of Range'");

    // Re-import: everything becomes an update, same rejections
    let response = t.app.clone().oneshot(import_request(&t.token, encoded)).await.unwrap();
    let body = extract_json(response.into_body()).await;
    assert_eq!(body["created"], 0);
    assert_eq!(body["updated"], 2);
    assert_eq!(body["rejected_total"], 2);
}

#[tokio::test]
async fn test_import_empty_body_rejected() {
    let t = setup().await;

    let response = t.app.clone().oneshot(import_request(&t.token, "")).await.unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let body = extract_json(response.into_body()).await;
    assert!(body["error"].as_str().unwrap().starts_with("Import error:"));

    let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM talks")
        .fetch_one(&t.db)
        .await
        .unwrap();
    assert_eq!(count, 0);
}

#[tokio::test]
async fn test_import_warning_cap_full_list_returned() {
    let t = setup().await;

    // 7 bad lines: 5 displayed, all 7 returned
    let encoded = "x%0Ax%0Ax%0Ax%0Ax%0Ax%0Ax";
    let response = t.app.clone().oneshot(import_request(&t.token, encoded)).await.unwrap();
    let body = extract_json(response.into_body()).await;

    assert_eq!(body["warnings"].as_array().unwrap().len(), 5);
    assert_eq!(body["rejected"].as_array().unwrap().len(), 7);
    assert_eq!(body["rejected_total"], 7);
}

#[tokio::test]
async fn test_imported_talk_visible_in_catalog() {
    let t = setup().await;

    let response = t
        .app
        .clone()
        .oneshot(import_request(&t.token, "42.+The+Answer"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let response = t.app.clone().oneshot(authed_get("/api/talks/42", &t.token)).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = extract_json(response.into_body()).await;
    assert_eq!(body["number"], 42);
    assert_eq!(body["title"], "The Answer");
    assert_eq!(body["topic"], "Topic to be defined");
    assert_eq!(body["duration_minutes"], 30);
}

// =============================================================================
// Catalog management
// =============================================================================

#[tokio::test]
async fn test_update_talk_and_lock() {
    let t = setup().await;

    t.app.clone().oneshot(import_request(&t.token, "9.+Original")).await.unwrap();

    let response = t
        .app
        .clone()
        .oneshot(authed_json(
            "PUT",
            "/api/talks/9",
            &t.token,
            json!({ "topic": "A Real Topic", "duration_minutes": 45 }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = extract_json(response.into_body()).await;
    assert_eq!(body["title"], "Original");
    assert_eq!(body["topic"], "A Real Topic");
    assert_eq!(body["duration_minutes"], 45);

    let response = t
        .app
        .clone()
        .oneshot(authed_json("POST", "/api/talks/9/lock", &t.token, json!({})))
        .await
        .unwrap();
    let body = extract_json(response.into_body()).await;
    assert_eq!(body["locked"], true);
}

#[tokio::test]
async fn test_get_unknown_talk_is_404() {
    let t = setup().await;

    let response = t.app.clone().oneshot(authed_get("/api/talks/150", &t.token)).await.unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

// =============================================================================
// Congregations and speakers
// =============================================================================

#[tokio::test]
async fn test_congregation_crud() {
    let t = setup().await;

    let response = t
        .app
        .clone()
        .oneshot(authed_json(
            "POST",
            "/api/congregations",
            &t.token,
            json!({ "name": "North Congregation", "locality": "North Side" }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let created = extract_json(response.into_body()).await;
    let guid = created["guid"].as_str().unwrap();

    let response = t
        .app
        .clone()
        .oneshot(authed_json(
            "PUT",
            &format!("/api/congregations/{}", guid),
            &t.token,
            json!({ "locality": "Far North" }),
        ))
        .await
        .unwrap();
    let updated = extract_json(response.into_body()).await;
    assert_eq!(updated["name"], "North Congregation");
    assert_eq!(updated["locality"], "Far North");

    let response = t
        .app
        .clone()
        .oneshot(
            Request::builder()
                .method("DELETE")
                .uri(format!("/api/congregations/{}", guid))
                .header(header::AUTHORIZATION, format!("Bearer {}", t.token))
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    let deactivated = extract_json(response.into_body()).await;
    assert_eq!(deactivated["active"], false);
}

#[tokio::test]
async fn test_speaker_create_and_approve() {
    let t = setup().await;
    let congregation = seeded_congregation(&t.db).await;
    let speaker = create_speaker(&t, &congregation, "John Doe").await;

    let response = t
        .app
        .clone()
        .oneshot(authed_json(
            "POST",
            &format!("/api/speakers/{}/approve", speaker),
            &t.token,
            json!({}),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = extract_json(response.into_body()).await;
    assert_eq!(body["approved"], true);
}

// =============================================================================
// Schedule, blocking events, completion
// =============================================================================

async fn import_and_schedule(t: &TestApp) -> (String, String) {
    let congregation = seeded_congregation(&t.db).await;
    t.app.clone().oneshot(import_request(&t.token, "1.+Topic+One")).await.unwrap();
    let speaker = create_speaker(t, &congregation, "Scheduled Speaker").await;

    let response = t
        .app
        .clone()
        .oneshot(authed_json(
            "POST",
            "/api/schedule",
            &t.token,
            json!({
                "talk_date": "2099-06-06",
                "start_time": "10:00",
                "talk_number": 1,
                "speaker_id": speaker,
                "congregation_id": congregation,
            }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = extract_json(response.into_body()).await;
    (body["guid"].as_str().unwrap().to_string(), congregation)
}

#[tokio::test]
async fn test_schedule_create_and_list() {
    let t = setup().await;
    let (guid, congregation) = import_and_schedule(&t).await;

    let response = t
        .app
        .clone()
        .oneshot(authed_get(
            &format!("/api/schedule?congregation_id={}&pending_only=true", congregation),
            &t.token,
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = extract_json(response.into_body()).await;
    let entries = body.as_array().unwrap();
    assert_eq!(entries.len(), 1);
    assert_eq!(entries[0]["guid"], guid.as_str());
}

#[tokio::test]
async fn test_blocking_event_rejects_schedule() {
    let t = setup().await;
    let congregation = seeded_congregation(&t.db).await;
    t.app.clone().oneshot(import_request(&t.token, "1.+Topic+One")).await.unwrap();
    let speaker = create_speaker(&t, &congregation, "Blocked Speaker").await;

    let response = t
        .app
        .clone()
        .oneshot(authed_json(
            "POST",
            "/api/events",
            &t.token,
            json!({
                "kind": "assembly",
                "title": "Regional Assembly",
                "start_date": "2099-07-01",
                "end_date": "2099-07-03",
                "blocks_schedule": true,
            }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let response = t
        .app
        .clone()
        .oneshot(authed_json(
            "POST",
            "/api/schedule",
            &t.token,
            json!({
                "talk_date": "2099-07-02",
                "start_time": "10:00",
                "talk_number": 1,
                "speaker_id": speaker,
                "congregation_id": congregation,
            }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CONFLICT);
}

#[tokio::test]
async fn test_locked_talk_cannot_be_scheduled() {
    let t = setup().await;
    let congregation = seeded_congregation(&t.db).await;
    t.app.clone().oneshot(import_request(&t.token, "3.+Locked+Topic")).await.unwrap();
    t.app
        .clone()
        .oneshot(authed_json("POST", "/api/talks/3/lock", &t.token, json!({})))
        .await
        .unwrap();
    let speaker = create_speaker(&t, &congregation, "Any Speaker").await;

    let response = t
        .app
        .clone()
        .oneshot(authed_json(
            "POST",
            "/api/schedule",
            &t.token,
            json!({
                "talk_date": "2099-08-01",
                "start_time": "10:00",
                "talk_number": 3,
                "speaker_id": speaker,
                "congregation_id": congregation,
            }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CONFLICT);
}

#[tokio::test]
async fn test_completion_writes_history() {
    let t = setup().await;
    let (guid, congregation) = import_and_schedule(&t).await;

    let response = t
        .app
        .clone()
        .oneshot(authed_json(
            "POST",
            &format!("/api/schedule/{}/complete", guid),
            &t.token,
            json!({ "notes": "went well" }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = extract_json(response.into_body()).await;
    assert_eq!(body["completed"], true);

    let response = t
        .app
        .clone()
        .oneshot(authed_get(&format!("/api/history?congregation_id={}", congregation), &t.token))
        .await
        .unwrap();
    let history = extract_json(response.into_body()).await;
    let entries = history.as_array().unwrap();
    assert_eq!(entries.len(), 1);
    assert_eq!(entries[0]["notes"], "went well");

    // Completing twice is a conflict, history stays single
    let response = t
        .app
        .clone()
        .oneshot(authed_json(
            "POST",
            &format!("/api/schedule/{}/complete", guid),
            &t.token,
            json!({}),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CONFLICT);
}

// =============================================================================
// Assignments
// =============================================================================

#[tokio::test]
async fn test_assignment_accept_then_prepared() {
    let t = setup().await;
    let congregation = seeded_congregation(&t.db).await;
    t.app.clone().oneshot(import_request(&t.token, "7.+Assigned+Topic")).await.unwrap();
    let speaker = create_speaker(&t, &congregation, "Assignee").await;

    let response = t
        .app
        .clone()
        .oneshot(authed_json(
            "POST",
            "/api/assignments",
            &t.token,
            json!({ "speaker_id": speaker, "talk_number": 7 }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let assignment = extract_json(response.into_body()).await;
    let guid = assignment["guid"].as_str().unwrap();
    assert_eq!(assignment["accepted"], false);

    // Prepared before accepted is a conflict
    let response = t
        .app
        .clone()
        .oneshot(authed_json(
            "POST",
            &format!("/api/assignments/{}/prepared", guid),
            &t.token,
            json!({}),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CONFLICT);

    let response = t
        .app
        .clone()
        .oneshot(authed_json(
            "POST",
            &format!("/api/assignments/{}/accept", guid),
            &t.token,
            json!({}),
        ))
        .await
        .unwrap();
    let body = extract_json(response.into_body()).await;
    assert_eq!(body["accepted"], true);
    assert!(body["accepted_at"].is_string());

    let response = t
        .app
        .clone()
        .oneshot(authed_json(
            "POST",
            &format!("/api/assignments/{}/prepared", guid),
            &t.token,
            json!({}),
        ))
        .await
        .unwrap();
    let body = extract_json(response.into_body()).await;
    assert_eq!(body["prepared"], true);
}

// =============================================================================
// Reports
// =============================================================================

#[tokio::test]
async fn test_talks_report_csv() {
    let t = setup().await;
    t.app
        .clone()
        .oneshot(import_request(&t.token, "1.+Topic+One%0A2.+Topic+Two"))
        .await
        .unwrap();

    let response = t
        .app
        .clone()
        .oneshot(authed_get("/api/reports/talks.csv", &t.token))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert!(response
        .headers()
        .get(header::CONTENT_TYPE)
        .unwrap()
        .to_str()
        .unwrap()
        .starts_with("text/csv"));

    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let text = String::from_utf8(bytes.to_vec()).unwrap();
    let mut lines = text.lines();
    assert_eq!(
        lines.next().unwrap(),
        "number,title,topic,duration_minutes,locked,active"
    );
    assert!(lines.next().unwrap().starts_with("1,Topic One,"));
    assert!(lines.next().unwrap().starts_with("2,Topic Two,"));
}

#[tokio::test]
async fn test_dashboard_counts() {
    let t = setup().await;
    let (_, _) = import_and_schedule(&t).await;

    let response = t.app.clone().oneshot(authed_get("/api/dashboard", &t.token)).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = extract_json(response.into_body()).await;

    assert_eq!(body["catalog_size"], 1);
    assert_eq!(body["scheduled_talks"], 1);
    assert_eq!(body["active_congregations"], 1);
    assert_eq!(body["upcoming"].as_array().unwrap().len(), 1);
    assert_eq!(body["upcoming"][0]["talk_number"], 1);
}
