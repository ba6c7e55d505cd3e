//! CSV report export
//!
//! Reports reformat query results into tabular CSV downloads; there is
//! no logic here beyond joining in display names.

use axum::{
    extract::{Query, State},
    http::{header, StatusCode},
    response::{IntoResponse, Response},
};
use chrono::NaiveDate;
use serde::Deserialize;

use super::ApiError;
use crate::AppState;

#[derive(Debug, Deserialize)]
pub struct ReportQuery {
    pub congregation_id: Option<String>,
    pub from: Option<NaiveDate>,
    pub to: Option<NaiveDate>,
}

/// GET /api/reports/schedule.csv
pub async fn schedule_report_csv(
    State(state): State<AppState>,
    Query(query): Query<ReportQuery>,
) -> Result<Response, ApiError> {
    let mut sql = String::from(
        r#"
        SELECT s.talk_date, s.start_time, t.number, t.title, sp.name, c.name,
               CASE s.completed WHEN 1 THEN 'yes' ELSE 'no' END
        FROM schedule s
        JOIN talks t ON t.guid = s.talk_id
        JOIN speakers sp ON sp.guid = s.speaker_id
        JOIN congregations c ON c.guid = s.congregation_id
        WHERE 1=1
        "#,
    );
    push_filters(&mut sql, &query, "s.talk_date", "s.congregation_id");
    sql.push_str(" ORDER BY s.talk_date, s.start_time");

    let rows = bind_filters(
        sqlx::query_as::<_, (NaiveDate, String, i64, String, String, String, String)>(&sql),
        &query,
    )
    .fetch_all(&state.db)
    .await?;

    let mut writer = csv::Writer::from_writer(vec![]);
    writer
        .write_record([
            "date", "time", "talk_number", "talk_title", "speaker", "congregation", "completed",
        ])
        .map_err(csv_error)?;
    for (date, time, number, title, speaker, congregation, completed) in rows {
        writer
            .write_record([
                date.to_string(),
                time,
                number.to_string(),
                title,
                speaker,
                congregation,
                completed,
            ])
            .map_err(csv_error)?;
    }

    csv_response(writer, "schedule.csv")
}

/// GET /api/reports/history.csv
pub async fn history_report_csv(
    State(state): State<AppState>,
    Query(query): Query<ReportQuery>,
) -> Result<Response, ApiError> {
    let mut sql = String::from(
        r#"
        SELECT h.realized_on, t.number, t.title, sp.name, c.name, COALESCE(h.notes, '')
        FROM talk_history h
        JOIN talks t ON t.guid = h.talk_id
        JOIN speakers sp ON sp.guid = h.speaker_id
        JOIN congregations c ON c.guid = h.congregation_id
        WHERE 1=1
        "#,
    );
    push_filters(&mut sql, &query, "h.realized_on", "h.congregation_id");
    sql.push_str(" ORDER BY h.realized_on DESC");

    let rows = bind_filters(
        sqlx::query_as::<_, (NaiveDate, i64, String, String, String, String)>(&sql),
        &query,
    )
    .fetch_all(&state.db)
    .await?;

    let mut writer = csv::Writer::from_writer(vec![]);
    writer
        .write_record(["date", "talk_number", "talk_title", "speaker", "congregation", "notes"])
        .map_err(csv_error)?;
    for (date, number, title, speaker, congregation, notes) in rows {
        writer
            .write_record([
                date.to_string(),
                number.to_string(),
                title,
                speaker,
                congregation,
                notes,
            ])
            .map_err(csv_error)?;
    }

    csv_response(writer, "history.csv")
}

/// GET /api/reports/talks.csv
pub async fn talks_report_csv(State(state): State<AppState>) -> Result<Response, ApiError> {
    let talks = podio_common::db::catalog::list_talks(&state.db, false).await?;

    let mut writer = csv::Writer::from_writer(vec![]);
    writer
        .write_record(["number", "title", "topic", "duration_minutes", "locked", "active"])
        .map_err(csv_error)?;
    for talk in talks {
        writer
            .write_record([
                talk.number.to_string(),
                talk.title,
                talk.topic,
                talk.duration_minutes.to_string(),
                if talk.locked { "yes" } else { "no" }.to_string(),
                if talk.active { "yes" } else { "no" }.to_string(),
            ])
            .map_err(csv_error)?;
    }

    csv_response(writer, "talks.csv")
}

fn push_filters(sql: &mut String, query: &ReportQuery, date_column: &str, congregation_column: &str) {
    if query.congregation_id.is_some() {
        sql.push_str(&format!(" AND {} = ?", congregation_column));
    }
    if query.from.is_some() {
        sql.push_str(&format!(" AND {} >= ?", date_column));
    }
    if query.to.is_some() {
        sql.push_str(&format!(" AND {} <= ?", date_column));
    }
}

fn bind_filters<'q, O>(
    mut q: sqlx::query::QueryAs<'q, sqlx::Sqlite, O, sqlx::sqlite::SqliteArguments<'q>>,
    query: &'q ReportQuery,
) -> sqlx::query::QueryAs<'q, sqlx::Sqlite, O, sqlx::sqlite::SqliteArguments<'q>> {
    if let Some(congregation_id) = &query.congregation_id {
        q = q.bind(congregation_id);
    }
    if let Some(from) = query.from {
        q = q.bind(from);
    }
    if let Some(to) = query.to {
        q = q.bind(to);
    }
    q
}

fn csv_error(err: csv::Error) -> ApiError {
    ApiError::Internal(format!("CSV write error: {}", err))
}

fn csv_response(writer: csv::Writer<Vec<u8>>, filename: &str) -> Result<Response, ApiError> {
    let bytes = writer
        .into_inner()
        .map_err(|e| ApiError::Internal(format!("CSV flush error: {}", e)))?;

    Ok((
        StatusCode::OK,
        [
            (header::CONTENT_TYPE, "text/csv; charset=utf-8".to_string()),
            (
                header::CONTENT_DISPOSITION,
                format!("attachment; filename=\"{}\"", filename),
            ),
        ],
        bytes,
    )
        .into_response())
}
