//! Database models

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// A congregation owning speakers and schedule entries
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Congregation {
    pub guid: String,
    pub name: String,
    pub locality: String,
    pub active: bool,
}

/// An administrator account
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct User {
    pub guid: String,
    pub username: String,
    #[serde(skip_serializing)]
    pub password_hash: String,
    #[serde(skip_serializing)]
    pub password_salt: String,
    pub display_name: String,
    pub congregation_id: Option<String>,
    pub active: bool,
}

/// One entry of the fixed public-talk catalog.
///
/// `number` is the domain key (unique, 1..=200); entries are never
/// hard-deleted, only deactivated or locked.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Talk {
    pub guid: String,
    pub number: i64,
    pub title: String,
    pub topic: String,
    pub description: String,
    pub duration_minutes: i64,
    pub locked: bool,
    pub active: bool,
}

/// A speaker belonging to a congregation
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Speaker {
    pub guid: String,
    pub name: String,
    pub congregation_id: String,
    pub host: bool,
    pub phone: Option<String>,
    pub email: Option<String>,
    pub approved: bool,
    pub active: bool,
}

/// A special event; may block schedule entries for its date span
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct EventEntry {
    pub guid: String,
    pub kind: String,
    pub title: String,
    pub description: Option<String>,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub blocks_schedule: bool,
    pub special_talks: i64,
    pub congregation_id: Option<String>,
}

/// A booking of a speaker to deliver a talk on a given date
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct ScheduleEntry {
    pub guid: String,
    pub talk_date: NaiveDate,
    pub start_time: String,
    pub talk_id: String,
    pub speaker_id: String,
    pub congregation_id: String,
    pub host_id: Option<String>,
    pub completed: bool,
    pub notes: Option<String>,
}

/// Log entry for a talk that was actually given
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct HistoryEntry {
    pub guid: String,
    pub realized_on: NaiveDate,
    pub talk_id: String,
    pub speaker_id: String,
    pub congregation_id: String,
    pub notes: Option<String>,
    pub created_at: String,
}

/// Talk coordinator assignment for a congregation
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Coordinator {
    pub guid: String,
    pub congregation_id: String,
    pub speaker_id: String,
    pub phone: Option<String>,
    pub active: bool,
    pub start_date: NaiveDate,
    pub end_date: Option<NaiveDate>,
}

/// Self-service login account tied to a speaker
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct SpeakerAccount {
    pub guid: String,
    pub speaker_id: String,
    pub username: String,
    #[serde(skip_serializing)]
    pub password_hash: String,
    #[serde(skip_serializing)]
    pub password_salt: String,
    pub active: bool,
    pub created_at: String,
}

/// Acceptance record: a speaker taking on a catalog talk
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct TalkAssignment {
    pub guid: String,
    pub speaker_id: String,
    pub talk_id: String,
    pub accepted: bool,
    pub accepted_at: Option<String>,
    pub prepared: bool,
    pub notes: Option<String>,
    pub created_at: String,
}
