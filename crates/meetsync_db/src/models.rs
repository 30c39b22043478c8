//! Row models shared by the repositories.

use chrono::{NaiveDateTime, NaiveTime};
use serde::{Deserialize, Serialize};

/// Provider tag for meetings mirrored into the external calendar.
pub const PROVIDER_TEAMS: &str = "teams";
/// Provider tag for meetings that exist only in the local store.
pub const PROVIDER_LOCAL: &str = "local";

/// Lifecycle status of a meeting.
///
/// `Completed` and `NoShow` are terminal: provider-driven updates never
/// overwrite them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(rename_all = "SCREAMING_SNAKE_CASE")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum MeetingStatus {
    Scheduled,
    Rescheduled,
    Completed,
    NoShow,
    Cancelled,
}

impl MeetingStatus {
    /// A meeting that still occupies its slot.
    pub fn is_active(&self) -> bool {
        matches!(self, MeetingStatus::Scheduled | MeetingStatus::Rescheduled)
    }

    /// A status that must never be auto-overwritten.
    pub fn is_terminal(&self) -> bool {
        matches!(self, MeetingStatus::Completed | MeetingStatus::NoShow)
    }
}

/// Status of a queued webhook job.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(rename_all = "SCREAMING_SNAKE_CASE")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum WebhookJobStatus {
    Pending,
    Processing,
    Failed,
}

/// Recurring weekly availability window for one staff member.
///
/// `day_of_week` is 0–6 with 0 = Monday. Several rows per (staff, day) are
/// treated as a union of intervals.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct AvailabilityTemplate {
    pub id: i64,
    pub staff_id: String,
    pub day_of_week: i64,
    pub start_time: NaiveTime,
    pub end_time: NaiveTime,
    pub active: bool,
}

/// One-off exclusion overriding the templates for its window.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct AvailabilityBlock {
    pub id: i64,
    pub staff_id: String,
    pub start_at: NaiveDateTime,
    pub end_at: NaiveDateTime,
    pub reason: Option<String>,
}

/// A booked meeting between a lead and a staff member.
///
/// Never hard-deleted; rows only transition status. `external_meeting_id` is
/// set only when `provider` is [`PROVIDER_TEAMS`].
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Meeting {
    pub id: String,
    pub lead_id: String,
    pub staff_id: String,
    pub start_at: NaiveDateTime,
    pub end_at: NaiveDateTime,
    pub status: MeetingStatus,
    pub provider: String,
    pub external_meeting_id: Option<String>,
    pub external_join_url: Option<String>,
    pub self_scheduled: bool,
    pub notes: Option<String>,
    pub cancelled_at: Option<NaiveDateTime>,
    pub completed_at: Option<NaiveDateTime>,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

/// A durable inbound notification job. Owned exclusively by the queue.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct WebhookJob {
    pub id: String,
    pub status: WebhookJobStatus,
    pub attempts: i64,
    pub next_run_at: NaiveDateTime,
    pub locked_at: Option<NaiveDateTime>,
    pub payload: String,
    pub last_error: Option<String>,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

/// Narrow view of a CRM lead, as needed by the booking flow.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Lead {
    pub id: String,
    pub name: String,
    pub email: String,
    pub grade: Option<String>,
    pub qualification_complete: bool,
    pub session_token: Option<String>,
    pub pipeline_stage: String,
}

/// Narrow view of a staff member.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Staff {
    pub id: String,
    pub name: String,
    pub email: String,
    pub active: bool,
}
