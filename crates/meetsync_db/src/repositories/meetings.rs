//! Repository for meetings.
//!
//! The meetings table is the single source of truth for bookings. It has
//! exactly two writers: the booking coordinator (internally-initiated
//! changes) and the notification synchronizer (provider-initiated changes).
//! Status-guarded updates keep terminal states from being clobbered.

use crate::error::DbError;
use crate::models::{Meeting, MeetingStatus};
use crate::DbClient;
use chrono::NaiveDateTime;
use sqlx::Sqlite;
use tracing::debug;

const MEETING_COLUMNS: &str = r#"id, lead_id, staff_id, start_at, end_at, status, provider,
            external_meeting_id, external_join_url, self_scheduled, notes,
            cancelled_at, completed_at, created_at, updated_at"#;

#[derive(Debug, Clone)]
pub struct MeetingRepository {
    db_client: DbClient,
}

impl MeetingRepository {
    pub fn new(db_client: DbClient) -> Self {
        Self { db_client }
    }

    pub async fn init_schema(&self) -> Result<(), DbError> {
        debug!("Initializing meetings schema");

        self.db_client
            .execute(
                r#"
            CREATE TABLE IF NOT EXISTS meetings (
                id TEXT PRIMARY KEY,
                lead_id TEXT NOT NULL,
                staff_id TEXT NOT NULL,
                start_at TEXT NOT NULL,
                end_at TEXT NOT NULL,
                status TEXT NOT NULL,
                provider TEXT NOT NULL,
                external_meeting_id TEXT,
                external_join_url TEXT,
                self_scheduled INTEGER NOT NULL DEFAULT 0,
                notes TEXT,
                cancelled_at TEXT,
                completed_at TEXT,
                created_at TEXT NOT NULL,
                updated_at TEXT NOT NULL
            )
        "#,
            )
            .await?;

        // Backstop for races the named locks cannot see (other processes).
        self.db_client
            .execute(
                r#"
            CREATE UNIQUE INDEX IF NOT EXISTS idx_meetings_staff_slot
            ON meetings (staff_id, start_at)
            WHERE status IN ('SCHEDULED', 'RESCHEDULED')
        "#,
            )
            .await?;

        self.db_client
            .execute(
                r#"
            CREATE INDEX IF NOT EXISTS idx_meetings_external
            ON meetings (external_meeting_id)
        "#,
            )
            .await?;

        Ok(())
    }

    /// Insert a meeting row. Takes an executor so the insert can run inside
    /// the booking transaction.
    pub async fn insert<'e, E>(&self, executor: E, meeting: &Meeting) -> Result<(), DbError>
    where
        E: sqlx::Executor<'e, Database = Sqlite>,
    {
        sqlx::query(
            r#"
            INSERT INTO meetings (id, lead_id, staff_id, start_at, end_at, status, provider,
                external_meeting_id, external_join_url, self_scheduled, notes,
                cancelled_at, completed_at, created_at, updated_at)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
        "#,
        )
        .bind(&meeting.id)
        .bind(&meeting.lead_id)
        .bind(&meeting.staff_id)
        .bind(meeting.start_at)
        .bind(meeting.end_at)
        .bind(meeting.status)
        .bind(&meeting.provider)
        .bind(&meeting.external_meeting_id)
        .bind(&meeting.external_join_url)
        .bind(meeting.self_scheduled)
        .bind(&meeting.notes)
        .bind(meeting.cancelled_at)
        .bind(meeting.completed_at)
        .bind(meeting.created_at)
        .bind(meeting.updated_at)
        .execute(executor)
        .await?;

        Ok(())
    }

    /// The lead's active meeting, if any. A lead has at most one.
    pub async fn active_meeting_for_lead<'e, E>(
        &self,
        executor: E,
        lead_id: &str,
    ) -> Result<Option<Meeting>, DbError>
    where
        E: sqlx::Executor<'e, Database = Sqlite>,
    {
        let row = sqlx::query_as::<_, Meeting>(&format!(
            r#"
            SELECT {MEETING_COLUMNS}
            FROM meetings
            WHERE lead_id = ? AND status IN ('SCHEDULED', 'RESCHEDULED')
            LIMIT 1
        "#
        ))
        .bind(lead_id)
        .fetch_optional(executor)
        .await?;

        Ok(row)
    }

    /// Any active meeting for the staff member overlapping [`start`, `end`).
    pub async fn overlapping_active_for_staff<'e, E>(
        &self,
        executor: E,
        staff_id: &str,
        start: NaiveDateTime,
        end: NaiveDateTime,
    ) -> Result<Option<Meeting>, DbError>
    where
        E: sqlx::Executor<'e, Database = Sqlite>,
    {
        let row = sqlx::query_as::<_, Meeting>(&format!(
            r#"
            SELECT {MEETING_COLUMNS}
            FROM meetings
            WHERE staff_id = ? AND status IN ('SCHEDULED', 'RESCHEDULED')
              AND start_at < ? AND end_at > ?
            LIMIT 1
        "#
        ))
        .bind(staff_id)
        .bind(end)
        .bind(start)
        .fetch_optional(executor)
        .await?;

        Ok(row)
    }

    /// Active meetings for one staff member within [`from`, `to`).
    pub async fn active_for_staff_between(
        &self,
        staff_id: &str,
        from: NaiveDateTime,
        to: NaiveDateTime,
    ) -> Result<Vec<Meeting>, DbError> {
        let rows = sqlx::query_as::<_, Meeting>(&format!(
            r#"
            SELECT {MEETING_COLUMNS}
            FROM meetings
            WHERE staff_id = ? AND status IN ('SCHEDULED', 'RESCHEDULED')
              AND start_at < ? AND end_at > ?
            ORDER BY start_at
        "#
        ))
        .bind(staff_id)
        .bind(to)
        .bind(from)
        .fetch_all(self.db_client.pool())
        .await?;

        Ok(rows)
    }

    pub async fn find(&self, id: &str) -> Result<Option<Meeting>, DbError> {
        let row = sqlx::query_as::<_, Meeting>(&format!(
            "SELECT {MEETING_COLUMNS} FROM meetings WHERE id = ?"
        ))
        .bind(id)
        .fetch_optional(self.db_client.pool())
        .await?;

        Ok(row)
    }

    /// Resolve a meeting by the provider's event id.
    pub async fn find_by_external_id(&self, external_id: &str) -> Result<Option<Meeting>, DbError> {
        let row = sqlx::query_as::<_, Meeting>(&format!(
            "SELECT {MEETING_COLUMNS} FROM meetings WHERE external_meeting_id = ?"
        ))
        .bind(external_id)
        .fetch_optional(self.db_client.pool())
        .await?;

        Ok(row)
    }

    /// Transition a meeting to CANCELLED.
    ///
    /// Returns `false` when the meeting was already cancelled or is in a
    /// terminal status; the row is left untouched in both cases.
    pub async fn cancel(&self, id: &str, now: NaiveDateTime) -> Result<bool, DbError> {
        let result = sqlx::query(
            r#"
            UPDATE meetings
            SET status = ?, cancelled_at = ?, updated_at = ?
            WHERE id = ? AND status NOT IN ('CANCELLED', 'COMPLETED', 'NO_SHOW')
        "#,
        )
        .bind(MeetingStatus::Cancelled)
        .bind(now)
        .bind(now)
        .bind(id)
        .execute(self.db_client.pool())
        .await?;

        Ok(result.rows_affected() > 0)
    }

    /// Apply a provider-driven time change: new interval, RESCHEDULED status,
    /// cancellation marker cleared. Terminal meetings are left untouched.
    pub async fn reschedule(
        &self,
        id: &str,
        start: NaiveDateTime,
        end: NaiveDateTime,
        now: NaiveDateTime,
    ) -> Result<bool, DbError> {
        let result = sqlx::query(
            r#"
            UPDATE meetings
            SET start_at = ?, end_at = ?, status = ?, cancelled_at = NULL, updated_at = ?
            WHERE id = ? AND status NOT IN ('COMPLETED', 'NO_SHOW')
        "#,
        )
        .bind(start)
        .bind(end)
        .bind(MeetingStatus::Rescheduled)
        .bind(now)
        .bind(id)
        .execute(self.db_client.pool())
        .await?;

        Ok(result.rows_affected() > 0)
    }

    /// Update only the join link.
    pub async fn set_join_url(
        &self,
        id: &str,
        join_url: Option<&str>,
        now: NaiveDateTime,
    ) -> Result<bool, DbError> {
        let result = sqlx::query(
            r#"
            UPDATE meetings SET external_join_url = ?, updated_at = ? WHERE id = ?
        "#,
        )
        .bind(join_url)
        .bind(now)
        .bind(id)
        .execute(self.db_client.pool())
        .await?;

        Ok(result.rows_affected() > 0)
    }
}
