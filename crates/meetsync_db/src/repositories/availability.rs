//! Repository for availability templates and blocks.

use crate::error::DbError;
use crate::models::{AvailabilityBlock, AvailabilityTemplate};
use crate::DbClient;
use chrono::NaiveDateTime;
use tracing::debug;

#[derive(Debug, Clone)]
pub struct AvailabilityRepository {
    db_client: DbClient,
}

impl AvailabilityRepository {
    pub fn new(db_client: DbClient) -> Self {
        Self { db_client }
    }

    pub async fn init_schema(&self) -> Result<(), DbError> {
        debug!("Initializing availability schema");

        self.db_client
            .execute(
                r#"
            CREATE TABLE IF NOT EXISTS availability_templates (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                staff_id TEXT NOT NULL,
                day_of_week INTEGER NOT NULL,
                start_time TEXT NOT NULL,
                end_time TEXT NOT NULL,
                active INTEGER NOT NULL DEFAULT 1
            )
        "#,
            )
            .await?;

        self.db_client
            .execute(
                r#"
            CREATE TABLE IF NOT EXISTS availability_blocks (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                staff_id TEXT NOT NULL,
                start_at TEXT NOT NULL,
                end_at TEXT NOT NULL,
                reason TEXT
            )
        "#,
            )
            .await?;

        Ok(())
    }

    /// All active templates for one staff member, across weekdays.
    pub async fn active_templates_for_staff(
        &self,
        staff_id: &str,
    ) -> Result<Vec<AvailabilityTemplate>, DbError> {
        let rows = sqlx::query_as::<_, AvailabilityTemplate>(
            r#"
            SELECT id, staff_id, day_of_week, start_time, end_time, active
            FROM availability_templates
            WHERE staff_id = ? AND active = 1
            ORDER BY day_of_week, start_time
        "#,
        )
        .bind(staff_id)
        .fetch_all(self.db_client.pool())
        .await?;

        Ok(rows)
    }

    /// Blocks for one staff member overlapping the half-open window
    /// [`from`, `to`).
    pub async fn blocks_for_staff_between(
        &self,
        staff_id: &str,
        from: NaiveDateTime,
        to: NaiveDateTime,
    ) -> Result<Vec<AvailabilityBlock>, DbError> {
        let rows = sqlx::query_as::<_, AvailabilityBlock>(
            r#"
            SELECT id, staff_id, start_at, end_at, reason
            FROM availability_blocks
            WHERE staff_id = ? AND start_at < ? AND end_at > ?
            ORDER BY start_at
        "#,
        )
        .bind(staff_id)
        .bind(to)
        .bind(from)
        .fetch_all(self.db_client.pool())
        .await?;

        Ok(rows)
    }

    pub async fn insert_template(
        &self,
        staff_id: &str,
        day_of_week: i64,
        start_time: chrono::NaiveTime,
        end_time: chrono::NaiveTime,
        active: bool,
    ) -> Result<i64, DbError> {
        let result = sqlx::query(
            r#"
            INSERT INTO availability_templates (staff_id, day_of_week, start_time, end_time, active)
            VALUES (?, ?, ?, ?, ?)
        "#,
        )
        .bind(staff_id)
        .bind(day_of_week)
        .bind(start_time)
        .bind(end_time)
        .bind(active)
        .execute(self.db_client.pool())
        .await?;

        Ok(result.last_insert_rowid())
    }

    pub async fn insert_block(
        &self,
        staff_id: &str,
        start_at: NaiveDateTime,
        end_at: NaiveDateTime,
        reason: Option<&str>,
    ) -> Result<i64, DbError> {
        let result = sqlx::query(
            r#"
            INSERT INTO availability_blocks (staff_id, start_at, end_at, reason)
            VALUES (?, ?, ?, ?)
        "#,
        )
        .bind(staff_id)
        .bind(start_at)
        .bind(end_at)
        .bind(reason)
        .execute(self.db_client.pool())
        .await?;

        Ok(result.last_insert_rowid())
    }

    pub async fn delete_block(&self, id: i64) -> Result<bool, DbError> {
        let result = sqlx::query("DELETE FROM availability_blocks WHERE id = ?")
            .bind(id)
            .execute(self.db_client.pool())
            .await?;

        Ok(result.rows_affected() > 0)
    }
}
