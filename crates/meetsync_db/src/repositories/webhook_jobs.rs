//! Repository for the inbound webhook job queue.
//!
//! Jobs are claimed with an optimistic conditional update: the UPDATE only
//! succeeds if `updated_at` still matches the value read at selection time.
//! That conditional update is the sole cross-process correctness guarantee
//! against two workers claiming the same job.

use crate::error::DbError;
use crate::models::{WebhookJob, WebhookJobStatus};
use crate::DbClient;
use chrono::NaiveDateTime;
use tracing::debug;
use uuid::Uuid;

const JOB_COLUMNS: &str =
    "id, status, attempts, next_run_at, locked_at, payload, last_error, created_at, updated_at";

#[derive(Debug, Clone)]
pub struct WebhookJobRepository {
    db_client: DbClient,
}

impl WebhookJobRepository {
    pub fn new(db_client: DbClient) -> Self {
        Self { db_client }
    }

    pub async fn init_schema(&self) -> Result<(), DbError> {
        debug!("Initializing webhook job schema");

        self.db_client
            .execute(
                r#"
            CREATE TABLE IF NOT EXISTS webhook_jobs (
                id TEXT PRIMARY KEY,
                status TEXT NOT NULL,
                attempts INTEGER NOT NULL DEFAULT 0,
                next_run_at TEXT NOT NULL,
                locked_at TEXT,
                payload TEXT NOT NULL,
                last_error TEXT,
                created_at TEXT NOT NULL,
                updated_at TEXT NOT NULL
            )
        "#,
            )
            .await?;

        self.db_client
            .execute(
                r#"
            CREATE INDEX IF NOT EXISTS idx_webhook_jobs_ready
            ON webhook_jobs (status, next_run_at)
        "#,
            )
            .await?;

        Ok(())
    }

    /// Persist a new PENDING job, immediately runnable.
    pub async fn insert_pending(
        &self,
        payload: &str,
        now: NaiveDateTime,
    ) -> Result<WebhookJob, DbError> {
        let job = WebhookJob {
            id: Uuid::new_v4().to_string(),
            status: WebhookJobStatus::Pending,
            attempts: 0,
            next_run_at: now,
            locked_at: None,
            payload: payload.to_string(),
            last_error: None,
            created_at: now,
            updated_at: now,
        };

        sqlx::query(
            r#"
            INSERT INTO webhook_jobs (id, status, attempts, next_run_at, locked_at, payload,
                last_error, created_at, updated_at)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)
        "#,
        )
        .bind(&job.id)
        .bind(job.status)
        .bind(job.attempts)
        .bind(job.next_run_at)
        .bind(job.locked_at)
        .bind(&job.payload)
        .bind(&job.last_error)
        .bind(job.created_at)
        .bind(job.updated_at)
        .execute(self.db_client.pool())
        .await?;

        Ok(job)
    }

    /// A bounded batch of claimable jobs: PENDING and due, or PROCESSING with
    /// a lock older than `stale_before` (worker crashed mid-job).
    pub async fn ready_batch(
        &self,
        now: NaiveDateTime,
        stale_before: NaiveDateTime,
        limit: i64,
    ) -> Result<Vec<WebhookJob>, DbError> {
        let rows = sqlx::query_as::<_, WebhookJob>(&format!(
            r#"
            SELECT {JOB_COLUMNS}
            FROM webhook_jobs
            WHERE (status = 'PENDING' AND next_run_at <= ?)
               OR (status = 'PROCESSING' AND locked_at IS NOT NULL AND locked_at <= ?)
            ORDER BY next_run_at ASC, created_at ASC
            LIMIT ?
        "#
        ))
        .bind(now)
        .bind(stale_before)
        .bind(limit)
        .fetch_all(self.db_client.pool())
        .await?;

        Ok(rows)
    }

    /// Attempt to claim one job.
    ///
    /// `seen_updated_at` is the `updated_at` read at selection time; the
    /// update succeeds only if it is unchanged. Attempts increment here, at
    /// claim time, regardless of the later outcome.
    pub async fn try_claim(
        &self,
        id: &str,
        seen_updated_at: NaiveDateTime,
        now: NaiveDateTime,
    ) -> Result<bool, DbError> {
        let result = sqlx::query(
            r#"
            UPDATE webhook_jobs
            SET status = ?, locked_at = ?, attempts = attempts + 1, updated_at = ?
            WHERE id = ? AND updated_at = ?
        "#,
        )
        .bind(WebhookJobStatus::Processing)
        .bind(now)
        .bind(now)
        .bind(id)
        .bind(seen_updated_at)
        .execute(self.db_client.pool())
        .await?;

        Ok(result.rows_affected() == 1)
    }

    /// Remove a successfully processed job.
    pub async fn delete(&self, id: &str) -> Result<bool, DbError> {
        let result = sqlx::query("DELETE FROM webhook_jobs WHERE id = ?")
            .bind(id)
            .execute(self.db_client.pool())
            .await?;

        Ok(result.rows_affected() > 0)
    }

    /// Push a failed job back to PENDING with its next run time.
    pub async fn release_for_retry(
        &self,
        id: &str,
        next_run_at: NaiveDateTime,
        error: &str,
        now: NaiveDateTime,
    ) -> Result<(), DbError> {
        sqlx::query(
            r#"
            UPDATE webhook_jobs
            SET status = ?, locked_at = NULL, next_run_at = ?, last_error = ?, updated_at = ?
            WHERE id = ?
        "#,
        )
        .bind(WebhookJobStatus::Pending)
        .bind(next_run_at)
        .bind(error)
        .bind(now)
        .bind(id)
        .execute(self.db_client.pool())
        .await?;

        Ok(())
    }

    /// Park a job as FAILED. Failed jobs are retained for inspection.
    pub async fn mark_failed(
        &self,
        id: &str,
        error: &str,
        now: NaiveDateTime,
    ) -> Result<(), DbError> {
        sqlx::query(
            r#"
            UPDATE webhook_jobs
            SET status = ?, locked_at = NULL, last_error = ?, updated_at = ?
            WHERE id = ?
        "#,
        )
        .bind(WebhookJobStatus::Failed)
        .bind(error)
        .bind(now)
        .bind(id)
        .execute(self.db_client.pool())
        .await?;

        Ok(())
    }

    pub async fn find(&self, id: &str) -> Result<Option<WebhookJob>, DbError> {
        let row = sqlx::query_as::<_, WebhookJob>(&format!(
            "SELECT {JOB_COLUMNS} FROM webhook_jobs WHERE id = ?"
        ))
        .bind(id)
        .fetch_optional(self.db_client.pool())
        .await?;

        Ok(row)
    }

    pub async fn count(&self) -> Result<i64, DbError> {
        let row: (i64,) = sqlx::query_as("SELECT COUNT(*) FROM webhook_jobs")
            .fetch_one(self.db_client.pool())
            .await?;

        Ok(row.0)
    }
}
