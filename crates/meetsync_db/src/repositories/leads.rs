//! Narrow repository over the CRM's leads table.
//!
//! Lead CRUD and scoring live elsewhere; the booking flow only reads
//! eligibility fields and advances the pipeline stage on success.

use crate::error::DbError;
use crate::models::Lead;
use crate::DbClient;
use tracing::debug;

const LEAD_COLUMNS: &str =
    "id, name, email, grade, qualification_complete, session_token, pipeline_stage";

#[derive(Debug, Clone)]
pub struct LeadRepository {
    db_client: DbClient,
}

impl LeadRepository {
    pub fn new(db_client: DbClient) -> Self {
        Self { db_client }
    }

    pub async fn init_schema(&self) -> Result<(), DbError> {
        debug!("Initializing leads schema");

        self.db_client
            .execute(
                r#"
            CREATE TABLE IF NOT EXISTS leads (
                id TEXT PRIMARY KEY,
                name TEXT NOT NULL,
                email TEXT NOT NULL,
                grade TEXT,
                qualification_complete INTEGER NOT NULL DEFAULT 0,
                session_token TEXT,
                pipeline_stage TEXT NOT NULL DEFAULT 'new'
            )
        "#,
            )
            .await?;

        Ok(())
    }

    pub async fn find(&self, id: &str) -> Result<Option<Lead>, DbError> {
        let row =
            sqlx::query_as::<_, Lead>(&format!("SELECT {LEAD_COLUMNS} FROM leads WHERE id = ?"))
                .bind(id)
                .fetch_optional(self.db_client.pool())
                .await?;

        Ok(row)
    }

    /// Move the lead forward in the sales pipeline.
    pub async fn advance_pipeline(&self, id: &str, stage: &str) -> Result<bool, DbError> {
        let result = sqlx::query("UPDATE leads SET pipeline_stage = ? WHERE id = ?")
            .bind(stage)
            .bind(id)
            .execute(self.db_client.pool())
            .await?;

        Ok(result.rows_affected() > 0)
    }

    pub async fn insert(&self, lead: &Lead) -> Result<(), DbError> {
        sqlx::query(&format!(
            "INSERT INTO leads ({LEAD_COLUMNS}) VALUES (?, ?, ?, ?, ?, ?, ?)"
        ))
        .bind(&lead.id)
        .bind(&lead.name)
        .bind(&lead.email)
        .bind(&lead.grade)
        .bind(lead.qualification_complete)
        .bind(&lead.session_token)
        .bind(&lead.pipeline_stage)
        .execute(self.db_client.pool())
        .await?;

        Ok(())
    }
}
