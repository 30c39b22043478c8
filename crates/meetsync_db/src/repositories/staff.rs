//! Narrow repository over the staff table.

use crate::error::DbError;
use crate::models::Staff;
use crate::DbClient;
use tracing::debug;

#[derive(Debug, Clone)]
pub struct StaffRepository {
    db_client: DbClient,
}

impl StaffRepository {
    pub fn new(db_client: DbClient) -> Self {
        Self { db_client }
    }

    pub async fn init_schema(&self) -> Result<(), DbError> {
        debug!("Initializing staff schema");

        self.db_client
            .execute(
                r#"
            CREATE TABLE IF NOT EXISTS staff (
                id TEXT PRIMARY KEY,
                name TEXT NOT NULL,
                email TEXT NOT NULL,
                active INTEGER NOT NULL DEFAULT 1
            )
        "#,
            )
            .await?;

        Ok(())
    }

    pub async fn find(&self, id: &str) -> Result<Option<Staff>, DbError> {
        let row = sqlx::query_as::<_, Staff>(
            "SELECT id, name, email, active FROM staff WHERE id = ?",
        )
        .bind(id)
        .fetch_optional(self.db_client.pool())
        .await?;

        Ok(row)
    }

    /// Active staff in listing order. The order is the deterministic
    /// tie-break when a slot could go to more than one staff member.
    pub async fn list_active(&self) -> Result<Vec<Staff>, DbError> {
        let rows = sqlx::query_as::<_, Staff>(
            "SELECT id, name, email, active FROM staff WHERE active = 1 ORDER BY id",
        )
        .fetch_all(self.db_client.pool())
        .await?;

        Ok(rows)
    }

    pub async fn insert(&self, staff: &Staff) -> Result<(), DbError> {
        sqlx::query("INSERT INTO staff (id, name, email, active) VALUES (?, ?, ?, ?)")
            .bind(&staff.id)
            .bind(&staff.name)
            .bind(&staff.email)
            .bind(staff.active)
            .execute(self.db_client.pool())
            .await?;

        Ok(())
    }
}
