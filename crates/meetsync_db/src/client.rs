//! Database client for Meetsync
//!
//! This module provides a thin client over an SQLite connection pool, using
//! SQLx as the underlying database library.

use crate::error::DbError;
use meetsync_config::AppConfig;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use sqlx::{Pool, Sqlite, Transaction};
use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, error, info};

/// Type alias for a database transaction
pub type DbTransaction<'a> = Transaction<'a, Sqlite>;

/// Database client for Meetsync
#[derive(Debug, Clone)]
pub struct DbClient {
    /// The database connection pool
    pool: Pool<Sqlite>,
}

impl DbClient {
    /// Create a new database client from the application configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if the database URL is empty or the connection fails.
    pub async fn new(config: &Arc<AppConfig>) -> Result<Self, DbError> {
        Self::from_url(&config.database.url).await
    }

    /// Create a new database client from a database URL.
    pub async fn from_url(db_url: &str) -> Result<Self, DbError> {
        if db_url.is_empty() {
            return Err(DbError::UrlError("Database URL is empty".to_string()));
        }

        let pool = Self::create_pool(db_url).await?;

        Ok(Self { pool })
    }

    async fn create_pool(db_url: &str) -> Result<Pool<Sqlite>, DbError> {
        debug!("Creating database pool with URL: {}", db_url);

        // create_if_missing creates the file, not its directory
        let db_path = db_url
            .strip_prefix("sqlite://")
            .or_else(|| db_url.strip_prefix("sqlite:"))
            .unwrap_or(db_url);
        if !db_path.contains(":memory:") && !db_path.is_empty() {
            if let Some(dir) = std::path::Path::new(db_path).parent() {
                if !dir.as_os_str().is_empty() && !dir.exists() {
                    debug!("Creating directory for SQLite database: {:?}", dir);
                    std::fs::create_dir_all(dir)
                        .map_err(|e| DbError::PoolError(format!("Failed to create directory: {}", e)))?;
                }
            }
        }

        let options = SqliteConnectOptions::from_str(db_url)
            .map_err(|e| DbError::UrlError(e.to_string()))?
            .create_if_missing(true);

        // An in-memory SQLite database exists per connection; more than one
        // connection in the pool would see independent empty databases.
        let max_connections = if db_url.contains(":memory:") { 1 } else { 5 };

        let pool = SqlitePoolOptions::new()
            .max_connections(max_connections)
            .acquire_timeout(Duration::from_secs(3))
            .idle_timeout(Duration::from_secs(600))
            .connect_with(options)
            .await
            .map_err(|e| {
                error!("Failed to create database pool: {}", e);
                DbError::PoolError(e.to_string())
            })?;

        info!("Database pool created successfully");
        Ok(pool)
    }

    /// Get the database connection pool
    pub fn pool(&self) -> &Pool<Sqlite> {
        &self.pool
    }

    /// Begin a transaction
    pub async fn begin(&self) -> Result<DbTransaction<'_>, DbError> {
        self.pool
            .begin()
            .await
            .map_err(|e| DbError::TransactionError(e.to_string()))
    }

    /// Execute a query that returns no rows
    pub async fn execute(&self, query: &str) -> Result<u64, DbError> {
        sqlx::query(query)
            .execute(&self.pool)
            .await
            .map(|r| r.rows_affected())
            .map_err(|e| DbError::QueryError(e.to_string()))
    }

    /// Check if the database is healthy
    pub async fn is_healthy(&self) -> bool {
        sqlx::query("SELECT 1").execute(&self.pool).await.is_ok()
    }
}
