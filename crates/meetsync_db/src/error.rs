//! Error types for the database layer.

use thiserror::Error;

/// Errors produced by the database client and repositories.
#[derive(Error, Debug)]
pub enum DbError {
    /// Error occurred due to missing or invalid configuration
    #[error("Database configuration error: {0}")]
    ConfigError(String),

    /// Error occurred due to an invalid database URL
    #[error("Invalid database URL: {0}")]
    UrlError(String),

    /// Error occurred while creating or using the connection pool
    #[error("Connection pool error: {0}")]
    PoolError(String),

    /// Error occurred while executing a query
    #[error("Query failed: {0}")]
    QueryError(String),

    /// Error occurred while starting or committing a transaction
    #[error("Transaction error: {0}")]
    TransactionError(String),
}

impl From<sqlx::Error> for DbError {
    fn from(err: sqlx::Error) -> Self {
        DbError::QueryError(err.to_string())
    }
}
