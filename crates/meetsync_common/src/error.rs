// --- File: crates/meetsync_common/src/error.rs ---
use std::fmt;
use thiserror::Error;

/// The base error type for all Meetsync errors.
///
/// This enum provides a common set of error variants that can be used across all crates.
/// Each crate can extend this by implementing From<SpecificError> for MeetsyncError.
#[derive(Error, Debug)]
pub enum MeetsyncError {
    /// Error occurred while parsing data
    #[error("Failed to parse data: {0}")]
    ParseError(String),

    /// Error occurred due to missing or invalid configuration
    #[error("Configuration error: {0}")]
    ConfigError(String),

    /// Error occurred during validation
    #[error("Validation error: {0}")]
    ValidationError(String),

    /// Error occurred during database operation
    #[error("Database error: {0}")]
    DatabaseError(String),

    /// Error occurred during external service call
    #[error("External service error: {service_name} - {message}")]
    ExternalServiceError {
        service_name: String,
        message: String,
    },

    /// Error occurred due to a conflict (e.g., resource already exists)
    #[error("Conflict: {0}")]
    ConflictError(String),

    /// Error occurred due to a resource not being found
    #[error("Not found: {0}")]
    NotFoundError(String),

    /// Error occurred due to an internal error
    #[error("Internal error: {0}")]
    InternalError(String),
}

/// A trait for converting errors to HTTP status codes.
pub trait HttpStatusCode {
    /// Returns the HTTP status code for this error.
    fn status_code(&self) -> u16;
}

impl HttpStatusCode for MeetsyncError {
    fn status_code(&self) -> u16 {
        match self {
            MeetsyncError::ParseError(_) => 400,
            MeetsyncError::ConfigError(_) => 500,
            MeetsyncError::ValidationError(_) => 400,
            MeetsyncError::DatabaseError(_) => 500,
            MeetsyncError::ExternalServiceError { .. } => 502,
            MeetsyncError::ConflictError(_) => 409,
            MeetsyncError::NotFoundError(_) => 404,
            MeetsyncError::InternalError(_) => 500,
        }
    }
}

// Utility functions for error handling
pub fn config_error<T: fmt::Display>(message: T) -> MeetsyncError {
    MeetsyncError::ConfigError(message.to_string())
}

pub fn internal_error<T: fmt::Display>(message: T) -> MeetsyncError {
    MeetsyncError::InternalError(message.to_string())
}
