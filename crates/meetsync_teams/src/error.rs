// --- File: crates/meetsync_teams/src/error.rs ---
use thiserror::Error;

/// Errors that can occur when interacting with Microsoft Graph.
#[derive(Error, Debug)]
pub enum TeamsError {
    #[error("Teams configuration error: {0}")]
    ConfigError(String),

    #[error("Graph request failed: {0}")]
    RequestError(#[from] reqwest::Error),

    #[error("Graph API error: {status} - {message}")]
    ApiError { status: u16, message: String },

    #[error("Failed to parse Graph response: {0}")]
    ParseError(String),

    #[error("Failed to parse time: {0}")]
    TimeParseError(String),
}
