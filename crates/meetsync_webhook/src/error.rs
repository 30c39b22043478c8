// --- File: crates/meetsync_webhook/src/error.rs ---
use meetsync_db::DbError;
use thiserror::Error;

/// Errors raised while ingesting or applying provider notifications.
///
/// These never propagate to the webhook HTTP response; they drive the retry
/// decision per job and end up in the job row's `last_error`.
#[derive(Error, Debug)]
pub enum WebhookError {
    #[error("Invalid notification payload: {0}")]
    Payload(String),

    #[error("Gateway error: {0}")]
    Gateway(String),

    #[error("Database error: {0}")]
    Database(#[from] DbError),
}
