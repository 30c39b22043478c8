// --- File: crates/meetsync_webhook/src/lib.rs ---
// Declare modules within this crate
pub mod doc;
pub mod error;
pub mod handlers;
pub mod models;
pub mod queue;
pub mod routes;
pub mod sync;

pub use error::WebhookError;
pub use queue::{RetryPolicy, WebhookQueue};
pub use sync::{NotificationSynchronizer, SyncOutcome};
