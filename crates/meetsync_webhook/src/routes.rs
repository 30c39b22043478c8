// --- File: crates/meetsync_webhook/src/routes.rs ---

use crate::handlers::{receive_webhook_handler, webhook_validation_handler, WebhookState};
use axum::{routing::get, Router};
use std::sync::Arc;

/// Creates a router containing all routes for the webhook feature.
pub fn routes(state: Arc<WebhookState>) -> Router {
    Router::new()
        .route(
            "/webhook",
            get(webhook_validation_handler).post(receive_webhook_handler),
        )
        .with_state(state)
}
