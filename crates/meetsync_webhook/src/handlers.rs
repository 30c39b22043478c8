// File: crates/meetsync_webhook/src/handlers.rs
use crate::models::{NotificationEnvelope, WebhookAck};
use crate::queue::WebhookQueue;
use crate::sync::NotificationSynchronizer;
use axum::{
    extract::{Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{error, info, warn};

const DEFAULT_MAX_BATCH: usize = 100;

/// Shared state for the webhook endpoints.
#[derive(Clone)]
pub struct WebhookState {
    pub queue: Arc<WebhookQueue>,
    pub synchronizer: Arc<NotificationSynchronizer>,
    pub max_batch: usize,
    pub inline_processing: bool,
}

impl WebhookState {
    pub fn new(
        queue: Arc<WebhookQueue>,
        synchronizer: Arc<NotificationSynchronizer>,
        config: Option<&meetsync_config::WebhookConfig>,
    ) -> Self {
        Self {
            queue,
            synchronizer,
            max_batch: config
                .and_then(|c| c.max_batch)
                .unwrap_or(DEFAULT_MAX_BATCH),
            inline_processing: config.map(|c| c.inline_processing).unwrap_or(false),
        }
    }
}

#[derive(Serialize, Debug)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct ErrorBody {
    pub error: String,
}

fn reject(status: StatusCode, message: &str) -> (StatusCode, Json<ErrorBody>) {
    (
        status,
        Json(ErrorBody {
            error: message.to_string(),
        }),
    )
}

/// Provider subscription handshake: echo the validation token as text/plain.
#[axum::debug_handler]
pub async fn webhook_validation_handler(
    Query(params): Query<HashMap<String, String>>,
) -> Response {
    match params.get("validationToken") {
        Some(token) => {
            info!("Answering webhook validation handshake");
            (StatusCode::OK, token.clone()).into_response()
        }
        None => (StatusCode::BAD_REQUEST, "Missing validationToken").into_response(),
    }
}

/// Accept a batch of change notifications.
///
/// Always 202 once the batch is durably enqueued (or, in degraded inline
/// mode, attempted); downstream processing failures never surface here.
#[axum::debug_handler]
pub async fn receive_webhook_handler(
    State(state): State<Arc<WebhookState>>,
    Json(payload): Json<serde_json::Value>,
) -> Result<(StatusCode, Json<WebhookAck>), (StatusCode, Json<ErrorBody>)> {
    let envelope: NotificationEnvelope = serde_json::from_value(payload)
        .map_err(|_| reject(StatusCode::BAD_REQUEST, "Invalid notification payload"))?;

    if envelope.value.len() > state.max_batch {
        return Err(reject(
            StatusCode::PAYLOAD_TOO_LARGE,
            "Too many notifications in one request",
        ));
    }

    let queued = if state.inline_processing {
        for notification in &envelope.value {
            if let Err(err) = state.synchronizer.apply(notification).await {
                warn!("Inline webhook processing failed: {}", err);
            }
        }
        envelope.value.len()
    } else {
        match state.queue.enqueue(&envelope.value).await {
            Ok(queued) => {
                state.queue.trigger_drain();
                queued
            }
            Err(err) => {
                error!("Failed to enqueue webhook notifications: {}", err);
                return Err(reject(
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Failed to accept notifications",
                ));
            }
        }
    };

    Ok((
        StatusCode::ACCEPTED,
        Json(WebhookAck {
            accepted: true,
            queued,
        }),
    ))
}
