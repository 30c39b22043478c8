// File: crates/meetsync_webhook/src/doc.rs

#![allow(dead_code)]
#![cfg(feature = "openapi")]
use utoipa::OpenApi;

use crate::handlers::ErrorBody;
use crate::models::{ChangeNotification, NotificationEnvelope, ResourceData, WebhookAck};

#[utoipa::path(
    get,
    path = "/webhook",
    params(
        ("validationToken" = String, Query, description = "Handshake token echoed back as text/plain")
    ),
    responses(
        (status = 200, description = "Token echoed", body = String),
        (status = 400, description = "Missing validationToken")
    )
)]
fn doc_webhook_validation_handler() {}

#[utoipa::path(
    post,
    path = "/webhook",
    request_body = NotificationEnvelope,
    responses(
        (status = 202, description = "Notifications durably accepted", body = WebhookAck),
        (status = 400, description = "Invalid notification payload", body = ErrorBody),
        (status = 413, description = "Too many notifications in one request", body = ErrorBody)
    )
)]
fn doc_receive_webhook_handler() {}

#[derive(OpenApi)]
#[openapi(
    paths(doc_webhook_validation_handler, doc_receive_webhook_handler),
    components(schemas(NotificationEnvelope, ChangeNotification, ResourceData, WebhookAck, ErrorBody)),
    tags((name = "Webhook", description = "Provider notification ingestion"))
)]
pub struct WebhookApiDoc;
