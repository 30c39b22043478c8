// --- File: crates/meetsync_webhook/src/models.rs ---
//! Wire types for inbound provider change notifications.

use serde::{Deserialize, Serialize};

#[cfg(feature = "openapi")]
use utoipa::ToSchema;

/// The envelope the provider POSTs: a batch of notifications under `value`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(ToSchema))]
pub struct NotificationEnvelope {
    pub value: Vec<ChangeNotification>,
}

/// One change notification.
///
/// `client_state` echoes the shared secret supplied at subscription time and
/// is the only authenticity signal the provider sends.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
#[cfg_attr(feature = "openapi", derive(ToSchema))]
pub struct ChangeNotification {
    #[serde(default)]
    pub subscription_id: Option<String>,
    pub change_type: String,
    #[serde(default)]
    pub client_state: Option<String>,
    #[serde(default)]
    pub resource: Option<String>,
    #[serde(default)]
    pub resource_data: Option<ResourceData>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
#[cfg_attr(feature = "openapi", derive(ToSchema))]
pub struct ResourceData {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default, rename = "@odata.type")]
    pub odata_type: Option<String>,
}

/// Acknowledgment body returned once notifications are durably accepted.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
#[cfg_attr(feature = "openapi", derive(ToSchema))]
pub struct WebhookAck {
    pub accepted: bool,
    pub queued: usize,
}

/// Notification change types we act on. Anything else is ignored.
pub const CHANGE_TYPE_UPDATED: &str = "updated";
pub const CHANGE_TYPE_DELETED: &str = "deleted";
