// --- File: crates/meetsync_config/src/models.rs ---

use serde::{Deserialize, Serialize};

// --- General Server Config ---
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

// --- Database Config ---
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct DatabaseConfig {
    pub url: String, // e.g., sqlite:data/meetsync.db, overridable via MEETSYNC_DATABASE__URL
}

// --- Microsoft Teams / Graph Config ---
// Holds non-secret Graph config. The client secret is loaded from the
// environment (MEETSYNC_TEAMS__CLIENT_SECRET).
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct TeamsConfig {
    pub tenant_id: String,
    pub client_id: String,
    pub client_secret: Option<String>,
    /// Mailbox that owns the mirrored calendar events.
    pub organizer_email: String,
    /// Wall-clock time zone label sent with event bodies. No conversion is
    /// performed locally; the label is passed through to the provider.
    pub time_zone: Option<String>,
    /// Request timeout for Graph calls, in seconds.
    pub timeout_seconds: Option<u64>,
    /// Override for the Graph API base URL (tests, proxies).
    pub graph_base_url: Option<String>,
    /// Override for the OAuth token endpoint base URL (tests, proxies).
    pub auth_base_url: Option<String>,
}

// --- Scheduling Config ---
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[derive(Debug, Deserialize, Serialize, Clone, Default)]
pub struct SchedulingConfig {
    /// Minimum lead time before a slot may start, in hours. Defaults to 2.
    pub min_advance_hours: Option<i64>,
    /// Slot length in minutes. Defaults to 60.
    pub slot_duration_minutes: Option<i64>,
}

// --- Webhook / Queue Config ---
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[derive(Debug, Deserialize, Serialize, Clone, Default)]
pub struct WebhookConfig {
    /// Shared secret echoed back by the provider as clientState.
    /// Loaded from MEETSYNC_WEBHOOK__CLIENT_STATE in deployed environments.
    pub client_state: Option<String>,
    /// Maximum notifications accepted in one POST. Defaults to 100.
    pub max_batch: Option<usize>,
    /// Attempts before a job is parked as FAILED. Defaults to 5.
    pub max_attempts: Option<i64>,
    /// Linear backoff base, in seconds. Defaults to 30.
    pub retry_base_seconds: Option<i64>,
    /// Backoff cap, in minutes. Defaults to 30.
    pub retry_cap_minutes: Option<i64>,
    /// Age after which a PROCESSING lock is considered stale. Defaults to 5.
    pub stale_lock_minutes: Option<i64>,
    /// Jobs claimed per drain pass. Defaults to 10.
    pub drain_batch_size: Option<i64>,
    /// Process notifications synchronously instead of queueing them.
    /// Degraded mode for environments without a background worker.
    #[serde(default)]
    pub inline_processing: bool,
}

// --- Unified App Configuration ---
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct AppConfig {
    // Server config is mandatory
    pub server: ServerConfig,

    // --- Runtime Flags (optional in config file, default to false) ---
    #[serde(default)]
    pub use_teams: bool,

    pub database: DatabaseConfig,

    // --- Optional Sections ---
    pub teams: Option<TeamsConfig>,
    pub scheduling: Option<SchedulingConfig>,
    pub webhook: Option<WebhookConfig>,
}

impl SchedulingConfig {
    pub fn min_advance_hours(&self) -> i64 {
        self.min_advance_hours.unwrap_or(2)
    }

    pub fn slot_duration_minutes(&self) -> i64 {
        self.slot_duration_minutes.unwrap_or(60)
    }
}
