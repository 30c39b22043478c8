// --- File: crates/meetsync_teams/src/auth.rs ---
//! OAuth2 client-credentials token acquisition for Graph.
//!
//! Tokens are cached until shortly before expiry so repeated gateway calls
//! do not hit the token endpoint.

use crate::error::TeamsError;
use crate::models::TokenResponse;
use meetsync_config::TeamsConfig;
use reqwest::Client;
use std::time::{Duration, Instant};
use tokio::sync::RwLock;
use tracing::debug;

const DEFAULT_AUTH_BASE: &str = "https://login.microsoftonline.com";
const GRAPH_SCOPE: &str = "https://graph.microsoft.com/.default";
/// Refresh this long before the provider-reported expiry.
const EXPIRY_MARGIN: Duration = Duration::from_secs(60);

struct CachedToken {
    access_token: String,
    expires_at: Instant,
}

pub struct TeamsAuth {
    token_url: String,
    client_id: String,
    client_secret: String,
    http: Client,
    cached: RwLock<Option<CachedToken>>,
}

impl TeamsAuth {
    pub fn from_config(config: &TeamsConfig, http: Client) -> Result<Self, TeamsError> {
        let client_secret = config
            .client_secret
            .clone()
            .ok_or_else(|| TeamsError::ConfigError("Teams client secret missing".to_string()))?;

        let auth_base = config
            .auth_base_url
            .clone()
            .unwrap_or_else(|| DEFAULT_AUTH_BASE.to_string());
        let token_url = format!(
            "{}/{}/oauth2/v2.0/token",
            auth_base.trim_end_matches('/'),
            config.tenant_id
        );

        Ok(Self {
            token_url,
            client_id: config.client_id.clone(),
            client_secret,
            http,
            cached: RwLock::new(None),
        })
    }

    /// A valid bearer token, from cache or freshly acquired.
    pub async fn bearer_token(&self) -> Result<String, TeamsError> {
        if let Some(token) = self.cached.read().await.as_ref() {
            if token.expires_at > Instant::now() + EXPIRY_MARGIN {
                return Ok(token.access_token.clone());
            }
        }

        debug!("Acquiring Graph access token");
        let response = self
            .http
            .post(&self.token_url)
            .form(&[
                ("client_id", self.client_id.as_str()),
                ("client_secret", self.client_secret.as_str()),
                ("scope", GRAPH_SCOPE),
                ("grant_type", "client_credentials"),
            ])
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            return Err(TeamsError::ApiError {
                status: status.as_u16(),
                message,
            });
        }

        let body: TokenResponse = response
            .json()
            .await
            .map_err(|e| TeamsError::ParseError(e.to_string()))?;

        let expires_at = Instant::now() + Duration::from_secs(body.expires_in);
        *self.cached.write().await = Some(CachedToken {
            access_token: body.access_token.clone(),
            expires_at,
        });

        Ok(body.access_token)
    }
}
