// --- File: crates/meetsync_common/src/http.rs ---
use reqwest::{Client, Error as ReqwestError};
use std::time::Duration;

/// Creates a new HTTP client with custom configuration.
///
/// Every outbound gateway builds its client here so timeouts are always
/// explicit.
///
/// # Arguments
///
/// * `timeout_secs` - The timeout in seconds for the client
/// * `follow_redirects` - Whether the client should follow redirects
pub fn create_client(timeout_secs: u64, follow_redirects: bool) -> Result<Client, ReqwestError> {
    Client::builder()
        .timeout(Duration::from_secs(timeout_secs))
        .redirect(if follow_redirects {
            reqwest::redirect::Policy::default()
        } else {
            reqwest::redirect::Policy::none()
        })
        .build()
}
