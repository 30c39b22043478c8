// --- File: crates/meetsync_teams/src/service.rs ---
//! Microsoft Teams meeting service implementation.
//!
//! Implements the MeetingService trait against the Graph calendar-event API.
//! All calls are bounded by the configured request timeout; a timed-out call
//! surfaces as an error for the caller's fallback handling.

use crate::auth::TeamsAuth;
use crate::error::TeamsError;
use crate::models::{
    GraphAttendee, GraphDateTimeZone, GraphEmailAddress, GraphEvent, GraphEventRequest,
};
use chrono::NaiveDateTime;
use meetsync_common::create_client;
use meetsync_common::services::{BoxFuture, MeetingDetail, MeetingHandle, MeetingService};
use meetsync_config::TeamsConfig;
use reqwest::{Client, StatusCode};
use std::sync::Arc;
use tracing::debug;

const DEFAULT_GRAPH_BASE: &str = "https://graph.microsoft.com/v1.0";
const DEFAULT_TIMEOUT_SECS: u64 = 10;
const ONLINE_MEETING_PROVIDER: &str = "teamsForBusiness";

/// Teams meeting service over the Graph API.
pub struct TeamsMeetingService {
    auth: Arc<TeamsAuth>,
    http: Client,
    graph_base: String,
    time_zone: String,
}

impl TeamsMeetingService {
    pub fn from_config(config: &TeamsConfig) -> Result<Self, TeamsError> {
        let timeout = config.timeout_seconds.unwrap_or(DEFAULT_TIMEOUT_SECS);
        let http =
            create_client(timeout, true).map_err(|e| TeamsError::ConfigError(e.to_string()))?;
        let auth = Arc::new(TeamsAuth::from_config(config, http.clone())?);

        Ok(Self {
            auth,
            http,
            graph_base: config
                .graph_base_url
                .clone()
                .unwrap_or_else(|| DEFAULT_GRAPH_BASE.to_string())
                .trim_end_matches('/')
                .to_string(),
            time_zone: config.time_zone.clone().unwrap_or_else(|| "UTC".to_string()),
        })
    }

    fn events_url(&self, organizer_email: &str) -> String {
        format!("{}/users/{}/events", self.graph_base, organizer_email)
    }

    fn event_url(&self, organizer_email: &str, event_id: &str) -> String {
        format!("{}/{}", self.events_url(organizer_email), event_id)
    }

    async fn api_error(response: reqwest::Response) -> TeamsError {
        let status = response.status().as_u16();
        let message = response.text().await.unwrap_or_default();
        TeamsError::ApiError { status, message }
    }
}

impl MeetingService for TeamsMeetingService {
    type Error = TeamsError;

    fn create_meeting(
        &self,
        organizer_email: &str,
        attendee_email: &str,
        subject: &str,
        start: NaiveDateTime,
        end: NaiveDateTime,
    ) -> BoxFuture<'_, MeetingHandle, Self::Error> {
        let url = self.events_url(organizer_email);
        let attendee_email = attendee_email.to_string();
        let subject = subject.to_string();

        Box::pin(async move {
            let token = self.auth.bearer_token().await?;

            let body = GraphEventRequest {
                subject,
                start: GraphDateTimeZone::from_naive(start, &self.time_zone),
                end: GraphDateTimeZone::from_naive(end, &self.time_zone),
                attendees: vec![GraphAttendee {
                    email_address: GraphEmailAddress {
                        address: attendee_email,
                        name: None,
                    },
                    attendee_type: "required".to_string(),
                }],
                is_online_meeting: true,
                online_meeting_provider: ONLINE_MEETING_PROVIDER.to_string(),
            };

            let response = self
                .http
                .post(&url)
                .bearer_auth(token)
                .json(&body)
                .send()
                .await?;

            if !response.status().is_success() {
                return Err(Self::api_error(response).await);
            }

            let event: GraphEvent = response
                .json()
                .await
                .map_err(|e| TeamsError::ParseError(e.to_string()))?;

            debug!("Created Graph event {}", event.id);
            Ok(MeetingHandle {
                external_id: event.id,
                join_url: event.online_meeting.and_then(|m| m.join_url),
            })
        })
    }

    fn cancel_meeting(
        &self,
        organizer_email: &str,
        external_id: &str,
    ) -> BoxFuture<'_, (), Self::Error> {
        let url = self.event_url(organizer_email, external_id);
        let external_id = external_id.to_string();

        Box::pin(async move {
            let token = self.auth.bearer_token().await?;

            let response = self.http.delete(&url).bearer_auth(token).send().await?;
            let status = response.status();

            // Already gone on the provider side counts as cancelled.
            if status == StatusCode::NOT_FOUND || status == StatusCode::GONE {
                debug!("Graph event {} already absent, treating as cancelled", external_id);
                return Ok(());
            }
            if !status.is_success() {
                return Err(Self::api_error(response).await);
            }

            Ok(())
        })
    }

    fn get_meeting(
        &self,
        organizer_email: &str,
        external_id: &str,
    ) -> BoxFuture<'_, MeetingDetail, Self::Error> {
        let url = self.event_url(organizer_email, external_id);

        Box::pin(async move {
            let token = self.auth.bearer_token().await?;

            let response = self.http.get(&url).bearer_auth(token).send().await?;
            if !response.status().is_success() {
                return Err(Self::api_error(response).await);
            }

            let event: GraphEvent = response
                .json()
                .await
                .map_err(|e| TeamsError::ParseError(e.to_string()))?;

            Ok(MeetingDetail {
                start: event.start.to_naive()?,
                end: event.end.to_naive()?,
                join_url: event.online_meeting.and_then(|m| m.join_url),
                cancelled: event.is_cancelled.unwrap_or(false),
            })
        })
    }
}
