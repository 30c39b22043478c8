// --- File: crates/meetsync_teams/src/models.rs ---
//! Wire types for the Graph calendar-event API.

use crate::error::TeamsError;
use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

/// Graph dateTime bodies carry fractional seconds ("2026-03-02T10:00:00.0000000").
const GRAPH_DATETIME_FORMAT: &str = "%Y-%m-%dT%H:%M:%S%.f";

/// Graph's {dateTime, timeZone} pair. The time is wall-clock in the named
/// zone; no conversion happens on our side.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GraphDateTimeZone {
    pub date_time: String,
    pub time_zone: String,
}

impl GraphDateTimeZone {
    pub fn from_naive(value: NaiveDateTime, time_zone: &str) -> Self {
        Self {
            date_time: value.format("%Y-%m-%dT%H:%M:%S").to_string(),
            time_zone: time_zone.to_string(),
        }
    }

    pub fn to_naive(&self) -> Result<NaiveDateTime, TeamsError> {
        NaiveDateTime::parse_from_str(&self.date_time, GRAPH_DATETIME_FORMAT)
            .map_err(|e| TeamsError::TimeParseError(format!("{}: {}", self.date_time, e)))
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GraphEmailAddress {
    pub address: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GraphAttendee {
    pub email_address: GraphEmailAddress,
    #[serde(rename = "type")]
    pub attendee_type: String,
}

/// Body for `POST /users/{organizer}/events`.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GraphEventRequest {
    pub subject: String,
    pub start: GraphDateTimeZone,
    pub end: GraphDateTimeZone,
    pub attendees: Vec<GraphAttendee>,
    pub is_online_meeting: bool,
    pub online_meeting_provider: String,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GraphOnlineMeeting {
    pub join_url: Option<String>,
}

/// The subset of a Graph event resource we read back.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GraphEvent {
    pub id: String,
    pub subject: Option<String>,
    pub start: GraphDateTimeZone,
    pub end: GraphDateTimeZone,
    pub is_cancelled: Option<bool>,
    pub online_meeting: Option<GraphOnlineMeeting>,
}

/// OAuth2 token endpoint response (client credentials grant).
#[derive(Debug, Clone, Deserialize)]
pub struct TokenResponse {
    pub access_token: String,
    pub expires_in: u64,
}
