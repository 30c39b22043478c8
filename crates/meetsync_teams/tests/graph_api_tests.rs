//! Gateway tests against a mocked Graph API.

use chrono::NaiveDate;
use meetsync_common::services::MeetingService;
use meetsync_config::TeamsConfig;
use meetsync_teams::{TeamsError, TeamsMeetingService};
use serde_json::json;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn test_config(server: &MockServer) -> TeamsConfig {
    TeamsConfig {
        tenant_id: "test-tenant".to_string(),
        client_id: "test-client".to_string(),
        client_secret: Some("test-secret".to_string()),
        organizer_email: "sales@example.com".to_string(),
        time_zone: Some("UTC".to_string()),
        timeout_seconds: Some(5),
        graph_base_url: Some(server.uri()),
        auth_base_url: Some(server.uri()),
    }
}

async fn mount_token_endpoint(server: &MockServer) {
    Mock::given(method("POST"))
        .and(path("/test-tenant/oauth2/v2.0/token"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "access_token": "test-token",
            "token_type": "Bearer",
            "expires_in": 3600
        })))
        .mount(server)
        .await;
}

#[tokio::test]
async fn create_meeting_returns_handle_with_join_url() {
    let server = MockServer::start().await;
    mount_token_endpoint(&server).await;

    Mock::given(method("POST"))
        .and(path("/users/sales@example.com/events"))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!({
            "id": "evt-123",
            "subject": "Intro call",
            "start": {"dateTime": "2026-03-02T10:00:00.0000000", "timeZone": "UTC"},
            "end": {"dateTime": "2026-03-02T11:00:00.0000000", "timeZone": "UTC"},
            "isCancelled": false,
            "onlineMeeting": {"joinUrl": "https://teams.microsoft.com/l/meetup-join/abc"}
        })))
        .expect(1)
        .mount(&server)
        .await;

    let service = TeamsMeetingService::from_config(&test_config(&server)).unwrap();
    let start = NaiveDate::from_ymd_opt(2026, 3, 2)
        .unwrap()
        .and_hms_opt(10, 0, 0)
        .unwrap();
    let end = start + chrono::Duration::hours(1);

    let handle = service
        .create_meeting("sales@example.com", "lead@example.com", "Intro call", start, end)
        .await
        .unwrap();

    assert_eq!(handle.external_id, "evt-123");
    assert_eq!(
        handle.join_url.as_deref(),
        Some("https://teams.microsoft.com/l/meetup-join/abc")
    );
}

#[tokio::test]
async fn create_meeting_surfaces_provider_errors() {
    let server = MockServer::start().await;
    mount_token_endpoint(&server).await;

    Mock::given(method("POST"))
        .and(path("/users/sales@example.com/events"))
        .respond_with(ResponseTemplate::new(503).set_body_string("throttled"))
        .mount(&server)
        .await;

    let service = TeamsMeetingService::from_config(&test_config(&server)).unwrap();
    let start = NaiveDate::from_ymd_opt(2026, 3, 2)
        .unwrap()
        .and_hms_opt(10, 0, 0)
        .unwrap();

    let result = service
        .create_meeting(
            "sales@example.com",
            "lead@example.com",
            "Intro call",
            start,
            start + chrono::Duration::hours(1),
        )
        .await;

    match result {
        Err(TeamsError::ApiError { status, .. }) => assert_eq!(status, 503),
        other => panic!("expected ApiError, got {:?}", other.map(|_| ())),
    }
}

#[tokio::test]
async fn cancel_meeting_treats_missing_event_as_success() {
    let server = MockServer::start().await;
    mount_token_endpoint(&server).await;

    Mock::given(method("DELETE"))
        .and(path("/users/sales@example.com/events/evt-gone"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;

    let service = TeamsMeetingService::from_config(&test_config(&server)).unwrap();
    service
        .cancel_meeting("sales@example.com", "evt-gone")
        .await
        .unwrap();
}

#[tokio::test]
async fn get_meeting_reports_current_detail() {
    let server = MockServer::start().await;
    mount_token_endpoint(&server).await;

    Mock::given(method("GET"))
        .and(path("/users/sales@example.com/events/evt-123"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "id": "evt-123",
            "subject": "Intro call",
            "start": {"dateTime": "2026-03-02T14:00:00.0000000", "timeZone": "UTC"},
            "end": {"dateTime": "2026-03-02T15:00:00.0000000", "timeZone": "UTC"},
            "isCancelled": false,
            "onlineMeeting": {"joinUrl": "https://teams.microsoft.com/l/meetup-join/abc"}
        })))
        .mount(&server)
        .await;

    let service = TeamsMeetingService::from_config(&test_config(&server)).unwrap();
    let detail = service
        .get_meeting("sales@example.com", "evt-123")
        .await
        .unwrap();

    assert_eq!(detail.start.format("%H:%M").to_string(), "14:00");
    assert!(!detail.cancelled);
}

#[test]
fn from_config_requires_client_secret() {
    let config = TeamsConfig {
        tenant_id: "t".to_string(),
        client_id: "c".to_string(),
        client_secret: None,
        organizer_email: "sales@example.com".to_string(),
        time_zone: None,
        timeout_seconds: None,
        graph_base_url: None,
        auth_base_url: None,
    };
    assert!(TeamsMeetingService::from_config(&config).is_err());
}
