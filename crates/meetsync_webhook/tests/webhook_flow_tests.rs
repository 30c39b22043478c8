//! Webhook ingestion and reconciliation tests over an in-memory database.


use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum::Json;
use chrono::Duration;
use fixtures::{meeting_start, notification, seed_meeting, setup, CLIENT_STATE};
use meetsync_common::services::{Clock, MeetingDetail};
use meetsync_db::{MeetingStatus, WebhookJobStatus};
use meetsync_webhook::handlers::{
    receive_webhook_handler, webhook_validation_handler, WebhookState,
};
use meetsync_webhook::SyncOutcome;
use serde_json::json;
use std::collections::HashMap;
use std::sync::Arc;

// --- NotificationSynchronizer ---

#[tokio::test]
async fn deletion_cancels_the_meeting_and_redelivery_is_a_noop() {
    let ctx = setup().await;

    let n = notification("deleted", CLIENT_STATE, "evt-1");
    assert_eq!(ctx.synchronizer.apply(&n).await.unwrap(), SyncOutcome::Updated);

    let meeting = ctx.meetings.find("m1").await.unwrap().unwrap();
    assert_eq!(meeting.status, MeetingStatus::Cancelled);
    assert!(meeting.cancelled_at.is_some());

    // the provider redelivers the same notification
    assert_eq!(ctx.synchronizer.apply(&n).await.unwrap(), SyncOutcome::Ignored);
}

#[tokio::test]
async fn wrong_client_state_is_ignored_without_mutation() {
    let ctx = setup().await;

    let n = notification("deleted", "wrong-secret", "evt-1");
    assert_eq!(ctx.synchronizer.apply(&n).await.unwrap(), SyncOutcome::Ignored);

    let meeting = ctx.meetings.find("m1").await.unwrap().unwrap();
    assert_eq!(meeting.status, MeetingStatus::Scheduled);
}

#[tokio::test]
async fn unknown_external_id_and_unsupported_type_are_ignored() {
    let ctx = setup().await;

    let unknown = notification("deleted", CLIENT_STATE, "evt-ghost");
    assert_eq!(
        ctx.synchronizer.apply(&unknown).await.unwrap(),
        SyncOutcome::Ignored
    );

    let created = notification("created", CLIENT_STATE, "evt-1");
    assert_eq!(
        ctx.synchronizer.apply(&created).await.unwrap(),
        SyncOutcome::Ignored
    );
}

#[tokio::test]
async fn update_with_time_change_reschedules() {
    let ctx = setup().await;

    let new_start = meeting_start() + Duration::hours(4);
    ctx.gateway.serve(MeetingDetail {
        start: new_start,
        end: new_start + Duration::hours(1),
        join_url: Some("https://teams.example.com/join/original".to_string()),
        cancelled: false,
    });

    let n = notification("updated", CLIENT_STATE, "evt-1");
    assert_eq!(ctx.synchronizer.apply(&n).await.unwrap(), SyncOutcome::Updated);

    let meeting = ctx.meetings.find("m1").await.unwrap().unwrap();
    assert_eq!(meeting.status, MeetingStatus::Rescheduled);
    assert_eq!(meeting.start_at, new_start);
    assert!(meeting.cancelled_at.is_none());

    // same provider state again: empty diff, nothing to apply
    assert_eq!(ctx.synchronizer.apply(&n).await.unwrap(), SyncOutcome::Ignored);
}

#[tokio::test]
async fn update_with_link_change_only_keeps_status() {
    let ctx = setup().await;

    ctx.gateway.serve(MeetingDetail {
        start: meeting_start(),
        end: meeting_start() + Duration::hours(1),
        join_url: Some("https://teams.example.com/join/moved".to_string()),
        cancelled: false,
    });

    let n = notification("updated", CLIENT_STATE, "evt-1");
    assert_eq!(ctx.synchronizer.apply(&n).await.unwrap(), SyncOutcome::Updated);

    let meeting = ctx.meetings.find("m1").await.unwrap().unwrap();
    assert_eq!(meeting.status, MeetingStatus::Scheduled);
    assert_eq!(
        meeting.external_join_url.as_deref(),
        Some("https://teams.example.com/join/moved")
    );
}

#[tokio::test]
async fn provider_side_cancellation_flag_cancels() {
    let ctx = setup().await;

    ctx.gateway.serve(MeetingDetail {
        start: meeting_start(),
        end: meeting_start() + Duration::hours(1),
        join_url: None,
        cancelled: true,
    });

    let n = notification("updated", CLIENT_STATE, "evt-1");
    assert_eq!(ctx.synchronizer.apply(&n).await.unwrap(), SyncOutcome::Updated);

    let meeting = ctx.meetings.find("m1").await.unwrap().unwrap();
    assert_eq!(meeting.status, MeetingStatus::Cancelled);
}

#[tokio::test]
async fn terminal_meetings_are_never_overwritten() {
    let ctx = setup().await;
    seed_meeting(&ctx, "m2", "evt-2", MeetingStatus::Completed).await;

    let deleted = notification("deleted", CLIENT_STATE, "evt-2");
    assert_eq!(
        ctx.synchronizer.apply(&deleted).await.unwrap(),
        SyncOutcome::Ignored
    );

    let updated = notification("updated", CLIENT_STATE, "evt-2");
    assert_eq!(
        ctx.synchronizer.apply(&updated).await.unwrap(),
        SyncOutcome::Ignored
    );

    let meeting = ctx.meetings.find("m2").await.unwrap().unwrap();
    assert_eq!(meeting.status, MeetingStatus::Completed);
}

// --- WebhookQueue ---

#[tokio::test]
async fn enqueue_and_drain_processes_and_removes_the_job() {
    let ctx = setup().await;

    let n = notification("deleted", CLIENT_STATE, "evt-1");
    let queued = ctx.queue.enqueue(&[n]).await.unwrap();
    assert_eq!(queued, 1);
    assert_eq!(ctx.jobs.count().await.unwrap(), 1);

    let claimed = ctx.queue.drain_pass().await.unwrap();
    assert_eq!(claimed, 1);
    assert_eq!(ctx.jobs.count().await.unwrap(), 0);

    let meeting = ctx.meetings.find("m1").await.unwrap().unwrap();
    assert_eq!(meeting.status, MeetingStatus::Cancelled);
}

#[tokio::test]
async fn failing_job_retries_with_growing_backoff_then_parks_as_failed() {
    let ctx = setup().await;

    // payload that can never parse: fails on every attempt
    let job = ctx
        .jobs
        .insert_pending("{ not valid json", ctx.clock.now())
        .await
        .unwrap();

    let mut delays = Vec::new();
    for attempt in 1..=5 {
        let claimed = ctx.queue.drain_pass().await.unwrap();
        assert_eq!(claimed, 1, "attempt {} should claim the job", attempt);

        let row = ctx.jobs.find(&job.id).await.unwrap().unwrap();
        assert_eq!(row.attempts, attempt);

        if attempt < 5 {
            assert_eq!(row.status, WebhookJobStatus::Pending);
            assert!(row.last_error.is_some());
            delays.push(row.next_run_at - ctx.clock.now());
            // make the job due again
            ctx.clock.advance(Duration::minutes(31));
        } else {
            assert_eq!(row.status, WebhookJobStatus::Failed);
            assert!(row
                .last_error
                .as_deref()
                .unwrap()
                .contains("Invalid notification payload"));
        }
    }

    // linear backoff: each delay strictly larger than the previous
    assert_eq!(delays.len(), 4);
    for pair in delays.windows(2) {
        assert!(pair[1] > pair[0], "backoff should grow: {:?}", delays);
    }

    // the failed job is retained and no further drain touches it
    assert_eq!(ctx.queue.drain_pass().await.unwrap(), 0);
    assert_eq!(ctx.jobs.count().await.unwrap(), 1);
}

#[tokio::test]
async fn stale_processing_job_is_reclaimed_and_completed() {
    let ctx = setup().await;

    let payload = serde_json::to_string(&notification("deleted", CLIENT_STATE, "evt-ghost")).unwrap();
    let job = ctx.jobs.insert_pending(&payload, ctx.clock.now()).await.unwrap();

    // simulate a worker that claimed the job and died
    assert!(ctx
        .jobs
        .try_claim(&job.id, job.updated_at, ctx.clock.now())
        .await
        .unwrap());
    let row = ctx.jobs.find(&job.id).await.unwrap().unwrap();
    assert_eq!(row.status, WebhookJobStatus::Processing);

    // not yet stale: nothing to claim
    ctx.clock.advance(Duration::minutes(2));
    assert_eq!(ctx.queue.drain_pass().await.unwrap(), 0);

    // past the 5 minute cutoff the job is claimable again
    ctx.clock.advance(Duration::minutes(4));
    assert_eq!(ctx.queue.drain_pass().await.unwrap(), 1);
    assert_eq!(ctx.jobs.count().await.unwrap(), 0);
}

#[tokio::test]
async fn claim_is_conditional_on_updated_at() {
    let ctx = setup().await;

    let job = ctx
        .jobs
        .insert_pending("{\"changeType\":\"noop\"}", ctx.clock.now())
        .await
        .unwrap();

    ctx.clock.advance(Duration::seconds(1));
    assert!(ctx
        .jobs
        .try_claim(&job.id, job.updated_at, ctx.clock.now())
        .await
        .unwrap());
    // the first claim bumped updated_at; the stale snapshot loses
    assert!(!ctx
        .jobs
        .try_claim(&job.id, job.updated_at, ctx.clock.now())
        .await
        .unwrap());
}

#[tokio::test]
async fn triggered_drain_runs_in_the_background_until_empty() {
    let ctx = setup().await;

    let n1 = notification("deleted", CLIENT_STATE, "evt-ghost");
    let n2 = notification("created", CLIENT_STATE, "evt-1");
    ctx.queue.enqueue(&[n1, n2]).await.unwrap();

    // second trigger while the first drain runs only flags a restart
    ctx.queue.trigger_drain();
    ctx.queue.trigger_drain();

    let mut remaining = ctx.jobs.count().await.unwrap();
    for _ in 0..50 {
        if remaining == 0 {
            break;
        }
        tokio::time::sleep(std::time::Duration::from_millis(20)).await;
        remaining = ctx.jobs.count().await.unwrap();
    }
    assert_eq!(remaining, 0);
}

// --- HTTP handlers ---

fn webhook_state(ctx: &fixtures::TestContext) -> Arc<WebhookState> {
    Arc::new(WebhookState::new(
        ctx.queue.clone(),
        ctx.synchronizer.clone(),
        None,
    ))
}

#[tokio::test]
async fn handshake_echoes_the_validation_token() {
    let mut params = HashMap::new();
    params.insert("validationToken".to_string(), "abc-123".to_string());

    let response = webhook_validation_handler(Query(params)).await;
    assert_eq!(response.status(), StatusCode::OK);

    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    assert_eq!(&body[..], &b"abc-123"[..]);
}

#[tokio::test]
async fn handshake_without_token_is_rejected() {
    let response = webhook_validation_handler(Query(HashMap::new())).await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn notifications_are_acknowledged_with_202() {
    let ctx = setup().await;
    let state = webhook_state(&ctx);

    let payload = json!({
        "value": [
            {
                "subscriptionId": "sub-1",
                "changeType": "deleted",
                "clientState": CLIENT_STATE,
                "resourceData": {"id": "evt-1"}
            }
        ]
    });

    let (status, Json(ack)) = receive_webhook_handler(State(state), Json(payload))
        .await
        .unwrap();
    assert_eq!(status, StatusCode::ACCEPTED);
    assert!(ack.accepted);
    assert_eq!(ack.queued, 1);
}

#[tokio::test]
async fn malformed_payload_is_a_400() {
    let ctx = setup().await;
    let state = webhook_state(&ctx);

    let result = receive_webhook_handler(State(state), Json(json!({"novalue": true}))).await;
    let (status, _) = result.unwrap_err();
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn oversized_batch_is_a_413() {
    let ctx = setup().await;
    let state = webhook_state(&ctx);

    let one = json!({
        "changeType": "deleted",
        "clientState": CLIENT_STATE,
        "resourceData": {"id": "evt-1"}
    });
    let batch: Vec<_> = std::iter::repeat(one).take(101).collect();

    let result = receive_webhook_handler(State(state), Json(json!({ "value": batch }))).await;
    let (status, _) = result.unwrap_err();
    assert_eq!(status, StatusCode::PAYLOAD_TOO_LARGE);
}
