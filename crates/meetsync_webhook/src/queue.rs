// --- File: crates/meetsync_webhook/src/queue.rs ---
//! Durable, at-least-once ingestion queue for provider notifications.
//!
//! Receipt is a synchronous insert; processing happens in a background drain
//! loop. Per-process draining is single-flight via an explicit
//! idle/draining/draining-requested state machine; per-job exclusivity across
//! processes rests on the repository's conditional claim update.

use crate::error::WebhookError;
use crate::models::ChangeNotification;
use crate::sync::{NotificationSynchronizer, SyncOutcome};
use chrono::{Duration, NaiveDateTime};
use meetsync_common::services::Clock;
use meetsync_config::WebhookConfig;
use meetsync_db::{DbClient, WebhookJob, WebhookJobRepository};
use std::sync::{Arc, Mutex};
use tracing::{debug, error, warn};

/// Linear-capped retry backoff: `now + min(base * attempts, cap)`.
#[derive(Debug, Clone, Copy)]
pub struct RetryPolicy {
    pub max_attempts: i64,
    pub base: Duration,
    pub cap: Duration,
}

impl RetryPolicy {
    pub fn from_config(config: Option<&WebhookConfig>) -> Self {
        let defaults = WebhookConfig::default();
        let webhook = config.unwrap_or(&defaults);
        Self {
            max_attempts: webhook.max_attempts.unwrap_or(5),
            base: Duration::seconds(webhook.retry_base_seconds.unwrap_or(30)),
            cap: Duration::minutes(webhook.retry_cap_minutes.unwrap_or(30)),
        }
    }

    pub fn next_run_at(&self, now: NaiveDateTime, attempts: i64) -> NaiveDateTime {
        let scaled = self.base * attempts.max(1) as i32;
        now + scaled.min(self.cap)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum DrainState {
    Idle,
    Draining,
    DrainingRequested,
}

pub struct WebhookQueue {
    jobs: WebhookJobRepository,
    synchronizer: Arc<NotificationSynchronizer>,
    clock: Arc<dyn Clock>,
    policy: RetryPolicy,
    stale_after: Duration,
    batch_size: i64,
    state: Mutex<DrainState>,
}

impl WebhookQueue {
    pub fn new(
        db: DbClient,
        synchronizer: Arc<NotificationSynchronizer>,
        clock: Arc<dyn Clock>,
        config: Option<&WebhookConfig>,
    ) -> Self {
        let defaults = WebhookConfig::default();
        let webhook = config.unwrap_or(&defaults);
        Self {
            jobs: WebhookJobRepository::new(db),
            synchronizer,
            clock,
            policy: RetryPolicy::from_config(config),
            stale_after: Duration::minutes(webhook.stale_lock_minutes.unwrap_or(5)),
            batch_size: webhook.drain_batch_size.unwrap_or(10),
            state: Mutex::new(DrainState::Idle),
        }
    }

    /// Durably persist a batch of notifications as PENDING jobs.
    ///
    /// Once this returns Ok the caller can acknowledge receipt; processing
    /// outcome no longer affects the HTTP response.
    pub async fn enqueue(
        &self,
        notifications: &[ChangeNotification],
    ) -> Result<usize, WebhookError> {
        let now = self.clock.now();
        let mut queued = 0;
        for notification in notifications {
            let payload = serde_json::to_string(notification)
                .map_err(|e| WebhookError::Payload(e.to_string()))?;
            self.jobs.insert_pending(&payload, now).await?;
            queued += 1;
        }
        Ok(queued)
    }

    /// Kick the background drain loop.
    ///
    /// Single-flight per process: a trigger while a drain is running only
    /// flags a restart; the running loop picks the flag up when the ready
    /// set empties.
    pub fn trigger_drain(self: &Arc<Self>) {
        let mut state = self.state.lock().expect("drain state poisoned");
        match *state {
            DrainState::Idle => {
                *state = DrainState::Draining;
                let queue = Arc::clone(self);
                tokio::spawn(async move {
                    queue.run_drain().await;
                });
            }
            DrainState::Draining => {
                *state = DrainState::DrainingRequested;
            }
            DrainState::DrainingRequested => {}
        }
    }

    async fn run_drain(self: Arc<Self>) {
        loop {
            let claimed = match self.drain_pass().await {
                Ok(n) => n,
                Err(err) => {
                    error!("Drain pass failed: {}", err);
                    0
                }
            };
            if claimed > 0 {
                continue;
            }

            let mut state = self.state.lock().expect("drain state poisoned");
            if *state == DrainState::DrainingRequested {
                *state = DrainState::Draining;
                continue;
            }
            *state = DrainState::Idle;
            return;
        }
    }

    /// One drain pass: claim a bounded batch of ready jobs and process each.
    /// Returns the number of jobs claimed; zero means the ready set is empty.
    pub async fn drain_pass(&self) -> Result<usize, WebhookError> {
        let now = self.clock.now();
        let stale_before = now - self.stale_after;
        let batch = self
            .jobs
            .ready_batch(now, stale_before, self.batch_size)
            .await?;

        let mut claimed = 0;
        for job in batch {
            // a failed claim means another worker won the job; skip it
            if !self.jobs.try_claim(&job.id, job.updated_at, now).await? {
                continue;
            }
            claimed += 1;
            let attempts = job.attempts + 1; // the claim incremented it

            match self.process(&job).await {
                Ok(outcome) => {
                    self.jobs.delete(&job.id).await?;
                    debug!("Webhook job {} processed: {:?}", job.id, outcome);
                }
                Err(err) => {
                    let message = err.to_string();
                    let failed_at = self.clock.now();
                    if attempts >= self.policy.max_attempts {
                        warn!(
                            "Webhook job {} failed permanently after {} attempts: {}",
                            job.id, attempts, message
                        );
                        self.jobs.mark_failed(&job.id, &message, failed_at).await?;
                    } else {
                        let next_run_at = self.policy.next_run_at(failed_at, attempts);
                        debug!(
                            "Webhook job {} attempt {} failed, retrying at {}: {}",
                            job.id, attempts, next_run_at, message
                        );
                        self.jobs
                            .release_for_retry(&job.id, next_run_at, &message, failed_at)
                            .await?;
                    }
                }
            }
        }
        Ok(claimed)
    }

    async fn process(&self, job: &WebhookJob) -> Result<SyncOutcome, WebhookError> {
        let notification: ChangeNotification = serde_json::from_str(&job.payload)
            .map_err(|e| WebhookError::Payload(e.to_string()))?;
        self.synchronizer.apply(&notification).await
    }
}

#[cfg(test)]
mod tests {
    use super::RetryPolicy;
    use chrono::{Duration, NaiveDate};

    #[test]
    fn backoff_scales_linearly_up_to_the_cap() {
        let policy = RetryPolicy {
            max_attempts: 5,
            base: Duration::seconds(30),
            cap: Duration::minutes(30),
        };
        let now = NaiveDate::from_ymd_opt(2026, 3, 2)
            .unwrap()
            .and_hms_opt(10, 0, 0)
            .unwrap();

        assert_eq!(policy.next_run_at(now, 0), now + Duration::seconds(30));
        assert_eq!(policy.next_run_at(now, 1), now + Duration::seconds(30));
        assert_eq!(policy.next_run_at(now, 2), now + Duration::seconds(60));
        assert_eq!(policy.next_run_at(now, 4), now + Duration::seconds(120));
        // 100 * 30s would be 50 minutes; the cap wins
        assert_eq!(policy.next_run_at(now, 100), now + Duration::minutes(30));
    }
}
