// --- File: crates/meetsync_webhook/src/sync.rs ---
//! Applies a validated provider notification onto the matching local meeting.
//!
//! Idempotent by construction: redelivered notifications that change nothing
//! return `Ignored` and perform no writes, so duplicate deliveries cause no
//! duplicate side effects.

use crate::error::WebhookError;
use crate::models::{ChangeNotification, CHANGE_TYPE_DELETED, CHANGE_TYPE_UPDATED};
use meetsync_common::services::{Clock, SharedMeetingService};
use meetsync_db::{DbClient, MeetingRepository, MeetingStatus, StaffRepository};
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Result of applying one notification.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncOutcome {
    Updated,
    Ignored,
}

pub struct NotificationSynchronizer {
    meetings: MeetingRepository,
    staff: StaffRepository,
    gateway: Option<SharedMeetingService>,
    client_state: Option<String>,
    clock: Arc<dyn Clock>,
}

impl NotificationSynchronizer {
    pub fn new(
        db: DbClient,
        gateway: Option<SharedMeetingService>,
        client_state: Option<String>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            meetings: MeetingRepository::new(db.clone()),
            staff: StaffRepository::new(db),
            gateway,
            client_state,
            clock,
        }
    }

    /// Apply one notification. Untrusted or unresolvable notifications are
    /// ignored without mutation; only gateway/database failures are errors
    /// (and therefore retried by the queue).
    pub async fn apply(
        &self,
        notification: &ChangeNotification,
    ) -> Result<SyncOutcome, WebhookError> {
        let Some(expected) = self.client_state.as_deref() else {
            warn!("No webhook client state configured; ignoring notification");
            return Ok(SyncOutcome::Ignored);
        };
        let provided = notification.client_state.as_deref().unwrap_or("");
        if !constant_time_eq(provided.as_bytes(), expected.as_bytes()) {
            debug!("Notification rejected: client state mismatch");
            return Ok(SyncOutcome::Ignored);
        }

        let Some(external_id) = notification
            .resource_data
            .as_ref()
            .and_then(|r| r.id.as_deref())
        else {
            return Ok(SyncOutcome::Ignored);
        };

        match notification.change_type.as_str() {
            CHANGE_TYPE_DELETED => self.apply_deletion(external_id).await,
            CHANGE_TYPE_UPDATED => self.apply_update(external_id).await,
            other => {
                debug!("Unsupported change type '{}' ignored", other);
                Ok(SyncOutcome::Ignored)
            }
        }
    }

    async fn apply_deletion(&self, external_id: &str) -> Result<SyncOutcome, WebhookError> {
        let Some(meeting) = self.meetings.find_by_external_id(external_id).await? else {
            return Ok(SyncOutcome::Ignored);
        };
        if meeting.status == MeetingStatus::Cancelled || meeting.status.is_terminal() {
            return Ok(SyncOutcome::Ignored);
        }

        let changed = self.meetings.cancel(&meeting.id, self.clock.now()).await?;
        if changed {
            info!(
                "Meeting {} cancelled from provider notification",
                meeting.id
            );
            Ok(SyncOutcome::Updated)
        } else {
            Ok(SyncOutcome::Ignored)
        }
    }

    async fn apply_update(&self, external_id: &str) -> Result<SyncOutcome, WebhookError> {
        let Some(meeting) = self.meetings.find_by_external_id(external_id).await? else {
            return Ok(SyncOutcome::Ignored);
        };
        if meeting.status.is_terminal() {
            return Ok(SyncOutcome::Ignored);
        }
        let Some(gateway) = &self.gateway else {
            warn!("Update notification received but no gateway configured");
            return Ok(SyncOutcome::Ignored);
        };

        let organizer = match self.staff.find(&meeting.staff_id).await? {
            Some(staff) => staff.email,
            None => return Ok(SyncOutcome::Ignored),
        };

        let detail = gateway
            .get_meeting(&organizer, external_id)
            .await
            .map_err(|e| WebhookError::Gateway(e.to_string()))?;

        if detail.cancelled {
            return self.apply_deletion(external_id).await;
        }

        // minimal diff: only fields that actually changed are written
        let time_changed = detail.start != meeting.start_at || detail.end != meeting.end_at;
        let link_changed = detail.join_url != meeting.external_join_url;
        if !time_changed && !link_changed {
            return Ok(SyncOutcome::Ignored);
        }

        let now = self.clock.now();
        if time_changed {
            self.meetings
                .reschedule(&meeting.id, detail.start, detail.end, now)
                .await?;
        }
        if link_changed {
            self.meetings
                .set_join_url(&meeting.id, detail.join_url.as_deref(), now)
                .await?;
        }

        info!("Applied provider update to meeting {}", meeting.id);
        Ok(SyncOutcome::Updated)
    }
}

/// Helper for constant-time string comparison.
pub(crate) fn constant_time_eq(a: &[u8], b: &[u8]) -> bool {
    if a.len() != b.len() {
        return false;
    }
    let mut result = 0;
    for (x, y) in a.iter().zip(b.iter()) {
        result |= x ^ y;
    }
    result == 0
}
