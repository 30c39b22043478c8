// --- File: crates/meetsync_booking/src/logic.rs ---
use chrono::{Datelike, Duration, NaiveDate, NaiveDateTime, NaiveTime, Weekday};
use meetsync_common::services::{Clock, MeetingHandle, SharedMeetingService};
use meetsync_config::SchedulingConfig;
use meetsync_db::{
    AvailabilityBlock, AvailabilityRepository, AvailabilityTemplate, DbClient, DbError, Lead,
    LeadRepository, Meeting, MeetingRepository, MeetingStatus, NamedLocks, Staff, StaffRepository,
    PROVIDER_LOCAL, PROVIDER_TEAMS,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use thiserror::Error;
use tracing::{info, warn};
use uuid::Uuid;

#[cfg(feature = "openapi")]
use utoipa::ToSchema;

/// Grades eligible to self-schedule a meeting.
const APPROVED_GRADES: [&str; 2] = ["A", "B"];
/// Pipeline stage a lead moves to once a meeting is booked.
const STAGE_MEETING_SCHEDULED: &str = "meeting_scheduled";

// --- Error Handling ---
#[derive(Error, Debug)]
pub enum BookingError {
    #[error("{0}")]
    Validation(String),
    #[error("{0}")]
    Forbidden(String),
    #[error("{0}")]
    NotFound(String),
    #[error("{0}")]
    Conflict(String),
    #[error("No active schedule configured")]
    NoSchedule,
    #[error("Persistence failure: {0}")]
    Persistence(String),
    #[error("Database error: {0}")]
    Database(#[from] DbError),
}

// --- Data Structures ---
#[derive(Deserialize, Debug)]
#[serde(rename_all = "camelCase")]
#[cfg_attr(feature = "openapi", derive(utoipa::IntoParams, utoipa::ToSchema))]
#[cfg_attr(feature = "openapi", into_params(parameter_in = Query))]
pub struct AvailabilityQuery {
    /// Date in YYYY-MM-DD format
    pub date: String,
    /// Restrict the answer to one staff member
    pub staff_id: Option<String>,
}

#[derive(Serialize, Debug, Clone)]
#[serde(rename_all = "camelCase")]
#[cfg_attr(feature = "openapi", derive(ToSchema))]
pub struct SlotView {
    /// Slot start in HH:MM
    pub time: String,
    pub available: bool,
    pub staff_id: String,
    pub staff_name: String,
}

#[derive(Serialize, Debug)]
#[serde(rename_all = "camelCase")]
#[cfg_attr(feature = "openapi", derive(ToSchema))]
pub struct AvailabilityResponse {
    pub date: String,
    pub slots: Vec<SlotView>,
    pub available_count: usize,
}

#[derive(Deserialize, Debug)]
#[serde(rename_all = "camelCase")]
#[cfg_attr(feature = "openapi", derive(ToSchema))]
pub struct BookingRequest {
    pub lead_id: String,
    pub token: String,
    pub staff_id: String,
    /// YYYY-MM-DD
    pub date: String,
    /// HH:MM
    pub time: String,
    pub notes: Option<String>,
}

#[derive(Serialize, Debug)]
#[serde(rename_all = "camelCase")]
#[cfg_attr(feature = "openapi", derive(ToSchema))]
pub struct MeetingView {
    pub id: String,
    pub date: String,
    pub time: String,
    pub staff_name: String,
}

#[derive(Serialize, Debug)]
#[cfg_attr(feature = "openapi", derive(ToSchema))]
pub struct BookingResponse {
    pub meeting: MeetingView,
}

/// A booked meeting together with display data the row does not carry.
#[derive(Debug)]
pub struct BookingOutcome {
    pub meeting: Meeting,
    pub staff_name: String,
}

/// One candidate slot for one staff member.
#[derive(Debug, Clone, PartialEq)]
pub struct Slot {
    pub staff_id: String,
    pub start: NaiveDateTime,
    pub available: bool,
}

/// Scheduling rules applied on top of the availability data.
#[derive(Debug, Clone, Copy)]
pub struct BookingRules {
    pub min_advance: Duration,
    pub slot_len: Duration,
}

impl BookingRules {
    pub fn from_config(config: Option<&SchedulingConfig>) -> Self {
        let defaults = SchedulingConfig::default();
        let scheduling = config.unwrap_or(&defaults);
        Self {
            min_advance: Duration::hours(scheduling.min_advance_hours()),
            slot_len: Duration::minutes(scheduling.slot_duration_minutes()),
        }
    }
}

// --- Availability Logic ---

/// Template weekday index: 0 = Monday.
fn weekday_index(date: NaiveDate) -> i64 {
    date.weekday().num_days_from_monday() as i64
}

pub fn is_weekend(date: NaiveDate) -> bool {
    matches!(date.weekday(), Weekday::Sat | Weekday::Sun)
}

fn minutes_of(t: NaiveTime) -> i64 {
    use chrono::Timelike;
    (t.hour() * 60 + t.minute()) as i64
}

fn time_from_minutes(m: i64) -> NaiveTime {
    NaiveTime::from_hms_opt((m / 60) as u32, (m % 60) as u32, 0).unwrap_or(NaiveTime::MIN)
}

/// Merge overlapping or touching intervals into a sorted union.
fn merge_windows(mut intervals: Vec<(i64, i64)>) -> Vec<(i64, i64)> {
    if intervals.is_empty() {
        return vec![];
    }
    intervals.sort_by_key(|(start, _)| *start);
    let mut merged = vec![intervals[0]];
    for &(start, end) in &intervals[1..] {
        let last = merged.last_mut().unwrap();
        if start <= last.1 {
            last.1 = last.1.max(end);
        } else {
            merged.push((start, end));
        }
    }
    merged
}

/// Candidate windows for a date: the union of that weekday's active
/// templates, as minutes from midnight.
fn template_windows(templates: &[AvailabilityTemplate], date: NaiveDate) -> Vec<(i64, i64)> {
    let day = weekday_index(date);
    let intervals: Vec<(i64, i64)> = templates
        .iter()
        .filter(|t| t.active && t.day_of_week == day)
        .map(|t| (minutes_of(t.start_time), minutes_of(t.end_time)))
        .filter(|(start, end)| start < end)
        .collect();
    merge_windows(intervals)
}

/// Remove every block interval overlapping the date from the windows.
fn subtract_blocks(
    windows: Vec<(i64, i64)>,
    blocks: &[AvailabilityBlock],
    date: NaiveDate,
) -> Vec<(i64, i64)> {
    let day_start = date.and_time(NaiveTime::MIN);
    let day_end = day_start + Duration::days(1);

    let mut result = windows;
    for block in blocks {
        if block.start_at >= day_end || block.end_at <= day_start {
            continue;
        }
        // clamp the block to this date's wall clock
        let from = if block.start_at <= day_start {
            0
        } else {
            minutes_of(block.start_at.time())
        };
        let to = if block.end_at >= day_end {
            24 * 60
        } else {
            minutes_of(block.end_at.time())
        };

        result = result
            .into_iter()
            .flat_map(|(start, end)| {
                if from >= end || to <= start {
                    vec![(start, end)]
                } else {
                    let mut pieces = Vec::new();
                    if start < from {
                        pieces.push((start, from));
                    }
                    if to < end {
                        pieces.push((to, end));
                    }
                    pieces
                }
            })
            .collect();
    }
    result
}

/// Discretize windows into whole-hour slot starts that fit a full slot.
fn hour_slots(windows: &[(i64, i64)], slot_len: Duration) -> Vec<i64> {
    let slot_minutes = slot_len.num_minutes();
    let mut slots = Vec::new();
    for &(start, end) in windows {
        let mut cursor = if start % 60 == 0 {
            start
        } else {
            (start / 60 + 1) * 60
        };
        while cursor + slot_minutes <= end {
            slots.push(cursor);
            cursor += slot_minutes;
        }
    }
    slots.sort_unstable();
    slots.dedup();
    slots
}

/// Compute the slot sequence for one staff member on one date.
///
/// Pure function of its inputs plus `now`, which only feeds the
/// minimum-advance filter. Blocks remove slots entirely; meetings, the
/// advance rule, and weekends mark them unavailable.
pub fn compute_slots(
    staff_id: &str,
    templates: &[AvailabilityTemplate],
    blocks: &[AvailabilityBlock],
    meetings: &[Meeting],
    date: NaiveDate,
    now: NaiveDateTime,
    rules: BookingRules,
) -> Vec<Slot> {
    let windows = subtract_blocks(template_windows(templates, date), blocks, date);
    let weekend = is_weekend(date);
    let earliest = now + rules.min_advance;

    hour_slots(&windows, rules.slot_len)
        .into_iter()
        .map(|m| {
            let start = date.and_time(time_from_minutes(m));
            let end = start + rules.slot_len;
            let busy = meetings.iter().any(|meeting| {
                meeting.status.is_active()
                    && meeting.staff_id == staff_id
                    && meeting.start_at < end
                    && meeting.end_at > start
            });
            Slot {
                staff_id: staff_id.to_string(),
                start,
                available: !busy && !weekend && start >= earliest,
            }
        })
        .collect()
}

/// Whether the requested slot lies entirely within the configured windows,
/// net of blocks.
pub fn window_is_bookable(
    templates: &[AvailabilityTemplate],
    blocks: &[AvailabilityBlock],
    date: NaiveDate,
    start_time: NaiveTime,
    slot_len: Duration,
) -> bool {
    let windows = subtract_blocks(template_windows(templates, date), blocks, date);
    let start = minutes_of(start_time);
    let end = start + slot_len.num_minutes();
    windows.iter().any(|&(from, to)| from <= start && end <= to)
}

// --- Booking Logic ---

/// Orchestrates slot validation, external meeting creation, and atomic local
/// persistence, with compensating rollback when the two sides disagree.
pub struct BookingCoordinator {
    db: DbClient,
    meetings: MeetingRepository,
    availability: AvailabilityRepository,
    leads: LeadRepository,
    staff: StaffRepository,
    locks: Arc<NamedLocks>,
    gateway: Option<SharedMeetingService>,
    clock: Arc<dyn Clock>,
    rules: BookingRules,
}

impl BookingCoordinator {
    pub fn new(
        db: DbClient,
        locks: Arc<NamedLocks>,
        gateway: Option<SharedMeetingService>,
        clock: Arc<dyn Clock>,
        rules: BookingRules,
    ) -> Self {
        Self {
            meetings: MeetingRepository::new(db.clone()),
            availability: AvailabilityRepository::new(db.clone()),
            leads: LeadRepository::new(db.clone()),
            staff: StaffRepository::new(db.clone()),
            db,
            locks,
            gateway,
            clock,
            rules,
        }
    }

    pub fn rules(&self) -> BookingRules {
        self.rules
    }

    /// Book a slot for a lead.
    pub async fn book(&self, request: BookingRequest) -> Result<BookingOutcome, BookingError> {
        let now = self.clock.now();

        // 1. shape, advance-time and weekday rules
        let date = NaiveDate::parse_from_str(&request.date, "%Y-%m-%d")
            .map_err(|_| BookingError::Validation("Invalid date format (YYYY-MM-DD)".into()))?;
        let time = NaiveTime::parse_from_str(&request.time, "%H:%M")
            .map_err(|_| BookingError::Validation("Invalid time format (HH:MM)".into()))?;
        let start = date.and_time(time);
        let end = start + self.rules.slot_len;

        if is_weekend(date) {
            return Err(BookingError::Validation(
                "Meetings cannot be booked on weekends".into(),
            ));
        }
        if start < now + self.rules.min_advance {
            return Err(BookingError::Validation(format!(
                "Meetings must be booked at least {} hours in advance",
                self.rules.min_advance.num_hours()
            )));
        }

        // 2. lead eligibility and staff state
        let lead = self
            .leads
            .find(&request.lead_id)
            .await?
            .ok_or_else(|| BookingError::NotFound("Lead not found".into()))?;
        let staff = self
            .staff
            .find(&request.staff_id)
            .await?
            .filter(|s| s.active)
            .ok_or_else(|| BookingError::NotFound("Staff member not found".into()))?;

        if lead.session_token.as_deref() != Some(request.token.as_str()) {
            return Err(BookingError::Forbidden("Invalid session token".into()));
        }
        let grade_approved = lead
            .grade
            .as_deref()
            .map(|g| APPROVED_GRADES.contains(&g))
            .unwrap_or(false);
        if !lead.qualification_complete || !grade_approved {
            return Err(BookingError::Forbidden(
                "Lead is not eligible to book a meeting".into(),
            ));
        }

        // 3. requested window against templates and blocks
        let templates = self.availability.active_templates_for_staff(&staff.id).await?;
        if templates.is_empty() {
            return Err(BookingError::NoSchedule);
        }
        let day_start = date.and_time(NaiveTime::MIN);
        let blocks = self
            .availability
            .blocks_for_staff_between(&staff.id, day_start, day_start + Duration::days(1))
            .await?;
        if !window_is_bookable(&templates, &blocks, date, time, self.rules.slot_len) {
            return Err(BookingError::Conflict(
                "Requested time is blocked or outside the configured availability".into(),
            ));
        }

        // 4. mirror into the provider; failure degrades to a local-only meeting
        let mut provider = PROVIDER_LOCAL;
        let mut handle: Option<MeetingHandle> = None;
        if let Some(gateway) = &self.gateway {
            let subject = format!("Intro meeting: {} / {}", lead.name, staff.name);
            match gateway
                .create_meeting(&staff.email, &lead.email, &subject, start, end)
                .await
            {
                Ok(created) => {
                    provider = PROVIDER_TEAMS;
                    handle = Some(created);
                }
                Err(err) => {
                    warn!(
                        "External meeting creation failed, continuing local-only: {}",
                        err
                    );
                }
            }
        }

        // 5/6. serialize on (lead, slot), re-check, insert, commit.
        // Lock order is fixed: lead before slot.
        let lead_key = format!("lead:{}", lead.id);
        let slot_key = format!("slot:{}:{}", staff.id, start.format("%Y-%m-%dT%H:%M"));
        let _guards = self.locks.acquire_pair(&lead_key, &slot_key).await;

        let inserted = self
            .insert_within_tx(&lead, &staff, start, end, provider, handle.as_ref(), &request, now)
            .await;

        match inserted {
            Ok(meeting) => {
                // 7. side effect on the funnel; failure here does not unwind
                // the booking
                if let Err(err) = self
                    .leads
                    .advance_pipeline(&lead.id, STAGE_MEETING_SCHEDULED)
                    .await
                {
                    warn!("Failed to advance pipeline for lead {}: {}", lead.id, err);
                }
                info!(
                    "Booked meeting {} for lead {} with staff {}",
                    meeting.id, lead.id, staff.id
                );
                Ok(BookingOutcome {
                    meeting,
                    staff_name: staff.name,
                })
            }
            Err(err) => {
                if let Some(created) = handle {
                    self.compensate(&staff.email, &created.external_id).await;
                }
                Err(err)
            }
        }
    }

    #[allow(clippy::too_many_arguments)]
    async fn insert_within_tx(
        &self,
        lead: &Lead,
        staff: &Staff,
        start: NaiveDateTime,
        end: NaiveDateTime,
        provider: &str,
        handle: Option<&MeetingHandle>,
        request: &BookingRequest,
        now: NaiveDateTime,
    ) -> Result<Meeting, BookingError> {
        let mut tx = self
            .db
            .begin()
            .await
            .map_err(|e| BookingError::Persistence(e.to_string()))?;

        if self
            .meetings
            .active_meeting_for_lead(&mut *tx, &lead.id)
            .await?
            .is_some()
        {
            return Err(BookingError::Conflict(
                "Lead already has a scheduled meeting".into(),
            ));
        }
        if self
            .meetings
            .overlapping_active_for_staff(&mut *tx, &staff.id, start, end)
            .await?
            .is_some()
        {
            return Err(BookingError::Conflict(
                "Requested slot is no longer available".into(),
            ));
        }

        let meeting = Meeting {
            id: Uuid::new_v4().to_string(),
            lead_id: lead.id.clone(),
            staff_id: staff.id.clone(),
            start_at: start,
            end_at: end,
            status: MeetingStatus::Scheduled,
            provider: provider.to_string(),
            external_meeting_id: handle.map(|h| h.external_id.clone()),
            external_join_url: handle.and_then(|h| h.join_url.clone()),
            self_scheduled: true,
            notes: request.notes.clone(),
            cancelled_at: None,
            completed_at: None,
            created_at: now,
            updated_at: now,
        };

        self.meetings
            .insert(&mut *tx, &meeting)
            .await
            .map_err(|e| BookingError::Persistence(e.to_string()))?;
        tx.commit()
            .await
            .map_err(|e| BookingError::Persistence(e.to_string()))?;

        Ok(meeting)
    }

    /// Best-effort compensating cancel of an external meeting whose local
    /// counterpart never materialized. A failed cancel is logged, not
    /// retried; a later provider notification reconciles it.
    async fn compensate(&self, organizer_email: &str, external_id: &str) {
        let Some(gateway) = &self.gateway else {
            return;
        };
        match gateway.cancel_meeting(organizer_email, external_id).await {
            Ok(()) => info!("Compensated external meeting {}", external_id),
            Err(err) => warn!(
                "Compensating cancel of external meeting {} failed: {}",
                external_id, err
            ),
        }
    }

    /// Slot rows for every eligible staff member on a date, in staff listing
    /// order.
    pub async fn availability_rows(
        &self,
        date_str: &str,
        staff_id: Option<&str>,
    ) -> Result<Vec<(Staff, Vec<Slot>)>, BookingError> {
        let date = NaiveDate::parse_from_str(date_str, "%Y-%m-%d")
            .map_err(|_| BookingError::Validation("Invalid date format (YYYY-MM-DD)".into()))?;
        let now = self.clock.now();

        let staff_members = match staff_id {
            Some(id) => {
                let staff = self
                    .staff
                    .find(id)
                    .await?
                    .filter(|s| s.active)
                    .ok_or_else(|| BookingError::NotFound("Staff member not found".into()))?;
                vec![staff]
            }
            None => self.staff.list_active().await?,
        };

        let day_start = date.and_time(NaiveTime::MIN);
        let day_end = day_start + Duration::days(1);

        let mut rows = Vec::with_capacity(staff_members.len());
        for staff in staff_members {
            let templates = self.availability.active_templates_for_staff(&staff.id).await?;
            let blocks = self
                .availability
                .blocks_for_staff_between(&staff.id, day_start, day_end)
                .await?;
            let meetings = self
                .meetings
                .active_for_staff_between(&staff.id, day_start, day_end)
                .await?;
            let slots = compute_slots(
                &staff.id, &templates, &blocks, &meetings, date, now, self.rules,
            );
            rows.push((staff, slots));
        }

        Ok(rows)
    }
}
