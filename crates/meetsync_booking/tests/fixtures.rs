//! Test fixtures for booking flow tests.
//!
//! Provides an in-memory database seeded with a default staff/lead setup and
//! a recording gateway double standing in for the external meeting provider.

use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use meetsync_booking::logic::{BookingCoordinator, BookingRequest, BookingRules};
use meetsync_common::services::{
    BoxFuture, BoxedError, Clock, FixedClock, MeetingDetail, MeetingHandle, MeetingService,
    SharedMeetingService,
};
use meetsync_db::{
    AvailabilityRepository, DbClient, Lead, LeadRepository, MeetingRepository, NamedLocks, Staff,
    StaffRepository,
};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

/// Gateway double that fabricates provider meetings and records every call.
pub struct RecordingGateway {
    fail_create: bool,
    counter: AtomicUsize,
    pub created: Mutex<Vec<String>>,
    pub cancelled: Mutex<Vec<String>>,
}

impl RecordingGateway {
    pub fn new(fail_create: bool) -> Self {
        Self {
            fail_create,
            counter: AtomicUsize::new(0),
            created: Mutex::new(Vec::new()),
            cancelled: Mutex::new(Vec::new()),
        }
    }
}

impl MeetingService for RecordingGateway {
    type Error = BoxedError;

    fn create_meeting(
        &self,
        _organizer_email: &str,
        _attendee_email: &str,
        _subject: &str,
        _start: NaiveDateTime,
        _end: NaiveDateTime,
    ) -> BoxFuture<'_, MeetingHandle, Self::Error> {
        Box::pin(async move {
            if self.fail_create {
                return Err(BoxedError(Box::new(std::io::Error::other(
                    "provider unavailable",
                ))));
            }
            let n = self.counter.fetch_add(1, Ordering::SeqCst) + 1;
            let external_id = format!("ext-{}", n);
            self.created.lock().unwrap().push(external_id.clone());
            Ok(MeetingHandle {
                join_url: Some(format!("https://teams.example.com/join/{}", external_id)),
                external_id,
            })
        })
    }

    fn cancel_meeting(
        &self,
        _organizer_email: &str,
        external_id: &str,
    ) -> BoxFuture<'_, (), Self::Error> {
        let external_id = external_id.to_string();
        Box::pin(async move {
            self.cancelled.lock().unwrap().push(external_id);
            Ok(())
        })
    }

    fn get_meeting(
        &self,
        _organizer_email: &str,
        _external_id: &str,
    ) -> BoxFuture<'_, MeetingDetail, Self::Error> {
        Box::pin(async move {
            Err(BoxedError(Box::new(std::io::Error::other(
                "not implemented in fixture",
            ))))
        })
    }
}

pub struct TestContext {
    pub coordinator: Arc<BookingCoordinator>,
    pub gateway: Arc<RecordingGateway>,
    pub meetings: MeetingRepository,
    pub leads: LeadRepository,
    pub availability: AvailabilityRepository,
    pub staff: StaffRepository,
}

/// Friday 2026-02-27 09:00, well before the test slots on Monday.
pub fn test_now() -> NaiveDateTime {
    NaiveDate::from_ymd_opt(2026, 2, 27)
        .unwrap()
        .and_hms_opt(9, 0, 0)
        .unwrap()
}

/// The Monday the default templates cover.
pub fn booking_date() -> &'static str {
    "2026-03-02"
}

pub fn time(h: u32, m: u32) -> NaiveTime {
    NaiveTime::from_hms_opt(h, m, 0).unwrap()
}

pub fn request(lead_id: &str, staff_id: &str, time: &str) -> BookingRequest {
    BookingRequest {
        lead_id: lead_id.to_string(),
        token: format!("tok-{}", lead_id),
        staff_id: staff_id.to_string(),
        date: booking_date().to_string(),
        time: time.to_string(),
        notes: None,
    }
}

pub async fn seed_staff(ctx: &TestContext, id: &str) {
    ctx.staff
        .insert(&Staff {
            id: id.to_string(),
            name: format!("Staff {}", id),
            email: format!("{}@example.com", id),
            active: true,
        })
        .await
        .unwrap();
    // default weekly schedule: Monday 09:00-12:00 and 14:00-18:00
    ctx.availability
        .insert_template(id, 0, time(9, 0), time(12, 0), true)
        .await
        .unwrap();
    ctx.availability
        .insert_template(id, 0, time(14, 0), time(18, 0), true)
        .await
        .unwrap();
}

pub async fn seed_lead(ctx: &TestContext, id: &str, grade: &str, qualified: bool) {
    ctx.leads
        .insert(&Lead {
            id: id.to_string(),
            name: format!("Lead {}", id),
            email: format!("{}@example.com", id),
            grade: Some(grade.to_string()),
            qualification_complete: qualified,
            session_token: Some(format!("tok-{}", id)),
            pipeline_stage: "qualified".to_string(),
        })
        .await
        .unwrap();
}

async fn build_context(gateway: Option<Arc<RecordingGateway>>) -> TestContext {
    let db = DbClient::from_url("sqlite::memory:").await.unwrap();

    let availability = AvailabilityRepository::new(db.clone());
    let meetings = MeetingRepository::new(db.clone());
    let leads = LeadRepository::new(db.clone());
    let staff = StaffRepository::new(db.clone());
    availability.init_schema().await.unwrap();
    meetings.init_schema().await.unwrap();
    leads.init_schema().await.unwrap();
    staff.init_schema().await.unwrap();

    let clock: Arc<dyn Clock> = Arc::new(FixedClock(test_now()));
    let shared: Option<SharedMeetingService> = gateway.clone().map(|g| {
        let service: SharedMeetingService = g;
        service
    });

    let coordinator = Arc::new(BookingCoordinator::new(
        db.clone(),
        Arc::new(NamedLocks::new()),
        shared,
        clock,
        BookingRules::from_config(None),
    ));

    let gateway = gateway.unwrap_or_else(|| Arc::new(RecordingGateway::new(false)));

    TestContext {
        coordinator,
        gateway,
        meetings,
        leads,
        availability,
        staff,
    }
}

/// Context with a healthy provider gateway.
pub async fn setup() -> TestContext {
    let ctx = build_context(Some(Arc::new(RecordingGateway::new(false)))).await;
    seed_staff(&ctx, "s1").await;
    seed_lead(&ctx, "l1", "A", true).await;
    ctx
}

/// Context whose provider rejects every create call.
pub async fn setup_with_failing_gateway() -> TestContext {
    let ctx = build_context(Some(Arc::new(RecordingGateway::new(true)))).await;
    seed_staff(&ctx, "s1").await;
    seed_lead(&ctx, "l1", "A", true).await;
    ctx
}

/// Context with no provider configured at all.
pub async fn setup_without_gateway() -> TestContext {
    let ctx = build_context(None).await;
    seed_staff(&ctx, "s1").await;
    seed_lead(&ctx, "l1", "A", true).await;
    ctx
}

