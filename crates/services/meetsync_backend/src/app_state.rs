// --- File: services/meetsync_backend/src/app_state.rs ---
//! Service assembly: turns the loaded configuration into wired-up states for
//! the booking and webhook routers.

use meetsync_booking::handlers::BookingState;
use meetsync_booking::logic::{BookingCoordinator, BookingRules};
use meetsync_common::error::{internal_error, MeetsyncError};
use meetsync_common::services::{Clock, ErasedMeetingService, SharedMeetingService, SystemClock};
use meetsync_config::AppConfig;
use meetsync_db::{
    AvailabilityRepository, DbClient, LeadRepository, MeetingRepository, NamedLocks,
    StaffRepository, WebhookJobRepository,
};
use meetsync_teams::TeamsMeetingService;
use meetsync_webhook::handlers::WebhookState;
use meetsync_webhook::{NotificationSynchronizer, WebhookQueue};
use std::sync::Arc;
use tracing::{info, warn};

pub struct AppState {
    pub booking: Arc<BookingState>,
    pub webhook: Arc<WebhookState>,
}

pub async fn build_state(config: Arc<AppConfig>) -> Result<AppState, MeetsyncError> {
    let db = DbClient::new(&config).await.map_err(internal_error)?;

    AvailabilityRepository::new(db.clone())
        .init_schema()
        .await
        .map_err(internal_error)?;
    MeetingRepository::new(db.clone())
        .init_schema()
        .await
        .map_err(internal_error)?;
    LeadRepository::new(db.clone())
        .init_schema()
        .await
        .map_err(internal_error)?;
    StaffRepository::new(db.clone())
        .init_schema()
        .await
        .map_err(internal_error)?;
    WebhookJobRepository::new(db.clone())
        .init_schema()
        .await
        .map_err(internal_error)?;

    let clock: Arc<dyn Clock> = Arc::new(SystemClock);

    // A broken gateway never blocks startup: booking degrades to local-only.
    let gateway: Option<SharedMeetingService> = if config.use_teams {
        match config.teams.as_ref() {
            Some(teams_config) => match TeamsMeetingService::from_config(teams_config) {
                Ok(service) => {
                    info!("Teams meeting gateway initialized");
                    Some(Arc::new(ErasedMeetingService(service)))
                }
                Err(err) => {
                    warn!("Failed to initialize Teams gateway, running local-only: {}", err);
                    None
                }
            },
            None => {
                warn!("use_teams is set but the [teams] section is missing");
                None
            }
        }
    } else {
        None
    };

    let rules = BookingRules::from_config(config.scheduling.as_ref());
    let coordinator = Arc::new(BookingCoordinator::new(
        db.clone(),
        Arc::new(NamedLocks::new()),
        gateway.clone(),
        clock.clone(),
        rules,
    ));
    let booking = Arc::new(BookingState { coordinator });

    let client_state = config.webhook.as_ref().and_then(|w| w.client_state.clone());
    if client_state.is_none() {
        warn!("No webhook client state configured; inbound notifications will be ignored");
    }
    let synchronizer = Arc::new(NotificationSynchronizer::new(
        db.clone(),
        gateway,
        client_state,
        clock.clone(),
    ));
    let queue = Arc::new(WebhookQueue::new(
        db,
        synchronizer.clone(),
        clock,
        config.webhook.as_ref(),
    ));
    let webhook = Arc::new(WebhookState::new(
        queue,
        synchronizer,
        config.webhook.as_ref(),
    ));

    Ok(AppState { booking, webhook })
}
