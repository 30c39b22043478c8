// --- File: crates/meetsync_booking/src/routes.rs ---

use crate::handlers::{create_booking_handler, get_availability_handler, BookingState};
use axum::{
    routing::{get, post},
    Router,
};
use std::sync::Arc;

/// Creates a router containing all routes for the booking feature.
pub fn routes(state: Arc<BookingState>) -> Router {
    Router::new()
        .route("/availability", get(get_availability_handler))
        .route("/booking", post(create_booking_handler))
        .with_state(state)
}
