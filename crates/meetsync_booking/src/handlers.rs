// File: crates/meetsync_booking/src/handlers.rs
use crate::logic::{
    AvailabilityQuery, AvailabilityResponse, BookingCoordinator, BookingError, BookingRequest,
    BookingResponse, MeetingView, SlotView,
};
use axum::{
    extract::{Query, State},
    http::StatusCode,
    response::Json,
};
use chrono::NaiveDateTime;
use serde::Serialize;
use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::error;

/// Shared state for the booking endpoints.
#[derive(Clone)]
pub struct BookingState {
    pub coordinator: Arc<BookingCoordinator>,
}

#[derive(Serialize, Debug)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct ErrorBody {
    pub error: String,
}

fn reject(status: StatusCode, message: impl Into<String>) -> (StatusCode, Json<ErrorBody>) {
    (
        status,
        Json(ErrorBody {
            error: message.into(),
        }),
    )
}

impl BookingError {
    fn status_code(&self) -> StatusCode {
        match self {
            BookingError::Validation(_) => StatusCode::BAD_REQUEST,
            BookingError::Forbidden(_) => StatusCode::FORBIDDEN,
            BookingError::NotFound(_) => StatusCode::NOT_FOUND,
            BookingError::Conflict(_) => StatusCode::CONFLICT,
            BookingError::NoSchedule => StatusCode::UNPROCESSABLE_ENTITY,
            BookingError::Persistence(_) | BookingError::Database(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }

    /// Only caller-fixable categories carry their message outward.
    fn public_message(&self) -> String {
        match self {
            BookingError::Persistence(_) | BookingError::Database(_) => {
                "Booking could not be completed".to_string()
            }
            other => other.to_string(),
        }
    }
}

fn into_response(err: BookingError) -> (StatusCode, Json<ErrorBody>) {
    if matches!(
        err,
        BookingError::Persistence(_) | BookingError::Database(_)
    ) {
        error!("Booking request failed: {}", err);
    }
    reject(err.status_code(), err.public_message())
}

/// Handler to get bookable time slots for a date.
#[axum::debug_handler]
pub async fn get_availability_handler(
    State(state): State<Arc<BookingState>>,
    Query(query): Query<AvailabilityQuery>,
) -> Result<Json<AvailabilityResponse>, (StatusCode, Json<ErrorBody>)> {
    let rows = state
        .coordinator
        .availability_rows(&query.date, query.staff_id.as_deref())
        .await
        .map_err(into_response)?;

    // One row per slot time. Staff are visited in listing order, so the
    // first available staff member wins a contested slot deterministically.
    let mut by_time: BTreeMap<NaiveDateTime, SlotView> = BTreeMap::new();
    for (staff, slots) in &rows {
        for slot in slots {
            let replace = match by_time.get(&slot.start) {
                None => true,
                Some(existing) => !existing.available && slot.available,
            };
            if replace {
                by_time.insert(
                    slot.start,
                    SlotView {
                        time: slot.start.format("%H:%M").to_string(),
                        available: slot.available,
                        staff_id: staff.id.clone(),
                        staff_name: staff.name.clone(),
                    },
                );
            }
        }
    }

    let slots: Vec<SlotView> = by_time.into_values().collect();
    let available_count = slots.iter().filter(|s| s.available).count();

    Ok(Json(AvailabilityResponse {
        date: query.date,
        slots,
        available_count,
    }))
}

/// Handler to book a slot.
#[axum::debug_handler]
pub async fn create_booking_handler(
    State(state): State<Arc<BookingState>>,
    Json(payload): Json<BookingRequest>,
) -> Result<(StatusCode, Json<BookingResponse>), (StatusCode, Json<ErrorBody>)> {
    let outcome = state
        .coordinator
        .book(payload)
        .await
        .map_err(into_response)?;

    let response = BookingResponse {
        meeting: MeetingView {
            id: outcome.meeting.id.clone(),
            date: outcome.meeting.start_at.format("%Y-%m-%d").to_string(),
            time: outcome.meeting.start_at.format("%H:%M").to_string(),
            staff_name: outcome.staff_name,
        },
    };

    Ok((StatusCode::CREATED, Json(response)))
}
