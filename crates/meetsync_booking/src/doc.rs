// File: crates/meetsync_booking/src/doc.rs

#![allow(dead_code)]
#![cfg(feature = "openapi")]
use utoipa::OpenApi;

use crate::handlers::ErrorBody;
use crate::logic::{AvailabilityResponse, BookingRequest, BookingResponse, MeetingView, SlotView};

#[utoipa::path(
    get,
    path = "/availability",
    params(
        ("date" = String, Query, description = "Date in YYYY-MM-DD format", example = "2026-03-02", format = "date"),
        ("staffId" = Option<String>, Query, description = "Restrict the answer to one staff member")
    ),
    responses(
        (status = 200, description = "Bookable slots for the date", body = AvailabilityResponse),
        (status = 400, description = "Malformed date", body = ErrorBody)
    )
)]
fn doc_get_availability_handler() {}

#[utoipa::path(
    post,
    path = "/booking",
    request_body = BookingRequest,
    responses(
        (status = 201, description = "Meeting booked", body = BookingResponse),
        (status = 400, description = "Invalid payload, advance-time or weekend violation", body = ErrorBody),
        (status = 403, description = "Invalid session token or ineligible lead", body = ErrorBody),
        (status = 404, description = "Lead or staff member not found", body = ErrorBody),
        (status = 409, description = "Slot taken, lead busy, or window blocked", body = ErrorBody),
        (status = 422, description = "No active schedule configured", body = ErrorBody),
        (status = 500, description = "Booking could not be completed", body = ErrorBody)
    )
)]
fn doc_create_booking_handler() {}

#[derive(OpenApi)]
#[openapi(
    paths(doc_get_availability_handler, doc_create_booking_handler),
    components(schemas(AvailabilityResponse, SlotView, BookingRequest, BookingResponse, MeetingView, ErrorBody)),
    tags((name = "Booking", description = "Availability and booking endpoints"))
)]
pub struct BookingApiDoc;
