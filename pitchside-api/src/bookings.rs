use axum::{
    extract::{Path, State},
    middleware,
    routing::{get, post},
    Extension, Json, Router,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use pitchside_booking::{Booking, BookingStatus, Customer};
use pitchside_shared::models::events::{BookingEvent, BookingEventKind};

use crate::error::AppError;
use crate::middleware::auth::{actor_id, owner_auth_middleware, user_auth_middleware, Claims};
use crate::state::AppState;

// ============================================================================
// Request/Response Types
// ============================================================================

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct InitiateBookingRequest {
    slot_id: Uuid,
    /// The price the customer saw; rejected if the slot's price has moved
    amount: i32,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct WalkInBookRequest {
    slot_id: Uuid,
    customer_name: String,
    customer_phone: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BookingResponse {
    pub id: Uuid,
    pub slot_id: Uuid,
    pub turf_id: Uuid,
    pub customer: Customer,
    pub amount: i32,
    pub status: BookingStatus,
    pub reference: String,
    pub created_at: DateTime<Utc>,
    pub expires_at: Option<DateTime<Utc>>,
    pub confirmed_at: Option<DateTime<Utc>>,
    pub cancelled_at: Option<DateTime<Utc>>,
}

impl From<Booking> for BookingResponse {
    fn from(booking: Booking) -> Self {
        Self {
            id: booking.id,
            slot_id: booking.slot_id,
            turf_id: booking.venue_id,
            customer: booking.customer,
            amount: booking.amount,
            status: booking.status,
            reference: booking.reference,
            created_at: booking.created_at,
            expires_at: booking.expires_at,
            confirmed_at: booking.confirmed_at,
            cancelled_at: booking.cancelled_at,
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EventResponse {
    pub seq: u64,
    pub booking_id: Uuid,
    pub slot_id: Uuid,
    pub turf_id: Uuid,
    pub kind: BookingEventKind,
    pub actor: String,
    pub amount: i32,
    pub note: Option<String>,
    pub recorded_at: DateTime<Utc>,
}

impl From<BookingEvent> for EventResponse {
    fn from(event: BookingEvent) -> Self {
        Self {
            seq: event.seq,
            booking_id: event.booking_id,
            slot_id: event.slot_id,
            turf_id: event.venue_id,
            kind: event.kind,
            actor: event.actor,
            amount: event.amount,
            note: event.note,
            recorded_at: event.recorded_at,
        }
    }
}

pub fn routes(state: AppState) -> Router<AppState> {
    let user = Router::new()
        .route("/bookings/initiate", post(initiate_booking))
        .route("/bookings/my", get(my_bookings))
        .route("/bookings/{id}/confirm", post(confirm_booking))
        .route("/bookings/{id}/cancel", post(cancel_booking))
        .route("/bookings/{id}/history", get(booking_history))
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            user_auth_middleware,
        ));

    let owner = Router::new()
        .route("/bookings/owner/book", post(walk_in_book))
        .route_layer(middleware::from_fn_with_state(state, owner_auth_middleware));

    user.merge(owner)
}

// ============================================================================
// Handlers
// ============================================================================

/// POST /bookings/initiate
/// Hold a slot at its quoted price. The booking stays Pending until
/// confirmed, and lapses back to the open pool when the hold window runs
/// out.
async fn initiate_booking(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Json(req): Json<InitiateBookingRequest>,
) -> Result<Json<BookingResponse>, AppError> {
    let customer = actor_id(&claims)?;
    let booking = state
        .coordinator
        .initiate(customer, req.slot_id, req.amount)?;
    Ok(Json(booking.into()))
}

/// POST /bookings/{id}/confirm
/// Commit a Pending booking. Permitted to the booking's customer or the
/// venue owner.
async fn confirm_booking(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path(booking_id): Path<Uuid>,
) -> Result<Json<BookingResponse>, AppError> {
    let actor = actor_id(&claims)?;
    let booking = state.coordinator.confirm(&booking_id, actor)?;
    Ok(Json(booking.into()))
}

/// POST /bookings/{id}/cancel
/// Cancel a booking and release its slot, up until the slot's start time
async fn cancel_booking(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path(booking_id): Path<Uuid>,
) -> Result<Json<BookingResponse>, AppError> {
    let actor = actor_id(&claims)?;
    let booking = state.coordinator.cancel(&booking_id, actor)?;
    Ok(Json(booking.into()))
}

/// POST /bookings/owner/book
/// Owner books a slot directly for an in-person customer
async fn walk_in_book(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Json(req): Json<WalkInBookRequest>,
) -> Result<Json<BookingResponse>, AppError> {
    let owner = actor_id(&claims)?;
    let booking = state.coordinator.walk_in_book(
        owner,
        req.slot_id,
        req.customer_name,
        req.customer_phone,
    )?;
    Ok(Json(booking.into()))
}

/// GET /bookings/my
/// The caller's bookings, most recent first
async fn my_bookings(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
) -> Result<Json<Vec<BookingResponse>>, AppError> {
    let customer = actor_id(&claims)?;
    let bookings = state.coordinator.bookings_for_customer(&customer);
    Ok(Json(bookings.into_iter().map(Into::into).collect()))
}

/// GET /bookings/{id}/history
/// The booking's ledger trail. Visible to the booking's customer and the
/// venue owner.
async fn booking_history(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path(booking_id): Path<Uuid>,
) -> Result<Json<Vec<EventResponse>>, AppError> {
    let actor = actor_id(&claims)?;

    let booking = state
        .coordinator
        .booking(&booking_id)
        .ok_or_else(|| AppError::NotFound(format!("Booking not found: {}", booking_id)))?;
    let venue = state
        .venues
        .get(&booking.venue_id)
        .ok_or_else(|| AppError::NotFound(format!("Venue not found: {}", booking.venue_id)))?;

    let is_customer = booking.customer.account_id() == Some(actor);
    if !is_customer && venue.owner_id != actor {
        return Err(AppError::Forbidden(
            "Not permitted to view this booking's history".to_string(),
        ));
    }

    let events = state.ledger.history(&booking_id);
    Ok(Json(events.into_iter().map(Into::into).collect()))
}
