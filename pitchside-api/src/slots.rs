use axum::{
    extract::{Path, Query, State},
    middleware,
    routing::{delete, get, post},
    Extension, Json, Router,
};
use chrono::{NaiveDate, NaiveTime};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use pitchside_catalog::{Slot, SlotStatus, VenueError};

use crate::error::AppError;
use crate::middleware::auth::{actor_id, owner_auth_middleware, user_auth_middleware, Claims};
use crate::state::AppState;

const DEFAULT_OPEN: &str = "06:00";
const DEFAULT_CLOSE: &str = "23:00";
const DEFAULT_DURATION_MINUTES: u32 = 60;

// ============================================================================
// Request/Response Types
// ============================================================================

#[derive(Debug, Deserialize)]
struct ListSlotsQuery {
    date: NaiveDate,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GenerateSlotsQuery {
    date: NaiveDate,
    start_time: Option<String>,
    end_time: Option<String>,
    slot_duration_minutes: Option<u32>,
    price_per_slot: Option<i32>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SlotResponse {
    pub id: Uuid,
    pub turf_id: Uuid,
    pub date: NaiveDate,
    pub start_time: NaiveTime,
    pub end_time: NaiveTime,
    /// Price a booking of this slot will be charged
    pub price: i32,
    pub custom_price: Option<i32>,
    pub status: SlotStatus,
    pub is_available: bool,
}

fn slot_response(slot: Slot, base_price: i32) -> SlotResponse {
    SlotResponse {
        id: slot.id,
        turf_id: slot.venue_id,
        date: slot.date,
        start_time: slot.start_time,
        end_time: slot.end_time,
        price: slot.effective_price(base_price),
        custom_price: slot.custom_price,
        is_available: slot.is_available(),
        status: slot.status,
    }
}

pub fn routes(state: AppState) -> Router<AppState> {
    let browse = Router::new()
        .route("/turfs/{id}/slots", get(list_slots))
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            user_auth_middleware,
        ));

    let owner = Router::new()
        .route("/turfs/{id}/slots/generate", post(generate_slots))
        .route("/owner/turfs/{turf_id}/slots/{slot_id}", delete(retire_slot))
        .route_layer(middleware::from_fn_with_state(state, owner_auth_middleware));

    browse.merge(owner)
}

// ============================================================================
// Handlers
// ============================================================================

/// GET /turfs/{id}/slots?date=YYYY-MM-DD
/// One day's slots in start-time order
async fn list_slots(
    State(state): State<AppState>,
    Path(turf_id): Path<Uuid>,
    Query(query): Query<ListSlotsQuery>,
) -> Result<Json<Vec<SlotResponse>>, AppError> {
    let venue = state
        .venues
        .get(&turf_id)
        .ok_or(VenueError::NotFound(turf_id))?;

    let slots = state.index.list(&turf_id, query.date);
    Ok(Json(
        slots
            .into_iter()
            .map(|slot| slot_response(slot, venue.base_price))
            .collect(),
    ))
}

/// POST /turfs/{id}/slots/generate?date=&startTime=&endTime=&slotDurationMinutes=&pricePerSlot=
/// Lay out one day's slots for a turf. One-shot per turf and date; a repeat
/// request conflicts instead of duplicating slots.
async fn generate_slots(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path(turf_id): Path<Uuid>,
    Query(query): Query<GenerateSlotsQuery>,
) -> Result<Json<Vec<SlotResponse>>, AppError> {
    let owner = actor_id(&claims)?;

    // 1. Ownership check
    let venue = state
        .venues
        .get(&turf_id)
        .ok_or(VenueError::NotFound(turf_id))?;
    if venue.owner_id != owner {
        return Err(AppError::Forbidden(
            "Turf belongs to a different owner".to_string(),
        ));
    }

    // 2. Resolve the generation window
    let start = parse_time(query.start_time.as_deref().unwrap_or(DEFAULT_OPEN))?;
    let end = parse_time(query.end_time.as_deref().unwrap_or(DEFAULT_CLOSE))?;
    let duration = query
        .slot_duration_minutes
        .unwrap_or(DEFAULT_DURATION_MINUTES);
    if let Some(price) = query.price_per_slot {
        if price <= 0 {
            return Err(AppError::Validation(
                "pricePerSlot must be positive".to_string(),
            ));
        }
    }

    // 3. Plan and persist
    let slots = state.planner.plan_slots(
        turf_id,
        query.date,
        start,
        end,
        duration,
        query.price_per_slot,
    )?;
    state.index.insert_day(turf_id, query.date, slots.clone())?;

    tracing::info!(
        "Generated {} slots for turf {} on {}",
        slots.len(),
        turf_id,
        query.date
    );

    Ok(Json(
        slots
            .into_iter()
            .map(|slot| slot_response(slot, venue.base_price))
            .collect(),
    ))
}

/// DELETE /owner/turfs/{turf_id}/slots/{slot_id}
/// Withdraw an open slot from sale. The slot stays on the books as
/// Cancelled; nothing is ever deleted.
async fn retire_slot(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path((turf_id, slot_id)): Path<(Uuid, Uuid)>,
) -> Result<Json<SlotResponse>, AppError> {
    let owner = actor_id(&claims)?;

    let slot = state
        .index
        .get(&slot_id)
        .ok_or_else(|| AppError::NotFound(format!("Slot not found: {}", slot_id)))?;
    if slot.venue_id != turf_id {
        return Err(AppError::NotFound(format!(
            "Slot {} does not belong to turf {}",
            slot_id, turf_id
        )));
    }
    let venue = state
        .venues
        .get(&slot.venue_id)
        .ok_or(VenueError::NotFound(slot.venue_id))?;

    let retired = state.coordinator.retire_slot(owner, slot_id)?;
    Ok(Json(slot_response(retired, venue.base_price)))
}

fn parse_time(raw: &str) -> Result<NaiveTime, AppError> {
    NaiveTime::parse_from_str(raw, "%H:%M")
        .or_else(|_| NaiveTime::parse_from_str(raw, "%H:%M:%S"))
        .map_err(|_| AppError::Validation(format!("Invalid time: {}", raw)))
}
