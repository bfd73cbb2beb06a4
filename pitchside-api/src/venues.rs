use axum::{
    extract::{Path, Query, State},
    middleware,
    routing::{get, post, put},
    Extension, Json, Router,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use pitchside_catalog::{ActivityType, Venue, VenueError};

use crate::error::AppError;
use crate::middleware::auth::{actor_id, owner_auth_middleware, user_auth_middleware, Claims};
use crate::state::AppState;

// ============================================================================
// Request/Response Types
// ============================================================================

#[derive(Debug, Deserialize)]
struct ListTurfsQuery {
    location: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct CreateTurfRequest {
    name: String,
    location: String,
    description: Option<String>,
    base_price: i32,
    activities: Vec<ActivityType>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct UpdateTurfRequest {
    name: Option<String>,
    location: Option<String>,
    description: Option<String>,
    base_price: Option<i32>,
    activities: Option<Vec<ActivityType>>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TurfResponse {
    pub id: Uuid,
    pub owner_id: Uuid,
    pub name: String,
    pub location: String,
    pub description: Option<String>,
    pub base_price: i32,
    pub activities: Vec<ActivityType>,
    pub created_at: DateTime<Utc>,
}

impl From<Venue> for TurfResponse {
    fn from(venue: Venue) -> Self {
        Self {
            id: venue.id,
            owner_id: venue.owner_id,
            name: venue.name,
            location: venue.location,
            description: venue.description,
            base_price: venue.base_price,
            activities: venue.activities,
            created_at: venue.created_at,
        }
    }
}

pub fn routes(state: AppState) -> Router<AppState> {
    let browse = Router::new()
        .route("/turfs", get(list_turfs))
        .route("/turfs/{id}", get(get_turf))
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            user_auth_middleware,
        ));

    let owner = Router::new()
        .route("/owner/turfs", post(create_turf).get(my_turfs))
        .route("/owner/turfs/{id}", put(update_turf))
        .route_layer(middleware::from_fn_with_state(state, owner_auth_middleware));

    browse.merge(owner)
}

// ============================================================================
// Handlers
// ============================================================================

/// GET /turfs?location=
/// Browse venues, optionally filtered by location substring
async fn list_turfs(
    State(state): State<AppState>,
    Query(query): Query<ListTurfsQuery>,
) -> Result<Json<Vec<TurfResponse>>, AppError> {
    let venues = state.venues.list(query.location.as_deref());
    Ok(Json(venues.into_iter().map(Into::into).collect()))
}

/// GET /turfs/{id}
async fn get_turf(
    State(state): State<AppState>,
    Path(turf_id): Path<Uuid>,
) -> Result<Json<TurfResponse>, AppError> {
    let venue = state
        .venues
        .get(&turf_id)
        .ok_or(VenueError::NotFound(turf_id))?;
    Ok(Json(venue.into()))
}

/// POST /owner/turfs
/// Register a venue under the calling owner
async fn create_turf(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Json(req): Json<CreateTurfRequest>,
) -> Result<Json<TurfResponse>, AppError> {
    let owner = actor_id(&claims)?;

    if req.base_price <= 0 {
        return Err(AppError::Validation(
            "basePrice must be positive".to_string(),
        ));
    }
    if req.name.trim().is_empty() {
        return Err(AppError::Validation("name must not be empty".to_string()));
    }

    let venue = state.venues.register(Venue::new(
        owner,
        req.name,
        req.location,
        req.description,
        req.base_price,
        req.activities,
    ));

    tracing::info!("Venue {} created by owner {}", venue.id, owner);
    Ok(Json(venue.into()))
}

/// GET /owner/turfs
/// The calling owner's venues
async fn my_turfs(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
) -> Result<Json<Vec<TurfResponse>>, AppError> {
    let owner = actor_id(&claims)?;
    let venues = state.venues.owned_by(&owner);
    Ok(Json(venues.into_iter().map(Into::into).collect()))
}

/// PUT /owner/turfs/{id}
/// Edit venue details; only the owning account may edit
async fn update_turf(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path(turf_id): Path<Uuid>,
    Json(req): Json<UpdateTurfRequest>,
) -> Result<Json<TurfResponse>, AppError> {
    let owner = actor_id(&claims)?;

    let venue = state
        .venues
        .get(&turf_id)
        .ok_or(VenueError::NotFound(turf_id))?;
    if venue.owner_id != owner {
        return Err(AppError::Forbidden(
            "Turf belongs to a different owner".to_string(),
        ));
    }

    if let Some(price) = req.base_price {
        if price <= 0 {
            return Err(AppError::Validation(
                "basePrice must be positive".to_string(),
            ));
        }
    }

    let updated = state.venues.update(&turf_id, |venue| {
        if let Some(name) = req.name {
            venue.name = name;
        }
        if let Some(location) = req.location {
            venue.location = location;
        }
        if let Some(description) = req.description {
            venue.description = Some(description);
        }
        if let Some(price) = req.base_price {
            venue.base_price = price;
        }
        if let Some(activities) = req.activities {
            venue.activities = activities;
        }
    })?;

    Ok(Json(updated.into()))
}
