use std::sync::Arc;

use pitchside_booking::{BookingLedger, ReservationCoordinator};
use pitchside_catalog::{AvailabilityIndex, SlotPlanner, VenueDirectory};
use pitchside_store::AccountStore;

#[derive(Clone)]
pub struct AuthConfig {
    pub secret: String,
    pub expiration: u64,
}

#[derive(Clone)]
pub struct AppState {
    pub accounts: Arc<AccountStore>,
    pub venues: Arc<VenueDirectory>,
    pub index: Arc<AvailabilityIndex>,
    pub planner: Arc<SlotPlanner>,
    pub coordinator: Arc<ReservationCoordinator>,
    pub ledger: Arc<BookingLedger>,
    pub auth: AuthConfig,
}
