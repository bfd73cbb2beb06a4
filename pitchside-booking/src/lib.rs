pub mod models;
pub mod coordinator;
pub mod ledger;
pub mod expiry;

pub use models::{Booking, BookingStatus, Customer};
pub use coordinator::{ReservationCoordinator, ReservationError};
pub use ledger::BookingLedger;
pub use expiry::HoldTimers;
