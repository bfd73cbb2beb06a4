pub mod venue;
pub mod slots;
pub mod availability;

pub use venue::{Venue, ActivityType, VenueDirectory, VenueError};
pub use slots::{Slot, SlotStatus, SlotPlanner, PlannerConfig, SlotError};
pub use availability::{AvailabilityIndex, AvailabilityError};
