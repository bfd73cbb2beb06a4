use serde::{Deserialize, Serialize};
use uuid::Uuid;
use chrono::{DateTime, NaiveDate, NaiveTime, Timelike, Utc};

/// Slot reservation state
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SlotStatus {
    Available,
    Held,
    Booked,
    Cancelled,
}

/// A bookable time interval at a venue. Slots are created by the planner,
/// transition state only through the reservation coordinator, and are never
/// deleted: retiring a slot marks it Cancelled.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Slot {
    pub id: Uuid,
    pub venue_id: Uuid,
    pub date: NaiveDate,
    pub start_time: NaiveTime,
    pub end_time: NaiveTime,
    /// Per-slot price override in minor currency units; the venue base price
    /// applies when absent
    pub custom_price: Option<i32>,
    pub status: SlotStatus,
    pub held_by: Option<Uuid>,
    pub hold_booking: Option<Uuid>,
    pub hold_expires_at: Option<DateTime<Utc>>,
}

impl Slot {
    pub fn new(
        venue_id: Uuid,
        date: NaiveDate,
        start_time: NaiveTime,
        end_time: NaiveTime,
        custom_price: Option<i32>,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            venue_id,
            date,
            start_time,
            end_time,
            custom_price,
            status: SlotStatus::Available,
            held_by: None,
            hold_booking: None,
            hold_expires_at: None,
        }
    }

    /// Price charged for this slot given the venue's base price
    pub fn effective_price(&self, venue_base_price: i32) -> i32 {
        self.custom_price.unwrap_or(venue_base_price)
    }

    pub fn is_available(&self) -> bool {
        self.status == SlotStatus::Available
    }

    /// The slot's scheduled start as a UTC instant
    pub fn starts_at(&self) -> DateTime<Utc> {
        self.date.and_time(self.start_time).and_utc()
    }

    /// Place a hold for a pending booking
    pub fn hold(&mut self, customer_id: Uuid, booking_id: Uuid, expires_at: DateTime<Utc>) {
        self.status = SlotStatus::Held;
        self.held_by = Some(customer_id);
        self.hold_booking = Some(booking_id);
        self.hold_expires_at = Some(expires_at);
    }

    /// Commit the slot to a booking
    pub fn book(&mut self, booking_id: Uuid) {
        self.status = SlotStatus::Booked;
        self.hold_booking = Some(booking_id);
        self.hold_expires_at = None;
    }

    /// Return the slot to the open pool, clearing hold bookkeeping
    pub fn release(&mut self) {
        self.status = SlotStatus::Available;
        self.held_by = None;
        self.hold_booking = None;
        self.hold_expires_at = None;
    }

    /// Permanently withdraw the slot from sale
    pub fn retire(&mut self) {
        self.status = SlotStatus::Cancelled;
        self.held_by = None;
        self.hold_booking = None;
        self.hold_expires_at = None;
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlannerConfig {
    /// A trailing partial slot shorter than this many minutes is dropped
    pub min_partial_minutes: u32,

    /// Upper bound on slots produced by one generation request
    pub max_slots_per_day: usize,
}

impl Default for PlannerConfig {
    fn default() -> Self {
        Self {
            min_partial_minutes: 30,
            max_slots_per_day: 100,
        }
    }
}

const MINUTES_PER_DAY: u32 = 24 * 60;

/// Lays out the ordered, non-overlapping slot set for one venue and date
pub struct SlotPlanner {
    config: PlannerConfig,
}

impl SlotPlanner {
    pub fn new(config: PlannerConfig) -> Self {
        Self { config }
    }

    /// Plan the slots covering `[start, end)` in `duration_minutes` steps.
    /// Pure: callers persist the result into the availability index.
    pub fn plan_slots(
        &self,
        venue_id: Uuid,
        date: NaiveDate,
        start: NaiveTime,
        end: NaiveTime,
        duration_minutes: u32,
        custom_price: Option<i32>,
    ) -> Result<Vec<Slot>, SlotError> {
        // Durations are bounded before the layout loop so the minute cursor
        // below cannot overflow.
        if duration_minutes == 0 || duration_minutes > MINUTES_PER_DAY {
            return Err(SlotError::InvalidDuration(duration_minutes));
        }
        if start >= end {
            return Err(SlotError::InvalidWindow { start, end });
        }

        // Work in minutes from midnight so arithmetic cannot wrap a NaiveTime
        // past midnight.
        let start_min = start.num_seconds_from_midnight() / 60;
        let end_min = end.num_seconds_from_midnight() / 60;

        let mut slots = Vec::new();
        let mut cursor = start_min;

        while cursor + duration_minutes <= end_min {
            slots.push(self.slot_at(venue_id, date, cursor, cursor + duration_minutes, custom_price));
            cursor += duration_minutes;
        }

        // Trailing partial slot: kept when it meets the configured minimum
        if cursor < end_min && end_min - cursor >= self.config.min_partial_minutes {
            slots.push(self.slot_at(venue_id, date, cursor, end_min, custom_price));
        }

        if slots.len() > self.config.max_slots_per_day {
            return Err(SlotError::TooManySlots {
                requested: slots.len(),
                cap: self.config.max_slots_per_day,
            });
        }

        Ok(slots)
    }

    fn slot_at(
        &self,
        venue_id: Uuid,
        date: NaiveDate,
        from_min: u32,
        to_min: u32,
        custom_price: Option<i32>,
    ) -> Slot {
        Slot::new(
            venue_id,
            date,
            minutes_to_time(from_min),
            minutes_to_time(to_min),
            custom_price,
        )
    }
}

impl Default for SlotPlanner {
    fn default() -> Self {
        Self::new(PlannerConfig::default())
    }
}

fn minutes_to_time(minutes: u32) -> NaiveTime {
    // Callers only pass values inside a single day, and 24:00 cannot occur
    // because the window end is itself a parsed NaiveTime.
    NaiveTime::from_hms_opt(minutes / 60, minutes % 60, 0)
        .unwrap_or(NaiveTime::MIN)
}

#[derive(Debug, thiserror::Error)]
pub enum SlotError {
    #[error("Invalid time window: start {start} is not before end {end}")]
    InvalidWindow { start: NaiveTime, end: NaiveTime },

    #[error("Slot duration must be between 1 and 1440 minutes, got {0}")]
    InvalidDuration(u32),

    #[error("Window yields {requested} slots, cap is {cap}")]
    TooManySlots { requested: usize, cap: usize },
}
