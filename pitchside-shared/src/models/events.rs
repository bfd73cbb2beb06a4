use chrono::{DateTime, Utc};
use uuid::Uuid;

/// Booking lifecycle transitions recorded by the ledger.
#[derive(Debug, serde::Serialize, serde::Deserialize, Clone, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum BookingEventKind {
    Initiated,
    Confirmed,
    WalkInBooked,
    Cancelled,
    HoldExpired,
}

/// One append-only ledger record. `seq` is assigned by the ledger at
/// append time and is unique and monotonically increasing across all
/// bookings.
#[derive(Debug, serde::Serialize, serde::Deserialize, Clone)]
pub struct BookingEvent {
    pub seq: u64,
    pub booking_id: Uuid,
    pub slot_id: Uuid,
    pub venue_id: Uuid,
    pub kind: BookingEventKind,
    pub actor: String,
    pub amount: i32,
    pub note: Option<String>,
    pub recorded_at: DateTime<Utc>,
}

/// Durable destination for ledger records. Implementations must be safe to
/// call from inside a lock, so no async IO here.
pub trait LedgerSink: Send + Sync {
    fn record(&self, event: &BookingEvent) -> std::io::Result<()>;
}
