use serde::{Deserialize, Serialize};
use uuid::Uuid;
use chrono::{DateTime, Utc};
use rand::{distributions::Alphanumeric, Rng};
use pitchside_shared::pii::Masked;

/// Booking status in the lifecycle
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum BookingStatus {
    Pending,
    Confirmed,
    Cancelled,
}

/// Who the slot is reserved for
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "kind", rename_all = "SCREAMING_SNAKE_CASE", rename_all_fields = "camelCase")]
pub enum Customer {
    Registered { account_id: Uuid },
    WalkIn { name: String, phone: Masked<String> },
}

impl Customer {
    /// Account id when the customer is a registered user
    pub fn account_id(&self) -> Option<Uuid> {
        match self {
            Customer::Registered { account_id } => Some(*account_id),
            Customer::WalkIn { .. } => None,
        }
    }
}

/// The record of one slot reservation. A slot has at most one booking in
/// Pending or Confirmed at any time.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Booking {
    pub id: Uuid,
    pub slot_id: Uuid,
    pub venue_id: Uuid,
    pub customer: Customer,
    /// Amount charged in minor currency units
    pub amount: i32,
    pub status: BookingStatus,
    /// Short human-readable code handed to the customer at check-in
    pub reference: String,
    pub created_at: DateTime<Utc>,
    pub expires_at: Option<DateTime<Utc>>,
    pub confirmed_at: Option<DateTime<Utc>>,
    pub cancelled_at: Option<DateTime<Utc>>,
}

impl Booking {
    /// Create a Pending booking holding a slot until `expires_at`
    pub fn pending(
        slot_id: Uuid,
        venue_id: Uuid,
        customer: Customer,
        amount: i32,
        expires_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            slot_id,
            venue_id,
            customer,
            amount,
            status: BookingStatus::Pending,
            reference: new_reference(),
            created_at: Utc::now(),
            expires_at: Some(expires_at),
            confirmed_at: None,
            cancelled_at: None,
        }
    }

    /// Create an owner-confirmed walk-in booking, already Confirmed
    pub fn walk_in(
        slot_id: Uuid,
        venue_id: Uuid,
        customer_name: String,
        customer_phone: String,
        amount: i32,
    ) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            slot_id,
            venue_id,
            customer: Customer::WalkIn {
                name: customer_name,
                phone: Masked(customer_phone),
            },
            amount,
            status: BookingStatus::Confirmed,
            reference: new_reference(),
            created_at: now,
            expires_at: None,
            confirmed_at: Some(now),
            cancelled_at: None,
        }
    }

    /// Mark the booking Confirmed
    pub fn confirm(&mut self) {
        self.status = BookingStatus::Confirmed;
        self.confirmed_at = Some(Utc::now());
        self.expires_at = None;
    }

    /// Mark the booking Cancelled
    pub fn cancel(&mut self) {
        self.status = BookingStatus::Cancelled;
        self.cancelled_at = Some(Utc::now());
    }

    /// Pending and Confirmed bookings count against the slot
    pub fn is_active(&self) -> bool {
        matches!(self.status, BookingStatus::Pending | BookingStatus::Confirmed)
    }
}

fn new_reference() -> String {
    let suffix: String = rand::thread_rng()
        .sample_iter(&Alphanumeric)
        .take(8)
        .map(char::from)
        .collect();
    format!("PB-{}", suffix.to_uppercase())
}
