use std::collections::HashMap;
use std::sync::Mutex;

use chrono::Utc;
use uuid::Uuid;

use pitchside_shared::models::events::{BookingEvent, BookingEventKind, LedgerSink};

use crate::models::Booking;

struct LedgerState {
    next_seq: u64,
    events: Vec<BookingEvent>,
    by_booking: HashMap<Uuid, Vec<usize>>,
}

/// Append-only log of booking transitions. Every append receives a globally
/// unique, monotonically increasing sequence number; corrections are new
/// events, never edits.
pub struct BookingLedger {
    state: Mutex<LedgerState>,
    sink: Option<Box<dyn LedgerSink>>,
}

impl BookingLedger {
    pub fn new() -> Self {
        Self::with_sink(None)
    }

    /// Ledger that also writes every record to a durable sink
    pub fn with_sink(sink: Option<Box<dyn LedgerSink>>) -> Self {
        Self {
            state: Mutex::new(LedgerState {
                next_seq: 1,
                events: Vec::new(),
                by_booking: HashMap::new(),
            }),
            sink,
        }
    }

    /// Record one transition. Callers invoke this inside the slot partition
    /// critical section, so ledger order matches transition order.
    pub fn append(
        &self,
        kind: BookingEventKind,
        booking: &Booking,
        actor: &str,
        note: Option<String>,
    ) -> BookingEvent {
        let mut state = self.state.lock().unwrap();

        let event = BookingEvent {
            seq: state.next_seq,
            booking_id: booking.id,
            slot_id: booking.slot_id,
            venue_id: booking.venue_id,
            kind,
            actor: actor.to_string(),
            amount: booking.amount,
            note,
            recorded_at: Utc::now(),
        };
        state.next_seq += 1;

        if let Some(sink) = &self.sink {
            if let Err(e) = sink.record(&event) {
                tracing::error!("Failed to persist ledger event {}: {}", event.seq, e);
            }
        }

        let idx = state.events.len();
        state.events.push(event.clone());
        state.by_booking.entry(booking.id).or_default().push(idx);

        event
    }

    /// Events for one booking, in append order
    pub fn history(&self, booking_id: &Uuid) -> Vec<BookingEvent> {
        let state = self.state.lock().unwrap();
        match state.by_booking.get(booking_id) {
            Some(indexes) => indexes.iter().map(|&i| state.events[i].clone()).collect(),
            None => Vec::new(),
        }
    }

    /// Total number of recorded events
    pub fn len(&self) -> usize {
        self.state.lock().unwrap().events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Default for BookingLedger {
    fn default() -> Self {
        Self::new()
    }
}
