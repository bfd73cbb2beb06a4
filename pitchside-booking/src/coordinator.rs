use std::collections::HashMap;
use std::sync::{Arc, Mutex, Weak};
use std::time::Duration;

use chrono::Utc;
use uuid::Uuid;

use pitchside_catalog::availability::AvailabilityIndex;
use pitchside_catalog::slots::Slot;
use pitchside_catalog::venue::{Venue, VenueDirectory};
use pitchside_shared::models::events::BookingEventKind;

use crate::expiry::HoldTimers;
use crate::ledger::BookingLedger;
use crate::models::{Booking, BookingStatus, Customer};

/// The single shared-mutation point for reservations.
///
/// Every transition runs inside `AvailabilityIndex::with_slot_mut`, so the
/// check-and-set on one slot and the matching booking mutation commit
/// together or not at all. Lock order is always partition → bookings map →
/// ledger, and no lock is held across an await.
pub struct ReservationCoordinator {
    index: Arc<AvailabilityIndex>,
    venues: Arc<VenueDirectory>,
    ledger: Arc<BookingLedger>,
    bookings: Mutex<HashMap<Uuid, Booking>>,
    timers: HoldTimers,
    hold_seconds: u64,
    self_ref: Weak<ReservationCoordinator>,
}

impl ReservationCoordinator {
    pub fn new(
        index: Arc<AvailabilityIndex>,
        venues: Arc<VenueDirectory>,
        ledger: Arc<BookingLedger>,
        hold_seconds: u64,
    ) -> Arc<Self> {
        Arc::new_cyclic(|self_ref| Self {
            index,
            venues,
            ledger,
            bookings: Mutex::new(HashMap::new()),
            timers: HoldTimers::new(),
            hold_seconds,
            self_ref: self_ref.clone(),
        })
    }

    /// Place a hold on an available slot and open a Pending booking.
    ///
    /// Of N concurrent calls on one slot, exactly one wins; the rest fail
    /// with `SlotUnavailable`. The caller's quoted amount must match the
    /// slot's current effective price.
    pub fn initiate(
        &self,
        customer_id: Uuid,
        slot_id: Uuid,
        expected_amount: i32,
    ) -> Result<Booking, ReservationError> {
        let venue = self.venue_for_slot(&slot_id)?;
        let hold = chrono::Duration::seconds(self.hold_seconds as i64);

        let booking = self
            .index
            .with_slot_mut(&slot_id, |slot| {
                if !slot.is_available() {
                    return Err(ReservationError::SlotUnavailable(slot_id));
                }

                let price = slot.effective_price(venue.base_price);
                if expected_amount != price {
                    return Err(ReservationError::AmountMismatch {
                        expected: expected_amount,
                        actual: price,
                    });
                }

                let expires_at = Utc::now() + hold;
                let booking = Booking::pending(
                    slot_id,
                    slot.venue_id,
                    Customer::Registered { account_id: customer_id },
                    price,
                    expires_at,
                );
                slot.hold(customer_id, booking.id, expires_at);

                self.bookings
                    .lock()
                    .unwrap()
                    .insert(booking.id, booking.clone());
                self.ledger.append(
                    BookingEventKind::Initiated,
                    &booking,
                    &customer_id.to_string(),
                    None,
                );

                Ok(booking)
            })
            .map_err(|_| ReservationError::SlotNotFound(slot_id))??;

        self.schedule_expiry(booking.id);
        tracing::debug!("Booking {} holds slot {}", booking.id, slot_id);
        Ok(booking)
    }

    /// Confirm a Pending booking, committing the slot to Booked.
    /// Permitted to the booking's customer or the venue owner.
    pub fn confirm(&self, booking_id: &Uuid, actor_id: Uuid) -> Result<Booking, ReservationError> {
        let (current, venue) = self.booking_with_venue(booking_id)?;
        authorize_actor(&current, &venue, actor_id)?;

        let confirmed = self
            .index
            .with_slot_mut(&current.slot_id, |slot| {
                let mut bookings = self.bookings.lock().unwrap();
                let booking = bookings
                    .get_mut(booking_id)
                    .ok_or(ReservationError::BookingNotFound(*booking_id))?;

                if booking.status != BookingStatus::Pending {
                    return Err(invalid_state(&booking.status, "Confirmed"));
                }

                booking.confirm();
                slot.book(booking.id);
                let confirmed = booking.clone();
                drop(bookings);

                self.ledger.append(
                    BookingEventKind::Confirmed,
                    &confirmed,
                    &actor_id.to_string(),
                    None,
                );
                Ok(confirmed)
            })
            .map_err(|_| ReservationError::SlotNotFound(current.slot_id))??;

        self.timers.abort(booking_id);
        tracing::debug!("Booking {} confirmed", booking_id);
        Ok(confirmed)
    }

    /// Owner shortcut for an in-person customer: Available → Booked in one
    /// step, skipping the hold. Same one-winner discipline as `initiate`.
    pub fn walk_in_book(
        &self,
        owner_id: Uuid,
        slot_id: Uuid,
        customer_name: String,
        customer_phone: String,
    ) -> Result<Booking, ReservationError> {
        let venue = self.venue_for_slot(&slot_id)?;
        if venue.owner_id != owner_id {
            return Err(ReservationError::Forbidden);
        }

        let note = Some(format!("walk-in customer: {}", customer_name));

        self.index
            .with_slot_mut(&slot_id, |slot| {
                if !slot.is_available() {
                    return Err(ReservationError::SlotUnavailable(slot_id));
                }

                let amount = slot.effective_price(venue.base_price);
                let booking =
                    Booking::walk_in(slot_id, venue.id, customer_name, customer_phone, amount);
                slot.book(booking.id);

                self.bookings
                    .lock()
                    .unwrap()
                    .insert(booking.id, booking.clone());
                self.ledger.append(
                    BookingEventKind::WalkInBooked,
                    &booking,
                    &owner_id.to_string(),
                    note,
                );

                Ok(booking)
            })
            .map_err(|_| ReservationError::SlotNotFound(slot_id))?
    }

    /// Cancel a Pending or Confirmed booking and release its slot.
    /// Permitted to the booking's customer or the venue owner, and only
    /// while the slot's scheduled start is still in the future.
    pub fn cancel(&self, booking_id: &Uuid, actor_id: Uuid) -> Result<Booking, ReservationError> {
        let (current, venue) = self.booking_with_venue(booking_id)?;
        authorize_actor(&current, &venue, actor_id)?;

        let cancelled = self
            .index
            .with_slot_mut(&current.slot_id, |slot| {
                let mut bookings = self.bookings.lock().unwrap();
                let booking = bookings
                    .get_mut(booking_id)
                    .ok_or(ReservationError::BookingNotFound(*booking_id))?;

                if booking.status == BookingStatus::Cancelled {
                    return Err(invalid_state(&booking.status, "Cancelled"));
                }
                if Utc::now() >= slot.starts_at() {
                    return Err(ReservationError::TooLateToCancel(*booking_id));
                }

                // The booking leaves the active set before the slot reopens,
                // keeping the one-active-booking invariant observable at
                // every point.
                booking.cancel();
                let cancelled = booking.clone();
                drop(bookings);

                if slot.hold_booking == Some(*booking_id) {
                    slot.release();
                }

                self.ledger.append(
                    BookingEventKind::Cancelled,
                    &cancelled,
                    &actor_id.to_string(),
                    None,
                );
                Ok(cancelled)
            })
            .map_err(|_| ReservationError::SlotNotFound(current.slot_id))??;

        self.timers.abort(booking_id);
        tracing::debug!("Booking {} cancelled, slot {} released", booking_id, current.slot_id);
        Ok(cancelled)
    }

    /// Timer path: release a hold whose window elapsed. Goes through the
    /// same partition-locked transition as `confirm`, so the two serialize
    /// and exactly one wins.
    pub fn expire_hold(&self, booking_id: &Uuid) {
        self.timers.forget(booking_id);

        let slot_id = {
            let bookings = self.bookings.lock().unwrap();
            match bookings.get(booking_id) {
                Some(booking) if booking.status == BookingStatus::Pending => booking.slot_id,
                _ => return,
            }
        };

        let expired = self.index.with_slot_mut(&slot_id, |slot| {
            let mut bookings = self.bookings.lock().unwrap();
            let Some(booking) = bookings.get_mut(booking_id) else {
                return false;
            };
            if booking.status != BookingStatus::Pending {
                // A concurrent confirm won the race.
                return false;
            }

            booking.cancel();
            let cancelled = booking.clone();
            drop(bookings);

            if slot.hold_booking == Some(*booking_id) {
                slot.release();
            }

            self.ledger.append(
                BookingEventKind::HoldExpired,
                &cancelled,
                "system",
                Some("hold window elapsed".to_string()),
            );
            true
        });

        if let Ok(true) = expired {
            tracing::info!("Hold expired for booking {}, slot {} released", booking_id, slot_id);
        }
    }

    /// Withdraw an available slot from sale (owner only). Slots are never
    /// deleted, only marked Cancelled.
    pub fn retire_slot(&self, owner_id: Uuid, slot_id: Uuid) -> Result<Slot, ReservationError> {
        let venue = self.venue_for_slot(&slot_id)?;
        if venue.owner_id != owner_id {
            return Err(ReservationError::Forbidden);
        }

        self.index
            .with_slot_mut(&slot_id, |slot| {
                if !slot.is_available() {
                    return Err(ReservationError::SlotUnavailable(slot_id));
                }
                slot.retire();
                Ok(slot.clone())
            })
            .map_err(|_| ReservationError::SlotNotFound(slot_id))?
    }

    /// Get one booking
    pub fn booking(&self, booking_id: &Uuid) -> Option<Booking> {
        self.bookings.lock().unwrap().get(booking_id).cloned()
    }

    /// A customer's bookings, most recent first
    pub fn bookings_for_customer(&self, account_id: &Uuid) -> Vec<Booking> {
        let bookings = self.bookings.lock().unwrap();
        let mut result: Vec<Booking> = bookings
            .values()
            .filter(|b| b.customer.account_id() == Some(*account_id))
            .cloned()
            .collect();
        result.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        result
    }

    /// Count of Pending/Confirmed bookings referencing one slot
    pub fn active_booking_count(&self, slot_id: &Uuid) -> usize {
        let bookings = self.bookings.lock().unwrap();
        bookings
            .values()
            .filter(|b| b.slot_id == *slot_id && b.is_active())
            .count()
    }

    /// Number of hold timers currently tracked
    pub fn active_holds(&self) -> usize {
        self.timers.active()
    }

    fn schedule_expiry(&self, booking_id: Uuid) {
        let Some(coordinator) = self.self_ref.upgrade() else {
            return;
        };
        let delay = Duration::from_secs(self.hold_seconds);
        let handle = tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            coordinator.expire_hold(&booking_id);
        });
        self.timers.track(booking_id, handle);
    }

    fn venue_for_slot(&self, slot_id: &Uuid) -> Result<Venue, ReservationError> {
        let slot = self
            .index
            .get(slot_id)
            .ok_or(ReservationError::SlotNotFound(*slot_id))?;
        self.venues
            .get(&slot.venue_id)
            .ok_or(ReservationError::VenueNotFound(slot.venue_id))
    }

    fn booking_with_venue(&self, booking_id: &Uuid) -> Result<(Booking, Venue), ReservationError> {
        let booking = self
            .booking(booking_id)
            .ok_or(ReservationError::BookingNotFound(*booking_id))?;
        let venue = self
            .venues
            .get(&booking.venue_id)
            .ok_or(ReservationError::VenueNotFound(booking.venue_id))?;
        Ok((booking, venue))
    }
}

fn authorize_actor(booking: &Booking, venue: &Venue, actor_id: Uuid) -> Result<(), ReservationError> {
    let is_customer = booking.customer.account_id() == Some(actor_id);
    if is_customer || venue.owner_id == actor_id {
        Ok(())
    } else {
        Err(ReservationError::Forbidden)
    }
}

fn invalid_state(from: &BookingStatus, to: &str) -> ReservationError {
    ReservationError::InvalidState {
        from: format!("{:?}", from),
        to: to.to_string(),
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ReservationError {
    #[error("Slot not found: {0}")]
    SlotNotFound(Uuid),

    #[error("Venue not found: {0}")]
    VenueNotFound(Uuid),

    #[error("Booking not found: {0}")]
    BookingNotFound(Uuid),

    #[error("Slot is not available: {0}")]
    SlotUnavailable(Uuid),

    #[error("Amount mismatch: expected {expected}, current price is {actual}")]
    AmountMismatch { expected: i32, actual: i32 },

    #[error("Invalid state transition from {from} to {to}")]
    InvalidState { from: String, to: String },

    #[error("Too late to cancel booking {0}: the slot has already started")]
    TooLateToCancel(Uuid),

    #[error("Actor is not permitted to perform this operation")]
    Forbidden,
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{NaiveDate, NaiveTime};
    use futures_util::future::join_all;
    use pitchside_catalog::slots::{SlotPlanner, SlotStatus};
    use pitchside_catalog::venue::ActivityType;

    const HOLD_SECONDS: u64 = 900;
    const BASE_PRICE: i32 = 50000;

    struct World {
        coordinator: Arc<ReservationCoordinator>,
        index: Arc<AvailabilityIndex>,
        ledger: Arc<BookingLedger>,
        owner_id: Uuid,
        slots: Vec<Slot>,
    }

    fn t(h: u32, m: u32) -> NaiveTime {
        NaiveTime::from_hms_opt(h, m, 0).unwrap()
    }

    fn future_date() -> NaiveDate {
        Utc::now().date_naive() + chrono::Duration::days(7)
    }

    fn past_date() -> NaiveDate {
        Utc::now().date_naive() - chrono::Duration::days(1)
    }

    fn build_world(date: NaiveDate) -> World {
        let index = Arc::new(AvailabilityIndex::new());
        let venues = Arc::new(VenueDirectory::new());
        let ledger = Arc::new(BookingLedger::new());

        let owner_id = Uuid::new_v4();
        let venue = venues.register(Venue::new(
            owner_id,
            "Riverside Turf".to_string(),
            "Chennai".to_string(),
            None,
            BASE_PRICE,
            vec![ActivityType::Football],
        ));

        let slots = SlotPlanner::default()
            .plan_slots(venue.id, date, t(10, 0), t(14, 0), 60, None)
            .unwrap();
        index.insert_day(venue.id, date, slots.clone()).unwrap();

        let coordinator = ReservationCoordinator::new(
            index.clone(),
            venues.clone(),
            ledger.clone(),
            HOLD_SECONDS,
        );

        World {
            coordinator,
            index,
            ledger,
            owner_id,
            slots,
        }
    }

    #[tokio::test]
    async fn test_initiate_places_hold() {
        let world = build_world(future_date());
        let customer = Uuid::new_v4();
        let slot_id = world.slots[0].id;

        let booking = world
            .coordinator
            .initiate(customer, slot_id, BASE_PRICE)
            .unwrap();

        assert_eq!(booking.status, BookingStatus::Pending);
        assert_eq!(booking.amount, BASE_PRICE);
        assert!(booking.expires_at.is_some());

        let slot = world.index.get(&slot_id).unwrap();
        assert_eq!(slot.status, SlotStatus::Held);
        assert_eq!(slot.hold_booking, Some(booking.id));
        assert_eq!(slot.held_by, Some(customer));
        assert_eq!(world.coordinator.active_holds(), 1);
    }

    #[tokio::test]
    async fn test_initiate_rejects_stale_amount() {
        let world = build_world(future_date());
        let slot_id = world.slots[0].id;

        let result = world
            .coordinator
            .initiate(Uuid::new_v4(), slot_id, BASE_PRICE - 1000);

        assert!(matches!(
            result,
            Err(ReservationError::AmountMismatch {
                expected: 49000,
                actual: 50000
            })
        ));
        // The failed attempt must not disturb the slot
        assert_eq!(
            world.index.get(&slot_id).unwrap().status,
            SlotStatus::Available
        );
    }

    #[tokio::test]
    async fn test_initiate_unknown_slot() {
        let world = build_world(future_date());
        let result = world
            .coordinator
            .initiate(Uuid::new_v4(), Uuid::new_v4(), BASE_PRICE);
        assert!(matches!(result, Err(ReservationError::SlotNotFound(_))));
    }

    #[tokio::test]
    async fn test_second_initiate_loses() {
        let world = build_world(future_date());
        let slot_id = world.slots[0].id;

        world
            .coordinator
            .initiate(Uuid::new_v4(), slot_id, BASE_PRICE)
            .unwrap();
        let second = world.coordinator.initiate(Uuid::new_v4(), slot_id, BASE_PRICE);

        assert!(matches!(second, Err(ReservationError::SlotUnavailable(_))));
        assert_eq!(world.coordinator.active_booking_count(&slot_id), 1);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_initiates_have_one_winner() {
        let world = build_world(future_date());
        let slot_id = world.slots[0].id;

        let tasks: Vec<_> = (0..16)
            .map(|_| {
                let coordinator = world.coordinator.clone();
                tokio::spawn(async move { coordinator.initiate(Uuid::new_v4(), slot_id, BASE_PRICE) })
            })
            .collect();

        let results: Vec<_> = join_all(tasks)
            .await
            .into_iter()
            .map(|joined| joined.unwrap())
            .collect();

        let winners = results.iter().filter(|r| r.is_ok()).count();
        let losers = results
            .iter()
            .filter(|r| matches!(r, Err(ReservationError::SlotUnavailable(_))))
            .count();

        assert_eq!(winners, 1);
        assert_eq!(losers, 15);
        assert_eq!(world.coordinator.active_booking_count(&slot_id), 1);
        assert_eq!(
            world.index.get(&slot_id).unwrap().status,
            SlotStatus::Held
        );
    }

    #[tokio::test]
    async fn test_confirm_books_slot_and_stops_timer() {
        let world = build_world(future_date());
        let customer = Uuid::new_v4();
        let slot_id = world.slots[0].id;

        let booking = world
            .coordinator
            .initiate(customer, slot_id, BASE_PRICE)
            .unwrap();
        let confirmed = world.coordinator.confirm(&booking.id, customer).unwrap();

        assert_eq!(confirmed.status, BookingStatus::Confirmed);
        assert!(confirmed.confirmed_at.is_some());
        assert_eq!(
            world.index.get(&slot_id).unwrap().status,
            SlotStatus::Booked
        );
        assert_eq!(world.coordinator.active_holds(), 0);

        // Confirming twice is an invalid transition
        let again = world.coordinator.confirm(&booking.id, customer);
        assert!(matches!(again, Err(ReservationError::InvalidState { .. })));
    }

    #[tokio::test]
    async fn test_confirm_permitted_to_venue_owner() {
        let world = build_world(future_date());
        let customer = Uuid::new_v4();
        let slot_id = world.slots[0].id;

        let booking = world
            .coordinator
            .initiate(customer, slot_id, BASE_PRICE)
            .unwrap();
        let confirmed = world.coordinator.confirm(&booking.id, world.owner_id).unwrap();
        assert_eq!(confirmed.status, BookingStatus::Confirmed);
    }

    #[tokio::test]
    async fn test_confirm_by_stranger_forbidden() {
        let world = build_world(future_date());
        let slot_id = world.slots[0].id;

        let booking = world
            .coordinator
            .initiate(Uuid::new_v4(), slot_id, BASE_PRICE)
            .unwrap();
        let result = world.coordinator.confirm(&booking.id, Uuid::new_v4());

        assert!(matches!(result, Err(ReservationError::Forbidden)));
        assert_eq!(world.index.get(&slot_id).unwrap().status, SlotStatus::Held);
    }

    #[tokio::test(start_paused = true)]
    async fn test_unconfirmed_hold_expires() {
        let world = build_world(future_date());
        let slot_id = world.slots[0].id;

        let booking = world
            .coordinator
            .initiate(Uuid::new_v4(), slot_id, BASE_PRICE)
            .unwrap();

        // Poll the spawned expiry timer once so its sleep registers before
        // the paused clock moves.
        tokio::task::yield_now().await;

        tokio::time::advance(Duration::from_secs(HOLD_SECONDS + 1)).await;
        for _ in 0..4 {
            tokio::task::yield_now().await;
        }

        let expired = world.coordinator.booking(&booking.id).unwrap();
        assert_eq!(expired.status, BookingStatus::Cancelled);
        assert_eq!(
            world.index.get(&slot_id).unwrap().status,
            SlotStatus::Available
        );
        assert_eq!(world.coordinator.active_holds(), 0);

        let kinds: Vec<_> = world
            .ledger
            .history(&booking.id)
            .iter()
            .map(|e| e.kind.clone())
            .collect();
        assert_eq!(
            kinds,
            vec![BookingEventKind::Initiated, BookingEventKind::HoldExpired]
        );

        // The slot is claimable again
        assert!(world
            .coordinator
            .initiate(Uuid::new_v4(), slot_id, BASE_PRICE)
            .is_ok());
    }

    #[tokio::test(start_paused = true)]
    async fn test_confirm_after_expiry_is_invalid() {
        let world = build_world(future_date());
        let customer = Uuid::new_v4();
        let slot_id = world.slots[0].id;

        let booking = world
            .coordinator
            .initiate(customer, slot_id, BASE_PRICE)
            .unwrap();

        // Poll the spawned expiry timer once so its sleep registers before
        // the paused clock moves.
        tokio::task::yield_now().await;

        tokio::time::advance(Duration::from_secs(HOLD_SECONDS + 1)).await;
        for _ in 0..4 {
            tokio::task::yield_now().await;
        }

        let result = world.coordinator.confirm(&booking.id, customer);
        assert!(matches!(result, Err(ReservationError::InvalidState { .. })));
        assert_eq!(
            world.index.get(&slot_id).unwrap().status,
            SlotStatus::Available
        );
    }

    #[tokio::test]
    async fn test_late_expiry_after_confirm_is_noop() {
        let world = build_world(future_date());
        let customer = Uuid::new_v4();
        let slot_id = world.slots[0].id;

        let booking = world
            .coordinator
            .initiate(customer, slot_id, BASE_PRICE)
            .unwrap();
        world.coordinator.confirm(&booking.id, customer).unwrap();

        // A timer that lost the abort race still fires; it must find the
        // confirmed booking and stand down.
        world.coordinator.expire_hold(&booking.id);

        let unchanged = world.coordinator.booking(&booking.id).unwrap();
        assert_eq!(unchanged.status, BookingStatus::Confirmed);
        assert_eq!(
            world.index.get(&slot_id).unwrap().status,
            SlotStatus::Booked
        );
        assert!(world
            .ledger
            .history(&booking.id)
            .iter()
            .all(|e| e.kind != BookingEventKind::HoldExpired));
    }

    #[tokio::test]
    async fn test_walk_in_books_directly() {
        let world = build_world(future_date());
        let slot_id = world.slots[1].id;

        let booking = world
            .coordinator
            .walk_in_book(
                world.owner_id,
                slot_id,
                "Ravi Kumar".to_string(),
                "07700900123".to_string(),
            )
            .unwrap();

        assert_eq!(booking.status, BookingStatus::Confirmed);
        assert_eq!(booking.amount, BASE_PRICE);
        assert_eq!(
            world.index.get(&slot_id).unwrap().status,
            SlotStatus::Booked
        );
        assert_eq!(world.coordinator.active_holds(), 0);

        let kinds: Vec<_> = world
            .ledger
            .history(&booking.id)
            .iter()
            .map(|e| e.kind.clone())
            .collect();
        assert_eq!(kinds, vec![BookingEventKind::WalkInBooked]);
    }

    #[tokio::test]
    async fn test_walk_in_requires_venue_owner() {
        let world = build_world(future_date());
        let slot_id = world.slots[1].id;

        let result = world.coordinator.walk_in_book(
            Uuid::new_v4(),
            slot_id,
            "Ravi Kumar".to_string(),
            "07700900123".to_string(),
        );

        assert!(matches!(result, Err(ReservationError::Forbidden)));
        assert_eq!(
            world.index.get(&slot_id).unwrap().status,
            SlotStatus::Available
        );
    }

    #[tokio::test]
    async fn test_walk_in_on_held_slot_loses() {
        let world = build_world(future_date());
        let slot_id = world.slots[0].id;

        world
            .coordinator
            .initiate(Uuid::new_v4(), slot_id, BASE_PRICE)
            .unwrap();
        let result = world.coordinator.walk_in_book(
            world.owner_id,
            slot_id,
            "Ravi Kumar".to_string(),
            "07700900123".to_string(),
        );

        assert!(matches!(result, Err(ReservationError::SlotUnavailable(_))));
        assert_eq!(world.coordinator.active_booking_count(&slot_id), 1);
    }

    #[tokio::test]
    async fn test_cancel_confirmed_releases_slot() {
        let world = build_world(future_date());
        let customer = Uuid::new_v4();
        let slot_id = world.slots[0].id;

        let booking = world
            .coordinator
            .initiate(customer, slot_id, BASE_PRICE)
            .unwrap();
        world.coordinator.confirm(&booking.id, customer).unwrap();

        let cancelled = world.coordinator.cancel(&booking.id, customer).unwrap();
        assert_eq!(cancelled.status, BookingStatus::Cancelled);
        assert!(cancelled.cancelled_at.is_some());
        assert_eq!(
            world.index.get(&slot_id).unwrap().status,
            SlotStatus::Available
        );
        assert_eq!(world.coordinator.active_booking_count(&slot_id), 0);

        // The released slot accepts a fresh booking, and the invariant holds
        world
            .coordinator
            .initiate(Uuid::new_v4(), slot_id, BASE_PRICE)
            .unwrap();
        assert_eq!(world.coordinator.active_booking_count(&slot_id), 1);
    }

    #[tokio::test]
    async fn test_cancel_pending_by_venue_owner() {
        let world = build_world(future_date());
        let slot_id = world.slots[0].id;

        let booking = world
            .coordinator
            .initiate(Uuid::new_v4(), slot_id, BASE_PRICE)
            .unwrap();
        let cancelled = world.coordinator.cancel(&booking.id, world.owner_id).unwrap();

        assert_eq!(cancelled.status, BookingStatus::Cancelled);
        assert_eq!(world.coordinator.active_holds(), 0);
        assert_eq!(
            world.index.get(&slot_id).unwrap().status,
            SlotStatus::Available
        );
    }

    #[tokio::test]
    async fn test_cancel_by_stranger_forbidden() {
        let world = build_world(future_date());
        let slot_id = world.slots[0].id;

        let booking = world
            .coordinator
            .initiate(Uuid::new_v4(), slot_id, BASE_PRICE)
            .unwrap();
        let result = world.coordinator.cancel(&booking.id, Uuid::new_v4());
        assert!(matches!(result, Err(ReservationError::Forbidden)));
    }

    #[tokio::test]
    async fn test_cancel_after_slot_start_rejected() {
        let world = build_world(past_date());
        let slot_id = world.slots[0].id;

        let booking = world
            .coordinator
            .walk_in_book(
                world.owner_id,
                slot_id,
                "Ravi Kumar".to_string(),
                "07700900123".to_string(),
            )
            .unwrap();

        let result = world.coordinator.cancel(&booking.id, world.owner_id);
        assert!(matches!(result, Err(ReservationError::TooLateToCancel(_))));

        // Nothing was released
        assert_eq!(
            world.index.get(&slot_id).unwrap().status,
            SlotStatus::Booked
        );
        assert_eq!(
            world.coordinator.booking(&booking.id).unwrap().status,
            BookingStatus::Confirmed
        );
    }

    #[tokio::test]
    async fn test_retire_slot_owner_only() {
        let world = build_world(future_date());
        let slot_id = world.slots[2].id;

        let stranger = world.coordinator.retire_slot(Uuid::new_v4(), slot_id);
        assert!(matches!(stranger, Err(ReservationError::Forbidden)));

        let retired = world.coordinator.retire_slot(world.owner_id, slot_id).unwrap();
        assert_eq!(retired.status, SlotStatus::Cancelled);

        // A retired slot cannot be booked or retired again
        let initiate = world.coordinator.initiate(Uuid::new_v4(), slot_id, BASE_PRICE);
        assert!(matches!(initiate, Err(ReservationError::SlotUnavailable(_))));
        let again = world.coordinator.retire_slot(world.owner_id, slot_id);
        assert!(matches!(again, Err(ReservationError::SlotUnavailable(_))));
    }

    #[tokio::test]
    async fn test_ledger_records_full_lifecycle_in_order() {
        let world = build_world(future_date());
        let customer = Uuid::new_v4();
        let slot_id = world.slots[0].id;

        let booking = world
            .coordinator
            .initiate(customer, slot_id, BASE_PRICE)
            .unwrap();
        world.coordinator.confirm(&booking.id, customer).unwrap();
        world.coordinator.cancel(&booking.id, customer).unwrap();

        let history = world.ledger.history(&booking.id);
        let kinds: Vec<_> = history.iter().map(|e| e.kind.clone()).collect();
        assert_eq!(
            kinds,
            vec![
                BookingEventKind::Initiated,
                BookingEventKind::Confirmed,
                BookingEventKind::Cancelled,
            ]
        );
        assert!(history.windows(2).all(|w| w[0].seq < w[1].seq));
        assert_eq!(history[0].actor, customer.to_string());
    }

    #[tokio::test]
    async fn test_bookings_for_customer() {
        let world = build_world(future_date());
        let customer = Uuid::new_v4();

        let first = world
            .coordinator
            .initiate(customer, world.slots[0].id, BASE_PRICE)
            .unwrap();
        let second = world
            .coordinator
            .initiate(customer, world.slots[1].id, BASE_PRICE)
            .unwrap();
        world
            .coordinator
            .initiate(Uuid::new_v4(), world.slots[2].id, BASE_PRICE)
            .unwrap();

        let mine = world.coordinator.bookings_for_customer(&customer);
        assert_eq!(mine.len(), 2);
        let ids: Vec<_> = mine.iter().map(|b| b.id).collect();
        assert!(ids.contains(&first.id));
        assert!(ids.contains(&second.id));
    }
}
