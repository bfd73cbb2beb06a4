use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use chrono::{NaiveDate, NaiveTime};
use uuid::Uuid;

use crate::slots::Slot;

type PartitionKey = (Uuid, NaiveDate);

struct Directory {
    partitions: HashMap<PartitionKey, Arc<RwLock<Vec<Slot>>>>,
    slot_index: HashMap<Uuid, PartitionKey>,
}

/// The arena owning every slot record, partitioned by (venue, date).
///
/// All state transitions on one partition serialize behind its write lock,
/// which is what makes the coordinator's check-and-set atomic; different
/// partitions proceed in parallel. Readers share the same locks, so a slot
/// listed as available is never already booked.
pub struct AvailabilityIndex {
    inner: RwLock<Directory>,
}

impl AvailabilityIndex {
    pub fn new() -> Self {
        Self {
            inner: RwLock::new(Directory {
                partitions: HashMap::new(),
                slot_index: HashMap::new(),
            }),
        }
    }

    /// Persist one day's generated slots. Fails if the venue+date partition
    /// already holds slots; generation is one-shot per day.
    pub fn insert_day(
        &self,
        venue_id: Uuid,
        date: NaiveDate,
        mut slots: Vec<Slot>,
    ) -> Result<(), AvailabilityError> {
        if slots.is_empty() {
            return Ok(());
        }
        slots.sort_by_key(|s| s.start_time);

        let mut inner = self.inner.write().unwrap();

        if let Some(existing) = inner.partitions.get(&(venue_id, date)) {
            let day = existing.read().unwrap();
            if let Some((start, end)) = day_range(&day) {
                return Err(AvailabilityError::AlreadyGenerated {
                    venue_id,
                    date,
                    start,
                    end,
                });
            }
        }

        for slot in &slots {
            inner.slot_index.insert(slot.id, (venue_id, date));
        }
        inner
            .partitions
            .insert((venue_id, date), Arc::new(RwLock::new(slots)));

        Ok(())
    }

    /// List one day's slots ordered by start time
    pub fn list(&self, venue_id: &Uuid, date: NaiveDate) -> Vec<Slot> {
        let partition = {
            let inner = self.inner.read().unwrap();
            inner.partitions.get(&(*venue_id, date)).cloned()
        };

        match partition {
            Some(day) => day.read().unwrap().clone(),
            None => Vec::new(),
        }
    }

    /// Get a snapshot of one slot
    pub fn get(&self, slot_id: &Uuid) -> Option<Slot> {
        let (_, partition) = self.locate(slot_id)?;
        let day = partition.read().unwrap();
        day.iter().find(|s| s.id == *slot_id).cloned()
    }

    /// Run `f` on one slot under its partition write lock. This is the only
    /// mutation entry point; every transition in the system funnels through
    /// it, so transitions on slots of one venue+date are totally ordered.
    pub fn with_slot_mut<T, F>(&self, slot_id: &Uuid, f: F) -> Result<T, AvailabilityError>
    where
        F: FnOnce(&mut Slot) -> T,
    {
        let (_, partition) = self
            .locate(slot_id)
            .ok_or(AvailabilityError::SlotNotFound(*slot_id))?;

        let mut day = partition.write().unwrap();
        let slot = day
            .iter_mut()
            .find(|s| s.id == *slot_id)
            .ok_or(AvailabilityError::SlotNotFound(*slot_id))?;

        Ok(f(slot))
    }

    fn locate(&self, slot_id: &Uuid) -> Option<(PartitionKey, Arc<RwLock<Vec<Slot>>>)> {
        let inner = self.inner.read().unwrap();
        let key = *inner.slot_index.get(slot_id)?;
        let partition = inner.partitions.get(&key)?.clone();
        Some((key, partition))
    }
}

impl Default for AvailabilityIndex {
    fn default() -> Self {
        Self::new()
    }
}

fn day_range(slots: &[Slot]) -> Option<(NaiveTime, NaiveTime)> {
    let first = slots.first()?;
    let last = slots.last()?;
    Some((first.start_time, last.end_time))
}

#[derive(Debug, thiserror::Error)]
pub enum AvailabilityError {
    #[error("Slot not found: {0}")]
    SlotNotFound(Uuid),

    #[error("Slots already generated for venue {venue_id} on {date} ({start}-{end})")]
    AlreadyGenerated {
        venue_id: Uuid,
        date: NaiveDate,
        start: NaiveTime,
        end: NaiveTime,
    },
}
