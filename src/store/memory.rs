//! In-memory backend. A single mutex serializes whole transactions and plays
//! the role the Postgres row lock plays in `pg`: no two claims against the
//! same slot can interleave. Commit is clone-then-swap, so an `Err` from the
//! transaction body leaves the published state untouched on every exit path.
//!
//! Used by the test suite.

use std::collections::BTreeMap;
use std::sync::Mutex;

use chrono::{NaiveDateTime, Utc};

use crate::error::CoreError;
use crate::models::{
    Booking, BookingStatus, NewBooking, NewSlot, NewWaitlistEntry, Slot, SlotSummary,
    WaitlistEntry,
};
use crate::store::{Store, StoreTx};

#[derive(Debug, Default, Clone)]
pub struct MemoryState {
    next_slot_id: i32,
    next_booking_id: i32,
    next_entry_id: i32,
    slots: BTreeMap<i32, Slot>,
    bookings: BTreeMap<i32, Booking>,
    waitlist: BTreeMap<i32, WaitlistEntry>,
}

#[derive(Debug, Default)]
pub struct MemoryStore {
    state: Mutex<MemoryState>,
}

impl MemoryStore {
    pub fn new() -> Self {
        MemoryStore::default()
    }
}

impl Store for MemoryStore {
    type Tx = MemoryState;

    fn with_transaction<T, F>(&self, f: F) -> Result<T, CoreError>
    where
        F: FnOnce(&mut MemoryState) -> Result<T, CoreError>,
    {
        let mut published = self
            .state
            .lock()
            .map_err(|_| CoreError::Transient("store lock poisoned".to_owned()))?;
        let mut draft = published.clone();
        let out = f(&mut draft)?;
        *published = draft;
        Ok(out)
    }
}

fn now() -> NaiveDateTime {
    Utc::now().naive_utc()
}

impl StoreTx for MemoryState {
    fn slot(&mut self, slot_id: i32) -> Result<Option<Slot>, CoreError> {
        Ok(self.slots.get(&slot_id).cloned())
    }

    fn lock_slot(&mut self, slot_id: i32) -> Result<Option<Slot>, CoreError> {
        // The store mutex already gives the transaction exclusive access.
        self.slot(slot_id)
    }

    fn insert_slot(&mut self, slot: NewSlot) -> Result<Slot, CoreError> {
        self.next_slot_id += 1;
        let row = Slot {
            slot_id: self.next_slot_id,
            interviewer_id: slot.interviewer_id,
            role: slot.role,
            start_time: slot.start_time,
            end_time: slot.end_time,
            capacity: slot.capacity,
            booked_count: slot.booked_count,
            created_at: now(),
        };
        self.slots.insert(row.slot_id, row.clone());
        Ok(row)
    }

    fn update_slot_times(
        &mut self,
        slot_id: i32,
        start_time: NaiveDateTime,
        end_time: NaiveDateTime,
    ) -> Result<Slot, CoreError> {
        let slot = self.slots.get_mut(&slot_id).ok_or(CoreError::NotFound)?;
        slot.start_time = start_time;
        slot.end_time = end_time;
        Ok(slot.clone())
    }

    fn adjust_booked_count(&mut self, slot_id: i32, delta: i32) -> Result<(), CoreError> {
        let slot = self.slots.get_mut(&slot_id).ok_or(CoreError::NotFound)?;
        slot.booked_count += delta;
        Ok(())
    }

    fn overlapping_slot_exists(
        &mut self,
        interviewer_id: &str,
        start_time: NaiveDateTime,
        end_time: NaiveDateTime,
        exclude_slot: Option<i32>,
    ) -> Result<bool, CoreError> {
        Ok(self.slots.values().any(|s| {
            s.interviewer_id == interviewer_id
                && Some(s.slot_id) != exclude_slot
                && s.start_time < end_time
                && s.end_time > start_time
        }))
    }

    fn delete_slot_cascade(&mut self, slot_id: i32) -> Result<(), CoreError> {
        self.bookings.retain(|_, b| b.slot_id != slot_id);
        self.waitlist.retain(|_, w| w.slot_id != slot_id);
        self.slots.remove(&slot_id);
        Ok(())
    }

    fn list_slots(&mut self) -> Result<Vec<SlotSummary>, CoreError> {
        let mut rows: Vec<Slot> = self.slots.values().cloned().collect();
        rows.sort_by_key(|s| (s.start_time, s.slot_id));
        Ok(rows
            .into_iter()
            .map(|slot| {
                let waitlisted = self
                    .waitlist
                    .values()
                    .filter(|w| w.slot_id == slot.slot_id)
                    .count() as i64;
                SlotSummary::from_slot(slot, waitlisted)
            })
            .collect())
    }

    fn booking(&mut self, booking_id: i32) -> Result<Option<Booking>, CoreError> {
        Ok(self.bookings.get(&booking_id).cloned())
    }

    fn booking_by_key(&mut self, idempotency_key: &str) -> Result<Option<Booking>, CoreError> {
        Ok(self
            .bookings
            .values()
            .find(|b| b.idempotency_key.as_deref() == Some(idempotency_key))
            .cloned())
    }

    fn confirmed_booking(
        &mut self,
        slot_id: i32,
        candidate_id: &str,
    ) -> Result<Option<Booking>, CoreError> {
        Ok(self
            .bookings
            .values()
            .find(|b| {
                b.slot_id == slot_id
                    && b.candidate_id == candidate_id
                    && b.status == BookingStatus::Confirmed
            })
            .cloned())
    }

    fn insert_booking(&mut self, booking: NewBooking) -> Result<Booking, CoreError> {
        self.next_booking_id += 1;
        let row = Booking {
            booking_id: self.next_booking_id,
            slot_id: booking.slot_id,
            candidate_id: booking.candidate_id,
            status: booking.status,
            idempotency_key: booking.idempotency_key,
            created_at: now(),
            cancelled_at: None,
        };
        self.bookings.insert(row.booking_id, row.clone());
        Ok(row)
    }

    fn mark_booking_cancelled(&mut self, booking_id: i32) -> Result<Option<Booking>, CoreError> {
        match self.bookings.get_mut(&booking_id) {
            Some(b) if b.status == BookingStatus::Confirmed => {
                b.status = BookingStatus::Cancelled;
                b.cancelled_at = Some(now());
                Ok(Some(b.clone()))
            }
            _ => Ok(None),
        }
    }

    fn bookings_for_candidate(
        &mut self,
        candidate_id: &str,
    ) -> Result<Vec<(Booking, Slot)>, CoreError> {
        let mut rows: Vec<(Booking, Slot)> = self
            .bookings
            .values()
            .filter(|b| b.candidate_id == candidate_id)
            .filter_map(|b| self.slots.get(&b.slot_id).map(|s| (b.clone(), s.clone())))
            .collect();
        rows.sort_by_key(|(b, s)| (s.start_time, b.booking_id));
        Ok(rows)
    }

    fn lock_oldest_waitlist_entry(
        &mut self,
        slot_id: i32,
    ) -> Result<Option<WaitlistEntry>, CoreError> {
        Ok(self
            .waitlist
            .values()
            .filter(|w| w.slot_id == slot_id)
            .min_by_key(|w| (w.created_at, w.entry_id))
            .cloned())
    }

    fn waitlist_entry(
        &mut self,
        slot_id: i32,
        candidate_id: &str,
    ) -> Result<Option<WaitlistEntry>, CoreError> {
        Ok(self
            .waitlist
            .values()
            .find(|w| w.slot_id == slot_id && w.candidate_id == candidate_id)
            .cloned())
    }

    fn insert_waitlist_entry(
        &mut self,
        entry: NewWaitlistEntry,
    ) -> Result<WaitlistEntry, CoreError> {
        self.next_entry_id += 1;
        let row = WaitlistEntry {
            entry_id: self.next_entry_id,
            slot_id: entry.slot_id,
            candidate_id: entry.candidate_id,
            created_at: now(),
        };
        self.waitlist.insert(row.entry_id, row.clone());
        Ok(row)
    }

    fn delete_waitlist_entry(&mut self, entry_id: i32) -> Result<bool, CoreError> {
        Ok(self.waitlist.remove(&entry_id).is_some())
    }

    fn remove_waitlist_entry(
        &mut self,
        slot_id: i32,
        candidate_id: &str,
    ) -> Result<bool, CoreError> {
        let entry_id = self
            .waitlist
            .values()
            .find(|w| w.slot_id == slot_id && w.candidate_id == candidate_id)
            .map(|w| w.entry_id);
        match entry_id {
            Some(id) => Ok(self.waitlist.remove(&id).is_some()),
            None => Ok(false),
        }
    }

    fn waitlist_for_slot(&mut self, slot_id: i32) -> Result<Vec<WaitlistEntry>, CoreError> {
        let mut rows: Vec<WaitlistEntry> = self
            .waitlist
            .values()
            .filter(|w| w.slot_id == slot_id)
            .cloned()
            .collect();
        rows.sort_by_key(|w| (w.created_at, w.entry_id));
        Ok(rows)
    }

    fn waitlist_for_candidate(
        &mut self,
        candidate_id: &str,
    ) -> Result<Vec<(WaitlistEntry, Slot)>, CoreError> {
        let mut rows: Vec<(WaitlistEntry, Slot)> = self
            .waitlist
            .values()
            .filter(|w| w.candidate_id == candidate_id)
            .filter_map(|w| self.slots.get(&w.slot_id).map(|s| (w.clone(), s.clone())))
            .collect();
        rows.sort_by_key(|(w, s)| (s.start_time, w.entry_id));
        Ok(rows)
    }
}
