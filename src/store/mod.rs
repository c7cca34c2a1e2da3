//! Storage abstraction the core operates through.
//!
//! `Store::with_transaction` is the scoped-transaction boundary: the closure
//! runs against a transaction handle, commits when it returns `Ok` and rolls
//! back on any `Err`, on every exit path. `StoreTx` is the row-level
//! vocabulary the coordinator composes inside that boundary; `lock_slot` and
//! `lock_oldest_waitlist_entry` are the exclusive serialization points.

pub mod memory;
pub mod pg;

use chrono::NaiveDateTime;

use crate::error::CoreError;
use crate::models::{
    Booking, NewBooking, NewSlot, NewWaitlistEntry, Slot, SlotSummary, WaitlistEntry,
};

pub trait StoreTx {
    // Slots
    fn slot(&mut self, slot_id: i32) -> Result<Option<Slot>, CoreError>;
    /// Read the slot row under an exclusive lock held until commit.
    fn lock_slot(&mut self, slot_id: i32) -> Result<Option<Slot>, CoreError>;
    fn insert_slot(&mut self, slot: NewSlot) -> Result<Slot, CoreError>;
    fn update_slot_times(
        &mut self,
        slot_id: i32,
        start_time: NaiveDateTime,
        end_time: NaiveDateTime,
    ) -> Result<Slot, CoreError>;
    /// Apply `booked_count = booked_count + delta`. Callers hold the slot lock.
    fn adjust_booked_count(&mut self, slot_id: i32, delta: i32) -> Result<(), CoreError>;
    /// Half-open interval overlap among one interviewer's slots, optionally
    /// ignoring one slot (the one being rescheduled).
    fn overlapping_slot_exists(
        &mut self,
        interviewer_id: &str,
        start_time: NaiveDateTime,
        end_time: NaiveDateTime,
        exclude_slot: Option<i32>,
    ) -> Result<bool, CoreError>;
    /// Delete the slot's bookings, waitlist entries, and the slot itself.
    fn delete_slot_cascade(&mut self, slot_id: i32) -> Result<(), CoreError>;
    fn list_slots(&mut self) -> Result<Vec<SlotSummary>, CoreError>;

    // Bookings
    fn booking(&mut self, booking_id: i32) -> Result<Option<Booking>, CoreError>;
    fn booking_by_key(&mut self, idempotency_key: &str) -> Result<Option<Booking>, CoreError>;
    fn confirmed_booking(
        &mut self,
        slot_id: i32,
        candidate_id: &str,
    ) -> Result<Option<Booking>, CoreError>;
    fn insert_booking(&mut self, booking: NewBooking) -> Result<Booking, CoreError>;
    /// Flip a confirmed booking to cancelled; `None` if it was not confirmed.
    fn mark_booking_cancelled(&mut self, booking_id: i32) -> Result<Option<Booking>, CoreError>;
    fn bookings_for_candidate(
        &mut self,
        candidate_id: &str,
    ) -> Result<Vec<(Booking, Slot)>, CoreError>;

    // Waitlist
    /// Lock and return the FIFO head for the slot (oldest `created_at`,
    /// ties broken by entry id).
    fn lock_oldest_waitlist_entry(
        &mut self,
        slot_id: i32,
    ) -> Result<Option<WaitlistEntry>, CoreError>;
    fn waitlist_entry(
        &mut self,
        slot_id: i32,
        candidate_id: &str,
    ) -> Result<Option<WaitlistEntry>, CoreError>;
    fn insert_waitlist_entry(
        &mut self,
        entry: NewWaitlistEntry,
    ) -> Result<WaitlistEntry, CoreError>;
    fn delete_waitlist_entry(&mut self, entry_id: i32) -> Result<bool, CoreError>;
    fn remove_waitlist_entry(
        &mut self,
        slot_id: i32,
        candidate_id: &str,
    ) -> Result<bool, CoreError>;
    fn waitlist_for_slot(&mut self, slot_id: i32) -> Result<Vec<WaitlistEntry>, CoreError>;
    fn waitlist_for_candidate(
        &mut self,
        candidate_id: &str,
    ) -> Result<Vec<(WaitlistEntry, Slot)>, CoreError>;
}

pub trait Store {
    type Tx: StoreTx;

    /// Run `f` inside one atomic transaction: commit on `Ok`, roll back on
    /// `Err`. Row locks taken by `f` are held until the transaction ends.
    fn with_transaction<T, F>(&self, f: F) -> Result<T, CoreError>
    where
        F: FnOnce(&mut Self::Tx) -> Result<T, CoreError>;
}
