//! Reservation coordinator: the transactional logic tying the slot counter,
//! the booking ledger, and the waitlist queue together. Every mutation here
//! runs inside one `with_transaction` scope with the slot row locked, so two
//! concurrent claims against the last seat can never both succeed and a
//! crash can never expose a half-applied cancellation.

use crate::error::CoreError;
use crate::models::{Booking, BookingStatus, CancelOutcome, CandidateBooking, NewBooking};
use crate::store::{Store, StoreTx};

/// Claim one seat on a slot.
///
/// Order of checks, all in one transaction: idempotency replay, duplicate
/// active booking, slot lock + existence, capacity, then insert + counter
/// increment. Replays of a known idempotency key return the stored booking
/// unchanged, so retried requests are safe under at-least-once delivery.
pub fn create_booking<S: Store>(
    store: &S,
    slot_id: i32,
    candidate_id: &str,
    idempotency_key: Option<&str>,
) -> Result<Booking, CoreError> {
    let idempotency_key = idempotency_key.filter(|k| !k.is_empty());

    store.with_transaction(|tx| {
        if let Some(key) = idempotency_key {
            if let Some(existing) = tx.booking_by_key(key)? {
                return Ok(existing);
            }
        }

        if tx.confirmed_booking(slot_id, candidate_id)?.is_some() {
            return Err(CoreError::AlreadyBooked);
        }

        let slot = tx.lock_slot(slot_id)?.ok_or(CoreError::NotFound)?;

        if slot.booked_count >= slot.capacity {
            return Err(CoreError::SlotFull);
        }

        let booking = tx.insert_booking(NewBooking {
            slot_id,
            candidate_id: candidate_id.to_owned(),
            status: BookingStatus::Confirmed,
            idempotency_key: idempotency_key.map(str::to_owned),
        })?;
        tx.adjust_booked_count(slot_id, 1)?;

        Ok(booking)
    })
}

/// Cancel the caller's confirmed booking and, in the same transaction,
/// promote the oldest waitlisted candidate into the freed seat. A booking
/// that does not exist, is already cancelled, or belongs to someone else is
/// reported as `NotFound` without further detail.
pub fn cancel_booking<S: Store>(
    store: &S,
    booking_id: i32,
    candidate_id: &str,
) -> Result<CancelOutcome, CoreError> {
    store.with_transaction(|tx| {
        let booking = tx
            .booking(booking_id)?
            .filter(|b| b.candidate_id == candidate_id)
            .ok_or(CoreError::NotFound)?;

        // Lock the slot before touching the counter or the waitlist head.
        tx.lock_slot(booking.slot_id)?.ok_or(CoreError::NotFound)?;

        let cancelled = tx
            .mark_booking_cancelled(booking.booking_id)?
            .ok_or(CoreError::NotFound)?;
        tx.adjust_booked_count(cancelled.slot_id, -1)?;

        let promoted = promote_next(tx, cancelled.slot_id)?;

        Ok(CancelOutcome {
            cancelled,
            promoted,
        })
    })
}

/// Move the FIFO head of the slot's waitlist into a confirmed booking.
/// Must run inside the caller's transaction with the slot row locked;
/// exactly one promotion happens per freed seat because the head entry is
/// itself locked before being consumed.
pub fn promote_next<T: StoreTx>(tx: &mut T, slot_id: i32) -> Result<Option<Booking>, CoreError> {
    let entry = match tx.lock_oldest_waitlist_entry(slot_id)? {
        Some(entry) => entry,
        None => return Ok(None),
    };

    let booking = tx.insert_booking(NewBooking {
        slot_id,
        candidate_id: entry.candidate_id.clone(),
        status: BookingStatus::Confirmed,
        idempotency_key: None,
    })?;
    tx.delete_waitlist_entry(entry.entry_id)?;
    tx.adjust_booked_count(slot_id, 1)?;

    Ok(Some(booking))
}

/// All of the candidate's bookings, cancelled history included, joined with
/// their slots and ordered by slot start time.
pub fn bookings_by_candidate<S: Store>(
    store: &S,
    candidate_id: &str,
) -> Result<Vec<CandidateBooking>, CoreError> {
    store.with_transaction(|tx| {
        Ok(tx
            .bookings_for_candidate(candidate_id)?
            .into_iter()
            .map(CandidateBooking::from)
            .collect())
    })
}
