//! Waitlist queue: join/leave plus the per-slot and per-candidate views.
//! FIFO order is (created_at, entry_id); the coordinator consumes the head
//! on promotion.

use crate::error::CoreError;
use crate::models::{CandidateWaitlistEntry, NewWaitlistEntry, WaitlistEntry};
use crate::store::{Store, StoreTx};

/// Queue a candidate for a seat on a full slot. A candidate may not hold a
/// confirmed booking and a waitlist entry for the same slot at once.
pub fn join_waitlist<S: Store>(
    store: &S,
    slot_id: i32,
    candidate_id: &str,
) -> Result<WaitlistEntry, CoreError> {
    store.with_transaction(|tx| {
        if tx.slot(slot_id)?.is_none() {
            return Err(CoreError::NotFound);
        }
        if tx.confirmed_booking(slot_id, candidate_id)?.is_some() {
            return Err(CoreError::AlreadyBooked);
        }
        if tx.waitlist_entry(slot_id, candidate_id)?.is_some() {
            return Err(CoreError::AlreadyWaitlisted);
        }

        tx.insert_waitlist_entry(NewWaitlistEntry {
            slot_id,
            candidate_id: candidate_id.to_owned(),
        })
    })
}

pub fn leave_waitlist<S: Store>(
    store: &S,
    slot_id: i32,
    candidate_id: &str,
) -> Result<(), CoreError> {
    store.with_transaction(|tx| {
        if tx.remove_waitlist_entry(slot_id, candidate_id)? {
            Ok(())
        } else {
            Err(CoreError::NotFound)
        }
    })
}

/// Entries for one slot, oldest first. The order is the promotion priority.
pub fn waitlist_for_slot<S: Store>(
    store: &S,
    slot_id: i32,
) -> Result<Vec<WaitlistEntry>, CoreError> {
    store.with_transaction(|tx| {
        if tx.slot(slot_id)?.is_none() {
            return Err(CoreError::NotFound);
        }
        tx.waitlist_for_slot(slot_id)
    })
}

/// The candidate's waitlist entries joined with their slots, ordered by
/// slot start time.
pub fn waitlist_for_candidate<S: Store>(
    store: &S,
    candidate_id: &str,
) -> Result<Vec<CandidateWaitlistEntry>, CoreError> {
    store.with_transaction(|tx| {
        Ok(tx
            .waitlist_for_candidate(candidate_id)?
            .into_iter()
            .map(CandidateWaitlistEntry::from)
            .collect())
    })
}
