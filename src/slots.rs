//! Slot lifecycle: create with conflict detection, reschedule with the
//! shift guard for already-booked slots, atomic cascade delete, and the
//! public listing with derived seat/waitlist counts.

use chrono::{Duration, NaiveDateTime};

use crate::error::CoreError;
use crate::models::{NewSlot, Slot, SlotSummary};
use crate::store::{Store, StoreTx};

/// Largest start-time shift a reschedule may apply once candidates hold
/// bookings on the slot.
pub const MAX_RESCHEDULE_SHIFT_HOURS: i64 = 4;

pub fn create_slot<S: Store>(
    store: &S,
    interviewer_id: &str,
    role: &str,
    start_time: NaiveDateTime,
    end_time: NaiveDateTime,
    capacity: i32,
) -> Result<Slot, CoreError> {
    if start_time >= end_time {
        return Err(CoreError::InvalidRange);
    }
    if capacity <= 0 {
        return Err(CoreError::Validation(
            "capacity must be a positive integer".to_owned(),
        ));
    }

    store.with_transaction(|tx| {
        if tx.overlapping_slot_exists(interviewer_id, start_time, end_time, None)? {
            return Err(CoreError::ScheduleConflict);
        }

        tx.insert_slot(NewSlot {
            interviewer_id: interviewer_id.to_owned(),
            role: role.to_owned(),
            start_time,
            end_time,
            capacity,
            booked_count: 0,
        })
    })
}

/// Move a slot to a new window. Ownership failures are folded into
/// `NotFound` so callers learn nothing about other recruiters' slots. When
/// the slot already has bookings, the start time may shift by at most
/// [`MAX_RESCHEDULE_SHIFT_HOURS`] to protect committed candidates. `now` is
/// supplied by the caller.
pub fn reschedule_slot<S: Store>(
    store: &S,
    slot_id: i32,
    recruiter_id: &str,
    start_time: NaiveDateTime,
    end_time: NaiveDateTime,
    now: NaiveDateTime,
) -> Result<Slot, CoreError> {
    store.with_transaction(|tx| {
        let slot = tx
            .lock_slot(slot_id)?
            .filter(|s| s.interviewer_id == recruiter_id)
            .ok_or(CoreError::NotFound)?;

        if start_time >= end_time {
            return Err(CoreError::InvalidRange);
        }
        if start_time < now {
            return Err(CoreError::PastTime);
        }
        if tx.overlapping_slot_exists(recruiter_id, start_time, end_time, Some(slot_id))? {
            return Err(CoreError::ScheduleConflict);
        }

        if slot.booked_count > 0 {
            let shift = (start_time - slot.start_time).abs();
            if shift > Duration::hours(MAX_RESCHEDULE_SHIFT_HOURS) {
                return Err(CoreError::ExcessiveShift);
            }
        }

        tx.update_slot_times(slot_id, start_time, end_time)
    })
}

/// Delete a slot together with all of its bookings and waitlist entries in
/// one transaction; a partial cascade is never observable.
pub fn delete_slot<S: Store>(
    store: &S,
    slot_id: i32,
    recruiter_id: &str,
) -> Result<(), CoreError> {
    store.with_transaction(|tx| {
        tx.lock_slot(slot_id)?
            .filter(|s| s.interviewer_id == recruiter_id)
            .ok_or(CoreError::NotFound)?;

        tx.delete_slot_cascade(slot_id)
    })
}

/// All slots ordered by start time, with `available_seats` and
/// `waitlist_count` derived per row.
pub fn list_slots<S: Store>(store: &S) -> Result<Vec<SlotSummary>, CoreError> {
    store.with_transaction(|tx| tx.list_slots())
}
