mod common;

use common::{at, clock, slot_on, slot_row, t};
use interview_slots::coordinator::{bookings_by_candidate, create_booking};
use interview_slots::error::CoreError;
use interview_slots::slots::{create_slot, delete_slot, list_slots, reschedule_slot};
use interview_slots::store::memory::MemoryStore;
use interview_slots::store::{Store, StoreTx};
use interview_slots::waitlist::{join_waitlist, waitlist_for_slot};

#[test]
fn create_rejects_inverted_range() {
    let store = MemoryStore::new();

    let err = create_slot(&store, "recruiter1", "Backend", t(1, 11), t(1, 10), 2).unwrap_err();
    assert_eq!(err, CoreError::InvalidRange);

    let err = create_slot(&store, "recruiter1", "Backend", t(1, 10), t(1, 10), 2).unwrap_err();
    assert_eq!(err, CoreError::InvalidRange);
}

#[test]
fn create_rejects_nonpositive_capacity() {
    let store = MemoryStore::new();
    for capacity in [0, -3] {
        let err =
            create_slot(&store, "recruiter1", "Backend", t(1, 10), t(1, 11), capacity).unwrap_err();
        assert!(matches!(err, CoreError::Validation(_)));
    }
}

#[test]
fn overlapping_slot_is_rejected() {
    let store = MemoryStore::new();
    slot_on(&store, "recruiter1", 1, 10, 11, 2);

    let err = create_slot(
        &store,
        "recruiter1",
        "Backend",
        at(1, 10, 30),
        at(1, 11, 30),
        2,
    )
    .unwrap_err();
    assert_eq!(err, CoreError::ScheduleConflict);
}

#[test]
fn adjacent_slot_is_allowed() {
    let store = MemoryStore::new();
    slot_on(&store, "recruiter1", 1, 10, 11, 2);

    // Half-open windows: [10:00, 11:00) and [11:00, 12:00) do not overlap.
    create_slot(&store, "recruiter1", "Backend", t(1, 11), t(1, 12), 2).unwrap();
}

#[test]
fn other_interviewers_may_overlap() {
    let store = MemoryStore::new();
    slot_on(&store, "recruiter1", 1, 10, 11, 2);

    create_slot(&store, "recruiter2", "Backend", at(1, 10, 30), at(1, 11, 30), 2).unwrap();
}

#[test]
fn reschedule_requires_ownership() {
    let store = MemoryStore::new();
    let slot = slot_on(&store, "recruiter1", 1, 10, 11, 2);

    let err = reschedule_slot(
        &store,
        slot.slot_id,
        "recruiter2",
        t(1, 12),
        t(1, 13),
        clock(),
    )
    .unwrap_err();
    assert_eq!(err, CoreError::NotFound);

    let err = reschedule_slot(&store, 999, "recruiter1", t(1, 12), t(1, 13), clock()).unwrap_err();
    assert_eq!(err, CoreError::NotFound);
}

#[test]
fn reschedule_rejects_bad_ranges() {
    let store = MemoryStore::new();
    let slot = slot_on(&store, "recruiter1", 1, 10, 11, 2);

    let err = reschedule_slot(
        &store,
        slot.slot_id,
        "recruiter1",
        t(1, 13),
        t(1, 12),
        clock(),
    )
    .unwrap_err();
    assert_eq!(err, CoreError::InvalidRange);

    // New start before the supplied wall clock.
    let err = reschedule_slot(
        &store,
        slot.slot_id,
        "recruiter1",
        t(1, 12),
        t(1, 13),
        t(2, 0),
    )
    .unwrap_err();
    assert_eq!(err, CoreError::PastTime);
}

#[test]
fn reschedule_conflicts_against_other_slots_only() {
    let store = MemoryStore::new();
    let slot = slot_on(&store, "recruiter1", 1, 10, 11, 2);
    slot_on(&store, "recruiter1", 1, 14, 15, 2);

    let err = reschedule_slot(
        &store,
        slot.slot_id,
        "recruiter1",
        at(1, 14, 30),
        at(1, 15, 30),
        clock(),
    )
    .unwrap_err();
    assert_eq!(err, CoreError::ScheduleConflict);

    // Overlapping only its own current window is fine.
    let updated = reschedule_slot(
        &store,
        slot.slot_id,
        "recruiter1",
        at(1, 10, 30),
        at(1, 11, 30),
        clock(),
    )
    .unwrap();
    assert_eq!(updated.start_time, at(1, 10, 30));
}

#[test]
fn reschedule_shift_is_limited_once_booked() {
    let store = MemoryStore::new();
    let slot = slot_on(&store, "recruiter1", 1, 10, 11, 2);
    create_booking(&store, slot.slot_id, "alice", None).unwrap();

    // 5 hour shift with an active booking.
    let err = reschedule_slot(
        &store,
        slot.slot_id,
        "recruiter1",
        t(1, 15),
        t(1, 16),
        clock(),
    )
    .unwrap_err();
    assert_eq!(err, CoreError::ExcessiveShift);

    // 2 hour shift is within the limit.
    let updated = reschedule_slot(
        &store,
        slot.slot_id,
        "recruiter1",
        t(1, 12),
        t(1, 13),
        clock(),
    )
    .unwrap();
    assert_eq!(updated.start_time, t(1, 12));
    assert_eq!(updated.end_time, t(1, 13));
}

#[test]
fn reschedule_shift_limit_is_exclusive() {
    let store = MemoryStore::new();
    let slot = slot_on(&store, "recruiter1", 1, 10, 11, 2);
    create_booking(&store, slot.slot_id, "alice", None).unwrap();

    // Exactly 4 hours is still allowed; only "more than" is rejected.
    let updated = reschedule_slot(
        &store,
        slot.slot_id,
        "recruiter1",
        t(1, 14),
        t(1, 15),
        clock(),
    )
    .unwrap();
    assert_eq!(updated.start_time, t(1, 14));
}

#[test]
fn reschedule_without_bookings_may_shift_freely() {
    let store = MemoryStore::new();
    let slot = slot_on(&store, "recruiter1", 1, 10, 11, 2);

    let updated = reschedule_slot(
        &store,
        slot.slot_id,
        "recruiter1",
        t(3, 10),
        t(3, 11),
        clock(),
    )
    .unwrap();
    assert_eq!(updated.start_time, t(3, 10));
}

#[test]
fn delete_cascades_atomically() {
    let store = MemoryStore::new();
    let slot = slot_on(&store, "recruiter1", 1, 10, 11, 1);
    create_booking(&store, slot.slot_id, "alice", None).unwrap();
    join_waitlist(&store, slot.slot_id, "wendy").unwrap();

    delete_slot(&store, slot.slot_id, "recruiter1").unwrap();

    assert!(list_slots(&store).unwrap().is_empty());
    assert!(bookings_by_candidate(&store, "alice").unwrap().is_empty());
    assert_eq!(
        waitlist_for_slot(&store, slot.slot_id).unwrap_err(),
        CoreError::NotFound
    );
    let orphaned = store
        .with_transaction(|tx| tx.waitlist_for_slot(slot.slot_id))
        .unwrap();
    assert!(orphaned.is_empty());
}

#[test]
fn delete_requires_ownership() {
    let store = MemoryStore::new();
    let slot = slot_on(&store, "recruiter1", 1, 10, 11, 1);
    create_booking(&store, slot.slot_id, "alice", None).unwrap();

    let err = delete_slot(&store, slot.slot_id, "recruiter2").unwrap_err();

    assert_eq!(err, CoreError::NotFound);
    assert_eq!(slot_row(&store, slot.slot_id).booked_count, 1);
    assert_eq!(bookings_by_candidate(&store, "alice").unwrap().len(), 1);
}

#[test]
fn listing_derives_counts_and_orders_by_start() {
    let store = MemoryStore::new();
    let later = slot_on(&store, "recruiter1", 2, 10, 11, 3);
    let earlier = slot_on(&store, "recruiter2", 1, 10, 11, 1);

    create_booking(&store, later.slot_id, "alice", None).unwrap();
    create_booking(&store, earlier.slot_id, "bob", None).unwrap();
    join_waitlist(&store, later.slot_id, "wendy").unwrap();
    join_waitlist(&store, later.slot_id, "walter").unwrap();

    let listing = list_slots(&store).unwrap();

    assert_eq!(listing.len(), 2);
    assert_eq!(listing[0].slot_id, earlier.slot_id);
    assert_eq!(listing[0].available_seats, 0);
    assert_eq!(listing[0].waitlist_count, 0);
    assert_eq!(listing[1].slot_id, later.slot_id);
    assert_eq!(listing[1].available_seats, 2);
    assert_eq!(listing[1].waitlist_count, 2);
}
