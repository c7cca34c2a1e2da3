#![allow(dead_code)]

use chrono::{NaiveDate, NaiveDateTime};

use interview_slots::models::Slot;
use interview_slots::slots;
use interview_slots::store::memory::MemoryStore;
use interview_slots::store::{Store, StoreTx};

/// Fixed "wall clock" for operations that take the current time; all test
/// slots live in June 2030, comfortably after this.
pub fn clock() -> NaiveDateTime {
    NaiveDate::from_ymd_opt(2030, 5, 1)
        .unwrap()
        .and_hms_opt(9, 0, 0)
        .unwrap()
}

pub fn t(day: u32, hour: u32) -> NaiveDateTime {
    at(day, hour, 0)
}

pub fn at(day: u32, hour: u32, min: u32) -> NaiveDateTime {
    NaiveDate::from_ymd_opt(2030, 6, day)
        .unwrap()
        .and_hms_opt(hour, min, 0)
        .unwrap()
}

pub fn slot_on(
    store: &MemoryStore,
    interviewer_id: &str,
    day: u32,
    start_hour: u32,
    end_hour: u32,
    capacity: i32,
) -> Slot {
    slots::create_slot(
        store,
        interviewer_id,
        "Backend Engineer",
        t(day, start_hour),
        t(day, end_hour),
        capacity,
    )
    .expect("slot fixture should be valid")
}

pub fn slot_row(store: &MemoryStore, slot_id: i32) -> Slot {
    store
        .with_transaction(|tx| tx.slot(slot_id))
        .unwrap()
        .expect("slot should exist")
}

pub fn waitlist_len(store: &MemoryStore, slot_id: i32) -> usize {
    store
        .with_transaction(|tx| tx.waitlist_for_slot(slot_id))
        .unwrap()
        .len()
}
