//! Postgres backend. Row locks (`FOR UPDATE`) on the slot row and on the
//! waitlist head are the serialization points; every multi-step mutation is
//! wrapped by `with_transaction` so capacity checks and counter updates are
//! never split across transactions.

use std::collections::HashMap;

use chrono::{NaiveDateTime, Utc};
use diesel::{prelude::*, r2d2};

use crate::error::CoreError;
use crate::models::{
    Booking, BookingStatus, NewBooking, NewSlot, NewWaitlistEntry, Slot, SlotSummary,
    WaitlistEntry,
};
use crate::schema::{bookings, slots, waitlist_entries};
use crate::store::{Store, StoreTx};

pub type DbPool = r2d2::Pool<r2d2::ConnectionManager<PgConnection>>;

#[derive(Clone)]
pub struct PgStore {
    pool: DbPool,
}

impl PgStore {
    pub fn new(pool: DbPool) -> Self {
        PgStore { pool }
    }

    /// Build the pool from `DATABASE_URL`. Startup-only; panics on a missing
    /// or malformed URL.
    pub fn from_env() -> Self {
        let conn_spec = std::env::var("DATABASE_URL").expect("DATABASE_URL should be set");
        let manager = r2d2::ConnectionManager::<PgConnection>::new(conn_spec);
        let pool = r2d2::Pool::builder()
            .build(manager)
            .expect("DATABASE_URL should be a valid Postgres connection string");
        PgStore { pool }
    }
}

impl Store for PgStore {
    type Tx = PgConnection;

    fn with_transaction<T, F>(&self, f: F) -> Result<T, CoreError>
    where
        F: FnOnce(&mut PgConnection) -> Result<T, CoreError>,
    {
        let mut conn = self.pool.get()?;
        let conn: &mut PgConnection = &mut conn;
        conn.transaction(|conn| f(conn))
    }
}

impl StoreTx for PgConnection {
    fn slot(&mut self, slot_id: i32) -> Result<Option<Slot>, CoreError> {
        Ok(slots::table.find(slot_id).first(self).optional()?)
    }

    fn lock_slot(&mut self, slot_id: i32) -> Result<Option<Slot>, CoreError> {
        Ok(slots::table
            .find(slot_id)
            .for_update()
            .first(self)
            .optional()?)
    }

    fn insert_slot(&mut self, slot: NewSlot) -> Result<Slot, CoreError> {
        Ok(diesel::insert_into(slots::table)
            .values(&slot)
            .get_result(self)?)
    }

    fn update_slot_times(
        &mut self,
        slot_id: i32,
        start_time: NaiveDateTime,
        end_time: NaiveDateTime,
    ) -> Result<Slot, CoreError> {
        Ok(diesel::update(slots::table.find(slot_id))
            .set((
                slots::start_time.eq(start_time),
                slots::end_time.eq(end_time),
            ))
            .get_result(self)?)
    }

    fn adjust_booked_count(&mut self, slot_id: i32, delta: i32) -> Result<(), CoreError> {
        diesel::update(slots::table.find(slot_id))
            .set(slots::booked_count.eq(slots::booked_count + delta))
            .execute(self)?;
        Ok(())
    }

    fn overlapping_slot_exists(
        &mut self,
        interviewer_id: &str,
        start_time: NaiveDateTime,
        end_time: NaiveDateTime,
        exclude_slot: Option<i32>,
    ) -> Result<bool, CoreError> {
        // Half-open overlap: existing.start < new_end AND existing.end > new_start.
        let mut query = slots::table
            .filter(slots::interviewer_id.eq(interviewer_id))
            .filter(slots::start_time.lt(end_time))
            .filter(slots::end_time.gt(start_time))
            .into_boxed();

        if let Some(slot_id) = exclude_slot {
            query = query.filter(slots::slot_id.ne(slot_id));
        }

        let conflicts: i64 = query.count().get_result(self)?;
        Ok(conflicts > 0)
    }

    fn delete_slot_cascade(&mut self, slot_id: i32) -> Result<(), CoreError> {
        diesel::delete(bookings::table.filter(bookings::slot_id.eq(slot_id))).execute(self)?;
        diesel::delete(waitlist_entries::table.filter(waitlist_entries::slot_id.eq(slot_id)))
            .execute(self)?;
        diesel::delete(slots::table.find(slot_id)).execute(self)?;
        Ok(())
    }

    fn list_slots(&mut self) -> Result<Vec<SlotSummary>, CoreError> {
        let all_slots: Vec<Slot> = slots::table.order(slots::start_time.asc()).load(self)?;

        let counts: Vec<(i32, i64)> = waitlist_entries::table
            .group_by(waitlist_entries::slot_id)
            .select((waitlist_entries::slot_id, diesel::dsl::count_star()))
            .load(self)?;
        let counts: HashMap<i32, i64> = counts.into_iter().collect();

        Ok(all_slots
            .into_iter()
            .map(|slot| {
                let waitlisted = counts.get(&slot.slot_id).copied().unwrap_or(0);
                SlotSummary::from_slot(slot, waitlisted)
            })
            .collect())
    }

    fn booking(&mut self, booking_id: i32) -> Result<Option<Booking>, CoreError> {
        Ok(bookings::table.find(booking_id).first(self).optional()?)
    }

    fn booking_by_key(&mut self, idempotency_key: &str) -> Result<Option<Booking>, CoreError> {
        Ok(bookings::table
            .filter(bookings::idempotency_key.eq(idempotency_key))
            .first(self)
            .optional()?)
    }

    fn confirmed_booking(
        &mut self,
        slot_id: i32,
        candidate_id: &str,
    ) -> Result<Option<Booking>, CoreError> {
        Ok(bookings::table
            .filter(bookings::slot_id.eq(slot_id))
            .filter(bookings::candidate_id.eq(candidate_id))
            .filter(bookings::status.eq(BookingStatus::Confirmed))
            .first(self)
            .optional()?)
    }

    fn insert_booking(&mut self, booking: NewBooking) -> Result<Booking, CoreError> {
        diesel::insert_into(bookings::table)
            .values(&booking)
            .get_result(self)
            .map_err(|e| match e {
                // The partial unique index on (slot_id, candidate_id) and the
                // unique idempotency key back-stop the in-transaction checks.
                diesel::result::Error::DatabaseError(
                    diesel::result::DatabaseErrorKind::UniqueViolation,
                    _,
                ) => CoreError::AlreadyBooked,
                other => other.into(),
            })
    }

    fn mark_booking_cancelled(&mut self, booking_id: i32) -> Result<Option<Booking>, CoreError> {
        Ok(diesel::update(
            bookings::table
                .filter(bookings::booking_id.eq(booking_id))
                .filter(bookings::status.eq(BookingStatus::Confirmed)),
        )
        .set((
            bookings::status.eq(BookingStatus::Cancelled),
            bookings::cancelled_at.eq(Some(Utc::now().naive_utc())),
        ))
        .get_result(self)
        .optional()?)
    }

    fn bookings_for_candidate(
        &mut self,
        candidate_id: &str,
    ) -> Result<Vec<(Booking, Slot)>, CoreError> {
        Ok(bookings::table
            .inner_join(slots::table)
            .filter(bookings::candidate_id.eq(candidate_id))
            .order(slots::start_time.asc())
            .load(self)?)
    }

    fn lock_oldest_waitlist_entry(
        &mut self,
        slot_id: i32,
    ) -> Result<Option<WaitlistEntry>, CoreError> {
        Ok(waitlist_entries::table
            .filter(waitlist_entries::slot_id.eq(slot_id))
            .order((
                waitlist_entries::created_at.asc(),
                waitlist_entries::entry_id.asc(),
            ))
            .for_update()
            .first(self)
            .optional()?)
    }

    fn waitlist_entry(
        &mut self,
        slot_id: i32,
        candidate_id: &str,
    ) -> Result<Option<WaitlistEntry>, CoreError> {
        Ok(waitlist_entries::table
            .filter(waitlist_entries::slot_id.eq(slot_id))
            .filter(waitlist_entries::candidate_id.eq(candidate_id))
            .first(self)
            .optional()?)
    }

    fn insert_waitlist_entry(
        &mut self,
        entry: NewWaitlistEntry,
    ) -> Result<WaitlistEntry, CoreError> {
        diesel::insert_into(waitlist_entries::table)
            .values(&entry)
            .get_result(self)
            .map_err(|e| match e {
                diesel::result::Error::DatabaseError(
                    diesel::result::DatabaseErrorKind::UniqueViolation,
                    _,
                ) => CoreError::AlreadyWaitlisted,
                other => other.into(),
            })
    }

    fn delete_waitlist_entry(&mut self, entry_id: i32) -> Result<bool, CoreError> {
        let deleted =
            diesel::delete(waitlist_entries::table.find(entry_id)).execute(self)?;
        Ok(deleted > 0)
    }

    fn remove_waitlist_entry(
        &mut self,
        slot_id: i32,
        candidate_id: &str,
    ) -> Result<bool, CoreError> {
        let deleted = diesel::delete(
            waitlist_entries::table
                .filter(waitlist_entries::slot_id.eq(slot_id))
                .filter(waitlist_entries::candidate_id.eq(candidate_id)),
        )
        .execute(self)?;
        Ok(deleted > 0)
    }

    fn waitlist_for_slot(&mut self, slot_id: i32) -> Result<Vec<WaitlistEntry>, CoreError> {
        Ok(waitlist_entries::table
            .filter(waitlist_entries::slot_id.eq(slot_id))
            .order((
                waitlist_entries::created_at.asc(),
                waitlist_entries::entry_id.asc(),
            ))
            .load(self)?)
    }

    fn waitlist_for_candidate(
        &mut self,
        candidate_id: &str,
    ) -> Result<Vec<(WaitlistEntry, Slot)>, CoreError> {
        Ok(waitlist_entries::table
            .inner_join(slots::table)
            .filter(waitlist_entries::candidate_id.eq(candidate_id))
            .order(slots::start_time.asc())
            .load(self)?)
    }
}
