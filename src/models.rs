use serde::{Deserialize, Serialize};
use crate::schema::{bookings, slots, waitlist_entries};
use chrono::NaiveDateTime;
use diesel::{deserialize::{self, FromSql}, pg::{Pg, PgValue}, serialize::{self, Output, ToSql}, sql_types::Text, Insertable, Selectable};

#[derive(Debug, Clone, Queryable, Selectable, Serialize, Deserialize)]
#[diesel(table_name = slots)]
pub struct Slot {
    pub slot_id: i32,
    pub interviewer_id: String,
    pub role: String,
    pub start_time: NaiveDateTime,
    pub end_time: NaiveDateTime,
    pub capacity: i32,
    pub booked_count: i32,
    pub created_at: NaiveDateTime,
}

#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = slots)]
pub struct NewSlot {
    pub interviewer_id: String,
    pub role: String,
    pub start_time: NaiveDateTime,
    pub end_time: NaiveDateTime,
    pub capacity: i32,
    pub booked_count: i32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, AsExpression, FromSqlRow)]
#[diesel(sql_type = crate::schema::sql_types::BookingStatus)]
#[serde(rename_all = "lowercase")]
pub enum BookingStatus {
    Confirmed,
    Cancelled,
}

impl ToSql<crate::schema::sql_types::BookingStatus, Pg> for BookingStatus {
    fn to_sql<'b>(&'b self, out: &mut Output<'b, '_, Pg>) -> serialize::Result {
        let s = match *self {
            BookingStatus::Confirmed => "confirmed",
            BookingStatus::Cancelled => "cancelled",
        };
        <str as ToSql<Text, Pg>>::to_sql(s, out)
    }
}

impl FromSql<crate::schema::sql_types::BookingStatus, Pg> for BookingStatus {
    fn from_sql(bytes: PgValue) -> deserialize::Result<Self> {
        match <String as FromSql<Text, Pg>>::from_sql(bytes)?.as_str() {
            "confirmed" => Ok(BookingStatus::Confirmed),
            "cancelled" => Ok(BookingStatus::Cancelled),
            s => Err(format!("Unrecognized booking status: {}", s).into()),
        }
    }
}

#[derive(Debug, Clone, Queryable, Selectable, Serialize, Deserialize)]
#[diesel(table_name = bookings)]
pub struct Booking {
    pub booking_id: i32,
    pub slot_id: i32,
    pub candidate_id: String,
    pub status: BookingStatus,
    pub idempotency_key: Option<String>,
    pub created_at: NaiveDateTime,
    pub cancelled_at: Option<NaiveDateTime>,
}

#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = bookings)]
pub struct NewBooking {
    pub slot_id: i32,
    pub candidate_id: String,
    pub status: BookingStatus,
    pub idempotency_key: Option<String>,
}

#[derive(Debug, Clone, Queryable, Selectable, Serialize, Deserialize)]
#[diesel(table_name = waitlist_entries)]
pub struct WaitlistEntry {
    pub entry_id: i32,
    pub slot_id: i32,
    pub candidate_id: String,
    pub created_at: NaiveDateTime,
}

#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = waitlist_entries)]
pub struct NewWaitlistEntry {
    pub slot_id: i32,
    pub candidate_id: String,
}

/// Slot listing row with the derived seat/waitlist counts.
#[derive(Debug, Clone, Serialize)]
pub struct SlotSummary {
    pub slot_id: i32,
    pub interviewer_id: String,
    pub role: String,
    pub start_time: NaiveDateTime,
    pub end_time: NaiveDateTime,
    pub capacity: i32,
    pub booked_count: i32,
    pub available_seats: i32,
    pub waitlist_count: i64,
}

impl SlotSummary {
    pub fn from_slot(slot: Slot, waitlist_count: i64) -> Self {
        SlotSummary {
            available_seats: slot.capacity - slot.booked_count,
            slot_id: slot.slot_id,
            interviewer_id: slot.interviewer_id,
            role: slot.role,
            start_time: slot.start_time,
            end_time: slot.end_time,
            capacity: slot.capacity,
            booked_count: slot.booked_count,
            waitlist_count,
        }
    }
}

/// A booking joined with its slot, as returned by the "my bookings" view.
#[derive(Debug, Clone, Serialize)]
pub struct CandidateBooking {
    pub booking_id: i32,
    pub slot_id: i32,
    pub candidate_id: String,
    pub status: BookingStatus,
    pub created_at: NaiveDateTime,
    pub cancelled_at: Option<NaiveDateTime>,
    pub role: String,
    pub start_time: NaiveDateTime,
    pub end_time: NaiveDateTime,
}

impl From<(Booking, Slot)> for CandidateBooking {
    fn from((booking, slot): (Booking, Slot)) -> Self {
        CandidateBooking {
            booking_id: booking.booking_id,
            slot_id: slot.slot_id,
            candidate_id: booking.candidate_id,
            status: booking.status,
            created_at: booking.created_at,
            cancelled_at: booking.cancelled_at,
            role: slot.role,
            start_time: slot.start_time,
            end_time: slot.end_time,
        }
    }
}

/// A waitlist entry joined with its slot, as returned by the "my waitlist" view.
#[derive(Debug, Clone, Serialize)]
pub struct CandidateWaitlistEntry {
    pub entry_id: i32,
    pub created_at: NaiveDateTime,
    pub slot_id: i32,
    pub role: String,
    pub start_time: NaiveDateTime,
    pub end_time: NaiveDateTime,
    pub interviewer_id: String,
}

impl From<(WaitlistEntry, Slot)> for CandidateWaitlistEntry {
    fn from((entry, slot): (WaitlistEntry, Slot)) -> Self {
        CandidateWaitlistEntry {
            entry_id: entry.entry_id,
            created_at: entry.created_at,
            slot_id: slot.slot_id,
            role: slot.role,
            start_time: slot.start_time,
            end_time: slot.end_time,
            interviewer_id: slot.interviewer_id,
        }
    }
}

/// Outcome of a cancellation: the flipped booking plus whoever got promoted
/// off the waitlist into the freed seat, if anyone.
#[derive(Debug, Clone, Serialize)]
pub struct CancelOutcome {
    pub cancelled: Booking,
    pub promoted: Option<Booking>,
}

// Request models for the HTTP adapter.

#[derive(Debug, Clone, Deserialize)]
pub struct SlotRequest {
    pub role: String,
    pub start_time: String,
    pub end_time: String,
    pub capacity: i32,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RescheduleRequest {
    pub start_time: String,
    pub end_time: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct BookSlotRequest {
    pub slot_id: i32,
    pub idempotency_key: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct JoinWaitlistRequest {
    pub slot_id: i32,
}
