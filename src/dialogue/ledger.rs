//! Append-only in-memory booking store.
//!
//! One async mutex guards the whole ledger, so the availability check and the
//! append in [`BookingLedger::create`] are a single atomic step. No partial
//! writes are observable.

use std::collections::HashMap;
use std::sync::Arc;

use chrono::NaiveDate;
use metrics::counter;
use tokio::sync::Mutex;
use tracing::info;
use ulid::Ulid;

use crate::catalog::Catalog;
use crate::model::{Booking, BookingRequest, BookingStatus, Slot, StudyRoom};
use crate::observability;

use super::error::LedgerError;

#[derive(Default)]
struct LedgerInner {
    bookings: Vec<Booking>,
    by_code: HashMap<String, usize>,
}

pub struct BookingLedger {
    catalog: Arc<Catalog>,
    inner: Mutex<LedgerInner>,
}

impl BookingLedger {
    pub fn new(catalog: Arc<Catalog>) -> Self {
        BookingLedger {
            catalog,
            inner: Mutex::new(LedgerInner::default()),
        }
    }

    /// Confirm a booking, re-verifying the room and the slot under the lock.
    pub async fn create(&self, req: BookingRequest) -> Result<Booking, LedgerError> {
        let room = self
            .catalog
            .room(req.room_id)
            .filter(|r| r.active)
            .ok_or(LedgerError::RoomNotFound(req.room_id))?;

        let mut inner = self.inner.lock().await;
        if Self::has_conflict(&inner.bookings, req.room_id, req.date, &req.slot) {
            counter!(observability::BOOKING_CONFLICTS_TOTAL).increment(1);
            return Err(LedgerError::RoomUnavailable(req.room_id));
        }

        let id = inner.bookings.iter().map(|b| b.id).max().unwrap_or(0) + 1;
        let confirmation_code = Self::confirmation_code();
        let booking = Booking {
            id,
            room_id: req.room_id,
            user_id: req.user_id,
            user_email: req.user_email,
            date: req.date,
            slot: req.slot,
            purpose: req.purpose,
            attendees: req.attendees,
            confirmation_code: confirmation_code.clone(),
            status: BookingStatus::Confirmed,
        };
        let index = inner.bookings.len();
        inner.by_code.insert(confirmation_code, index);
        inner.bookings.push(booking.clone());

        counter!(observability::BOOKINGS_CREATED_TOTAL).increment(1);
        info!(
            booking_id = id,
            room = %room.label(),
            date = %booking.date,
            code = %booking.confirmation_code,
            "booking confirmed"
        );
        Ok(booking)
    }

    pub async fn is_room_available(&self, room_id: u32, date: NaiveDate, slot: Slot) -> bool {
        let inner = self.inner.lock().await;
        !Self::has_conflict(&inner.bookings, room_id, date, &slot)
    }

    /// Active rooms with enough seats and no confirmed overlap, in catalog
    /// order so option numbers are stable.
    pub async fn find_available_rooms(
        &self,
        date: NaiveDate,
        slot: Slot,
        min_capacity: u32,
    ) -> Vec<&'static StudyRoom> {
        let inner = self.inner.lock().await;
        self.catalog
            .active_rooms()
            .filter(|r| r.capacity >= min_capacity)
            .filter(|r| !Self::has_conflict(&inner.bookings, r.id, date, &slot))
            .collect()
    }

    /// Flip a confirmed booking to cancelled. True only when a confirmed
    /// booking matched the code and the user; a second cancel of the same
    /// code finds no match.
    pub async fn cancel(&self, confirmation_code: &str, user_id: &str) -> bool {
        let mut inner = self.inner.lock().await;
        let Some(&index) = inner.by_code.get(confirmation_code) else {
            return false;
        };
        let booking = &mut inner.bookings[index];
        if booking.user_id != user_id || booking.status != BookingStatus::Confirmed {
            return false;
        }
        booking.status = BookingStatus::Cancelled;
        info!(booking_id = booking.id, code = confirmation_code, "booking cancelled");
        true
    }

    pub async fn booking_by_code(&self, confirmation_code: &str) -> Option<Booking> {
        let inner = self.inner.lock().await;
        inner
            .by_code
            .get(confirmation_code)
            .map(|&i| inner.bookings[i].clone())
    }

    /// A user's confirmed bookings ordered by date, then start time.
    pub async fn user_bookings(&self, user_id: &str) -> Vec<Booking> {
        let inner = self.inner.lock().await;
        let mut out: Vec<Booking> = inner
            .bookings
            .iter()
            .filter(|b| b.user_id == user_id && b.status == BookingStatus::Confirmed)
            .cloned()
            .collect();
        out.sort_by_key(|b| (b.date, b.slot.start));
        out
    }

    /// Fixed multi-line rendering shared by the confirmation reply and any
    /// later lookups.
    pub fn format_booking_details(&self, booking: &Booking) -> String {
        let Some(room) = self.catalog.room(booking.room_id) else {
            return "Booking details not available".to_string();
        };
        format!(
            "Room: {} {} (Floor {})\n\
             Date: {}\n\
             Time: {} - {}\n\
             Capacity: {} people\n\
             Features: {}\n\
             Confirmation Code: {}",
            room.building,
            room.room_number,
            room.floor,
            booking.date.format("%A, %B %-d, %Y"),
            booking.slot.start.display_12h(),
            booking.slot.end.display_12h(),
            room.capacity,
            room.feature_list(),
            booking.confirmation_code,
        )
    }

    /// Overlap against confirmed bookings on the same room and date. A slot
    /// conflicts when an existing booking starts inside it, ends inside it,
    /// or sits entirely within it; touching endpoints do not conflict.
    fn has_conflict(bookings: &[Booking], room_id: u32, date: NaiveDate, slot: &Slot) -> bool {
        bookings
            .iter()
            .filter(|b| {
                b.room_id == room_id && b.date == date && b.status == BookingStatus::Confirmed
            })
            .any(|b| {
                let starts_inside = b.slot.start <= slot.start && b.slot.end > slot.start;
                let ends_inside = b.slot.start < slot.end && b.slot.end >= slot.end;
                let contained = b.slot.start >= slot.start && b.slot.end <= slot.end;
                starts_inside || ends_inside || contained
            })
    }

    fn confirmation_code() -> String {
        format!("BK-{}", &Ulid::new().to_string()[..8])
    }
}
