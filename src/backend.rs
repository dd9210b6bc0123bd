use crate::types::{Availability, Booking, NewBooking, TimeRange};
use chrono::NaiveDate;
use thiserror::Error;

#[derive(Debug, Error, PartialEq)]
pub enum BackendError {
    #[error("slot already taken")]
    SlotTaken,
    #[error("database error: {0}")]
    Database(String),
}

pub trait BookingBackend: Clone + Send + Sync + 'static {
    fn availability(&self, date: NaiveDate) -> Result<Option<Availability>, BackendError>;
    /// Insert-or-update keyed by date. Returns the stored record.
    fn upsert_availability(
        &self,
        date: NaiveDate,
        time_slots: Vec<TimeRange>,
    ) -> Result<Availability, BackendError>;
    fn bookings(&self) -> Result<Vec<Booking>, BackendError>;
    fn bookings_on(&self, date: NaiveDate) -> Result<Vec<Booking>, BackendError>;
    /// Creates the booking unless its (date, time) pair is already taken.
    /// Check and insert must be one atomic step so concurrent requests can
    /// never double-book a slot.
    fn create_booking(&self, booking: NewBooking) -> Result<Booking, BackendError>;
}
