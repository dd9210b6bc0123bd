use crate::backend::{BackendError, BookingBackend};
use crate::types::{Availability, Booking, NewBooking, TimeRange};
use chrono::{NaiveDate, Utc};
use std::{
    collections::HashMap,
    sync::{Arc, Mutex},
};
use uuid::Uuid;

/// Impersistent fallback backend used when no DATABASE_URL is configured.
#[derive(Debug, Clone, Default)]
pub struct LocalStore {
    state: Arc<Mutex<LocalState>>,
}

#[derive(Debug, Default)]
struct LocalState {
    availabilities: HashMap<NaiveDate, Vec<TimeRange>>,
    bookings: Vec<Booking>,
}

impl BookingBackend for LocalStore {
    fn availability(&self, date: NaiveDate) -> Result<Option<Availability>, BackendError> {
        let state = self.state.lock().unwrap();
        Ok(state
            .availabilities
            .get(&date)
            .map(|time_slots| Availability {
                date,
                time_slots: time_slots.clone(),
            }))
    }

    fn upsert_availability(
        &self,
        date: NaiveDate,
        time_slots: Vec<TimeRange>,
    ) -> Result<Availability, BackendError> {
        let mut state = self.state.lock().unwrap();
        state.availabilities.insert(date, time_slots.clone());
        Ok(Availability { date, time_slots })
    }

    fn bookings(&self) -> Result<Vec<Booking>, BackendError> {
        Ok(self.state.lock().unwrap().bookings.clone())
    }

    fn bookings_on(&self, date: NaiveDate) -> Result<Vec<Booking>, BackendError> {
        let state = self.state.lock().unwrap();
        Ok(state
            .bookings
            .iter()
            .filter(|booking| booking.date == date)
            .cloned()
            .collect())
    }

    fn create_booking(&self, booking: NewBooking) -> Result<Booking, BackendError> {
        // check and insert happen under one lock, so two concurrent requests
        // for the same slot cannot both pass the check
        let mut state = self.state.lock().unwrap();
        if state
            .bookings
            .iter()
            .any(|existing| existing.date == booking.date && existing.time == booking.time)
        {
            return Err(BackendError::SlotTaken);
        }
        let booking = Booking {
            id: Uuid::new_v4(),
            name: booking.name,
            email: booking.email,
            date: booking.date,
            time: booking.time,
            created_at: Utc::now(),
        };
        state.bookings.push(booking.clone());
        Ok(booking)
    }
}
