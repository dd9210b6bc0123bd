use crate::backend::{BackendError, BookingBackend};
use crate::configuration::{Configuration, SmtpSettings};
use crate::types::{Availability, Booking, NewBooking, TimeRange};
use chrono::{NaiveDate, Utc};
use std::sync::{
    atomic::{AtomicBool, AtomicU64, Ordering},
    Arc, Mutex,
};
use uuid::Uuid;

pub fn example_booking() -> Booking {
    Booking {
        id: Uuid::new_v4(),
        name: "Stefan".into(),
        email: "stefan@example.com".into(),
        date: NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(),
        time: "09:00".into(),
        created_at: Utc::now(),
    }
}

#[derive(Debug, Clone, Default)]
pub struct TestConfiguration;

impl Configuration for TestConfiguration {
    fn port(&self) -> String {
        String::from("0")
    }

    fn database_url(&self) -> Option<String> {
        None
    }

    fn admin_password(&self) -> String {
        String::from("123")
    }

    fn smtp(&self) -> Option<SmtpSettings> {
        None
    }
}

pub struct MockBackendInner {
    pub success: AtomicBool,
    pub calls_to_availability: AtomicU64,
    pub calls_to_upsert_availability: AtomicU64,
    pub calls_to_bookings: AtomicU64,
    pub calls_to_bookings_on: AtomicU64,
    pub calls_to_create_booking: AtomicU64,
    pub availability: Mutex<Option<Availability>>,
    pub bookings: Mutex<Vec<Booking>>,
}

#[derive(Clone)]
pub struct MockBackend(pub Arc<MockBackendInner>);

impl MockBackendInner {
    fn new() -> Self {
        Self {
            success: AtomicBool::new(true),
            calls_to_availability: AtomicU64::default(),
            calls_to_upsert_availability: AtomicU64::default(),
            calls_to_bookings: AtomicU64::default(),
            calls_to_bookings_on: AtomicU64::default(),
            calls_to_create_booking: AtomicU64::default(),
            availability: Mutex::default(),
            bookings: Mutex::default(),
        }
    }
}

impl MockBackend {
    pub fn new() -> Self {
        Self(Arc::new(MockBackendInner::new()))
    }

    fn result(&self) -> Result<(), BackendError> {
        match self.0.success.load(Ordering::SeqCst) {
            true => Ok(()),
            false => Err(BackendError::Database("supposed to fail".into())),
        }
    }
}

impl BookingBackend for MockBackend {
    fn availability(&self, date: NaiveDate) -> Result<Option<Availability>, BackendError> {
        self.0.calls_to_availability.fetch_add(1, Ordering::SeqCst);
        self.result()?;
        Ok(self
            .0
            .availability
            .lock()
            .unwrap()
            .clone()
            .filter(|availability| availability.date == date))
    }

    fn upsert_availability(
        &self,
        date: NaiveDate,
        time_slots: Vec<TimeRange>,
    ) -> Result<Availability, BackendError> {
        self.0
            .calls_to_upsert_availability
            .fetch_add(1, Ordering::SeqCst);
        self.result()?;
        let stored = Availability { date, time_slots };
        *self.0.availability.lock().unwrap() = Some(stored.clone());
        Ok(stored)
    }

    fn bookings(&self) -> Result<Vec<Booking>, BackendError> {
        self.0.calls_to_bookings.fetch_add(1, Ordering::SeqCst);
        self.result()?;
        Ok(self.0.bookings.lock().unwrap().clone())
    }

    fn bookings_on(&self, date: NaiveDate) -> Result<Vec<Booking>, BackendError> {
        self.0.calls_to_bookings_on.fetch_add(1, Ordering::SeqCst);
        self.result()?;
        Ok(self
            .0
            .bookings
            .lock()
            .unwrap()
            .iter()
            .filter(|booking| booking.date == date)
            .cloned()
            .collect())
    }

    fn create_booking(&self, booking: NewBooking) -> Result<Booking, BackendError> {
        self.0
            .calls_to_create_booking
            .fetch_add(1, Ordering::SeqCst);
        self.result()?;
        let booking = Booking {
            id: Uuid::new_v4(),
            name: booking.name,
            email: booking.email,
            date: booking.date,
            time: booking.time,
            created_at: Utc::now(),
        };
        self.0.bookings.lock().unwrap().push(booking.clone());
        Ok(booking)
    }
}
