//! In-memory booking store
//!
//! Ephemeral implementation for tests and the local console mode. One
//! mutex guards the whole collection; the conflict check and the insert
//! happen under a single hold, which is what upholds the no-double-booking
//! invariant here.

use std::collections::HashMap;

use async_trait::async_trait;
use parking_lot::Mutex;

use shared::models::{
    Booking, BookingFilter, BookingStatus, ContactProfile, NewBooking, Review,
};

use super::{BookingStore, StoreError, StoreResult};

#[derive(Debug, Default)]
struct Inner {
    next_id: i64,
    bookings: Vec<Booking>,
    profiles: HashMap<i64, ContactProfile>,
    reviews: Vec<Review>,
}

/// Ephemeral booking store.
#[derive(Debug, Default)]
pub struct MemoryStore {
    inner: Mutex<Inner>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

fn active_conflict(bookings: &[Booking], new: &NewBooking) -> bool {
    bookings.iter().any(|b| {
        b.status.is_active() && b.date == new.date && b.time == new.time && b.zone == new.zone
    })
}

#[async_trait]
impl BookingStore for MemoryStore {
    async fn insert(&self, new: NewBooking) -> StoreResult<Booking> {
        let mut inner = self.inner.lock();
        if active_conflict(&inner.bookings, &new) {
            return Err(StoreError::ZoneTaken {
                date: new.date,
                time: new.time,
                zone: new.zone,
            });
        }
        inner.next_id += 1;
        let booking = new.into_booking(inner.next_id);
        inner.bookings.push(booking.clone());
        Ok(booking)
    }

    async fn transition(
        &self,
        id: i64,
        allowed_from: &[BookingStatus],
        to: BookingStatus,
    ) -> StoreResult<Booking> {
        let mut inner = self.inner.lock();
        let booking = inner
            .bookings
            .iter_mut()
            .find(|b| b.id == id)
            .ok_or(StoreError::NotFound(id))?;
        if !allowed_from.contains(&booking.status) {
            return Err(StoreError::AlreadyFinalized {
                id,
                current: booking.status,
            });
        }
        booking.status = to;
        Ok(booking.clone())
    }

    async fn get(&self, id: i64) -> StoreResult<Option<Booking>> {
        let inner = self.inner.lock();
        Ok(inner.bookings.iter().find(|b| b.id == id).cloned())
    }

    async fn query(&self, filter: &BookingFilter) -> StoreResult<Vec<Booking>> {
        let inner = self.inner.lock();
        Ok(inner
            .bookings
            .iter()
            .filter(|b| filter.matches(b))
            .cloned()
            .collect())
    }

    async fn save_profile(&self, profile: ContactProfile) -> StoreResult<()> {
        let mut inner = self.inner.lock();
        inner.profiles.insert(profile.user_id, profile);
        Ok(())
    }

    async fn get_profile(&self, user_id: i64) -> StoreResult<Option<ContactProfile>> {
        let inner = self.inner.lock();
        Ok(inner.profiles.get(&user_id).cloned())
    }

    async fn save_review(&self, review: Review) -> StoreResult<()> {
        let mut inner = self.inner.lock();
        inner.reviews.push(review);
        Ok(())
    }

    async fn list_reviews(&self) -> StoreResult<Vec<Review>> {
        let inner = self.inner.lock();
        Ok(inner.reviews.clone())
    }
}
