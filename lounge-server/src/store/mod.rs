//! Booking Store
//!
//! The only shared mutable resource in the system. All mutation goes
//! through [`BookingStore::insert`] and [`BookingStore::transition`], both
//! of which are atomic with respect to concurrent callers:
//!
//! - `insert` is *conditional*: it fails with [`StoreError::ZoneTaken`] when
//!   an active booking already occupies the (date, time, zone) triple, so
//!   two concurrent submissions for the last free zone cannot both land.
//! - `transition` re-reads the current status and applies the change in the
//!   same critical section, which is what makes moderation idempotent.
//!
//! Two implementations: [`MemoryStore`] (ephemeral) and [`RedbStore`]
//! (durable). The core logic never depends on which.

pub mod durable;
pub mod memory;

pub use durable::RedbStore;
pub use memory::MemoryStore;

use async_trait::async_trait;
use thiserror::Error;

use shared::models::{
    Booking, BookingFilter, BookingStatus, ContactProfile, NewBooking, Review,
};

/// Store error types
#[derive(Debug, Error)]
pub enum StoreError {
    /// Conditional insert refused: the slot already has an active booking.
    #[error("zone already booked: {zone} on {date} at {time}")]
    ZoneTaken {
        date: String,
        time: String,
        zone: String,
    },

    #[error("booking not found: {0}")]
    NotFound(i64),

    /// Transition refused: current status is outside the allowed source set.
    #[error("booking {id} already {current}")]
    AlreadyFinalized { id: i64, current: BookingStatus },

    #[error("database error: {0}")]
    Database(String),
}

/// Result type for store operations
pub type StoreResult<T> = Result<T, StoreError>;

/// Durable collection of bookings plus the two convenience caches
/// (contact profiles, reviews).
///
/// Bookings are never deleted; cancellation is a status change.
/// `query` returns bookings in insertion order.
#[async_trait]
pub trait BookingStore: Send + Sync {
    /// Conditional insert. Assigns the id, sets status to `Pending`.
    async fn insert(&self, new: NewBooking) -> StoreResult<Booking>;

    /// Guarded status transition: applied only if the current status is in
    /// `allowed_from`, otherwise [`StoreError::AlreadyFinalized`] reports
    /// what the status actually is. Returns the updated booking.
    async fn transition(
        &self,
        id: i64,
        allowed_from: &[BookingStatus],
        to: BookingStatus,
    ) -> StoreResult<Booking>;

    async fn get(&self, id: i64) -> StoreResult<Option<Booking>>;

    async fn query(&self, filter: &BookingFilter) -> StoreResult<Vec<Booking>>;

    /// Create or overwrite the saved name/contact pair for a user.
    async fn save_profile(&self, profile: ContactProfile) -> StoreResult<()>;

    async fn get_profile(&self, user_id: i64) -> StoreResult<Option<ContactProfile>>;

    async fn save_review(&self, review: Review) -> StoreResult<()>;

    async fn list_reviews(&self) -> StoreResult<Vec<Review>>;
}
