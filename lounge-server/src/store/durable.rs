//! redb-based durable booking store
//!
//! # Tables
//!
//! | Table | Key | Value | Purpose |
//! |-------|-----|-------|---------|
//! | `bookings` | booking id | `Booking` (JSON) | Full booking history |
//! | `contact_profiles` | user id | `ContactProfile` (JSON) | Saved contacts |
//! | `reviews` | review seq | `Review` (JSON) | Guest reviews |
//! | `sequence_counter` | name | `i64` | Id allocation |
//!
//! # Consistency
//!
//! redb allows one write transaction at a time, so the active-conflict scan
//! and the insert run in the same transaction; a concurrent submission for
//! the same (date, time, zone) serializes behind it and fails the scan.
//! Commits are durable as soon as `commit()` returns.

use std::path::Path;
use std::sync::Arc;

use async_trait::async_trait;
use redb::{Database, ReadableDatabase, ReadableTable, TableDefinition};

use shared::models::{
    Booking, BookingFilter, BookingStatus, ContactProfile, NewBooking, Review,
};

use super::{BookingStore, StoreError, StoreResult};

/// Bookings: key = booking id, value = JSON-serialized Booking
const BOOKINGS_TABLE: TableDefinition<i64, &[u8]> = TableDefinition::new("bookings");

/// Contact profiles: key = user id, value = JSON-serialized ContactProfile
const PROFILES_TABLE: TableDefinition<i64, &[u8]> = TableDefinition::new("contact_profiles");

/// Reviews: key = review sequence, value = JSON-serialized Review
const REVIEWS_TABLE: TableDefinition<i64, &[u8]> = TableDefinition::new("reviews");

/// Counters: key = counter name, value = last allocated id
const SEQUENCE_TABLE: TableDefinition<&str, i64> = TableDefinition::new("sequence_counter");

const BOOKING_ID_KEY: &str = "booking_id";
const REVIEW_ID_KEY: &str = "review_id";

impl From<redb::DatabaseError> for StoreError {
    fn from(err: redb::DatabaseError) -> Self {
        StoreError::Database(err.to_string())
    }
}

impl From<redb::TransactionError> for StoreError {
    fn from(err: redb::TransactionError) -> Self {
        StoreError::Database(err.to_string())
    }
}

impl From<redb::TableError> for StoreError {
    fn from(err: redb::TableError) -> Self {
        StoreError::Database(err.to_string())
    }
}

impl From<redb::StorageError> for StoreError {
    fn from(err: redb::StorageError) -> Self {
        StoreError::Database(err.to_string())
    }
}

impl From<redb::CommitError> for StoreError {
    fn from(err: redb::CommitError) -> Self {
        StoreError::Database(err.to_string())
    }
}

impl From<serde_json::Error> for StoreError {
    fn from(err: serde_json::Error) -> Self {
        StoreError::Database(err.to_string())
    }
}

/// Durable booking store backed by redb.
#[derive(Debug, Clone)]
pub struct RedbStore {
    db: Arc<Database>,
}

impl RedbStore {
    /// Open or create the database at the given path.
    pub fn open(path: impl AsRef<Path>) -> StoreResult<Self> {
        let db = Database::create(path)?;
        let store = Self { db: Arc::new(db) };
        store.init_tables()?;
        Ok(store)
    }

    /// Open an in-memory database (for testing).
    pub fn open_in_memory() -> StoreResult<Self> {
        let db = Database::builder().create_with_backend(redb::backends::InMemoryBackend::new())?;
        let store = Self { db: Arc::new(db) };
        store.init_tables()?;
        Ok(store)
    }

    fn init_tables(&self) -> StoreResult<()> {
        let write_txn = self.db.begin_write()?;
        {
            let _ = write_txn.open_table(BOOKINGS_TABLE)?;
            let _ = write_txn.open_table(PROFILES_TABLE)?;
            let _ = write_txn.open_table(REVIEWS_TABLE)?;
            let mut seq_table = write_txn.open_table(SEQUENCE_TABLE)?;
            if seq_table.get(BOOKING_ID_KEY)?.is_none() {
                seq_table.insert(BOOKING_ID_KEY, 0i64)?;
            }
            if seq_table.get(REVIEW_ID_KEY)?.is_none() {
                seq_table.insert(REVIEW_ID_KEY, 0i64)?;
            }
        }
        write_txn.commit()?;
        Ok(())
    }

    fn do_insert(&self, new: NewBooking) -> StoreResult<Booking> {
        let write_txn = self.db.begin_write()?;
        let booking = {
            let mut bookings = write_txn.open_table(BOOKINGS_TABLE)?;

            // Active-conflict scan and insert share this transaction.
            for result in bookings.iter()? {
                let (_key, value) = result?;
                let existing: Booking = serde_json::from_slice(value.value())?;
                if existing.status.is_active()
                    && existing.date == new.date
                    && existing.time == new.time
                    && existing.zone == new.zone
                {
                    return Err(StoreError::ZoneTaken {
                        date: new.date,
                        time: new.time,
                        zone: new.zone,
                    });
                }
            }

            let mut seq_table = write_txn.open_table(SEQUENCE_TABLE)?;
            let id = seq_table
                .get(BOOKING_ID_KEY)?
                .map(|g| g.value())
                .unwrap_or(0)
                + 1;
            seq_table.insert(BOOKING_ID_KEY, id)?;

            let booking = new.into_booking(id);
            bookings.insert(id, serde_json::to_vec(&booking)?.as_slice())?;
            booking
        };
        write_txn.commit()?;
        Ok(booking)
    }

    fn do_transition(
        &self,
        id: i64,
        allowed_from: &[BookingStatus],
        to: BookingStatus,
    ) -> StoreResult<Booking> {
        let write_txn = self.db.begin_write()?;
        let booking = {
            let mut bookings = write_txn.open_table(BOOKINGS_TABLE)?;
            let mut booking: Booking = match bookings.get(id)? {
                Some(value) => serde_json::from_slice(value.value())?,
                None => return Err(StoreError::NotFound(id)),
            };
            if !allowed_from.contains(&booking.status) {
                return Err(StoreError::AlreadyFinalized {
                    id,
                    current: booking.status,
                });
            }
            booking.status = to;
            bookings.insert(id, serde_json::to_vec(&booking)?.as_slice())?;
            booking
        };
        write_txn.commit()?;
        Ok(booking)
    }
}

#[async_trait]
impl BookingStore for RedbStore {
    async fn insert(&self, new: NewBooking) -> StoreResult<Booking> {
        self.do_insert(new)
    }

    async fn transition(
        &self,
        id: i64,
        allowed_from: &[BookingStatus],
        to: BookingStatus,
    ) -> StoreResult<Booking> {
        self.do_transition(id, allowed_from, to)
    }

    async fn get(&self, id: i64) -> StoreResult<Option<Booking>> {
        let read_txn = self.db.begin_read()?;
        let bookings = read_txn.open_table(BOOKINGS_TABLE)?;
        match bookings.get(id)? {
            Some(value) => Ok(Some(serde_json::from_slice(value.value())?)),
            None => Ok(None),
        }
    }

    async fn query(&self, filter: &BookingFilter) -> StoreResult<Vec<Booking>> {
        let read_txn = self.db.begin_read()?;
        let bookings = read_txn.open_table(BOOKINGS_TABLE)?;

        // Sequential ids make key order the insertion order.
        let mut matched = Vec::new();
        for result in bookings.iter()? {
            let (_key, value) = result?;
            let booking: Booking = serde_json::from_slice(value.value())?;
            if filter.matches(&booking) {
                matched.push(booking);
            }
        }
        Ok(matched)
    }

    async fn save_profile(&self, profile: ContactProfile) -> StoreResult<()> {
        let write_txn = self.db.begin_write()?;
        {
            let mut profiles = write_txn.open_table(PROFILES_TABLE)?;
            profiles.insert(profile.user_id, serde_json::to_vec(&profile)?.as_slice())?;
        }
        write_txn.commit()?;
        Ok(())
    }

    async fn get_profile(&self, user_id: i64) -> StoreResult<Option<ContactProfile>> {
        let read_txn = self.db.begin_read()?;
        let profiles = read_txn.open_table(PROFILES_TABLE)?;
        match profiles.get(user_id)? {
            Some(value) => Ok(Some(serde_json::from_slice(value.value())?)),
            None => Ok(None),
        }
    }

    async fn save_review(&self, review: Review) -> StoreResult<()> {
        let write_txn = self.db.begin_write()?;
        {
            let mut seq_table = write_txn.open_table(SEQUENCE_TABLE)?;
            let id = seq_table
                .get(REVIEW_ID_KEY)?
                .map(|g| g.value())
                .unwrap_or(0)
                + 1;
            seq_table.insert(REVIEW_ID_KEY, id)?;

            let mut reviews = write_txn.open_table(REVIEWS_TABLE)?;
            reviews.insert(id, serde_json::to_vec(&review)?.as_slice())?;
        }
        write_txn.commit()?;
        Ok(())
    }

    async fn list_reviews(&self) -> StoreResult<Vec<Review>> {
        let read_txn = self.db.begin_read()?;
        let reviews = read_txn.open_table(REVIEWS_TABLE)?;
        let mut all = Vec::new();
        for result in reviews.iter()? {
            let (_key, value) = result?;
            all.push(serde_json::from_slice(value.value())?);
        }
        Ok(all)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn new_booking(user_id: i64, zone: &str) -> NewBooking {
        NewBooking {
            user_id,
            chat_id: user_id,
            name: "Тест".to_string(),
            nickname: None,
            date: "30.07.2025".to_string(),
            time: "18:00".to_string(),
            guests: 4,
            zone: zone.to_string(),
            contact: "+380991234567".to_string(),
        }
    }

    #[tokio::test]
    async fn test_insert_get_round_trip() {
        let store = RedbStore::open_in_memory().unwrap();
        let inserted = store
            .insert(new_booking(1, "Кабінка 1 (5-10 чол.)"))
            .await
            .unwrap();
        assert_eq!(inserted.id, 1);
        assert_eq!(inserted.status, BookingStatus::Pending);

        let fetched = store.get(inserted.id).await.unwrap().unwrap();
        assert_eq!(inserted, fetched);
        assert_eq!(store.get(999).await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_conditional_insert_conflict() {
        let store = RedbStore::open_in_memory().unwrap();
        store.insert(new_booking(1, "Кабінка 1 (5-10 чол.)")).await.unwrap();

        let result = store.insert(new_booking(2, "Кабінка 1 (5-10 чол.)")).await;
        assert!(matches!(result, Err(StoreError::ZoneTaken { .. })));

        // Terminal statuses release the slot.
        store
            .transition(1, &[BookingStatus::Pending], BookingStatus::Rejected)
            .await
            .unwrap();
        assert!(store.insert(new_booking(2, "Кабінка 1 (5-10 чол.)")).await.is_ok());
    }

    #[tokio::test]
    async fn test_transition_idempotency_guard() {
        let store = RedbStore::open_in_memory().unwrap();
        let booking = store
            .insert(new_booking(1, "Кабінка 1 (5-10 чол.)"))
            .await
            .unwrap();

        store
            .transition(booking.id, &[BookingStatus::Pending], BookingStatus::Confirmed)
            .await
            .unwrap();

        match store
            .transition(booking.id, &[BookingStatus::Pending], BookingStatus::Rejected)
            .await
        {
            Err(StoreError::AlreadyFinalized { current, .. }) => {
                assert_eq!(current, BookingStatus::Confirmed)
            }
            other => panic!("expected AlreadyFinalized, got {other:?}"),
        }

        // The refused transition left the record untouched.
        let unchanged = store.get(booking.id).await.unwrap().unwrap();
        assert_eq!(unchanged.status, BookingStatus::Confirmed);
    }

    #[tokio::test]
    async fn test_query_matches_filter_in_insertion_order() {
        let store = RedbStore::open_in_memory().unwrap();
        store.insert(new_booking(1, "Кабінка 1 (5-10 чол.)")).await.unwrap();
        store.insert(new_booking(2, "Кабінка 2 (до 8 чол.)")).await.unwrap();
        store.insert(new_booking(1, "Кабінка 3 (до 6 чол.)")).await.unwrap();

        let all = store.query(&BookingFilter::default()).await.unwrap();
        assert_eq!(all.iter().map(|b| b.id).collect::<Vec<_>>(), vec![1, 2, 3]);

        let by_user = store
            .query(&BookingFilter::default().with_user(2))
            .await
            .unwrap();
        assert_eq!(by_user.len(), 1);
        assert_eq!(by_user[0].zone, "Кабінка 2 (до 8 чол.)");
    }

    #[tokio::test]
    async fn test_survives_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("bookings.redb");

        {
            let store = RedbStore::open(&path).unwrap();
            store.insert(new_booking(1, "Кабінка 1 (5-10 чол.)")).await.unwrap();
            store
                .save_profile(ContactProfile {
                    user_id: 1,
                    name: "Олена".to_string(),
                    contact: "+380991234567".to_string(),
                })
                .await
                .unwrap();
        }

        let store = RedbStore::open(&path).unwrap();
        let booking = store.get(1).await.unwrap().unwrap();
        assert_eq!(booking.user_id, 1);
        assert!(store.get_profile(1).await.unwrap().is_some());

        // Id allocation continues after the restart.
        let next = store.insert(new_booking(2, "Кабінка 2 (до 8 чол.)")).await.unwrap();
        assert_eq!(next.id, 2);
    }

    #[tokio::test]
    async fn test_reviews_append() {
        let store = RedbStore::open_in_memory().unwrap();
        store
            .save_review(Review {
                user_id: 1,
                rating: 5,
                text: "Чудова атмосфера".to_string(),
            })
            .await
            .unwrap();
        store
            .save_review(Review {
                user_id: 2,
                rating: 4,
                text: "Смачний кальян".to_string(),
            })
            .await
            .unwrap();

        let reviews = store.list_reviews().await.unwrap();
        assert_eq!(reviews.len(), 2);
        assert_eq!(reviews[0].rating, 5);
    }
}
