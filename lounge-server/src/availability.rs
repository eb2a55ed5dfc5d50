//! Availability Checker
//!
//! Pure query: catalog minus the zones of active bookings for a
//! (date, time) pair. No caching: store state changes between calls, so
//! every decision point (offering zones, committing a draft) evaluates
//! this fresh.

use shared::catalog;
use shared::models::BookingFilter;

use crate::store::{BookingStore, StoreResult};

/// Zones free for the given date and slot, in catalog order.
pub async fn available_zones(
    store: &dyn BookingStore,
    date: &str,
    time: &str,
) -> StoreResult<Vec<&'static str>> {
    let filter = BookingFilter::active().with_date(date).with_time(time);
    let busy = store.query(&filter).await?;

    Ok(catalog::ZONES
        .iter()
        .copied()
        .filter(|zone| !busy.iter().any(|b| b.zone == *zone))
        .collect())
}

/// Whether one specific zone is still free for the given date and slot.
pub async fn zone_is_free(
    store: &dyn BookingStore,
    date: &str,
    time: &str,
    zone: &str,
) -> StoreResult<bool> {
    Ok(available_zones(store, date, time).await?.contains(&zone))
}
