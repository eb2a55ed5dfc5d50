//! Guest self-cancellation
//!
//! `{Pending, Confirmed} → CancelledByGuest`, only for the booking's own
//! requester. Ownership is re-checked here, not trusted from whatever list
//! the guest tapped on earlier.

use async_trait::async_trait;

use shared::models::{ACTIVE_STATUSES, Booking, BookingStatus};

use super::{ModerationContext, ModerationError, ModerationHandler};
use crate::notify::BookingEvent;

#[derive(Debug, Clone)]
pub struct CancelOwnAction {
    pub booking_id: i64,
}

#[async_trait]
impl ModerationHandler for CancelOwnAction {
    async fn execute(
        &self,
        ctx: &ModerationContext<'_>,
        actor_id: i64,
    ) -> Result<(Booking, BookingEvent), ModerationError> {
        let booking = ctx.booking(self.booking_id).await?;

        if booking.user_id != actor_id {
            return Err(ModerationError::NotAuthorized);
        }

        let booking = ctx
            .store
            .transition(
                self.booking_id,
                &ACTIVE_STATUSES,
                BookingStatus::CancelledByGuest,
            )
            .await?;

        Ok((booking, BookingEvent::CancelledByGuest))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::moderation::actions::test_support::{ADMIN_ID, GUEST_ID, guest_booking, store};
    use crate::store::BookingStore;

    #[tokio::test]
    async fn test_owner_cancels_own_booking() {
        let store = store();
        let booking = store.insert(guest_booking()).await.unwrap();
        let ctx = ModerationContext {
            store: &store,
            admin_user_id: ADMIN_ID,
        };

        let (updated, event) = CancelOwnAction {
            booking_id: booking.id,
        }
        .execute(&ctx, GUEST_ID)
        .await
        .unwrap();

        assert_eq!(updated.status, BookingStatus::CancelledByGuest);
        assert_eq!(event, BookingEvent::CancelledByGuest);
    }

    #[tokio::test]
    async fn test_other_guest_is_refused() {
        let store = store();
        let booking = store.insert(guest_booking()).await.unwrap();
        let ctx = ModerationContext {
            store: &store,
            admin_user_id: ADMIN_ID,
        };

        let stranger = GUEST_ID + 1;
        assert!(matches!(
            (CancelOwnAction {
                booking_id: booking.id,
            })
            .execute(&ctx, stranger)
            .await,
            Err(ModerationError::NotAuthorized)
        ));

        let unchanged = store.get(booking.id).await.unwrap().unwrap();
        assert_eq!(unchanged.status, BookingStatus::Pending);
    }

    #[tokio::test]
    async fn test_admin_identity_does_not_bypass_ownership() {
        let store = store();
        let booking = store.insert(guest_booking()).await.unwrap();
        let ctx = ModerationContext {
            store: &store,
            admin_user_id: ADMIN_ID,
        };

        // The admin has force_cancel for this; the guest-cancel path stays
        // owner-only.
        assert!(matches!(
            (CancelOwnAction {
                booking_id: booking.id,
            })
            .execute(&ctx, ADMIN_ID)
            .await,
            Err(ModerationError::NotAuthorized)
        ));
    }

    #[tokio::test]
    async fn test_cancel_after_finalized_reports_status() {
        let store = store();
        let booking = store.insert(guest_booking()).await.unwrap();
        store
            .transition(booking.id, &[BookingStatus::Pending], BookingStatus::Rejected)
            .await
            .unwrap();
        let ctx = ModerationContext {
            store: &store,
            admin_user_id: ADMIN_ID,
        };

        match (CancelOwnAction {
            booking_id: booking.id,
        })
        .execute(&ctx, GUEST_ID)
        .await
        {
            Err(ModerationError::AlreadyFinalized { current, .. }) => {
                assert_eq!(current, BookingStatus::Rejected)
            }
            other => panic!("expected AlreadyFinalized, got {other:?}"),
        }
    }
}
