//! Force-cancel action
//!
//! `{Pending, Confirmed} → CancelledByAdmin`, admin only. Unlike reject,
//! this also applies to bookings already confirmed.

use async_trait::async_trait;

use shared::models::{ACTIVE_STATUSES, Booking, BookingStatus};

use super::{ModerationContext, ModerationError, ModerationHandler};
use crate::notify::BookingEvent;

#[derive(Debug, Clone)]
pub struct ForceCancelAction {
    pub booking_id: i64,
}

#[async_trait]
impl ModerationHandler for ForceCancelAction {
    async fn execute(
        &self,
        ctx: &ModerationContext<'_>,
        actor_id: i64,
    ) -> Result<(Booking, BookingEvent), ModerationError> {
        ctx.booking(self.booking_id).await?;

        if !ctx.is_admin(actor_id) {
            return Err(ModerationError::NotAuthorized);
        }

        let booking = ctx
            .store
            .transition(
                self.booking_id,
                &ACTIVE_STATUSES,
                BookingStatus::CancelledByAdmin,
            )
            .await?;

        Ok((booking, BookingEvent::CancelledByAdmin))
    }
}
