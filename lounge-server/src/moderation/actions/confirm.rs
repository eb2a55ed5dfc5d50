//! Confirm action
//!
//! `Pending → Confirmed`, admin only.

use async_trait::async_trait;

use shared::models::{Booking, BookingStatus};

use super::{ModerationContext, ModerationError, ModerationHandler};
use crate::notify::BookingEvent;

#[derive(Debug, Clone)]
pub struct ConfirmAction {
    pub booking_id: i64,
}

#[async_trait]
impl ModerationHandler for ConfirmAction {
    async fn execute(
        &self,
        ctx: &ModerationContext<'_>,
        actor_id: i64,
    ) -> Result<(Booking, BookingEvent), ModerationError> {
        // Unknown ids are reported before any guard runs.
        ctx.booking(self.booking_id).await?;

        if !ctx.is_admin(actor_id) {
            return Err(ModerationError::NotAuthorized);
        }

        let booking = ctx
            .store
            .transition(
                self.booking_id,
                &[BookingStatus::Pending],
                BookingStatus::Confirmed,
            )
            .await?;

        Ok((booking, BookingEvent::Confirmed))
    }
}
