//! Reject action
//!
//! `Pending → Rejected`, admin only.

use async_trait::async_trait;

use shared::models::{Booking, BookingStatus};

use super::{ModerationContext, ModerationError, ModerationHandler};
use crate::notify::BookingEvent;

#[derive(Debug, Clone)]
pub struct RejectAction {
    pub booking_id: i64,
}

#[async_trait]
impl ModerationHandler for RejectAction {
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
                &[BookingStatus::Pending],
                BookingStatus::Rejected,
            )
            .await?;

        Ok((booking, BookingEvent::Rejected))
    }
}
