//! Moderation actions: one guarded status transition per file

pub mod cancel_own;
pub mod confirm;
pub mod force_cancel;
pub mod reject;

pub use cancel_own::CancelOwnAction;
pub use confirm::ConfirmAction;
pub use force_cancel::ForceCancelAction;
pub use reject::RejectAction;

use async_trait::async_trait;

use shared::models::Booking;

use super::{ModerationContext, ModerationError};
use crate::notify::BookingEvent;

/// A guarded status transition.
#[async_trait]
pub trait ModerationHandler {
    /// Validate the actor, apply the transition, and return the updated
    /// booking together with the event to dispatch. Refusals leave the
    /// booking untouched.
    async fn execute(
        &self,
        ctx: &ModerationContext<'_>,
        actor_id: i64,
    ) -> Result<(Booking, BookingEvent), ModerationError>;
}

#[cfg(test)]
pub(crate) mod test_support {
    use crate::store::MemoryStore;
    use shared::models::NewBooking;

    pub const ADMIN_ID: i64 = 999;
    pub const GUEST_ID: i64 = 100;

    pub fn guest_booking() -> NewBooking {
        NewBooking {
            user_id: GUEST_ID,
            chat_id: GUEST_ID,
            name: "Олена".to_string(),
            nickname: None,
            date: "30.07.2025".to_string(),
            time: "18:00".to_string(),
            guests: 4,
            zone: "Кабінка 1 (5-10 чол.)".to_string(),
            contact: "+380991234567".to_string(),
        }
    }

    pub fn store() -> MemoryStore {
        MemoryStore::new()
    }
}
