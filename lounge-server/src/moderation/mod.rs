//! Moderation Workflow
//!
//! Role-guarded status transitions per booking. Every action follows the
//! same pipeline:
//!
//! ```text
//! execute(action)
//!     ├─ 1. Resolve the booking id (unknown id → NotFound, nothing runs)
//!     ├─ 2. Role / ownership guard (wrong actor → NotAuthorized, untouched)
//!     ├─ 3. Guarded store transition (stale source status → AlreadyFinalized)
//!     └─ 4. Return the updated booking + the event to dispatch
//! ```
//!
//! Step 3 re-reads the status inside the store's critical section, so a
//! duplicate tap reports "already <status>" instead of transitioning or
//! notifying twice.

pub mod actions;

pub use actions::{
    CancelOwnAction, ConfirmAction, ForceCancelAction, ModerationHandler, RejectAction,
};

use thiserror::Error;

use shared::callback::Callback;
use shared::models::{Booking, BookingStatus};

use crate::notify::BookingEvent;
use crate::store::{BookingStore, StoreError};

/// Moderation errors: every variant maps to a reply to the actor, none is
/// fatal.
#[derive(Debug, Error)]
pub enum ModerationError {
    #[error("not authorized")]
    NotAuthorized,

    #[error("booking not found: {0}")]
    NotFound(i64),

    #[error("booking {id} already {current}")]
    AlreadyFinalized { id: i64, current: BookingStatus },

    #[error("store failure: {0}")]
    Store(String),
}

impl From<StoreError> for ModerationError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::NotFound(id) => ModerationError::NotFound(id),
            StoreError::AlreadyFinalized { id, current } => {
                ModerationError::AlreadyFinalized { id, current }
            }
            other => ModerationError::Store(other.to_string()),
        }
    }
}

pub type ModerationResult = Result<(Booking, BookingEvent), ModerationError>;

/// What an action needs: the store and the designated admin identity.
pub struct ModerationContext<'a> {
    pub store: &'a dyn BookingStore,
    pub admin_user_id: i64,
}

impl ModerationContext<'_> {
    pub fn is_admin(&self, actor_id: i64) -> bool {
        actor_id == self.admin_user_id
    }

    /// Resolve a booking id to a record, or report NotFound.
    pub async fn booking(&self, id: i64) -> Result<Booking, ModerationError> {
        self.store
            .get(id)
            .await?
            .ok_or(ModerationError::NotFound(id))
    }
}

/// Route a moderation token to its action.
///
/// Returns `None` for tokens that are not moderation commands; those belong
/// to the dialog machine.
pub async fn execute(
    ctx: &ModerationContext<'_>,
    actor_id: i64,
    callback: &Callback,
) -> Option<ModerationResult> {
    let result = match callback {
        Callback::Confirm(id) => {
            ConfirmAction { booking_id: *id }.execute(ctx, actor_id).await
        }
        Callback::Reject(id) => RejectAction { booking_id: *id }.execute(ctx, actor_id).await,
        Callback::ForceCancel(id) => {
            ForceCancelAction { booking_id: *id }.execute(ctx, actor_id).await
        }
        Callback::CancelOwn(id) => {
            CancelOwnAction { booking_id: *id }.execute(ctx, actor_id).await
        }
        _ => return None,
    };

    if let Err(e) = &result {
        tracing::warn!(actor_id, callback = %callback, error = %e, "moderation action refused");
    }
    Some(result)
}

/// Reply shown to the actor when an action is refused.
pub fn refusal_reply(err: &ModerationError) -> String {
    match err {
        ModerationError::NotAuthorized => {
            "Ви не маєте прав для виконання цієї дії.".to_string()
        }
        ModerationError::NotFound(_) => "Бронювання не знайдено.".to_string(),
        ModerationError::AlreadyFinalized { current, .. } => {
            format!("Ця бронь вже «{}».", current.label())
        }
        ModerationError::Store(_) => {
            "Виникла помилка. Будь ласка, спробуйте ще раз.".to_string()
        }
    }
}
