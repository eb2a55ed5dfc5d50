//! Shared types for the lounge booking service
//!
//! Common types used by the server crate and any transport adapter:
//! data models, the fixed venue catalogs, the selection-token codec,
//! and the transport payload types.

pub mod callback;
pub mod catalog;
pub mod models;
pub mod transport;

// Re-exports
pub use serde::{Deserialize, Serialize};

pub use callback::{Callback, CallbackError};
pub use models::{Booking, BookingFilter, BookingStatus, NewBooking};
pub use transport::{Choice, Outbound, Update, UpdatePayload};
