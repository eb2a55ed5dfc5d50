//! Lounge booking server: conversational reservation manager
//!
//! # Architecture
//!
//! Guest input flows through a per-user dialog state machine that stages a
//! booking draft, checks zone availability against the booking store, and on
//! completion inserts a `Pending` booking and notifies the admin. Moderation
//! actions (confirm/reject/force-cancel) and guest self-cancellation run as
//! guarded status transitions; the other party is notified best-effort.
//!
//! # Module structure
//!
//! ```text
//! lounge-server/src/
//! ├── core/          # config, bootstrap
//! ├── store/         # BookingStore trait + memory / redb implementations
//! ├── availability   # free-zone computation
//! ├── session        # per-user draft staging
//! ├── dialog/        # guest dialog state machine
//! ├── moderation/    # status-transition actions with role guards
//! ├── notify         # status-change notifications
//! ├── transport/     # abstract chat transport + in-process impl
//! └── app            # update router wiring it all together
//! ```

pub mod app;
pub mod availability;
pub mod core;
pub mod dialog;
pub mod moderation;
pub mod notify;
pub mod session;
pub mod store;
pub mod transport;
pub mod utils;

// Re-export public types
pub use app::BookingApp;
pub use core::{Config, setup_environment};
pub use notify::{BookingEvent, Notifier};
pub use session::SessionStore;
pub use store::{BookingStore, MemoryStore, RedbStore, StoreError, StoreResult};
pub use transport::{ChatTransport, MemoryTransport, TransportError};
