//! Chat transport abstraction
//!
//! The core only needs "send a message" and "offer choices"; everything
//! else about the chat platform (polling, webhooks, keyboard rendering)
//! lives behind this trait in an external adapter. [`MemoryTransport`] is
//! the in-process implementation used by tests and the console mode.

pub mod memory;

pub use memory::MemoryTransport;

use async_trait::async_trait;
use thiserror::Error;

use shared::transport::Choice;

/// Transport error types
#[derive(Debug, Error)]
pub enum TransportError {
    #[error("delivery failed: {0}")]
    Delivery(String),
}

/// Outbound side of the chat seam.
///
/// Implementations must be safe to call concurrently; delivery is
/// best-effort from the core's point of view; a failed send never rolls
/// back committed state.
#[async_trait]
pub trait ChatTransport: Send + Sync {
    /// Send a free-text message.
    async fn send_text(&self, chat_id: i64, text: &str) -> Result<(), TransportError>;

    /// Send a prompt with an inline choice keyboard.
    async fn send_choices(
        &self,
        chat_id: i64,
        text: &str,
        choices: &[Choice],
    ) -> Result<(), TransportError>;
}
