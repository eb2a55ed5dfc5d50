//! In-process transport implementation
//!
//! Outbound messages go to a tokio broadcast channel (for anything that
//! wants to stream them, e.g. the console mode) and into a captured outbox
//! that tests inspect.

use std::sync::Arc;

use async_trait::async_trait;
use parking_lot::Mutex;
use tokio::sync::broadcast;

use shared::transport::{Choice, Outbound};

use super::{ChatTransport, TransportError};

const CHANNEL_CAPACITY: usize = 1024;

/// In-process chat transport for tests and the console mode.
#[derive(Debug, Clone)]
pub struct MemoryTransport {
    tx: broadcast::Sender<Outbound>,
    outbox: Arc<Mutex<Vec<Outbound>>>,
}

impl MemoryTransport {
    pub fn new() -> Self {
        let (tx, _) = broadcast::channel(CHANNEL_CAPACITY);
        Self {
            tx,
            outbox: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// Subscribe to the outbound stream.
    pub fn subscribe(&self) -> broadcast::Receiver<Outbound> {
        self.tx.subscribe()
    }

    /// Everything sent so far, in order.
    pub fn outbox(&self) -> Vec<Outbound> {
        self.outbox.lock().clone()
    }

    /// Messages delivered to one chat, in order.
    pub fn sent_to(&self, chat_id: i64) -> Vec<Outbound> {
        self.outbox
            .lock()
            .iter()
            .filter(|m| m.chat_id == chat_id)
            .cloned()
            .collect()
    }

    /// Forget captured messages (test convenience).
    pub fn clear_outbox(&self) {
        self.outbox.lock().clear();
    }

    fn record(&self, message: Outbound) {
        self.outbox.lock().push(message.clone());
        // No subscribers is fine; the outbox already captured it.
        let _ = self.tx.send(message);
    }
}

impl Default for MemoryTransport {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ChatTransport for MemoryTransport {
    async fn send_text(&self, chat_id: i64, text: &str) -> Result<(), TransportError> {
        self.record(Outbound::text(chat_id, text));
        Ok(())
    }

    async fn send_choices(
        &self,
        chat_id: i64,
        text: &str,
        choices: &[Choice],
    ) -> Result<(), TransportError> {
        self.record(Outbound::with_choices(chat_id, text, choices.to_vec()));
        Ok(())
    }
}
