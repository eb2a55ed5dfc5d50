//! Transport payload types
//!
//! The chat transport itself (message delivery, keyboards, polling) is an
//! external collaborator. These are the payloads that cross that seam in
//! both directions, shared by every transport implementation.

use serde::{Deserialize, Serialize};

use crate::callback::Callback;

/// Inbound event from the chat transport.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Update {
    /// Stable identity of the sender.
    pub user_id: i64,
    /// Where replies to this sender go.
    pub chat_id: i64,
    /// Public handle of the sender, when the transport exposes one.
    #[serde(default)]
    pub username: Option<String>,
    pub payload: UpdatePayload,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "data", rename_all = "snake_case")]
pub enum UpdatePayload {
    /// Free-text message.
    Text(String),
    /// A previously offered selection token, echoed back.
    Selection(String),
}

impl Update {
    pub fn text(user_id: i64, chat_id: i64, text: impl Into<String>) -> Self {
        Self {
            user_id,
            chat_id,
            username: None,
            payload: UpdatePayload::Text(text.into()),
        }
    }

    pub fn selection(user_id: i64, chat_id: i64, token: impl Into<String>) -> Self {
        Self {
            user_id,
            chat_id,
            username: None,
            payload: UpdatePayload::Selection(token.into()),
        }
    }

    pub fn with_username(mut self, username: impl Into<String>) -> Self {
        self.username = Some(username.into());
        self
    }
}

/// One inline choice: the label shown to the guest and the token echoed
/// back on selection.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Choice {
    pub label: String,
    pub token: String,
}

impl Choice {
    pub fn new(label: impl Into<String>, callback: &Callback) -> Self {
        Self {
            label: label.into(),
            token: callback.encode(),
        }
    }
}

/// Outbound message: free-text prompt, optionally with a choice keyboard.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Outbound {
    pub chat_id: i64,
    pub text: String,
    /// Empty for plain prompts.
    pub choices: Vec<Choice>,
}

impl Outbound {
    pub fn text(chat_id: i64, text: impl Into<String>) -> Self {
        Self {
            chat_id,
            text: text.into(),
            choices: Vec::new(),
        }
    }

    pub fn with_choices(chat_id: i64, text: impl Into<String>, choices: Vec<Choice>) -> Self {
        Self {
            chat_id,
            text: text.into(),
            choices,
        }
    }
}
