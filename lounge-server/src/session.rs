//! Session Staging
//!
//! Per-user scratch space for in-progress dialogs, keyed by user identity
//! so one user cannot hold two concurrent drafts. Backed by a `DashMap`:
//! entries for different users never contend, and no shard lock is held
//! across a suspension point; handlers copy what they need out, await,
//! then write back.
//!
//! Lifecycle: created on dialog start, replaced wholesale if a new dialog
//! starts before completion, removed on completion or abandonment. No
//! implicit expiry; an abandoned draft lingers until overwritten.

use dashmap::DashMap;

use crate::dialog::state::{BookingDraft, DialogState};

/// One user's dialog position plus staged draft.
#[derive(Debug, Clone, Default)]
pub struct Session {
    pub state: DialogState,
    pub draft: BookingDraft,
}

/// Keyed session staging. Cheap to clone via `Arc` at the app layer.
#[derive(Debug, Default)]
pub struct SessionStore {
    sessions: DashMap<i64, Session>,
}

impl SessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Current dialog state; users without a session are at the main menu.
    pub fn state(&self, user_id: i64) -> DialogState {
        self.sessions
            .get(&user_id)
            .map(|s| s.state)
            .unwrap_or_default()
    }

    /// Move the user to a new state, keeping the draft.
    pub fn set_state(&self, user_id: i64, state: DialogState) {
        self.sessions.entry(user_id).or_default().state = state;
    }

    /// Start a fresh dialog: any previous draft is discarded, no merge.
    pub fn start(&self, user_id: i64, state: DialogState) {
        self.sessions.insert(
            user_id,
            Session {
                state,
                draft: BookingDraft::default(),
            },
        );
    }

    /// Snapshot of the user's draft, if a session exists.
    pub fn draft(&self, user_id: i64) -> Option<BookingDraft> {
        self.sessions.get(&user_id).map(|s| s.draft.clone())
    }

    /// Mutate the draft in place under the entry lock.
    pub fn update_draft(&self, user_id: i64, update: impl FnOnce(&mut BookingDraft)) {
        update(&mut self.sessions.entry(user_id).or_default().draft);
    }

    /// Remove the draft and return the user to the main menu.
    pub fn clear(&self, user_id: i64) {
        self.sessions.remove(&user_id);
    }

    /// Drop the staged draft entirely and take it for commit.
    pub fn take_draft(&self, user_id: i64) -> Option<BookingDraft> {
        self.sessions.remove(&user_id).map(|(_, s)| s.draft)
    }
}
