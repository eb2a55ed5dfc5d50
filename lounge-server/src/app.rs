//! Update router
//!
//! One inbound [`Update`] at a time per call; the run loop spawns a task per
//! update so different users' events process concurrently. Per-user
//! ordering comes from session keying plus the dialog machine's stale-step
//! rejection, not from any global lock.
//!
//! Routing: free text goes to the dialog machine; selection tokens are
//! decoded first: moderation commands run through the workflow, consent
//! tokens save the contact profile, everything else advances the dialog.

use std::sync::Arc;

use shared::callback::Callback;
use shared::models::{Booking, ContactProfile};
use shared::transport::{Update, UpdatePayload};

use crate::core::Config;
use crate::dialog::DialogEngine;
use crate::moderation::{self, ModerationContext};
use crate::notify::{BookingEvent, Notifier, format_booking};
use crate::session::SessionStore;
use crate::store::BookingStore;
use crate::transport::{ChatTransport, TransportError};

/// Owns the wiring: store, staging, dialog engine, notifier, transport.
pub struct BookingApp {
    store: Arc<dyn BookingStore>,
    transport: Arc<dyn ChatTransport>,
    dialog: DialogEngine,
    notifier: Arc<Notifier>,
    config: Config,
}

impl BookingApp {
    pub fn new(
        store: Arc<dyn BookingStore>,
        transport: Arc<dyn ChatTransport>,
        config: Config,
    ) -> Self {
        let sessions = Arc::new(SessionStore::new());
        let notifier = Arc::new(Notifier::new(
            transport.clone(),
            config.admin_user_id,
            config.broadcast_chat_id,
        ));
        let dialog = DialogEngine::new(
            store.clone(),
            sessions,
            notifier.clone(),
            transport.clone(),
            config.clone(),
        );
        Self {
            store,
            transport,
            dialog,
            notifier,
            config,
        }
    }

    /// Consume updates until the channel closes, one task per update.
    pub async fn run(self: Arc<Self>, mut updates: tokio::sync::mpsc::Receiver<Update>) {
        tracing::info!("booking app started");
        while let Some(update) = updates.recv().await {
            let app = Arc::clone(&self);
            tokio::spawn(async move {
                if let Err(e) = app.handle_update(update).await {
                    tracing::error!(error = %e, "update handling failed");
                }
            });
        }
        tracing::info!("update channel closed, booking app stopping");
    }

    /// Route one update. Transport errors bubble up for logging; everything
    /// else is already converted to a reply.
    pub async fn handle_update(&self, update: Update) -> Result<(), TransportError> {
        let Update {
            user_id,
            chat_id,
            username,
            payload,
        } = update;

        match payload {
            UpdatePayload::Text(text) => {
                self.dialog
                    .handle_text(user_id, chat_id, username.as_deref(), &text)
                    .await
            }
            UpdatePayload::Selection(token) => {
                let callback = match token.parse::<Callback>() {
                    Ok(callback) => callback,
                    Err(e) => {
                        tracing::warn!(user_id, token = %token, error = %e, "malformed selection token");
                        return self
                            .transport
                            .send_text(chat_id, "Невірний формат запиту. Спробуйте ще раз.")
                            .await;
                    }
                };
                self.handle_callback(user_id, chat_id, callback).await
            }
        }
    }

    async fn handle_callback(
        &self,
        user_id: i64,
        chat_id: i64,
        callback: Callback,
    ) -> Result<(), TransportError> {
        let ctx = ModerationContext {
            store: self.store.as_ref(),
            admin_user_id: self.config.admin_user_id,
        };

        match moderation::execute(&ctx, user_id, &callback).await {
            Some(Ok((booking, event))) => {
                // The transition is committed; notification is best-effort.
                self.notifier.notify(event, &booking).await;
                self.transport
                    .send_text(chat_id, &actor_reply(event, &booking))
                    .await
            }
            Some(Err(e)) => {
                self.transport
                    .send_text(chat_id, &moderation::refusal_reply(&e))
                    .await
            }
            None => match callback {
                Callback::SaveContact(booking_id) => {
                    self.handle_save_contact(user_id, chat_id, booking_id).await
                }
                other => self.dialog.handle_selection(user_id, chat_id, &other).await,
            },
        }
    }

    /// Consent token: copy the name/contact pair off the guest's own booking
    /// into their profile.
    async fn handle_save_contact(
        &self,
        user_id: i64,
        chat_id: i64,
        booking_id: i64,
    ) -> Result<(), TransportError> {
        let booking = match self.store.get(booking_id).await {
            Ok(Some(booking)) => booking,
            Ok(None) => {
                return self
                    .transport
                    .send_text(chat_id, "Бронювання не знайдено.")
                    .await;
            }
            Err(e) => {
                tracing::error!(user_id, booking_id, error = %e, "booking lookup failed");
                return self
                    .transport
                    .send_text(chat_id, "Виникла помилка. Будь ласка, спробуйте ще раз.")
                    .await;
            }
        };

        if booking.user_id != user_id {
            return self
                .transport
                .send_text(chat_id, "Ви не маєте прав для виконання цієї дії.")
                .await;
        }

        let profile = ContactProfile {
            user_id,
            name: booking.name,
            contact: booking.contact,
        };
        match self.store.save_profile(profile).await {
            Ok(()) => self.transport.send_text(chat_id, "Збережено ✅").await,
            Err(e) => {
                tracing::error!(user_id, error = %e, "profile save failed");
                self.transport
                    .send_text(chat_id, "Виникла помилка. Будь ласка, спробуйте ще раз.")
                    .await
            }
        }
    }
}

/// Reply to the actor whose action just landed.
fn actor_reply(event: BookingEvent, booking: &Booking) -> String {
    match event {
        BookingEvent::Confirmed => format!("✅ Підтверджено:\n\n{}", format_booking(booking)),
        BookingEvent::Rejected => format!("❌ Відхилено:\n\n{}", format_booking(booking)),
        BookingEvent::CancelledByAdmin => format!(
            "✅ Бронювання на {} о {} для {} скасовано адміністратором.",
            booking.date, booking.time, booking.name
        ),
        BookingEvent::CancelledByGuest => "✅ Ваше бронювання скасовано.".to_string(),
        // Submission notifications originate in the dialog, not here.
        BookingEvent::Submitted => format_booking(booking),
    }
}
