//! Dialog State Machine
//!
//! Drives a guest through the booking steps, validating input at each one:
//!
//! ```text
//! ChoosingAction ──▶ [CheckSavedContact] ──▶ BookingDate ──▶ BookingTime
//!       │                                                        │
//!       ├──▶ CancelPrompt                  BookingGuests ◀───────┘
//!       ├──▶ ReviewRating ──▶ ReviewText         │
//!       └──▶ AdminViewDate                 BookingZone ──▶ ContactName
//!                                                │              │
//!                                             (commit) ◀── ContactPhone
//! ```
//!
//! Invalid input re-enters the same state with no side effects. Zone
//! availability is computed fresh when zones are offered and once more at
//! commit; the store's conditional insert is the final authority, so losing
//! that race surfaces as a refreshed zone list, never a double booking.
//! Completion performs exactly one insert and one admin notification, then
//! resets to the main menu.

pub mod state;

pub use state::{BookingDraft, DialogState};

use std::sync::Arc;

use chrono::NaiveDate;

use shared::callback::Callback;
use shared::catalog;
use shared::models::{BookingFilter, ContactProfile, Review};
use shared::transport::Choice;

use crate::availability;
use crate::core::Config;
use crate::notify::{BookingEvent, Notifier, format_booking};
use crate::session::SessionStore;
use crate::store::{BookingStore, StoreError};
use crate::transport::{ChatTransport, TransportError};
use crate::utils::time::{DATE_FORMAT, DateError, format_booking_date, parse_booking_date};

// Main menu entries. The chat side renders these as a reply keyboard; the
// guest's tap arrives as the literal text.
pub const MENU_BOOK: &str = "📅 Забронювати столик";
pub const MENU_CANCEL: &str = "❌ Скасувати бронювання";
pub const MENU_REVIEW: &str = "⭐ Залишити відгук";
pub const MENU_ADMIN_VIEW: &str = "👀 Переглянути бронювання (адміну)";
pub const MENU_INSTAGRAM: &str = "📸 Instagram";
pub const MENU_CONTACT_ADMIN: &str = "📞 Зв'язатися з адміном";

const MSG_CHOOSE_FROM_MENU: &str = "Будь ласка, оберіть дію з меню.";
const MSG_DRAFT_LOST: &str = "Дані бронювання втрачені. Будь ласка, почніть знову.";
const MSG_STORE_FAILURE: &str = "Виникла помилка. Будь ласка, спробуйте ще раз.";
const MSG_ASK_DATE: &str =
    "На яку дату ви хочете забронювати столик? (наприклад, 30.07.2025)";
const MSG_BAD_DATE: &str =
    "Невірний формат дати. Будь ласка, введіть дату у форматі ДД.ММ.РРРР (наприклад, 30.07.2025).";
const MSG_PAST_DATE: &str =
    "Ви не можете забронювати столик на минулу дату. Будь ласка, введіть актуальну дату.";
const MSG_ALL_BUSY: &str =
    "На жаль, на цей час усі місця зайняті. Будь ласка, спробуйте інший час або дату.";

/// The guest-facing half of the core: consumes one user's inputs and
/// advances their session.
pub struct DialogEngine {
    store: Arc<dyn BookingStore>,
    sessions: Arc<SessionStore>,
    notifier: Arc<Notifier>,
    transport: Arc<dyn ChatTransport>,
    config: Config,
}

impl DialogEngine {
    pub fn new(
        store: Arc<dyn BookingStore>,
        sessions: Arc<SessionStore>,
        notifier: Arc<Notifier>,
        transport: Arc<dyn ChatTransport>,
        config: Config,
    ) -> Self {
        Self {
            store,
            sessions,
            notifier,
            transport,
            config,
        }
    }

    /// `/start`: discard any draft and show the main menu.
    pub async fn greet(&self, user_id: i64, chat_id: i64) -> Result<(), TransportError> {
        self.sessions.clear(user_id);
        let text = format!(
            "Привіт! Я бот для бронювання в кальянній.\nЩо бажаєш зробити?\n\nДля питань: {}\n\n{}",
            self.config.admin_phone,
            self.menu_text()
        );
        self.transport.send_text(chat_id, &text).await
    }

    /// Free-text input, dispatched on the user's current state.
    pub async fn handle_text(
        &self,
        user_id: i64,
        chat_id: i64,
        username: Option<&str>,
        text: &str,
    ) -> Result<(), TransportError> {
        if text.trim() == "/start" {
            return self.greet(user_id, chat_id).await;
        }

        match self.sessions.state(user_id) {
            DialogState::ChoosingAction => {
                self.handle_menu_choice(user_id, chat_id, username, text.trim()).await
            }
            DialogState::BookingDate => self.handle_date(user_id, chat_id, text).await,
            DialogState::BookingTime => {
                self.transport
                    .send_text(chat_id, "Будь ласка, оберіть час кнопкою.")
                    .await
            }
            DialogState::BookingGuests => self.handle_guests(user_id, chat_id, text).await,
            DialogState::BookingZone => {
                self.transport
                    .send_text(chat_id, "Будь ласка, оберіть місце кнопкою.")
                    .await
            }
            DialogState::ContactName => self.handle_name(user_id, chat_id, text).await,
            DialogState::ContactPhone => self.handle_phone(user_id, chat_id, text).await,
            DialogState::CheckSavedContact => {
                self.transport
                    .send_text(chat_id, "Будь ласка, оберіть варіант кнопкою.")
                    .await
            }
            DialogState::CancelPrompt => {
                // Text instead of a tap: back to the menu.
                self.sessions.clear(user_id);
                self.send_menu(chat_id, "Повертаю вас до головного меню.").await
            }
            DialogState::ReviewRating => {
                self.transport
                    .send_text(chat_id, "Будь ласка, оберіть оцінку кнопкою.")
                    .await
            }
            DialogState::ReviewText => self.handle_review_text(user_id, chat_id, text).await,
            DialogState::AdminViewDate => self.handle_admin_date(user_id, chat_id, text).await,
        }
    }

    /// A previously offered selection token, dispatched on state.
    pub async fn handle_selection(
        &self,
        user_id: i64,
        chat_id: i64,
        callback: &Callback,
    ) -> Result<(), TransportError> {
        match callback {
            Callback::Time(slot) => self.handle_time_pick(user_id, chat_id, slot).await,
            Callback::Zone(index) => self.handle_zone_pick(user_id, chat_id, *index).await,
            Callback::Rate(rating) => self.handle_rating(user_id, chat_id, *rating).await,
            Callback::UseSaved(accept) => {
                self.handle_saved_contact_answer(user_id, chat_id, *accept).await
            }
            other => {
                tracing::debug!(user_id, callback = %other, "selection token outside dialog scope");
                Ok(())
            }
        }
    }

    // ========== Main menu ==========

    async fn handle_menu_choice(
        &self,
        user_id: i64,
        chat_id: i64,
        username: Option<&str>,
        text: &str,
    ) -> Result<(), TransportError> {
        match text {
            MENU_BOOK => self.start_booking(user_id, chat_id, username).await,
            MENU_CANCEL => self.start_cancellation(user_id, chat_id).await,
            MENU_REVIEW => {
                self.sessions.start(user_id, DialogState::ReviewRating);
                let choices: Vec<Choice> = (1..=5u8)
                    .map(|r| Choice::new("⭐".repeat(r as usize), &Callback::Rate(r)))
                    .collect();
                self.transport
                    .send_choices(chat_id, "Оцініть нас від 1 до 5:", &choices)
                    .await
            }
            MENU_ADMIN_VIEW => {
                if !self.config.is_admin(user_id) {
                    return self
                        .transport
                        .send_text(chat_id, "Ця функція тільки для адміністратора.")
                        .await;
                }
                self.sessions.start(user_id, DialogState::AdminViewDate);
                self.transport
                    .send_text(
                        chat_id,
                        "На яку дату ви хочете переглянути бронювання? (наприклад, 30.07.2025)",
                    )
                    .await
            }
            MENU_INSTAGRAM => {
                let text = format!("Наш Instagram: {}", self.config.instagram_url);
                self.transport.send_text(chat_id, &text).await
            }
            MENU_CONTACT_ADMIN => {
                let text = format!(
                    "Номер телефону адміністратора: {}",
                    self.config.admin_phone
                );
                self.transport.send_text(chat_id, &text).await
            }
            _ => self.send_menu(chat_id, MSG_CHOOSE_FROM_MENU).await,
        }
    }

    async fn start_booking(
        &self,
        user_id: i64,
        chat_id: i64,
        username: Option<&str>,
    ) -> Result<(), TransportError> {
        // Replaces any earlier draft, no merge semantics.
        self.sessions.start(user_id, DialogState::BookingDate);
        if let Some(username) = username {
            let username = username.to_string();
            self.sessions
                .update_draft(user_id, |d| d.nickname = Some(username));
        }

        // The profile is a convenience cache: failure to read it just means
        // the guest types their contacts again.
        match self.store.get_profile(user_id).await {
            Ok(Some(profile)) => {
                self.sessions.set_state(user_id, DialogState::CheckSavedContact);
                let text = format!(
                    "Використати збережені контакти?\n{} — {}",
                    profile.name, profile.contact
                );
                let choices = vec![
                    Choice::new("✅ Так", &Callback::UseSaved(true)),
                    Choice::new("✍️ Ввести заново", &Callback::UseSaved(false)),
                ];
                self.transport.send_choices(chat_id, &text, &choices).await
            }
            Ok(None) => self.transport.send_text(chat_id, MSG_ASK_DATE).await,
            Err(e) => {
                tracing::warn!(user_id, error = %e, "contact profile lookup failed");
                self.transport.send_text(chat_id, MSG_ASK_DATE).await
            }
        }
    }

    async fn start_cancellation(&self, user_id: i64, chat_id: i64) -> Result<(), TransportError> {
        let filter = BookingFilter::active().with_user(user_id);
        let bookings = match self.store.query(&filter).await {
            Ok(bookings) => bookings,
            Err(e) => {
                tracing::error!(user_id, error = %e, "booking list query failed");
                return self.transport.send_text(chat_id, MSG_STORE_FAILURE).await;
            }
        };

        if bookings.is_empty() {
            return self
                .transport
                .send_text(chat_id, "У вас немає активних бронювань.")
                .await;
        }

        self.sessions.start(user_id, DialogState::CancelPrompt);
        self.transport
            .send_text(chat_id, "Ваші активні бронювання:")
            .await?;
        for booking in bookings {
            let choices = vec![Choice::new(
                "❌ Скасувати цю бронь",
                &Callback::CancelOwn(booking.id),
            )];
            self.transport
                .send_choices(chat_id, &format_booking(&booking), &choices)
                .await?;
        }
        Ok(())
    }

    // ========== Booking steps ==========

    async fn handle_date(
        &self,
        user_id: i64,
        chat_id: i64,
        text: &str,
    ) -> Result<(), TransportError> {
        match parse_booking_date(text, self.config.venue_tz) {
            Ok(date) => {
                let normalized = format_booking_date(date);
                self.sessions
                    .update_draft(user_id, |d| d.date = Some(normalized));
                self.sessions.set_state(user_id, DialogState::BookingTime);
                self.transport
                    .send_choices(chat_id, "Оберіть час:", &slot_choices())
                    .await
            }
            Err(DateError::InvalidFormat(_)) => {
                self.transport.send_text(chat_id, MSG_BAD_DATE).await
            }
            Err(DateError::InPast(_)) => self.transport.send_text(chat_id, MSG_PAST_DATE).await,
        }
    }

    async fn handle_time_pick(
        &self,
        user_id: i64,
        chat_id: i64,
        slot: &str,
    ) -> Result<(), TransportError> {
        if self.sessions.state(user_id) != DialogState::BookingTime {
            return self.reject_stale_step(user_id, chat_id).await;
        }
        // Only values from the offered grid are accepted.
        if !catalog::is_valid_slot(slot) {
            return self
                .transport
                .send_choices(chat_id, "Будь ласка, оберіть час зі списку:", &slot_choices())
                .await;
        }
        let Some(draft) = self.sessions.draft(user_id) else {
            return self.report_draft_lost(user_id, chat_id).await;
        };
        if draft.date.is_none() {
            return self.report_draft_lost(user_id, chat_id).await;
        }

        let slot = slot.to_string();
        self.sessions
            .update_draft(user_id, |d| d.time = Some(slot.clone()));
        self.sessions.set_state(user_id, DialogState::BookingGuests);
        let text = format!("Ви обрали {slot}. Тепер, скільки вас буде?");
        self.transport.send_text(chat_id, &text).await
    }

    async fn handle_guests(
        &self,
        user_id: i64,
        chat_id: i64,
        text: &str,
    ) -> Result<(), TransportError> {
        let guests = match text.trim().parse::<i64>() {
            Ok(n) if n > 0 => n as u32,
            Ok(_) => {
                return self
                    .transport
                    .send_text(
                        chat_id,
                        "Кількість гостей має бути позитивним числом. Будь ласка, введіть коректну кількість.",
                    )
                    .await;
            }
            Err(_) => {
                return self
                    .transport
                    .send_text(
                        chat_id,
                        "Невірний формат. Будь ласка, введіть кількість гостей числом.",
                    )
                    .await;
            }
        };

        self.sessions.update_draft(user_id, |d| d.guests = Some(guests));

        let draft = self.sessions.draft(user_id).unwrap_or_default();
        let (Some(date), Some(time)) = (draft.date, draft.time) else {
            return self.report_draft_lost(user_id, chat_id).await;
        };
        self.offer_zones(user_id, chat_id, &date, &time).await
    }

    /// Compute availability fresh and present the zone keyboard, or bail to
    /// the menu when nothing is free.
    async fn offer_zones(
        &self,
        user_id: i64,
        chat_id: i64,
        date: &str,
        time: &str,
    ) -> Result<(), TransportError> {
        let free = match availability::available_zones(self.store.as_ref(), date, time).await {
            Ok(free) => free,
            Err(e) => {
                tracing::error!(user_id, error = %e, "availability query failed");
                return self.transport.send_text(chat_id, MSG_STORE_FAILURE).await;
            }
        };

        if free.is_empty() {
            self.sessions.clear(user_id);
            self.transport.send_text(chat_id, MSG_ALL_BUSY).await?;
            return self.send_menu(chat_id, "Повертаю вас до головного меню.").await;
        }

        self.sessions.set_state(user_id, DialogState::BookingZone);
        self.transport
            .send_choices(chat_id, "Оберіть місце або зону:", &zone_choices(&free))
            .await
    }

    async fn handle_zone_pick(
        &self,
        user_id: i64,
        chat_id: i64,
        index: usize,
    ) -> Result<(), TransportError> {
        if self.sessions.state(user_id) != DialogState::BookingZone {
            return self.reject_stale_step(user_id, chat_id).await;
        }
        let Some(zone) = catalog::zone_by_index(index) else {
            // Parser bounds-checks, so this is a stale catalog at worst.
            return self.reject_stale_step(user_id, chat_id).await;
        };
        let Some(draft) = self.sessions.draft(user_id) else {
            return self.report_draft_lost(user_id, chat_id).await;
        };
        let (Some(date), Some(time)) = (draft.date.clone(), draft.time.clone()) else {
            return self.report_draft_lost(user_id, chat_id).await;
        };
        if draft.guests.is_none() {
            return self.report_draft_lost(user_id, chat_id).await;
        }

        // The guest may have dawdled; the offer list could be stale.
        match availability::zone_is_free(self.store.as_ref(), &date, &time, zone).await {
            Ok(true) => {}
            Ok(false) => {
                self.transport
                    .send_text(chat_id, "На жаль, це місце щойно зайняли.")
                    .await?;
                return self.offer_zones(user_id, chat_id, &date, &time).await;
            }
            Err(e) => {
                tracing::error!(user_id, error = %e, "availability re-check failed");
                return self.transport.send_text(chat_id, MSG_STORE_FAILURE).await;
            }
        }

        self.sessions
            .update_draft(user_id, |d| d.zone = Some(zone.to_string()));

        if self.sessions.draft(user_id).is_some_and(|d| d.has_contact()) {
            // Saved profile accepted earlier, nothing left to collect.
            return self.commit_draft(user_id, chat_id).await;
        }

        self.sessions.set_state(user_id, DialogState::ContactName);
        self.transport.send_text(chat_id, "Як вас звати?").await
    }

    async fn handle_name(
        &self,
        user_id: i64,
        chat_id: i64,
        text: &str,
    ) -> Result<(), TransportError> {
        let name = text.trim();
        if name.is_empty() {
            return self
                .transport
                .send_text(chat_id, "Будь ласка, введіть ім'я.")
                .await;
        }
        let name = name.to_string();
        self.sessions.update_draft(user_id, |d| d.name = Some(name));
        self.sessions.set_state(user_id, DialogState::ContactPhone);
        self.transport
            .send_text(chat_id, "Ваш номер телефону? (наприклад, +380991234567)")
            .await
    }

    async fn handle_phone(
        &self,
        user_id: i64,
        chat_id: i64,
        text: &str,
    ) -> Result<(), TransportError> {
        let contact = text.trim();
        if contact.is_empty() {
            return self
                .transport
                .send_text(chat_id, "Будь ласка, введіть номер телефону.")
                .await;
        }
        let contact = contact.to_string();
        self.sessions
            .update_draft(user_id, |d| d.contact = Some(contact));
        self.commit_draft(user_id, chat_id).await
    }

    /// Completion: validate the draft, close the availability race window,
    /// insert exactly once, notify the admin exactly once, reset to the menu.
    async fn commit_draft(&self, user_id: i64, chat_id: i64) -> Result<(), TransportError> {
        let Some(draft) = self.sessions.take_draft(user_id) else {
            return self.report_draft_lost(user_id, chat_id).await;
        };
        let Some(new) = draft.clone().into_new_booking(user_id, chat_id) else {
            // A restart wiped part of the staging; never persist a partial.
            return self.report_draft_lost(user_id, chat_id).await;
        };

        match availability::zone_is_free(self.store.as_ref(), &new.date, &new.time, &new.zone)
            .await
        {
            Ok(true) => {}
            Ok(false) => return self.reoffer_after_conflict(user_id, chat_id, draft).await,
            Err(e) => {
                tracing::error!(user_id, error = %e, "commit-time availability check failed");
                return self.restore_for_retry(user_id, chat_id, draft).await;
            }
        }

        match self.store.insert(new).await {
            Ok(booking) => {
                tracing::info!(booking_id = booking.id, user_id, "booking submitted");
                self.transport
                    .send_text(chat_id, "✅ Дякуємо! Ми отримали твоє бронювання.")
                    .await?;
                self.transport
                    .send_text(chat_id, "📬 Чекаємо на підтвердження адміністратором.")
                    .await?;

                self.notifier.notify(BookingEvent::Submitted, &booking).await;
                self.offer_contact_save(user_id, chat_id, &booking.name, &booking.contact, booking.id)
                    .await?;
                self.send_menu(chat_id, "Щось ще?").await
            }
            // Lost the insert race despite the re-check: same recovery.
            Err(StoreError::ZoneTaken { .. }) => {
                self.reoffer_after_conflict(user_id, chat_id, draft).await
            }
            Err(e) => {
                tracing::error!(user_id, error = %e, "booking insert failed");
                self.restore_for_retry(user_id, chat_id, draft).await
            }
        }
    }

    /// The picked zone got taken underneath the guest: clear it, restage the
    /// rest of the draft and offer what is still free.
    async fn reoffer_after_conflict(
        &self,
        user_id: i64,
        chat_id: i64,
        mut draft: BookingDraft,
    ) -> Result<(), TransportError> {
        draft.zone = None;
        let (Some(date), Some(time)) = (draft.date.clone(), draft.time.clone()) else {
            return self.report_draft_lost(user_id, chat_id).await;
        };

        self.sessions.start(user_id, DialogState::BookingZone);
        let restored = draft;
        self.sessions.update_draft(user_id, move |d| *d = restored);

        self.transport
            .send_text(chat_id, "На жаль, це місце щойно зайняли.")
            .await?;
        self.offer_zones(user_id, chat_id, &date, &time).await
    }

    /// Store failure mid-commit: keep the draft so re-sending the phone
    /// retries the submission.
    async fn restore_for_retry(
        &self,
        user_id: i64,
        chat_id: i64,
        draft: BookingDraft,
    ) -> Result<(), TransportError> {
        self.sessions.start(user_id, DialogState::ContactPhone);
        self.sessions.update_draft(user_id, move |d| *d = draft);
        self.transport
            .send_text(
                chat_id,
                "Виникла помилка при збереженні бронювання. Будь ласка, надішліть номер ще раз.",
            )
            .await
    }

    /// Offer to remember the contact pair; written only on explicit consent.
    async fn offer_contact_save(
        &self,
        user_id: i64,
        chat_id: i64,
        name: &str,
        contact: &str,
        booking_id: i64,
    ) -> Result<(), TransportError> {
        let already_saved = matches!(
            self.store.get_profile(user_id).await,
            Ok(Some(profile)) if profile.name == name && profile.contact == contact
        );
        if already_saved {
            return Ok(());
        }
        let choices = vec![Choice::new("💾 Зберегти", &Callback::SaveContact(booking_id))];
        self.transport
            .send_choices(
                chat_id,
                "Зберегти ім'я та телефон для наступних бронювань?",
                &choices,
            )
            .await
    }

    // ========== Saved contact ==========

    async fn handle_saved_contact_answer(
        &self,
        user_id: i64,
        chat_id: i64,
        accept: bool,
    ) -> Result<(), TransportError> {
        if self.sessions.state(user_id) != DialogState::CheckSavedContact {
            return self.reject_stale_step(user_id, chat_id).await;
        }

        if accept {
            match self.store.get_profile(user_id).await {
                Ok(Some(ContactProfile { name, contact, .. })) => {
                    self.sessions.update_draft(user_id, |d| {
                        d.name = Some(name);
                        d.contact = Some(contact);
                    });
                }
                Ok(None) => {
                    tracing::warn!(user_id, "saved profile vanished before acceptance");
                }
                Err(e) => {
                    tracing::warn!(user_id, error = %e, "contact profile read failed");
                }
            }
        }

        self.sessions.set_state(user_id, DialogState::BookingDate);
        self.transport.send_text(chat_id, MSG_ASK_DATE).await
    }

    // ========== Review branch ==========

    async fn handle_rating(
        &self,
        user_id: i64,
        chat_id: i64,
        rating: u8,
    ) -> Result<(), TransportError> {
        if self.sessions.state(user_id) != DialogState::ReviewRating {
            return self.reject_stale_step(user_id, chat_id).await;
        }
        self.sessions.update_draft(user_id, |d| d.rating = Some(rating));
        self.sessions.set_state(user_id, DialogState::ReviewText);
        self.transport
            .send_text(chat_id, "Напишіть кілька слів про ваш візит:")
            .await
    }

    async fn handle_review_text(
        &self,
        user_id: i64,
        chat_id: i64,
        text: &str,
    ) -> Result<(), TransportError> {
        let body = text.trim();
        if body.is_empty() {
            return self
                .transport
                .send_text(chat_id, "Будь ласка, напишіть кілька слів.")
                .await;
        }
        let Some(rating) = self.sessions.draft(user_id).and_then(|d| d.rating) else {
            return self.report_draft_lost(user_id, chat_id).await;
        };

        let review = Review {
            user_id,
            rating,
            text: body.to_string(),
        };
        if let Err(e) = self.store.save_review(review).await {
            tracing::error!(user_id, error = %e, "review save failed");
            return self.transport.send_text(chat_id, MSG_STORE_FAILURE).await;
        }

        self.sessions.clear(user_id);
        self.transport.send_text(chat_id, "Дякуємо за відгук! 🙏").await?;
        self.send_menu(chat_id, "Щось ще?").await
    }

    // ========== Admin date view ==========

    async fn handle_admin_date(
        &self,
        user_id: i64,
        chat_id: i64,
        text: &str,
    ) -> Result<(), TransportError> {
        // Format check only; the admin may inspect past days.
        let Ok(date) = NaiveDate::parse_from_str(text.trim(), DATE_FORMAT) else {
            return self.transport.send_text(chat_id, MSG_BAD_DATE).await;
        };
        let date = format_booking_date(date);

        let filter = BookingFilter::active().with_date(date.clone());
        let bookings = match self.store.query(&filter).await {
            Ok(bookings) => bookings,
            Err(e) => {
                tracing::error!(user_id, error = %e, "admin date query failed");
                return self.transport.send_text(chat_id, MSG_STORE_FAILURE).await;
            }
        };

        self.sessions.clear(user_id);
        if bookings.is_empty() {
            let text = format!("На {date} немає активних бронювань.");
            return self.transport.send_text(chat_id, &text).await;
        }

        self.transport
            .send_text(chat_id, &format!("Ось бронювання на {date}:"))
            .await?;
        for booking in bookings {
            let choices = vec![Choice::new(
                "❌ Скасувати цю бронь",
                &Callback::ForceCancel(booking.id),
            )];
            self.transport
                .send_choices(chat_id, &format_booking(&booking), &choices)
                .await?;
        }
        self.send_menu(chat_id, "Щось ще?").await
    }

    // ========== Shared replies ==========

    async fn report_draft_lost(&self, user_id: i64, chat_id: i64) -> Result<(), TransportError> {
        tracing::warn!(user_id, "draft lost mid-dialog");
        self.sessions.clear(user_id);
        self.transport.send_text(chat_id, MSG_DRAFT_LOST).await?;
        self.send_menu(chat_id, "Повертаю вас до головного меню.").await
    }

    /// A token for a step the user is no longer on (replayed or out of
    /// order) is rejected without side effects.
    async fn reject_stale_step(&self, user_id: i64, chat_id: i64) -> Result<(), TransportError> {
        tracing::debug!(user_id, "stale selection rejected");
        self.transport
            .send_text(
                chat_id,
                "Цей крок вже неактуальний. Будь ласка, скористайтесь меню.",
            )
            .await
    }

    async fn send_menu(&self, chat_id: i64, lead: &str) -> Result<(), TransportError> {
        let text = format!("{lead}\n\n{}", self.menu_text());
        self.transport.send_text(chat_id, &text).await
    }

    fn menu_text(&self) -> String {
        format!(
            "{MENU_BOOK}\n{MENU_CANCEL}\n{MENU_REVIEW}\n{MENU_INSTAGRAM}\n{MENU_CONTACT_ADMIN}\n{MENU_ADMIN_VIEW}"
        )
    }
}

fn slot_choices() -> Vec<Choice> {
    catalog::time_slots()
        .into_iter()
        .map(|slot| {
            let token = Callback::Time(slot.clone());
            Choice::new(slot, &token)
        })
        .collect()
}

fn zone_choices(free: &[&'static str]) -> Vec<Choice> {
    free.iter()
        .filter_map(|zone| {
            catalog::zone_index(zone).map(|index| Choice::new(*zone, &Callback::Zone(index)))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryStore;
    use crate::transport::MemoryTransport;
    use shared::models::{BookingStatus, NewBooking};

    const GUEST: i64 = 100;
    const ADMIN: i64 = 999;

    struct Harness {
        engine: DialogEngine,
        store: Arc<MemoryStore>,
        transport: Arc<MemoryTransport>,
        sessions: Arc<SessionStore>,
    }

    fn harness() -> Harness {
        let store = Arc::new(MemoryStore::new());
        let transport = Arc::new(MemoryTransport::new());
        let sessions = Arc::new(SessionStore::new());
        let notifier = Arc::new(Notifier::new(transport.clone(), ADMIN, None));
        let config = Config::with_overrides("/tmp/lounge-test", ADMIN);
        let engine = DialogEngine::new(
            store.clone(),
            sessions.clone(),
            notifier,
            transport.clone(),
            config,
        );
        Harness {
            engine,
            store,
            transport,
            sessions,
        }
    }

    fn future_date() -> String {
        format_booking_date(crate::utils::time::venue_today(chrono_tz::Europe::Kyiv) + chrono::Duration::days(7))
    }

    async fn text(h: &Harness, user: i64, s: &str) {
        h.engine.handle_text(user, user, None, s).await.unwrap();
    }

    async fn pick(h: &Harness, user: i64, callback: Callback) {
        h.engine.handle_selection(user, user, &callback).await.unwrap();
    }

    async fn walk_to_zone(h: &Harness, user: i64) {
        text(h, user, MENU_BOOK).await;
        text(h, user, &future_date()).await;
        pick(h, user, Callback::Time("18:00".to_string())).await;
        text(h, user, "4").await;
    }

    #[tokio::test]
    async fn test_full_booking_flow_inserts_pending_and_notifies_admin() {
        let h = harness();

        walk_to_zone(&h, GUEST).await;
        pick(&h, GUEST, Callback::Zone(0)).await;
        text(&h, GUEST, "Олена").await;
        text(&h, GUEST, "+380991234567").await;

        let bookings = h.store.query(&BookingFilter::default()).await.unwrap();
        assert_eq!(bookings.len(), 1);
        let booking = &bookings[0];
        assert_eq!(booking.status, BookingStatus::Pending);
        assert_eq!(booking.zone, catalog::ZONES[0]);
        assert_eq!(booking.guests, 4);

        // Exactly one moderation prompt reached the admin.
        let admin_prompts: Vec<_> = h
            .transport
            .sent_to(ADMIN)
            .into_iter()
            .filter(|m| !m.choices.is_empty())
            .collect();
        assert_eq!(admin_prompts.len(), 1);
        assert_eq!(admin_prompts[0].choices[0].token, format!("confirm:{}", booking.id));

        // Dialog reset to the menu.
        assert_eq!(h.sessions.state(GUEST), DialogState::ChoosingAction);
    }

    #[tokio::test]
    async fn test_bad_date_reprompts_without_advancing() {
        let h = harness();
        text(&h, GUEST, MENU_BOOK).await;

        text(&h, GUEST, "not a date").await;
        assert_eq!(h.sessions.state(GUEST), DialogState::BookingDate);

        text(&h, GUEST, "01.01.2020").await;
        assert_eq!(h.sessions.state(GUEST), DialogState::BookingDate);
        let last = h.transport.sent_to(GUEST).pop().unwrap();
        assert!(last.text.contains("минулу дату"));
    }

    #[tokio::test]
    async fn test_invalid_guest_count_reprompts_without_side_effects() {
        let h = harness();
        text(&h, GUEST, MENU_BOOK).await;
        text(&h, GUEST, &future_date()).await;
        pick(&h, GUEST, Callback::Time("18:00".to_string())).await;

        for bad in ["abc", "-3", "0"] {
            text(&h, GUEST, bad).await;
            assert_eq!(h.sessions.state(GUEST), DialogState::BookingGuests);
            assert_eq!(h.sessions.draft(GUEST).unwrap().guests, None, "input {bad}");
        }
    }

    #[tokio::test]
    async fn test_zone_offer_excludes_taken_zone() {
        let h = harness();
        let date = future_date();
        h.store
            .insert(NewBooking {
                user_id: 7,
                chat_id: 7,
                name: "Інший".to_string(),
                nickname: None,
                date: date.clone(),
                time: "18:00".to_string(),
                guests: 2,
                zone: catalog::ZONES[0].to_string(),
                contact: "+380000000001".to_string(),
            })
            .await
            .unwrap();

        walk_to_zone(&h, GUEST).await;

        let offer = h.transport.sent_to(GUEST).pop().unwrap();
        assert_eq!(offer.choices.len(), catalog::ZONES.len() - 1);
        assert!(offer.choices.iter().all(|c| c.label != catalog::ZONES[0]));
    }

    #[tokio::test]
    async fn test_commit_recheck_reoffers_on_lost_race() {
        let h = harness();
        let date = future_date();

        walk_to_zone(&h, GUEST).await;
        pick(&h, GUEST, Callback::Zone(0)).await;
        text(&h, GUEST, "Олена").await;

        // Another guest grabs the zone between the pick and the phone.
        h.store
            .insert(NewBooking {
                user_id: 7,
                chat_id: 7,
                name: "Швидший".to_string(),
                nickname: None,
                date: date.clone(),
                time: "18:00".to_string(),
                guests: 2,
                zone: catalog::ZONES[0].to_string(),
                contact: "+380000000001".to_string(),
            })
            .await
            .unwrap();

        text(&h, GUEST, "+380991234567").await;

        // No booking for this guest, back to zone selection with a reduced list.
        let mine = h
            .store
            .query(&BookingFilter::default().with_user(GUEST))
            .await
            .unwrap();
        assert!(mine.is_empty());
        assert_eq!(h.sessions.state(GUEST), DialogState::BookingZone);
        let offer = h.transport.sent_to(GUEST).pop().unwrap();
        assert!(offer.choices.iter().all(|c| c.label != catalog::ZONES[0]));
    }

    #[tokio::test]
    async fn test_stale_time_selection_is_rejected() {
        let h = harness();
        // No dialog at all: a replayed token must not do anything.
        pick(&h, GUEST, Callback::Time("18:00".to_string())).await;
        assert_eq!(h.sessions.state(GUEST), DialogState::ChoosingAction);
        let last = h.transport.sent_to(GUEST).pop().unwrap();
        assert!(last.text.contains("неактуальний"));
    }

    #[tokio::test]
    async fn test_saved_profile_skips_contact_steps() {
        let h = harness();
        h.store
            .save_profile(ContactProfile {
                user_id: GUEST,
                name: "Олена".to_string(),
                contact: "+380991234567".to_string(),
            })
            .await
            .unwrap();

        text(&h, GUEST, MENU_BOOK).await;
        assert_eq!(h.sessions.state(GUEST), DialogState::CheckSavedContact);

        pick(&h, GUEST, Callback::UseSaved(true)).await;
        text(&h, GUEST, &future_date()).await;
        pick(&h, GUEST, Callback::Time("19:00".to_string())).await;
        text(&h, GUEST, "2").await;
        pick(&h, GUEST, Callback::Zone(3)).await;

        // Committed straight from the zone pick.
        let bookings = h.store.query(&BookingFilter::default()).await.unwrap();
        assert_eq!(bookings.len(), 1);
        assert_eq!(bookings[0].name, "Олена");
        assert_eq!(bookings[0].contact, "+380991234567");
        assert_eq!(h.sessions.state(GUEST), DialogState::ChoosingAction);
    }

    #[tokio::test]
    async fn test_review_branch_saves_review() {
        let h = harness();
        text(&h, GUEST, MENU_REVIEW).await;
        pick(&h, GUEST, Callback::Rate(5)).await;
        text(&h, GUEST, "Чудова атмосфера").await;

        let reviews = h.store.list_reviews().await.unwrap();
        assert_eq!(reviews.len(), 1);
        assert_eq!(reviews[0].rating, 5);
        assert_eq!(h.sessions.state(GUEST), DialogState::ChoosingAction);
    }

    #[tokio::test]
    async fn test_admin_view_requires_admin() {
        let h = harness();
        text(&h, GUEST, MENU_ADMIN_VIEW).await;
        assert_eq!(h.sessions.state(GUEST), DialogState::ChoosingAction);
        let last = h.transport.sent_to(GUEST).pop().unwrap();
        assert!(last.text.contains("тільки для адміністратора"));

        text(&h, ADMIN, MENU_ADMIN_VIEW).await;
        assert_eq!(h.sessions.state(ADMIN), DialogState::AdminViewDate);
    }

    #[tokio::test]
    async fn test_admin_view_lists_active_bookings_with_cancel_buttons() {
        let h = harness();
        let date = future_date();
        h.store
            .insert(NewBooking {
                user_id: 7,
                chat_id: 7,
                name: "Гість".to_string(),
                nickname: None,
                date: date.clone(),
                time: "18:00".to_string(),
                guests: 2,
                zone: catalog::ZONES[0].to_string(),
                contact: "+380000000001".to_string(),
            })
            .await
            .unwrap();

        text(&h, ADMIN, MENU_ADMIN_VIEW).await;
        text(&h, ADMIN, &date).await;

        let with_buttons: Vec<_> = h
            .transport
            .sent_to(ADMIN)
            .into_iter()
            .filter(|m| !m.choices.is_empty())
            .collect();
        assert_eq!(with_buttons.len(), 1);
        assert_eq!(with_buttons[0].choices[0].token, "force_cancel:1");
    }

    #[tokio::test]
    async fn test_new_dialog_discards_previous_draft() {
        let h = harness();
        walk_to_zone(&h, GUEST).await;
        assert_eq!(h.sessions.draft(GUEST).unwrap().guests, Some(4));

        text(&h, GUEST, "/start").await;
        assert_eq!(h.sessions.state(GUEST), DialogState::ChoosingAction);
        assert_eq!(h.sessions.draft(GUEST), None);
    }
}
