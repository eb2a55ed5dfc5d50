//! Notification Dispatcher
//!
//! Stateless formatter + forwarder for booking status changes. The status
//! transition committed to the store is authoritative; delivery here is
//! best-effort; failures are logged and never propagate back into the
//! workflow that triggered them.

use std::sync::Arc;

use shared::callback::Callback;
use shared::models::Booking;
use shared::transport::Choice;

use crate::transport::ChatTransport;

/// What happened to a booking.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BookingEvent {
    Submitted,
    Confirmed,
    Rejected,
    CancelledByGuest,
    CancelledByAdmin,
}

/// Human-readable booking summary, as sent to the admin and the broadcast
/// chat.
pub fn format_booking(booking: &Booking) -> String {
    let nickname = booking
        .nickname
        .as_deref()
        .map(|n| format!(" (@{n})"))
        .unwrap_or_default();
    format!(
        "📅 Бронювання #{id}:\n\
         Ім'я: {name}{nickname}\n\
         Дата: {date}\n\
         Час: {time}\n\
         Гостей: {guests}\n\
         Місце: {zone}\n\
         Телефон: {contact}\n\
         Статус: {status}",
        id = booking.id,
        name = booking.name,
        date = booking.date,
        time = booking.time,
        guests = booking.guests,
        zone = booking.zone,
        contact = booking.contact,
        status = booking.status.label(),
    )
}

/// Routes status-change messages to the right recipients.
pub struct Notifier {
    transport: Arc<dyn ChatTransport>,
    /// The admin's delivery address.
    admin_chat_id: i64,
    /// Optional announcement channel for confirmed bookings.
    broadcast_chat_id: Option<i64>,
}

impl Notifier {
    pub fn new(
        transport: Arc<dyn ChatTransport>,
        admin_chat_id: i64,
        broadcast_chat_id: Option<i64>,
    ) -> Self {
        Self {
            transport,
            admin_chat_id,
            broadcast_chat_id,
        }
    }

    /// Dispatch notifications for a booking event.
    ///
    /// Never fails: each delivery error is logged and the rest of the
    /// recipient set is still attempted.
    pub async fn notify(&self, event: BookingEvent, booking: &Booking) {
        match event {
            BookingEvent::Submitted => {
                // Moderation prompt goes with the summary.
                let choices = vec![
                    Choice::new("✅ Підтвердити", &Callback::Confirm(booking.id)),
                    Choice::new("❌ Відхилити", &Callback::Reject(booking.id)),
                ];
                self.send_choices(self.admin_chat_id, &format_booking(booking), choices)
                    .await;
            }
            BookingEvent::Confirmed => {
                self.send_text(booking.chat_id, "✅ Ваше бронювання підтверджено!")
                    .await;
                if let Some(broadcast) = self.broadcast_chat_id {
                    let text = format!("✅ Бронювання підтверджено:\n\n{}", format_booking(booking));
                    self.send_text(broadcast, &text).await;
                }
            }
            BookingEvent::Rejected => {
                self.send_text(booking.chat_id, "❌ Ваше бронювання було відхилено.")
                    .await;
            }
            BookingEvent::CancelledByGuest => {
                let text = format!(
                    "❌ Гість скасував бронювання:\n\n{}",
                    format_booking(booking)
                );
                self.send_text(self.admin_chat_id, &text).await;
            }
            BookingEvent::CancelledByAdmin => {
                let text = format!(
                    "❌ Ваше бронювання на {} о {} ({}) було скасовано адміністратором.",
                    booking.date, booking.time, booking.zone
                );
                self.send_text(booking.chat_id, &text).await;
            }
        }
    }

    async fn send_text(&self, chat_id: i64, text: &str) {
        if let Err(e) = self.transport.send_text(chat_id, text).await {
            tracing::error!(chat_id, error = %e, "notification delivery failed");
        }
    }

    async fn send_choices(&self, chat_id: i64, text: &str, choices: Vec<Choice>) {
        if let Err(e) = self.transport.send_choices(chat_id, text, &choices).await {
            tracing::error!(chat_id, error = %e, "notification delivery failed");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transport::MemoryTransport;
    use shared::models::BookingStatus;

    fn sample_booking() -> Booking {
        Booking {
            id: 5,
            user_id: 100,
            chat_id: 100,
            name: "Олена".to_string(),
            nickname: Some("olena_k".to_string()),
            date: "30.07.2025".to_string(),
            time: "18:00".to_string(),
            guests: 4,
            zone: "Кабінка 1 (5-10 чол.)".to_string(),
            contact: "+380991234567".to_string(),
            status: BookingStatus::Pending,
        }
    }

    #[test]
    fn test_format_includes_every_field() {
        let text = format_booking(&sample_booking());
        for fragment in [
            "#5",
            "Олена",
            "@olena_k",
            "30.07.2025",
            "18:00",
            "Кабінка 1 (5-10 чол.)",
            "+380991234567",
            "Очікує підтвердження",
        ] {
            assert!(text.contains(fragment), "missing {fragment} in:\n{text}");
        }
    }

    #[tokio::test]
    async fn test_submitted_sends_moderation_prompt_to_admin() {
        let transport = Arc::new(MemoryTransport::new());
        let notifier = Notifier::new(transport.clone(), 999, None);

        notifier.notify(BookingEvent::Submitted, &sample_booking()).await;

        let to_admin = transport.sent_to(999);
        assert_eq!(to_admin.len(), 1);
        let tokens: Vec<_> = to_admin[0].choices.iter().map(|c| c.token.as_str()).collect();
        assert_eq!(tokens, vec!["confirm:5", "reject:5"]);
    }

    #[tokio::test]
    async fn test_confirmed_notifies_guest_and_broadcast() {
        let transport = Arc::new(MemoryTransport::new());
        let notifier = Notifier::new(transport.clone(), 999, Some(-1000));

        notifier.notify(BookingEvent::Confirmed, &sample_booking()).await;

        assert_eq!(transport.sent_to(100).len(), 1);
        assert_eq!(transport.sent_to(-1000).len(), 1);
        assert!(transport.sent_to(-1000)[0].text.contains("Кабінка 1"));
    }

    #[tokio::test]
    async fn test_guest_cancel_notifies_admin_only() {
        let transport = Arc::new(MemoryTransport::new());
        let notifier = Notifier::new(transport.clone(), 999, Some(-1000));

        notifier
            .notify(BookingEvent::CancelledByGuest, &sample_booking())
            .await;

        assert_eq!(transport.sent_to(999).len(), 1);
        assert!(transport.sent_to(100).is_empty());
        assert!(transport.sent_to(-1000).is_empty());
    }
}
