//! Booking Model

use serde::{Deserialize, Serialize};

/// Booking lifecycle status.
///
/// `Pending` and `Confirmed` are *active*: they occupy a (date, time, zone)
/// slot for availability purposes. The other three are terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BookingStatus {
    Pending,
    Confirmed,
    Rejected,
    CancelledByGuest,
    CancelledByAdmin,
}

/// Statuses that occupy a slot.
pub const ACTIVE_STATUSES: [BookingStatus; 2] =
    [BookingStatus::Pending, BookingStatus::Confirmed];

impl BookingStatus {
    pub fn is_active(&self) -> bool {
        matches!(self, Self::Pending | Self::Confirmed)
    }

    /// Stable string form, used as the persisted value.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Confirmed => "confirmed",
            Self::Rejected => "rejected",
            Self::CancelledByGuest => "cancelled_by_guest",
            Self::CancelledByAdmin => "cancelled_by_admin",
        }
    }

    /// Guest-facing label (the venue operates in Ukrainian).
    pub fn label(&self) -> &'static str {
        match self {
            Self::Pending => "Очікує підтвердження",
            Self::Confirmed => "Підтверджено",
            Self::Rejected => "Відхилено",
            Self::CancelledByGuest => "Скасовано (гостем)",
            Self::CancelledByAdmin => "Скасовано (адміном)",
        }
    }
}

impl std::fmt::Display for BookingStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Booking entity: one reservation request for a (date, time, zone) triple.
///
/// Never physically deleted: cancellation is a status change, so the full
/// history stays queryable.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Booking {
    pub id: i64,
    /// Requester identity (stable across dialogs).
    pub user_id: i64,
    /// Delivery address for replies; may differ from `user_id`.
    pub chat_id: i64,
    pub name: String,
    pub nickname: Option<String>,
    /// Calendar date, `DD.MM.YYYY`.
    pub date: String,
    /// Slot from the fixed grid, `HH:MM`.
    pub time: String,
    pub guests: u32,
    /// Zone label from the fixed catalog.
    pub zone: String,
    /// Free-text contact, typically a phone number.
    pub contact: String,
    pub status: BookingStatus,
}

/// Insert payload: the store assigns the id and sets status to `Pending`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewBooking {
    pub user_id: i64,
    pub chat_id: i64,
    pub name: String,
    pub nickname: Option<String>,
    pub date: String,
    pub time: String,
    pub guests: u32,
    pub zone: String,
    pub contact: String,
}

impl NewBooking {
    pub fn into_booking(self, id: i64) -> Booking {
        Booking {
            id,
            user_id: self.user_id,
            chat_id: self.chat_id,
            name: self.name,
            nickname: self.nickname,
            date: self.date,
            time: self.time,
            guests: self.guests,
            zone: self.zone,
            contact: self.contact,
            status: BookingStatus::Pending,
        }
    }
}

/// Query filter for the booking store. `None` fields do not constrain.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BookingFilter {
    pub user_id: Option<i64>,
    pub statuses: Option<Vec<BookingStatus>>,
    pub date: Option<String>,
    pub time: Option<String>,
    pub zone: Option<String>,
}

impl BookingFilter {
    /// Filter matching only active bookings.
    pub fn active() -> Self {
        Self {
            statuses: Some(ACTIVE_STATUSES.to_vec()),
            ..Default::default()
        }
    }

    pub fn with_user(mut self, user_id: i64) -> Self {
        self.user_id = Some(user_id);
        self
    }

    pub fn with_date(mut self, date: impl Into<String>) -> Self {
        self.date = Some(date.into());
        self
    }

    pub fn with_time(mut self, time: impl Into<String>) -> Self {
        self.time = Some(time.into());
        self
    }

    /// Whether a booking satisfies every set constraint.
    ///
    /// Both store implementations filter through this, so the query
    /// semantics cannot drift between them.
    pub fn matches(&self, booking: &Booking) -> bool {
        if let Some(user_id) = self.user_id
            && booking.user_id != user_id
        {
            return false;
        }
        if let Some(statuses) = &self.statuses
            && !statuses.contains(&booking.status)
        {
            return false;
        }
        if let Some(date) = &self.date
            && booking.date != *date
        {
            return false;
        }
        if let Some(time) = &self.time
            && booking.time != *time
        {
            return false;
        }
        if let Some(zone) = &self.zone
            && booking.zone != *zone
        {
            return false;
        }
        true
    }
}
