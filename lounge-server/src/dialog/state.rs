//! Dialog states and the staged booking draft

use shared::models::NewBooking;

/// Where a user's dialog currently sits.
///
/// The booking branch is linear; `CancelPrompt`, the review branch and the
/// admin date view are short parallel branches off the main menu.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DialogState {
    /// Main menu; also the reset target after completion or failure.
    #[default]
    ChoosingAction,
    /// Saved profile found; asking whether to reuse it.
    CheckSavedContact,
    BookingDate,
    BookingTime,
    BookingGuests,
    BookingZone,
    ContactName,
    ContactPhone,
    /// Guest is choosing which of their active bookings to cancel.
    CancelPrompt,
    ReviewRating,
    ReviewText,
    /// Admin is entering a date to list that day's active bookings.
    AdminViewDate,
}

/// Scratch space for an in-progress dialog. All fields optional; they become
/// mandatory only at commit, where a missing one means the draft was lost
/// (e.g. the process restarted mid-dialog).
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BookingDraft {
    pub date: Option<String>,
    pub time: Option<String>,
    pub guests: Option<u32>,
    pub zone: Option<String>,
    pub name: Option<String>,
    pub nickname: Option<String>,
    pub contact: Option<String>,
    /// Review branch scratch.
    pub rating: Option<u8>,
}

impl BookingDraft {
    /// Commit validation: every booking field must be present.
    ///
    /// Returns `None` when the draft is incomplete; the caller reports a
    /// draft-lost condition and never persists a partial booking.
    pub fn into_new_booking(self, user_id: i64, chat_id: i64) -> Option<NewBooking> {
        Some(NewBooking {
            user_id,
            chat_id,
            name: self.name?,
            nickname: self.nickname,
            date: self.date?,
            time: self.time?,
            guests: self.guests?,
            zone: self.zone?,
            contact: self.contact?,
        })
    }

    /// Whether the contact steps can be skipped (profile was accepted).
    pub fn has_contact(&self) -> bool {
        self.name.is_some() && self.contact.is_some()
    }
}
