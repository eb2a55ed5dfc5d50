//! Time helpers: guest date input and venue-timezone "today"
//!
//! Guests type dates as `DD.MM.YYYY`; bookings store them in the same form.
//! "Not in the past" is judged in the venue timezone, not UTC, so a guest
//! booking shortly after midnight local time is not rejected.

use chrono::NaiveDate;
use chrono_tz::Tz;
use thiserror::Error;

pub const DATE_FORMAT: &str = "%d.%m.%Y";

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DateError {
    #[error("invalid date format: {0}")]
    InvalidFormat(String),

    #[error("date is in the past: {0}")]
    InPast(NaiveDate),
}

/// Today's date in the venue timezone.
pub fn venue_today(tz: Tz) -> NaiveDate {
    chrono::Utc::now().with_timezone(&tz).date_naive()
}

/// Parse a guest-typed `DD.MM.YYYY` date and reject dates before today.
pub fn parse_booking_date(input: &str, tz: Tz) -> Result<NaiveDate, DateError> {
    let date = NaiveDate::parse_from_str(input.trim(), DATE_FORMAT)
        .map_err(|_| DateError::InvalidFormat(input.to_string()))?;
    if date < venue_today(tz) {
        return Err(DateError::InPast(date));
    }
    Ok(date)
}

/// Render a date back to the stored `DD.MM.YYYY` form.
pub fn format_booking_date(date: NaiveDate) -> String {
    date.format(DATE_FORMAT).to_string()
}
