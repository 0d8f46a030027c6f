// --- File: crates/agenda_common/src/models.rs ---

// Scheduling records shared by the store implementations and the slot engine.
// Times of day are wall-clock times in the provider's calendar; dates are plain
// calendar dates and are never shifted through a timezone.

use chrono::{Datelike, NaiveDate, NaiveTime, Weekday};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Lifecycle state of a booking.
///
/// Only `Scheduled`, `Pending` and `Attended` occupy the calendar; a cancelled
/// or missed appointment frees its time range.
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BookingStatus {
    Scheduled,
    Pending,
    Attended,
    Cancelled,
    NoShow,
}

impl BookingStatus {
    /// Statuses that obstruct slot computation.
    pub const ACTIVE: [BookingStatus; 3] = [
        BookingStatus::Scheduled,
        BookingStatus::Pending,
        BookingStatus::Attended,
    ];

    pub fn is_active(self) -> bool {
        match self {
            BookingStatus::Scheduled | BookingStatus::Pending | BookingStatus::Attended => true,
            BookingStatus::Cancelled | BookingStatus::NoShow => false,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            BookingStatus::Scheduled => "scheduled",
            BookingStatus::Pending => "pending",
            BookingStatus::Attended => "attended",
            BookingStatus::Cancelled => "cancelled",
            BookingStatus::NoShow => "no_show",
        }
    }
}

impl fmt::Display for BookingStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error returned when a stored status string is not one of the known states.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown booking status: {0}")]
pub struct UnknownStatus(pub String);

impl FromStr for BookingStatus {
    type Err = UnknownStatus;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "scheduled" => Ok(BookingStatus::Scheduled),
            "pending" => Ok(BookingStatus::Pending),
            "attended" => Ok(BookingStatus::Attended),
            "cancelled" => Ok(BookingStatus::Cancelled),
            "no_show" => Ok(BookingStatus::NoShow),
            other => Err(UnknownStatus(other.to_string())),
        }
    }
}

/// Recurring opening hours for one weekday.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WeeklyAvailabilityRule {
    pub provider_id: String,
    pub weekday: Weekday,
    pub is_available: bool,
    pub start_time: NaiveTime,
    pub end_time: NaiveTime,
}

/// Date-specific replacement for the weekly rule.
///
/// A closed day carries no times. An open override without times falls back to
/// the default window in the slot engine.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DateOverride {
    pub provider_id: String,
    pub date: NaiveDate,
    pub is_available: bool,
    pub start_time: Option<NaiveTime>,
    pub end_time: Option<NaiveTime>,
}

/// Which days a break applies to. Also used as the filter when listing breaks,
/// which keeps the weekday and date filters mutually exclusive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BreakRecurrence {
    Weekly(Weekday),
    OnDate(NaiveDate),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BreakPeriod {
    /// Assigned by the store on insert.
    pub id: Option<String>,
    pub provider_id: String,
    pub recurrence: BreakRecurrence,
    pub start_time: NaiveTime,
    pub end_time: NaiveTime,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Service {
    pub id: String,
    pub provider_id: String,
    pub name: String,
    pub duration_minutes: i64,
    /// Price in cents.
    pub price: i64,
    pub is_active: bool,
}

/// The projection of an active booking the slot engine needs.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActiveBooking {
    pub start_time: NaiveTime,
    /// Per-booking buffer that replaces the provider's buffer setting.
    pub buffer_override: Option<i64>,
    pub service_id: String,
}

/// A booking as written by the booking guard.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewBooking {
    pub provider_id: String,
    pub client_id: String,
    pub service_id: String,
    pub collaborator_id: Option<String>,
    pub date: NaiveDate,
    pub time: NaiveTime,
    pub status: BookingStatus,
}

/// A stored booking, as shown on the provider dashboard.
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Booking {
    pub id: String,
    pub provider_id: String,
    pub client_id: String,
    pub service_id: String,
    pub collaborator_id: Option<String>,
    #[cfg_attr(feature = "openapi", schema(value_type = String, format = "date"))]
    pub date: NaiveDate,
    #[cfg_attr(feature = "openapi", schema(value_type = String, example = "10:30"))]
    pub time: NaiveTime,
    pub status: BookingStatus,
    pub buffer_override: Option<i64>,
}

/// Result of a booking insert that reached the store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InsertOutcome {
    Inserted(String),
    /// The store refused a structural duplicate of an active booking.
    Conflict,
}

/// Sunday-based weekday index (Sunday = 0 ... Saturday = 6), the numbering used
/// by stored weekly rules and breaks.
pub fn weekday_index(weekday: Weekday) -> u8 {
    weekday.num_days_from_sunday() as u8
}

pub fn weekday_from_index(index: u8) -> Option<Weekday> {
    match index {
        0 => Some(Weekday::Sun),
        1 => Some(Weekday::Mon),
        2 => Some(Weekday::Tue),
        3 => Some(Weekday::Wed),
        4 => Some(Weekday::Thu),
        5 => Some(Weekday::Fri),
        6 => Some(Weekday::Sat),
        _ => None,
    }
}

/// Parses `HH:MM`, also accepting `HH:MM:SS` as produced by SQL time columns.
pub fn parse_time_of_day(value: &str) -> Option<NaiveTime> {
    let value = value.trim();
    NaiveTime::parse_from_str(value, "%H:%M")
        .or_else(|_| NaiveTime::parse_from_str(value, "%H:%M:%S"))
        .ok()
}

pub fn format_time_of_day(time: NaiveTime) -> String {
    time.format("%H:%M").to_string()
}

/// Parses a `YYYY-MM-DD` calendar date.
pub fn parse_date(value: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(value.trim(), "%Y-%m-%d").ok()
}

/// Weekday of a calendar date, taken from the date itself rather than from a
/// UTC instant, so late-evening or early-morning requests never shift a day.
pub fn weekday_of(date: NaiveDate) -> Weekday {
    date.weekday()
}
