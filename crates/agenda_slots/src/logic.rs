// --- File: crates/agenda_slots/src/logic.rs ---
use agenda_common::{
    ActiveBooking, BookingStatus, BreakPeriod, DateOverride, WeeklyAvailabilityRule,
};
use chrono::{NaiveDate, NaiveTime, Timelike, Utc};
use chrono_tz::Tz;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::str::FromStr;
use tracing::warn;

// --- Defaults ---
pub const DEFAULT_SERVICE_DURATION_MINUTES: i64 = 30;
pub const DEFAULT_WINDOW_START_MINUTES: i64 = 540;
pub const DEFAULT_WINDOW_END_MINUTES: i64 = 1080;
pub const DEFAULT_BUFFER_MINUTES: i64 = 0;
pub const SLOT_STEP_MINUTES: i64 = 30;
pub const MAX_WEEK_VIEW_DAYS: u32 = 31;
/// Upper bound for service durations and buffers: nothing outlasts a day.
pub const MAX_DURATION_MINUTES: i64 = 1440;

pub const SERVICE_UNAVAILABLE_MESSAGE: &str = "Serviço indisponível";
pub const INVALID_DURATION_MESSAGE: &str = "Duração inválida";

// --- Minute arithmetic ---

/// Half-open interval `[start, end)` in minutes since midnight.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MinuteRange {
    pub start: i64,
    pub end: i64,
}

impl MinuteRange {
    pub fn new(start: i64, end: i64) -> Self {
        Self { start, end }
    }

    pub fn from_times(start: NaiveTime, end: NaiveTime) -> Self {
        Self::new(time_to_minutes(start), time_to_minutes(end))
    }

    pub fn contains(&self, minute: i64) -> bool {
        self.start <= minute && minute < self.end
    }

    /// Whether `[start, start + length)` intersects this range.
    pub fn overlaps(&self, start: i64, length: i64) -> bool {
        start < self.end && start.saturating_add(length) > self.start
    }
}

/// Opening hours of a provider for one calendar date.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DayWindow {
    Closed,
    Open(MinuteRange),
}

pub fn time_to_minutes(time: NaiveTime) -> i64 {
    i64::from(time.hour()) * 60 + i64::from(time.minute())
}

pub fn minutes_to_time(minutes: i64) -> String {
    format!("{:02}:{:02}", minutes / 60, minutes % 60)
}

// --- Pipeline stages ---

/// Picks the window for a date. An override for the date wins outright over
/// the weekly rule, even when the override is open and the rule is closed.
pub fn resolve_window(
    date_override: Option<&DateOverride>,
    weekly_rule: Option<&WeeklyAvailabilityRule>,
) -> DayWindow {
    if let Some(date_override) = date_override {
        if !date_override.is_available {
            return DayWindow::Closed;
        }
        let start = date_override
            .start_time
            .map(time_to_minutes)
            .unwrap_or(DEFAULT_WINDOW_START_MINUTES);
        let end = date_override
            .end_time
            .map(time_to_minutes)
            .unwrap_or(DEFAULT_WINDOW_END_MINUTES);
        return DayWindow::Open(MinuteRange::new(start, end));
    }

    match weekly_rule {
        Some(rule) if rule.is_available => {
            DayWindow::Open(MinuteRange::from_times(rule.start_time, rule.end_time))
        }
        _ => DayWindow::Closed,
    }
}

pub fn break_ranges<'a>(breaks: impl IntoIterator<Item = &'a BreakPeriod>) -> Vec<MinuteRange> {
    breaks
        .into_iter()
        .map(|b| MinuteRange::from_times(b.start_time, b.end_time))
        .collect()
}

/// Converts active bookings into the ranges they keep occupied:
/// `[start, start + duration + buffer)`.
///
/// A service missing from `durations` counts as
/// [`DEFAULT_SERVICE_DURATION_MINUTES`]. The booking's own buffer replaces the
/// provider buffer when set.
pub fn blocked_ranges(
    bookings: &[ActiveBooking],
    durations: &HashMap<String, i64>,
    provider_buffer: Option<i64>,
) -> Vec<MinuteRange> {
    bookings
        .iter()
        .map(|booking| {
            let start = time_to_minutes(booking.start_time);
            let duration = durations
                .get(&booking.service_id)
                .copied()
                .unwrap_or(DEFAULT_SERVICE_DURATION_MINUTES);
            let buffer = booking
                .buffer_override
                .or(provider_buffer)
                .unwrap_or(DEFAULT_BUFFER_MINUTES);
            MinuteRange::new(start, start.saturating_add(duration).saturating_add(buffer))
        })
        .collect()
}

/// Walks the window from its start in `step` increments and keeps every start
/// time `t` with `t + duration <= window.end` that neither touches a break at
/// `t` or `t + duration - 1` nor overlaps a blocked range.
///
/// Returns minutes since midnight in ascending order. A non-positive duration
/// or step yields nothing.
pub fn generate_slots(
    window: MinuteRange,
    duration: i64,
    step: i64,
    breaks: &[MinuteRange],
    blocked: &[MinuteRange],
) -> Vec<i64> {
    let mut slots = Vec::new();
    if duration <= 0 || step <= 0 {
        return slots;
    }

    let mut t = window.start;
    while let Some(end) = t.checked_add(duration).filter(|end| *end <= window.end) {
        let last_minute = end - 1;
        let in_break = breaks
            .iter()
            .any(|b| b.contains(t) || b.contains(last_minute));
        let is_blocked = blocked.iter().any(|b| b.overlaps(t, duration));

        if !in_break && !is_blocked {
            slots.push(t);
        }
        match t.checked_add(step) {
            Some(next) => t = next,
            None => break,
        }
    }
    slots
}

/// Full pipeline over already loaded inputs, formatted as `HH:MM`.
pub fn compute_slots(
    window: DayWindow,
    duration: i64,
    breaks: &[MinuteRange],
    blocked: &[MinuteRange],
) -> Vec<String> {
    match window {
        DayWindow::Closed => Vec::new(),
        DayWindow::Open(range) => generate_slots(range, duration, SLOT_STEP_MINUTES, breaks, blocked)
            .into_iter()
            .map(minutes_to_time)
            .collect(),
    }
}

/// Today's calendar date in the named IANA zone, falling back to UTC when the
/// name is unknown.
pub fn today_in(time_zone: &str) -> NaiveDate {
    match Tz::from_str(time_zone) {
        Ok(tz) => Utc::now().with_timezone(&tz).date_naive(),
        Err(_) => {
            warn!("Unknown time zone {:?}, using UTC for today", time_zone);
            Utc::now().date_naive()
        }
    }
}

/// A blank collaborator id means "any collaborator".
pub fn collaborator_scope(collaborator_id: Option<&str>) -> Option<&str> {
    collaborator_id.map(str::trim).filter(|id| !id.is_empty())
}

// --- Data Structures ---

#[derive(Deserialize, Debug)]
#[cfg_attr(feature = "openapi", derive(utoipa::IntoParams, utoipa::ToSchema))]
#[cfg_attr(feature = "openapi", into_params(parameter_in = Query))]
pub struct SlotsQuery {
    /// Calendar date, `YYYY-MM-DD`.
    pub date: String,
    pub duration_minutes: i64,
    pub collaborator_id: Option<String>,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct AvailableSlotsResponse {
    pub slots: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub error: Option<String>,
}

impl AvailableSlotsResponse {
    pub fn slots(slots: Vec<String>) -> Self {
        Self { slots, error: None }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self {
            slots: Vec::new(),
            error: Some(message.into()),
        }
    }
}

#[derive(Deserialize, Debug)]
#[cfg_attr(feature = "openapi", derive(utoipa::IntoParams, utoipa::ToSchema))]
#[cfg_attr(feature = "openapi", into_params(parameter_in = Query))]
pub struct WeekQuery {
    /// First date, `YYYY-MM-DD`. Defaults to today in the configured zone.
    pub start_date: Option<String>,
    pub days: Option<u32>,
    pub duration_minutes: i64,
    pub collaborator_id: Option<String>,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct DaySlots {
    pub date: String,
    pub slots: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub error: Option<String>,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct WeekAvailabilityResponse {
    pub days: Vec<DaySlots>,
}

/// Body of the public booking form.
#[derive(Deserialize, Debug, Clone)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct CreateAppointmentBody {
    pub client_id: String,
    pub service_id: String,
    pub collaborator_id: Option<String>,
    /// `YYYY-MM-DD`
    pub date: String,
    /// `HH:MM`, one of the listed slots
    pub time: String,
    pub duration_minutes: i64,
}

/// Parsed booking attempt handed to the booking guard.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppointmentRequest {
    pub provider_id: String,
    pub client_id: String,
    pub service_id: String,
    pub collaborator_id: Option<String>,
    pub date: NaiveDate,
    pub time: NaiveTime,
    pub duration_minutes: i64,
}

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[serde(rename_all = "snake_case")]
pub enum AppointmentErrorCode {
    SlotTaken,
    Invalid,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct AppointmentResponse {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub error: Option<AppointmentErrorCode>,
}

impl AppointmentResponse {
    pub fn booked() -> Self {
        Self {
            success: true,
            error: None,
        }
    }

    pub fn failed(code: AppointmentErrorCode) -> Self {
        Self {
            success: false,
            error: Some(code),
        }
    }
}

/// Status written for bookings created through the public page.
pub const NEW_BOOKING_STATUS: BookingStatus = BookingStatus::Scheduled;
