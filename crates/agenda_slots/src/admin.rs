// --- File: crates/agenda_slots/src/admin.rs ---
//! Request bodies of the schedule administration routes and their
//! validation into store models.

use agenda_common::{
    parse_date, parse_time_of_day, validation_error, weekday_from_index, AgendaError, Booking,
    BookingStatus, BreakPeriod, BreakRecurrence, DateOverride, Service, WeeklyAvailabilityRule,
};
use crate::logic::MAX_DURATION_MINUTES;
use chrono::{NaiveDate, NaiveTime};
use serde::{Deserialize, Serialize};

#[derive(Deserialize, Debug, Clone)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct WeeklyRuleBody {
    pub is_available: bool,
    pub start_time: String,
    pub end_time: String,
}

#[derive(Deserialize, Debug, Clone)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct DateOverrideBody {
    pub is_available: bool,
    pub start_time: Option<String>,
    pub end_time: Option<String>,
}

#[derive(Deserialize, Debug, Clone)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct BufferBody {
    pub buffer_minutes: i64,
}

/// A break repeats on `day_of_week` (Sunday = 0) or happens once on `date`.
#[derive(Deserialize, Debug, Clone)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct BreakBody {
    pub day_of_week: Option<u8>,
    pub date: Option<String>,
    pub start_time: String,
    pub end_time: String,
}

#[derive(Deserialize, Debug, Clone)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct ServiceBody {
    pub name: String,
    pub duration_minutes: i64,
    #[serde(default)]
    pub price: i64,
    #[serde(default = "default_active")]
    pub is_active: bool,
}

fn default_active() -> bool {
    true
}

#[derive(Deserialize, Debug, Clone)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct StatusBody {
    pub status: BookingStatus,
}

#[derive(Deserialize, Debug)]
#[cfg_attr(feature = "openapi", derive(utoipa::IntoParams, utoipa::ToSchema))]
#[cfg_attr(feature = "openapi", into_params(parameter_in = Query))]
pub struct BookingsQuery {
    pub date: String,
}

#[derive(Serialize, Deserialize, Debug, Clone)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct BookingsResponse {
    pub bookings: Vec<Booking>,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct CreatedResponse {
    pub id: String,
}

pub fn require_date(value: &str) -> Result<NaiveDate, AgendaError> {
    parse_date(value)
        .ok_or_else(|| validation_error(format!("Invalid date {:?}, expected YYYY-MM-DD", value)))
}

pub fn require_time(field: &str, value: &str) -> Result<NaiveTime, AgendaError> {
    parse_time_of_day(value)
        .ok_or_else(|| validation_error(format!("Invalid {} {:?}, expected HH:MM", field, value)))
}

fn require_interval(start: NaiveTime, end: NaiveTime) -> Result<(), AgendaError> {
    if start < end {
        Ok(())
    } else {
        Err(validation_error("start_time must be before end_time"))
    }
}

pub fn weekly_rule_from_body(
    provider_id: &str,
    weekday_index: u8,
    body: WeeklyRuleBody,
) -> Result<WeeklyAvailabilityRule, AgendaError> {
    let weekday = weekday_from_index(weekday_index).ok_or_else(|| {
        validation_error(format!("Invalid weekday {}, expected 0 (Sunday) to 6", weekday_index))
    })?;
    let start_time = require_time("start_time", &body.start_time)?;
    let end_time = require_time("end_time", &body.end_time)?;
    require_interval(start_time, end_time)?;

    Ok(WeeklyAvailabilityRule {
        provider_id: provider_id.to_string(),
        weekday,
        is_available: body.is_available,
        start_time,
        end_time,
    })
}

/// Closing a day discards any times sent along.
pub fn date_override_from_body(
    provider_id: &str,
    date: &str,
    body: DateOverrideBody,
) -> Result<DateOverride, AgendaError> {
    let date = require_date(date)?;
    if !body.is_available {
        return Ok(DateOverride {
            provider_id: provider_id.to_string(),
            date,
            is_available: false,
            start_time: None,
            end_time: None,
        });
    }

    let start_time = body
        .start_time
        .as_deref()
        .map(|v| require_time("start_time", v))
        .transpose()?;
    let end_time = body
        .end_time
        .as_deref()
        .map(|v| require_time("end_time", v))
        .transpose()?;
    if let (Some(start), Some(end)) = (start_time, end_time) {
        require_interval(start, end)?;
    }

    Ok(DateOverride {
        provider_id: provider_id.to_string(),
        date,
        is_available: true,
        start_time,
        end_time,
    })
}

pub fn buffer_from_body(body: &BufferBody) -> Result<i64, AgendaError> {
    if !(0..=MAX_DURATION_MINUTES).contains(&body.buffer_minutes) {
        return Err(validation_error(format!(
            "buffer_minutes must be between 0 and {}",
            MAX_DURATION_MINUTES
        )));
    }
    Ok(body.buffer_minutes)
}

pub fn break_from_body(provider_id: &str, body: BreakBody) -> Result<BreakPeriod, AgendaError> {
    let recurrence = match (body.day_of_week, body.date.as_deref()) {
        (Some(index), None) => weekday_from_index(index)
            .map(BreakRecurrence::Weekly)
            .ok_or_else(|| validation_error(format!("Invalid day_of_week {}", index)))?,
        (None, Some(date)) => BreakRecurrence::OnDate(require_date(date)?),
        _ => {
            return Err(validation_error(
                "Exactly one of day_of_week and date must be given",
            ))
        }
    };
    let start_time = require_time("start_time", &body.start_time)?;
    let end_time = require_time("end_time", &body.end_time)?;
    require_interval(start_time, end_time)?;

    Ok(BreakPeriod {
        id: None,
        provider_id: provider_id.to_string(),
        recurrence,
        start_time,
        end_time,
    })
}

pub fn service_from_body(
    provider_id: &str,
    service_id: &str,
    body: ServiceBody,
) -> Result<Service, AgendaError> {
    if !(1..=MAX_DURATION_MINUTES).contains(&body.duration_minutes) {
        return Err(validation_error(format!(
            "duration_minutes must be between 1 and {}",
            MAX_DURATION_MINUTES
        )));
    }
    if body.price < 0 {
        return Err(validation_error("price must not be negative"));
    }

    Ok(Service {
        id: service_id.to_string(),
        provider_id: provider_id.to_string(),
        name: body.name,
        duration_minutes: body.duration_minutes,
        price: body.price,
        is_active: body.is_active,
    })
}
