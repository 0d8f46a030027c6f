// --- File: crates/agenda_slots/src/service.rs ---
//! Store-backed slot pipeline and booking guard.

use crate::logic::{
    self, blocked_ranges, break_ranges, collaborator_scope, generate_slots, minutes_to_time,
    time_to_minutes, AppointmentErrorCode, AppointmentRequest, AvailableSlotsResponse, DaySlots,
    DayWindow, MinuteRange, WeekAvailabilityResponse, INVALID_DURATION_MESSAGE,
    MAX_DURATION_MINUTES, MAX_WEEK_VIEW_DAYS, NEW_BOOKING_STATUS, SERVICE_UNAVAILABLE_MESSAGE,
    SLOT_STEP_MINUTES,
};
use agenda_common::{weekday_of, BookingStore, BreakRecurrence, InsertOutcome, NewBooking};
use agenda_config::BookingConfig;
use chrono::{NaiveDate, Timelike};
use std::collections::HashMap;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tokio::time::timeout;
use tracing::{debug, error, info, warn};

/// Errors that stop a slot computation.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SlotError {
    #[error("Store unavailable: {0}")]
    StoreUnavailable(String),
    #[error("Store call {operation} timed out after {millis} ms")]
    Timeout { operation: String, millis: u64 },
    #[error("Invalid service duration: {0} minutes")]
    InvalidDuration(i64),
}

impl SlotError {
    /// Message shown to the person picking a slot.
    pub fn user_message(&self) -> &'static str {
        match self {
            SlotError::InvalidDuration(_) => INVALID_DURATION_MESSAGE,
            SlotError::StoreUnavailable(_) | SlotError::Timeout { .. } => {
                SERVICE_UNAVAILABLE_MESSAGE
            }
        }
    }
}

/// Why a booking attempt was refused.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AppointmentFailure {
    /// The time is not (or no longer) a bookable slot.
    #[error("Requested slot is not available")]
    SlotTaken,
    #[error("Invalid appointment request: {0}")]
    Invalid(String),
    /// Slot computation or the write could not reach the store.
    #[error("Booking could not be completed: {0}")]
    Unavailable(String),
}

impl AppointmentFailure {
    pub fn code(&self) -> AppointmentErrorCode {
        match self {
            AppointmentFailure::SlotTaken => AppointmentErrorCode::SlotTaken,
            AppointmentFailure::Invalid(_) | AppointmentFailure::Unavailable(_) => {
                AppointmentErrorCode::Invalid
            }
        }
    }
}

/// Everything that removes start times from an open window.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Obstructions {
    pub breaks: Vec<MinuteRange>,
    pub blocked: Vec<MinuteRange>,
}

/// Runs the slot pipeline against a shared store handle.
///
/// Holds no mutable state; each call is independent and every store access is
/// bounded by `request_timeout`.
pub struct SlotService<S> {
    store: Arc<S>,
    request_timeout: Duration,
}

impl<S> Clone for SlotService<S> {
    fn clone(&self) -> Self {
        Self {
            store: Arc::clone(&self.store),
            request_timeout: self.request_timeout,
        }
    }
}

impl<S: BookingStore> SlotService<S> {
    pub fn new(store: Arc<S>, request_timeout: Duration) -> Self {
        Self {
            store,
            request_timeout,
        }
    }

    pub fn from_config(store: Arc<S>, config: &BookingConfig) -> Self {
        Self::new(store, Duration::from_millis(config.request_timeout_ms))
    }

    pub fn store(&self) -> &Arc<S> {
        &self.store
    }

    pub fn request_timeout(&self) -> Duration {
        self.request_timeout
    }

    async fn call<T, F>(&self, operation: &str, fut: F) -> Result<T, SlotError>
    where
        F: Future<Output = Result<T, S::Error>>,
    {
        match timeout(self.request_timeout, fut).await {
            Ok(Ok(value)) => Ok(value),
            Ok(Err(e)) => {
                error!("Store call {} failed: {}", operation, e);
                Err(SlotError::StoreUnavailable(e.to_string()))
            }
            Err(_) => {
                error!(
                    "Store call {} timed out after {:?}",
                    operation, self.request_timeout
                );
                Err(SlotError::Timeout {
                    operation: operation.to_string(),
                    millis: u64::try_from(self.request_timeout.as_millis()).unwrap_or(u64::MAX),
                })
            }
        }
    }

    /// Opening window for the date. Failures here abort the computation.
    pub async fn resolve_window(
        &self,
        provider_id: &str,
        date: NaiveDate,
    ) -> Result<DayWindow, SlotError> {
        let date_override = self
            .call("get_date_override", self.store.get_date_override(provider_id, date))
            .await?;
        if date_override.is_some() {
            return Ok(logic::resolve_window(date_override.as_ref(), None));
        }

        let weekly_rule = self
            .call(
                "get_weekly_rule",
                self.store.get_weekly_rule(provider_id, weekday_of(date)),
            )
            .await?;
        Ok(logic::resolve_window(None, weekly_rule.as_ref()))
    }

    /// Breaks and blocked ranges for the date.
    ///
    /// Never fails: a lookup that errors contributes nothing and is logged, so
    /// an outage can under-block but never hides a whole day.
    pub async fn collect_obstructions(
        &self,
        provider_id: &str,
        collaborator_id: Option<&str>,
        date: NaiveDate,
    ) -> Obstructions {
        let weekday = weekday_of(date);
        let (weekly_breaks, date_breaks, buffer, bookings) = tokio::join!(
            self.call(
                "list_breaks",
                self.store
                    .list_breaks(provider_id, BreakRecurrence::Weekly(weekday))
            ),
            self.call(
                "list_breaks",
                self.store
                    .list_breaks(provider_id, BreakRecurrence::OnDate(date))
            ),
            self.call("get_buffer_setting", self.store.get_buffer_setting(provider_id)),
            self.call(
                "list_active_bookings",
                self.store
                    .list_active_bookings(provider_id, date, collaborator_id)
            ),
        );

        let weekly_breaks = degrade(weekly_breaks, "weekly breaks", provider_id);
        let date_breaks = degrade(date_breaks, "date breaks", provider_id);
        let buffer = degrade(buffer, "buffer setting", provider_id);
        let bookings = degrade(bookings, "active bookings", provider_id);

        let durations = if bookings.is_empty() {
            HashMap::new()
        } else {
            let mut service_ids: Vec<String> =
                bookings.iter().map(|b| b.service_id.clone()).collect();
            service_ids.sort();
            service_ids.dedup();
            degrade(
                self.call(
                    "list_service_durations",
                    self.store.list_service_durations(&service_ids),
                )
                .await,
                "service durations",
                provider_id,
            )
        };

        Obstructions {
            breaks: break_ranges(weekly_breaks.iter().chain(date_breaks.iter())),
            blocked: blocked_ranges(&bookings, &durations, buffer),
        }
    }

    /// Bookable start times in minutes since midnight.
    ///
    /// A blank collaborator id is treated as no collaborator. Durations outside
    /// `1..=MAX_DURATION_MINUTES` are refused.
    pub async fn compute_slot_minutes(
        &self,
        provider_id: &str,
        collaborator_id: Option<&str>,
        date: NaiveDate,
        duration_minutes: i64,
    ) -> Result<Vec<i64>, SlotError> {
        if !(1..=MAX_DURATION_MINUTES).contains(&duration_minutes) {
            return Err(SlotError::InvalidDuration(duration_minutes));
        }
        let collaborator_id = collaborator_scope(collaborator_id);

        let window = match self.resolve_window(provider_id, date).await? {
            DayWindow::Closed => {
                debug!("Provider {} closed on {}", provider_id, date);
                return Ok(Vec::new());
            }
            DayWindow::Open(window) => window,
        };

        let obstructions = self
            .collect_obstructions(provider_id, collaborator_id, date)
            .await;
        let slots = generate_slots(
            window,
            duration_minutes,
            SLOT_STEP_MINUTES,
            &obstructions.breaks,
            &obstructions.blocked,
        );
        debug!(
            "Provider {} on {}: {} slots ({} breaks, {} blocked ranges)",
            provider_id,
            date,
            slots.len(),
            obstructions.breaks.len(),
            obstructions.blocked.len()
        );
        Ok(slots)
    }

    pub async fn get_available_slots(
        &self,
        provider_id: &str,
        collaborator_id: Option<&str>,
        date: NaiveDate,
        duration_minutes: i64,
    ) -> AvailableSlotsResponse {
        match self
            .compute_slot_minutes(provider_id, collaborator_id, date, duration_minutes)
            .await
        {
            Ok(slots) => {
                AvailableSlotsResponse::slots(slots.into_iter().map(minutes_to_time).collect())
            }
            Err(e) => {
                warn!(
                    "Slot listing for provider {} on {} failed: {}",
                    provider_id, date, e
                );
                AvailableSlotsResponse::error(e.user_message())
            }
        }
    }

    /// Re-validates the requested time against a fresh computation, then
    /// writes the booking. Returns the new booking id.
    ///
    /// The check and the write are separate store calls; two concurrent
    /// attempts for the same slot are settled by the store's uniqueness
    /// constraint, which surfaces here as `SlotTaken`.
    pub async fn create_appointment(
        &self,
        request: &AppointmentRequest,
    ) -> Result<String, AppointmentFailure> {
        let slots = self
            .compute_slot_minutes(
                &request.provider_id,
                request.collaborator_id.as_deref(),
                request.date,
                request.duration_minutes,
            )
            .await
            .map_err(|e| match e {
                SlotError::InvalidDuration(_) => AppointmentFailure::Invalid(e.to_string()),
                other => AppointmentFailure::Unavailable(other.to_string()),
            })?;

        let requested = time_to_minutes(request.time);
        let whole_minute = request.time.second() == 0 && request.time.nanosecond() == 0;
        if !whole_minute || !slots.contains(&requested) {
            info!(
                "Rejected booking for provider {} on {} at {}: slot not available",
                request.provider_id,
                request.date,
                minutes_to_time(requested)
            );
            return Err(AppointmentFailure::SlotTaken);
        }

        let booking = NewBooking {
            provider_id: request.provider_id.clone(),
            client_id: request.client_id.clone(),
            service_id: request.service_id.clone(),
            collaborator_id: collaborator_scope(request.collaborator_id.as_deref())
                .map(str::to_string),
            date: request.date,
            time: request.time,
            status: NEW_BOOKING_STATUS,
        };

        match self
            .call("insert_booking", self.store.insert_booking(booking))
            .await
        {
            Ok(InsertOutcome::Inserted(id)) => {
                info!(
                    "Booked {} for provider {} on {} at {}",
                    id,
                    request.provider_id,
                    request.date,
                    minutes_to_time(requested)
                );
                Ok(id)
            }
            Ok(InsertOutcome::Conflict) => {
                info!(
                    "Booking for provider {} on {} at {} lost to a concurrent booking",
                    request.provider_id,
                    request.date,
                    minutes_to_time(requested)
                );
                Err(AppointmentFailure::SlotTaken)
            }
            Err(e) => Err(AppointmentFailure::Unavailable(e.to_string())),
        }
    }

    /// Slot lists for `days` consecutive dates starting at `start_date`,
    /// capped at [`MAX_WEEK_VIEW_DAYS`]. Each date fails independently.
    pub async fn get_week_availability(
        &self,
        provider_id: &str,
        collaborator_id: Option<&str>,
        start_date: NaiveDate,
        days: u32,
        duration_minutes: i64,
    ) -> WeekAvailabilityResponse {
        let days = days.min(MAX_WEEK_VIEW_DAYS) as usize;
        let mut result = Vec::with_capacity(days);

        for date in start_date.iter_days().take(days) {
            let day = self
                .get_available_slots(provider_id, collaborator_id, date, duration_minutes)
                .await;
            result.push(DaySlots {
                date: date.format("%Y-%m-%d").to_string(),
                slots: day.slots,
                error: day.error,
            });
        }

        WeekAvailabilityResponse { days: result }
    }
}

fn degrade<T: Default>(result: Result<T, SlotError>, what: &str, provider_id: &str) -> T {
    match result {
        Ok(value) => value,
        Err(e) => {
            warn!(
                "Ignoring {} for provider {} after lookup failure: {}",
                what, provider_id, e
            );
            T::default()
        }
    }
}
