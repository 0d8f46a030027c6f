// File: crates/agenda_slots/src/handlers.rs
use crate::admin::{
    break_from_body, buffer_from_body, date_override_from_body, require_date, service_from_body,
    weekly_rule_from_body, BookingsQuery, BookingsResponse, BreakBody, BufferBody,
    CreatedResponse, DateOverrideBody, ServiceBody, StatusBody, WeeklyRuleBody,
};
use crate::logic::{
    today_in, AppointmentErrorCode, AppointmentRequest, AppointmentResponse,
    AvailableSlotsResponse, CreateAppointmentBody, SlotsQuery, WeekAvailabilityResponse,
    WeekQuery,
};
use crate::service::{AppointmentFailure, SlotService};
use agenda_common::{
    not_found, parse_date, parse_time_of_day, validation_error, AgendaError, BookingStore,
    ScheduleAdminStore,
};
use agenda_config::AppConfig;
use axum::{
    extract::{rejection::JsonRejection, Path, Query, State},
    http::StatusCode,
    response::Json,
};
use std::fmt::Display;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tracing::{error, info, warn};

/// Shared state of the slot and admin routes.
pub struct SlotsState<S> {
    pub config: Arc<AppConfig>,
    pub service: SlotService<S>,
}

impl<S: BookingStore> SlotsState<S> {
    pub fn new(config: Arc<AppConfig>, store: Arc<S>) -> Self {
        let service = SlotService::from_config(store, &config.booking);
        Self { config, service }
    }

    pub fn store(&self) -> &Arc<S> {
        self.service.store()
    }
}

// --- Public booking page ---

/// Bookable start times for one date.
pub async fn get_slots_handler<S>(
    State(state): State<Arc<SlotsState<S>>>,
    Path(provider_id): Path<String>,
    Query(query): Query<SlotsQuery>,
) -> Result<Json<AvailableSlotsResponse>, AgendaError>
where
    S: BookingStore + ScheduleAdminStore + 'static,
{
    let date = require_date(&query.date)?;
    let response = state
        .service
        .get_available_slots(
            &provider_id,
            query.collaborator_id.as_deref(),
            date,
            query.duration_minutes,
        )
        .await;
    Ok(Json(response))
}

/// Slot lists for a run of consecutive dates, for the booking page's week strip.
pub async fn get_week_handler<S>(
    State(state): State<Arc<SlotsState<S>>>,
    Path(provider_id): Path<String>,
    Query(query): Query<WeekQuery>,
) -> Result<Json<WeekAvailabilityResponse>, AgendaError>
where
    S: BookingStore + ScheduleAdminStore + 'static,
{
    let start_date = match query.start_date.as_deref() {
        Some(value) => require_date(value)?,
        None => today_in(&state.config.booking.time_zone),
    };
    let days = query.days.unwrap_or(state.config.booking.week_view_days);

    let response = state
        .service
        .get_week_availability(
            &provider_id,
            query.collaborator_id.as_deref(),
            start_date,
            days,
            query.duration_minutes,
        )
        .await;
    Ok(Json(response))
}

/// Books a slot after re-validating it.
///
/// 201 on success, 409 with `slot_taken` when the slot is gone, 400 with
/// `invalid` for malformed requests and 503 with `invalid` when the store
/// could not be reached.
pub async fn create_appointment_handler<S>(
    State(state): State<Arc<SlotsState<S>>>,
    Path(provider_id): Path<String>,
    body: Result<Json<CreateAppointmentBody>, JsonRejection>,
) -> (StatusCode, Json<AppointmentResponse>)
where
    S: BookingStore + ScheduleAdminStore + 'static,
{
    let invalid = || {
        (
            StatusCode::BAD_REQUEST,
            Json(AppointmentResponse::failed(AppointmentErrorCode::Invalid)),
        )
    };

    let Json(body) = match body {
        Ok(body) => body,
        Err(rejection) => {
            warn!("Rejected appointment body: {}", rejection);
            return invalid();
        }
    };

    let (Some(date), Some(time)) = (parse_date(&body.date), parse_time_of_day(&body.time)) else {
        warn!(
            "Rejected appointment with date {:?} and time {:?}",
            body.date, body.time
        );
        return invalid();
    };
    if body.client_id.trim().is_empty() || body.service_id.trim().is_empty() {
        return invalid();
    }

    let request = AppointmentRequest {
        provider_id,
        client_id: body.client_id,
        service_id: body.service_id,
        collaborator_id: body.collaborator_id,
        date,
        time,
        duration_minutes: body.duration_minutes,
    };

    match state.service.create_appointment(&request).await {
        Ok(_) => (StatusCode::CREATED, Json(AppointmentResponse::booked())),
        Err(failure) => {
            let status = match failure {
                AppointmentFailure::SlotTaken => StatusCode::CONFLICT,
                AppointmentFailure::Invalid(_) => StatusCode::BAD_REQUEST,
                AppointmentFailure::Unavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
            };
            (status, Json(AppointmentResponse::failed(failure.code())))
        }
    }
}

// --- Schedule administration ---

/// Malformed admin bodies answer 400 instead of axum's default 422.
fn json_body<T>(body: Result<Json<T>, JsonRejection>) -> Result<T, AgendaError> {
    match body {
        Ok(Json(body)) => Ok(body),
        Err(rejection) => {
            warn!("Rejected admin body: {}", rejection);
            Err(validation_error(rejection.body_text()))
        }
    }
}

async fn admin_call<T, E, F>(request_timeout: Duration, operation: &str, fut: F) -> Result<T, AgendaError>
where
    E: Display + Into<AgendaError>,
    F: Future<Output = Result<T, E>>,
{
    match tokio::time::timeout(request_timeout, fut).await {
        Ok(Ok(value)) => Ok(value),
        Ok(Err(e)) => {
            error!("Admin store call {} failed: {}", operation, e);
            Err(e.into())
        }
        Err(_) => {
            error!("Admin store call {} timed out", operation);
            Err(AgendaError::TimeoutError(format!(
                "{} exceeded {:?}",
                operation, request_timeout
            )))
        }
    }
}

pub async fn put_weekly_rule_handler<S>(
    State(state): State<Arc<SlotsState<S>>>,
    Path((provider_id, weekday)): Path<(String, u8)>,
    body: Result<Json<WeeklyRuleBody>, JsonRejection>,
) -> Result<StatusCode, AgendaError>
where
    S: BookingStore + ScheduleAdminStore + 'static,
{
    let body = json_body(body)?;
    let rule = weekly_rule_from_body(&provider_id, weekday, body)?;
    admin_call(
        state.service.request_timeout(),
        "upsert_weekly_rule",
        ScheduleAdminStore::upsert_weekly_rule(state.store().as_ref(), rule),
    )
    .await?;
    info!("Weekly rule {} saved for provider {}", weekday, provider_id);
    Ok(StatusCode::NO_CONTENT)
}

pub async fn put_date_override_handler<S>(
    State(state): State<Arc<SlotsState<S>>>,
    Path((provider_id, date)): Path<(String, String)>,
    body: Result<Json<DateOverrideBody>, JsonRejection>,
) -> Result<StatusCode, AgendaError>
where
    S: BookingStore + ScheduleAdminStore + 'static,
{
    let body = json_body(body)?;
    let date_override = date_override_from_body(&provider_id, &date, body)?;
    admin_call(
        state.service.request_timeout(),
        "upsert_date_override",
        ScheduleAdminStore::upsert_date_override(state.store().as_ref(), date_override),
    )
    .await?;
    info!("Override for {} saved for provider {}", date, provider_id);
    Ok(StatusCode::NO_CONTENT)
}

pub async fn put_buffer_handler<S>(
    State(state): State<Arc<SlotsState<S>>>,
    Path(provider_id): Path<String>,
    body: Result<Json<BufferBody>, JsonRejection>,
) -> Result<StatusCode, AgendaError>
where
    S: BookingStore + ScheduleAdminStore + 'static,
{
    let body = json_body(body)?;
    let minutes = buffer_from_body(&body)?;
    admin_call(
        state.service.request_timeout(),
        "set_buffer_minutes",
        ScheduleAdminStore::set_buffer_minutes(state.store().as_ref(), &provider_id, minutes),
    )
    .await?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn add_break_handler<S>(
    State(state): State<Arc<SlotsState<S>>>,
    Path(provider_id): Path<String>,
    body: Result<Json<BreakBody>, JsonRejection>,
) -> Result<(StatusCode, Json<CreatedResponse>), AgendaError>
where
    S: BookingStore + ScheduleAdminStore + 'static,
{
    let body = json_body(body)?;
    let break_period = break_from_body(&provider_id, body)?;
    let id = admin_call(
        state.service.request_timeout(),
        "add_break",
        ScheduleAdminStore::add_break(state.store().as_ref(), break_period),
    )
    .await?;
    Ok((StatusCode::CREATED, Json(CreatedResponse { id })))
}

pub async fn delete_break_handler<S>(
    State(state): State<Arc<SlotsState<S>>>,
    Path((provider_id, break_id)): Path<(String, String)>,
) -> Result<StatusCode, AgendaError>
where
    S: BookingStore + ScheduleAdminStore + 'static,
{
    let deleted = admin_call(
        state.service.request_timeout(),
        "delete_break",
        ScheduleAdminStore::delete_break(state.store().as_ref(), &provider_id, &break_id),
    )
    .await?;
    if deleted {
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(not_found(format!("break {}", break_id)))
    }
}

pub async fn put_service_handler<S>(
    State(state): State<Arc<SlotsState<S>>>,
    Path((provider_id, service_id)): Path<(String, String)>,
    body: Result<Json<ServiceBody>, JsonRejection>,
) -> Result<StatusCode, AgendaError>
where
    S: BookingStore + ScheduleAdminStore + 'static,
{
    let body = json_body(body)?;
    let service = service_from_body(&provider_id, &service_id, body)?;
    admin_call(
        state.service.request_timeout(),
        "upsert_service",
        ScheduleAdminStore::upsert_service(state.store().as_ref(), service),
    )
    .await?;
    Ok(StatusCode::NO_CONTENT)
}

/// The provider's agenda for a date, every status included.
pub async fn list_bookings_handler<S>(
    State(state): State<Arc<SlotsState<S>>>,
    Path(provider_id): Path<String>,
    Query(query): Query<BookingsQuery>,
) -> Result<Json<BookingsResponse>, AgendaError>
where
    S: BookingStore + ScheduleAdminStore + 'static,
{
    let date = require_date(&query.date)?;
    let bookings = admin_call(
        state.service.request_timeout(),
        "list_bookings",
        ScheduleAdminStore::list_bookings(state.store().as_ref(), &provider_id, date),
    )
    .await?;
    Ok(Json(BookingsResponse { bookings }))
}

/// Attendance confirmation and cancellation. Leaving the active set frees the slot.
pub async fn update_booking_status_handler<S>(
    State(state): State<Arc<SlotsState<S>>>,
    Path(booking_id): Path<String>,
    body: Result<Json<StatusBody>, JsonRejection>,
) -> Result<StatusCode, AgendaError>
where
    S: BookingStore + ScheduleAdminStore + 'static,
{
    let body = json_body(body)?;
    let updated = admin_call(
        state.service.request_timeout(),
        "update_booking_status",
        ScheduleAdminStore::update_booking_status(state.store().as_ref(), &booking_id, body.status),
    )
    .await?;
    if updated {
        info!("Booking {} is now {}", booking_id, body.status);
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(not_found(format!("booking {}", booking_id)))
    }
}
