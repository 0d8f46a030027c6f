// File: crates/agenda_slots/src/doc.rs

#![allow(dead_code)]
#![cfg(feature = "openapi")]
use utoipa::OpenApi;

use crate::admin::{
    BookingsResponse, BreakBody, BufferBody, CreatedResponse, DateOverrideBody, ServiceBody,
    StatusBody, WeeklyRuleBody,
};
use crate::logic::{
    AppointmentErrorCode, AppointmentResponse, AvailableSlotsResponse, CreateAppointmentBody,
    DaySlots, WeekAvailabilityResponse,
};
use agenda_common::{Booking, BookingStatus};

#[utoipa::path(
    get,
    path = "/providers/{provider_id}/slots",
    params(
        ("provider_id" = String, Path, description = "Provider whose calendar is queried"),
        ("date" = String, Query, description = "Date in YYYY-MM-DD format", example = "2025-06-02", format = "date"),
        ("duration_minutes" = i64, Query, description = "Service duration in minutes", example = 45),
        ("collaborator_id" = Option<String>, Query, description = "Restrict to one collaborator's bookings")
    ),
    responses(
        (status = 200, description = "Bookable start times; `error` is set when the store is unavailable", body = AvailableSlotsResponse,
         example = json!({ "slots": ["09:00", "09:30", "11:00"] })),
        (status = 400, description = "Invalid date format")
    ),
    tag = "Slots"
)]
fn doc_get_slots_handler() {}

#[utoipa::path(
    get,
    path = "/providers/{provider_id}/slots/week",
    params(
        ("provider_id" = String, Path, description = "Provider whose calendar is queried"),
        ("start_date" = Option<String>, Query, description = "First date, defaults to today in the configured time zone", format = "date"),
        ("days" = Option<u32>, Query, description = "Number of dates, at most 31", example = 7),
        ("duration_minutes" = i64, Query, description = "Service duration in minutes", example = 30),
        ("collaborator_id" = Option<String>, Query, description = "Restrict to one collaborator's bookings")
    ),
    responses(
        (status = 200, description = "Slot lists per date", body = WeekAvailabilityResponse),
        (status = 400, description = "Invalid date format")
    ),
    tag = "Slots"
)]
fn doc_get_week_handler() {}

#[utoipa::path(
    post,
    path = "/providers/{provider_id}/appointments",
    params(("provider_id" = String, Path, description = "Provider being booked")),
    request_body(content = CreateAppointmentBody, example = json!({
        "client_id": "client-42",
        "service_id": "svc-haircut",
        "collaborator_id": null,
        "date": "2025-06-02",
        "time": "11:00",
        "duration_minutes": 45
    })),
    responses(
        (status = 201, description = "Booked", body = AppointmentResponse, example = json!({ "success": true })),
        (status = 409, description = "Slot no longer available", body = AppointmentResponse,
         example = json!({ "success": false, "error": "slot_taken" })),
        (status = 400, description = "Malformed request", body = AppointmentResponse,
         example = json!({ "success": false, "error": "invalid" })),
        (status = 503, description = "Store unavailable", body = AppointmentResponse,
         example = json!({ "success": false, "error": "invalid" }))
    ),
    tag = "Slots"
)]
fn doc_create_appointment_handler() {}

#[utoipa::path(
    put,
    path = "/admin/providers/{provider_id}/weekly-rules/{weekday}",
    params(
        ("provider_id" = String, Path, description = "Provider"),
        ("weekday" = u8, Path, description = "0 = Sunday ... 6 = Saturday")
    ),
    request_body = WeeklyRuleBody,
    responses((status = 204, description = "Saved"), (status = 400, description = "Invalid interval or weekday")),
    tag = "Admin"
)]
fn doc_put_weekly_rule_handler() {}

#[utoipa::path(
    put,
    path = "/admin/providers/{provider_id}/overrides/{date}",
    params(
        ("provider_id" = String, Path, description = "Provider"),
        ("date" = String, Path, description = "Date in YYYY-MM-DD format", format = "date")
    ),
    request_body = DateOverrideBody,
    responses((status = 204, description = "Saved"), (status = 400, description = "Invalid date or interval")),
    tag = "Admin"
)]
fn doc_put_date_override_handler() {}

#[utoipa::path(
    put,
    path = "/admin/providers/{provider_id}/buffer",
    params(("provider_id" = String, Path, description = "Provider")),
    request_body = BufferBody,
    responses((status = 204, description = "Saved"), (status = 400, description = "Negative buffer")),
    tag = "Admin"
)]
fn doc_put_buffer_handler() {}

#[utoipa::path(
    post,
    path = "/admin/providers/{provider_id}/breaks",
    params(("provider_id" = String, Path, description = "Provider")),
    request_body = BreakBody,
    responses(
        (status = 201, description = "Created", body = CreatedResponse),
        (status = 400, description = "Invalid recurrence or interval")
    ),
    tag = "Admin"
)]
fn doc_add_break_handler() {}

#[utoipa::path(
    delete,
    path = "/admin/providers/{provider_id}/breaks/{break_id}",
    params(
        ("provider_id" = String, Path, description = "Provider"),
        ("break_id" = String, Path, description = "Break to remove")
    ),
    responses((status = 204, description = "Deleted"), (status = 404, description = "No such break")),
    tag = "Admin"
)]
fn doc_delete_break_handler() {}

#[utoipa::path(
    put,
    path = "/admin/providers/{provider_id}/services/{service_id}",
    params(
        ("provider_id" = String, Path, description = "Provider"),
        ("service_id" = String, Path, description = "Service")
    ),
    request_body = ServiceBody,
    responses((status = 204, description = "Saved"), (status = 400, description = "Invalid duration or price")),
    tag = "Admin"
)]
fn doc_put_service_handler() {}

#[utoipa::path(
    get,
    path = "/admin/providers/{provider_id}/bookings",
    params(
        ("provider_id" = String, Path, description = "Provider"),
        ("date" = String, Query, description = "Date in YYYY-MM-DD format", format = "date")
    ),
    responses((status = 200, description = "Bookings of the date ordered by time", body = BookingsResponse)),
    tag = "Admin"
)]
fn doc_list_bookings_handler() {}

#[utoipa::path(
    patch,
    path = "/admin/bookings/{booking_id}/status",
    params(("booking_id" = String, Path, description = "Booking")),
    request_body(content = StatusBody, example = json!({ "status": "attended" })),
    responses((status = 204, description = "Updated"), (status = 404, description = "No such booking")),
    tag = "Admin"
)]
fn doc_update_booking_status_handler() {}

#[derive(OpenApi)]
#[openapi(
    paths(
        doc_get_slots_handler,
        doc_get_week_handler,
        doc_create_appointment_handler,
        doc_put_weekly_rule_handler,
        doc_put_date_override_handler,
        doc_put_buffer_handler,
        doc_add_break_handler,
        doc_delete_break_handler,
        doc_put_service_handler,
        doc_list_bookings_handler,
        doc_update_booking_status_handler
    ),
    components(
        schemas(
            AvailableSlotsResponse,
            DaySlots,
            WeekAvailabilityResponse,
            CreateAppointmentBody,
            AppointmentResponse,
            AppointmentErrorCode,
            WeeklyRuleBody,
            DateOverrideBody,
            BufferBody,
            BreakBody,
            ServiceBody,
            StatusBody,
            BookingsResponse,
            CreatedResponse,
            Booking,
            BookingStatus
        )
    ),
    tags(
        (name = "Slots", description = "Public booking page"),
        (name = "Admin", description = "Schedule administration")
    ),
    servers(
        (url = "/api", description = "Agenda API server")
    )
)]
pub struct SlotsApiDoc;
