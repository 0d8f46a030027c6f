// --- File: crates/agenda_slots/src/routes.rs ---

use crate::handlers::{
    add_break_handler, create_appointment_handler, delete_break_handler, get_slots_handler,
    get_week_handler, list_bookings_handler, put_buffer_handler, put_date_override_handler,
    put_service_handler, put_weekly_rule_handler, update_booking_status_handler, SlotsState,
};
use agenda_common::{BookingStore, ScheduleAdminStore};
use axum::{
    routing::{delete, get, patch, post, put},
    Router,
};
use std::sync::Arc;

/// Public booking routes and schedule administration routes, to be nested
/// under `/api`.
pub fn routes<S>(state: Arc<SlotsState<S>>) -> Router
where
    S: BookingStore + ScheduleAdminStore + 'static,
{
    Router::new()
        .route("/providers/{provider_id}/slots", get(get_slots_handler::<S>))
        .route("/providers/{provider_id}/slots/week", get(get_week_handler::<S>))
        .route(
            "/providers/{provider_id}/appointments",
            post(create_appointment_handler::<S>),
        )
        .route(
            "/admin/providers/{provider_id}/weekly-rules/{weekday}",
            put(put_weekly_rule_handler::<S>),
        )
        .route(
            "/admin/providers/{provider_id}/overrides/{date}",
            put(put_date_override_handler::<S>),
        )
        .route("/admin/providers/{provider_id}/buffer", put(put_buffer_handler::<S>))
        .route("/admin/providers/{provider_id}/breaks", post(add_break_handler::<S>))
        .route(
            "/admin/providers/{provider_id}/breaks/{break_id}",
            delete(delete_break_handler::<S>),
        )
        .route(
            "/admin/providers/{provider_id}/services/{service_id}",
            put(put_service_handler::<S>),
        )
        .route(
            "/admin/providers/{provider_id}/bookings",
            get(list_bookings_handler::<S>),
        )
        .route(
            "/admin/bookings/{booking_id}/status",
            patch(update_booking_status_handler::<S>),
        )
        .with_state(state)
}
