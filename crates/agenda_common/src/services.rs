// --- File: crates/agenda_common/src/services.rs ---
//! Store abstractions.
//!
//! The slot engine never talks to a database directly. It receives a store
//! handle implementing these traits, constructed and owned by the caller, which
//! keeps the engine testable against an in-memory store and lets the backend
//! swap SQL drivers without touching the booking logic.

use chrono::{NaiveDate, Weekday};
use std::collections::HashMap;
use std::future::Future;
use std::pin::Pin;

use crate::error::AgendaError;
use crate::models::{
    ActiveBooking, Booking, BookingStatus, BreakPeriod, BreakRecurrence, DateOverride,
    InsertOutcome, NewBooking, Service, WeeklyAvailabilityRule,
};

/// Type alias for a boxed future that returns a Result
pub type BoxFuture<'a, T, E> = Pin<Box<dyn Future<Output = Result<T, E>> + Send + 'a>>;

/// Read and write operations the slot engine and the booking guard need.
pub trait BookingStore: Send + Sync {
    /// Error type returned by store operations.
    type Error: std::error::Error + Send + Sync + 'static;

    /// The override for exactly this date, if the provider set one.
    fn get_date_override(
        &self,
        provider_id: &str,
        date: NaiveDate,
    ) -> BoxFuture<'_, Option<DateOverride>, Self::Error>;

    /// The recurring rule for a weekday, if the provider set one.
    fn get_weekly_rule(
        &self,
        provider_id: &str,
        weekday: Weekday,
    ) -> BoxFuture<'_, Option<WeeklyAvailabilityRule>, Self::Error>;

    /// Breaks matching exactly one recurrence: either the recurring breaks of a
    /// weekday or the one-off breaks of a date, never both.
    fn list_breaks(
        &self,
        provider_id: &str,
        filter: BreakRecurrence,
    ) -> BoxFuture<'_, Vec<BreakPeriod>, Self::Error>;

    /// The provider's buffer in minutes, `None` when never configured.
    fn get_buffer_setting(&self, provider_id: &str) -> BoxFuture<'_, Option<i64>, Self::Error>;

    /// Bookings in an active status on a date, narrowed to one collaborator when given.
    fn list_active_bookings(
        &self,
        provider_id: &str,
        date: NaiveDate,
        collaborator_id: Option<&str>,
    ) -> BoxFuture<'_, Vec<ActiveBooking>, Self::Error>;

    /// Durations in minutes keyed by service id. Unknown ids are simply absent.
    fn list_service_durations(
        &self,
        service_ids: &[String],
    ) -> BoxFuture<'_, HashMap<String, i64>, Self::Error>;

    /// Writes a booking. A uniqueness violation is reported as
    /// `InsertOutcome::Conflict`, every other failure as an error.
    fn insert_booking(&self, booking: NewBooking) -> BoxFuture<'_, InsertOutcome, Self::Error>;
}

/// Dashboard-side writes that shape a provider's availability.
pub trait ScheduleAdminStore: Send + Sync {
    /// Converted into an HTTP error by the admin routes.
    type Error: std::error::Error + Into<AgendaError> + Send + Sync + 'static;

    fn upsert_weekly_rule(&self, rule: WeeklyAvailabilityRule) -> BoxFuture<'_, (), Self::Error>;

    fn upsert_date_override(&self, date_override: DateOverride)
        -> BoxFuture<'_, (), Self::Error>;

    fn set_buffer_minutes(&self, provider_id: &str, minutes: i64)
        -> BoxFuture<'_, (), Self::Error>;

    /// Returns the id assigned to the new break.
    fn add_break(&self, break_period: BreakPeriod) -> BoxFuture<'_, String, Self::Error>;

    /// Returns `false` when no such break belongs to the provider.
    fn delete_break(&self, provider_id: &str, break_id: &str) -> BoxFuture<'_, bool, Self::Error>;

    fn upsert_service(&self, service: Service) -> BoxFuture<'_, (), Self::Error>;

    /// Every booking of the date regardless of status, ordered by time.
    fn list_bookings(
        &self,
        provider_id: &str,
        date: NaiveDate,
    ) -> BoxFuture<'_, Vec<Booking>, Self::Error>;

    /// Returns `false` when the booking does not exist.
    fn update_booking_status(
        &self,
        booking_id: &str,
        status: BookingStatus,
    ) -> BoxFuture<'_, bool, Self::Error>;
}
