// --- File: crates/agenda_common/src/lib.rs ---

pub mod error; // Error taxonomy shared by every crate
pub mod http; // Axum response conversions
pub mod logging; // Tracing subscriber setup
pub mod models; // Scheduling records
pub mod services; // Store abstractions

pub use error::{
    internal_error, not_found, store_error, validation_error, AgendaError,
    HttpStatusCode,
};

pub use logging::{init, init_with_level};

pub use models::{
    format_time_of_day, parse_date, parse_time_of_day, weekday_from_index, weekday_index, weekday_of,
    ActiveBooking, Booking, BookingStatus, BreakPeriod, BreakRecurrence, DateOverride,
    InsertOutcome, NewBooking, Service, WeeklyAvailabilityRule,
};

pub use services::{BookingStore, BoxFuture, ScheduleAdminStore};
