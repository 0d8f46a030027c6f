//! Store implementations backed by the SQL client.

pub mod booking_store_sql;

pub use booking_store_sql::SqlBookingStore;
