//! SQL persistence for Agenda.
//!
//! Provides a driver-agnostic [`DbClient`] over a SQLx `Any` pool and the
//! [`SqlBookingStore`], which implements both store traits from
//! `agenda_common`. SQLite is the default driver; enable the `postgres`
//! feature for PostgreSQL URLs.
//!
//! # Example
//!
//! ```rust,no_run
//! use agenda_db::{DbClient, SqlBookingStore};
//!
//! async fn setup() -> Result<SqlBookingStore, agenda_db::error::DbError> {
//!     let client = DbClient::from_url("sqlite://data/agenda.db").await?;
//!     let store = SqlBookingStore::new(client);
//!     store.init_schema().await?;
//!     Ok(store)
//! }
//! ```

pub mod client;
pub mod error;
pub mod repositories;

pub use client::DbClient;
pub use error::DbError;
pub use repositories::SqlBookingStore;
