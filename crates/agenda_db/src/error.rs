//! Error types for the database client

use agenda_common::{internal_error, store_error, AgendaError};
use thiserror::Error;

/// Errors that can occur when working with the database client
#[derive(Debug, Error)]
pub enum DbError {
    /// Error from SQLx
    #[error("Database error: {0}")]
    SqlxError(#[from] sqlx::Error),

    /// Error with the database configuration
    #[error("Database configuration error: {0}")]
    ConfigError(String),

    /// Error with database URL parsing
    #[error("Database URL error: {0}")]
    UrlError(String),

    /// Error with database pool creation
    #[error("Database pool error: {0}")]
    PoolError(String),

    /// Error with database query
    #[error("Database query error: {0}")]
    QueryError(String),

    /// A stored value could not be mapped back onto a model
    #[error("Corrupt row: {0}")]
    DecodeError(String),
}

impl From<DbError> for AgendaError {
    fn from(err: DbError) -> Self {
        match err {
            DbError::ConfigError(msg) | DbError::UrlError(msg) => AgendaError::ConfigError(msg),
            DbError::DecodeError(msg) => internal_error(msg),
            other => store_error(other),
        }
    }
}

/// Whether the error is a uniqueness violation raised by the database.
///
/// Covers Postgres SQLSTATE `23505` and the SQLite extended codes for unique
/// (`2067`) and primary key (`1555`) constraint failures.
pub fn is_unique_violation(err: &sqlx::Error) -> bool {
    match err.as_database_error() {
        Some(db_err) => {
            db_err.is_unique_violation()
                || matches!(db_err.code().as_deref(), Some("23505" | "2067" | "1555"))
        }
        None => false,
    }
}
