use std::fmt;
use thiserror::Error;

/// The base error type for all Agenda errors.
///
/// Each crate keeps its own detailed error enum and converts into this one at
/// the HTTP boundary.
#[derive(Error, Debug)]
pub enum AgendaError {
    /// Error occurred due to missing or invalid configuration
    #[error("Configuration error: {0}")]
    ConfigError(String),

    /// Error occurred during validation
    #[error("Validation error: {0}")]
    ValidationError(String),

    /// The backing store failed or could not be reached
    #[error("Store error: {0}")]
    StoreError(String),

    /// Error occurred due to a resource not being found
    #[error("Not found: {0}")]
    NotFoundError(String),

    /// Error occurred due to a timeout
    #[error("Timeout: {0}")]
    TimeoutError(String),

    /// Error occurred due to an internal error
    #[error("Internal error: {0}")]
    InternalError(String),
}

/// A trait for converting errors to HTTP status codes.
pub trait HttpStatusCode {
    /// Returns the HTTP status code for this error.
    fn status_code(&self) -> u16;
}

impl HttpStatusCode for AgendaError {
    fn status_code(&self) -> u16 {
        match self {
            AgendaError::ConfigError(_) => 500,
            AgendaError::ValidationError(_) => 400,
            AgendaError::StoreError(_) => 503,
            AgendaError::NotFoundError(_) => 404,
            AgendaError::TimeoutError(_) => 504,
            AgendaError::InternalError(_) => 500,
        }
    }
}

// Utility functions for error handling
pub fn validation_error<T: fmt::Display>(message: T) -> AgendaError {
    AgendaError::ValidationError(message.to_string())
}

pub fn not_found<T: fmt::Display>(message: T) -> AgendaError {
    AgendaError::NotFoundError(message.to_string())
}

pub fn store_error<T: fmt::Display>(message: T) -> AgendaError {
    AgendaError::StoreError(message.to_string())
}

pub fn internal_error<T: fmt::Display>(message: T) -> AgendaError {
    AgendaError::InternalError(message.to_string())
}
