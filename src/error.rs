//! Crate-wide error type.
//!
//! Every failure maps to a process exit code so the binary can report it
//! without knowing which layer produced it.

use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum AppError {
    /// Malformed or out-of-range request input. Carries every message found.
    #[error("Validation failed: {}", .0.join("; "))]
    Validation(Vec<String>),

    /// A curve-math precondition was violated (e.g. logistic endpoints above the asymptote).
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// A forecast step failed; the whole run is discarded.
    #[error("Forecast failed at day {day}: {message}")]
    ForecastFailed { day: usize, message: String },

    /// Feature schema, scaler or model width disagree.
    #[error("Schema mismatch: {0}")]
    Schema(String),

    #[error("{0}")]
    Io(String),

    #[error("Rate limit exceeded: maximum {limit} requests per hour allowed")]
    RateLimited { limit: u32 },
}

impl AppError {
    pub fn validation(message: impl Into<String>) -> Self {
        AppError::Validation(vec![message.into()])
    }

    pub fn invalid_input(message: impl Into<String>) -> Self {
        AppError::InvalidInput(message.into())
    }

    pub fn io(message: impl Into<String>) -> Self {
        AppError::Io(message.into())
    }

    /// Wrap any step error as a forecast failure at `day`.
    ///
    /// An error that already is a `ForecastFailed` keeps its original day.
    pub fn at_day(self, day: usize) -> Self {
        match self {
            AppError::ForecastFailed { .. } => self,
            other => AppError::ForecastFailed {
                day,
                message: other.to_string(),
            },
        }
    }

    pub fn exit_code(&self) -> u8 {
        match self {
            AppError::Validation(_) | AppError::InvalidInput(_) => 2,
            AppError::Io(_) => 3,
            AppError::ForecastFailed { .. } | AppError::Schema(_) => 4,
            AppError::RateLimited { .. } => 5,
        }
    }

    /// Individual messages, used for the `details` field of batch results.
    pub fn details(&self) -> Vec<String> {
        match self {
            AppError::Validation(errors) => errors.clone(),
            other => vec![other.to_string()],
        }
    }
}
