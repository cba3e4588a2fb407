//! Error types for the Ronda pipeline.
//!
//! Every stage fails fast and reports which invariant it rejected. The
//! variants follow the three failure classes of the pipeline: invalid
//! configuration, data contract violations and degenerate numeric input.

use thiserror::Error;

/// The main error type for Ronda operations.
#[derive(Debug, Error)]
pub enum RondaError {
    /// A configuration value is out of range or conflicts with another one.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// Two inputs that must share an index or a column set do not.
    #[error("Data contract violation: {0}")]
    DataContract(String),

    /// The input is too short for the requested operation.
    #[error("Insufficient data: {0}")]
    InsufficientData(String),

    /// The input is numerically degenerate (zero variance, zero weights).
    #[error("Degenerate input: {0}")]
    Degenerate(String),

    /// Error when a required column or component is missing.
    #[error("Missing required column: {0}")]
    MissingColumn(String),

    /// Error when a date cannot be parsed.
    #[error("Invalid date: {0}")]
    InvalidDate(String),

    /// Error from Polars operations.
    #[error("Polars error: {0}")]
    Polars(#[from] polars::error::PolarsError),

    /// Generic error for other cases.
    #[error("Error: {0}")]
    Other(String),
}

impl From<String> for RondaError {
    fn from(s: String) -> Self {
        Self::Other(s)
    }
}

impl From<&str> for RondaError {
    fn from(s: &str) -> Self {
        Self::Other(s.to_string())
    }
}

/// A specialized Result type for Ronda operations.
pub type Result<T> = std::result::Result<T, RondaError>;
