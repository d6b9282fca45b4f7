//! Error types for the sagres signal evaluation engine.
//!
//! This module defines the error type shared across the sagres crates,
//! covering series construction, configuration validation, and the
//! per-metric failure modes of the evaluation pipeline.

use thiserror::Error;

/// The main error type for sagres operations.
#[derive(Debug, Error)]
pub enum SagresError {
    /// Too few aligned observations to compute a statistic reliably.
    #[error("Insufficient data: {0}")]
    InsufficientData(String),

    /// A statistic is undefined for the input (e.g. zero-variance series).
    #[error("Statistical degeneracy: {0}")]
    Degenerate(String),

    /// A series violated a structural invariant at construction.
    #[error("Invalid series: {0}")]
    InvalidSeries(String),

    /// Configuration failed validation.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// A signal name was not found in the registry.
    #[error("Signal not found: {0}")]
    SignalNotFound(String),

    /// Generic error for other cases.
    #[error("Error: {0}")]
    Other(String),
}

impl SagresError {
    /// Whether this error means "metric unavailable for this signal" rather
    /// than a failure that should abort the evaluation run.
    #[must_use]
    pub const fn is_metric_unavailable(&self) -> bool {
        matches!(self, Self::InsufficientData(_) | Self::Degenerate(_))
    }
}

impl From<String> for SagresError {
    fn from(s: String) -> Self {
        Self::Other(s)
    }
}

impl From<&str> for SagresError {
    fn from(s: &str) -> Self {
        Self::Other(s.to_string())
    }
}

/// A specialized Result type for sagres operations.
pub type Result<T> = std::result::Result<T, SagresError>;
