#![warn(missing_docs)]
#![forbid(unsafe_code)]

//! Core types for the sagres signal evaluation engine.
//!
//! This crate provides the foundational abstractions shared by the sagres
//! crates: the timestamp-indexed [`TimeSeries`], the [`Signal`] metadata
//! wrapper, the common error type, and the statistical primitives the
//! metric calculators are built on.

/// The version of the sagres-traits crate.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

// Module declarations
pub mod error;
pub mod series;
pub mod signal;
pub mod stats;

// Re-exports
pub use error::{Result, SagresError};
pub use series::{Aligned, TimeSeries, Timestamp};
pub use signal::{Signal, SignalKind, ValueBounds};
