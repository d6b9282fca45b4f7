#![warn(missing_docs)]
#![forbid(unsafe_code)]

//! # sagres
//!
//! Predictive signal evaluation engine for crypto market data.
//!
//! sagres is an umbrella crate that re-exports the sagres sub-crates for
//! convenience. It evaluates candidate trading signals against subsequent
//! price movement and ranks them by statistical predictive power.
//!
//! ## Quick Start
//!
//! ```ignore
//! use sagres::eval::{EvalConfig, Evaluator};
//! use sagres::feed::demo_feeds;
//! use sagres::signals::SignalRegistry;
//! use chrono::Utc;
//!
//! # fn main() -> sagres::Result<()> {
//! let feeds = demo_feeds("BTC", 168, 5, Utc::now())?;
//! let registry = SignalRegistry::from_raw_feeds(&feeds)?;
//!
//! let evaluator = Evaluator::new(EvalConfig::default())?;
//! let evaluation = evaluator.evaluate(registry.signals(), &feeds.price)?;
//!
//! for result in evaluation.ranked() {
//!     println!("{:20} {:.3}", result.signal, result.composite.unwrap());
//! }
//! # Ok(())
//! # }
//! ```
//!
//! ## Architecture
//!
//! The pipeline runs in three stages:
//!
//! 1. **Signals** are constructed from raw feed series by the registry
//! 2. The **quality gate** rejects series with gaps, missing runs, or
//!    domain violations before any statistic touches them
//! 3. The **evaluator** computes five independent metric families per
//!    signal (IC, hit rate, lead-lag, Granger causality, rolling power)
//!    and combines them into one deterministic composite ranking

/// Version information for the sagres crate.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Core types: time series, signals, errors, statistics.
pub mod traits {
    pub use sagres_traits::*;
}

/// Data quality gate.
pub mod quality {
    pub use sagres_quality::*;
}

/// Signal registry and derived-signal builders.
pub mod signals {
    pub use sagres_signals::*;
}

/// Metric calculators, composite scoring, and ranking.
pub mod eval {
    pub use sagres_eval::*;
}

/// Metrics-backend client and demo data.
pub mod feed {
    pub use sagres_feed::*;
}

// Re-export the common types at the top level
pub use sagres_eval::{EvalConfig, Evaluation, EvaluationResult, Evaluator};
pub use sagres_quality::{DataQualityChecker, QualityConfig, QualityReport};
pub use sagres_signals::{RawFeeds, SignalRegistry};
pub use sagres_traits::{Result, SagresError, Signal, SignalKind, TimeSeries, Timestamp};
