#![warn(missing_docs)]
#![forbid(unsafe_code)]

//! Metric calculators and signal ranking for sagres.
//!
//! This crate is the evaluation core: the five metric calculators
//! (information coefficient, hit rate, lead-lag, Granger causality,
//! rolling power) and the [`Evaluator`] that gates signals on data
//! quality, combines the metrics into a composite score, and produces a
//! deterministic ranking.
//!
//! # Example
//!
//! ```rust,ignore
//! use sagres_eval::{EvalConfig, Evaluator};
//!
//! let evaluator = Evaluator::new(EvalConfig::default())?;
//! let evaluation = evaluator.evaluate(&signals, &price)?;
//! for result in evaluation.ranked() {
//!     println!("{} -> {:.3}", result.signal, result.composite.unwrap());
//! }
//! ```

pub mod config;
pub mod evaluator;
pub mod granger;
pub mod hit_rate;
pub mod ic;
pub mod lead_lag;
pub mod rolling;

// Re-export main types
pub use config::{CompositeWeights, EvalConfig, IC_IR_NORM_SCALE, IC_NORM_SCALE};
pub use evaluator::{Evaluation, EvaluationResult, Evaluator};
pub use granger::{GRANGER_SIGNIFICANCE, GrangerResult, granger_score};
pub use hit_rate::{DirectionMode, HitRateResult};
pub use ic::ICResult;
pub use lead_lag::LeadLagResult;
pub use rolling::RollingPowerResult;
