#![warn(missing_docs)]
#![forbid(unsafe_code)]

//! Signal registry and derived-signal construction for sagres.
//!
//! This crate turns the raw feed series (borrow/repay volumes, RSI,
//! funding rate, open interest) into the candidate signal set the
//! evaluator ranks: raw pass-throughs plus momentum, z-score, ratio,
//! and net-flow derivations, each tagged with the classification and
//! domain bounds the quality gate relies on.

pub mod derive;
pub mod registry;

// Re-export key types
pub use registry::{
    MOMENTUM_PERIODS, RawFeeds, SignalInfo, SignalRegistry, ZSCORE_WINDOW, available_signals,
};
