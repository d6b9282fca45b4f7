#![warn(missing_docs)]
#![forbid(unsafe_code)]

//! Metrics-backend client and demo data for sagres.
//!
//! This crate is the data-acquisition boundary: an async client for the
//! Prometheus-compatible metrics backend the raw feed series come from,
//! and a seeded synthetic generator for offline demo runs.
//!
//! ## Setup
//!
//! Set `SAGRES_METRICS_URL` (and optionally `SAGRES_METRICS_DS_UID`,
//! `SAGRES_METRICS_USER`, `SAGRES_METRICS_PASSWORD`) in the environment
//! or a `.env` file.

pub mod client;
pub mod demo;
pub mod error;
pub mod types;

// Re-export main types
pub use client::{DEFAULT_STEP, FeedClient};
pub use demo::demo_feeds;
pub use error::{FeedError, Result};
pub use types::{RangeData, RangeResponse, RangeSeries};
