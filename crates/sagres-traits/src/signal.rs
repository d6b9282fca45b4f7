//! Signal metadata and classification.
//!
//! A [`Signal`] pairs a named [`TimeSeries`] with the metadata the quality
//! gate and the metric calculators need: its [`SignalKind`] classification
//! and optional domain [`ValueBounds`]. Signals are created once by the
//! upstream registry and read-only afterwards.

use crate::TimeSeries;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Classification of a signal.
///
/// The kind controls which quality checks apply (derived signals have
/// legitimate high variance) and how directional predictions are read
/// (centered signals predict by the sign of the value itself).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SignalKind {
    /// Raw observed series (price, volume, open interest, ...).
    Raw,
    /// Period-over-period change of a raw series.
    Momentum,
    /// Rolling z-score of a raw series.
    ZScore,
    /// Ratio of two raw series.
    Ratio,
}

impl SignalKind {
    /// Whether the signal is derived from another series rather than
    /// observed directly.
    #[must_use]
    pub const fn is_derived(&self) -> bool {
        !matches!(self, Self::Raw)
    }

    /// Derived signals are exempt from statistical anomaly checks.
    #[must_use]
    pub const fn skip_anomaly_check(&self) -> bool {
        self.is_derived()
    }

    /// Centered signals predict direction by the sign of the value itself;
    /// everything else predicts by the sign of its period-over-period change.
    #[must_use]
    pub const fn direction_from_level(&self) -> bool {
        matches!(self, Self::ZScore)
    }

    /// Stable lowercase identifier.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Raw => "raw",
            Self::Momentum => "momentum",
            Self::ZScore => "zscore",
            Self::Ratio => "ratio",
        }
    }
}

impl fmt::Display for SignalKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Domain bounds for a signal's values.
///
/// Violations are reported by the quality gate's range check.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ValueBounds {
    /// Inclusive lower bound, if any.
    pub min: Option<f64>,
    /// Inclusive upper bound, if any.
    pub max: Option<f64>,
    /// Whether exact zeros are valid observations.
    pub allow_zero: bool,
    /// Whether negative values are valid observations.
    pub allow_negative: bool,
}

impl Default for ValueBounds {
    fn default() -> Self {
        Self {
            min: None,
            max: None,
            allow_zero: true,
            allow_negative: true,
        }
    }
}

impl ValueBounds {
    /// Values must be >= 0 (zero allowed).
    #[must_use]
    pub fn non_negative() -> Self {
        Self {
            allow_negative: false,
            ..Self::default()
        }
    }

    /// Values must be > 0.
    #[must_use]
    pub fn positive() -> Self {
        Self {
            allow_zero: false,
            allow_negative: false,
            ..Self::default()
        }
    }

    /// Values must lie within [min, max].
    #[must_use]
    pub fn range(min: f64, max: f64) -> Self {
        Self {
            min: Some(min),
            max: Some(max),
            ..Self::default()
        }
    }
}

/// A named time series believed to carry predictive information about
/// future price movement.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Signal {
    name: String,
    kind: SignalKind,
    series: TimeSeries,
    bounds: Option<ValueBounds>,
}

impl Signal {
    /// Create a signal with no domain bounds.
    #[must_use]
    pub fn new(name: impl Into<String>, kind: SignalKind, series: TimeSeries) -> Self {
        Self {
            name: name.into(),
            kind,
            series,
            bounds: None,
        }
    }

    /// Attach domain bounds for the range check.
    #[must_use]
    pub fn with_bounds(mut self, bounds: ValueBounds) -> Self {
        self.bounds = Some(bounds);
        self
    }

    /// The signal's unique name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The signal's classification.
    #[must_use]
    pub const fn kind(&self) -> SignalKind {
        self.kind
    }

    /// The underlying series.
    #[must_use]
    pub const fn series(&self) -> &TimeSeries {
        &self.series
    }

    /// Domain bounds, if any were declared.
    #[must_use]
    pub const fn bounds(&self) -> Option<&ValueBounds> {
        self.bounds.as_ref()
    }
}
