//! Timestamp-indexed series with aligned-join semantics.
//!
//! [`TimeSeries`] is the foundation the quality checks and metric
//! calculators build on: an immutable sequence of (timestamp, value)
//! pairs with strictly increasing timestamps. Missing observations are
//! carried as `f64::NAN`, never as zero, and [`TimeSeries::align`] is the
//! single place where missing rows are dropped before statistical code
//! sees the values.

use crate::{Result, SagresError};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Timestamp type used throughout sagres.
pub type Timestamp = DateTime<Utc>;

/// Threshold below which a denominator is treated as zero.
const MIN_DENOMINATOR: f64 = 1e-12;

/// An immutable, timestamp-indexed numeric series.
///
/// Timestamps are strictly increasing; values may be missing (`NAN`).
/// Every transformation produces a new series over the same or a derived
/// timestamp index — nothing mutates in place.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TimeSeries {
    timestamps: Vec<Timestamp>,
    values: Vec<f64>,
}

/// Two series joined on their common timestamps, missing rows dropped.
///
/// Produced by [`TimeSeries::align`]. Both value vectors are the same
/// length and contain only finite values.
#[derive(Debug, Clone, PartialEq)]
pub struct Aligned {
    /// Common timestamps of the retained rows.
    pub timestamps: Vec<Timestamp>,
    /// Values from the left (self) series.
    pub left: Vec<f64>,
    /// Values from the right (other) series.
    pub right: Vec<f64>,
}

impl Aligned {
    /// Number of aligned rows.
    #[must_use]
    pub fn len(&self) -> usize {
        self.timestamps.len()
    }

    /// Whether no rows survived alignment.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.timestamps.is_empty()
    }
}

impl TimeSeries {
    /// Create a series from parallel timestamp and value vectors.
    ///
    /// # Errors
    ///
    /// Returns [`SagresError::InvalidSeries`] if the vectors differ in
    /// length or the timestamps are not strictly increasing.
    pub fn new(timestamps: Vec<Timestamp>, values: Vec<f64>) -> Result<Self> {
        if timestamps.len() != values.len() {
            return Err(SagresError::InvalidSeries(format!(
                "{} timestamps vs {} values",
                timestamps.len(),
                values.len()
            )));
        }
        for pair in timestamps.windows(2) {
            if pair[1] <= pair[0] {
                return Err(SagresError::InvalidSeries(format!(
                    "timestamps not strictly increasing at {}",
                    pair[1]
                )));
            }
        }
        Ok(Self { timestamps, values })
    }

    /// Create a series from (timestamp, value) pairs.
    ///
    /// # Errors
    ///
    /// Same invariants as [`TimeSeries::new`].
    pub fn from_pairs(pairs: Vec<(Timestamp, f64)>) -> Result<Self> {
        let (timestamps, values) = pairs.into_iter().unzip();
        Self::new(timestamps, values)
    }

    /// Number of observations (including missing ones).
    #[must_use]
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Whether the series has no observations.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// The timestamp index.
    #[must_use]
    pub fn timestamps(&self) -> &[Timestamp] {
        &self.timestamps
    }

    /// The raw values (missing entries are `NAN`).
    #[must_use]
    pub fn values(&self) -> &[f64] {
        &self.values
    }

    /// The observation at position `i`, if in range.
    #[must_use]
    pub fn get(&self, i: usize) -> Option<(Timestamp, f64)> {
        Some((*self.timestamps.get(i)?, *self.values.get(i)?))
    }

    /// Number of missing (non-finite) observations.
    #[must_use]
    pub fn missing_count(&self) -> usize {
        self.values.iter().filter(|v| !v.is_finite()).count()
    }

    /// Missing observations as a percentage of the series length.
    #[must_use]
    pub fn missing_pct(&self) -> f64 {
        if self.values.is_empty() {
            return 0.0;
        }
        self.missing_count() as f64 / self.values.len() as f64 * 100.0
    }

    /// Length of the leading run of missing values.
    ///
    /// Rolling-window signals produce an expected warm-up run of missing
    /// observations at the start; quality checks use this to exempt it.
    #[must_use]
    pub fn leading_missing_run(&self) -> usize {
        self.values.iter().take_while(|v| !v.is_finite()).count()
    }

    /// A new series with the same timestamp index and the given values.
    ///
    /// # Errors
    ///
    /// Returns [`SagresError::InvalidSeries`] on a length mismatch.
    pub fn with_values(&self, values: Vec<f64>) -> Result<Self> {
        if values.len() != self.timestamps.len() {
            return Err(SagresError::InvalidSeries(format!(
                "{} values for {} timestamps",
                values.len(),
                self.timestamps.len()
            )));
        }
        Ok(Self {
            timestamps: self.timestamps.clone(),
            values,
        })
    }

    /// Shift values against the timestamp index.
    ///
    /// A positive `offset` moves each value `offset` positions later
    /// (`out[i] = in[i - offset]`); a negative offset moves values
    /// earlier. Vacated positions are missing.
    #[must_use]
    pub fn shift(&self, offset: isize) -> Self {
        let n = self.values.len();
        let mut shifted = vec![f64::NAN; n];
        for (i, slot) in shifted.iter_mut().enumerate() {
            let src = i as isize - offset;
            if src >= 0 && (src as usize) < n {
                *slot = self.values[src as usize];
            }
        }
        Self {
            timestamps: self.timestamps.clone(),
            values: shifted,
        }
    }

    /// Difference against the value `periods` positions earlier.
    #[must_use]
    pub fn diff(&self, periods: usize) -> Self {
        let n = self.values.len();
        let mut out = vec![f64::NAN; n];
        for i in periods..n {
            let prev = self.values[i - periods];
            let cur = self.values[i];
            if prev.is_finite() && cur.is_finite() {
                out[i] = cur - prev;
            }
        }
        Self {
            timestamps: self.timestamps.clone(),
            values: out,
        }
    }

    /// Percent change against the value `periods` positions earlier.
    ///
    /// Missing where either endpoint is missing or the base is zero.
    #[must_use]
    pub fn pct_change(&self, periods: usize) -> Self {
        let n = self.values.len();
        let mut out = vec![f64::NAN; n];
        for i in periods..n {
            let prev = self.values[i - periods];
            let cur = self.values[i];
            if prev.is_finite() && cur.is_finite() && prev.abs() > MIN_DENOMINATOR {
                out[i] = (cur - prev) / prev;
            }
        }
        Self {
            timestamps: self.timestamps.clone(),
            values: out,
        }
    }

    /// Forward return at a fixed horizon: `(v[t+h] - v[t]) / v[t]`,
    /// indexed at `t`. The trailing `horizon` positions are missing.
    #[must_use]
    pub fn forward_return(&self, horizon: usize) -> Self {
        let n = self.values.len();
        let mut out = vec![f64::NAN; n];
        if horizon == 0 || horizon >= n {
            return Self {
                timestamps: self.timestamps.clone(),
                values: out,
            };
        }
        for i in 0..n - horizon {
            let base = self.values[i];
            let future = self.values[i + horizon];
            if base.is_finite() && future.is_finite() && base.abs() > MIN_DENOMINATOR {
                out[i] = (future - base) / base;
            }
        }
        Self {
            timestamps: self.timestamps.clone(),
            values: out,
        }
    }

    /// Trailing rolling mean over `window` samples; missing until the
    /// window fills or when any window entry is missing.
    ///
    /// # Errors
    ///
    /// Returns [`SagresError::InvalidConfig`] for a zero window.
    pub fn rolling_mean(&self, window: usize) -> Result<Self> {
        self.rolling(window, |slice| {
            slice.iter().sum::<f64>() / slice.len() as f64
        })
    }

    /// Trailing rolling sample standard deviation over `window` samples.
    ///
    /// # Errors
    ///
    /// Returns [`SagresError::InvalidConfig`] for a zero window.
    pub fn rolling_std(&self, window: usize) -> Result<Self> {
        self.rolling(window, |slice| {
            let n = slice.len();
            if n < 2 {
                return 0.0;
            }
            let mean = slice.iter().sum::<f64>() / n as f64;
            let var = slice.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / (n - 1) as f64;
            var.sqrt()
        })
    }

    fn rolling<F>(&self, window: usize, reduce: F) -> Result<Self>
    where
        F: Fn(&[f64]) -> f64,
    {
        if window == 0 {
            return Err(SagresError::InvalidConfig(
                "rolling window must be positive".to_string(),
            ));
        }
        let n = self.values.len();
        let mut out = vec![f64::NAN; n];
        for i in 0..n {
            if i + 1 < window {
                continue;
            }
            let slice = &self.values[i + 1 - window..=i];
            if slice.iter().all(|v| v.is_finite()) {
                out[i] = reduce(slice);
            }
        }
        Ok(Self {
            timestamps: self.timestamps.clone(),
            values: out,
        })
    }

    /// Join with another series on common timestamps, dropping rows where
    /// either side is missing.
    ///
    /// This is the explicit missing-data step performed once before each
    /// metric; statistical code downstream only ever sees finite values.
    #[must_use]
    pub fn align(&self, other: &Self) -> Aligned {
        let mut timestamps = Vec::new();
        let mut left = Vec::new();
        let mut right = Vec::new();

        let (mut i, mut j) = (0, 0);
        while i < self.timestamps.len() && j < other.timestamps.len() {
            match self.timestamps[i].cmp(&other.timestamps[j]) {
                std::cmp::Ordering::Less => i += 1,
                std::cmp::Ordering::Greater => j += 1,
                std::cmp::Ordering::Equal => {
                    let (a, b) = (self.values[i], other.values[j]);
                    if a.is_finite() && b.is_finite() {
                        timestamps.push(self.timestamps[i]);
                        left.push(a);
                        right.push(b);
                    }
                    i += 1;
                    j += 1;
                }
            }
        }

        Aligned {
            timestamps,
            left,
            right,
        }
    }
}
