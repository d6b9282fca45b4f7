//! Lead-lag cross-correlation analysis.
//!
//! Scans a symmetric lag window to find the offset at which a signal's
//! values best correlate with price. A positive best lag means the signal
//! *leads* price — the only configuration worth anything for prediction —
//! and the lead-lag score rewards it proportionally to how far ahead the
//! signal runs.

use sagres_traits::stats::pearson;
use sagres_traits::{Result, SagresError, TimeSeries};
use serde::{Deserialize, Serialize};

/// Correlations closer than this are treated as tied.
const TIE_EPS: f64 = 1e-12;

/// Result of a lead-lag scan.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LeadLagResult {
    /// Lag (in samples) with the maximum absolute correlation.
    /// Positive: the signal leads price. Negative: price leads the signal.
    pub best_lag: i64,
    /// Correlation at the best lag.
    pub best_correlation: f64,
    /// `max(0, best_lag) / max_lag`, in [0, 1].
    pub score: f64,
    /// Overlapping observations at the best lag.
    pub n_obs: usize,
}

impl LeadLagResult {
    /// Cross-correlate the signal against price over the inclusive lag
    /// range `[-max_lag, +max_lag]` stepped by `lag_step` (both in the
    /// native sampling period of the series).
    ///
    /// Ties on |correlation| prefer the smaller absolute lag, then the
    /// more negative lag, making the result deterministic.
    ///
    /// # Errors
    ///
    /// - [`SagresError::InsufficientData`] when the zero-lag overlap is
    ///   below `min_samples`.
    /// - [`SagresError::Degenerate`] when no tested lag produced a defined
    ///   correlation (e.g. a constant signal).
    pub fn calculate(
        signal: &TimeSeries,
        price: &TimeSeries,
        max_lag: usize,
        lag_step: usize,
        min_samples: usize,
    ) -> Result<Self> {
        let aligned = signal.align(price);
        let n = aligned.len();
        if n < min_samples {
            return Err(SagresError::InsufficientData(format!(
                "{n} overlapping observations at lag 0, need {min_samples}"
            )));
        }

        let max_lag_i = max_lag as i64;
        let step = lag_step.max(1) as i64;
        let mut best: Option<(i64, f64, usize)> = None;

        let mut lag = -max_lag_i;
        while lag <= max_lag_i {
            let abs_lag = lag.unsigned_abs() as usize;
            let overlap = n.saturating_sub(abs_lag);
            if overlap >= min_samples {
                let (x, y) = lagged_slices(&aligned.left, &aligned.right, lag);
                if let Ok(corr) = pearson(x, y) {
                    let replace = match best {
                        None => true,
                        Some((best_lag, best_corr, _)) => {
                            is_better(lag, corr.abs(), best_lag, best_corr.abs())
                        }
                    };
                    if replace {
                        best = Some((lag, corr, overlap));
                    }
                }
            }
            lag += step;
        }

        let (best_lag, best_correlation, n_obs) = best.ok_or_else(|| {
            SagresError::Degenerate("no lag produced a defined correlation".to_string())
        })?;

        let score = if max_lag > 0 {
            best_lag.max(0) as f64 / max_lag as f64
        } else {
            0.0
        };

        Ok(Self {
            best_lag,
            best_correlation,
            score,
            n_obs,
        })
    }
}

/// Overlapping windows of signal shifted by `lag` against unshifted price:
/// a positive lag pairs `signal[t - lag]` with `price[t]`.
fn lagged_slices<'a>(signal: &'a [f64], price: &'a [f64], lag: i64) -> (&'a [f64], &'a [f64]) {
    let n = signal.len();
    if lag >= 0 {
        let lag = lag as usize;
        (&signal[..n - lag], &price[lag..])
    } else {
        let lag = (-lag) as usize;
        (&signal[lag..], &price[..n - lag])
    }
}

fn is_better(cand_lag: i64, cand_abs: f64, best_lag: i64, best_abs: f64) -> bool {
    if cand_abs > best_abs + TIE_EPS {
        return true;
    }
    if (cand_abs - best_abs).abs() <= TIE_EPS {
        if cand_lag.abs() < best_lag.abs() {
            return true;
        }
        if cand_lag.abs() == best_lag.abs() && cand_lag < best_lag {
            return true;
        }
    }
    false
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use chrono::{Duration, TimeZone, Utc};
    use sagres_traits::Timestamp;

    fn ts(i: usize) -> Timestamp {
        Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap() + Duration::minutes(5 * i as i64)
    }

    fn series(values: &[f64]) -> TimeSeries {
        let timestamps = (0..values.len()).map(ts).collect();
        TimeSeries::new(timestamps, values.to_vec()).unwrap()
    }

    fn wavy_price(n: usize) -> TimeSeries {
        let values: Vec<f64> = (0..n)
            .map(|i| 100.0 + (i as f64 * 0.37).sin() * 10.0 + i as f64 * 0.1)
            .collect();
        series(&values)
    }

    #[test]
    fn test_leading_signal_recovers_lag() {
        let price = wavy_price(120);
        // The signal sees the price k samples ahead of time
        let k = 3;
        let signal = price.shift(-k);

        let result = LeadLagResult::calculate(&signal, &price, 6, 1, 10).unwrap();
        assert_eq!(result.best_lag, k as i64);
        assert_relative_eq!(result.best_correlation, 1.0, epsilon = 1e-9);
        assert_relative_eq!(result.score, 0.5);
    }

    #[test]
    fn test_lagging_signal_scores_zero() {
        let price = wavy_price(120);
        // The signal trails the price by k samples
        let signal = price.shift(4);

        let result = LeadLagResult::calculate(&signal, &price, 6, 1, 10).unwrap();
        assert_eq!(result.best_lag, -4);
        assert_relative_eq!(result.score, 0.0);
    }

    #[test]
    fn test_score_bounds_property() {
        let price = wavy_price(100);
        let signal: Vec<f64> = (0..100).map(|i| ((i * 7) % 13) as f64).collect();

        let result = LeadLagResult::calculate(&series(&signal), &price, 12, 2, 10).unwrap();
        assert!(result.score >= 0.0 && result.score <= 1.0);
        assert!(result.best_correlation.abs() <= 1.0);
    }

    #[test]
    fn test_tie_prefers_smaller_absolute_lag() {
        // A linear ramp correlates perfectly at every lag; the tie-break
        // chain must settle on lag 0
        let values: Vec<f64> = (0..60).map(|i| i as f64).collect();
        let price = series(&values);
        let signal = series(&values);

        let result = LeadLagResult::calculate(&signal, &price, 5, 1, 10).unwrap();
        assert_eq!(result.best_lag, 0);
        assert_relative_eq!(result.score, 0.0);
    }

    #[test]
    fn test_insufficient_overlap() {
        let price = wavy_price(8);
        let signal = wavy_price(8);
        let result = LeadLagResult::calculate(&signal, &price, 4, 1, 10);
        assert!(matches!(result, Err(SagresError::InsufficientData(_))));
    }

    #[test]
    fn test_constant_signal_degenerate() {
        let price = wavy_price(60);
        let signal = series(&[7.0; 60]);
        let result = LeadLagResult::calculate(&signal, &price, 6, 1, 10);
        assert!(matches!(result, Err(SagresError::Degenerate(_))));
    }
}
