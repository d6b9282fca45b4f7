//! Rolling predictive power.
//!
//! Recomputes Spearman IC and hit rate over a trailing window, one sample
//! at a time, so a caller can watch a signal's predictive power warm up or
//! decay over the evaluation window. This is the only metric whose result
//! is itself a set of time series rather than scalars.

use crate::config::IC_NORM_SCALE;
use crate::hit_rate::{DirectionMode, sign};
use sagres_traits::stats::spearman;
use sagres_traits::{Result, SagresError, TimeSeries};
use serde::{Deserialize, Serialize};

/// Instantaneous blend weights for the rolling signal score: the composite
/// IC and hit-rate weights (0.30 and 0.20) renormalized to sum to one.
const ROLLING_IC_WEIGHT: f64 = 0.6;
const ROLLING_HIT_WEIGHT: f64 = 0.4;

/// Time-varying predictive quality of a signal.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RollingPowerResult {
    /// Spearman IC over the trailing window, indexed by its right edge.
    pub rolling_ic: TimeSeries,
    /// Hit rate over the trailing window, indexed by its right edge.
    pub rolling_hit_rate: TimeSeries,
    /// Instantaneous composite of the two, in [0, 1] where defined.
    pub signal_score: TimeSeries,
}

impl RollingPowerResult {
    /// Compute the rolling IC, hit rate, and blended score series.
    ///
    /// Windows with fewer than `min_samples` usable observations produce
    /// a missing value rather than a spurious statistic; so do windows
    /// where the correlation is degenerate.
    ///
    /// # Errors
    ///
    /// Returns [`SagresError::InsufficientData`] when the aligned series
    /// is shorter than one full window.
    pub fn calculate(
        signal: &TimeSeries,
        forward_returns: &TimeSeries,
        window: usize,
        mode: DirectionMode,
        min_samples: usize,
    ) -> Result<Self> {
        let aligned = signal.align(forward_returns);
        let n = aligned.len();
        if n < window || window == 0 {
            return Err(SagresError::InsufficientData(format!(
                "{n} aligned observations, need a full window of {window}"
            )));
        }

        // Directions over the aligned rows; the first change row is undefined
        let directions: Vec<f64> = match mode {
            DirectionMode::Level => aligned.left.iter().map(|v| sign(*v)).collect(),
            DirectionMode::Change => {
                let mut dirs = vec![f64::NAN];
                dirs.extend(
                    aligned
                        .left
                        .windows(2)
                        .map(|pair| sign(pair[1] - pair[0])),
                );
                dirs
            }
        };
        let outcomes: Vec<f64> = aligned.right.iter().map(|v| sign(*v)).collect();

        let mut ic_values = vec![f64::NAN; n];
        let mut hit_values = vec![f64::NAN; n];
        let mut score_values = vec![f64::NAN; n];

        for end in (window - 1)..n {
            let start = end + 1 - window;

            let ic = spearman(
                &aligned.left[start..=end],
                &aligned.right[start..=end],
            )
            .ok();

            let hit = window_hit_rate(
                &directions[start..=end],
                &outcomes[start..=end],
                min_samples,
            );

            if let Some(ic) = ic {
                ic_values[end] = ic;
            }
            if let Some(hit) = hit {
                hit_values[end] = hit;
            }
            if let (Some(ic), Some(hit)) = (ic, hit) {
                let ic_term = (ic.abs() / IC_NORM_SCALE).min(1.0);
                let hit_term = (hit.max(1.0 - hit) - 0.5) * 2.0;
                score_values[end] = ROLLING_IC_WEIGHT * ic_term + ROLLING_HIT_WEIGHT * hit_term;
            }
        }

        let index = TimeSeries::new(aligned.timestamps, vec![0.0; n])?;
        Ok(Self {
            rolling_ic: index.with_values(ic_values)?,
            rolling_hit_rate: index.with_values(hit_values)?,
            signal_score: index.with_values(score_values)?,
        })
    }
}

/// Hit rate over one window of directions, or `None` when fewer than
/// `min_samples` rows carry a measurable bet.
fn window_hit_rate(directions: &[f64], outcomes: &[f64], min_samples: usize) -> Option<f64> {
    let mut usable = 0usize;
    let mut hits = 0usize;
    for (d, o) in directions.iter().zip(outcomes) {
        if !d.is_finite() || !o.is_finite() || *d == 0.0 || *o == 0.0 {
            continue;
        }
        usable += 1;
        if d == o {
            hits += 1;
        }
    }
    if usable < min_samples {
        return None;
    }
    Some(hits as f64 / usable as f64)
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

    #[test]
    fn test_warmup_is_missing() {
        let n = 40;
        let signal: Vec<f64> = (0..n).map(|i| (i as f64 * 0.5).sin()).collect();
        let fwd: Vec<f64> = (0..n).map(|i| (i as f64 * 0.5 + 0.3).sin() * 0.01).collect();

        let result = RollingPowerResult::calculate(
            &series(&signal),
            &series(&fwd),
            20,
            DirectionMode::Change,
            5,
        )
        .unwrap();

        assert_eq!(result.rolling_ic.len(), n);
        for i in 0..19 {
            assert!(result.rolling_ic.values()[i].is_nan());
            assert!(result.rolling_hit_rate.values()[i].is_nan());
            assert!(result.signal_score.values()[i].is_nan());
        }
        assert!(result.rolling_ic.values()[19].is_finite());
        assert!(result.rolling_hit_rate.values()[19].is_finite());
    }

    #[test]
    fn test_perfectly_predictive_window() {
        let n = 30;
        let signal: Vec<f64> = (0..n).map(|i| i as f64).collect();
        let fwd: Vec<f64> = (0..n).map(|i| 0.001 * (i as f64 + 1.0)).collect();

        let result = RollingPowerResult::calculate(
            &series(&signal),
            &series(&fwd),
            10,
            DirectionMode::Change,
            5,
        )
        .unwrap();

        let last_ic = *result.rolling_ic.values().last().unwrap();
        let last_hit = *result.rolling_hit_rate.values().last().unwrap();
        let last_score = *result.signal_score.values().last().unwrap();
        assert_relative_eq!(last_ic, 1.0, epsilon = 1e-10);
        assert_relative_eq!(last_hit, 1.0);
        assert_relative_eq!(last_score, 1.0);
    }

    #[test]
    fn test_score_bounds_property() {
        let n = 60;
        let signal: Vec<f64> = (0..n).map(|i| ((i * 17) % 23) as f64).collect();
        let fwd: Vec<f64> = (0..n)
            .map(|i| (((i * 7) % 11) as f64 - 5.0) * 0.01)
            .collect();

        let result = RollingPowerResult::calculate(
            &series(&signal),
            &series(&fwd),
            15,
            DirectionMode::Change,
            5,
        )
        .unwrap();

        for score in result.signal_score.values() {
            if score.is_finite() {
                assert!((0.0..=1.0).contains(score));
            }
        }
    }

    #[test]
    fn test_degenerate_window_is_missing() {
        // The signal freezes for a stretch; windows over the frozen part
        // have no defined correlation and no usable bets
        let mut signal: Vec<f64> = (0..20).map(|i| i as f64).collect();
        signal.extend(vec![19.0; 20]);
        let fwd: Vec<f64> = (0..40).map(|i| ((i % 3) as f64 - 1.0) * 0.01).collect();

        let result = RollingPowerResult::calculate(
            &series(&signal),
            &series(&fwd),
            10,
            DirectionMode::Change,
            5,
        )
        .unwrap();

        let last_ic = *result.rolling_ic.values().last().unwrap();
        assert!(last_ic.is_nan());
        let last_hit = *result.rolling_hit_rate.values().last().unwrap();
        assert!(last_hit.is_nan());
    }

    #[test]
    fn test_too_short_for_window() {
        let signal: Vec<f64> = (0..10).map(|i| i as f64).collect();
        let fwd: Vec<f64> = (0..10).map(|i| i as f64 * 0.01).collect();

        let result = RollingPowerResult::calculate(
            &series(&signal),
            &series(&fwd),
            20,
            DirectionMode::Change,
            5,
        );
        assert!(matches!(result, Err(SagresError::InsufficientData(_))));
    }

    #[test]
    fn test_level_mode_directions() {
        let n = 30;
        let signal: Vec<f64> = (0..n).map(|i| if i % 2 == 0 { 2.0 } else { -2.0 }).collect();
        let fwd: Vec<f64> = (0..n).map(|i| if i % 2 == 0 { 0.01 } else { -0.01 }).collect();

        let result = RollingPowerResult::calculate(
            &series(&signal),
            &series(&fwd),
            10,
            DirectionMode::Level,
            5,
        )
        .unwrap();
        let last_hit = *result.rolling_hit_rate.values().last().unwrap();
        assert_relative_eq!(last_hit, 1.0);
    }
}
