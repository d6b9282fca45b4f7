//! Derived-signal builders.
//!
//! Transformations from raw feed series into candidate signals: momentum
//! (period-over-period change), rolling z-scores, and binary ratio and
//! difference combinations. All builders preserve the timestamp index —
//! undefined points become missing values, they are never dropped, so the
//! quality gate still sees the full sampling grid.

use sagres_traits::stats::MIN_STD_THRESHOLD;
use sagres_traits::{Result, TimeSeries};

/// Percent change of a series over `periods` samples.
#[must_use]
pub fn momentum(series: &TimeSeries, periods: usize) -> TimeSeries {
    series.pct_change(periods)
}

/// Rolling z-score of a series over a trailing `window`.
///
/// The leading `window - 1` observations are the expected warm-up run of
/// missing values; windows with (near-)zero dispersion are missing too.
///
/// # Errors
///
/// Returns an error for a zero window.
pub fn zscore(series: &TimeSeries, window: usize) -> Result<TimeSeries> {
    let mean = series.rolling_mean(window)?;
    let std = series.rolling_std(window)?;

    let values = series
        .values()
        .iter()
        .zip(mean.values())
        .zip(std.values())
        .map(|((v, m), s)| {
            if v.is_finite() && m.is_finite() && s.is_finite() && *s > MIN_STD_THRESHOLD {
                (v - m) / s
            } else {
                f64::NAN
            }
        })
        .collect();

    series.with_values(values)
}

/// Elementwise ratio of two series over their common timestamps.
///
/// Rows where either side is missing, or the denominator is zero, stay in
/// the index as missing values.
///
/// # Errors
///
/// Propagates series-construction errors.
pub fn ratio(numerator: &TimeSeries, denominator: &TimeSeries) -> Result<TimeSeries> {
    combine(numerator, denominator, |a, b| {
        if b.abs() > MIN_STD_THRESHOLD {
            a / b
        } else {
            f64::NAN
        }
    })
}

/// Elementwise difference of two series over their common timestamps.
///
/// # Errors
///
/// Propagates series-construction errors.
pub fn difference(left: &TimeSeries, right: &TimeSeries) -> Result<TimeSeries> {
    combine(left, right, |a, b| a - b)
}

/// Merge-join two series on their common timestamps and combine values.
/// Missing inputs propagate as missing outputs; the row itself survives.
fn combine<F>(left: &TimeSeries, right: &TimeSeries, op: F) -> Result<TimeSeries>
where
    F: Fn(f64, f64) -> f64,
{
    let mut pairs = Vec::new();
    let (mut i, mut j) = (0, 0);
    let (lts, rts) = (left.timestamps(), right.timestamps());

    while i < lts.len() && j < rts.len() {
        match lts[i].cmp(&rts[j]) {
            std::cmp::Ordering::Less => i += 1,
            std::cmp::Ordering::Greater => j += 1,
            std::cmp::Ordering::Equal => {
                let (a, b) = (left.values()[i], right.values()[j]);
                let value = if a.is_finite() && b.is_finite() {
                    op(a, b)
                } else {
                    f64::NAN
                };
                pairs.push((lts[i], value));
                i += 1;
                j += 1;
            }
        }
    }

    TimeSeries::from_pairs(pairs)
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
    fn test_momentum() {
        let s = series(&[100.0, 110.0, 121.0]);
        let m = momentum(&s, 1);
        assert!(m.values()[0].is_nan());
        assert_relative_eq!(m.values()[1], 0.10);
        assert_relative_eq!(m.values()[2], 0.10);
    }

    #[test]
    fn test_zscore_centering() {
        let values: Vec<f64> = (0..20).map(|i| (i % 4) as f64).collect();
        let z = zscore(&series(&values), 4).unwrap();

        // Warm-up run is missing
        assert_eq!(z.leading_missing_run(), 3);
        // Every full window sees the same {0,1,2,3} population, so the
        // z-scores cycle deterministically
        let window_mean = 1.5;
        let window_std = (5.0f64 / 3.0).sqrt();
        assert_relative_eq!(z.values()[3], (3.0 - window_mean) / window_std, epsilon = 1e-12);
        assert_relative_eq!(z.values()[4], (0.0 - window_mean) / window_std, epsilon = 1e-12);
    }

    #[test]
    fn test_zscore_flat_window_missing() {
        let z = zscore(&series(&[5.0; 10]), 4).unwrap();
        assert!(z.values().iter().all(|v| v.is_nan()));
    }

    #[test]
    fn test_ratio_basic_and_zero_denominator() {
        let a = series(&[10.0, 20.0, 30.0]);
        let b = series(&[2.0, 0.0, 5.0]);
        let r = ratio(&a, &b).unwrap();

        assert_eq!(r.len(), 3);
        assert_relative_eq!(r.values()[0], 5.0);
        assert!(r.values()[1].is_nan());
        assert_relative_eq!(r.values()[2], 6.0);
    }

    #[test]
    fn test_ratio_missing_propagates_in_place() {
        let a = series(&[10.0, f64::NAN, 30.0]);
        let b = series(&[2.0, 4.0, 5.0]);
        let r = ratio(&a, &b).unwrap();

        // The row survives as missing rather than being dropped
        assert_eq!(r.len(), 3);
        assert!(r.values()[1].is_nan());
        assert_eq!(r.timestamps(), a.timestamps());
    }

    #[test]
    fn test_difference() {
        let a = series(&[10.0, 20.0, 30.0]);
        let b = series(&[1.0, 2.0, 3.0]);
        let d = difference(&a, &b).unwrap();
        assert_eq!(d.values(), &[9.0, 18.0, 27.0]);
    }

    #[test]
    fn test_combine_intersects_timestamps() {
        let a = TimeSeries::new(vec![ts(0), ts(1), ts(2)], vec![1.0, 2.0, 3.0]).unwrap();
        let b = TimeSeries::new(vec![ts(1), ts(2), ts(3)], vec![10.0, 20.0, 30.0]).unwrap();
        let d = difference(&a, &b).unwrap();

        assert_eq!(d.len(), 2);
        assert_eq!(d.timestamps(), &[ts(1), ts(2)]);
        assert_eq!(d.values(), &[-8.0, -17.0]);
    }
}
