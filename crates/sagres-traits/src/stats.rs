//! Statistical primitives shared by quality checks and metric calculators.
//!
//! These functions operate on already-aligned, finite values; callers are
//! expected to have gone through [`crate::TimeSeries::align`] first.

use crate::{Result, SagresError};

/// Minimum threshold for standard deviation to avoid division by zero.
/// Variance below this threshold is treated as zero.
pub const MIN_STD_THRESHOLD: f64 = 1e-10;

/// Mean and sample standard deviation (N-1 denominator) of a slice.
///
/// Empty input yields `(NAN, NAN)`; a single value yields `(value, 0.0)`.
#[must_use]
pub fn mean_std(values: &[f64]) -> (f64, f64) {
    if values.is_empty() {
        return (f64::NAN, f64::NAN);
    }
    let n = values.len();
    let mean = values.iter().sum::<f64>() / n as f64;
    let variance = if n > 1 {
        values.iter().map(|x| (x - mean).powi(2)).sum::<f64>() / (n - 1) as f64
    } else {
        0.0
    };
    (mean, variance.sqrt())
}

/// Pearson correlation coefficient between two equal-length slices.
///
/// # Errors
///
/// - [`SagresError::InvalidSeries`] on a length mismatch.
/// - [`SagresError::InsufficientData`] with fewer than two pairs.
/// - [`SagresError::Degenerate`] when either side has (near-)zero variance.
pub fn pearson(x: &[f64], y: &[f64]) -> Result<f64> {
    if x.len() != y.len() {
        return Err(SagresError::InvalidSeries(format!(
            "correlation inputs differ in length: {} vs {}",
            x.len(),
            y.len()
        )));
    }
    let n = x.len();
    if n < 2 {
        return Err(SagresError::InsufficientData(format!(
            "{n} pairs, need at least 2 for correlation"
        )));
    }

    let mean_x = x.iter().sum::<f64>() / n as f64;
    let mean_y = y.iter().sum::<f64>() / n as f64;

    let mut cov = 0.0;
    let mut var_x = 0.0;
    let mut var_y = 0.0;
    for i in 0..n {
        let dx = x[i] - mean_x;
        let dy = y[i] - mean_y;
        cov += dx * dy;
        var_x += dx * dx;
        var_y += dy * dy;
    }

    if var_x.sqrt() < MIN_STD_THRESHOLD || var_y.sqrt() < MIN_STD_THRESHOLD {
        return Err(SagresError::Degenerate(
            "zero-variance input makes correlation undefined".to_string(),
        ));
    }

    Ok((cov / (var_x.sqrt() * var_y.sqrt())).clamp(-1.0, 1.0))
}

/// Spearman rank correlation between two equal-length slices.
///
/// Computed as the Pearson correlation of average ranks.
///
/// # Errors
///
/// Same failure modes as [`pearson`]; a slice whose values are all tied
/// is degenerate.
pub fn spearman(x: &[f64], y: &[f64]) -> Result<f64> {
    if x.len() != y.len() {
        return Err(SagresError::InvalidSeries(format!(
            "correlation inputs differ in length: {} vs {}",
            x.len(),
            y.len()
        )));
    }
    let ranks_x = average_ranks(x);
    let ranks_y = average_ranks(y);
    pearson(&ranks_x, &ranks_y)
}

/// Ranks of values, ties receiving their average rank.
#[must_use]
pub fn average_ranks(values: &[f64]) -> Vec<f64> {
    let n = values.len();
    let mut indexed: Vec<(usize, f64)> = values.iter().copied().enumerate().collect();
    indexed.sort_by(|a, b| a.1.partial_cmp(&b.1).unwrap_or(std::cmp::Ordering::Equal));

    let mut ranks = vec![0.0; n];
    let mut i = 0;
    while i < n {
        let mut j = i;
        while j < n && (indexed[j].1 - indexed[i].1).abs() < f64::EPSILON {
            j += 1;
        }
        // Tied values share the average of the ranks they span
        let avg_rank = (i + j - 1) as f64 / 2.0;
        for k in i..j {
            ranks[indexed[k].0] = avg_rank;
        }
        i = j;
    }

    ranks
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_mean_std_basic() {
        let (mean, std) = mean_std(&[1.0, 2.0, 3.0, 4.0, 5.0]);
        assert_relative_eq!(mean, 3.0);
        assert_relative_eq!(std, 2.5f64.sqrt());
    }

    #[test]
    fn test_mean_std_edge_cases() {
        let (mean, std) = mean_std(&[]);
        assert!(mean.is_nan() && std.is_nan());

        let (mean, std) = mean_std(&[7.0]);
        assert_relative_eq!(mean, 7.0);
        assert_relative_eq!(std, 0.0);
    }

    #[test]
    fn test_pearson_self_is_one() {
        let x = [1.0, 2.5, 3.0, 4.2, 5.1, 6.0];
        assert_relative_eq!(pearson(&x, &x).unwrap(), 1.0, epsilon = 1e-12);
    }

    #[test]
    fn test_pearson_negation_is_minus_one() {
        let x = [1.0, 2.5, 3.0, 4.2, 5.1, 6.0];
        let neg: Vec<f64> = x.iter().map(|v| -v).collect();
        assert_relative_eq!(pearson(&x, &neg).unwrap(), -1.0, epsilon = 1e-12);
    }

    #[test]
    fn test_pearson_zero_variance_is_degenerate() {
        let x = [1.0, 2.0, 3.0];
        let flat = [5.0, 5.0, 5.0];
        assert!(matches!(
            pearson(&x, &flat),
            Err(SagresError::Degenerate(_))
        ));
    }

    #[test]
    fn test_pearson_too_few_pairs() {
        assert!(matches!(
            pearson(&[1.0], &[2.0]),
            Err(SagresError::InsufficientData(_))
        ));
    }

    #[test]
    fn test_pearson_length_mismatch() {
        assert!(matches!(
            pearson(&[1.0, 2.0], &[1.0]),
            Err(SagresError::InvalidSeries(_))
        ));
    }

    #[test]
    fn test_spearman_monotonic_nonlinear() {
        // Perfectly monotonic but non-linear: Spearman sees rank agreement
        let x = [1.0, 2.0, 3.0, 4.0, 5.0];
        let y = [1.0, 8.0, 27.0, 64.0, 125.0];
        assert_relative_eq!(spearman(&x, &y).unwrap(), 1.0, epsilon = 1e-12);
        assert!(pearson(&x, &y).unwrap() < 1.0);
    }

    #[test]
    fn test_spearman_reversed() {
        let x = [1.0, 2.0, 3.0, 4.0];
        let y = [4.0, 3.0, 2.0, 1.0];
        assert_relative_eq!(spearman(&x, &y).unwrap(), -1.0, epsilon = 1e-12);
    }

    #[test]
    fn test_average_ranks() {
        let ranks = average_ranks(&[3.0, 1.0, 2.0, 5.0, 4.0]);
        assert_eq!(ranks, vec![2.0, 0.0, 1.0, 4.0, 3.0]);
    }

    #[test]
    fn test_average_ranks_with_ties() {
        let ranks = average_ranks(&[1.0, 2.0, 2.0, 3.0]);
        assert_relative_eq!(ranks[0], 0.0);
        assert_relative_eq!(ranks[1], 1.5);
        assert_relative_eq!(ranks[2], 1.5);
        assert_relative_eq!(ranks[3], 3.0);
    }
}
