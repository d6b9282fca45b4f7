//! Data quality checks for signal series.
//!
//! The [`DataQualityChecker`] is the gate every signal passes before any
//! metric is computed: it scans for timestamp gaps, missing values, frozen
//! feeds, statistical anomalies, and domain-range violations, and reports
//! them with a per-check severity policy. Gap, missing, and range findings
//! are blocking; staleness and anomalies are advisory, except a stale run
//! covering more than half the series, which escalates to blocking.

use crate::report::{IssueKind, QualityIssue, QualityReport, Severity, SignalQualityReport};
use chrono::Duration;
use sagres_traits::stats::{MIN_STD_THRESHOLD, mean_std};
use sagres_traits::{Result, SagresError, Signal, SignalKind, TimeSeries, Timestamp, ValueBounds};
use serde::{Deserialize, Serialize};

/// Minimum clean observations before anomaly statistics are meaningful.
const MIN_ANOMALY_SAMPLES: usize = 10;

/// Thresholds for the quality checks.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QualityConfig {
    /// Nominal sampling interval of the input series, in minutes.
    pub expected_interval_minutes: i64,
    /// Timestamp deltas above this are flagged as gaps.
    pub max_gap_minutes: i64,
    /// Missing-value percentage above this is flagged.
    pub max_nan_pct: f64,
    /// Runs of identical values at least this long are flagged as stale.
    pub max_consecutive_dupes: usize,
    /// Absolute z-score above this is flagged as an anomaly.
    pub anomaly_zscore: f64,
    /// Period-over-period percent change above this is flagged.
    pub max_pct_change: f64,
}

impl Default for QualityConfig {
    fn default() -> Self {
        Self {
            expected_interval_minutes: 5,
            max_gap_minutes: 10,
            max_nan_pct: 5.0,
            max_consecutive_dupes: 12,
            anomaly_zscore: 5.0,
            max_pct_change: 50.0,
        }
    }
}

impl QualityConfig {
    /// Validate the thresholds.
    ///
    /// # Errors
    ///
    /// Returns [`SagresError::InvalidConfig`] for any out-of-range value.
    /// Invalid quality configuration aborts the whole evaluation run
    /// before any signal is processed.
    pub fn validate(&self) -> Result<()> {
        if self.expected_interval_minutes < 1 {
            return Err(SagresError::InvalidConfig(
                "expected_interval_minutes must be at least 1".to_string(),
            ));
        }
        if self.max_gap_minutes < self.expected_interval_minutes {
            return Err(SagresError::InvalidConfig(format!(
                "max_gap_minutes ({}) must not be below the expected interval ({})",
                self.max_gap_minutes, self.expected_interval_minutes
            )));
        }
        if !(0.0..=100.0).contains(&self.max_nan_pct) {
            return Err(SagresError::InvalidConfig(format!(
                "max_nan_pct must be within [0, 100], got {}",
                self.max_nan_pct
            )));
        }
        if self.max_consecutive_dupes < 2 {
            return Err(SagresError::InvalidConfig(
                "max_consecutive_dupes must be at least 2".to_string(),
            ));
        }
        if self.anomaly_zscore <= 0.0 {
            return Err(SagresError::InvalidConfig(format!(
                "anomaly_zscore must be positive, got {}",
                self.anomaly_zscore
            )));
        }
        if self.max_pct_change <= 0.0 {
            return Err(SagresError::InvalidConfig(format!(
                "max_pct_change must be positive, got {}",
                self.max_pct_change
            )));
        }
        Ok(())
    }
}

/// Runs quality checks on signal series before they are trusted for
/// evaluation.
#[derive(Debug, Clone)]
pub struct DataQualityChecker {
    config: QualityConfig,
}

impl Default for DataQualityChecker {
    fn default() -> Self {
        Self {
            config: QualityConfig::default(),
        }
    }
}

impl DataQualityChecker {
    /// Create a checker with validated thresholds.
    ///
    /// # Errors
    ///
    /// Returns [`SagresError::InvalidConfig`] if the thresholds fail
    /// [`QualityConfig::validate`].
    pub fn new(config: QualityConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self { config })
    }

    /// The thresholds in use.
    #[must_use]
    pub const fn config(&self) -> &QualityConfig {
        &self.config
    }

    /// Check for unexpected time gaps between consecutive observations.
    #[must_use]
    pub fn check_gaps(&self, series: &TimeSeries, name: &str) -> Vec<QualityIssue> {
        let max_gap = Duration::minutes(self.config.max_gap_minutes);
        let mut issues = Vec::new();

        for pair in series.timestamps().windows(2) {
            let delta = pair[1] - pair[0];
            if delta > max_gap {
                issues.push(QualityIssue {
                    signal: name.to_string(),
                    kind: IssueKind::Gap,
                    severity: Severity::Blocking,
                    timestamp: Some(pair[1]),
                    message: format!(
                        "{}min gap (expected {}min)",
                        delta.num_minutes(),
                        self.config.expected_interval_minutes
                    ),
                    value: Some(delta.num_minutes() as f64),
                });
            }
        }

        issues
    }

    /// Check the missing-value fraction.
    ///
    /// Rolling z-score signals carry an expected warm-up run of missing
    /// values at the start; that leading run is excluded from the fraction
    /// before the threshold is applied.
    #[must_use]
    pub fn check_missing(&self, signal: &Signal) -> Vec<QualityIssue> {
        let series = signal.series();
        let total = series.len();
        if total == 0 {
            return Vec::new();
        }

        let mut missing = series.missing_count();
        let mut rows = total;
        if signal.kind() == SignalKind::ZScore {
            let warmup = series.leading_missing_run();
            missing -= warmup;
            rows -= warmup;
        }
        if rows == 0 {
            return Vec::new();
        }

        let pct = missing as f64 / rows as f64 * 100.0;
        if pct > self.config.max_nan_pct {
            vec![QualityIssue {
                signal: signal.name().to_string(),
                kind: IssueKind::Missing,
                severity: Severity::Blocking,
                timestamp: None,
                message: format!("{pct:.1}% missing values ({missing} rows)"),
                value: Some(pct),
            }]
        } else {
            Vec::new()
        }
    }

    /// Check for stale data: runs of identical consecutive values.
    ///
    /// A run of at least `max_consecutive_dupes` is advisory; a run
    /// covering more than half the (missing-stripped) series is blocking.
    #[must_use]
    pub fn check_stale(&self, series: &TimeSeries, name: &str) -> Vec<QualityIssue> {
        let clean: Vec<(Timestamp, f64)> = series
            .timestamps()
            .iter()
            .zip(series.values())
            .filter(|(_, v)| v.is_finite())
            .map(|(ts, v)| (*ts, *v))
            .collect();

        let mut issues = Vec::new();
        if clean.len() < 2 {
            return issues;
        }

        let mut run_start = 0;
        for i in 1..=clean.len() {
            let run_over = i == clean.len() || clean[i].1 != clean[run_start].1;
            if !run_over {
                continue;
            }
            let run_len = i - run_start;
            if run_len >= self.config.max_consecutive_dupes {
                let severity = if run_len * 2 > clean.len() {
                    Severity::Blocking
                } else {
                    Severity::Advisory
                };
                issues.push(QualityIssue {
                    signal: name.to_string(),
                    kind: IssueKind::Stale,
                    severity,
                    timestamp: Some(clean[run_start].0),
                    message: format!("{run_len} consecutive identical values"),
                    value: Some(run_len as f64),
                });
            }
            run_start = i;
        }

        issues
    }

    /// Check for statistical outliers and implausible jumps.
    #[must_use]
    pub fn check_anomalies(&self, series: &TimeSeries, name: &str) -> Vec<QualityIssue> {
        let clean: Vec<(Timestamp, f64)> = series
            .timestamps()
            .iter()
            .zip(series.values())
            .filter(|(_, v)| v.is_finite())
            .map(|(ts, v)| (*ts, *v))
            .collect();

        let mut issues = Vec::new();
        if clean.len() < MIN_ANOMALY_SAMPLES {
            return issues;
        }

        let values: Vec<f64> = clean.iter().map(|(_, v)| *v).collect();
        let (mean, std) = mean_std(&values);

        if std > MIN_STD_THRESHOLD {
            for (ts, v) in &clean {
                let z = (v - mean) / std;
                if z.abs() > self.config.anomaly_zscore {
                    issues.push(QualityIssue {
                        signal: name.to_string(),
                        kind: IssueKind::Anomaly,
                        severity: Severity::Advisory,
                        timestamp: Some(*ts),
                        message: format!("z-score {z:.1} (value={v:.2})"),
                        value: Some(*v),
                    });
                }
            }
        }

        for pair in clean.windows(2) {
            let (prev, cur) = (pair[0].1, pair[1].1);
            if prev.abs() < MIN_STD_THRESHOLD {
                continue;
            }
            let pct = ((cur - prev) / prev).abs() * 100.0;
            if pct > self.config.max_pct_change {
                issues.push(QualityIssue {
                    signal: name.to_string(),
                    kind: IssueKind::Anomaly,
                    severity: Severity::Advisory,
                    timestamp: Some(pair[1].0),
                    message: format!("{pct:.1}% jump"),
                    value: Some(cur),
                });
            }
        }

        issues
    }

    /// Check the signal's declared domain bounds.
    #[must_use]
    pub fn check_range(&self, signal: &Signal) -> Vec<QualityIssue> {
        let Some(bounds) = signal.bounds() else {
            return Vec::new();
        };

        let mut issues = Vec::new();
        for (ts, v) in signal.series().timestamps().iter().zip(signal.series().values()) {
            if !v.is_finite() {
                continue;
            }
            let message = if !bounds.allow_zero && *v == 0.0 {
                Some("zero value not allowed".to_string())
            } else if !bounds.allow_negative && *v < 0.0 {
                Some("negative value not allowed".to_string())
            } else if bounds.min.is_some_and(|min| *v < min) {
                Some(format!("below min ({})", bounds.min.unwrap_or_default()))
            } else if bounds.max.is_some_and(|max| *v > max) {
                Some(format!("above max ({})", bounds.max.unwrap_or_default()))
            } else {
                None
            };

            if let Some(message) = message {
                issues.push(QualityIssue {
                    signal: signal.name().to_string(),
                    kind: IssueKind::Range,
                    severity: Severity::Blocking,
                    timestamp: Some(*ts),
                    message,
                    value: Some(*v),
                });
            }
        }

        issues
    }

    /// Run every check on a single signal.
    #[must_use]
    pub fn check_signal(&self, signal: &Signal) -> SignalQualityReport {
        let series = signal.series();
        let name = signal.name();
        let mut issues = Vec::new();

        let gap_issues = self.check_gaps(series, name);
        let gap_count = gap_issues.len();
        issues.extend(gap_issues);

        issues.extend(self.check_missing(signal));

        let stale_issues = self.check_stale(series, name);
        let stale_runs = stale_issues.len();
        issues.extend(stale_issues);

        let anomaly_count = if signal.kind().skip_anomaly_check() {
            0
        } else {
            let anomaly_issues = self.check_anomalies(series, name);
            let count = anomaly_issues.len();
            issues.extend(anomaly_issues);
            count
        };

        issues.extend(self.check_range(signal));

        let passed = !issues.iter().any(|i| i.severity == Severity::Blocking);

        SignalQualityReport {
            name: name.to_string(),
            total_rows: series.len(),
            missing_count: series.missing_count(),
            missing_pct: series.missing_pct(),
            gap_count,
            stale_runs,
            anomaly_count,
            issues,
            passed,
        }
    }

    /// Run quality checks on all signals, optionally including the price
    /// series itself (checked as a positive raw series named `price`).
    ///
    /// Pure and idempotent: the same inputs always produce the same report.
    #[must_use]
    pub fn check_all(&self, signals: &[Signal], price: Option<&TimeSeries>) -> QualityReport {
        let mut report = QualityReport::default();

        for signal in signals {
            report
                .signals
                .insert(signal.name().to_string(), self.check_signal(signal));
        }

        if let Some(price) = price {
            let price_signal = Signal::new("price", SignalKind::Raw, price.clone())
                .with_bounds(ValueBounds::positive());
            report
                .signals
                .insert("price".to_string(), self.check_signal(&price_signal));
        }

        report
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use chrono::{TimeZone, Utc};

    fn ts(minutes: i64) -> Timestamp {
        Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap() + Duration::minutes(minutes)
    }

    fn regular_series(values: &[f64]) -> TimeSeries {
        let timestamps = (0..values.len()).map(|i| ts(5 * i as i64)).collect();
        TimeSeries::new(timestamps, values.to_vec()).unwrap()
    }

    fn checker() -> DataQualityChecker {
        DataQualityChecker::default()
    }

    #[test]
    fn test_config_validation() {
        assert!(QualityConfig::default().validate().is_ok());

        let bad = QualityConfig {
            max_nan_pct: 150.0,
            ..Default::default()
        };
        assert!(matches!(bad.validate(), Err(SagresError::InvalidConfig(_))));

        let bad = QualityConfig {
            anomaly_zscore: 0.0,
            ..Default::default()
        };
        assert!(bad.validate().is_err());

        let bad = QualityConfig {
            max_gap_minutes: 2,
            expected_interval_minutes: 5,
            ..Default::default()
        };
        assert!(bad.validate().is_err());
    }

    #[test]
    fn test_single_gap_reported_once() {
        // 30-minute hole between ts(10) and ts(40) with max_gap = 10
        let timestamps = vec![ts(0), ts(5), ts(10), ts(40), ts(45)];
        let series = TimeSeries::new(timestamps, vec![1.0; 5]).unwrap();

        let issues = checker().check_gaps(&series, "test");
        assert_eq!(issues.len(), 1);
        assert_eq!(issues[0].kind, IssueKind::Gap);
        assert_eq!(issues[0].severity, Severity::Blocking);
        assert_eq!(issues[0].timestamp, Some(ts(40)));
        assert_relative_eq!(issues[0].value.unwrap(), 30.0);
    }

    #[test]
    fn test_no_gap_at_expected_interval() {
        let series = regular_series(&[1.0, 2.0, 3.0, 4.0]);
        assert!(checker().check_gaps(&series, "test").is_empty());
    }

    #[test]
    fn test_missing_over_threshold() {
        let mut values = vec![1.0; 20];
        values[3] = f64::NAN;
        values[7] = f64::NAN;
        // 10% missing with a 5% threshold
        let signal = Signal::new("raw_feed", SignalKind::Raw, regular_series(&values));
        let issues = checker().check_missing(&signal);
        assert_eq!(issues.len(), 1);
        assert_eq!(issues[0].kind, IssueKind::Missing);
        assert_relative_eq!(issues[0].value.unwrap(), 10.0);
    }

    #[test]
    fn test_zscore_warmup_exempt() {
        // 12 leading NaN from rolling warm-up, clean afterwards
        let mut values = vec![f64::NAN; 12];
        values.extend(vec![0.5; 28]);
        let signal = Signal::new("rsi_zscore", SignalKind::ZScore, regular_series(&values));
        assert!(checker().check_missing(&signal).is_empty());

        // The same series as a raw signal is 30% missing and fails
        let signal = Signal::new("rsi", SignalKind::Raw, regular_series(&values));
        assert_eq!(checker().check_missing(&signal).len(), 1);
    }

    #[test]
    fn test_zscore_mid_series_missing_still_flagged() {
        let mut values = vec![f64::NAN; 5];
        values.extend(vec![0.5; 20]);
        for v in values.iter_mut().skip(6).step_by(3) {
            *v = f64::NAN;
        }
        let signal = Signal::new("oi_zscore", SignalKind::ZScore, regular_series(&values));
        let issues = checker().check_missing(&signal);
        assert_eq!(issues.len(), 1);
    }

    #[test]
    fn test_stale_run_advisory() {
        // 12 identical values in a series of 40: advisory
        let mut values: Vec<f64> = (0..40).map(|i| i as f64).collect();
        for v in values.iter_mut().take(24).skip(12) {
            *v = 99.0;
        }
        let series = regular_series(&values);
        let issues = checker().check_stale(&series, "test");
        assert_eq!(issues.len(), 1);
        assert_eq!(issues[0].severity, Severity::Advisory);
        assert_relative_eq!(issues[0].value.unwrap(), 12.0);
        assert_eq!(issues[0].timestamp, Some(ts(5 * 12)));
    }

    #[test]
    fn test_stale_majority_run_is_blocking() {
        // 30 of 40 values frozen: escalated to blocking
        let mut values: Vec<f64> = (0..40).map(|i| i as f64).collect();
        for v in values.iter_mut().take(35).skip(5) {
            *v = 42.0;
        }
        let series = regular_series(&values);
        let issues = checker().check_stale(&series, "test");
        assert_eq!(issues.len(), 1);
        assert_eq!(issues[0].severity, Severity::Blocking);
    }

    #[test]
    fn test_short_runs_not_stale() {
        let values = [1.0, 1.0, 1.0, 2.0, 2.0, 3.0, 3.0, 3.0, 4.0, 5.0];
        let series = regular_series(&values);
        assert!(checker().check_stale(&series, "test").is_empty());
    }

    #[test]
    fn test_anomaly_outlier_flagged() {
        let mut values = vec![10.0, 10.1, 9.9, 10.2, 9.8, 10.0, 10.1, 9.9, 10.0, 10.1, 10.0];
        values.push(500.0);
        let series = regular_series(&values);
        let issues = checker().check_anomalies(&series, "test");
        assert!(!issues.is_empty());
        assert!(issues.iter().all(|i| i.kind == IssueKind::Anomaly));
        assert!(issues.iter().all(|i| i.severity == Severity::Advisory));
    }

    #[test]
    fn test_anomaly_skipped_for_derived_kind() {
        let mut values = vec![10.0; 11];
        values.push(500.0);
        let signal = Signal::new(
            "borrow_momentum",
            SignalKind::Momentum,
            regular_series(&values),
        );
        let report = checker().check_signal(&signal);
        assert_eq!(report.anomaly_count, 0);
    }

    #[test]
    fn test_range_violations() {
        let signal = Signal::new(
            "rsi_raw",
            SignalKind::Raw,
            regular_series(&[50.0, 105.0, -3.0, 70.0]),
        )
        .with_bounds(ValueBounds::range(0.0, 100.0));

        let issues = checker().check_range(&signal);
        assert_eq!(issues.len(), 2);
        assert!(issues.iter().all(|i| i.severity == Severity::Blocking));
        assert_relative_eq!(issues[0].value.unwrap(), 105.0);
        assert_relative_eq!(issues[1].value.unwrap(), -3.0);
    }

    #[test]
    fn test_range_zero_and_negative_rules() {
        let signal = Signal::new(
            "open_interest",
            SignalKind::Raw,
            regular_series(&[1.0, 0.0, -2.0, 3.0]),
        )
        .with_bounds(ValueBounds::positive());

        let issues = checker().check_range(&signal);
        assert_eq!(issues.len(), 2);
    }

    #[test]
    fn test_check_signal_pass_and_fail() {
        let clean = Signal::new(
            "clean",
            SignalKind::Raw,
            regular_series(&(0..30).map(|i| 10.0 + i as f64 * 0.1).collect::<Vec<_>>()),
        );
        assert!(checker().check_signal(&clean).passed);

        let timestamps = vec![ts(0), ts(5), ts(60)];
        let gappy = Signal::new(
            "gappy",
            SignalKind::Raw,
            TimeSeries::new(timestamps, vec![1.0, 2.0, 3.0]).unwrap(),
        );
        let report = checker().check_signal(&gappy);
        assert!(!report.passed);
        assert_eq!(report.gap_count, 1);
    }

    #[test]
    fn test_check_all_counts_and_idempotence() {
        let signals = vec![
            Signal::new(
                "clean",
                SignalKind::Raw,
                regular_series(&(0..30).map(|i| 10.0 + i as f64 * 0.1).collect::<Vec<_>>()),
            ),
            Signal::new("frozen", SignalKind::Raw, regular_series(&[5.0; 30])),
        ];
        let price = regular_series(&(0..30).map(|i| 100.0 + i as f64).collect::<Vec<_>>());

        let first = checker().check_all(&signals, Some(&price));
        assert_eq!(first.total(), 3);
        assert_eq!(first.passed(), 2);
        assert_eq!(first.failed(), 1); // the frozen feed escalates to blocking

        let second = checker().check_all(&signals, Some(&price));
        assert_eq!(first, second);
    }
}
