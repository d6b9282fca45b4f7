//! Quality issue and report types.

use sagres_traits::Timestamp;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// The kind of defect a quality check found.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum IssueKind {
    /// A hole in the timestamp index larger than the allowed gap.
    Gap,
    /// Too many missing observations.
    Missing,
    /// A run of identical consecutive values (frozen feed).
    Stale,
    /// A statistical outlier or implausible jump.
    Anomaly,
    /// A value outside the signal's declared domain bounds.
    Range,
}

impl IssueKind {
    /// Stable lowercase identifier.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Gap => "gap",
            Self::Missing => "missing",
            Self::Stale => "stale",
            Self::Anomaly => "anomaly",
            Self::Range => "range",
        }
    }
}

impl fmt::Display for IssueKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// How seriously an issue counts against a signal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Severity {
    /// Recorded for diagnostics; does not fail the signal.
    Advisory,
    /// Fails the signal's quality gate.
    Blocking,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Advisory => f.write_str("advisory"),
            Self::Blocking => f.write_str("blocking"),
        }
    }
}

/// A single data quality finding.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QualityIssue {
    /// Name of the signal the issue belongs to.
    pub signal: String,
    /// What kind of defect was found.
    pub kind: IssueKind,
    /// Whether the issue fails the signal.
    pub severity: Severity,
    /// Timestamp of the offending observation or range start, if pointwise.
    pub timestamp: Option<Timestamp>,
    /// Human-readable description.
    pub message: String,
    /// The offending value, where meaningful.
    pub value: Option<f64>,
}

/// Quality report for one signal.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SignalQualityReport {
    /// Signal name.
    pub name: String,
    /// Total observations, missing included.
    pub total_rows: usize,
    /// Missing observations.
    pub missing_count: usize,
    /// Missing observations as a percentage of total rows.
    pub missing_pct: f64,
    /// Number of timestamp gaps found.
    pub gap_count: usize,
    /// Number of stale runs found.
    pub stale_runs: usize,
    /// Number of anomalous points found.
    pub anomaly_count: usize,
    /// All findings, blocking and advisory.
    pub issues: Vec<QualityIssue>,
    /// True when no blocking issues were found.
    pub passed: bool,
}

impl SignalQualityReport {
    /// Only the blocking findings.
    pub fn blocking_issues(&self) -> impl Iterator<Item = &QualityIssue> {
        self.issues
            .iter()
            .filter(|i| i.severity == Severity::Blocking)
    }

    /// A short "3 gap, 1 stale" style summary of the findings.
    #[must_use]
    pub fn issue_summary(&self) -> String {
        let mut counts: BTreeMap<&str, usize> = BTreeMap::new();
        for issue in &self.issues {
            *counts.entry(issue.kind.as_str()).or_default() += 1;
        }
        counts
            .iter()
            .map(|(kind, n)| format!("{n} {kind}"))
            .collect::<Vec<_>>()
            .join(", ")
    }
}

/// Aggregated quality report across all checked signals.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct QualityReport {
    /// Per-signal reports, keyed by signal name.
    pub signals: BTreeMap<String, SignalQualityReport>,
}

impl QualityReport {
    /// Number of signals checked.
    #[must_use]
    pub fn total(&self) -> usize {
        self.signals.len()
    }

    /// Number of signals that passed the gate.
    #[must_use]
    pub fn passed(&self) -> usize {
        self.signals.values().filter(|r| r.passed).count()
    }

    /// Number of signals that failed the gate.
    #[must_use]
    pub fn failed(&self) -> usize {
        self.total() - self.passed()
    }

    /// All findings across all signals, in deterministic signal order.
    pub fn issues(&self) -> impl Iterator<Item = &QualityIssue> {
        self.signals.values().flat_map(|r| r.issues.iter())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn issue(kind: IssueKind, severity: Severity) -> QualityIssue {
        QualityIssue {
            signal: "test".to_string(),
            kind,
            severity,
            timestamp: None,
            message: String::new(),
            value: None,
        }
    }

    fn report(issues: Vec<QualityIssue>) -> SignalQualityReport {
        let passed = !issues.iter().any(|i| i.severity == Severity::Blocking);
        SignalQualityReport {
            name: "test".to_string(),
            total_rows: 100,
            missing_count: 0,
            missing_pct: 0.0,
            gap_count: 0,
            stale_runs: 0,
            anomaly_count: 0,
            issues,
            passed,
        }
    }

    #[test]
    fn test_blocking_issue_filter() {
        let r = report(vec![
            issue(IssueKind::Stale, Severity::Advisory),
            issue(IssueKind::Gap, Severity::Blocking),
        ]);
        assert_eq!(r.blocking_issues().count(), 1);
        assert!(!r.passed);
    }

    #[test]
    fn test_issue_summary() {
        let r = report(vec![
            issue(IssueKind::Gap, Severity::Blocking),
            issue(IssueKind::Gap, Severity::Blocking),
            issue(IssueKind::Stale, Severity::Advisory),
        ]);
        assert_eq!(r.issue_summary(), "2 gap, 1 stale");
    }

    #[test]
    fn test_quality_report_counts() {
        let mut qr = QualityReport::default();
        qr.signals.insert("a".to_string(), report(vec![]));
        qr.signals.insert(
            "b".to_string(),
            report(vec![issue(IssueKind::Range, Severity::Blocking)]),
        );

        assert_eq!(qr.total(), 2);
        assert_eq!(qr.passed(), 1);
        assert_eq!(qr.failed(), 1);
        assert_eq!(qr.issues().count(), 1);
    }
}
