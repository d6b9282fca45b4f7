//! CSV output for evaluation runs.
//!
//! Each run writes into a timestamped directory under the configured
//! output root: `summary.csv` with the ranked signals,
//! `quality_issues.csv` with every quality finding, and optional
//! per-signal `<name>_rolling.csv` files with the rolling power series.

use anyhow::Context;
use chrono::Utc;
use polars::prelude::*;
use sagres::eval::{Evaluation, EvaluationResult};
use sagres::quality::QualityReport;
use sagres::traits::TimeSeries;
use std::fs;
use std::path::{Path, PathBuf};

/// Writes the artifacts of one evaluation run.
pub(crate) struct OutputManager {
    run_dir: PathBuf,
}

impl OutputManager {
    /// Create a timestamped run directory under `base_dir`.
    pub(crate) fn create(base_dir: &str) -> anyhow::Result<Self> {
        let stamp = Utc::now().format("%Y-%m-%d_%H%M%S").to_string();
        let run_dir = Path::new(base_dir).join(stamp);
        fs::create_dir_all(&run_dir)
            .with_context(|| format!("creating output directory {}", run_dir.display()))?;
        Ok(Self { run_dir })
    }

    /// The directory this run writes into.
    pub(crate) fn run_dir(&self) -> &Path {
        &self.run_dir
    }

    /// Write the ranked summary, truncated to `top_n` scored signals when
    /// given; skipped signals are always appended for visibility.
    pub(crate) fn save_summary(
        &self,
        evaluation: &Evaluation,
        top_n: Option<usize>,
    ) -> anyhow::Result<PathBuf> {
        let limit = top_n.unwrap_or(usize::MAX);
        let rows: Vec<&EvaluationResult> = evaluation
            .ranked()
            .take(limit)
            .chain(evaluation.skipped())
            .collect();

        let mut rank = Vec::with_capacity(rows.len());
        let mut signal = Vec::with_capacity(rows.len());
        let mut kind = Vec::with_capacity(rows.len());
        let mut composite = Vec::with_capacity(rows.len());
        let mut pearson_ic = Vec::with_capacity(rows.len());
        let mut spearman_ic = Vec::with_capacity(rows.len());
        let mut ic_ir = Vec::with_capacity(rows.len());
        let mut hit_rate = Vec::with_capacity(rows.len());
        let mut effective_hit_rate = Vec::with_capacity(rows.len());
        let mut is_contrarian = Vec::with_capacity(rows.len());
        let mut best_lag = Vec::with_capacity(rows.len());
        let mut lead_lag_score = Vec::with_capacity(rows.len());
        let mut granger_p_value = Vec::with_capacity(rows.len());
        let mut granger_significant = Vec::with_capacity(rows.len());
        let mut granger_score = Vec::with_capacity(rows.len());
        let mut partial = Vec::with_capacity(rows.len());
        let mut skip_reason = Vec::with_capacity(rows.len());

        for row in rows {
            rank.push(row.rank.map(|r| r as u32));
            signal.push(row.signal.clone());
            kind.push(row.kind.to_string());
            composite.push(row.composite);
            pearson_ic.push(row.ic.map(|ic| ic.pearson));
            spearman_ic.push(row.ic.map(|ic| ic.spearman));
            ic_ir.push(row.ic.map(|ic| ic.ic_ir));
            hit_rate.push(row.hit_rate.map(|h| h.hit_rate));
            effective_hit_rate.push(row.hit_rate.map(|h| h.effective));
            is_contrarian.push(row.hit_rate.map(|h| h.is_contrarian));
            best_lag.push(row.lead_lag.map(|ll| ll.best_lag));
            lead_lag_score.push(row.lead_lag.map(|ll| ll.score));
            granger_p_value.push(row.granger.as_ref().map(|g| g.p_value));
            granger_significant.push(row.granger.as_ref().map(|g| g.significant));
            granger_score.push(row.granger.as_ref().map(|g| g.score));
            partial.push(row.partial);
            skip_reason.push(row.skip_reason.clone());
        }

        let mut df = df! {
            "rank" => rank,
            "signal" => signal,
            "kind" => kind,
            "composite_score" => composite,
            "pearson_ic" => pearson_ic,
            "spearman_ic" => spearman_ic,
            "ic_ir" => ic_ir,
            "hit_rate" => hit_rate,
            "effective_hit_rate" => effective_hit_rate,
            "is_contrarian" => is_contrarian,
            "best_lag" => best_lag,
            "lead_lag_score" => lead_lag_score,
            "granger_p_value" => granger_p_value,
            "granger_significant" => granger_significant,
            "granger_score" => granger_score,
            "partial" => partial,
            "skip_reason" => skip_reason,
        }?;

        let path = self.run_dir.join("summary.csv");
        write_csv(&mut df, &path)?;
        Ok(path)
    }

    /// Write every quality finding as one flat CSV.
    pub(crate) fn save_quality(&self, report: &QualityReport) -> anyhow::Result<PathBuf> {
        let issues: Vec<_> = report.issues().collect();

        let mut signal = Vec::with_capacity(issues.len());
        let mut kind = Vec::with_capacity(issues.len());
        let mut severity = Vec::with_capacity(issues.len());
        let mut timestamp = Vec::with_capacity(issues.len());
        let mut message = Vec::with_capacity(issues.len());
        let mut value = Vec::with_capacity(issues.len());

        for issue in issues {
            signal.push(issue.signal.clone());
            kind.push(issue.kind.to_string());
            severity.push(issue.severity.to_string());
            timestamp.push(issue.timestamp.map(|ts| ts.to_rfc3339()));
            message.push(issue.message.clone());
            value.push(issue.value);
        }

        let mut df = df! {
            "signal" => signal,
            "issue" => kind,
            "severity" => severity,
            "timestamp" => timestamp,
            "message" => message,
            "value" => value,
        }?;

        let path = self.run_dir.join("quality_issues.csv");
        write_csv(&mut df, &path)?;
        Ok(path)
    }

    /// Write one signal's rolling power series, if it has any.
    pub(crate) fn save_rolling(
        &self,
        result: &EvaluationResult,
    ) -> anyhow::Result<Option<PathBuf>> {
        let Some(rolling) = &result.rolling else {
            return Ok(None);
        };

        let mut df = df! {
            "timestamp" => rolling
                .rolling_ic
                .timestamps()
                .iter()
                .map(|ts| ts.to_rfc3339())
                .collect::<Vec<_>>(),
            "rolling_ic" => optional_values(&rolling.rolling_ic),
            "rolling_hit_rate" => optional_values(&rolling.rolling_hit_rate),
            "signal_score" => optional_values(&rolling.signal_score),
        }?;

        let path = self.run_dir.join(format!("{}_rolling.csv", result.signal));
        write_csv(&mut df, &path)?;
        Ok(Some(path))
    }
}

/// Missing observations become empty CSV cells rather than literal NaN.
fn optional_values(series: &TimeSeries) -> Vec<Option<f64>> {
    series
        .values()
        .iter()
        .map(|v| v.is_finite().then_some(*v))
        .collect()
}

fn write_csv(df: &mut DataFrame, path: &Path) -> anyhow::Result<()> {
    let mut file = fs::File::create(path)
        .with_context(|| format!("creating {}", path.display()))?;
    CsvWriter::new(&mut file)
        .finish(df)
        .with_context(|| format!("writing {}", path.display()))?;
    Ok(())
}
