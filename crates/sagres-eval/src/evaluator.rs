//! Signal evaluation orchestration.
//!
//! The [`Evaluator`] runs the full pipeline per signal: quality gate,
//! the five metric calculators, composite scoring, and the deterministic
//! ranking. Per-signal evaluations share no mutable state, so they run as
//! a parallel map; the final order is produced by a total-order comparator
//! regardless of completion order.

use crate::config::{EvalConfig, IC_IR_NORM_SCALE, IC_NORM_SCALE};
use crate::granger::GrangerResult;
use crate::hit_rate::{DirectionMode, HitRateResult};
use crate::ic::ICResult;
use crate::lead_lag::LeadLagResult;
use crate::rolling::RollingPowerResult;
use rayon::prelude::*;
use sagres_quality::{DataQualityChecker, QualityReport, SignalQualityReport};
use sagres_traits::{Result, SagresError, Signal, SignalKind, TimeSeries};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::collections::BTreeMap;

/// Evaluation outcome for a single signal.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EvaluationResult {
    /// Signal name.
    pub signal: String,
    /// Signal classification.
    pub kind: SignalKind,
    /// The signal's quality report, whether it passed or not.
    pub quality: SignalQualityReport,
    /// Information coefficient statistics, if available.
    pub ic: Option<ICResult>,
    /// Directional accuracy statistics, if available.
    pub hit_rate: Option<HitRateResult>,
    /// Lead-lag statistics, if available.
    pub lead_lag: Option<LeadLagResult>,
    /// Granger causality result. Present for every evaluated signal:
    /// internal test failures fall back to the neutral result.
    pub granger: Option<GrangerResult>,
    /// Rolling predictive power series, if available.
    pub rolling: Option<RollingPowerResult>,
    /// Weighted composite score in [0, 1]; `None` for skipped signals.
    pub composite: Option<f64>,
    /// True when at least one metric was unavailable and the composite
    /// was renormalized over the remaining weights.
    pub partial: bool,
    /// Why the signal was skipped, when it failed the quality gate.
    pub skip_reason: Option<String>,
    /// 1-based rank among scored signals; `None` for skipped signals.
    pub rank: Option<usize>,
}

impl EvaluationResult {
    fn skipped(signal: &Signal, quality: SignalQualityReport) -> Self {
        let reason = format!("quality gate failed: {}", quality.issue_summary());
        Self {
            signal: signal.name().to_string(),
            kind: signal.kind(),
            quality,
            ic: None,
            hit_rate: None,
            lead_lag: None,
            granger: None,
            rolling: None,
            composite: None,
            partial: false,
            skip_reason: Some(reason),
            rank: None,
        }
    }

    /// Effective hit rate used in tie-breaks; 0 when unavailable.
    fn effective_hit_rate(&self) -> f64 {
        self.hit_rate.map_or(0.0, |h| h.effective)
    }

    /// Granger p-value used in tie-breaks; 1 when unavailable.
    fn granger_p(&self) -> f64 {
        self.granger.as_ref().map_or(1.0, |g| g.p_value)
    }
}

/// Output of a full evaluation run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Evaluation {
    /// All results, scored signals first in rank order, then skipped
    /// signals in name order.
    pub results: Vec<EvaluationResult>,
    /// The quality report, exposed independently so failures can be
    /// surfaced even when no ranking is produced.
    pub quality: QualityReport,
}

impl Evaluation {
    /// The scored (non-skipped) results, most predictive first.
    pub fn ranked(&self) -> impl Iterator<Item = &EvaluationResult> {
        self.results.iter().filter(|r| r.composite.is_some())
    }

    /// The signals skipped by the quality gate.
    pub fn skipped(&self) -> impl Iterator<Item = &EvaluationResult> {
        self.results.iter().filter(|r| r.composite.is_none())
    }

    /// Rolling power series keyed by signal name, for visualization.
    #[must_use]
    pub fn rolling_series(&self) -> BTreeMap<&str, &RollingPowerResult> {
        self.results
            .iter()
            .filter_map(|r| Some((r.signal.as_str(), r.rolling.as_ref()?)))
            .collect()
    }
}

/// Evaluates and ranks trading signals by predictive power.
#[derive(Debug, Clone)]
pub struct Evaluator {
    config: EvalConfig,
}

impl Evaluator {
    /// Create an evaluator with a validated configuration.
    ///
    /// # Errors
    ///
    /// Returns [`SagresError::InvalidConfig`] before any signal is
    /// processed if the configuration is invalid.
    pub fn new(config: EvalConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self { config })
    }

    /// The configuration in use.
    #[must_use]
    pub const fn config(&self) -> &EvalConfig {
        &self.config
    }

    /// Evaluate all signals against the price series and rank them.
    ///
    /// Signals failing the quality gate are recorded as skipped; no error
    /// from one signal's evaluation aborts the others. Identical inputs
    /// always produce an identical ranking.
    ///
    /// # Errors
    ///
    /// Only configuration problems abort the run.
    pub fn evaluate(&self, signals: &[Signal], price: &TimeSeries) -> Result<Evaluation> {
        let checker = DataQualityChecker::new(self.config.quality.clone())?;
        let quality = checker.check_all(signals, Some(price));

        let returns = price.pct_change(1);
        let forward = price.forward_return(self.config.horizon);

        let mut results: Vec<EvaluationResult> = signals
            .par_iter()
            .map(|signal| {
                let report = quality
                    .signals
                    .get(signal.name())
                    .cloned()
                    .unwrap_or_else(|| checker.check_signal(signal));

                if !report.passed {
                    tracing::warn!(
                        signal = signal.name(),
                        issues = %report.issue_summary(),
                        "quality gate failed, skipping evaluation"
                    );
                    return EvaluationResult::skipped(signal, report);
                }

                self.evaluate_signal(signal, price, &returns, &forward, report)
            })
            .collect();

        results.sort_by(compare_results);
        let mut rank = 0;
        for result in &mut results {
            if result.composite.is_some() {
                rank += 1;
                result.rank = Some(rank);
            }
        }

        Ok(Evaluation { results, quality })
    }

    fn evaluate_signal(
        &self,
        signal: &Signal,
        price: &TimeSeries,
        returns: &TimeSeries,
        forward: &TimeSeries,
        quality: SignalQualityReport,
    ) -> EvaluationResult {
        let cfg = &self.config;
        let series = signal.series();
        let mode = DirectionMode::for_kind(signal.kind());

        let ic = unavailable_to_none(
            signal.name(),
            "ic",
            ICResult::calculate(series, forward, cfg.ic_block_size, cfg.min_samples),
        );
        let hit_rate = unavailable_to_none(
            signal.name(),
            "hit_rate",
            HitRateResult::calculate(series, forward, mode, cfg.min_samples),
        );
        let lead_lag = unavailable_to_none(
            signal.name(),
            "lead_lag",
            LeadLagResult::calculate(series, price, cfg.max_lag, cfg.lag_step, cfg.min_samples),
        );
        let granger =
            GrangerResult::calculate(series, returns, cfg.granger_max_lag, cfg.min_samples);
        let rolling = unavailable_to_none(
            signal.name(),
            "rolling_power",
            RollingPowerResult::calculate(
                series,
                forward,
                cfg.rolling_window,
                mode,
                cfg.min_samples,
            ),
        );

        let (composite, partial) = composite_score(
            ic.as_ref(),
            hit_rate.as_ref(),
            lead_lag.as_ref(),
            &granger,
            &cfg.weights,
        );

        EvaluationResult {
            signal: signal.name().to_string(),
            kind: signal.kind(),
            quality,
            ic,
            hit_rate,
            lead_lag,
            granger: Some(granger),
            rolling,
            composite: Some(composite),
            partial,
            skip_reason: None,
            rank: None,
        }
    }
}

/// Map per-metric failures to "metric unavailable", logging anything
/// unexpected; failures never propagate across signals.
fn unavailable_to_none<T>(signal: &str, metric: &str, result: Result<T>) -> Option<T> {
    match result {
        Ok(value) => Some(value),
        Err(e) if e.is_metric_unavailable() => {
            tracing::debug!(signal, metric, reason = %e, "metric unavailable");
            None
        }
        Err(e) => {
            tracing::warn!(signal, metric, error = %e, "metric computation failed");
            None
        }
    }
}

/// Weighted composite over the available metrics, renormalized so the
/// score stays in [0, 1] when some metrics are missing. The boolean is
/// true when any weight had to be dropped.
fn composite_score(
    ic: Option<&ICResult>,
    hit_rate: Option<&HitRateResult>,
    lead_lag: Option<&LeadLagResult>,
    granger: &GrangerResult,
    weights: &crate::config::CompositeWeights,
) -> (f64, bool) {
    let mut numerator = 0.0;
    let mut denominator = 0.0;
    let mut partial = false;

    match ic {
        Some(ic) => {
            let ic_term = (ic.spearman.abs() / IC_NORM_SCALE).min(1.0);
            let ir_term = (ic.ic_ir.abs() / IC_IR_NORM_SCALE).min(1.0);
            numerator += weights.ic * ic_term + weights.ic_ir * ir_term;
            denominator += weights.ic + weights.ic_ir;
        }
        None => partial = true,
    }

    match hit_rate {
        Some(hit) => {
            let term = (hit.effective - 0.5) * 2.0;
            numerator += weights.hit_rate * term;
            denominator += weights.hit_rate;
        }
        None => partial = true,
    }

    match lead_lag {
        Some(ll) => {
            numerator += weights.lead_lag * ll.score;
            denominator += weights.lead_lag;
        }
        None => partial = true,
    }

    // The neutral Granger fallback scores 0 but stays in the denominator:
    // "no detectable causality" is an observation, not missing data.
    numerator += weights.granger * granger.score;
    denominator += weights.granger;

    if denominator <= 0.0 {
        return (0.0, true);
    }
    (numerator / denominator, partial)
}

/// Total order over evaluation results: composite descending, then
/// effective hit rate descending, then Granger p-value ascending, then
/// name ascending. Skipped signals sort after scored ones, by name.
fn compare_results(a: &EvaluationResult, b: &EvaluationResult) -> Ordering {
    match (a.composite, b.composite) {
        (Some(ca), Some(cb)) => cb
            .total_cmp(&ca)
            .then_with(|| b.effective_hit_rate().total_cmp(&a.effective_hit_rate()))
            .then_with(|| a.granger_p().total_cmp(&b.granger_p()))
            .then_with(|| a.signal.cmp(&b.signal)),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => a.signal.cmp(&b.signal),
    }
}
