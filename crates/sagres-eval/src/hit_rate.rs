//! Directional accuracy statistics.
//!
//! The hit rate measures how often a signal's direction matches the
//! direction of the subsequent return. A hit rate reliably *below* 0.5 is
//! just as useful as one above it — the signal predicts the opposite
//! direction — so the effective hit rate folds both cases into
//! `max(h, 1 - h)` and contrarian signals are flagged explicitly.

use sagres_traits::{Result, SagresError, SignalKind, TimeSeries};
use serde::{Deserialize, Serialize};

/// How a signal's directional prediction is read.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DirectionMode {
    /// Direction is the sign of the period-over-period change.
    Change,
    /// Direction is the sign of the value itself (centered signals).
    Level,
}

impl DirectionMode {
    /// The direction mode implied by a signal's classification.
    #[must_use]
    pub const fn for_kind(kind: SignalKind) -> Self {
        if kind.direction_from_level() {
            Self::Level
        } else {
            Self::Change
        }
    }
}

/// Sign of a value with an explicit zero (unlike `f64::signum`, which
/// maps 0.0 to 1.0).
pub(crate) fn sign(v: f64) -> f64 {
    if v > 0.0 {
        1.0
    } else if v < 0.0 {
        -1.0
    } else {
        0.0
    }
}

/// Result of a hit-rate computation.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct HitRateResult {
    /// Fraction of usable rows where signal and outcome direction match.
    pub hit_rate: f64,
    /// Hit rate restricted to rows where the signal pointed up.
    /// `NAN` when no such rows exist.
    pub bullish: f64,
    /// Hit rate restricted to rows where the signal pointed down.
    /// `NAN` when no such rows exist.
    pub bearish: f64,
    /// `max(hit_rate, 1 - hit_rate)`, always in [0.5, 1.0].
    pub effective: f64,
    /// True when the signal reliably predicts the opposite direction.
    pub is_contrarian: bool,
    /// Usable rows: aligned, with a non-zero direction on both sides.
    pub n_obs: usize,
}

impl HitRateResult {
    /// Compute directional accuracy of a signal against forward returns.
    ///
    /// Rows where either direction is exactly zero carry no measurable
    /// bet and are excluded from every denominator.
    ///
    /// # Errors
    ///
    /// Returns [`SagresError::InsufficientData`] when fewer than
    /// `min_samples` usable rows remain — a constant signal ends up here,
    /// since every direction is zero.
    pub fn calculate(
        signal: &TimeSeries,
        forward_returns: &TimeSeries,
        mode: DirectionMode,
        min_samples: usize,
    ) -> Result<Self> {
        let direction_series = match mode {
            DirectionMode::Change => signal.diff(1),
            DirectionMode::Level => signal.clone(),
        };

        let aligned = direction_series.align(forward_returns);
        let rows: Vec<(f64, f64)> = aligned
            .left
            .iter()
            .zip(&aligned.right)
            .map(|(s, r)| (sign(*s), sign(*r)))
            .filter(|(s, r)| *s != 0.0 && *r != 0.0)
            .collect();

        if rows.len() < min_samples {
            return Err(SagresError::InsufficientData(format!(
                "{} usable directional rows, need {min_samples}",
                rows.len()
            )));
        }

        let n = rows.len();
        let hits = rows.iter().filter(|(s, r)| s == r).count();
        let hit_rate = hits as f64 / n as f64;

        let bullish = conditional_rate(&rows, 1.0);
        let bearish = conditional_rate(&rows, -1.0);

        let effective = hit_rate.max(1.0 - hit_rate);
        let is_contrarian = hit_rate < 0.5;

        Ok(Self {
            hit_rate,
            bullish,
            bearish,
            effective,
            is_contrarian,
            n_obs: n,
        })
    }
}

/// Hit rate over rows whose signal direction equals `direction`;
/// `NAN` when no such rows exist.
fn conditional_rate(rows: &[(f64, f64)], direction: f64) -> f64 {
    let total = rows.iter().filter(|(s, _)| *s == direction).count();
    if total == 0 {
        return f64::NAN;
    }
    let hits = rows
        .iter()
        .filter(|(s, r)| *s == direction && s == r)
        .count();
    hits as f64 / total as f64
}
