//! Evaluation configuration.
//!
//! All knobs for an evaluation run live in [`EvalConfig`]. Construction is
//! cheap; [`EvalConfig::validate`] is called once at evaluation start and
//! any invalid value aborts the whole run before a signal is touched —
//! defaults are never silently substituted.

use sagres_quality::QualityConfig;
use sagres_traits::{Result, SagresError};
use serde::{Deserialize, Serialize};

/// Scale constant mapping |Spearman IC| to a [0, 1] composite term:
/// an IC at or above 0.3 counts as full strength.
pub const IC_NORM_SCALE: f64 = 0.3;

/// Scale constant mapping |IC-IR| to a [0, 1] composite term: IC-IR is
/// unbounded, so it is clipped at 2.0 before rescaling.
pub const IC_IR_NORM_SCALE: f64 = 2.0;

/// Weights of the composite score terms.
///
/// Each term is normalized to [0, 1] before weighting, so the composite
/// lands in [0, 1] as well. When a metric is unavailable for a signal the
/// remaining weights are renormalized over the available ones.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct CompositeWeights {
    /// Weight of |Spearman IC|.
    pub ic: f64,
    /// Weight of the IC information ratio.
    pub ic_ir: f64,
    /// Weight of the effective hit rate.
    pub hit_rate: f64,
    /// Weight of the lead-lag score.
    pub lead_lag: f64,
    /// Weight of the Granger causality score.
    pub granger: f64,
}

impl Default for CompositeWeights {
    fn default() -> Self {
        Self {
            ic: 0.30,
            ic_ir: 0.25,
            hit_rate: 0.20,
            lead_lag: 0.15,
            granger: 0.10,
        }
    }
}

impl CompositeWeights {
    /// Sum of all weights.
    #[must_use]
    pub fn total(&self) -> f64 {
        self.ic + self.ic_ir + self.hit_rate + self.lead_lag + self.granger
    }

    /// Validate the weights: all finite and non-negative, positive sum.
    ///
    /// # Errors
    ///
    /// Returns [`SagresError::InvalidConfig`] otherwise.
    pub fn validate(&self) -> Result<()> {
        let entries = [
            ("ic", self.ic),
            ("ic_ir", self.ic_ir),
            ("hit_rate", self.hit_rate),
            ("lead_lag", self.lead_lag),
            ("granger", self.granger),
        ];
        for (name, w) in entries {
            if !w.is_finite() || w < 0.0 {
                return Err(SagresError::InvalidConfig(format!(
                    "composite weight {name} must be finite and non-negative, got {w}"
                )));
            }
        }
        if self.total() <= 0.0 {
            return Err(SagresError::InvalidConfig(
                "composite weights must not all be zero".to_string(),
            ));
        }
        Ok(())
    }
}

/// Configuration for an evaluation run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EvalConfig {
    /// Forward-return horizon in samples (12 = 1 hour at 5-minute bars).
    pub horizon: usize,
    /// Minimum aligned observations for any statistic.
    pub min_samples: usize,
    /// Sequential block size for the IC-IR calculation (288 = 1 day).
    pub ic_block_size: usize,
    /// Trailing window for the rolling power series, in samples.
    pub rolling_window: usize,
    /// Symmetric lag search bound for the lead-lag scan, in samples.
    pub max_lag: usize,
    /// Step of the lead-lag scan, in samples.
    pub lag_step: usize,
    /// Maximum lag order for the Granger causality test.
    pub granger_max_lag: usize,
    /// Composite score weights.
    pub weights: CompositeWeights,
    /// Quality gate thresholds.
    pub quality: QualityConfig,
}

impl Default for EvalConfig {
    fn default() -> Self {
        Self {
            horizon: 12,
            min_samples: 10,
            ic_block_size: 288,
            rolling_window: 288,
            max_lag: 48,
            lag_step: 1,
            granger_max_lag: 12,
            weights: CompositeWeights::default(),
            quality: QualityConfig::default(),
        }
    }
}

impl EvalConfig {
    /// Validate every field, including the nested weight and quality
    /// configurations.
    ///
    /// # Errors
    ///
    /// Returns [`SagresError::InvalidConfig`] on the first invalid value.
    pub fn validate(&self) -> Result<()> {
        if self.horizon == 0 {
            return Err(SagresError::InvalidConfig(
                "horizon must be positive".to_string(),
            ));
        }
        if self.min_samples < 2 {
            return Err(SagresError::InvalidConfig(
                "min_samples must be at least 2".to_string(),
            ));
        }
        if self.ic_block_size < 2 {
            return Err(SagresError::InvalidConfig(
                "ic_block_size must be at least 2".to_string(),
            ));
        }
        if self.rolling_window < self.min_samples {
            return Err(SagresError::InvalidConfig(format!(
                "rolling_window ({}) must not be below min_samples ({})",
                self.rolling_window, self.min_samples
            )));
        }
        if self.max_lag == 0 {
            return Err(SagresError::InvalidConfig(
                "max_lag must be positive".to_string(),
            ));
        }
        if self.lag_step == 0 || self.lag_step > self.max_lag {
            return Err(SagresError::InvalidConfig(format!(
                "lag_step must be within [1, max_lag], got {}",
                self.lag_step
            )));
        }
        if self.granger_max_lag == 0 {
            return Err(SagresError::InvalidConfig(
                "granger_max_lag must be positive".to_string(),
            ));
        }
        self.weights.validate()?;
        self.quality.validate()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_default_config_is_valid() {
        assert!(EvalConfig::default().validate().is_ok());
    }

    #[test]
    fn test_default_weights() {
        let w = CompositeWeights::default();
        assert_relative_eq!(w.total(), 1.0);
        assert_relative_eq!(w.ic, 0.30);
        assert_relative_eq!(w.granger, 0.10);
    }

    #[test]
    fn test_negative_weight_rejected() {
        let w = CompositeWeights {
            lead_lag: -0.1,
            ..Default::default()
        };
        assert!(w.validate().is_err());
    }

    #[test]
    fn test_all_zero_weights_rejected() {
        let w = CompositeWeights {
            ic: 0.0,
            ic_ir: 0.0,
            hit_rate: 0.0,
            lead_lag: 0.0,
            granger: 0.0,
        };
        assert!(w.validate().is_err());
    }

    #[test]
    fn test_invalid_windows_rejected() {
        let cfg = EvalConfig {
            horizon: 0,
            ..Default::default()
        };
        assert!(cfg.validate().is_err());

        let cfg = EvalConfig {
            rolling_window: 4,
            min_samples: 10,
            ..Default::default()
        };
        assert!(cfg.validate().is_err());

        let cfg = EvalConfig {
            lag_step: 0,
            ..Default::default()
        };
        assert!(cfg.validate().is_err());

        let cfg = EvalConfig {
            granger_max_lag: 0,
            ..Default::default()
        };
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn test_nested_quality_config_validated() {
        let cfg = EvalConfig {
            quality: QualityConfig {
                max_nan_pct: -1.0,
                ..Default::default()
            },
            ..Default::default()
        };
        assert!(cfg.validate().is_err());
    }
}
