//! Information Coefficient (IC) calculations.
//!
//! IC measures the correlation between a signal's values and the forward
//! returns they are supposed to predict. Pearson captures the linear
//! relationship, Spearman the monotonic one, and the IC information ratio
//! (mean over std of per-block ICs) captures how consistent the
//! relationship is across the evaluation window.

use sagres_traits::stats::{MIN_STD_THRESHOLD, mean_std, pearson, spearman};
use sagres_traits::{Result, SagresError, TimeSeries};
use serde::{Deserialize, Serialize};

/// Result of an Information Coefficient computation.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ICResult {
    /// Pearson correlation between signal and forward return.
    pub pearson: f64,
    /// Spearman rank correlation between signal and forward return.
    pub spearman: f64,
    /// Information ratio of the per-block Spearman ICs: mean / std.
    /// Zero when fewer than two blocks exist or the std is zero.
    pub ic_ir: f64,
    /// Aligned observations the correlations were computed over.
    pub n_obs: usize,
    /// Number of complete blocks that contributed to the IC-IR.
    pub n_blocks: usize,
}

impl ICResult {
    /// Compute Pearson and Spearman IC plus block IC-IR between a signal
    /// series and its forward-return series.
    ///
    /// Both series are aligned on common timestamps with missing rows
    /// dropped before anything is computed.
    ///
    /// # Errors
    ///
    /// - [`SagresError::InsufficientData`] when fewer than `min_samples`
    ///   aligned pairs remain. Callers treat this as "metric unavailable".
    /// - [`SagresError::Degenerate`] when either aligned side has zero
    ///   variance.
    pub fn calculate(
        signal: &TimeSeries,
        forward_returns: &TimeSeries,
        block_size: usize,
        min_samples: usize,
    ) -> Result<Self> {
        let aligned = signal.align(forward_returns);
        if aligned.len() < min_samples {
            return Err(SagresError::InsufficientData(format!(
                "{} aligned pairs, need {min_samples}",
                aligned.len()
            )));
        }

        let pearson_ic = pearson(&aligned.left, &aligned.right)?;
        let spearman_ic = spearman(&aligned.left, &aligned.right)?;
        let (ic_ir, n_blocks) = block_ic_ir(&aligned.left, &aligned.right, block_size);

        Ok(Self {
            pearson: pearson_ic,
            spearman: spearman_ic,
            ic_ir,
            n_obs: aligned.len(),
            n_blocks,
        })
    }
}

/// IC-IR over fixed-size sequential blocks: Spearman IC per complete
/// block, then mean / std across blocks. Degenerate blocks are skipped;
/// fewer than two usable blocks or a zero std yields 0.
fn block_ic_ir(signal: &[f64], returns: &[f64], block_size: usize) -> (f64, usize) {
    let mut block_ics = Vec::new();
    let mut start = 0;
    while start + block_size <= signal.len() {
        let end = start + block_size;
        if let Ok(ic) = spearman(&signal[start..end], &returns[start..end]) {
            block_ics.push(ic);
        }
        start = end;
    }

    if block_ics.len() < 2 {
        return (0.0, block_ics.len());
    }

    let (mean, std) = mean_std(&block_ics);
    if std < MIN_STD_THRESHOLD {
        return (0.0, block_ics.len());
    }
    (mean / std, block_ics.len())
}
