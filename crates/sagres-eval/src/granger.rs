//! Granger causality test.
//!
//! Tests whether past values of a signal improve prediction of future
//! returns beyond what past returns already explain. For each lag order
//! 1..=max_lag an OLS F-test compares the restricted autoregression of
//! returns against the unrestricted one that adds the signal's history;
//! the minimum p-value across lag orders is the representative result.
//!
//! The calculator never fails: degenerate inputs (collinear regressors,
//! singular normal equations, too little data) produce the neutral
//! "no detectable causality" result with the failure reason recorded.

use ndarray::{Array1, Array2};
use sagres_traits::{Result, SagresError, TimeSeries};
use serde::{Deserialize, Serialize};

/// Pivots below this are treated as singular.
const MIN_PIVOT: f64 = 1e-12;

/// Residual sums of squares below this mean a (near-)perfect fit, which
/// indicates collinear inputs rather than real predictive power.
const MIN_SSR: f64 = 1e-12;

/// Significance threshold for the causality test.
pub const GRANGER_SIGNIFICANCE: f64 = 0.05;

/// Result of a Granger causality test.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GrangerResult {
    /// Minimum p-value across the tested lag orders.
    pub p_value: f64,
    /// Lag order that produced the minimum p-value (0 when none ran).
    pub best_lag: usize,
    /// True when `p_value < 0.05`.
    pub significant: bool,
    /// `min(-log10(p) / 2, 1)`, in [0, 1]; p = 0.05 maps to roughly 0.65.
    pub score: f64,
    /// Reason the test fell back to the neutral result, if it did.
    pub failure: Option<String>,
    /// Aligned observations the test ran over.
    pub n_obs: usize,
}

impl GrangerResult {
    /// Test whether the signal Granger-causes the return series at lag
    /// orders `1..=max_lag`.
    ///
    /// This never returns an error: any internal failure yields the
    /// neutral non-significant result, since "no detectable causality"
    /// is itself informative.
    #[must_use]
    pub fn calculate(
        signal: &TimeSeries,
        returns: &TimeSeries,
        max_lag: usize,
        min_samples: usize,
    ) -> Self {
        match run_test(signal, returns, max_lag, min_samples) {
            Ok(result) => result,
            Err(e) => Self::neutral(e.to_string()),
        }
    }

    fn neutral(reason: String) -> Self {
        Self {
            p_value: 1.0,
            best_lag: 0,
            significant: false,
            score: 0.0,
            failure: Some(reason),
            n_obs: 0,
        }
    }
}

/// Map a p-value to the [0, 1] causality score.
#[must_use]
pub fn granger_score(p_value: f64) -> f64 {
    if p_value <= 0.0 {
        return 1.0;
    }
    (-p_value.log10() / 2.0).clamp(0.0, 1.0)
}

fn run_test(
    signal: &TimeSeries,
    returns: &TimeSeries,
    max_lag: usize,
    min_samples: usize,
) -> Result<GrangerResult> {
    let aligned = signal.align(returns);
    let n = aligned.len();
    if max_lag == 0 || n < min_samples.max(3 * max_lag) {
        return Err(SagresError::InsufficientData(format!(
            "{n} aligned observations for granger test with max_lag {max_lag}"
        )));
    }

    let x = &aligned.left; // signal (candidate cause)
    let y = &aligned.right; // returns (effect)

    let mut best: Option<(usize, f64)> = None;

    for lag in 1..=max_lag {
        let n_eff = n - lag;
        let k_unrestricted = 2 * lag + 1;
        // Need positive denominator degrees of freedom with some slack
        if n_eff < k_unrestricted + 3 {
            continue;
        }

        let target: Vec<f64> = y[lag..].to_vec();

        let restricted = design_matrix(&[y], lag, n_eff);
        let unrestricted = design_matrix(&[y, x], lag, n_eff);

        let ssr_r = ols_ssr(&restricted, &target)?;
        let ssr_u = ols_ssr(&unrestricted, &target)?;

        if ssr_u < MIN_SSR {
            // Perfect fit means collinear inputs, not causality
            continue;
        }

        let df1 = lag as f64;
        let df2 = (n_eff - k_unrestricted) as f64;
        let f_stat = ((ssr_r - ssr_u).max(0.0) / df1) / (ssr_u / df2);
        let p = f_survival(f_stat, df1, df2);

        match best {
            Some((_, best_p)) if p >= best_p => {}
            _ => best = Some((lag, p)),
        }
    }

    let (best_lag, p_value) =
        best.ok_or_else(|| SagresError::Degenerate("no lag order could be tested".to_string()))?;
    let p_value = p_value.clamp(0.0, 1.0);

    Ok(GrangerResult {
        p_value,
        best_lag,
        significant: p_value < GRANGER_SIGNIFICANCE,
        score: granger_score(p_value),
        failure: None,
        n_obs: n,
    })
}

/// Build an OLS design matrix with an intercept column and `lag` lagged
/// columns of every predictor series, over the last `n_eff` target rows.
fn design_matrix(predictors: &[&Vec<f64>], lag: usize, n_eff: usize) -> Array2<f64> {
    let n_cols = 1 + lag * predictors.len();
    let mut design = Array2::zeros((n_eff, n_cols));

    for row in 0..n_eff {
        design[[row, 0]] = 1.0;
        let t = row + lag; // index of the target observation
        let mut col = 1;
        for series in predictors {
            for l in 1..=lag {
                design[[row, col]] = series[t - l];
                col += 1;
            }
        }
    }

    design
}

/// Fit OLS via the normal equations and return the residual sum of
/// squares.
fn ols_ssr(design: &Array2<f64>, target: &[f64]) -> Result<f64> {
    let y = Array1::from_vec(target.to_vec());
    let xtx = design.t().dot(design);
    let xty = design.t().dot(&y);

    let beta = solve_symmetric(xtx, xty)?;
    let fitted = design.dot(&beta);

    Ok(y.iter()
        .zip(fitted.iter())
        .map(|(obs, fit)| (obs - fit).powi(2))
        .sum())
}

/// Solve `A x = b` by Gaussian elimination with partial pivoting.
/// The systems here are tiny (at most `2 * max_lag + 1` unknowns).
fn solve_symmetric(a: Array2<f64>, b: Array1<f64>) -> Result<Array1<f64>> {
    let n = b.len();
    let mut a = a;
    let mut b = b;

    for col in 0..n {
        let mut pivot_row = col;
        let mut pivot_val = a[[col, col]].abs();
        for row in col + 1..n {
            if a[[row, col]].abs() > pivot_val {
                pivot_val = a[[row, col]].abs();
                pivot_row = row;
            }
        }
        if pivot_val < MIN_PIVOT {
            return Err(SagresError::Degenerate(
                "singular normal equations (collinear regressors)".to_string(),
            ));
        }
        if pivot_row != col {
            for k in 0..n {
                let tmp = a[[col, k]];
                a[[col, k]] = a[[pivot_row, k]];
                a[[pivot_row, k]] = tmp;
            }
            b.swap(col, pivot_row);
        }

        for row in col + 1..n {
            let factor = a[[row, col]] / a[[col, col]];
            for k in col..n {
                a[[row, k]] -= factor * a[[col, k]];
            }
            b[row] -= factor * b[col];
        }
    }

    let mut x = Array1::zeros(n);
    for row in (0..n).rev() {
        let mut sum = b[row];
        for k in row + 1..n {
            sum -= a[[row, k]] * x[k];
        }
        x[row] = sum / a[[row, row]];
    }

    Ok(x)
}

/// Survival function of the F distribution: `P(F(d1, d2) > f)`, computed
/// through the regularized incomplete beta function.
fn f_survival(f: f64, d1: f64, d2: f64) -> f64 {
    if !f.is_finite() || f <= 0.0 || d1 <= 0.0 || d2 <= 0.0 {
        return 1.0;
    }
    let x = d2 / (d2 + d1 * f);
    incomplete_beta(d2 / 2.0, d1 / 2.0, x).clamp(0.0, 1.0)
}

/// Regularized incomplete beta function `I_x(a, b)` via the continued
/// fraction expansion.
fn incomplete_beta(a: f64, b: f64, x: f64) -> f64 {
    if x <= 0.0 {
        return 0.0;
    }
    if x >= 1.0 {
        return 1.0;
    }

    let ln_front =
        ln_gamma(a + b) - ln_gamma(a) - ln_gamma(b) + a * x.ln() + b * (1.0 - x).ln();
    let front = ln_front.exp();

    if x < (a + 1.0) / (a + b + 2.0) {
        front * beta_cf(a, b, x) / a
    } else {
        1.0 - front * beta_cf(b, a, 1.0 - x) / b
    }
}

/// Continued fraction for the incomplete beta function.
fn beta_cf(a: f64, b: f64, x: f64) -> f64 {
    const MAX_ITER: usize = 300;
    const EPS: f64 = 1e-14;
    const FPMIN: f64 = 1e-300;

    let qab = a + b;
    let qap = a + 1.0;
    let qam = a - 1.0;

    let mut c = 1.0;
    let mut d = 1.0 - qab * x / qap;
    if d.abs() < FPMIN {
        d = FPMIN;
    }
    d = 1.0 / d;
    let mut h = d;

    for m in 1..=MAX_ITER {
        let m_f = m as f64;
        let m2 = 2.0 * m_f;

        let aa = m_f * (b - m_f) * x / ((qam + m2) * (a + m2));
        d = 1.0 + aa * d;
        if d.abs() < FPMIN {
            d = FPMIN;
        }
        c = 1.0 + aa / c;
        if c.abs() < FPMIN {
            c = FPMIN;
        }
        d = 1.0 / d;
        h *= d * c;

        let aa = -(a + m_f) * (qab + m_f) * x / ((a + m2) * (qap + m2));
        d = 1.0 + aa * d;
        if d.abs() < FPMIN {
            d = FPMIN;
        }
        c = 1.0 + aa / c;
        if c.abs() < FPMIN {
            c = FPMIN;
        }
        d = 1.0 / d;
        let del = d * c;
        h *= del;

        if (del - 1.0).abs() < EPS {
            break;
        }
    }

    h
}

/// Natural log of the gamma function (Lanczos approximation).
fn ln_gamma(x: f64) -> f64 {
    const COEFFS: [f64; 6] = [
        76.180_091_729_471_46,
        -86.505_320_329_416_77,
        24.014_098_240_830_91,
        -1.231_739_572_450_155,
        0.120_865_097_386_617_9e-2,
        -0.539_523_938_495_3e-5,
    ];

    let tmp = x + 5.5;
    let tmp = tmp - (x + 0.5) * tmp.ln();
    let mut ser = 1.000_000_000_190_015;
    let mut y = x;
    for c in COEFFS {
        y += 1.0;
        ser += c / y;
    }
    -tmp + (2.506_628_274_631_000_5 * ser / x).ln()
}
