//! Autocorrelation diagnostics for residual series.

use crate::error::{DecompositionError, Result};
use statrs::distribution::{ChiSquared, ContinuousCDF};

/// Ljung-Box portmanteau test result.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct LjungBoxResult {
    /// Q statistic
    pub statistic: f64,
    /// Probability of a Q at least this large under white noise
    pub p_value: f64,
    /// Number of lags tested
    pub lags: usize,
    /// Degrees of freedom of the reference chi-squared distribution
    pub df: usize,
}

impl LjungBoxResult {
    /// Whether white noise is rejected at significance level `alpha`.
    pub fn rejects_white_noise(&self, alpha: f64) -> bool {
        self.p_value < alpha
    }
}

/// Sample autocorrelation function for lags `0..=max_lag`.
///
/// Lag 0 is always 1.0. A constant series has no variance to normalise by,
/// and every lag above 0 is reported as 0.0.
pub fn acf(values: &[f64], max_lag: usize) -> Result<Vec<f64>> {
    let n = values.len();
    if n <= max_lag {
        return Err(DecompositionError::InsufficientData {
            needed: max_lag + 1,
            got: n,
        });
    }

    let mean: f64 = values.iter().sum::<f64>() / n as f64;
    let centered: Vec<f64> = values.iter().map(|&x| x - mean).collect();
    let denom: f64 = centered.iter().map(|x| x * x).sum();

    let mut result = Vec::with_capacity(max_lag + 1);
    result.push(1.0);
    for lag in 1..=max_lag {
        if denom == 0.0 {
            result.push(0.0);
            continue;
        }
        let num: f64 = centered
            .iter()
            .skip(lag)
            .zip(centered.iter())
            .map(|(a, b)| a * b)
            .sum();
        result.push(num / denom);
    }

    Ok(result)
}

/// Ljung-Box test for autocorrelation in residuals.
///
/// # Arguments
/// * `residuals` - Residual series
/// * `lags` - Number of lags (default: min(10, n/5), at least 1)
/// * `fitted_params` - Parameters estimated from the series, subtracted from the degrees of freedom
pub fn ljung_box(
    residuals: &[f64],
    lags: Option<usize>,
    fitted_params: usize,
) -> Result<LjungBoxResult> {
    let n = residuals.len();
    if n < 3 {
        return Err(DecompositionError::InsufficientData { needed: 3, got: n });
    }

    let lags = lags.unwrap_or_else(|| 10.min(n / 5).max(1));
    if lags == 0 {
        return Err(DecompositionError::invalid_parameter(
            "lags",
            lags,
            "must be positive",
        ));
    }
    let lags = lags.min(n - 1);
    let df = lags.saturating_sub(fitted_params).max(1);

    let rho = acf(residuals, lags)?;
    let q = n as f64
        * (n + 2) as f64
        * rho
            .iter()
            .enumerate()
            .skip(1)
            .map(|(k, r)| r * r / (n - k) as f64)
            .sum::<f64>();

    let p_value = ChiSquared::new(df as f64)
        .map(|dist| dist.sf(q))
        .map_err(|e| DecompositionError::ComputationError(format!("chi-squared: {e:?}")))?;

    Ok(LjungBoxResult {
        statistic: q,
        p_value,
        lags,
        df,
    })
}
