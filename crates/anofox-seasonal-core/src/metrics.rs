//! Goodness-of-fit metrics for in-sample fits.
//!
//! - **Scale-dependent metrics**: MAE, MSE, RMSE
//! - **Explained variance**: R²

use crate::error::{DecompositionError, Result};

/// Calculates Mean Absolute Error between actual and fitted values.
///
/// # Formula
/// MAE = (1/n) * Σ|actual_i - fitted_i|
///
/// # Example
/// ```
/// use anofox_seasonal_core::metrics::mae;
/// let actual = vec![1.0, 2.0, 3.0];
/// let fitted = vec![1.1, 2.2, 2.8];
/// let error = mae(&actual, &fitted).unwrap();
/// assert!((error - 0.166).abs() < 0.01);
/// ```
pub fn mae(actual: &[f64], fitted: &[f64]) -> Result<f64> {
    validate_inputs(actual, fitted)?;
    let sum: f64 = actual
        .iter()
        .zip(fitted.iter())
        .map(|(a, f)| (a - f).abs())
        .sum();
    Ok(sum / actual.len() as f64)
}

/// Calculates Mean Squared Error between actual and fitted values.
///
/// # Formula
/// MSE = (1/n) * Σ(actual_i - fitted_i)²
pub fn mse(actual: &[f64], fitted: &[f64]) -> Result<f64> {
    validate_inputs(actual, fitted)?;
    Ok(sum_squared_error(actual, fitted) / actual.len() as f64)
}

/// Calculates Root Mean Squared Error, in the units of the series.
pub fn rmse(actual: &[f64], fitted: &[f64]) -> Result<f64> {
    Ok(mse(actual, fitted)?.sqrt())
}

/// Calculates the coefficient of determination (R²).
///
/// R² = 1 - SS_res / SS_tot. Returns NaN when the actual values have zero
/// total variance, since the ratio is then undefined.
pub fn r2(actual: &[f64], fitted: &[f64]) -> Result<f64> {
    validate_inputs(actual, fitted)?;

    let ss_res = sum_squared_error(actual, fitted);
    let ss_tot = total_sum_of_squares(actual);

    if ss_tot == 0.0 {
        return Ok(f64::NAN);
    }

    Ok(1.0 - ss_res / ss_tot)
}

pub(crate) fn sum_squared_error(actual: &[f64], fitted: &[f64]) -> f64 {
    actual
        .iter()
        .zip(fitted.iter())
        .map(|(a, f)| (a - f).powi(2))
        .sum()
}

pub(crate) fn total_sum_of_squares(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    let mean: f64 = values.iter().sum::<f64>() / values.len() as f64;
    values.iter().map(|v| (v - mean).powi(2)).sum()
}

fn validate_inputs(actual: &[f64], fitted: &[f64]) -> Result<()> {
    if actual.len() != fitted.len() {
        return Err(DecompositionError::InvalidInput(format!(
            "Actual and fitted arrays must have the same length: {} vs {}",
            actual.len(),
            fitted.len()
        )));
    }
    if actual.is_empty() {
        return Err(DecompositionError::InsufficientData { needed: 1, got: 0 });
    }
    Ok(())
}
