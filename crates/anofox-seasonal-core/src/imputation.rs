//! Missing value imputation functions.

use crate::error::{DecompositionError, Result};
use std::str::FromStr;

/// Strategy used to fill missing values before building a [`crate::TimeSeries`].
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub enum FillMethod {
    /// Last observed value carried forward (LOCF)
    #[default]
    Forward,
    /// Next observed value carried backward (NOCB)
    Backward,
    /// Linear interpolation between neighbours, edges held constant
    Interpolate,
    /// Series mean
    Mean,
    /// A fixed constant
    Constant(f64),
}

impl FromStr for FillMethod {
    type Err = DecompositionError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "ffill" | "pad" | "forward" | "locf" => Ok(Self::Forward),
            "bfill" | "backfill" | "backward" | "nocb" => Ok(Self::Backward),
            "interpolate" | "linear" => Ok(Self::Interpolate),
            "mean" => Ok(Self::Mean),
            "zero" => Ok(Self::Constant(0.0)),
            _ => Err(DecompositionError::invalid_parameter(
                "fill_method",
                s,
                "expected ffill, bfill, interpolate, mean or zero",
            )),
        }
    }
}

/// Fill NULL values with a constant.
pub fn fill_nulls_const(values: &[Option<f64>], fill_value: f64) -> Vec<f64> {
    values.iter().map(|v| v.unwrap_or(fill_value)).collect()
}

/// Fill NULL values with the last observed value (forward fill / LOCF).
pub fn fill_nulls_forward(values: &[Option<f64>]) -> Vec<Option<f64>> {
    let mut result = Vec::with_capacity(values.len());
    let mut last_value: Option<f64> = None;

    for v in values {
        if v.is_some() {
            last_value = *v;
        }
        result.push(last_value);
    }

    result
}

/// Fill NULL values with the next observed value (backward fill / NOCB).
pub fn fill_nulls_backward(values: &[Option<f64>]) -> Vec<Option<f64>> {
    let mut result = vec![None; values.len()];
    let mut next_value: Option<f64> = None;

    for (i, v) in values.iter().enumerate().rev() {
        if v.is_some() {
            next_value = *v;
        }
        result[i] = next_value;
    }

    result
}

/// Fill NULL values with the series mean.
///
/// Returns all-None when no value is observed.
pub fn fill_nulls_mean(values: &[Option<f64>]) -> Vec<Option<f64>> {
    let non_null: Vec<f64> = values.iter().filter_map(|v| *v).collect();

    if non_null.is_empty() {
        return vec![None; values.len()];
    }

    let mean = non_null.iter().sum::<f64>() / non_null.len() as f64;

    values.iter().map(|v| Some(v.unwrap_or(mean))).collect()
}

/// Fill NULL values with linear interpolation.
///
/// Leading and trailing gaps take the nearest observed value.
pub fn fill_nulls_interpolate(values: &[Option<f64>]) -> Vec<Option<f64>> {
    let known: Vec<(usize, f64)> = values
        .iter()
        .enumerate()
        .filter_map(|(i, v)| v.map(|x| (i, x)))
        .collect();

    let (Some(&(first, first_val)), Some(&(last, last_val))) = (known.first(), known.last())
    else {
        return vec![None; values.len()];
    };

    let mut result: Vec<Option<f64>> = values.to_vec();
    for item in result.iter_mut().take(first) {
        *item = Some(first_val);
    }
    for item in result.iter_mut().skip(last + 1) {
        *item = Some(last_val);
    }

    // Interpolate between known values
    for pair in known.windows(2) {
        let (prev_idx, prev_val) = pair[0];
        let (next_idx, next_val) = pair[1];
        let gap = next_idx - prev_idx;
        if gap > 1 {
            let slope = (next_val - prev_val) / gap as f64;
            for j in 1..gap {
                result[prev_idx + j] = Some(prev_val + slope * j as f64);
            }
        }
    }

    result
}

/// Impute every missing value with `method`.
///
/// # Errors
/// `InvalidInput` when a value is still missing afterwards, e.g. a leading
/// gap under forward fill or an all-missing series.
pub fn impute(values: &[Option<f64>], method: FillMethod) -> Result<Vec<f64>> {
    let filled = match method {
        FillMethod::Forward => fill_nulls_forward(values),
        FillMethod::Backward => fill_nulls_backward(values),
        FillMethod::Interpolate => fill_nulls_interpolate(values),
        FillMethod::Mean => fill_nulls_mean(values),
        FillMethod::Constant(c) => return Ok(fill_nulls_const(values, c)),
    };

    filled
        .into_iter()
        .enumerate()
        .map(|(i, v)| {
            v.ok_or_else(|| {
                DecompositionError::InvalidInput(format!(
                    "value at position {} is still missing after {:?} fill",
                    i, method
                ))
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_fill_nulls_const() {
        let values = vec![Some(1.0), None, Some(3.0), None];
        let result = fill_nulls_const(&values, 0.0);
        assert_eq!(result, vec![1.0, 0.0, 3.0, 0.0]);
    }

    #[test]
    fn test_fill_nulls_forward() {
        let values = vec![Some(1.0), None, None, Some(4.0), None];
        let result = fill_nulls_forward(&values);
        assert_eq!(
            result,
            vec![Some(1.0), Some(1.0), Some(1.0), Some(4.0), Some(4.0)]
        );
    }

    #[test]
    fn test_fill_nulls_backward() {
        let values = vec![None, Some(2.0), None, Some(4.0), None];
        let result = fill_nulls_backward(&values);
        assert_eq!(
            result,
            vec![Some(2.0), Some(2.0), Some(4.0), Some(4.0), None]
        );
    }

    #[test]
    fn test_fill_nulls_mean() {
        let values = vec![Some(1.0), None, Some(3.0), None, Some(5.0)];
        let result = fill_nulls_mean(&values);
        assert_relative_eq!(result[1].unwrap(), 3.0, epsilon = 0.001);
        assert_relative_eq!(result[3].unwrap(), 3.0, epsilon = 0.001);
        assert_eq!(fill_nulls_mean(&[None, None]), vec![None, None]);
    }

    #[test]
    fn test_fill_nulls_interpolate() {
        let values = vec![None, Some(1.0), None, None, Some(4.0), None];
        let result = fill_nulls_interpolate(&values);
        let expected = [1.0, 1.0, 2.0, 3.0, 4.0, 4.0];
        for (r, e) in result.iter().zip(expected.iter()) {
            assert_relative_eq!(r.unwrap(), *e, epsilon = 0.001);
        }
    }

    #[test]
    fn test_impute_leading_gap_forward_fails() {
        let values = vec![None, Some(2.0), None];
        assert!(matches!(
            impute(&values, FillMethod::Forward),
            Err(DecompositionError::InvalidInput(_))
        ));
        // Trailing gap has no next value
        assert!(impute(&values, FillMethod::Backward).is_err());
        assert_eq!(
            impute(&values, FillMethod::Interpolate).unwrap(),
            vec![2.0, 2.0, 2.0]
        );
    }

    #[test]
    fn test_fill_method_from_str() {
        assert_eq!("ffill".parse::<FillMethod>().unwrap(), FillMethod::Forward);
        assert_eq!("BFILL".parse::<FillMethod>().unwrap(), FillMethod::Backward);
        assert_eq!("zero".parse::<FillMethod>().unwrap(), FillMethod::Constant(0.0));
        assert!("median".parse::<FillMethod>().is_err());
    }
}
