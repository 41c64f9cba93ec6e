//! Moving-window statistics.

use crate::error::{DecompositionError, Result};

/// Rolling mean over a fixed window.
///
/// A trailing window ends at each position. A centered window is reported
/// at its `window / 2`-th point, so an even window holds one more point on
/// the left of the position than on the right. Positions without a full
/// window are `None`.
///
/// # Arguments
/// * `values` - Series values
/// * `window` - Number of points per window (must be positive)
/// * `center` - Whether to center the window on each position
pub fn rolling_mean(values: &[f64], window: usize, center: bool) -> Result<Vec<Option<f64>>> {
    if window == 0 {
        return Err(DecompositionError::invalid_parameter(
            "window",
            window,
            "must be positive",
        ));
    }

    let n = values.len();
    let mut result = vec![None; n];
    if n < window {
        return Ok(result);
    }

    // Offset from a window's first index to the position it is reported at
    let offset = if center { window / 2 } else { window - 1 };

    let mut sum: f64 = values[..window].iter().sum();
    result[offset] = Some(sum / window as f64);
    for start in 1..=(n - window) {
        sum += values[start + window - 1] - values[start - 1];
        result[start + offset] = Some(sum / window as f64);
    }

    Ok(result)
}
