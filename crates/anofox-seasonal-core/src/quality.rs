//! Missing-value profile of raw input rows.

use crate::error::{DecompositionError, Result};
use chrono::{Datelike, NaiveDate};

/// Share of missing values in a column (0.0 for an empty column).
pub fn missing_ratio(values: &[Option<f64>]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    let n_missing = values.iter().filter(|v| v.is_none()).count();
    n_missing as f64 / values.len() as f64
}

/// Share of missing values per weekday, Monday first.
///
/// Weekdays without any rows are `None`. Useful for spotting values that are
/// systematically absent on non-trading days before choosing a fill method.
pub fn missing_ratio_by_weekday(
    dates: &[NaiveDate],
    values: &[Option<f64>],
) -> Result<[Option<f64>; 7]> {
    if dates.len() != values.len() {
        return Err(DecompositionError::InvalidInput(format!(
            "Dates and values must have the same length: {} vs {}",
            dates.len(),
            values.len()
        )));
    }

    let mut rows = [0usize; 7];
    let mut missing = [0usize; 7];
    for (date, value) in dates.iter().zip(values.iter()) {
        let day = date.weekday().num_days_from_monday() as usize;
        rows[day] += 1;
        if value.is_none() {
            missing[day] += 1;
        }
    }

    let mut ratios = [None; 7];
    for day in 0..7 {
        if rows[day] > 0 {
            ratios[day] = Some(missing[day] as f64 / rows[day] as f64);
        }
    }
    Ok(ratios)
}
