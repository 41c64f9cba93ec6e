//! Gap detection and filling for calendar-indexed series.

use crate::error::{DecompositionError, Result};
use crate::series::Frequency;
use chrono::NaiveDate;
use std::collections::HashMap;

/// Fill gaps in a time series by inserting NULL values at missing timestamps.
///
/// Rows are sorted by date first. The grid is anchored at the earliest date,
/// so every input date must lie on it.
///
/// # Arguments
/// * `dates` - Observation dates
/// * `values` - Observation values (None for a known-missing value)
/// * `frequency` - Expected spacing between observations
///
/// # Returns
/// Tuple of (filled_dates, filled_values) where missing timestamps have NULL values
pub fn fill_gaps(
    dates: &[NaiveDate],
    values: &[Option<f64>],
    frequency: Frequency,
) -> Result<(Vec<NaiveDate>, Vec<Option<f64>>)> {
    if dates.len() != values.len() {
        return Err(DecompositionError::InvalidInput(
            "Dates and values must have the same length".to_string(),
        ));
    }

    if dates.is_empty() {
        return Ok((vec![], vec![]));
    }

    // Sort by date
    let mut pairs: Vec<(NaiveDate, Option<f64>)> =
        dates.iter().cloned().zip(values.iter().cloned()).collect();
    pairs.sort_by_key(|(d, _)| *d);

    let origin = pairs[0].0;
    let mut result_dates = Vec::with_capacity(pairs.len());
    let mut result_values = Vec::with_capacity(pairs.len());
    let mut next_step = 0_i64;

    for (i, (date, value)) in pairs.into_iter().enumerate() {
        let step = frequency.periods_between(origin, date).ok_or_else(|| {
            DecompositionError::irregular(
                i,
                format!("{} is not on the {:?} grid starting {}", date, frequency, origin),
            )
        })?;

        if step < next_step {
            return Err(DecompositionError::irregular(
                i,
                format!("duplicate timestamp {}", date),
            ));
        }

        // Insert missing timestamps
        for missing in next_step..step {
            let missing_date = frequency.advance(origin, missing).ok_or_else(|| {
                DecompositionError::irregular(i, "grid date out of calendar range")
            })?;
            result_dates.push(missing_date);
            result_values.push(None);
        }

        result_dates.push(date);
        result_values.push(value);
        next_step = step + 1;
    }

    Ok((result_dates, result_values))
}

/// Detect the calendar frequency of a series from its dates.
///
/// The most common spacing between consecutive distinct dates is mapped to
/// the calendar frequency whose nominal length covers it.
pub fn detect_frequency(dates: &[NaiveDate]) -> Result<Frequency> {
    if dates.len() < 2 {
        return Err(DecompositionError::InsufficientData {
            needed: 2,
            got: dates.len(),
        });
    }

    let mut sorted_dates = dates.to_vec();
    sorted_dates.sort();

    // Calculate differences
    let diffs: Vec<i64> = sorted_dates
        .windows(2)
        .map(|w| (w[1] - w[0]).num_days())
        .filter(|&d| d > 0)
        .collect();

    if diffs.is_empty() {
        return Err(DecompositionError::irregular(
            1,
            "Could not detect frequency: all dates are identical",
        ));
    }

    // Find the most common difference (mode), preferring the shorter spacing on ties
    let mut counts: HashMap<i64, usize> = HashMap::new();
    for d in &diffs {
        *counts.entry(*d).or_insert(0) += 1;
    }

    let mode = counts
        .into_iter()
        .max_by(|(da, ca), (db, cb)| ca.cmp(cb).then(db.cmp(da)))
        .map(|(diff, _)| diff)
        .unwrap_or(diffs[0]);

    [
        Frequency::Daily,
        Frequency::Weekly,
        Frequency::Monthly,
        Frequency::Quarterly,
        Frequency::Yearly,
    ]
    .into_iter()
    .find(|f| f.nominal_days().contains(&mode))
    .ok_or_else(|| {
        DecompositionError::irregular(
            0,
            format!("no calendar frequency matches a spacing of {} days", mode),
        )
    })
}

/// Number of grid points missing between the first and last date.
pub fn count_gaps(dates: &[NaiveDate], frequency: Frequency) -> Result<usize> {
    let (filled, _) = fill_gaps(dates, &vec![None; dates.len()], frequency)?;
    Ok(filled.len() - dates.len())
}
