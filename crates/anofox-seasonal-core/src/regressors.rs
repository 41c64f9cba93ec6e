//! Regressor construction for the seasonal trend model.
//!
//! Columns are stored column-major (`columns[j][i]` is regressor `j` at
//! observation `i`); the intercept is left to the least-squares backend.

use crate::error::{DecompositionError, Result};
use crate::series::{SeasonalCategory, SeasonalGranularity, TimeSeries};
use chrono::NaiveDate;
use std::collections::BTreeMap;

/// One-hot encoding of a categorical column with the first level dropped.
#[derive(Debug, Clone, PartialEq)]
pub struct OneHotEncoding {
    /// The dropped level; its effect is absorbed by the intercept.
    pub reference: SeasonalCategory,
    /// Remaining levels, one indicator column each, in calendar order.
    pub levels: Vec<SeasonalCategory>,
    /// Indicator columns aligned with `levels`.
    pub columns: Vec<Vec<f64>>,
    /// Observation count per level, reference included, in calendar order.
    pub counts: Vec<(SeasonalCategory, usize)>,
}

/// One-hot encode `categories`, dropping the first level in calendar order.
pub fn one_hot_drop_first(categories: &[SeasonalCategory]) -> Result<OneHotEncoding> {
    let mut counts: BTreeMap<SeasonalCategory, usize> = BTreeMap::new();
    for c in categories {
        *counts.entry(*c).or_insert(0) += 1;
    }

    let mut levels = counts.keys().copied();
    let Some(reference) = levels.next() else {
        return Err(DecompositionError::InsufficientData { needed: 1, got: 0 });
    };
    let levels: Vec<SeasonalCategory> = levels.collect();

    let columns = levels
        .iter()
        .map(|level| {
            categories
                .iter()
                .map(|c| if c == level { 1.0 } else { 0.0 })
                .collect()
        })
        .collect();

    Ok(OneHotEncoding {
        reference,
        levels,
        columns,
        counts: counts.into_iter().collect(),
    })
}

/// Where a structural break enters the series.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BreakLocation {
    /// Caller-supplied breakpoint
    pub timestamp: NaiveDate,
    /// Period index of the first observation on or after the breakpoint
    pub period_index: usize,
}

/// Locate `breakpoint` in `series`.
///
/// Returns `None` when the breakpoint is not strictly after the first
/// timestamp or lies after the last one; break terms are then omitted.
pub fn locate_break(series: &TimeSeries, breakpoint: NaiveDate) -> Option<BreakLocation> {
    if breakpoint <= series.start() || breakpoint > series.end() {
        return None;
    }
    series
        .observations()
        .iter()
        .position(|o| o.timestamp >= breakpoint)
        .map(|period_index| BreakLocation {
            timestamp: breakpoint,
            period_index,
        })
}

/// Break indicator `1[t >= b]` and hinge `1[t >= b] * (t - b)` columns.
pub fn break_columns(n: usize, location: &BreakLocation) -> (Vec<f64>, Vec<f64>) {
    let b = location.period_index;
    let indicator = (0..n).map(|t| if t >= b { 1.0 } else { 0.0 }).collect();
    let slope = (0..n)
        .map(|t| if t >= b { (t - b) as f64 } else { 0.0 })
        .collect();
    (indicator, slope)
}

/// Full set of regressors for one fit.
#[derive(Debug, Clone)]
pub(crate) struct DesignMatrix {
    pub columns: Vec<Vec<f64>>,
    pub encoding: OneHotEncoding,
    pub structural_break: Option<BreakLocation>,
}

impl DesignMatrix {
    /// Build period, seasonal and optional break regressors for `series`.
    ///
    /// # Errors
    /// `InsufficientData` when the series has fewer than twice as many
    /// observations as seasonal categories, fewer observations than model
    /// parameters, fewer than 2 observations on either side of a break, or
    /// no seasonal category observed on both sides of a break.
    pub fn build(
        series: &TimeSeries,
        granularity: SeasonalGranularity,
        breakpoint: Option<NaiveDate>,
    ) -> Result<Self> {
        let n = series.len();
        let categories = series.categories(granularity);
        let encoding = one_hot_drop_first(&categories)?;

        let n_categories = encoding.counts.len();
        if n < 2 * n_categories {
            return Err(DecompositionError::InsufficientData {
                needed: 2 * n_categories,
                got: n,
            });
        }

        let structural_break = breakpoint.and_then(|b| locate_break(series, b));
        if let Some(location) = &structural_break {
            let shortest_side = location.period_index.min(n - location.period_index);
            if shortest_side < 2 {
                return Err(DecompositionError::InsufficientData {
                    needed: 2,
                    got: shortest_side,
                });
            }

            // Without a category spanning the break, the indicator is a sum of dummies
            let (before, after) = categories.split_at(location.period_index);
            if !before.iter().any(|c| after.contains(c)) {
                return Err(DecompositionError::InsufficientData { needed: 1, got: 0 });
            }
        }

        let mut columns = Vec::with_capacity(n_categories + 3);
        columns.push(series.period_index().iter().map(|&p| p as f64).collect());
        columns.extend(encoding.columns.iter().cloned());
        if let Some(location) = &structural_break {
            let (indicator, slope) = break_columns(n, location);
            columns.push(indicator);
            columns.push(slope);
        }

        // Intercept plus one coefficient per column
        let n_params = columns.len() + 1;
        if n < n_params {
            return Err(DecompositionError::InsufficientData {
                needed: n_params,
                got: n,
            });
        }

        Ok(Self {
            columns,
            encoding,
            structural_break,
        })
    }

    pub fn n_params(&self) -> usize {
        self.columns.len() + 1
    }
}
