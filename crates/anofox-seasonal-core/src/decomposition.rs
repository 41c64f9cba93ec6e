//! Additive trend / seasonal / residual decomposition of a fitted series.
//!
//! The raw dummy coefficients measure each category against the dropped
//! reference category, so a trend line built from the intercept alone would
//! carry whatever bias the reference happens to have. The decomposition
//! therefore moves the frequency-weighted mean of all category effects into
//! the trend:
//!
//! ```text
//! trend_t    = baseline_t + average_seasonal_offset
//! seasonal_t = fitted_t - trend_t
//! residual_t = observed_t - fitted_t
//! ```
//!
//! which keeps the seasonal component zero-mean over the fit-time sample.

use crate::diagnostics::{ljung_box, LjungBoxResult};
use crate::error::{DecompositionError, Result};
use crate::model::FittedModel;
use crate::series::{SeasonalCategory, TimeSeries};
use chrono::NaiveDate;

/// Components of a single observation.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct DecompositionRow {
    pub timestamp: NaiveDate,
    /// Periods elapsed since the fit-time origin
    pub period_index: i64,
    pub category: SeasonalCategory,
    pub observed: f64,
    pub fitted: f64,
    pub trend: f64,
    pub seasonal: f64,
    pub residual: f64,
}

/// Per-timestamp additive decomposition aligned with the input series.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Decomposition {
    rows: Vec<DecompositionRow>,
    profile: Vec<(SeasonalCategory, f64)>,
    average_seasonal_offset: f64,
    n_params: usize,
}

/// Decompose `series` with a fitted model.
///
/// `series` may differ from the fit-time series as long as it shares its
/// frequency grid and only contains fit-time seasonal categories.
///
/// # Errors
/// * `InvalidInput` - the series frequency differs from the model's
/// * `IrregularSeries` - a timestamp is off the model's grid
/// * `UnknownCategory` - a timestamp falls in a category unseen at fit time
pub fn decompose(series: &TimeSeries, model: &FittedModel) -> Result<Decomposition> {
    if series.frequency() != model.frequency() {
        return Err(DecompositionError::InvalidInput(format!(
            "series frequency {:?} does not match model frequency {:?}",
            series.frequency(),
            model.frequency()
        )));
    }

    let granularity = model.granularity();
    let keys = series
        .observations()
        .iter()
        .enumerate()
        .map(|(i, o)| {
            let period_index = model.period_index_of(o.timestamp, i)?;
            let category = granularity.category_of(o.timestamp);
            model.seasonal_effect(category)?;
            Ok((period_index, category))
        })
        .collect::<Result<Vec<(i64, SeasonalCategory)>>>()?;

    let offset = model.average_seasonal_offset();
    let rows = series
        .observations()
        .iter()
        .zip(keys)
        .map(|(o, (period_index, category))| {
            let fitted = model.predict(period_index, category)?;
            let trend = model.baseline(period_index) + offset;
            Ok(DecompositionRow {
                timestamp: o.timestamp,
                period_index,
                category,
                observed: o.value,
                fitted,
                trend,
                seasonal: fitted - trend,
                residual: o.value - fitted,
            })
        })
        .collect::<Result<Vec<_>>>()?;

    let profile = model
        .seasonal_effects()
        .iter()
        .map(|e| (e.category, e.coefficient - offset))
        .collect();

    tracing::debug!(
        n_obs = rows.len(),
        average_seasonal_offset = offset,
        "decomposed series"
    );

    Ok(Decomposition {
        rows,
        profile,
        average_seasonal_offset: offset,
        n_params: model.n_params(),
    })
}

impl Decomposition {
    pub fn rows(&self) -> &[DecompositionRow] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn timestamps(&self) -> Vec<NaiveDate> {
        self.rows.iter().map(|r| r.timestamp).collect()
    }

    pub fn observed(&self) -> Vec<f64> {
        self.rows.iter().map(|r| r.observed).collect()
    }

    pub fn fitted(&self) -> Vec<f64> {
        self.rows.iter().map(|r| r.fitted).collect()
    }

    pub fn trend(&self) -> Vec<f64> {
        self.rows.iter().map(|r| r.trend).collect()
    }

    pub fn seasonal(&self) -> Vec<f64> {
        self.rows.iter().map(|r| r.seasonal).collect()
    }

    pub fn residual(&self) -> Vec<f64> {
        self.rows.iter().map(|r| r.residual).collect()
    }

    /// Re-centred seasonal effect of every fit-time category.
    pub fn seasonal_profile(&self) -> &[(SeasonalCategory, f64)] {
        &self.profile
    }

    /// Level moved from the seasonal coefficients into the trend.
    pub fn average_seasonal_offset(&self) -> f64 {
        self.average_seasonal_offset
    }

    /// Ljung-Box test on the residual component.
    pub fn residual_diagnostics(&self, lags: Option<usize>) -> Result<LjungBoxResult> {
        ljung_box(&self.residual(), lags, self.n_params)
    }
}
