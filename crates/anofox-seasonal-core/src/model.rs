//! Linear trend plus categorical seasonal regression.
//!
//! The model is
//!
//! ```text
//! value_t = intercept + trend * t + gamma[category_t] (+ level_shift * d_t + slope_change * d_t * (t - b))
//! ```
//!
//! where `t` is the period index, `gamma` is zero for the reference
//! category and `d_t` is the structural break indicator.

use crate::decomposition::{decompose, Decomposition};
use crate::error::{DecompositionError, Result};
use crate::metrics::{sum_squared_error, total_sum_of_squares};
use crate::regressors::DesignMatrix;
use crate::series::{Frequency, Observation, SeasonalCategory, SeasonalGranularity, TimeSeries};
use anofox_regression::prelude::*;
use chrono::NaiveDate;

/// Options controlling a fit.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct FitOptions {
    /// Calendar granularity of the seasonal regressor
    pub granularity: SeasonalGranularity,
    /// Optional structural break; ignored when outside the series range
    pub breakpoint: Option<NaiveDate>,
    /// Fail with `DegenerateSeries` instead of reporting R² = 0 for a constant series
    pub require_r_squared: bool,
}

/// Estimated effect of one seasonal category.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct SeasonalEffect {
    pub category: SeasonalCategory,
    /// Regression coefficient; 0.0 for the reference category
    pub coefficient: f64,
    /// Number of fit-time observations in this category
    pub count: usize,
}

/// Estimated structural break terms.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct StructuralBreak {
    /// Caller-supplied breakpoint
    pub timestamp: NaiveDate,
    /// Period index of the first observation on or after the breakpoint
    pub period_index: i64,
    /// Coefficient of the break indicator
    pub level_shift: f64,
    /// Coefficient of the indicator × elapsed-periods interaction
    pub slope_change: f64,
}

/// Immutable result of a seasonal regression fit.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct FittedModel {
    granularity: SeasonalGranularity,
    frequency: Frequency,
    origin: NaiveDate,
    n_obs: usize,
    intercept: f64,
    trend: f64,
    reference: SeasonalCategory,
    effects: Vec<SeasonalEffect>,
    structural_break: Option<StructuralBreak>,
    r_squared: f64,
    ss_res: f64,
    ss_tot: f64,
    degenerate: bool,
}

/// Fit the seasonal regression with default options at the given granularity.
pub fn fit(series: &TimeSeries, granularity: SeasonalGranularity) -> Result<FittedModel> {
    fit_with_options(
        series,
        &FitOptions {
            granularity,
            ..Default::default()
        },
    )
}

/// Fit the seasonal regression by ordinary least squares.
///
/// # Errors
/// * `InsufficientData` - fewer than 2 observations per seasonal category
///   on average, or too few observations around a structural break
/// * `DegenerateSeries` - constant series with `require_r_squared` set
/// * `ComputationError` - the least-squares solve failed
pub fn fit_with_options(series: &TimeSeries, options: &FitOptions) -> Result<FittedModel> {
    let design = DesignMatrix::build(series, options.granularity, options.breakpoint)?;
    let y = series.values();
    let n = y.len();
    let k = design.columns.len();

    let degenerate = y.iter().all(|v| *v == y[0]);
    if degenerate && options.require_r_squared {
        return Err(DecompositionError::DegenerateSeries);
    }

    // Build design matrix using faer: n_obs rows × k columns
    let x_mat = faer::Mat::from_fn(n, k, |i, j| design.columns[j][i]);
    let y_col = faer::Col::from_fn(n, |i| y[i]);

    let fitted = OlsRegressor::builder()
        .with_intercept(true)
        .build()
        .fit(&x_mat, &y_col)
        .map_err(|e| DecompositionError::ComputationError(format!("OLS fit failed: {e:?}")))?;

    let intercept = fitted.intercept().unwrap_or(0.0);
    let coeffs_col = fitted.coefficients();
    let coeffs: Vec<f64> = (0..coeffs_col.nrows()).map(|i| coeffs_col[i]).collect();

    if coeffs.len() != k || !intercept.is_finite() || coeffs.iter().any(|c| !c.is_finite()) {
        return Err(DecompositionError::ComputationError(
            "OLS returned non-finite or aliased coefficients".to_string(),
        ));
    }

    // coeffs layout: [trend, seasonal dummies..., level_shift, slope_change]
    let n_dummies = design.encoding.levels.len();
    let dummy_coeffs = &coeffs[1..1 + n_dummies];
    let effects = design
        .encoding
        .counts
        .iter()
        .map(|&(category, count)| {
            let coefficient = design
                .encoding
                .levels
                .iter()
                .position(|level| *level == category)
                .map(|j| dummy_coeffs[j])
                .unwrap_or(0.0);
            SeasonalEffect {
                category,
                coefficient,
                count,
            }
        })
        .collect();

    let structural_break = design.structural_break.map(|location| StructuralBreak {
        timestamp: location.timestamp,
        period_index: location.period_index as i64,
        level_shift: coeffs[1 + n_dummies],
        slope_change: coeffs[2 + n_dummies],
    });

    let mut model = FittedModel {
        granularity: options.granularity,
        frequency: series.frequency(),
        origin: series.start(),
        n_obs: n,
        intercept,
        trend: coeffs[0],
        reference: design.encoding.reference,
        effects,
        structural_break,
        r_squared: 0.0,
        ss_res: 0.0,
        ss_tot: 0.0,
        degenerate,
    };

    let fitted_values = series
        .observations()
        .iter()
        .enumerate()
        .map(|(t, o)| model.predict(t as i64, model.granularity.category_of(o.timestamp)))
        .collect::<Result<Vec<f64>>>()?;

    model.ss_res = sum_squared_error(&y, &fitted_values);
    model.ss_tot = total_sum_of_squares(&y);
    model.r_squared = if degenerate || model.ss_tot == 0.0 {
        0.0
    } else {
        1.0 - model.ss_res / model.ss_tot
    };

    tracing::debug!(
        n_obs = n,
        n_params = design.n_params(),
        n_categories = model.effects.len(),
        reference = %model.reference,
        r_squared = model.r_squared,
        structural_break = model.structural_break.is_some(),
        "fitted seasonal regression"
    );

    Ok(model)
}

impl FittedModel {
    pub fn granularity(&self) -> SeasonalGranularity {
        self.granularity
    }

    pub fn frequency(&self) -> Frequency {
        self.frequency
    }

    /// First timestamp of the fit-time series; period index 0.
    pub fn origin(&self) -> NaiveDate {
        self.origin
    }

    /// Number of observations the model was fitted on.
    pub fn n_obs(&self) -> usize {
        self.n_obs
    }

    pub fn intercept(&self) -> f64 {
        self.intercept
    }

    /// Trend coefficient (change per period).
    pub fn trend_coefficient(&self) -> f64 {
        self.trend
    }

    /// Category dropped from the one-hot encoding.
    pub fn reference_category(&self) -> SeasonalCategory {
        self.reference
    }

    /// All fit-time categories in calendar order, reference included.
    pub fn seasonal_effects(&self) -> &[SeasonalEffect] {
        &self.effects
    }

    /// One coefficient per non-reference category.
    pub fn seasonal_coefficients(&self) -> Vec<(SeasonalCategory, f64)> {
        self.effects
            .iter()
            .filter(|e| e.category != self.reference)
            .map(|e| (e.category, e.coefficient))
            .collect()
    }

    pub fn structural_break(&self) -> Option<&StructuralBreak> {
        self.structural_break.as_ref()
    }

    /// Number of estimated parameters, intercept included.
    pub fn n_params(&self) -> usize {
        let break_terms = if self.structural_break.is_some() { 2 } else { 0 };
        2 + self.effects.len().saturating_sub(1) + break_terms
    }

    /// R² of the fit; 0.0 when the series was constant.
    pub fn r_squared(&self) -> f64 {
        self.r_squared
    }

    /// R² of the fit, or `DegenerateSeries` when it is undefined.
    pub fn checked_r_squared(&self) -> Result<f64> {
        if self.is_degenerate() {
            return Err(DecompositionError::DegenerateSeries);
        }
        Ok(self.r_squared)
    }

    /// Whether the fit-time series had zero variance.
    pub fn is_degenerate(&self) -> bool {
        self.degenerate || self.ss_tot == 0.0
    }

    /// Residual sum of squares over the fit-time series.
    pub fn residual_sum_of_squares(&self) -> f64 {
        self.ss_res
    }

    /// Coefficient of `category`; zero for the reference category.
    pub fn seasonal_effect(&self, category: SeasonalCategory) -> Result<f64> {
        self.effects
            .iter()
            .find(|e| e.category == category)
            .map(|e| e.coefficient)
            .ok_or_else(|| DecompositionError::UnknownCategory {
                category: category.to_string(),
            })
    }

    /// Frequency-weighted mean of all category effects at fit time.
    pub fn average_seasonal_offset(&self) -> f64 {
        let total: usize = self.effects.iter().map(|e| e.count).sum();
        if total == 0 {
            return 0.0;
        }
        self.effects
            .iter()
            .map(|e| e.coefficient * e.count as f64)
            .sum::<f64>()
            / total as f64
    }

    /// Intercept, linear trend and break terms at `period_index`.
    pub(crate) fn baseline(&self, period_index: i64) -> f64 {
        let t = period_index as f64;
        let mut value = self.intercept + self.trend * t;
        if let Some(b) = &self.structural_break {
            if period_index >= b.period_index {
                value += b.level_shift + b.slope_change * (period_index - b.period_index) as f64;
            }
        }
        value
    }

    /// Predict the value at a period index and seasonal category.
    ///
    /// Extrapolation assumes the linear trend continues and the seasonal
    /// pattern stays constant; accuracy degrades for long horizons.
    ///
    /// # Errors
    /// `UnknownCategory` if `category` was not seen at fit time.
    pub fn predict(&self, period_index: i64, category: SeasonalCategory) -> Result<f64> {
        let seasonal = self.seasonal_effect(category)?;
        Ok(self.baseline(period_index) + seasonal)
    }

    /// Predict the value at a calendar date on the fit-time grid.
    pub fn predict_at(&self, date: NaiveDate) -> Result<f64> {
        let period_index = self.period_index_of(date, 0)?;
        self.predict(period_index, self.granularity.category_of(date))
    }

    /// Predict the `horizon` grid points following the fitted range.
    pub fn forecast(&self, horizon: usize) -> Result<Vec<Observation>> {
        if horizon == 0 {
            return Err(DecompositionError::invalid_parameter(
                "horizon",
                horizon,
                "must be positive",
            ));
        }

        let last = self.n_obs as i64 - 1;
        (1..=horizon as i64)
            .map(|h| {
                let period_index = last + h;
                let timestamp = self
                    .frequency
                    .advance(self.origin, period_index)
                    .ok_or_else(|| {
                        DecompositionError::InvalidInput(format!(
                            "forecast step {} is out of calendar range",
                            h
                        ))
                    })?;
                let value = self.predict(period_index, self.granularity.category_of(timestamp))?;
                Ok(Observation::new(timestamp, value))
            })
            .collect()
    }

    /// Period index of `date` relative to the fit-time origin.
    pub(crate) fn period_index_of(&self, date: NaiveDate, position: usize) -> Result<i64> {
        self.frequency
            .periods_between(self.origin, date)
            .ok_or_else(|| {
                DecompositionError::irregular(
                    position,
                    format!(
                        "{} is not on the {:?} grid starting {}",
                        date, self.frequency, self.origin
                    ),
                )
            })
    }
}

/// Fits and decomposes series with a fixed set of options.
///
/// ```
/// use anofox_seasonal_core::{Frequency, SeasonalGranularity, SeasonalRegressionDecomposer, TimeSeries};
/// use chrono::NaiveDate;
///
/// let start = NaiveDate::from_ymd_opt(2020, 1, 1).unwrap();
/// let dates: Vec<NaiveDate> = (0..12)
///     .map(|i| Frequency::Monthly.advance(start, i).unwrap())
///     .collect();
/// let values = [10.0, 12.0, 14.0, 16.0, 18.0, 20.0, 22.0, 24.0, 22.0, 20.0, 18.0, 16.0];
/// let series = TimeSeries::from_parts(&dates, &values, Frequency::Monthly).unwrap();
///
/// let decomposer = SeasonalRegressionDecomposer::new(SeasonalGranularity::Quarter);
/// let model = decomposer.fit(&series).unwrap();
/// let parts = decomposer.decompose(&series, &model).unwrap();
/// assert!(model.r_squared() > 0.5);
/// assert_eq!(parts.len(), 12);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct SeasonalRegressionDecomposer {
    options: FitOptions,
}

impl SeasonalRegressionDecomposer {
    pub fn new(granularity: SeasonalGranularity) -> Self {
        Self {
            options: FitOptions {
                granularity,
                ..Default::default()
            },
        }
    }

    pub fn with_options(options: FitOptions) -> Self {
        Self { options }
    }

    /// Allow trend level and slope to change from `breakpoint` on.
    pub fn with_breakpoint(mut self, breakpoint: NaiveDate) -> Self {
        self.options.breakpoint = Some(breakpoint);
        self
    }

    /// Reject constant series instead of reporting R² = 0.
    pub fn require_r_squared(mut self, required: bool) -> Self {
        self.options.require_r_squared = required;
        self
    }

    pub fn options(&self) -> &FitOptions {
        &self.options
    }

    pub fn fit(&self, series: &TimeSeries) -> Result<FittedModel> {
        fit_with_options(series, &self.options)
    }

    pub fn decompose(&self, series: &TimeSeries, model: &FittedModel) -> Result<Decomposition> {
        decompose(series, model)
    }

    /// Fit on `series` and decompose the same series.
    pub fn fit_decompose(&self, series: &TimeSeries) -> Result<(FittedModel, Decomposition)> {
        let model = self.fit(series)?;
        let decomposition = decompose(series, &model)?;
        Ok((model, decomposition))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    fn ymd(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn monthly(values: &[f64]) -> TimeSeries {
        let start = ymd(2020, 1, 1);
        let dates: Vec<NaiveDate> = (0..values.len())
            .map(|i| Frequency::Monthly.advance(start, i as i64).unwrap())
            .collect();
        TimeSeries::from_parts(&dates, values, Frequency::Monthly).unwrap()
    }

    /// trend 0.5/period, quarter effects Q1=0, Q2=3, Q3=-2, Q4=1, intercept 100
    fn synthetic(n: usize) -> Vec<f64> {
        let effects = [0.0, 3.0, -2.0, 1.0];
        (0..n)
            .map(|t| 100.0 + 0.5 * t as f64 + effects[(t % 12) / 3])
            .collect()
    }

    #[test]
    fn test_fit_recovers_exact_coefficients() {
        let series = monthly(&synthetic(36));
        let model = fit(&series, SeasonalGranularity::Quarter).unwrap();

        assert_abs_diff_eq!(model.intercept(), 100.0, epsilon = 1e-8);
        assert_abs_diff_eq!(model.trend_coefficient(), 0.5, epsilon = 1e-8);
        assert_eq!(model.reference_category(), SeasonalCategory::quarter(1).unwrap());

        let coeffs = model.seasonal_coefficients();
        assert_eq!(coeffs.len(), 3);
        for ((_, got), expected) in coeffs.iter().zip([3.0, -2.0, 1.0]) {
            assert_abs_diff_eq!(*got, expected, epsilon = 1e-8);
        }
        assert_abs_diff_eq!(model.r_squared(), 1.0, epsilon = 1e-10);
        assert_eq!(model.n_params(), 5);
    }

    #[test]
    fn test_average_seasonal_offset_is_frequency_weighted() {
        // 15 months: Q1 appears 6 times, other quarters 3 times
        let series = monthly(&synthetic(15));
        let model = fit(&series, SeasonalGranularity::Quarter).unwrap();

        let counts: Vec<usize> = model.seasonal_effects().iter().map(|e| e.count).collect();
        assert_eq!(counts, vec![6, 3, 3, 3]);
        let expected = (6.0 * 0.0 + 3.0 * 3.0 + 3.0 * -2.0 + 3.0 * 1.0) / 15.0;
        assert_abs_diff_eq!(model.average_seasonal_offset(), expected, epsilon = 1e-8);
    }

    #[test]
    fn test_insufficient_data() {
        let series = monthly(&synthetic(7));
        assert_eq!(
            fit(&series, SeasonalGranularity::Quarter).unwrap_err(),
            DecompositionError::InsufficientData { needed: 8, got: 7 }
        );
    }

    #[test]
    fn test_constant_series() {
        let series = monthly(&[5.0; 12]);
        let model = fit(&series, SeasonalGranularity::Quarter).unwrap();

        assert_abs_diff_eq!(model.intercept(), 5.0, epsilon = 1e-8);
        assert_abs_diff_eq!(model.trend_coefficient(), 0.0, epsilon = 1e-8);
        for (_, c) in model.seasonal_coefficients() {
            assert_abs_diff_eq!(c, 0.0, epsilon = 1e-8);
        }
        assert!(model.is_degenerate());
        assert_eq!(model.r_squared(), 0.0);
        assert_eq!(
            model.checked_r_squared().unwrap_err(),
            DecompositionError::DegenerateSeries
        );

        let strict = SeasonalRegressionDecomposer::new(SeasonalGranularity::Quarter)
            .require_r_squared(true);
        assert_eq!(
            strict.fit(&series).unwrap_err(),
            DecompositionError::DegenerateSeries
        );
    }

    #[test]
    fn test_predict_unknown_category() {
        let series = monthly(&synthetic(12));
        let model = fit(&series, SeasonalGranularity::Quarter).unwrap();

        let month = SeasonalCategory::month(3).unwrap();
        assert!(matches!(
            model.predict(12, month),
            Err(DecompositionError::UnknownCategory { .. })
        ));
    }

    #[test]
    fn test_predict_and_forecast_extrapolate() {
        let series = monthly(&synthetic(24));
        let model = fit(&series, SeasonalGranularity::Quarter).unwrap();

        let q2 = SeasonalCategory::quarter(2).unwrap();
        assert_abs_diff_eq!(
            model.predict(40, q2).unwrap(),
            100.0 + 0.5 * 40.0 + 3.0,
            epsilon = 1e-8
        );

        let forecast = model.forecast(3).unwrap();
        assert_eq!(forecast.len(), 3);
        assert_eq!(forecast[0].timestamp, ymd(2022, 1, 1));
        assert_eq!(forecast[2].timestamp, ymd(2022, 3, 1));
        let expected = synthetic(27);
        for (obs, e) in forecast.iter().zip(&expected[24..]) {
            assert_abs_diff_eq!(obs.value, *e, epsilon = 1e-8);
        }

        assert_abs_diff_eq!(
            model.predict_at(ymd(2022, 2, 1)).unwrap(),
            expected[25],
            epsilon = 1e-8
        );
        assert!(matches!(
            model.predict_at(ymd(2022, 2, 14)),
            Err(DecompositionError::IrregularSeries { .. })
        ));
        assert!(model.forecast(0).is_err());
    }

    #[test]
    fn test_structural_break() {
        // Slope 1.0 before July 2021, then level +10 and slope 3.0
        let effects = [0.0, 2.0, -1.0, 4.0];
        let values: Vec<f64> = (0..36)
            .map(|t| {
                let base = 50.0 + 1.0 * t as f64;
                let brk = if t >= 18 { 10.0 + 2.0 * (t - 18) as f64 } else { 0.0 };
                base + brk + effects[(t % 12) / 3]
            })
            .collect();
        let series = monthly(&values);

        let model = SeasonalRegressionDecomposer::new(SeasonalGranularity::Quarter)
            .with_breakpoint(ymd(2021, 7, 1))
            .fit(&series)
            .unwrap();

        let b = model.structural_break().unwrap();
        assert_eq!(b.period_index, 18);
        assert_abs_diff_eq!(b.level_shift, 10.0, epsilon = 1e-7);
        assert_abs_diff_eq!(b.slope_change, 2.0, epsilon = 1e-7);
        assert_abs_diff_eq!(model.trend_coefficient(), 1.0, epsilon = 1e-7);
        assert_eq!(model.n_params(), 7);
        assert_abs_diff_eq!(model.r_squared(), 1.0, epsilon = 1e-10);
    }

    #[test]
    fn test_month_granularity() {
        let values: Vec<f64> = (0..24)
            .map(|t| 20.0 + 0.2 * t as f64 + ((t % 12) as f64 - 5.5).powi(2) / 10.0)
            .collect();
        let model = fit(&monthly(&values), SeasonalGranularity::Month).unwrap();

        assert_eq!(model.seasonal_effects().len(), 12);
        assert_eq!(model.seasonal_coefficients().len(), 11);
        assert_eq!(model.reference_category().to_string(), "Jan");
        assert_abs_diff_eq!(model.trend_coefficient(), 0.2, epsilon = 1e-8);
    }
}
