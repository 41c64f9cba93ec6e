//! End-to-end scenarios through the public API: raw rows in, fitted model,
//! decomposition and forecast out.

use anofox_seasonal_core::{
    acf, decompose, fit, rolling_mean, DecompositionError, FillMethod, Frequency,
    SeasonalCategory, SeasonalGranularity, SeasonalRegressionDecomposer, TimeSeries,
};
use approx::assert_abs_diff_eq;
use chrono::NaiveDate;

// ── Synthetic data generators ──────────────────────────────────────────

fn ymd(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

fn monthly_dates(start: NaiveDate, n: usize) -> Vec<NaiveDate> {
    (0..n)
        .map(|i| Frequency::Monthly.advance(start, i as i64).unwrap())
        .collect()
}

/// One year of monthly values rising to a late-summer peak.
fn one_year() -> TimeSeries {
    let values = [
        10.0, 12.0, 14.0, 16.0, 18.0, 20.0, 22.0, 24.0, 22.0, 20.0, 18.0, 16.0,
    ];
    TimeSeries::from_parts(&monthly_dates(ymd(2021, 1, 1), 12), &values, Frequency::Monthly)
        .unwrap()
}

/// Airline-style passengers (millions): upward trend, summer peak, deterministic noise.
fn passengers(n: usize) -> Vec<f64> {
    let monthly_effect = [
        -20.0, -25.0, 0.0, -5.0, -3.0, 25.0, 50.0, 48.0, 15.0, -12.0, -40.0, -18.0,
    ];
    (0..n)
        .map(|t| {
            let noise = ((t * 13 + 5) % 17) as f64 * 0.8 - 6.4;
            120.0 + 2.5 * t as f64 + monthly_effect[t % 12] + noise
        })
        .collect()
}

// ── Scenarios ──────────────────────────────────────────────────────────

#[test]
fn one_year_quarterly_fit_and_decompose() {
    let series = one_year();
    let decomposer = SeasonalRegressionDecomposer::new(SeasonalGranularity::Quarter);

    let model = decomposer.fit(&series).unwrap();
    assert!(model.r_squared() > 0.5);
    assert_abs_diff_eq!(model.trend_coefficient(), 0.5, epsilon = 1e-8);

    let parts = decomposer.decompose(&series, &model).unwrap();
    assert_eq!(parts.len(), 12);
    for row in parts.rows() {
        assert_abs_diff_eq!(row.trend + row.seasonal, row.fitted, epsilon = 1e-9);
        assert_abs_diff_eq!(
            row.trend + row.seasonal + row.residual,
            row.observed,
            epsilon = 1e-9
        );
    }

    let observed = parts.observed();
    assert_eq!(observed, series.values());
}

#[test]
fn one_year_is_too_short_for_monthly_categories() {
    let series = one_year();
    let err = fit(&series, SeasonalGranularity::Month).unwrap_err();
    assert_eq!(
        err,
        DecompositionError::InsufficientData {
            needed: 24,
            got: 12
        }
    );
}

#[test]
fn monthly_passengers_full_cycle() {
    let values = passengers(48);
    let series =
        TimeSeries::from_parts(&monthly_dates(ymd(1949, 1, 1), 48), &values, Frequency::Monthly)
            .unwrap();

    let (model, parts) = SeasonalRegressionDecomposer::new(SeasonalGranularity::Month)
        .fit_decompose(&series)
        .unwrap();

    assert!(model.r_squared() > 0.95);
    assert_abs_diff_eq!(model.trend_coefficient(), 2.5, epsilon = 0.2);

    // Each month appears 4 times, so the seasonal component averages to zero
    // over any whole year.
    for year in 0..4 {
        let cycle = &parts.seasonal()[year * 12..(year + 1) * 12];
        assert_abs_diff_eq!(cycle.iter().sum::<f64>() / 12.0, 0.0, epsilon = 1e-9);
    }

    // July is the peak month in the recentred profile
    let (peak, _) = parts
        .seasonal_profile()
        .iter()
        .copied()
        .max_by(|a, b| a.1.total_cmp(&b.1))
        .unwrap();
    assert_eq!(peak, SeasonalCategory::month(7).unwrap());

    // Remaining residual autocorrelation is modest
    let rho = acf(&parts.residual(), 12).unwrap();
    assert_abs_diff_eq!(rho[0], 1.0);
    assert!(rho[1..].iter().all(|r| r.abs() < 1.0));

    let forecast = model.forecast(12).unwrap();
    assert_eq!(forecast[0].timestamp, ymd(1953, 1, 1));
    assert!(forecast[6].value > forecast[0].value);
}

#[test]
fn raw_rows_with_gaps_are_regularized_then_fitted() {
    let dates = monthly_dates(ymd(2015, 1, 1), 36);
    let values = passengers(36);

    // Drop two rows and blank out a value
    let mut raw_dates = dates.clone();
    let mut raw_values: Vec<Option<f64>> = values.iter().copied().map(Some).collect();
    raw_dates.remove(20);
    raw_values.remove(20);
    raw_dates.remove(10);
    raw_values.remove(10);
    raw_values[5] = None;

    assert!(matches!(
        TimeSeries::from_parts(
            &raw_dates,
            &raw_values.iter().map(|v| v.unwrap_or(0.0)).collect::<Vec<_>>(),
            Frequency::Monthly
        ),
        Err(DecompositionError::IrregularSeries { .. })
    ));

    let series =
        TimeSeries::regularize(&raw_dates, &raw_values, Frequency::Monthly, FillMethod::Forward)
            .unwrap();
    assert_eq!(series.len(), 36);
    assert_eq!(series.values()[5], values[4]);
    assert_eq!(series.values()[10], values[9]);

    let model = fit(&series, SeasonalGranularity::Quarter).unwrap();
    let parts = decompose(&series, &model).unwrap();
    assert_eq!(parts.timestamps(), dates);
}

#[test]
fn structural_break_absorbs_level_shift() {
    let start = ymd(2016, 1, 1);
    let values: Vec<f64> = passengers(48)
        .into_iter()
        .enumerate()
        .map(|(t, v)| if t >= 24 { v - 80.0 } else { v })
        .collect();
    let series =
        TimeSeries::from_parts(&monthly_dates(start, 48), &values, Frequency::Monthly).unwrap();

    let plain = fit(&series, SeasonalGranularity::Quarter).unwrap();
    let with_break = SeasonalRegressionDecomposer::new(SeasonalGranularity::Quarter)
        .with_breakpoint(ymd(2018, 1, 1))
        .fit(&series)
        .unwrap();

    let b = with_break.structural_break().unwrap();
    assert_eq!(b.period_index, 24);
    assert!(b.level_shift < -50.0);
    assert!(with_break.r_squared() > plain.r_squared());

    // Break terms are part of the trend, not the seasonal component
    let parts = decompose(&series, &with_break).unwrap();
    let trend = parts.trend();
    assert!(trend[24] < trend[23]);
    for row in parts.rows() {
        assert_abs_diff_eq!(row.trend + row.seasonal, row.fitted, epsilon = 1e-9);
    }
    let seasonal = parts.seasonal();
    assert_abs_diff_eq!(
        seasonal.iter().sum::<f64>() / seasonal.len() as f64,
        0.0,
        epsilon = 1e-9
    );
    // Seasonal values repeat year over year on both sides of the break
    assert_abs_diff_eq!(seasonal[6], seasonal[30], epsilon = 1e-9);
}

#[test]
fn break_between_whole_quarters_is_rejected() {
    // Q1-Q2 before July, Q3-Q4 after: no quarter spans the break
    let decomposer = SeasonalRegressionDecomposer::new(SeasonalGranularity::Quarter)
        .with_breakpoint(ymd(2021, 7, 1));
    assert_eq!(
        decomposer.fit(&one_year()).unwrap_err(),
        DecompositionError::InsufficientData { needed: 1, got: 0 }
    );

    // A break inside Q3 leaves July before it and August onward after it
    let model = SeasonalRegressionDecomposer::new(SeasonalGranularity::Quarter)
        .with_breakpoint(ymd(2021, 8, 1))
        .fit(&one_year())
        .unwrap();
    assert_eq!(model.structural_break().unwrap().period_index, 7);
}

#[test]
fn rolling_mean_smooths_monthly_series() {
    let values = passengers(36);
    let smoothed = rolling_mean(&values, 12, true).unwrap();

    assert!(smoothed[..6].iter().all(|v| v.is_none()));
    assert!(smoothed[6..31].iter().all(|v| v.is_some()));
    assert!(smoothed[31..].iter().all(|v| v.is_none()));

    // A 12-month window cancels the seasonal pattern, leaving the trend
    let first = smoothed[6].unwrap();
    let next = smoothed[7].unwrap();
    assert_abs_diff_eq!(next - first, 2.5, epsilon = 1.5);
}

#[cfg(feature = "serde")]
#[test]
fn fitted_model_serializes_as_structured_record() {
    let model = fit(&one_year(), SeasonalGranularity::Quarter).unwrap();
    let json = serde_json::to_value(&model).unwrap();

    assert!(json.get("intercept").is_some());
    assert!(json.get("trend").is_some());
    assert_eq!(json["effects"].as_array().unwrap().len(), 4);

    let restored: anofox_seasonal_core::FittedModel = serde_json::from_value(json).unwrap();
    assert_eq!(restored.origin(), model.origin());
    assert_eq!(restored.reference_category(), model.reference_category());
    assert_abs_diff_eq!(restored.intercept(), model.intercept(), epsilon = 1e-12);
    assert_abs_diff_eq!(
        restored.predict(20, SeasonalCategory::quarter(3).unwrap()).unwrap(),
        model.predict(20, SeasonalCategory::quarter(3).unwrap()).unwrap(),
        epsilon = 1e-9
    );
}
