//! Seasonal regression decomposition for equally-spaced time series.
//!
//! This crate fits a linear trend plus one-hot seasonal category model by
//! ordinary least squares and splits the fitted values into additive trend,
//! seasonal and residual components. Preprocessing helpers (gap filling,
//! imputation, rolling means) and residual diagnostics are provided alongside.

pub mod decomposition;
pub mod diagnostics;
pub mod error;
pub mod gaps;
pub mod imputation;
pub mod metrics;
pub mod model;
pub mod quality;
pub mod regressors;
pub mod rolling;
pub mod series;

// Re-exports for convenience
pub use decomposition::{decompose, Decomposition, DecompositionRow};
pub use diagnostics::{acf, ljung_box, LjungBoxResult};
pub use error::{DecompositionError, Result};
pub use gaps::{count_gaps, detect_frequency, fill_gaps};
pub use imputation::{
    fill_nulls_backward, fill_nulls_const, fill_nulls_forward, fill_nulls_interpolate,
    fill_nulls_mean, impute, FillMethod,
};
pub use metrics::{mae, mse, r2, rmse};
pub use model::{
    fit, fit_with_options, FitOptions, FittedModel, SeasonalEffect, SeasonalRegressionDecomposer,
    StructuralBreak,
};
pub use quality::{missing_ratio, missing_ratio_by_weekday};
pub use regressors::{one_hot_drop_first, OneHotEncoding};
pub use rolling::rolling_mean;
pub use series::{Frequency, Observation, SeasonalCategory, SeasonalGranularity, TimeSeries};
