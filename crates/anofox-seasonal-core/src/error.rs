//! Error types for seasonal regression and decomposition.

use thiserror::Error;

/// Result type for decomposition operations.
pub type Result<T> = std::result::Result<T, DecompositionError>;

/// Error types for fitting, decomposing and preprocessing time series.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum DecompositionError {
    #[error("Insufficient data: need at least {needed} observations, got {got}")]
    InsufficientData { needed: usize, got: usize },

    #[error("Degenerate series: total variance is zero, R² is undefined")]
    DegenerateSeries,

    #[error("Unknown seasonal category: {category} was not observed at fit time")]
    UnknownCategory { category: String },

    #[error("Irregular series at position {position}: {reason}")]
    IrregularSeries { position: usize, reason: String },

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Invalid parameter '{param}' = '{value}': {reason}")]
    InvalidParameter {
        param: String,
        value: String,
        reason: String,
    },

    #[error("Computation error: {0}")]
    ComputationError(String),
}

impl DecompositionError {
    pub(crate) fn irregular(position: usize, reason: impl Into<String>) -> Self {
        DecompositionError::IrregularSeries {
            position,
            reason: reason.into(),
        }
    }

    pub(crate) fn invalid_parameter(
        param: &str,
        value: impl ToString,
        reason: impl Into<String>,
    ) -> Self {
        DecompositionError::InvalidParameter {
            param: param.to_string(),
            value: value.to_string(),
            reason: reason.into(),
        }
    }
}
