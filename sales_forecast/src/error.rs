//! Error types for the sales_forecast crate

use sales_math::MathError;
use thiserror::Error;

/// Custom error types for the sales_forecast crate
#[derive(Debug, Error)]
pub enum ForecastError {
    /// Malformed input: unequal columns, empty data, degenerate split, length mismatches
    #[error("Validation error: {0}")]
    ValidationError(String),

    /// Ill-conditioned fit or non-finite values produced during training or prediction
    #[error("Numerical error: {0}")]
    NumericalError(String),

    /// A metric that is mathematically undefined for the given actual values
    #[error("evaluation unavailable: {metric} is undefined ({reason})")]
    UndefinedMetric {
        metric: &'static str,
        reason: String,
    },

    /// The caller aborted a long-running fit
    #[error("Evaluation cancelled")]
    Cancelled,

    /// Error from invalid configuration
    #[error("Configuration error: {0}")]
    ConfigError(String),

    /// Error while parsing input records
    #[error("Parse error: {0}")]
    ParseError(String),

    /// Error from IO operations
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
}

/// Result type with our custom error
pub type Result<T> = std::result::Result<T, ForecastError>;

impl ForecastError {
    /// Whether the error stems from malformed input or configuration
    pub fn is_validation(&self) -> bool {
        matches!(
            self,
            ForecastError::ValidationError(_) | ForecastError::ConfigError(_)
        )
    }

    /// Whether the error stems from an ill-conditioned computation or an undefined metric
    pub fn is_numerical(&self) -> bool {
        matches!(
            self,
            ForecastError::NumericalError(_) | ForecastError::UndefinedMetric { .. }
        )
    }
}

impl From<MathError> for ForecastError {
    fn from(err: MathError) -> Self {
        match err {
            MathError::InsufficientData(msg) | MathError::InvalidInput(msg) => {
                ForecastError::ValidationError(msg)
            }
            MathError::RankDeficient(msg) | MathError::CalculationError(msg) => {
                ForecastError::NumericalError(msg)
            }
        }
    }
}

impl From<csv::Error> for ForecastError {
    fn from(err: csv::Error) -> Self {
        match err.kind() {
            csv::ErrorKind::UnequalLengths { .. } => {
                ForecastError::ValidationError(err.to_string())
            }
            _ => ForecastError::ParseError(err.to_string()),
        }
    }
}

impl From<serde_json::Error> for ForecastError {
    fn from(err: serde_json::Error) -> Self {
        ForecastError::ParseError(err.to_string())
    }
}

impl From<chrono::ParseError> for ForecastError {
    fn from(err: chrono::ParseError) -> Self {
        ForecastError::ParseError(err.to_string())
    }
}
