//! # Sales Math
//!
//! Numeric primitives for sales forecast evaluation.
//! This crate provides min-max scaling of feature and target columns and
//! ordinary least squares solvers for simple and multivariate regression.

use thiserror::Error;

pub mod regression;
pub mod scaling;

pub use regression::{multiple_least_squares, simple_least_squares, Coefficients, LinearFit};
pub use scaling::{ColumnScaler, ScalingParameters, NEUTRAL_VALUE};

/// Errors that can occur in scaling and regression calculations
#[derive(Error, Debug, Clone, PartialEq)]
pub enum MathError {
    #[error("Insufficient data for calculation: {0}")]
    InsufficientData(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Rank-deficient system: {0}")]
    RankDeficient(String),

    #[error("Calculation error: {0}")]
    CalculationError(String),
}

/// Result type for sales math operations
pub type Result<T> = std::result::Result<T, MathError>;

pub(crate) fn ensure_finite(values: &[f64], what: &str) -> Result<()> {
    match values.iter().position(|v| !v.is_finite()) {
        Some(i) => Err(MathError::InvalidInput(format!(
            "{} contains a non-finite value at position {}",
            what, i
        ))),
        None => Ok(()),
    }
}
