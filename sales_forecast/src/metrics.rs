//! Metrics for evaluating forecast performance

use crate::error::{ForecastError, Result};
use serde::{Deserialize, Serialize};
use statrs::statistics::Statistics;

/// Forecast performance metrics, in the units of the target
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Metrics {
    /// Mean Squared Error
    pub mse: f64,
    /// Root Mean Squared Error
    pub rmse: f64,
    /// Mean Absolute Error
    pub mae: f64,
    /// Mean Absolute Percentage Error, in percent
    pub mape: f64,
    /// Coefficient of determination
    pub r2: f64,
}

impl Metrics {
    /// `100 - MAPE`, in percent.
    ///
    /// Negative once the average error exceeds the actual values.
    pub fn accuracy(&self) -> f64 {
        100.0 - self.mape
    }
}

impl std::fmt::Display for Metrics {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "Forecast Performance Metrics:")?;
        writeln!(f, "  MSE:     {:.4}", self.mse)?;
        writeln!(f, "  RMSE:    {:.4}", self.rmse)?;
        writeln!(f, "  MAE:     {:.4}", self.mae)?;
        writeln!(f, "  MAPE:    {:.4}%", self.mape)?;
        writeln!(f, "  R2:      {:.4}", self.r2)?;
        writeln!(f, "  Accuracy: {:.4}%", self.accuracy())?;
        Ok(())
    }
}

/// Scores predictions against actual values.
///
/// Every metric is strict: a metric that is undefined for the given actuals
/// fails the whole evaluation instead of reporting a sentinel value.
#[derive(Debug, Clone, Copy, Default)]
pub struct MetricsEngine;

impl MetricsEngine {
    /// Compute every metric for aligned `actual` and `predicted` slices
    pub fn score(actual: &[f64], predicted: &[f64]) -> Result<Metrics> {
        validate_inputs(actual, predicted)?;

        let mse = mean_squared_error(actual, predicted)?;

        Ok(Metrics {
            mse,
            rmse: mse.sqrt(),
            mae: mean_absolute_error(actual, predicted)?,
            mape: mean_absolute_percentage_error(actual, predicted)?,
            r2: r_squared(actual, predicted)?,
        })
    }
}

fn validate_inputs(actual: &[f64], predicted: &[f64]) -> Result<()> {
    if actual.len() != predicted.len() || actual.is_empty() {
        return Err(ForecastError::ValidationError(format!(
            "Actual ({}) and predicted ({}) values must have the same non-zero length",
            actual.len(),
            predicted.len()
        )));
    }
    if actual.iter().chain(predicted).any(|v| !v.is_finite()) {
        return Err(ForecastError::ValidationError(
            "Actual and predicted values must be finite".to_string(),
        ));
    }
    Ok(())
}

/// Mean of the squared residuals
pub fn mean_squared_error(actual: &[f64], predicted: &[f64]) -> Result<f64> {
    validate_inputs(actual, predicted)?;

    Ok(actual
        .iter()
        .zip(predicted)
        .map(|(a, p)| (a - p).powi(2))
        .mean())
}

/// Mean of the absolute residuals
pub fn mean_absolute_error(actual: &[f64], predicted: &[f64]) -> Result<f64> {
    validate_inputs(actual, predicted)?;

    Ok(actual.iter().zip(predicted).map(|(a, p)| (a - p).abs()).mean())
}

/// Mean of `|actual - predicted| / |actual|`, times 100.
///
/// Undefined when any actual value is zero.
pub fn mean_absolute_percentage_error(actual: &[f64], predicted: &[f64]) -> Result<f64> {
    validate_inputs(actual, predicted)?;

    if let Some(position) = actual.iter().position(|a| *a == 0.0) {
        return Err(ForecastError::UndefinedMetric {
            metric: "mape",
            reason: format!("actual value at position {} is zero", position),
        });
    }

    let mape = actual
        .iter()
        .zip(predicted)
        .map(|(a, p)| ((a - p) / a).abs())
        .mean();

    Ok(mape * 100.0)
}

/// `1 - SS_res / SS_tot`.
///
/// Undefined when the actual values have zero variance.
pub fn r_squared(actual: &[f64], predicted: &[f64]) -> Result<f64> {
    validate_inputs(actual, predicted)?;

    // Calculate total and residual sums of squares
    let mean = actual.iter().mean();
    let ss_tot: f64 = actual.iter().map(|a| (a - mean).powi(2)).sum();
    let ss_res: f64 = actual
        .iter()
        .zip(predicted)
        .map(|(a, p)| (a - p).powi(2))
        .sum();

    if ss_tot == 0.0 {
        return Err(ForecastError::UndefinedMetric {
            metric: "r2",
            reason: "actual values have zero variance".to_string(),
        });
    }

    Ok(1.0 - ss_res / ss_tot)
}
