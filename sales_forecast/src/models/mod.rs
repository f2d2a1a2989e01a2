//! Predictors that learn a mapping from feature rows to a target

use crate::cancel::CancellationToken;
use crate::error::{ForecastError, Result};
use serde::{Deserialize, Serialize};
use std::fmt::Debug;

/// Losses recorded after one training epoch
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct EpochLoss {
    /// Mean squared error on the training rows
    pub loss: f64,
    /// Mean squared error on the held-out rows, when some were supplied
    pub val_loss: Option<f64>,
}

/// Held-out rows scored during training but never fitted on
#[derive(Debug, Clone, Copy)]
pub struct Holdout<'a> {
    pub features: &'a [Vec<f64>],
    pub targets: &'a [f64],
}

/// Model produced by fitting a [`Predictor`]
pub trait FittedModel: Debug + Send + Sync {
    /// Predict the target for one feature row
    fn predict(&self, features: &[f64]) -> Result<f64>;

    /// Predict the target for every row, in order
    fn predict_batch(&self, rows: &[Vec<f64>]) -> Result<Vec<f64>> {
        rows.iter().map(|row| self.predict(row)).collect()
    }

    /// Number of features the model expects per row
    fn arity(&self) -> usize;

    /// Name of the model
    fn name(&self) -> &str;

    /// Per-epoch losses for iteratively trained models
    fn training_history(&self) -> Option<&[EpochLoss]> {
        None
    }
}

/// Learner that can be fitted on row-major training data
pub trait Predictor: Debug + Clone + Send + Sync {
    /// The type of fitted model produced
    type Model: FittedModel;

    /// Fit the model; long-running fits poll `cancel` and stop with `Cancelled`
    fn fit(
        &self,
        features: &[Vec<f64>],
        targets: &[f64],
        cancel: &CancellationToken,
    ) -> Result<Self::Model>;

    /// Fit while scoring `holdout` after every epoch.
    ///
    /// Closed-form predictors have no epochs and ignore the holdout.
    fn fit_with_holdout(
        &self,
        features: &[Vec<f64>],
        targets: &[f64],
        holdout: Holdout<'_>,
        cancel: &CancellationToken,
    ) -> Result<Self::Model> {
        let _ = holdout;
        self.fit(features, targets, cancel)
    }

    /// Get the name of the predictor
    fn name(&self) -> &str;
}

/// Check that training rows are non-empty, rectangular and aligned with the targets.
///
/// Returns the number of features per row.
pub(crate) fn check_training_data(features: &[Vec<f64>], targets: &[f64]) -> Result<usize> {
    if features.is_empty() {
        return Err(ForecastError::ValidationError(
            "Cannot fit a model without training rows".to_string(),
        ));
    }
    if features.len() != targets.len() {
        return Err(ForecastError::ValidationError(format!(
            "Feature rows ({}) don't match targets ({})",
            features.len(),
            targets.len()
        )));
    }

    let arity = features[0].len();
    if arity == 0 {
        return Err(ForecastError::ValidationError(
            "Feature rows must not be empty".to_string(),
        ));
    }
    if let Some(row) = features.iter().position(|row| row.len() != arity) {
        return Err(ForecastError::ValidationError(format!(
            "Row {} has {} features, expected {}",
            row,
            features[row].len(),
            arity
        )));
    }

    Ok(arity)
}

/// Check that a prediction row has the arity the model was fitted on
pub(crate) fn check_arity(expected: usize, features: &[f64]) -> Result<()> {
    if features.len() != expected {
        return Err(ForecastError::ValidationError(format!(
            "Expected {} features, got {}",
            expected,
            features.len()
        )));
    }
    Ok(())
}

/// Reject non-finite model output
pub(crate) fn finite_prediction(model: &str, value: f64) -> Result<f64> {
    if value.is_finite() {
        Ok(value)
    } else {
        Err(ForecastError::NumericalError(format!(
            "{} produced a non-finite prediction",
            model
        )))
    }
}

pub mod multivariate;
pub mod neural_net;
pub mod optimizer;
pub mod simple_linear;

pub use multivariate::{Multivariate, TrainedMultivariate};
pub use neural_net::{NeuralNet, TrainedNeuralNet};
pub use simple_linear::{SimpleLinear, TrainedSimpleLinear};

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_check_training_data() {
        let rows = vec![vec![1.0, 2.0], vec![3.0, 4.0]];

        assert_eq!(check_training_data(&rows, &[1.0, 2.0]).unwrap(), 2);
        assert!(check_training_data(&[], &[]).is_err());
        assert!(check_training_data(&rows, &[1.0]).is_err());
        assert!(check_training_data(&[vec![1.0], vec![1.0, 2.0]], &[1.0, 2.0]).is_err());
    }

    #[test]
    fn test_check_arity() {
        assert!(check_arity(2, &[1.0, 2.0]).is_ok());
        assert!(matches!(
            check_arity(2, &[1.0]),
            Err(ForecastError::ValidationError(_))
        ));
    }
}
