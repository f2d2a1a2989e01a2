//! Ordinary least squares on every feature column

use crate::cancel::CancellationToken;
use crate::error::Result;
use crate::models::{check_arity, check_training_data, finite_prediction, FittedModel, Predictor};
use sales_math::{multiple_least_squares, Coefficients};

/// Linear model `y = b0 + b1*x1 + ... + bk*xk` fitted through the normal equations
#[derive(Debug, Clone)]
pub struct Multivariate {
    /// Name of the model
    name: String,
}

/// Fitted hyperplane
#[derive(Debug, Clone, PartialEq)]
pub struct TrainedMultivariate {
    /// Name of the model
    name: String,
    /// Intercept and one weight per feature
    coefficients: Coefficients,
}

impl Multivariate {
    /// Create a new multivariate linear predictor
    pub fn new() -> Self {
        Self {
            name: "Multivariate Linear Regression".to_string(),
        }
    }
}

impl Default for Multivariate {
    fn default() -> Self {
        Self::new()
    }
}

impl Predictor for Multivariate {
    type Model = TrainedMultivariate;

    fn fit(
        &self,
        features: &[Vec<f64>],
        targets: &[f64],
        cancel: &CancellationToken,
    ) -> Result<Self::Model> {
        check_training_data(features, targets)?;
        cancel.check()?;

        let coefficients = multiple_least_squares(features, targets)?;

        Ok(TrainedMultivariate {
            name: self.name.clone(),
            coefficients,
        })
    }

    fn name(&self) -> &str {
        &self.name
    }
}

impl TrainedMultivariate {
    /// Intercept term
    pub fn intercept(&self) -> f64 {
        self.coefficients.intercept
    }

    /// Weight of each feature, in column order
    pub fn weights(&self) -> &[f64] {
        &self.coefficients.weights
    }
}

impl FittedModel for TrainedMultivariate {
    fn predict(&self, features: &[f64]) -> Result<f64> {
        check_arity(self.arity(), features)?;
        finite_prediction(&self.name, self.coefficients.predict(features)?)
    }

    fn arity(&self) -> usize {
        self.coefficients.weights.len()
    }

    fn name(&self) -> &str {
        &self.name
    }
}
