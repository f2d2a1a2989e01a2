//! Ordinary least squares on a single feature

use crate::cancel::CancellationToken;
use crate::error::{ForecastError, Result};
use crate::models::{check_arity, check_training_data, finite_prediction, FittedModel, Predictor};
use sales_math::{simple_least_squares, LinearFit};

/// Straight-line fit `y = slope * x + intercept`
#[derive(Debug, Clone)]
pub struct SimpleLinear {
    /// Name of the model
    name: String,
}

/// Fitted straight line
#[derive(Debug, Clone, PartialEq)]
pub struct TrainedSimpleLinear {
    /// Name of the model
    name: String,
    /// Fitted coefficients
    fit: LinearFit,
}

impl SimpleLinear {
    /// Create a new simple linear predictor
    pub fn new() -> Self {
        Self {
            name: "Simple Linear Regression".to_string(),
        }
    }
}

impl Default for SimpleLinear {
    fn default() -> Self {
        Self::new()
    }
}

impl Predictor for SimpleLinear {
    type Model = TrainedSimpleLinear;

    fn fit(
        &self,
        features: &[Vec<f64>],
        targets: &[f64],
        cancel: &CancellationToken,
    ) -> Result<Self::Model> {
        let arity = check_training_data(features, targets)?;
        if arity != 1 {
            return Err(ForecastError::ValidationError(format!(
                "{} needs exactly one feature, got {}",
                self.name, arity
            )));
        }
        cancel.check()?;

        let x: Vec<f64> = features.iter().map(|row| row[0]).collect();
        let fit = simple_least_squares(&x, targets)?;

        Ok(TrainedSimpleLinear {
            name: self.name.clone(),
            fit,
        })
    }

    fn name(&self) -> &str {
        &self.name
    }
}

impl TrainedSimpleLinear {
    /// Fitted slope
    pub fn slope(&self) -> f64 {
        self.fit.slope
    }

    /// Fitted intercept
    pub fn intercept(&self) -> f64 {
        self.fit.intercept
    }
}

impl FittedModel for TrainedSimpleLinear {
    fn predict(&self, features: &[f64]) -> Result<f64> {
        check_arity(1, features)?;
        finite_prediction(&self.name, self.fit.predict(features[0]))
    }

    fn arity(&self) -> usize {
        1
    }

    fn name(&self) -> &str {
        &self.name
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn rows(x: &[f64]) -> Vec<Vec<f64>> {
        x.iter().map(|v| vec![*v]).collect()
    }

    #[test]
    fn test_fits_line() {
        let x = rows(&[0.0, 1.0, 2.0, 3.0, 4.0]);
        let y = [100.0, 110.0, 105.0, 120.0, 130.0];

        let model = SimpleLinear::new()
            .fit(&x, &y, &CancellationToken::new())
            .unwrap();

        assert_relative_eq!(model.slope(), 7.0, epsilon = 1e-10);
        assert_relative_eq!(model.intercept(), 99.0, epsilon = 1e-10);
        assert_relative_eq!(model.predict(&[5.0]).unwrap(), 134.0, epsilon = 1e-10);
    }

    #[test]
    fn test_rejects_multiple_features() {
        let x = vec![vec![0.0, 1.0], vec![1.0, 0.0]];

        let result = SimpleLinear::new().fit(&x, &[1.0, 2.0], &CancellationToken::new());

        assert!(matches!(result, Err(ForecastError::ValidationError(_))));
    }

    #[test]
    fn test_constant_feature_is_numerical_error() {
        let x = rows(&[0.5, 0.5, 0.5]);

        let result = SimpleLinear::new().fit(&x, &[1.0, 2.0, 3.0], &CancellationToken::new());

        assert!(matches!(result, Err(ForecastError::NumericalError(_))));
    }

    #[test]
    fn test_cancelled_before_fit() {
        let cancel = CancellationToken::new();
        cancel.cancel();

        let result = SimpleLinear::new().fit(&rows(&[0.0, 1.0]), &[1.0, 2.0], &cancel);

        assert!(matches!(result, Err(ForecastError::Cancelled)));
    }

    #[test]
    fn test_predict_checks_arity() {
        let model = SimpleLinear::new()
            .fit(&rows(&[0.0, 1.0]), &[1.0, 2.0], &CancellationToken::new())
            .unwrap();

        assert!(model.predict(&[1.0, 2.0]).is_err());
    }
}
