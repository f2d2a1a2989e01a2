//! End-to-end forecast evaluation: scale, split, fit, score, predict ahead

use crate::cancel::CancellationToken;
use crate::config::{PipelineConfig, PredictorConfig, ShuffleMode};
use crate::data::{Dataset, Observation};
use crate::error::{ForecastError, Result};
use crate::metrics::{Metrics, MetricsEngine};
use crate::models::{
    EpochLoss, FittedModel, Holdout, Multivariate, NeuralNet, Predictor, SimpleLinear,
};
use crate::split::{split, split_shuffled};
use rayon::prelude::*;
use sales_math::ColumnScaler;
use serde::Serialize;
use tracing::{debug, info, warn};

/// Outcome of one evaluation run
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ForecastResult {
    /// Prediction for the step after the dataset, in target units, never negative
    predicted_value: f64,
    /// Scores of the test-set predictions
    metrics: Metrics,
    /// Name of the fitted model
    model_name: String,
    /// Number of training observations
    train_len: usize,
    /// Number of test observations
    test_len: usize,
    /// Denormalized test predictions
    predictions: Vec<f64>,
    /// Denormalized test actuals
    actuals: Vec<f64>,
    /// Per-epoch losses in normalized units, for iteratively trained models
    #[serde(skip_serializing_if = "Option::is_none")]
    training_history: Option<Vec<EpochLoss>>,
}

impl ForecastResult {
    /// Get the next-step prediction
    pub fn predicted_value(&self) -> f64 {
        self.predicted_value
    }

    /// Get the test-set metrics
    pub fn metrics(&self) -> &Metrics {
        &self.metrics
    }

    /// Get the name of the fitted model
    pub fn model_name(&self) -> &str {
        &self.model_name
    }

    /// Get the number of training observations
    pub fn train_len(&self) -> usize {
        self.train_len
    }

    /// Get the number of test observations
    pub fn test_len(&self) -> usize {
        self.test_len
    }

    /// Get the test-set predictions in target units
    pub fn predictions(&self) -> &[f64] {
        &self.predictions
    }

    /// Get the test-set actual values in target units
    pub fn actuals(&self) -> &[f64] {
        &self.actuals
    }

    /// Get the per-epoch training and test-set losses, if the model has epochs
    pub fn training_history(&self) -> Option<&[EpochLoss]> {
        self.training_history.as_deref()
    }

    /// Serialize to pretty-printed JSON
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

impl std::fmt::Display for ForecastResult {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "Model:           {}", self.model_name)?;
        writeln!(f, "Train/Test:      {}/{}", self.train_len, self.test_len)?;
        writeln!(f, "Next prediction: {:.4}", self.predicted_value)?;
        write!(f, "{}", self.metrics)
    }
}

/// Evaluates one predictor configuration on a dataset.
///
/// Every metric must be defined on the test split. A test split of one
/// observation has zero variance, so R² is undefined and the run fails with
/// [`ForecastError::UndefinedMetric`]; no next-step prediction is returned
/// either. With the default ratio of 0.8 that covers every dataset of five
/// observations or fewer. Lower `split_ratio` to keep at least two test
/// observations on short series.
#[derive(Debug, Clone)]
pub struct ForecastPipeline {
    config: PipelineConfig,
}

impl ForecastPipeline {
    /// Create a pipeline from a validated configuration
    pub fn new(config: PipelineConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self { config })
    }

    /// Get the configuration
    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    /// Run the evaluation to completion
    pub fn evaluate(&self, dataset: &Dataset) -> Result<ForecastResult> {
        self.evaluate_with_cancel(dataset, &CancellationToken::new())
    }

    /// Run the evaluation, stopping with `Cancelled` once `cancel` is set
    pub fn evaluate_with_cancel(
        &self,
        dataset: &Dataset,
        cancel: &CancellationToken,
    ) -> Result<ForecastResult> {
        match &self.config.predictor {
            PredictorConfig::SimpleLinear => self.run(&SimpleLinear::new(), dataset, cancel),
            PredictorConfig::Multivariate => self.run(&Multivariate::new(), dataset, cancel),
            PredictorConfig::NeuralNet(options) => {
                self.run(&NeuralNet::new(options.clone())?, dataset, cancel)
            }
        }
    }

    fn run<P: Predictor>(
        &self,
        predictor: &P,
        dataset: &Dataset,
        cancel: &CancellationToken,
    ) -> Result<ForecastResult> {
        if dataset.is_empty() || dataset.arity() == 0 {
            return Err(ForecastError::ValidationError(
                "Dataset must contain at least one observation and one feature".to_string(),
            ));
        }

        // Resolve the next-step features up front so arity errors surface before fitting
        let next_features = match &self.config.next_features {
            Some(features) => features.clone(),
            None => dataset.next_step_features()?,
        };
        if next_features.len() != dataset.arity() {
            return Err(ForecastError::ValidationError(format!(
                "Next-step features have {} values, dataset has {} features",
                next_features.len(),
                dataset.arity()
            )));
        }

        info!(
            model = predictor.name(),
            observations = dataset.len(),
            features = dataset.arity(),
            "starting forecast evaluation"
        );

        // Fit scaling on the full dataset and normalize every column
        let scaler = ColumnScaler::fit(&dataset.feature_columns(), &dataset.targets())?;
        let normalized = normalize(dataset, &scaler)?;
        debug!(
            target_min = scaler.target().min(),
            target_max = scaler.target().max(),
            "fitted min-max scaling"
        );

        let parts = match self.config.shuffle_mode()? {
            ShuffleMode::Ordered => split(&normalized, self.config.split_ratio)?,
            ShuffleMode::Seeded(seed) => {
                warn!(seed, "shuffling time-ordered observations before the split");
                split_shuffled(&normalized, self.config.split_ratio, seed)?
            }
        };
        debug!(
            train = parts.train.len(),
            test = parts.test.len(),
            ratio = self.config.split_ratio,
            "split observations"
        );

        cancel.check()?;
        let test_rows = parts.test.feature_rows();
        let test_targets = parts.test.targets();
        let holdout = Holdout {
            features: &test_rows,
            targets: &test_targets,
        };
        let model = predictor.fit_with_holdout(
            &parts.train.feature_rows(),
            &parts.train.targets(),
            holdout,
            cancel,
        )?;
        cancel.check()?;

        // Score in target units
        let target = scaler.target();
        let predictions = target.inverse_transform_slice(&model.predict_batch(&test_rows)?);
        let actuals = target.inverse_transform_slice(&test_targets);
        let metrics = MetricsEngine::score(&actuals, &predictions)?;

        let predicted_value = predict_next(&model, &scaler, &next_features)?;

        info!(
            model = model.name(),
            predicted_value,
            rmse = metrics.rmse,
            r2 = metrics.r2,
            "finished forecast evaluation"
        );

        Ok(ForecastResult {
            predicted_value,
            metrics,
            model_name: model.name().to_string(),
            train_len: parts.train.len(),
            test_len: parts.test.len(),
            predictions,
            actuals,
            training_history: model.training_history().map(<[EpochLoss]>::to_vec),
        })
    }
}

/// Dataset with every feature and the target mapped into [0, 1]
fn normalize(dataset: &Dataset, scaler: &ColumnScaler) -> Result<Dataset> {
    let observations = dataset
        .observations()
        .iter()
        .map(|o| -> Result<Observation> {
            Ok(Observation::new(
                o.index(),
                scaler.transform_row(o.features())?,
                scaler.transform_target(o.target()),
            ))
        })
        .collect::<Result<Vec<_>>>()?;

    Dataset::new(dataset.feature_names().to_vec(), observations)
}

/// Predict one step ahead in target units, clamped at zero
fn predict_next<M: FittedModel>(model: &M, scaler: &ColumnScaler, features: &[f64]) -> Result<f64> {
    let normalized = scaler.transform_row(features)?;
    let value = scaler.inverse_target(model.predict(&normalized)?);

    if !value.is_finite() {
        return Err(ForecastError::NumericalError(format!(
            "{} produced a non-finite next-step prediction",
            model.name()
        )));
    }
    if value < 0.0 {
        warn!(value, "clamping negative next-step prediction to zero");
        return Ok(0.0);
    }

    Ok(value)
}

/// Evaluate several configurations on the same dataset in parallel.
///
/// Results come back in the order of `configs`; one failing run does not
/// affect the others.
pub fn evaluate_many(dataset: &Dataset, configs: &[PipelineConfig]) -> Vec<Result<ForecastResult>> {
    configs
        .par_iter()
        .map(|config| ForecastPipeline::new(config.clone())?.evaluate(dataset))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::NeuralNetOptions;
    use approx::assert_relative_eq;

    fn sales() -> Dataset {
        Dataset::from_series(&[100.0, 110.0, 105.0, 120.0, 130.0, 125.0, 140.0]).unwrap()
    }

    #[test]
    fn test_simple_linear_evaluation() {
        let result = ForecastPipeline::new(PipelineConfig::default())
            .unwrap()
            .evaluate(&sales())
            .unwrap();

        assert_eq!(result.train_len(), 5);
        assert_eq!(result.test_len(), 2);
        assert_relative_eq!(result.predictions()[0], 134.0, epsilon = 1e-9);
        assert_relative_eq!(result.predictions()[1], 141.0, epsilon = 1e-9);
        assert_relative_eq!(result.predicted_value(), 148.0, epsilon = 1e-9);
        assert_relative_eq!(result.metrics().mse, 41.0, epsilon = 1e-9);
    }

    #[test]
    fn test_negative_prediction_is_clamped() {
        let values: Vec<f64> = (0..10).map(|i| 100.0 - 10.0 * i as f64).collect();
        let falling = Dataset::from_series(&values).unwrap();
        let config = PipelineConfig::default().with_next_features(vec![12.0]);

        let result = ForecastPipeline::new(config).unwrap().evaluate(&falling).unwrap();

        assert_eq!(result.predicted_value(), 0.0);
    }

    #[test]
    fn test_history_only_for_neural_net() {
        let linear = ForecastPipeline::new(PipelineConfig::default())
            .unwrap()
            .evaluate(&sales())
            .unwrap();
        assert!(linear.training_history().is_none());

        let config = PipelineConfig::new(PredictorConfig::NeuralNet(
            NeuralNetOptions::default().with_epochs(40),
        ));
        let net = ForecastPipeline::new(config).unwrap().evaluate(&sales()).unwrap();

        let history = net.training_history().unwrap();
        assert_eq!(history.len(), 40);
        assert!(history.iter().all(|e| e.val_loss.is_some()));
    }

    #[test]
    fn test_next_features_arity_mismatch() {
        let config = PipelineConfig::default().with_next_features(vec![1.0, 2.0]);

        let result = ForecastPipeline::new(config).unwrap().evaluate(&sales());

        assert!(matches!(result, Err(ForecastError::ValidationError(_))));
    }

    #[test]
    fn test_evaluate_many_keeps_order() {
        let configs = vec![
            PipelineConfig::default(),
            PipelineConfig::default().with_split_ratio(1.5),
            PipelineConfig::new(PredictorConfig::NeuralNet(
                NeuralNetOptions::default().with_epochs(20),
            )),
        ];

        let results = evaluate_many(&sales(), &configs);

        assert_eq!(results.len(), 3);
        assert!(results[0].is_ok());
        assert!(matches!(results[1], Err(ForecastError::ConfigError(_))));
        assert!(results[2].is_ok());
    }
}
