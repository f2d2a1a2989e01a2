//! Configuration for forecast evaluation runs
//!
//! Every type here derives serde traits with `#[serde(default)]`, so a JSON
//! document only needs the fields that differ from the defaults:
//!
//! ```rust
//! use sales_forecast::config::{PipelineConfig, PredictorConfig};
//!
//! let config = PipelineConfig::from_json_str(
//!     r#"{ "split_ratio": 0.75, "predictor": { "kind": "neural_net", "epochs": 50 } }"#,
//! )
//! .unwrap();
//!
//! assert!(matches!(config.predictor, PredictorConfig::NeuralNet(_)));
//! ```

use crate::error::{ForecastError, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Gradient descent variant used to train the neural network
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum OptimizerKind {
    /// Adaptive moment estimation
    Adam {
        learning_rate: f64,
        #[serde(default = "default_beta1")]
        beta1: f64,
        #[serde(default = "default_beta2")]
        beta2: f64,
        #[serde(default = "default_epsilon")]
        epsilon: f64,
    },
    /// Plain gradient descent with optional momentum
    Sgd {
        learning_rate: f64,
        #[serde(default)]
        momentum: f64,
    },
}

fn default_beta1() -> f64 {
    0.9
}

fn default_beta2() -> f64 {
    0.999
}

fn default_epsilon() -> f64 {
    1e-8
}

impl Default for OptimizerKind {
    fn default() -> Self {
        Self::adam(0.01)
    }
}

impl OptimizerKind {
    /// Adam with the usual moment decay rates
    pub fn adam(learning_rate: f64) -> Self {
        OptimizerKind::Adam {
            learning_rate,
            beta1: default_beta1(),
            beta2: default_beta2(),
            epsilon: default_epsilon(),
        }
    }

    /// Gradient descent without momentum
    pub fn sgd(learning_rate: f64) -> Self {
        OptimizerKind::Sgd {
            learning_rate,
            momentum: 0.0,
        }
    }

    /// Step size of the optimizer
    pub fn learning_rate(&self) -> f64 {
        match self {
            OptimizerKind::Adam { learning_rate, .. } | OptimizerKind::Sgd { learning_rate, .. } => {
                *learning_rate
            }
        }
    }

    /// Check that every hyperparameter is usable
    pub fn validate(&self) -> Result<()> {
        let lr = self.learning_rate();
        if !(lr.is_finite() && lr > 0.0) {
            return Err(ForecastError::ConfigError(format!(
                "Learning rate must be positive and finite, got {}",
                lr
            )));
        }

        match *self {
            OptimizerKind::Adam {
                beta1,
                beta2,
                epsilon,
                ..
            } => {
                if !(0.0..1.0).contains(&beta1) || !(0.0..1.0).contains(&beta2) {
                    return Err(ForecastError::ConfigError(
                        "Adam betas must be in [0, 1)".to_string(),
                    ));
                }
                if !(epsilon.is_finite() && epsilon > 0.0) {
                    return Err(ForecastError::ConfigError(
                        "Adam epsilon must be positive".to_string(),
                    ));
                }
            }
            OptimizerKind::Sgd { momentum, .. } => {
                if !(0.0..1.0).contains(&momentum) {
                    return Err(ForecastError::ConfigError(
                        "SGD momentum must be in [0, 1)".to_string(),
                    ));
                }
            }
        }

        Ok(())
    }
}

/// Options of the single-hidden-layer network
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct NeuralNetOptions {
    /// Width of the hidden ReLU layer
    pub hidden_units: usize,
    /// Number of full-batch training passes
    pub epochs: usize,
    /// Weight update rule
    pub optimizer: OptimizerKind,
    /// Seed for weight initialisation
    pub seed: u64,
}

impl Default for NeuralNetOptions {
    fn default() -> Self {
        Self {
            hidden_units: 16,
            epochs: 200,
            optimizer: OptimizerKind::default(),
            seed: 42,
        }
    }
}

impl NeuralNetOptions {
    pub fn with_hidden_units(mut self, hidden_units: usize) -> Self {
        self.hidden_units = hidden_units;
        self
    }

    pub fn with_epochs(mut self, epochs: usize) -> Self {
        self.epochs = epochs;
        self
    }

    pub fn with_optimizer(mut self, optimizer: OptimizerKind) -> Self {
        self.optimizer = optimizer;
        self
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    /// Check the network shape and optimizer
    pub fn validate(&self) -> Result<()> {
        if self.hidden_units == 0 {
            return Err(ForecastError::ConfigError(
                "Hidden layer must have at least one unit".to_string(),
            ));
        }
        if self.epochs == 0 {
            return Err(ForecastError::ConfigError(
                "Training needs at least one epoch".to_string(),
            ));
        }
        self.optimizer.validate()
    }
}

/// Which predictor to fit, with its variant-specific options
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum PredictorConfig {
    /// Ordinary least squares on a single feature
    #[default]
    SimpleLinear,
    /// Ordinary least squares on every feature
    Multivariate,
    /// Feed-forward network with one hidden layer
    NeuralNet(NeuralNetOptions),
}

/// How rows are ordered before the train/test split
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShuffleMode {
    /// Keep time order: the test set is the most recent observations
    Ordered,
    /// Uniform permutation drawn from the given seed
    Seeded(u64),
}

/// Settings of one evaluation run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    /// Fraction of observations used for training, in (0, 1)
    pub split_ratio: f64,
    /// Model to evaluate
    pub predictor: PredictorConfig,
    /// Shuffle rows before splitting; requires `shuffle_seed`
    pub shuffle_before_split: bool,
    /// Seed of the shuffle permutation
    pub shuffle_seed: Option<u64>,
    /// Raw feature values for the step after the dataset; extrapolated when absent
    pub next_features: Option<Vec<f64>>,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            split_ratio: 0.8,
            predictor: PredictorConfig::default(),
            shuffle_before_split: false,
            shuffle_seed: None,
            next_features: None,
        }
    }
}

impl PipelineConfig {
    /// Default settings for the given predictor
    pub fn new(predictor: PredictorConfig) -> Self {
        Self {
            predictor,
            ..Self::default()
        }
    }

    pub fn with_split_ratio(mut self, split_ratio: f64) -> Self {
        self.split_ratio = split_ratio;
        self
    }

    /// Shuffle before splitting, with an explicit seed
    pub fn with_shuffle(mut self, seed: u64) -> Self {
        self.shuffle_before_split = true;
        self.shuffle_seed = Some(seed);
        self
    }

    pub fn with_next_features(mut self, features: Vec<f64>) -> Self {
        self.next_features = Some(features);
        self
    }

    /// Resolved row ordering; errors when shuffling is requested without a seed
    pub fn shuffle_mode(&self) -> Result<ShuffleMode> {
        match (self.shuffle_before_split, self.shuffle_seed) {
            (false, _) => Ok(ShuffleMode::Ordered),
            (true, Some(seed)) => Ok(ShuffleMode::Seeded(seed)),
            (true, None) => Err(ForecastError::ConfigError(
                "Shuffling before the split requires an explicit shuffle_seed".to_string(),
            )),
        }
    }

    /// Check every setting
    pub fn validate(&self) -> Result<()> {
        if !(self.split_ratio > 0.0 && self.split_ratio < 1.0) {
            return Err(ForecastError::ConfigError(format!(
                "Split ratio must be between 0 and 1 (exclusive), got {}",
                self.split_ratio
            )));
        }
        self.shuffle_mode()?;

        if let Some(features) = &self.next_features {
            if features.iter().any(|v| !v.is_finite()) {
                return Err(ForecastError::ConfigError(
                    "Next-step features must be finite".to_string(),
                ));
            }
        }

        if let PredictorConfig::NeuralNet(options) = &self.predictor {
            options.validate()?;
        }

        Ok(())
    }

    /// Parse and validate a JSON configuration
    pub fn from_json_str(json: &str) -> Result<Self> {
        let config: Self =
            serde_json::from_str(json).map_err(|e| ForecastError::ConfigError(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Read, parse and validate a JSON configuration file
    pub fn from_json_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let json = std::fs::read_to_string(path)?;
        Self::from_json_str(&json)
    }

    /// Serialize to pretty-printed JSON
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}
