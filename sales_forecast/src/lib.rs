//! # Sales Forecast
//!
//! A Rust library for evaluating sales forecasting models on tabular sales data.
//!
//! ## Features
//!
//! - Sales data handling (column-wise aggregates, daily sales records, CSV and JSON input)
//! - Min-max scaling fitted on the full dataset
//! - Time-ordered or seeded-shuffled train/test splits
//! - Predictors (Simple Linear Regression, Multivariate Linear Regression, Neural Network)
//! - Strict evaluation metrics (MSE, RMSE, MAE, MAPE, R²)
//! - Next-step sales prediction
//! - Parallel evaluation of several configurations over the same data
//!
//! ## Predictors
//!
//! The predictor is chosen through the `PredictorConfig` enum:
//!
//! ```rust
//! # use sales_forecast::config::NeuralNetOptions;
//! pub enum PredictorConfig {
//!     SimpleLinear,
//!     Multivariate,
//!     NeuralNet(NeuralNetOptions),
//! }
//! ```
//!
//! - **SimpleLinear**: ordinary least squares on exactly one feature
//! - **Multivariate**: ordinary least squares on every feature column
//! - **NeuralNet**: one ReLU hidden layer, trained full-batch from a seeded initialisation
//!
//! ## Quick Start
//!
//! ```rust
//! use sales_forecast::config::PipelineConfig;
//! use sales_forecast::data::Dataset;
//! use sales_forecast::pipeline::ForecastPipeline;
//!
//! // Daily sales, indexed by day
//! let data = Dataset::from_series(&[100.0, 110.0, 105.0, 120.0, 130.0, 125.0, 140.0])?;
//!
//! // Evaluate a simple linear trend on the last 20% of the data
//! let pipeline = ForecastPipeline::new(PipelineConfig::default())?;
//! let result = pipeline.evaluate(&data)?;
//!
//! println!("{}", result.metrics());
//! println!("Next day: {:.2}", result.predicted_value());
//! # Ok::<(), sales_forecast::ForecastError>(())
//! ```

pub mod cancel;
pub mod config;
pub mod data;
pub mod error;
pub mod metrics;
pub mod models;
pub mod pipeline;
pub mod split;

// Re-export commonly used types
pub use crate::cancel::CancellationToken;
pub use crate::config::{NeuralNetOptions, OptimizerKind, PipelineConfig, PredictorConfig};
pub use crate::data::{DataLoader, Dataset, Observation};
pub use crate::error::{ForecastError, Result};
pub use crate::metrics::{Metrics, MetricsEngine};
pub use crate::models::{EpochLoss, FittedModel, Holdout, Predictor};
pub use crate::pipeline::{evaluate_many, ForecastPipeline, ForecastResult};

// Version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
pub const NAME: &str = env!("CARGO_PKG_NAME");
