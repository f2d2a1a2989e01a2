//! Feed-forward network with one ReLU hidden layer and a linear output
//!
//! Training is full-batch gradient descent on mean squared error. Weights are
//! drawn from a seeded generator, so the same options and data always produce
//! the same fitted model.

use crate::cancel::CancellationToken;
use crate::config::NeuralNetOptions;
use crate::error::{ForecastError, Result};
use crate::models::{
    check_arity, check_training_data, finite_prediction, EpochLoss, FittedModel, Holdout, Predictor,
};
use ndarray::{Array1, Array2, Axis};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rand_distr::Normal;
use tracing::debug;

/// Epochs between loss reports
const LOG_EVERY: usize = 50;

#[derive(Debug, Clone, Copy, PartialEq)]
enum Activation {
    Relu,
    Linear,
}

impl Activation {
    fn apply(self, z: f64) -> f64 {
        match self {
            Activation::Relu => z.max(0.0),
            Activation::Linear => z,
        }
    }

    fn derivative(self, z: f64) -> f64 {
        match self {
            Activation::Relu => {
                if z > 0.0 {
                    1.0
                } else {
                    0.0
                }
            }
            Activation::Linear => 1.0,
        }
    }
}

/// Fully connected layer: `activation(input . weights + biases)`
#[derive(Debug, Clone)]
struct DenseLayer {
    /// Weight matrix (input_size x output_size)
    weights: Array2<f64>,
    /// Bias vector (output_size)
    biases: Array1<f64>,
    activation: Activation,
}

/// Intermediate values kept from the forward pass for backpropagation
struct LayerCache {
    z: Array2<f64>,
    output: Array2<f64>,
}

impl DenseLayer {
    /// He-normal weights for ReLU layers, Xavier-normal otherwise; zero biases
    fn new(
        input_size: usize,
        output_size: usize,
        activation: Activation,
        rng: &mut StdRng,
    ) -> Result<Self> {
        let variance = match activation {
            Activation::Relu => 2.0 / input_size as f64,
            Activation::Linear => 2.0 / (input_size + output_size) as f64,
        };
        let normal = Normal::new(0.0, variance.sqrt())
            .map_err(|e| ForecastError::NumericalError(format!("Weight initialisation: {}", e)))?;

        Ok(Self {
            weights: Array2::from_shape_fn((input_size, output_size), |_| rng.sample(normal)),
            biases: Array1::zeros(output_size),
            activation,
        })
    }

    fn forward(&self, input: &Array2<f64>) -> LayerCache {
        let z = input.dot(&self.weights) + &self.biases;
        let activation = self.activation;
        let output = z.mapv(|v| activation.apply(v));

        LayerCache { z, output }
    }

    /// Returns (input_gradient, weight_gradient, bias_gradient)
    fn backward(
        &self,
        input: &Array2<f64>,
        cache: &LayerCache,
        output_gradient: &Array2<f64>,
    ) -> (Array2<f64>, Array2<f64>, Array1<f64>) {
        let activation = self.activation;
        let delta = output_gradient * &cache.z.mapv(|v| activation.derivative(v));

        let weight_gradient = input.t().dot(&delta);
        let bias_gradient = delta.sum_axis(Axis(0));
        let input_gradient = delta.dot(&self.weights.t());

        (input_gradient, weight_gradient, bias_gradient)
    }
}

/// Neural network regressor
#[derive(Debug, Clone)]
pub struct NeuralNet {
    /// Name of the model
    name: String,
    /// Network shape and training schedule
    options: NeuralNetOptions,
}

/// Trained network
#[derive(Debug, Clone)]
pub struct TrainedNeuralNet {
    /// Name of the model
    name: String,
    hidden: DenseLayer,
    output: DenseLayer,
    /// Features per input row
    arity: usize,
    /// One entry per completed epoch
    history: Vec<EpochLoss>,
}

impl NeuralNet {
    /// Create a new network predictor
    pub fn new(options: NeuralNetOptions) -> Result<Self> {
        options.validate()?;

        Ok(Self {
            name: format!("Neural Network (hidden={})", options.hidden_units),
            options,
        })
    }

    /// Network shape and training schedule
    pub fn options(&self) -> &NeuralNetOptions {
        &self.options
    }
}

/// Row-major rows as an `n x arity` matrix
fn to_matrix(rows: &[Vec<f64>], arity: usize) -> Result<Array2<f64>> {
    Array2::from_shape_vec((rows.len(), arity), rows.concat())
        .map_err(|e| ForecastError::ValidationError(e.to_string()))
}

fn column(values: &[f64]) -> Array2<f64> {
    Array1::from(values.to_vec()).insert_axis(Axis(1))
}

fn mean_squared(diff: &Array2<f64>) -> f64 {
    diff.mapv(|d| d * d).sum() / diff.nrows() as f64
}

impl NeuralNet {
    fn train(
        &self,
        features: &[Vec<f64>],
        targets: &[f64],
        holdout: Option<Holdout<'_>>,
        cancel: &CancellationToken,
    ) -> Result<TrainedNeuralNet> {
        let arity = check_training_data(features, targets)?;
        let n = features.len();

        let x = to_matrix(features, arity)?;
        let y = column(targets);

        let validation = match holdout {
            Some(h) if !h.features.is_empty() => {
                let holdout_arity = check_training_data(h.features, h.targets)?;
                check_arity(arity, &h.features[0])?;
                Some((to_matrix(h.features, holdout_arity)?, column(h.targets)))
            }
            _ => None,
        };

        let mut rng = StdRng::seed_from_u64(self.options.seed);
        let mut hidden = DenseLayer::new(arity, self.options.hidden_units, Activation::Relu, &mut rng)?;
        let mut output = DenseLayer::new(self.options.hidden_units, 1, Activation::Linear, &mut rng)?;

        let mut hidden_optimizer = self.options.optimizer.build();
        let mut output_optimizer = self.options.optimizer.build();

        let mut history = Vec::new();
        for epoch in 0..self.options.epochs {
            cancel.check()?;

            // Forward pass
            let hidden_cache = hidden.forward(&x);
            let output_cache = output.forward(&hidden_cache.output);

            // Mean squared error and its gradient
            let diff = &output_cache.output - &y;
            let loss = mean_squared(&diff);
            if !loss.is_finite() {
                return Err(ForecastError::NumericalError(format!(
                    "Training loss diverged at epoch {}",
                    epoch
                )));
            }
            let grad = diff * (2.0 / n as f64);

            // Backward pass
            let (grad_hidden, grad_w2, grad_b2) =
                output.backward(&hidden_cache.output, &output_cache, &grad);
            let (_, grad_w1, grad_b1) = hidden.backward(&x, &hidden_cache, &grad_hidden);

            output_optimizer.update_weights(&mut output.weights, &grad_w2);
            output_optimizer.update_biases(&mut output.biases, &grad_b2);
            hidden_optimizer.update_weights(&mut hidden.weights, &grad_w1);
            hidden_optimizer.update_biases(&mut hidden.biases, &grad_b1);

            // Held-out rows are scored with the updated weights
            let val_loss = validation.as_ref().map(|(vx, vy)| {
                let predicted = output.forward(&hidden.forward(vx).output).output;
                mean_squared(&(predicted - vy))
            });

            if epoch % LOG_EVERY == 0 {
                debug!(epoch, loss, ?val_loss, "neural network training");
            }
            history.push(EpochLoss { loss, val_loss });
        }

        let last = history.last().copied();
        debug!(
            epochs = self.options.epochs,
            loss = ?last.map(|e| e.loss),
            val_loss = ?last.and_then(|e| e.val_loss),
            "neural network trained"
        );

        Ok(TrainedNeuralNet {
            name: self.name.clone(),
            hidden,
            output,
            arity,
            history,
        })
    }
}

impl Predictor for NeuralNet {
    type Model = TrainedNeuralNet;

    fn fit(
        &self,
        features: &[Vec<f64>],
        targets: &[f64],
        cancel: &CancellationToken,
    ) -> Result<Self::Model> {
        self.train(features, targets, None, cancel)
    }

    fn fit_with_holdout(
        &self,
        features: &[Vec<f64>],
        targets: &[f64],
        holdout: Holdout<'_>,
        cancel: &CancellationToken,
    ) -> Result<Self::Model> {
        self.train(features, targets, Some(holdout), cancel)
    }

    fn name(&self) -> &str {
        &self.name
    }
}

impl TrainedNeuralNet {
    /// Training loss after the last epoch
    pub fn final_loss(&self) -> f64 {
        self.history.last().map_or(f64::NAN, |e| e.loss)
    }

    /// Training and held-out losses, one entry per epoch
    pub fn history(&self) -> &[EpochLoss] {
        &self.history
    }
}

impl FittedModel for TrainedNeuralNet {
    fn predict(&self, features: &[f64]) -> Result<f64> {
        check_arity(self.arity, features)?;

        let input = Array1::from(features.to_vec()).insert_axis(Axis(0));
        let hidden = self.hidden.forward(&input);
        let output = self.output.forward(&hidden.output);

        finite_prediction(&self.name, output.output[[0, 0]])
    }

    fn arity(&self) -> usize {
        self.arity
    }

    fn name(&self) -> &str {
        &self.name
    }

    fn training_history(&self) -> Option<&[EpochLoss]> {
        Some(&self.history)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::OptimizerKind;

    fn line_data() -> (Vec<Vec<f64>>, Vec<f64>) {
        let x: Vec<Vec<f64>> = (0..10).map(|i| vec![i as f64 / 9.0]).collect();
        let y: Vec<f64> = x.iter().map(|r| 0.2 + 0.6 * r[0]).collect();
        (x, y)
    }

    #[test]
    fn test_learns_linear_relation() {
        let (x, y) = line_data();
        let net = NeuralNet::new(NeuralNetOptions::default().with_epochs(1000)).unwrap();

        let model = net.fit(&x, &y, &CancellationToken::new()).unwrap();

        assert!(model.final_loss() < 1e-2);
        let predicted = model.predict(&[0.5]).unwrap();
        assert!((predicted - 0.5).abs() < 0.15);
    }

    #[test]
    fn test_seeded_training_is_deterministic() {
        let (x, y) = line_data();
        let net = NeuralNet::new(NeuralNetOptions::default().with_epochs(50)).unwrap();
        let cancel = CancellationToken::new();

        let a = net.fit(&x, &y, &cancel).unwrap();
        let b = net.fit(&x, &y, &cancel).unwrap();

        assert_eq!(a.predict(&[0.3]).unwrap(), b.predict(&[0.3]).unwrap());
        assert_eq!(a.final_loss(), b.final_loss());
    }

    #[test]
    fn test_sgd_reduces_loss() {
        let (x, y) = line_data();
        let cancel = CancellationToken::new();
        let options = NeuralNetOptions::default().with_optimizer(OptimizerKind::sgd(0.05));

        let short = NeuralNet::new(options.clone().with_epochs(1))
            .unwrap()
            .fit(&x, &y, &cancel)
            .unwrap();
        let long = NeuralNet::new(options.with_epochs(300))
            .unwrap()
            .fit(&x, &y, &cancel)
            .unwrap();

        assert!(long.final_loss() < short.final_loss());
    }

    #[test]
    fn test_cancellation_stops_training() {
        let (x, y) = line_data();
        let cancel = CancellationToken::new();
        cancel.cancel();

        let result = NeuralNet::new(NeuralNetOptions::default())
            .unwrap()
            .fit(&x, &y, &cancel);

        assert!(matches!(result, Err(ForecastError::Cancelled)));
    }

    #[test]
    fn test_history_records_every_epoch() {
        let (x, y) = line_data();
        let model = NeuralNet::new(NeuralNetOptions::default().with_epochs(120))
            .unwrap()
            .fit(&x, &y, &CancellationToken::new())
            .unwrap();

        let history = model.history();
        assert_eq!(history.len(), 120);
        assert!(history.iter().all(|e| e.val_loss.is_none()));
        assert!(history[119].loss < history[0].loss);
        assert_eq!(model.final_loss(), history[119].loss);
    }

    #[test]
    fn test_holdout_loss_is_tracked() {
        let (x, y) = line_data();
        let holdout_x = vec![vec![0.25], vec![0.75]];
        let holdout_y = vec![0.35, 0.65];
        let holdout = Holdout {
            features: &holdout_x,
            targets: &holdout_y,
        };

        let model = NeuralNet::new(NeuralNetOptions::default().with_epochs(300))
            .unwrap()
            .fit_with_holdout(&x, &y, holdout, &CancellationToken::new())
            .unwrap();

        let history = model.history();
        assert_eq!(history.len(), 300);
        let first = history[0].val_loss.unwrap();
        let last = history[299].val_loss.unwrap();
        assert!(last < first);
    }

    #[test]
    fn test_holdout_arity_checked() {
        let (x, y) = line_data();
        let holdout_x = vec![vec![0.25, 0.5]];
        let holdout = Holdout {
            features: &holdout_x,
            targets: &[0.35],
        };

        let result = NeuralNet::new(NeuralNetOptions::default().with_epochs(5))
            .unwrap()
            .fit_with_holdout(&x, &y, holdout, &CancellationToken::new());

        assert!(matches!(result, Err(ForecastError::ValidationError(_))));
    }

    #[test]
    fn test_invalid_options() {
        assert!(NeuralNet::new(NeuralNetOptions::default().with_epochs(0)).is_err());
    }

    #[test]
    fn test_predict_checks_arity() {
        let (x, y) = line_data();
        let model = NeuralNet::new(NeuralNetOptions::default().with_epochs(5))
            .unwrap()
            .fit(&x, &y, &CancellationToken::new())
            .unwrap();

        assert!(model.predict(&[0.1, 0.2]).is_err());
    }
}
