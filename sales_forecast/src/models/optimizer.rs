//! Weight update rules for gradient-trained models

use crate::config::OptimizerKind;
use ndarray::{Array1, Array2};

/// Applies one gradient step to a layer's parameters.
///
/// Each layer owns its own optimizer, so moment estimates never mix across layers.
pub trait Optimizer: Send + Sync {
    /// Update weights given gradients
    fn update_weights(&mut self, weights: &mut Array2<f64>, gradients: &Array2<f64>);

    /// Update biases given gradients
    fn update_biases(&mut self, biases: &mut Array1<f64>, gradients: &Array1<f64>);
}

/// Gradient descent with optional momentum
#[derive(Debug, Clone)]
pub struct Sgd {
    learning_rate: f64,
    momentum: f64,
    velocity_w: Option<Array2<f64>>,
    velocity_b: Option<Array1<f64>>,
}

impl Sgd {
    pub fn new(learning_rate: f64, momentum: f64) -> Self {
        Self {
            learning_rate,
            momentum,
            velocity_w: None,
            velocity_b: None,
        }
    }
}

impl Optimizer for Sgd {
    fn update_weights(&mut self, weights: &mut Array2<f64>, gradients: &Array2<f64>) {
        if self.momentum > 0.0 {
            let v = self
                .velocity_w
                .get_or_insert_with(|| Array2::zeros(weights.dim()));
            *v = &*v * self.momentum - gradients * self.learning_rate;
            *weights += &*v;
        } else {
            weights.scaled_add(-self.learning_rate, gradients);
        }
    }

    fn update_biases(&mut self, biases: &mut Array1<f64>, gradients: &Array1<f64>) {
        if self.momentum > 0.0 {
            let v = self
                .velocity_b
                .get_or_insert_with(|| Array1::zeros(biases.len()));
            *v = &*v * self.momentum - gradients * self.learning_rate;
            *biases += &*v;
        } else {
            biases.scaled_add(-self.learning_rate, gradients);
        }
    }
}

/// Adaptive moment estimation
#[derive(Debug, Clone)]
pub struct Adam {
    learning_rate: f64,
    beta1: f64,
    beta2: f64,
    epsilon: f64,
    t: i32,
    m_w: Option<Array2<f64>>,
    v_w: Option<Array2<f64>>,
    m_b: Option<Array1<f64>>,
    v_b: Option<Array1<f64>>,
}

impl Adam {
    pub fn new(learning_rate: f64, beta1: f64, beta2: f64, epsilon: f64) -> Self {
        Self {
            learning_rate,
            beta1,
            beta2,
            epsilon,
            t: 0,
            m_w: None,
            v_w: None,
            m_b: None,
            v_b: None,
        }
    }

    /// Bias-corrected step for one parameter tensor
    fn step<D: ndarray::Dimension>(
        &self,
        m: &mut ndarray::Array<f64, D>,
        v: &mut ndarray::Array<f64, D>,
        gradients: &ndarray::Array<f64, D>,
    ) -> ndarray::Array<f64, D> {
        let (beta1, beta2) = (self.beta1, self.beta2);

        // Update biased moment estimates
        m.zip_mut_with(gradients, |m, g| *m = beta1 * *m + (1.0 - beta1) * g);
        v.zip_mut_with(gradients, |v, g| *v = beta2 * *v + (1.0 - beta2) * g * g);

        // Compute bias-corrected update
        let correction1 = 1.0 - beta1.powi(self.t);
        let correction2 = 1.0 - beta2.powi(self.t);
        let mut update = m.mapv(|m| m / correction1);
        update.zip_mut_with(&*v, |u, v| {
            *u = self.learning_rate * *u / ((v / correction2).sqrt() + self.epsilon)
        });
        update
    }
}

impl Optimizer for Adam {
    fn update_weights(&mut self, weights: &mut Array2<f64>, gradients: &Array2<f64>) {
        // One time step per layer update; biases reuse it
        self.t += 1;

        let mut m = self
            .m_w
            .take()
            .unwrap_or_else(|| Array2::zeros(weights.dim()));
        let mut v = self
            .v_w
            .take()
            .unwrap_or_else(|| Array2::zeros(weights.dim()));

        let update = self.step(&mut m, &mut v, gradients);
        *weights -= &update;

        self.m_w = Some(m);
        self.v_w = Some(v);
    }

    fn update_biases(&mut self, biases: &mut Array1<f64>, gradients: &Array1<f64>) {
        if self.t == 0 {
            self.t = 1;
        }

        let mut m = self
            .m_b
            .take()
            .unwrap_or_else(|| Array1::zeros(biases.len()));
        let mut v = self
            .v_b
            .take()
            .unwrap_or_else(|| Array1::zeros(biases.len()));

        let update = self.step(&mut m, &mut v, gradients);
        *biases -= &update;

        self.m_b = Some(m);
        self.v_b = Some(v);
    }
}

impl OptimizerKind {
    /// Fresh optimizer state for one layer
    pub fn build(&self) -> Box<dyn Optimizer> {
        match *self {
            OptimizerKind::Adam {
                learning_rate,
                beta1,
                beta2,
                epsilon,
            } => Box::new(Adam::new(learning_rate, beta1, beta2, epsilon)),
            OptimizerKind::Sgd {
                learning_rate,
                momentum,
            } => Box::new(Sgd::new(learning_rate, momentum)),
        }
    }
}
