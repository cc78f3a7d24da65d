use crate::math::matrix::Matrix;
use crate::network::network::Network;
use crate::optim::Optimizer;

/// Stochastic gradient descent with optional classical momentum.
///
/// With `momentum = 0` the update is `θ ← θ - lr·g`; otherwise
/// `v ← μ·v + g`, `θ ← θ - lr·v`.
#[derive(Debug, Clone)]
pub struct Sgd {
    pub learning_rate: f64,
    pub momentum: f64,
    velocity: Vec<Matrix>,
}

impl Sgd {
    pub fn new(learning_rate: f64) -> Sgd {
        Sgd::with_momentum(learning_rate, 0.0)
    }

    pub fn with_momentum(learning_rate: f64, momentum: f64) -> Sgd {
        Sgd { learning_rate, momentum, velocity: Vec::new() }
    }
}

impl Optimizer for Sgd {
    fn step(&mut self, network: &mut Network) {
        let lr = self.learning_rate;
        let momentum = self.momentum;
        let mut params = network.parameters_mut();

        if momentum == 0.0 {
            for (param, grad) in params.iter_mut() {
                for (p, g) in param.iter_mut().zip(grad.iter()) {
                    *p -= lr * g;
                }
            }
            return;
        }

        if self.velocity.len() != params.len() {
            self.velocity = params.iter()
                .map(|(param, _)| Matrix::zeros(param.rows, param.cols))
                .collect();
        }
        for ((param, grad), velocity) in params.iter_mut().zip(self.velocity.iter_mut()) {
            for ((p, g), v) in param.iter_mut().zip(grad.iter()).zip(velocity.iter_mut()) {
                *v = momentum * *v + g;
                *p -= lr * *v;
            }
        }
    }

    fn learning_rate(&self) -> f64 {
        self.learning_rate
    }

    fn set_learning_rate(&mut self, learning_rate: f64) {
        self.learning_rate = learning_rate;
    }
}
