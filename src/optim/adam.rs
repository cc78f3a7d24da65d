use crate::math::matrix::Matrix;
use crate::network::network::Network;
use crate::optim::Optimizer;

/// Adam optimizer (Adaptive Moment Estimation).
#[derive(Debug, Clone)]
pub struct Adam {
    pub learning_rate: f64,
    pub beta1: f64,
    pub beta2: f64,
    pub epsilon: f64,
    t: i32,
    m: Vec<Matrix>, // first moment
    v: Vec<Matrix>, // second moment
}

impl Adam {
    pub fn new(learning_rate: f64, beta1: f64, beta2: f64, epsilon: f64) -> Adam {
        Adam { learning_rate, beta1, beta2, epsilon, t: 0, m: Vec::new(), v: Vec::new() }
    }

    /// Adam with β1 = 0.9, β2 = 0.999, ε = 1e-8.
    pub fn default_params(learning_rate: f64) -> Adam {
        Adam::new(learning_rate, 0.9, 0.999, 1e-8)
    }
}

impl Optimizer for Adam {
    fn step(&mut self, network: &mut Network) {
        let mut params = network.parameters_mut();
        if self.m.len() != params.len() {
            self.m = params.iter().map(|(p, _)| Matrix::zeros(p.rows, p.cols)).collect();
            self.v = self.m.clone();
            self.t = 0;
        }
        self.t += 1;

        let (beta1, beta2, eps) = (self.beta1, self.beta2, self.epsilon);
        let bias1 = 1.0 - beta1.powi(self.t);
        let bias2 = 1.0 - beta2.powi(self.t);
        let lr = self.learning_rate;

        for (((param, grad), m_buf), v_buf) in params.iter_mut()
            .zip(self.m.iter_mut())
            .zip(self.v.iter_mut())
        {
            for (((p, g), m), v) in param.iter_mut()
                .zip(grad.iter())
                .zip(m_buf.iter_mut())
                .zip(v_buf.iter_mut())
            {
                *m = beta1 * *m + (1.0 - beta1) * g;
                *v = beta2 * *v + (1.0 - beta2) * g * g;
                let m_hat = *m / bias1;
                let v_hat = *v / bias2;
                *p -= lr * m_hat / (v_hat.sqrt() + eps);
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
