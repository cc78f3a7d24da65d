use rand::Rng;

use crate::math::matrix::Matrix;

/// Fully-connected layer computing `x · W + b` on a batch of rows.
///
/// Gradients accumulate across `backward` calls until `zero_grad`, so a
/// caller can sum contributions from several batches before stepping.
#[derive(Debug, Clone)]
pub struct Dense {
    pub input_size: usize,
    pub size: usize,
    /// Shape (input_size, size).
    pub weights: Matrix,
    /// Shape (1, size).
    pub biases: Matrix,
    pub weights_grad: Matrix,
    pub biases_grad: Matrix,
    input: Option<Matrix>,  // input of the last training forward, needed for dW
}

impl Dense {
    /// He-initialised weights, zero biases.
    pub fn new<R: Rng>(input_size: usize, size: usize, rng: &mut R) -> Dense {
        Dense {
            input_size,
            size,
            weights: Matrix::he(input_size, size, rng),
            biases: Matrix::zeros(1, size),
            weights_grad: Matrix::zeros(input_size, size),
            biases_grad: Matrix::zeros(1, size),
            input: None,
        }
    }

    /// Forward pass that remembers its input for `backward`.
    pub fn forward(&mut self, input: &Matrix) -> Matrix {
        let out = self.infer(input);
        self.input = Some(input.clone());
        out
    }

    /// Forward pass without caching.
    pub fn infer(&self, input: &Matrix) -> Matrix {
        (input * &self.weights).add_row(&self.biases)
    }

    /// Accumulates `dW = xᵀ·δ` and `db = Σδ` and returns `δ·Wᵀ`, the error
    /// signal for whatever fed this layer. Returns `None` when no input was
    /// cached by `forward`.
    pub fn backward(&mut self, delta: &Matrix) -> Option<Matrix> {
        let input = self.input.as_ref()?;
        let weights_grad = &input.transpose() * delta;
        self.weights_grad.add_assign(&weights_grad);
        self.biases_grad.add_assign(&delta.sum_rows());
        Some(delta * &self.weights.transpose())
    }

    pub fn zero_grad(&mut self) {
        self.weights_grad.fill(0.0);
        self.biases_grad.fill(0.0);
    }

    /// Drops the cached forward input.
    pub fn clear_cache(&mut self) {
        self.input = None;
    }

    /// (parameter, gradient) pairs in weight, bias order.
    pub fn parameters_mut(&mut self) -> [(&mut Matrix, &Matrix); 2] {
        [
            (&mut self.weights, &self.weights_grad),
            (&mut self.biases, &self.biases_grad),
        ]
    }

    pub fn parameter_count(&self) -> usize {
        self.input_size * self.size + self.size
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn backward_accumulates_until_zeroed() {
        let mut layer = Dense::new(2, 3, &mut StdRng::seed_from_u64(1));
        let x = Matrix::from_data(vec![vec![1.0, 2.0]]).unwrap();
        let delta = Matrix::filled(1, 3, 1.0);

        assert!(layer.backward(&delta).is_none());

        layer.forward(&x);
        let back = layer.backward(&delta).unwrap();
        assert_eq!(back.shape(), (1, 2));
        assert_eq!(layer.biases_grad.data, vec![vec![1.0, 1.0, 1.0]]);
        assert_eq!(layer.weights_grad.data[1], vec![2.0, 2.0, 2.0]);

        layer.backward(&delta).unwrap();
        assert_eq!(layer.biases_grad.data, vec![vec![2.0, 2.0, 2.0]]);

        layer.zero_grad();
        assert!(layer.weights_grad.iter().all(|&g| g == 0.0));
    }
}
