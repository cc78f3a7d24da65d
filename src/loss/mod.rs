pub mod nll;

pub use nll::NllLoss;

use crate::error::Result;
use crate::math::matrix::Matrix;

/// A loss over a batch of log-probabilities and integer class labels.
pub trait Loss {
    /// Scalar loss for the batch.
    fn loss(&self, log_probs: &Matrix, labels: &[usize]) -> Result<f64>;

    /// Gradient of `loss` with respect to `log_probs`, same shape.
    fn gradient(&self, log_probs: &Matrix, labels: &[usize]) -> Result<Matrix>;
}
