pub mod adam;
pub mod sgd;

pub use adam::Adam;
pub use sgd::Sgd;

use crate::network::network::Network;

/// A gradient-descent update rule over a network's parameters.
pub trait Optimizer {
    /// Applies one update from the gradients currently held by `network`.
    fn step(&mut self, network: &mut Network);

    /// Clears accumulated gradients before the next backward pass.
    fn zero_grad(&mut self, network: &mut Network) {
        network.zero_grad();
    }

    fn learning_rate(&self) -> f64;

    fn set_learning_rate(&mut self, learning_rate: f64);
}
