use std::collections::BTreeMap;

use rand::rngs::StdRng;
use rand::SeedableRng;
use tracing::debug;

use crate::activation::activation::{log_softmax, log_softmax_backward, relu, relu_backward};
use crate::error::{Error, Result};
use crate::layers::dense::Dense;
use crate::layers::dropout::Dropout;
use crate::math::matrix::Matrix;
use crate::network::config::NetworkConfig;

/// Named parameter snapshot, keyed `hidden_layers.{i}.weight`,
/// `hidden_layers.{i}.bias`, `output.weight` and `output.bias`.
pub type StateDict = BTreeMap<String, Matrix>;

#[derive(Debug, Clone)]
struct Hidden {
    linear: Dense,
    dropout: Dropout,
    pre_activation: Option<Matrix>,
}

/// Fully-connected classifier: `[Linear → ReLU → Dropout]* → Linear →
/// LogSoftmax`.
///
/// A new network starts in training mode. Dropout is only active in
/// training mode; `predict` always runs as if in evaluation mode.
#[derive(Debug, Clone)]
pub struct Network {
    config: NetworkConfig,
    hidden: Vec<Hidden>,
    output: Dense,
    training: bool,
    rng: StdRng,
    log_probs: Option<Matrix>,
}

impl Network {
    /// Builds a network with entropy-seeded initialisation and dropout.
    pub fn new(config: NetworkConfig) -> Result<Network> {
        Network::build(config, StdRng::from_entropy())
    }

    /// Builds a network whose initial weights and dropout masks are fully
    /// determined by `seed`.
    pub fn with_seed(config: NetworkConfig, seed: u64) -> Result<Network> {
        Network::build(config, StdRng::seed_from_u64(seed))
    }

    /// Shorthand for `Network::new(NetworkConfig::new(..)?)`.
    pub fn from_sizes(
        input_size: usize,
        output_size: usize,
        hidden_layers: &[usize],
        dropout: f64,
    ) -> Result<Network> {
        Network::new(NetworkConfig::new(input_size, output_size, hidden_layers.to_vec(), dropout)?)
    }

    fn build(config: NetworkConfig, mut rng: StdRng) -> Result<Network> {
        config.validate()?;
        let shapes = config.layer_shapes();
        let (hidden_shapes, output_shape) = shapes.split_at(shapes.len() - 1);

        let hidden = hidden_shapes.iter()
            .map(|&(fan_in, fan_out)| Hidden {
                linear: Dense::new(fan_in, fan_out, &mut rng),
                dropout: Dropout::new(config.dropout),
                pre_activation: None,
            })
            .collect();
        let output = Dense::new(output_shape[0].0, output_shape[0].1, &mut rng);

        let network = Network {
            config,
            hidden,
            output,
            training: true,
            rng,
            log_probs: None,
        };
        debug!(
            input = network.config.input_size,
            output = network.config.output_size,
            hidden = ?network.config.hidden_layers,
            parameters = network.parameter_count(),
            "built network"
        );
        Ok(network)
    }

    pub fn config(&self) -> &NetworkConfig {
        &self.config
    }

    /// Switches to training mode (dropout active).
    pub fn train(&mut self) {
        self.training = true;
    }

    /// Switches to evaluation mode (dropout disabled).
    pub fn eval(&mut self) {
        self.training = false;
    }

    pub fn is_training(&self) -> bool {
        self.training
    }

    fn check_input(&self, input: &Matrix) -> Result<()> {
        input.check_consistent("network input")?;
        if input.cols != self.config.input_size {
            return Err(Error::shape(
                "network input",
                vec![input.rows, self.config.input_size],
                input.dims(),
            ));
        }
        Ok(())
    }

    /// Forward pass returning log-probabilities of shape
    /// (batch, output_size); stores what `backward` needs.
    pub fn forward(&mut self, input: &Matrix) -> Result<Matrix> {
        self.check_input(input)?;
        let training = self.training;

        let mut current = input.clone();
        for layer in &mut self.hidden {
            let z = layer.linear.forward(&current);
            let a = relu(&z);
            current = if training {
                layer.dropout.forward(&a, &mut self.rng)
            } else {
                layer.dropout.clear_cache();
                a
            };
            layer.pre_activation = Some(z);
        }
        let log_probs = log_softmax(&self.output.forward(&current));
        self.log_probs = Some(log_probs.clone());
        Ok(log_probs)
    }

    /// Evaluation-mode forward pass that touches no cached state.
    pub fn predict(&self, input: &Matrix) -> Result<Matrix> {
        self.check_input(input)?;
        let mut current = input.clone();
        for layer in &self.hidden {
            current = relu(&layer.linear.infer(&current));
        }
        Ok(log_softmax(&self.output.infer(&current)))
    }

    /// Back-propagates `grad` (dLoss/dLogProbs, same shape as the last
    /// forward output) and accumulates parameter gradients.
    ///
    /// Consumes the cached forward pass: a second call without another
    /// `forward` fails with `Error::NoForwardPass`.
    pub fn backward(&mut self, grad: &Matrix) -> Result<()> {
        let log_probs = self.log_probs.take().ok_or(Error::NoForwardPass)?;
        if grad.shape() != log_probs.shape() {
            self.clear_cache();
            return Err(Error::shape("loss gradient", log_probs.dims(), grad.dims()));
        }

        let delta = log_softmax_backward(grad, &log_probs);
        let mut delta = self.output.backward(&delta).ok_or(Error::NoForwardPass)?;

        for layer in self.hidden.iter_mut().rev() {
            let z = layer.pre_activation.take().ok_or(Error::NoForwardPass)?;
            delta = layer.dropout.backward(&delta);
            delta = relu_backward(&delta, &z);
            delta = layer.linear.backward(&delta).ok_or(Error::NoForwardPass)?;
        }

        self.clear_cache();
        Ok(())
    }

    pub(crate) fn clear_cache(&mut self) {
        self.log_probs = None;
        self.output.clear_cache();
        for layer in &mut self.hidden {
            layer.linear.clear_cache();
            layer.dropout.clear_cache();
            layer.pre_activation = None;
        }
    }

    /// Resets every accumulated gradient to zero.
    pub fn zero_grad(&mut self) {
        for layer in &mut self.hidden {
            layer.linear.zero_grad();
        }
        self.output.zero_grad();
    }

    fn layers(&self) -> impl Iterator<Item = (String, &Dense)> {
        self.hidden.iter()
            .enumerate()
            .map(|(i, h)| (format!("hidden_layers.{}", i), &h.linear))
            .chain(std::iter::once(("output".to_string(), &self.output)))
    }

    /// Parameters with their names, hidden layers first, weight before bias.
    pub fn parameters(&self) -> Vec<(String, &Matrix)> {
        self.layers()
            .flat_map(|(prefix, layer)| {
                [
                    (format!("{}.weight", prefix), &layer.weights),
                    (format!("{}.bias", prefix), &layer.biases),
                ]
            })
            .collect()
    }

    /// Gradients in the same order and with the same names as `parameters`.
    pub fn gradients(&self) -> Vec<(String, &Matrix)> {
        self.layers()
            .flat_map(|(prefix, layer)| {
                [
                    (format!("{}.weight", prefix), &layer.weights_grad),
                    (format!("{}.bias", prefix), &layer.biases_grad),
                ]
            })
            .collect()
    }

    /// (parameter, gradient) pairs in `parameters` order, for optimizers.
    pub fn parameters_mut(&mut self) -> Vec<(&mut Matrix, &Matrix)> {
        self.hidden.iter_mut()
            .map(|h| &mut h.linear)
            .chain(std::iter::once(&mut self.output))
            .flat_map(|layer| layer.parameters_mut())
            .collect()
    }

    pub fn parameter_count(&self) -> usize {
        self.hidden.iter().map(|h| h.linear.parameter_count()).sum::<usize>()
            + self.output.parameter_count()
    }

    /// Fails on the first gradient holding a NaN or infinity.
    pub fn check_gradients(&self) -> Result<()> {
        match self.gradients().into_iter().find(|(_, g)| !g.is_finite()) {
            Some((parameter, _)) => Err(Error::NonFiniteGradient { parameter }),
            None => Ok(()),
        }
    }

    /// Copies every parameter into a named snapshot.
    pub fn state_dict(&self) -> StateDict {
        self.parameters()
            .into_iter()
            .map(|(name, m)| (name, m.clone()))
            .collect()
    }

    /// Replaces every parameter with the matching entry of `state`.
    ///
    /// Names and shapes must match exactly; on any disagreement nothing is
    /// modified and a shape-mismatch error names the offending parameter.
    pub fn load_state_dict(&mut self, state: &StateDict) -> Result<()> {
        let expected: Vec<(String, Vec<usize>)> = self.parameters()
            .into_iter()
            .map(|(name, m)| (name, m.dims()))
            .collect();

        for (name, dims) in &expected {
            let context = format!("parameter `{}`", name);
            let given = state.get(name)
                .ok_or_else(|| Error::shape(context.clone(), dims.clone(), vec![]))?;
            given.check_consistent(&context)?;
            if &given.dims() != dims {
                return Err(Error::shape(context, dims.clone(), given.dims()));
            }
        }
        if let Some((name, m)) = state.iter().find(|(k, _)| !expected.iter().any(|(n, _)| n == *k)) {
            return Err(Error::shape(format!("parameter `{}`", name), vec![], m.dims()));
        }

        let names: Vec<String> = expected.into_iter().map(|(name, _)| name).collect();
        for (name, (param, _)) in names.iter().zip(self.parameters_mut()) {
            *param = state[name].clone();
        }
        Ok(())
    }
}
