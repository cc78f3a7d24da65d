use serde::{Serialize, Deserialize};

use crate::error::{Error, Result};

/// Architecture of a fully-connected classifier.
///
/// Fields:
/// - `input_size`    : features per sample (784 for flattened 28×28 images)
/// - `output_size`   : number of classes
/// - `hidden_layers` : widths of the hidden layers, input side first
/// - `dropout`       : drop probability applied after every hidden layer
///                     while training, in `[0, 1)`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NetworkConfig {
    pub input_size: usize,
    pub output_size: usize,
    pub hidden_layers: Vec<usize>,
    pub dropout: f64,
}

impl NetworkConfig {
    /// Builds and validates a configuration.
    pub fn new(
        input_size: usize,
        output_size: usize,
        hidden_layers: Vec<usize>,
        dropout: f64,
    ) -> Result<NetworkConfig> {
        let config = NetworkConfig { input_size, output_size, hidden_layers, dropout };
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.input_size == 0 {
            return Err(Error::InvalidConfig("input_size must be positive".into()));
        }
        if self.output_size == 0 {
            return Err(Error::InvalidConfig("output_size must be positive".into()));
        }
        if self.hidden_layers.is_empty() {
            return Err(Error::InvalidConfig("at least one hidden layer is required".into()));
        }
        if let Some(i) = self.hidden_layers.iter().position(|&w| w == 0) {
            return Err(Error::InvalidConfig(format!("hidden layer {} has width 0", i)));
        }
        if !(0.0..1.0).contains(&self.dropout) {
            return Err(Error::InvalidConfig(format!(
                "dropout must lie in [0, 1), got {}",
                self.dropout
            )));
        }
        Ok(())
    }

    /// (fan_in, fan_out) of every linear layer, output layer last.
    pub fn layer_shapes(&self) -> Vec<(usize, usize)> {
        let mut widths = Vec::with_capacity(self.hidden_layers.len() + 2);
        widths.push(self.input_size);
        widths.extend_from_slice(&self.hidden_layers);
        widths.push(self.output_size);
        widths.windows(2).map(|w| (w[0], w[1])).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn layer_shapes_chain_widths() {
        let config = NetworkConfig::new(784, 10, vec![128, 64], 0.5).unwrap();
        assert_eq!(config.layer_shapes(), vec![(784, 128), (128, 64), (64, 10)]);
    }

    #[test]
    fn rejects_invalid_values() {
        assert!(NetworkConfig::new(0, 10, vec![8], 0.0).is_err());
        assert!(NetworkConfig::new(4, 0, vec![8], 0.0).is_err());
        assert!(NetworkConfig::new(4, 2, vec![], 0.0).is_err());
        assert!(NetworkConfig::new(4, 2, vec![8, 0], 0.0).is_err());
        assert!(NetworkConfig::new(4, 2, vec![8], 1.0).is_err());
        assert!(NetworkConfig::new(4, 2, vec![8], -0.1).is_err());
        assert!(NetworkConfig::new(4, 2, vec![8], 0.99).is_ok());
    }
}
