//! YAML run configuration for the `train` command.
//!
//! Every field is optional in the file; omitted fields take the defaults
//! below, which reproduce the classic MNIST setup:
//!
//! ```yaml
//! model:
//!   input_size: 784
//!   output_size: 10
//!   hidden_layers: [512, 256, 128]
//!   dropout: 0.5
//! data:
//!   train_images: data/train-images-idx3-ubyte
//!   train_labels: data/train-labels-idx1-ubyte
//!   test_images: data/t10k-images-idx3-ubyte
//!   test_labels: data/t10k-labels-idx1-ubyte
//!   batch_size: 64
//!   shuffle: true
//!   normalize: { mean: 0.5, std: 0.5 }
//! optimizer:
//!   kind: adam
//!   learning_rate: 0.001
//! training:
//!   epochs: 2
//!   log_every: 40
//! checkpoint: checkpoint.json
//! ```

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::data::idx::Normalize;
use crate::error::{Error, Result};
use crate::network::config::NetworkConfig;
use crate::optim::{Adam, Optimizer, Sgd};
use crate::train::train_config::TrainConfig;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ModelSection {
    pub input_size: usize,
    pub output_size: usize,
    pub hidden_layers: Vec<usize>,
    pub dropout: f64,
}

impl Default for ModelSection {
    fn default() -> Self {
        ModelSection {
            input_size: 784,
            output_size: 10,
            hidden_layers: vec![512, 256, 128],
            dropout: 0.5,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DataSection {
    pub train_images: PathBuf,
    pub train_labels: PathBuf,
    pub test_images: PathBuf,
    pub test_labels: PathBuf,
    pub batch_size: usize,
    pub shuffle: bool,
    pub normalize: Normalize,
    /// Stored in the checkpoint metadata for `predict`.
    pub class_names: Option<Vec<String>>,
}

impl Default for DataSection {
    fn default() -> Self {
        DataSection {
            train_images: PathBuf::from("data/train-images-idx3-ubyte"),
            train_labels: PathBuf::from("data/train-labels-idx1-ubyte"),
            test_images: PathBuf::from("data/t10k-images-idx3-ubyte"),
            test_labels: PathBuf::from("data/t10k-labels-idx1-ubyte"),
            batch_size: 64,
            shuffle: true,
            normalize: Normalize::default(),
            class_names: None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OptimizerKind {
    Sgd,
    Adam,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OptimizerSection {
    pub kind: OptimizerKind,
    pub learning_rate: f64,
    /// SGD only.
    pub momentum: f64,
}

impl Default for OptimizerSection {
    fn default() -> Self {
        OptimizerSection { kind: OptimizerKind::Adam, learning_rate: 0.001, momentum: 0.0 }
    }
}

impl OptimizerSection {
    pub fn build(&self) -> Box<dyn Optimizer> {
        match self.kind {
            OptimizerKind::Sgd => Box::new(Sgd::with_momentum(self.learning_rate, self.momentum)),
            OptimizerKind::Adam => Box::new(Adam::default_params(self.learning_rate)),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TrainingSection {
    pub epochs: usize,
    pub log_every: usize,
    /// Seeds initialisation, dropout and shuffling; entropy when absent.
    pub seed: Option<u64>,
}

impl Default for TrainingSection {
    fn default() -> Self {
        let defaults = TrainConfig::default();
        TrainingSection { epochs: defaults.epochs, log_every: defaults.log_every, seed: None }
    }
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct RunConfig {
    pub model: ModelSection,
    pub data: DataSection,
    pub optimizer: OptimizerSection,
    pub training: TrainingSection,
    pub checkpoint: CheckpointPath,
}

/// Where `train` writes its checkpoint.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CheckpointPath(pub PathBuf);

impl Default for CheckpointPath {
    fn default() -> Self {
        CheckpointPath(PathBuf::from("checkpoint.json"))
    }
}

/// Command-line values that take precedence over the file.
#[derive(Debug, Clone, Default)]
pub struct Overrides {
    pub epochs: Option<usize>,
    pub checkpoint: Option<PathBuf>,
    pub seed: Option<u64>,
}

impl RunConfig {
    /// Parses and validates YAML text.
    pub fn from_yaml_str(yaml: &str) -> Result<RunConfig> {
        let config: RunConfig = serde_yaml::from_str(yaml)?;
        config.validate()?;
        Ok(config)
    }

    /// Reads, parses and validates a YAML file.
    pub fn load(path: impl AsRef<Path>) -> Result<RunConfig> {
        let yaml = fs::read_to_string(path.as_ref()).map_err(|e| {
            Error::InvalidConfig(format!(
                "failed to read config file {}: {}",
                path.as_ref().display(),
                e
            ))
        })?;
        RunConfig::from_yaml_str(&yaml)
    }

    // merge where the overrides win over the file
    pub fn merge_overrides(self, overrides: Overrides) -> RunConfig {
        RunConfig {
            training: TrainingSection {
                epochs: overrides.epochs.unwrap_or(self.training.epochs),
                seed: overrides.seed.or(self.training.seed),
                ..self.training
            },
            checkpoint: overrides.checkpoint.map(CheckpointPath).unwrap_or(self.checkpoint),
            ..self
        }
    }

    pub fn validate(&self) -> Result<()> {
        self.network_config()?;
        if self.data.batch_size == 0 {
            return Err(Error::InvalidConfig("data.batch_size must be at least 1".into()));
        }
        if !(self.data.normalize.std > 0.0) {
            return Err(Error::InvalidConfig("data.normalize.std must be positive".into()));
        }
        if !(self.optimizer.learning_rate > 0.0) || !self.optimizer.learning_rate.is_finite() {
            return Err(Error::InvalidConfig("optimizer.learning_rate must be positive".into()));
        }
        if !(0.0..1.0).contains(&self.optimizer.momentum) {
            return Err(Error::InvalidConfig("optimizer.momentum must lie in [0, 1)".into()));
        }
        if let Some(names) = &self.data.class_names {
            if names.len() != self.model.output_size {
                return Err(Error::InvalidConfig(format!(
                    "data.class_names has {} entries but model.output_size is {}",
                    names.len(),
                    self.model.output_size
                )));
            }
        }
        Ok(())
    }

    pub fn network_config(&self) -> Result<NetworkConfig> {
        NetworkConfig::new(
            self.model.input_size,
            self.model.output_size,
            self.model.hidden_layers.clone(),
            self.model.dropout,
        )
    }

    pub fn train_config(&self) -> TrainConfig {
        TrainConfig::new(self.training.epochs, self.training.log_every)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn empty_file_yields_defaults() {
        let config = RunConfig::from_yaml_str("{}").unwrap();
        assert_eq!(config, RunConfig::default());
        assert_eq!(config.model.hidden_layers, vec![512, 256, 128]);
        assert_eq!(config.optimizer.kind, OptimizerKind::Adam);
        assert_eq!(config.data.batch_size, 64);
        assert_eq!(config.checkpoint.0, PathBuf::from("checkpoint.json"));
    }

    #[test]
    fn load_partial_config() {
        let yaml = r#"
model:
  hidden_layers: [32, 16]
  dropout: 0.2
optimizer:
  kind: sgd
  learning_rate: 0.01
  momentum: 0.9
training:
  epochs: 3
  seed: 42
checkpoint: out/model.json
"#;
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(yaml.as_bytes()).unwrap();

        let config = RunConfig::load(file.path()).unwrap();
        assert_eq!(config.model.input_size, 784);
        assert_eq!(config.model.hidden_layers, vec![32, 16]);
        assert_eq!(config.optimizer.kind, OptimizerKind::Sgd);
        assert_eq!(config.training.epochs, 3);
        assert_eq!(config.training.log_every, 40);
        assert_eq!(config.training.seed, Some(42));
        assert_eq!(config.checkpoint.0, PathBuf::from("out/model.json"));
        assert_eq!(config.optimizer.build().learning_rate(), 0.01);
    }

    #[test]
    fn invalid_values_are_rejected() {
        for yaml in [
            "model: { dropout: 1.0 }",
            "model: { hidden_layers: [] }",
            "data: { batch_size: 0 }",
            "optimizer: { learning_rate: 0.0 }",
            "data: { class_names: [a, b] }",
        ] {
            assert!(
                matches!(RunConfig::from_yaml_str(yaml), Err(Error::InvalidConfig(_))),
                "accepted {}",
                yaml
            );
        }
        assert!(matches!(RunConfig::from_yaml_str("model: [1, 2"), Err(Error::Yaml(_))));
        assert!(matches!(RunConfig::load("/nonexistent/run.yaml"), Err(Error::InvalidConfig(_))));
    }

    #[test]
    fn overrides_take_precedence() {
        let config = RunConfig::default().merge_overrides(Overrides {
            epochs: Some(7),
            checkpoint: Some(PathBuf::from("x.json")),
            seed: None,
        });
        assert_eq!(config.training.epochs, 7);
        assert_eq!(config.training.seed, None);
        assert_eq!(config.checkpoint.0, PathBuf::from("x.json"));
        assert_eq!(config.training.log_every, 40);
    }
}
