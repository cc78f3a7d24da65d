//! Error types for ferrite-mlp.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    /// A matrix, batch or checkpoint disagrees with the shape the receiver
    /// expects. An empty `expected` or `got` marks a parameter that is
    /// present on only one side.
    #[error("Shape mismatch in {context}: expected {expected:?}, got {got:?}")]
    ShapeMismatch {
        context: String,
        expected: Vec<usize>,
        got: Vec<usize>,
    },

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Label {label} is out of range for {classes} classes")]
    InvalidLabel { label: usize, classes: usize },

    #[error("backward() called without a cached training forward pass")]
    NoForwardPass,

    #[error("Loss became non-finite ({loss}) at epoch {epoch}, step {step}")]
    NonFiniteLoss { epoch: usize, step: usize, loss: f64 },

    #[error("Gradient of `{parameter}` contains non-finite values")]
    NonFiniteGradient { parameter: String },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("Dataset error: {0}")]
    Dataset(String),

    #[error("Image error: {0}")]
    Image(#[from] image::ImageError),
}

impl Error {
    pub(crate) fn shape(context: impl Into<String>, expected: Vec<usize>, got: Vec<usize>) -> Self {
        Error::ShapeMismatch {
            context: context.into(),
            expected,
            got,
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;
