pub mod error;
pub mod math;
pub mod activation;
pub mod layers;
pub mod network;
pub mod loss;
pub mod optim;
pub mod data;
pub mod train;
pub mod checkpoint;
pub mod config;
pub mod commands;
pub mod logging;

// Convenience re-exports
pub use error::{Error, Result};
pub use math::matrix::Matrix;
pub use network::{ModelMetadata, Network, NetworkConfig, StateDict};
pub use loss::{Loss, NllLoss};
pub use optim::{Adam, Optimizer, Sgd};
pub use data::{Batch, BatchSource, DataLoader, Dataset, Normalize};
pub use train::{evaluate, train_loop, train_step, EpochStats, Evaluation, TrainConfig, TrainReport};
pub use checkpoint::{load_checkpoint, save_checkpoint, Checkpoint};
pub use config::RunConfig;
