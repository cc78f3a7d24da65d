use serde::{Serialize, Deserialize};

/// Configuration for a `train_loop` run.
///
/// # Fields
/// - `epochs`    : total number of full passes over the training source
/// - `log_every` : log the running training loss every this many steps;
///                 `0` disables step logging (epoch summaries still log)
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TrainConfig {
    pub epochs: usize,
    pub log_every: usize,
}

impl TrainConfig {
    pub fn new(epochs: usize, log_every: usize) -> Self {
        TrainConfig { epochs, log_every }
    }
}

impl Default for TrainConfig {
    fn default() -> Self {
        TrainConfig { epochs: 2, log_every: 40 }
    }
}
