use serde::{Serialize, Deserialize};

/// Per-epoch training statistics produced by `train_loop`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EpochStats {
    /// 1-based epoch number.
    pub epoch: usize,
    /// Total epochs requested for this run.
    pub total_epochs: usize,
    /// Mean training loss over all batches in this epoch.
    pub train_loss: f64,
    /// Mean validation loss; `None` when the validation source was empty.
    pub val_loss: Option<f64>,
    /// Validation accuracy as a fraction in [0, 1].
    pub val_accuracy: Option<f64>,
    /// Wall-clock duration of this single epoch in milliseconds.
    pub elapsed_ms: u64,
}

/// Outcome of a full `train_loop` run.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TrainReport {
    pub epochs: Vec<EpochStats>,
    /// Optimizer steps taken across all epochs.
    pub steps: usize,
}

impl TrainReport {
    pub fn last(&self) -> Option<&EpochStats> {
        self.epochs.last()
    }
}

/// Loss and accuracy of a network over a whole batch source.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Evaluation {
    /// Sample-weighted mean loss.
    pub loss: f64,
    /// Fraction of samples whose arg-max class equals the label.
    pub accuracy: f64,
    pub samples: usize,
}
