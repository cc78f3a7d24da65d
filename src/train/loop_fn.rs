use std::time::Instant;

use tracing::{debug, info};

use crate::data::batch::BatchSource;
use crate::error::{Error, Result};
use crate::loss::Loss;
use crate::network::network::Network;
use crate::optim::Optimizer;
use crate::train::epoch_stats::{EpochStats, Evaluation, TrainReport};
use crate::train::train_config::TrainConfig;
use crate::train::trainer::train_step;

// ---------------------------------------------------------------------------
// Public entry points
// ---------------------------------------------------------------------------

/// Trains `network` for `config.epochs` epochs.
///
/// Each batch gets one `train_step`. Every `config.log_every` steps the mean
/// training loss over that window is logged and the window resets. After
/// every epoch the network is switched to evaluation mode, scored on
/// `validation`, and switched back to training mode.
///
/// # Errors
/// Fails immediately, with no retry, on a shape error, on a non-finite loss
/// (`Error::NonFiniteLoss`) or on a non-finite gradient
/// (`Error::NonFiniteGradient`). Parameters keep whatever updates were
/// applied before the failure.
pub fn train_loop(
    network: &mut Network,
    train: &mut dyn BatchSource,
    validation: &mut dyn BatchSource,
    loss_fn: &dyn Loss,
    optimizer: &mut dyn Optimizer,
    config: &TrainConfig,
) -> Result<TrainReport> {
    let mut report = TrainReport::default();
    let mut running_loss = 0.0;
    let mut window = 0usize;

    network.train();

    for epoch in 1..=config.epochs {
        let t_start = Instant::now();
        let mut epoch_loss = 0.0;
        let mut epoch_batches = 0usize;

        // ── One full pass over the training source ─────────────────────────
        for batch in train.batches() {
            report.steps += 1;
            let loss = match train_step(network, &batch, loss_fn, optimizer) {
                Err(Error::NonFiniteLoss { loss, .. }) => {
                    return Err(Error::NonFiniteLoss { epoch, step: report.steps, loss });
                }
                result => result?,
            };

            epoch_loss += loss;
            epoch_batches += 1;
            running_loss += loss;
            window += 1;

            if config.log_every > 0 && report.steps % config.log_every == 0 {
                info!(
                    "Epoch: {}/{}.. Step: {}.. Training Loss: {:.3}",
                    epoch,
                    config.epochs,
                    report.steps,
                    running_loss / window as f64
                );
                running_loss = 0.0;
                window = 0;
            }
        }

        // ── Validation ────────────────────────────────────────────────────
        network.eval();
        let evaluation = evaluate(network, validation, loss_fn);
        network.train();
        let evaluation = evaluation?;

        let train_loss = if epoch_batches > 0 {
            epoch_loss / epoch_batches as f64
        } else {
            0.0
        };
        let stats = EpochStats {
            epoch,
            total_epochs: config.epochs,
            train_loss,
            val_loss: evaluation.map(|e| e.loss),
            val_accuracy: evaluation.map(|e| e.accuracy),
            elapsed_ms: t_start.elapsed().as_millis() as u64,
        };

        match evaluation {
            Some(e) => info!(
                "Epoch: {}/{}.. Training Loss: {:.3}.. Validation Loss: {:.3}.. Validation Accuracy: {:.3}",
                epoch, config.epochs, train_loss, e.loss, e.accuracy
            ),
            None => info!(
                "Epoch: {}/{}.. Training Loss: {:.3}.. (no validation data)",
                epoch, config.epochs, train_loss
            ),
        }
        debug!(epoch, elapsed_ms = stats.elapsed_ms, batches = epoch_batches, "epoch finished");

        report.epochs.push(stats);
    }

    Ok(report)
}

/// Scores `network` on every batch of `source` with `predict`, so no
/// forward state is cached and the network's mode is left untouched.
///
/// Returns `None` when the source yields no samples.
pub fn evaluate(
    network: &Network,
    source: &mut dyn BatchSource,
    loss_fn: &dyn Loss,
) -> Result<Option<Evaluation>> {
    let mut total_loss = 0.0;
    let mut correct = 0usize;
    let mut samples = 0usize;

    for batch in source.batches() {
        let log_probs = network.predict(&batch.inputs)?;
        let n = batch.len();
        total_loss += loss_fn.loss(&log_probs, &batch.labels)? * n as f64;
        correct += log_probs.argmax_rows()
            .iter()
            .zip(batch.labels.iter())
            .filter(|(predicted, label)| predicted == label)
            .count();
        samples += n;
    }

    if samples == 0 {
        return Ok(None);
    }
    Ok(Some(Evaluation {
        loss: total_loss / samples as f64,
        accuracy: correct as f64 / samples as f64,
        samples,
    }))
}
