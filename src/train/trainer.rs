use crate::{
    data::batch::Batch,
    error::{Error, Result},
    loss::Loss,
    network::network::Network,
    optim::Optimizer,
};

/// Runs one optimisation step on `batch` and returns the batch loss.
///
/// Order: clear gradients, forward, loss, backward, step.
///
/// # Errors
/// A non-finite loss fails with `Error::NonFiniteLoss` whose `epoch` and
/// `step` are 0 (`train_loop` fills them in); the forward cache is dropped
/// and no parameter moves. A non-finite gradient fails with
/// `Error::NonFiniteGradient`, also before the update is applied.
pub fn train_step(
    network: &mut Network,
    batch: &Batch,
    loss_fn: &dyn Loss,
    optimizer: &mut dyn Optimizer,
) -> Result<f64> {
    optimizer.zero_grad(network);

    let log_probs = network.forward(&batch.inputs)?;
    let loss = loss_fn.loss(&log_probs, &batch.labels)?;
    if !loss.is_finite() {
        network.clear_cache();
        return Err(Error::NonFiniteLoss { epoch: 0, step: 0, loss });
    }

    let grad = loss_fn.gradient(&log_probs, &batch.labels)?;
    network.backward(&grad)?;
    network.check_gradients()?;

    optimizer.step(network);
    Ok(loss)
}
