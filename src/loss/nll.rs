use crate::error::{Error, Result};
use crate::loss::Loss;
use crate::math::matrix::Matrix;

/// Negative log-likelihood over log-probabilities, averaged over the batch.
///
/// Paired with a log-softmax output this is categorical cross-entropy:
///   L = -(1/N) * sum_i log_probs[i][label_i]
#[derive(Debug, Clone, Copy, Default)]
pub struct NllLoss;

impl NllLoss {
    fn check(log_probs: &Matrix, labels: &[usize]) -> Result<()> {
        if log_probs.rows != labels.len() {
            return Err(Error::shape(
                "loss labels",
                vec![log_probs.rows],
                vec![labels.len()],
            ));
        }
        if let Some(&label) = labels.iter().find(|&&l| l >= log_probs.cols) {
            return Err(Error::InvalidLabel { label, classes: log_probs.cols });
        }
        Ok(())
    }
}

impl Loss for NllLoss {
    fn loss(&self, log_probs: &Matrix, labels: &[usize]) -> Result<f64> {
        NllLoss::check(log_probs, labels)?;
        let total: f64 = log_probs.data.iter().zip(labels.iter())
            .map(|(row, &label)| -row[label])
            .sum();
        Ok(total / labels.len() as f64)
    }

    /// dL/dlog_probs: `-1/N` at each target entry, zero elsewhere.
    fn gradient(&self, log_probs: &Matrix, labels: &[usize]) -> Result<Matrix> {
        NllLoss::check(log_probs, labels)?;
        let mut grad = Matrix::zeros(log_probs.rows, log_probs.cols);
        let weight = -1.0 / labels.len() as f64;
        for (row, &label) in grad.data.iter_mut().zip(labels.iter()) {
            row[label] = weight;
        }
        Ok(grad)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    #[test]
    fn picks_target_log_probability() {
        let log_probs = Matrix::from_data(vec![
            vec![0.5_f64.ln(), 0.25_f64.ln(), 0.25_f64.ln()],
            vec![0.1_f64.ln(), 0.1_f64.ln(), 0.8_f64.ln()],
        ]).unwrap();
        let loss = NllLoss.loss(&log_probs, &[0, 2]).unwrap();
        assert_abs_diff_eq!(loss, -(0.5_f64.ln() + 0.8_f64.ln()) / 2.0, epsilon = 1e-12);

        let grad = NllLoss.gradient(&log_probs, &[0, 2]).unwrap();
        assert_eq!(grad.data, vec![vec![-0.5, 0.0, 0.0], vec![0.0, 0.0, -0.5]]);
    }

    #[test]
    fn rejects_bad_labels() {
        let log_probs = Matrix::filled(2, 3, -(3.0_f64.ln()));
        assert!(matches!(
            NllLoss.loss(&log_probs, &[0, 3]),
            Err(Error::InvalidLabel { label: 3, classes: 3 })
        ));
        assert!(matches!(
            NllLoss.loss(&log_probs, &[0]),
            Err(Error::ShapeMismatch { .. })
        ));
    }
}
