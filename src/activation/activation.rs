use crate::math::matrix::Matrix;

/// Element-wise rectified linear unit.
pub fn relu(z: &Matrix) -> Matrix {
    z.map(|x| if x > 0.0 { x } else { 0.0 })
}

/// Backward rule for ReLU: passes `grad` through where the pre-activation
/// `z` was positive and zeroes it elsewhere.
pub fn relu_backward(grad: &Matrix, z: &Matrix) -> Matrix {
    grad.zip_map(z, |g, x| if x > 0.0 { g } else { 0.0 })
}

/// Row-wise log-softmax: `z_i - log(sum_j exp(z_j))`.
///
/// The row maximum is subtracted first so large logits do not overflow.
pub fn log_softmax(z: &Matrix) -> Matrix {
    let data = z.data.iter()
        .map(|row| {
            let max = row.iter().cloned().fold(f64::NEG_INFINITY, f64::max);
            let log_sum = row.iter().map(|x| (x - max).exp()).sum::<f64>().ln() + max;
            row.iter().map(|x| x - log_sum).collect()
        })
        .collect();
    Matrix { rows: z.rows, cols: z.cols, data }
}

/// Backward rule for log-softmax given its own output.
///
/// For `y = log_softmax(z)`: `dL/dz = g - softmax(z) * sum(g)` per row,
/// with `softmax(z) = exp(y)`.
pub fn log_softmax_backward(grad: &Matrix, log_probs: &Matrix) -> Matrix {
    let sums = grad.row_sums();
    let data = grad.data.iter().zip(log_probs.data.iter()).zip(sums.iter())
        .map(|((g_row, y_row), s)| {
            g_row.iter().zip(y_row.iter()).map(|(g, y)| g - y.exp() * s).collect()
        })
        .collect();
    Matrix { rows: grad.rows, cols: grad.cols, data }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    #[test]
    fn log_softmax_rows_normalise() {
        let z = Matrix::from_data(vec![vec![1.0, 2.0, 3.0], vec![1000.0, 1000.0, -5.0]]).unwrap();
        let y = log_softmax(&z);
        for row in &y.data {
            let total: f64 = row.iter().map(|v| v.exp()).sum();
            assert_abs_diff_eq!(total, 1.0, epsilon = 1e-12);
        }
        assert_abs_diff_eq!(y.data[1][0], -(2.0_f64.ln()), epsilon = 1e-12);
    }

    #[test]
    fn relu_backward_masks_negative_inputs() {
        let z = Matrix::from_data(vec![vec![-1.0, 0.0, 2.0]]).unwrap();
        let g = Matrix::filled(1, 3, 5.0);
        assert_eq!(relu(&z).data, vec![vec![0.0, 0.0, 2.0]]);
        assert_eq!(relu_backward(&g, &z).data, vec![vec![0.0, 0.0, 5.0]]);
    }
}
