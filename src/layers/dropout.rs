use rand::Rng;

use crate::math::matrix::Matrix;

/// Inverted dropout: in training mode each unit is zeroed with probability
/// `p` and survivors are scaled by `1 / (1 - p)`, so evaluation mode is a
/// plain identity.
#[derive(Debug, Clone)]
pub struct Dropout {
    pub p: f64,
    mask: Option<Matrix>,
}

impl Dropout {
    pub fn new(p: f64) -> Dropout {
        Dropout { p, mask: None }
    }

    /// Samples a fresh mask and applies it.
    pub fn forward<R: Rng>(&mut self, input: &Matrix, rng: &mut R) -> Matrix {
        if self.p == 0.0 {
            self.mask = None;
            return input.clone();
        }
        let keep = 1.0 - self.p;
        let mut mask = Matrix::zeros(input.rows, input.cols);
        for m in mask.iter_mut() {
            if rng.gen::<f64>() >= self.p {
                *m = 1.0 / keep;
            }
        }
        let out = input.zip_map(&mask, |x, m| x * m);
        self.mask = Some(mask);
        out
    }

    /// Routes the gradient through the mask of the last `forward`.
    pub fn backward(&self, grad: &Matrix) -> Matrix {
        match &self.mask {
            Some(mask) => grad.zip_map(mask, |g, m| g * m),
            None => grad.clone(),
        }
    }

    pub fn clear_cache(&mut self) {
        self.mask = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn surviving_units_are_rescaled() {
        let mut dropout = Dropout::new(0.5);
        let x = Matrix::filled(8, 16, 1.0);
        let y = dropout.forward(&x, &mut StdRng::seed_from_u64(3));

        assert!(y.iter().all(|&v| v == 0.0 || v == 2.0));
        assert!(y.iter().any(|&v| v == 0.0));
        assert!(y.iter().any(|&v| v == 2.0));

        let g = dropout.backward(&Matrix::filled(8, 16, 1.0));
        assert_eq!(g, y);
    }

    #[test]
    fn zero_probability_is_identity() {
        let mut dropout = Dropout::new(0.0);
        let x = Matrix::from_data(vec![vec![0.5, -1.5]]).unwrap();
        assert_eq!(dropout.forward(&x, &mut StdRng::seed_from_u64(0)), x);
    }
}
