use rand::Rng;
use serde::{Serialize, Deserialize};
use std::f64::consts::PI;
use std::ops::{Add, Sub, Mul};

use crate::error::{Error, Result};

/// Row-major 2-D matrix of `f64`.
///
/// Batches are laid out one sample per row, so a batch of 64 flattened
/// 28×28 images is a `64 × 784` matrix.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Matrix{
    pub rows: usize,
    pub cols: usize,
    pub data: Vec<Vec<f64>>
}

impl Matrix{
    pub fn zeros(rows: usize, cols: usize) -> Matrix {
        Matrix::filled(rows, cols, 0.0)
    }

    pub fn filled(rows: usize, cols: usize, value: f64) -> Matrix {
        Matrix{
            rows,
            cols,
            data: vec![vec![value; cols]; rows]
        }
    }

    /// Builds a matrix from row vectors. Fails on an empty or ragged input.
    pub fn from_data(data: Vec<Vec<f64>>) -> Result<Matrix> {
        let rows = data.len();
        let cols = data.first().map(|row| row.len()).unwrap_or(0);
        if rows == 0 || cols == 0 {
            return Err(Error::shape("matrix construction", vec![1, 1], vec![rows, cols]));
        }
        if let Some(bad) = data.iter().find(|row| row.len() != cols) {
            return Err(Error::shape("matrix row", vec![cols], vec![bad.len()]));
        }
        Ok(Matrix { rows, cols, data })
    }

    /// Samples a single value from N(0, 1) using the Box-Muller transform.
    fn sample_standard_normal<R: Rng>(rng: &mut R) -> f64 {
        // Both uniforms on (0, 1] to avoid log(0).
        let u1: f64 = 1.0 - rng.gen::<f64>();
        let u2: f64 = 1.0 - rng.gen::<f64>();
        (-2.0 * u1.ln()).sqrt() * (2.0 * PI * u2).cos()
    }

    /// He initialization: samples from N(0, sqrt(2 / rows)).
    ///
    /// Weights are stored as (fan_in, fan_out), so `rows` is the fan-in.
    /// Suited to layers followed by ReLU.
    pub fn he<R: Rng>(rows: usize, cols: usize, rng: &mut R) -> Matrix {
        let std_dev = (2.0 / rows as f64).sqrt();
        let mut res = Matrix::zeros(rows, cols);
        for row in res.data.iter_mut() {
            for x in row.iter_mut() {
                *x = Matrix::sample_standard_normal(rng) * std_dev;
            }
        }
        res
    }

    pub fn shape(&self) -> (usize, usize) {
        (self.rows, self.cols)
    }

    /// Shape as a `Vec`, the form used in error reports and checkpoints.
    pub fn dims(&self) -> Vec<usize> {
        vec![self.rows, self.cols]
    }

    pub fn transpose(&self) -> Matrix {
        let mut res = Matrix::zeros(self.cols, self.rows);

        for i in 0..res.rows {
            for j in 0..res.cols {
                res.data[i][j] = self.data[j][i];
            }
        }

        res
    }

    pub fn map<F>(&self, functor: F) -> Matrix
    where
        F: Fn(f64) -> f64,
    {
        Matrix {
            rows: self.rows,
            cols: self.cols,
            data: self.data.iter()
                .map(|row| row.iter().map(|&x| functor(x)).collect())
                .collect(),
        }
    }

    /// Element-wise combination of two same-shape matrices.
    pub fn zip_map<F>(&self, other: &Matrix, functor: F) -> Matrix
    where
        F: Fn(f64, f64) -> f64,
    {
        assert_eq!(self.shape(), other.shape(), "zip_map on matrices of different shapes");
        Matrix {
            rows: self.rows,
            cols: self.cols,
            data: self.data.iter().zip(other.data.iter())
                .map(|(a, b)| a.iter().zip(b.iter()).map(|(&x, &y)| functor(x, y)).collect())
                .collect(),
        }
    }

    pub fn scale(&self, factor: f64) -> Matrix {
        self.map(|x| x * factor)
    }

    /// Adds a `1 × cols` row to every row (bias broadcast).
    pub fn add_row(&self, row: &Matrix) -> Matrix {
        assert_eq!(row.rows, 1, "add_row expects a single row");
        assert_eq!(row.cols, self.cols, "add_row width mismatch");
        let bias = &row.data[0];
        Matrix {
            rows: self.rows,
            cols: self.cols,
            data: self.data.iter()
                .map(|r| r.iter().zip(bias.iter()).map(|(x, b)| x + b).collect())
                .collect(),
        }
    }

    /// Column sums as a `1 × cols` row.
    pub fn sum_rows(&self) -> Matrix {
        let mut res = Matrix::zeros(1, self.cols);
        for row in &self.data {
            for (acc, x) in res.data[0].iter_mut().zip(row.iter()) {
                *acc += x;
            }
        }
        res
    }

    /// Sum of each row.
    pub fn row_sums(&self) -> Vec<f64> {
        self.data.iter().map(|row| row.iter().sum()).collect()
    }

    /// Column index of the largest value in each row.
    pub fn argmax_rows(&self) -> Vec<usize> {
        self.data.iter().map(|row| argmax(row)).collect()
    }

    pub fn add_assign(&mut self, other: &Matrix) {
        assert_eq!(self.shape(), other.shape(), "add_assign on matrices of different shapes");
        for (a, b) in self.data.iter_mut().zip(other.data.iter()) {
            for (x, y) in a.iter_mut().zip(b.iter()) {
                *x += y;
            }
        }
    }

    pub fn fill(&mut self, value: f64) {
        for row in self.data.iter_mut() {
            row.iter_mut().for_each(|x| *x = value);
        }
    }

    /// Fails when `data` does not hold exactly `rows` rows of `cols` values.
    /// The fields are public, so a hand-built matrix can disagree with itself.
    pub fn check_consistent(&self, context: &str) -> Result<()> {
        let bad_row = self.data.iter().map(|row| row.len()).find(|&len| len != self.cols);
        if self.data.len() != self.rows || bad_row.is_some() {
            return Err(Error::shape(
                context,
                self.dims(),
                vec![self.data.len(), bad_row.unwrap_or(self.cols)],
            ));
        }
        Ok(())
    }

    pub fn is_finite(&self) -> bool {
        self.data.iter().all(|row| row.iter().all(|x| x.is_finite()))
    }

    pub fn iter(&self) -> impl Iterator<Item = &f64> {
        self.data.iter().flat_map(|row| row.iter())
    }

    pub fn iter_mut(&mut self) -> impl Iterator<Item = &mut f64> {
        self.data.iter_mut().flat_map(|row| row.iter_mut())
    }
}

/// Index of the maximum element in a slice.
pub fn argmax(v: &[f64]) -> usize {
    v.iter()
        .enumerate()
        .max_by(|(_, a), (_, b)| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal))
        .map(|(i, _)| i)
        .unwrap_or(0)
}

impl<'a> Add<&'a Matrix> for &'a Matrix {
    type Output = Matrix;

    fn add(self, rhs: &'a Matrix) -> Self::Output {
        if self.rows != rhs.rows || self.cols != rhs.cols {
            panic!("Matrices are of incorrect sizes")
        }
        self.zip_map(rhs, |a, b| a + b)
    }
}

impl<'a> Sub<&'a Matrix> for &'a Matrix {
    type Output = Matrix;

    fn sub(self, rhs: &'a Matrix) -> Self::Output {
        if self.rows != rhs.rows || self.cols != rhs.cols {
            panic!("Matrices are of incorrect sizes")
        }
        self.zip_map(rhs, |a, b| a - b)
    }
}

impl<'a> Mul<&'a Matrix> for &'a Matrix {
    type Output = Matrix;

    fn mul(self, rhs: &'a Matrix) -> Self::Output {
        if self.cols != rhs.rows {
            panic!("Matrices are of incorrect sizes")
        }

        let mut res = Matrix::zeros(self.rows, rhs.cols);

        // i-k-j order keeps the inner loop on contiguous rows.
        for i in 0..self.rows {
            let out = &mut res.data[i];
            for k in 0..self.cols {
                let a = self.data[i][k];
                if a == 0.0 {
                    continue;
                }
                for (o, b) in out.iter_mut().zip(rhs.data[k].iter()) {
                    *o += a * b;
                }
            }
        }

        res
    }
}
