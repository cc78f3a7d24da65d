use crate::error::{Error, Result};
use crate::math::matrix::Matrix;

/// A mini-batch: one flattened sample per row of `inputs` and one class
/// index per row in `labels`.
#[derive(Debug, Clone, PartialEq)]
pub struct Batch {
    pub inputs: Matrix,
    pub labels: Vec<usize>,
}

impl Batch {
    /// Fails when the batch is empty, when `inputs` does not hold the rows
    /// it declares, or when rows and labels disagree.
    pub fn new(inputs: Matrix, labels: Vec<usize>) -> Result<Batch> {
        inputs.check_consistent("batch inputs")?;
        if inputs.rows == 0 || inputs.rows != labels.len() {
            return Err(Error::shape(
                "batch labels",
                vec![inputs.rows],
                vec![labels.len()],
            ));
        }
        Ok(Batch { inputs, labels })
    }

    /// Builds a batch from row vectors.
    pub fn from_rows(rows: Vec<Vec<f64>>, labels: Vec<usize>) -> Result<Batch> {
        Batch::new(Matrix::from_data(rows)?, labels)
    }

    pub fn len(&self) -> usize {
        self.labels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }
}

/// Anything that can hand the training loop a fresh pass of batches.
///
/// `batches` is called once per epoch (and once per validation pass).
pub trait BatchSource {
    fn batches(&mut self) -> Box<dyn Iterator<Item = Batch> + '_>;
}

impl BatchSource for Vec<Batch> {
    fn batches(&mut self) -> Box<dyn Iterator<Item = Batch> + '_> {
        Box::new(self.iter().cloned())
    }
}
