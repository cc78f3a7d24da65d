use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;

use crate::data::batch::{Batch, BatchSource};
use crate::data::idx::Dataset;
use crate::error::{Error, Result};
use crate::math::matrix::Matrix;

/// Cuts a `Dataset` into mini-batches, reshuffling every pass when
/// `shuffle` is set. The last batch of a pass may be shorter.
#[derive(Debug, Clone)]
pub struct DataLoader {
    dataset: Dataset,
    batch_size: usize,
    shuffle: bool,
    rng: StdRng,
}

impl DataLoader {
    pub fn new(dataset: Dataset, batch_size: usize, shuffle: bool) -> Result<DataLoader> {
        DataLoader::build(dataset, batch_size, shuffle, StdRng::from_entropy())
    }

    /// Like `new`, with a reproducible shuffle order.
    pub fn with_seed(dataset: Dataset, batch_size: usize, shuffle: bool, seed: u64) -> Result<DataLoader> {
        DataLoader::build(dataset, batch_size, shuffle, StdRng::seed_from_u64(seed))
    }

    fn build(dataset: Dataset, batch_size: usize, shuffle: bool, rng: StdRng) -> Result<DataLoader> {
        if batch_size == 0 {
            return Err(Error::InvalidConfig("batch_size must be at least 1".into()));
        }
        if dataset.inputs.len() != dataset.labels.len() {
            return Err(Error::shape(
                "dataset labels",
                vec![dataset.inputs.len()],
                vec![dataset.labels.len()],
            ));
        }
        let width = dataset.feature_count();
        if let Some(row) = dataset.inputs.iter().find(|row| row.len() != width) {
            return Err(Error::shape("dataset sample", vec![width], vec![row.len()]));
        }
        Ok(DataLoader { dataset, batch_size, shuffle, rng })
    }

    pub fn dataset(&self) -> &Dataset {
        &self.dataset
    }

    pub fn batch_size(&self) -> usize {
        self.batch_size
    }

    /// Number of batches in one pass.
    pub fn len(&self) -> usize {
        (self.dataset.len() + self.batch_size - 1) / self.batch_size
    }

    pub fn is_empty(&self) -> bool {
        self.dataset.is_empty()
    }

    fn make_batch(&self, indices: &[usize]) -> Batch {
        let rows = indices.iter().map(|&i| self.dataset.inputs[i].clone()).collect();
        let labels = indices.iter().map(|&i| self.dataset.labels[i]).collect();
        Batch {
            inputs: Matrix { rows: indices.len(), cols: self.dataset.feature_count(), data: rows },
            labels,
        }
    }
}

impl BatchSource for DataLoader {
    fn batches(&mut self) -> Box<dyn Iterator<Item = Batch> + '_> {
        let mut order: Vec<usize> = (0..self.dataset.len()).collect();
        if self.shuffle {
            order.shuffle(&mut self.rng);
        }
        let this = &*self;
        Box::new(
            (0..order.len())
                .step_by(this.batch_size)
                .map(move |start| {
                    let end = (start + this.batch_size).min(order.len());
                    this.make_batch(&order[start..end])
                }),
        )
    }
}
