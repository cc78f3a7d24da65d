//! Library side of the `ferrite-mlp` subcommands.

use std::path::Path;

use tracing::info;

use crate::checkpoint::Checkpoint;
use crate::config::RunConfig;
use crate::data::idx::{read_idx_pair, Dataset, Normalize};
use crate::data::image::load_grayscale;
use crate::data::loader::DataLoader;
use crate::error::{Error, Result};
use crate::loss::NllLoss;
use crate::math::matrix::Matrix;
use crate::network::metadata::ModelMetadata;
use crate::network::network::Network;
use crate::train::epoch_stats::{Evaluation, TrainReport};
use crate::train::loop_fn::{evaluate, train_loop};

/// One row of a `predict` result.
#[derive(Debug, Clone, PartialEq)]
pub struct Prediction {
    pub class: usize,
    pub name: String,
    pub probability: f64,
}

/// Architecture summary printed by `inspect`.
#[derive(Debug, Clone, PartialEq)]
pub struct Summary {
    pub input_size: usize,
    pub output_size: usize,
    pub hidden_layers: Vec<usize>,
    pub dropout: f64,
    pub parameter_count: usize,
    pub metadata: Option<ModelMetadata>,
}

fn load_dataset(
    images: &Path,
    labels: &Path,
    input_size: usize,
    n_classes: usize,
    normalize: Normalize,
) -> Result<Dataset> {
    let mut dataset = read_idx_pair(images, labels, n_classes)?;
    if !dataset.is_empty() && dataset.feature_count() != input_size {
        return Err(Error::shape(
            format!("samples in {}", images.display()),
            vec![input_size],
            vec![dataset.feature_count()],
        ));
    }
    dataset.normalize(normalize);
    Ok(dataset)
}

/// Trains a fresh network as described by `config`, writes the checkpoint
/// and returns the trained network with its report.
pub fn run_train(config: &RunConfig) -> Result<(Network, TrainReport)> {
    config.validate()?;
    let network_config = config.network_config()?;
    let seed = config.training.seed;

    let mut network = match seed {
        Some(seed) => Network::with_seed(network_config, seed)?,
        None => Network::new(network_config)?,
    };

    let data = &config.data;
    let train_set = load_dataset(
        &data.train_images,
        &data.train_labels,
        config.model.input_size,
        config.model.output_size,
        data.normalize,
    )?;
    let test_set = load_dataset(
        &data.test_images,
        &data.test_labels,
        config.model.input_size,
        config.model.output_size,
        data.normalize,
    )?;
    info!(
        train = train_set.len(),
        validation = test_set.len(),
        parameters = network.parameter_count(),
        "starting training"
    );

    let image_dims = train_set.image_dims;
    let mut train_loader = match seed {
        Some(seed) => DataLoader::with_seed(train_set, data.batch_size, data.shuffle, seed.wrapping_add(1))?,
        None => DataLoader::new(train_set, data.batch_size, data.shuffle)?,
    };
    let mut test_loader = DataLoader::new(test_set, data.batch_size, false)?;

    let mut optimizer = config.optimizer.build();
    let report = train_loop(
        &mut network,
        &mut train_loader,
        &mut test_loader,
        &NllLoss,
        optimizer.as_mut(),
        &config.train_config(),
    )?;

    let metadata = ModelMetadata {
        description: Some(format!(
            "{:?} lr={} for {} epochs",
            config.optimizer.kind, config.optimizer.learning_rate, config.training.epochs
        )),
        class_names: data.class_names.clone(),
        image_dims,
        normalize: Some(data.normalize),
    };
    let path = &config.checkpoint.0;
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)?;
    }
    Checkpoint::from_network(&network).with_metadata(metadata).save(path)?;
    info!(path = %path.display(), "checkpoint saved");

    Ok((network, report))
}

/// Scores a saved model on an IDX image/label pair.
pub fn run_evaluate(
    checkpoint: &Path,
    images: &Path,
    labels: &Path,
    batch_size: usize,
) -> Result<Option<Evaluation>> {
    let checkpoint = Checkpoint::load(checkpoint)?;
    let normalize = checkpoint.metadata.as_ref()
        .and_then(|m| m.normalize)
        .unwrap_or_default();
    let network = checkpoint.into_network()?;
    let config = network.config();

    let dataset = load_dataset(images, labels, config.input_size, config.output_size, normalize)?;
    let mut loader = DataLoader::new(dataset, batch_size, false)?;
    evaluate(&network, &mut loader, &NllLoss)
}

/// Classifies one image file and returns the `top_k` most probable classes.
pub fn run_predict(checkpoint: &Path, image: &Path, top_k: usize) -> Result<Vec<Prediction>> {
    let checkpoint = Checkpoint::load(checkpoint)?;
    let metadata = checkpoint.metadata.clone().unwrap_or_default();
    let network = checkpoint.into_network()?;
    let input_size = network.config().input_size;

    let (height, width) = match metadata.image_dims {
        Some(dims) => dims,
        None => {
            let side = (input_size as f64).sqrt().round() as usize;
            if side * side != input_size {
                return Err(Error::InvalidConfig(format!(
                    "cannot infer image geometry for input_size {}; checkpoint has no image_dims",
                    input_size
                )));
            }
            (side, side)
        }
    };

    let normalize = metadata.normalize.unwrap_or_default();
    let pixels: Vec<f64> = load_grayscale(image, width as u32, height as u32)?
        .into_iter()
        .map(|x| normalize.apply(x))
        .collect();
    let log_probs = network.predict(&Matrix::from_data(vec![pixels])?)?;

    let mut ranked: Vec<Prediction> = log_probs.data[0].iter()
        .enumerate()
        .map(|(class, lp)| Prediction {
            class,
            name: metadata.class_name(class),
            probability: lp.exp(),
        })
        .collect();
    ranked.sort_by(|a, b| b.probability.partial_cmp(&a.probability).unwrap_or(std::cmp::Ordering::Equal));
    ranked.truncate(top_k.max(1));
    Ok(ranked)
}

/// Reads a checkpoint and describes the model it holds.
pub fn run_inspect(checkpoint: &Path) -> Result<Summary> {
    let checkpoint = Checkpoint::load(checkpoint)?;
    let metadata = checkpoint.metadata.clone();
    let network = checkpoint.into_network()?;
    let config = network.config();
    Ok(Summary {
        input_size: config.input_size,
        output_size: config.output_size,
        hidden_layers: config.hidden_layers.clone(),
        dropout: config.dropout,
        parameter_count: network.parameter_count(),
        metadata,
    })
}
