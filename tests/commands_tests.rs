use std::path::Path;

use ferrite_mlp::commands::{run_evaluate, run_inspect, run_predict, run_train};
use ferrite_mlp::config::{CheckpointPath, OptimizerKind, RunConfig};
use ferrite_mlp::{load_checkpoint, Checkpoint, Error};

/// Writes a tiny 4×4 two-class IDX pair: class 0 is dark on the left half,
/// class 1 is dark on the right half.
fn write_idx(dir: &Path, stem: &str, n: usize) -> (std::path::PathBuf, std::path::PathBuf) {
    let mut images = vec![0, 0, 8, 3];
    images.extend_from_slice(&(n as u32).to_be_bytes());
    images.extend_from_slice(&4u32.to_be_bytes());
    images.extend_from_slice(&4u32.to_be_bytes());
    let mut labels = vec![0, 0, 8, 1];
    labels.extend_from_slice(&(n as u32).to_be_bytes());

    for i in 0..n {
        let label = (i % 2) as u8;
        for _row in 0..4 {
            for col in 0..4 {
                let bright = if label == 0 { col >= 2 } else { col < 2 };
                images.push(if bright { 255 } else { 0 });
            }
        }
        labels.push(label);
    }

    let image_path = dir.join(format!("{}-images-idx3-ubyte", stem));
    let label_path = dir.join(format!("{}-labels-idx1-ubyte", stem));
    std::fs::write(&image_path, images).unwrap();
    std::fs::write(&label_path, labels).unwrap();
    (image_path, label_path)
}

fn config_for(dir: &Path) -> RunConfig {
    let (train_images, train_labels) = write_idx(dir, "train", 40);
    let (test_images, test_labels) = write_idx(dir, "test", 10);

    let mut config = RunConfig::default();
    config.model.input_size = 16;
    config.model.output_size = 2;
    config.model.hidden_layers = vec![8];
    config.model.dropout = 0.0;
    config.data.train_images = train_images;
    config.data.train_labels = train_labels;
    config.data.test_images = test_images;
    config.data.test_labels = test_labels;
    config.data.batch_size = 8;
    config.data.class_names = Some(vec!["left".into(), "right".into()]);
    config.optimizer.kind = OptimizerKind::Sgd;
    config.optimizer.learning_rate = 0.1;
    config.training.epochs = 5;
    config.training.seed = Some(3);
    config.checkpoint = CheckpointPath(dir.join("out").join("model.json"));
    config
}

#[test]
fn test_train_evaluate_inspect_predict() {
    let dir = tempfile::tempdir().unwrap();
    let config = config_for(dir.path());

    let (network, report) = run_train(&config).unwrap();
    assert_eq!(report.epochs.len(), 5);
    assert_eq!(report.steps, 5 * 5);

    let checkpoint_path = &config.checkpoint.0;
    let restored = load_checkpoint(checkpoint_path).unwrap();
    assert_eq!(restored.state_dict(), network.state_dict());

    let checkpoint = Checkpoint::load(checkpoint_path).unwrap();
    let metadata = checkpoint.metadata.unwrap();
    assert_eq!(metadata.image_dims, Some((4, 4)));
    assert!(metadata.normalize.is_some());

    let evaluation = run_evaluate(
        checkpoint_path,
        &config.data.test_images,
        &config.data.test_labels,
        4,
    )
    .unwrap()
    .unwrap();
    assert_eq!(evaluation.samples, 10);

    let summary = run_inspect(checkpoint_path).unwrap();
    assert_eq!(summary.hidden_layers, vec![8]);
    assert_eq!(summary.parameter_count, 16 * 8 + 8 + 8 * 2 + 2);

    let image_path = dir.path().join("digit.png");
    image::GrayImage::from_fn(4, 4, |x, _| image::Luma([if x < 2 { 255 } else { 0 }]))
        .save(&image_path)
        .unwrap();
    let ranked = run_predict(checkpoint_path, &image_path, 5).unwrap();
    assert_eq!(ranked.len(), 2);
    assert!(ranked[0].probability >= ranked[1].probability);
    let total: f64 = ranked.iter().map(|p| p.probability).sum();
    assert!((total - 1.0).abs() < 1e-9);
    assert!(ranked.iter().any(|p| p.name == "left"));
}

#[test]
fn test_train_rejects_mismatched_dataset_width() {
    let dir = tempfile::tempdir().unwrap();
    let mut config = config_for(dir.path());
    config.model.input_size = 20;
    assert!(matches!(run_train(&config), Err(Error::ShapeMismatch { .. })));
}

#[test]
fn test_missing_dataset_is_io_error() {
    let dir = tempfile::tempdir().unwrap();
    let mut config = config_for(dir.path());
    config.data.train_images = dir.path().join("nope");
    assert!(matches!(run_train(&config), Err(Error::Io(_))));
}
