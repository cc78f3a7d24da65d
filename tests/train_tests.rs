use ferrite_mlp::{
    evaluate, train_loop, train_step, Adam, Batch, BatchSource, DataLoader, Dataset, Error, Loss,
    Matrix, Network, NetworkConfig, NllLoss, Optimizer, Sgd, TrainConfig,
};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

/// Two well separated square clusters in 2-D, labelled 0 and 1.
fn blobs(n: usize, seed: u64) -> Dataset {
    let mut rng = StdRng::seed_from_u64(seed);
    let mut inputs = Vec::with_capacity(n);
    let mut labels = Vec::with_capacity(n);
    for i in 0..n {
        let label = i % 2;
        let centre = if label == 0 { -2.0 } else { 2.0 };
        inputs.push(vec![
            centre + rng.gen::<f64>() - 0.5,
            centre + rng.gen::<f64>() - 0.5,
        ]);
        labels.push(label);
    }
    Dataset { inputs, labels, image_dims: None }
}

fn small_network(seed: u64) -> Network {
    Network::with_seed(NetworkConfig::new(2, 2, vec![8], 0.0).unwrap(), seed).unwrap()
}

/// NLL loss whose gradient is all NaN.
struct NanGradient;

impl Loss for NanGradient {
    fn loss(&self, log_probs: &Matrix, labels: &[usize]) -> ferrite_mlp::Result<f64> {
        NllLoss.loss(log_probs, labels)
    }

    fn gradient(&self, log_probs: &Matrix, _labels: &[usize]) -> ferrite_mlp::Result<Matrix> {
        Ok(Matrix::filled(log_probs.rows, log_probs.cols, f64::NAN))
    }
}

fn one_batch() -> Vec<Batch> {
    vec![Batch::from_rows(vec![vec![1.0, -1.0], vec![-0.5, 0.5]], vec![1, 0]).unwrap()]
}

#[test]
fn test_zero_epochs_leave_parameters_unchanged() {
    let mut network = small_network(1);
    let before = network.state_dict();

    let report = train_loop(
        &mut network,
        &mut one_batch(),
        &mut one_batch(),
        &NllLoss,
        &mut Sgd::new(0.5),
        &TrainConfig::new(0, 1),
    )
    .unwrap();

    assert!(report.epochs.is_empty());
    assert_eq!(report.steps, 0);
    assert_eq!(network.state_dict(), before);
}

#[test]
fn test_single_step_changes_parameters() {
    let optimizers: Vec<Box<dyn Optimizer>> = vec![
        Box::new(Sgd::new(0.1)),
        Box::new(Sgd::with_momentum(0.1, 0.9)),
        Box::new(Adam::default_params(0.01)),
    ];
    for mut optimizer in optimizers {
        let mut network = small_network(2);
        let before = network.state_dict();

        let loss = train_step(&mut network, &one_batch()[0], &NllLoss, optimizer.as_mut()).unwrap();
        assert!(loss.is_finite() && loss > 0.0);

        let after = network.state_dict();
        assert!(
            before.iter().any(|(name, m)| &after[name] != m),
            "no parameter moved"
        );
    }
}

#[test]
fn test_training_separates_blobs() {
    let mut network = small_network(3);
    let mut train = DataLoader::with_seed(blobs(200, 4), 16, true, 5).unwrap();
    let mut validation = DataLoader::new(blobs(60, 6), 32, false).unwrap();

    let report = train_loop(
        &mut network,
        &mut train,
        &mut validation,
        &NllLoss,
        &mut Sgd::new(0.1),
        &TrainConfig::new(10, 5),
    )
    .unwrap();

    assert_eq!(report.epochs.len(), 10);
    assert_eq!(report.steps, 10 * 13);
    let first = &report.epochs[0];
    let last = report.last().unwrap();
    assert_eq!(last.epoch, 10);
    assert_eq!(last.total_epochs, 10);
    assert!(last.train_loss < first.train_loss);
    assert!(last.val_accuracy.unwrap() >= 0.95, "accuracy {:?}", last.val_accuracy);
    assert!(network.is_training(), "loop must leave the network in training mode");
}

#[test]
fn test_non_finite_loss_is_fatal() {
    let mut network = small_network(7);
    let mut bad = vec![Batch::from_rows(vec![vec![f64::NAN, 0.0]], vec![0]).unwrap()];
    let before = network.state_dict();

    let result = train_loop(
        &mut network,
        &mut bad,
        &mut one_batch(),
        &NllLoss,
        &mut Sgd::new(0.1),
        &TrainConfig::new(3, 0),
    );

    match result {
        Err(Error::NonFiniteLoss { epoch, step, .. }) => {
            assert_eq!(epoch, 1);
            assert_eq!(step, 1);
        }
        other => panic!("expected NonFiniteLoss, got {:?}", other),
    }
    assert_eq!(network.state_dict(), before);
}

#[test]
fn test_train_step_rejects_non_finite_loss_and_drops_the_cache() {
    let mut network = small_network(13);
    let before = network.state_dict();
    let bad = Batch::from_rows(vec![vec![f64::NAN, 0.0]], vec![0]).unwrap();

    match train_step(&mut network, &bad, &NllLoss, &mut Sgd::new(0.1)) {
        Err(Error::NonFiniteLoss { loss, .. }) => assert!(loss.is_nan()),
        other => panic!("expected NonFiniteLoss, got {:?}", other),
    }
    assert!(matches!(network.backward(&Matrix::zeros(1, 2)), Err(Error::NoForwardPass)));
    assert_eq!(network.state_dict(), before);
}

#[test]
fn test_non_finite_gradient_is_fatal() {
    let mut network = small_network(12);
    let before = network.state_dict();

    match train_step(&mut network, &one_batch()[0], &NanGradient, &mut Sgd::new(0.1)) {
        Err(Error::NonFiniteGradient { parameter }) => {
            assert!(before.contains_key(&parameter), "unknown parameter {}", parameter);
        }
        other => panic!("expected NonFiniteGradient, got {:?}", other),
    }
    assert_eq!(network.state_dict(), before);

    let result = train_loop(
        &mut network,
        &mut one_batch(),
        &mut one_batch(),
        &NanGradient,
        &mut Adam::default_params(0.01),
        &TrainConfig::new(2, 0),
    );
    assert!(matches!(result, Err(Error::NonFiniteGradient { .. })));
    assert_eq!(network.state_dict(), before);
}

#[test]
fn test_shape_errors_surface_from_the_loop() {
    let mut network = small_network(8);
    let mut wrong = vec![Batch::from_rows(vec![vec![1.0, 2.0, 3.0]], vec![0]).unwrap()];
    let result = train_loop(
        &mut network,
        &mut wrong,
        &mut Vec::<Batch>::new(),
        &NllLoss,
        &mut Sgd::new(0.1),
        &TrainConfig::new(1, 0),
    );
    assert!(matches!(result, Err(Error::ShapeMismatch { .. })));
}

#[test]
fn test_empty_validation_source_reports_none() {
    let mut network = small_network(9);
    let report = train_loop(
        &mut network,
        &mut one_batch(),
        &mut Vec::<Batch>::new(),
        &NllLoss,
        &mut Sgd::new(0.1),
        &TrainConfig::new(2, 1),
    )
    .unwrap();

    assert_eq!(report.steps, 2);
    for stats in &report.epochs {
        assert!(stats.val_loss.is_none());
        assert!(stats.val_accuracy.is_none());
    }
}

#[test]
fn test_evaluate_counts_samples_and_keeps_mode() {
    let mut network = small_network(10);
    let mut source = DataLoader::new(blobs(25, 11), 10, false).unwrap();
    assert_eq!(source.batches().count(), 3);

    let evaluation = evaluate(&network, &mut source, &NllLoss).unwrap().unwrap();
    assert_eq!(evaluation.samples, 25);
    assert!((0.0..=1.0).contains(&evaluation.accuracy));
    assert!(evaluation.loss.is_finite() && evaluation.loss > 0.0);
    assert!(network.is_training());

    network.eval();
    let again = evaluate(&network, &mut source, &NllLoss).unwrap().unwrap();
    assert_eq!(again, evaluation);
}

#[test]
fn test_batch_rejects_label_count_mismatch() {
    let inputs = Matrix::zeros(3, 2);
    assert!(matches!(Batch::new(inputs, vec![0, 1]), Err(Error::ShapeMismatch { .. })));
    assert!(Batch::from_rows(vec![], vec![]).is_err());
}
