use std::error::Error;
use std::path::PathBuf;

use clap::{Parser, Subcommand};
use ferrite_mlp::commands::{run_evaluate, run_inspect, run_predict, run_train};
use ferrite_mlp::config::{Overrides, RunConfig};
use ferrite_mlp::logging::init_logging;

#[derive(Parser)]
#[command(name = "ferrite-mlp", version, about = "Train and query a fully-connected image classifier")]
struct Cli {
    /// Increase log verbosity (-v debug, -vv trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Train a network and write a checkpoint
    Train {
        /// YAML run configuration; defaults apply when omitted
        #[arg(short, long, value_name = "PATH")]
        config: Option<PathBuf>,
        #[arg(short, long, value_name = "INT")]
        epochs: Option<usize>,
        /// Where to write the checkpoint
        #[arg(long, value_name = "PATH")]
        checkpoint: Option<PathBuf>,
        #[arg(long, value_name = "INT")]
        seed: Option<u64>,
    },
    /// Report loss and accuracy of a checkpoint on an IDX dataset
    Evaluate {
        #[arg(long, value_name = "PATH")]
        checkpoint: PathBuf,
        #[arg(long, value_name = "PATH")]
        images: PathBuf,
        #[arg(long, value_name = "PATH")]
        labels: PathBuf,
        #[arg(short, long, default_value_t = 64)]
        batch_size: usize,
    },
    /// Classify a single image file
    Predict {
        #[arg(long, value_name = "PATH")]
        checkpoint: PathBuf,
        #[arg(long, value_name = "PATH")]
        image: PathBuf,
        #[arg(short = 'k', long, default_value_t = 5)]
        top_k: usize,
    },
    /// Describe the model stored in a checkpoint
    Inspect {
        #[arg(long, value_name = "PATH")]
        checkpoint: PathBuf,
    },
}

fn main() -> Result<(), Box<dyn Error>> {
    let args = Cli::parse();
    init_logging(args.verbose)?;

    match args.command {
        Command::Train { config, epochs, checkpoint, seed } => {
            let config = match config {
                Some(path) => RunConfig::load(path)?,
                None => RunConfig::default(),
            };
            let config = config.merge_overrides(Overrides { epochs, checkpoint, seed });
            let (_, report) = run_train(&config)?;
            if let Some(last) = report.last() {
                println!("Final training loss: {:.4}", last.train_loss);
                if let (Some(loss), Some(acc)) = (last.val_loss, last.val_accuracy) {
                    println!("Validation loss: {:.4}  accuracy: {:.2}%", loss, acc * 100.0);
                }
            }
            println!("Checkpoint written to {}", config.checkpoint.0.display());
        }
        Command::Evaluate { checkpoint, images, labels, batch_size } => {
            match run_evaluate(&checkpoint, &images, &labels, batch_size)? {
                Some(e) => {
                    println!("Samples:  {}", e.samples);
                    println!("Loss:     {:.4}", e.loss);
                    println!("Accuracy: {:.2}%", e.accuracy * 100.0);
                }
                None => println!("Dataset is empty; nothing to evaluate."),
            }
        }
        Command::Predict { checkpoint, image, top_k } => {
            let ranked = run_predict(&checkpoint, &image, top_k)?;
            println!("{:>6}  {:<20}  {:>11}", "Class", "Label", "Probability");
            println!("{}", "-".repeat(41));
            for p in &ranked {
                println!("{:>6}  {:<20}  {:>10.2}%", p.class, p.name, p.probability * 100.0);
            }
        }
        Command::Inspect { checkpoint } => {
            let summary = run_inspect(&checkpoint)?;
            println!("Input size:    {}", summary.input_size);
            println!("Hidden layers: {:?}", summary.hidden_layers);
            println!("Output size:   {}", summary.output_size);
            println!("Dropout:       {}", summary.dropout);
            println!("Parameters:    {}", summary.parameter_count);
            if let Some(description) = summary.metadata.and_then(|m| m.description) {
                println!("Description:   {}", description);
            }
        }
    }
    Ok(())
}
