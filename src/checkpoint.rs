//! On-disk checkpoint: architecture fields plus a named parameter snapshot.
//!
//! The file is a single pretty-printed JSON object:
//!
//! ```json
//! {
//!   "input_size": 784,
//!   "output_size": 10,
//!   "hidden_layers": [512, 256, 128],
//!   "dropout": 0.5,
//!   "state_dict": { "hidden_layers.0.weight": { "rows": 784, "cols": 512, "data": [...] }, ... },
//!   "metadata": null
//! }
//! ```
//!
//! `serde_json` is built with `float_roundtrip`, so every `f64` reads back
//! bit-identical.

use std::ffi::OsString;
use std::fs::{self, File};
use std::io::{BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::Result;
use crate::network::config::NetworkConfig;
use crate::network::metadata::ModelMetadata;
use crate::network::network::{Network, StateDict};

fn default_dropout() -> f64 {
    0.5
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Checkpoint {
    pub input_size: usize,
    pub output_size: usize,
    pub hidden_layers: Vec<usize>,
    /// Older checkpoints omit this; they load with the 0.5 default.
    #[serde(default = "default_dropout")]
    pub dropout: f64,
    pub state_dict: StateDict,
    #[serde(default)]
    pub metadata: Option<ModelMetadata>,
}

impl Checkpoint {
    /// Snapshots the architecture and current parameters of `network`.
    pub fn from_network(network: &Network) -> Checkpoint {
        let config = network.config();
        Checkpoint {
            input_size: config.input_size,
            output_size: config.output_size,
            hidden_layers: config.hidden_layers.clone(),
            dropout: config.dropout,
            state_dict: network.state_dict(),
            metadata: None,
        }
    }

    pub fn with_metadata(mut self, metadata: ModelMetadata) -> Checkpoint {
        self.metadata = Some(metadata);
        self
    }

    /// Architecture implied by the stored size fields.
    pub fn config(&self) -> Result<NetworkConfig> {
        NetworkConfig::new(
            self.input_size,
            self.output_size,
            self.hidden_layers.clone(),
            self.dropout,
        )
    }

    /// Rebuilds a network from the size fields and loads the parameters.
    ///
    /// Fails with a shape mismatch when the snapshot disagrees with the
    /// architecture the size fields describe.
    pub fn into_network(self) -> Result<Network> {
        let mut network = Network::new(self.config()?)?;
        network.load_state_dict(&self.state_dict)?;
        Ok(network)
    }

    /// Loads the parameters into an existing network, which must have the
    /// same architecture.
    pub fn load_into(&self, network: &mut Network) -> Result<()> {
        network.load_state_dict(&self.state_dict)
    }

    /// Writes the checkpoint as pretty-printed JSON.
    ///
    /// The record goes to a `.tmp` sibling first and is renamed over `path`
    /// once complete, so a failed save leaves any previous file intact.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        let tmp = temp_path(path);
        if let Err(e) = self.write_json(&tmp) {
            let _ = fs::remove_file(&tmp);
            return Err(e);
        }
        fs::rename(&tmp, path)?;
        debug!(path = %path.display(), "saved checkpoint");
        Ok(())
    }

    fn write_json(&self, path: &Path) -> Result<()> {
        let mut writer = BufWriter::new(File::create(path)?);
        serde_json::to_writer_pretty(&mut writer, self)?;
        writer.flush()?;
        writer.get_ref().sync_all()?;
        Ok(())
    }

    /// Reads a checkpoint previously written by `save`.
    pub fn load(path: impl AsRef<Path>) -> Result<Checkpoint> {
        let file = File::open(path.as_ref())?;
        let reader = BufReader::new(file);
        let checkpoint: Checkpoint = serde_json::from_reader(reader)?;
        debug!(
            path = %path.as_ref().display(),
            hidden = ?checkpoint.hidden_layers,
            "loaded checkpoint"
        );
        Ok(checkpoint)
    }
}

fn temp_path(path: &Path) -> PathBuf {
    let mut name = path.file_name().map(OsString::from).unwrap_or_default();
    name.push(".tmp");
    path.with_file_name(name)
}

/// Saves `network` to `path`.
pub fn save_checkpoint(network: &Network, path: impl AsRef<Path>) -> Result<()> {
    Checkpoint::from_network(network).save(path)
}

/// Loads `path` and rebuilds the network it describes.
pub fn load_checkpoint(path: impl AsRef<Path>) -> Result<Network> {
    Checkpoint::load(path)?.into_network()
}
