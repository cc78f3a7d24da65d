pub mod config;
pub mod metadata;
pub mod network;

pub use config::NetworkConfig;
pub use metadata::ModelMetadata;
pub use network::{Network, StateDict};
