use serde::{Deserialize, Serialize};

use crate::data::idx::Normalize;

/// Optional annotations stored alongside a checkpoint.
/// All fields are Option<> so checkpoints without metadata deserialize cleanly.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct ModelMetadata {
    pub description: Option<String>,
    /// Human-readable class labels for the output layer
    /// (e.g. ["T-shirt/top", "Trouser", ...]).
    pub class_names: Option<Vec<String>>,
    /// (height, width) of the training images.
    pub image_dims: Option<(usize, usize)>,
    /// Normalisation applied to training inputs; inference must repeat it.
    pub normalize: Option<Normalize>,
}

impl ModelMetadata {
    /// Label for class `index`, falling back to the index itself.
    pub fn class_name(&self, index: usize) -> String {
        self.class_names
            .as_ref()
            .and_then(|names| names.get(index))
            .cloned()
            .unwrap_or_else(|| index.to_string())
    }
}
