pub mod batch;
pub mod idx;
pub mod image;
pub mod loader;

pub use batch::{Batch, BatchSource};
pub use idx::{Dataset, Normalize};
pub use loader::DataLoader;
