//! Parsing of the IDX binary format used by MNIST and its derivatives
//! (Fashion-MNIST, EMNIST, …).
//!
//! # IDX3 image file layout
//! ```text
//! bytes  0-1:   0x00 0x00   (reserved, must be zero)
//! byte   2:     0x08        (dtype = uint8)
//! byte   3:     0x03        (number of dimensions = 3)
//! bytes  4-7:   N           (number of images, big-endian u32)
//! bytes  8-11:  rows        (image height in pixels, big-endian u32)
//! bytes 12-15:  cols        (image width in pixels, big-endian u32)
//! bytes 16..:   N * rows * cols bytes, row-major, uint8
//! ```
//!
//! # IDX1 label file layout
//! ```text
//! bytes  0-1:   0x00 0x00   (reserved, must be zero)
//! byte   2:     0x08        (dtype = uint8)
//! byte   3:     0x01        (number of dimensions = 1)
//! bytes  4-7:   N           (number of labels, big-endian u32)
//! bytes  8..:   N bytes, each a class index in [0, n_classes)
//! ```

use std::path::Path;

use tracing::debug;

use crate::error::{Error, Result};

/// Samples held in memory: flattened inputs and their class indices.
#[derive(Debug, Clone, PartialEq)]
pub struct Dataset {
    pub inputs: Vec<Vec<f64>>,
    pub labels: Vec<usize>,
    /// Image height and width, when known.
    pub image_dims: Option<(usize, usize)>,
}

impl Dataset {
    pub fn len(&self) -> usize {
        self.labels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }

    /// Features per sample, or 0 for an empty dataset.
    pub fn feature_count(&self) -> usize {
        self.inputs.first().map(|row| row.len()).unwrap_or(0)
    }

    /// Applies `(x - mean) / std` to every feature in place.
    pub fn normalize(&mut self, normalize: Normalize) {
        for row in self.inputs.iter_mut() {
            for x in row.iter_mut() {
                *x = normalize.apply(*x);
            }
        }
    }
}

/// Per-feature affine normalisation `(x - mean) / std`.
///
/// The default maps pixels in [0, 1] onto [-1, 1].
#[derive(Debug, Clone, Copy, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct Normalize {
    pub mean: f64,
    pub std: f64,
}

impl Normalize {
    pub fn apply(&self, x: f64) -> f64 {
        (x - self.mean) / self.std
    }
}

impl Default for Normalize {
    fn default() -> Self {
        Normalize { mean: 0.5, std: 0.5 }
    }
}

fn be_u32(bytes: &[u8], offset: usize) -> usize {
    u32::from_be_bytes([
        bytes[offset], bytes[offset + 1], bytes[offset + 2], bytes[offset + 3],
    ]) as usize
}

fn check_header(bytes: &[u8], what: &str, dims: u8, header_len: usize) -> Result<()> {
    if bytes.len() < header_len {
        return Err(Error::Dataset(format!(
            "IDX {} file too short: expected at least {} header bytes, got {}.",
            what, header_len, bytes.len()
        )));
    }
    if bytes[0] != 0x00 || bytes[1] != 0x00 {
        return Err(Error::Dataset(format!(
            "IDX {} file: bytes 0-1 must be 0x00 0x00 (reserved), got 0x{:02X} 0x{:02X}.",
            what, bytes[0], bytes[1]
        )));
    }
    if bytes[2] != 0x08 {
        return Err(Error::Dataset(format!(
            "IDX {} file: byte 2 (dtype) must be 0x08 (uint8), got 0x{:02X}.",
            what, bytes[2]
        )));
    }
    if bytes[3] != dims {
        return Err(Error::Dataset(format!(
            "IDX {} file: byte 3 (dimensions) must be {}, got {}.",
            what, dims, bytes[3]
        )));
    }
    Ok(())
}

/// Parses an IDX3 image file and an IDX1 label file into a `Dataset`.
///
/// Pixels are divided by 255.0 so values lie in `[0.0, 1.0]`; labels must
/// be below `n_classes`.
pub fn parse_idx_pair(
    image_bytes: &[u8],
    label_bytes: &[u8],
    n_classes: usize,
) -> Result<Dataset> {
    check_header(image_bytes, "image", 0x03, 16)?;

    let n_items = be_u32(image_bytes, 4);
    let rows = be_u32(image_bytes, 8);
    let cols = be_u32(image_bytes, 12);

    let n_pixels = rows.checked_mul(cols).ok_or_else(|| {
        Error::Dataset(format!("IDX image file: rows * cols overflows (rows={}, cols={}).", rows, cols))
    })?;
    let required_image_len = n_items
        .checked_mul(n_pixels)
        .and_then(|n| n.checked_add(16))
        .ok_or_else(|| Error::Dataset("IDX image file: data length overflows.".to_owned()))?;

    if image_bytes.len() < required_image_len {
        return Err(Error::Dataset(format!(
            "IDX image file too short: header declares {} items of {}×{} pixels, \
             but file is only {} bytes total.",
            n_items, rows, cols, image_bytes.len()
        )));
    }

    check_header(label_bytes, "label", 0x01, 8)?;

    let label_count = be_u32(label_bytes, 4);
    if label_count != n_items {
        return Err(Error::Dataset(format!(
            "IDX file mismatch: image file declares {} items but label file declares {}.",
            n_items, label_count
        )));
    }
    if label_bytes.len() < 8 + n_items {
        return Err(Error::Dataset(format!(
            "IDX label file too short: header declares {} labels but file is only {} bytes.",
            n_items, label_bytes.len()
        )));
    }

    let labels: Vec<usize> = label_bytes[8..8 + n_items].iter().map(|&b| b as usize).collect();
    if let Some((i, &class)) = labels.iter().enumerate().find(|&(_, &c)| c >= n_classes) {
        return Err(Error::Dataset(format!(
            "IDX label at index {}: class index {} is out of range for n_classes={}.",
            i, class, n_classes
        )));
    }

    let inputs = if n_pixels == 0 {
        vec![Vec::new(); n_items]
    } else {
        image_bytes[16..required_image_len]
            .chunks_exact(n_pixels)
            .map(|chunk| chunk.iter().map(|&px| px as f64 / 255.0).collect())
            .collect()
    };

    Ok(Dataset { inputs, labels, image_dims: Some((rows, cols)) })
}

/// Reads and parses an image/label file pair from disk.
pub fn read_idx_pair(
    images: impl AsRef<Path>,
    labels: impl AsRef<Path>,
    n_classes: usize,
) -> Result<Dataset> {
    let image_bytes = std::fs::read(images.as_ref())?;
    let label_bytes = std::fs::read(labels.as_ref())?;
    let dataset = parse_idx_pair(&image_bytes, &label_bytes, n_classes)?;
    debug!(
        images = %images.as_ref().display(),
        samples = dataset.len(),
        features = dataset.feature_count(),
        "loaded IDX dataset"
    );
    Ok(dataset)
}
