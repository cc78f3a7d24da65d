//! Image decoding for single-sample prediction.
//!
//! Decodes PNG/JPEG/BMP/GIF, resizes to the network's input geometry,
//! converts to grayscale and scales pixels to [0, 1].

use std::path::Path;

use crate::error::Result;

/// Decodes `bytes`, resizes to `width × height` and returns a flat
/// `Vec<f64>` of length `width * height`.
pub fn grayscale_from_bytes(bytes: &[u8], width: u32, height: u32) -> Result<Vec<f64>> {
    let img = image::load_from_memory(bytes)?;
    let resized = img.resize_exact(width, height, image::imageops::FilterType::Lanczos3);
    let gray = resized.to_luma8();
    Ok(gray.pixels().map(|p| p.0[0] as f64 / 255.0).collect())
}

/// Reads an image file and converts it with `grayscale_from_bytes`.
pub fn load_grayscale(path: impl AsRef<Path>, width: u32, height: u32) -> Result<Vec<f64>> {
    let bytes = std::fs::read(path.as_ref())?;
    grayscale_from_bytes(&bytes, width, height)
}
