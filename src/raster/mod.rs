use std::path::Path;

use image::{ImageFormat, RgbImage};
use log::{debug, warn};
use thiserror::Error;

use crate::pixels::{self, BufferError, SampleBuffer};

#[derive(Error, Debug)]
pub enum RasterError {
    #[error("failed to read image file: {0}")]
    Io(#[from] std::io::Error),
    #[error("image error: {0}")]
    Image(#[from] image::ImageError),
    #[error(transparent)]
    Buffer(#[from] BufferError),
}

/// Channels per pixel after normalisation (RGB, 8 bits per sample).
pub const CHANNELS: u8 = 3;

/// Wrap an RGB image as a flat sample buffer.
pub fn from_rgb(img: RgbImage) -> Result<SampleBuffer<u8>, RasterError> {
    let (width, height) = img.dimensions();
    Ok(SampleBuffer::new(width, height, CHANNELS, img.into_raw())?)
}

/// Rebuild an RGB image from a 3-channel sample buffer.
pub fn to_rgb(buffer: SampleBuffer<u8>) -> Result<RgbImage, RasterError> {
    let (width, height, channels) = (buffer.width(), buffer.height(), buffer.channels());
    let expected = width as usize * height as usize * CHANNELS as usize;
    if channels != CHANNELS {
        return Err(BufferError::ShapeMismatch {
            width,
            height,
            channels,
            expected,
            got: buffer.sample_count(),
        }
        .into());
    }
    let count = buffer.sample_count();
    RgbImage::from_raw(width, height, buffer.into_samples()).ok_or_else(|| {
        BufferError::ShapeMismatch {
            width,
            height,
            channels,
            expected,
            got: count,
        }
        .into()
    })
}

/// Load any supported image and normalise it to 3-channel 8-bit samples.
///
/// The format is sniffed from the file contents, not the extension.
pub fn load(path: &Path) -> Result<SampleBuffer<u8>, RasterError> {
    let bytes = std::fs::read(path)?;
    debug!("read {} bytes from {}", bytes.len(), path.display());
    load_from_memory(&bytes)
}

/// Decode an in-memory image and normalise it to 3-channel 8-bit samples.
pub fn load_from_memory(bytes: &[u8]) -> Result<SampleBuffer<u8>, RasterError> {
    let img = image::load_from_memory(bytes)?;
    debug!("decoded {:?} image, {}x{}", img.color(), img.width(), img.height());
    from_rgb(img.to_rgb8())
}

/// Write the buffer as PNG. Any other encoding would destroy the low bits,
/// so PNG is used whatever the extension says.
pub fn save_png(buffer: SampleBuffer<u8>, path: &Path) -> Result<(), RasterError> {
    let is_png = path
        .extension()
        .and_then(|e| e.to_str())
        .map_or(false, |e| e.eq_ignore_ascii_case("png"));
    if !is_png {
        warn!("{} does not end in .png; writing PNG data anyway", path.display());
    }

    to_rgb(buffer)?.save_with_format(path, ImageFormat::Png)?;
    Ok(())
}

/// Embedding capacity of an image file in bytes; 0 if it cannot be read.
pub fn capacity_of_file(path: &Path) -> usize {
    match load(path) {
        Ok(buffer) => pixels::capacity_bytes(&buffer),
        Err(e) => {
            debug!("capacity check failed for {}: {}", path.display(), e);
            0
        }
    }
}
