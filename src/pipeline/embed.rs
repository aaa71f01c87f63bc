use std::path::Path;

use anyhow::{Context, Result};
use chrono::{SecondsFormat, Utc};
use log::{debug, info};

use super::{SealError, Sealer};
use crate::config::SealConfig;
use crate::crypto;
use crate::frame;
use crate::pixels::{self, Sample, SampleBuffer};
use crate::raster;
use crate::tag::{self, Metadata};

impl Sealer {
    /// Seal tag -> envelope -> frame -> sample low bits.
    ///
    /// On `CapacityExceeded` the buffer is left untouched.
    pub fn embed<S: Sample>(
        &self,
        buffer: &mut SampleBuffer<S>,
        metadata: Option<&Metadata>,
    ) -> Result<(), SealError> {
        let plaintext = tag::build(metadata);
        let envelope = crypto::seal(self.secret(), plaintext.as_bytes())?;
        debug!(
            "sealed {}-byte tag into {}-character envelope",
            plaintext.len(),
            envelope.len()
        );

        frame::embed_frame(buffer, envelope.as_bytes())?;
        Ok(())
    }
}

/// Metadata attached to file-level seals: UTC timestamp and source filename.
pub fn file_metadata(input_path: &Path) -> Metadata {
    let mut metadata =
        Metadata::new().with("timestamp", Utc::now().to_rfc3339_opts(SecondsFormat::Secs, true));
    if let Some(name) = input_path.file_name().and_then(|n| n.to_str()) {
        metadata.insert("original_filename", name);
    }
    metadata
}

/// Full embed pipeline: image file -> RGB samples -> seal -> PNG file.
pub fn embed_file(sealer: &Sealer, input_path: &Path, output_path: &Path, cfg: &SealConfig) -> Result<()> {
    info!("loading image: {}", input_path.display());
    let mut buffer = raster::load(input_path)
        .with_context(|| format!("failed to load image {}", input_path.display()))?;

    let capacity = pixels::capacity_bytes(&buffer);
    info!(
        "{}x{} image, capacity {} bytes",
        buffer.width(),
        buffer.height(),
        capacity
    );
    if capacity < cfg.min_capacity_bytes {
        anyhow::bail!(
            "image too small for embedding a SeAl tag: capacity {} bytes, need at least {}",
            capacity,
            cfg.min_capacity_bytes
        );
    }

    let metadata = cfg.include_metadata.then(|| file_metadata(input_path));
    match sealer.embed(&mut buffer, metadata.as_ref()) {
        Ok(()) => {}
        Err(e) if e.is_capacity_exceeded() => {
            anyhow::bail!("image too small for embedding a SeAl tag: {}", e);
        }
        Err(e) => return Err(e).context("failed to embed SeAl tag"),
    }

    raster::save_png(buffer, output_path)
        .with_context(|| format!("failed to write {}", output_path.display()))?;

    info!("sealed image written to {}", output_path.display());
    Ok(())
}
