mod bits;
pub mod config;
mod crypto;
mod frame;
pub mod pipeline;
mod pixels;
pub mod raster;
mod tag;

pub use config::SealConfig;
pub use crypto::{EnvelopeError, MasterSecret};
pub use frame::FrameError;
pub use pipeline::embed::embed_file;
pub use pipeline::verify::verify_file;
pub use pipeline::{capacity_bytes, Outcome, SealError, Sealer, Verification};
pub use pixels::{BufferError, Sample, SampleBuffer};
pub use tag::Metadata;
