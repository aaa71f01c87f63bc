use thiserror::Error;

use crate::config;

#[derive(Error, Debug, PartialEq, Eq)]
pub enum BufferError {
    #[error("buffer needs at least one channel")]
    NoChannels,
    #[error("shape mismatch: {width}x{height}x{channels} needs {expected} samples, got {got}")]
    ShapeMismatch {
        width: u32,
        height: u32,
        channels: u8,
        expected: usize,
        got: usize,
    },
    #[error("shape {width}x{height}x{channels} overflows the addressable sample count")]
    TooLarge { width: u32, height: u32, channels: u8 },
    #[error("sample index {index} out of range (have {count} samples)")]
    IndexOutOfRange { index: usize, count: usize },
}

/// A fixed-width unsigned sample whose low bit can carry one payload bit.
pub trait Sample: Copy {
    fn low_bit(self) -> u8;

    /// Return the sample with its low bit replaced by `bit`; all higher bits
    /// are kept.
    fn with_low_bit(self, bit: u8) -> Self;
}

macro_rules! impl_sample {
    ($($t:ty),*) => {
        $(
            impl Sample for $t {
                #[inline]
                fn low_bit(self) -> u8 {
                    (self & 1) as u8
                }

                #[inline]
                fn with_low_bit(self, bit: u8) -> Self {
                    (self & !1) | (bit & 1) as $t
                }
            }
        )*
    };
}

impl_sample!(u8, u16, u32);

/// Row-major raster of samples, one per channel per pixel.
///
/// Shape and sample width are fixed at construction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SampleBuffer<S> {
    width: u32,
    height: u32,
    channels: u8,
    samples: Vec<S>,
}

impl<S: Sample> SampleBuffer<S> {
    pub fn new(width: u32, height: u32, channels: u8, samples: Vec<S>) -> Result<Self, BufferError> {
        if channels == 0 {
            return Err(BufferError::NoChannels);
        }
        let expected = (width as usize)
            .checked_mul(height as usize)
            .and_then(|n| n.checked_mul(channels as usize))
            .ok_or(BufferError::TooLarge {
                width,
                height,
                channels,
            })?;
        if samples.len() != expected {
            return Err(BufferError::ShapeMismatch {
                width,
                height,
                channels,
                expected,
                got: samples.len(),
            });
        }

        Ok(Self {
            width,
            height,
            channels,
            samples,
        })
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn channels(&self) -> u8 {
        self.channels
    }

    pub fn sample_count(&self) -> usize {
        self.samples.len()
    }

    pub fn samples(&self) -> &[S] {
        &self.samples
    }

    pub fn into_samples(self) -> Vec<S> {
        self.samples
    }

    /// Low bit of flat sample `index`.
    pub fn read_low_bit(&self, index: usize) -> Result<u8, BufferError> {
        self.samples
            .get(index)
            .map(|s| s.low_bit())
            .ok_or(BufferError::IndexOutOfRange {
                index,
                count: self.samples.len(),
            })
    }

    /// Overwrite the low bit of flat sample `index` with `bit`.
    pub fn write_low_bit(&mut self, index: usize, bit: u8) -> Result<(), BufferError> {
        let count = self.samples.len();
        let sample = self
            .samples
            .get_mut(index)
            .ok_or(BufferError::IndexOutOfRange { index, count })?;
        *sample = sample.with_low_bit(bit);
        Ok(())
    }
}

/// Maximum payload size in bytes that fits after the length prefix.
/// Zero means nothing can be embedded here.
pub fn capacity_bytes<S: Sample>(buffer: &SampleBuffer<S>) -> usize {
    config::capacity_for_samples(buffer.sample_count())
}
