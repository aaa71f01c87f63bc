//! On-buffer frame written into sample low bits.
//!
//! ```text
//! samples [0..32)   length prefix (BE u32) = bit length of magic + payload
//! samples [32..)    "SEAI" ++ payload, MSB first per byte
//! ```

use byteorder::{BigEndian, ByteOrder};
use log::debug;
use thiserror::Error;

use crate::bits;
use crate::config;
use crate::pixels::{BufferError, Sample, SampleBuffer};

#[derive(Error, Debug, PartialEq, Eq)]
pub enum FrameError {
    #[error("capacity exceeded: need {need} samples, have {have}")]
    CapacityExceeded { need: usize, have: usize },
    #[error("no seal frame found")]
    NoTagFound,
    #[error("buffer access failed: {0}")]
    Buffer(#[from] BufferError),
}

/// Number of samples a frame carrying `payload_len` bytes occupies.
pub fn frame_bits(payload_len: usize) -> usize {
    config::LENGTH_PREFIX_BITS + (config::MAGIC.len() + payload_len) * 8
}

/// Write `payload` as a framed bit stream into the low bits of `buffer`.
///
/// The capacity check happens before any sample is touched, so on
/// `CapacityExceeded` the buffer is unchanged.
pub fn embed_frame<S: Sample>(buffer: &mut SampleBuffer<S>, payload: &[u8]) -> Result<(), FrameError> {
    let have = buffer.sample_count();
    let need = frame_bits(payload.len());
    if need > have {
        return Err(FrameError::CapacityExceeded { need, have });
    }

    let mut body = Vec::with_capacity(config::MAGIC.len() + payload.len());
    body.extend_from_slice(config::MAGIC);
    body.extend_from_slice(payload);
    let body_bits = bits::bytes_to_bits(&body);

    let body_len = u32::try_from(body_bits.len())
        .map_err(|_| FrameError::CapacityExceeded { need, have })?;
    let mut header = [0u8; 4];
    BigEndian::write_u32(&mut header, body_len);

    let stream = bits::bytes_to_bits(&header).into_iter().chain(body_bits);
    for (index, bit) in stream.enumerate() {
        buffer.write_low_bit(index, bit)?;
    }

    debug!("embedded frame: {} payload bytes, {} of {} samples", payload.len(), need, have);
    Ok(())
}

/// Recover the payload from a framed buffer.
///
/// Every failure, including out-of-range reads, collapses into `NoTagFound`.
pub fn extract_frame<S: Sample>(buffer: &SampleBuffer<S>) -> Result<Vec<u8>, FrameError> {
    let count = buffer.sample_count();
    let prefix = config::LENGTH_PREFIX_BITS;

    let header_bits = read_bits(buffer, 0, prefix)?;
    let body_len = BigEndian::read_u32(&bits::bits_to_bytes(&header_bits)) as usize;

    if body_len == 0 || body_len > count.saturating_sub(prefix) {
        debug!("implausible frame length {} for {} samples", body_len, count);
        return Err(FrameError::NoTagFound);
    }

    let body = bits::bits_to_bytes(&read_bits(buffer, prefix, body_len)?);
    match body.strip_prefix(config::MAGIC.as_slice()) {
        Some(payload) => Ok(payload.to_vec()),
        None => Err(FrameError::NoTagFound),
    }
}

fn read_bits<S: Sample>(buffer: &SampleBuffer<S>, start: usize, len: usize) -> Result<Vec<u8>, FrameError> {
    (start..start + len)
        .map(|i| buffer.read_low_bit(i).map_err(|_| FrameError::NoTagFound))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn buffer_with_samples(count: usize, fill: u8) -> SampleBuffer<u8> {
        SampleBuffer::new(count as u32, 1, 1, vec![fill; count]).unwrap()
    }

    #[test]
    fn test_embed_extract_roundtrip() {
        let mut buf = buffer_with_samples(1024, 0x7F);
        embed_frame(&mut buf, b"hello frame").unwrap();
        assert_eq!(extract_frame(&buf).unwrap(), b"hello frame");
    }

    #[test]
    fn test_layout() {
        let mut buf = buffer_with_samples(frame_bits(1), 0);
        embed_frame(&mut buf, b"A").unwrap();

        let low: Vec<u8> = buf.samples().iter().map(|s| s & 1).collect();
        // 5 bytes of body = 40 bits
        assert_eq!(BigEndian::read_u32(&bits::bits_to_bytes(&low[..32])), 40);
        assert_eq!(bits::bits_to_bytes(&low[32..]), b"SEAIA");
    }

    #[test]
    fn test_high_bits_untouched() {
        let mut buf = buffer_with_samples(512, 0b1100_0110);
        embed_frame(&mut buf, b"xyz").unwrap();
        assert!(buf.samples().iter().all(|s| s & !1 == 0b1100_0110));
    }

    #[test]
    fn test_capacity_boundary() {
        let payload = b"exactly";
        let need = frame_bits(payload.len());

        let mut exact = buffer_with_samples(need, 0x55);
        embed_frame(&mut exact, payload).unwrap();
        assert_eq!(extract_frame(&exact).unwrap(), payload);

        let mut short = buffer_with_samples(need - 1, 0x55);
        let before = short.clone();
        let err = embed_frame(&mut short, payload).unwrap_err();
        assert_eq!(err, FrameError::CapacityExceeded { need, have: need - 1 });
        assert_eq!(short, before);
    }

    #[test]
    fn test_untagged_buffer() {
        assert_eq!(extract_frame(&buffer_with_samples(4096, 0)), Err(FrameError::NoTagFound));
        // All low bits set: length prefix is u32::MAX, far beyond capacity.
        assert_eq!(extract_frame(&buffer_with_samples(4096, 0xFF)), Err(FrameError::NoTagFound));
    }

    #[test]
    fn test_too_small_for_prefix() {
        assert_eq!(extract_frame(&buffer_with_samples(16, 1)), Err(FrameError::NoTagFound));
    }

    #[test]
    fn test_wrong_magic() {
        let mut buf = buffer_with_samples(256, 0);
        embed_frame(&mut buf, b"payload").unwrap();
        // flip the low bit of the first magic sample
        let bit = buf.read_low_bit(32).unwrap();
        buf.write_low_bit(32, bit ^ 1).unwrap();
        assert_eq!(extract_frame(&buf), Err(FrameError::NoTagFound));
    }

    #[test]
    fn test_length_beyond_remaining_samples() {
        let mut buf = buffer_with_samples(256, 0);
        let mut header = [0u8; 4];
        BigEndian::write_u32(&mut header, 256 - 31);
        for (i, bit) in bits::bytes_to_bits(&header).into_iter().enumerate() {
            buf.write_low_bit(i, bit).unwrap();
        }
        assert_eq!(extract_frame(&buf), Err(FrameError::NoTagFound));
    }

    #[test]
    fn test_partial_trailing_byte_truncated() {
        // Body length 36 bits: "SEAI" plus a 4-bit fragment that is dropped.
        let mut buf = buffer_with_samples(128, 0);
        let mut header = [0u8; 4];
        BigEndian::write_u32(&mut header, 36);
        let stream = bits::bytes_to_bits(&header)
            .into_iter()
            .chain(bits::bytes_to_bits(b"SEAI"))
            .chain([1, 0, 1, 0]);
        for (i, bit) in stream.enumerate() {
            buf.write_low_bit(i, bit).unwrap();
        }
        assert_eq!(extract_frame(&buf).unwrap(), Vec::<u8>::new());
    }
}
