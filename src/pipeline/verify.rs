use std::path::Path;

use log::{debug, info, warn};

use super::{Outcome, Sealer, Verification};
use crate::crypto::{self, EnvelopeError};
use crate::frame;
use crate::pixels::{Sample, SampleBuffer};
use crate::raster;
use crate::tag;

impl Sealer {
    /// Sample low bits -> frame -> envelope -> seal tag check.
    pub fn extract<S: Sample>(&self, buffer: &SampleBuffer<S>) -> Verification {
        let payload = match frame::extract_frame(buffer) {
            Ok(payload) => payload,
            Err(e) => {
                debug!("no frame: {}", e);
                return Verification::failed(Outcome::NoTagFound);
            }
        };

        let plaintext = match crypto::open(self.secret(), &payload) {
            Ok(plaintext) => plaintext,
            Err(EnvelopeError::AuthenticationFailed) => {
                debug!("envelope did not authenticate");
                return Verification::failed(Outcome::AuthenticationFailed);
            }
            Err(e) => {
                debug!("envelope rejected: {}", e);
                return Verification::failed(Outcome::MalformedEnvelope);
            }
        };

        match String::from_utf8(plaintext) {
            Ok(text) if tag::is_valid(&text) => Verification {
                found: true,
                verified: true,
                outcome: Outcome::Verified,
                metadata: tag::parse_metadata(&text),
                plaintext: Some(text),
            },
            _ => Verification::failed(Outcome::NotASealTag),
        }
    }
}

/// Full verify pipeline: image file -> RGB samples -> extract.
///
/// An unreadable file is reported as `NoTagFound`.
pub fn verify_file(sealer: &Sealer, input_path: &Path) -> Verification {
    info!("verifying image: {}", input_path.display());
    let buffer = match raster::load(input_path) {
        Ok(buffer) => buffer,
        Err(e) => {
            warn!("could not read {}: {}", input_path.display(), e);
            return Verification::failed(Outcome::NoTagFound);
        }
    };

    let result = sealer.extract(&buffer);
    info!("verification outcome: {:?}", result.outcome);
    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bits;
    use crate::config;
    use crate::tag::Metadata;

    fn noisy_buffer(width: u32, height: u32) -> SampleBuffer<u8> {
        let len = (width * height * 3) as usize;
        let samples: Vec<u8> = (0..len).map(|i| (i * 37 % 256) as u8).collect();
        SampleBuffer::new(width, height, 3, samples).unwrap()
    }

    fn embedded_payload_len(buffer: &SampleBuffer<u8>) -> usize {
        let prefix: Vec<u8> = (0..32).map(|i| buffer.read_low_bit(i).unwrap()).collect();
        let bytes = bits::bits_to_bytes(&prefix);
        let body_bits = u32::from_be_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]) as usize;
        body_bits / 8 - config::MAGIC.len()
    }

    fn flip(buffer: &mut SampleBuffer<u8>, index: usize) {
        let bit = buffer.read_low_bit(index).unwrap();
        buffer.write_low_bit(index, bit ^ 1).unwrap();
    }

    #[test]
    fn test_roundtrip_with_metadata() {
        let sealer = Sealer::new("another secret");
        let metadata = Metadata::new()
            .with("timestamp", "2026-10-19T08:30:00Z")
            .with("original_filename", "a;b=c.png");
        let mut buf = noisy_buffer(40, 40);

        sealer.embed(&mut buf, Some(&metadata)).unwrap();
        let result = sealer.extract(&buf);
        assert!(result.found && result.verified);
        assert_eq!(result.metadata, Some(metadata));
    }

    #[test]
    fn test_sixteen_bit_samples() {
        let sealer = Sealer::new("wide");
        let mut buf = SampleBuffer::new(32, 32, 3, vec![0xABCDu16; 32 * 32 * 3]).unwrap();
        sealer.embed(&mut buf, None).unwrap();
        assert!(sealer.extract(&buf).verified);
        assert!(buf.samples().iter().all(|s| s | 1 == 0xABCD));
    }

    #[test]
    fn test_untagged_buffer_not_found() {
        let sealer = Sealer::new("k");
        let result = sealer.extract(&noisy_buffer(32, 32));
        assert!(!result.found);
        assert!(!result.verified);
        assert_eq!(result.outcome, Outcome::NoTagFound);
        assert_eq!(result.message(), "This image was not generated by AI.");
    }

    #[test]
    fn test_wrong_secret_found_not_verified() {
        let mut buf = noisy_buffer(32, 32);
        Sealer::new("right").embed(&mut buf, None).unwrap();

        let result = Sealer::new("wrong").extract(&buf);
        assert!(result.found);
        assert!(!result.verified);
        assert_eq!(result.outcome, Outcome::AuthenticationFailed);
        assert_eq!(result.plaintext, None);
    }

    #[test]
    fn test_single_bit_flip_in_tag_or_ciphertext_detected() {
        let sealer = Sealer::new("tamper");
        let mut buf = noisy_buffer(32, 32);
        sealer.embed(&mut buf, None).unwrap();
        let payload_len = embedded_payload_len(&buf);

        // The tag starts at envelope bit 28 * 8; base64 carries 6 bits per
        // character, so its text starts at character 224 / 6 = 37.
        let tag_char = (config::SALT_SIZE + config::NONCE_SIZE) * 8 / 6;
        let payload_start = config::LENGTH_PREFIX_BITS + config::MAGIC.len() * 8;
        let region = payload_start + tag_char * 8..payload_start + payload_len * 8;
        assert!(region.len() >= 8 * 40);

        for index in region {
            let mut tampered = buf.clone();
            flip(&mut tampered, index);

            let result = sealer.extract(&tampered);
            assert!(result.found, "flip at sample {index} hid the frame");
            assert!(!result.verified, "flip at sample {index} went undetected");
        }
    }

    #[test]
    fn test_flip_in_magic_means_not_found() {
        let sealer = Sealer::new("k");
        let mut buf = noisy_buffer(32, 32);
        sealer.embed(&mut buf, None).unwrap();
        flip(&mut buf, 33);
        assert_eq!(sealer.extract(&buf).outcome, Outcome::NoTagFound);
    }

    #[test]
    fn test_authentic_envelope_without_marker() {
        let sealer = Sealer::new("k");
        let envelope = crypto::seal(b"k", b"SeAl:HUMAN-MADE").unwrap();
        let mut buf = noisy_buffer(32, 32);
        frame::embed_frame(&mut buf, envelope.as_bytes()).unwrap();

        let result = sealer.extract(&buf);
        assert!(result.found);
        assert!(!result.verified);
        assert_eq!(result.outcome, Outcome::NotASealTag);
    }

    #[test]
    fn test_garbage_payload_is_malformed() {
        let sealer = Sealer::new("k");
        let mut buf = noisy_buffer(16, 16);
        frame::embed_frame(&mut buf, b"!!not-base64!!").unwrap();
        assert_eq!(sealer.extract(&buf).outcome, Outcome::MalformedEnvelope);
    }

    #[test]
    fn test_verify_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let result = verify_file(&Sealer::new("k"), &dir.path().join("nope.png"));
        assert!(!result.found);
        assert_eq!(result.details(), "No valid SeAl tag found in the image.");
    }
}
