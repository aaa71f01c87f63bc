pub mod embed;
pub mod verify;

use thiserror::Error;

use crate::crypto::{self, EnvelopeError, MasterSecret};
use crate::frame::FrameError;
use crate::tag::Metadata;

pub use crate::pixels::capacity_bytes;

#[derive(Error, Debug, PartialEq, Eq)]
pub enum SealError {
    #[error(transparent)]
    Frame(#[from] FrameError),
    #[error(transparent)]
    Envelope(#[from] EnvelopeError),
}

impl SealError {
    /// The sealed frame does not fit into the buffer.
    pub fn is_capacity_exceeded(&self) -> bool {
        matches!(self, SealError::Frame(FrameError::CapacityExceeded { .. }))
    }
}

/// Seals and verifies images under one master secret.
///
/// Holds no other state; every embed or extract call derives its own key from
/// a fresh or recovered salt.
///
/// # Example
///
/// ```rust
/// use seai::{Metadata, SampleBuffer, Sealer};
///
/// let sealer = Sealer::new("s3cr3t");
/// let mut buffer = SampleBuffer::new(64, 64, 3, vec![128u8; 64 * 64 * 3]).unwrap();
///
/// let metadata = Metadata::new().with("model", "diffusion-v2");
/// sealer.embed(&mut buffer, Some(&metadata)).unwrap();
///
/// let result = sealer.extract(&buffer);
/// assert!(result.found && result.verified);
/// assert_eq!(result.metadata.unwrap().get("model"), Some("diffusion-v2"));
/// ```
#[derive(Debug)]
pub struct Sealer {
    secret: MasterSecret,
}

impl Sealer {
    /// Takes ownership of the secret so that the only copy is the one zeroed
    /// when the sealer drops. Pass an owned `String` or `Vec<u8>` to avoid
    /// leaving a copy behind.
    pub fn new(secret: impl Into<Vec<u8>>) -> Self {
        Self {
            secret: MasterSecret::new(secret),
        }
    }

    /// SHA-256 fingerprint of the configured secret, for logs.
    pub fn fingerprint(&self) -> String {
        crypto::fingerprint(self.secret.as_bytes())
    }

    fn secret(&self) -> &[u8] {
        self.secret.as_bytes()
    }
}

/// Why an extraction ended the way it did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    Verified,
    NoTagFound,
    MalformedEnvelope,
    AuthenticationFailed,
    NotASealTag,
}

/// Result of looking for a seal in a buffer. Never an error: every failure
/// is reported through `outcome`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Verification {
    /// A frame with the magic marker was present.
    pub found: bool,
    /// The envelope authenticated and carried a genuine seal tag.
    pub verified: bool,
    pub outcome: Outcome,
    /// Decrypted tag plaintext, only when verified.
    pub plaintext: Option<String>,
    /// Metadata parsed from the plaintext, when present and well formed.
    pub metadata: Option<Metadata>,
}

impl Verification {
    fn failed(outcome: Outcome) -> Self {
        Self {
            found: outcome != Outcome::NoTagFound,
            verified: false,
            outcome,
            plaintext: None,
            metadata: None,
        }
    }

    pub fn message(&self) -> &'static str {
        if self.verified {
            "SeAl tag verified!"
        } else {
            "This image was not generated by AI."
        }
    }

    pub fn details(&self) -> &'static str {
        match self.outcome {
            Outcome::Verified => "This image contains a valid AI-generated SeAl tag.",
            Outcome::NoTagFound => "No valid SeAl tag found in the image.",
            Outcome::MalformedEnvelope => "SeAl tag found but verification failed: envelope is malformed.",
            Outcome::AuthenticationFailed => {
                "SeAl tag found but verification failed: tampered data or wrong key."
            }
            Outcome::NotASealTag => "SeAl tag found but verification failed: not a SeAl tag.",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sealer_takes_secret_without_copying() {
        let secret = String::from("owned master secret");
        let ptr = secret.as_ptr();
        let sealer = Sealer::new(secret);
        assert_eq!(sealer.secret().as_ptr(), ptr);
        assert_eq!(sealer.secret(), b"owned master secret");
    }
}
