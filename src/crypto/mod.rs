//! Authenticated envelope: PBKDF2-HMAC-SHA256 key derivation + AES-256-GCM.
//!
//! Envelope bytes are `salt(16) || nonce(12) || tag(16) || ciphertext(N)`,
//! carried as standard base64 text.

use std::fmt;

use aes_gcm::{
    aead::{Aead, KeyInit},
    Aes256Gcm, Key, Nonce,
};
use base64::{engine::general_purpose::STANDARD, Engine as _};
use rand::RngCore;
use sha2::{Digest, Sha256};
use thiserror::Error;

use crate::config;

#[derive(Error, Debug, PartialEq, Eq)]
pub enum EnvelopeError {
    #[error("malformed envelope: {0}")]
    Malformed(String),
    #[error("authentication failed: envelope tampered or wrong secret")]
    AuthenticationFailed,
    #[error("encryption failed: {0}")]
    Encryption(String),
}

/// Long-lived shared secret keys are derived from. Zeroed on drop.
pub struct MasterSecret(Vec<u8>);

impl MasterSecret {
    /// Owned buffers are moved in as-is, not copied.
    pub fn new(secret: impl Into<Vec<u8>>) -> Self {
        Self(secret.into())
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }
}

impl From<&str> for MasterSecret {
    fn from(secret: &str) -> Self {
        Self::new(secret.as_bytes())
    }
}

impl fmt::Debug for MasterSecret {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("MasterSecret(<redacted>)")
    }
}

impl Drop for MasterSecret {
    fn drop(&mut self) {
        secure_zero(&mut self.0);
    }
}

fn random_bytes<const N: usize>() -> [u8; N] {
    let mut bytes = [0u8; N];
    rand::thread_rng().fill_bytes(&mut bytes);
    bytes
}

/// Derive a 32-byte key from a secret and salt with PBKDF2-HMAC-SHA256.
pub fn derive_key(secret: &[u8], salt: &[u8; config::SALT_SIZE]) -> [u8; config::KEY_SIZE] {
    let mut key = [0u8; config::KEY_SIZE];
    pbkdf2::pbkdf2_hmac::<Sha256>(secret, salt, config::PBKDF2_ROUNDS, &mut key);
    key
}

/// Encrypt `plaintext` into a base64 envelope under a fresh salt and nonce.
pub fn seal(secret: &[u8], plaintext: &[u8]) -> Result<String, EnvelopeError> {
    let salt: [u8; config::SALT_SIZE] = random_bytes();
    let nonce: [u8; config::NONCE_SIZE] = random_bytes();

    let mut key = derive_key(secret, &salt);
    let cipher = Aes256Gcm::new(Key::<Aes256Gcm>::from_slice(&key));
    let sealed = cipher.encrypt(Nonce::from_slice(&nonce), plaintext);
    secure_zero(&mut key);

    // aes-gcm appends the tag; the envelope stores it ahead of the ciphertext.
    let sealed = sealed.map_err(|e| EnvelopeError::Encryption(e.to_string()))?;
    let (ciphertext, tag) = sealed.split_at(sealed.len() - config::AEAD_TAG_SIZE);

    let mut envelope = Vec::with_capacity(config::ENVELOPE_HEADER_SIZE + ciphertext.len());
    envelope.extend_from_slice(&salt);
    envelope.extend_from_slice(&nonce);
    envelope.extend_from_slice(tag);
    envelope.extend_from_slice(ciphertext);

    Ok(STANDARD.encode(envelope))
}

/// Decode, authenticate and decrypt a base64 envelope.
pub fn open(secret: &[u8], envelope_text: &[u8]) -> Result<Vec<u8>, EnvelopeError> {
    let envelope = STANDARD
        .decode(envelope_text)
        .map_err(|e| EnvelopeError::Malformed(e.to_string()))?;

    if envelope.len() < config::ENVELOPE_HEADER_SIZE {
        return Err(EnvelopeError::Malformed(format!(
            "need at least {} bytes, have {}",
            config::ENVELOPE_HEADER_SIZE,
            envelope.len()
        )));
    }

    let (salt, rest) = envelope.split_at(config::SALT_SIZE);
    let (nonce, rest) = rest.split_at(config::NONCE_SIZE);
    let (tag, ciphertext) = rest.split_at(config::AEAD_TAG_SIZE);

    let mut salt_arr = [0u8; config::SALT_SIZE];
    salt_arr.copy_from_slice(salt);

    let mut sealed = Vec::with_capacity(ciphertext.len() + tag.len());
    sealed.extend_from_slice(ciphertext);
    sealed.extend_from_slice(tag);

    let mut key = derive_key(secret, &salt_arr);
    let cipher = Aes256Gcm::new(Key::<Aes256Gcm>::from_slice(&key));
    let result = cipher.decrypt(Nonce::from_slice(nonce), sealed.as_slice());
    secure_zero(&mut key);

    result.map_err(|_| EnvelopeError::AuthenticationFailed)
}

/// SHA-256 hex digest of a secret, safe to log.
pub fn fingerprint(secret: &[u8]) -> String {
    format!("{:x}", Sha256::digest(secret))
}

/// Securely zero a key buffer.
pub fn secure_zero(buf: &mut [u8]) {
    for byte in buf.iter_mut() {
        unsafe {
            std::ptr::write_volatile(byte, 0);
        }
    }
    std::sync::atomic::fence(std::sync::atomic::Ordering::SeqCst);
}
