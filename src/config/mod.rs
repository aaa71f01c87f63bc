/// Magic marker written in front of the envelope text inside the frame.
pub const MAGIC: &[u8; 4] = b"SEAI";

/// Width of the big-endian length prefix, in bits (one sample per bit).
pub const LENGTH_PREFIX_BITS: usize = 32;

/// Literal every genuine seal tag plaintext starts with.
pub const SEAL_MARKER: &str = "SeAl:AI-GENERATED";

// Envelope layout: salt || nonce || tag || ciphertext
pub const SALT_SIZE: usize = 16;
pub const NONCE_SIZE: usize = 12;
pub const AEAD_TAG_SIZE: usize = 16;
pub const ENVELOPE_HEADER_SIZE: usize = SALT_SIZE + NONCE_SIZE + AEAD_TAG_SIZE; // 44

// PBKDF2-HMAC-SHA256 parameters. Part of the envelope format, never negotiated.
pub const PBKDF2_ROUNDS: u32 = 100_000;
pub const KEY_SIZE: usize = 32;

/// Images with less room than this are rejected before embedding.
pub const DEFAULT_MIN_CAPACITY_BYTES: usize = 100;

/// Environment variable the master secret is read from.
pub const MASTER_KEY_ENV: &str = "SEAL_MASTER_KEY";

/// Development fallback used when no secret is configured.
pub const DEFAULT_MASTER_KEY: &str = "default-master-key-change-in-production";

/// Minimum length for a master secret to count as strong.
pub const MIN_STRONG_SECRET_LEN: usize = 32;

/// Compute how many payload bytes fit into `sample_count` samples once the
/// length prefix is reserved.
pub fn capacity_for_samples(sample_count: usize) -> usize {
    sample_count.saturating_sub(LENGTH_PREFIX_BITS) / 8
}

/// Check that a secret is at least 32 characters and mixes upper case,
/// lower case and digits.
pub fn secret_is_strong(secret: &str) -> bool {
    if secret.chars().count() < MIN_STRONG_SECRET_LEN {
        return false;
    }

    let has_upper = secret.chars().any(|c| c.is_uppercase());
    let has_lower = secret.chars().any(|c| c.is_lowercase());
    let has_digit = secret.chars().any(|c| c.is_ascii_digit());

    has_upper && has_lower && has_digit
}

/// Runtime configuration for file-level seal operations.
#[derive(Debug, Clone)]
pub struct SealConfig {
    /// Reject inputs whose capacity (in bytes) is below this.
    pub min_capacity_bytes: usize,
    /// Attach timestamp and original filename metadata to the tag.
    pub include_metadata: bool,
}

impl Default for SealConfig {
    fn default() -> Self {
        Self {
            min_capacity_bytes: DEFAULT_MIN_CAPACITY_BYTES,
            include_metadata: true,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_capacity_for_samples() {
        assert_eq!(capacity_for_samples(64 * 64 * 3), 1532);
        assert_eq!(capacity_for_samples(200), 21);
        assert_eq!(capacity_for_samples(39), 0);
        assert_eq!(capacity_for_samples(0), 0);
    }

    #[test]
    fn test_secret_strength() {
        assert!(secret_is_strong("Abcdefghijklmnopqrstuvwxyz0123456789"));
        assert!(!secret_is_strong("Short1a"));
        assert!(!secret_is_strong("abcdefghijklmnopqrstuvwxyz0123456789"));
        assert!(!secret_is_strong("ABCDEFGHIJKLMNOPQRSTUVWXYZ0123456789"));
        assert!(!secret_is_strong("AbcdefghijklmnopqrstuvwxyzAbcdefghij"));
        assert!(!secret_is_strong(DEFAULT_MASTER_KEY));
    }
}
