//! Byte <-> bit conversion, MSB first within each byte.
//!
//! Bits are stored one per `u8` (0 or 1) so they map directly onto sample
//! low bits.

/// Expand bytes into bits, MSB first. Output length is `8 * data.len()`.
pub fn bytes_to_bits(data: &[u8]) -> Vec<u8> {
    let mut bits = Vec::with_capacity(data.len() * 8);
    for &byte in data {
        for bit_pos in (0..8).rev() {
            bits.push((byte >> bit_pos) & 1);
        }
    }
    bits
}

/// Pack bits (MSB first) back into bytes.
///
/// A trailing group shorter than 8 bits is dropped, not zero-padded. Callers
/// that cannot guarantee a multiple of 8 accept that truncation.
pub fn bits_to_bytes(bits: &[u8]) -> Vec<u8> {
    bits.chunks_exact(8)
        .map(|chunk| {
            chunk
                .iter()
                .fold(0u8, |byte, &bit| (byte << 1) | (bit & 1))
        })
        .collect()
}
