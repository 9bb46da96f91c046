//! Content fingerprinting for soft-404 detection.
//!
//! A fingerprint is a CRC32 over a bounded sample of the response body. The
//! baseline is taken once from a page that cannot exist; every later response
//! is fingerprinted the same way and compared against it.

use std::sync::OnceLock;

/// CRC32 of the first `length` bytes of `content`, with the last byte of that
/// window dropped.
///
/// The trailing byte is never hashed: a 20-byte body sampled at 10 hashes
/// bytes `0..9`, a 5-byte body hashes `0..4`. Baseline and comparison both go
/// through this function, so the window must stay exactly as it is.
pub fn compute_limited_crc(content: &[u8], length: usize) -> u32 {
    let window = &content[..content.len().min(length)];
    let sampled = &window[..window.len().saturating_sub(1)];
    crc32fast::hash(sampled)
}

/// Single-assignment cell holding the root not-found fingerprint.
///
/// Written by the baseline phase, read by every existence check. A second
/// write is refused so a late baseline worker can never change the reference
/// under running classifiers.
#[derive(Debug, Default)]
pub struct BaselineCell {
    crc: OnceLock<u32>,
}

impl BaselineCell {
    pub fn new() -> Self {
        Self::default()
    }

    /// Cell that already holds `crc` (tests, or a baseline computed elsewhere).
    pub fn with_value(crc: u32) -> Self {
        let cell = Self::new();
        let _ = cell.crc.set(crc);
        cell
    }

    /// Publish the baseline. Returns false if one was already published.
    pub fn publish(&self, crc: u32) -> bool {
        self.crc.set(crc).is_ok()
    }

    pub fn get(&self) -> Option<u32> {
        self.crc.get().copied()
    }
}
