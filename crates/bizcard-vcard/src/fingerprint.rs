//! Content fingerprints for encoded cards.
//!
//! The fingerprint is a quoted SHA-256 hex digest of the payload, usable as an
//! HTTP ETag for `.vcf` downloads and as a cache key for rendered QR images.

use sha2::{Digest, Sha256};

/// Compute the fingerprint of an encoded vCard payload.
pub fn fingerprint(payload: &str) -> String {
  let hash = Sha256::digest(payload.as_bytes());
  format!("\"{}\"", hex::encode(hash))
}
