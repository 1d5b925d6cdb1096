//! Content fingerprints for version deltas.

use sha2::{Digest, Sha256};

/// Compute a SHA-256 hex digest of the given bytes.
pub fn sha256_hex(data: &[u8]) -> String {
    let hash = Sha256::digest(data);
    format!("{hash:x}")
}

/// Fingerprint a version delta.
///
/// `serde_json` serializes object keys in sorted order (no `preserve_order`
/// feature in this workspace), so two deltas with the same entries always
/// hash the same. A missing delta hashes like JSON `null`.
pub fn delta_hash(delta: Option<&serde_json::Value>) -> String {
    let canonical = match delta {
        Some(value) => value.to_string(),
        None => serde_json::Value::Null.to_string(),
    };
    sha256_hex(canonical.as_bytes())
}
