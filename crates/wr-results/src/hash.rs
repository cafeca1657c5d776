//! Content-based hashing of run specifications.

use serde::Serialize;
use sha2::{Digest, Sha256};

/// SHA-256 of the JSON form of `spec`, as lowercase hex.
pub fn compute_spec_hash<T: Serialize>(spec: &T) -> String {
    let mut hasher = Sha256::new();

    let spec_json = serde_json::to_string(spec).unwrap_or_default();
    hasher.update(spec_json.as_bytes());

    let result = hasher.finalize();
    format!("{:x}", result)
}
