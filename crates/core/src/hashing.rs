//! Shared SHA-256 hex digest utility.
//!
//! Scene content hashes decide whether a stored embedding or style
//! feedback still matches the scene's current text.

use sha2::{Digest, Sha256};

/// Compute a SHA-256 hex digest of the given bytes.
pub fn sha256_hex(data: &[u8]) -> String {
    let hash = Sha256::digest(data);
    format!("{hash:x}")
}

/// Hash of a scene's content as stored in `scenes.content_hash`.
pub fn content_hash(content: &str) -> String {
    sha256_hex(content.as_bytes())
}
