use hex::encode as hex_encode;
use sha3::{Digest, Sha3_256};

/// Deterministic SHA3-256 fingerprint of file content, used to decide
/// whether a managed file needs rewriting.
pub fn content_fingerprint(content: &[u8]) -> String {
    let mut hasher = Sha3_256::new();
    hasher.update(content);
    let digest = hasher.finalize();
    hex_encode(digest)
}
