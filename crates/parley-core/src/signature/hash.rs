//! Stable content hashing
//!
//! SHA-256 backs every identifier in the engine: the full lowercase hex digest
//! names patterns and responses, the leading 32 bits name vectorizer tokens.

use sha2::{Digest, Sha256};

/// Token identifier: the first 32 bits of a word's SHA-256 digest
pub type TokenId = u32;

/// Lowercase hex SHA-256 of the exact text
pub fn content_hash(text: &str) -> String {
    format!("{:x}", Sha256::digest(text.as_bytes()))
}

/// Truncated 32-bit hash of a single (already lowercased) word
///
/// Equal to the first 8 hex digits of [`content_hash`] read as a big-endian number.
pub fn token_id(word: &str) -> TokenId {
    let digest = Sha256::digest(word.as_bytes());
    u32::from_be_bytes([digest[0], digest[1], digest[2], digest[3]])
}
