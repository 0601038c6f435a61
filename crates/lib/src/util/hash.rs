//! Hashing utilities for content-addressed declarations.
//!
//! This module provides:
//! - `ObjectHash`: A truncated 20-character hash of a serialized value
//! - `Hashable`: Blanket hashing for anything that serializes to JSON
//! - `short_digest()`: Uppercase hex prefix used for logical ids

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::consts::OBJ_HASH_PREFIX_LEN;

pub type HashError = serde_json::Error;

/// A content-addressed hash identifying a declared object.
///
/// The hash is a 20-character truncated SHA-256 of the JSON-serialized struct.
///
/// # Format
///
/// The hash is a lowercase hexadecimal string, e.g., `"a1b2c3d4e5f6789012ab"`.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct ObjectHash(pub String);

impl std::fmt::Display for ObjectHash {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    write!(f, "{}", self.0)
  }
}

pub trait Hashable: Serialize {
  fn compute_hash(&self) -> Result<ObjectHash, HashError> {
    let serialized = serde_json::to_string(self)?;
    let mut hasher = Sha256::new();
    hasher.update(serialized.as_bytes());
    let full = format!("{:x}", hasher.finalize());
    Ok(ObjectHash(full[..OBJ_HASH_PREFIX_LEN].to_string()))
  }
}

/// Returns the first `len` uppercase hex characters of the SHA-256 of `data`.
///
/// `len` is clamped to the full digest length (64).
pub fn short_digest(data: &[u8], len: usize) -> String {
  let digest = Sha256::digest(data);
  let encoded = hex::encode_upper(digest);
  encoded[..len.min(encoded.len())].to_string()
}
