//! Stable digests for telemetry: descriptor fingerprints and output digests.

use std::fmt;

use serde::{Deserialize, Serialize};

/// 32-byte blake3 digest.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Hash256(pub [u8; 32]);

impl Hash256 {
    pub fn to_hex(&self) -> String {
        blake3::Hash::from(self.0).to_hex().to_string()
    }
}

impl fmt::Display for Hash256 {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_hex())
    }
}

impl From<blake3::Hash> for Hash256 {
    fn from(h: blake3::Hash) -> Self {
        Hash256(h.into())
    }
}

/// Incremental digest over a sequence of text fields.
///
/// Every field is length-prefixed and optional fields carry a presence byte,
/// so `("ab", None)` and `("a", Some("b"))` never collide.
#[derive(Debug, Clone)]
pub struct Fingerprint {
    hasher: blake3::Hasher,
}

impl Fingerprint {
    pub fn new() -> Self {
        Self {
            hasher: blake3::Hasher::new(),
        }
    }

    pub fn field(mut self, value: &str) -> Self {
        self.hasher.update(&(value.len() as u64).to_le_bytes());
        self.hasher.update(value.as_bytes());
        self
    }

    pub fn optional(mut self, value: Option<&str>) -> Self {
        match value {
            Some(v) => {
                self.hasher.update(&[1]);
                self.field(v)
            }
            None => {
                self.hasher.update(&[0]);
                self
            }
        }
    }

    pub fn finish(&self) -> Hash256 {
        self.hasher.finalize().into()
    }
}

impl Default for Fingerprint {
    fn default() -> Self {
        Self::new()
    }
}

/// Digest of a value's JSON encoding. Used for whole-run output digests.
pub fn hash_serde<T: Serialize>(v: &T) -> Result<Hash256, crate::error::Error> {
    let bytes = serde_json::to_vec(v)?;
    Ok(blake3::hash(&bytes).into())
}
