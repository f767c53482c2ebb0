//! Hash primitives for the authenticated log.
//!
//! Leaf and interior node hashes use SHA-256 with distinct single-byte
//! domain-separation prefixes (0x00 for leaves, 0x01 for interior nodes),
//! so an interior node can never be reinterpreted as a leaf or vice versa.
//! This is the RFC 6962 hashing convention.

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::fmt;

use crate::{MerkleError, MerkleResult, HASH_LENGTH};

/// A 256-bit hash value: leaf hashes, interior node hashes, and roots.
#[derive(
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    PartialOrd,
    Ord,
    Serialize,
    Deserialize,
    Default,
    bincode::Encode,
    bincode::Decode,
)]
pub struct HashValue([u8; HASH_LENGTH]);

impl HashValue {
    /// The zero hash (all zeros)
    pub const ZERO: HashValue = HashValue([0u8; HASH_LENGTH]);

    /// Create a new HashValue from a fixed-size array
    pub fn new(bytes: [u8; HASH_LENGTH]) -> Self {
        Self(bytes)
    }

    /// Create a HashValue from a slice
    pub fn from_slice(bytes: &[u8]) -> MerkleResult<Self> {
        if bytes.len() != HASH_LENGTH {
            return Err(MerkleError::InvalidHashLength {
                expected: HASH_LENGTH,
                got: bytes.len(),
            });
        }
        let mut arr = [0u8; HASH_LENGTH];
        arr.copy_from_slice(bytes);
        Ok(Self(arr))
    }

    /// Create a HashValue from hex string
    pub fn from_hex(hex_str: &str) -> MerkleResult<Self> {
        let hex_str = hex_str.strip_prefix("0x").unwrap_or(hex_str);
        let bytes = hex::decode(hex_str)
            .map_err(|e| MerkleError::InvalidInput(format!("Invalid hex: {}", e)))?;
        Self::from_slice(&bytes)
    }

    /// Get the underlying bytes
    pub fn as_bytes(&self) -> &[u8; HASH_LENGTH] {
        &self.0
    }

    /// Convert to a Vec<u8>
    pub fn to_vec(&self) -> Vec<u8> {
        self.0.to_vec()
    }
}

impl fmt::Display for HashValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "0x{}", hex::encode(self.0))
    }
}

impl fmt::Debug for HashValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "HashValue({})", self)
    }
}

impl AsRef<[u8]> for HashValue {
    fn as_ref(&self) -> &[u8] {
        &self.0
    }
}

impl From<[u8; HASH_LENGTH]> for HashValue {
    fn from(bytes: [u8; HASH_LENGTH]) -> Self {
        Self(bytes)
    }
}

/// Domain separation prefixes for hashing
pub mod prefix {
    /// Prefix for leaf hashes
    pub const LEAF: &[u8] = &[0x00];
    /// Prefix for interior node hashes
    pub const NODE: &[u8] = &[0x01];
}

fn finalize(hasher: Sha256) -> HashValue {
    let result = hasher.finalize();
    let mut bytes = [0u8; HASH_LENGTH];
    bytes.copy_from_slice(&result);
    HashValue(bytes)
}

/// Hash an entry's canonical bytes into a leaf hash.
pub fn leaf_hash(data: &[u8]) -> HashValue {
    let mut hasher = Sha256::new();
    hasher.update(prefix::LEAF);
    hasher.update(data);
    finalize(hasher)
}

/// Hash two child hashes into their parent interior node hash.
pub fn node_hash(left: &HashValue, right: &HashValue) -> HashValue {
    let mut hasher = Sha256::new();
    hasher.update(prefix::NODE);
    hasher.update(left.as_bytes());
    hasher.update(right.as_bytes());
    finalize(hasher)
}

/// Root of the empty tree: SHA-256 of the empty string, no prefix.
pub fn empty_root() -> HashValue {
    finalize(Sha256::new())
}
