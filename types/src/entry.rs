//! Log entries: the opaque key-value payloads committed to the log.

use serde::{Deserialize, Serialize};
use std::fmt;

use veridb_merkle::{leaf_hash, HashValue};

/// A single key-value pair submitted by a client. Immutable once appended;
/// a rewrite of the same key appends a new entry at a new index.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize, bincode::Encode, bincode::Decode)]
pub struct Entry {
    pub key: Vec<u8>,
    pub value: Vec<u8>,
}

impl Entry {
    pub fn new(key: impl Into<Vec<u8>>, value: impl Into<Vec<u8>>) -> Self {
        Self {
            key: key.into(),
            value: value.into(),
        }
    }

    /// Canonical byte encoding hashed into the leaf:
    /// `u64-BE key length || key || value`.
    ///
    /// The length prefix keeps `("ab", "c")` and `("a", "bc")` distinct.
    pub fn encode_for_leaf(&self) -> Vec<u8> {
        let mut buf = Vec::with_capacity(8 + self.key.len() + self.value.len());
        buf.extend_from_slice(&(self.key.len() as u64).to_be_bytes());
        buf.extend_from_slice(&self.key);
        buf.extend_from_slice(&self.value);
        buf
    }

    /// The leaf hash committing this entry into the tree.
    pub fn leaf_hash(&self) -> HashValue {
        leaf_hash(&self.encode_for_leaf())
    }
}

impl fmt::Debug for Entry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Entry")
            .field("key", &hex::encode(&self.key))
            .field("value_len", &self.value.len())
            .finish()
    }
}
