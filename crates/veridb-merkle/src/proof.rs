//! Inclusion and consistency proofs with offline verification.
//!
//! Verification is pure and side-effect free: a client holding nothing but
//! a proof, a leaf hash, and an expected root can establish membership and
//! append-only consistency without trusting the server that produced the
//! proof. The fold algorithms mirror RFC 9162 and follow the same split
//! rule as [`crate::tree`]; a proof generated under any other shape rule
//! will not verify.

use serde::{Deserialize, Serialize};

use crate::error::{MerkleError, MerkleResult};
use crate::hash::{node_hash, HashValue};

/// Evidence that a specific leaf belongs to the tree of a specific size.
///
/// `path` holds the sibling subtree hashes from the leaf up to the root.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, bincode::Encode, bincode::Decode)]
pub struct InclusionProof {
    leaf_index: u64,
    tree_size: u64,
    path: Vec<HashValue>,
}

impl InclusionProof {
    pub fn new(leaf_index: u64, tree_size: u64, path: Vec<HashValue>) -> Self {
        Self {
            leaf_index,
            tree_size,
            path,
        }
    }

    pub fn leaf_index(&self) -> u64 {
        self.leaf_index
    }

    pub fn tree_size(&self) -> u64 {
        self.tree_size
    }

    pub fn path(&self) -> &[HashValue] {
        &self.path
    }

    /// Recompute the root from `leaf_hash` by folding the sibling path,
    /// and compare it to `expected_root`.
    ///
    /// Any malformed shape — index outside the claimed size, or a sibling
    /// count that cannot match the claimed size — fails verification.
    pub fn verify(&self, leaf_hash: &HashValue, expected_root: &HashValue) -> MerkleResult<()> {
        if self.tree_size == 0 {
            return Err(MerkleError::MalformedProof(
                "an empty tree contains no leaves".to_string(),
            ));
        }
        if self.leaf_index >= self.tree_size {
            return Err(MerkleError::OutOfRange {
                index: self.leaf_index,
                size: self.tree_size,
            });
        }

        let mut node = self.leaf_index;
        let mut last = self.tree_size - 1;
        let mut hash = *leaf_hash;

        for sibling in &self.path {
            if last == 0 {
                return Err(MerkleError::MalformedProof(format!(
                    "sibling path too long for tree size {}",
                    self.tree_size
                )));
            }
            if node & 1 == 1 || node == last {
                hash = node_hash(sibling, &hash);
                if node & 1 == 0 {
                    // Right border of the tree: climb past the levels where
                    // this node has no right sibling.
                    while node & 1 == 0 && node != 0 {
                        node >>= 1;
                        last >>= 1;
                    }
                }
            } else {
                hash = node_hash(&hash, sibling);
            }
            node >>= 1;
            last >>= 1;
        }

        if last != 0 {
            return Err(MerkleError::MalformedProof(format!(
                "sibling path too short for tree size {}",
                self.tree_size
            )));
        }
        if hash != *expected_root {
            return Err(MerkleError::RootMismatch {
                computed: hash,
                expected: *expected_root,
            });
        }
        Ok(())
    }
}

/// Evidence that the tree of `old_size` leaves is a left-anchored prefix
/// of the tree of `new_size` leaves: no historical leaf was altered,
/// reordered, or removed.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, bincode::Encode, bincode::Decode)]
pub struct ConsistencyProof {
    old_size: u64,
    new_size: u64,
    path: Vec<HashValue>,
}

impl ConsistencyProof {
    pub fn new(old_size: u64, new_size: u64, path: Vec<HashValue>) -> Self {
        Self {
            old_size,
            new_size,
            path,
        }
    }

    pub fn old_size(&self) -> u64 {
        self.old_size
    }

    pub fn new_size(&self) -> u64 {
        self.new_size
    }

    pub fn path(&self) -> &[HashValue] {
        &self.path
    }

    /// Recompute both roots from the proof and compare against
    /// `old_root` and `new_root`.
    ///
    /// Equal sizes require an empty path and identical roots. `old_size`
    /// of zero is a range error: trust cannot be anchored to nothing.
    pub fn verify(&self, old_root: &HashValue, new_root: &HashValue) -> MerkleResult<()> {
        if self.old_size == 0 || self.old_size > self.new_size {
            return Err(MerkleError::InvalidRange {
                old_size: self.old_size,
                new_size: self.new_size,
            });
        }
        if self.old_size == self.new_size {
            if !self.path.is_empty() {
                return Err(MerkleError::MalformedProof(
                    "consistency proof between equal sizes must be empty".to_string(),
                ));
            }
            if old_root != new_root {
                return Err(MerkleError::RootMismatch {
                    computed: *old_root,
                    expected: *new_root,
                });
            }
            return Ok(());
        }

        let mut node = self.old_size - 1;
        let mut last = self.new_size - 1;
        // The old tree's rightmost complete subtree is shared with the new
        // tree; skip the levels where the old border node is a right child.
        while node & 1 == 1 {
            node >>= 1;
            last >>= 1;
        }

        let mut rest = self.path.iter();
        let (mut old_hash, mut new_hash) = if self.old_size.is_power_of_two() {
            // The old root itself is a node of the new tree.
            (*old_root, *old_root)
        } else {
            let first = rest.next().ok_or_else(|| {
                MerkleError::MalformedProof("empty consistency path".to_string())
            })?;
            (*first, *first)
        };

        for hash in rest {
            if last == 0 {
                return Err(MerkleError::MalformedProof(format!(
                    "consistency path too long for sizes {}..{}",
                    self.old_size, self.new_size
                )));
            }
            if node & 1 == 1 || node == last {
                old_hash = node_hash(hash, &old_hash);
                new_hash = node_hash(hash, &new_hash);
                if node & 1 == 0 {
                    while node & 1 == 0 && node != 0 {
                        node >>= 1;
                        last >>= 1;
                    }
                }
            } else {
                new_hash = node_hash(&new_hash, hash);
            }
            node >>= 1;
            last >>= 1;
        }

        if last != 0 {
            return Err(MerkleError::MalformedProof(format!(
                "consistency path too short for sizes {}..{}",
                self.old_size, self.new_size
            )));
        }
        if old_hash != *old_root {
            return Err(MerkleError::RootMismatch {
                computed: old_hash,
                expected: *old_root,
            });
        }
        if new_hash != *new_root {
            return Err(MerkleError::RootMismatch {
                computed: new_hash,
                expected: *new_root,
            });
        }
        Ok(())
    }
}
