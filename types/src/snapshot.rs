//! Tree snapshots: the `(size, root)` pairs clients anchor trust to.

use serde::{Deserialize, Serialize};
use std::fmt;

use veridb_merkle::{empty_root, HashValue};

/// The state of the log at a given size. Append-only means the snapshot
/// for a size is stable forever: later appends never change it.
#[derive(Clone, Copy, PartialEq, Eq, Serialize, Deserialize, bincode::Encode, bincode::Decode)]
pub struct TreeSnapshot {
    pub size: u64,
    pub root: HashValue,
}

impl TreeSnapshot {
    pub fn new(size: u64, root: HashValue) -> Self {
        Self { size, root }
    }

    /// Snapshot of the empty log.
    pub fn genesis() -> Self {
        Self {
            size: 0,
            root: empty_root(),
        }
    }
}

impl fmt::Debug for TreeSnapshot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "TreeSnapshot(size={}, root={})", self.size, self.root)
    }
}

impl fmt::Display for TreeSnapshot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}@{}", self.root, self.size)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_genesis_commits_to_the_empty_log() {
        let genesis = TreeSnapshot::genesis();
        assert_eq!(genesis.size, 0);
        assert_eq!(genesis.root, empty_root());
    }

    #[test]
    fn test_serde_roundtrip() {
        let snapshot = TreeSnapshot::new(7, empty_root());
        let json = serde_json::to_string(&snapshot).unwrap();
        assert_eq!(serde_json::from_str::<TreeSnapshot>(&json).unwrap(), snapshot);
    }
}
