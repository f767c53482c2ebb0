//! In-memory implementation of the authenticated append-only log.
//!
//! Mirrors the RocksDB store's tree maintenance exactly (same node cache
//! shape, same roll-up on append) but holds everything behind a single
//! `RwLock`. Nothing survives a restart; intended for tests and embedded
//! use where durability is not required.

use std::collections::HashMap;

use parking_lot::RwLock;

use veridb_merkle::tree::{consistency_path, inclusion_path, root_at};
use veridb_merkle::{
    node_hash, ConsistencyProof, HashValue, InclusionProof, MerkleError, MerkleResult, NodeSource,
};
use veridb_types::{Entry, TreeSnapshot};

use crate::error::{StorageError, StorageResult};
use crate::log_store::{AppendOutcome, LogStore};

#[derive(Default)]
struct Inner {
    /// Entry plus its leaf hash, indexed by append order
    leaves: Vec<(Entry, HashValue)>,
    /// Complete-subtree hashes keyed by (level, position)
    nodes: HashMap<(u8, u64), HashValue>,
    /// Key -> append history, latest index last
    key_index: HashMap<Vec<u8>, Vec<u64>>,
}

impl NodeSource for Inner {
    fn node(&self, level: u8, position: u64) -> MerkleResult<HashValue> {
        self.nodes
            .get(&(level, position))
            .copied()
            .ok_or(MerkleError::NodeUnavailable { level, position })
    }
}

/// Volatile [`LogStore`] backed by plain collections.
#[derive(Default)]
pub struct MemoryLogStore {
    inner: RwLock<Inner>,
}

impl MemoryLogStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl LogStore for MemoryLogStore {
    fn append(&self, entry: Entry) -> StorageResult<AppendOutcome> {
        let mut inner = self.inner.write();

        let index = inner.leaves.len() as u64;
        let leaf = entry.leaf_hash();
        inner.nodes.insert((0, index), leaf);

        let mut level = 0u8;
        let mut position = index;
        let mut hash = leaf;
        while position & 1 == 1 {
            let sibling = inner.node(level, position - 1)?;
            hash = node_hash(&sibling, &hash);
            level += 1;
            position >>= 1;
            inner.nodes.insert((level, position), hash);
        }

        inner
            .key_index
            .entry(entry.key.clone())
            .or_default()
            .push(index);
        inner.leaves.push((entry, leaf));

        let new_size = index + 1;
        let root = root_at(&*inner, new_size)?;
        Ok(AppendOutcome {
            index,
            snapshot: TreeSnapshot::new(new_size, root),
        })
    }

    fn entry_at(&self, index: u64) -> StorageResult<Entry> {
        let inner = self.inner.read();
        let size = inner.leaves.len() as u64;
        inner
            .leaves
            .get(index as usize)
            .map(|(entry, _)| entry.clone())
            .ok_or(StorageError::NotFound { index, size })
    }

    fn latest_index(&self, key: &[u8]) -> StorageResult<Option<u64>> {
        let inner = self.inner.read();
        Ok(inner
            .key_index
            .get(key)
            .and_then(|history| history.last().copied()))
    }

    fn history(&self, key: &[u8]) -> StorageResult<Vec<u64>> {
        let inner = self.inner.read();
        Ok(inner.key_index.get(key).cloned().unwrap_or_default())
    }

    fn size(&self) -> StorageResult<u64> {
        Ok(self.inner.read().leaves.len() as u64)
    }

    fn root_at(&self, size: u64) -> StorageResult<HashValue> {
        let inner = self.inner.read();
        let committed = inner.leaves.len() as u64;
        if size > committed {
            return Err(StorageError::OutOfRange {
                index: size,
                size: committed,
            });
        }
        Ok(root_at(&*inner, size)?)
    }

    fn prove_inclusion(&self, index: u64, size: u64) -> StorageResult<InclusionProof> {
        let inner = self.inner.read();
        let committed = inner.leaves.len() as u64;
        if size > committed || index >= size {
            return Err(StorageError::OutOfRange { index, size });
        }
        let path = inclusion_path(&*inner, index, size)?;
        Ok(InclusionProof::new(index, size, path))
    }

    fn prove_consistency(&self, old_size: u64, new_size: u64) -> StorageResult<ConsistencyProof> {
        let inner = self.inner.read();
        let committed = inner.leaves.len() as u64;
        if old_size == 0 || old_size > new_size || new_size > committed {
            return Err(StorageError::InvalidRange {
                old_size,
                new_size,
                size: committed,
            });
        }
        let path = consistency_path(&*inner, old_size, new_size)?;
        Ok(ConsistencyProof::new(old_size, new_size, path))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(i: u64) -> Entry {
        Entry::new(
            format!("key-{}", i).into_bytes(),
            format!("value-{}", i).into_bytes(),
        )
    }

    #[test]
    fn test_append_and_read_back() {
        let store = MemoryLogStore::new();
        for i in 0..4u64 {
            let outcome = store.append(entry(i)).unwrap();
            assert_eq!(outcome.index, i);
        }
        assert_eq!(store.size().unwrap(), 4);
        assert_eq!(store.entry_at(2).unwrap(), entry(2));
        assert!(matches!(
            store.entry_at(4),
            Err(StorageError::NotFound { .. })
        ));
    }

    #[test]
    fn test_key_history() {
        let store = MemoryLogStore::new();
        store.append(Entry::new(b"k".to_vec(), b"v1".to_vec())).unwrap();
        store.append(Entry::new(b"k".to_vec(), b"v2".to_vec())).unwrap();
        assert_eq!(store.latest_index(b"k").unwrap(), Some(1));
        assert_eq!(store.history(b"k").unwrap(), vec![0, 1]);
        assert_eq!(store.latest_index(b"none").unwrap(), None);
    }

    #[test]
    fn test_matches_rocks_tree_shape() {
        // Both stores commit the same entries to the same roots.
        let store = MemoryLogStore::new();
        let mut roots = Vec::new();
        for i in 0..9u64 {
            roots.push(store.append(entry(i)).unwrap().snapshot.root);
        }
        for (i, root) in roots.iter().enumerate() {
            assert_eq!(store.root_at(i as u64 + 1).unwrap(), *root);
        }
    }

    #[test]
    fn test_proofs_verify() {
        let store = MemoryLogStore::new();
        for i in 0..6u64 {
            store.append(entry(i)).unwrap();
        }
        let root = store.root_at(6).unwrap();
        for index in 0..6u64 {
            let proof = store.prove_inclusion(index, 6).unwrap();
            proof
                .verify(&store.entry_at(index).unwrap().leaf_hash(), &root)
                .unwrap();
        }
        for old in 1..=6u64 {
            let proof = store.prove_consistency(old, 6).unwrap();
            proof.verify(&store.root_at(old).unwrap(), &root).unwrap();
        }
    }

    #[test]
    fn test_range_errors() {
        let store = MemoryLogStore::new();
        store.append(entry(0)).unwrap();
        assert!(matches!(
            store.prove_inclusion(0, 2),
            Err(StorageError::OutOfRange { .. })
        ));
        assert!(matches!(
            store.prove_consistency(0, 1),
            Err(StorageError::InvalidRange { .. })
        ));
        assert!(matches!(
            store.root_at(2),
            Err(StorageError::OutOfRange { .. })
        ));
    }
}
