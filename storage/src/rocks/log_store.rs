//! RocksDB implementation of the authenticated append-only log.
//!
//! # Column Family Layout
//!
//! - `leaves`: `index: u64` -> `LeafRecord { entry, hash }`
//! - `nodes`: `(level: u8, position: u64)` -> `HashValue`
//!   Complete subtree hashes only. The node at `(level, position)` covers
//!   leaves `[position * 2^level, (position + 1) * 2^level)` and is written
//!   exactly once, by the append that completes the subtree. Immutable
//!   entries make every historical root and proof recomputable.
//! - `key_index`: raw key bytes -> `Vec<u64>` (append history, latest last)
//! - `meta`: committed log size
//!
//! Every append commits as a single `WriteBatch`: the leaf record, the
//! newly completed interior nodes, the key index update, and the size.
//! A crash between appends therefore never leaves a partial tree.

use std::path::Path;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use parking_lot::Mutex;
use tracing::debug;

use veridb_merkle::tree::{consistency_path, inclusion_path, root_at};
use veridb_merkle::{
    ConsistencyProof, HashValue, InclusionProof, MerkleError, MerkleResult, NodeSource,
};
use veridb_types::{Entry, TreeSnapshot};

use crate::error::{StorageError, StorageResult};
use crate::log_store::{AppendOutcome, LogStore};
use crate::rocks::core::{ColumnFamily, LedgerDb, RocksDBConfig};

/// Key for leaf records
#[derive(Clone, Debug, bincode::Encode, bincode::Decode)]
struct LeafKey {
    index: u64,
}

/// Key for interior node hashes: (level, position)
#[derive(Clone, Debug, bincode::Encode, bincode::Decode)]
struct NodeKey {
    level: u8,
    position: u64,
}

/// Stored leaf: the raw entry plus its leaf hash
#[derive(Clone, Debug, bincode::Encode, bincode::Decode)]
struct LeafRecord {
    entry: Entry,
    hash: HashValue,
}

/// Key for the committed size record in the meta column family
#[derive(Clone, Debug, bincode::Encode, bincode::Decode)]
struct MetaKey {
    tag: u8,
}

const META_SIZE_TAG: u8 = 0x01;

/// RocksDB-backed [`LogStore`].
///
/// Appends are linearized by a single mutex guarding index assignment and
/// node roll-up; this is the only serialization point in the store. Reads
/// and proof generation run lock-free against committed state.
pub struct RocksLogStore {
    db: Arc<LedgerDb>,
    append_lock: Mutex<()>,
    committed_size: AtomicU64,
}

impl RocksLogStore {
    /// Open (or create) a store at the given path.
    pub fn open(path: impl AsRef<Path>) -> StorageResult<Self> {
        Self::open_with_config(RocksDBConfig::new(path))
    }

    pub fn open_with_config(config: RocksDBConfig) -> StorageResult<Self> {
        let db = LedgerDb::open(config)?;
        let size: u64 = db
            .get(ColumnFamily::Meta, &MetaKey { tag: META_SIZE_TAG })?
            .unwrap_or(0);
        debug!(size, "opened log store");
        Ok(Self {
            db: Arc::new(db),
            append_lock: Mutex::new(()),
            committed_size: AtomicU64::new(size),
        })
    }

    fn committed(&self) -> u64 {
        self.committed_size.load(Ordering::Acquire)
    }

    fn leaf_record(&self, index: u64) -> StorageResult<Option<LeafRecord>> {
        self.db.get(ColumnFamily::Leaves, &LeafKey { index })
    }
}

impl NodeSource for RocksLogStore {
    fn node(&self, level: u8, position: u64) -> MerkleResult<HashValue> {
        match self
            .db
            .get::<_, HashValue>(ColumnFamily::Nodes, &NodeKey { level, position })
        {
            Ok(Some(hash)) => Ok(hash),
            Ok(None) => Err(MerkleError::NodeUnavailable { level, position }),
            Err(e) => Err(MerkleError::StorageError(e.to_string())),
        }
    }
}

impl LogStore for RocksLogStore {
    fn append(&self, entry: Entry) -> StorageResult<AppendOutcome> {
        let _guard = self.append_lock.lock();

        let index = self.committed();
        let leaf = entry.leaf_hash();

        let mut batch = self.db.batch();
        self.db.batch_put(
            &mut batch,
            ColumnFamily::Leaves,
            &LeafKey { index },
            &LeafRecord {
                entry: entry.clone(),
                hash: leaf,
            },
        )?;
        self.db.batch_put(
            &mut batch,
            ColumnFamily::Nodes,
            &NodeKey {
                level: 0,
                position: index,
            },
            &leaf,
        )?;

        // Roll up every subtree this leaf completes. At each level where
        // the current node is a right child, its left sibling is already
        // committed (it was completed by an earlier append), so the parent
        // hash is final and can be persisted.
        let mut level = 0u8;
        let mut position = index;
        let mut hash = leaf;
        while position & 1 == 1 {
            let sibling = self.node(level, position - 1)?;
            hash = veridb_merkle::node_hash(&sibling, &hash);
            level += 1;
            position >>= 1;
            self.db.batch_put(
                &mut batch,
                ColumnFamily::Nodes,
                &NodeKey { level, position },
                &hash,
            )?;
        }

        let mut history: Vec<u64> = self
            .db
            .get(ColumnFamily::KeyIndex, &entry.key)?
            .unwrap_or_default();
        history.push(index);
        self.db
            .batch_put(&mut batch, ColumnFamily::KeyIndex, &entry.key, &history)?;

        let new_size = index + 1;
        self.db.batch_put(
            &mut batch,
            ColumnFamily::Meta,
            &MetaKey { tag: META_SIZE_TAG },
            &new_size,
        )?;

        self.db.write_batch(batch)?;
        self.committed_size.store(new_size, Ordering::Release);

        let root = root_at(self, new_size)?;
        debug!(index, size = new_size, root = %root, "appended entry");
        Ok(AppendOutcome {
            index,
            snapshot: TreeSnapshot::new(new_size, root),
        })
    }

    fn entry_at(&self, index: u64) -> StorageResult<Entry> {
        let size = self.committed();
        if index >= size {
            return Err(StorageError::NotFound { index, size });
        }
        match self.leaf_record(index)? {
            Some(record) => Ok(record.entry),
            None => Err(StorageError::Corruption(format!(
                "leaf {} missing below committed size {}",
                index, size
            ))),
        }
    }

    fn latest_index(&self, key: &[u8]) -> StorageResult<Option<u64>> {
        let history: Option<Vec<u64>> = self.db.get(ColumnFamily::KeyIndex, &key.to_vec())?;
        Ok(history.and_then(|h| h.last().copied()))
    }

    fn history(&self, key: &[u8]) -> StorageResult<Vec<u64>> {
        let history: Option<Vec<u64>> = self.db.get(ColumnFamily::KeyIndex, &key.to_vec())?;
        Ok(history.unwrap_or_default())
    }

    fn size(&self) -> StorageResult<u64> {
        Ok(self.committed())
    }

    fn root_at(&self, size: u64) -> StorageResult<HashValue> {
        let committed = self.committed();
        if size > committed {
            return Err(StorageError::OutOfRange {
                index: size,
                size: committed,
            });
        }
        Ok(root_at(self, size)?)
    }

    fn prove_inclusion(&self, index: u64, size: u64) -> StorageResult<InclusionProof> {
        let committed = self.committed();
        if size > committed || index >= size {
            return Err(StorageError::OutOfRange { index, size });
        }
        let path = inclusion_path(self, index, size)?;
        Ok(InclusionProof::new(index, size, path))
    }

    fn prove_consistency(&self, old_size: u64, new_size: u64) -> StorageResult<ConsistencyProof> {
        let committed = self.committed();
        if old_size == 0 || old_size > new_size || new_size > committed {
            return Err(StorageError::InvalidRange {
                old_size,
                new_size,
                size: committed,
            });
        }
        let path = consistency_path(self, old_size, new_size)?;
        Ok(ConsistencyProof::new(old_size, new_size, path))
    }
}
