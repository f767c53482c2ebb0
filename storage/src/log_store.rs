//! The `LogStore` trait: the authenticated append-only log.

use veridb_merkle::{ConsistencyProof, HashValue, InclusionProof};
use veridb_types::{Entry, TreeSnapshot};

use crate::error::StorageResult;

/// Result of a committed append.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AppendOutcome {
    /// Index assigned to the new leaf.
    pub index: u64,
    /// Snapshot of the log immediately after this append.
    pub snapshot: TreeSnapshot,
}

/// A durable, authenticated append-only log of entries.
///
/// Contract:
/// - indices are dense, contiguous, and never reassigned;
/// - concurrent appends are linearized: a single total order of index
///   assignment with no gaps or duplicates;
/// - an acknowledged append is durable: `size()` and `root_at` for the
///   last committed append survive a restart;
/// - `root_at(n)` is stable forever once the log reaches size `n`.
///
/// Proof generation is read-only and may run in parallel with appends and
/// with other proof requests against any historical size.
pub trait LogStore: Send + Sync {
    /// Append an entry, assigning the next sequential index.
    fn append(&self, entry: Entry) -> StorageResult<AppendOutcome>;

    /// The entry at `index`. Fails with `NotFound` if `index >= size()`.
    fn entry_at(&self, index: u64) -> StorageResult<Entry>;

    /// Latest index holding the given key, if the key was ever written.
    fn latest_index(&self, key: &[u8]) -> StorageResult<Option<u64>>;

    /// Every index at which the given key was written, oldest first.
    fn history(&self, key: &[u8]) -> StorageResult<Vec<u64>>;

    /// Number of committed entries.
    fn size(&self) -> StorageResult<u64>;

    /// Root of the tree truncated at `size`. Fails with `OutOfRange` if
    /// `size` exceeds the committed size.
    fn root_at(&self, size: u64) -> StorageResult<HashValue>;

    /// Current `(size, root)` snapshot.
    fn snapshot(&self) -> StorageResult<TreeSnapshot> {
        let size = self.size()?;
        Ok(TreeSnapshot::new(size, self.root_at(size)?))
    }

    /// Sibling path proving the leaf at `index` belongs to the tree of
    /// `size` leaves. Fails with `OutOfRange` if `index >= size` or `size`
    /// exceeds the committed size.
    fn prove_inclusion(&self, index: u64, size: u64) -> StorageResult<InclusionProof>;

    /// Node hashes proving the tree of `old_size` leaves is a prefix of
    /// the tree of `new_size` leaves. `old_size == new_size` yields an
    /// empty proof. Fails with `InvalidRange` if `old_size == 0`,
    /// `old_size > new_size`, or `new_size` exceeds the committed size.
    fn prove_consistency(&self, old_size: u64, new_size: u64) -> StorageResult<ConsistencyProof>;
}
