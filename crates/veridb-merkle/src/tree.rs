//! Deterministic tree shape and server-side proof construction.
//!
//! The tree over `n` ordered leaves is defined by the RFC 6962 left-heavy
//! split: for `n >= 2` the split point `k` is the largest power of two
//! strictly less than `n`; the left subtree covers leaves `[0, k)` and the
//! right subtree covers `[k, n)`. This rule is a hard contract shared by
//! root computation, proof generation, and the verifiers in [`crate::proof`]
//! — it must never change without a versioned migration of every persisted
//! root.
//!
//! Algorithms here read interior hashes through [`NodeSource`], which serves
//! *complete aligned subtrees* keyed by `(level, position)`: the node at
//! level `L`, position `P` covers leaves `[P * 2^L, (P + 1) * 2^L)`. In an
//! append-only log such subtrees are immutable once their last leaf lands,
//! so a store can persist them incrementally and answer queries for any
//! historical size without recomputing from scratch.

use crate::error::{MerkleError, MerkleResult};
use crate::hash::{empty_root, node_hash, HashValue};

/// Read access to the persisted interior-node hash cache.
///
/// Implementations must return the hash of the complete subtree at
/// `(level, position)`, covering leaves `[position * 2^level,
/// (position + 1) * 2^level)`. Level 0 entries are leaf hashes.
pub trait NodeSource {
    fn node(&self, level: u8, position: u64) -> MerkleResult<HashValue>;
}

/// Largest power of two strictly less than `n`. Requires `n >= 2`.
pub(crate) fn split_point(n: u64) -> u64 {
    debug_assert!(n >= 2);
    1u64 << (63 - (n - 1).leading_zeros())
}

/// Hash of the leaf range `[lo, hi)`, decomposed into complete subtrees.
///
/// Aligned power-of-two ranges resolve to a single `NodeSource` lookup;
/// everything else recurses through the split rule. O(log (hi - lo))
/// lookups and hashes.
pub fn range_hash<S: NodeSource + ?Sized>(src: &S, lo: u64, hi: u64) -> MerkleResult<HashValue> {
    debug_assert!(lo < hi);
    let n = hi - lo;
    if n.is_power_of_two() && lo % n == 0 {
        let level = n.trailing_zeros() as u8;
        return src.node(level, lo >> level);
    }
    let k = split_point(n);
    let left = range_hash(src, lo, lo + k)?;
    let right = range_hash(src, lo + k, hi)?;
    Ok(node_hash(&left, &right))
}

/// Root of the tree truncated at `size`.
///
/// Roots for historical sizes are recomputed from the immutable subtree
/// cache; the result for a given size never changes as the log grows.
pub fn root_at<S: NodeSource + ?Sized>(src: &S, size: u64) -> MerkleResult<HashValue> {
    if size == 0 {
        return Ok(empty_root());
    }
    range_hash(src, 0, size)
}

/// Sibling path proving the leaf at `index` belongs to the tree of `size`
/// leaves, ordered leaf to root (RFC 6962 PATH).
pub fn inclusion_path<S: NodeSource + ?Sized>(
    src: &S,
    index: u64,
    size: u64,
) -> MerkleResult<Vec<HashValue>> {
    if index >= size {
        return Err(MerkleError::OutOfRange { index, size });
    }
    audit_path(src, index, 0, size)
}

fn audit_path<S: NodeSource + ?Sized>(
    src: &S,
    index: u64,
    lo: u64,
    hi: u64,
) -> MerkleResult<Vec<HashValue>> {
    let n = hi - lo;
    if n == 1 {
        return Ok(Vec::new());
    }
    let k = split_point(n);
    let mut path = if index < lo + k {
        let mut p = audit_path(src, index, lo, lo + k)?;
        p.push(range_hash(src, lo + k, hi)?);
        p
    } else {
        let mut p = audit_path(src, index, lo + k, hi)?;
        p.push(range_hash(src, lo, lo + k)?);
        p
    };
    path.shrink_to_fit();
    Ok(path)
}

/// Minimal node set proving the tree of `old_size` leaves is a
/// left-anchored prefix of the tree of `new_size` leaves (RFC 6962 PROOF).
///
/// `old_size == new_size` yields an empty proof: trivially consistent.
pub fn consistency_path<S: NodeSource + ?Sized>(
    src: &S,
    old_size: u64,
    new_size: u64,
) -> MerkleResult<Vec<HashValue>> {
    if old_size == 0 || old_size > new_size {
        return Err(MerkleError::InvalidRange { old_size, new_size });
    }
    if old_size == new_size {
        return Ok(Vec::new());
    }
    subproof(src, old_size, 0, new_size, true)
}

/// RFC 6962 SUBPROOF over the absolute leaf range `[lo, hi)`, where `m` is
/// the number of old-tree leaves still inside this range. `complete` is
/// true while the old tree's root is derivable from the verifier's own
/// state (no node hash needs to be shipped for it).
fn subproof<S: NodeSource + ?Sized>(
    src: &S,
    m: u64,
    lo: u64,
    hi: u64,
    complete: bool,
) -> MerkleResult<Vec<HashValue>> {
    let n = hi - lo;
    if m == n {
        return if complete {
            Ok(Vec::new())
        } else {
            Ok(vec![range_hash(src, lo, hi)?])
        };
    }
    let k = split_point(n);
    if m <= k {
        let mut p = subproof(src, m, lo, lo + k, complete)?;
        p.push(range_hash(src, lo + k, hi)?);
        Ok(p)
    } else {
        let mut p = subproof(src, m - k, lo + k, hi, false)?;
        p.push(range_hash(src, lo, lo + k)?);
        Ok(p)
    }
}
