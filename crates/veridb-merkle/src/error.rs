//! Error types for merkle tree operations and proof verification.

use thiserror::Error;

use crate::hash::HashValue;

/// Errors produced by tree algorithms and proof verification.
///
/// Verification failures are ordinary `Err` values: callers are forced to
/// handle them, and nothing in this crate downgrades a failed proof to a
/// warning.
#[derive(Debug, Error)]
pub enum MerkleError {
    #[error("invalid hash length: expected {expected}, got {got}")]
    InvalidHashLength { expected: usize, got: usize },

    #[error("leaf index {index} out of range for tree size {size}")]
    OutOfRange { index: u64, size: u64 },

    #[error("invalid proof range: old size {old_size}, new size {new_size}")]
    InvalidRange { old_size: u64, new_size: u64 },

    #[error("malformed proof: {0}")]
    MalformedProof(String),

    #[error("recomputed root {computed} does not match expected root {expected}")]
    RootMismatch {
        computed: HashValue,
        expected: HashValue,
    },

    #[error("interior node (level {level}, position {position}) unavailable")]
    NodeUnavailable { level: u8, position: u64 },

    #[error("invalid input: {0}")]
    InvalidInput(String),

    #[error("storage error: {0}")]
    StorageError(String),
}

pub type MerkleResult<T> = Result<T, MerkleError>;
