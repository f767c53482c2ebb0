//! Storage error types.

use thiserror::Error;
use veridb_merkle::MerkleError;

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("rocksdb error: {0}")]
    Rocks(#[from] rocksdb::Error),

    #[error("column family not found: {0}")]
    ColumnFamilyNotFound(&'static str),

    #[error("encoding error: {0}")]
    Encoding(String),

    #[error("entry at index {index} not found (log size {size})")]
    NotFound { index: u64, size: u64 },

    #[error("index {index} out of range for tree size {size}")]
    OutOfRange { index: u64, size: u64 },

    #[error("invalid proof range: old size {old_size}, new size {new_size} (log size {size})")]
    InvalidRange {
        old_size: u64,
        new_size: u64,
        size: u64,
    },

    #[error(transparent)]
    Merkle(#[from] MerkleError),

    #[error("corrupted store: {0}")]
    Corruption(String),
}

impl From<bincode::error::EncodeError> for StorageError {
    fn from(e: bincode::error::EncodeError) -> Self {
        StorageError::Encoding(e.to_string())
    }
}

impl From<bincode::error::DecodeError> for StorageError {
    fn from(e: bincode::error::DecodeError) -> Self {
        StorageError::Encoding(e.to_string())
    }
}

pub type StorageResult<T> = Result<T, StorageError>;
