//! Service-level errors.

use thiserror::Error;

use veridb_types::Action;

#[derive(Error, Debug)]
pub enum ServiceError {
    #[error("identity '{identity}' is not allowed to {action} on database '{database}'")]
    PermissionDenied {
        identity: String,
        database: String,
        action: Action,
    },

    #[error("no entry found for key")]
    KeyNotFound,

    #[error("index {index} is out of range for log of size {size}")]
    OutOfRange { index: u64, size: u64 },

    #[error("invalid consistency range {old_size}..{new_size} for log of size {size}")]
    InvalidRange {
        old_size: u64,
        new_size: u64,
        size: u64,
    },

    #[error("storage error: {0}")]
    Storage(#[from] veridb_storage::StorageError),

    /// Transient failure the caller may retry.
    #[error("service unavailable: {0}")]
    Unavailable(String),
}

pub type ServiceResult<T> = Result<T, ServiceError>;
