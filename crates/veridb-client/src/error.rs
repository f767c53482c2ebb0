//! Client-side errors.
//!
//! The security-relevant variants are terminal by construction:
//! [`ClientError::TamperDetected`] and [`ClientError::StaleRoot`] mean a
//! server claim contradicted verified history and must never be retried
//! away.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum ClientError {
    /// A proof or root claimed by the server failed offline verification.
    #[error("tamper detected: {reason}")]
    TamperDetected { reason: String },

    /// The server reported a tree smaller than one we already verified.
    #[error(
        "stale root for database '{database}': server reports size {reported}, \
         trusted size is {trusted}"
    )]
    StaleRoot {
        database: String,
        trusted: u64,
        reported: u64,
    },

    /// An attempt to move the trusted root backwards.
    #[error(
        "trusted root regression for database '{database}': offered size {offered}, \
         trusted size is {trusted}"
    )]
    Regression {
        database: String,
        trusted: u64,
        offered: u64,
    },

    #[error(transparent)]
    Service(#[from] veridb_server::ServiceError),

    #[error("root cache io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("root cache encoding error: {0}")]
    Serde(#[from] serde_json::Error),
}

impl ClientError {
    pub(crate) fn tamper(reason: impl std::fmt::Display) -> Self {
        Self::TamperDetected {
            reason: reason.to_string(),
        }
    }
}

pub type ClientResult<T> = Result<T, ClientError>;
