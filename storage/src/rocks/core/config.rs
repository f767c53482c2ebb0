//! RocksDB configuration options.

use std::path::{Path, PathBuf};

/// Configuration for opening a [`crate::rocks::core::LedgerDb`].
#[derive(Clone, Debug)]
pub struct RocksDBConfig {
    /// Database directory.
    pub path: PathBuf,
    /// Create the database if it does not exist.
    pub create_if_missing: bool,
    /// Background compaction/flush threads.
    pub max_background_jobs: i32,
    /// Sync the WAL on every committed append. Leaving this on is what
    /// makes an acknowledged append durable against process crash.
    pub sync_writes: bool,
}

impl RocksDBConfig {
    pub fn new(path: impl AsRef<Path>) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
            create_if_missing: true,
            max_background_jobs: 4,
            sync_writes: true,
        }
    }

    /// Relaxed durability for tests and bulk loads.
    pub fn with_unsynced_writes(mut self) -> Self {
        self.sync_writes = false;
        self
    }
}
