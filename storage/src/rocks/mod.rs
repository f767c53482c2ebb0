//! RocksDB-backed storage.

pub mod core;
pub mod log_store;

pub use core::{ColumnFamily, LedgerDb, RocksDBConfig};
pub use log_store::RocksLogStore;
