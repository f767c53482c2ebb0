//! RocksDB core infrastructure
//!
//! This module provides the foundational components for RocksDB storage:
//! - `LedgerDb`: Database wrapper with column family support
//! - `RocksDBConfig`: Configuration options
//! - `ColumnFamily`: Column family definitions

pub mod column_family;
pub mod config;
pub mod db;

pub use column_family::ColumnFamily;
pub use config::RocksDBConfig;
pub use db::LedgerDb;
