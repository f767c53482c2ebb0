//! # veridb-storage
//!
//! Persistence layer for the authenticated append-only log.
//!
//! The [`LogStore`] trait is the storage seam: it owns entry persistence,
//! the interior-node hash cache, the per-key index, and server-side proof
//! generation. Two implementations are provided:
//!
//! - [`RocksLogStore`]: durable, RocksDB-backed, one atomic `WriteBatch`
//!   per append
//! - [`MemoryLogStore`]: volatile, for tests and embedded use

pub mod error;
pub mod log_store;
pub mod memory;
pub mod rocks;

pub use error::{StorageError, StorageResult};
pub use log_store::{AppendOutcome, LogStore};
pub use memory::MemoryLogStore;
pub use rocks::{RocksDBConfig, RocksLogStore};
