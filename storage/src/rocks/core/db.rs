//! Database wrapper with column family support and bincode codecs.

use rocksdb::{Options, WriteBatch, WriteOptions, DB};
use std::path::Path;

use crate::error::{StorageError, StorageResult};
use crate::rocks::core::{ColumnFamily, RocksDBConfig};

fn encode<T: bincode::Encode>(value: &T) -> StorageResult<Vec<u8>> {
    Ok(bincode::encode_to_vec(value, bincode::config::standard())?)
}

fn decode<T: bincode::Decode>(bytes: &[u8]) -> StorageResult<T> {
    let (value, _) = bincode::decode_from_slice(bytes, bincode::config::standard())?;
    Ok(value)
}

/// RocksDB handle shared by the store implementations.
///
/// Keys and values are bincode-encoded; `put`/`get` take any
/// `Encode`/`Decode` type. All multi-key mutations go through
/// [`LedgerDb::write_batch`], which commits atomically.
pub struct LedgerDb {
    db: DB,
    sync_writes: bool,
}

impl LedgerDb {
    pub fn open(config: RocksDBConfig) -> StorageResult<Self> {
        let mut opts = Options::default();
        opts.create_if_missing(config.create_if_missing);
        opts.create_missing_column_families(true);
        opts.set_max_background_jobs(config.max_background_jobs);

        let db = DB::open_cf_descriptors(&opts, &config.path, ColumnFamily::descriptors())?;
        Ok(Self {
            db,
            sync_writes: config.sync_writes,
        })
    }

    pub fn open_default(path: impl AsRef<Path>) -> StorageResult<Self> {
        Self::open(RocksDBConfig::new(path))
    }

    fn cf(&self, cf: ColumnFamily) -> StorageResult<&rocksdb::ColumnFamily> {
        self.db
            .cf_handle(cf.name())
            .ok_or(StorageError::ColumnFamilyNotFound(cf.name()))
    }

    fn write_opts(&self) -> WriteOptions {
        let mut opts = WriteOptions::default();
        opts.set_sync(self.sync_writes);
        opts
    }

    pub fn put<K: bincode::Encode, V: bincode::Encode>(
        &self,
        cf: ColumnFamily,
        key: &K,
        value: &V,
    ) -> StorageResult<()> {
        let handle = self.cf(cf)?;
        self.db
            .put_cf_opt(handle, encode(key)?, encode(value)?, &self.write_opts())?;
        Ok(())
    }

    pub fn get<K: bincode::Encode, V: bincode::Decode>(
        &self,
        cf: ColumnFamily,
        key: &K,
    ) -> StorageResult<Option<V>> {
        let handle = self.cf(cf)?;
        match self.db.get_cf(handle, encode(key)?)? {
            Some(bytes) => Ok(Some(decode(&bytes)?)),
            None => Ok(None),
        }
    }

    pub fn exists<K: bincode::Encode>(&self, cf: ColumnFamily, key: &K) -> StorageResult<bool> {
        let handle = self.cf(cf)?;
        Ok(self.db.get_cf(handle, encode(key)?)?.is_some())
    }

    pub fn batch(&self) -> WriteBatch {
        WriteBatch::default()
    }

    pub fn batch_put<K: bincode::Encode, V: bincode::Encode>(
        &self,
        batch: &mut WriteBatch,
        cf: ColumnFamily,
        key: &K,
        value: &V,
    ) -> StorageResult<()> {
        let handle = self.cf(cf)?;
        batch.put_cf(handle, encode(key)?, encode(value)?);
        Ok(())
    }

    /// Commit a batch atomically: either every put lands or none does.
    pub fn write_batch(&self, batch: WriteBatch) -> StorageResult<()> {
        self.db.write_opt(batch, &self.write_opts())?;
        Ok(())
    }
}
