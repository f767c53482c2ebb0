//! The client's trusted root cache.
//!
//! One `TrustedRoot` per database name, advanced only after a proof has
//! been verified against it. The cache is the client's entire defense
//! against rollback: as long as it holds `(size, root)`, any server
//! claim about a smaller or conflicting tree is rejected.
//!
//! Bootstrap trust: the first verified operation pins the first root.
//! Confirming that initial root out of band is the operator's concern.

use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use tracing::debug;

use veridb_merkle::HashValue;
use veridb_types::TreeSnapshot;

use crate::error::{ClientError, ClientResult};

/// The last verified tree head for one database.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrustedRoot {
    pub size: u64,
    pub root: HashValue,
    pub last_verified_at: DateTime<Utc>,
}

impl TrustedRoot {
    pub fn new(snapshot: TreeSnapshot) -> Self {
        Self {
            size: snapshot.size,
            root: snapshot.root,
            last_verified_at: Utc::now(),
        }
    }
}

/// Monotonic per-database root store, optionally persisted as JSON.
pub struct TrustedRootCache {
    roots: RwLock<HashMap<String, TrustedRoot>>,
    path: Option<PathBuf>,
}

impl TrustedRootCache {
    /// Volatile cache. Trust resets every process start.
    pub fn in_memory() -> Self {
        Self {
            roots: RwLock::new(HashMap::new()),
            path: None,
        }
    }

    /// Cache backed by a JSON file. A missing file is an empty cache.
    pub fn load(path: impl AsRef<Path>) -> ClientResult<Self> {
        let path = path.as_ref().to_path_buf();
        let roots = match fs::read(&path) {
            Ok(bytes) => serde_json::from_slice(&bytes)?,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => HashMap::new(),
            Err(e) => return Err(e.into()),
        };
        Ok(Self {
            roots: RwLock::new(roots),
            path: Some(path),
        })
    }

    pub fn get(&self, database: &str) -> Option<TrustedRoot> {
        self.roots.read().get(database).copied()
    }

    /// Record a newly verified head. Fails with
    /// [`ClientError::Regression`] if the cached size is larger, or equal
    /// with a different root; the caller decides whether losing an
    /// advance race is an error.
    pub fn advance(&self, database: &str, snapshot: TreeSnapshot) -> ClientResult<()> {
        let mut roots = self.roots.write();
        if let Some(current) = roots.get(database) {
            if snapshot.size < current.size
                || (snapshot.size == current.size && snapshot.root != current.root)
            {
                return Err(ClientError::Regression {
                    database: database.to_string(),
                    trusted: current.size,
                    offered: snapshot.size,
                });
            }
        }
        roots.insert(database.to_string(), TrustedRoot::new(snapshot));
        debug!(database, size = snapshot.size, root = %snapshot.root, "trusted root advanced");
        self.persist(&roots)
    }

    /// Write the whole map to a temp file, then rename over the target.
    /// A crash mid-write leaves the previous cache intact.
    fn persist(&self, roots: &HashMap<String, TrustedRoot>) -> ClientResult<()> {
        let Some(path) = &self.path else {
            return Ok(());
        };
        let tmp = path.with_extension("tmp");
        fs::write(&tmp, serde_json::to_vec_pretty(roots)?)?;
        fs::rename(&tmp, path)?;
        Ok(())
    }
}
