//! The ledger service: the operation surface a client talks to.
//!
//! [`LedgerService`] is the transport seam. [`LedgerHandle`] is the
//! in-process implementation over a [`LogStore`]; a network frontend
//! would wrap the same trait. Every receipt carries the snapshot the
//! server claims, and nothing here is trusted by a verifying client
//! until proofs check out on its side.

use std::sync::Arc;

use async_trait::async_trait;
use tracing::debug;

use veridb_merkle::{ConsistencyProof, InclusionProof};
use veridb_storage::{LogStore, StorageError};
use veridb_types::{Action, Entry, TreeSnapshot};

use crate::auth::Authorizer;
use crate::error::{ServiceError, ServiceResult};

/// Caller identity for authorization.
#[derive(Debug, Clone)]
pub struct Session {
    pub identity: String,
    pub database: String,
}

impl Session {
    pub fn new(identity: impl Into<String>, database: impl Into<String>) -> Self {
        Self {
            identity: identity.into(),
            database: database.into(),
        }
    }
}

/// Server response to an append: where the entry landed and the
/// resulting tree head.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AppendReceipt {
    pub index: u64,
    pub snapshot: TreeSnapshot,
}

/// Server response to a keyed read: the entry, the index it was read
/// from, and the tree head it was read under.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ItemReceipt {
    pub entry: Entry,
    pub index: u64,
    pub snapshot: TreeSnapshot,
}

#[async_trait]
pub trait LedgerService: Send + Sync {
    /// Append a key-value entry to the log.
    async fn append(&self, session: &Session, entry: Entry) -> ServiceResult<AppendReceipt>;

    /// Latest entry for a key.
    async fn get(&self, session: &Session, key: &[u8]) -> ServiceResult<ItemReceipt>;

    /// Entry at a specific log index.
    async fn entry_at(&self, session: &Session, index: u64) -> ServiceResult<Entry>;

    /// All log indices where the key was written, oldest first.
    async fn history(&self, session: &Session, key: &[u8]) -> ServiceResult<Vec<u64>>;

    /// Current tree head as claimed by the server.
    async fn current_snapshot(&self, session: &Session) -> ServiceResult<TreeSnapshot>;

    /// Inclusion proof for `index` in the tree of `size` leaves.
    async fn prove_inclusion(
        &self,
        session: &Session,
        index: u64,
        size: u64,
    ) -> ServiceResult<InclusionProof>;

    /// Consistency proof between two historical sizes.
    async fn prove_consistency(
        &self,
        session: &Session,
        old_size: u64,
        new_size: u64,
    ) -> ServiceResult<ConsistencyProof>;
}

/// In-process [`LedgerService`] over a [`LogStore`].
pub struct LedgerHandle {
    store: Arc<dyn LogStore>,
    authz: Arc<dyn Authorizer>,
}

impl LedgerHandle {
    pub fn new(store: Arc<dyn LogStore>, authz: Arc<dyn Authorizer>) -> Self {
        Self { store, authz }
    }

    fn authorize(&self, session: &Session, action: Action) -> ServiceResult<()> {
        if self
            .authz
            .is_allowed(&session.identity, &session.database, action)
        {
            Ok(())
        } else {
            Err(ServiceError::PermissionDenied {
                identity: session.identity.clone(),
                database: session.database.clone(),
                action,
            })
        }
    }
}

#[async_trait]
impl LedgerService for LedgerHandle {
    async fn append(&self, session: &Session, entry: Entry) -> ServiceResult<AppendReceipt> {
        self.authorize(session, Action::Write)?;
        let outcome = self.store.append(entry)?;
        debug!(
            identity = %session.identity,
            index = outcome.index,
            size = outcome.snapshot.size,
            "append committed"
        );
        Ok(AppendReceipt {
            index: outcome.index,
            snapshot: outcome.snapshot,
        })
    }

    async fn get(&self, session: &Session, key: &[u8]) -> ServiceResult<ItemReceipt> {
        self.authorize(session, Action::Read)?;
        let index = self
            .store
            .latest_index(key)?
            .ok_or(ServiceError::KeyNotFound)?;
        let entry = self.store.entry_at(index)?;
        let snapshot = self.store.snapshot()?;
        Ok(ItemReceipt {
            entry,
            index,
            snapshot,
        })
    }

    async fn entry_at(&self, session: &Session, index: u64) -> ServiceResult<Entry> {
        self.authorize(session, Action::Read)?;
        match self.store.entry_at(index) {
            Ok(entry) => Ok(entry),
            Err(StorageError::NotFound { index, size }) => {
                Err(ServiceError::OutOfRange { index, size })
            }
            Err(e) => Err(e.into()),
        }
    }

    async fn history(&self, session: &Session, key: &[u8]) -> ServiceResult<Vec<u64>> {
        self.authorize(session, Action::Read)?;
        Ok(self.store.history(key)?)
    }

    async fn current_snapshot(&self, session: &Session) -> ServiceResult<TreeSnapshot> {
        self.authorize(session, Action::Read)?;
        Ok(self.store.snapshot()?)
    }

    async fn prove_inclusion(
        &self,
        session: &Session,
        index: u64,
        size: u64,
    ) -> ServiceResult<InclusionProof> {
        self.authorize(session, Action::Read)?;
        match self.store.prove_inclusion(index, size) {
            Ok(proof) => Ok(proof),
            Err(StorageError::OutOfRange { index, size }) => {
                Err(ServiceError::OutOfRange { index, size })
            }
            Err(e) => Err(e.into()),
        }
    }

    async fn prove_consistency(
        &self,
        session: &Session,
        old_size: u64,
        new_size: u64,
    ) -> ServiceResult<ConsistencyProof> {
        self.authorize(session, Action::Read)?;
        match self.store.prove_consistency(old_size, new_size) {
            Ok(proof) => Ok(proof),
            Err(StorageError::InvalidRange {
                old_size,
                new_size,
                size,
            }) => Err(ServiceError::InvalidRange {
                old_size,
                new_size,
                size,
            }),
            Err(e) => Err(e.into()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::{AllowAll, Permission, StaticAclAuthorizer};
    use veridb_storage::MemoryLogStore;

    fn open_service() -> LedgerHandle {
        LedgerHandle::new(Arc::new(MemoryLogStore::new()), Arc::new(AllowAll))
    }

    #[tokio::test]
    async fn test_append_then_get_latest() {
        let service = open_service();
        let session = Session::new("tester", "ledger");

        let receipt = service
            .append(&session, Entry::new(b"k".to_vec(), b"v1".to_vec()))
            .await
            .unwrap();
        assert_eq!(receipt.index, 0);
        assert_eq!(receipt.snapshot.size, 1);

        service
            .append(&session, Entry::new(b"k".to_vec(), b"v2".to_vec()))
            .await
            .unwrap();

        let item = service.get(&session, b"k").await.unwrap();
        assert_eq!(item.entry.value, b"v2".to_vec());
        assert_eq!(item.index, 1);
        assert_eq!(item.snapshot.size, 2);

        assert!(matches!(
            service.get(&session, b"missing").await,
            Err(ServiceError::KeyNotFound)
        ));
    }

    #[tokio::test]
    async fn test_history_and_entry_at() {
        let service = open_service();
        let session = Session::new("tester", "ledger");

        for value in [b"a".to_vec(), b"b".to_vec(), b"c".to_vec()] {
            service
                .append(&session, Entry::new(b"k".to_vec(), value))
                .await
                .unwrap();
        }
        assert_eq!(service.history(&session, b"k").await.unwrap(), vec![0, 1, 2]);
        assert_eq!(
            service.entry_at(&session, 1).await.unwrap().value,
            b"b".to_vec()
        );
        assert!(matches!(
            service.entry_at(&session, 9).await,
            Err(ServiceError::OutOfRange { index: 9, size: 3 })
        ));
    }

    #[tokio::test]
    async fn test_proofs_check_against_snapshots() {
        let service = open_service();
        let session = Session::new("tester", "ledger");

        let mut snapshots = Vec::new();
        for i in 0..5u64 {
            let receipt = service
                .append(
                    &session,
                    Entry::new(format!("k{}", i).into_bytes(), b"v".to_vec()),
                )
                .await
                .unwrap();
            snapshots.push(receipt.snapshot);
        }

        let head = service.current_snapshot(&session).await.unwrap();
        assert_eq!(head, snapshots[4]);

        let entry = service.entry_at(&session, 2).await.unwrap();
        let proof = service.prove_inclusion(&session, 2, head.size).await.unwrap();
        proof.verify(&entry.leaf_hash(), &head.root).unwrap();

        let proof = service
            .prove_consistency(&session, 3, head.size)
            .await
            .unwrap();
        proof.verify(&snapshots[2].root, &head.root).unwrap();
    }

    #[tokio::test]
    async fn test_acl_enforced_before_storage() {
        let authz = StaticAclAuthorizer::new().grant("reader", "ledger", Permission::Read);
        let service = LedgerHandle::new(Arc::new(MemoryLogStore::new()), Arc::new(authz));

        let reader = Session::new("reader", "ledger");
        let stranger = Session::new("stranger", "ledger");

        assert!(matches!(
            service
                .append(&reader, Entry::new(b"k".to_vec(), b"v".to_vec()))
                .await,
            Err(ServiceError::PermissionDenied { .. })
        ));
        assert!(matches!(
            service.current_snapshot(&stranger).await,
            Err(ServiceError::PermissionDenied { .. })
        ));
        // The denied append left no trace.
        assert_eq!(
            service.current_snapshot(&reader).await.unwrap().size,
            0
        );
    }
}
