//! End-to-end tamperproofing: a verified client against a server that
//! lies in various ways. Every lie must surface as a terminal error and
//! leave the trusted root cache untouched.

use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use parking_lot::Mutex;

use veridb_client::{ClientError, TrustedRootCache, VerifiedClient};
use veridb_merkle::{ConsistencyProof, HashValue, InclusionProof};
use veridb_server::{
    AllowAll, AppendReceipt, ItemReceipt, LedgerHandle, LedgerService, Permission, ServiceError,
    ServiceResult, Session, StaticAclAuthorizer,
};
use veridb_storage::MemoryLogStore;
use veridb_types::{Entry, TreeSnapshot};

#[derive(Clone, Copy, PartialEq, Eq)]
enum Tamper {
    None,
    /// Swap the value returned by keyed reads.
    ForgeValue,
    /// Report a tree head this many leaves smaller than reality.
    ShrinkTree(u64),
    /// Corrupt the first hash of every inclusion proof.
    ForgeProof,
}

/// Wraps an honest service and injects lies on the read path.
struct TamperingService {
    inner: LedgerHandle,
    tamper: Mutex<Tamper>,
    /// Remaining reads that fail with `Unavailable` before recovering.
    flaky_reads: AtomicU32,
    append_calls: AtomicU32,
}

impl TamperingService {
    fn new(inner: LedgerHandle) -> Self {
        Self {
            inner,
            tamper: Mutex::new(Tamper::None),
            flaky_reads: AtomicU32::new(0),
            append_calls: AtomicU32::new(0),
        }
    }

    fn set_tamper(&self, tamper: Tamper) {
        *self.tamper.lock() = tamper;
    }

    fn tamper(&self) -> Tamper {
        *self.tamper.lock()
    }

    fn maybe_fail_read(&self) -> ServiceResult<()> {
        let remaining = self.flaky_reads.load(Ordering::SeqCst);
        if remaining > 0 {
            self.flaky_reads.fetch_sub(1, Ordering::SeqCst);
            return Err(ServiceError::Unavailable("injected outage".into()));
        }
        Ok(())
    }

    fn shrink(&self, snapshot: TreeSnapshot) -> TreeSnapshot {
        match self.tamper() {
            Tamper::ShrinkTree(by) => {
                TreeSnapshot::new(snapshot.size.saturating_sub(by), snapshot.root)
            }
            _ => snapshot,
        }
    }
}

#[async_trait]
impl LedgerService for TamperingService {
    async fn append(&self, session: &Session, entry: Entry) -> ServiceResult<AppendReceipt> {
        self.append_calls.fetch_add(1, Ordering::SeqCst);
        let receipt = self.inner.append(session, entry).await?;
        Ok(AppendReceipt {
            index: receipt.index,
            snapshot: self.shrink(receipt.snapshot),
        })
    }

    async fn get(&self, session: &Session, key: &[u8]) -> ServiceResult<ItemReceipt> {
        self.maybe_fail_read()?;
        let mut item = self.inner.get(session, key).await?;
        if self.tamper() == Tamper::ForgeValue {
            item.entry.value = b"forged".to_vec();
        }
        item.snapshot = self.shrink(item.snapshot);
        Ok(item)
    }

    async fn entry_at(&self, session: &Session, index: u64) -> ServiceResult<Entry> {
        self.maybe_fail_read()?;
        self.inner.entry_at(session, index).await
    }

    async fn history(&self, session: &Session, key: &[u8]) -> ServiceResult<Vec<u64>> {
        self.inner.history(session, key).await
    }

    async fn current_snapshot(&self, session: &Session) -> ServiceResult<TreeSnapshot> {
        self.maybe_fail_read()?;
        Ok(self.shrink(self.inner.current_snapshot(session).await?))
    }

    async fn prove_inclusion(
        &self,
        session: &Session,
        index: u64,
        size: u64,
    ) -> ServiceResult<InclusionProof> {
        self.maybe_fail_read()?;
        let proof = self.inner.prove_inclusion(session, index, size).await?;
        if self.tamper() == Tamper::ForgeProof {
            let mut path = proof.path().to_vec();
            if let Some(first) = path.first_mut() {
                let mut bytes = *first.as_bytes();
                bytes[0] ^= 0x01;
                *first = HashValue::new(bytes);
            }
            return Ok(InclusionProof::new(proof.leaf_index(), proof.tree_size(), path));
        }
        Ok(proof)
    }

    async fn prove_consistency(
        &self,
        session: &Session,
        old_size: u64,
        new_size: u64,
    ) -> ServiceResult<ConsistencyProof> {
        self.maybe_fail_read()?;
        self.inner.prove_consistency(session, old_size, new_size).await
    }
}

fn honest_handle() -> LedgerHandle {
    LedgerHandle::new(Arc::new(MemoryLogStore::new()), Arc::new(AllowAll))
}

fn client_over(service: Arc<TamperingService>) -> (VerifiedClient, Arc<TrustedRootCache>) {
    let roots = Arc::new(TrustedRootCache::in_memory());
    let client = VerifiedClient::new(
        service,
        Session::new("tester", "ledger"),
        Arc::clone(&roots),
    );
    (client, roots)
}

#[tokio::test]
async fn test_honest_server_round_trip() {
    let service = Arc::new(TamperingService::new(honest_handle()));
    let (client, roots) = client_over(service);

    client.safe_set(b"k".to_vec(), b"v1".to_vec()).await.unwrap();
    client.safe_set(b"k".to_vec(), b"v2".to_vec()).await.unwrap();
    let item = client.safe_get(b"k").await.unwrap();
    assert_eq!(item.entry.value, b"v2".to_vec());
    assert_eq!(roots.get("ledger").unwrap().size, 2);
}

#[tokio::test]
async fn test_forged_value_is_tamper_detected() {
    let service = Arc::new(TamperingService::new(honest_handle()));
    let (client, roots) = client_over(Arc::clone(&service));

    client.safe_set(b"k".to_vec(), b"honest".to_vec()).await.unwrap();
    let trusted_before = roots.get("ledger").unwrap();

    service.set_tamper(Tamper::ForgeValue);
    assert!(matches!(
        client.safe_get(b"k").await,
        Err(ClientError::TamperDetected { .. })
    ));
    assert_eq!(roots.get("ledger").unwrap(), trusted_before);
}

#[tokio::test]
async fn test_shrunken_tree_is_stale_root() {
    let service = Arc::new(TamperingService::new(honest_handle()));
    let (client, roots) = client_over(Arc::clone(&service));

    for i in 0..3u8 {
        client.safe_set(vec![i], b"v".to_vec()).await.unwrap();
    }
    let trusted_before = roots.get("ledger").unwrap();
    assert_eq!(trusted_before.size, 3);

    service.set_tamper(Tamper::ShrinkTree(2));
    assert!(matches!(
        client.safe_get(&[0]).await,
        Err(ClientError::StaleRoot {
            trusted: 3,
            reported: 1,
            ..
        })
    ));
    assert_eq!(roots.get("ledger").unwrap(), trusted_before);
}

#[tokio::test]
async fn test_forged_proof_is_tamper_detected() {
    let service = Arc::new(TamperingService::new(honest_handle()));
    let (client, roots) = client_over(Arc::clone(&service));

    client.safe_set(b"a".to_vec(), b"1".to_vec()).await.unwrap();
    client.safe_set(b"b".to_vec(), b"2".to_vec()).await.unwrap();
    let trusted_before = roots.get("ledger").unwrap();

    service.set_tamper(Tamper::ForgeProof);
    assert!(matches!(
        client.safe_get(b"a").await,
        Err(ClientError::TamperDetected { .. })
    ));
    assert!(matches!(
        client.safe_set(b"c".to_vec(), b"3".to_vec()).await,
        Err(ClientError::TamperDetected { .. })
    ));
    assert_eq!(roots.get("ledger").unwrap(), trusted_before);
}

#[tokio::test]
async fn test_transient_outage_is_retried_for_reads_only() {
    let service = Arc::new(TamperingService::new(honest_handle()));
    let (client, _roots) = client_over(Arc::clone(&service));

    client.safe_set(b"k".to_vec(), b"v".to_vec()).await.unwrap();

    // Two failing fetches, then recovery: the read succeeds via retry.
    service.flaky_reads.store(2, Ordering::SeqCst);
    let item = client.safe_get(b"k").await.unwrap();
    assert_eq!(item.entry.value, b"v".to_vec());

    // Appends are issued exactly once per safe_set.
    let appends_before = service.append_calls.load(Ordering::SeqCst);
    client.safe_set(b"k2".to_vec(), b"v2".to_vec()).await.unwrap();
    assert_eq!(service.append_calls.load(Ordering::SeqCst), appends_before + 1);
}

#[tokio::test]
async fn test_acl_denial_surfaces_as_permission_denied() {
    let authz = StaticAclAuthorizer::new().grant("reader", "ledger", Permission::Read);
    let handle = LedgerHandle::new(Arc::new(MemoryLogStore::new()), Arc::new(authz));
    let service = Arc::new(TamperingService::new(handle));

    let roots = Arc::new(TrustedRootCache::in_memory());
    let client = VerifiedClient::new(
        service,
        Session::new("reader", "ledger"),
        Arc::clone(&roots),
    );

    assert!(matches!(
        client.safe_set(b"k".to_vec(), b"v".to_vec()).await,
        Err(ClientError::Service(ServiceError::PermissionDenied { .. }))
    ));
    assert!(roots.get("ledger").is_none());
}
