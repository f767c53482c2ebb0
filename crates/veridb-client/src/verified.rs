//! Safe (verified) operations.
//!
//! Two explicit capability tiers:
//!
//! - [`RawClient`]: a plain passthrough to the service. Nothing is
//!   checked; a compromised server can return anything.
//! - [`VerifiedClient`]: every read and write is cross-checked against
//!   the trusted root cache with offline proof verification before any
//!   result is handed to the caller.
//!
//! Verification order is fixed: a reported head is first anchored to the
//! trusted root (size comparison, then consistency proof if the tree
//! grew), and only then used to check inclusion. The cache is advanced
//! strictly after all checks pass.

use std::sync::Arc;

use tracing::warn;

use veridb_merkle::{ConsistencyProof, InclusionProof};
use veridb_server::{LedgerService, ServiceError, Session};
use veridb_types::{Entry, TreeSnapshot};

use crate::error::{ClientError, ClientResult};
use crate::root_cache::{TrustedRoot, TrustedRootCache};

/// Attempts per read-only fetch before a transient failure is surfaced.
const FETCH_ATTEMPTS: u32 = 3;

/// Unverified client tier. Every call returns exactly what the server
/// said.
pub struct RawClient {
    service: Arc<dyn LedgerService>,
    session: Session,
}

impl RawClient {
    pub fn new(service: Arc<dyn LedgerService>, session: Session) -> Self {
        Self { service, session }
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    pub async fn set(&self, key: impl Into<Vec<u8>>, value: impl Into<Vec<u8>>) -> ClientResult<u64> {
        let receipt = self
            .service
            .append(&self.session, Entry::new(key, value))
            .await?;
        Ok(receipt.index)
    }

    pub async fn get(&self, key: &[u8]) -> ClientResult<Entry> {
        Ok(self.service.get(&self.session, key).await?.entry)
    }

    pub async fn history(&self, key: &[u8]) -> ClientResult<Vec<u64>> {
        Ok(self.service.history(&self.session, key).await?)
    }
}

/// Receipt for a verified write: the index is proven included under the
/// returned head, and the head is anchored to prior trusted history.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VerifiedIndex {
    pub index: u64,
    pub snapshot: TreeSnapshot,
}

/// A verified read: the entry is proven included at `index` under
/// `snapshot`, which is anchored to prior trusted history.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VerifiedItem {
    pub entry: Entry,
    pub index: u64,
    pub snapshot: TreeSnapshot,
}

/// Verifying client tier over a [`RawClient`] and a shared
/// [`TrustedRootCache`].
pub struct VerifiedClient {
    raw: RawClient,
    roots: Arc<TrustedRootCache>,
}

impl VerifiedClient {
    pub fn new(service: Arc<dyn LedgerService>, session: Session, roots: Arc<TrustedRootCache>) -> Self {
        Self {
            raw: RawClient::new(service, session),
            roots,
        }
    }

    /// The unverified tier, for callers that explicitly opt out.
    pub fn raw(&self) -> &RawClient {
        &self.raw
    }

    fn database(&self) -> &str {
        &self.raw.session.database
    }

    /// Append and verify: the new head must be larger than the trusted
    /// size, must prove inclusion of the written entry, and must prove
    /// consistency with the previously trusted root.
    pub async fn safe_set(
        &self,
        key: impl Into<Vec<u8>>,
        value: impl Into<Vec<u8>>,
    ) -> ClientResult<VerifiedIndex> {
        let entry = Entry::new(key, value);
        let trusted = self.roots.get(self.database());

        // Appends are never retried; a duplicate would land twice.
        let receipt = self.raw.service.append(&self.raw.session, entry.clone()).await?;

        if let Some(trusted) = &trusted {
            if receipt.snapshot.size <= trusted.size {
                return Err(ClientError::StaleRoot {
                    database: self.database().to_string(),
                    trusted: trusted.size,
                    reported: receipt.snapshot.size,
                });
            }
        }

        let proof = self
            .fetch_inclusion(receipt.index, receipt.snapshot.size)
            .await?;
        self.check_inclusion(&proof, &entry, receipt.index, receipt.snapshot)?;

        if let Some(trusted) = &trusted {
            self.anchor(trusted, receipt.snapshot).await?;
        }

        self.advance_tolerating_race(receipt.snapshot)?;
        Ok(VerifiedIndex {
            index: receipt.index,
            snapshot: receipt.snapshot,
        })
    }

    /// Fetch the latest entry for a key and verify it against trusted
    /// history before returning it.
    pub async fn safe_get(&self, key: &[u8]) -> ClientResult<VerifiedItem> {
        let item = {
            let mut attempt = 0;
            loop {
                match self.raw.service.get(&self.raw.session, key).await {
                    Err(ServiceError::Unavailable(reason)) if attempt + 1 < FETCH_ATTEMPTS => {
                        attempt += 1;
                        warn!(attempt, %reason, "retrying keyed read");
                    }
                    other => break other?,
                }
            }
        };
        self.verify_read(item.entry, item.index, item.snapshot).await
    }

    /// Fetch the entry at a log index and verify it against trusted
    /// history before returning it.
    pub async fn safe_get_at(&self, index: u64) -> ClientResult<VerifiedItem> {
        let entry = {
            let mut attempt = 0;
            loop {
                match self.raw.service.entry_at(&self.raw.session, index).await {
                    Err(ServiceError::Unavailable(reason)) if attempt + 1 < FETCH_ATTEMPTS => {
                        attempt += 1;
                        warn!(attempt, %reason, "retrying entry fetch");
                    }
                    other => break other?,
                }
            }
        };
        let snapshot = self.fetch_snapshot().await?;
        self.verify_read(entry, index, snapshot).await
    }

    async fn verify_read(
        &self,
        entry: Entry,
        index: u64,
        snapshot: TreeSnapshot,
    ) -> ClientResult<VerifiedItem> {
        if let Some(trusted) = self.roots.get(self.database()) {
            if snapshot.size < trusted.size {
                // Rollback. Fatal, and the cache stays where it is.
                return Err(ClientError::StaleRoot {
                    database: self.database().to_string(),
                    trusted: trusted.size,
                    reported: snapshot.size,
                });
            }
            if snapshot.size == trusted.size {
                if snapshot.root != trusted.root {
                    return Err(ClientError::tamper(format!(
                        "server root {} diverges from trusted root {} at size {}",
                        snapshot.root, trusted.root, trusted.size
                    )));
                }
            } else {
                self.anchor(&trusted, snapshot).await?;
            }
        }

        if index >= snapshot.size {
            return Err(ClientError::tamper(format!(
                "server placed entry at index {} outside its own tree of size {}",
                index, snapshot.size
            )));
        }

        let proof = self.fetch_inclusion(index, snapshot.size).await?;
        self.check_inclusion(&proof, &entry, index, snapshot)?;

        self.advance_tolerating_race(snapshot)?;
        Ok(VerifiedItem {
            entry,
            index,
            snapshot,
        })
    }

    /// Prove the reported head is an append-only extension of the
    /// trusted root before trusting anything under it.
    async fn anchor(&self, trusted: &TrustedRoot, reported: TreeSnapshot) -> ClientResult<()> {
        let proof = self.fetch_consistency(trusted.size, reported.size).await?;
        if proof.old_size() != trusted.size || proof.new_size() != reported.size {
            return Err(ClientError::tamper(format!(
                "consistency proof shape mismatch: got {}..{}, requested {}..{}",
                proof.old_size(),
                proof.new_size(),
                trusted.size,
                reported.size
            )));
        }
        proof
            .verify(&trusted.root, &reported.root)
            .map_err(ClientError::tamper)
    }

    fn check_inclusion(
        &self,
        proof: &InclusionProof,
        entry: &Entry,
        index: u64,
        snapshot: TreeSnapshot,
    ) -> ClientResult<()> {
        if proof.leaf_index() != index || proof.tree_size() != snapshot.size {
            return Err(ClientError::tamper(format!(
                "inclusion proof shape mismatch: got index {} size {}, requested index {} size {}",
                proof.leaf_index(),
                proof.tree_size(),
                index,
                snapshot.size
            )));
        }
        proof
            .verify(&entry.leaf_hash(), &snapshot.root)
            .map_err(ClientError::tamper)
    }

    /// A concurrent verified operation may have advanced past us; its
    /// head subsumes ours, so losing the race is not a failure.
    fn advance_tolerating_race(&self, snapshot: TreeSnapshot) -> ClientResult<()> {
        match self.roots.advance(self.database(), snapshot) {
            Ok(()) | Err(ClientError::Regression { .. }) => Ok(()),
            Err(e) => Err(e),
        }
    }

    async fn fetch_snapshot(&self) -> ClientResult<TreeSnapshot> {
        let mut attempt = 0;
        loop {
            match self.raw.service.current_snapshot(&self.raw.session).await {
                Err(ServiceError::Unavailable(reason)) if attempt + 1 < FETCH_ATTEMPTS => {
                    attempt += 1;
                    warn!(attempt, %reason, "retrying snapshot fetch");
                }
                other => return Ok(other?),
            }
        }
    }

    async fn fetch_inclusion(&self, index: u64, size: u64) -> ClientResult<InclusionProof> {
        let mut attempt = 0;
        loop {
            match self
                .raw
                .service
                .prove_inclusion(&self.raw.session, index, size)
                .await
            {
                Err(ServiceError::Unavailable(reason)) if attempt + 1 < FETCH_ATTEMPTS => {
                    attempt += 1;
                    warn!(attempt, %reason, "retrying inclusion proof fetch");
                }
                other => return Ok(other?),
            }
        }
    }

    async fn fetch_consistency(&self, old_size: u64, new_size: u64) -> ClientResult<ConsistencyProof> {
        let mut attempt = 0;
        loop {
            match self
                .raw
                .service
                .prove_consistency(&self.raw.session, old_size, new_size)
                .await
            {
                Err(ServiceError::Unavailable(reason)) if attempt + 1 < FETCH_ATTEMPTS => {
                    attempt += 1;
                    warn!(attempt, %reason, "retrying consistency proof fetch");
                }
                other => return Ok(other?),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use veridb_server::{AllowAll, LedgerHandle};
    use veridb_storage::MemoryLogStore;

    fn open_client() -> VerifiedClient {
        let service = Arc::new(LedgerHandle::new(
            Arc::new(MemoryLogStore::new()),
            Arc::new(AllowAll),
        ));
        VerifiedClient::new(
            service,
            Session::new("tester", "ledger"),
            Arc::new(TrustedRootCache::in_memory()),
        )
    }

    #[tokio::test]
    async fn test_safe_set_pins_and_advances_trust() {
        let client = open_client();

        let first = client.safe_set(b"a".to_vec(), b"1".to_vec()).await.unwrap();
        assert_eq!(first.index, 0);
        assert_eq!(client.roots.get("ledger").unwrap().size, 1);

        let second = client.safe_set(b"b".to_vec(), b"2".to_vec()).await.unwrap();
        assert_eq!(second.index, 1);
        assert_eq!(client.roots.get("ledger").unwrap().size, 2);
        assert_eq!(client.roots.get("ledger").unwrap().root, second.snapshot.root);
    }

    #[tokio::test]
    async fn test_safe_get_verifies_latest_value() {
        let client = open_client();
        client.safe_set(b"k".to_vec(), b"v1".to_vec()).await.unwrap();
        client.safe_set(b"k".to_vec(), b"v2".to_vec()).await.unwrap();
        client.safe_set(b"other".to_vec(), b"x".to_vec()).await.unwrap();

        let item = client.safe_get(b"k").await.unwrap();
        assert_eq!(item.entry.value, b"v2".to_vec());
        assert_eq!(item.index, 1);

        let at = client.safe_get_at(0).await.unwrap();
        assert_eq!(at.entry.value, b"v1".to_vec());
    }

    #[tokio::test]
    async fn test_safe_get_anchors_growth_from_raw_writes() {
        let client = open_client();
        client.safe_set(b"k".to_vec(), b"v".to_vec()).await.unwrap();

        // The log grows behind the verified client's back.
        for i in 0..4 {
            client.raw().set(format!("r{}", i), b"x".to_vec()).await.unwrap();
        }

        // The read anchors the larger tree via consistency before trusting it.
        let item = client.safe_get(b"k").await.unwrap();
        assert_eq!(item.snapshot.size, 5);
        assert_eq!(client.roots.get("ledger").unwrap().size, 5);
    }

    #[tokio::test]
    async fn test_missing_key_is_not_tamper() {
        let client = open_client();
        client.safe_set(b"k".to_vec(), b"v".to_vec()).await.unwrap();
        assert!(matches!(
            client.safe_get(b"absent").await,
            Err(ClientError::Service(ServiceError::KeyNotFound))
        ));
    }
}
