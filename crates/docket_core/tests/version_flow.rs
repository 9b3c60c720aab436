//! End-to-end exercises of the ledger and history engine against the
//! in-memory store, including the append-race behavior.

use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use uuid::Uuid;

use docket_core::domain::{Document, DocumentStatus, DocumentVersion};
use docket_core::ports::{DocumentStore, NewVersion, PortError, PortResult};
use docket_core::{HistoryEngine, HistoryError, MemoryStore, SegmentKind, VersionLedger};

fn services() -> (VersionLedger, HistoryEngine) {
    let store = Arc::new(MemoryStore::new());
    (
        VersionLedger::new(store.clone()),
        HistoryEngine::new(store),
    )
}

#[tokio::test]
async fn edit_compare_restore_lifecycle() {
    let (ledger, engine) = services();
    let owner = Uuid::new_v4();

    // Creation writes version 1.
    let (document, v1) = ledger
        .create_document(owner, "Retainer", "A\nB\n", false)
        .await
        .unwrap();
    assert_eq!(v1.number, 1);

    // A content edit appends version 2.
    let v2 = ledger
        .record_edit(document.id, "A\nB\nC\n", None, false)
        .await
        .unwrap()
        .version;
    assert_eq!(v2.number, 2);

    // Comparing v1 to v2 reports exactly one added run and nothing removed.
    let comparison = engine
        .compare_versions(document.id, v1.id, v2.id)
        .await
        .unwrap();
    assert_eq!(comparison.stats.additions, 1);
    assert_eq!(comparison.stats.deletions, 0);

    // Saving identical content again must not grow the ledger.
    let replay = ledger
        .record_edit(document.id, "A\nB\nC\n", None, false)
        .await
        .unwrap();
    assert!(!replay.created);
    assert_eq!(ledger.list_versions(document.id).await.unwrap().len(), 2);

    // Restoring version 1 appends version 3 with version 1's content.
    let restored = engine.restore_version(document.id, v1.id).await.unwrap();
    assert_eq!(restored.version.number, 3);
    assert_eq!(restored.version.content, "A\nB\n");
    assert_eq!(
        restored.version.description.as_deref(),
        Some("Restored to version 1")
    );
    assert_eq!(restored.document.content, "A\nB\n");

    let numbers: Vec<i32> = ledger
        .list_versions(document.id)
        .await
        .unwrap()
        .iter()
        .map(|v| v.number)
        .collect();
    assert_eq!(numbers, vec![3, 2, 1]);
}

#[tokio::test]
async fn restoring_twice_appends_two_distinct_versions() {
    let (ledger, engine) = services();
    let (document, v1) = ledger
        .create_document(Uuid::new_v4(), "Retainer", "original\n", false)
        .await
        .unwrap();
    ledger
        .record_edit(document.id, "amended\n", None, false)
        .await
        .unwrap();

    let first = engine.restore_version(document.id, v1.id).await.unwrap();
    let second = engine.restore_version(document.id, v1.id).await.unwrap();

    assert_eq!(first.version.number, 3);
    assert_eq!(second.version.number, 4);
    assert_ne!(first.version.id, second.version.id);
    assert_eq!(first.version.content, "original\n");
    assert_eq!(second.version.content, "original\n");
}

#[tokio::test]
async fn compare_segments_reconstruct_both_versions() {
    let (ledger, engine) = services();
    let (document, v1) = ledger
        .create_document(
            Uuid::new_v4(),
            "Terms",
            "alpha\nbravo\ncharlie\n",
            false,
        )
        .await
        .unwrap();
    let v2 = ledger
        .record_edit(document.id, "alpha\ncharlie\ndelta\n", None, false)
        .await
        .unwrap()
        .version;

    let comparison = engine
        .compare_versions(document.id, v1.id, v2.id)
        .await
        .unwrap();

    let old_side: String = comparison
        .segments
        .iter()
        .filter(|s| s.kind != SegmentKind::Added)
        .map(|s| s.text.as_str())
        .collect();
    let new_side: String = comparison
        .segments
        .iter()
        .filter(|s| s.kind != SegmentKind::Removed)
        .map(|s| s.text.as_str())
        .collect();

    assert_eq!(old_side, v1.content);
    assert_eq!(new_side, v2.content);
}

//=========================================================================================
// Append-race behavior
//=========================================================================================

/// Store wrapper that makes the first N appends fail with `Conflict`, as a
/// concurrent writer claiming the same version number would.
struct RacyStore {
    inner: MemoryStore,
    conflicts_left: AtomicU32,
    append_calls: AtomicU32,
}

impl RacyStore {
    fn new(conflicts: u32) -> Self {
        Self {
            inner: MemoryStore::new(),
            conflicts_left: AtomicU32::new(conflicts),
            append_calls: AtomicU32::new(0),
        }
    }
}

#[async_trait]
impl DocumentStore for RacyStore {
    async fn insert_document(
        &self,
        owner_id: Uuid,
        title: &str,
        status: DocumentStatus,
        first: NewVersion<'_>,
    ) -> PortResult<(Document, DocumentVersion)> {
        self.inner
            .insert_document(owner_id, title, status, first)
            .await
    }

    async fn fetch_document(&self, document_id: Uuid) -> PortResult<Document> {
        self.inner.fetch_document(document_id).await
    }

    async fn list_documents(&self, owner_id: Uuid) -> PortResult<Vec<Document>> {
        self.inner.list_documents(owner_id).await
    }

    async fn update_document_meta(
        &self,
        document_id: Uuid,
        title: Option<&str>,
        status: Option<DocumentStatus>,
    ) -> PortResult<Document> {
        self.inner
            .update_document_meta(document_id, title, status)
            .await
    }

    async fn delete_document(&self, document_id: Uuid) -> PortResult<()> {
        self.inner.delete_document(document_id).await
    }

    async fn fetch_version(&self, version_id: Uuid) -> PortResult<DocumentVersion> {
        self.inner.fetch_version(version_id).await
    }

    async fn list_versions(&self, document_id: Uuid) -> PortResult<Vec<DocumentVersion>> {
        self.inner.list_versions(document_id).await
    }

    async fn latest_version(&self, document_id: Uuid) -> PortResult<Option<DocumentVersion>> {
        self.inner.latest_version(document_id).await
    }

    async fn append_version(
        &self,
        document_id: Uuid,
        version: NewVersion<'_>,
    ) -> PortResult<(Document, DocumentVersion)> {
        self.append_calls.fetch_add(1, Ordering::SeqCst);
        if self.conflicts_left.load(Ordering::SeqCst) > 0 {
            self.conflicts_left.fetch_sub(1, Ordering::SeqCst);
            return Err(PortError::Conflict(format!(
                "document {document_id} already has a version {}",
                version.number
            )));
        }
        self.inner.append_version(document_id, version).await
    }
}

#[tokio::test]
async fn append_retries_through_a_lost_race() {
    let store = Arc::new(RacyStore::new(1));
    let ledger = VersionLedger::new(store.clone());

    let (document, _) = ledger
        .create_document(Uuid::new_v4(), "Retainer", "v1\n", false)
        .await
        .unwrap();

    let outcome = ledger
        .record_edit(document.id, "v2\n", None, false)
        .await
        .unwrap();

    assert!(outcome.created);
    assert_eq!(outcome.version.number, 2);
    assert_eq!(store.append_calls.load(Ordering::SeqCst), 2);
}

#[tokio::test]
async fn append_gives_up_after_the_retry_budget() {
    let store = Arc::new(RacyStore::new(u32::MAX));
    let ledger = VersionLedger::new(store.clone());

    let (document, _) = ledger
        .create_document(Uuid::new_v4(), "Retainer", "v1\n", false)
        .await
        .unwrap();

    let err = ledger
        .record_edit(document.id, "v2\n", None, false)
        .await
        .unwrap_err();

    assert!(matches!(err, HistoryError::Conflict(_)));
    assert_eq!(store.append_calls.load(Ordering::SeqCst), 3);
    // The ledger itself must be untouched after the failed append.
    assert_eq!(ledger.list_versions(document.id).await.unwrap().len(), 1);
}
