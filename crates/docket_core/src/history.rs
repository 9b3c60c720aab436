//! crates/docket_core/src/history.rs
//!
//! The Diff & Restore Engine. Both operations are layered on the ledger:
//! compare is a pure read over two resolved versions, restore is a
//! read-then-append that never bypasses the ledger's append path.

use std::sync::Arc;

use uuid::Uuid;

use crate::diff::{self, DiffSegment, DiffStats};
use crate::domain::{Document, DocumentVersion};
use crate::error::HistoryError;
use crate::ledger::{AppendMode, RecordedEdit, VersionLedger};
use crate::ports::DocumentStore;

/// Everything the compare screen needs: the segments, the counters, and
/// the two full version records whose numbers and timestamps it displays.
#[derive(Debug, Clone)]
pub struct VersionComparison {
    pub segments: Vec<DiffSegment>,
    pub stats: DiffStats,
    pub from: DocumentVersion,
    pub to: DocumentVersion,
}

/// Outcome of a restore: the appended version and the document projection
/// already updated to the restored content.
#[derive(Debug, Clone)]
pub struct RestoredVersion {
    pub document: Document,
    pub version: DocumentVersion,
}

#[derive(Clone)]
pub struct HistoryEngine {
    store: Arc<dyn DocumentStore>,
    ledger: VersionLedger,
}

impl HistoryEngine {
    pub fn new(store: Arc<dyn DocumentStore>) -> Self {
        Self {
            ledger: VersionLedger::new(store.clone()),
            store,
        }
    }

    /// Resolves a version id and checks that it belongs to `document_id`.
    /// A version of some other document is an invalid argument, not a
    /// missing record.
    async fn owned_version(
        &self,
        document_id: Uuid,
        version_id: Uuid,
    ) -> Result<DocumentVersion, HistoryError> {
        let version = self.store.fetch_version(version_id).await?;
        if version.document_id != document_id {
            return Err(HistoryError::InvalidArgument(format!(
                "version {version_id} does not belong to document {document_id}"
            )));
        }
        Ok(version)
    }

    /// Diffs two snapshots of one document. Pure read; nothing is written
    /// and no partial result exists on failure.
    pub async fn compare_versions(
        &self,
        document_id: Uuid,
        from_id: Uuid,
        to_id: Uuid,
    ) -> Result<VersionComparison, HistoryError> {
        self.store.fetch_document(document_id).await?;
        let from = self.owned_version(document_id, from_id).await?;
        let to = self.owned_version(document_id, to_id).await?;

        let segments = diff::diff_lines(&from.content, &to.content);
        let stats = diff::diff_stats(&segments);
        Ok(VersionComparison {
            segments,
            stats,
            from,
            to,
        })
    }

    /// Appends a new version carrying the target's exact content.
    ///
    /// History is never rewritten: intervening versions stay, the new
    /// version takes `latest + 1`, and the append happens even when the
    /// target content equals the current head — the user asked to restore,
    /// and that intent must be visible in the ledger.
    pub async fn restore_version(
        &self,
        document_id: Uuid,
        target_id: Uuid,
    ) -> Result<RestoredVersion, HistoryError> {
        let target = self.owned_version(document_id, target_id).await?;

        let description = format!("Restored to version {}", target.number);
        let RecordedEdit {
            document, version, ..
        } = self
            .ledger
            .append(
                document_id,
                &target.content,
                Some(&description),
                target.machine_generated,
                AppendMode::AlwaysAppend,
            )
            .await?;

        Ok(RestoredVersion { document, version })
    }
}
