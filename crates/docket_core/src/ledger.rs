//! crates/docket_core/src/ledger.rs
//!
//! The Version Ledger: the one component allowed to grow a document's
//! version history. Edits and restores both funnel through its append
//! routine; nothing else writes document content.

use std::sync::Arc;

use uuid::Uuid;

use crate::domain::{Document, DocumentStatus, DocumentVersion};
use crate::error::HistoryError;
use crate::ports::{DocumentStore, NewVersion, PortError};

/// Description attached to the version created alongside a new document.
pub const INITIAL_VERSION_DESCRIPTION: &str = "initial version";

/// How many times an append re-reads the ledger head after losing a
/// version-number race before giving up.
const MAX_APPEND_ATTEMPTS: u32 = 3;

/// Outcome of [`VersionLedger::record_edit`]. `created` distinguishes a
/// real append from the dedup no-op that hands back the existing latest
/// version.
#[derive(Debug, Clone)]
pub struct RecordedEdit {
    pub document: Document,
    pub version: DocumentVersion,
    pub created: bool,
}

/// Whether an append may be elided when the content is unchanged.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum AppendMode {
    /// Skip the write when the new content equals the latest version's.
    DedupeUnchanged,
    /// Append unconditionally; a restore must stay visible in history even
    /// when it lands on identical content.
    AlwaysAppend,
}

#[derive(Clone)]
pub struct VersionLedger {
    store: Arc<dyn DocumentStore>,
}

impl VersionLedger {
    pub fn new(store: Arc<dyn DocumentStore>) -> Self {
        Self { store }
    }

    /// Creates a document together with version 1 ("initial version").
    ///
    /// The dedup rule does not apply here — there is no prior version to
    /// compare against. Empty content is rejected.
    pub async fn create_document(
        &self,
        owner_id: Uuid,
        title: &str,
        content: &str,
        machine_generated: bool,
    ) -> Result<(Document, DocumentVersion), HistoryError> {
        if content.is_empty() {
            return Err(HistoryError::InvalidArgument(
                "document content is required on create".to_string(),
            ));
        }

        let first = NewVersion {
            number: 1,
            content,
            description: Some(INITIAL_VERSION_DESCRIPTION),
            machine_generated,
        };
        let created = self
            .store
            .insert_document(owner_id, title, DocumentStatus::Draft, first)
            .await?;
        Ok(created)
    }

    /// Records an edit to the document's content.
    ///
    /// The new content is compared byte for byte against the latest
    /// version; when identical nothing is written and the existing version
    /// comes back with `created = false`. Otherwise a version numbered
    /// `latest + 1` is appended and the document projection updated with
    /// it.
    pub async fn record_edit(
        &self,
        document_id: Uuid,
        content: &str,
        description: Option<&str>,
        machine_generated: bool,
    ) -> Result<RecordedEdit, HistoryError> {
        self.append(
            document_id,
            content,
            description,
            machine_generated,
            AppendMode::DedupeUnchanged,
        )
        .await
    }

    /// All versions of the document, newest number first.
    pub async fn list_versions(
        &self,
        document_id: Uuid,
    ) -> Result<Vec<DocumentVersion>, HistoryError> {
        // Resolve the document first so an unknown id is NotFound rather
        // than an empty list.
        self.store.fetch_document(document_id).await?;
        Ok(self.store.list_versions(document_id).await?)
    }

    /// The single append path shared by edits and restores; the two differ
    /// only in `mode` and the description they pass.
    ///
    /// Version numbers are claimed optimistically: read the head, write
    /// `head + 1`, and when the store reports that another writer took the
    /// number first, re-read and try again. The dedup decision is
    /// re-evaluated on every attempt against the fresh head.
    pub(crate) async fn append(
        &self,
        document_id: Uuid,
        content: &str,
        description: Option<&str>,
        machine_generated: bool,
        mode: AppendMode,
    ) -> Result<RecordedEdit, HistoryError> {
        let document = self.store.fetch_document(document_id).await?;

        let mut attempts = 0;
        loop {
            let latest = self.store.latest_version(document_id).await?;

            if mode == AppendMode::DedupeUnchanged {
                if let Some(latest) = &latest {
                    if latest.content == content {
                        return Ok(RecordedEdit {
                            document,
                            version: latest.clone(),
                            created: false,
                        });
                    }
                }
            }

            let number = latest.as_ref().map(|v| v.number + 1).unwrap_or(1);
            let version = NewVersion {
                number,
                content,
                description,
                machine_generated,
            };

            match self.store.append_version(document_id, version).await {
                Ok((document, version)) => {
                    return Ok(RecordedEdit {
                        document,
                        version,
                        created: true,
                    });
                }
                Err(PortError::Conflict(reason)) => {
                    // Lost the number race; another writer appended first.
                    attempts += 1;
                    if attempts >= MAX_APPEND_ATTEMPTS {
                        return Err(HistoryError::Conflict(reason));
                    }
                }
                Err(err) => return Err(err.into()),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::MemoryStore;

    fn ledger() -> (Arc<MemoryStore>, VersionLedger) {
        let store = Arc::new(MemoryStore::new());
        let ledger = VersionLedger::new(store.clone());
        (store, ledger)
    }

    #[tokio::test]
    async fn create_document_rejects_empty_content() {
        let (_, ledger) = ledger();
        let err = ledger
            .create_document(Uuid::new_v4(), "Engagement letter", "", false)
            .await
            .unwrap_err();
        assert!(matches!(err, HistoryError::InvalidArgument(_)));
    }

    #[tokio::test]
    async fn creation_writes_version_one_with_initial_description() {
        let (_, ledger) = ledger();
        let (document, version) = ledger
            .create_document(Uuid::new_v4(), "NDA", "Section 1.\n", false)
            .await
            .unwrap();

        assert_eq!(version.number, 1);
        assert_eq!(version.document_id, document.id);
        assert_eq!(
            version.description.as_deref(),
            Some(INITIAL_VERSION_DESCRIPTION)
        );
        assert_eq!(document.content, "Section 1.\n");
    }

    #[tokio::test]
    async fn unchanged_content_is_a_no_op() {
        let (_, ledger) = ledger();
        let (document, _) = ledger
            .create_document(Uuid::new_v4(), "NDA", "Section 1.\n", false)
            .await
            .unwrap();

        let outcome = ledger
            .record_edit(document.id, "Section 1.\n", Some("no-op save"), false)
            .await
            .unwrap();

        assert!(!outcome.created);
        assert_eq!(outcome.version.number, 1);
        // The dedup path must not have written anything.
        let versions = ledger.list_versions(document.id).await.unwrap();
        assert_eq!(versions.len(), 1);
    }

    #[tokio::test]
    async fn changed_content_appends_next_number() {
        let (_, ledger) = ledger();
        let (document, _) = ledger
            .create_document(Uuid::new_v4(), "NDA", "Section 1.\n", false)
            .await
            .unwrap();

        let outcome = ledger
            .record_edit(document.id, "Section 1.\nSection 2.\n", None, false)
            .await
            .unwrap();

        assert!(outcome.created);
        assert_eq!(outcome.version.number, 2);
        assert_eq!(outcome.version.description, None);
        assert_eq!(outcome.document.content, "Section 1.\nSection 2.\n");
    }

    #[tokio::test]
    async fn list_versions_is_newest_first_and_gapless() {
        let (_, ledger) = ledger();
        let (document, _) = ledger
            .create_document(Uuid::new_v4(), "NDA", "v1\n", false)
            .await
            .unwrap();
        ledger
            .record_edit(document.id, "v2\n", None, false)
            .await
            .unwrap();
        ledger
            .record_edit(document.id, "v3\n", None, true)
            .await
            .unwrap();

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
    async fn operations_on_missing_document_are_not_found() {
        let (_, ledger) = ledger();
        let absent = Uuid::new_v4();

        let err = ledger.list_versions(absent).await.unwrap_err();
        assert!(matches!(err, HistoryError::NotFound(_)));

        let err = ledger
            .record_edit(absent, "content\n", None, false)
            .await
            .unwrap_err();
        assert!(matches!(err, HistoryError::NotFound(_)));
    }
}
