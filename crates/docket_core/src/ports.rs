//! crates/docket_core/src/ports.rs
//!
//! Defines the service contracts (traits) for the versioning core.
//! These traits are the boundary of the hexagonal architecture: the record
//! store, the access checks and the language model all live behind them, so
//! the core stays independent of sqlx, HTTP frameworks and vendor SDKs.

use async_trait::async_trait;
use uuid::Uuid;

use crate::domain::{Document, DocumentStatus, DocumentVersion};

//=========================================================================================
// Generic Port Error and Result Types
//=========================================================================================

/// A generic error type for all port operations.
/// This abstracts away the specific errors of external services (database,
/// LLM API) behind the three outcomes the core actually reacts to.
#[derive(Debug, thiserror::Error)]
pub enum PortError {
    #[error("not found: {0}")]
    NotFound(String),
    /// A uniqueness rule in the store rejected a write. For version appends
    /// this means another writer claimed the same (document, number) pair.
    #[error("conflict: {0}")]
    Conflict(String),
    #[error("unexpected port failure: {0}")]
    Unexpected(String),
}

/// A convenience type alias for `Result<T, PortError>`.
pub type PortResult<T> = Result<T, PortError>;

//=========================================================================================
// Store Write Payloads
//=========================================================================================

/// The fields of a version row to be appended. The ledger decides the
/// number, description and origin; the store only persists them.
#[derive(Debug, Clone, Copy)]
pub struct NewVersion<'a> {
    pub number: i32,
    pub content: &'a str,
    pub description: Option<&'a str>,
    pub machine_generated: bool,
}

//=========================================================================================
// Service Ports (Traits)
//=========================================================================================

/// The generic record store for documents and their version ledger.
///
/// Implementations must guarantee two things the core builds on:
///
/// 1. `(document_id, version number)` is unique, and a violated append
///    fails with [`PortError::Conflict`] rather than writing anything.
/// 2. [`DocumentStore::append_version`] and
///    [`DocumentStore::insert_document`] update the document projection
///    (content, updated_at) and write the version row atomically.
#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// Creates a document together with its first version in one atomic
    /// write. The caller supplies the full first version (number included).
    async fn insert_document(
        &self,
        owner_id: Uuid,
        title: &str,
        status: DocumentStatus,
        first: NewVersion<'_>,
    ) -> PortResult<(Document, DocumentVersion)>;

    async fn fetch_document(&self, document_id: Uuid) -> PortResult<Document>;

    /// All documents owned by `owner_id`, most recently updated first.
    async fn list_documents(&self, owner_id: Uuid) -> PortResult<Vec<Document>>;

    /// Updates title and/or status. Content is deliberately absent here:
    /// the ledger append path is the only writer of document content.
    async fn update_document_meta(
        &self,
        document_id: Uuid,
        title: Option<&str>,
        status: Option<DocumentStatus>,
    ) -> PortResult<Document>;

    /// Deletes the document and, with it, its entire version ledger.
    async fn delete_document(&self, document_id: Uuid) -> PortResult<()>;

    async fn fetch_version(&self, version_id: Uuid) -> PortResult<DocumentVersion>;

    /// All versions of the document, ordered by version number descending.
    async fn list_versions(&self, document_id: Uuid) -> PortResult<Vec<DocumentVersion>>;

    /// The highest-numbered version, or `None` for a document with an empty
    /// ledger (only possible mid-creation).
    async fn latest_version(&self, document_id: Uuid) -> PortResult<Option<DocumentVersion>>;

    /// Appends a version row and updates the owning document's content and
    /// updated_at in the same transaction. Fails with
    /// [`PortError::Conflict`] when the version number is already taken.
    async fn append_version(
        &self,
        document_id: Uuid,
        version: NewVersion<'_>,
    ) -> PortResult<(Document, DocumentVersion)>;
}

/// Sharing/permission checks, resolved to plain booleans.
///
/// The service shell consults this before invoking any core operation; the
/// ledger and history engine themselves perform no authorization.
#[async_trait]
pub trait AccessPolicy: Send + Sync {
    async fn can_read(&self, document_id: Uuid, user_id: Uuid) -> PortResult<bool>;

    async fn can_write(&self, document_id: Uuid, user_id: Uuid) -> PortResult<bool>;
}

/// The AI collaborator as a black box: text in, instructions in, text out.
#[async_trait]
pub trait LanguageModel: Send + Sync {
    async fn complete(&self, text: &str, instructions: &str) -> PortResult<String>;
}
