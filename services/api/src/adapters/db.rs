//! services/api/src/adapters/db.rs
//!
//! This module contains the database adapter, which is the concrete implementation
//! of the `DocumentStore` port from the `core` crate. It handles all interactions
//! with the PostgreSQL database using `sqlx`.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use docket_core::domain::{Document, DocumentStatus, DocumentVersion};
use docket_core::ports::{DocumentStore, NewVersion, PortError, PortResult};
use sqlx::{FromRow, PgPool};
use uuid::Uuid;

//=========================================================================================
// The Main Adapter Struct
//=========================================================================================

/// A database adapter that implements the `DocumentStore` port.
#[derive(Clone)]
pub struct DbAdapter {
    pool: PgPool,
}

impl DbAdapter {
    /// Creates a new `DbAdapter`.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// A helper function to run database migrations at startup.
    pub async fn run_migrations(&self) -> Result<(), sqlx::Error> {
        sqlx::migrate!("./migrations").run(&self.pool).await?;
        Ok(())
    }
}

/// Postgres signals a violated unique constraint with SQLSTATE 23505. The
/// `(document_id, version_number)` constraint is the only unique one that
/// concurrent requests can trip over.
fn is_unique_violation(err: &sqlx::Error) -> bool {
    match err {
        sqlx::Error::Database(db_err) => db_err.code().as_deref() == Some("23505"),
        _ => false,
    }
}

/// SQLSTATE 23503: the new version row references a document row that is
/// gone. Happens only when the document is deleted mid-append.
fn is_missing_parent(err: &sqlx::Error) -> bool {
    match err {
        sqlx::Error::Database(db_err) => db_err.code().as_deref() == Some("23503"),
        _ => false,
    }
}

//=========================================================================================
// "Impure" Database Record Structs
//=========================================================================================

#[derive(FromRow)]
struct DocumentRecord {
    id: Uuid,
    owner_id: Uuid,
    title: String,
    content: String,
    status: String,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}
impl DocumentRecord {
    fn to_domain(self) -> PortResult<Document> {
        let status = DocumentStatus::parse(&self.status).ok_or_else(|| {
            PortError::Unexpected(format!(
                "Document {} carries unknown status '{}'",
                self.id, self.status
            ))
        })?;
        Ok(Document {
            id: self.id,
            owner_id: self.owner_id,
            title: self.title,
            content: self.content,
            status,
            created_at: self.created_at,
            updated_at: self.updated_at,
        })
    }
}

#[derive(FromRow)]
struct VersionRecord {
    id: Uuid,
    document_id: Uuid,
    version_number: i32,
    content: String,
    description: Option<String>,
    machine_generated: bool,
    created_at: DateTime<Utc>,
}
impl VersionRecord {
    fn to_domain(self) -> DocumentVersion {
        DocumentVersion {
            id: self.id,
            document_id: self.document_id,
            number: self.version_number,
            content: self.content,
            description: self.description,
            machine_generated: self.machine_generated,
            created_at: self.created_at,
        }
    }
}

const DOCUMENT_COLUMNS: &str = "id, owner_id, title, content, status, created_at, updated_at";
const VERSION_COLUMNS: &str =
    "id, document_id, version_number, content, description, machine_generated, created_at";

//=========================================================================================
// `DocumentStore` Trait Implementation
//=========================================================================================

#[async_trait]
impl DocumentStore for DbAdapter {
    async fn insert_document(
        &self,
        owner_id: Uuid,
        title: &str,
        status: DocumentStatus,
        first: NewVersion<'_>,
    ) -> PortResult<(Document, DocumentVersion)> {
        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| PortError::Unexpected(e.to_string()))?;

        let document_record = sqlx::query_as::<_, DocumentRecord>(&format!(
            "INSERT INTO documents (id, owner_id, title, content, status) \
             VALUES ($1, $2, $3, $4, $5) RETURNING {DOCUMENT_COLUMNS}"
        ))
        .bind(Uuid::new_v4())
        .bind(owner_id)
        .bind(title)
        .bind(first.content)
        .bind(status.as_str())
        .fetch_one(&mut *tx)
        .await
        .map_err(|e| PortError::Unexpected(e.to_string()))?;

        let version_record = sqlx::query_as::<_, VersionRecord>(&format!(
            "INSERT INTO document_versions \
             (id, document_id, version_number, content, description, machine_generated) \
             VALUES ($1, $2, $3, $4, $5, $6) RETURNING {VERSION_COLUMNS}"
        ))
        .bind(Uuid::new_v4())
        .bind(document_record.id)
        .bind(first.number)
        .bind(first.content)
        .bind(first.description)
        .bind(first.machine_generated)
        .fetch_one(&mut *tx)
        .await
        .map_err(|e| PortError::Unexpected(e.to_string()))?;

        tx.commit()
            .await
            .map_err(|e| PortError::Unexpected(e.to_string()))?;

        Ok((document_record.to_domain()?, version_record.to_domain()))
    }

    async fn fetch_document(&self, document_id: Uuid) -> PortResult<Document> {
        let record = sqlx::query_as::<_, DocumentRecord>(&format!(
            "SELECT {DOCUMENT_COLUMNS} FROM documents WHERE id = $1"
        ))
        .bind(document_id)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| match e {
            sqlx::Error::RowNotFound => {
                PortError::NotFound(format!("Document {} not found", document_id))
            }
            _ => PortError::Unexpected(e.to_string()),
        })?;
        record.to_domain()
    }

    async fn list_documents(&self, owner_id: Uuid) -> PortResult<Vec<Document>> {
        let records = sqlx::query_as::<_, DocumentRecord>(&format!(
            "SELECT {DOCUMENT_COLUMNS} FROM documents WHERE owner_id = $1 \
             ORDER BY updated_at DESC"
        ))
        .bind(owner_id)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| PortError::Unexpected(e.to_string()))?;

        records.into_iter().map(|r| r.to_domain()).collect()
    }

    async fn update_document_meta(
        &self,
        document_id: Uuid,
        title: Option<&str>,
        status: Option<DocumentStatus>,
    ) -> PortResult<Document> {
        let record = sqlx::query_as::<_, DocumentRecord>(&format!(
            "UPDATE documents SET title = COALESCE($2, title), \
             status = COALESCE($3, status), updated_at = now() \
             WHERE id = $1 RETURNING {DOCUMENT_COLUMNS}"
        ))
        .bind(document_id)
        .bind(title)
        .bind(status.map(|s| s.as_str()))
        .fetch_one(&self.pool)
        .await
        .map_err(|e| match e {
            sqlx::Error::RowNotFound => {
                PortError::NotFound(format!("Document {} not found", document_id))
            }
            _ => PortError::Unexpected(e.to_string()),
        })?;
        record.to_domain()
    }

    async fn delete_document(&self, document_id: Uuid) -> PortResult<()> {
        // The version rows go with it via ON DELETE CASCADE.
        let result = sqlx::query("DELETE FROM documents WHERE id = $1")
            .bind(document_id)
            .execute(&self.pool)
            .await
            .map_err(|e| PortError::Unexpected(e.to_string()))?;

        if result.rows_affected() == 0 {
            return Err(PortError::NotFound(format!(
                "Document {} not found",
                document_id
            )));
        }
        Ok(())
    }

    async fn fetch_version(&self, version_id: Uuid) -> PortResult<DocumentVersion> {
        let record = sqlx::query_as::<_, VersionRecord>(&format!(
            "SELECT {VERSION_COLUMNS} FROM document_versions WHERE id = $1"
        ))
        .bind(version_id)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| match e {
            sqlx::Error::RowNotFound => {
                PortError::NotFound(format!("Version {} not found", version_id))
            }
            _ => PortError::Unexpected(e.to_string()),
        })?;
        Ok(record.to_domain())
    }

    async fn list_versions(&self, document_id: Uuid) -> PortResult<Vec<DocumentVersion>> {
        let records = sqlx::query_as::<_, VersionRecord>(&format!(
            "SELECT {VERSION_COLUMNS} FROM document_versions WHERE document_id = $1 \
             ORDER BY version_number DESC"
        ))
        .bind(document_id)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| PortError::Unexpected(e.to_string()))?;

        Ok(records.into_iter().map(|r| r.to_domain()).collect())
    }

    async fn latest_version(&self, document_id: Uuid) -> PortResult<Option<DocumentVersion>> {
        let record = sqlx::query_as::<_, VersionRecord>(&format!(
            "SELECT {VERSION_COLUMNS} FROM document_versions WHERE document_id = $1 \
             ORDER BY version_number DESC LIMIT 1"
        ))
        .bind(document_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| PortError::Unexpected(e.to_string()))?;

        Ok(record.map(|r| r.to_domain()))
    }

    async fn append_version(
        &self,
        document_id: Uuid,
        version: NewVersion<'_>,
    ) -> PortResult<(Document, DocumentVersion)> {
        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| PortError::Unexpected(e.to_string()))?;

        let version_record = sqlx::query_as::<_, VersionRecord>(&format!(
            "INSERT INTO document_versions \
             (id, document_id, version_number, content, description, machine_generated) \
             VALUES ($1, $2, $3, $4, $5, $6) RETURNING {VERSION_COLUMNS}"
        ))
        .bind(Uuid::new_v4())
        .bind(document_id)
        .bind(version.number)
        .bind(version.content)
        .bind(version.description)
        .bind(version.machine_generated)
        .fetch_one(&mut *tx)
        .await
        .map_err(|e| {
            if is_unique_violation(&e) {
                PortError::Conflict(format!(
                    "Document {} already has a version {}",
                    document_id, version.number
                ))
            } else if is_missing_parent(&e) {
                PortError::NotFound(format!("Document {} not found", document_id))
            } else {
                PortError::Unexpected(e.to_string())
            }
        })?;

        // Keep the document projection in step with the ledger inside the
        // same transaction, with timestamps that match exactly.
        let document_record = sqlx::query_as::<_, DocumentRecord>(&format!(
            "UPDATE documents SET content = $2, updated_at = $3 WHERE id = $1 \
             RETURNING {DOCUMENT_COLUMNS}"
        ))
        .bind(document_id)
        .bind(version.content)
        .bind(version_record.created_at)
        .fetch_one(&mut *tx)
        .await
        .map_err(|e| match e {
            sqlx::Error::RowNotFound => {
                PortError::NotFound(format!("Document {} not found", document_id))
            }
            _ => PortError::Unexpected(e.to_string()),
        })?;

        tx.commit()
            .await
            .map_err(|e| PortError::Unexpected(e.to_string()))?;

        Ok((document_record.to_domain()?, version_record.to_domain()))
    }
}
