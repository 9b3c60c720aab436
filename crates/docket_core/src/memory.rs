//! crates/docket_core/src/memory.rs
//!
//! A reference `DocumentStore` held entirely in memory. It enforces the
//! same observable contract as the SQL adapter — unique
//! (document, version number) pairs, append and projection update under
//! one lock — which makes it the store of choice for hermetic tests.

use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard};

use async_trait::async_trait;
use chrono::Utc;
use uuid::Uuid;

use crate::domain::{Document, DocumentStatus, DocumentVersion};
use crate::ports::{DocumentStore, NewVersion, PortError, PortResult};

#[derive(Default)]
pub struct MemoryStore {
    state: Mutex<State>,
}

#[derive(Default)]
struct State {
    documents: HashMap<Uuid, Document>,
    versions: HashMap<Uuid, DocumentVersion>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn locked(&self) -> MutexGuard<'_, State> {
        // A panicked test thread must not wedge every other test.
        self.state.lock().unwrap_or_else(|poison| poison.into_inner())
    }
}

fn missing_document(id: Uuid) -> PortError {
    PortError::NotFound(format!("document {id}"))
}

fn missing_version(id: Uuid) -> PortError {
    PortError::NotFound(format!("version {id}"))
}

fn build_version(document_id: Uuid, fields: NewVersion<'_>) -> DocumentVersion {
    DocumentVersion {
        id: Uuid::new_v4(),
        document_id,
        number: fields.number,
        content: fields.content.to_string(),
        description: fields.description.map(str::to_string),
        machine_generated: fields.machine_generated,
        created_at: Utc::now(),
    }
}

#[async_trait]
impl DocumentStore for MemoryStore {
    async fn insert_document(
        &self,
        owner_id: Uuid,
        title: &str,
        status: DocumentStatus,
        first: NewVersion<'_>,
    ) -> PortResult<(Document, DocumentVersion)> {
        let mut state = self.locked();
        let now = Utc::now();
        let document = Document {
            id: Uuid::new_v4(),
            owner_id,
            title: title.to_string(),
            content: first.content.to_string(),
            status,
            created_at: now,
            updated_at: now,
        };
        let version = build_version(document.id, first);

        state.documents.insert(document.id, document.clone());
        state.versions.insert(version.id, version.clone());
        Ok((document, version))
    }

    async fn fetch_document(&self, document_id: Uuid) -> PortResult<Document> {
        self.locked()
            .documents
            .get(&document_id)
            .cloned()
            .ok_or_else(|| missing_document(document_id))
    }

    async fn list_documents(&self, owner_id: Uuid) -> PortResult<Vec<Document>> {
        let state = self.locked();
        let mut documents: Vec<Document> = state
            .documents
            .values()
            .filter(|d| d.owner_id == owner_id)
            .cloned()
            .collect();
        documents.sort_by(|a, b| b.updated_at.cmp(&a.updated_at));
        Ok(documents)
    }

    async fn update_document_meta(
        &self,
        document_id: Uuid,
        title: Option<&str>,
        status: Option<DocumentStatus>,
    ) -> PortResult<Document> {
        let mut state = self.locked();
        let document = state
            .documents
            .get_mut(&document_id)
            .ok_or_else(|| missing_document(document_id))?;
        if let Some(title) = title {
            document.title = title.to_string();
        }
        if let Some(status) = status {
            document.status = status;
        }
        document.updated_at = Utc::now();
        Ok(document.clone())
    }

    async fn delete_document(&self, document_id: Uuid) -> PortResult<()> {
        let mut state = self.locked();
        state
            .documents
            .remove(&document_id)
            .ok_or_else(|| missing_document(document_id))?;
        // Cascade, as the SQL schema does through its foreign key.
        state.versions.retain(|_, v| v.document_id != document_id);
        Ok(())
    }

    async fn fetch_version(&self, version_id: Uuid) -> PortResult<DocumentVersion> {
        self.locked()
            .versions
            .get(&version_id)
            .cloned()
            .ok_or_else(|| missing_version(version_id))
    }

    async fn list_versions(&self, document_id: Uuid) -> PortResult<Vec<DocumentVersion>> {
        let state = self.locked();
        let mut versions: Vec<DocumentVersion> = state
            .versions
            .values()
            .filter(|v| v.document_id == document_id)
            .cloned()
            .collect();
        versions.sort_by(|a, b| b.number.cmp(&a.number));
        Ok(versions)
    }

    async fn latest_version(&self, document_id: Uuid) -> PortResult<Option<DocumentVersion>> {
        let state = self.locked();
        Ok(state
            .versions
            .values()
            .filter(|v| v.document_id == document_id)
            .max_by_key(|v| v.number)
            .cloned())
    }

    async fn append_version(
        &self,
        document_id: Uuid,
        fields: NewVersion<'_>,
    ) -> PortResult<(Document, DocumentVersion)> {
        let mut state = self.locked();

        let taken = state
            .versions
            .values()
            .any(|v| v.document_id == document_id && v.number == fields.number);
        if taken {
            return Err(PortError::Conflict(format!(
                "document {document_id} already has a version {}",
                fields.number
            )));
        }

        let document = state
            .documents
            .get_mut(&document_id)
            .ok_or_else(|| missing_document(document_id))?;
        let version = build_version(document_id, fields);
        document.content = version.content.clone();
        document.updated_at = version.created_at;
        let document = document.clone();

        state.versions.insert(version.id, version.clone());
        Ok((document, version))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn draft(content: &str) -> NewVersion<'_> {
        NewVersion {
            number: 1,
            content,
            description: None,
            machine_generated: false,
        }
    }

    #[tokio::test]
    async fn duplicate_version_number_conflicts_without_writing() {
        let store = MemoryStore::new();
        let (document, _) = store
            .insert_document(Uuid::new_v4(), "Will", DocumentStatus::Draft, draft("a\n"))
            .await
            .unwrap();

        let err = store
            .append_version(document.id, draft("b\n"))
            .await
            .unwrap_err();
        assert!(matches!(err, PortError::Conflict(_)));

        // The rejected append must not have touched the projection.
        let unchanged = store.fetch_document(document.id).await.unwrap();
        assert_eq!(unchanged.content, "a\n");
        assert_eq!(store.list_versions(document.id).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn append_updates_projection_atomically() {
        let store = MemoryStore::new();
        let (document, _) = store
            .insert_document(Uuid::new_v4(), "Will", DocumentStatus::Draft, draft("a\n"))
            .await
            .unwrap();

        let (updated, version) = store
            .append_version(
                document.id,
                NewVersion {
                    number: 2,
                    content: "b\n",
                    description: Some("second pass"),
                    machine_generated: false,
                },
            )
            .await
            .unwrap();

        assert_eq!(updated.content, "b\n");
        assert_eq!(updated.updated_at, version.created_at);
        assert_eq!(version.description.as_deref(), Some("second pass"));
    }

    #[tokio::test]
    async fn delete_document_cascades_to_versions() {
        let store = MemoryStore::new();
        let (document, version) = store
            .insert_document(Uuid::new_v4(), "Will", DocumentStatus::Draft, draft("a\n"))
            .await
            .unwrap();

        store.delete_document(document.id).await.unwrap();

        assert!(matches!(
            store.fetch_document(document.id).await.unwrap_err(),
            PortError::NotFound(_)
        ));
        assert!(matches!(
            store.fetch_version(version.id).await.unwrap_err(),
            PortError::NotFound(_)
        ));
    }
}
