//! services/api/src/adapters/access.rs
//!
//! This module contains the owner-based implementation of the `AccessPolicy`
//! port. Sharing lives in an external collaboration service; until a richer
//! policy is plugged in here, a document is readable and writable by its
//! owner alone.

use async_trait::async_trait;
use docket_core::ports::{AccessPolicy, DocumentStore, PortResult};
use std::sync::Arc;
use uuid::Uuid;

/// An access policy that grants both read and write to the document owner
/// and nothing to anyone else.
pub struct OwnerPolicy {
    store: Arc<dyn DocumentStore>,
}

impl OwnerPolicy {
    /// Creates a new `OwnerPolicy` backed by the given store.
    pub fn new(store: Arc<dyn DocumentStore>) -> Self {
        Self { store }
    }

    async fn is_owner(&self, document_id: Uuid, user_id: Uuid) -> PortResult<bool> {
        let document = self.store.fetch_document(document_id).await?;
        Ok(document.owner_id == user_id)
    }
}

#[async_trait]
impl AccessPolicy for OwnerPolicy {
    async fn can_read(&self, document_id: Uuid, user_id: Uuid) -> PortResult<bool> {
        self.is_owner(document_id, user_id).await
    }

    async fn can_write(&self, document_id: Uuid, user_id: Uuid) -> PortResult<bool> {
        self.is_owner(document_id, user_id).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use docket_core::MemoryStore;

    async fn seeded_policy() -> (OwnerPolicy, Uuid, Uuid) {
        let store = Arc::new(MemoryStore::new());
        let owner = Uuid::new_v4();
        let first = docket_core::ports::NewVersion {
            number: 1,
            content: "between the parties\n",
            description: None,
            machine_generated: false,
        };
        let (document, _) = store
            .insert_document(owner, "NDA", docket_core::DocumentStatus::Draft, first)
            .await
            .unwrap();
        (OwnerPolicy::new(store), owner, document.id)
    }

    #[tokio::test]
    async fn owner_can_read_and_write() {
        let (policy, owner, document_id) = seeded_policy().await;
        assert!(policy.can_read(document_id, owner).await.unwrap());
        assert!(policy.can_write(document_id, owner).await.unwrap());
    }

    #[tokio::test]
    async fn stranger_can_do_neither() {
        let (policy, _, document_id) = seeded_policy().await;
        let stranger = Uuid::new_v4();
        assert!(!policy.can_read(document_id, stranger).await.unwrap());
        assert!(!policy.can_write(document_id, stranger).await.unwrap());
    }
}
