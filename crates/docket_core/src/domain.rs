//! crates/docket_core/src/domain.rs
//!
//! Defines the pure, core data structures for the application.
//! These structs are independent of any database or serialization format.

use chrono::{DateTime, Utc};
use uuid::Uuid;

/// Lifecycle state of a legal document.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DocumentStatus {
    Draft,
    InReview,
    Final,
}

impl DocumentStatus {
    /// Stable string form, used by the record store and the API layer.
    pub fn as_str(&self) -> &'static str {
        match self {
            DocumentStatus::Draft => "draft",
            DocumentStatus::InReview => "in_review",
            DocumentStatus::Final => "final",
        }
    }

    pub fn parse(raw: &str) -> Option<Self> {
        match raw {
            "draft" => Some(DocumentStatus::Draft),
            "in_review" => Some(DocumentStatus::InReview),
            "final" => Some(DocumentStatus::Final),
            _ => None,
        }
    }
}

/// A legal document as the user currently sees it.
///
/// `content` is a cached projection of the most recent version's content;
/// the version ledger is the only writer of that field.
#[derive(Debug, Clone)]
pub struct Document {
    pub id: Uuid,
    /// Opaque owner reference. Identity is resolved by an external provider;
    /// there is no user table behind this id.
    pub owner_id: Uuid,
    pub title: String,
    pub content: String,
    pub status: DocumentStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// An immutable, numbered snapshot of a document's full content.
///
/// Versions are append-only: once written they are never mutated, and the
/// only way one disappears is the cascade delete of its whole document.
#[derive(Debug, Clone)]
pub struct DocumentVersion {
    pub id: Uuid,
    pub document_id: Uuid,
    /// Starts at 1 and increases without gaps. This is the sole ordering
    /// key; `created_at` is informational only (clock skew could disagree
    /// with append order).
    pub number: i32,
    pub content: String,
    pub description: Option<String>,
    /// True when the content came out of the drafting model rather than a
    /// human editor.
    pub machine_generated: bool,
    pub created_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_round_trips_through_str() {
        for status in [
            DocumentStatus::Draft,
            DocumentStatus::InReview,
            DocumentStatus::Final,
        ] {
            assert_eq!(DocumentStatus::parse(status.as_str()), Some(status));
        }
    }

    #[test]
    fn unknown_status_is_rejected() {
        assert_eq!(DocumentStatus::parse("archived"), None);
        assert_eq!(DocumentStatus::parse(""), None);
    }
}
