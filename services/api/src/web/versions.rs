//! services/api/src/web/versions.rs
//!
//! Axum handlers for the version ledger: recording edits, listing and
//! fetching versions, comparing two versions and restoring an old one.

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Json},
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::info;
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;

use crate::error::ApiError;
use crate::web::documents::DocumentResponse;
use crate::web::identity::CurrentUser;
use crate::web::rest::{authorize_read, authorize_write};
use crate::web::state::AppState;
use docket_core::diff::{DiffSegment, DiffStats};
use docket_core::domain::DocumentVersion;
use docket_core::VersionComparison;

//=========================================================================================
// API Response and Payload Structs
//=========================================================================================

/// The payload for saving new document content.
#[derive(Deserialize, ToSchema)]
pub struct SaveContentRequest {
    /// The full new content; the ledger stores snapshots, not patches.
    pub content: String,
    /// Optional note shown next to the version in history.
    pub description: Option<String>,
}

/// A full version, content included.
#[derive(Serialize, ToSchema)]
pub struct VersionResponse {
    pub id: Uuid,
    pub document_id: Uuid,
    pub number: i32,
    pub content: String,
    pub description: Option<String>,
    pub machine_generated: bool,
    pub created_at: DateTime<Utc>,
}

impl VersionResponse {
    pub(crate) fn from_domain(version: DocumentVersion) -> Self {
        Self {
            id: version.id,
            document_id: version.document_id,
            number: version.number,
            content: version.content,
            description: version.description,
            machine_generated: version.machine_generated,
            created_at: version.created_at,
        }
    }
}

/// A version listing entry; content omitted because it can be large.
#[derive(Serialize, ToSchema)]
pub struct VersionSummary {
    pub id: Uuid,
    pub number: i32,
    pub description: Option<String>,
    pub machine_generated: bool,
    pub created_at: DateTime<Utc>,
}

impl VersionSummary {
    fn from_domain(version: DocumentVersion) -> Self {
        Self {
            id: version.id,
            number: version.number,
            description: version.description,
            machine_generated: version.machine_generated,
            created_at: version.created_at,
        }
    }
}

/// The response to a content save or an AI draft.
#[derive(Serialize, ToSchema)]
pub struct SaveContentResponse {
    pub version: VersionResponse,
    /// False when the content was identical to the latest version and
    /// nothing was written; `version` is then the existing latest version.
    pub created: bool,
}

/// Query parameters selecting the two versions to compare.
#[derive(Deserialize, IntoParams)]
pub struct CompareParams {
    /// The older side of the comparison.
    pub from: Uuid,
    /// The newer side of the comparison.
    pub to: Uuid,
}

/// One run of consecutive lines sharing a diff tag.
#[derive(Serialize, ToSchema)]
pub struct DiffSegmentPayload {
    /// One of "unchanged", "added" or "removed".
    pub kind: String,
    pub text: String,
    pub line_count: usize,
}

impl DiffSegmentPayload {
    fn from_domain(segment: DiffSegment) -> Self {
        Self {
            kind: segment.kind.as_str().to_string(),
            text: segment.text,
            line_count: segment.line_count,
        }
    }
}

/// Aggregate counts over the segments of one comparison.
#[derive(Serialize, ToSchema)]
pub struct DiffStatsPayload {
    pub additions: usize,
    pub deletions: usize,
    pub changes: usize,
}

impl DiffStatsPayload {
    fn from_domain(stats: DiffStats) -> Self {
        Self {
            additions: stats.additions,
            deletions: stats.deletions,
            changes: stats.changes,
        }
    }
}

/// The response to a version comparison.
#[derive(Serialize, ToSchema)]
pub struct ComparisonResponse {
    pub from: VersionSummary,
    pub to: VersionSummary,
    pub segments: Vec<DiffSegmentPayload>,
    pub stats: DiffStatsPayload,
}

impl ComparisonResponse {
    fn from_domain(comparison: VersionComparison) -> Self {
        Self {
            from: VersionSummary::from_domain(comparison.from),
            to: VersionSummary::from_domain(comparison.to),
            segments: comparison
                .segments
                .into_iter()
                .map(DiffSegmentPayload::from_domain)
                .collect(),
            stats: DiffStatsPayload::from_domain(comparison.stats),
        }
    }
}

/// The response to a restore: the new head version and the updated document.
#[derive(Serialize, ToSchema)]
pub struct RestoreResponse {
    pub document: DocumentResponse,
    pub version: VersionResponse,
}

//=========================================================================================
// Version Ledger Handlers
//=========================================================================================

/// Save new content for a document.
///
/// Saving content identical to the latest version writes nothing and
/// returns 200 with the existing version; anything else appends the next
/// version and returns 201.
#[utoipa::path(
    put,
    path = "/documents/{id}/content",
    request_body = SaveContentRequest,
    responses(
        (status = 201, description = "New version appended", body = SaveContentResponse),
        (status = 200, description = "Content unchanged; nothing written", body = SaveContentResponse),
        (status = 403, description = "No write access"),
        (status = 404, description = "Unknown document, or no read access"),
        (status = 409, description = "Lost the version number race repeatedly; retry the save")
    ),
    params(
        ("id" = Uuid, Path, description = "The document id."),
        ("x-user-id" = Uuid, Header, description = "The unique ID of the caller.")
    )
)]
pub async fn save_content_handler(
    State(app_state): State<Arc<AppState>>,
    CurrentUser(user_id): CurrentUser,
    Path(document_id): Path<Uuid>,
    Json(payload): Json<SaveContentRequest>,
) -> Result<impl IntoResponse, ApiError> {
    authorize_write(&app_state, document_id, user_id).await?;

    let edit = app_state
        .ledger
        .record_edit(
            document_id,
            &payload.content,
            payload.description.as_deref(),
            false,
        )
        .await?;
    if edit.created {
        info!(
            "User {} saved version {} of document {}",
            user_id, edit.version.number, document_id
        );
    }

    let status = if edit.created {
        StatusCode::CREATED
    } else {
        StatusCode::OK
    };
    let response = SaveContentResponse {
        version: VersionResponse::from_domain(edit.version),
        created: edit.created,
    };
    Ok((status, Json(response)))
}

/// List a document's versions, newest number first.
#[utoipa::path(
    get,
    path = "/documents/{id}/versions",
    responses(
        (status = 200, description = "The version history", body = [VersionSummary]),
        (status = 404, description = "Unknown document, or no read access")
    ),
    params(
        ("id" = Uuid, Path, description = "The document id."),
        ("x-user-id" = Uuid, Header, description = "The unique ID of the caller.")
    )
)]
pub async fn list_versions_handler(
    State(app_state): State<Arc<AppState>>,
    CurrentUser(user_id): CurrentUser,
    Path(document_id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    authorize_read(&app_state, document_id, user_id).await?;
    let versions = app_state.ledger.list_versions(document_id).await?;
    let summaries: Vec<VersionSummary> = versions
        .into_iter()
        .map(VersionSummary::from_domain)
        .collect();
    Ok(Json(summaries))
}

/// Fetch one version in full, content included.
#[utoipa::path(
    get,
    path = "/documents/{id}/versions/{version_id}",
    responses(
        (status = 200, description = "The version", body = VersionResponse),
        (status = 400, description = "The version belongs to a different document"),
        (status = 404, description = "Unknown document or version, or no read access")
    ),
    params(
        ("id" = Uuid, Path, description = "The document id."),
        ("version_id" = Uuid, Path, description = "The version id."),
        ("x-user-id" = Uuid, Header, description = "The unique ID of the caller.")
    )
)]
pub async fn get_version_handler(
    State(app_state): State<Arc<AppState>>,
    CurrentUser(user_id): CurrentUser,
    Path((document_id, version_id)): Path<(Uuid, Uuid)>,
) -> Result<impl IntoResponse, ApiError> {
    authorize_read(&app_state, document_id, user_id).await?;

    let version = app_state.store.fetch_version(version_id).await?;
    if version.document_id != document_id {
        return Err(ApiError::BadRequest(format!(
            "version {} does not belong to document {}",
            version_id, document_id
        )));
    }
    Ok(Json(VersionResponse::from_domain(version)))
}

/// Compare two versions of the same document.
#[utoipa::path(
    get,
    path = "/documents/{id}/versions/compare",
    responses(
        (status = 200, description = "The line diff between the two versions", body = ComparisonResponse),
        (status = 400, description = "A version belongs to a different document"),
        (status = 404, description = "Unknown document or version, or no read access")
    ),
    params(
        ("id" = Uuid, Path, description = "The document id."),
        CompareParams,
        ("x-user-id" = Uuid, Header, description = "The unique ID of the caller.")
    )
)]
pub async fn compare_versions_handler(
    State(app_state): State<Arc<AppState>>,
    CurrentUser(user_id): CurrentUser,
    Path(document_id): Path<Uuid>,
    Query(params): Query<CompareParams>,
) -> Result<impl IntoResponse, ApiError> {
    authorize_read(&app_state, document_id, user_id).await?;

    let comparison = app_state
        .history
        .compare_versions(document_id, params.from, params.to)
        .await?;
    Ok(Json(ComparisonResponse::from_domain(comparison)))
}

/// Restore a document to an earlier version.
///
/// Restoring never rewrites history: the target's content is appended as a
/// brand new version, intervening versions included, even when the target
/// content equals the current head.
#[utoipa::path(
    post,
    path = "/documents/{id}/versions/{version_id}/restore",
    responses(
        (status = 201, description = "Restored; a new version was appended", body = RestoreResponse),
        (status = 400, description = "The version belongs to a different document"),
        (status = 403, description = "No write access"),
        (status = 404, description = "Unknown document or version, or no read access"),
        (status = 409, description = "Lost the version number race repeatedly; retry the restore")
    ),
    params(
        ("id" = Uuid, Path, description = "The document id."),
        ("version_id" = Uuid, Path, description = "The version to restore."),
        ("x-user-id" = Uuid, Header, description = "The unique ID of the caller.")
    )
)]
pub async fn restore_version_handler(
    State(app_state): State<Arc<AppState>>,
    CurrentUser(user_id): CurrentUser,
    Path((document_id, version_id)): Path<(Uuid, Uuid)>,
) -> Result<impl IntoResponse, ApiError> {
    authorize_write(&app_state, document_id, user_id).await?;

    let restored = app_state
        .history
        .restore_version(document_id, version_id)
        .await?;
    info!(
        "User {} restored document {}; appended version {}",
        user_id, document_id, restored.version.number
    );

    let response = RestoreResponse {
        document: DocumentResponse::from_domain(restored.document),
        version: VersionResponse::from_domain(restored.version),
    };
    Ok((StatusCode::CREATED, Json(response)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use docket_core::diff::SegmentKind;

    #[test]
    fn save_request_description_is_optional() {
        let payload: SaveContentRequest =
            serde_json::from_str(r#"{"content": "WHEREAS...\n"}"#).unwrap();
        assert_eq!(payload.description, None);
    }

    #[test]
    fn segment_payload_uses_wire_tags() {
        for (kind, expected) in [
            (SegmentKind::Unchanged, "unchanged"),
            (SegmentKind::Added, "added"),
            (SegmentKind::Removed, "removed"),
        ] {
            let payload = DiffSegmentPayload::from_domain(DiffSegment {
                kind,
                text: "line\n".to_string(),
                line_count: 1,
            });
            let value = serde_json::to_value(payload).unwrap();
            assert_eq!(value["kind"], expected);
        }
    }

    #[test]
    fn version_summary_has_no_content_field() {
        let summary = VersionSummary::from_domain(DocumentVersion {
            id: Uuid::new_v4(),
            document_id: Uuid::new_v4(),
            number: 1,
            content: "the full text\n".to_string(),
            description: None,
            machine_generated: false,
            created_at: Utc::now(),
        });
        let value = serde_json::to_value(summary).unwrap();
        assert!(value.get("content").is_none());
        assert_eq!(value["number"], 1);
    }
}
