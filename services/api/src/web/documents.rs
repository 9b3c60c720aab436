//! services/api/src/web/documents.rs
//!
//! Axum handlers for document CRUD and the AI drafting/analysis endpoints.
//! Content is deliberately absent from the PATCH payload: every content
//! change goes through the version ledger (`PUT /documents/{id}/content`).

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Json},
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::info;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::error::ApiError;
use crate::web::identity::CurrentUser;
use crate::web::rest::{authorize_read, authorize_write};
use crate::web::state::AppState;
use crate::web::versions::{SaveContentResponse, VersionResponse};
use docket_core::domain::{Document, DocumentStatus};

/// Framing for the drafting model. The concrete editing instructions from
/// the request are appended below this.
const DRAFTING_PREAMBLE: &str = "You are a legal drafting assistant. Rewrite the document \
you are given according to the editing instructions. Return only the complete revised \
document text, with no commentary and no Markdown code fences.";

/// Framing for the analysis model.
const ANALYSIS_PREAMBLE: &str = "You are a legal document reviewer. Analyze the document \
you are given: summarize its purpose, flag ambiguous or risky clauses, and note anything \
unusual for a document of its kind. Answer in plain prose.";

//=========================================================================================
// API Response and Payload Structs
//=========================================================================================

/// The payload for creating a new document.
#[derive(Deserialize, ToSchema)]
pub struct CreateDocumentRequest {
    pub title: String,
    /// The full initial content; stored as version 1.
    pub content: String,
    /// True when the initial content came from the drafting model.
    #[serde(default)]
    pub machine_generated: bool,
}

/// The payload for updating a document's metadata.
#[derive(Deserialize, ToSchema)]
pub struct UpdateDocumentRequest {
    pub title: Option<String>,
    /// One of "draft", "in_review" or "final".
    pub status: Option<String>,
}

/// The payload for requesting an AI draft of the document.
#[derive(Deserialize, ToSchema)]
pub struct DraftRequest {
    /// What the model should change about the current content.
    pub instructions: String,
}

/// The payload for requesting an AI analysis of the document.
#[derive(Deserialize, ToSchema)]
pub struct AnalyzeRequest {
    /// Optional focus question; without one a general review is produced.
    pub question: Option<String>,
}

/// A full document, content included.
#[derive(Serialize, ToSchema)]
pub struct DocumentResponse {
    pub id: Uuid,
    pub owner_id: Uuid,
    pub title: String,
    pub content: String,
    pub status: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl DocumentResponse {
    pub(crate) fn from_domain(document: Document) -> Self {
        Self {
            id: document.id,
            owner_id: document.owner_id,
            title: document.title,
            content: document.content,
            status: document.status.as_str().to_string(),
            created_at: document.created_at,
            updated_at: document.updated_at,
        }
    }
}

/// A document listing entry; content omitted because it can be large.
#[derive(Serialize, ToSchema)]
pub struct DocumentSummary {
    pub id: Uuid,
    pub title: String,
    pub status: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl DocumentSummary {
    fn from_domain(document: Document) -> Self {
        Self {
            id: document.id,
            title: document.title,
            status: document.status.as_str().to_string(),
            created_at: document.created_at,
            updated_at: document.updated_at,
        }
    }
}

/// The response sent after creating a document, with its first version.
#[derive(Serialize, ToSchema)]
pub struct CreateDocumentResponse {
    pub document: DocumentResponse,
    pub version: VersionResponse,
}

/// The response to an analysis request. Nothing is recorded in the ledger.
#[derive(Serialize, ToSchema)]
pub struct AnalyzeResponse {
    pub analysis: String,
}

//=========================================================================================
// Document CRUD Handlers
//=========================================================================================

/// Create a new document. Version 1 is written in the same transaction.
#[utoipa::path(
    post,
    path = "/documents",
    request_body = CreateDocumentRequest,
    responses(
        (status = 201, description = "Document created", body = CreateDocumentResponse),
        (status = 400, description = "Missing title or content"),
        (status = 401, description = "Missing or malformed x-user-id header")
    ),
    params(
        ("x-user-id" = Uuid, Header, description = "The unique ID of the caller.")
    )
)]
pub async fn create_document_handler(
    State(app_state): State<Arc<AppState>>,
    CurrentUser(user_id): CurrentUser,
    Json(payload): Json<CreateDocumentRequest>,
) -> Result<impl IntoResponse, ApiError> {
    if payload.title.trim().is_empty() {
        return Err(ApiError::BadRequest("title is required".to_string()));
    }

    let (document, version) = app_state
        .ledger
        .create_document(
            user_id,
            payload.title.trim(),
            &payload.content,
            payload.machine_generated,
        )
        .await?;
    info!("User {} created document {}", user_id, document.id);

    let response = CreateDocumentResponse {
        document: DocumentResponse::from_domain(document),
        version: VersionResponse::from_domain(version),
    };
    Ok((StatusCode::CREATED, Json(response)))
}

/// List the caller's documents, most recently updated first.
#[utoipa::path(
    get,
    path = "/documents",
    responses(
        (status = 200, description = "The caller's documents", body = [DocumentSummary]),
        (status = 401, description = "Missing or malformed x-user-id header")
    ),
    params(
        ("x-user-id" = Uuid, Header, description = "The unique ID of the caller.")
    )
)]
pub async fn list_documents_handler(
    State(app_state): State<Arc<AppState>>,
    CurrentUser(user_id): CurrentUser,
) -> Result<impl IntoResponse, ApiError> {
    let documents = app_state.store.list_documents(user_id).await?;
    let summaries: Vec<DocumentSummary> = documents
        .into_iter()
        .map(DocumentSummary::from_domain)
        .collect();
    Ok(Json(summaries))
}

/// Fetch one document, content included.
#[utoipa::path(
    get,
    path = "/documents/{id}",
    responses(
        (status = 200, description = "The document", body = DocumentResponse),
        (status = 404, description = "Unknown document, or no read access")
    ),
    params(
        ("id" = Uuid, Path, description = "The document id."),
        ("x-user-id" = Uuid, Header, description = "The unique ID of the caller.")
    )
)]
pub async fn get_document_handler(
    State(app_state): State<Arc<AppState>>,
    CurrentUser(user_id): CurrentUser,
    Path(document_id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    authorize_read(&app_state, document_id, user_id).await?;
    let document = app_state.store.fetch_document(document_id).await?;
    Ok(Json(DocumentResponse::from_domain(document)))
}

/// Update a document's title and/or status. Content cannot be changed here.
#[utoipa::path(
    patch,
    path = "/documents/{id}",
    request_body = UpdateDocumentRequest,
    responses(
        (status = 200, description = "The updated document", body = DocumentResponse),
        (status = 400, description = "Empty title or unknown status"),
        (status = 403, description = "No write access"),
        (status = 404, description = "Unknown document, or no read access")
    ),
    params(
        ("id" = Uuid, Path, description = "The document id."),
        ("x-user-id" = Uuid, Header, description = "The unique ID of the caller.")
    )
)]
pub async fn update_document_handler(
    State(app_state): State<Arc<AppState>>,
    CurrentUser(user_id): CurrentUser,
    Path(document_id): Path<Uuid>,
    Json(payload): Json<UpdateDocumentRequest>,
) -> Result<impl IntoResponse, ApiError> {
    authorize_write(&app_state, document_id, user_id).await?;

    let title = match payload.title.as_deref().map(str::trim) {
        Some("") => {
            return Err(ApiError::BadRequest("title must not be empty".to_string()));
        }
        other => other,
    };
    let status = match payload.status.as_deref() {
        Some(raw) => Some(DocumentStatus::parse(raw).ok_or_else(|| {
            ApiError::BadRequest(format!("'{}' is not a valid document status", raw))
        })?),
        None => None,
    };

    let document = app_state
        .store
        .update_document_meta(document_id, title, status)
        .await?;
    Ok(Json(DocumentResponse::from_domain(document)))
}

/// Delete a document and its entire version history.
#[utoipa::path(
    delete,
    path = "/documents/{id}",
    responses(
        (status = 204, description = "Document and versions deleted"),
        (status = 403, description = "No write access"),
        (status = 404, description = "Unknown document, or no read access")
    ),
    params(
        ("id" = Uuid, Path, description = "The document id."),
        ("x-user-id" = Uuid, Header, description = "The unique ID of the caller.")
    )
)]
pub async fn delete_document_handler(
    State(app_state): State<Arc<AppState>>,
    CurrentUser(user_id): CurrentUser,
    Path(document_id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    authorize_write(&app_state, document_id, user_id).await?;
    app_state.store.delete_document(document_id).await?;
    info!("User {} deleted document {}", user_id, document_id);
    Ok(StatusCode::NO_CONTENT)
}

//=========================================================================================
// AI Drafting and Analysis Handlers
//=========================================================================================

/// Ask the drafting model to rewrite the document.
///
/// The model's output is recorded through the ledger as a machine-generated
/// version, so an AI draft is subject to exactly the same dedup and
/// numbering rules as a human edit.
#[utoipa::path(
    post,
    path = "/documents/{id}/draft",
    request_body = DraftRequest,
    responses(
        (status = 201, description = "Draft recorded as a new version", body = SaveContentResponse),
        (status = 200, description = "Draft was identical to the latest version; nothing recorded", body = SaveContentResponse),
        (status = 400, description = "Empty instructions"),
        (status = 403, description = "No write access"),
        (status = 404, description = "Unknown document, or no read access")
    ),
    params(
        ("id" = Uuid, Path, description = "The document id."),
        ("x-user-id" = Uuid, Header, description = "The unique ID of the caller.")
    )
)]
pub async fn draft_document_handler(
    State(app_state): State<Arc<AppState>>,
    CurrentUser(user_id): CurrentUser,
    Path(document_id): Path<Uuid>,
    Json(payload): Json<DraftRequest>,
) -> Result<impl IntoResponse, ApiError> {
    authorize_write(&app_state, document_id, user_id).await?;
    if payload.instructions.trim().is_empty() {
        return Err(ApiError::BadRequest("instructions are required".to_string()));
    }

    let document = app_state.store.fetch_document(document_id).await?;
    let instructions = format!(
        "{}\n\nEDITING INSTRUCTIONS:\n{}",
        DRAFTING_PREAMBLE, payload.instructions
    );
    let drafted = app_state
        .drafting
        .complete(&document.content, &instructions)
        .await?;

    let edit = app_state
        .ledger
        .record_edit(document_id, &drafted, Some("AI draft"), true)
        .await?;
    info!(
        "User {} recorded an AI draft of document {} (version {}, created: {})",
        user_id, document_id, edit.version.number, edit.created
    );

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

/// Ask the analysis model about the document's current content.
///
/// Pure read: nothing is recorded in the ledger.
#[utoipa::path(
    post,
    path = "/documents/{id}/analyze",
    request_body = AnalyzeRequest,
    responses(
        (status = 200, description = "The analysis", body = AnalyzeResponse),
        (status = 404, description = "Unknown document, or no read access")
    ),
    params(
        ("id" = Uuid, Path, description = "The document id."),
        ("x-user-id" = Uuid, Header, description = "The unique ID of the caller.")
    )
)]
pub async fn analyze_document_handler(
    State(app_state): State<Arc<AppState>>,
    CurrentUser(user_id): CurrentUser,
    Path(document_id): Path<Uuid>,
    Json(payload): Json<AnalyzeRequest>,
) -> Result<impl IntoResponse, ApiError> {
    authorize_read(&app_state, document_id, user_id).await?;
    let document = app_state.store.fetch_document(document_id).await?;

    let instructions = match payload.question.as_deref().map(str::trim) {
        Some(question) if !question.is_empty() => {
            format!("{}\n\nFOCUS ON: {}", ANALYSIS_PREAMBLE, question)
        }
        _ => ANALYSIS_PREAMBLE.to_string(),
    };
    let analysis = app_state
        .analysis
        .complete(&document.content, &instructions)
        .await?;

    Ok(Json(AnalyzeResponse { analysis }))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn create_request_defaults_to_human_origin() {
        let payload: CreateDocumentRequest =
            serde_json::from_str(r#"{"title": "NDA", "content": "between the parties\n"}"#)
                .unwrap();
        assert!(!payload.machine_generated);
    }

    #[test]
    fn update_request_accepts_partial_payloads() {
        let payload: UpdateDocumentRequest =
            serde_json::from_str(r#"{"status": "in_review"}"#).unwrap();
        assert_eq!(payload.title, None);
        assert_eq!(payload.status.as_deref(), Some("in_review"));
    }

    #[test]
    fn document_response_serializes_status_as_wire_string() {
        let document = Document {
            id: Uuid::new_v4(),
            owner_id: Uuid::new_v4(),
            title: "NDA".to_string(),
            content: "between the parties\n".to_string(),
            status: DocumentStatus::InReview,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        };
        let value = serde_json::to_value(DocumentResponse::from_domain(document)).unwrap();
        assert_eq!(value["status"], "in_review");
    }
}
