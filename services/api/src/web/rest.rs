//! services/api/src/web/rest.rs
//!
//! The master definition for the OpenAPI specification, the liveness probe
//! and the access-check helpers shared by all document handlers.

use axum::response::IntoResponse;
use utoipa::OpenApi;
use uuid::Uuid;

use crate::error::ApiError;
use crate::web::state::AppState;
use crate::web::{documents, versions};

//=========================================================================================
// OpenAPI Master Definition
//=========================================================================================

#[derive(OpenApi)]
#[openapi(
    paths(
        health_handler,
        documents::create_document_handler,
        documents::list_documents_handler,
        documents::get_document_handler,
        documents::update_document_handler,
        documents::delete_document_handler,
        documents::draft_document_handler,
        documents::analyze_document_handler,
        versions::save_content_handler,
        versions::list_versions_handler,
        versions::get_version_handler,
        versions::compare_versions_handler,
        versions::restore_version_handler,
    ),
    components(
        schemas(
            documents::CreateDocumentRequest,
            documents::UpdateDocumentRequest,
            documents::DraftRequest,
            documents::AnalyzeRequest,
            documents::DocumentResponse,
            documents::DocumentSummary,
            documents::CreateDocumentResponse,
            documents::AnalyzeResponse,
            versions::SaveContentRequest,
            versions::VersionResponse,
            versions::VersionSummary,
            versions::SaveContentResponse,
            versions::DiffSegmentPayload,
            versions::DiffStatsPayload,
            versions::ComparisonResponse,
            versions::RestoreResponse,
        )
    ),
    tags(
        (name = "Docket API", description = "Version-controlled legal document drafting endpoints.")
    )
)]
pub struct ApiDoc;

//=========================================================================================
// Access-Check Helpers
//=========================================================================================

/// Fails with 404 unless the caller may read the document. Denied reads and
/// unknown ids are indistinguishable on purpose: a caller without access
/// must not learn that the document exists.
pub async fn authorize_read(
    app_state: &AppState,
    document_id: Uuid,
    user_id: Uuid,
) -> Result<(), ApiError> {
    if app_state.access.can_read(document_id, user_id).await? {
        Ok(())
    } else {
        Err(ApiError::NotFound(format!(
            "Document {} not found",
            document_id
        )))
    }
}

/// Fails with 404 for callers who cannot read, and 403 for callers who can
/// read but not write.
pub async fn authorize_write(
    app_state: &AppState,
    document_id: Uuid,
    user_id: Uuid,
) -> Result<(), ApiError> {
    authorize_read(app_state, document_id, user_id).await?;
    if app_state.access.can_write(document_id, user_id).await? {
        Ok(())
    } else {
        Err(ApiError::Forbidden(
            "You do not have write access to this document".to_string(),
        ))
    }
}

//=========================================================================================
// Liveness Probe
//=========================================================================================

/// Liveness probe for load balancers and container orchestration.
#[utoipa::path(
    get,
    path = "/health",
    responses(
        (status = 200, description = "Service is alive")
    )
)]
pub async fn health_handler() -> impl IntoResponse {
    "OK"
}
