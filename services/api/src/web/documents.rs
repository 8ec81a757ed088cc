//! services/api/src/web/documents.rs
//!
//! Endpoints driving the two-stage document review.

use axum::{
    extract::Multipart,
    http::StatusCode,
    response::IntoResponse,
    Extension, Json,
};
use lexvault_core::{Brief, Document, DocumentPhase, Workspace};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{error, info};
use utoipa::ToSchema;

use crate::web::auth::Ack;
use crate::web::response::WebError;

//=========================================================================================
// Payloads
//=========================================================================================

#[derive(Deserialize, ToSchema)]
pub struct InstructionsRequest {
    /// Free-text focus for the extraction. Absent or blank clears it.
    pub instructions: Option<String>,
}

/// The active brief together with where the review stands.
#[derive(Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct BriefResponse {
    #[schema(value_type = String, example = "stage1_complete")]
    pub phase: DocumentPhase,
    #[schema(value_type = Option<Object>)]
    pub brief: Option<Brief>,
}

//=========================================================================================
// Handlers
//=========================================================================================

/// POST /documents - Upload the document to review, replacing any previous one.
///
/// Accepts a multipart/form-data request with a single file part.
#[utoipa::path(
    post,
    path = "/documents",
    request_body(content_type = "multipart/form-data", description = "The document to review."),
    responses(
        (status = 201, description = "Document loaded", body = Object),
        (status = 400, description = "Missing or empty file"),
        (status = 403, description = "Administrators cannot submit documents"),
        (status = 503, description = "Maintenance mode")
    )
)]
pub async fn upload_document_handler(
    Extension(workspace): Extension<Arc<Workspace>>,
    mut multipart: Multipart,
) -> Result<impl IntoResponse, WebError> {
    let field = multipart
        .next_field()
        .await
        .map_err(|e| WebError::BadRequest(format!("Failed to read multipart data: {}", e)))?
        .ok_or_else(|| WebError::BadRequest("Multipart form must include a file".to_string()))?;

    let name = field.file_name().unwrap_or("untitled.txt").to_string();
    let mime_type = field.content_type().unwrap_or("text/plain").to_string();
    let bytes = field.bytes().await.map_err(|e| {
        error!("Failed to read uploaded file: {:?}", e);
        WebError::BadRequest(format!("Failed to read file bytes: {}", e))
    })?;

    let document: Document = workspace.load_document(&name, &mime_type, bytes.to_vec()).await?;
    info!(name = %document.name, size = document.size, "Document uploaded");
    Ok((StatusCode::CREATED, Json(document)))
}

/// PUT /documents/instructions - Set the analysis focus for the next extraction
#[utoipa::path(
    put,
    path = "/documents/instructions",
    request_body = InstructionsRequest,
    responses((status = 200, description = "Instructions stored", body = Ack))
)]
pub async fn instructions_handler(
    Extension(workspace): Extension<Arc<Workspace>>,
    Json(req): Json<InstructionsRequest>,
) -> Result<Json<Ack>, WebError> {
    workspace
        .set_analysis_instructions(req.instructions.as_deref())
        .await?;
    Ok(Ack::ok())
}

/// DELETE /documents - Discard the document and its brief
#[utoipa::path(
    delete,
    path = "/documents",
    responses((status = 200, description = "Workspace wiped", body = Ack))
)]
pub async fn wipe_document_handler(
    Extension(workspace): Extension<Arc<Workspace>>,
) -> Result<Json<Ack>, WebError> {
    workspace.wipe().await;
    Ok(Ack::ok())
}

/// GET /brief - The current brief, if any
#[utoipa::path(
    get,
    path = "/brief",
    responses((status = 200, description = "Current brief", body = BriefResponse))
)]
pub async fn brief_handler(
    Extension(workspace): Extension<Arc<Workspace>>,
) -> Result<Json<BriefResponse>, WebError> {
    Ok(Json(BriefResponse {
        phase: workspace.phase().await,
        brief: workspace.brief().await,
    }))
}

async fn brief_after(workspace: &Workspace, brief: Brief) -> Json<BriefResponse> {
    Json(BriefResponse {
        phase: workspace.phase().await,
        brief: Some(brief),
    })
}

/// POST /brief/review - Run the extraction stage
#[utoipa::path(
    post,
    path = "/brief/review",
    responses(
        (status = 200, description = "Extraction complete", body = BriefResponse),
        (status = 409, description = "No document, wrong phase, busy or superseded"),
        (status = 502, description = "Extraction service failed")
    )
)]
pub async fn review_handler(
    Extension(workspace): Extension<Arc<Workspace>>,
) -> Result<Json<BriefResponse>, WebError> {
    let brief = workspace.run_stage1().await?;
    Ok(brief_after(&workspace, brief).await)
}

/// POST /brief/approve - Approve the extraction and, when enabled, run the advisory stage
#[utoipa::path(
    post,
    path = "/brief/approve",
    responses(
        (status = 200, description = "Brief approved", body = BriefResponse),
        (status = 409, description = "Nothing to approve or the review failed entirely"),
        (status = 502, description = "Advisory service failed")
    )
)]
pub async fn approve_handler(
    Extension(workspace): Extension<Arc<Workspace>>,
) -> Result<Json<BriefResponse>, WebError> {
    let brief = workspace.approve().await?;
    Ok(brief_after(&workspace, brief).await)
}

/// POST /brief/advisory - Retry the advisory stage on an approved brief
#[utoipa::path(
    post,
    path = "/brief/advisory",
    responses(
        (status = 200, description = "Advisory complete", body = BriefResponse),
        (status = 409, description = "Brief not approved, busy, superseded or feature disabled"),
        (status = 502, description = "Advisory service failed")
    )
)]
pub async fn advisory_handler(
    Extension(workspace): Extension<Arc<Workspace>>,
) -> Result<Json<BriefResponse>, WebError> {
    let brief = workspace.run_stage2().await?;
    Ok(brief_after(&workspace, brief).await)
}
