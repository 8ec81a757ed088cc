//! services/api/src/web/vault.rs
//!
//! Private vault endpoints: PIN setup, unlock/lock and saved briefs.

use axum::{
    extract::Path,
    http::StatusCode,
    response::IntoResponse,
    Extension, Json,
};
use lexvault_core::{PinEnrollmentStep, SavedBrief, Workspace};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use utoipa::ToSchema;

use crate::web::auth::Ack;
use crate::web::response::WebError;

#[derive(Deserialize, ToSchema)]
pub struct PinRequest {
    pub pin: String,
    /// When present the PIN is set in one step. When absent the request is one entry of
    /// the two-entry setup.
    pub confirmation: Option<String>,
}

#[derive(Serialize, ToSchema)]
pub struct PinResponse {
    #[schema(value_type = String, example = "awaiting_confirmation")]
    pub step: PinEnrollmentStep,
}

#[derive(Deserialize, ToSchema)]
pub struct UnlockRequest {
    pub pin: String,
}

#[derive(Deserialize, ToSchema)]
pub struct SaveBriefRequest {
    /// Blank falls back to the brief's own title.
    pub title: Option<String>,
}

/// POST /vault/pin - Set the vault PIN
#[utoipa::path(
    post,
    path = "/vault/pin",
    request_body = PinRequest,
    responses(
        (status = 200, description = "Enrollment progress", body = PinResponse),
        (status = 400, description = "PIN must be 4-6 digits"),
        (status = 409, description = "A PIN is already set")
    )
)]
pub async fn set_pin_handler(
    Extension(workspace): Extension<Arc<Workspace>>,
    Json(req): Json<PinRequest>,
) -> Result<Json<PinResponse>, WebError> {
    let step = match req.confirmation.as_deref() {
        Some(confirmation) if confirmation == req.pin => {
            workspace.set_pin(&req.pin).await?;
            PinEnrollmentStep::Complete
        }
        Some(_) => {
            lexvault_core::workspace::validate_pin(&req.pin)?;
            PinEnrollmentStep::Mismatch
        }
        None => workspace.enroll_pin(&req.pin).await?,
    };
    Ok(Json(PinResponse { step }))
}

/// POST /vault/unlock - Unlock the vault for this session
#[utoipa::path(
    post,
    path = "/vault/unlock",
    request_body = UnlockRequest,
    responses(
        (status = 200, description = "Vault unlocked", body = Ack),
        (status = 401, description = "Incorrect PIN"),
        (status = 403, description = "No PIN set or locked out after repeated failures")
    )
)]
pub async fn unlock_handler(
    Extension(workspace): Extension<Arc<Workspace>>,
    Json(req): Json<UnlockRequest>,
) -> Result<Json<Ack>, WebError> {
    workspace.unlock_vault(&req.pin).await?;
    Ok(Ack::ok())
}

/// POST /vault/lock - Lock the vault again
#[utoipa::path(
    post,
    path = "/vault/lock",
    responses((status = 200, description = "Vault locked", body = Ack))
)]
pub async fn lock_handler(
    Extension(workspace): Extension<Arc<Workspace>>,
) -> Result<Json<Ack>, WebError> {
    workspace.lock_vault().await?;
    Ok(Ack::ok())
}

/// GET /vault/briefs - Saved briefs, oldest first
#[utoipa::path(
    get,
    path = "/vault/briefs",
    responses(
        (status = 200, description = "Saved briefs", body = Vec<Object>),
        (status = 403, description = "Vault locked")
    )
)]
pub async fn list_briefs_handler(
    Extension(workspace): Extension<Arc<Workspace>>,
) -> Result<Json<Vec<SavedBrief>>, WebError> {
    Ok(Json(workspace.saved_briefs().await?))
}

/// POST /vault/briefs - Save the current brief
#[utoipa::path(
    post,
    path = "/vault/briefs",
    request_body = SaveBriefRequest,
    responses(
        (status = 201, description = "Brief saved", body = Object),
        (status = 403, description = "Vault locked"),
        (status = 409, description = "No brief to save")
    )
)]
pub async fn save_brief_handler(
    Extension(workspace): Extension<Arc<Workspace>>,
    Json(req): Json<SaveBriefRequest>,
) -> Result<impl IntoResponse, WebError> {
    let saved = workspace.save_current_brief(req.title.as_deref()).await?;
    Ok((StatusCode::CREATED, Json(saved)))
}

/// DELETE /vault/briefs/{id} - Remove one saved brief
#[utoipa::path(
    delete,
    path = "/vault/briefs/{id}",
    params(("id" = String, Path, description = "Saved brief id")),
    responses(
        (status = 200, description = "Brief removed", body = Ack),
        (status = 404, description = "No such saved brief")
    )
)]
pub async fn delete_brief_handler(
    Extension(workspace): Extension<Arc<Workspace>>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, WebError> {
    if workspace.delete_saved_brief(&id).await? {
        Ok(Ack::ok().into_response())
    } else {
        Ok((
            StatusCode::NOT_FOUND,
            Json(crate::web::response::FailureBody {
                success: false,
                message: format!("No saved brief with id {}.", id),
            }),
        )
            .into_response())
    }
}

/// DELETE /vault - Delete every saved brief and the PIN
#[utoipa::path(
    delete,
    path = "/vault",
    responses((status = 200, description = "Vault wiped", body = Ack))
)]
pub async fn wipe_vault_handler(
    Extension(workspace): Extension<Arc<Workspace>>,
) -> Result<Json<Ack>, WebError> {
    workspace.wipe_vault().await?;
    Ok(Ack::ok())
}

