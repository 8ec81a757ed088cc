//! services/api/src/web/admin.rs
//!
//! Operator endpoints. The workspace rejects non-admin sessions with 403.

use axum::{
    extract::{Path, Query},
    Extension, Json,
};
use lexvault_core::domain::PlatformStats;
use lexvault_core::{
    AuditLogEntry, NotificationKind, ProfessionalRole, SettingsPatch, SystemSettings,
    UserProfile, Workspace,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use utoipa::{IntoParams, ToSchema};

use crate::web::auth::Ack;
use crate::web::response::WebError;

//=========================================================================================
// Payloads
//=========================================================================================

#[derive(Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct UserQuery {
    /// Case-insensitive match on email, name or organization.
    pub q: Option<String>,
}

/// Fields an operator may change on a user record. Absent fields are left alone.
#[derive(Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UserUpdateRequest {
    pub name: Option<String>,
    #[schema(value_type = Option<String>)]
    pub role: Option<ProfessionalRole>,
    pub organization: Option<String>,
    pub is_email_verified: Option<bool>,
    pub is_suspended: Option<bool>,
}

#[derive(Deserialize, ToSchema)]
pub struct SuspensionRequest {
    pub suspended: bool,
}

#[derive(Deserialize, ToSchema)]
pub struct BroadcastRequest {
    pub content: String,
    /// `system` (default) or `security`.
    #[serde(rename = "type")]
    #[schema(value_type = Option<String>)]
    pub kind: Option<NotificationKind>,
}

#[derive(Serialize, ToSchema)]
pub struct BroadcastResponse {
    pub recipients: usize,
}

#[derive(Deserialize, ToSchema)]
pub struct AdvisoryRequest {
    pub query: String,
}

#[derive(Serialize, ToSchema)]
pub struct AdvisoryResponse {
    pub response: String,
}

//=========================================================================================
// Users
//=========================================================================================

/// GET /admin/users - List or search users
#[utoipa::path(
    get,
    path = "/admin/users",
    params(UserQuery),
    responses(
        (status = 200, description = "Matching users", body = Vec<Object>),
        (status = 403, description = "Not an administrator")
    )
)]
pub async fn list_users_handler(
    Extension(workspace): Extension<Arc<Workspace>>,
    Query(query): Query<UserQuery>,
) -> Result<Json<Vec<UserProfile>>, WebError> {
    let users = match query.q.as_deref() {
        Some(q) => workspace.search_users(q).await?,
        None => workspace.list_users().await?,
    };
    Ok(Json(users))
}

/// PUT /admin/users/{email} - Edit a user record
#[utoipa::path(
    put,
    path = "/admin/users/{email}",
    params(("email" = String, Path, description = "The user's email")),
    request_body = UserUpdateRequest,
    responses(
        (status = 200, description = "Updated user", body = Object),
        (status = 404, description = "No such user")
    )
)]
pub async fn update_user_handler(
    Extension(workspace): Extension<Arc<Workspace>>,
    Path(email): Path<String>,
    Json(req): Json<UserUpdateRequest>,
) -> Result<Json<UserProfile>, WebError> {
    let mut user = workspace.user_record(&email).await?;
    if let Some(name) = req.name.map(|n| n.trim().to_string()).filter(|n| !n.is_empty()) {
        user.name = name;
    }
    if let Some(role) = req.role {
        user.role = role;
    }
    if let Some(organization) = req.organization {
        let organization = organization.trim().to_string();
        user.organization = (!organization.is_empty()).then_some(organization);
    }
    if let Some(verified) = req.is_email_verified {
        user.is_email_verified = verified;
    }
    if let Some(suspended) = req.is_suspended {
        user.is_suspended = suspended;
    }
    Ok(Json(workspace.update_user_record(user).await?))
}

/// PUT /admin/users/{email}/suspension - Suspend or reinstate a user
#[utoipa::path(
    put,
    path = "/admin/users/{email}/suspension",
    params(("email" = String, Path, description = "The user's email")),
    request_body = SuspensionRequest,
    responses(
        (status = 200, description = "Updated user", body = Object),
        (status = 404, description = "No such user")
    )
)]
pub async fn suspension_handler(
    Extension(workspace): Extension<Arc<Workspace>>,
    Path(email): Path<String>,
    Json(req): Json<SuspensionRequest>,
) -> Result<Json<UserProfile>, WebError> {
    Ok(Json(workspace.set_suspended(&email, req.suspended).await?))
}

/// DELETE /admin/users/{email} - Delete a user with their briefs and notifications
#[utoipa::path(
    delete,
    path = "/admin/users/{email}",
    params(("email" = String, Path, description = "The user's email")),
    responses(
        (status = 200, description = "User deleted", body = Ack),
        (status = 404, description = "No such user")
    )
)]
pub async fn delete_user_handler(
    Extension(workspace): Extension<Arc<Workspace>>,
    Path(email): Path<String>,
) -> Result<Json<Ack>, WebError> {
    workspace.delete_user(&email).await?;
    Ok(Ack::ok())
}

//=========================================================================================
// Platform
//=========================================================================================

/// POST /admin/broadcasts - Notify every user
#[utoipa::path(
    post,
    path = "/admin/broadcasts",
    request_body = BroadcastRequest,
    responses(
        (status = 200, description = "Broadcast delivered", body = BroadcastResponse),
        (status = 400, description = "Blank content")
    )
)]
pub async fn broadcast_handler(
    Extension(workspace): Extension<Arc<Workspace>>,
    Json(req): Json<BroadcastRequest>,
) -> Result<Json<BroadcastResponse>, WebError> {
    let kind = req.kind.unwrap_or(NotificationKind::System);
    let recipients = workspace.broadcast(&req.content, kind).await?;
    Ok(Json(BroadcastResponse { recipients }))
}

/// PATCH /admin/settings - Shallow-merge a settings patch
#[utoipa::path(
    patch,
    path = "/admin/settings",
    request_body = Object,
    responses((status = 200, description = "Merged settings", body = Object))
)]
pub async fn update_settings_handler(
    Extension(workspace): Extension<Arc<Workspace>>,
    Json(patch): Json<SettingsPatch>,
) -> Result<Json<SystemSettings>, WebError> {
    Ok(Json(workspace.update_settings(&patch).await?))
}

/// GET /admin/audit-logs - Audit trail, newest first
#[utoipa::path(
    get,
    path = "/admin/audit-logs",
    responses((status = 200, description = "Audit entries", body = Vec<Object>))
)]
pub async fn audit_logs_handler(
    Extension(workspace): Extension<Arc<Workspace>>,
) -> Result<Json<Vec<AuditLogEntry>>, WebError> {
    Ok(Json(workspace.audit_logs().await?))
}

/// GET /admin/stats - User and document counts
#[utoipa::path(
    get,
    path = "/admin/stats",
    responses((status = 200, description = "Platform statistics", body = Object))
)]
pub async fn stats_handler(
    Extension(workspace): Extension<Arc<Workspace>>,
) -> Result<Json<PlatformStats>, WebError> {
    Ok(Json(workspace.platform_stats().await?))
}

/// POST /admin/advisory - Ask the operator advisor
#[utoipa::path(
    post,
    path = "/admin/advisory",
    request_body = AdvisoryRequest,
    responses(
        (status = 200, description = "Advisor response", body = AdvisoryResponse),
        (status = 502, description = "Advisor unavailable")
    )
)]
pub async fn advisory_handler(
    Extension(workspace): Extension<Arc<Workspace>>,
    Json(req): Json<AdvisoryRequest>,
) -> Result<Json<AdvisoryResponse>, WebError> {
    let response = workspace.admin_advisory(&req.query).await?;
    Ok(Json(AdvisoryResponse { response }))
}
