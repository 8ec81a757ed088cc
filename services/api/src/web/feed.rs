//! services/api/src/web/feed.rs
//!
//! Notification feed, support chat and the public view of system settings.

use axum::{Extension, Json};
use lexvault_core::domain::SupportMessage;
use lexvault_core::{Notification, SystemSettings, Workspace};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use utoipa::ToSchema;

use crate::web::auth::Ack;
use crate::web::response::WebError;

#[derive(Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct FeedResponse {
    #[schema(value_type = Vec<Object>)]
    pub notifications: Vec<Notification>,
    pub unread_count: usize,
}

#[derive(Deserialize, ToSchema)]
pub struct SupportRequest {
    pub message: String,
}

/// GET /notifications - The feed, newest first
#[utoipa::path(
    get,
    path = "/notifications",
    responses((status = 200, description = "Notification feed", body = FeedResponse))
)]
pub async fn notifications_handler(
    Extension(workspace): Extension<Arc<Workspace>>,
) -> Result<Json<FeedResponse>, WebError> {
    let notifications = workspace.notifications().await?;
    let unread_count = notifications.iter().filter(|n| !n.read).count();
    Ok(Json(FeedResponse {
        notifications,
        unread_count,
    }))
}

/// POST /notifications/read - Mark every notification read
#[utoipa::path(
    post,
    path = "/notifications/read",
    responses((status = 200, description = "Feed marked read", body = Ack))
)]
pub async fn mark_read_handler(
    Extension(workspace): Extension<Arc<Workspace>>,
) -> Result<Json<Ack>, WebError> {
    workspace.mark_all_read().await?;
    Ok(Ack::ok())
}

/// DELETE /notifications - Clear the feed
#[utoipa::path(
    delete,
    path = "/notifications",
    responses((status = 200, description = "Feed cleared", body = Ack))
)]
pub async fn clear_notifications_handler(
    Extension(workspace): Extension<Arc<Workspace>>,
) -> Result<Json<Ack>, WebError> {
    workspace.clear_notifications().await?;
    Ok(Ack::ok())
}

/// GET /support/messages - This session's support conversation
#[utoipa::path(
    get,
    path = "/support/messages",
    responses((status = 200, description = "Support history", body = Vec<Object>))
)]
pub async fn support_history_handler(
    Extension(workspace): Extension<Arc<Workspace>>,
) -> Result<Json<Vec<SupportMessage>>, WebError> {
    Ok(Json(workspace.support_history().await?))
}

/// POST /support/messages - Ask the support assistant
#[utoipa::path(
    post,
    path = "/support/messages",
    request_body = SupportRequest,
    responses(
        (status = 200, description = "Assistant reply", body = Object),
        (status = 400, description = "Blank message"),
        (status = 502, description = "Assistant unavailable; a fallback reply was recorded")
    )
)]
pub async fn support_reply_handler(
    Extension(workspace): Extension<Arc<Workspace>>,
    Json(req): Json<SupportRequest>,
) -> Result<Json<SupportMessage>, WebError> {
    Ok(Json(workspace.support_reply(&req.message).await?))
}

/// GET /settings - Maintenance state, system notice and feature flags
#[utoipa::path(
    get,
    path = "/settings",
    responses((status = 200, description = "Current system settings", body = Object))
)]
pub async fn settings_handler(
    Extension(workspace): Extension<Arc<Workspace>>,
) -> Result<Json<SystemSettings>, WebError> {
    Ok(Json(workspace.settings().await?))
}
