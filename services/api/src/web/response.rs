//! services/api/src/web/response.rs
//!
//! Maps workspace failures onto HTTP responses. Every failure body has the shape
//! `{"success": false, "message": "..."}`.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use lexvault_core::{ErrorKind, WorkspaceError};
use serde::Serialize;
use tracing::error;
use utoipa::ToSchema;

#[derive(Debug, Serialize, ToSchema)]
pub struct FailureBody {
    pub success: bool,
    pub message: String,
}

/// The error type returned by every handler.
#[derive(Debug)]
pub enum WebError {
    Workspace(WorkspaceError),
    BadRequest(String),
    Unauthorized,
}

impl From<WorkspaceError> for WebError {
    fn from(e: WorkspaceError) -> Self {
        WebError::Workspace(e)
    }
}

/// The HTTP status for a workspace failure.
pub fn status_for(e: &WorkspaceError) -> StatusCode {
    use WorkspaceError::*;
    match e {
        EmailTaken(_) => StatusCode::CONFLICT,
        AccountNotFound => StatusCode::NOT_FOUND,
        InvalidCredentials | InvalidCode | IncorrectPin { .. } | SessionExpired => {
            StatusCode::UNAUTHORIZED
        }
        Maintenance => StatusCode::SERVICE_UNAVAILABLE,
        _ => match e.kind() {
            ErrorKind::Validation => StatusCode::BAD_REQUEST,
            ErrorKind::Authorization => StatusCode::FORBIDDEN,
            ErrorKind::Conflict => StatusCode::CONFLICT,
            ErrorKind::Collaborator => StatusCode::BAD_GATEWAY,
            ErrorKind::Storage => StatusCode::INTERNAL_SERVER_ERROR,
            ErrorKind::Misuse => StatusCode::UNAUTHORIZED,
        },
    }
}

impl IntoResponse for WebError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            WebError::Workspace(e) => {
                let status = status_for(&e);
                let message = match e.kind() {
                    ErrorKind::Storage => {
                        error!("Storage failure: {:?}", e);
                        "An internal storage error occurred.".to_string()
                    }
                    _ => e.to_string(),
                };
                (status, message)
            }
            WebError::BadRequest(message) => (StatusCode::BAD_REQUEST, message),
            WebError::Unauthorized => (StatusCode::UNAUTHORIZED, "No active session.".to_string()),
        };
        (
            status,
            Json(FailureBody {
                success: false,
                message,
            }),
        )
            .into_response()
    }
}
