//! services/api/src/web/middleware.rs
//!
//! Session middleware for protecting routes.

use axum::{
    extract::{Request, State},
    http::{header, HeaderMap},
    middleware::Next,
    response::Response,
};
use lexvault_core::WorkspaceError;
use std::sync::Arc;
use tracing::{info, warn};

use crate::web::response::WebError;
use crate::web::state::AppState;

/// The raw session token of the current request.
#[derive(Debug, Clone)]
pub struct SessionToken(pub String);

/// Parses `session=<token>` out of the cookie header.
pub fn session_token(headers: &HeaderMap) -> Option<String> {
    headers
        .get(header::COOKIE)
        .and_then(|v| v.to_str().ok())?
        .split(';')
        .find_map(|c| c.trim().strip_prefix("session="))
        .filter(|token| !token.is_empty())
        .map(str::to_string)
}

/// Middleware that resolves the session cookie to a live workspace.
///
/// Idle sessions are logged out and suspended or deleted members are turned away before
/// the handler runs. On success the workspace and its token are placed in the request
/// extensions.
pub async fn require_session(
    State(state): State<Arc<AppState>>,
    mut req: Request,
    next: Next,
) -> Result<Response, WebError> {
    let token = session_token(req.headers()).ok_or(WebError::Unauthorized)?;

    let workspace = match state.resolve(&token).await {
        Ok(workspace) => workspace,
        Err(e) => {
            warn!("Rejected session token: {}", e);
            return Err(e.into());
        }
    };

    if workspace.expire_if_idle().await? {
        state.forget(&token).await;
        info!("Idle session closed");
        return Err(WorkspaceError::SessionExpired.into());
    }
    if let Err(e) = workspace.revalidate().await {
        state.forget(&token).await;
        return Err(e.into());
    }

    req.extensions_mut().insert(workspace);
    req.extensions_mut().insert(SessionToken(token));
    Ok(next.run(req).await)
}
