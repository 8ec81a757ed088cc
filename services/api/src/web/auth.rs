//! services/api/src/web/auth.rs
//!
//! Authentication endpoints: signup, login, logout, email verification and the profile.

use axum::{
    extract::State,
    http::{header, StatusCode},
    response::IntoResponse,
    Extension, Json,
};
use lexvault_core::{LoginOutcome, ProfessionalRole, Workspace, WorkspaceError, WorkspaceSnapshot};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::info;
use utoipa::ToSchema;

use crate::web::middleware::SessionToken;
use crate::web::response::WebError;
use crate::web::state::AppState;

//=========================================================================================
// Request/Response Types
//=========================================================================================

#[derive(Deserialize, ToSchema)]
pub struct SignupRequest {
    pub email: String,
    pub name: String,
    #[schema(value_type = String, example = "Attorney")]
    pub role: ProfessionalRole,
    pub organization: Option<String>,
}

#[derive(Deserialize, ToSchema)]
pub struct LoginRequest {
    pub email: String,
    /// Only checked for the administrator identity.
    pub password: Option<String>,
}

#[derive(Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct AuthResponse {
    pub user_id: String,
    pub email: String,
    pub is_admin: bool,
}

impl From<LoginOutcome> for AuthResponse {
    fn from(outcome: LoginOutcome) -> Self {
        Self {
            user_id: outcome.user_id,
            email: outcome.email,
            is_admin: outcome.is_admin,
        }
    }
}

#[derive(Deserialize, ToSchema)]
pub struct VerifyRequest {
    pub code: String,
}

#[derive(Deserialize, ToSchema)]
pub struct ProfileRequest {
    pub name: String,
    #[schema(value_type = String, example = "Engineer")]
    pub role: ProfessionalRole,
    pub organization: Option<String>,
}

/// A generic acknowledgement body.
#[derive(Serialize, ToSchema)]
pub struct Ack {
    pub success: bool,
}

impl Ack {
    pub fn ok() -> Json<Self> {
        Json(Self { success: true })
    }
}

//=========================================================================================
// Cookie Helpers
//=========================================================================================

fn session_cookie(token: &str, ttl_hours: i64) -> String {
    format!(
        "session={}; HttpOnly; Secure; SameSite=Lax; Path=/; Max-Age={}",
        token,
        ttl_hours * 3600
    )
}

const CLEARED_COOKIE: &str = "session=; HttpOnly; Secure; SameSite=Lax; Path=/; Max-Age=0";

/// Caches the freshly authenticated workspace and builds its cookie.
async fn open_session(state: &AppState, workspace: Workspace) -> Result<String, WebError> {
    let token = workspace
        .session_id()
        .await
        .ok_or(WorkspaceError::NoActiveSession)?;
    let cookie = session_cookie(&token, state.config.session_ttl_hours);
    state.register(token, Arc::new(workspace)).await;
    Ok(cookie)
}

//=========================================================================================
// Handlers
//=========================================================================================

/// POST /auth/signup - Create an unverified account and sign it in
#[utoipa::path(
    post,
    path = "/auth/signup",
    request_body = SignupRequest,
    responses(
        (status = 201, description = "Account created", body = AuthResponse),
        (status = 400, description = "Invalid email or name"),
        (status = 409, description = "Email already registered")
    )
)]
pub async fn signup_handler(
    State(state): State<Arc<AppState>>,
    Json(req): Json<SignupRequest>,
) -> Result<impl IntoResponse, WebError> {
    let workspace = state.workspace();
    let outcome = workspace
        .signup(&req.email, &req.name, req.role, req.organization.as_deref())
        .await?;
    let cookie = open_session(&state, workspace).await?;

    Ok((
        StatusCode::CREATED,
        [(header::SET_COOKIE, cookie)],
        Json(AuthResponse::from(outcome)),
    ))
}

/// POST /auth/login - Sign in as a member or as the administrator
#[utoipa::path(
    post,
    path = "/auth/login",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Login successful", body = AuthResponse),
        (status = 401, description = "Invalid credentials"),
        (status = 403, description = "Account restricted"),
        (status = 404, description = "Account not found")
    )
)]
pub async fn login_handler(
    State(state): State<Arc<AppState>>,
    Json(req): Json<LoginRequest>,
) -> Result<impl IntoResponse, WebError> {
    let workspace = state.workspace();
    let outcome = workspace
        .login(&req.email, req.password.as_deref())
        .await?;
    let cookie = open_session(&state, workspace).await?;

    Ok((
        StatusCode::OK,
        [(header::SET_COOKIE, cookie)],
        Json(AuthResponse::from(outcome)),
    ))
}

/// POST /auth/logout - End the session and discard its workspace
#[utoipa::path(
    post,
    path = "/auth/logout",
    responses(
        (status = 200, description = "Logout successful"),
        (status = 401, description = "No active session")
    )
)]
pub async fn logout_handler(
    State(state): State<Arc<AppState>>,
    Extension(workspace): Extension<Arc<Workspace>>,
    Extension(SessionToken(token)): Extension<SessionToken>,
) -> Result<impl IntoResponse, WebError> {
    workspace.logout().await?;
    state.forget(&token).await;
    info!("Session closed by logout");
    Ok((StatusCode::OK, [(header::SET_COOKIE, CLEARED_COOKIE.to_string())]))
}

/// POST /auth/verify - Confirm the emailed security code
#[utoipa::path(
    post,
    path = "/auth/verify",
    request_body = VerifyRequest,
    responses(
        (status = 200, description = "Email verified", body = Ack),
        (status = 401, description = "Invalid code")
    )
)]
pub async fn verify_handler(
    Extension(workspace): Extension<Arc<Workspace>>,
    Json(req): Json<VerifyRequest>,
) -> Result<Json<Ack>, WebError> {
    workspace.verify_code(&req.code).await?;
    Ok(Ack::ok())
}

/// POST /auth/verify/resend - Issue and mail a new security code
#[utoipa::path(
    post,
    path = "/auth/verify/resend",
    responses(
        (status = 200, description = "Code sent", body = Ack),
        (status = 502, description = "Mail delivery failed")
    )
)]
pub async fn resend_handler(
    Extension(workspace): Extension<Arc<Workspace>>,
) -> Result<Json<Ack>, WebError> {
    workspace.resend_verification_code().await?;
    Ok(Ack::ok())
}

/// GET /me - The full workspace snapshot for the current session
#[utoipa::path(
    get,
    path = "/me",
    responses(
        (status = 200, description = "Workspace snapshot", body = Object),
        (status = 401, description = "No active session")
    )
)]
pub async fn me_handler(
    Extension(workspace): Extension<Arc<Workspace>>,
) -> Result<Json<WorkspaceSnapshot>, WebError> {
    Ok(Json(workspace.snapshot().await?))
}

/// PUT /profile - Update the member's display name, role and organization
#[utoipa::path(
    put,
    path = "/profile",
    request_body = ProfileRequest,
    responses(
        (status = 200, description = "Updated profile", body = Object),
        (status = 400, description = "Blank name")
    )
)]
pub async fn profile_handler(
    Extension(workspace): Extension<Arc<Workspace>>,
    Json(req): Json<ProfileRequest>,
) -> Result<impl IntoResponse, WebError> {
    let user = workspace
        .update_profile(&req.name, req.role, req.organization.as_deref())
        .await?;
    Ok(Json(lexvault_core::UserProfile::from(&user)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn session_cookie_lives_for_the_configured_ttl() {
        let cookie = session_cookie("tok", 720);
        assert!(cookie.starts_with("session=tok;"));
        assert!(cookie.contains("HttpOnly"));
        assert!(cookie.ends_with("Max-Age=2592000"));
    }
}
