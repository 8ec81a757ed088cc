pub mod admin;
pub mod auth;
pub mod documents;
pub mod feed;
pub mod middleware;
pub mod response;
pub mod rest;
pub mod state;
pub mod vault;

#[cfg(test)]
mod tests;

pub use middleware::require_session;
pub use state::AppState;

use axum::{
    extract::DefaultBodyLimit,
    middleware as axum_middleware,
    routing::{delete, get, patch, post, put},
    Router,
};
use std::sync::Arc;

/// Uploads larger than this are rejected before they reach the workspace.
const MAX_UPLOAD_BYTES: usize = 10 * 1024 * 1024;

/// Builds the API router: public auth routes plus everything behind the session middleware.
pub fn router(state: Arc<AppState>) -> Router {
    // Public routes (no session required)
    let public_routes = Router::new()
        .route("/auth/signup", post(auth::signup_handler))
        .route("/auth/login", post(auth::login_handler));

    // Protected routes (session required)
    let protected_routes = Router::new()
        .route("/auth/logout", post(auth::logout_handler))
        .route("/auth/verify", post(auth::verify_handler))
        .route("/auth/verify/resend", post(auth::resend_handler))
        .route("/me", get(auth::me_handler))
        .route("/profile", put(auth::profile_handler))
        .route("/settings", get(feed::settings_handler))
        .route(
            "/documents",
            post(documents::upload_document_handler).delete(documents::wipe_document_handler),
        )
        .route("/documents/instructions", put(documents::instructions_handler))
        .route("/brief", get(documents::brief_handler))
        .route("/brief/review", post(documents::review_handler))
        .route("/brief/approve", post(documents::approve_handler))
        .route("/brief/advisory", post(documents::advisory_handler))
        .route("/vault", delete(vault::wipe_vault_handler))
        .route("/vault/pin", post(vault::set_pin_handler))
        .route("/vault/unlock", post(vault::unlock_handler))
        .route("/vault/lock", post(vault::lock_handler))
        .route(
            "/vault/briefs",
            get(vault::list_briefs_handler).post(vault::save_brief_handler),
        )
        .route("/vault/briefs/{id}", delete(vault::delete_brief_handler))
        .route(
            "/notifications",
            get(feed::notifications_handler).delete(feed::clear_notifications_handler),
        )
        .route("/notifications/read", post(feed::mark_read_handler))
        .route(
            "/support/messages",
            get(feed::support_history_handler).post(feed::support_reply_handler),
        )
        .route("/admin/users", get(admin::list_users_handler))
        .route(
            "/admin/users/{email}",
            put(admin::update_user_handler).delete(admin::delete_user_handler),
        )
        .route("/admin/users/{email}/suspension", put(admin::suspension_handler))
        .route("/admin/broadcasts", post(admin::broadcast_handler))
        .route("/admin/settings", patch(admin::update_settings_handler))
        .route("/admin/audit-logs", get(admin::audit_logs_handler))
        .route("/admin/stats", get(admin::stats_handler))
        .route("/admin/advisory", post(admin::advisory_handler))
        .layer(axum_middleware::from_fn_with_state(
            state.clone(),
            require_session,
        ));

    Router::new()
        .merge(public_routes)
        .merge(protected_routes)
        .layer(DefaultBodyLimit::max(MAX_UPLOAD_BYTES))
        .with_state(state)
}
