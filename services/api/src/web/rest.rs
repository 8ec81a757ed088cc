//! services/api/src/web/rest.rs
//!
//! The master definition for the OpenAPI specification.

use crate::web::{admin, auth, documents, feed, response, vault};
use utoipa::OpenApi;

//=========================================================================================
// OpenAPI Master Definition
//=========================================================================================

#[derive(OpenApi)]
#[openapi(
    paths(
        auth::signup_handler,
        auth::login_handler,
        auth::logout_handler,
        auth::verify_handler,
        auth::resend_handler,
        auth::me_handler,
        auth::profile_handler,
        documents::upload_document_handler,
        documents::instructions_handler,
        documents::wipe_document_handler,
        documents::brief_handler,
        documents::review_handler,
        documents::approve_handler,
        documents::advisory_handler,
        vault::set_pin_handler,
        vault::unlock_handler,
        vault::lock_handler,
        vault::list_briefs_handler,
        vault::save_brief_handler,
        vault::delete_brief_handler,
        vault::wipe_vault_handler,
        feed::notifications_handler,
        feed::mark_read_handler,
        feed::clear_notifications_handler,
        feed::support_history_handler,
        feed::support_reply_handler,
        feed::settings_handler,
        admin::list_users_handler,
        admin::update_user_handler,
        admin::suspension_handler,
        admin::delete_user_handler,
        admin::broadcast_handler,
        admin::update_settings_handler,
        admin::audit_logs_handler,
        admin::stats_handler,
        admin::advisory_handler,
    ),
    components(
        schemas(
            response::FailureBody,
            auth::SignupRequest,
            auth::LoginRequest,
            auth::AuthResponse,
            auth::VerifyRequest,
            auth::ProfileRequest,
            auth::Ack,
            documents::InstructionsRequest,
            documents::BriefResponse,
            vault::PinRequest,
            vault::PinResponse,
            vault::UnlockRequest,
            vault::SaveBriefRequest,
            feed::FeedResponse,
            feed::SupportRequest,
            admin::UserUpdateRequest,
            admin::SuspensionRequest,
            admin::BroadcastRequest,
            admin::BroadcastResponse,
            admin::AdvisoryRequest,
            admin::AdvisoryResponse,
        )
    ),
    tags(
        (name = "LexVault API", description = "Two-stage document review, private vault and operator controls.")
    )
)]
pub struct ApiDoc;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_route_is_documented() {
        let doc = ApiDoc::openapi();
        for path in ["/auth/signup", "/brief/approve", "/vault/briefs/{id}", "/admin/audit-logs"] {
            assert!(doc.paths.paths.contains_key(path), "missing {}", path);
        }
    }
}
