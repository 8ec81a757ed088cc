//! crates/lexvault_core/src/ports.rs
//!
//! Defines the service contracts (traits) for the workspace core.
//! These traits form the boundary of the hexagonal architecture, allowing the core
//! to be independent of the persistence substrate, the generative content provider,
//! and the mail transport.

use async_trait::async_trait;
use serde_json::Value;

use crate::domain::{
    Advisory, AdvisoryExchange, Extraction, ExtractionDraft, PlatformStats, SupportMessage,
    VerificationEmail,
};

//=========================================================================================
// Generic Port Error and Result Types
//=========================================================================================

/// A generic error type for all port operations.
/// This abstracts away the specific errors from external services (e.g., database, network).
#[derive(Debug, thiserror::Error)]
pub enum PortError {
    #[error("Item not found: {0}")]
    NotFound(String),
    #[error("An unexpected error occurred: {0}")]
    Unexpected(String),
    #[error("Unauthorized")]
    Unauthorized,
    /// The collaborator answered, but not in the agreed shape.
    #[error("Malformed response: {0}")]
    MalformedResponse(String),
}

/// A convenience type alias for `Result<T, PortError>`.
pub type PortResult<T> = Result<T, PortError>;

//=========================================================================================
// Persistence Port
//=========================================================================================

/// The logical collections held by the key-value substrate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Collection {
    Users,
    SavedBriefs,
    Notifications,
    AuditLog,
    Settings,
    Sessions,
}

impl Collection {
    pub const ALL: [Collection; 6] = [
        Collection::Users,
        Collection::SavedBriefs,
        Collection::Notifications,
        Collection::AuditLog,
        Collection::Settings,
        Collection::Sessions,
    ];

    pub fn key(self) -> &'static str {
        match self {
            Collection::Users => "users",
            Collection::SavedBriefs => "saved_briefs",
            Collection::Notifications => "notifications",
            Collection::AuditLog => "audit_log",
            Collection::Settings => "settings",
            Collection::Sessions => "sessions",
        }
    }
}

/// Whole-collection reads and writes. No transactions and no cross-collection atomicity:
/// two sessions writing the same collection race, and the last writer wins.
#[async_trait]
pub trait KeyValueStore: Send + Sync {
    /// Returns `None` when the collection has never been written.
    async fn read(&self, collection: Collection) -> PortResult<Option<Value>>;

    async fn write(&self, collection: Collection, value: Value) -> PortResult<()>;
}

//=========================================================================================
// Generative Content Ports
//=========================================================================================

/// Input for a stage-1 review.
#[derive(Debug, Clone)]
pub struct ExtractionRequest {
    pub content: String,
    pub filename: String,
    pub filetype: String,
    /// Optional reviewer objectives supplied before the review starts.
    pub instructions: Option<String>,
}

#[async_trait]
pub trait ExtractionService: Send + Sync {
    /// Stage 1: structured review findings for a document.
    async fn extract(&self, request: &ExtractionRequest) -> PortResult<ExtractionDraft>;
}

#[async_trait]
pub trait AdvisoryService: Send + Sync {
    /// Stage 2: strategic insights built on approved findings.
    async fn advise(&self, extraction: &Extraction) -> PortResult<Advisory>;
}

#[async_trait]
pub trait SupportService: Send + Sync {
    /// Replies to `message` given the prior conversation.
    async fn support_reply(
        &self,
        history: &[SupportMessage],
        message: &str,
    ) -> PortResult<String>;
}

#[async_trait]
pub trait AdminAdvisoryService: Send + Sync {
    /// Operational guidance for the platform owner, grounded in current statistics.
    async fn admin_advisory(
        &self,
        query: &str,
        stats: &PlatformStats,
        history: &[AdvisoryExchange],
    ) -> PortResult<String>;
}

//=========================================================================================
// Mail Port
//=========================================================================================

#[async_trait]
pub trait MailService: Send + Sync {
    /// Dispatches a verification code to a user.
    async fn send_verification(&self, email: &VerificationEmail) -> PortResult<()>;
}
