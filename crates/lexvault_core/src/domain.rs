//! crates/lexvault_core/src/domain.rs
//!
//! Defines the core data structures for the workspace.
//! Records that live in the key-value store serialize with camelCase field names so the
//! persisted layout matches the browser client that reads the same collections.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use uuid::Uuid;

//=========================================================================================
// Identity
//=========================================================================================

/// The professional role a user declares at signup.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ProfessionalRole {
    Attorney,
    Physician,
    Engineer,
    #[serde(rename = "Financial Analyst")]
    FinancialAnalyst,
    Other,
}

/// A user identity record, keyed by email in the `users` collection.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: String,
    pub email: String,
    pub name: String,
    pub role: ProfessionalRole,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub organization: Option<String>,
    pub docs_processed: u64,
    pub created_at: DateTime<Utc>,
    pub last_login: DateTime<Utc>,
    pub is_email_verified: bool,
    #[serde(default)]
    pub is_admin: bool,
    #[serde(default)]
    pub is_suspended: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub verification_code: Option<String>,
    /// Argon2 PHC string for the vault PIN.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub vault_pin_hash: Option<String>,
    #[serde(default)]
    pub vault_failed_attempts: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub vault_locked_until: Option<DateTime<Utc>>,
}

/// A persisted session token, the stand-in for the browser's per-tab session storage.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthSession {
    pub id: String,
    /// Snapshot of the identity at the time the session was established.
    /// Only admin sessions are rehydrated from it.
    pub user: User,
    pub created_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
}

//=========================================================================================
// Document & Brief
//=========================================================================================

/// Characters per estimated page.
pub const PAGE_CHUNK_CHARS: usize = 3000;

/// Represents a document loaded into the active session. Never persisted.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Document {
    pub id: Uuid,
    pub name: String,
    pub size: u64,
    pub mime_type: String,
    #[serde(skip_serializing)]
    pub content: String,
    /// Coarse estimate (content length / chunk size, rounded up); not real pagination.
    pub page_count: u32,
    pub loaded_at: DateTime<Utc>,
}

impl Document {
    pub fn new(name: String, mime_type: String, size: u64, content: String) -> Self {
        let page_count = estimate_page_count(&content);
        Self {
            id: Uuid::new_v4(),
            name,
            size,
            mime_type,
            content,
            page_count,
            loaded_at: Utc::now(),
        }
    }
}

pub fn estimate_page_count(content: &str) -> u32 {
    let chars = content.chars().count();
    chars.div_ceil(PAGE_CHUNK_CHARS) as u32
}

/// Stage-1 structured findings.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Extraction {
    pub clauses: Vec<String>,
    pub rights_and_obligations: Vec<String>,
    pub commitments: Vec<String>,
    pub timelines: Vec<String>,
    pub ambiguities: Vec<String>,
}

/// What the extraction collaborator returns before it becomes a [`Brief`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExtractionDraft {
    pub title: String,
    pub document_type: String,
    pub has_substantive_content: bool,
    pub extraction: Extraction,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RiskAssessment {
    pub level: String,
    pub details: String,
    pub flags: Vec<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ReadinessStatus {
    Ready,
    Caution,
    #[serde(rename = "Not Ready")]
    NotReady,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SigningReadiness {
    pub status: ReadinessStatus,
    pub justification: String,
}

/// Stage-2 strategic insights layered on an approved extraction.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Advisory {
    pub executive_signals: Vec<String>,
    pub readers_miss: Vec<String>,
    pub scenarios: Vec<String>,
    pub risks: RiskAssessment,
    pub leverage: Vec<String>,
    pub signing_readiness: SigningReadiness,
    pub professional_questions: Vec<String>,
}

pub const BRIEF_DISCLAIMER: &str = "This advisory summary is provided for informational purposes based on the submitted materials and does not constitute formal legal or professional advice. Please consult with qualified counsel for specific regulatory matters.";

/// The two-stage summary for one document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Brief {
    pub title: String,
    pub document_type: String,
    pub extraction: Extraction,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub advisory: Option<Advisory>,
    pub is_approved: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub approval_timestamp: Option<DateTime<Utc>>,
    pub disclaimer: String,
    pub has_substantive_content: bool,
}

impl Brief {
    pub fn from_draft(draft: ExtractionDraft) -> Self {
        Self {
            title: draft.title,
            document_type: draft.document_type,
            extraction: draft.extraction,
            advisory: None,
            is_approved: false,
            approval_timestamp: None,
            disclaimer: BRIEF_DISCLAIMER.to_string(),
            has_substantive_content: draft.has_substantive_content,
        }
    }

    /// A brief with no title and no clauses or obligations is a hard rejection.
    pub fn is_total_failure(&self) -> bool {
        self.title.trim().is_empty()
            && self.extraction.clauses.is_empty()
            && self.extraction.rights_and_obligations.is_empty()
    }

    /// Degraded output: the collaborator could not find reviewable substance.
    pub fn is_recovery_mode(&self) -> bool {
        !self.has_substantive_content
    }
}

/// A brief copied into a user's vault.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SavedBrief {
    pub id: String,
    pub brief: Brief,
    pub saved_at: DateTime<Utc>,
    pub custom_title: String,
}

//=========================================================================================
// Notifications, Settings & Audit
//=========================================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NotificationKind {
    Security,
    System,
}

impl std::fmt::Display for NotificationKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Security => write!(f, "security"),
            Self::System => write!(f, "system"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Notification {
    pub id: String,
    #[serde(rename = "type")]
    pub kind: NotificationKind,
    pub message: String,
    pub timestamp: DateTime<Utc>,
    pub read: bool,
}

impl Notification {
    pub fn new(kind: NotificationKind, message: impl Into<String>) -> Self {
        Self {
            id: short_id(),
            kind,
            message: message.into(),
            timestamp: Utc::now(),
            read: false,
        }
    }

    pub fn is_expired(&self, now: DateTime<Utc>, retention: Duration) -> bool {
        now - self.timestamp >= retention
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeatureFlags {
    pub vault: bool,
    pub advisory: bool,
    pub support: bool,
}

impl Default for FeatureFlags {
    fn default() -> Self {
        Self {
            vault: true,
            advisory: true,
            support: true,
        }
    }
}

/// Process-wide settings singleton.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SystemSettings {
    pub maintenance_mode: bool,
    pub system_notice: Option<String>,
    pub features_enabled: FeatureFlags,
}

/// A partial settings update. Absent fields keep their current value.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SettingsPatch {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub maintenance_mode: Option<bool>,
    /// `Some(None)` clears the notice; an explicit JSON `null` decodes to it.
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        deserialize_with = "present_or_null"
    )]
    pub system_notice: Option<Option<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub features_enabled: Option<FeatureFlags>,
}

fn present_or_null<'de, D, T>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Option::<T>::deserialize(deserializer).map(Some)
}

impl SystemSettings {
    /// Shallow merge: each present top-level field replaces the current one.
    pub fn merged(&self, patch: &SettingsPatch) -> Self {
        Self {
            maintenance_mode: patch.maintenance_mode.unwrap_or(self.maintenance_mode),
            system_notice: patch
                .system_notice
                .clone()
                .unwrap_or_else(|| self.system_notice.clone()),
            features_enabled: patch.features_enabled.unwrap_or(self.features_enabled),
        }
    }
}

/// A single entry in the global administrative audit trail.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AuditLogEntry {
    pub timestamp: DateTime<Utc>,
    pub event: String,
    pub target: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metadata: Option<serde_json::Value>,
    pub admin: String,
}

/// Audit event tags.
pub mod events {
    pub const ADMIN_LOGIN_SUCCESS: &str = "ADMIN_LOGIN_SUCCESS";
    pub const EMAIL_VERIFIED_SUCCESS: &str = "EMAIL_VERIFIED_SUCCESS";
    pub const VERIFICATION_CODE_RESENT: &str = "VERIFICATION_CODE_RESENT";
    pub const USER_MANUAL_UPDATE: &str = "USER_MANUAL_UPDATE";
    pub const USER_ACCOUNT_DELETED: &str = "USER_ACCOUNT_DELETED";
    pub const SYSTEM_BROADCAST_SENT: &str = "SYSTEM_BROADCAST_SENT";
    pub const SYSTEM_SETTINGS_UPDATED: &str = "SYSTEM_SETTINGS_UPDATED";
}

//=========================================================================================
// Conversations
//=========================================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Speaker {
    User,
    Assistant,
}

/// One message in the support conversation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SupportMessage {
    pub id: String,
    pub role: Speaker,
    pub content: String,
    pub timestamp: DateTime<Utc>,
}

impl SupportMessage {
    pub fn new(role: Speaker, content: impl Into<String>) -> Self {
        Self {
            id: short_id(),
            role,
            content: content.into(),
            timestamp: Utc::now(),
        }
    }
}

/// One query/response turn with the administrative advisor.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AdvisoryExchange {
    pub query: String,
    pub response: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlatformStats {
    pub total_users: usize,
    pub active_users_24h: usize,
    pub total_docs: u64,
}

/// The message handed to the mail collaborator.
#[derive(Debug, Clone, PartialEq)]
pub struct VerificationEmail {
    pub to: String,
    pub subject: String,
    pub code: String,
    pub recipient_name: String,
}

/// Nine lower-case alphanumerics, used for notification, message and saved-brief ids.
pub(crate) fn short_id() -> String {
    Uuid::new_v4().simple().to_string()[..9].to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn draft(title: &str, clauses: &[&str], rights: &[&str]) -> ExtractionDraft {
        ExtractionDraft {
            title: title.to_string(),
            document_type: "Service Agreement".to_string(),
            has_substantive_content: true,
            extraction: Extraction {
                clauses: clauses.iter().map(|s| s.to_string()).collect(),
                rights_and_obligations: rights.iter().map(|s| s.to_string()).collect(),
                ..Default::default()
            },
        }
    }

    #[test]
    fn total_failure_requires_all_three_fields_empty() {
        assert!(Brief::from_draft(draft("", &[], &[])).is_total_failure());
        assert!(Brief::from_draft(draft("  ", &[], &[])).is_total_failure());
        assert!(!Brief::from_draft(draft("Lease", &[], &[])).is_total_failure());
        assert!(!Brief::from_draft(draft("", &["4.1 Term"], &[])).is_total_failure());
        assert!(!Brief::from_draft(draft("", &[], &["Tenant pays rent"])).is_total_failure());
    }

    #[test]
    fn page_count_is_rounded_up() {
        assert_eq!(estimate_page_count(""), 0);
        assert_eq!(estimate_page_count("a"), 1);
        assert_eq!(estimate_page_count(&"a".repeat(3000)), 1);
        assert_eq!(estimate_page_count(&"a".repeat(3001)), 2);
    }

    #[test]
    fn settings_patch_is_a_shallow_merge() {
        let current = SystemSettings {
            maintenance_mode: false,
            system_notice: Some("Scheduled upgrade".to_string()),
            features_enabled: FeatureFlags::default(),
        };

        let merged = current.merged(&SettingsPatch {
            maintenance_mode: Some(true),
            ..Default::default()
        });
        assert!(merged.maintenance_mode);
        assert_eq!(merged.system_notice.as_deref(), Some("Scheduled upgrade"));

        let cleared = merged.merged(&SettingsPatch {
            system_notice: Some(None),
            features_enabled: Some(FeatureFlags {
                vault: false,
                ..FeatureFlags::default()
            }),
            ..Default::default()
        });
        assert!(cleared.maintenance_mode);
        assert_eq!(cleared.system_notice, None);
        assert!(!cleared.features_enabled.vault);
        assert!(cleared.features_enabled.advisory);
    }

    #[test]
    fn settings_patch_distinguishes_null_from_absent() {
        let clear: SettingsPatch = serde_json::from_str(r#"{"systemNotice":null}"#).unwrap();
        assert_eq!(clear.system_notice, Some(None));
        let keep: SettingsPatch = serde_json::from_str(r#"{"maintenanceMode":true}"#).unwrap();
        assert_eq!(keep.system_notice, None);
    }

    #[test]
    fn advisory_readiness_uses_display_names() {
        let json = r#"{"status":"Not Ready","justification":"Missing schedule B"}"#;
        let readiness: SigningReadiness = serde_json::from_str(json).unwrap();
        assert_eq!(readiness.status, ReadinessStatus::NotReady);
        assert!(serde_json::from_str::<SigningReadiness>(
            r#"{"status":"Maybe","justification":""}"#
        )
        .is_err());
    }

    #[test]
    fn notification_kind_serializes_as_type() {
        let n = Notification::new(NotificationKind::Security, "PIN changed");
        let value = serde_json::to_value(&n).unwrap();
        assert_eq!(value["type"], "security");
        assert_eq!(n.id.len(), 9);
    }
}
