//! crates/lexvault_core/src/workspace/mod.rs
//!
//! The per-session controller. A `Workspace` owns the state of one client session
//! (identity, the loaded document and its brief, vault unlock state, the notification
//! feed, chat histories) and funnels every mutation through named methods. Durable
//! state goes through the shared `Store`; collaborators are reached through the ports.
//!
//! The session state sits behind a mutex that is never held across a collaborator call.
//! Long-running stage calls instead record an in-flight marker plus the state
//! generation they started from, so a second call is rejected and a response that
//! arrives after the document was wiped or replaced is discarded. Chat replies only
//! care about identity and are checked against a separate epoch instead.

mod admin;
mod document;
mod identity;
mod notifications;
mod support;
mod vault;

#[cfg(test)]
pub(crate) mod testing;

pub use identity::LoginOutcome;
pub use vault::{validate_pin, PinEnrollmentStep};

use chrono::{DateTime, Utc};
use serde::Serialize;
use std::sync::Arc;
use tokio::sync::{Mutex, MutexGuard};

use crate::domain::{
    AdvisoryExchange, Brief, Document, Notification, ProfessionalRole, SavedBrief,
    SupportMessage, SystemSettings, User,
};
use crate::error::{WorkspaceError, WorkspaceResult};
use crate::policy::WorkspacePolicy;
use crate::ports::{
    AdminAdvisoryService, AdvisoryService, ExtractionService, MailService, SupportService,
};
use crate::store::Store;

//=========================================================================================
// Services
//=========================================================================================

/// Everything a workspace talks to. Cloned into every session.
#[derive(Clone)]
pub struct WorkspaceServices {
    pub store: Store,
    pub extraction: Arc<dyn ExtractionService>,
    pub advisory: Arc<dyn AdvisoryService>,
    pub support: Arc<dyn SupportService>,
    pub admin_advisor: Arc<dyn AdminAdvisoryService>,
    pub mail: Arc<dyn MailService>,
    pub policy: Arc<WorkspacePolicy>,
}

//=========================================================================================
// Phases & Features
//=========================================================================================

/// Where the active document is in the two-stage review. Derived from state, never stored.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DocumentPhase {
    Empty,
    Loaded,
    Stage1Complete,
    Approved,
    Stage2Complete,
}

impl std::fmt::Display for DocumentPhase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Empty => write!(f, "empty"),
            Self::Loaded => write!(f, "loaded"),
            Self::Stage1Complete => write!(f, "awaiting approval"),
            Self::Approved => write!(f, "approved"),
            Self::Stage2Complete => write!(f, "complete"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Feature {
    Vault,
    Advisory,
    Support,
}

impl std::fmt::Display for Feature {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Vault => write!(f, "private vault"),
            Self::Advisory => write!(f, "advisory"),
            Self::Support => write!(f, "support"),
        }
    }
}

impl Feature {
    fn enabled_in(self, settings: &SystemSettings) -> bool {
        match self {
            Self::Vault => settings.features_enabled.vault,
            Self::Advisory => settings.features_enabled.advisory,
            Self::Support => settings.features_enabled.support,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Stage {
    Extraction,
    Advisory,
}

//=========================================================================================
// Session State
//=========================================================================================

#[derive(Debug)]
pub(crate) struct SessionState {
    pub(crate) session_id: Option<String>,
    pub(crate) user: Option<User>,
    pub(crate) document: Option<Document>,
    pub(crate) brief: Option<Brief>,
    pub(crate) instructions: Option<String>,
    pub(crate) in_flight: Option<Stage>,
    /// Bumped whenever the document, brief or identity is replaced.
    pub(crate) generation: u64,
    /// Bumped only when the identity changes. Chat replies are checked against this.
    pub(crate) epoch: u64,
    pub(crate) vault_unlocked: bool,
    pub(crate) pin_enrollment: Option<String>,
    pub(crate) saved_briefs: Vec<SavedBrief>,
    pub(crate) notifications: Vec<Notification>,
    pub(crate) support_history: Vec<SupportMessage>,
    pub(crate) advisory_history: Vec<AdvisoryExchange>,
    pub(crate) last_activity: DateTime<Utc>,
}

impl SessionState {
    fn new() -> Self {
        Self {
            session_id: None,
            user: None,
            document: None,
            brief: None,
            instructions: None,
            in_flight: None,
            generation: 0,
            epoch: 0,
            vault_unlocked: false,
            pin_enrollment: None,
            saved_briefs: Vec::new(),
            notifications: Vec::new(),
            support_history: Vec::new(),
            advisory_history: Vec::new(),
            last_activity: Utc::now(),
        }
    }

    /// Drops everything tied to the current identity and starts a new generation.
    pub(crate) fn reset(&mut self) {
        let (generation, epoch) = (self.generation + 1, self.epoch + 1);
        *self = Self::new();
        self.generation = generation;
        self.epoch = epoch;
    }

    pub(crate) fn phase(&self) -> DocumentPhase {
        match (&self.document, &self.brief) {
            (None, _) => DocumentPhase::Empty,
            (Some(_), None) => DocumentPhase::Loaded,
            (Some(_), Some(brief)) if !brief.is_approved => DocumentPhase::Stage1Complete,
            (Some(_), Some(brief)) if brief.advisory.is_none() => DocumentPhase::Approved,
            (Some(_), Some(_)) => DocumentPhase::Stage2Complete,
        }
    }

    pub(crate) fn user(&self) -> WorkspaceResult<&User> {
        self.user.as_ref().ok_or(WorkspaceError::NoActiveSession)
    }

    /// The active identity, provided it is a regular (non-admin) user.
    pub(crate) fn member(&self) -> WorkspaceResult<&User> {
        let user = self.user()?;
        if user.is_admin {
            return Err(WorkspaceError::MemberOnly);
        }
        Ok(user)
    }

    pub(crate) fn admin(&self) -> WorkspaceResult<&User> {
        let user = self.user()?;
        if !user.is_admin {
            return Err(WorkspaceError::Forbidden);
        }
        Ok(user)
    }
}

//=========================================================================================
// Snapshot
//=========================================================================================

/// A user record without its secrets.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UserProfile {
    pub id: String,
    pub email: String,
    pub name: String,
    pub role: ProfessionalRole,
    pub organization: Option<String>,
    pub docs_processed: u64,
    pub created_at: DateTime<Utc>,
    pub last_login: DateTime<Utc>,
    pub is_email_verified: bool,
    pub is_admin: bool,
    pub is_suspended: bool,
    pub has_vault_pin: bool,
    pub vault_locked_until: Option<DateTime<Utc>>,
}

impl From<&User> for UserProfile {
    fn from(user: &User) -> Self {
        Self {
            id: user.id.clone(),
            email: user.email.clone(),
            name: user.name.clone(),
            role: user.role,
            organization: user.organization.clone(),
            docs_processed: user.docs_processed,
            created_at: user.created_at,
            last_login: user.last_login,
            is_email_verified: user.is_email_verified,
            is_admin: user.is_admin,
            is_suspended: user.is_suspended,
            has_vault_pin: user.vault_pin_hash.is_some(),
            vault_locked_until: user.vault_locked_until,
        }
    }
}

/// An immutable copy of the session state, suitable for rendering.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WorkspaceSnapshot {
    pub user: Option<UserProfile>,
    pub is_authenticated: bool,
    pub document: Option<Document>,
    pub brief: Option<Brief>,
    pub phase: DocumentPhase,
    pub is_processing: bool,
    pub analysis_instructions: Option<String>,
    pub is_vault_unlocked: bool,
    pub saved_briefs: Vec<SavedBrief>,
    pub notifications: Vec<Notification>,
    pub system_settings: SystemSettings,
}

//=========================================================================================
// Workspace
//=========================================================================================

pub struct Workspace {
    services: WorkspaceServices,
    state: Mutex<SessionState>,
}

impl Workspace {
    /// Creates a workspace with no active session.
    pub fn new(services: WorkspaceServices) -> Self {
        Self {
            services,
            state: Mutex::new(SessionState::new()),
        }
    }

    pub fn services(&self) -> &WorkspaceServices {
        &self.services
    }

    /// Locks the session state and records activity.
    pub(crate) async fn lock(&self) -> MutexGuard<'_, SessionState> {
        let mut state = self.state.lock().await;
        state.last_activity = Utc::now();
        state
    }

    pub(crate) fn store(&self) -> &Store {
        &self.services.store
    }

    pub(crate) fn policy(&self) -> &WorkspacePolicy {
        &self.services.policy
    }

    pub async fn settings(&self) -> WorkspaceResult<SystemSettings> {
        Ok(self.store().settings().await?)
    }

    pub(crate) async fn require_feature(&self, feature: Feature) -> WorkspaceResult<()> {
        if feature.enabled_in(&self.settings().await?) {
            Ok(())
        } else {
            Err(WorkspaceError::FeatureDisabled(feature))
        }
    }

    /// Re-reads the active user's durable record, applies `change`, and writes it back.
    ///
    /// Always starts from the stored record so that concurrent administrative edits
    /// (suspension, for instance) are not overwritten by a stale in-session copy.
    pub(crate) async fn update_user<F>(
        &self,
        state: &mut SessionState,
        change: F,
    ) -> WorkspaceResult<User>
    where
        F: FnOnce(&mut User),
    {
        let email = state.member()?.email.clone();
        let mut user = self
            .store()
            .find_user(&email)
            .await?
            .ok_or(WorkspaceError::AccountNotFound)?;
        change(&mut user);
        self.store().put_user(&user).await?;
        state.user = Some(user.clone());
        Ok(user)
    }

    pub async fn is_authenticated(&self) -> bool {
        self.state.lock().await.user.is_some()
    }

    pub async fn session_id(&self) -> Option<String> {
        self.state.lock().await.session_id.clone()
    }

    pub async fn current_user(&self) -> WorkspaceResult<User> {
        Ok(self.lock().await.user()?.clone())
    }

    pub async fn phase(&self) -> DocumentPhase {
        self.state.lock().await.phase()
    }

    pub async fn snapshot(&self) -> WorkspaceResult<WorkspaceSnapshot> {
        let system_settings = self.settings().await?;
        let state = self.state.lock().await;
        Ok(WorkspaceSnapshot {
            user: state.user.as_ref().map(UserProfile::from),
            is_authenticated: state.user.is_some(),
            document: state.document.clone(),
            brief: state.brief.clone(),
            phase: state.phase(),
            is_processing: state.in_flight.is_some(),
            analysis_instructions: state.instructions.clone(),
            is_vault_unlocked: state.vault_unlocked,
            saved_briefs: if state.vault_unlocked {
                state.saved_briefs.clone()
            } else {
                Vec::new()
            },
            notifications: state.notifications.clone(),
            system_settings,
        })
    }
}
