//! crates/lexvault_core/src/workspace/identity.rs
//!
//! Signup, login, logout, session restoration, and email verification.

use chrono::Utc;
use rand::Rng;
use serde::Serialize;
use tracing::{info, warn};
use uuid::Uuid;

use super::{SessionState, Workspace, WorkspaceServices};
use crate::domain::{events, short_id, AuthSession, ProfessionalRole, User, VerificationEmail};
use crate::error::{WorkspaceError, WorkspaceResult};
use crate::secrets::verify_secret_blocking;

const ADMIN_ID: &str = "ADMIN-OWNER";
const ADMIN_NAME: &str = "System Owner";
const VERIFICATION_SUBJECT: &str = "LexVault Security Clearance Code";

/// The result of a successful login.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LoginOutcome {
    pub user_id: String,
    pub email: String,
    pub is_admin: bool,
}

impl LoginOutcome {
    fn for_user(user: &User) -> Self {
        Self {
            user_id: user.id.clone(),
            email: user.email.clone(),
            is_admin: user.is_admin,
        }
    }
}

fn normalize_email(email: &str) -> WorkspaceResult<String> {
    let email = email.trim().to_lowercase();
    match email.split_once('@') {
        Some((local, domain)) if !local.is_empty() && !domain.is_empty() => Ok(email),
        _ => Err(WorkspaceError::InvalidEmail),
    }
}

fn new_user_id() -> String {
    format!("USR-{}", short_id().to_uppercase())
}

fn synthesize_admin(email: &str) -> User {
    let now = Utc::now();
    User {
        id: ADMIN_ID.to_string(),
        email: email.to_string(),
        name: ADMIN_NAME.to_string(),
        role: ProfessionalRole::Other,
        organization: None,
        docs_processed: 0,
        created_at: now,
        last_login: now,
        is_email_verified: true,
        is_admin: true,
        is_suspended: false,
        verification_code: None,
        vault_pin_hash: None,
        vault_failed_attempts: 0,
        vault_locked_until: None,
    }
}

impl Workspace {
    //=====================================================================================
    // Session establishment
    //=====================================================================================

    /// Replaces whatever the workspace held with a fresh session for `token.user`.
    async fn establish(&self, state: &mut SessionState, token: AuthSession) -> WorkspaceResult<()> {
        if let Some(previous) = state.session_id.take() {
            if previous != token.id {
                self.store().remove_session(&previous).await?;
            }
        }
        state.reset();
        state.session_id = Some(token.id.clone());
        state.user = Some(token.user.clone());
        self.load_notifications(state).await?;
        self.seed_empty_feed(state).await;
        info!(user_id = %token.user.id, admin = token.user.is_admin, "Session established");
        Ok(())
    }

    async fn start_session(&self, state: &mut SessionState, user: User) -> WorkspaceResult<()> {
        let now = Utc::now();
        let token = AuthSession {
            id: Uuid::new_v4().to_string(),
            user,
            created_at: now,
            expires_at: now + self.policy().session_ttl,
        };
        self.store().put_session(&token).await?;
        self.establish(state, token).await
    }

    /// Rehydrates a session from a persisted token.
    ///
    /// Admin identities come straight from the token. Regular identities are re-read
    /// from the store so a suspension or deletion made since the token was issued
    /// takes effect; such tokens are revoked.
    pub async fn restore(services: WorkspaceServices, token_id: &str) -> WorkspaceResult<Self> {
        let workspace = Workspace::new(services);
        let token = workspace
            .store()
            .sessions()
            .await?
            .remove(token_id)
            .ok_or(WorkspaceError::SessionExpired)?;

        if token.expires_at <= Utc::now() {
            workspace.store().remove_session(token_id).await?;
            return Err(WorkspaceError::SessionExpired);
        }

        let token = if token.user.is_admin {
            token
        } else {
            let latest = workspace.store().find_user(&token.user.email).await?;
            match latest {
                Some(user) if user.is_suspended => {
                    warn!(user_id = %user.id, "Rejected session restore for suspended account");
                    workspace.store().remove_session(token_id).await?;
                    return Err(WorkspaceError::AccountRestricted);
                }
                Some(user) => AuthSession { user, ..token },
                None => {
                    workspace.store().remove_session(token_id).await?;
                    return Err(WorkspaceError::AccountNotFound);
                }
            }
        };

        {
            let mut state = workspace.lock().await;
            workspace.establish(&mut state, token).await?;
        }
        Ok(workspace)
    }

    //=====================================================================================
    // Signup / Login / Logout
    //=====================================================================================

    /// Creates an unverified account and signs it in. Emails are unique.
    pub async fn signup(
        &self,
        email: &str,
        name: &str,
        role: ProfessionalRole,
        organization: Option<&str>,
    ) -> WorkspaceResult<LoginOutcome> {
        let email = normalize_email(email)?;
        let name = name.trim();
        if name.is_empty() {
            return Err(WorkspaceError::EmptyInput("Name"));
        }

        let admin_email = self.policy().admin.as_ref().map(|a| a.email.to_lowercase());
        let mut users = self.store().users().await?;
        if users.contains_key(&email) || admin_email.as_deref() == Some(email.as_str()) {
            return Err(WorkspaceError::EmailTaken(email));
        }

        let now = Utc::now();
        let user = User {
            id: new_user_id(),
            email: email.clone(),
            name: name.to_string(),
            role,
            organization: organization
                .map(str::trim)
                .filter(|o| !o.is_empty())
                .map(str::to_string),
            docs_processed: 0,
            created_at: now,
            last_login: now,
            is_email_verified: false,
            is_admin: false,
            is_suspended: false,
            verification_code: None,
            vault_pin_hash: None,
            vault_failed_attempts: 0,
            vault_locked_until: None,
        };
        users.insert(email, user.clone());
        self.store().write_users(&users).await?;
        info!(user_id = %user.id, "New account created");

        let outcome = LoginOutcome::for_user(&user);
        let mut state = self.lock().await;
        self.start_session(&mut state, user).await?;
        Ok(outcome)
    }

    /// Signs in. The configured admin email requires its password; regular accounts are
    /// identified by email alone and are refused while suspended.
    pub async fn login(&self, email: &str, password: Option<&str>) -> WorkspaceResult<LoginOutcome> {
        let email = normalize_email(email)?;

        if let Some(admin) = &self.policy().admin {
            if admin.email.eq_ignore_ascii_case(&email) {
                let valid = match password {
                    Some(p) => verify_secret_blocking(p, &admin.password_hash).await,
                    None => false,
                };
                if !valid {
                    warn!("Rejected admin login attempt");
                    return Err(WorkspaceError::InvalidCredentials);
                }
                let user = synthesize_admin(&email);
                let outcome = LoginOutcome::for_user(&user);
                let mut state = self.lock().await;
                self.start_session(&mut state, user).await?;
                let actor = state.user.clone();
                drop(state);
                self.record_audit(actor.as_ref(), events::ADMIN_LOGIN_SUCCESS, &email, None)
                    .await?;
                return Ok(outcome);
            }
        }

        let mut user = self
            .store()
            .find_user(&email)
            .await?
            .ok_or(WorkspaceError::AccountNotFound)?;
        if user.is_suspended {
            warn!(user_id = %user.id, "Login refused for suspended account");
            return Err(WorkspaceError::AccountRestricted);
        }

        user.last_login = Utc::now();
        self.store().put_user(&user).await?;
        let outcome = LoginOutcome::for_user(&user);
        let mut state = self.lock().await;
        self.start_session(&mut state, user).await?;
        Ok(outcome)
    }

    /// Ends the session: wipes the document lifecycle, vault state, feeds and histories,
    /// and revokes the session token. The durable user record is untouched.
    pub async fn logout(&self) -> WorkspaceResult<()> {
        let mut state = self.state.lock().await;
        let session_id = state.session_id.take();
        let user_id = state.user.as_ref().map(|u| u.id.clone());
        state.reset();
        drop(state);

        if let Some(id) = session_id {
            self.store().remove_session(&id).await?;
        }
        if let Some(user_id) = user_id {
            info!(user_id = %user_id, "Session ended");
        }
        Ok(())
    }

    /// Logs the session out if it has been idle longer than the inactivity limit.
    pub async fn expire_if_idle(&self) -> WorkspaceResult<bool> {
        let idle = {
            let state = self.state.lock().await;
            state.user.is_some()
                && Utc::now() - state.last_activity > self.policy().inactivity_limit
        };
        if idle {
            info!("Session expired due to inactivity");
            self.logout().await?;
        }
        Ok(idle)
    }

    /// Re-checks a member identity against the store, ending the session if the account
    /// has since been suspended or deleted.
    pub async fn revalidate(&self) -> WorkspaceResult<()> {
        let email = {
            let state = self.lock().await;
            let user = state.user()?;
            if user.is_admin {
                return Ok(());
            }
            user.email.clone()
        };

        match self.store().find_user(&email).await? {
            Some(user) if !user.is_suspended => {
                let mut state = self.lock().await;
                if state.user.as_ref().is_some_and(|u| u.email == user.email) {
                    state.user = Some(user);
                }
                Ok(())
            }
            Some(_) => {
                self.logout().await?;
                Err(WorkspaceError::AccountRestricted)
            }
            None => {
                self.logout().await?;
                Err(WorkspaceError::AccountNotFound)
            }
        }
    }

    //=====================================================================================
    // Verification & Profile
    //=====================================================================================

    /// Marks the email verified if `code` matches the pending code (or the configured
    /// staging bypass code). The pending code is consumed on success.
    pub async fn verify_code(&self, code: &str) -> WorkspaceResult<()> {
        let code = code.trim();
        let mut state = self.lock().await;
        let email = state.member()?.email.clone();
        let pending = self
            .store()
            .find_user(&email)
            .await?
            .ok_or(WorkspaceError::AccountNotFound)?
            .verification_code;

        let matches_pending = pending.as_deref().is_some_and(|p| p == code);
        let matches_bypass = self
            .policy()
            .verification_bypass_code
            .as_deref()
            .is_some_and(|b| b == code);
        if !(matches_pending || matches_bypass) {
            return Err(WorkspaceError::InvalidCode);
        }
        if matches_bypass && !matches_pending {
            warn!("Email verified with the staging bypass code");
        }

        self.update_user(&mut state, |user| {
            user.is_email_verified = true;
            user.verification_code = None;
        })
        .await?;
        drop(state);

        self.record_audit(None, events::EMAIL_VERIFIED_SUCCESS, &email, None)
            .await?;
        info!("Email verified");
        Ok(())
    }

    /// Issues a fresh 6-digit code, stores it on the user record, and mails it.
    pub async fn resend_verification_code(&self) -> WorkspaceResult<()> {
        let code = rand::thread_rng().gen_range(100_000..=999_999).to_string();
        let user = {
            let mut state = self.lock().await;
            self.update_user(&mut state, |user| user.verification_code = Some(code.clone()))
                .await?
        };

        let email = VerificationEmail {
            to: user.email.clone(),
            subject: VERIFICATION_SUBJECT.to_string(),
            code,
            recipient_name: user.name.clone(),
        };
        self.services
            .mail
            .send_verification(&email)
            .await
            .map_err(WorkspaceError::Collaborator)?;

        self.record_audit(None, events::VERIFICATION_CODE_RESENT, &user.email, None)
            .await?;
        info!(user_id = %user.id, "Verification code dispatched");
        Ok(())
    }

    pub async fn update_profile(
        &self,
        name: &str,
        role: ProfessionalRole,
        organization: Option<&str>,
    ) -> WorkspaceResult<User> {
        let name = name.trim().to_string();
        if name.is_empty() {
            return Err(WorkspaceError::EmptyInput("Name"));
        }
        let organization = organization
            .map(str::trim)
            .filter(|o| !o.is_empty())
            .map(str::to_string);
        let mut state = self.lock().await;
        self.update_user(&mut state, |user| {
            user.name = name;
            user.role = role;
            user.organization = organization;
        })
        .await
    }
}
