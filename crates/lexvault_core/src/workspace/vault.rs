//! crates/lexvault_core/src/workspace/vault.rs
//!
//! The private vault: a PIN-gated per-user collection of saved briefs.

use chrono::Utc;
use serde::Serialize;
use tracing::{info, warn};

use super::{Feature, SessionState, Workspace};
use crate::domain::{short_id, Brief, NotificationKind, SavedBrief, User};
use crate::error::{WorkspaceError, WorkspaceResult};
use crate::secrets::{hash_secret_blocking, verify_secret_blocking};

const MSG_VAULT_ACTIVATED: &str = "Private Vault secondary authentication activated.";

/// Progress through the two-entry PIN setup.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PinEnrollmentStep {
    /// First entry accepted; waiting for the confirmation entry.
    AwaitingConfirmation,
    /// Confirmation did not match. The first entry is kept; confirm again.
    Mismatch,
    /// PIN stored and vault unlocked.
    Complete,
}

/// A PIN is 4 to 6 ASCII digits.
pub fn validate_pin(pin: &str) -> WorkspaceResult<()> {
    let valid = (4..=6).contains(&pin.len()) && pin.bytes().all(|b| b.is_ascii_digit());
    if valid {
        Ok(())
    } else {
        Err(WorkspaceError::InvalidPin)
    }
}

impl Workspace {
    /// The member's durable record, re-read so vault decisions never use a stale copy.
    async fn stored_member(&self, state: &SessionState) -> WorkspaceResult<User> {
        let email = &state.member()?.email;
        self.store()
            .find_user(email)
            .await?
            .ok_or(WorkspaceError::AccountNotFound)
    }

    fn require_unlocked(state: &SessionState) -> WorkspaceResult<()> {
        state.member()?;
        if state.vault_unlocked {
            Ok(())
        } else {
            Err(WorkspaceError::VaultLocked)
        }
    }

    async fn open_vault(&self, state: &mut SessionState) -> WorkspaceResult<()> {
        let user_id = state.member()?.id.clone();
        state.saved_briefs = self.store().saved_briefs_for(&user_id).await?;
        state.vault_unlocked = true;
        Ok(())
    }

    async fn write_vault(&self, state: &mut SessionState, briefs: Vec<SavedBrief>) -> WorkspaceResult<()> {
        let user_id = state.member()?.id.clone();
        let mut all = self.store().saved_briefs().await?;
        all.insert(user_id, briefs.clone());
        self.store().write_saved_briefs(&all).await?;
        state.saved_briefs = briefs;
        Ok(())
    }

    //=====================================================================================
    // PIN setup
    //=====================================================================================

    async fn store_pin(&self, state: &mut SessionState, pin: &str) -> WorkspaceResult<()> {
        let hash = hash_secret_blocking(pin).await?;
        let user = self
            .update_user(state, |user| {
                user.vault_pin_hash = Some(hash);
                user.vault_failed_attempts = 0;
                user.vault_locked_until = None;
            })
            .await?;
        state.pin_enrollment = None;
        self.open_vault(state).await?;
        info!(user_id = %user.id, "Vault PIN configured");
        self.notify(state, NotificationKind::Security, MSG_VAULT_ACTIVATED)
            .await;
        Ok(())
    }

    /// Stores a first PIN directly and unlocks the vault.
    pub async fn set_pin(&self, pin: &str) -> WorkspaceResult<()> {
        self.require_feature(Feature::Vault).await?;
        validate_pin(pin)?;
        let mut state = self.lock().await;
        if self.stored_member(&state).await?.vault_pin_hash.is_some() {
            return Err(WorkspaceError::PinAlreadySet);
        }
        self.store_pin(&mut state, pin).await
    }

    /// Feeds one entry of the interactive setup: the first entry is held, the second
    /// must match it.
    pub async fn enroll_pin(&self, entry: &str) -> WorkspaceResult<PinEnrollmentStep> {
        self.require_feature(Feature::Vault).await?;
        validate_pin(entry)?;
        let mut state = self.lock().await;
        if self.stored_member(&state).await?.vault_pin_hash.is_some() {
            return Err(WorkspaceError::PinAlreadySet);
        }

        match state.pin_enrollment.take() {
            None => {
                state.pin_enrollment = Some(entry.to_string());
                Ok(PinEnrollmentStep::AwaitingConfirmation)
            }
            Some(first) if first == entry => {
                self.store_pin(&mut state, entry).await?;
                Ok(PinEnrollmentStep::Complete)
            }
            Some(first) => {
                state.pin_enrollment = Some(first);
                Ok(PinEnrollmentStep::Mismatch)
            }
        }
    }

    //=====================================================================================
    // Unlock / Lock
    //=====================================================================================

    /// Unlocks the vault for this session. Consecutive failures beyond the policy limit
    /// lock the vault out for a while.
    pub async fn unlock_vault(&self, pin: &str) -> WorkspaceResult<()> {
        self.require_feature(Feature::Vault).await?;
        let mut state = self.lock().await;
        let stored = self.stored_member(&state).await?;
        let hash = stored.vault_pin_hash.clone().ok_or(WorkspaceError::PinNotSet)?;

        let now = Utc::now();
        if let Some(until) = stored.vault_locked_until.filter(|until| *until > now) {
            return Err(WorkspaceError::VaultLockedOut(until));
        }

        if verify_secret_blocking(pin, &hash).await {
            self.update_user(&mut state, |user| {
                user.vault_failed_attempts = 0;
                user.vault_locked_until = None;
            })
            .await?;
            self.open_vault(&mut state).await?;
            info!(user_id = %stored.id, "Vault unlocked");
            return Ok(());
        }

        let max_attempts = self.policy().vault_max_pin_attempts;
        let lockout = self.policy().vault_lockout;
        let user = self
            .update_user(&mut state, |user| {
                user.vault_failed_attempts += 1;
                if user.vault_failed_attempts >= max_attempts {
                    user.vault_failed_attempts = 0;
                    user.vault_locked_until = Some(now + lockout);
                }
            })
            .await?;

        match user.vault_locked_until {
            Some(until) => {
                warn!(user_id = %user.id, "Vault locked out after repeated PIN failures");
                Err(WorkspaceError::VaultLockedOut(until))
            }
            None => Err(WorkspaceError::IncorrectPin {
                remaining: max_attempts.saturating_sub(user.vault_failed_attempts),
            }),
        }
    }

    pub async fn lock_vault(&self) -> WorkspaceResult<()> {
        let mut state = self.lock().await;
        state.member()?;
        state.vault_unlocked = false;
        state.saved_briefs.clear();
        Ok(())
    }

    pub async fn is_vault_unlocked(&self) -> bool {
        self.state.lock().await.vault_unlocked
    }

    //=====================================================================================
    // Saved briefs
    //=====================================================================================

    pub async fn saved_briefs(&self) -> WorkspaceResult<Vec<SavedBrief>> {
        self.require_feature(Feature::Vault).await?;
        let mut state = self.lock().await;
        Self::require_unlocked(&state)?;
        self.open_vault(&mut state).await?;
        Ok(state.saved_briefs.clone())
    }

    /// Appends `brief` to the vault. A blank title falls back to the brief's own title.
    pub async fn save_brief(&self, brief: Brief, title: Option<&str>) -> WorkspaceResult<SavedBrief> {
        self.require_feature(Feature::Vault).await?;
        let mut state = self.lock().await;
        Self::require_unlocked(&state)?;

        let custom_title = title
            .map(str::trim)
            .filter(|t| !t.is_empty())
            .map(str::to_string)
            .unwrap_or_else(|| brief.title.clone());
        let saved = SavedBrief {
            id: short_id(),
            brief,
            saved_at: Utc::now(),
            custom_title,
        };

        let user_id = state.member()?.id.clone();
        let mut briefs = self.store().saved_briefs_for(&user_id).await?;
        briefs.push(saved.clone());
        self.write_vault(&mut state, briefs).await?;
        info!(saved_brief_id = %saved.id, "Brief saved to vault");
        Ok(saved)
    }

    /// Saves the session's current brief.
    pub async fn save_current_brief(&self, title: Option<&str>) -> WorkspaceResult<SavedBrief> {
        let brief = {
            let state = self.lock().await;
            state.member()?;
            match state.brief.clone() {
                Some(brief) => brief,
                None => {
                    return Err(WorkspaceError::InvalidPhase {
                        operation: "save the brief",
                        phase: state.phase(),
                    })
                }
            }
        };
        self.save_brief(brief, title).await
    }

    /// Removes one saved brief. Returns whether it existed.
    pub async fn delete_saved_brief(&self, id: &str) -> WorkspaceResult<bool> {
        self.require_feature(Feature::Vault).await?;
        let mut state = self.lock().await;
        Self::require_unlocked(&state)?;

        let user_id = state.member()?.id.clone();
        let mut briefs = self.store().saved_briefs_for(&user_id).await?;
        let before = briefs.len();
        briefs.retain(|b| b.id != id);
        let removed = briefs.len() != before;
        if removed {
            self.write_vault(&mut state, briefs).await?;
        }
        Ok(removed)
    }

    /// Deletes every saved brief and the PIN itself. A new PIN must be set afterwards.
    pub async fn wipe_vault(&self) -> WorkspaceResult<()> {
        self.require_feature(Feature::Vault).await?;
        let mut state = self.lock().await;
        let user_id = state.member()?.id.clone();

        let mut all = self.store().saved_briefs().await?;
        if all.remove(&user_id).is_some() {
            self.store().write_saved_briefs(&all).await?;
        }
        self.update_user(&mut state, |user| {
            user.vault_pin_hash = None;
            user.vault_failed_attempts = 0;
            user.vault_locked_until = None;
        })
        .await?;

        state.vault_unlocked = false;
        state.saved_briefs.clear();
        state.pin_enrollment = None;
        warn!(user_id = %user_id, "Vault wiped");
        Ok(())
    }
}
