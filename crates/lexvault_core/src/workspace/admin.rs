//! crates/lexvault_core/src/workspace/admin.rs
//!
//! Operator controls. Every method requires an admin session, and every mutation writes
//! exactly one audit entry.

use chrono::{Duration, Utc};
use serde_json::json;
use tracing::{error, info, warn};

use super::{UserProfile, Workspace};
use crate::domain::{
    events, AdvisoryExchange, AuditLogEntry, Notification, NotificationKind, PlatformStats,
    SettingsPatch, SystemSettings, User,
};
use crate::error::{WorkspaceError, WorkspaceResult};

impl Workspace {
    async fn acting_admin(&self) -> WorkspaceResult<User> {
        Ok(self.lock().await.admin()?.clone())
    }

    //=====================================================================================
    // Users
    //=====================================================================================

    pub async fn list_users(&self) -> WorkspaceResult<Vec<UserProfile>> {
        self.acting_admin().await?;
        let users = self.store().users().await?;
        Ok(users.values().map(UserProfile::from).collect())
    }

    /// Case-insensitive substring match on email, name and organization.
    pub async fn search_users(&self, query: &str) -> WorkspaceResult<Vec<UserProfile>> {
        let needle = query.trim().to_lowercase();
        let users = self.list_users().await?;
        if needle.is_empty() {
            return Ok(users);
        }
        Ok(users
            .into_iter()
            .filter(|u| {
                u.email.to_lowercase().contains(&needle)
                    || u.name.to_lowercase().contains(&needle)
                    || u.organization
                        .as_deref()
                        .is_some_and(|o| o.to_lowercase().contains(&needle))
            })
            .collect())
    }

    /// The full stored record, as the starting point for `update_user_record`.
    pub async fn user_record(&self, email: &str) -> WorkspaceResult<User> {
        self.acting_admin().await?;
        self.store()
            .find_user(&email.trim().to_lowercase())
            .await?
            .ok_or(WorkspaceError::AccountNotFound)
    }

    pub async fn platform_stats(&self) -> WorkspaceResult<PlatformStats> {
        self.acting_admin().await?;
        self.collect_stats().await
    }

    async fn collect_stats(&self) -> WorkspaceResult<PlatformStats> {
        let users = self.store().users().await?;
        let cutoff = Utc::now() - Duration::hours(24);
        Ok(PlatformStats {
            total_users: users.len(),
            active_users_24h: users.values().filter(|u| u.last_login > cutoff).count(),
            total_docs: users.values().map(|u| u.docs_processed).sum(),
        })
    }

    /// Overwrites an existing user record. The record can never be promoted to admin.
    pub async fn update_user_record(&self, mut user: User) -> WorkspaceResult<UserProfile> {
        let admin = self.acting_admin().await?;
        let mut users = self.store().users().await?;
        if !users.contains_key(&user.email) {
            return Err(WorkspaceError::AccountNotFound);
        }

        user.is_admin = false;
        users.insert(user.email.clone(), user.clone());
        self.store().write_users(&users).await?;

        self.record_audit(
            Some(&admin),
            events::USER_MANUAL_UPDATE,
            &user.email,
            Some(json!({ "suspended": user.is_suspended })),
        )
        .await?;
        info!(user_id = %user.id, suspended = user.is_suspended, "User record updated by admin");
        Ok(UserProfile::from(&user))
    }

    pub async fn set_suspended(&self, email: &str, suspended: bool) -> WorkspaceResult<UserProfile> {
        let mut user = self.user_record(email).await?;
        user.is_suspended = suspended;
        self.update_user_record(user).await
    }

    /// Removes the account together with its saved briefs, notifications and sessions.
    pub async fn delete_user(&self, email: &str) -> WorkspaceResult<()> {
        let admin = self.acting_admin().await?;
        let email = email.trim().to_lowercase();

        let mut users = self.store().users().await?;
        let user = users.remove(&email).ok_or(WorkspaceError::AccountNotFound)?;
        self.store().write_users(&users).await?;

        let mut briefs = self.store().saved_briefs().await?;
        if briefs.remove(&user.id).is_some() {
            self.store().write_saved_briefs(&briefs).await?;
        }
        let mut feeds = self.store().notifications().await?;
        if feeds.remove(&user.id).is_some() {
            self.store().write_notifications(&feeds).await?;
        }
        let sessions = self.store().sessions().await?;
        for (id, _) in sessions.iter().filter(|(_, s)| s.user.email == email) {
            self.store().remove_session(id).await?;
        }

        self.record_audit(Some(&admin), events::USER_ACCOUNT_DELETED, &email, None)
            .await?;
        warn!(user_id = %user.id, "User account deleted");
        Ok(())
    }

    //=====================================================================================
    // Broadcasts & Settings
    //=====================================================================================

    /// Prepends one notification to every user's feed in a single write. Returns the
    /// number of recipients.
    pub async fn broadcast(&self, content: &str, kind: NotificationKind) -> WorkspaceResult<usize> {
        let admin = self.acting_admin().await?;
        let content = content.trim();
        if content.is_empty() {
            return Err(WorkspaceError::EmptyInput("Broadcast content"));
        }

        let users = self.store().users().await?;
        let mut feeds = self.store().notifications().await?;
        let notification = Notification::new(kind, content);
        for user in users.values() {
            feeds
                .entry(user.id.clone())
                .or_default()
                .insert(0, notification.clone());
        }
        self.store().write_notifications(&feeds).await?;

        self.record_audit(
            Some(&admin),
            events::SYSTEM_BROADCAST_SENT,
            "all",
            Some(json!({ "content": content, "type": kind })),
        )
        .await?;
        info!(recipients = users.len(), %kind, "Broadcast sent");
        Ok(users.len())
    }

    /// Shallow-merges `patch` into the settings singleton.
    pub async fn update_settings(&self, patch: &SettingsPatch) -> WorkspaceResult<SystemSettings> {
        let admin = self.acting_admin().await?;
        let settings = self.store().settings().await?.merged(patch);
        self.store().write_settings(&settings).await?;

        let metadata = serde_json::to_value(patch).ok();
        self.record_audit(Some(&admin), events::SYSTEM_SETTINGS_UPDATED, "GLOBAL", metadata)
            .await?;
        info!(maintenance = settings.maintenance_mode, "System settings updated");
        Ok(settings)
    }

    pub async fn audit_logs(&self) -> WorkspaceResult<Vec<AuditLogEntry>> {
        self.acting_admin().await?;
        Ok(self.store().audit_log().await?)
    }

    //=====================================================================================
    // Advisor
    //=====================================================================================

    /// Asks the operator advisor about the platform, with current stats and the running
    /// conversation as context.
    pub async fn admin_advisory(&self, query: &str) -> WorkspaceResult<String> {
        let query = query.trim();
        if query.is_empty() {
            return Err(WorkspaceError::EmptyInput("Query"));
        }
        let (history, epoch) = {
            let state = self.lock().await;
            state.admin()?;
            (state.advisory_history.clone(), state.epoch)
        };
        let stats = self.collect_stats().await?;

        let result = self
            .services
            .admin_advisor
            .admin_advisory(query, &stats, &history)
            .await;

        let mut state = self.lock().await;
        if state.epoch != epoch {
            return Err(WorkspaceError::Stale);
        }
        let response = result.map_err(|e| {
            error!("Admin advisor failed: {}", e);
            WorkspaceError::Collaborator(e)
        })?;
        state.advisory_history.push(AdvisoryExchange {
            query: query.to_string(),
            response: response.clone(),
        });
        Ok(response)
    }
}
