//! crates/lexvault_core/src/workspace/notifications.rs
//!
//! Per-user notification feeds and the global audit trail.

use chrono::Utc;
use serde_json::Value;
use tracing::{debug, warn};

use super::{SessionState, Workspace};
use crate::domain::{AuditLogEntry, Notification, NotificationKind, User};
use crate::error::WorkspaceResult;

const SYSTEM_ACTOR: &str = "SYSTEM";

pub(crate) const MSG_WORKSPACE_INITIALIZED: &str =
    "Workspace initialized. Document buffer ready for unrestricted submission.";

impl Workspace {
    //=====================================================================================
    // Feed maintenance
    //=====================================================================================

    /// Loads the member's feed, dropping expired entries and writing the pruned feed back.
    pub(crate) async fn load_notifications(&self, state: &mut SessionState) -> WorkspaceResult<()> {
        let user_id = match state.user.as_ref() {
            Some(user) if !user.is_admin => user.id.clone(),
            _ => {
                state.notifications.clear();
                return Ok(());
            }
        };

        let mut feeds = self.store().notifications().await?;
        let retention = self.policy().notification_retention;
        let now = Utc::now();
        let feed = feeds.entry(user_id.clone()).or_default();
        let before = feed.len();
        feed.retain(|n| !n.is_expired(now, retention));
        let pruned = before - feed.len();
        state.notifications = feed.clone();

        if pruned > 0 {
            debug!(user_id = %user_id, pruned, "Pruned expired notifications");
            self.store().write_notifications(&feeds).await?;
        }
        Ok(())
    }

    /// Greets a member whose feed is empty at session start.
    pub(crate) async fn seed_empty_feed(&self, state: &mut SessionState) {
        let is_member = state.user.as_ref().is_some_and(|user| !user.is_admin);
        if is_member && state.notifications.is_empty() {
            self.notify(state, NotificationKind::System, MSG_WORKSPACE_INITIALIZED)
                .await;
        }
    }

    /// Applies `change` to the member's stored feed (after pruning) and mirrors the result
    /// into the session.
    async fn edit_feed<F>(&self, state: &mut SessionState, change: F) -> WorkspaceResult<()>
    where
        F: FnOnce(&mut Vec<Notification>),
    {
        let user_id = state.member()?.id.clone();
        let mut feeds = self.store().notifications().await?;
        let retention = self.policy().notification_retention;
        let now = Utc::now();
        let feed = feeds.entry(user_id).or_default();
        feed.retain(|n| !n.is_expired(now, retention));
        change(feed);
        state.notifications = feed.clone();
        self.store().write_notifications(&feeds).await?;
        Ok(())
    }

    /// Best-effort notification used by the document and vault flows. A failed write is
    /// logged and never fails the surrounding operation.
    pub(crate) async fn notify(
        &self,
        state: &mut SessionState,
        kind: NotificationKind,
        message: impl Into<String>,
    ) {
        let notification = Notification::new(kind, message);
        if let Err(e) = self
            .edit_feed(state, |feed| feed.insert(0, notification))
            .await
        {
            warn!("Failed to record notification: {}", e);
        }
    }

    //=====================================================================================
    // Public operations
    //=====================================================================================

    pub async fn add_notification(
        &self,
        kind: NotificationKind,
        message: &str,
    ) -> WorkspaceResult<Notification> {
        let notification = Notification::new(kind, message);
        let mut state = self.lock().await;
        let entry = notification.clone();
        self.edit_feed(&mut state, |feed| feed.insert(0, entry)).await?;
        Ok(notification)
    }

    /// The feed, newest first, re-read so broadcasts sent during the session show up.
    /// Empty for admin identities.
    pub async fn notifications(&self) -> WorkspaceResult<Vec<Notification>> {
        let mut state = self.lock().await;
        state.user()?;
        self.load_notifications(&mut state).await?;
        Ok(state.notifications.clone())
    }

    pub async fn unread_count(&self) -> WorkspaceResult<usize> {
        Ok(self.notifications().await?.iter().filter(|n| !n.read).count())
    }

    pub async fn mark_all_read(&self) -> WorkspaceResult<()> {
        let mut state = self.lock().await;
        self.edit_feed(&mut state, |feed| feed.iter_mut().for_each(|n| n.read = true))
            .await
    }

    pub async fn clear_notifications(&self) -> WorkspaceResult<()> {
        let mut state = self.lock().await;
        self.edit_feed(&mut state, Vec::clear).await
    }

    //=====================================================================================
    // Audit trail
    //=====================================================================================

    /// Prepends an entry to the global audit log and truncates it to capacity.
    pub(crate) async fn record_audit(
        &self,
        actor: Option<&User>,
        event: &str,
        target: &str,
        metadata: Option<Value>,
    ) -> WorkspaceResult<()> {
        let admin = actor
            .filter(|u| u.is_admin)
            .map(|u| u.email.clone())
            .unwrap_or_else(|| SYSTEM_ACTOR.to_string());

        let mut log = self.store().audit_log().await?;
        log.insert(
            0,
            AuditLogEntry {
                timestamp: Utc::now(),
                event: event.to_string(),
                target: target.to_string(),
                metadata,
                admin,
            },
        );
        log.truncate(self.policy().audit_log_capacity);
        self.store().write_audit_log(&log).await?;
        debug!(event, target, "Audit entry recorded");
        Ok(())
    }
}
