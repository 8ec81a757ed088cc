//! crates/lexvault_core/src/workspace/support.rs

use tracing::{error, info};

use super::{Feature, Workspace};
use crate::domain::{Speaker, SupportMessage};
use crate::error::{WorkspaceError, WorkspaceResult};

pub(crate) const SUPPORT_FALLBACK_REPLY: &str = "We encountered a temporary interruption in our advisory support channel. Please re-submit your inquiry.";

impl Workspace {
    /// Sends `message` to the support assistant and returns its reply.
    ///
    /// When the collaborator fails, the fixed apology is appended to the conversation in
    /// its place and the failure is still returned.
    pub async fn support_reply(&self, message: &str) -> WorkspaceResult<SupportMessage> {
        self.require_feature(Feature::Support).await?;
        let message = message.trim();
        if message.is_empty() {
            return Err(WorkspaceError::EmptyInput("Message"));
        }

        let (history, turn_id, epoch) = {
            let mut state = self.lock().await;
            state.member()?;
            let history = state.support_history.clone();
            let turn = SupportMessage::new(Speaker::User, message);
            let turn_id = turn.id.clone();
            state.support_history.push(turn);
            (history, turn_id, state.epoch)
        };

        let result = self
            .services
            .support
            .support_reply(&history, message)
            .await;

        let mut state = self.lock().await;
        if state.epoch != epoch {
            // The user's turn must not outlive an unanswered reply.
            state.support_history.retain(|turn| turn.id != turn_id);
            return Err(WorkspaceError::Stale);
        }
        match result {
            Ok(text) => {
                let reply = SupportMessage::new(Speaker::Assistant, text);
                state.support_history.push(reply.clone());
                info!(turns = state.support_history.len(), "Support reply delivered");
                Ok(reply)
            }
            Err(e) => {
                error!("Support assistant failed: {}", e);
                state
                    .support_history
                    .push(SupportMessage::new(Speaker::Assistant, SUPPORT_FALLBACK_REPLY));
                Err(WorkspaceError::Collaborator(e))
            }
        }
    }

    pub async fn support_history(&self) -> WorkspaceResult<Vec<SupportMessage>> {
        let state = self.lock().await;
        state.member()?;
        Ok(state.support_history.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::workspace::testing::Harness;
    use std::sync::atomic::Ordering;
    use std::sync::Arc;

    #[tokio::test]
    async fn conversation_history_grows_with_each_turn() {
        let harness = Harness::new();
        let workspace = harness.member("ada@counsel.test").await;

        let reply = workspace.support_reply("How do I export?").await.unwrap();
        assert_eq!(reply.role, Speaker::Assistant);
        assert_eq!(reply.content, "Re: How do I export?");
        workspace.support_reply("Thanks").await.unwrap();

        assert_eq!(*harness.support.history_lengths.lock().unwrap(), vec![0, 2]);
        assert_eq!(workspace.support_history().await.unwrap().len(), 4);
    }

    #[tokio::test]
    async fn failure_appends_the_fallback_reply() {
        let harness = Harness::new();
        let workspace = harness.member("ada@counsel.test").await;
        harness.support.fail.store(true, Ordering::SeqCst);

        let err = workspace.support_reply("Hello?").await.unwrap_err();
        assert!(matches!(err, WorkspaceError::Collaborator(_)));
        let history = workspace.support_history().await.unwrap();
        assert_eq!(history.len(), 2);
        assert_eq!(history[1].content, SUPPORT_FALLBACK_REPLY);
    }

    #[tokio::test]
    async fn blank_messages_are_rejected_and_history_clears_on_logout() {
        let harness = Harness::new();
        let workspace = harness.member("ada@counsel.test").await;
        assert!(matches!(
            workspace.support_reply("   ").await,
            Err(WorkspaceError::EmptyInput(_))
        ));

        workspace.support_reply("Hello").await.unwrap();
        workspace.logout().await.unwrap();
        workspace.login("ada@counsel.test", None).await.unwrap();
        assert!(workspace.support_history().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn replies_survive_a_document_upload_while_pending() {
        let (harness, gate) = Harness::gated_support();
        let workspace = Arc::new(harness.member("ada@counsel.test").await);

        let pending = tokio::spawn({
            let workspace = workspace.clone();
            async move { workspace.support_reply("How do I export?").await }
        });
        gate.entered.notified().await;
        workspace
            .load_document("msa.txt", "text/plain", b"This Master Services Agreement".to_vec())
            .await
            .unwrap();
        workspace.wipe().await;
        gate.release.notify_one();

        let reply = pending.await.unwrap().unwrap();
        assert_eq!(reply.content, "Re: How do I export?");
        let roles: Vec<Speaker> = workspace
            .support_history()
            .await
            .unwrap()
            .into_iter()
            .map(|turn| turn.role)
            .collect();
        assert_eq!(roles, vec![Speaker::User, Speaker::Assistant]);
    }

    #[tokio::test]
    async fn a_reply_landing_after_a_new_login_is_dropped_with_its_question() {
        let (harness, gate) = Harness::gated_support();
        let workspace = Arc::new(harness.member("ada@counsel.test").await);

        let pending = tokio::spawn({
            let workspace = workspace.clone();
            async move { workspace.support_reply("Is my data private?").await }
        });
        gate.entered.notified().await;
        workspace.logout().await.unwrap();
        workspace.login("ada@counsel.test", None).await.unwrap();
        gate.release.notify_one();

        assert!(matches!(pending.await.unwrap(), Err(WorkspaceError::Stale)));
        assert!(workspace.support_history().await.unwrap().is_empty());
    }
}
