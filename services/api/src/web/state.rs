//! services/api/src/web/state.rs
//!
//! Defines the application's shared state and the registry of live workspaces.

use crate::config::Config;
use lexvault_core::{Workspace, WorkspaceResult, WorkspaceServices};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::{debug, warn};

//=========================================================================================
// AppState (Shared Across All Requests)
//=========================================================================================

/// The shared application state, created once at startup and passed to all handlers.
pub struct AppState {
    pub config: Arc<Config>,
    pub services: WorkspaceServices,
    /// Live workspaces keyed by session token. A miss falls back to the session store.
    sessions: RwLock<HashMap<String, Arc<Workspace>>>,
}

impl AppState {
    pub fn new(config: Arc<Config>, services: WorkspaceServices) -> Self {
        Self {
            config,
            services,
            sessions: RwLock::new(HashMap::new()),
        }
    }

    /// A fresh workspace with no session, for signup and login.
    pub fn workspace(&self) -> Workspace {
        Workspace::new(self.services.clone())
    }

    /// Caches an authenticated workspace under its token.
    pub async fn register(&self, token: String, workspace: Arc<Workspace>) {
        self.sessions.write().await.insert(token, workspace);
    }

    /// Finds the workspace for `token`, restoring it from the session store on a miss.
    pub async fn resolve(&self, token: &str) -> WorkspaceResult<Arc<Workspace>> {
        if let Some(workspace) = self.sessions.read().await.get(token) {
            return Ok(workspace.clone());
        }
        debug!("Session cache miss; restoring from store");
        let workspace = Arc::new(Workspace::restore(self.services.clone(), token).await?);
        self.register(token.to_string(), workspace.clone()).await;
        Ok(workspace)
    }

    pub async fn forget(&self, token: &str) {
        self.sessions.write().await.remove(token);
    }

    pub async fn live_sessions(&self) -> usize {
        self.sessions.read().await.len()
    }

    /// Ends idle sessions and drops every cached workspace that no longer holds an
    /// identity. Returns how many entries were removed.
    pub async fn sweep_idle(&self) -> usize {
        let cached: Vec<(String, Arc<Workspace>)> = self
            .sessions
            .read()
            .await
            .iter()
            .map(|(token, workspace)| (token.clone(), workspace.clone()))
            .collect();

        let mut dead = Vec::new();
        for (token, workspace) in cached {
            match workspace.expire_if_idle().await {
                Ok(true) => dead.push((token, workspace)),
                Ok(false) if !workspace.is_authenticated().await => dead.push((token, workspace)),
                Ok(false) => {}
                Err(e) => {
                    warn!("Failed to expire idle session: {}", e);
                    dead.push((token, workspace));
                }
            }
        }

        let mut sessions = self.sessions.write().await;
        let before = sessions.len();
        for (token, workspace) in dead {
            // A token re-registered meanwhile belongs to a different workspace.
            if sessions
                .get(&token)
                .is_some_and(|current| Arc::ptr_eq(current, &workspace))
            {
                sessions.remove(&token);
            }
        }
        before - sessions.len()
    }
}
