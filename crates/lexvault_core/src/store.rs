//! crates/lexvault_core/src/store.rs
//!
//! Typed access to the logical collections on top of the `KeyValueStore` port, plus the
//! in-memory substrate used when no database is configured.

use async_trait::async_trait;
use serde::{de::DeserializeOwned, Serialize};
use serde_json::Value;
use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;
use tokio::sync::RwLock;

use crate::domain::{AuditLogEntry, AuthSession, Notification, SavedBrief, SystemSettings, User};
use crate::ports::{Collection, KeyValueStore, PortError, PortResult};

pub type UsersByEmail = BTreeMap<String, User>;
pub type BriefsByUser = BTreeMap<String, Vec<SavedBrief>>;
pub type NotificationsByUser = BTreeMap<String, Vec<Notification>>;
pub type SessionsById = BTreeMap<String, AuthSession>;

//=========================================================================================
// Typed Store
//=========================================================================================

/// A cheap-to-clone handle over a `KeyValueStore`.
///
/// Every read of an absent collection yields its empty default (an empty map, an empty
/// log, or default settings) rather than failing.
#[derive(Clone)]
pub struct Store {
    kv: Arc<dyn KeyValueStore>,
}

impl Store {
    pub fn new(kv: Arc<dyn KeyValueStore>) -> Self {
        Self { kv }
    }

    async fn load<T>(&self, collection: Collection) -> PortResult<T>
    where
        T: DeserializeOwned + Default,
    {
        match self.kv.read(collection).await? {
            Some(value) => serde_json::from_value(value).map_err(|e| {
                PortError::Unexpected(format!(
                    "Collection '{}' could not be decoded: {}",
                    collection.key(),
                    e
                ))
            }),
            None => Ok(T::default()),
        }
    }

    async fn save<T: Serialize>(&self, collection: Collection, value: &T) -> PortResult<()> {
        let value = serde_json::to_value(value).map_err(|e| PortError::Unexpected(e.to_string()))?;
        self.kv.write(collection, value).await
    }

    // --- Users ---
    pub async fn users(&self) -> PortResult<UsersByEmail> {
        self.load(Collection::Users).await
    }

    pub async fn write_users(&self, users: &UsersByEmail) -> PortResult<()> {
        self.save(Collection::Users, users).await
    }

    pub async fn find_user(&self, email: &str) -> PortResult<Option<User>> {
        Ok(self.users().await?.remove(email))
    }

    /// Inserts or overwrites the record keyed by `user.email`.
    pub async fn put_user(&self, user: &User) -> PortResult<()> {
        let mut users = self.users().await?;
        users.insert(user.email.clone(), user.clone());
        self.write_users(&users).await
    }

    // --- Saved briefs ---
    pub async fn saved_briefs(&self) -> PortResult<BriefsByUser> {
        self.load(Collection::SavedBriefs).await
    }

    pub async fn write_saved_briefs(&self, briefs: &BriefsByUser) -> PortResult<()> {
        self.save(Collection::SavedBriefs, briefs).await
    }

    pub async fn saved_briefs_for(&self, user_id: &str) -> PortResult<Vec<SavedBrief>> {
        Ok(self.saved_briefs().await?.remove(user_id).unwrap_or_default())
    }

    // --- Notifications ---
    pub async fn notifications(&self) -> PortResult<NotificationsByUser> {
        self.load(Collection::Notifications).await
    }

    pub async fn write_notifications(&self, feeds: &NotificationsByUser) -> PortResult<()> {
        self.save(Collection::Notifications, feeds).await
    }

    // --- Audit log ---
    pub async fn audit_log(&self) -> PortResult<Vec<AuditLogEntry>> {
        self.load(Collection::AuditLog).await
    }

    pub async fn write_audit_log(&self, entries: &[AuditLogEntry]) -> PortResult<()> {
        self.save(Collection::AuditLog, &entries).await
    }

    // --- Settings ---
    pub async fn settings(&self) -> PortResult<SystemSettings> {
        self.load(Collection::Settings).await
    }

    pub async fn write_settings(&self, settings: &SystemSettings) -> PortResult<()> {
        self.save(Collection::Settings, settings).await
    }

    // --- Session tokens ---
    pub async fn sessions(&self) -> PortResult<SessionsById> {
        self.load(Collection::Sessions).await
    }

    pub async fn put_session(&self, session: &AuthSession) -> PortResult<()> {
        let mut sessions = self.sessions().await?;
        sessions.insert(session.id.clone(), session.clone());
        self.save(Collection::Sessions, &sessions).await
    }

    pub async fn remove_session(&self, id: &str) -> PortResult<()> {
        let mut sessions = self.sessions().await?;
        if sessions.remove(id).is_some() {
            self.save(Collection::Sessions, &sessions).await?;
        }
        Ok(())
    }
}

//=========================================================================================
// In-Memory Substrate
//=========================================================================================

/// A process-local `KeyValueStore`. State lives as long as the value does.
#[derive(Default)]
pub struct MemoryStore {
    collections: RwLock<HashMap<Collection, Value>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl KeyValueStore for MemoryStore {
    async fn read(&self, collection: Collection) -> PortResult<Option<Value>> {
        Ok(self.collections.read().await.get(&collection).cloned())
    }

    async fn write(&self, collection: Collection, value: Value) -> PortResult<()> {
        self.collections.write().await.insert(collection, value);
        Ok(())
    }
}
