//! crates/study_spark_core/src/store.rs
//!
//! Profile and history persistence, layered on the generic key-path
//! [`DocumentStore`] port. Documents are namespaced by application id
//! and user id.

use crate::domain::{HistoryRecord, UserProfile};
use crate::ports::{DocumentStore, StoreError, StoreResult};
use std::sync::Arc;
use uuid::Uuid;

/// Path of the per-user preferences document.
pub fn profile_path(app_id: &str, user_id: Uuid) -> String {
    format!("artifacts/{}/users/{}/profile/settings", app_id, user_id)
}

/// Path of the per-user generation-history collection.
pub fn history_path(app_id: &str, user_id: Uuid) -> String {
    format!("artifacts/{}/users/{}/studyAids", app_id, user_id)
}

/// Reads and writes the per-user preference record.
#[derive(Clone)]
pub struct ProfileStore {
    store: Arc<dyn DocumentStore>,
    app_id: String,
}

impl ProfileStore {
    pub fn new(store: Arc<dyn DocumentStore>, app_id: String) -> Self {
        Self { store, app_id }
    }

    /// Loads the user's profile, creating and persisting the default
    /// record on first access.
    pub async fn load_or_init(&self, user_id: Uuid) -> StoreResult<UserProfile> {
        let path = profile_path(&self.app_id, user_id);
        match self.store.get(&path).await? {
            Some(document) => serde_json::from_value(document)
                .map_err(|e| StoreError::Serialization(e.to_string())),
            None => {
                let profile = UserProfile::default();
                self.save(user_id, &profile).await?;
                Ok(profile)
            }
        }
    }

    /// Persists the profile with merge semantics; an explicit user
    /// action is the only way a profile changes.
    pub async fn save(&self, user_id: Uuid, profile: &UserProfile) -> StoreResult<()> {
        let path = profile_path(&self.app_id, user_id);
        let value = serde_json::to_value(profile)
            .map_err(|e| StoreError::Serialization(e.to_string()))?;
        self.store.set(&path, value, true).await
    }
}

/// Appends generation-history entries. Write-only: nothing in the
/// workflow ever reads them back.
#[derive(Clone)]
pub struct HistoryLog {
    store: Arc<dyn DocumentStore>,
    app_id: String,
}

impl HistoryLog {
    pub fn new(store: Arc<dyn DocumentStore>, app_id: String) -> Self {
        Self { store, app_id }
    }

    pub async fn record(&self, user_id: Uuid, record: &HistoryRecord) -> StoreResult<String> {
        let path = history_path(&self.app_id, user_id);
        let value = serde_json::to_value(record)
            .map_err(|e| StoreError::Serialization(e.to_string()))?;
        self.store.append(&path, value).await
    }
}
