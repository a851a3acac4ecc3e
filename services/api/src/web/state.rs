//! services/api/src/web/state.rs
//!
//! Defines the application's shared state and the per-user session
//! registry.

use crate::config::Config;
use std::collections::HashMap;
use std::sync::Arc;
use study_spark_core::ports::{
    DocumentStore, EnrichmentService, MindMapImageService, StoreResult,
    StudyAidGenerationService, TextExtractionService,
};
use study_spark_core::session::StudySession;
use study_spark_core::store::{HistoryLog, ProfileStore};
use tokio::sync::Mutex;
use uuid::Uuid;

/// A session guarded for access from concurrent handlers. The lock is
/// only ever held for state transitions, never across a network await.
pub type SharedSession = Arc<Mutex<StudySession>>;

//=========================================================================================
// AppState (Shared Across All Connections)
//=========================================================================================

/// The shared application state, created once at startup and passed to all handlers.
pub struct AppState {
    pub config: Arc<Config>,
    pub extraction: Arc<dyn TextExtractionService>,
    pub aids: Arc<dyn StudyAidGenerationService>,
    pub enrichment: Arc<dyn EnrichmentService>,
    pub mind_map: Arc<dyn MindMapImageService>,
    pub profiles: ProfileStore,
    pub history: HistoryLog,
    sessions: Mutex<HashMap<Uuid, SharedSession>>,
}

impl AppState {
    pub fn new(
        config: Arc<Config>,
        extraction: Arc<dyn TextExtractionService>,
        aids: Arc<dyn StudyAidGenerationService>,
        enrichment: Arc<dyn EnrichmentService>,
        mind_map: Arc<dyn MindMapImageService>,
        store: Arc<dyn DocumentStore>,
    ) -> Self {
        let profiles = ProfileStore::new(store.clone(), config.app_id.clone());
        let history = HistoryLog::new(store, config.app_id.clone());
        Self {
            config,
            extraction,
            aids,
            enrichment,
            mind_map,
            profiles,
            history,
            sessions: Mutex::new(HashMap::new()),
        }
    }

    /// Returns the user's session, creating it on first contact with
    /// the profile loaded (or initialized) from the store.
    pub async fn session(&self, user_id: Uuid) -> StoreResult<SharedSession> {
        {
            let sessions = self.sessions.lock().await;
            if let Some(session) = sessions.get(&user_id) {
                return Ok(session.clone());
            }
        }

        // First contact: load the profile before registering the
        // session so a store failure surfaces instead of silently
        // handing out defaults.
        let profile = self.profiles.load_or_init(user_id).await?;
        let session = Arc::new(Mutex::new(StudySession::new(user_id, profile)));

        let mut sessions = self.sessions.lock().await;
        let entry = sessions.entry(user_id).or_insert_with(|| session.clone());
        Ok(entry.clone())
    }
}
