//! Runtime for session controllers
//!
//! One controller per session, created lazily from the database and kept
//! behind an async mutex so a session handles one operation at a time.

mod executor;
pub mod traits;

#[cfg(test)]
pub mod testing;

pub use executor::{ChatController, SessionView};
pub use traits::*;

use crate::db::{Database, DbError, SessionRecord};
use crate::llm::ChatService;
use std::collections::HashMap;
use std::sync::Arc;
use thiserror::Error;
use tokio::sync::{Mutex, RwLock};

/// Type alias for production controller with concrete implementations
pub type ProductionController =
    ChatController<KvSessionRepository<DatabaseKv>, DatabaseTranscript, ServiceResponder>;

#[derive(Debug, Error)]
pub enum RuntimeError {
    #[error("Session not found: {0}")]
    SessionNotFound(String),

    #[error(transparent)]
    Database(#[from] DbError),
}

/// Manager for all session controllers
pub struct RuntimeManager {
    db: Database,
    chat_service: Arc<dyn ChatService>,
    sessions: RwLock<HashMap<String, Arc<Mutex<ProductionController>>>>,
}

impl RuntimeManager {
    pub fn new(db: Database, chat_service: Arc<dyn ChatService>) -> Self {
        Self {
            db,
            chat_service,
            sessions: RwLock::new(HashMap::new()),
        }
    }

    #[cfg(test)]
    pub fn db(&self) -> &Database {
        &self.db
    }

    pub fn model_id(&self) -> &str {
        self.chat_service.model_id()
    }

    pub fn create_session(&self) -> Result<SessionRecord, RuntimeError> {
        let id = uuid::Uuid::new_v4().to_string();
        let record = self.db.create_session(&id)?;
        tracing::info!(session_id = %id, "Created session");
        Ok(record)
    }

    /// Sessions ordered by most recent activity
    pub fn list_sessions(&self, limit: u32) -> Result<Vec<SessionRecord>, RuntimeError> {
        Ok(self.db.list_sessions(limit)?)
    }

    /// The most recently active session, if any
    pub async fn last_session(
        &self,
    ) -> Result<Option<Arc<Mutex<ProductionController>>>, RuntimeError> {
        match self.db.list_sessions(1)?.into_iter().next() {
            Some(record) => Ok(Some(self.get_or_load(&record.id).await?)),
            None => Ok(None),
        }
    }

    /// Get the controller for a session, restoring it from storage if needed
    pub async fn get_or_load(
        &self,
        session_id: &str,
    ) -> Result<Arc<Mutex<ProductionController>>, RuntimeError> {
        if let Some(controller) = self.sessions.read().await.get(session_id) {
            return Ok(controller.clone());
        }

        match self.db.get_session(session_id) {
            Ok(_) => {}
            Err(DbError::SessionNotFound(_)) => {
                return Err(RuntimeError::SessionNotFound(session_id.to_string()))
            }
            Err(e) => return Err(e.into()),
        }

        let controller = ChatController::restore(
            session_id,
            KvSessionRepository::new(DatabaseKv::new(self.db.clone(), session_id)),
            DatabaseTranscript::new(self.db.clone(), session_id),
            ServiceResponder::new(self.chat_service.clone()),
        )
        .await;

        let mut sessions = self.sessions.write().await;
        // Another request may have restored it while we were loading
        let entry = sessions
            .entry(session_id.to_string())
            .or_insert_with(|| Arc::new(Mutex::new(controller)));
        tracing::debug!(session_id = %session_id, "Session controller ready");
        Ok(entry.clone())
    }
}
