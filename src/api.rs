//! HTTP API for AgeWise
//!
//! Thin JSON surface over the session controllers.

mod handlers;
mod types;

pub use handlers::create_router;

use crate::db::Database;
use crate::llm::ChatService;
use crate::runtime::RuntimeManager;
use std::sync::Arc;

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    pub runtime: Arc<RuntimeManager>,
}

impl AppState {
    pub fn new(db: Database, chat_service: Arc<dyn ChatService>) -> Self {
        Self {
            runtime: Arc::new(RuntimeManager::new(db, chat_service)),
        }
    }
}
