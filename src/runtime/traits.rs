//! Trait abstractions for runtime I/O
//!
//! These traits enable testing the controller with mock implementations.

use crate::db::{Database, Message};
use crate::llm::{ChatRequest, ChatService, LlmError};
use crate::state_machine::Session;
use async_trait::async_trait;
use std::sync::Arc;

pub const KEY_PREDICTED_AGE: &str = "predictedAge";
pub const KEY_PARENTING_MODE: &str = "parentingMode";
pub const KEY_PARENTING_ASKED: &str = "parentingAsked";
pub const KEY_GENDER: &str = "gender";

/// Durable string key-value storage
#[async_trait]
pub trait KeyValueStore: Send + Sync {
    async fn get(&self, key: &str) -> Result<Option<String>, String>;

    async fn set(&self, key: &str, value: &str) -> Result<(), String>;

    async fn remove(&self, key: &str) -> Result<(), String>;
}

/// Load and save the persisted part of a session
#[async_trait]
pub trait SessionRepository: Send + Sync {
    async fn load(&self) -> Result<Session, String>;

    async fn save(&self, session: &Session) -> Result<(), String>;
}

/// Storage for the displayed transcript
#[async_trait]
pub trait TranscriptStore: Send + Sync {
    async fn append(&self, message: &Message) -> Result<(), String>;

    async fn replace(&self, messages: &[Message]) -> Result<(), String>;

    /// Keep only the first message
    async fn truncate(&self) -> Result<(), String>;

    async fn load(&self) -> Result<Vec<Message>, String>;
}

/// Client for the external chat reply service
#[async_trait]
pub trait ChatResponder: Send + Sync {
    async fn respond(&self, request: &ChatRequest) -> Result<String, LlmError>;
}

// ============================================================================
// Arc implementations for trait objects
// ============================================================================

#[async_trait]
impl<T: KeyValueStore + ?Sized> KeyValueStore for Arc<T> {
    async fn get(&self, key: &str) -> Result<Option<String>, String> {
        (**self).get(key).await
    }

    async fn set(&self, key: &str, value: &str) -> Result<(), String> {
        (**self).set(key, value).await
    }

    async fn remove(&self, key: &str) -> Result<(), String> {
        (**self).remove(key).await
    }
}

#[async_trait]
impl<T: SessionRepository + ?Sized> SessionRepository for Arc<T> {
    async fn load(&self) -> Result<Session, String> {
        (**self).load().await
    }

    async fn save(&self, session: &Session) -> Result<(), String> {
        (**self).save(session).await
    }
}

#[async_trait]
impl<T: TranscriptStore + ?Sized> TranscriptStore for Arc<T> {
    async fn append(&self, message: &Message) -> Result<(), String> {
        (**self).append(message).await
    }

    async fn replace(&self, messages: &[Message]) -> Result<(), String> {
        (**self).replace(messages).await
    }

    async fn truncate(&self) -> Result<(), String> {
        (**self).truncate().await
    }

    async fn load(&self) -> Result<Vec<Message>, String> {
        (**self).load().await
    }
}

#[async_trait]
impl<T: ChatResponder + ?Sized> ChatResponder for Arc<T> {
    async fn respond(&self, request: &ChatRequest) -> Result<String, LlmError> {
        (**self).respond(request).await
    }
}

// ============================================================================
// Session repository over any key-value store
// ============================================================================

/// Stores each session field under its own key
pub struct KvSessionRepository<K: KeyValueStore> {
    store: K,
}

impl<K: KeyValueStore> KvSessionRepository<K> {
    pub fn new(store: K) -> Self {
        Self { store }
    }
}

fn parse_flag(value: Option<&str>) -> bool {
    value == Some("true")
}

#[async_trait]
impl<K: KeyValueStore> SessionRepository for KvSessionRepository<K> {
    async fn load(&self) -> Result<Session, String> {
        let age = self
            .store
            .get(KEY_PREDICTED_AGE)
            .await?
            .and_then(|s| s.trim().parse::<f64>().ok());

        let mut session = Session {
            parenting_mode_active: parse_flag(self.store.get(KEY_PARENTING_MODE).await?.as_deref()),
            parenting_asked: parse_flag(self.store.get(KEY_PARENTING_ASKED).await?.as_deref()),
            gender_hint: self.store.get(KEY_GENDER).await?,
            ..Session::default()
        };
        // Malformed or out-of-range ages load as absent
        session.set_age(crate::age::AgeEstimate::from_option(age).as_years());
        Ok(session)
    }

    async fn save(&self, session: &Session) -> Result<(), String> {
        match session.predicted_age_years {
            Some(age) => self.store.set(KEY_PREDICTED_AGE, &age.to_string()).await?,
            None => self.store.remove(KEY_PREDICTED_AGE).await?,
        }
        self.store
            .set(KEY_PARENTING_MODE, &session.parenting_mode_active.to_string())
            .await?;
        self.store
            .set(KEY_PARENTING_ASKED, &session.parenting_asked.to_string())
            .await?;
        match &session.gender_hint {
            Some(gender) => self.store.set(KEY_GENDER, gender).await?,
            None => self.store.remove(KEY_GENDER).await?,
        }
        Ok(())
    }
}

// ============================================================================
// Production Adapters
// ============================================================================

/// Key-value store scoped to one session's namespace
#[derive(Clone)]
pub struct DatabaseKv {
    db: Database,
    namespace: String,
}

impl DatabaseKv {
    pub fn new(db: Database, namespace: impl Into<String>) -> Self {
        Self {
            db,
            namespace: namespace.into(),
        }
    }
}

#[async_trait]
impl KeyValueStore for DatabaseKv {
    async fn get(&self, key: &str) -> Result<Option<String>, String> {
        self.db
            .kv_get(&self.namespace, key)
            .map_err(|e| e.to_string())
    }

    async fn set(&self, key: &str, value: &str) -> Result<(), String> {
        self.db
            .kv_set(&self.namespace, key, value)
            .map_err(|e| e.to_string())
    }

    async fn remove(&self, key: &str) -> Result<(), String> {
        self.db
            .kv_remove(&self.namespace, key)
            .map_err(|e| e.to_string())
    }
}

/// Transcript rows for one session
#[derive(Clone)]
pub struct DatabaseTranscript {
    db: Database,
    session_id: String,
}

impl DatabaseTranscript {
    pub fn new(db: Database, session_id: impl Into<String>) -> Self {
        Self {
            db,
            session_id: session_id.into(),
        }
    }
}

#[async_trait]
impl TranscriptStore for DatabaseTranscript {
    async fn append(&self, message: &Message) -> Result<(), String> {
        self.db
            .append_message(&self.session_id, message)
            .map_err(|e| e.to_string())
    }

    async fn replace(&self, messages: &[Message]) -> Result<(), String> {
        self.db
            .replace_messages(&self.session_id, messages)
            .map_err(|e| e.to_string())
    }

    async fn truncate(&self) -> Result<(), String> {
        self.db
            .truncate_messages(&self.session_id)
            .map_err(|e| e.to_string())
    }

    async fn load(&self) -> Result<Vec<Message>, String> {
        self.db
            .get_messages(&self.session_id)
            .map_err(|e| e.to_string())
    }
}

/// Adapter to use a `ChatService` as `ChatResponder`
pub struct ServiceResponder {
    service: Arc<dyn ChatService>,
}

impl ServiceResponder {
    pub fn new(service: Arc<dyn ChatService>) -> Self {
        Self { service }
    }
}

#[async_trait]
impl ChatResponder for ServiceResponder {
    async fn respond(&self, request: &ChatRequest) -> Result<String, LlmError> {
        self.service.complete(request).await
    }
}
