//! Health chat service abstraction
//!
//! The controller only needs "message in, reply text out"; providers and
//! the logging wrapper implement that behind one trait.

mod error;
mod gemini;
mod types;

pub use error::{LlmError, LlmErrorKind};
pub use gemini::{GeminiService, DEFAULT_GEMINI_URL};
pub use types::ChatRequest;

use async_trait::async_trait;
use std::sync::Arc;
use std::time::Duration;

const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Common interface for chat reply providers
#[async_trait]
pub trait ChatService: Send + Sync {
    /// Produce the assistant's reply text for one request
    async fn complete(&self, request: &ChatRequest) -> Result<String, LlmError>;

    /// Get the model ID
    fn model_id(&self) -> &str;
}

/// Configuration for the chat provider
#[derive(Debug, Clone)]
pub struct ChatConfig {
    pub gemini_api_key: Option<String>,
    pub gemini_url: String,
    pub timeout: Duration,
}

impl Default for ChatConfig {
    fn default() -> Self {
        Self {
            gemini_api_key: None,
            gemini_url: DEFAULT_GEMINI_URL.to_string(),
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
        }
    }
}

impl ChatConfig {
    pub fn from_env() -> Self {
        Self {
            gemini_api_key: std::env::var("GEMINI_API_KEY")
                .ok()
                .map(|k| k.trim().to_string())
                .filter(|k| !k.is_empty()),
            gemini_url: std::env::var("GEMINI_API_URL")
                .unwrap_or_else(|_| DEFAULT_GEMINI_URL.to_string()),
            timeout: Duration::from_secs(
                std::env::var("GEMINI_TIMEOUT_SECS")
                    .ok()
                    .and_then(|s| s.parse().ok())
                    .unwrap_or(DEFAULT_TIMEOUT_SECS),
            ),
        }
    }

    /// Build the configured service, wrapped with logging
    ///
    /// Falls back to [`UnavailableService`] when no key is set or the
    /// client cannot be built, so chat turns degrade to the apology message.
    pub fn build_service(&self) -> Arc<dyn ChatService> {
        let inner: Arc<dyn ChatService> = match &self.gemini_api_key {
            Some(key) => {
                match GeminiService::new(key.clone(), self.gemini_url.clone(), self.timeout) {
                    Ok(service) => Arc::new(service),
                    Err(e) => {
                        tracing::error!(error = %e, "Failed to create Gemini client");
                        Arc::new(UnavailableService)
                    }
                }
            }
            None => Arc::new(UnavailableService),
        };
        Arc::new(LoggingService::new(inner))
    }
}

/// Service used when no provider is configured
pub struct UnavailableService;

#[async_trait]
impl ChatService for UnavailableService {
    async fn complete(&self, _request: &ChatRequest) -> Result<String, LlmError> {
        Err(LlmError::unavailable("No chat provider configured"))
    }

    fn model_id(&self) -> &str {
        "unavailable"
    }
}

/// Logging wrapper for chat services
pub struct LoggingService {
    inner: Arc<dyn ChatService>,
    model_id: String,
}

impl LoggingService {
    pub fn new(inner: Arc<dyn ChatService>) -> Self {
        let model_id = inner.model_id().to_string();
        Self { inner, model_id }
    }
}

#[async_trait]
impl ChatService for LoggingService {
    async fn complete(&self, request: &ChatRequest) -> Result<String, LlmError> {
        let start = std::time::Instant::now();
        let result = self.inner.complete(request).await;
        let duration = start.elapsed();

        match &result {
            Ok(text) => {
                tracing::info!(
                    model = %self.model_id,
                    duration_ms = %duration.as_millis(),
                    age_group = %request.age_group,
                    parenting_mode = request.parenting_mode,
                    history_len = request.conversation_history.len(),
                    reply_chars = text.len(),
                    "Chat request completed"
                );
            }
            Err(e) => {
                tracing::error!(
                    model = %self.model_id,
                    duration_ms = %duration.as_millis(),
                    error = %e.message,
                    kind = ?e.kind,
                    transient = e.kind.is_transient(),
                    "Chat request failed"
                );
            }
        }

        result
    }

    fn model_id(&self) -> &str {
        &self.model_id
    }
}
