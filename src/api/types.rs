//! API request and response types

use crate::db::{Message, SessionRecord};
use crate::runtime::SessionView;
use serde::{Deserialize, Serialize};

/// Request to (re)initialize a session with an age result
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InitializeRequest {
    /// Absent when age inference failed; the stored age is used instead
    pub predicted_age: Option<f64>,
    pub gender: Option<String>,
}

/// Request to send a chat message
#[derive(Debug, Deserialize)]
pub struct MessageRequest {
    pub text: String,
}

#[derive(Debug, Deserialize)]
pub struct TopicCheckQuery {
    #[serde(default)]
    pub text: String,
}

/// `limit` arrives as a raw string so bad values fall back to the default
#[derive(Debug, Default, Deserialize)]
pub struct ListSessionsQuery {
    pub limit: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct SessionListResponse {
    pub sessions: Vec<SessionRecord>,
}

/// The most recently active session, `null` when none exist
#[derive(Debug, Serialize)]
pub struct LastSessionResponse {
    pub session: Option<SessionView>,
}

/// Response for a newly created session
#[derive(Debug, Serialize)]
pub struct SessionResponse {
    pub session: SessionRecord,
}

/// Messages produced by an operation plus the resulting session snapshot
#[derive(Debug, Serialize)]
pub struct OperationResponse {
    pub messages: Vec<Message>,
    pub view: SessionView,
}

#[derive(Debug, Serialize)]
pub struct TopicCheckResponse {
    pub recent: bool,
    pub topics: Vec<String>,
}

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub model: String,
}

/// Error response
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
}

impl ErrorResponse {
    pub fn new(error: impl Into<String>) -> Self {
        Self {
            error: error.into(),
        }
    }
}
