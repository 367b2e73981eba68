//! Request types for the health chat service

use crate::age::AgeGroup;
use crate::state_machine::Exchange;
use serde::Serialize;

/// Everything the chat service needs to answer one user message
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatRequest {
    pub message: String,
    pub age: f64,
    pub age_group: AgeGroup,
    /// Most recent exchanges, oldest first
    pub conversation_history: Vec<Exchange>,
    pub parenting_mode: bool,
}

impl ChatRequest {
    /// User messages from the last `n` exchanges, lowercased
    pub fn recent_topics(&self, n: usize) -> Vec<String> {
        let skip = self.conversation_history.len().saturating_sub(n);
        self.conversation_history
            .iter()
            .skip(skip)
            .map(|exchange| exchange.message.to_lowercase())
            .collect()
    }

    /// Whether the message repeats one of the recent topics
    pub fn is_repetitive(&self, recent_topics: &[String]) -> bool {
        let message = self.message.to_lowercase();
        recent_topics
            .iter()
            .any(|topic| topic.contains(&message) || message.contains(topic.as_str()))
    }
}
