//! Effects produced by state transitions

use crate::db::MessageRole;

/// Effects to be executed after a state transition
#[derive(Debug, Clone, PartialEq)]
pub enum Effect {
    /// Replace the whole transcript with a single welcome message
    StartTranscript { welcome: String },

    /// Append a message to the transcript
    AppendMessage { role: MessageRole, text: String },

    /// Drop everything but the welcome message
    TruncateTranscript,

    /// Write the session to the repository
    PersistSession,

    /// Ask the chat service for a reply to `message`
    RequestChat { message: String },

    /// Remember a completed exchange as context for later requests
    RecordExchange { message: String, response: String },

    /// Forget the rolling exchange history and topics
    ClearHistory,
}

impl Effect {
    pub fn user_message(text: impl Into<String>) -> Self {
        Effect::AppendMessage {
            role: MessageRole::User,
            text: text.into(),
        }
    }

    pub fn assistant_message(text: impl Into<String>) -> Self {
        Effect::AppendMessage {
            role: MessageRole::Assistant,
            text: text.into(),
        }
    }

    #[cfg(test)]
    pub fn is_assistant_message(&self) -> bool {
        matches!(
            self,
            Effect::AppendMessage {
                role: MessageRole::Assistant,
                ..
            }
        )
    }
}
