//! Events that drive a chat session

use crate::age::AgeEstimate;

/// Events that trigger state transitions
#[derive(Debug, Clone)]
pub enum Event {
    // User events
    Initialize {
        estimate: AgeEstimate,
        /// Age restored from durable storage, used when `estimate` is unknown
        stored_age: AgeEstimate,
        gender_hint: Option<String>,
    },
    UserMessage {
        text: String,
    },
    ToggleParentingMode,
    ResetConversation,

    // Chat service events
    ChatReply {
        message: String,
        text: String,
    },
    ChatFailed {
        error: String,
    },
}
