//! Session controller
//!
//! Owns one session's state, transcript and rolling history, runs events
//! through the pure transition function and executes the resulting effects.

use super::traits::{ChatResponder, SessionRepository, TranscriptStore};
use crate::age::{AgeBand, AgeEstimate};
use crate::db::{Message, MessageRole};
use crate::llm::ChatRequest;
use crate::replies;
use crate::state_machine::state::{HISTORY_CONTEXT, HISTORY_LIMIT};
use crate::state_machine::{transition, ChatState, Effect, Event, Exchange, Session, TransitionError};
use crate::topics::TopicTracker;
use serde::Serialize;
use std::collections::VecDeque;

/// Snapshot of a session for clients
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionView {
    pub session_id: String,
    pub state: ChatState,
    pub session: Session,
    /// The open question the next message answers, if any
    pub pending_prompt: Option<&'static str>,
    pub focus_label: Option<&'static str>,
    pub messages: Vec<Message>,
    pub topics: Vec<String>,
}

impl SessionView {
    /// Keep only the newest `n` transcript messages
    pub fn with_recent_messages(mut self, n: usize) -> Self {
        let skip = self.messages.len().saturating_sub(n);
        self.messages.drain(..skip);
        self
    }
}

/// Generic session controller that can work with any storage and responder
pub struct ChatController<R, T, C>
where
    R: SessionRepository,
    T: TranscriptStore,
    C: ChatResponder,
{
    session_id: String,
    state: ChatState,
    session: Session,
    transcript: Vec<Message>,
    history: VecDeque<Exchange>,
    topics: TopicTracker,
    last_message_id: i64,
    repo: R,
    store: T,
    responder: C,
}

impl<R, T, C> ChatController<R, T, C>
where
    R: SessionRepository,
    T: TranscriptStore,
    C: ChatResponder,
{
    pub fn new(session_id: impl Into<String>, repo: R, store: T, responder: C) -> Self {
        Self {
            session_id: session_id.into(),
            state: ChatState::Idle,
            session: Session::default(),
            transcript: Vec::new(),
            history: VecDeque::new(),
            topics: TopicTracker::new(),
            last_message_id: 0,
            repo,
            store,
            responder,
        }
    }

    /// Build a controller from whatever the stores already hold
    ///
    /// A restored transcript resumes in `Active`; the opt-in question is
    /// never re-armed by a restore.
    pub async fn restore(session_id: impl Into<String>, repo: R, store: T, responder: C) -> Self {
        let mut controller = Self::new(session_id, repo, store, responder);

        match controller.repo.load().await {
            Ok(session) => controller.session = session,
            Err(e) => {
                tracing::warn!(session_id = %controller.session_id, error = %e, "Failed to load session");
            }
        }
        match controller.store.load().await {
            Ok(messages) => {
                controller.last_message_id = messages.iter().map(|m| m.id).max().unwrap_or(0);
                if !messages.is_empty() {
                    controller.state = ChatState::Active;
                }
                controller.transcript = messages;
            }
            Err(e) => {
                tracing::warn!(session_id = %controller.session_id, error = %e, "Failed to load transcript");
            }
        }

        controller
    }

    // ========================================================================
    // Operations
    // ========================================================================

    /// Start (or restart) the conversation with a fresh age result
    ///
    /// Returns the new transcript.
    pub async fn initialize(
        &mut self,
        estimate: AgeEstimate,
        gender_hint: Option<String>,
    ) -> Vec<Message> {
        // The stored record is the fallback when no fresh estimate arrives
        match self.repo.load().await {
            Ok(stored) => self.session = stored,
            Err(e) => {
                tracing::warn!(session_id = %self.session_id, error = %e, "Failed to load stored session");
            }
        }
        let stored_age = self.session.age_estimate();

        if let Err(e) = self
            .process_event(Event::Initialize {
                estimate,
                stored_age,
                gender_hint,
            })
            .await
        {
            tracing::error!(session_id = %self.session_id, error = %e, "Initialize rejected");
        }

        tracing::info!(
            session_id = %self.session_id,
            age_group = ?self.session.age_group,
            state = ?self.state,
            "Session initialized"
        );
        self.transcript.clone()
    }

    /// Handle one line of user input; returns the messages it produced
    pub async fn submit_user_message(&mut self, text: &str) -> Vec<Message> {
        self.process_event(Event::UserMessage {
            text: text.to_string(),
        })
        .await
        .unwrap_or_default()
    }

    pub async fn toggle_parenting_mode(&mut self) -> Result<Vec<Message>, TransitionError> {
        let messages = self.process_event(Event::ToggleParentingMode).await?;
        tracing::info!(
            session_id = %self.session_id,
            parenting_mode = self.session.parenting_mode_active,
            "Parenting mode toggled"
        );
        Ok(messages)
    }

    /// Drop everything after the welcome message; returns the transcript
    pub async fn reset_conversation(&mut self) -> Vec<Message> {
        if let Err(e) = self.process_event(Event::ResetConversation).await {
            tracing::error!(session_id = %self.session_id, error = %e, "Reset rejected");
        }
        self.transcript.clone()
    }

    pub fn is_topic_recent(&self, draft: &str) -> bool {
        self.topics.is_recent(draft)
    }

    pub fn view(&self) -> SessionView {
        SessionView {
            session_id: self.session_id.clone(),
            state: self.state,
            session: self.session.clone(),
            pending_prompt: self
                .state
                .is_awaiting_confirmation()
                .then_some(replies::PARENTING_QUESTION),
            focus_label: self.session.age_band().map(AgeBand::focus_label),
            messages: self.transcript.clone(),
            topics: self.topics.topics(),
        }
    }

    // ========================================================================
    // Event loop
    // ========================================================================

    /// Run an event and everything it triggers; returns the messages emitted
    async fn process_event(&mut self, event: Event) -> Result<Vec<Message>, TransitionError> {
        let mut emitted = Vec::new();
        let mut events_to_process = VecDeque::from([event]);

        while let Some(current_event) = events_to_process.pop_front() {
            if let Event::ChatFailed { error } = &current_event {
                tracing::warn!(session_id = %self.session_id, error = %error, "Chat reply failed");
            }
            let result = transition(self.state, &self.session, current_event)?;

            if result.new_state != self.state {
                tracing::debug!(
                    session_id = %self.session_id,
                    from = ?self.state,
                    to = ?result.new_state,
                    "State change"
                );
            }
            self.state = result.new_state;
            self.session = result.session;

            for effect in result.effects {
                if let Some(generated) = self.execute_effect(effect, &mut emitted).await {
                    events_to_process.push_back(generated);
                }
            }
        }

        Ok(emitted)
    }

    async fn execute_effect(
        &mut self,
        effect: Effect,
        emitted: &mut Vec<Message>,
    ) -> Option<Event> {
        match effect {
            Effect::StartTranscript { welcome } => {
                let message = Message::new(self.next_message_id(), MessageRole::Assistant, welcome);
                self.transcript = vec![message.clone()];
                if let Err(e) = self.store.replace(&self.transcript).await {
                    tracing::warn!(session_id = %self.session_id, error = %e, "Failed to persist transcript");
                }
                emitted.push(message);
                None
            }

            Effect::AppendMessage { role, text } => {
                let message = Message::new(self.next_message_id(), role, text);
                self.transcript.push(message.clone());
                if let Err(e) = self.store.append(&message).await {
                    tracing::warn!(session_id = %self.session_id, error = %e, "Failed to persist message");
                }
                emitted.push(message);
                None
            }

            Effect::TruncateTranscript => {
                self.transcript.truncate(1);
                if let Err(e) = self.store.truncate().await {
                    tracing::warn!(session_id = %self.session_id, error = %e, "Failed to truncate transcript");
                }
                None
            }

            Effect::PersistSession => {
                if let Err(e) = self.repo.save(&self.session).await {
                    tracing::warn!(session_id = %self.session_id, error = %e, "Failed to persist session");
                }
                None
            }

            Effect::RequestChat { message } => Some(self.request_chat(message).await),

            Effect::RecordExchange { message, response } => {
                self.topics.record(&message, &response);
                self.history.push_back(Exchange::new(message, response));
                while self.history.len() > HISTORY_LIMIT {
                    self.history.pop_front();
                }
                None
            }

            Effect::ClearHistory => {
                self.history.clear();
                self.topics.clear();
                None
            }
        }
    }

    async fn request_chat(&self, message: String) -> Event {
        let (Some(age), Some(age_group)) = (self.session.predicted_age_years, self.session.age_group)
        else {
            return Event::ChatFailed {
                error: "No age available".to_string(),
            };
        };

        let skip = self.history.len().saturating_sub(HISTORY_CONTEXT);
        let request = ChatRequest {
            message,
            age,
            age_group,
            conversation_history: self.history.iter().skip(skip).cloned().collect(),
            parenting_mode: self.session.parenting_mode_active,
        };

        match self.responder.respond(&request).await {
            Ok(text) => Event::ChatReply {
                message: request.message,
                text,
            },
            Err(e) => Event::ChatFailed {
                error: e.to_string(),
            },
        }
    }

    /// Millisecond timestamp, bumped when two messages land in the same ms
    fn next_message_id(&mut self) -> i64 {
        let now = chrono::Utc::now().timestamp_millis();
        self.last_message_id = now.max(self.last_message_id + 1);
        self.last_message_id
    }
}

#[cfg(test)]
impl<R, T, C> ChatController<R, T, C>
where
    R: SessionRepository,
    T: TranscriptStore,
    C: ChatResponder,
{
    pub fn state(&self) -> ChatState {
        self.state
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    pub fn transcript(&self) -> &[Message] {
        &self.transcript
    }

    pub fn history_len(&self) -> usize {
        self.history.len()
    }
}
