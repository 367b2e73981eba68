//! Pure state transition function
//!
//! Given the same state, session and event this always produces the same
//! result; all I/O is described by the returned effects.

use super::{ChatState, Effect, Event, Session};
use crate::age::{AgeEstimate, PARENTING_MIN_AGE};
use crate::replies;
use thiserror::Error;

/// Result of a state transition
#[derive(Debug)]
pub struct TransitionResult {
    pub new_state: ChatState,
    pub session: Session,
    pub effects: Vec<Effect>,
}

impl TransitionResult {
    pub fn new(state: ChatState, session: Session) -> Self {
        Self {
            new_state: state,
            session,
            effects: vec![],
        }
    }

    pub fn with_effect(mut self, effect: Effect) -> Self {
        self.effects.push(effect);
        self
    }

    pub fn with_effects(mut self, effects: impl IntoIterator<Item = Effect>) -> Self {
        self.effects.extend(effects);
        self
    }
}

/// Errors that can occur during transition
#[derive(Debug, Error, PartialEq, Eq)]
pub enum TransitionError {
    #[error("Parenting mode is only available for ages above {}", PARENTING_MIN_AGE)]
    ParentingUnavailable,
}

/// Pure transition function
pub fn transition(
    state: ChatState,
    session: &Session,
    event: Event,
) -> Result<TransitionResult, TransitionError> {
    match (state, event) {
        // ============================================================
        // Initialization (any state)
        // ============================================================
        (
            _,
            Event::Initialize {
                estimate,
                stored_age,
                gender_hint,
            },
        ) => Ok(initialize(session, estimate, stored_age, gender_hint)),

        // ============================================================
        // User messages
        // ============================================================

        // Blank input is ignored everywhere
        (state, Event::UserMessage { text }) if text.trim().is_empty() => {
            Ok(TransitionResult::new(state, session.clone()))
        }

        // The open opt-in question takes precedence over normal routing
        (ChatState::AwaitingParentingConfirmation, Event::UserMessage { text }) => {
            Ok(answer_parenting_question(session, &text))
        }

        // No age yet: explain and stay put
        (state, Event::UserMessage { .. }) if session.predicted_age_years.is_none() => {
            Ok(TransitionResult::new(state, session.clone())
                .with_effect(Effect::assistant_message(replies::NEED_AGE_FIRST)))
        }

        (ChatState::Idle | ChatState::Active, Event::UserMessage { text }) => {
            let message = text.trim().to_string();
            Ok(TransitionResult::new(ChatState::Active, session.clone())
                .with_effect(Effect::user_message(message.clone()))
                .with_effect(Effect::RequestChat { message }))
        }

        // ============================================================
        // Chat service results
        // ============================================================
        (state, Event::ChatReply { message, text }) => {
            Ok(TransitionResult::new(state, session.clone())
                .with_effect(Effect::assistant_message(text.clone()))
                .with_effect(Effect::RecordExchange {
                    message,
                    response: text,
                }))
        }

        // The user's message stays in the transcript, followed by one apology
        (state, Event::ChatFailed { .. }) => Ok(TransitionResult::new(state, session.clone())
            .with_effect(Effect::assistant_message(replies::CHAT_UNAVAILABLE))),

        // ============================================================
        // Explicit actions
        // ============================================================
        (state, Event::ToggleParentingMode) => {
            if !session.parenting_eligible() {
                return Err(TransitionError::ParentingUnavailable);
            }
            let mut session = session.clone();
            session.parenting_mode_active = !session.parenting_mode_active;
            session.parenting_asked = true;
            // A toggle answers an open opt-in question
            let new_state = if state.is_awaiting_confirmation() {
                ChatState::Active
            } else {
                state
            };
            let notice = replies::mode_switched(session.parenting_mode_active);
            Ok(TransitionResult::new(new_state, session)
                .with_effect(Effect::PersistSession)
                .with_effect(Effect::assistant_message(notice)))
        }

        (state, Event::ResetConversation) => Ok(TransitionResult::new(state, session.clone())
            .with_effects([Effect::TruncateTranscript, Effect::ClearHistory])),
    }
}

fn initialize(
    session: &Session,
    estimate: AgeEstimate,
    stored_age: AgeEstimate,
    gender_hint: Option<String>,
) -> TransitionResult {
    let mut session = session.clone();
    let mut persist = false;

    if let Some(gender) = gender_hint {
        session.gender_hint = Some(gender);
        persist = true;
    }

    let years = match (estimate, stored_age) {
        (AgeEstimate::Years { years }, _) => {
            persist = true;
            Some(years)
        }
        (AgeEstimate::Unknown, AgeEstimate::Years { years }) => Some(years),
        (AgeEstimate::Unknown, AgeEstimate::Unknown) => None,
    };

    let was_parenting = session.parenting_mode_active;
    session.set_age(years);
    persist |= was_parenting != session.parenting_mode_active;

    let welcome = years.map_or_else(|| replies::DETECTING_AGE.to_string(), replies::welcome);

    let new_state = if session.parenting_eligible() && !session.parenting_asked {
        session.parenting_asked = true;
        persist = true;
        ChatState::AwaitingParentingConfirmation
    } else {
        ChatState::Active
    };

    let mut result = TransitionResult::new(new_state, session)
        .with_effects([Effect::StartTranscript { welcome }, Effect::ClearHistory]);
    if persist {
        result = result.with_effect(Effect::PersistSession);
    }
    result
}

fn answer_parenting_question(session: &Session, text: &str) -> TransitionResult {
    let answer = text.trim().to_lowercase();
    let mut session = session.clone();
    match answer.as_str() {
        "yes" => {
            session.parenting_mode_active = session.parenting_eligible();
            TransitionResult::new(ChatState::Active, session)
                .with_effect(Effect::PersistSession)
                .with_effect(Effect::assistant_message(replies::parenting_enabled()))
        }
        "no" => {
            session.parenting_mode_active = false;
            TransitionResult::new(ChatState::Active, session)
                .with_effect(Effect::PersistSession)
                .with_effect(Effect::assistant_message(replies::PARENTING_DECLINED))
        }
        _ => TransitionResult::new(ChatState::AwaitingParentingConfirmation, session)
            .with_effect(Effect::assistant_message(replies::PARENTING_REPROMPT)),
    }
}
