//! Property-based tests for the session state machine
//!
//! These tests verify key invariants hold across all possible inputs.

use super::state::*;
use super::transition::*;
use super::*;
use crate::age::{AgeEstimate, AgeGroup};
use crate::replies;
use proptest::prelude::*;

// ============================================================================
// Arbitrary Generators
// ============================================================================

fn arb_state() -> impl Strategy<Value = ChatState> {
    prop_oneof![
        Just(ChatState::Idle),
        Just(ChatState::AwaitingParentingConfirmation),
        Just(ChatState::Active),
    ]
}

fn arb_age() -> impl Strategy<Value = f64> {
    0.0f64..=120.0
}

fn arb_session() -> impl Strategy<Value = Session> {
    (
        proptest::option::of(arb_age()),
        any::<bool>(),
        any::<bool>(),
    )
        .prop_map(|(age, parenting, asked)| {
            let mut session = Session {
                parenting_mode_active: parenting,
                parenting_asked: asked,
                ..Session::default()
            };
            session.set_age(age);
            session
        })
}

fn arb_text() -> impl Strategy<Value = String> {
    "[a-zA-Z ]{0,30}"
}

fn arb_event() -> impl Strategy<Value = Event> {
    prop_oneof![
        (proptest::option::of(arb_age()), proptest::option::of(arb_age())).prop_map(
            |(estimate, stored)| Event::Initialize {
                estimate: AgeEstimate::from_option(estimate),
                stored_age: AgeEstimate::from_option(stored),
                gender_hint: None,
            }
        ),
        arb_text().prop_map(|text| Event::UserMessage { text }),
        Just(Event::ToggleParentingMode),
        Just(Event::ResetConversation),
        (arb_text(), arb_text()).prop_map(|(message, text)| Event::ChatReply { message, text }),
        Just(Event::ChatFailed {
            error: "upstream".to_string()
        }),
    ]
}

fn welcome_count(effects: &[Effect]) -> usize {
    effects
        .iter()
        .filter(|e| matches!(e, Effect::StartTranscript { .. }))
        .count()
}

// ============================================================================
// Properties
// ============================================================================

proptest! {
    #[test]
    fn prop_child_ages_get_child_welcome(age in 0.0f64..13.0) {
        let result = transition(
            ChatState::Idle,
            &Session::default(),
            Event::Initialize {
                estimate: AgeEstimate::from_option(Some(age)),
                stored_age: AgeEstimate::Unknown,
                gender_hint: None,
            },
        ).unwrap();

        let expected = Effect::StartTranscript { welcome: replies::welcome(age) };
        prop_assert_eq!(welcome_count(&result.effects), 1);
        prop_assert!(result.effects.contains(&expected));
        prop_assert!(replies::welcome(age).starts_with("Hi there!"));
        prop_assert_eq!(result.new_state, ChatState::Active);
    }

    #[test]
    fn prop_question_armed_once_above_threshold(age in 25.01f64..=120.0) {
        let event = || Event::Initialize {
            estimate: AgeEstimate::from_option(Some(age)),
            stored_age: AgeEstimate::Unknown,
            gender_hint: None,
        };
        let first = transition(ChatState::Idle, &Session::default(), event()).unwrap();
        prop_assert_eq!(first.new_state, ChatState::AwaitingParentingConfirmation);

        let second = transition(first.new_state, &first.session, event()).unwrap();
        prop_assert_eq!(second.new_state, ChatState::Active);
    }

    #[test]
    fn prop_age_group_tracks_age(state in arb_state(), session in arb_session(), event in arb_event()) {
        if let Ok(result) = transition(state, &session, event) {
            let expected = result.session.predicted_age_years.map(AgeGroup::from_years);
            prop_assert_eq!(result.session.age_group, expected);
        }
    }

    #[test]
    fn prop_parenting_requires_eligible_age(state in arb_state(), session in arb_session(), event in arb_event()) {
        if let Ok(result) = transition(state, &session, event) {
            if result.session.parenting_mode_active && !session.parenting_mode_active {
                prop_assert!(result.session.parenting_eligible());
            }
        }
    }

    #[test]
    fn prop_initialize_emits_exactly_one_welcome(state in arb_state(), session in arb_session(),
                                                 estimate in proptest::option::of(arb_age()),
                                                 stored in proptest::option::of(arb_age())) {
        let result = transition(state, &session, Event::Initialize {
            estimate: AgeEstimate::from_option(estimate),
            stored_age: AgeEstimate::from_option(stored),
            gender_hint: None,
        }).unwrap();
        prop_assert_eq!(welcome_count(&result.effects), 1);
        prop_assert_ne!(result.new_state, ChatState::Idle);
    }

    #[test]
    fn prop_other_answers_keep_question_open(session in arb_session(), text in "[a-z]{1,10}") {
        prop_assume!(text != "yes" && text != "no");
        let result = transition(
            ChatState::AwaitingParentingConfirmation,
            &session,
            Event::UserMessage { text },
        ).unwrap();

        prop_assert_eq!(result.new_state, ChatState::AwaitingParentingConfirmation);
        prop_assert_eq!(result.effects, vec![Effect::assistant_message(replies::PARENTING_REPROMPT)]);
        prop_assert_eq!(result.session, session);
    }

    #[test]
    fn prop_reset_never_touches_session(state in arb_state(), session in arb_session()) {
        let result = transition(state, &session, Event::ResetConversation).unwrap();
        prop_assert_eq!(result.new_state, state);
        prop_assert_eq!(result.session, session);
    }

    #[test]
    fn prop_chat_failure_is_single_message(state in arb_state(), session in arb_session()) {
        let result = transition(state, &session, Event::ChatFailed { error: "down".to_string() }).unwrap();
        prop_assert_eq!(result.effects.len(), 1);
        prop_assert!(result.effects[0].is_assistant_message());
    }
}
