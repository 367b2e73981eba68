//! Mock implementations for testing
//!
//! These mocks enable controller testing without real I/O.

use super::executor::ChatController;
use super::traits::*;
use crate::db::Message;
use crate::llm::{ChatRequest, LlmError};
use async_trait::async_trait;
use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex};

// ============================================================================
// In-Memory Key-Value Store
// ============================================================================

#[derive(Default)]
pub struct MemoryKv {
    values: Mutex<HashMap<String, String>>,
}

impl MemoryKv {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn value(&self, key: &str) -> Option<String> {
        self.values.lock().unwrap().get(key).cloned()
    }
}

#[async_trait]
impl KeyValueStore for MemoryKv {
    async fn get(&self, key: &str) -> Result<Option<String>, String> {
        Ok(self.value(key))
    }

    async fn set(&self, key: &str, value: &str) -> Result<(), String> {
        self.values
            .lock()
            .unwrap()
            .insert(key.to_string(), value.to_string());
        Ok(())
    }

    async fn remove(&self, key: &str) -> Result<(), String> {
        self.values.lock().unwrap().remove(key);
        Ok(())
    }
}

/// Store whose every call fails, for best-effort persistence tests
pub struct FailingKv;

#[async_trait]
impl KeyValueStore for FailingKv {
    async fn get(&self, _key: &str) -> Result<Option<String>, String> {
        Err("storage unavailable".to_string())
    }

    async fn set(&self, _key: &str, _value: &str) -> Result<(), String> {
        Err("storage unavailable".to_string())
    }

    async fn remove(&self, _key: &str) -> Result<(), String> {
        Err("storage unavailable".to_string())
    }
}

// ============================================================================
// In-Memory Transcript
// ============================================================================

#[derive(Default)]
pub struct MemoryTranscript {
    messages: Mutex<Vec<Message>>,
}

impl MemoryTranscript {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn messages(&self) -> Vec<Message> {
        self.messages.lock().unwrap().clone()
    }
}

#[async_trait]
impl TranscriptStore for MemoryTranscript {
    async fn append(&self, message: &Message) -> Result<(), String> {
        self.messages.lock().unwrap().push(message.clone());
        Ok(())
    }

    async fn replace(&self, messages: &[Message]) -> Result<(), String> {
        *self.messages.lock().unwrap() = messages.to_vec();
        Ok(())
    }

    async fn truncate(&self) -> Result<(), String> {
        self.messages.lock().unwrap().truncate(1);
        Ok(())
    }

    async fn load(&self) -> Result<Vec<Message>, String> {
        Ok(self.messages())
    }
}

// ============================================================================
// Mock Responder
// ============================================================================

/// Responder that returns queued replies and records every request
#[derive(Default)]
pub struct MockResponder {
    responses: Mutex<VecDeque<Result<String, LlmError>>>,
    pub requests: Mutex<Vec<ChatRequest>>,
}

impl MockResponder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn queue_reply(&self, text: impl Into<String>) {
        self.responses.lock().unwrap().push_back(Ok(text.into()));
    }

    pub fn queue_error(&self, error: LlmError) {
        self.responses.lock().unwrap().push_back(Err(error));
    }

    pub fn recorded_requests(&self) -> Vec<ChatRequest> {
        self.requests.lock().unwrap().clone()
    }
}

#[async_trait]
impl ChatResponder for MockResponder {
    async fn respond(&self, request: &ChatRequest) -> Result<String, LlmError> {
        self.requests.lock().unwrap().push(request.clone());
        self.responses
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Err(LlmError::unavailable("No more mock responses")))
    }
}

// ============================================================================
// Test Controller
// ============================================================================

pub type TestController =
    ChatController<KvSessionRepository<Arc<MemoryKv>>, Arc<MemoryTranscript>, Arc<MockResponder>>;

/// Controller wired to fresh in-memory mocks, with handles to inspect them
#[derive(Default)]
pub struct TestHarness {
    pub kv: Arc<MemoryKv>,
    pub transcript: Arc<MemoryTranscript>,
    pub responder: Arc<MockResponder>,
}

impl TestHarness {
    pub fn new() -> Self {
        Self::default()
    }

    /// A controller over the harness stores, restored from their contents
    pub async fn controller(&self) -> TestController {
        ChatController::restore(
            "test-session",
            KvSessionRepository::new(self.kv.clone()),
            self.transcript.clone(),
            self.responder.clone(),
        )
        .await
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::age::{AgeEstimate, AgeGroup};
    use crate::db::MessageRole;
    use crate::llm::LlmErrorKind;
    use crate::replies;
    use crate::state_machine::{ChatState, TransitionError};

    fn age(years: f64) -> AgeEstimate {
        AgeEstimate::years(years).unwrap()
    }

    fn texts(messages: &[Message]) -> Vec<&str> {
        messages.iter().map(|m| m.text.as_str()).collect()
    }

    #[tokio::test]
    async fn test_mock_responder() {
        let mock = MockResponder::new();
        mock.queue_reply("Drink water");

        let request = ChatRequest {
            message: "hi".to_string(),
            age: 30.0,
            age_group: AgeGroup::Adult,
            conversation_history: vec![],
            parenting_mode: false,
        };
        assert_eq!(mock.respond(&request).await.unwrap(), "Drink water");

        // Second call should fail (no more responses)
        let err = mock.respond(&request).await.unwrap_err();
        assert_eq!(err.kind, LlmErrorKind::Unavailable);
        assert_eq!(mock.recorded_requests().len(), 2);
    }

    #[tokio::test]
    async fn test_child_goes_straight_to_chat() {
        let harness = TestHarness::new();
        harness.responder.queue_reply("Brush twice a day!");
        let mut controller = harness.controller().await;

        let transcript = controller.initialize(age(8.0), None).await;
        assert_eq!(texts(&transcript), vec![replies::welcome(8.0).as_str()]);
        assert_eq!(controller.state(), ChatState::Active);
        assert!(controller.view().pending_prompt.is_none());

        let emitted = controller.submit_user_message("hello").await;
        assert_eq!(texts(&emitted), vec!["hello", "Brush twice a day!"]);
        assert_eq!(emitted[0].role, MessageRole::User);

        let requests = harness.responder.recorded_requests();
        assert_eq!(requests.len(), 1);
        assert_eq!(requests[0].age_group, AgeGroup::Child);
        assert!(!requests[0].parenting_mode);
    }

    #[tokio::test]
    async fn test_adult_declines_parenting() {
        let harness = TestHarness::new();
        let mut controller = harness.controller().await;

        controller.initialize(age(30.0), None).await;
        assert_eq!(controller.state(), ChatState::AwaitingParentingConfirmation);
        assert_eq!(controller.view().pending_prompt, Some(replies::PARENTING_QUESTION));

        controller.submit_user_message("no").await;
        assert_eq!(controller.state(), ChatState::Active);
        assert!(!controller.session().parenting_mode_active);
        assert_eq!(
            texts(controller.transcript()),
            vec![replies::welcome(30.0).as_str(), replies::PARENTING_DECLINED]
        );
        assert_eq!(harness.kv.value(KEY_PARENTING_ASKED).as_deref(), Some("true"));
        assert!(harness.responder.recorded_requests().is_empty());
    }

    #[tokio::test]
    async fn test_unclear_answer_keeps_question_open() {
        let harness = TestHarness::new();
        let mut controller = harness.controller().await;
        controller.initialize(age(45.0), None).await;

        let emitted = controller.submit_user_message("maybe").await;
        assert_eq!(texts(&emitted), vec![replies::PARENTING_REPROMPT]);
        assert!(controller.state().is_awaiting_confirmation());

        let emitted = controller.submit_user_message("  YES ").await;
        assert_eq!(emitted.len(), 1);
        assert_eq!(emitted[0].text, replies::parenting_enabled());
        assert!(controller.session().parenting_mode_active);
        assert_eq!(harness.kv.value(KEY_PARENTING_MODE).as_deref(), Some("true"));
        assert!(harness.responder.recorded_requests().is_empty());
    }

    #[tokio::test]
    async fn test_blank_messages_are_ignored() {
        let harness = TestHarness::new();
        let mut controller = harness.controller().await;
        controller.initialize(age(20.0), None).await;

        assert!(controller.submit_user_message("").await.is_empty());
        assert!(controller.submit_user_message("   ").await.is_empty());
        assert_eq!(controller.transcript().len(), 1);
        assert!(harness.responder.recorded_requests().is_empty());
    }

    #[tokio::test]
    async fn test_reinitialize_from_stored_age_does_not_rearm() {
        let harness = TestHarness::new();
        {
            let mut controller = harness.controller().await;
            controller.initialize(age(40.0), None).await;
            controller.submit_user_message("yes").await;
        }

        let mut controller = harness.controller().await;
        controller.initialize(AgeEstimate::Unknown, None).await;

        assert_eq!(controller.state(), ChatState::Active);
        assert_eq!(controller.session().age_group, Some(AgeGroup::Adult));
        assert!(controller.session().parenting_mode_active);
        assert_eq!(texts(controller.transcript()), vec![replies::welcome(40.0).as_str()]);
    }

    #[tokio::test]
    async fn test_no_age_anywhere() {
        let harness = TestHarness::new();
        let mut controller = harness.controller().await;

        let transcript = controller.initialize(AgeEstimate::Unknown, None).await;
        assert_eq!(texts(&transcript), vec![replies::DETECTING_AGE]);

        let emitted = controller.submit_user_message("am I healthy?").await;
        assert_eq!(texts(&emitted), vec![replies::NEED_AGE_FIRST]);
        assert!(harness.responder.recorded_requests().is_empty());
    }

    #[tokio::test]
    async fn test_chat_failure_keeps_user_message() {
        let harness = TestHarness::new();
        harness
            .responder
            .queue_error(LlmError::network("connection refused"));
        let mut controller = harness.controller().await;
        controller.initialize(age(16.0), None).await;

        let emitted = controller.submit_user_message("how much sleep?").await;
        assert_eq!(texts(&emitted), vec!["how much sleep?", replies::CHAT_UNAVAILABLE]);
        assert_eq!(controller.history_len(), 0);
        assert_eq!(harness.transcript.messages().len(), 3);
    }

    #[tokio::test]
    async fn test_history_is_capped() {
        let harness = TestHarness::new();
        for i in 0..12 {
            harness.responder.queue_reply(format!("reply {i}"));
        }
        let mut controller = harness.controller().await;
        controller.initialize(age(22.0), None).await;

        for i in 0..12 {
            controller.submit_user_message(&format!("question {i}")).await;
        }

        assert_eq!(controller.history_len(), 10);
        let requests = harness.responder.recorded_requests();
        let last = requests.last().unwrap();
        assert_eq!(last.conversation_history.len(), 5);
        assert_eq!(last.conversation_history[4].message, "question 10");
    }

    #[tokio::test]
    async fn test_message_ids_increase() {
        let harness = TestHarness::new();
        harness.responder.queue_reply("a");
        harness.responder.queue_reply("b");
        let mut controller = harness.controller().await;
        controller.initialize(age(19.0), None).await;
        controller.submit_user_message("one").await;
        controller.submit_user_message("two").await;

        let ids: Vec<i64> = controller.transcript().iter().map(|m| m.id).collect();
        assert_eq!(ids.len(), 5);
        assert!(ids.windows(2).all(|w| w[0] < w[1]));
    }

    #[tokio::test]
    async fn test_reset_keeps_welcome_and_session() {
        let harness = TestHarness::new();
        harness.responder.queue_reply("Stretch daily.");
        let mut controller = harness.controller().await;
        controller.initialize(age(35.0), None).await;
        controller.submit_user_message("yes").await;
        controller.submit_user_message("any exercise tips?").await;
        assert!(controller.is_topic_recent("more exercise"));

        let transcript = controller.reset_conversation().await;
        assert_eq!(texts(&transcript), vec![replies::welcome(35.0).as_str()]);
        assert_eq!(harness.transcript.messages().len(), 1);
        assert_eq!(controller.session().predicted_age_years, Some(35.0));
        assert!(controller.session().parenting_mode_active);
        assert_eq!(controller.history_len(), 0);
        assert!(!controller.is_topic_recent("more exercise"));
    }

    #[tokio::test]
    async fn test_reset_before_initialize_is_harmless() {
        let harness = TestHarness::new();
        let mut controller = harness.controller().await;

        assert!(controller.reset_conversation().await.is_empty());
        assert_eq!(controller.state(), ChatState::Idle);

        let transcript = controller.initialize(age(8.0), None).await;
        assert_eq!(texts(&transcript), vec![replies::welcome(8.0).as_str()]);
        assert_eq!(controller.state(), ChatState::Active);
    }

    #[tokio::test]
    async fn test_toggle_rules() {
        let harness = TestHarness::new();
        let mut controller = harness.controller().await;
        controller.initialize(age(18.0), None).await;
        assert_eq!(
            controller.toggle_parenting_mode().await.unwrap_err(),
            TransitionError::ParentingUnavailable
        );
        assert_eq!(controller.transcript().len(), 1);

        controller.initialize(age(50.0), None).await;
        assert!(controller.state().is_awaiting_confirmation());
        let emitted = controller.toggle_parenting_mode().await.unwrap();
        assert_eq!(emitted[0].text, replies::parenting_enabled());
        assert_eq!(controller.state(), ChatState::Active);

        let emitted = controller.toggle_parenting_mode().await.unwrap();
        assert_eq!(texts(&emitted), vec![replies::MODE_SWITCHED_TO_HEALTH]);
        assert_eq!(harness.kv.value(KEY_PARENTING_MODE).as_deref(), Some("false"));
    }

    #[tokio::test]
    async fn test_restore_resumes_transcript() {
        let harness = TestHarness::new();
        harness.responder.queue_reply("Walk more.");
        {
            let mut controller = harness.controller().await;
            controller.initialize(age(60.0), Some("male".to_string())).await;
            controller.submit_user_message("no").await;
            controller.submit_user_message("tips?").await;
        }

        let controller = harness.controller().await;
        let view = controller.view();
        assert_eq!(view.state, ChatState::Active);
        assert_eq!(view.messages.len(), 4);
        assert_eq!(view.session.gender_hint.as_deref(), Some("male"));
        assert_eq!(view.focus_label, Some("Wellness & Prevention"));
    }

    #[tokio::test]
    async fn test_persistence_failures_are_swallowed() {
        let responder = Arc::new(MockResponder::new());
        responder.queue_reply("Sleep 8 hours.");
        let mut controller = ChatController::restore(
            "broken",
            KvSessionRepository::new(FailingKv),
            Arc::new(MemoryTranscript::new()),
            responder.clone(),
        )
        .await;

        controller.initialize(age(30.0), None).await;
        controller.submit_user_message("no").await;
        let emitted = controller.submit_user_message("sleep?").await;

        assert_eq!(texts(&emitted), vec!["sleep?", "Sleep 8 hours."]);
        assert_eq!(responder.recorded_requests().len(), 1);
    }
}
