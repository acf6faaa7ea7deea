//! Mock implementations for testing
//!
//! These mocks enable engine tests without real recognizers or backends.

use super::{start_intake, EngineEvent, IntakeHandle, IntakeSnapshot};
use crate::capture::{CaptureError, InputCaptureSource};
use crate::config::SessionConfig;
use crate::generator::{GenerationError, Reply, ResponseGenerator};
use crate::progress::Step;
use async_trait::async_trait;
use std::collections::VecDeque;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::{broadcast, Notify};
use tokio_util::sync::CancellationToken;

// ============================================================================
// Mock Generator
// ============================================================================

/// Mock generator that returns queued results.
///
/// With nothing queued it answers like the scripted generator with a fixed
/// text, moving one step forward.
pub struct MockGenerator {
    responses: Mutex<VecDeque<Result<Reply, GenerationError>>>,
    total_steps: u32,
    /// Record of all (step, text) requests made
    pub requests: Mutex<Vec<(Step, String)>>,
}

impl MockGenerator {
    pub fn new(total_steps: u32) -> Self {
        Self {
            responses: Mutex::new(VecDeque::new()),
            total_steps,
            requests: Mutex::new(Vec::new()),
        }
    }

    /// Queue a successful reply
    pub fn queue_reply(&self, reply: Reply) {
        self.responses.lock().unwrap().push_back(Ok(reply));
    }

    /// Queue a failure
    pub fn queue_error(&self, error: GenerationError) {
        self.responses.lock().unwrap().push_back(Err(error));
    }

    pub fn recorded_requests(&self) -> Vec<(Step, String)> {
        self.requests.lock().unwrap().clone()
    }

    fn next_result(&self, step: Step, text: &str) -> Result<Reply, GenerationError> {
        self.requests
            .lock()
            .unwrap()
            .push((step, text.to_string()));
        self.responses
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Ok(Reply::new(format!("after {step}"), step.successor(self.total_steps))))
    }
}

#[async_trait]
impl ResponseGenerator for MockGenerator {
    async fn generate(&self, step: Step, subject_text: &str) -> Result<Reply, GenerationError> {
        self.next_result(step, subject_text)
    }
}

// ============================================================================
// Gated Mock Generator (for in-flight testing)
// ============================================================================

/// Mock generator that holds every request until released
pub struct GatedMockGenerator {
    inner: MockGenerator,
    gate: Arc<Notify>,
    /// Notified when a request starts
    pub request_started: Arc<Notify>,
}

impl GatedMockGenerator {
    pub fn new(total_steps: u32) -> Self {
        Self {
            inner: MockGenerator::new(total_steps),
            gate: Arc::new(Notify::new()),
            request_started: Arc::new(Notify::new()),
        }
    }

    /// Let one waiting (or the next) request proceed
    pub fn release(&self) {
        self.gate.notify_one();
    }

    pub fn recorded_requests(&self) -> Vec<(Step, String)> {
        self.inner.recorded_requests()
    }
}

#[async_trait]
impl ResponseGenerator for GatedMockGenerator {
    async fn generate(&self, step: Step, subject_text: &str) -> Result<Reply, GenerationError> {
        self.request_started.notify_one();
        self.gate.notified().await;
        self.inner.next_result(step, subject_text)
    }
}

// ============================================================================
// Mock Capture
// ============================================================================

/// Mock capture source with queued results.
///
/// With nothing queued it listens until cancelled.
pub struct MockCapture {
    results: Mutex<VecDeque<Result<String, CaptureError>>>,
    /// Steps captures were started for
    pub started: Mutex<Vec<Step>>,
    /// Notified when a capture starts
    pub capture_started: Arc<Notify>,
}

impl MockCapture {
    pub fn new() -> Self {
        Self {
            results: Mutex::new(VecDeque::new()),
            started: Mutex::new(Vec::new()),
            capture_started: Arc::new(Notify::new()),
        }
    }

    pub fn queue_text(&self, text: impl Into<String>) {
        self.results.lock().unwrap().push_back(Ok(text.into()));
    }

    pub fn queue_error(&self, error: CaptureError) {
        self.results.lock().unwrap().push_back(Err(error));
    }
}

impl Default for MockCapture {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl InputCaptureSource for MockCapture {
    async fn capture(&self, step: Step, cancel: CancellationToken) -> Result<String, CaptureError> {
        self.started.lock().unwrap().push(step);
        self.capture_started.notify_one();
        let queued = self.results.lock().unwrap().pop_front();
        match queued {
            Some(result) => result,
            None => {
                cancel.cancelled().await;
                Err(CaptureError::Cancelled)
            }
        }
    }
}

// ============================================================================
// Test Engine
// ============================================================================

/// A running engine plus the mocks behind it
pub struct TestEngine<G: ResponseGenerator + 'static> {
    pub handle: IntakeHandle,
    pub events: broadcast::Receiver<EngineEvent>,
    pub generator: Arc<G>,
    pub capture: Arc<MockCapture>,
}

pub struct TestEngineBuilder<G> {
    intake_id: String,
    config: SessionConfig,
    generator: Option<G>,
    capture: Option<MockCapture>,
}

impl TestEngine<MockGenerator> {
    /// Create a test engine with instant mocks
    pub fn builder() -> TestEngineBuilder<MockGenerator> {
        TestEngineBuilder {
            intake_id: "test-intake".to_string(),
            config: SessionConfig {
                total_steps: 4,
                opening_message: "Welcome".to_string(),
            },
            generator: None,
            capture: None,
        }
    }
}

impl<G: ResponseGenerator + 'static> TestEngineBuilder<G> {
    pub fn generator<H: ResponseGenerator + 'static>(self, generator: H) -> TestEngineBuilder<H> {
        TestEngineBuilder {
            intake_id: self.intake_id,
            config: self.config,
            generator: Some(generator),
            capture: self.capture,
        }
    }

    pub fn capture(mut self, capture: MockCapture) -> Self {
        self.capture = Some(capture);
        self
    }

    pub fn total_steps(mut self, total_steps: u32) -> Self {
        self.config.total_steps = total_steps;
        self
    }

    pub fn build_with(self, generator: G) -> TestEngine<G> {
        let generator = Arc::new(generator);
        let capture = Arc::new(self.capture.unwrap_or_default());
        let handle = start_intake(
            self.intake_id,
            &self.config,
            generator.clone(),
            capture.clone(),
        );
        let events = handle.subscribe();
        TestEngine {
            handle,
            events,
            generator,
            capture,
        }
    }

    pub fn build(mut self) -> TestEngine<G> {
        let generator = self
            .generator
            .take()
            .expect("generator must be set before build()");
        self.build_with(generator)
    }
}

impl TestEngineBuilder<MockGenerator> {
    /// Build with a default `MockGenerator` unless one was supplied
    pub fn build_default(mut self) -> TestEngine<MockGenerator> {
        let generator = self
            .generator
            .take()
            .unwrap_or_else(|| MockGenerator::new(self.config.total_steps));
        self.build_with(generator)
    }
}

impl<G: ResponseGenerator + 'static> TestEngine<G> {
    /// Wait for an `ExchangeComplete` event
    pub async fn wait_for_exchange(&mut self, timeout: Duration) -> bool {
        self.wait_for_event(timeout, |e| matches!(e, EngineEvent::ExchangeComplete))
            .await
            .is_some()
    }

    /// Wait for the first event matching `pred`
    pub async fn wait_for_event(
        &mut self,
        timeout: Duration,
        pred: impl Fn(&EngineEvent) -> bool,
    ) -> Option<EngineEvent> {
        let deadline = tokio::time::Instant::now() + timeout;
        while tokio::time::Instant::now() < deadline {
            match tokio::time::timeout(Duration::from_millis(50), self.events.recv()).await {
                Ok(Ok(event)) if pred(&event) => return Some(event),
                _ => continue,
            }
        }
        None
    }

    /// Wait until the snapshot satisfies `pred`
    pub async fn wait_until(
        &self,
        timeout: Duration,
        pred: impl FnMut(&IntakeSnapshot) -> bool,
    ) -> Option<IntakeSnapshot> {
        let mut rx = self.handle.watch();
        let found = match tokio::time::timeout(timeout, rx.wait_for(pred)).await {
            Ok(Ok(snapshot)) => Some(snapshot.clone()),
            _ => None,
        };
        found
    }

    pub fn snapshot(&self) -> IntakeSnapshot {
        self.handle.snapshot()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::IntakeScript;
    use crate::draft::DraftSource;
    use crate::generator::{ScriptedGenerator, TimeoutGenerator};
    use crate::message_log::Role;
    use crate::runtime::{DispatchError, SessionError, SessionManager};
    use crate::state_machine::TransitionError;

    const WAIT: Duration = Duration::from_secs(2);

    fn is_rejected(result: Result<(), DispatchError>, expected: &TransitionError) -> bool {
        matches!(result, Err(DispatchError::Rejected(ref e)) if e == expected)
    }

    #[tokio::test]
    async fn test_mock_generator_defaults_to_successor() {
        let generator = MockGenerator::new(2);
        let reply = generator.generate(Step::Active(2), "x").await.unwrap();
        assert_eq!(reply.next_step, Step::Completed);
        assert_eq!(generator.recorded_requests(), vec![(Step::Active(2), "x".to_string())]);
    }

    #[tokio::test]
    async fn test_mock_capture_waits_for_cancel() {
        let capture = MockCapture::new();
        let cancel = CancellationToken::new();
        cancel.cancel();
        let result = capture.capture(Step::FIRST, cancel).await;
        assert_eq!(result, Err(CaptureError::Cancelled));
    }

    #[tokio::test]
    async fn test_initial_state() {
        let rt = TestEngine::builder().build_default();
        let snapshot = rt.snapshot();

        assert_eq!(snapshot.messages().len(), 1);
        assert_eq!(snapshot.messages()[0].role, Role::Assistant);
        assert_eq!(snapshot.messages()[0].content, "Welcome");
        assert_eq!(snapshot.current_step(), Step::FIRST);
        assert_eq!(snapshot.progress(), 0);
        assert!(!snapshot.is_processing());
        assert_eq!(snapshot.pending_input().source, DraftSource::None);
    }

    /// Full four-step intake with the scripted generator
    #[tokio::test]
    async fn test_full_scripted_intake() {
        let script = IntakeScript::default();
        let mut rt = TestEngine::builder()
            .generator(ScriptedGenerator::from_script(&script))
            .build();

        rt.handle.commit("headache").await.unwrap();
        assert!(rt.wait_for_exchange(WAIT).await);

        let snapshot = rt.snapshot();
        assert_eq!(snapshot.messages().len(), 3);
        assert_eq!(snapshot.current_step(), Step::Active(2));
        assert_eq!(snapshot.progress(), 25);
        assert_eq!(snapshot.messages()[1].role, Role::Subject);
        assert_eq!(snapshot.messages()[1].content, "headache");
        assert_eq!(snapshot.messages()[2].content, script.prompts[0]);

        for answer in ["three days", "ibuprofen", "no"] {
            rt.handle.commit(answer).await.unwrap();
            assert!(rt.wait_for_exchange(WAIT).await);
        }

        let snapshot = rt.snapshot();
        assert!(snapshot.is_complete());
        assert_eq!(snapshot.progress(), 100);
        assert_eq!(snapshot.messages().len(), 9);
        assert_eq!(
            snapshot.messages().last().map(|t| t.content.as_str()),
            Some(script.closing_message.as_str())
        );
    }

    #[tokio::test]
    async fn test_terminal_state_is_idempotent() {
        let script = IntakeScript::default();
        let mut rt = TestEngine::builder()
            .generator(ScriptedGenerator::from_script(&script))
            .build();

        for answer in ["a", "b", "c", "d"] {
            rt.handle.commit(answer).await.unwrap();
            assert!(rt.wait_for_exchange(WAIT).await);
        }
        assert!(rt.snapshot().is_complete());

        for extra in 1..=3 {
            rt.handle.commit("one more thing").await.unwrap();
            assert!(rt.wait_for_exchange(WAIT).await);

            let snapshot = rt.snapshot();
            assert_eq!(snapshot.current_step(), Step::Completed);
            assert_eq!(snapshot.progress(), 100);
            assert_eq!(snapshot.messages().len(), 9 + 2 * extra);
            assert_eq!(
                snapshot.messages().last().map(|t| t.content.as_str()),
                Some(script.closing_message.as_str())
            );
        }
    }

    #[tokio::test]
    async fn test_commit_rejected_while_processing() {
        let mut rt = TestEngine::builder()
            .generator(GatedMockGenerator::new(4))
            .build();

        rt.handle.commit("first").await.unwrap();
        assert!(rt.snapshot().is_processing());

        let second = rt.handle.commit("second").await;
        assert!(is_rejected(second, &TransitionError::Busy));

        // Only the first subject turn was logged
        let snapshot = rt.snapshot();
        assert_eq!(snapshot.messages().len(), 2);
        assert_eq!(snapshot.current_step(), Step::FIRST);

        rt.generator.release();
        assert!(rt.wait_for_exchange(WAIT).await);
        assert_eq!(rt.generator.recorded_requests().len(), 1);
        assert_eq!(rt.snapshot().current_step(), Step::Active(2));
    }

    #[tokio::test]
    async fn test_blank_commit_is_noop() {
        let rt = TestEngine::builder().build_default();
        let before = rt.snapshot();

        let result = rt.handle.commit("   \n").await;
        assert!(is_rejected(result, &TransitionError::EmptyCommit));

        let after = rt.snapshot();
        assert_eq!(after.messages().len(), before.messages().len());
        assert_eq!(after.current_step(), before.current_step());
        assert_eq!(after.progress(), before.progress());
        assert!(rt.generator.recorded_requests().is_empty());
    }

    #[tokio::test]
    async fn test_generation_error_keeps_subject_turn() {
        let generator = MockGenerator::new(4);
        generator.queue_error(GenerationError::unavailable("backend down"));
        let mut rt = TestEngine::builder().generator(generator).build();

        rt.handle.commit("x").await.unwrap();
        let event = rt
            .wait_for_event(WAIT, |e| matches!(e, EngineEvent::Error { .. }))
            .await;
        assert!(matches!(event, Some(EngineEvent::Error { message }) if message == "backend down"));

        let snapshot = rt
            .wait_until(WAIT, |s| !s.is_processing())
            .await
            .unwrap();
        assert_eq!(snapshot.current_step(), Step::FIRST);
        assert_eq!(snapshot.messages().len(), 2);
        assert_eq!(snapshot.messages()[1].content, "x");
        assert_eq!(snapshot.last_error(), Some("backend down"));

        // Retrying the same step succeeds and clears the error
        rt.handle.commit("x again").await.unwrap();
        assert!(rt.wait_for_exchange(WAIT).await);
        let snapshot = rt.snapshot();
        assert_eq!(snapshot.current_step(), Step::Active(2));
        assert_eq!(snapshot.last_error(), None);
        assert_eq!(snapshot.messages().len(), 4);
        assert_eq!(
            rt.generator.recorded_requests(),
            vec![
                (Step::FIRST, "x".to_string()),
                (Step::FIRST, "x again".to_string())
            ]
        );
    }

    #[tokio::test]
    async fn test_generator_timeout_is_recoverable() {
        let slow: Arc<dyn ResponseGenerator> = Arc::new(GatedMockGenerator::new(4));
        let generator = TimeoutGenerator::new(slow, Duration::from_millis(30));
        let rt = TestEngine::builder().generator(generator).build();

        rt.handle.commit("hello").await.unwrap();
        let snapshot = rt
            .wait_until(WAIT, |s| s.last_error().is_some())
            .await
            .unwrap();
        assert!(!snapshot.is_processing());
        assert_eq!(snapshot.current_step(), Step::FIRST);
        assert!(snapshot.last_error().unwrap().contains("No reply"));
    }

    #[tokio::test]
    async fn test_invalid_next_step_does_not_advance() {
        let generator = MockGenerator::new(4);
        generator.queue_reply(Reply::new("jumping", Step::Active(4)));
        let rt = TestEngine::builder().generator(generator).build();

        rt.handle.commit("hi").await.unwrap();
        let snapshot = rt
            .wait_until(WAIT, |s| !s.is_processing())
            .await
            .unwrap();
        assert_eq!(snapshot.current_step(), Step::FIRST);
        assert_eq!(snapshot.messages().len(), 2);
        assert!(snapshot.last_error().is_some());
    }

    #[tokio::test]
    async fn test_start_then_cancel_capture() {
        let rt = TestEngine::builder().build_default();

        rt.handle.start_capture().await.unwrap();
        assert!(rt.snapshot().pending_input().is_capturing());

        rt.handle.cancel_capture().await.unwrap();
        let snapshot = rt.snapshot();
        assert_eq!(snapshot.pending_input().text, "");
        assert_eq!(snapshot.pending_input().source, DraftSource::None);
        assert_eq!(snapshot.messages().len(), 1);

        // The cancelled capture's late failure is ignored
        tokio::time::sleep(Duration::from_millis(50)).await;
        assert_eq!(rt.snapshot().pending_input().source, DraftSource::None);
    }

    #[tokio::test]
    async fn test_capture_edit_submit() {
        let capture = MockCapture::new();
        capture.queue_text("I have a headache");
        let mut rt = TestEngine::builder().capture(capture).build_default();

        rt.handle.start_capture().await.unwrap();
        let snapshot = rt
            .wait_until(WAIT, |s| s.pending_input().source == DraftSource::Captured)
            .await
            .unwrap();
        assert_eq!(snapshot.pending_input().text, "I have a headache");
        assert_eq!(*rt.capture.started.lock().unwrap(), vec![Step::FIRST]);

        rt.handle.begin_edit().await.unwrap();
        assert!(rt
            .wait_for_event(WAIT, |e| matches!(e, EngineEvent::Focus))
            .await
            .is_some());
        rt.handle
            .update_text("I have had a headache for a week")
            .await
            .unwrap();
        rt.handle.end_edit().await.unwrap();
        assert_eq!(rt.snapshot().pending_input().source, DraftSource::Captured);

        rt.handle.submit_draft().await.unwrap();
        let snapshot = rt.snapshot();
        assert_eq!(snapshot.pending_input().text, "");
        assert_eq!(snapshot.pending_input().source, DraftSource::None);
        assert_eq!(
            snapshot.messages()[1].content,
            "I have had a headache for a week"
        );

        assert!(rt.wait_for_exchange(WAIT).await);
        assert_eq!(rt.snapshot().current_step(), Step::Active(2));
    }

    #[tokio::test]
    async fn test_commit_rejected_while_capturing() {
        let rt = TestEngine::builder().build_default();
        rt.handle.start_capture().await.unwrap();

        let result = rt.handle.commit("typed instead").await;
        assert!(is_rejected(result, &TransitionError::CaptureActive));
        assert_eq!(rt.snapshot().messages().len(), 1);
    }

    #[tokio::test]
    async fn test_capture_failure_resets_draft() {
        let capture = MockCapture::new();
        capture.queue_error(CaptureError::Unavailable("no microphone".to_string()));
        let mut rt = TestEngine::builder().capture(capture).build_default();

        rt.handle.start_capture().await.unwrap();
        let event = rt
            .wait_for_event(WAIT, |e| matches!(e, EngineEvent::Error { .. }))
            .await;
        assert!(matches!(event, Some(EngineEvent::Error { message }) if message.contains("no microphone")));

        let snapshot = rt
            .wait_until(WAIT, |s| !s.pending_input().is_capturing())
            .await
            .unwrap();
        assert_eq!(snapshot.pending_input().source, DraftSource::None);

        // Typing directly still works
        rt.handle.update_text("typed").await.unwrap();
        rt.handle.submit_draft().await.unwrap();
        assert!(rt.wait_for_exchange(WAIT).await);
    }

    #[tokio::test]
    async fn test_capture_rejected_while_processing() {
        let rt = TestEngine::builder()
            .generator(GatedMockGenerator::new(4))
            .build();
        rt.handle.commit("first").await.unwrap();

        let result = rt.handle.start_capture().await;
        assert!(is_rejected(result, &TransitionError::Busy));
        assert!(rt.capture.started.lock().unwrap().is_empty());
        rt.generator.release();
    }

    #[tokio::test]
    async fn test_log_grows_by_two_per_exchange() {
        let mut rt = TestEngine::builder().total_steps(6).build_default();
        for k in 1..=8 {
            rt.handle.commit(format!("answer {k}")).await.unwrap();
            assert!(rt.wait_for_exchange(WAIT).await);
            let snapshot = rt.snapshot();
            assert_eq!(snapshot.messages().len(), 1 + 2 * k);
            let roles: Vec<Role> = snapshot.messages().iter().map(|t| t.role).collect();
            for (i, role) in roles.iter().enumerate() {
                let expected = if i % 2 == 0 { Role::Assistant } else { Role::Subject };
                assert_eq!(*role, expected);
            }
        }
        assert!(rt.snapshot().is_complete());
    }

    #[tokio::test]
    async fn test_progress_published_with_state_change() {
        let mut rt = TestEngine::builder().build_default();
        rt.handle.commit("hi").await.unwrap();

        let event = rt
            .wait_for_event(WAIT, |e| {
                matches!(e, EngineEvent::StateChange { processing: false, .. })
            })
            .await;
        assert!(matches!(
            event,
            Some(EngineEvent::StateChange {
                step: Step::Active(2),
                progress: 25,
                ..
            })
        ));
    }

    #[tokio::test]
    async fn test_session_manager_isolates_sessions() {
        let script = IntakeScript::default();
        let manager = SessionManager::new(
            script.clone(),
            Arc::new(ScriptedGenerator::from_script(&script)),
            Arc::new(MockCapture::new()),
        );

        let first = manager.create().await.unwrap();
        let second = manager.create().await.unwrap();
        assert_ne!(first.intake_id(), second.intake_id());

        let mut events = first.subscribe();
        first.commit("headache").await.unwrap();
        loop {
            match tokio::time::timeout(WAIT, events.recv()).await {
                Ok(Ok(EngineEvent::ExchangeComplete)) => break,
                Ok(Ok(_)) => continue,
                other => panic!("no exchange completed: {other:?}"),
            }
        }

        let found = manager.get(first.intake_id()).await.unwrap();
        assert_eq!(found.snapshot().current_step(), Step::Active(2));
        assert_eq!(second.snapshot().current_step(), Step::FIRST);
        assert!(manager.get("missing").await.is_none());
    }

    fn single_step_manager(max_sessions: usize) -> SessionManager {
        let script = IntakeScript {
            opening_message: "Hi".to_string(),
            prompts: vec![],
            closing_message: "Done".to_string(),
            capture_samples: vec![],
        };
        SessionManager::new(
            script.clone(),
            Arc::new(ScriptedGenerator::from_script(&script)),
            Arc::new(MockCapture::new()),
        )
        .with_max_sessions(max_sessions)
    }

    #[tokio::test]
    async fn test_reply_discards_draft_typed_while_generating() {
        let mut rt = TestEngine::builder()
            .generator(GatedMockGenerator::new(4))
            .build();

        rt.handle.commit("first").await.unwrap();
        rt.handle.update_text("typed while thinking").await.unwrap();
        assert_eq!(rt.snapshot().pending_input().text, "typed while thinking");

        rt.generator.release();
        assert!(rt.wait_for_exchange(WAIT).await);

        let snapshot = rt.snapshot();
        assert_eq!(snapshot.current_step(), Step::Active(2));
        assert_eq!(snapshot.pending_input().text, "");
        assert_eq!(snapshot.pending_input().source, DraftSource::None);
    }

    #[tokio::test]
    async fn test_removed_session_engine_stops() {
        let manager = single_step_manager(4);
        let handle = manager.create().await.unwrap();
        let id = handle.intake_id().to_string();
        let mut events = handle.subscribe();

        assert!(manager.remove(&id).await);
        assert!(!manager.remove(&id).await);
        assert!(manager.get(&id).await.is_none());
        drop(handle);

        // With every command sender gone the engine exits and the
        // broadcast channel closes
        let closed = tokio::time::timeout(WAIT, async {
            loop {
                if let Err(broadcast::error::RecvError::Closed) = events.recv().await {
                    break;
                }
            }
        })
        .await;
        assert!(closed.is_ok());
    }

    #[tokio::test]
    async fn test_completed_sessions_evicted_at_limit() {
        let manager = single_step_manager(2);
        let done = manager.create().await.unwrap();
        let active = manager.create().await.unwrap();

        done.commit("all good").await.unwrap();
        let mut rx = done.watch();
        tokio::time::timeout(WAIT, rx.wait_for(IntakeSnapshot::is_complete))
            .await
            .unwrap()
            .unwrap();

        let third = manager.create().await.unwrap();
        assert_eq!(manager.len().await, 2);
        assert!(manager.get(done.intake_id()).await.is_none());
        assert!(manager.get(active.intake_id()).await.is_some());
        assert!(manager.get(third.intake_id()).await.is_some());

        // Nothing left to evict
        let refused = manager.create().await;
        assert!(matches!(refused, Err(SessionError::Full(2))));
        assert_eq!(manager.len().await, 2);
    }
}
