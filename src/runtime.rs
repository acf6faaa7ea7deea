//! Runtime for executing intake sessions
//!
//! Each session runs one [`DialogueEngine`] task. Callers talk to it through
//! an [`IntakeHandle`]: commands go in over an mpsc channel, snapshots come
//! out over a watch channel and change notifications over a broadcast.

mod executor;

#[cfg(test)]
pub mod testing;

pub use executor::DialogueEngine;

use crate::capture::InputCaptureSource;
use crate::config::{IntakeScript, SessionConfig, DEFAULT_MAX_SESSIONS};
use crate::draft::PendingInput;
use crate::generator::ResponseGenerator;
use crate::message_log::Turn;
use crate::progress::Step;
use crate::state_machine::{Event, IntakeContext, TransitionError};
use serde::Serialize;
use std::collections::HashMap;
use std::sync::Arc;
use thiserror::Error;
use tokio::sync::{broadcast, mpsc, oneshot, watch, RwLock};

/// An event plus an optional channel to report whether it was accepted
#[derive(Debug)]
pub struct Command {
    pub event: Event,
    pub ack: Option<oneshot::Sender<Result<(), TransitionError>>>,
}

/// Notifications sent to subscribers
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum EngineEvent {
    Message {
        turn: Turn,
    },
    StateChange {
        step: Step,
        progress: u8,
        processing: bool,
        pending: PendingInput,
        last_error: Option<String>,
    },
    /// Presentation should focus the edit box
    Focus,
    ExchangeComplete,
    Error {
        message: String,
    },
}

/// Read-only view of an intake at one instant
#[derive(Debug, Clone, Serialize)]
pub struct IntakeSnapshot {
    pub intake_id: String,
    pub messages: Vec<Turn>,
    pub step: Step,
    pub total_steps: u32,
    pub progress: u8,
    pub processing: bool,
    pub pending: PendingInput,
    pub last_error: Option<String>,
}

#[allow(dead_code)] // Accessors for embedders and tests
impl IntakeSnapshot {
    pub fn messages(&self) -> &[Turn] {
        &self.messages
    }

    pub fn progress(&self) -> u8 {
        self.progress
    }

    pub fn current_step(&self) -> Step {
        self.step
    }

    pub fn is_processing(&self) -> bool {
        self.processing
    }

    pub fn pending_input(&self) -> &PendingInput {
        &self.pending
    }

    pub fn is_complete(&self) -> bool {
        self.step.is_completed()
    }

    pub fn total_steps(&self) -> u32 {
        self.total_steps
    }

    pub fn last_error(&self) -> Option<&str> {
        self.last_error.as_deref()
    }
}

#[derive(Debug, Error)]
pub enum DispatchError {
    #[error("intake engine has stopped")]
    Closed,
    #[error(transparent)]
    Rejected(#[from] TransitionError),
}

/// Handle to interact with a running intake
#[derive(Clone)]
pub struct IntakeHandle {
    intake_id: String,
    command_tx: mpsc::Sender<Command>,
    broadcast_tx: broadcast::Sender<EngineEvent>,
    snapshot_rx: watch::Receiver<IntakeSnapshot>,
}

impl IntakeHandle {
    pub fn intake_id(&self) -> &str {
        &self.intake_id
    }

    /// Send an event and wait until the engine has accepted or rejected it.
    ///
    /// This does not wait for any generation or capture the event starts.
    pub async fn dispatch(&self, event: Event) -> Result<(), DispatchError> {
        let (ack_tx, ack_rx) = oneshot::channel();
        self.command_tx
            .send(Command {
                event,
                ack: Some(ack_tx),
            })
            .await
            .map_err(|_| DispatchError::Closed)?;
        ack_rx.await.map_err(|_| DispatchError::Closed)??;
        Ok(())
    }
}

/// Typed shortcuts over [`IntakeHandle::dispatch`]
#[allow(dead_code)] // The HTTP layer dispatches events directly
impl IntakeHandle {
    pub async fn commit(&self, text: impl Into<String>) -> Result<(), DispatchError> {
        self.dispatch(Event::Commit { text: text.into() }).await
    }

    pub async fn submit_draft(&self) -> Result<(), DispatchError> {
        self.dispatch(Event::SubmitDraft).await
    }

    pub async fn start_capture(&self) -> Result<(), DispatchError> {
        self.dispatch(Event::StartCapture).await
    }

    pub async fn cancel_capture(&self) -> Result<(), DispatchError> {
        self.dispatch(Event::CancelCapture).await
    }

    pub async fn begin_edit(&self) -> Result<(), DispatchError> {
        self.dispatch(Event::BeginEdit).await
    }

    pub async fn update_text(&self, text: impl Into<String>) -> Result<(), DispatchError> {
        self.dispatch(Event::UpdateText { text: text.into() }).await
    }

    pub async fn end_edit(&self) -> Result<(), DispatchError> {
        self.dispatch(Event::EndEdit).await
    }

    pub async fn clear_draft(&self) -> Result<(), DispatchError> {
        self.dispatch(Event::ClearDraft).await
    }
}

impl IntakeHandle {
    /// Current state
    pub fn snapshot(&self) -> IntakeSnapshot {
        self.snapshot_rx.borrow().clone()
    }

    /// Receiver that can wait for snapshot changes
    #[allow(dead_code)] // Used by tests
    pub fn watch(&self) -> watch::Receiver<IntakeSnapshot> {
        self.snapshot_rx.clone()
    }

    pub fn subscribe(&self) -> broadcast::Receiver<EngineEvent> {
        self.broadcast_tx.subscribe()
    }
}

/// Start an engine task for a new intake and return its handle.
///
/// Must be called from within a tokio runtime.
pub fn start_intake<G, C>(
    intake_id: impl Into<String>,
    config: &SessionConfig,
    generator: G,
    capture: C,
) -> IntakeHandle
where
    G: ResponseGenerator + 'static,
    C: InputCaptureSource + 'static,
{
    let intake_id = intake_id.into();
    let context = IntakeContext::new(intake_id.clone(), config.total_steps);

    let (command_tx, command_rx) = mpsc::channel(32);
    let (broadcast_tx, _) = broadcast::channel(128);

    let engine = DialogueEngine::new(
        context,
        &config.opening_message,
        generator,
        capture,
        command_rx,
        command_tx.downgrade(),
        broadcast_tx.clone(),
    );
    let snapshot_rx = engine.snapshot_receiver();

    let id = intake_id.clone();
    tokio::spawn(async move {
        engine.run().await;
        tracing::info!(intake_id = %id, "Intake engine finished");
    });

    IntakeHandle {
        intake_id,
        command_tx,
        broadcast_tx,
        snapshot_rx,
    }
}

#[derive(Debug, Error)]
pub enum SessionError {
    #[error("session limit of {0} reached")]
    Full(usize),
}

/// Manager for all intake sessions.
///
/// The manager's handle is what keeps an engine running; removing a session
/// stops its engine once callers drop their clones.
pub struct SessionManager {
    script: IntakeScript,
    generator: Arc<dyn ResponseGenerator>,
    capture: Arc<dyn InputCaptureSource>,
    max_sessions: usize,
    sessions: RwLock<HashMap<String, IntakeHandle>>,
}

impl SessionManager {
    pub fn new(
        script: IntakeScript,
        generator: Arc<dyn ResponseGenerator>,
        capture: Arc<dyn InputCaptureSource>,
    ) -> Self {
        Self {
            script,
            generator,
            capture,
            max_sessions: DEFAULT_MAX_SESSIONS,
            sessions: RwLock::new(HashMap::new()),
        }
    }

    #[must_use]
    pub fn with_max_sessions(mut self, max_sessions: usize) -> Self {
        self.max_sessions = max_sessions;
        self
    }

    /// Start a new intake with a fresh id.
    ///
    /// At the limit, completed sessions are evicted first; if none are
    /// complete the new session is refused.
    pub async fn create(&self) -> Result<IntakeHandle, SessionError> {
        let mut sessions = self.sessions.write().await;
        if sessions.len() >= self.max_sessions {
            let before = sessions.len();
            sessions.retain(|_, handle| !handle.snapshot().is_complete());
            tracing::info!(
                evicted = before - sessions.len(),
                remaining = sessions.len(),
                "Evicted completed intakes"
            );
            if sessions.len() >= self.max_sessions {
                tracing::warn!(max_sessions = self.max_sessions, "Intake limit reached");
                return Err(SessionError::Full(self.max_sessions));
            }
        }

        let intake_id = uuid::Uuid::new_v4().to_string();
        let handle = start_intake(
            intake_id.clone(),
            &self.script.session_config(),
            self.generator.clone(),
            self.capture.clone(),
        );
        tracing::info!(
            intake_id = %intake_id,
            total_steps = self.script.total_steps(),
            "Intake created"
        );
        sessions.insert(intake_id, handle.clone());
        Ok(handle)
    }

    pub async fn get(&self, intake_id: &str) -> Option<IntakeHandle> {
        self.sessions.read().await.get(intake_id).cloned()
    }

    /// Forget a session. Returns false if it was not known.
    pub async fn remove(&self, intake_id: &str) -> bool {
        let removed = self.sessions.write().await.remove(intake_id).is_some();
        if removed {
            tracing::info!(intake_id = %intake_id, "Intake removed");
        }
        removed
    }

    #[allow(dead_code)] // Used by tests
    pub async fn len(&self) -> usize {
        self.sessions.read().await.len()
    }
}
