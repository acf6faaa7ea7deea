//! Dialogue engine executor

use super::{Command, EngineEvent, IntakeSnapshot};
use crate::capture::InputCaptureSource;
use crate::generator::ResponseGenerator;
use crate::message_log::{MessageLog, Role, Turn};
use crate::state_machine::{transition, Effect, Event, IntakeContext, IntakeState, TransitionError};
use std::sync::Arc;
use tokio::sync::{broadcast, mpsc, watch};
use tokio_util::sync::CancellationToken;

/// Owns one intake's state and message log and executes effects.
///
/// Generator and capture calls run on spawned tasks that report back through
/// the command channel, so all state changes happen on the engine task.
pub struct DialogueEngine<G, C>
where
    G: ResponseGenerator + 'static,
    C: InputCaptureSource + 'static,
{
    context: IntakeContext,
    state: IntakeState,
    log: MessageLog,
    generator: Arc<G>,
    capture: Arc<C>,
    command_rx: mpsc::Receiver<Command>,
    /// Weak so the engine stops once every handle is dropped
    command_tx: mpsc::WeakSender<Command>,
    broadcast_tx: broadcast::Sender<EngineEvent>,
    snapshot_tx: watch::Sender<IntakeSnapshot>,
    /// Token to cancel the running capture
    capture_cancel_token: Option<CancellationToken>,
}

impl<G, C> DialogueEngine<G, C>
where
    G: ResponseGenerator + 'static,
    C: InputCaptureSource + 'static,
{
    pub fn new(
        context: IntakeContext,
        opening_message: &str,
        generator: G,
        capture: C,
        command_rx: mpsc::Receiver<Command>,
        command_tx: mpsc::WeakSender<Command>,
        broadcast_tx: broadcast::Sender<EngineEvent>,
    ) -> Self {
        let state = IntakeState::default();
        let log = MessageLog::with_opening(opening_message);
        let snapshot = build_snapshot(&context, &state, &log);
        let (snapshot_tx, _) = watch::channel(snapshot);

        Self {
            context,
            state,
            log,
            generator: Arc::new(generator),
            capture: Arc::new(capture),
            command_rx,
            command_tx,
            broadcast_tx,
            snapshot_tx,
            capture_cancel_token: None,
        }
    }

    pub fn snapshot_receiver(&self) -> watch::Receiver<IntakeSnapshot> {
        self.snapshot_tx.subscribe()
    }

    pub async fn run(mut self) {
        tracing::info!(intake_id = %self.context.intake_id, "Starting intake engine");

        while let Some(Command { event, ack }) = self.command_rx.recv().await {
            // Results from background tasks carry no ack; a late one after a
            // cancel is expected and only logged at debug
            let outcome = self.process_event(event, ack.is_none());
            if let Some(ack) = ack {
                let _ = ack.send(outcome);
            }
        }

        if let Some(token) = self.capture_cancel_token.take() {
            token.cancel();
        }
        tracing::info!(intake_id = %self.context.intake_id, "Intake engine stopped");
    }

    fn process_event(&mut self, event: Event, internal: bool) -> Result<(), TransitionError> {
        let event_name = event.name();

        let result = match transition(&self.state, &self.context, event) {
            Ok(r) => r,
            Err(e) => {
                if e.is_silent() || internal {
                    tracing::debug!(
                        intake_id = %self.context.intake_id,
                        event = event_name,
                        reason = %e,
                        "Input ignored"
                    );
                } else {
                    tracing::warn!(
                        intake_id = %self.context.intake_id,
                        event = event_name,
                        reason = %e,
                        "Event rejected"
                    );
                }
                return Err(e);
            }
        };

        self.state = result.new_state;
        for effect in result.effects {
            self.execute_effect(effect);
        }
        Ok(())
    }

    fn execute_effect(&mut self, effect: Effect) {
        match effect {
            Effect::AppendTurn { role, content } => {
                let turn = match role {
                    Role::Subject => Turn::subject(content),
                    Role::Assistant => Turn::assistant(content),
                };
                self.log.append(turn.clone());
                let _ = self.broadcast_tx.send(EngineEvent::Message { turn });
            }

            Effect::PublishState => {
                let snapshot = build_snapshot(&self.context, &self.state, &self.log);
                let _ = self.broadcast_tx.send(EngineEvent::StateChange {
                    step: snapshot.step,
                    progress: snapshot.progress,
                    processing: snapshot.processing,
                    pending: snapshot.pending.clone(),
                    last_error: snapshot.last_error.clone(),
                });
                self.snapshot_tx.send_replace(snapshot);
            }

            Effect::RequestReply { step, text } => {
                let generator = self.generator.clone();
                let command_tx = self.command_tx.clone();
                let intake_id = self.context.intake_id.clone();

                tokio::spawn(async move {
                    tracing::debug!(intake_id = %intake_id, %step, "Requesting reply (background)");
                    let event = match generator.generate(step, &text).await {
                        Ok(reply) => Event::ReplyReady { reply },
                        Err(error) => Event::ReplyFailed { error },
                    };
                    send_internal(&command_tx, event).await;
                });
            }

            Effect::StartCapture { seq, step } => {
                let cancel_token = CancellationToken::new();
                if let Some(previous) = self.capture_cancel_token.replace(cancel_token.clone()) {
                    previous.cancel();
                }

                let capture = self.capture.clone();
                let command_tx = self.command_tx.clone();
                let intake_id = self.context.intake_id.clone();

                tokio::spawn(async move {
                    tracing::debug!(intake_id = %intake_id, seq, "Capture started (background)");
                    let event = match capture.capture(step, cancel_token).await {
                        Ok(text) => Event::CaptureResult { seq, text },
                        Err(error) => Event::CaptureFailed { seq, error },
                    };
                    send_internal(&command_tx, event).await;
                });
            }

            Effect::CancelCapture => {
                if let Some(token) = self.capture_cancel_token.take() {
                    token.cancel();
                }
            }

            Effect::RequestFocus => {
                let _ = self.broadcast_tx.send(EngineEvent::Focus);
            }

            Effect::NotifyError { message } => {
                tracing::warn!(
                    intake_id = %self.context.intake_id,
                    step = %self.state.step,
                    error = %message,
                    "Recoverable failure"
                );
                let _ = self.broadcast_tx.send(EngineEvent::Error { message });
            }

            Effect::NotifyExchangeComplete => {
                tracing::info!(
                    intake_id = %self.context.intake_id,
                    step = %self.state.step,
                    turns = self.log.len(),
                    "Exchange complete"
                );
                let _ = self.broadcast_tx.send(EngineEvent::ExchangeComplete);
            }
        }
    }
}

/// Report a background result to the engine, if it is still running
async fn send_internal(command_tx: &mpsc::WeakSender<Command>, event: Event) {
    if let Some(tx) = command_tx.upgrade() {
        let _ = tx.send(Command { event, ack: None }).await;
    }
}

fn build_snapshot(context: &IntakeContext, state: &IntakeState, log: &MessageLog) -> IntakeSnapshot {
    IntakeSnapshot {
        intake_id: context.intake_id.clone(),
        messages: log.turns().to_vec(),
        step: state.step,
        total_steps: context.total_steps,
        progress: state.progress(context.total_steps),
        processing: state.is_processing(),
        pending: state.draft.clone(),
        last_error: state.last_error().map(str::to_string),
    }
}
