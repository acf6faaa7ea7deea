//! Pure state transition function
//!
//! Given the same state, context and event this always produces the same
//! result. All I/O happens in the runtime by executing the returned effects.

use super::{Effect, Event, IntakeContext, IntakeState, Phase};
use crate::capture::CaptureError;
use crate::draft::DraftError;
use crate::generator::{GenerationError, Reply};
use thiserror::Error;

/// Result of a state transition
#[derive(Debug)]
pub struct TransitionResult {
    pub new_state: IntakeState,
    pub effects: Vec<Effect>,
}

impl TransitionResult {
    pub fn new(state: IntakeState) -> Self {
        Self {
            new_state: state,
            effects: vec![],
        }
    }

    pub fn with_effect(mut self, effect: Effect) -> Self {
        self.effects.push(effect);
        self
    }
}

/// Reasons an event is rejected. The state is left unchanged.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TransitionError {
    #[error("A reply is being generated, cannot accept input")]
    Busy,
    #[error("Nothing to commit")]
    EmptyCommit,
    #[error("Cannot commit while capturing")]
    CaptureActive,
    #[error("No reply was requested")]
    UnexpectedReply,
    #[error(transparent)]
    Draft(#[from] DraftError),
}

impl TransitionError {
    /// Rejections the subject is not supposed to be able to trigger
    /// (the affordance is disabled); logged quietly by the runtime.
    pub fn is_silent(&self) -> bool {
        matches!(
            self,
            TransitionError::Busy | TransitionError::EmptyCommit | TransitionError::CaptureActive
        )
    }
}

pub fn transition(
    state: &IntakeState,
    context: &IntakeContext,
    event: Event,
) -> Result<TransitionResult, TransitionError> {
    match event {
        // ============================================================
        // Commit
        // ============================================================
        Event::Commit { text } => commit(state, text),
        Event::SubmitDraft => commit(state, state.draft.text.clone()),

        // ============================================================
        // Generator results
        // ============================================================
        Event::ReplyReady { reply } => {
            if !state.is_processing() {
                return Err(TransitionError::UnexpectedReply);
            }
            match validate_reply(state, context, &reply) {
                Ok(()) => {
                    // The next step starts from an empty draft
                    let was_capturing = state.draft.is_capturing();
                    let mut next = state.clone();
                    next.step = reply.next_step;
                    next.phase = Phase::Ready;
                    next.draft.clear();
                    let result = TransitionResult::new(next)
                        .with_effect(Effect::append_assistant(reply.content));
                    let result = if was_capturing {
                        result.with_effect(Effect::CancelCapture)
                    } else {
                        result
                    };
                    Ok(result
                        .with_effect(Effect::PublishState)
                        .with_effect(Effect::NotifyExchangeComplete))
                }
                Err(error) => Ok(generation_failed(state, error)),
            }
        }

        Event::ReplyFailed { error } => {
            if !state.is_processing() {
                return Err(TransitionError::UnexpectedReply);
            }
            Ok(generation_failed(state, error))
        }

        // ============================================================
        // Capture lifecycle
        // ============================================================
        Event::StartCapture => {
            if state.is_processing() {
                return Err(TransitionError::Busy);
            }
            let mut next = state.clone();
            let seq = next.draft.start_capture()?;
            let step = next.step;
            Ok(TransitionResult::new(next)
                .with_effect(Effect::PublishState)
                .with_effect(Effect::StartCapture { seq, step }))
        }

        Event::CaptureResult { seq, text } => {
            let mut next = state.clone();
            next.draft.capture_result(seq, text)?;
            Ok(TransitionResult::new(next).with_effect(Effect::PublishState))
        }

        Event::CaptureFailed { seq, error } => {
            let mut next = state.clone();
            next.draft.capture_failed(seq)?;
            let result = TransitionResult::new(next).with_effect(Effect::PublishState);
            Ok(match error {
                CaptureError::Cancelled => result,
                other => result.with_effect(Effect::notify_error(other.to_string())),
            })
        }

        Event::CancelCapture => {
            let mut next = state.clone();
            next.draft.cancel_capture()?;
            Ok(TransitionResult::new(next)
                .with_effect(Effect::CancelCapture)
                .with_effect(Effect::PublishState))
        }

        // ============================================================
        // Editing
        // ============================================================
        Event::BeginEdit => {
            let mut next = state.clone();
            next.draft.begin_edit()?;
            Ok(TransitionResult::new(next)
                .with_effect(Effect::PublishState)
                .with_effect(Effect::RequestFocus))
        }

        Event::UpdateText { text } => {
            let mut next = state.clone();
            next.draft.update_text(text)?;
            Ok(TransitionResult::new(next).with_effect(Effect::PublishState))
        }

        Event::EndEdit => {
            let mut next = state.clone();
            next.draft.end_edit()?;
            Ok(TransitionResult::new(next).with_effect(Effect::PublishState))
        }

        Event::ClearDraft => {
            let was_capturing = state.draft.is_capturing();
            let mut next = state.clone();
            next.draft.clear();
            let result = TransitionResult::new(next);
            let result = if was_capturing {
                result.with_effect(Effect::CancelCapture)
            } else {
                result
            };
            Ok(result.with_effect(Effect::PublishState))
        }
    }
}

// Ready/Failed + non-blank text -> Generating
fn commit(state: &IntakeState, text: String) -> Result<TransitionResult, TransitionError> {
    if state.is_processing() {
        return Err(TransitionError::Busy);
    }
    if text.trim().is_empty() {
        return Err(TransitionError::EmptyCommit);
    }
    if state.draft.is_capturing() {
        return Err(TransitionError::CaptureActive);
    }

    let mut next = state.clone();
    next.phase = Phase::Generating;
    next.draft.clear();
    let step = next.step;

    Ok(TransitionResult::new(next)
        .with_effect(Effect::append_subject(text.clone()))
        .with_effect(Effect::PublishState)
        .with_effect(Effect::RequestReply { step, text }))
}

// Generating -> Failed. The subject turn stays in the log and the step holds.
fn generation_failed(state: &IntakeState, error: GenerationError) -> TransitionResult {
    let mut next = state.clone();
    next.phase = Phase::Failed {
        message: error.message.clone(),
        kind: error.kind,
    };
    TransitionResult::new(next)
        .with_effect(Effect::PublishState)
        .with_effect(Effect::notify_error(error.message))
}

/// A reply may only move the step one notch forward and must carry text
fn validate_reply(
    state: &IntakeState,
    context: &IntakeContext,
    reply: &Reply,
) -> Result<(), GenerationError> {
    if reply.content.trim().is_empty() {
        return Err(GenerationError::invalid_reply("Generator returned an empty reply"));
    }
    let expected = state.step.successor(context.total_steps);
    if reply.next_step != expected {
        return Err(GenerationError::invalid_reply(format!(
            "Generator moved step {} to {}, expected {}",
            state.step, reply.next_step, expected
        )));
    }
    Ok(())
}
