//! Intake state types

use crate::draft::PendingInput;
use crate::generator::GenerationErrorKind;
use crate::progress::{progress, Step};
use serde::{Deserialize, Serialize};

/// Whether a reply is being generated, and how the last one ended
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Phase {
    /// Ready for a commit
    #[default]
    Ready,

    /// Generator call in flight; commits are rejected
    Generating,

    /// Last generation failed. Ready for a commit that retries the same step.
    Failed {
        message: String,
        kind: GenerationErrorKind,
    },
}

/// Everything the transition function reads and writes
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IntakeState {
    pub step: Step,
    pub phase: Phase,
    pub draft: PendingInput,
}

impl Default for IntakeState {
    fn default() -> Self {
        Self {
            step: Step::FIRST,
            phase: Phase::Ready,
            draft: PendingInput::default(),
        }
    }
}

impl IntakeState {
    /// The processing flag
    pub fn is_processing(&self) -> bool {
        matches!(self.phase, Phase::Generating)
    }

    pub fn progress(&self, total_steps: u32) -> u8 {
        progress(self.step, total_steps)
    }

    pub fn last_error(&self) -> Option<&str> {
        match &self.phase {
            Phase::Failed { message, .. } => Some(message),
            Phase::Ready | Phase::Generating => None,
        }
    }
}

/// Immutable per-session configuration
#[derive(Debug, Clone)]
pub struct IntakeContext {
    pub intake_id: String,
    pub total_steps: u32,
}

impl IntakeContext {
    pub fn new(intake_id: impl Into<String>, total_steps: u32) -> Self {
        Self {
            intake_id: intake_id.into(),
            total_steps,
        }
    }
}
