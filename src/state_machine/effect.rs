//! Effects produced by state transitions

use crate::message_log::Role;
use crate::progress::Step;

/// Effects to be executed after a state transition, in order
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Effect {
    /// Append a turn to the message log
    AppendTurn { role: Role, content: String },

    /// Publish the new state to observers
    PublishState,

    /// Ask the generator for a reply (spawns as background task)
    RequestReply { step: Step, text: String },

    /// Start the capture source (spawns as background task)
    StartCapture { seq: u64, step: Step },

    /// Abort the running capture
    CancelCapture,

    /// Ask the presentation layer to focus the edit box
    RequestFocus,

    /// Surface a recoverable failure
    NotifyError { message: String },

    /// An exchange finished and the engine is ready for input
    NotifyExchangeComplete,
}

impl Effect {
    pub fn append_subject(content: impl Into<String>) -> Self {
        Effect::AppendTurn {
            role: Role::Subject,
            content: content.into(),
        }
    }

    pub fn append_assistant(content: impl Into<String>) -> Self {
        Effect::AppendTurn {
            role: Role::Assistant,
            content: content.into(),
        }
    }

    pub fn notify_error(message: impl Into<String>) -> Self {
        Effect::NotifyError {
            message: message.into(),
        }
    }
}
