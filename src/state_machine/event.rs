//! Events that can occur during an intake

use crate::capture::CaptureError;
use crate::generator::{GenerationError, Reply};

/// Events that trigger state transitions
#[derive(Debug, Clone)]
pub enum Event {
    // Subject events
    Commit {
        text: String,
    },
    /// Commit whatever the draft currently holds
    SubmitDraft,
    StartCapture,
    CancelCapture,
    BeginEdit,
    UpdateText {
        text: String,
    },
    /// Blur or confirm of the edit box
    EndEdit,
    ClearDraft,

    // Capture source events
    CaptureResult {
        seq: u64,
        text: String,
    },
    CaptureFailed {
        seq: u64,
        error: CaptureError,
    },

    // Generator events
    ReplyReady {
        reply: Reply,
    },
    ReplyFailed {
        error: GenerationError,
    },
}

impl Event {
    /// Short name for logging
    pub fn name(&self) -> &'static str {
        match self {
            Event::Commit { .. } => "commit",
            Event::SubmitDraft => "submit_draft",
            Event::StartCapture => "start_capture",
            Event::CancelCapture => "cancel_capture",
            Event::BeginEdit => "begin_edit",
            Event::UpdateText { .. } => "update_text",
            Event::EndEdit => "end_edit",
            Event::ClearDraft => "clear_draft",
            Event::CaptureResult { .. } => "capture_result",
            Event::CaptureFailed { .. } => "capture_failed",
            Event::ReplyReady { .. } => "reply_ready",
            Event::ReplyFailed { .. } => "reply_failed",
        }
    }
}
