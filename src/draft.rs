//! The subject's pending response before it is committed
//!
//! Exactly one draft exists per session. Every operation either applies its
//! transition or returns a [`DraftError`] leaving the draft untouched.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Where the draft text currently stands
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DraftSource {
    #[default]
    None,
    /// Capture in flight; `seq` identifies which capture may deliver
    Capturing { seq: u64 },
    Captured,
    Editing,
}

/// Pending input of the subject
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct PendingInput {
    pub text: String,
    pub source: DraftSource,
    /// Sequence number of the most recently started capture
    #[serde(skip)]
    last_capture_seq: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DraftError {
    #[error("a capture is already in progress")]
    CaptureActive,
    #[error("draft already holds a response; clear it before capturing")]
    DraftNotEmpty,
    #[error("no capture is in progress")]
    NotCapturing,
    #[error("capture result {got} does not match the active capture")]
    StaleCapture { got: u64 },
    #[error("nothing to edit")]
    NothingToEdit,
    #[error("not editing")]
    NotEditing,
}

impl PendingInput {
    pub fn is_capturing(&self) -> bool {
        matches!(self.source, DraftSource::Capturing { .. })
    }

    /// Draft text counts as content only if it has non-whitespace characters
    pub fn has_content(&self) -> bool {
        !self.text.trim().is_empty()
    }

    /// Begin a capture. Returns the sequence number the result must carry.
    pub fn start_capture(&mut self) -> Result<u64, DraftError> {
        match self.source {
            DraftSource::None => {
                self.last_capture_seq += 1;
                let seq = self.last_capture_seq;
                self.text.clear();
                self.source = DraftSource::Capturing { seq };
                Ok(seq)
            }
            DraftSource::Capturing { .. } => Err(DraftError::CaptureActive),
            DraftSource::Captured | DraftSource::Editing => Err(DraftError::DraftNotEmpty),
        }
    }

    /// Deliver captured text for capture `seq`
    pub fn capture_result(&mut self, seq: u64, text: String) -> Result<(), DraftError> {
        match self.source {
            DraftSource::Capturing { seq: active } if active == seq => {
                if text.trim().is_empty() {
                    self.clear();
                } else {
                    self.text = text;
                    self.source = DraftSource::Captured;
                }
                Ok(())
            }
            DraftSource::Capturing { .. } => Err(DraftError::StaleCapture { got: seq }),
            _ => Err(DraftError::NotCapturing),
        }
    }

    /// Capture `seq` failed; the draft returns to empty
    pub fn capture_failed(&mut self, seq: u64) -> Result<(), DraftError> {
        match self.source {
            DraftSource::Capturing { seq: active } if active == seq => {
                self.clear();
                Ok(())
            }
            DraftSource::Capturing { .. } => Err(DraftError::StaleCapture { got: seq }),
            _ => Err(DraftError::NotCapturing),
        }
    }

    /// Abandon the active capture, discarding partial text
    pub fn cancel_capture(&mut self) -> Result<(), DraftError> {
        if self.is_capturing() {
            self.clear();
            Ok(())
        } else {
            Err(DraftError::NotCapturing)
        }
    }

    pub fn begin_edit(&mut self) -> Result<(), DraftError> {
        match self.source {
            DraftSource::Captured => {
                self.source = DraftSource::Editing;
                Ok(())
            }
            DraftSource::Capturing { .. } => Err(DraftError::CaptureActive),
            DraftSource::None | DraftSource::Editing => Err(DraftError::NothingToEdit),
        }
    }

    /// Replace the text verbatim.
    ///
    /// While editing the source stays `editing`. Outside of editing this is
    /// direct entry: non-empty text settles as `captured`, empty text as `none`.
    pub fn update_text(&mut self, text: String) -> Result<(), DraftError> {
        match self.source {
            DraftSource::Capturing { .. } => Err(DraftError::CaptureActive),
            DraftSource::Editing => {
                self.text = text;
                Ok(())
            }
            DraftSource::None | DraftSource::Captured => {
                self.source = if text.is_empty() {
                    DraftSource::None
                } else {
                    DraftSource::Captured
                };
                self.text = text;
                Ok(())
            }
        }
    }

    pub fn end_edit(&mut self) -> Result<(), DraftError> {
        if self.source == DraftSource::Editing {
            self.source = DraftSource::Captured;
            Ok(())
        } else {
            Err(DraftError::NotEditing)
        }
    }

    /// Reset to `{ text: "", source: none }`
    pub fn clear(&mut self) {
        self.text.clear();
        self.source = DraftSource::None;
    }
}
