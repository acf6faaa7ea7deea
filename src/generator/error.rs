//! Response generation error types

use std::time::Duration;
use thiserror::Error;

/// Generator failure with classification
#[derive(Debug, Clone, Error)]
#[error("{message}")]
pub struct GenerationError {
    pub kind: GenerationErrorKind,
    pub message: String,
}

impl GenerationError {
    pub fn new(kind: GenerationErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }

    pub fn timeout(after: Duration) -> Self {
        Self::new(
            GenerationErrorKind::Timeout,
            format!("No reply within {}ms", after.as_millis()),
        )
    }

    pub fn unavailable(message: impl Into<String>) -> Self {
        Self::new(GenerationErrorKind::Unavailable, message)
    }

    pub fn invalid_reply(message: impl Into<String>) -> Self {
        Self::new(GenerationErrorKind::InvalidReply, message)
    }

    pub fn invalid_request(message: impl Into<String>) -> Self {
        Self::new(GenerationErrorKind::InvalidRequest, message)
    }
}

/// Error classification
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GenerationErrorKind {
    /// Deadline exceeded
    Timeout,
    /// Backend not reachable
    Unavailable,
    /// Reply violated the contract (blank text, illegal next step)
    InvalidReply,
    /// Generator cannot answer for the requested step
    InvalidRequest,
    Unknown,
}
