//! API request and response types

use crate::runtime::IntakeSnapshot;
use serde::{Deserialize, Serialize};

/// Request to commit text, or the pending draft when `text` is absent
#[derive(Debug, Default, Deserialize)]
pub struct CommitRequest {
    #[serde(default)]
    pub text: Option<String>,
}

/// Request to replace the draft text
#[derive(Debug, Deserialize)]
pub struct DraftTextRequest {
    pub text: String,
}

/// Response with a session snapshot
#[derive(Debug, Serialize)]
pub struct IntakeResponse {
    pub intake: IntakeSnapshot,
}

/// Response for user actions.
///
/// `accepted` is false when the engine ignored the input, for example a
/// commit while a reply is pending.
#[derive(Debug, Serialize)]
pub struct ActionResponse {
    pub accepted: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
}

impl ActionResponse {
    pub fn accepted() -> Self {
        Self {
            accepted: true,
            reason: None,
        }
    }

    pub fn rejected(reason: impl Into<String>) -> Self {
        Self {
            accepted: false,
            reason: Some(reason.into()),
        }
    }
}

/// Error response
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
}

impl ErrorResponse {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            error: message.into(),
        }
    }
}
