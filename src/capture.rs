//! Input capture abstraction
//!
//! A capture source turns something the subject does (usually speaking)
//! into candidate response text. Recognition itself lives behind the trait.

mod scripted;

pub use scripted::ScriptedCapture;

use crate::progress::Step;
use async_trait::async_trait;
use std::sync::Arc;
use thiserror::Error;
use tokio_util::sync::CancellationToken;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CaptureError {
    #[error("capture source unavailable: {0}")]
    Unavailable(String),
    #[error("capture cancelled")]
    Cancelled,
    #[error("capture failed: {0}")]
    Failed(String),
}

/// Asynchronously yields subject text
#[async_trait]
pub trait InputCaptureSource: Send + Sync {
    /// Capture one response for `step`.
    ///
    /// Must resolve promptly with [`CaptureError::Cancelled`] once `cancel`
    /// fires.
    async fn capture(&self, step: Step, cancel: CancellationToken) -> Result<String, CaptureError>;
}

#[async_trait]
impl<T: InputCaptureSource + ?Sized> InputCaptureSource for Arc<T> {
    async fn capture(&self, step: Step, cancel: CancellationToken) -> Result<String, CaptureError> {
        (**self).capture(step, cancel).await
    }
}
