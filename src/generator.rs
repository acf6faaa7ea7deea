//! Response generator abstraction
//!
//! The engine asks a generator for the assistant's next message and the
//! step to move to. Decorators add logging and a deadline on top of any
//! implementation.

mod error;
mod scripted;

pub use error::{GenerationError, GenerationErrorKind};
pub use scripted::ScriptedGenerator;

use crate::progress::Step;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::{Duration, Instant};

/// A generated assistant message
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Reply {
    pub content: String,
    pub next_step: Step,
}

impl Reply {
    pub fn new(content: impl Into<String>, next_step: Step) -> Self {
        Self {
            content: content.into(),
            next_step,
        }
    }
}

/// Produces the next assistant turn for a committed subject response
#[async_trait]
pub trait ResponseGenerator: Send + Sync {
    /// Generate the reply to `subject_text` given at `step`.
    ///
    /// Resolves once with a reply or an error; no partial results.
    async fn generate(&self, step: Step, subject_text: &str) -> Result<Reply, GenerationError>;
}

#[async_trait]
impl<T: ResponseGenerator + ?Sized> ResponseGenerator for Arc<T> {
    async fn generate(&self, step: Step, subject_text: &str) -> Result<Reply, GenerationError> {
        (**self).generate(step, subject_text).await
    }
}

/// Logging wrapper for generators
pub struct LoggingGenerator {
    inner: Arc<dyn ResponseGenerator>,
    name: String,
}

impl LoggingGenerator {
    pub fn new(inner: Arc<dyn ResponseGenerator>, name: impl Into<String>) -> Self {
        Self {
            inner,
            name: name.into(),
        }
    }
}

#[async_trait]
impl ResponseGenerator for LoggingGenerator {
    async fn generate(&self, step: Step, subject_text: &str) -> Result<Reply, GenerationError> {
        let start = Instant::now();
        let result = self.inner.generate(step, subject_text).await;
        let duration = start.elapsed();

        match &result {
            Ok(reply) => {
                tracing::info!(
                    generator = %self.name,
                    %step,
                    next_step = %reply.next_step,
                    duration_ms = %duration.as_millis(),
                    "Reply generated"
                );
            }
            Err(e) => {
                tracing::error!(
                    generator = %self.name,
                    %step,
                    duration_ms = %duration.as_millis(),
                    kind = ?e.kind,
                    error = %e.message,
                    "Reply generation failed"
                );
            }
        }

        result
    }
}

/// Fails a generation that does not resolve within `limit`
pub struct TimeoutGenerator {
    inner: Arc<dyn ResponseGenerator>,
    limit: Duration,
}

impl TimeoutGenerator {
    pub fn new(inner: Arc<dyn ResponseGenerator>, limit: Duration) -> Self {
        Self { inner, limit }
    }
}

#[async_trait]
impl ResponseGenerator for TimeoutGenerator {
    async fn generate(&self, step: Step, subject_text: &str) -> Result<Reply, GenerationError> {
        tokio::time::timeout(self.limit, self.inner.generate(step, subject_text))
            .await
            .unwrap_or_else(|_| Err(GenerationError::timeout(self.limit)))
    }
}
