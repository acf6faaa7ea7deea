//! Deterministic generator driven by a fixed prompt table

use super::{GenerationError, Reply, ResponseGenerator};
use crate::config::IntakeScript;
use crate::progress::Step;
use async_trait::async_trait;
use std::time::Duration;

/// Looks up the reply by step.
///
/// Step `k < N` gets prompt `k`; step `N` and the completed state get the
/// closing message. An optional delay stands in for backend latency.
#[derive(Debug, Clone)]
pub struct ScriptedGenerator {
    prompts: Vec<String>,
    closing_message: String,
    delay: Duration,
}

impl ScriptedGenerator {
    pub fn new(prompts: Vec<String>, closing_message: impl Into<String>) -> Self {
        Self {
            prompts,
            closing_message: closing_message.into(),
            delay: Duration::ZERO,
        }
    }

    pub fn from_script(script: &IntakeScript) -> Self {
        Self::new(script.prompts.clone(), script.closing_message.clone())
    }

    #[must_use]
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    pub fn total_steps(&self) -> u32 {
        u32::try_from(self.prompts.len() + 1).unwrap_or(u32::MAX)
    }

    fn reply_for(&self, step: Step) -> Result<Reply, GenerationError> {
        let total = self.total_steps();
        let next_step = step.successor(total);
        match step {
            Step::Active(n) if n == 0 || n > total => Err(GenerationError::invalid_request(
                format!("step {n} is outside 1..={total}"),
            )),
            Step::Active(n) if n < total => {
                let index = usize::try_from(n - 1).unwrap_or(usize::MAX);
                self.prompts
                    .get(index)
                    .map(|prompt| Reply::new(prompt.clone(), next_step))
                    .ok_or_else(|| GenerationError::invalid_request(format!("no prompt for step {n}")))
            }
            Step::Active(_) | Step::Completed => {
                Ok(Reply::new(self.closing_message.clone(), next_step))
            }
        }
    }
}

#[async_trait]
impl ResponseGenerator for ScriptedGenerator {
    async fn generate(&self, step: Step, _subject_text: &str) -> Result<Reply, GenerationError> {
        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }
        self.reply_for(step)
    }
}
