//! Simulated speech recognition

use super::{CaptureError, InputCaptureSource};
use crate::progress::Step;
use async_trait::async_trait;
use std::time::Duration;
use tokio_util::sync::CancellationToken;

/// Yields a canned answer per step after a fixed listening delay
#[derive(Debug, Clone)]
pub struct ScriptedCapture {
    samples: Vec<String>,
    delay: Duration,
}

impl ScriptedCapture {
    pub fn new(samples: Vec<String>, delay: Duration) -> Self {
        Self { samples, delay }
    }

    fn sample_for(&self, step: Step) -> String {
        match step {
            Step::Active(n) => usize::try_from(n)
                .ok()
                .and_then(|n| n.checked_sub(1))
                .and_then(|index| self.samples.get(index))
                .cloned()
                .unwrap_or_default(),
            Step::Completed => String::new(),
        }
    }
}

#[async_trait]
impl InputCaptureSource for ScriptedCapture {
    async fn capture(&self, step: Step, cancel: CancellationToken) -> Result<String, CaptureError> {
        tokio::select! {
            () = tokio::time::sleep(self.delay) => Ok(self.sample_for(step)),
            () = cancel.cancelled() => Err(CaptureError::Cancelled),
        }
    }
}
