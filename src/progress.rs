//! Step position and the progress projection derived from it
//!
//! Progress is never stored: it is recomputed from the step on every read.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Position in the fixed-length prompt sequence
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Step {
    /// 1-based index of the current prompt, in `1..=total_steps`
    Active(u32),
    /// All prompts answered
    Completed,
}

impl Step {
    pub const FIRST: Step = Step::Active(1);

    pub fn is_completed(self) -> bool {
        matches!(self, Step::Completed)
    }

    /// The only step the engine may move to from `self`
    pub fn successor(self, total_steps: u32) -> Step {
        match self {
            Step::Active(n) if n < total_steps => Step::Active(n + 1),
            Step::Active(_) | Step::Completed => Step::Completed,
        }
    }

    /// Numeric form; `completed` maps to `total_steps + 1`
    pub fn number(self, total_steps: u32) -> u32 {
        match self {
            Step::Active(n) => n,
            Step::Completed => total_steps + 1,
        }
    }
}

impl fmt::Display for Step {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Step::Active(n) => write!(f, "{n}"),
            Step::Completed => f.write_str("completed"),
        }
    }
}

/// Completion percentage for `step` out of `total_steps`.
///
/// `round((step - 1) / N * 100)` while active, capped at 99 so that 100 is
/// reported only once the flow is completed.
pub fn progress(step: Step, total_steps: u32) -> u8 {
    match step {
        Step::Completed => 100,
        Step::Active(_) if total_steps == 0 => 0,
        Step::Active(n) => {
            let done = u64::from(n.clamp(1, total_steps) - 1);
            let total = u64::from(total_steps);
            // round half up in integer arithmetic
            let percent = (done * 200 + total) / (2 * total);
            u8::try_from(percent.min(99)).unwrap_or(99)
        }
    }
}
