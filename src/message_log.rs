//! Append-only transcript of an intake session

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Who authored a turn
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    Subject,
    Assistant,
}

/// One exchanged message. Immutable once appended.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Turn {
    pub role: Role,
    pub content: String,
    pub created_at: DateTime<Utc>,
}

impl Turn {
    pub fn subject(content: impl Into<String>) -> Self {
        Self::new(Role::Subject, content)
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self::new(Role::Assistant, content)
    }

    fn new(role: Role, content: impl Into<String>) -> Self {
        Self {
            role,
            content: content.into(),
            created_at: Utc::now(),
        }
    }
}

/// Ordered record of turns. Insertion order is the transcript order.
#[derive(Debug, Clone, Default, Serialize)]
pub struct MessageLog {
    turns: Vec<Turn>,
}

impl MessageLog {
    /// Start a log seeded with the assistant's opening message
    pub fn with_opening(opening_message: impl Into<String>) -> Self {
        Self {
            turns: vec![Turn::assistant(opening_message)],
        }
    }

    pub fn append(&mut self, turn: Turn) {
        self.turns.push(turn);
    }

    pub fn turns(&self) -> &[Turn] {
        &self.turns
    }

    pub fn len(&self) -> usize {
        self.turns.len()
    }

    pub fn last(&self) -> Option<&Turn> {
        self.turns.last()
    }
}
