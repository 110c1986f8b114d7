use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Who produced a chat turn
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Speaker {
    User,
    Assistant,
}

/// One committed line of the conversation. Turns are append-only: never
/// mutated and never removed for the lifetime of the view.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatTurn {
    pub text: String,
    pub speaker: Speaker,
    pub occurred_at: DateTime<Utc>,
}

impl ChatTurn {
    pub fn now(speaker: Speaker, text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            speaker,
            occurred_at: Utc::now(),
        }
    }
}
