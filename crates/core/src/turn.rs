//! Conversation turns: the unit of per-contact history.

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

/// Wire format of every timestamp the relay persists.
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Who produced a turn.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TurnRole {
    User,
    Assistant,
}

impl std::fmt::Display for TurnRole {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::User => write!(f, "User"),
            Self::Assistant => write!(f, "Assistant"),
        }
    }
}

/// One message in a contact's conversation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConversationTurn {
    pub role: TurnRole,
    pub text: String,
    pub speaker_name: String,
    /// Gateway message type of the original message (`chat`, `ptt`, ...)
    pub kind: String,
    pub timestamp: NaiveDateTime,
}

impl ConversationTurn {
    pub fn user(
        text: impl Into<String>,
        speaker_name: impl Into<String>,
        kind: impl Into<String>,
        timestamp: NaiveDateTime,
    ) -> Self {
        Self {
            role: TurnRole::User,
            text: text.into(),
            speaker_name: speaker_name.into(),
            kind: kind.into(),
            timestamp,
        }
    }

    /// Assistant turns are always plain chat.
    pub fn assistant(
        text: impl Into<String>,
        speaker_name: impl Into<String>,
        timestamp: NaiveDateTime,
    ) -> Self {
        Self {
            role: TurnRole::Assistant,
            text: text.into(),
            speaker_name: speaker_name.into(),
            kind: "chat".into(),
            timestamp,
        }
    }

    /// Render as a single context line for the agent directive.
    pub fn context_line(&self) -> String {
        format!(
            "{} ({}, {}, {}): {}",
            self.role,
            self.speaker_name,
            self.timestamp.format(TIMESTAMP_FORMAT),
            self.kind,
            self.text
        )
    }
}
