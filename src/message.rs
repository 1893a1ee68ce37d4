//! Conversation messages as stored in the interview record.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::phase::Phase;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Assistant,
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Role::User => write!(f, "user"),
            Role::Assistant => write!(f, "assistant"),
        }
    }
}

/// What a stored message represents.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "type")]
pub enum MessageKind {
    /// A spoken turn from the user or the assistant.
    #[default]
    Text,
    /// Download affordance shown after a report was accepted.
    ReportReady { phase: Phase },
    /// Inline warning emitted by the engine, not by the assistant.
    Notice,
}

/// One entry of the conversation history.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Message {
    pub role: Role,
    pub content: String,
    pub timestamp: DateTime<Utc>,
    /// Phase active when this message was spoken.
    pub phase: Phase,
    #[serde(default)]
    pub kind: MessageKind,
}

impl Message {
    pub fn user(content: impl Into<String>, phase: Phase) -> Self {
        Self {
            role: Role::User,
            content: content.into(),
            timestamp: Utc::now(),
            phase,
            kind: MessageKind::Text,
        }
    }

    pub fn assistant(content: impl Into<String>, phase: Phase) -> Self {
        Self {
            role: Role::Assistant,
            content: content.into(),
            timestamp: Utc::now(),
            phase,
            kind: MessageKind::Text,
        }
    }

    pub fn report_ready(report_phase: Phase, phase: Phase) -> Self {
        Self {
            role: Role::Assistant,
            content: format!(
                "Your {} report is ready. Export it any time with `interviewer export`.",
                report_phase.title()
            ),
            timestamp: Utc::now(),
            phase,
            kind: MessageKind::ReportReady {
                phase: report_phase,
            },
        }
    }

    pub fn notice(content: impl Into<String>, phase: Phase) -> Self {
        Self {
            role: Role::Assistant,
            content: content.into(),
            timestamp: Utc::now(),
            phase,
            kind: MessageKind::Notice,
        }
    }

    /// Whether this message is part of the spoken conversation.
    pub fn is_spoken(&self) -> bool {
        self.kind == MessageKind::Text
    }
}
