//! The conversational assistant service behind a narrow async trait.
//!
//! The engine only needs thread and run CRUD. [`OpenAiAssistant`] implements it over the
//! OpenAI Assistants v2 HTTP API; tests use the scripted [`mock::MockAssistant`].

#[cfg(test)]
pub mod mock;
mod openai;

pub use openai::OpenAiAssistant;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::errors::AssistantError;
use crate::message::Role;

/// Status of a run as reported by the service.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RunStatus {
    Queued,
    InProgress,
    RequiresAction,
    Cancelling,
    Completed,
    Failed,
    Cancelled,
    Expired,
    Incomplete,
    /// Anything this client does not know about; polled like a pending status.
    #[serde(other)]
    Unknown,
}

impl RunStatus {
    /// Whether the run has stopped and will not change again.
    pub fn is_terminal(self) -> bool {
        matches!(
            self,
            RunStatus::Completed
                | RunStatus::Failed
                | RunStatus::Cancelled
                | RunStatus::Expired
                | RunStatus::Incomplete
        )
    }

    pub fn as_str(self) -> &'static str {
        match self {
            RunStatus::Queued => "queued",
            RunStatus::InProgress => "in_progress",
            RunStatus::RequiresAction => "requires_action",
            RunStatus::Cancelling => "cancelling",
            RunStatus::Completed => "completed",
            RunStatus::Failed => "failed",
            RunStatus::Cancelled => "cancelled",
            RunStatus::Expired => "expired",
            RunStatus::Incomplete => "incomplete",
            RunStatus::Unknown => "unknown",
        }
    }
}

impl std::fmt::Display for RunStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error details the service attaches to a failed run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunFailure {
    #[serde(default)]
    pub code: Option<String>,
    #[serde(default)]
    pub message: String,
}

/// One run on a conversation thread.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Run {
    pub id: String,
    pub status: RunStatus,
    #[serde(default)]
    pub last_error: Option<RunFailure>,
}

impl Run {
    /// Human readable reason for a non-successful terminal status.
    pub fn failure_reason(&self) -> String {
        match &self.last_error {
            Some(failure) if !failure.message.is_empty() => match &failure.code {
                Some(code) => format!("{}: {}", code, failure.message),
                None => failure.message.clone(),
            },
            _ => format!("run ended with status {}", self.status),
        }
    }
}

/// A message as stored on the service's thread.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ThreadMessage {
    pub id: String,
    pub role: Role,
    pub content: String,
    /// Run that produced the message; `None` for messages appended by the client.
    pub run_id: Option<String>,
}

/// Thread and run operations the engine needs from the assistant service.
#[async_trait]
pub trait ChatAssistant: Send + Sync {
    /// Create a new conversation thread and return its id.
    async fn create_conversation(&self) -> Result<String, AssistantError>;

    /// Append a message to a thread and return the new message id.
    async fn append_message(
        &self,
        conversation_id: &str,
        role: Role,
        content: &str,
    ) -> Result<String, AssistantError>;

    /// Start a run on a thread with the given instructions.
    async fn start_run(&self, conversation_id: &str, instructions: &str)
    -> Result<Run, AssistantError>;

    async fn get_run(&self, conversation_id: &str, run_id: &str) -> Result<Run, AssistantError>;

    /// Request cancellation. The run usually reports `cancelling` for a while afterwards.
    async fn cancel_run(&self, conversation_id: &str, run_id: &str)
    -> Result<Run, AssistantError>;

    /// Recent runs on a thread, newest first.
    async fn list_runs(&self, conversation_id: &str) -> Result<Vec<Run>, AssistantError>;

    /// Messages on a thread, newest first.
    async fn list_messages(&self, conversation_id: &str)
    -> Result<Vec<ThreadMessage>, AssistantError>;
}

/// Concatenate the assistant messages a run produced, oldest first.
pub fn run_output(messages: &[ThreadMessage], run_id: &str) -> String {
    let mut parts: Vec<&str> = messages
        .iter()
        .filter(|m| m.role == Role::Assistant && m.run_id.as_deref() == Some(run_id))
        .map(|m| m.content.as_str())
        .collect();
    parts.reverse();
    parts.join("\n\n")
}
