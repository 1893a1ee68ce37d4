//! Typed error hierarchy for the interview engine.
//!
//! Four enums cover the layers of the engine:
//! - `AssistantError`: transport and payload failures talking to the assistant service
//! - `RunError`: a single run that did not reach `completed`
//! - `StoreError`: document store failures
//! - `EngineError`: the user-facing taxonomy surfaced by the progression controller

use thiserror::Error;

/// Errors from one call to the assistant service.
#[derive(Debug, Clone, Error)]
pub enum AssistantError {
    #[error("Network error talking to assistant service: {0}")]
    Network(String),

    #[error("Assistant service error ({}): {message}", status_label(.status))]
    Service {
        status: Option<u16>,
        message: String,
    },

    #[error("Malformed assistant payload: {0}")]
    Malformed(String),
}

fn status_label(status: &Option<u16>) -> String {
    match status {
        Some(code) => format!("HTTP {}", code),
        None => "no status".to_string(),
    }
}

impl AssistantError {
    /// Whether a retry of the same call has a reasonable chance of succeeding.
    pub fn is_transient(&self) -> bool {
        match self {
            AssistantError::Network(_) => true,
            AssistantError::Service { status, .. } => match status {
                None => true,
                Some(code) => *code == 429 || *code >= 500,
            },
            AssistantError::Malformed(_) => false,
        }
    }
}

impl From<reqwest::Error> for AssistantError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_decode() {
            AssistantError::Malformed(err.to_string())
        } else if let Some(status) = err.status() {
            AssistantError::Service {
                status: Some(status.as_u16()),
                message: err.to_string(),
            }
        } else {
            AssistantError::Network(err.to_string())
        }
    }
}

/// Errors from driving a run to a terminal status.
#[derive(Debug, Clone, Error)]
pub enum RunError {
    #[error("Run {run_id} failed: {reason}")]
    Failed { run_id: String, reason: String },

    #[error("Run {run_id} was cancelled: {reason}")]
    Cancelled { run_id: String, reason: String },

    #[error("Run {run_id} did not finish after {attempts} polls")]
    TimedOut { run_id: String, attempts: u32 },

    #[error(transparent)]
    Transport(#[from] AssistantError),
}

/// Errors from the document store.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Interview {id} not found")]
    NotFound { id: String },

    #[error("Document store I/O error at {path}: {source}")]
    Io {
        path: std::path::PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to (de)serialize interview {id}: {source}")]
    Serde {
        id: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("Failed to encode field '{field}': {source}")]
    Encode {
        field: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("Invalid field path '{0}'")]
    InvalidPath(String),
}

/// The engine-level taxonomy shown to the presentation layer.
#[derive(Debug, Error)]
pub enum EngineError {
    #[error("Connection problem: {0}")]
    Network(String),

    #[error("The assistant could not complete the request: {0}")]
    Service(String),

    #[error("Interview session is invalid: {0}")]
    Validation(String),

    #[error("The assistant took too long to respond (run {run_id}, {attempts} polls)")]
    Timeout { run_id: String, attempts: u32 },

    #[error("Could not save interview: {0}")]
    Storage(#[source] StoreError),

    #[error("A reply is already being processed for conversation {0}")]
    Busy(String),
}

impl EngineError {
    /// Network, service and timeout failures are retried end-to-end by the controller.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            EngineError::Network(_) | EngineError::Service(_) | EngineError::Timeout { .. }
        )
    }

    /// Validation failures mean the session must be abandoned for a new interview.
    pub fn requires_new_interview(&self) -> bool {
        matches!(self, EngineError::Validation(_))
    }
}

impl From<AssistantError> for EngineError {
    fn from(err: AssistantError) -> Self {
        match err {
            AssistantError::Network(msg) => EngineError::Network(msg),
            other => EngineError::Service(other.to_string()),
        }
    }
}

impl From<RunError> for EngineError {
    fn from(err: RunError) -> Self {
        match err {
            RunError::TimedOut { run_id, attempts } => EngineError::Timeout { run_id, attempts },
            RunError::Transport(inner) => inner.into(),
            other => EngineError::Service(other.to_string()),
        }
    }
}

impl From<StoreError> for EngineError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::NotFound { id } => {
                EngineError::Validation(format!("interview {} does not exist", id))
            }
            other => EngineError::Storage(other),
        }
    }
}
