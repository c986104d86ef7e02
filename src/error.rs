//! Error types shared across the explanation pipeline.
//!
//! `ExplainError` is the only failure the orchestrator ever sees; backend
//! specific errors (local model, cloud model) convert into it at the
//! gateway boundary.

use std::time::Duration;
use thiserror::Error;

/// A failed explanation attempt.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ExplainError {
    /// No request could be constructed from what was shared.
    #[error("No input found.")]
    EmptyInput,
    /// The on-device model is not ready. Recovered by the gateway.
    #[error("on-device model unavailable")]
    Unavailable,
    /// The backend answered but produced nothing usable.
    #[error("{0}")]
    GenerationFailed(String),
    /// Network or model-service failure; carries the upstream message.
    #[error("{0}")]
    Transport(String),
    #[error("request timed out after {}s", .0.as_secs())]
    Timeout(Duration),
}

impl ExplainError {
    /// Text shown in the error state, next to the retry affordance.
    pub fn user_message(&self) -> String {
        match self {
            ExplainError::EmptyInput => self.to_string(),
            other => format!("Failed: {}", other),
        }
    }
}

/// Failure reported by the on-device model.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum LocalModelError {
    #[error("on-device model unavailable: {0}")]
    Unavailable(String),
    #[error("on-device generation failed: {0}")]
    GenerationFailed(String),
}

/// Failure reported by the cloud model.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum CloudModelError {
    #[error("No GEMINI_API_KEY configured. Add your Gemini API key with `plainly set-key`.")]
    MissingApiKey,
    #[error("request failed: {0}")]
    Http(String),
    #[error("{message}")]
    Api { status: u16, message: String },
    #[error("No clear explanation could be generated.")]
    EmptyResponse,
    #[error("could not read model response: {0}")]
    InvalidResponse(String),
}

impl From<CloudModelError> for ExplainError {
    fn from(err: CloudModelError) -> Self {
        match err {
            CloudModelError::EmptyResponse | CloudModelError::InvalidResponse(_) => {
                ExplainError::GenerationFailed(err.to_string())
            }
            CloudModelError::MissingApiKey
            | CloudModelError::Http(_)
            | CloudModelError::Api { .. } => ExplainError::Transport(err.to_string()),
        }
    }
}

impl From<LocalModelError> for ExplainError {
    fn from(err: LocalModelError) -> Self {
        match err {
            LocalModelError::Unavailable(_) => ExplainError::Unavailable,
            LocalModelError::GenerationFailed(msg) => ExplainError::GenerationFailed(msg),
        }
    }
}

/// Failure reading or writing the history log.
#[derive(Debug, Error)]
pub enum HistoryError {
    #[error("could not determine a data directory for history")]
    NoDataDir,
    #[error("history I/O failed at {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to serialize history: {0}")]
    Serialize(#[from] serde_json::Error),
}

/// Failure turning a file on disk into shareable content.
#[derive(Debug, Error)]
pub enum IngestError {
    #[error("failed to read {path}: {source}")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("{0} is not valid UTF-8 source code")]
    NotUtf8(String),
    #[error("unsupported file type: {0}")]
    Unsupported(String),
}
