//! Error types for session storage.

use std::path::PathBuf;

use crate::messages::MessageError;

#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    /// Filesystem failures pass through untouched.
    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error("Failed to load session due to JSON decode error at line {line}: {source}")]
    Decode {
        path: PathBuf,
        line: usize,
        #[source]
        source: serde_json::Error,
    },

    /// A line was valid JSON but not a valid message.
    #[error(transparent)]
    InvalidMessage(#[from] MessageError),

    #[error("Failed to encode message {id}: {source}")]
    Encode {
        id: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("Invalid session name '{0}'")]
    InvalidName(String),

    #[error("Session not found: {0}")]
    NotFound(String),

    #[error("No sessions to resume")]
    NothingToResume,

    #[error("Unknown session backend '{0}' (expected jsonl or memory)")]
    UnknownBackend(String),
}

pub type Result<T> = std::result::Result<T, SessionError>;
