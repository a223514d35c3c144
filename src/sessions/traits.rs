//! Session storage trait and listing types.

use chrono::{DateTime, Utc};
use std::path::PathBuf;

use super::error::{Result, SessionError};
use crate::messages::Message;

/// A stored session as seen in a listing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionSummary {
    pub name: String,
    pub modified: DateTime<Utc>,
    /// Backing file, for stores that keep one.
    pub path: Option<PathBuf>,
}

/// Named conversation transcripts.
pub trait SessionStore: Send + Sync {
    /// Replace the transcript stored under `name`.
    fn save(&self, name: &str, messages: &[Message]) -> Result<()>;

    /// Load the full transcript for `name`, oldest message first.
    fn load(&self, name: &str) -> Result<Vec<Message>>;

    /// Add one message to the end of a transcript, creating it if needed.
    fn append(&self, name: &str, message: Message) -> Result<()> {
        let mut messages = if self.exists(name) {
            self.load(name)?
        } else {
            Vec::new()
        };
        messages.push(message);
        self.save(name, &messages)
    }

    /// All sessions, most recently modified first.
    fn list(&self) -> Result<Vec<SessionSummary>>;

    /// The most recently modified session, if any.
    fn latest(&self) -> Result<Option<SessionSummary>> {
        Ok(self.list()?.into_iter().next())
    }

    fn exists(&self, name: &str) -> bool;

    /// Whether the store holds any session at all.
    fn has_sessions(&self) -> bool;

    /// The name of this session store implementation.
    fn name(&self) -> &str;
}

/// Reject names that would escape the sessions directory or produce hidden files.
pub fn validate_session_name(name: &str) -> Result<()> {
    let trimmed = name.trim();
    if trimmed.is_empty()
        || trimmed != name
        || name.starts_with('.')
        || name.contains(['/', '\\', '\0'])
    {
        return Err(SessionError::InvalidName(name.to_string()));
    }
    Ok(())
}
