//! In-memory session store implementation.

use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use std::collections::HashMap;

use super::error::{Result, SessionError};
use super::traits::{validate_session_name, SessionStore, SessionSummary};
use crate::messages::Message;

struct StoredSession {
    messages: Vec<Message>,
    modified: DateTime<Utc>,
}

/// An in-memory session store backed by a mutex-protected hash map.
pub struct InMemorySessionStore {
    sessions: Mutex<HashMap<String, StoredSession>>,
}

impl InMemorySessionStore {
    pub fn new() -> Self {
        Self {
            sessions: Mutex::new(HashMap::new()),
        }
    }
}

impl Default for InMemorySessionStore {
    fn default() -> Self {
        Self::new()
    }
}

impl SessionStore for InMemorySessionStore {
    fn save(&self, name: &str, messages: &[Message]) -> Result<()> {
        validate_session_name(name)?;
        let mut sessions = self.sessions.lock();
        sessions.insert(
            name.to_string(),
            StoredSession {
                messages: messages.to_vec(),
                modified: Utc::now(),
            },
        );
        Ok(())
    }

    fn load(&self, name: &str) -> Result<Vec<Message>> {
        validate_session_name(name)?;
        let sessions = self.sessions.lock();
        match sessions.get(name) {
            Some(session) => Ok(session.messages.clone()),
            None => Err(SessionError::NotFound(name.to_string())),
        }
    }

    fn append(&self, name: &str, message: Message) -> Result<()> {
        validate_session_name(name)?;
        let mut sessions = self.sessions.lock();
        let session = sessions
            .entry(name.to_string())
            .or_insert_with(|| StoredSession {
                messages: Vec::new(),
                modified: Utc::now(),
            });
        session.messages.push(message);
        session.modified = Utc::now();
        Ok(())
    }

    fn list(&self) -> Result<Vec<SessionSummary>> {
        let sessions = self.sessions.lock();
        let mut results: Vec<SessionSummary> = sessions
            .iter()
            .map(|(name, session)| SessionSummary {
                name: name.clone(),
                modified: session.modified,
                path: None,
            })
            .collect();

        results.sort_by(|a, b| {
            b.modified
                .cmp(&a.modified)
                .then_with(|| a.name.cmp(&b.name))
        });
        Ok(results)
    }

    fn exists(&self, name: &str) -> bool {
        validate_session_name(name).is_ok() && self.sessions.lock().contains_key(name)
    }

    fn has_sessions(&self) -> bool {
        !self.sessions.lock().is_empty()
    }

    fn name(&self) -> &str {
        "in_memory"
    }
}
