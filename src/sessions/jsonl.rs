//! Session store backed by one JSONL file per session.

use std::path::PathBuf;

use tracing::info;

use super::error::{Result, SessionError};
use super::file::{
    list_sorted_session_files, read_from_file, session_file_exists, session_path, write_to_file,
};
use super::traits::{validate_session_name, SessionStore, SessionSummary};
use crate::config::SessionsConfig;
use crate::messages::Message;

pub struct JsonlSessionStore {
    config: SessionsConfig,
}

impl JsonlSessionStore {
    pub fn new(config: SessionsConfig) -> Self {
        Self { config }
    }

    /// Where `name` is (or would be) stored. Does not create anything.
    pub fn file_path(&self, name: &str) -> PathBuf {
        self.config.dir.join(format!("{name}{}", self.config.suffix))
    }
}

impl SessionStore for JsonlSessionStore {
    fn save(&self, name: &str, messages: &[Message]) -> Result<()> {
        validate_session_name(name)?;
        let path = session_path(&self.config, name)?;
        write_to_file(&path, messages)?;
        info!(session = name, count = messages.len(), "Session saved");
        Ok(())
    }

    fn load(&self, name: &str) -> Result<Vec<Message>> {
        validate_session_name(name)?;
        let path = self.file_path(name);
        if !path.is_file() {
            return Err(SessionError::NotFound(name.to_string()));
        }
        read_from_file(&path)
    }

    fn list(&self) -> Result<Vec<SessionSummary>> {
        let files = list_sorted_session_files(&self.config.dir, &self.config.suffix)?;
        Ok(files
            .into_iter()
            .map(|f| SessionSummary {
                name: f.name,
                modified: f.modified,
                path: Some(f.path),
            })
            .collect())
    }

    fn exists(&self, name: &str) -> bool {
        validate_session_name(name).is_ok() && self.file_path(name).is_file()
    }

    fn has_sessions(&self) -> bool {
        session_file_exists(&self.config.dir, &self.config.suffix)
    }

    fn name(&self) -> &str {
        "jsonl"
    }
}
