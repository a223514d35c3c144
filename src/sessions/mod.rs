//! Session management: persists conversation transcripts and finds them again.

pub mod error;
pub mod file;
pub mod in_memory;
pub mod jsonl;
pub mod traits;

pub use error::SessionError;
pub use file::{
    list_sorted_session_files, read_from_file, session_file_exists, session_path, write_to_file,
    SessionFile,
};
pub use in_memory::InMemorySessionStore;
pub use jsonl::JsonlSessionStore;
pub use traits::{validate_session_name, SessionStore, SessionSummary};

use crate::config::{Config, SessionsConfig};
use crate::messages::Message;
use anyhow::Result;
use tracing::info;

/// Factory: create the session backend named in config.
pub fn create_session_store(config: &SessionsConfig) -> error::Result<Box<dyn SessionStore>> {
    match config.backend.trim().to_ascii_lowercase().as_str() {
        "jsonl" => Ok(Box::new(JsonlSessionStore::new(config.clone()))),
        "memory" | "in_memory" => Ok(Box::new(InMemorySessionStore::new())),
        other => Err(SessionError::UnknownBackend(other.to_string())),
    }
}

/// Pick the session a run should use.
///
/// An explicit name always wins. Without one, `resume` selects the most
/// recently modified session and a fresh name is generated otherwise.
pub fn resolve_session(
    store: &dyn SessionStore,
    name: Option<&str>,
    resume: bool,
) -> error::Result<String> {
    if let Some(name) = name {
        validate_session_name(name)?;
        return Ok(name.to_string());
    }
    if resume {
        return store
            .latest()?
            .map(|s| s.name)
            .ok_or(SessionError::NothingToResume);
    }
    Ok(generate_session_name())
}

pub fn generate_session_name() -> String {
    let id = uuid::Uuid::new_v4().simple().to_string();
    format!("session-{}", &id[..8])
}

// ── CLI handler ──

/// Handle `sessionfile session <subcommand>` CLI commands.
pub fn handle_session_command(command: crate::SessionCommands, config: &Config) -> Result<()> {
    let store = create_session_store(&config.sessions)?;
    match command {
        crate::SessionCommands::List { limit } => {
            let sessions = store.list()?;
            if sessions.is_empty() {
                println!("No sessions found in {}.", config.sessions.dir.display());
                return Ok(());
            }
            let total = sessions.len();
            println!("Sessions ({total} total, most recent first):\n");
            for session in sessions.iter().take(limit) {
                println!(
                    "  {:<32} {}",
                    session.name,
                    session.modified.format("%Y-%m-%d %H:%M:%S UTC")
                );
            }
            if total > limit {
                println!("\n  {} more not shown. Use --limit to see them.", total - limit);
            }
        }
        crate::SessionCommands::Show { name, limit } => {
            let messages = store.load(&name)?;
            if messages.is_empty() {
                println!("Session '{name}' is empty.");
                return Ok(());
            }
            let start = limit.map_or(0, |n| messages.len().saturating_sub(n));
            for message in &messages[start..] {
                let text = message.text();
                if text.is_empty() {
                    println!("[{}] ({} non-text blocks)", message.role, message.content.len());
                } else {
                    println!("[{}] {text}", message.role);
                }
            }
        }
        crate::SessionCommands::Path { name } => {
            println!("{}", session_path(&config.sessions, &name)?.display());
        }
        crate::SessionCommands::Latest => match store.latest()? {
            Some(session) => println!("{}", session.name),
            None => println!("No sessions found."),
        },
        crate::SessionCommands::Append {
            name,
            resume,
            role,
            text,
        } => {
            let name = resolve_session(store.as_ref(), name.as_deref(), resume)?;
            let message = Message::new(role, vec![crate::messages::Content::text(text)]);
            store.append(&name, message)?;
            info!(session = %name, backend = store.name(), "Message appended");
            println!("{name}");
        }
    }
    Ok(())
}
