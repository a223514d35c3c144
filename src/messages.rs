//! Conversation messages as persisted in session transcripts.
//!
//! A [`Message`] has a fixed schema. Rebuilding one from a loose JSON mapping
//! goes through [`Message::from_value`], which checks every required field and
//! reports the first problem as a [`MessageError`].

use chrono::Utc;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;
use std::str::FromStr;

/// Who authored a message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Assistant,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::User => "user",
            Role::Assistant => "assistant",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Role {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "user" => Ok(Role::User),
            "assistant" => Ok(Role::Assistant),
            other => Err(format!("unknown role '{other}' (expected user or assistant)")),
        }
    }
}

/// One block of message content, tagged by `"type"` on the wire.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Content {
    Text {
        text: String,
    },
    ToolUse {
        id: String,
        name: String,
        #[serde(default)]
        parameters: Value,
    },
    ToolResult {
        tool_use_id: String,
        output: String,
        #[serde(default)]
        is_error: bool,
    },
}

impl Content {
    pub fn text(text: impl Into<String>) -> Self {
        Content::Text { text: text.into() }
    }
}

/// A single turn in a conversation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Message {
    pub id: String,
    pub role: Role,
    /// Unix timestamp, seconds.
    pub created: i64,
    pub content: Vec<Content>,
}

/// Why a JSON mapping could not be turned into a [`Message`].
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum MessageError {
    #[error("message must be a JSON object, got {0}")]
    NotAnObject(&'static str),

    #[error("message is missing required field `{0}`")]
    MissingField(&'static str),

    #[error("message field `{field}` is invalid: {reason}")]
    InvalidField { field: &'static str, reason: String },
}

impl Message {
    /// Create a message with a fresh id, stamped with the current time.
    pub fn new(role: Role, content: Vec<Content>) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            role,
            created: Utc::now().timestamp(),
            content,
        }
    }

    pub fn user(text: impl Into<String>) -> Self {
        Self::new(Role::User, vec![Content::text(text)])
    }

    pub fn assistant(text: impl Into<String>) -> Self {
        Self::new(Role::Assistant, vec![Content::text(text)])
    }

    pub fn with_content(mut self, content: Content) -> Self {
        self.content.push(content);
        self
    }

    /// Concatenated text blocks, one per line. Tool blocks are skipped.
    pub fn text(&self) -> String {
        self.content
            .iter()
            .filter_map(|c| match c {
                Content::Text { text } => Some(text.as_str()),
                _ => None,
            })
            .collect::<Vec<_>>()
            .join("\n")
    }

    /// Plain mapping form, as written to a session file.
    pub fn to_value(&self) -> Value {
        serde_json::json!({
            "id": self.id,
            "role": self.role,
            "created": self.created,
            "content": self.content,
        })
    }

    /// Rebuild a message from its mapping form.
    ///
    /// Unknown keys are ignored so older readers accept newer files.
    pub fn from_value(value: Value) -> Result<Self, MessageError> {
        let mut map = match value {
            Value::Object(map) => map,
            other => return Err(MessageError::NotAnObject(json_kind(&other))),
        };

        let id: String = take_field(&mut map, "id")?;
        if id.trim().is_empty() {
            return Err(MessageError::InvalidField {
                field: "id",
                reason: "must not be empty".to_string(),
            });
        }
        let role: Role = take_field(&mut map, "role")?;
        let created: i64 = take_field(&mut map, "created")?;
        let content: Vec<Content> = take_field(&mut map, "content")?;

        Ok(Self {
            id,
            role,
            created,
            content,
        })
    }
}

fn take_field<T: DeserializeOwned>(
    map: &mut Map<String, Value>,
    field: &'static str,
) -> Result<T, MessageError> {
    let value = map.remove(field).ok_or(MessageError::MissingField(field))?;
    serde_json::from_value(value).map_err(|e| MessageError::InvalidField {
        field,
        reason: e.to_string(),
    })
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}
