//! Messages crossing the view/background boundary.
//!
//! The view sends an opaque `{ "command": "..." }` object and always gets a
//! [`Response`] back, never a panic or a raw error.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::CoreError;

/// A command sent by the view layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Command {
    /// Start, pause or resume depending on the current phase.
    MainAction,
    EndDay,
    CheckDate,
    SkipBreak,
    SkipCycle,
    /// Count one work session by hand, capped at the daily goal.
    AddSp,
}

impl Command {
    pub const ALL: [Command; 6] = [
        Command::MainAction,
        Command::EndDay,
        Command::CheckDate,
        Command::SkipBreak,
        Command::SkipCycle,
        Command::AddSp,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Command::MainAction => "main_action",
            Command::EndDay => "end_day",
            Command::CheckDate => "check_date",
            Command::SkipBreak => "skip_break",
            Command::SkipCycle => "skip_cycle",
            Command::AddSp => "add_sp",
        }
    }
}

impl fmt::Display for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Command {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Command::ALL
            .into_iter()
            .find(|c| c.as_str() == s)
            .ok_or_else(|| CoreError::UnknownCommand(s.to_string()))
    }
}

/// Opaque message as the view layer sends it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    pub command: String,
}

impl Message {
    pub fn new(command: impl Into<String>) -> Self {
        Self {
            command: command.into(),
        }
    }

    /// Decode a raw JSON message.
    ///
    /// # Errors
    /// Returns [`CoreError::MalformedMessage`] if the payload is not an
    /// object with a string `command` field.
    pub fn from_json(raw: &str) -> Result<Self, CoreError> {
        serde_json::from_str(raw).map_err(|e| CoreError::MalformedMessage(e.to_string()))
    }

    pub fn command(&self) -> Result<Command, CoreError> {
        self.command.parse()
    }
}

impl From<Command> for Message {
    fn from(command: Command) -> Self {
        Self::new(command.as_str())
    }
}

/// Reply to every message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "lowercase")]
pub enum Response {
    Ok,
    Error { message: String },
}

impl Response {
    pub fn error(err: &CoreError) -> Self {
        Response::Error {
            message: err.to_string(),
        }
    }

    pub fn is_ok(&self) -> bool {
        matches!(self, Response::Ok)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn commands_parse_from_wire_names() {
        for command in Command::ALL {
            assert_eq!(command.as_str().parse::<Command>().unwrap(), command);
        }
        assert!(matches!(
            "launch".parse::<Command>(),
            Err(CoreError::UnknownCommand(name)) if name == "launch"
        ));
    }

    #[test]
    fn message_without_command_is_malformed() {
        let err = Message::from_json(r#"{"cmd":"main_action"}"#).unwrap_err();
        assert!(matches!(err, CoreError::MalformedMessage(_)));
    }

    #[test]
    fn responses_serialize_with_status_tag() {
        assert_eq!(serde_json::to_value(Response::Ok).unwrap(), json!({"status": "ok"}));
        let err = Response::error(&CoreError::UnknownCommand("x".into()));
        assert_eq!(
            serde_json::to_value(err).unwrap(),
            json!({"status": "error", "message": "Unknown command: 'x'"})
        );
    }
}
