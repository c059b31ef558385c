// Domain error types. Hosts log these and carry on; none of them abort a tick.

use std::fmt;

/// Rejected engine command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CommandError {
    UnknownPlayer,
    NoPendingChoice,
    /// Another player holds the upgrade gate.
    NotYourChoice,
    InvalidOption,
    /// The run has already ended.
    SessionOver,
}

impl fmt::Display for CommandError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let msg = match self {
            CommandError::UnknownPlayer => "unknown player",
            CommandError::NoPendingChoice => "no upgrade choice is pending",
            CommandError::NotYourChoice => "upgrade choice belongs to another player",
            CommandError::InvalidOption => "option is not among the current offers",
            CommandError::SessionOver => "session is over",
        };
        f.write_str(msg)
    }
}

impl std::error::Error for CommandError {}

#[derive(Debug)]
pub enum StoreError {
    Io(std::io::Error),
    Serialization(String),
}

impl fmt::Display for StoreError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StoreError::Io(err) => write!(f, "snapshot io error: {err}"),
            StoreError::Serialization(msg) => write!(f, "snapshot serialization error: {msg}"),
        }
    }
}

impl std::error::Error for StoreError {}

impl From<std::io::Error> for StoreError {
    fn from(err: std::io::Error) -> Self {
        StoreError::Io(err)
    }
}

impl From<serde_json::Error> for StoreError {
    fn from(err: serde_json::Error) -> Self {
        StoreError::Serialization(err.to_string())
    }
}
