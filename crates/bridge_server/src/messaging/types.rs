//! Message type definitions for client commands.
//!
//! Clients speak plain text. A message is a marker followed by the command:
//!
//! ```text
//! arkCommand::ListPlayers
//! sysCommand::reconnect
//! ```

use std::fmt;
use std::str::FromStr;

/// Prefix of commands forwarded verbatim to the game server.
pub const GAME_COMMAND_MARKER: &str = "arkCommand::";

/// Prefix of commands handled by the bridge itself.
pub const SYSTEM_COMMAND_MARKER: &str = "sysCommand::";

/// A classified inbound message with its marker stripped.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CommandEnvelope {
    /// Raw RCON command to send upstream
    GameCommand(String),
    /// A recognised bridge command
    System(SystemCommand),
    /// Text after the system marker that names no known command
    UnknownSystemCommand(String),
    /// No recognised marker
    Unsupported,
}

/// Commands the bridge executes locally.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SystemCommand {
    /// Force the upstream connection to reconnect
    Reconnect,
    /// Run the timed in-game shutdown sequence
    Shutdown,
}

impl SystemCommand {
    pub const fn as_str(&self) -> &'static str {
        match self {
            SystemCommand::Reconnect => "reconnect",
            SystemCommand::Shutdown => "shutdown",
        }
    }
}

impl fmt::Display for SystemCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error for text that names no [`SystemCommand`].
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("Unknown system command: {0}")]
pub struct UnknownSystemCommand(pub String);

impl FromStr for SystemCommand {
    type Err = UnknownSystemCommand;

    /// Matching is exact and case-sensitive.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "reconnect" => Ok(SystemCommand::Reconnect),
            "shutdown" => Ok(SystemCommand::Shutdown),
            other => Err(UnknownSystemCommand(other.to_string())),
        }
    }
}

/// What handling a single message amounted to.
///
/// Nothing here is sent back to the client; it exists so callers and tests
/// can observe the result of a fire-and-forget dispatch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CommandOutcome {
    /// The game command was sent and the server answered
    Forwarded { response: String },
    /// Sending failed and a possible timeout was reported under `label`
    ForwardFailed { label: String },
    Reconnected,
    ShutdownStarted,
    /// A shutdown was requested while one was already running
    ShutdownIgnored,
    UnknownSystemCommand,
    Unsupported,
}
