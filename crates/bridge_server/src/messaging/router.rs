//! Classification of raw client text into [`CommandEnvelope`]s.

use super::types::{CommandEnvelope, SystemCommand, GAME_COMMAND_MARKER, SYSTEM_COMMAND_MARKER};

/// Classifies a client message by its marker and strips the marker.
///
/// The game command remainder is kept byte-for-byte, including surrounding
/// whitespace. System commands must match exactly.
///
/// # Examples
///
/// ```rust
/// use bridge_server::messaging::{classify_message, CommandEnvelope, SystemCommand};
///
/// assert_eq!(
///     classify_message("arkCommand::ListPlayers"),
///     CommandEnvelope::GameCommand("ListPlayers".to_string())
/// );
/// assert_eq!(
///     classify_message("sysCommand::shutdown"),
///     CommandEnvelope::System(SystemCommand::Shutdown)
/// );
/// assert_eq!(classify_message("hello"), CommandEnvelope::Unsupported);
/// ```
pub fn classify_message(payload: &str) -> CommandEnvelope {
    if let Some(command) = payload.strip_prefix(GAME_COMMAND_MARKER) {
        return CommandEnvelope::GameCommand(command.to_string());
    }

    if let Some(command) = payload.strip_prefix(SYSTEM_COMMAND_MARKER) {
        return match command.parse::<SystemCommand>() {
            Ok(system) => CommandEnvelope::System(system),
            Err(unknown) => CommandEnvelope::UnknownSystemCommand(unknown.0),
        };
    }

    CommandEnvelope::Unsupported
}

/// Diagnostic label for a game command: its first whitespace-delimited token.
///
/// Arguments may carry player names or chat text, so they never make it into
/// timeout reports.
pub fn timeout_label(command: &str) -> &str {
    command.split_whitespace().next().unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_game_command_remainder_is_verbatim() {
        assert_eq!(
            classify_message("arkCommand::  ServerChat hello   world "),
            CommandEnvelope::GameCommand("  ServerChat hello   world ".to_string())
        );
        assert_eq!(
            classify_message("arkCommand::"),
            CommandEnvelope::GameCommand(String::new())
        );
    }

    #[test]
    fn test_system_commands_match_exactly() {
        assert_eq!(
            classify_message("sysCommand::reconnect"),
            CommandEnvelope::System(SystemCommand::Reconnect)
        );
        assert_eq!(
            classify_message("sysCommand::Shutdown"),
            CommandEnvelope::UnknownSystemCommand("Shutdown".to_string())
        );
        assert_eq!(
            classify_message("sysCommand::reconnect "),
            CommandEnvelope::UnknownSystemCommand("reconnect ".to_string())
        );
    }

    #[test]
    fn test_unmarked_payloads_are_unsupported() {
        for payload in ["", "ListPlayers", " arkCommand::ListPlayers", "arkcommand::x", "sysCommand:"] {
            assert_eq!(classify_message(payload), CommandEnvelope::Unsupported, "{payload:?}");
        }
    }

    #[test]
    fn test_timeout_label_is_first_token() {
        assert_eq!(timeout_label("KickPlayer 76561198000000000"), "KickPlayer");
        assert_eq!(timeout_label("  ServerChat secret text"), "ServerChat");
        assert_eq!(timeout_label("SaveWorld"), "SaveWorld");
        assert_eq!(timeout_label("   "), "");
    }
}
