//! Slash command parsing for the chat applications.
//!
//! This module handles parsing of special commands that start with `/`,
//! allowing users to control the chat session without sending messages
//! to the backend.

/// A parsed chat command.
///
/// These commands act on local session state and are never sent to the
/// backend.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChatCommand {
    /// Clear the conversation transcript.
    Clear,

    /// Display session statistics.
    Stats,

    /// Save the transcript to a file.
    SaveTranscript(String),

    /// Load a transcript from a file.
    LoadTranscript(String),

    /// Display help information.
    Help,

    /// Exit the chat application.
    Quit,

    /// Report a parsing error back to the caller.
    Invalid(String),
}

/// Parses user input for slash commands.
///
/// Returns `Some(ChatCommand)` if the input is a command, or `None` if it
/// should be treated as a regular message.
///
/// # Examples
///
/// ```
/// # use banter::chat::parse_command;
/// assert!(parse_command("/quit").is_some());
/// assert!(parse_command("/save transcript.json").is_some());
/// assert!(parse_command("Hello there!").is_none());
/// ```
pub fn parse_command(input: &str) -> Option<ChatCommand> {
    let input = input.trim();

    if !input.starts_with('/') {
        return None;
    }

    let mut parts = input[1..].splitn(2, ' ');
    let command = parts.next()?.to_lowercase();
    let argument = parts.next().map(|s| s.trim()).filter(|s| !s.is_empty());

    let result = match command.as_str() {
        "clear" => ChatCommand::Clear,
        "stats" => ChatCommand::Stats,
        "save" => match argument {
            Some(path) => ChatCommand::SaveTranscript(path.to_string()),
            None => ChatCommand::Invalid("/save requires a file path".to_string()),
        },
        "load" => match argument {
            Some(path) => ChatCommand::LoadTranscript(path.to_string()),
            None => ChatCommand::Invalid("/load requires a file path".to_string()),
        },
        "help" | "?" => ChatCommand::Help,
        "quit" | "exit" => ChatCommand::Quit,
        _ => ChatCommand::Invalid(format!(
            "Unknown command: /{command}. Type /help for available commands."
        )),
    };

    Some(result)
}

/// Returns the help text listing available commands.
pub fn help_text() -> &'static str {
    "Available commands:\n\
     /help          Show this help\n\
     /clear         Clear the conversation\n\
     /stats         Show session statistics\n\
     /save <path>   Save the transcript to a file\n\
     /load <path>   Load a transcript from a file\n\
     /quit          Exit the application"
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn plain_messages_are_not_commands() {
        assert!(parse_command("Hello there!").is_none());
        assert!(parse_command("what does /help do?").is_none());
        assert!(parse_command("").is_none());
    }

    #[test]
    fn simple_commands() {
        assert_eq!(parse_command("/clear"), Some(ChatCommand::Clear));
        assert_eq!(parse_command("/stats"), Some(ChatCommand::Stats));
        assert_eq!(parse_command("/help"), Some(ChatCommand::Help));
        assert_eq!(parse_command("/?"), Some(ChatCommand::Help));
        assert_eq!(parse_command("/quit"), Some(ChatCommand::Quit));
        assert_eq!(parse_command("/exit"), Some(ChatCommand::Quit));
    }

    #[test]
    fn commands_are_case_insensitive() {
        assert_eq!(parse_command("/QUIT"), Some(ChatCommand::Quit));
        assert_eq!(parse_command("/Clear"), Some(ChatCommand::Clear));
    }

    #[test]
    fn save_and_load_take_a_path() {
        assert_eq!(
            parse_command("/save transcript.json"),
            Some(ChatCommand::SaveTranscript("transcript.json".to_string()))
        );
        assert_eq!(
            parse_command("/load old chat.json"),
            Some(ChatCommand::LoadTranscript("old chat.json".to_string()))
        );
    }

    #[test]
    fn save_without_path_is_invalid() {
        assert!(matches!(
            parse_command("/save"),
            Some(ChatCommand::Invalid(_))
        ));
        assert!(matches!(
            parse_command("/load   "),
            Some(ChatCommand::Invalid(_))
        ));
    }

    #[test]
    fn unknown_commands_are_invalid() {
        assert!(matches!(
            parse_command("/model sonnet"),
            Some(ChatCommand::Invalid(_))
        ));
    }

    #[test]
    fn surrounding_whitespace_is_tolerated() {
        assert_eq!(parse_command("  /quit  "), Some(ChatCommand::Quit));
    }
}
