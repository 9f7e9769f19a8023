use courtside_core::domain::conversation::ConversationId;
use courtside_core::flows::input::COMMAND_PREFIX;
use courtside_core::flows::{DialogInput, ReservedCommand};
use thiserror::Error;

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CommandPayload {
    pub conversation_id: ConversationId,
    pub user_id: String,
    /// Command word including the prefix, e.g. `/start`.
    pub command: String,
    pub text: String,
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum CommandParseError {
    #[error("unsupported command: {0}")]
    UnsupportedCommand(String),
    #[error("command is missing the `/` prefix: {0}")]
    MissingPrefix(String),
}

/// Splits a raw `/command args` line into a payload; `None` for plain text.
pub fn parse_command_line(
    conversation_id: &ConversationId,
    user_id: &str,
    line: &str,
) -> Option<CommandPayload> {
    let trimmed = line.trim();
    if !trimmed.starts_with(COMMAND_PREFIX) {
        return None;
    }

    let (command, text) = match trimmed.split_once(char::is_whitespace) {
        Some((command, text)) => (command, text.trim()),
        None => (trimmed, ""),
    };

    Some(CommandPayload {
        conversation_id: conversation_id.clone(),
        user_id: user_id.to_owned(),
        command: command.to_owned(),
        text: text.to_owned(),
    })
}

pub fn normalize_command(payload: &CommandPayload) -> Result<DialogInput, CommandParseError> {
    if !payload.command.starts_with(COMMAND_PREFIX) {
        return Err(CommandParseError::MissingPrefix(payload.command.clone()));
    }

    match DialogInput::parse(&payload.command) {
        DialogInput::Command(ReservedCommand::Unknown(name)) => {
            Err(CommandParseError::UnsupportedCommand(name))
        }
        input => Ok(input),
    }
}
