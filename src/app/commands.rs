//! Slash-command parsing for the interactive client.

use thiserror::Error;

/// A parsed line of user input.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Command {
    /// Send text to the active conversation.
    Send(String),
    /// Start a new conversation.
    New,
    /// Show the conversation list.
    List,
    /// Make conversation N (1-based, list order) active.
    Switch(usize),
    /// Delete conversation N.
    Delete(usize),
    /// Show the context panel, toggling entry N first if given.
    Context(Option<usize>),
    /// Send sample question N.
    Ask(usize),
    /// Re-run the last failed operation.
    Retry,
    /// Show help.
    Help,
    /// Leave the client.
    Quit,
}

/// Why a command line was rejected.
#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum CommandError {
    /// Unrecognised `/word`.
    #[error("unknown command: /{0} (try /help)")]
    Unknown(String),
    /// A required number was missing.
    #[error("/{0} needs a number")]
    MissingNumber(&'static str),
    /// A number did not parse or was zero.
    #[error("not a valid number: {0}")]
    InvalidNumber(String),
}

/// Help text listing every command.
pub const HELP: &str = "\
Type a question and press Enter. End a line with \\ to continue on the next line.

  /new          start a new conversation
  /list         show conversations
  /switch N     open conversation N
  /delete N     delete conversation N
  /context [N]  show retrieved context, toggling entry N
  /ask N        ask sample question N
  /retry        retry the last failed action
  /help         show this help
  /quit         exit";

/// Parse one complete input. Text not starting with `/` is a message.
///
/// # Errors
/// Returns an error for unknown commands or bad numeric arguments.
pub fn parse(input: &str) -> Result<Command, CommandError> {
    let trimmed = input.trim();
    let Some(rest) = trimmed.strip_prefix('/') else {
        return Ok(Command::Send(trimmed.to_string()));
    };

    let mut words = rest.split_whitespace();
    let name = words.next().unwrap_or_default();
    let arg = words.next();

    match name.to_ascii_lowercase().as_str() {
        "new" => Ok(Command::New),
        "list" | "ls" => Ok(Command::List),
        "switch" | "open" => number("switch", arg).map(Command::Switch),
        "delete" | "rm" => number("delete", arg).map(Command::Delete),
        "context" | "ctx" => arg
            .map(|raw| parse_number(raw).map(Some))
            .unwrap_or(Ok(None))
            .map(Command::Context),
        "ask" => number("ask", arg).map(Command::Ask),
        "retry" => Ok(Command::Retry),
        "help" | "?" => Ok(Command::Help),
        "quit" | "exit" | "q" => Ok(Command::Quit),
        _ => Err(CommandError::Unknown(name.to_string())),
    }
}

fn number(command: &'static str, arg: Option<&str>) -> Result<usize, CommandError> {
    arg.map_or(Err(CommandError::MissingNumber(command)), parse_number)
}

fn parse_number(raw: &str) -> Result<usize, CommandError> {
    raw.parse::<usize>()
        .ok()
        .filter(|&n| n > 0)
        .ok_or_else(|| CommandError::InvalidNumber(raw.to_string()))
}
