//! Special commands parser for the interactive chat session
//!
//! This module parses the `/`-prefixed commands available during an
//! interactive session. Special commands allow users to:
//! - Leave the open thread and return to the room list
//! - Reprint the room list
//! - View session status
//! - Display help information
//! - Sign out or exit the session
//!
//! Commands are case-insensitive.

use thiserror::Error;

/// Errors that can occur when parsing special commands
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CommandError {
    /// Unknown command was entered
    #[error("Unknown command: {0}\n\nType '/help' to see available commands")]
    UnknownCommand(String),

    /// Command was given an argument it does not take
    #[error("Command {command} takes no argument: {arg}\n\nType '/help' to see valid usage")]
    UnsupportedArgument { command: String, arg: String },
}

/// Special commands that can be executed during an interactive session
///
/// These commands drive navigation and session state rather than being
/// sent as a message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SpecialCommand {
    /// Leave the open thread and return to the room list
    Back,

    /// Reprint the room list
    Rooms,

    /// Display the signed-in identity and the open room
    ShowStatus,

    /// Display help information
    Help,

    /// Sign out, clearing the persisted credential and all view state
    Logout,

    /// Exit the interactive session
    Exit,

    /// Not a special command
    ///
    /// The input should be processed as message text (or login input).
    None,
}

/// Parse a user input string into a special command
///
/// Commands are case-insensitive; bare `exit`/`quit` also end the
/// session, matching what people type out of habit.
///
/// # Errors
///
/// Returns [`CommandError::UnknownCommand`] if the input starts with
/// `/` but matches no command, and
/// [`CommandError::UnsupportedArgument`] if a known command was given
/// an argument.
///
/// # Examples
///
/// ```
/// use famchat::commands::special_commands::{parse_special_command, SpecialCommand};
///
/// let cmd = parse_special_command("/back").unwrap();
/// assert_eq!(cmd, SpecialCommand::Back);
///
/// let cmd = parse_special_command("see you at dinner").unwrap();
/// assert_eq!(cmd, SpecialCommand::None);
///
/// assert!(parse_special_command("/teleport").is_err());
/// ```
pub fn parse_special_command(input: &str) -> Result<SpecialCommand, CommandError> {
    let trimmed = input.trim();
    let lower = trimmed.to_lowercase();

    if !trimmed.starts_with('/') && lower != "exit" && lower != "quit" {
        return Ok(SpecialCommand::None);
    }

    match lower.as_str() {
        "/back" | "/b" => Ok(SpecialCommand::Back),
        "/rooms" | "/list" => Ok(SpecialCommand::Rooms),
        "/status" => Ok(SpecialCommand::ShowStatus),
        "/help" | "/h" | "/?" => Ok(SpecialCommand::Help),
        "/logout" | "/signout" => Ok(SpecialCommand::Logout),
        "/quit" | "/exit" | "/q" | "exit" | "quit" => Ok(SpecialCommand::Exit),

        other => {
            let (command, rest) = match other.split_once(char::is_whitespace) {
                Some((command, rest)) => (command, rest.trim()),
                None => (other, ""),
            };

            let known = [
                "/back", "/b", "/rooms", "/list", "/status", "/help", "/h", "/?", "/logout",
                "/signout", "/quit", "/exit", "/q",
            ];
            if known.contains(&command) && !rest.is_empty() {
                return Err(CommandError::UnsupportedArgument {
                    command: command.to_string(),
                    arg: rest.to_string(),
                });
            }

            Err(CommandError::UnknownCommand(trimmed.to_string()))
        }
    }
}

/// Print help for the interactive session
pub fn print_help() {
    println!("Available commands:");
    println!("  /back        Leave the open thread and return to the room list");
    println!("  /rooms       Reprint the room list");
    println!("  /status      Show the signed-in identity and the open room");
    println!("  /logout      Sign out and return to the login screen");
    println!("  /quit        Exit the session");
    println!("  /help        Show this help");
    println!();
    println!("Anything else typed in a thread is sent as a message.");
}
