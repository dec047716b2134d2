//! Command-line interface definition for famchat
//!
//! This module defines the CLI structure using clap's derive API,
//! providing the interactive chat loop plus one-shot commands for
//! session and message management.

use clap::{Parser, Subcommand};

/// famchat - terminal client for the family chat
///
/// Sign in, open the family room, and chat with live updates from the
/// hosted backend.
#[derive(Parser, Debug, Clone)]
#[command(name = "famchat")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Path to configuration file
    #[arg(short, long)]
    pub config: Option<String>,

    /// Enable verbose logging
    #[arg(short, long)]
    pub verbose: bool,

    /// Command to execute
    #[command(subcommand)]
    pub command: Commands,
}

/// Available commands for famchat
#[derive(Subcommand, Debug, Clone)]
pub enum Commands {
    /// Start the interactive chat session
    Chat {
        /// Email to prefill on the login screen
        #[arg(short, long)]
        email: Option<String>,
    },

    /// Sign in and persist the session credential
    Login {
        /// Email to sign in with (prompted when omitted)
        #[arg(short, long)]
        email: Option<String>,
    },

    /// Sign out and clear the persisted credential
    Logout,

    /// List the rooms available to the signed-in user
    Rooms,

    /// Send a single message without entering the chat loop
    Send {
        /// Room identifier (defaults to the family group)
        #[arg(short, long)]
        room: Option<String>,

        /// Message text
        #[arg(short, long)]
        text: String,
    },

    /// Show the signed-in identity
    Whoami,
}

impl Cli {
    /// Parse command line arguments
    pub fn parse_args() -> Self {
        Self::parse()
    }
}

impl Default for Cli {
    fn default() -> Self {
        Self {
            config: None,
            verbose: false,
            command: Commands::Chat { email: None },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_default() {
        let cli = Cli::default();
        assert!(cli.config.is_none());
        assert!(!cli.verbose);
        assert!(matches!(cli.command, Commands::Chat { email: None }));
    }

    #[test]
    fn test_cli_parse_chat_command() {
        let cli = Cli::try_parse_from(["famchat", "chat"]).unwrap();
        assert!(matches!(cli.command, Commands::Chat { .. }));
    }

    #[test]
    fn test_cli_parse_chat_with_email() {
        let cli = Cli::try_parse_from(["famchat", "chat", "--email", "ana@example.com"]).unwrap();
        if let Commands::Chat { email } = cli.command {
            assert_eq!(email.as_deref(), Some("ana@example.com"));
        } else {
            panic!("Expected chat command");
        }
    }

    #[test]
    fn test_cli_parse_login() {
        let cli = Cli::try_parse_from(["famchat", "login", "-e", "ana@example.com"]).unwrap();
        assert!(matches!(cli.command, Commands::Login { .. }));
    }

    #[test]
    fn test_cli_parse_send_requires_text() {
        assert!(Cli::try_parse_from(["famchat", "send"]).is_err());

        let cli = Cli::try_parse_from(["famchat", "send", "--text", "hi"]).unwrap();
        if let Commands::Send { room, text } = cli.command {
            assert!(room.is_none());
            assert_eq!(text, "hi");
        } else {
            panic!("Expected send command");
        }
    }

    #[test]
    fn test_cli_parse_send_with_room() {
        let cli =
            Cli::try_parse_from(["famchat", "send", "--room", "family-group", "--text", "hi"])
                .unwrap();
        if let Commands::Send { room, .. } = cli.command {
            assert_eq!(room.as_deref(), Some("family-group"));
        } else {
            panic!("Expected send command");
        }
    }

    #[test]
    fn test_cli_parse_config_flag() {
        let cli = Cli::try_parse_from(["famchat", "--config", "alt.yaml", "rooms"]).unwrap();
        assert_eq!(cli.config.as_deref(), Some("alt.yaml"));
        assert!(matches!(cli.command, Commands::Rooms));
    }

    #[test]
    fn test_cli_parse_unknown_command_fails() {
        assert!(Cli::try_parse_from(["famchat", "teleport"]).is_err());
    }
}
