//! famchat - terminal client for the family chat
//!
//! This library provides the core functionality for the famchat client:
//! session observation, room identity, subscription lifecycle, and
//! message composition against abstract backend collaborators.
//!
//! # Architecture
//!
//! The library is organized into the following modules:
//!
//! - `backend`: Collaborator traits (auth, document store) and the hosted implementation
//! - `session`: View state, session observer, and the subscription lifecycle manager
//! - `rooms`: Room identity and the synthesized room directory
//! - `composer`: Draft handling and message submission
//! - `commands`: CLI command handlers and the interactive loop
//! - `config`: Configuration management and validation
//! - `error`: Error types and result aliases
//! - `cli`: Command-line interface definition
//!
//! # Example
//!
//! ```no_run
//! use famchat::config::Config;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let config = Config::load("config/config.yaml")?;
//!     config.validate()?;
//!
//!     famchat::commands::chat::run_chat(config, None).await
//! }
//! ```

pub mod backend;
pub mod cli;
pub mod commands;
pub mod composer;
pub mod config;
pub mod error;
pub mod rooms;
pub mod session;

// Re-export commonly used types
pub use backend::{AuthBackend, AuthState, Backend, DocumentStore, Identity};
pub use composer::{Composer, SendOutcome};
pub use config::Config;
pub use error::{FamchatError, Result};
pub use rooms::{derive_room_id, Room, RoomId, FAMILY_ROOM_ID};
pub use session::{AppState, SessionObserver, SubscriptionManager};

#[cfg(test)]
pub mod test_utils;
