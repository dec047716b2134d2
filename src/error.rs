//! Error types for famchat
//!
//! This module defines all error types used throughout the application,
//! using `thiserror` for ergonomic error handling. The variants follow
//! the failure classes of the client: authentication, profile lookup,
//! room directory, live subscription, and message send. Every failure
//! is terminal for its one operation; nothing here aborts the process.

use thiserror::Error;

/// Main error type for famchat operations
///
/// This enum encompasses all possible errors that can occur during
/// sign-in, profile and directory fetches, subscription handling, and
/// message composition, plus conversions from the underlying IO, HTTP,
/// serialization, and credential-store errors.
#[derive(Error, Debug)]
pub enum FamchatError {
    /// Configuration-related errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// Authentication failures (the reason string is shown verbatim)
    #[error("Authentication error: {0}")]
    Auth(String),

    /// Profile record lookup failures
    #[error("Profile error: {0}")]
    Profile(String),

    /// Room directory (user list) fetch failures
    #[error("Room directory error: {0}")]
    Directory(String),

    /// Live message subscription failures
    #[error("Subscription error: {0}")]
    Subscription(String),

    /// Message send failures
    #[error("Send error: {0}")]
    Send(String),

    /// Backend factory errors (unknown backend type, bad wiring)
    #[error("Backend error: {0}")]
    Backend(String),

    /// A two-party room was requested with both participants identical
    #[error("Cannot derive a room for a single participant: {0}")]
    SelfChat(String),

    /// Missing credentials while an authenticated call was attempted
    #[error("Not signed in: {0}")]
    NotSignedIn(String),

    /// IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization/deserialization errors
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// YAML parsing errors
    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    /// HTTP request errors
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Keyring/credential storage errors
    #[error("Keyring error: {0}")]
    Keyring(#[from] keyring::Error),
}

/// Result type alias for famchat operations
///
/// This is a convenience alias that uses `anyhow::Error` as the error type,
/// allowing for rich error context and easy error propagation.
pub type Result<T> = anyhow::Result<T>;
