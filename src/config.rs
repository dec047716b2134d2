//! Configuration management for famchat
//!
//! This module handles loading, parsing, validating, and managing
//! configuration from files and environment variables. The backend
//! section tells the client where the hosted service lives; the chat
//! section labels the fixed family room.

use crate::error::{FamchatError, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Main configuration structure for famchat
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Backend connection configuration
    #[serde(default)]
    pub backend: BackendConfig,
    /// Chat presentation configuration
    #[serde(default)]
    pub chat: ChatConfig,
}

/// Backend connection configuration
///
/// Specifies which backend implementation to use and its endpoints.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BackendConfig {
    /// Type of backend to use
    #[serde(rename = "type", default = "default_backend_type")]
    pub backend_type: String,

    /// Host serving the authentication API
    #[serde(default = "default_auth_host")]
    pub auth_host: String,

    /// Host serving the document database API
    #[serde(default = "default_database_host")]
    pub database_host: String,

    /// Project API key appended to authentication calls
    #[serde(default)]
    pub api_key: Option<String>,

    /// Timeout for plain (non-streaming) requests, in seconds
    #[serde(default = "default_request_timeout")]
    pub request_timeout_seconds: u64,
}

fn default_backend_type() -> String {
    "hosted".to_string()
}

fn default_auth_host() -> String {
    "https://auth.famchat.app".to_string()
}

fn default_database_host() -> String {
    "https://db.famchat.app".to_string()
}

fn default_request_timeout() -> u64 {
    30
}

impl Default for BackendConfig {
    fn default() -> Self {
        Self {
            backend_type: default_backend_type(),
            auth_host: default_auth_host(),
            database_host: default_database_host(),
            api_key: None,
            request_timeout_seconds: default_request_timeout(),
        }
    }
}

/// Chat presentation configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatConfig {
    /// Display label of the fixed family room
    #[serde(default = "default_family_room_name")]
    pub family_room_name: String,
}

fn default_family_room_name() -> String {
    "Family".to_string()
}

impl Default for ChatConfig {
    fn default() -> Self {
        Self {
            family_room_name: default_family_room_name(),
        }
    }
}

impl Config {
    /// Load configuration from file with environment overrides
    ///
    /// # Arguments
    ///
    /// * `path` - Path to the configuration file
    ///
    /// # Errors
    ///
    /// Returns error if the file exists but cannot be read or parsed.
    pub fn load(path: &str) -> Result<Self> {
        let mut config = if Path::new(path).exists() {
            Self::from_file(path)?
        } else {
            tracing::warn!("Config file not found at {}, using defaults", path);
            Self::default()
        };

        config.apply_env_vars();
        Ok(config)
    }

    /// The default config file location
    ///
    /// Prefers a repo-local `config/config.yaml`; otherwise falls back
    /// to the per-user configuration directory.
    pub fn default_path() -> String {
        let local = "config/config.yaml";
        if Path::new(local).exists() {
            return local.to_string();
        }

        if let Some(dirs) = directories::ProjectDirs::from("app", "famchat", "famchat") {
            return dirs.config_dir().join("config.yaml").display().to_string();
        }

        local.to_string()
    }

    fn from_file(path: &str) -> Result<Self> {
        let contents = std::fs::read_to_string(path)
            .map_err(|e| FamchatError::Config(format!("Failed to read config file: {}", e)))?;
        serde_yaml::from_str(&contents)
            .map_err(|e| FamchatError::Config(format!("Failed to parse config: {}", e)).into())
    }

    fn apply_env_vars(&mut self) {
        if let Ok(backend_type) = std::env::var("FAMCHAT_BACKEND") {
            self.backend.backend_type = backend_type;
        }

        if let Ok(auth_host) = std::env::var("FAMCHAT_AUTH_HOST") {
            self.backend.auth_host = auth_host;
        }

        if let Ok(database_host) = std::env::var("FAMCHAT_DATABASE_HOST") {
            self.backend.database_host = database_host;
        }

        if let Ok(api_key) = std::env::var("FAMCHAT_API_KEY") {
            self.backend.api_key = Some(api_key);
        }

        if let Ok(room_name) = std::env::var("FAMCHAT_FAMILY_ROOM_NAME") {
            self.chat.family_room_name = room_name;
        }

        if let Ok(timeout) = std::env::var("FAMCHAT_TIMEOUT_SECONDS") {
            if let Ok(value) = timeout.parse() {
                self.backend.request_timeout_seconds = value;
            } else {
                tracing::warn!("Invalid FAMCHAT_TIMEOUT_SECONDS: {}", timeout);
            }
        }
    }

    /// Validate the configuration
    ///
    /// # Errors
    ///
    /// Returns error if any validation check fails
    pub fn validate(&self) -> Result<()> {
        if self.backend.backend_type.is_empty() {
            return Err(FamchatError::Config("Backend type cannot be empty".to_string()).into());
        }

        let valid_backends = ["hosted"];
        if !valid_backends.contains(&self.backend.backend_type.as_str()) {
            return Err(FamchatError::Config(format!(
                "Invalid backend type: {}. Must be one of: {}",
                self.backend.backend_type,
                valid_backends.join(", ")
            ))
            .into());
        }

        url::Url::parse(&self.backend.auth_host)
            .map_err(|e| FamchatError::Config(format!("Invalid auth_host: {}", e)))?;
        url::Url::parse(&self.backend.database_host)
            .map_err(|e| FamchatError::Config(format!("Invalid database_host: {}", e)))?;

        if let Some(api_key) = &self.backend.api_key {
            if api_key.is_empty() {
                return Err(
                    FamchatError::Config("api_key must not be empty when set".to_string()).into(),
                );
            }
        }

        if self.backend.request_timeout_seconds == 0 {
            return Err(FamchatError::Config(
                "request_timeout_seconds must be greater than 0".to_string(),
            )
            .into());
        }

        if self.chat.family_room_name.trim().is_empty() {
            return Err(
                FamchatError::Config("family_room_name must not be blank".to_string()).into(),
            );
        }

        Ok(())
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            backend: BackendConfig::default(),
            chat: ChatConfig::default(),
        }
    }
}

/// Loose shape check for an email address
///
/// Sign-in validity is the auth collaborator's call; this only catches
/// obvious typos before a round-trip.
pub fn looks_like_email(candidate: &str) -> bool {
    regex::Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$")
        .map(|re| re.is_match(candidate))
        .unwrap_or(false)
}
