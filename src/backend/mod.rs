//! Backend module for famchat
//!
//! This module contains the collaborator abstractions the client core
//! depends on — authentication and the realtime document store — and
//! the hosted HTTP/SSE implementation of both.

pub mod base;
pub mod hosted;

pub use base::{
    AuthBackend, AuthState, ChatMessage, DocumentStore, Identity, MessageDraft,
    MessageSubscription, SnapshotEvent, SubscriptionGuard, UserProfile,
};
pub use hosted::HostedBackend;

#[cfg(test)]
pub use base::{MockAuthBackend, MockDocumentStore};

use crate::config::BackendConfig;
use crate::error::{FamchatError, Result};
use std::sync::Arc;

/// The pair of collaborators the client talks to
///
/// Both halves may be served by the same underlying service (the
/// hosted backend implements both traits on one connection pool).
#[derive(Clone)]
pub struct Backend {
    /// Authentication collaborator
    pub auth: Arc<dyn AuthBackend>,
    /// Document store collaborator
    pub store: Arc<dyn DocumentStore>,
}

impl std::fmt::Debug for Backend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Backend").finish_non_exhaustive()
    }
}

/// Create a backend instance based on configuration
///
/// # Arguments
///
/// * `config` - Backend configuration (type, hosts, api key)
///
/// # Errors
///
/// Returns error if the backend type is unknown or initialization
/// fails.
pub fn create_backend(config: &BackendConfig) -> Result<Backend> {
    match config.backend_type.as_str() {
        "hosted" => {
            let hosted = Arc::new(HostedBackend::new(config.clone())?);
            Ok(Backend {
                auth: hosted.clone(),
                store: hosted,
            })
        }
        other => Err(FamchatError::Backend(format!("Unknown backend type: {}", other)).into()),
    }
}
