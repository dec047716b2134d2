//! Collaborator traits and common types for famchat
//!
//! This module defines the two seams the client core depends on — the
//! authentication collaborator and the document store collaborator —
//! along with the shared identity, profile, and message types that
//! cross them. The concrete wire behavior (REST, SSE, credential
//! persistence) lives entirely behind these traits.

use crate::error::Result;
use crate::rooms::RoomId;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

#[cfg(test)]
use mockall::automock;

/// The authenticated identity as issued by the auth collaborator
///
/// The `user_id` is opaque and owned by the auth provider; the email is
/// the credential the user signed in with and doubles as the source of
/// the degraded display-name fallback.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Identity {
    /// Opaque user id assigned by the auth provider
    pub user_id: String,
    /// Email address the identity signed in with
    pub email: String,
}

impl Identity {
    /// Creates a new identity
    ///
    /// # Examples
    ///
    /// ```
    /// use famchat::backend::Identity;
    ///
    /// let id = Identity::new("u1", "ana@example.com");
    /// assert_eq!(id.user_id, "u1");
    /// ```
    pub fn new(user_id: impl Into<String>, email: impl Into<String>) -> Self {
        Self {
            user_id: user_id.into(),
            email: email.into(),
        }
    }
}

/// A user profile record from the document store
///
/// Profiles are created by an out-of-band registration process and are
/// read-only from this client's perspective.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserProfile {
    /// Opaque user id (the record key in the store)
    pub user_id: String,
    /// Display name chosen at registration
    pub display_name: String,
    /// Email address on file
    pub email: String,
}

impl UserProfile {
    /// Creates a new profile record
    pub fn new(
        user_id: impl Into<String>,
        display_name: impl Into<String>,
        email: impl Into<String>,
    ) -> Self {
        Self {
            user_id: user_id.into(),
            display_name: display_name.into(),
            email: email.into(),
        }
    }
}

/// A message as it exists in the document store
///
/// Immutable once created. The id and the send timestamp are assigned
/// by the store at write time; the sender display name is denormalized
/// into the record by the composer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatMessage {
    /// Store-assigned document id (insertion-ordered)
    pub id: String,
    /// Identifier of the room this message belongs to
    pub room_id: RoomId,
    /// User id of the sender
    pub sender_id: String,
    /// Display name of the sender at send time
    pub sender_name: String,
    /// Raw text body
    pub text: String,
    /// Send time in milliseconds since the epoch; `None` while the
    /// server-assigned value has not reached this client yet
    pub timestamp: Option<i64>,
}

impl ChatMessage {
    /// Creates a message record (primarily useful in tests and fakes)
    pub fn new(
        id: impl Into<String>,
        room_id: RoomId,
        sender_id: impl Into<String>,
        sender_name: impl Into<String>,
        text: impl Into<String>,
        timestamp: Option<i64>,
    ) -> Self {
        Self {
            id: id.into(),
            room_id,
            sender_id: sender_id.into(),
            sender_name: sender_name.into(),
            text: text.into(),
            timestamp,
        }
    }

    /// An `HH:MM` label for the send time, empty while unassigned
    ///
    /// # Examples
    ///
    /// ```
    /// use famchat::backend::ChatMessage;
    /// use famchat::rooms::RoomId;
    ///
    /// let msg = ChatMessage::new("m1", RoomId::family(), "u1", "Ana", "hi", None);
    /// assert_eq!(msg.time_label(), "");
    /// ```
    pub fn time_label(&self) -> String {
        use chrono::TimeZone;

        match self.timestamp {
            Some(millis) => match chrono::Utc.timestamp_millis_opt(millis) {
                chrono::LocalResult::Single(dt) => dt.format("%H:%M").to_string(),
                _ => String::new(),
            },
            None => String::new(),
        }
    }
}

/// What the composer submits to the store
///
/// The store adds the document id and the send timestamp.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MessageDraft {
    /// Identifier of the room the message is sent to
    pub room_id: RoomId,
    /// User id of the sender
    pub sender_id: String,
    /// Display name of the sender, denormalized at send time
    pub sender_name: String,
    /// Raw text body
    pub text: String,
}

impl MessageDraft {
    /// Creates a draft for the given room and sender
    pub fn new(
        room_id: RoomId,
        sender_id: impl Into<String>,
        sender_name: impl Into<String>,
        text: impl Into<String>,
    ) -> Self {
        Self {
            room_id,
            sender_id: sender_id.into(),
            sender_name: sender_name.into(),
            text: text.into(),
        }
    }
}

/// Authentication state as pushed by the auth collaborator
///
/// Delivered over a `watch` channel: the receiver always observes the
/// current identity or none, never a history of transitions.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AuthState {
    /// No authenticated identity
    SignedOut,
    /// An authenticated identity is present
    SignedIn(Identity),
}

impl AuthState {
    /// Returns true when an identity is present
    pub fn is_signed_in(&self) -> bool {
        matches!(self, Self::SignedIn(_))
    }

    /// The identity, if any
    pub fn identity(&self) -> Option<&Identity> {
        match self {
            Self::SignedIn(identity) => Some(identity),
            Self::SignedOut => None,
        }
    }
}

/// One delivery from a live message subscription
///
/// A snapshot is the full, ordered result set for the subscribed room
/// and wholesale-replaces whatever the client held before. An error is
/// terminal for the subscription.
#[derive(Debug, Clone)]
pub enum SnapshotEvent {
    /// Full replacement of the room's message list
    Snapshot(Vec<ChatMessage>),
    /// The subscription failed; no further events will arrive
    Failed(String),
}

/// Scoped handle to a live subscription's delivery task
///
/// Dropping the guard cancels the token the delivery task selects on
/// and aborts the task, so the subscription is released on every exit
/// path: explicit close, room switch, sign-out, or unwinding.
#[derive(Debug)]
pub struct SubscriptionGuard {
    token: CancellationToken,
    task: Option<JoinHandle<()>>,
}

impl SubscriptionGuard {
    /// Wraps a cancellation token and the task it governs
    pub fn new(token: CancellationToken, task: JoinHandle<()>) -> Self {
        Self {
            token,
            task: Some(task),
        }
    }

    /// Cancels the delivery task; safe to call more than once
    pub fn release(&mut self) {
        self.token.cancel();
        if let Some(task) = self.task.take() {
            task.abort();
        }
    }

    /// Whether the guard has been released
    pub fn is_released(&self) -> bool {
        self.token.is_cancelled()
    }
}

impl Drop for SubscriptionGuard {
    fn drop(&mut self) {
        self.release();
    }
}

/// A live, room-scoped message subscription
///
/// The receiver yields [`SnapshotEvent`]s in delivery order; the guard
/// owns the underlying stream task.
#[derive(Debug)]
pub struct MessageSubscription {
    /// The room this subscription is scoped to
    pub room_id: RoomId,
    /// Snapshot/error event receiver
    pub events: mpsc::Receiver<SnapshotEvent>,
    /// Scoped release handle for the delivery task
    pub guard: SubscriptionGuard,
}

/// Authentication collaborator
///
/// Checks credentials, persists the session credential across process
/// restarts, and pushes authentication state changes. Sign-out always
/// succeeds locally regardless of network state.
#[cfg_attr(test, automock)]
#[async_trait]
pub trait AuthBackend: Send + Sync {
    /// Sign in with an email/password pair
    ///
    /// On failure the error reason string is surfaced verbatim to the
    /// user.
    async fn sign_in(&self, email: &str, password: &str) -> Result<Identity>;

    /// Sign out; always succeeds locally
    async fn sign_out(&self) -> Result<()>;

    /// Re-derive the session from the locally persisted credential
    async fn restore(&self) -> Result<Option<Identity>>;

    /// Subscribe to authentication state changes
    ///
    /// The receiver observes the current [`AuthState`] at all times.
    fn auth_states(&self) -> watch::Receiver<AuthState>;
}

/// Document store collaborator
///
/// Reads profile records, appends message documents with a
/// store-assigned timestamp, and serves filtered, ordered live queries
/// as full-snapshot subscriptions.
#[cfg_attr(test, automock)]
#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// Read one profile record by user id
    async fn fetch_profile(&self, user_id: &str) -> Result<Option<UserProfile>>;

    /// Read all profile records
    async fn list_profiles(&self) -> Result<Vec<UserProfile>>;

    /// Append one message document; the store assigns id and timestamp
    async fn append_message(&self, draft: &MessageDraft) -> Result<()>;

    /// Open a live subscription for one room, ordered by send time
    /// ascending, delivering full snapshots
    async fn subscribe(&self, room_id: &RoomId) -> Result<MessageSubscription>;
}
