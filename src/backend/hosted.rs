//! Hosted backend implementation for famchat
//!
//! This module implements both collaborator traits against the hosted
//! family-chat service: identity-toolkit style password sign-in, JSON
//! document reads and appends under the database host, and a
//! server-sent-events stream that delivers the full ordered message set
//! of one room on every change. The signed-in credential is cached in
//! the system keyring so a restarted process can re-derive its session
//! without prompting.

use crate::backend::{
    AuthBackend, AuthState, ChatMessage, DocumentStore, Identity, MessageDraft,
    MessageSubscription, SnapshotEvent, SubscriptionGuard, UserProfile,
};
use crate::config::BackendConfig;
use crate::error::{FamchatError, Result};
use crate::rooms::RoomId;

use async_trait::async_trait;
use bytes::Bytes;
use futures::StreamExt;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::sync::RwLock;
use std::time::Duration;
use tokio::sync::{mpsc, watch};
use tokio_util::sync::CancellationToken;

/// Buffered snapshot events per subscription before backpressure
const SNAPSHOT_CHANNEL_CAPACITY: usize = 16;

/// Hosted family-chat service client
///
/// One instance serves both collaborator roles. Plain requests go
/// through a client with a total request timeout; the snapshot stream
/// uses a second client with only a connect timeout, since the stream
/// is expected to stay open indefinitely.
pub struct HostedBackend {
    client: Client,
    stream_client: Client,
    config: BackendConfig,
    auth_tx: watch::Sender<AuthState>,
    credential: RwLock<Option<CachedCredential>>,
    keyring_service: String,
    keyring_user: String,
}

/// Credential persisted across process restarts
#[derive(Debug, Clone, Serialize, Deserialize)]
struct CachedCredential {
    user_id: String,
    email: String,
    id_token: String,
}

/// Request body for password sign-in
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct SignInRequest<'a> {
    email: &'a str,
    password: &'a str,
    return_secure_token: bool,
}

/// Response body for a successful password sign-in
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SignInResponse {
    local_id: String,
    id_token: String,
    #[serde(default)]
    email: Option<String>,
}

/// Profile document as stored under `users/{uid}`
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ProfileDocument {
    #[serde(default)]
    display_name: String,
    #[serde(default)]
    email: String,
}

impl ProfileDocument {
    fn into_profile(self, user_id: String) -> UserProfile {
        UserProfile {
            user_id,
            display_name: self.display_name,
            email: self.email,
        }
    }
}

/// Message document as stored under `rooms/{room}/messages/{id}`
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct MessageDocument {
    #[serde(default)]
    sender_id: String,
    #[serde(default)]
    sender_name: String,
    #[serde(default)]
    text: String,
    /// Either the server-assigned epoch milliseconds or, transiently,
    /// the unresolved server-timestamp sentinel object
    #[serde(default)]
    timestamp: Option<serde_json::Value>,
}

impl MessageDocument {
    fn into_message(self, id: String, room_id: RoomId) -> ChatMessage {
        let timestamp = self.timestamp.as_ref().and_then(|v| v.as_i64());
        ChatMessage {
            id,
            room_id,
            sender_id: self.sender_id,
            sender_name: self.sender_name,
            text: self.text,
            timestamp,
        }
    }
}

/// Message document as written by the composer
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct MessageWrite<'a> {
    sender_id: &'a str,
    sender_name: &'a str,
    text: &'a str,
    /// Server-timestamp sentinel; the store replaces it at write time
    timestamp: serde_json::Value,
}

impl HostedBackend {
    /// Creates a hosted backend from configuration
    ///
    /// # Errors
    ///
    /// Returns error if the HTTP clients cannot be constructed.
    pub fn new(config: BackendConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.request_timeout_seconds))
            .build()
            .map_err(|e| FamchatError::Backend(format!("Failed to create HTTP client: {}", e)))?;

        // No total timeout here: the snapshot stream stays open.
        let stream_client = Client::builder()
            .connect_timeout(Duration::from_secs(config.request_timeout_seconds))
            .build()
            .map_err(|e| {
                FamchatError::Backend(format!("Failed to create stream client: {}", e))
            })?;

        let (auth_tx, _) = watch::channel(AuthState::SignedOut);

        Ok(Self {
            client,
            stream_client,
            config,
            auth_tx,
            credential: RwLock::new(None),
            keyring_service: "famchat".to_string(),
            keyring_user: "session".to_string(),
        })
    }

    /// The auth endpoint for a given operation name
    fn auth_url(&self, operation: &str) -> String {
        format!(
            "{}/v1/accounts:{}",
            self.config.auth_host.trim_end_matches('/'),
            operation
        )
    }

    /// The database endpoint for a given document path
    fn db_url(&self, path: &str) -> String {
        format!(
            "{}/{}.json",
            self.config.database_host.trim_end_matches('/'),
            path
        )
    }

    /// Current id token, if signed in
    fn auth_token(&self) -> Option<String> {
        self.credential
            .read()
            .ok()
            .and_then(|c| c.as_ref().map(|c| c.id_token.clone()))
    }

    fn set_credential(&self, credential: Option<CachedCredential>) {
        if let Ok(mut slot) = self.credential.write() {
            *slot = credential;
        }
    }

    /// Get cached credential from the system keyring
    fn cached_credential(&self) -> Result<CachedCredential> {
        let entry = keyring::Entry::new(&self.keyring_service, &self.keyring_user)?;

        let json = entry.get_password()?;
        if json.is_empty() {
            return Err(FamchatError::NotSignedIn("credential cache is empty".to_string()).into());
        }

        Ok(serde_json::from_str(&json)?)
    }

    /// Cache the credential in the system keyring (best-effort)
    fn cache_credential(&self, credential: &CachedCredential) {
        let stored = keyring::Entry::new(&self.keyring_service, &self.keyring_user)
            .and_then(|entry| {
                let json = serde_json::to_string(credential).unwrap_or_default();
                entry.set_password(&json)
            });

        if let Err(e) = stored {
            tracing::warn!("Failed to cache session credential in keyring: {}", e);
        }
    }

    /// Clear the cached credential from the system keyring (best-effort)
    ///
    /// Uses `set_password("")` as a widely-available invalidation step
    /// rather than relying on a delete API that varies between
    /// environments.
    fn clear_cached_credential(&self) {
        match keyring::Entry::new(&self.keyring_service, &self.keyring_user) {
            Ok(entry) => {
                if let Err(e) = entry.set_password("") {
                    tracing::warn!("Failed to clear cached session credential: {}", e);
                } else {
                    tracing::info!("Cleared cached session credential in keyring");
                }
            }
            Err(e) => {
                tracing::warn!("Keyring not available while clearing credential: {}", e);
            }
        }
    }
}

#[async_trait]
impl AuthBackend for HostedBackend {
    async fn sign_in(&self, email: &str, password: &str) -> Result<Identity> {
        let mut request = self.client.post(self.auth_url("signInWithPassword")).json(
            &SignInRequest {
                email,
                password,
                return_secure_token: true,
            },
        );
        if let Some(key) = &self.config.api_key {
            request = request.query(&[("key", key.as_str())]);
        }

        let response = request
            .send()
            .await
            .map_err(|e| FamchatError::Auth(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(FamchatError::Auth(extract_error_reason(&body, status)).into());
        }

        let body: SignInResponse = response
            .json()
            .await
            .map_err(|e| FamchatError::Auth(format!("Malformed sign-in response: {}", e)))?;

        let identity = Identity::new(
            body.local_id.clone(),
            body.email.unwrap_or_else(|| email.to_string()),
        );
        let credential = CachedCredential {
            user_id: identity.user_id.clone(),
            email: identity.email.clone(),
            id_token: body.id_token,
        };

        self.cache_credential(&credential);
        self.set_credential(Some(credential));
        self.auth_tx
            .send_replace(AuthState::SignedIn(identity.clone()));

        tracing::info!("Signed in as {}", identity.email);
        Ok(identity)
    }

    async fn sign_out(&self) -> Result<()> {
        self.set_credential(None);
        self.clear_cached_credential();
        self.auth_tx.send_replace(AuthState::SignedOut);
        tracing::info!("Signed out");
        Ok(())
    }

    async fn restore(&self) -> Result<Option<Identity>> {
        if let Ok(slot) = self.credential.read() {
            if let Some(credential) = slot.as_ref() {
                return Ok(Some(Identity::new(
                    credential.user_id.clone(),
                    credential.email.clone(),
                )));
            }
        }

        match self.cached_credential() {
            Ok(credential) => {
                let identity = Identity::new(credential.user_id.clone(), credential.email.clone());
                self.set_credential(Some(credential));
                self.auth_tx
                    .send_replace(AuthState::SignedIn(identity.clone()));
                tracing::info!("Restored session for {}", identity.email);
                Ok(Some(identity))
            }
            Err(e) => {
                tracing::debug!("No persisted session to restore: {}", e);
                Ok(None)
            }
        }
    }

    fn auth_states(&self) -> watch::Receiver<AuthState> {
        self.auth_tx.subscribe()
    }
}

#[async_trait]
impl DocumentStore for HostedBackend {
    async fn fetch_profile(&self, user_id: &str) -> Result<Option<UserProfile>> {
        let mut request = self.client.get(self.db_url(&format!("users/{}", user_id)));
        if let Some(token) = self.auth_token() {
            request = request.query(&[("auth", token.as_str())]);
        }

        let response = request
            .send()
            .await
            .map_err(|e| FamchatError::Profile(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(FamchatError::Profile(format!("{}: {}", status, body)).into());
        }

        let document: Option<ProfileDocument> = response
            .json()
            .await
            .map_err(|e| FamchatError::Profile(format!("Malformed profile record: {}", e)))?;

        Ok(document.map(|d| d.into_profile(user_id.to_string())))
    }

    async fn list_profiles(&self) -> Result<Vec<UserProfile>> {
        let mut request = self.client.get(self.db_url("users"));
        if let Some(token) = self.auth_token() {
            request = request.query(&[("auth", token.as_str())]);
        }

        let response = request
            .send()
            .await
            .map_err(|e| FamchatError::Directory(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(FamchatError::Directory(format!("{}: {}", status, body)).into());
        }

        let documents: Option<BTreeMap<String, ProfileDocument>> = response
            .json()
            .await
            .map_err(|e| FamchatError::Directory(format!("Malformed user list: {}", e)))?;

        Ok(documents
            .unwrap_or_default()
            .into_iter()
            .map(|(user_id, doc)| doc.into_profile(user_id))
            .collect())
    }

    async fn append_message(&self, draft: &MessageDraft) -> Result<()> {
        let write = MessageWrite {
            sender_id: &draft.sender_id,
            sender_name: &draft.sender_name,
            text: &draft.text,
            timestamp: serde_json::json!({ ".sv": "timestamp" }),
        };

        let mut request = self
            .client
            .post(self.db_url(&format!("rooms/{}/messages", draft.room_id)))
            .json(&write);
        if let Some(token) = self.auth_token() {
            request = request.query(&[("auth", token.as_str())]);
        }

        let response = request
            .send()
            .await
            .map_err(|e| FamchatError::Send(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(FamchatError::Send(format!("{}: {}", status, body)).into());
        }

        Ok(())
    }

    async fn subscribe(&self, room_id: &RoomId) -> Result<MessageSubscription> {
        let url = self.db_url(&format!("rooms/{}/messages", room_id));
        let client = self.stream_client.clone();
        let auth = self.auth_token();
        let room = room_id.clone();

        let token = CancellationToken::new();
        let (tx, rx) = mpsc::channel(SNAPSHOT_CHANNEL_CAPACITY);

        let stream_token = token.clone();
        let task = tokio::spawn(async move {
            tokio::select! {
                _ = stream_token.cancelled() => {}
                _ = stream_snapshots(client, url, auth, room, tx) => {}
            }
        });

        Ok(MessageSubscription {
            room_id: room_id.clone(),
            events: rx,
            guard: SubscriptionGuard::new(token, task),
        })
    }
}

/// Run one snapshot stream until it fails or the receiver goes away
///
/// Opens the SSE request ordered by send time, accumulates chunk bytes
/// into lines, and forwards every non-keep-alive `data:` payload as a
/// parsed, ordered snapshot. A transport error, a non-success status,
/// or stream end is delivered as a terminal [`SnapshotEvent::Failed`].
async fn stream_snapshots(
    client: Client,
    url: String,
    auth: Option<String>,
    room: RoomId,
    tx: mpsc::Sender<SnapshotEvent>,
) {
    let mut request = client
        .get(&url)
        .query(&[("orderBy", "\"timestamp\"")])
        .header(reqwest::header::ACCEPT, "text/event-stream");
    if let Some(token) = &auth {
        request = request.query(&[("auth", token.as_str())]);
    }

    let response = match request.send().await {
        Ok(response) => response,
        Err(e) => {
            let _ = tx.send(SnapshotEvent::Failed(e.to_string())).await;
            return;
        }
    };

    let status = response.status();
    if !status.is_success() {
        let body = response.text().await.unwrap_or_default();
        let _ = tx
            .send(SnapshotEvent::Failed(format!("{}: {}", status, body)))
            .await;
        return;
    }

    let mut byte_stream = response.bytes_stream();
    let mut buffer = String::new();

    while let Some(chunk) = byte_stream.next().await {
        let chunk: Bytes = match chunk {
            Ok(chunk) => chunk,
            Err(e) => {
                let _ = tx.send(SnapshotEvent::Failed(e.to_string())).await;
                return;
            }
        };

        buffer.push_str(&String::from_utf8_lossy(&chunk));

        for payload in take_sse_payloads(&mut buffer) {
            match parse_snapshot(&payload, &room) {
                Ok(messages) => {
                    if tx.send(SnapshotEvent::Snapshot(messages)).await.is_err() {
                        return;
                    }
                }
                Err(e) => {
                    tracing::warn!("Discarding malformed snapshot payload: {}", e);
                }
            }
        }
    }

    let _ = tx
        .send(SnapshotEvent::Failed("snapshot stream ended".to_string()))
        .await;
}

/// Pop complete lines off the buffer and return `data:` payloads
///
/// Keep-alive payloads (`null`, `[PING]`, empty) are dropped silently;
/// `event:` and `id:` lines carry no payload and are skipped. Partial
/// trailing lines stay in the buffer for the next chunk.
fn take_sse_payloads(buffer: &mut String) -> Vec<String> {
    let mut payloads = Vec::new();

    while let Some(newline) = buffer.find('\n') {
        let line: String = buffer.drain(..=newline).collect();
        let line = line.trim_end_matches(&['\n', '\r'][..]);

        if let Some(payload) = line.strip_prefix("data:") {
            let payload = payload.trim();
            if payload.is_empty() || payload == "null" || payload.eq_ignore_ascii_case("[ping]") {
                continue;
            }
            payloads.push(payload.to_string());
        }
    }

    payloads
}

/// Parse one snapshot payload into the room's ordered message list
///
/// The payload is the full document map for the room (or JSON `null`
/// when the room is empty). Materializes the store's ordering: send
/// timestamp ascending, ties broken by document id, which the store
/// assigns in insertion order. Documents whose server timestamp has
/// not resolved yet sort last.
fn parse_snapshot(payload: &str, room: &RoomId) -> Result<Vec<ChatMessage>> {
    let documents: Option<BTreeMap<String, MessageDocument>> = serde_json::from_str(payload)?;

    let mut messages: Vec<ChatMessage> = documents
        .unwrap_or_default()
        .into_iter()
        .map(|(id, doc)| doc.into_message(id, room.clone()))
        .collect();

    messages.sort_by(|a, b| {
        let a_key = (a.timestamp.unwrap_or(i64::MAX), a.id.as_str());
        let b_key = (b.timestamp.unwrap_or(i64::MAX), b.id.as_str());
        a_key.cmp(&b_key)
    });

    Ok(messages)
}

/// Extract the verbatim failure reason from an auth error body
///
/// The service reports `{"error": {"message": "..."}}`; when the body
/// does not parse, the status line and raw body stand in.
fn extract_error_reason(body: &str, status: reqwest::StatusCode) -> String {
    serde_json::from_str::<serde_json::Value>(body)
        .ok()
        .and_then(|v| {
            v.get("error")
                .and_then(|e| e.get("message"))
                .and_then(|m| m.as_str())
                .map(|s| s.to_string())
        })
        .unwrap_or_else(|| format!("{}: {}", status, body))
}
