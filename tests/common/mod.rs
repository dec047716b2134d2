//! Shared test fixtures: a scripted in-memory backend implementing
//! both collaborator traits, with an observable live-subscription
//! count and per-room snapshot broadcasting.

// Each test binary uses its own subset of these helpers.
#![allow(dead_code)]

use async_trait::async_trait;
use famchat::backend::{
    AuthBackend, AuthState, ChatMessage, DocumentStore, Identity, MessageDraft,
    MessageSubscription, SnapshotEvent, SubscriptionGuard, UserProfile,
};
use famchat::error::{FamchatError, Result};
use famchat::rooms::RoomId;
use std::collections::{BTreeMap, HashMap};
use std::sync::atomic::{AtomicBool, AtomicU64, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use tokio::sync::{broadcast, mpsc, watch};
use tokio_util::sync::CancellationToken;

/// Scripted in-memory backend for integration tests
///
/// Registered users sign in with their scripted password; profiles are
/// served from a map; appended messages are logged with monotonically
/// assigned ids and timestamps; snapshots are delivered to live
/// subscriptions via per-room broadcast channels.
pub struct FakeBackend {
    auth_tx: watch::Sender<AuthState>,
    users: Mutex<HashMap<String, (String, Identity)>>,
    profiles: Mutex<BTreeMap<String, UserProfile>>,
    appended: Mutex<Vec<ChatMessage>>,
    rooms: Mutex<HashMap<String, broadcast::Sender<SnapshotEvent>>>,
    active_subscriptions: Arc<AtomicUsize>,
    next_id: AtomicU64,
    fail_appends: AtomicBool,
    fail_subscribes: AtomicBool,
}

/// Decrements the live-subscription count when a delivery task ends,
/// whether it finished, was canceled, or was aborted.
struct CountGuard(Arc<AtomicUsize>);

impl Drop for CountGuard {
    fn drop(&mut self) {
        self.0.fetch_sub(1, Ordering::SeqCst);
    }
}

impl FakeBackend {
    pub fn new() -> Self {
        let (auth_tx, _) = watch::channel(AuthState::SignedOut);
        Self {
            auth_tx,
            users: Mutex::new(HashMap::new()),
            profiles: Mutex::new(BTreeMap::new()),
            appended: Mutex::new(Vec::new()),
            rooms: Mutex::new(HashMap::new()),
            active_subscriptions: Arc::new(AtomicUsize::new(0)),
            next_id: AtomicU64::new(1),
            fail_appends: AtomicBool::new(false),
            fail_subscribes: AtomicBool::new(false),
        }
    }

    /// Register a user with a password and (optionally) a profile
    pub fn register_user(&self, email: &str, password: &str, profile: Option<UserProfile>) {
        let user_id = profile
            .as_ref()
            .map(|p| p.user_id.clone())
            .unwrap_or_else(|| format!("uid-{}", email.split('@').next().unwrap_or(email)));

        let identity = Identity::new(user_id.clone(), email);
        self.users
            .lock()
            .unwrap()
            .insert(email.to_string(), (password.to_string(), identity));

        if let Some(profile) = profile {
            self.profiles.lock().unwrap().insert(user_id, profile);
        }
    }

    /// Deliver a snapshot to the live subscription of a room, if any
    pub fn push_snapshot(&self, room_id: &RoomId, messages: Vec<ChatMessage>) {
        let _ = self
            .room_sender(room_id)
            .send(SnapshotEvent::Snapshot(messages));
    }

    /// Deliver a terminal subscription error to a room
    pub fn push_failure(&self, room_id: &RoomId, reason: &str) {
        let _ = self
            .room_sender(room_id)
            .send(SnapshotEvent::Failed(reason.to_string()));
    }

    /// All records appended so far, in insertion order
    pub fn appended(&self) -> Vec<ChatMessage> {
        self.appended.lock().unwrap().clone()
    }

    /// How many delivery tasks are currently live
    pub fn active_subscriptions(&self) -> usize {
        self.active_subscriptions.load(Ordering::SeqCst)
    }

    /// Make subsequent appends fail
    pub fn fail_appends(&self, fail: bool) {
        self.fail_appends.store(fail, Ordering::SeqCst);
    }

    /// Make subsequent subscribes fail
    pub fn fail_subscribes(&self, fail: bool) {
        self.fail_subscribes.store(fail, Ordering::SeqCst);
    }

    fn room_sender(&self, room_id: &RoomId) -> broadcast::Sender<SnapshotEvent> {
        self.rooms
            .lock()
            .unwrap()
            .entry(room_id.to_string())
            .or_insert_with(|| broadcast::channel(16).0)
            .clone()
    }
}

impl Default for FakeBackend {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl AuthBackend for FakeBackend {
    async fn sign_in(&self, email: &str, password: &str) -> Result<Identity> {
        let users = self.users.lock().unwrap();
        match users.get(email) {
            Some((scripted, identity)) if scripted == password => {
                let identity = identity.clone();
                drop(users);
                self.auth_tx
                    .send_replace(AuthState::SignedIn(identity.clone()));
                Ok(identity)
            }
            Some(_) => Err(FamchatError::Auth("INVALID_PASSWORD".to_string()).into()),
            None => Err(FamchatError::Auth("EMAIL_NOT_FOUND".to_string()).into()),
        }
    }

    async fn sign_out(&self) -> Result<()> {
        self.auth_tx.send_replace(AuthState::SignedOut);
        Ok(())
    }

    async fn restore(&self) -> Result<Option<Identity>> {
        Ok(self.auth_tx.borrow().identity().cloned())
    }

    fn auth_states(&self) -> watch::Receiver<AuthState> {
        self.auth_tx.subscribe()
    }
}

#[async_trait]
impl DocumentStore for FakeBackend {
    async fn fetch_profile(&self, user_id: &str) -> Result<Option<UserProfile>> {
        Ok(self.profiles.lock().unwrap().get(user_id).cloned())
    }

    async fn list_profiles(&self) -> Result<Vec<UserProfile>> {
        Ok(self.profiles.lock().unwrap().values().cloned().collect())
    }

    async fn append_message(&self, draft: &MessageDraft) -> Result<()> {
        if self.fail_appends.load(Ordering::SeqCst) {
            return Err(FamchatError::Send("scripted append failure".to_string()).into());
        }

        let n = self.next_id.fetch_add(1, Ordering::SeqCst);
        let message = ChatMessage::new(
            format!("m-{:04}", n),
            draft.room_id.clone(),
            draft.sender_id.clone(),
            draft.sender_name.clone(),
            draft.text.clone(),
            Some(1_700_000_000_000 + n as i64),
        );
        self.appended.lock().unwrap().push(message);
        Ok(())
    }

    async fn subscribe(&self, room_id: &RoomId) -> Result<MessageSubscription> {
        if self.fail_subscribes.load(Ordering::SeqCst) {
            return Err(FamchatError::Subscription("scripted subscribe failure".to_string()).into());
        }

        let mut snapshots = self.room_sender(room_id).subscribe();
        let (tx, events) = mpsc::channel(16);
        let token = CancellationToken::new();
        let child = token.clone();

        self.active_subscriptions.fetch_add(1, Ordering::SeqCst);
        let count_guard = CountGuard(self.active_subscriptions.clone());

        let task = tokio::spawn(async move {
            let _count_guard = count_guard;
            loop {
                tokio::select! {
                    _ = child.cancelled() => break,
                    received = snapshots.recv() => match received {
                        Ok(event) => {
                            if tx.send(event).await.is_err() {
                                break;
                            }
                        }
                        Err(_) => break,
                    },
                }
            }
        });

        Ok(MessageSubscription {
            room_id: room_id.clone(),
            events,
            guard: SubscriptionGuard::new(token, task),
        })
    }
}

/// Let spawned delivery tasks observe cancellation or new events
pub async fn settle() {
    tokio::time::sleep(std::time::Duration::from_millis(50)).await;
}

/// A profile fixture
pub fn profile(user_id: &str, name: &str, email: &str) -> UserProfile {
    UserProfile::new(user_id, name, email)
}
