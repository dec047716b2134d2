//! Session observer
//!
//! Applies authentication state changes pushed by the auth
//! collaborator to the application state. On sign-in it loads the
//! profile record (degrading silently to an email-derived display name
//! when the record is missing) and the room directory. On sign-out it
//! releases the live subscription, then resets the view state, then
//! presents the login view — in that order, so no subscription
//! callback can mutate state after logout.

use crate::backend::{AuthState, DocumentStore, Identity};
use crate::error::Result;
use crate::rooms::RoomDirectory;
use crate::session::state::{AppState, Screen, Session};
use crate::session::subscription::SubscriptionManager;
use std::sync::Arc;

/// Sole writer of the authentication-derived fields of [`AppState`]
pub struct SessionObserver {
    store: Arc<dyn DocumentStore>,
    family_room_name: String,
}

impl SessionObserver {
    /// Creates an observer over the given document store
    pub fn new(store: Arc<dyn DocumentStore>, family_room_name: impl Into<String>) -> Self {
        Self {
            store,
            family_room_name: family_room_name.into(),
        }
    }

    /// Applies one authentication state change
    ///
    /// # Errors
    ///
    /// Returns error only for the room-directory fetch failure, which
    /// the caller surfaces as a blocking alert while the room list
    /// stays empty. Profile-fetch failures are logged and degraded,
    /// never returned.
    pub async fn apply(
        &self,
        change: AuthState,
        app: &mut AppState,
        subscriptions: &mut SubscriptionManager,
    ) -> Result<()> {
        match change {
            AuthState::SignedIn(identity) => self.on_signed_in(identity, app).await,
            AuthState::SignedOut => {
                self.on_signed_out(app, subscriptions);
                Ok(())
            }
        }
    }

    async fn on_signed_in(&self, identity: Identity, app: &mut AppState) -> Result<()> {
        let profile = match self.store.fetch_profile(&identity.user_id).await {
            Ok(profile) => {
                if profile.is_none() {
                    tracing::warn!("No profile record for {}", identity.user_id);
                }
                profile
            }
            Err(e) => {
                tracing::warn!("Failed to load profile for {}: {}", identity.user_id, e);
                None
            }
        };

        app.session = Some(Session::resolve(identity, profile));
        app.screen = Screen::RoomList;
        app.rooms.clear();

        let directory = RoomDirectory::load(self.store.as_ref(), &self.family_room_name).await?;
        app.rooms = directory.rooms;
        Ok(())
    }

    /// Release before reset before navigation; `reset` performs the
    /// last two.
    fn on_signed_out(&self, app: &mut AppState, subscriptions: &mut SubscriptionManager) {
        subscriptions.close_room();
        app.reset();
    }
}
