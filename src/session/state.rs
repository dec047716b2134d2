//! Application view state
//!
//! One explicit container holds everything the view layer renders: the
//! session, the room list, the selected room, the message list, and
//! the active screen. The session observer is the sole writer of the
//! authentication-derived fields; the thread view's snapshot applier
//! is the sole writer of the message list while a room is open.

use crate::backend::{ChatMessage, Identity, UserProfile};
use crate::rooms::Room;
use std::fmt;

/// Which view is presented
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Screen {
    /// Email/password entry
    #[default]
    Login,
    /// The room list
    RoomList,
    /// One open message thread
    Thread,
}

impl fmt::Display for Screen {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Login => write!(f, "login"),
            Self::RoomList => write!(f, "rooms"),
            Self::Thread => write!(f, "thread"),
        }
    }
}

/// The in-memory representation of the authenticated user
///
/// Exists only for the process lifetime; destroyed on sign-out.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Session {
    /// The authenticated identity
    pub identity: Identity,
    /// The profile record, when one was found
    pub profile: Option<UserProfile>,
    /// Resolved display name: the profile's, or the email local part
    pub display_name: String,
}

impl Session {
    /// Resolves a session from an identity and an optional profile
    ///
    /// A missing profile (or one with a blank display name) degrades
    /// to the local part of the sign-in email.
    ///
    /// # Examples
    ///
    /// ```
    /// use famchat::backend::Identity;
    /// use famchat::session::Session;
    ///
    /// let session = Session::resolve(Identity::new("u1", "ana@example.com"), None);
    /// assert_eq!(session.display_name, "ana");
    /// ```
    pub fn resolve(identity: Identity, profile: Option<UserProfile>) -> Self {
        let display_name = profile
            .as_ref()
            .map(|p| p.display_name.trim())
            .filter(|name| !name.is_empty())
            .map(|name| name.to_string())
            .unwrap_or_else(|| fallback_display_name(&identity.email));

        Self {
            identity,
            profile,
            display_name,
        }
    }
}

/// Display-name fallback derived from an email address
fn fallback_display_name(email: &str) -> String {
    email.split('@').next().unwrap_or(email).to_string()
}

/// The application-state container observed by the view layer
#[derive(Debug, Default)]
pub struct AppState {
    /// Active screen
    pub screen: Screen,
    /// Authenticated session, if any
    pub session: Option<Session>,
    /// Rooms available to the user
    pub rooms: Vec<Room>,
    /// The room whose thread is open
    pub selected: Option<Room>,
    /// Messages of the open thread, in store order
    pub messages: Vec<ChatMessage>,
}

impl AppState {
    /// A fresh state presenting the login view
    pub fn new() -> Self {
        Self::default()
    }

    /// Resets every field to its initial empty value
    ///
    /// Called on sign-out, after the live subscription has been
    /// released.
    pub fn reset(&mut self) {
        self.screen = Screen::Login;
        self.session = None;
        self.rooms.clear();
        self.selected = None;
        self.messages.clear();
    }

    /// Wholesale-replaces the message list with a snapshot
    ///
    /// No merging or deduplication: the snapshot is the room's full
    /// result set as ordered by the store.
    pub fn apply_snapshot(&mut self, messages: Vec<ChatMessage>) {
        self.messages = messages;
    }

    /// Marks a room as open and presents its (initially empty) thread
    pub fn select_room(&mut self, room: Room) {
        self.selected = Some(room);
        self.messages.clear();
        self.screen = Screen::Thread;
    }

    /// Leaves the thread view, clearing its message list
    pub fn clear_thread(&mut self) {
        self.selected = None;
        self.messages.clear();
        self.screen = Screen::RoomList;
    }

    /// The resolved display name, when signed in
    pub fn display_name(&self) -> Option<&str> {
        self.session.as_ref().map(|s| s.display_name.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rooms::RoomId;

    fn message(id: &str, text: &str) -> ChatMessage {
        ChatMessage::new(id, RoomId::family(), "u1", "Ana", text, Some(1000))
    }

    #[test]
    fn test_session_resolve_uses_profile_display_name() {
        let identity = Identity::new("u1", "ana@example.com");
        let profile = UserProfile::new("u1", "Ana Maria", "ana@example.com");
        let session = Session::resolve(identity, Some(profile));
        assert_eq!(session.display_name, "Ana Maria");
    }

    #[test]
    fn test_session_resolve_falls_back_to_email_local_part() {
        let identity = Identity::new("u1", "ana@example.com");
        let session = Session::resolve(identity, None);
        assert_eq!(session.display_name, "ana");
        assert!(session.profile.is_none());
    }

    #[test]
    fn test_session_resolve_blank_profile_name_degrades() {
        let identity = Identity::new("u1", "ana@example.com");
        let profile = UserProfile::new("u1", "   ", "ana@example.com");
        let session = Session::resolve(identity, Some(profile));
        assert_eq!(session.display_name, "ana");
    }

    #[test]
    fn test_fallback_display_name_without_at_sign() {
        assert_eq!(fallback_display_name("ana"), "ana");
    }

    #[test]
    fn test_reset_clears_everything() {
        let mut state = AppState::new();
        state.screen = Screen::Thread;
        state.session = Some(Session::resolve(Identity::new("u1", "a@b.c"), None));
        state.rooms = vec![Room::family("Family", vec!["u1".into()])];
        state.selected = Some(Room::family("Family", vec!["u1".into()]));
        state.messages = vec![message("m1", "hello")];

        state.reset();

        assert_eq!(state.screen, Screen::Login);
        assert!(state.session.is_none());
        assert!(state.rooms.is_empty());
        assert!(state.selected.is_none());
        assert!(state.messages.is_empty());
    }

    #[test]
    fn test_apply_snapshot_replaces_wholesale() {
        let mut state = AppState::new();
        state.apply_snapshot(vec![message("m1", "one"), message("m2", "two")]);
        assert_eq!(state.messages.len(), 2);

        // The second snapshot fully replaces the first, even when smaller.
        state.apply_snapshot(vec![message("m3", "three")]);
        assert_eq!(state.messages.len(), 1);
        assert_eq!(state.messages[0].text, "three");
    }

    #[test]
    fn test_select_room_presents_empty_thread() {
        let mut state = AppState::new();
        state.messages = vec![message("m1", "stale")];
        state.select_room(Room::family("Family", vec![]));

        assert_eq!(state.screen, Screen::Thread);
        assert!(state.messages.is_empty());
        assert!(state.selected.is_some());
    }

    #[test]
    fn test_clear_thread_returns_to_room_list() {
        let mut state = AppState::new();
        state.select_room(Room::family("Family", vec![]));
        state.apply_snapshot(vec![message("m1", "hello")]);

        state.clear_thread();

        assert_eq!(state.screen, Screen::RoomList);
        assert!(state.selected.is_none());
        assert!(state.messages.is_empty());
    }

    #[test]
    fn test_screen_display() {
        assert_eq!(Screen::Login.to_string(), "login");
        assert_eq!(Screen::RoomList.to_string(), "rooms");
        assert_eq!(Screen::Thread.to_string(), "thread");
    }
}
