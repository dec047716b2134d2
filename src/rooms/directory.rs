//! Room directory
//!
//! The directory is rebuilt on every entry to the room-list view: it
//! fetches all known user profiles from the document store and
//! synthesizes the single fixed family room whose membership is that
//! full user list. No room records exist in the store.

use crate::backend::{DocumentStore, UserProfile};
use crate::error::{FamchatError, Result};
use crate::rooms::Room;

/// The synthesized set of rooms available to the user
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RoomDirectory {
    /// All known user profiles, membership of the family room
    pub members: Vec<UserProfile>,
    /// The rooms to present, currently just the family group
    pub rooms: Vec<Room>,
}

impl RoomDirectory {
    /// Fetch all user profiles and synthesize the family room
    ///
    /// A fetch failure is surfaced as a [`FamchatError::Directory`]
    /// error; the caller alerts and keeps its room list empty.
    pub async fn load(store: &dyn DocumentStore, family_room_name: &str) -> Result<Self> {
        let members = store
            .list_profiles()
            .await
            .map_err(|e| FamchatError::Directory(e.to_string()))?;

        let participants = members.iter().map(|p| p.user_id.clone()).collect();
        let rooms = vec![Room::family(family_room_name, participants)];

        Ok(Self { members, rooms })
    }
}
