//! Room identity for famchat
//!
//! A room is a named conversation scope: either the single fixed family
//! group or a derived two-party pairing. The room identifier is a pure
//! function of membership — the group room's id is a constant, and a
//! two-party id is the two participant ids under a total, byte-wise
//! ordering joined with a fixed separator, so the same pair always maps
//! to the same id regardless of argument order.

pub mod directory;

pub use directory::RoomDirectory;

use crate::error::{FamchatError, Result};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Identifier of the single fixed group room
pub const FAMILY_ROOM_ID: &str = "family-group";

/// Separator between the sorted participant ids of a two-party room
const PAIR_SEPARATOR: char = '_';

/// The deterministic key used to filter messages belonging to one room
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RoomId(String);

impl RoomId {
    /// Wraps an already-derived identifier
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// The fixed group room's identifier
    ///
    /// # Examples
    ///
    /// ```
    /// use famchat::rooms::RoomId;
    ///
    /// assert_eq!(RoomId::family().as_str(), "family-group");
    /// ```
    pub fn family() -> Self {
        Self(FAMILY_ROOM_ID.to_string())
    }

    /// The identifier as a string slice
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Whether this is the fixed group room
    pub fn is_family(&self) -> bool {
        self.0 == FAMILY_ROOM_ID
    }
}

impl fmt::Display for RoomId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Derive the identifier of a two-party room
///
/// The two participant ids are sorted byte-wise (total and
/// locale-independent) and joined with `_`, so the result is identical
/// regardless of argument order and distinct for any distinct pair.
/// Self-chats are rejected: deriving a room for a single participant is
/// an error rather than a silently degenerate id.
///
/// # Examples
///
/// ```
/// use famchat::rooms::derive_room_id;
///
/// let id = derive_room_id("bob", "alice").unwrap();
/// assert_eq!(id.as_str(), "alice_bob");
/// assert_eq!(derive_room_id("alice", "bob").unwrap(), id);
/// assert!(derive_room_id("alice", "alice").is_err());
/// ```
pub fn derive_room_id(a: &str, b: &str) -> Result<RoomId> {
    if a == b {
        return Err(FamchatError::SelfChat(a.to_string()).into());
    }

    let (first, second) = if a <= b { (a, b) } else { (b, a) };
    Ok(RoomId(format!("{first}{PAIR_SEPARATOR}{second}")))
}

/// Whether a room is the fixed group or a two-party pairing
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RoomKind {
    /// The single fixed family group
    Group,
    /// A derived two-party room
    Direct,
}

impl fmt::Display for RoomKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Group => write!(f, "Group"),
            Self::Direct => write!(f, "Individual"),
        }
    }
}

/// A named conversation scope
///
/// No room entity is persisted; a room exists only as its derived id,
/// an in-memory name label, and the membership it was synthesized from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Room {
    /// Deterministic identifier used to filter the room's messages
    pub id: RoomId,
    /// Display label
    pub name: String,
    /// Group or two-party
    pub kind: RoomKind,
    /// User ids of the participants
    pub participants: Vec<String>,
}

impl Room {
    /// Builds the fixed group room over the given membership
    pub fn family(name: impl Into<String>, participants: Vec<String>) -> Self {
        Self {
            id: RoomId::family(),
            name: name.into(),
            kind: RoomKind::Group,
            participants,
        }
    }

    /// Builds a two-party room between the given participants
    ///
    /// The id is derived; the participants are stored in derivation
    /// order so the room compares equal no matter which side built it.
    pub fn direct(name: impl Into<String>, a: &str, b: &str) -> Result<Self> {
        let id = derive_room_id(a, b)?;
        let mut participants = vec![a.to_string(), b.to_string()];
        participants.sort();
        Ok(Self {
            id,
            name: name.into(),
            kind: RoomKind::Direct,
            participants,
        })
    }
}
