//! Message composer
//!
//! Holds the draft text and submits it to the document store with the
//! sender id and the denormalized sender display name. The draft is
//! cleared only after the write succeeds; on failure it is preserved so
//! the user may retry manually. A blank draft is a no-op and never
//! reaches the network.

use crate::backend::{DocumentStore, MessageDraft};
use crate::error::Result;
use crate::rooms::Room;
use crate::session::Session;

/// Outcome of a composer submission
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SendOutcome {
    /// The message was appended and the draft cleared
    Sent,
    /// The draft was blank; nothing was sent
    EmptyDraft,
}

/// The message input field and its send action
#[derive(Debug, Default)]
pub struct Composer {
    draft: String,
}

impl Composer {
    /// An empty composer
    pub fn new() -> Self {
        Self::default()
    }

    /// Replaces the draft text
    pub fn set_draft(&mut self, text: impl Into<String>) {
        self.draft = text.into();
    }

    /// The current draft text
    pub fn draft(&self) -> &str {
        &self.draft
    }

    /// Whether the draft is empty after trimming
    pub fn is_blank(&self) -> bool {
        self.draft.trim().is_empty()
    }

    /// Submits the draft to the given room
    ///
    /// The record carries the sender id, the session's resolved display
    /// name, and the raw draft text; the store assigns the timestamp.
    /// On success the draft is cleared. On failure the error propagates
    /// and the draft stays as it was.
    pub async fn send(
        &mut self,
        store: &dyn DocumentStore,
        session: &Session,
        room: &Room,
    ) -> Result<SendOutcome> {
        if self.is_blank() {
            return Ok(SendOutcome::EmptyDraft);
        }

        let draft = MessageDraft::new(
            room.id.clone(),
            session.identity.user_id.clone(),
            session.display_name.clone(),
            self.draft.clone(),
        );

        store.append_message(&draft).await?;

        self.draft.clear();
        Ok(SendOutcome::Sent)
    }
}
