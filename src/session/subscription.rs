//! Subscription lifecycle manager
//!
//! The one place in this client where a live network resource is
//! acquired. The manager holds at most one subscription at a time,
//! scoped to exactly one room: opening a room cancels any prior
//! subscription before the new one is created, and closing with no
//! active subscription is a no-op. Release is guaranteed on every exit
//! path because the retained [`SubscriptionGuard`] cancels its stream
//! task on drop.

use crate::backend::{DocumentStore, MessageSubscription, SnapshotEvent, SubscriptionGuard};
use crate::error::Result;
use crate::rooms::{Room, RoomId};
use tokio::sync::mpsc;

/// Owner of the single active live message subscription
///
/// No other component may hold or cancel the subscription directly.
#[derive(Debug, Default)]
pub struct SubscriptionManager {
    active: Option<ActiveSubscription>,
}

#[derive(Debug)]
struct ActiveSubscription {
    room_id: RoomId,
    guard: SubscriptionGuard,
}

impl SubscriptionManager {
    /// A manager with no active subscription
    pub fn new() -> Self {
        Self::default()
    }

    /// Opens a live subscription for the given room
    ///
    /// Any prior subscription is canceled first, so two successive
    /// calls never leave two subscriptions alive. Returns the snapshot
    /// event receiver; the guard stays with the manager.
    pub async fn open_room(
        &mut self,
        store: &dyn DocumentStore,
        room: &Room,
    ) -> Result<mpsc::Receiver<SnapshotEvent>> {
        self.close_room();

        let MessageSubscription {
            room_id,
            events,
            guard,
        } = store.subscribe(&room.id).await?;

        self.active = Some(ActiveSubscription { room_id, guard });
        Ok(events)
    }

    /// Cancels the active subscription, if any
    ///
    /// Safe to call when nothing is active; the drop of the retained
    /// guard releases the stream task.
    pub fn close_room(&mut self) {
        if let Some(active) = self.active.take() {
            tracing::debug!("Closing subscription for room {}", active.room_id);
            drop(active);
        }
    }

    /// The room the active subscription is scoped to, if any
    pub fn active_room(&self) -> Option<&RoomId> {
        self.active.as_ref().map(|a| &a.room_id)
    }

    /// Whether a subscription is currently live
    pub fn is_active(&self) -> bool {
        self.active.is_some()
    }
}
