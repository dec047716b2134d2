//! Session handling for famchat
//!
//! This module contains the application-state container, the session
//! observer that applies authentication state changes, and the
//! subscription lifecycle manager that owns the single live message
//! subscription.

pub mod observer;
pub mod state;
pub mod subscription;

pub use observer::SessionObserver;
pub use state::{AppState, Screen, Session};
pub use subscription::SubscriptionManager;
