//! Session flow integration tests
//!
//! Drives the session observer with auth-state changes pushed by the
//! scripted backend: sign-in with and without a profile record, room
//! directory synthesis, and the sign-out teardown ordering.

mod common;

use common::{profile, settle, FakeBackend};
use famchat::backend::{AuthBackend, ChatMessage};
use famchat::rooms::{Room, RoomId};
use famchat::session::{AppState, Screen, SessionObserver, SubscriptionManager};
use std::sync::Arc;

fn fixture() -> (Arc<FakeBackend>, SessionObserver) {
    let backend = Arc::new(FakeBackend::new());
    let observer = SessionObserver::new(backend.clone(), "Family");
    (backend, observer)
}

#[tokio::test]
async fn sign_in_loads_profile_and_synthesizes_family_room() {
    let (backend, observer) = fixture();
    backend.register_user(
        "ana@example.com",
        "hunter2",
        Some(profile("u1", "Ana Maria", "ana@example.com")),
    );
    backend.register_user(
        "bento@example.com",
        "hunter2",
        Some(profile("u2", "Bento", "bento@example.com")),
    );

    let mut auth_rx = backend.auth_states();
    backend.sign_in("ana@example.com", "hunter2").await.unwrap();

    let mut app = AppState::new();
    let mut subs = SubscriptionManager::new();
    let state = auth_rx.borrow_and_update().clone();
    observer.apply(state, &mut app, &mut subs).await.unwrap();

    assert_eq!(app.screen, Screen::RoomList);
    assert_eq!(app.display_name(), Some("Ana Maria"));
    assert_eq!(app.rooms.len(), 1);

    let family = &app.rooms[0];
    assert_eq!(family.id, RoomId::family());
    assert_eq!(family.name, "Family");
    // Membership is the full user list.
    assert_eq!(family.participants, vec!["u1", "u2"]);
}

#[tokio::test]
async fn missing_profile_falls_back_to_email_local_part() {
    let (backend, observer) = fixture();
    // Registered for auth, but no profile record exists.
    backend.register_user("ana@example.com", "hunter2", None);

    let mut auth_rx = backend.auth_states();
    backend.sign_in("ana@example.com", "hunter2").await.unwrap();

    let mut app = AppState::new();
    let mut subs = SubscriptionManager::new();
    let state = auth_rx.borrow_and_update().clone();
    observer.apply(state, &mut app, &mut subs).await.unwrap();

    assert_eq!(app.display_name(), Some("ana"));
    assert_eq!(app.screen, Screen::RoomList);
}

#[tokio::test]
async fn failed_sign_in_reports_the_reason_verbatim() {
    let (backend, _observer) = fixture();
    backend.register_user("ana@example.com", "hunter2", None);

    let err = backend
        .sign_in("ana@example.com", "wrong")
        .await
        .unwrap_err();
    assert!(err.to_string().contains("INVALID_PASSWORD"));

    let err = backend.sign_in("ghost@example.com", "x").await.unwrap_err();
    assert!(err.to_string().contains("EMAIL_NOT_FOUND"));
}

#[tokio::test]
async fn sign_out_clears_all_view_state_regardless_of_what_came_before() {
    let (backend, observer) = fixture();
    backend.register_user(
        "ana@example.com",
        "hunter2",
        Some(profile("u1", "Ana", "ana@example.com")),
    );

    let mut auth_rx = backend.auth_states();
    backend.sign_in("ana@example.com", "hunter2").await.unwrap();

    let mut app = AppState::new();
    let mut subs = SubscriptionManager::new();
    let state = auth_rx.borrow_and_update().clone();
    observer.apply(state, &mut app, &mut subs).await.unwrap();

    // Open a thread and fill it with messages.
    let family = app.rooms[0].clone();
    let _events = subs.open_room(backend.as_ref(), &family).await.unwrap();
    app.select_room(family);
    app.apply_snapshot(vec![ChatMessage::new(
        "m-1",
        RoomId::family(),
        "u1",
        "Ana",
        "hello",
        Some(1000),
    )]);
    settle().await;
    assert_eq!(backend.active_subscriptions(), 1);

    // Sign out; the observer must release the subscription first,
    // then reset state, then present the login view.
    backend.sign_out().await.unwrap();
    let state = auth_rx.borrow_and_update().clone();
    observer.apply(state, &mut app, &mut subs).await.unwrap();
    settle().await;

    assert_eq!(backend.active_subscriptions(), 0);
    assert!(!subs.is_active());
    assert!(app.session.is_none());
    assert!(app.rooms.is_empty());
    assert!(app.selected.is_none());
    assert!(app.messages.is_empty());
    assert_eq!(app.screen, Screen::Login);
}

#[tokio::test]
async fn restore_returns_the_identity_pushed_by_sign_in() {
    let (backend, _observer) = fixture();
    backend.register_user("ana@example.com", "hunter2", None);

    assert!(backend.restore().await.unwrap().is_none());

    backend.sign_in("ana@example.com", "hunter2").await.unwrap();
    let restored = backend.restore().await.unwrap().unwrap();
    assert_eq!(restored.email, "ana@example.com");

    backend.sign_out().await.unwrap();
    assert!(backend.restore().await.unwrap().is_none());
}

#[tokio::test]
async fn auth_watch_always_reflects_the_current_state() {
    let (backend, _observer) = fixture();
    backend.register_user("ana@example.com", "hunter2", None);

    let rx = backend.auth_states();
    assert!(!rx.borrow().is_signed_in());

    backend.sign_in("ana@example.com", "hunter2").await.unwrap();
    assert!(rx.borrow().is_signed_in());

    backend.sign_out().await.unwrap();
    assert!(!rx.borrow().is_signed_in());
}

#[tokio::test]
async fn direct_room_between_two_members_is_stable() {
    // The directory currently only synthesizes the family room, but a
    // pair room derived from any two members must be order-insensitive.
    let left = Room::direct("Ana & Bento", "u1", "u2").unwrap();
    let right = Room::direct("Ana & Bento", "u2", "u1").unwrap();
    assert_eq!(left.id, right.id);
    assert_eq!(left.id.as_str(), "u1_u2");
}
