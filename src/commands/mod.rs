/*!
Command handlers for the CLI

This module provides command handlers invoked by the CLI entrypoint.

It exposes the interactive chat loop plus the one-shot commands:

- `chat`   — Interactive session: login, room list, live thread
- `auth`   — Sign-in, sign-out, and identity display
- `rooms`  — Print the room list
- `send`   — Send one message without entering the loop

These handlers are intentionally small and use the library components:
the backend collaborators, the session observer, the subscription
lifecycle manager, and the composer.
*/

use crate::backend::{AuthState, Backend, SnapshotEvent};
use crate::commands::special_commands::{parse_special_command, print_help, SpecialCommand};
use crate::composer::Composer;
use crate::error::Result;
use crate::session::{AppState, SessionObserver, SubscriptionManager};

use colored::Colorize;
use rustyline::error::ReadlineError;
use rustyline::DefaultEditor;
use std::sync::Arc;
use tokio::sync::{watch, Mutex};

// Special commands parser for session navigation
pub mod special_commands;

/// Print a blocking alert for a failed operation
///
/// Every failure class that reaches the user goes through here: the
/// operation is named, the reason is shown, and a log line is emitted.
pub(crate) fn print_alert(context: &str, error: &anyhow::Error) {
    tracing::error!("{}: {}", context, error);
    eprintln!("{} {}", format!("{}:", context).red().bold(), error);
}

/// Variant of [`print_alert`] for plain-text reasons
pub(crate) fn print_alert_str(context: &str, reason: &str) {
    tracing::error!("{}: {}", context, reason);
    eprintln!("{} {}", format!("{}:", context).red().bold(), reason);
}

/// Read one line, treating Ctrl-C/Ctrl-D as a graceful `None`
fn read_prompt(rl: &mut DefaultEditor, prompt: &str) -> Result<Option<String>> {
    match rl.readline(prompt) {
        Ok(line) => Ok(Some(line)),
        Err(ReadlineError::Interrupted) | Err(ReadlineError::Eof) => Ok(None),
        Err(e) => Err(e.into()),
    }
}

// Chat command handler
pub mod chat {
    //! Interactive chat session handler.
    //!
    //! Wires the backend collaborators to the view state: a login
    //! screen, the room list, and a live message thread whose
    //! snapshots are applied by a background task while the readline
    //! loop owns the composer.

    use super::*;
    use crate::backend::create_backend;
    use crate::config::{looks_like_email, Config};
    use crate::rooms::Room;
    use crate::session::Screen;

    /// How a thread view ended
    enum ThreadExit {
        /// Return to the room list
        Back,
        /// Sign out entirely
        Logout,
        /// Leave the program
        Exit,
    }

    /// Start the interactive chat session
    ///
    /// # Arguments
    ///
    /// * `config` - Global configuration (consumed)
    /// * `email_hint` - Optional email to prefill on the login screen
    pub async fn run_chat(config: Config, email_hint: Option<String>) -> Result<()> {
        tracing::info!("Starting interactive chat session");

        let backend = create_backend(&config.backend)?;
        let mut auth_rx = backend.auth.auth_states();
        let observer = SessionObserver::new(
            backend.store.clone(),
            config.chat.family_room_name.clone(),
        );

        let app = Arc::new(Mutex::new(AppState::new()));
        let mut subscriptions = SubscriptionManager::new();
        let mut composer = Composer::new();
        let mut rl = DefaultEditor::new()?;

        print_welcome_banner();

        // Re-derive the session from the persisted credential, if any.
        println!("{}", "Loading session...".dimmed());
        if let Err(e) = backend.auth.restore().await {
            tracing::warn!("Session restore failed: {}", e);
        }
        apply_current_auth_state(&observer, &mut auth_rx, &app, &mut subscriptions).await;

        loop {
            let screen = { app.lock().await.screen };
            let keep_going = match screen {
                Screen::Login => {
                    login_screen(
                        &mut rl,
                        &backend,
                        &observer,
                        &mut auth_rx,
                        &app,
                        &mut subscriptions,
                        email_hint.as_deref(),
                    )
                    .await?
                }
                Screen::RoomList => {
                    room_list_screen(
                        &mut rl,
                        &backend,
                        &observer,
                        &mut auth_rx,
                        &app,
                        &mut subscriptions,
                    )
                    .await?
                }
                Screen::Thread => {
                    thread_screen(
                        &mut rl,
                        &backend,
                        &observer,
                        &mut auth_rx,
                        &app,
                        &mut subscriptions,
                        &mut composer,
                    )
                    .await?
                }
            };

            if !keep_going {
                break;
            }
        }

        // View teardown is an exit path too: never leave a live
        // subscription behind.
        subscriptions.close_room();
        println!("Bye.");
        Ok(())
    }

    fn print_welcome_banner() {
        println!();
        println!("{}", "famchat — family chat".bold());
        println!("{}", "Type /help for commands.".dimmed());
        println!();
    }

    /// Push the current auth state through the session observer
    async fn apply_current_auth_state(
        observer: &SessionObserver,
        auth_rx: &mut watch::Receiver<AuthState>,
        app: &Arc<Mutex<AppState>>,
        subscriptions: &mut SubscriptionManager,
    ) {
        let state = auth_rx.borrow_and_update().clone();
        let mut app = app.lock().await;
        if let Err(e) = observer.apply(state, &mut app, subscriptions).await {
            // Room-list failure: alert and proceed with an empty list.
            print_alert("Failed to load rooms", &e);
        }
    }

    /// The login view; returns false when the session should end
    #[allow(clippy::too_many_arguments)]
    async fn login_screen(
        rl: &mut DefaultEditor,
        backend: &Backend,
        observer: &SessionObserver,
        auth_rx: &mut watch::Receiver<AuthState>,
        app: &Arc<Mutex<AppState>>,
        subscriptions: &mut SubscriptionManager,
        email_hint: Option<&str>,
    ) -> Result<bool> {
        println!("{}", "Sign in".bold());
        if let Some(hint) = email_hint {
            println!("{}", format!("(enter to use {})", hint).dimmed());
        }

        let Some(line) = read_prompt(rl, "email> ")? else {
            return Ok(false);
        };
        let typed = line.trim();

        match parse_special_command(typed) {
            Ok(SpecialCommand::Exit) => return Ok(false),
            Ok(SpecialCommand::Help) => {
                print_help();
                return Ok(true);
            }
            Ok(SpecialCommand::None) => {}
            Ok(_) => return Ok(true),
            Err(e) => {
                println!("{}", e.to_string().yellow());
                return Ok(true);
            }
        }

        let email = if typed.is_empty() {
            match email_hint {
                Some(hint) => hint.to_string(),
                None => return Ok(true),
            }
        } else {
            typed.to_string()
        };

        if !looks_like_email(&email) {
            println!("{}", "That does not look like an email address.".yellow());
            return Ok(true);
        }

        let Some(password) = read_prompt(rl, "password> ")? else {
            return Ok(false);
        };
        if password.is_empty() {
            return Ok(true);
        }

        match backend.auth.sign_in(&email, &password).await {
            Ok(identity) => {
                tracing::info!("Signed in as {}", identity.email);
            }
            Err(e) => {
                // The reason string is shown verbatim; we stay on login.
                print_alert("Sign-in failed", &e);
                return Ok(true);
            }
        }

        apply_current_auth_state(observer, auth_rx, app, subscriptions).await;

        if let Some(name) = app.lock().await.display_name() {
            println!();
            println!("Hello, {} 👋", name.green().bold());
        }

        Ok(true)
    }

    /// The room-list view; returns false when the session should end
    async fn room_list_screen(
        rl: &mut DefaultEditor,
        backend: &Backend,
        observer: &SessionObserver,
        auth_rx: &mut watch::Receiver<AuthState>,
        app: &Arc<Mutex<AppState>>,
        subscriptions: &mut SubscriptionManager,
    ) -> Result<bool> {
        print_room_list(app).await;

        let Some(line) = read_prompt(rl, "rooms> ")? else {
            return Ok(false);
        };
        let typed = line.trim();
        if typed.is_empty() {
            return Ok(true);
        }

        match parse_special_command(typed) {
            Ok(SpecialCommand::Exit) => return Ok(false),
            Ok(SpecialCommand::Logout) => {
                sign_out(backend, observer, auth_rx, app, subscriptions).await?;
                return Ok(true);
            }
            Ok(SpecialCommand::Help) => {
                print_help();
                return Ok(true);
            }
            Ok(SpecialCommand::ShowStatus) => {
                print_status(app, subscriptions).await;
                return Ok(true);
            }
            Ok(SpecialCommand::Back) | Ok(SpecialCommand::Rooms) => return Ok(true),
            Ok(SpecialCommand::None) => {}
            Err(e) => {
                println!("{}", e.to_string().yellow());
                return Ok(true);
            }
        }

        let selected = {
            let app = app.lock().await;
            match typed.parse::<usize>() {
                Ok(n) if n >= 1 && n <= app.rooms.len() => Some(app.rooms[n - 1].clone()),
                _ => None,
            }
        };

        match selected {
            Some(room) => {
                app.lock().await.select_room(room);
            }
            None => {
                println!(
                    "{}",
                    "Pick a room by number, or /help for commands.".yellow()
                );
            }
        }

        Ok(true)
    }

    async fn print_room_list(app: &Arc<Mutex<AppState>>) {
        let app = app.lock().await;
        println!();
        println!("{}", "Conversations".bold());
        if let Some(name) = app.display_name() {
            println!("{}", format!("Hello, {} 👋", name).dimmed());
        }
        if app.rooms.is_empty() {
            println!("  (no rooms)");
        }
        for (index, room) in app.rooms.iter().enumerate() {
            println!(
                "  {}. {} {}",
                index + 1,
                room.name.bold(),
                format!("({})", room.kind).dimmed()
            );
        }
        println!();
    }

    async fn print_status(app: &Arc<Mutex<AppState>>, subscriptions: &SubscriptionManager) {
        let app = app.lock().await;
        match &app.session {
            Some(session) => println!(
                "Signed in as {} <{}>",
                session.display_name, session.identity.email
            ),
            None => println!("Not signed in"),
        }
        match subscriptions.active_room() {
            Some(room_id) => println!("Live subscription: {}", room_id),
            None => println!("Live subscription: none"),
        }
        println!("Messages in view: {}", app.messages.len());
    }

    /// Sign out: release the subscription, reset state, back to login
    async fn sign_out(
        backend: &Backend,
        observer: &SessionObserver,
        auth_rx: &mut watch::Receiver<AuthState>,
        app: &Arc<Mutex<AppState>>,
        subscriptions: &mut SubscriptionManager,
    ) -> Result<()> {
        backend.auth.sign_out().await?;
        apply_current_auth_state(observer, auth_rx, app, subscriptions).await;
        println!("Signed out.");
        Ok(())
    }

    /// The open-thread view; returns false when the session should end
    #[allow(clippy::too_many_arguments)]
    async fn thread_screen(
        rl: &mut DefaultEditor,
        backend: &Backend,
        observer: &SessionObserver,
        auth_rx: &mut watch::Receiver<AuthState>,
        app: &Arc<Mutex<AppState>>,
        subscriptions: &mut SubscriptionManager,
        composer: &mut Composer,
    ) -> Result<bool> {
        let Some(room) = ({ app.lock().await.selected.clone() }) else {
            app.lock().await.clear_thread();
            return Ok(true);
        };

        let events = match subscriptions.open_room(backend.store.as_ref(), &room).await {
            Ok(events) => events,
            Err(e) => {
                print_alert("Could not open room", &e);
                app.lock().await.clear_thread();
                return Ok(true);
            }
        };

        println!();
        println!("{} {}", "──".dimmed(), room.name.bold());
        println!("{}", "Type to send, /back to return.".dimmed());

        let me = {
            let app = app.lock().await;
            app.session
                .as_ref()
                .map(|s| s.identity.user_id.clone())
                .unwrap_or_default()
        };

        // The applier is the sole writer of the message list while the
        // thread is open; the readline loop owns the composer.
        let applier = tokio::spawn(apply_snapshots(events, app.clone(), me));

        let outcome = thread_input_loop(rl, backend, app, subscriptions, composer, &room).await;

        applier.abort();
        subscriptions.close_room();
        app.lock().await.clear_thread();

        match outcome? {
            ThreadExit::Back => Ok(true),
            ThreadExit::Logout => {
                sign_out(backend, observer, auth_rx, app, subscriptions).await?;
                Ok(true)
            }
            ThreadExit::Exit => Ok(false),
        }
    }

    async fn thread_input_loop(
        rl: &mut DefaultEditor,
        backend: &Backend,
        app: &Arc<Mutex<AppState>>,
        subscriptions: &SubscriptionManager,
        composer: &mut Composer,
        room: &Room,
    ) -> Result<ThreadExit> {
        let prompt = format!("{} ", ">>".cyan());

        loop {
            let Some(line) = read_prompt(rl, &prompt)? else {
                return Ok(ThreadExit::Exit);
            };
            let trimmed = line.trim();
            if trimmed.is_empty() {
                continue;
            }

            match parse_special_command(trimmed) {
                Ok(SpecialCommand::Back) | Ok(SpecialCommand::Rooms) => {
                    return Ok(ThreadExit::Back)
                }
                Ok(SpecialCommand::Logout) => return Ok(ThreadExit::Logout),
                Ok(SpecialCommand::Exit) => return Ok(ThreadExit::Exit),
                Ok(SpecialCommand::Help) => {
                    print_help();
                    continue;
                }
                Ok(SpecialCommand::ShowStatus) => {
                    print_status(app, subscriptions).await;
                    continue;
                }
                Ok(SpecialCommand::None) => {}
                Err(e) => {
                    println!("{}", e.to_string().yellow());
                    continue;
                }
            }

            rl.add_history_entry(trimmed)?;

            let session = { app.lock().await.session.clone() };
            let Some(session) = session else {
                // Signed out underneath us; nothing sensible to do here.
                return Ok(ThreadExit::Back);
            };

            composer.set_draft(line.clone());
            if let Err(e) = composer
                .send(backend.store.as_ref(), &session, room)
                .await
            {
                // The draft is preserved in the composer for manual retry.
                print_alert("Message not sent", &e);
                println!("{}", format!("(draft kept: {})", composer.draft()).dimmed());
            }
        }
    }

    /// Apply snapshot events to the view state and render arrivals
    async fn apply_snapshots(
        mut events: tokio::sync::mpsc::Receiver<SnapshotEvent>,
        app: Arc<Mutex<AppState>>,
        me: String,
    ) {
        let mut rendered = 0usize;

        while let Some(event) = events.recv().await {
            match event {
                SnapshotEvent::Snapshot(messages) => {
                    let mut state = app.lock().await;
                    render_arrivals(&messages, &mut rendered, &me);
                    state.apply_snapshot(messages);
                }
                SnapshotEvent::Failed(reason) => {
                    // Terminal: the list stays whatever it last was.
                    print_alert_str("Live updates stopped", &reason);
                    break;
                }
            }
        }
    }

    /// Print whatever the latest snapshot added
    ///
    /// Snapshots replace the list wholesale; for display we only emit
    /// the suffix past what was already printed, or a divider plus the
    /// full set when the replacement shrank.
    fn render_arrivals(messages: &[crate::backend::ChatMessage], rendered: &mut usize, me: &str) {
        if messages.len() < *rendered {
            println!("{}", "── thread updated ──".dimmed());
            *rendered = 0;
        }

        for message in &messages[*rendered..] {
            let time = message.time_label();
            if message.sender_id == me {
                println!("{} {} {}", "you".green().bold(), time.dimmed(), message.text);
            } else {
                println!(
                    "{} {} {}",
                    message.sender_name.cyan().bold(),
                    time.dimmed(),
                    message.text
                );
            }
        }

        *rendered = messages.len();
    }
}

// Authentication command handlers
pub mod auth {
    //! Sign-in, sign-out, and identity display.

    use super::*;
    use crate::backend::create_backend;
    use crate::config::{looks_like_email, Config};
    use crate::session::Session;

    /// Sign in and persist the session credential
    pub async fn login(config: Config, email: Option<String>) -> Result<()> {
        let backend = create_backend(&config.backend)?;
        let mut rl = DefaultEditor::new()?;

        let email = match email {
            Some(email) => email,
            None => match read_prompt(&mut rl, "email> ")? {
                Some(line) => line.trim().to_string(),
                None => return Ok(()),
            },
        };

        if !looks_like_email(&email) {
            println!("{}", "That does not look like an email address.".yellow());
        }

        let Some(password) = read_prompt(&mut rl, "password> ")? else {
            return Ok(());
        };

        match backend.auth.sign_in(&email, &password).await {
            Ok(identity) => println!("Signed in as {}.", identity.email.green()),
            Err(e) => print_alert("Sign-in failed", &e),
        }

        Ok(())
    }

    /// Sign out and clear the persisted credential
    pub async fn logout(config: Config) -> Result<()> {
        let backend = create_backend(&config.backend)?;
        backend.auth.sign_out().await?;
        println!("Signed out.");
        Ok(())
    }

    /// Show the signed-in identity
    pub async fn whoami(config: Config) -> Result<()> {
        let backend = create_backend(&config.backend)?;

        let Some(identity) = backend.auth.restore().await? else {
            println!("Not signed in.");
            return Ok(());
        };

        let profile = match backend.store.fetch_profile(&identity.user_id).await {
            Ok(profile) => profile,
            Err(e) => {
                tracing::warn!("Failed to load profile for {}: {}", identity.user_id, e);
                None
            }
        };

        let session = Session::resolve(identity, profile);
        println!(
            "{} <{}> ({})",
            session.display_name.bold(),
            session.identity.email,
            session.identity.user_id
        );
        Ok(())
    }
}

// Room listing command handler
pub mod rooms {
    //! Print the rooms available to the signed-in user.

    use super::*;
    use crate::backend::create_backend;
    use crate::config::Config;
    use crate::rooms::RoomDirectory;

    /// List rooms
    pub async fn list_rooms(config: Config) -> Result<()> {
        let backend = create_backend(&config.backend)?;

        let Some(_identity) = backend.auth.restore().await? else {
            print_alert_str("Not signed in", "run `famchat login` first");
            return Ok(());
        };

        match RoomDirectory::load(backend.store.as_ref(), &config.chat.family_room_name).await {
            Ok(directory) => {
                for room in &directory.rooms {
                    println!(
                        "{}  {} {}",
                        room.id,
                        room.name.bold(),
                        format!("({}, {} members)", room.kind, room.participants.len()).dimmed()
                    );
                }
            }
            Err(e) => {
                // Alert; the (empty) list is simply not printed.
                print_alert("Failed to load rooms", &e);
            }
        }

        Ok(())
    }
}

// One-shot send command handler
pub mod send {
    //! Send a single message without entering the chat loop.

    use super::*;
    use crate::backend::create_backend;
    use crate::composer::SendOutcome;
    use crate::config::Config;
    use crate::rooms::{Room, RoomId, RoomKind};
    use crate::session::Session;

    /// Send one message to a room (the family group by default)
    pub async fn send_once(config: Config, room: Option<String>, text: String) -> Result<()> {
        let backend = create_backend(&config.backend)?;

        let Some(identity) = backend.auth.restore().await? else {
            print_alert_str("Not signed in", "run `famchat login` first");
            return Ok(());
        };

        let profile = match backend.store.fetch_profile(&identity.user_id).await {
            Ok(profile) => profile,
            Err(e) => {
                tracing::warn!("Failed to load profile for {}: {}", identity.user_id, e);
                None
            }
        };
        let session = Session::resolve(identity, profile);

        let room_id = room.map(RoomId::new).unwrap_or_else(RoomId::family);
        let room = if room_id.is_family() {
            Room::family(&config.chat.family_room_name, Vec::new())
        } else {
            Room {
                name: room_id.as_str().to_string(),
                id: room_id,
                kind: RoomKind::Direct,
                participants: Vec::new(),
            }
        };

        let mut composer = Composer::new();
        composer.set_draft(text);

        match composer.send(backend.store.as_ref(), &session, &room).await {
            Ok(SendOutcome::Sent) => println!("Sent."),
            Ok(SendOutcome::EmptyDraft) => println!("Nothing to send."),
            Err(e) => print_alert("Message not sent", &e),
        }

        Ok(())
    }
}
