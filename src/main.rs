//! Lobby chat - terminal driver for a single chat tab
//!
//! Architecture:
//! - Main thread: owns the chat tab and reads lines from stdin
//! - Backend thread: runs a Tokio runtime for the (loopback) network
//! - Communication via crossbeam channels
//!
//! Input ending in a Tab character is completed instead of sent.
//! `/recv <sender> <text>` simulates an incoming message and
//! `/recvme <sender> <text>` an incoming action. `/arrive <name>` and
//! `/leave <name>` change the player roster, `/offline` and `/online` toggle
//! the loopback network, `/quit` exits.
//!
//! A username given on the command line is saved as the new default.

use std::io::{self, BufRead, Write};
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

use chrono::Local;
use crossbeam_channel::{unbounded, Receiver};
use tracing_subscriber::EnvFilter;

use lobby_chat::backend::run_backend;
use lobby_chat::config::{load_settings, save_settings};
use lobby_chat::directory::{PlayerCategory, PlayerInfo, PlayerRoster};
use lobby_chat::display::{DisplaySurface, RenderedFragment};
use lobby_chat::protocol::{ChatAction, ChatEvent};
use lobby_chat::services::LoopbackNetwork;
use lobby_chat::transcript::Transcript;
use lobby_chat::{ChatError, ChatMessage, ChatTab};

/// Prints each rendered fragment on its own line
struct TerminalDisplay;

impl DisplaySurface for TerminalDisplay {
    fn render(&mut self, fragment: &RenderedFragment) {
        println!("{}", fragment.html);
    }

    fn prune_oldest(&mut self, _max_retained: usize) {}
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(io::stderr)
        .init();

    let mut settings = load_settings();
    if let Some(username) = std::env::args().nth(1) {
        if username != settings.username {
            settings.username = username;
            if let Err(e) = save_settings(&settings) {
                tracing::warn!(error = %e, "could not save settings");
            }
        }
    }
    let username = settings.username.clone();
    let receiver = std::env::args().nth(2).unwrap_or_else(|| "#aeolus".to_string());

    let roster = Arc::new(PlayerRoster::new());
    roster.upsert(PlayerInfo::new(username.clone()));
    roster.upsert(PlayerInfo::new("Alicent").with_clan("GG"));
    roster.upsert(PlayerInfo::new("bob").with_category(PlayerCategory::Friend));
    roster.upsert(PlayerInfo::new("Visionik").with_category(PlayerCategory::Moderator));

    let (action_tx, action_rx) = unbounded::<ChatAction>();
    let (event_tx, event_rx) = unbounded::<ChatEvent>();

    let network = LoopbackNetwork::new();
    let backend = {
        let network = network.clone();
        let event_tx = event_tx.clone();
        thread::spawn(move || run_backend(network, action_rx, event_tx))
    };

    let mut tab = ChatTab::new(
        receiver,
        username,
        settings.prefs.clone(),
        TerminalDisplay,
        roster.clone(),
        action_tx,
    )
    .with_notifier(|| eprint!("\x07"));
    if settings.prefs.log_transcripts {
        match Transcript::new() {
            Ok(transcript) => tab = tab.with_transcript(transcript),
            Err(e) => tracing::warn!(error = %e, "transcripts disabled"),
        }
    }

    let _ = event_tx.send(ChatEvent::DisplayReady);
    tab.process_events(&event_rx);
    tracing::info!(receiver = %tab.receiver(), user = %tab.local_user(), "chat tab ready");

    let stdin = io::stdin();
    for line in stdin.lock().lines() {
        let Ok(line) = line else { break };

        if line == "/quit" {
            break;
        } else if line == "/offline" || line == "/online" {
            network.set_online(line == "/online");
        } else if let Some(rest) = line.strip_prefix("/recv ") {
            if let Some((sender, text)) = rest.split_once(' ') {
                let _ = event_tx.send(ChatEvent::MessageReceived(ChatMessage::now(sender, text, false)));
            }
        } else if let Some(rest) = line.strip_prefix("/recvme ") {
            if let Some((sender, text)) = rest.split_once(' ') {
                let _ = event_tx.send(ChatEvent::MessageReceived(ChatMessage::action(Local::now(), sender, text)));
            }
        } else if let Some(name) = line.strip_prefix("/arrive ") {
            roster.upsert(PlayerInfo::new(name.trim()));
        } else if let Some(name) = line.strip_prefix("/leave ") {
            if roster.remove(name.trim()).is_none() {
                tracing::info!(%name, "no such player");
            }
        } else if let Some(partial) = line.strip_suffix('\t') {
            match tab.auto_complete(partial, partial.len()) {
                Ok((text, _)) => println!("> {}", text),
                Err(ChatError::NoCompletionMatch) | Err(ChatError::EmptyInput) => {}
                Err(e) => tracing::warn!(error = %e, "completion failed"),
            }
        } else {
            tab.input_mut().set_text(line);
            match tab.submit() {
                Ok(_) => wait_for_ack(&mut tab, &event_rx),
                Err(ChatError::EmptyInput) => {}
                Err(e) => tracing::warn!(error = %e, "send failed"),
            }
        }

        tab.process_events(&event_rx);
        let _ = io::stdout().flush();
    }

    drop(tab);
    let _ = backend.join();
}

/// Pump events until the pending send resolves.
fn wait_for_ack(tab: &mut ChatTab<TerminalDisplay>, event_rx: &Receiver<ChatEvent>) {
    let deadline = Instant::now() + Duration::from_secs(5);
    while !tab.input().enabled && Instant::now() < deadline {
        if let Ok(event) = event_rx.recv_timeout(Duration::from_millis(50)) {
            tab.handle_event(event);
        }
    }
}
