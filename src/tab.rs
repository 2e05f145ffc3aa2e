//! One chat tab: the pipeline between incoming/outgoing messages and the
//! display surface.
//!
//! The tab is owned by a single thread. Everything that happens elsewhere
//! (network messages, send acknowledgments, the display finishing its load)
//! reaches it as a [`ChatEvent`] drained by [`ChatTab::process_events`], so
//! the pending queue and the ready flag are never touched concurrently.

use crossbeam_channel::{Receiver, Sender};
use std::sync::Arc;

use crate::commands::{parse_input, LocalInput};
use crate::config::ChatPrefs;
use crate::directory::UserDirectory;
use crate::display::DisplaySurface;
use crate::error::ChatError;
use crate::input_state::InputState;
use crate::mention::MentionMatcher;
use crate::message::{ChatMessage, Direction};
use crate::protocol::{ChatAction, ChatEvent};
use crate::render::MessageRenderer;
use crate::services::{FocusOracle, NotificationSink};
use crate::styles::UserStyleMap;
use crate::transcript::{Transcript, TranscriptEntry};

/// What a successful [`ChatTab::send_local`] started
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Submission {
    /// A message or action is on its way; the input stays disabled until the
    /// backend answers
    Sent,
    /// A join request for this channel was issued
    Joining(String),
}

pub struct ChatTab<D: DisplaySurface> {
    /// Either a channel like "#aeolus" or a player name
    receiver: String,
    local_user: String,
    prefs: ChatPrefs,

    /// Set once the display can take render calls; never cleared
    ready: bool,
    /// Messages that arrived before the display was ready, oldest first
    pending: Vec<(ChatMessage, Direction)>,

    styles: UserStyleMap,
    mention: MentionMatcher,
    renderer: MessageRenderer,
    input: InputState,

    display: D,
    directory: Arc<dyn UserDirectory + Send + Sync>,
    notifier: Box<dyn NotificationSink>,
    focus: Box<dyn FocusOracle>,
    action_tx: Sender<ChatAction>,
    transcript: Option<Transcript>,
}

impl<D: DisplaySurface> ChatTab<D> {
    pub fn new(
        receiver: impl Into<String>,
        local_user: impl Into<String>,
        prefs: ChatPrefs,
        display: D,
        directory: Arc<dyn UserDirectory + Send + Sync>,
        action_tx: Sender<ChatAction>,
    ) -> Self {
        let local_user = local_user.into();
        let mention = MentionMatcher::new(local_user.clone());
        Self {
            receiver: receiver.into(),
            styles: UserStyleMap::new(&local_user, &prefs),
            renderer: MessageRenderer::new(mention.clone()),
            mention,
            local_user,
            prefs,
            ready: false,
            pending: Vec::new(),
            input: InputState::new(),
            display,
            directory,
            notifier: Box::new(|| {}),
            focus: Box::new(|| false),
            action_tx,
            transcript: None,
        }
    }

    pub fn with_notifier(mut self, notifier: impl NotificationSink + 'static) -> Self {
        self.notifier = Box::new(notifier);
        self
    }

    pub fn with_focus(mut self, focus: impl FocusOracle + 'static) -> Self {
        self.focus = Box::new(focus);
        self
    }

    pub fn with_transcript(mut self, transcript: Transcript) -> Self {
        self.transcript = Some(transcript);
        self
    }

    pub fn receiver(&self) -> &str {
        &self.receiver
    }

    pub fn local_user(&self) -> &str {
        &self.local_user
    }

    pub fn is_ready(&self) -> bool {
        self.ready
    }

    pub fn pending_len(&self) -> usize {
        self.pending.len()
    }

    pub fn styles(&self) -> &UserStyleMap {
        &self.styles
    }

    pub fn display(&self) -> &D {
        &self.display
    }

    pub fn input(&self) -> &InputState {
        &self.input
    }

    pub fn input_mut(&mut self) -> &mut InputState {
        &mut self.input
    }

    /// Drain all pending events, in arrival order. Returns how many were handled.
    pub fn process_events(&mut self, event_rx: &Receiver<ChatEvent>) -> usize {
        let mut handled = 0;
        while let Ok(event) = event_rx.try_recv() {
            self.handle_event(event);
            handled += 1;
        }
        handled
    }

    pub fn handle_event(&mut self, event: ChatEvent) {
        match event {
            ChatEvent::DisplayReady => self.mark_ready(),
            ChatEvent::MessageReceived(message) => self.enqueue_or_render(message),
            ChatEvent::SendSucceeded { text, is_action } => self.on_send_succeeded(text, is_action),
            ChatEvent::SendFailed { text, cause } => self.on_send_failed(&text, &cause),
            ChatEvent::JoinedChannel(channel) => {
                tracing::info!(receiver = %self.receiver, %channel, "join confirmed");
            }
        }
    }

    /// Accept a message from someone else: buffer it until the display is
    /// ready, render it right away afterwards.
    pub fn enqueue_or_render(&mut self, message: ChatMessage) {
        self.accept(message, Direction::Inbound);
    }

    /// Switch to ready and flush everything buffered so far, oldest first.
    /// Later calls do nothing.
    pub fn mark_ready(&mut self) {
        if self.ready {
            return;
        }
        self.ready = true;
        let pending = std::mem::take(&mut self.pending);
        tracing::debug!(receiver = %self.receiver, count = pending.len(), "display ready, flushing");
        for (message, direction) in pending {
            self.render_now(&message, direction);
        }
    }

    /// Whether `text` mentions the local user as a whole word.
    pub fn detect_mention(&self, text: &str) -> bool {
        self.mention.is_match(text)
    }

    /// Send compose input to `receiver`.
    ///
    /// `/me ` sends an action and `/join ` requests a channel join; anything
    /// else is a plain message. A message or action disables the input until
    /// the backend reports [`ChatEvent::SendSucceeded`] or
    /// [`ChatEvent::SendFailed`].
    pub fn send_local(&mut self, text: &str, receiver: &str) -> Result<Submission, ChatError> {
        if !self.input.enabled {
            return Err(ChatError::SendInFlight);
        }
        self.input.completion.reset();

        match parse_input(text) {
            LocalInput::Empty => Err(ChatError::EmptyInput),
            LocalInput::Join(channel) => {
                self.dispatch(ChatAction::JoinChannel(channel.clone()), receiver)?;
                self.input.clear();
                Ok(Submission::Joining(channel))
            }
            LocalInput::Action(body) => {
                self.input.disable();
                self.dispatch(
                    ChatAction::SendAction {
                        receiver: receiver.to_string(),
                        text: body,
                    },
                    receiver,
                )?;
                Ok(Submission::Sent)
            }
            LocalInput::Message(body) => {
                self.input.disable();
                self.dispatch(
                    ChatAction::SendMessage {
                        receiver: receiver.to_string(),
                        text: body,
                    },
                    receiver,
                )?;
                Ok(Submission::Sent)
            }
        }
    }

    /// Send whatever is in the compose field to this tab's receiver.
    pub fn submit(&mut self) -> Result<Submission, ChatError> {
        let text = self.input.text.clone();
        let receiver = self.receiver.clone();
        self.send_local(&text, &receiver)
    }

    /// Complete the username before `caret` in `input`, also updating the
    /// compose field. Repeated calls cycle through the candidates.
    ///
    /// Refused while a send is in flight, so a failed send hands back the
    /// text that was submitted.
    pub fn auto_complete(&mut self, input: &str, caret: usize) -> Result<(String, usize), ChatError> {
        if !self.input.enabled {
            return Err(ChatError::SendInFlight);
        }
        let names = self.directory.all_known_usernames();
        let (text, caret) = self.input.completion.complete(input, caret, names)?;
        self.input.text = text.clone();
        self.input.caret = caret;
        Ok((text, caret))
    }

    /// Tab pressed in the compose field.
    pub fn complete_input(&mut self) -> Result<(), ChatError> {
        let names = self.directory.all_known_usernames();
        self.input.auto_complete(names)
    }

    fn on_send_succeeded(&mut self, text: String, is_action: bool) {
        self.input.clear();
        let message = ChatMessage::now(self.local_user.clone(), text, is_action);
        self.accept(message, Direction::Outbound);
    }

    fn on_send_failed(&mut self, text: &str, cause: &str) {
        tracing::warn!(receiver = %self.receiver, %text, %cause, "message could not be sent");
        self.input.enable();
    }

    fn dispatch(&mut self, action: ChatAction, receiver: &str) -> Result<(), ChatError> {
        if self.action_tx.send(action).is_err() {
            self.input.enable();
            return Err(ChatError::SendFailed {
                receiver: receiver.to_string(),
                cause: "backend is not running".into(),
            });
        }
        Ok(())
    }

    fn accept(&mut self, message: ChatMessage, direction: Direction) {
        if message.is_blank() {
            tracing::debug!(receiver = %self.receiver, sender = %message.sender, "dropping empty message");
            return;
        }
        if self.ready {
            self.render_now(&message, direction);
        } else {
            self.pending.push((message, direction));
        }
    }

    fn render_now(&mut self, message: &ChatMessage, direction: Direction) {
        let player = self.directory.player(&message.sender);
        let color = self.styles.color_for(&message.sender, player.as_ref(), &self.prefs);

        let mentioned = self.mention.is_match(&message.text);
        if mentioned && direction == Direction::Inbound && !self.focus.is_tab_focused() {
            self.notifier.play_mention();
        }

        let fragment = self.renderer.render(message, color, player.as_ref(), mentioned);
        self.display.render(&fragment);
        self.display.prune_oldest(self.prefs.max_messages);
        self.display.scroll_to_bottom_if_desired();

        if let Some(transcript) = &self.transcript {
            transcript.log(TranscriptEntry::from_message(&self.receiver, message));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::directory::{PlayerCategory, PlayerInfo, PlayerRoster};
    use crate::display::MemoryDisplay;
    use crossbeam_channel::unbounded;
    use std::cell::Cell;
    use std::rc::Rc;

    fn roster() -> Arc<PlayerRoster> {
        Arc::new(["Alice", "Alicent", "bob"].into_iter().collect())
    }

    fn tab() -> (ChatTab<MemoryDisplay>, Receiver<ChatAction>) {
        let (action_tx, action_rx) = unbounded();
        let tab = ChatTab::new("#aeolus", "Alice", ChatPrefs::default(), MemoryDisplay::new(), roster(), action_tx);
        (tab, action_rx)
    }

    fn inbound(sender: &str, text: &str) -> ChatMessage {
        ChatMessage::now(sender, text, false)
    }

    fn rendered_texts(tab: &ChatTab<MemoryDisplay>) -> Vec<String> {
        tab.display()
            .fragments
            .iter()
            .map(|f| f.html.clone())
            .collect()
    }

    #[test]
    fn test_buffers_until_ready_then_flushes_in_order() {
        let (mut tab, _rx) = tab();
        for i in 0..5 {
            tab.enqueue_or_render(inbound("bob", &format!("msg{}", i)));
        }
        assert!(tab.display().is_empty());
        assert_eq!(tab.pending_len(), 5);

        tab.mark_ready();
        tab.mark_ready();
        assert_eq!(tab.pending_len(), 0);
        let html = rendered_texts(&tab);
        assert_eq!(html.len(), 5);
        for (i, h) in html.iter().enumerate() {
            assert!(h.contains(&format!("msg{}", i)));
        }
    }

    #[test]
    fn test_renders_immediately_when_ready() {
        let (mut tab, _rx) = tab();
        tab.mark_ready();
        tab.enqueue_or_render(inbound("bob", "hi"));
        assert_eq!(tab.display().len(), 1);
        assert_eq!(tab.pending_len(), 0);
        assert_eq!(tab.display().scroll_requests, 1);
    }

    #[test]
    fn test_blank_messages_dropped() {
        let (mut tab, _rx) = tab();
        tab.enqueue_or_render(inbound("bob", "   "));
        assert_eq!(tab.pending_len(), 0);
        tab.mark_ready();
        tab.enqueue_or_render(inbound("bob", ""));
        assert!(tab.display().is_empty());
    }

    #[test]
    fn test_prunes_to_max_messages() {
        let (action_tx, _rx) = unbounded();
        let prefs = ChatPrefs {
            max_messages: 3,
            ..ChatPrefs::default()
        };
        let mut tab = ChatTab::new("#aeolus", "Alice", prefs, MemoryDisplay::new(), roster(), action_tx);
        tab.mark_ready();
        for i in 0..10 {
            tab.enqueue_or_render(inbound("bob", &format!("msg{}", i)));
        }
        let html = rendered_texts(&tab);
        assert_eq!(html.len(), 3);
        assert!(html[0].contains("msg7"));
    }

    #[test]
    fn test_mention_plays_sound_only_when_unfocused() {
        let played = Rc::new(Cell::new(0));
        let focused = Rc::new(Cell::new(false));
        let (action_tx, _rx) = unbounded();
        let mut tab = ChatTab::new("#aeolus", "Alice", ChatPrefs::default(), MemoryDisplay::new(), roster(), action_tx)
            .with_notifier({
                let played = played.clone();
                move || played.set(played.get() + 1)
            })
            .with_focus({
                let focused = focused.clone();
                move || focused.get()
            });
        tab.mark_ready();

        tab.enqueue_or_render(inbound("bob", "gg Alice"));
        assert_eq!(played.get(), 1);
        assert!(rendered_texts(&tab)[0].contains("<span class='own-username'>Alice</span>"));

        focused.set(true);
        tab.enqueue_or_render(inbound("bob", "Alice?"));
        assert_eq!(played.get(), 1);

        focused.set(false);
        tab.enqueue_or_render(inbound("bob", "Alicent is here"));
        assert_eq!(played.get(), 1);
    }

    #[test]
    fn test_outbound_mention_is_silent() {
        let played = Rc::new(Cell::new(0));
        let (mut tab, _rx) = tab();
        tab = tab.with_notifier({
            let played = played.clone();
            move || played.set(played.get() + 1)
        });
        tab.mark_ready();
        tab.handle_event(ChatEvent::SendSucceeded {
            text: "I am Alice".into(),
            is_action: false,
        });
        assert_eq!(played.get(), 0);
        assert_eq!(tab.display().len(), 1);
    }

    #[test]
    fn test_detect_mention() {
        let (tab, _rx) = tab();
        assert!(tab.detect_mention("hello Alice"));
        assert!(!tab.detect_mention("Alicet"));
    }

    #[test]
    fn test_send_message_flow() {
        let (mut tab, rx) = tab();
        tab.mark_ready();
        tab.input_mut().set_text("hello all");

        assert_eq!(tab.submit().unwrap(), Submission::Sent);
        assert!(!tab.input().enabled);
        assert_eq!(
            rx.try_recv().unwrap(),
            ChatAction::SendMessage {
                receiver: "#aeolus".into(),
                text: "hello all".into()
            }
        );

        // Only one send in flight
        assert!(matches!(tab.submit(), Err(ChatError::SendInFlight)));
        assert!(rx.try_recv().is_err());

        tab.handle_event(ChatEvent::SendSucceeded {
            text: "hello all".into(),
            is_action: false,
        });
        assert!(tab.input().enabled);
        assert!(tab.input().text.is_empty());
        assert_eq!(tab.display().len(), 1);
        assert_eq!(tab.display().fragments[0].sender, "Alice");
    }

    #[test]
    fn test_send_action_strips_prefix() {
        let (mut tab, rx) = tab();
        tab.mark_ready();
        tab.send_local("/me waves", "#aeolus").unwrap();
        assert_eq!(
            rx.try_recv().unwrap(),
            ChatAction::SendAction {
                receiver: "#aeolus".into(),
                text: "waves".into()
            }
        );
        tab.handle_event(ChatEvent::SendSucceeded {
            text: "waves".into(),
            is_action: true,
        });
        let html = &tab.display().fragments[0].html;
        assert!(html.contains("chat-message action\""));
        assert!(html.contains(">waves<"));
        assert!(!html.contains("/me"));
    }

    #[test]
    fn test_join_routes_to_backend() {
        let (mut tab, rx) = tab();
        tab.input_mut().set_text("/join newbie");
        assert_eq!(tab.submit().unwrap(), Submission::Joining("#newbie".into()));
        assert_eq!(rx.try_recv().unwrap(), ChatAction::JoinChannel("#newbie".into()));
        assert!(tab.input().enabled);
        assert!(tab.input().text.is_empty());
        tab.mark_ready();
        assert!(tab.display().is_empty());
    }

    #[test]
    fn test_send_failure_keeps_text() {
        let (mut tab, _rx) = tab();
        tab.mark_ready();
        tab.input_mut().set_text("will fail");
        tab.submit().unwrap();

        tab.handle_event(ChatEvent::SendFailed {
            text: "will fail".into(),
            cause: "not connected".into(),
        });
        assert!(tab.input().enabled);
        assert_eq!(tab.input().text, "will fail");
        assert!(tab.display().is_empty());
    }

    #[test]
    fn test_empty_input_ignored() {
        let (mut tab, rx) = tab();
        assert!(matches!(tab.send_local("   ", "#aeolus"), Err(ChatError::EmptyInput)));
        assert!(tab.input().enabled);
        assert!(rx.try_recv().is_err());
    }

    #[test]
    fn test_backend_gone_reenables_input() {
        let (mut tab, rx) = tab();
        drop(rx);
        tab.input_mut().set_text("hello");
        assert!(matches!(tab.submit(), Err(ChatError::SendFailed { .. })));
        assert!(tab.input().enabled);
        assert_eq!(tab.input().text, "hello");
    }

    #[test]
    fn test_identical_sends_render_twice() {
        let (mut tab, _rx) = tab();
        tab.mark_ready();
        for _ in 0..2 {
            tab.send_local("gg", "#aeolus").unwrap();
            tab.handle_event(ChatEvent::SendSucceeded {
                text: "gg".into(),
                is_action: false,
            });
        }
        assert_eq!(tab.display().len(), 2);
    }

    #[test]
    fn test_auto_complete_scenario() {
        let (mut tab, _rx) = tab();
        let (text, caret) = tab.auto_complete("ali", 3).unwrap();
        assert_eq!(text, "Alice");
        let (text, caret) = tab.auto_complete(&text, caret).unwrap();
        assert_eq!(text, "Alicent");
        let (text, _) = tab.auto_complete(&text, caret).unwrap();
        assert_eq!(text, "Alice");
        assert_eq!(tab.input().text, "Alice");
    }

    #[test]
    fn test_completion_refused_while_sending() {
        let (mut tab, _rx) = tab();
        tab.input_mut().set_text("hello");
        tab.submit().unwrap();

        assert!(matches!(tab.auto_complete("bo", 2), Err(ChatError::SendInFlight)));
        assert!(matches!(tab.complete_input(), Err(ChatError::SendInFlight)));
        tab.input_mut().set_text("bob");
        assert_eq!(tab.input().text, "hello");

        tab.handle_event(ChatEvent::SendFailed {
            text: "hello".into(),
            cause: "not connected".into(),
        });
        assert!(tab.input().enabled);
        assert_eq!(tab.input().text, "hello");
        assert_eq!(tab.input().caret, 5);
    }

    #[test]
    fn test_send_resets_completion() {
        let (mut tab, _rx) = tab();
        tab.input_mut().set_text("hi ali");
        tab.complete_input().unwrap();
        assert_eq!(tab.input().text, "hi Alice");
        assert!(tab.input().completion.is_active());

        tab.submit().unwrap();
        assert!(!tab.input().completion.is_active());
    }

    #[test]
    fn test_sender_styles_from_roster() {
        let roster = Arc::new(PlayerRoster::new());
        roster.upsert(PlayerInfo::new("mod").with_category(PlayerCategory::Moderator));
        let prefs = ChatPrefs::default();
        let (action_tx, _rx) = unbounded();
        let mut tab = ChatTab::new("#aeolus", "Alice", prefs.clone(), MemoryDisplay::new(), roster, action_tx);
        tab.mark_ready();
        tab.enqueue_or_render(inbound("mod", "behave"));

        assert_eq!(tab.styles().get("mod"), Some(prefs.mods_color));
        let expected = format!("color:#{}", prefs.mods_color.hex_digits());
        assert!(tab.display().fragments[0].html.contains(&expected));
    }
}
