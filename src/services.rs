//! Capabilities a chat tab consumes from the rest of the client.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, PoisonError};

use crate::error::SendError;

/// Network side of chat.
///
/// Successful sends resolve to the text as it was actually sent, which is
/// what the tab renders.
#[allow(async_fn_in_trait)]
pub trait NetworkMessaging {
    async fn send_message(&mut self, receiver: &str, text: &str) -> Result<String, SendError>;

    async fn send_action(&mut self, receiver: &str, text: &str) -> Result<String, SendError>;

    async fn join_channel(&mut self, channel: &str) -> Result<(), SendError>;
}

/// Plays the mention sound.
pub trait NotificationSink {
    fn play_mention(&self);
}

/// Whether the user is currently looking at this tab.
pub trait FocusOracle {
    fn is_tab_focused(&self) -> bool;
}

impl<F: Fn()> NotificationSink for F {
    fn play_mention(&self) {
        self()
    }
}

impl<F: Fn() -> bool> FocusOracle for F {
    fn is_tab_focused(&self) -> bool {
        self()
    }
}

/// A [`NetworkMessaging`] that acknowledges everything locally.
///
/// Sends fail with [`SendError::Disconnected`] while the shared `online` flag
/// is cleared, which lets tests and the demo binary exercise the failure path.
#[derive(Debug, Clone)]
pub struct LoopbackNetwork {
    online: Arc<AtomicBool>,
    joined: Arc<Mutex<Vec<String>>>,
}

impl Default for LoopbackNetwork {
    fn default() -> Self {
        Self::new()
    }
}

impl LoopbackNetwork {
    pub fn new() -> Self {
        Self {
            online: Arc::new(AtomicBool::new(true)),
            joined: Arc::new(Mutex::new(Vec::new())),
        }
    }

    pub fn set_online(&self, online: bool) {
        self.online.store(online, Ordering::SeqCst);
    }

    pub fn joined_channels(&self) -> Vec<String> {
        self.joined.lock().unwrap_or_else(PoisonError::into_inner).clone()
    }

    fn check_online(&self) -> Result<(), SendError> {
        if self.online.load(Ordering::SeqCst) {
            Ok(())
        } else {
            Err(SendError::Disconnected)
        }
    }
}

impl NetworkMessaging for LoopbackNetwork {
    async fn send_message(&mut self, _receiver: &str, text: &str) -> Result<String, SendError> {
        self.check_online()?;
        Ok(text.to_string())
    }

    async fn send_action(&mut self, _receiver: &str, text: &str) -> Result<String, SendError> {
        self.check_online()?;
        Ok(text.to_string())
    }

    async fn join_channel(&mut self, channel: &str) -> Result<(), SendError> {
        self.check_online()?;
        self.joined
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(channel.to_string());
        Ok(())
    }
}
