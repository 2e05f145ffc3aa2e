use chrono::{DateTime, Local};

/// A single chat line, either typed locally or received from the network.
#[derive(Clone, Debug, PartialEq)]
pub struct ChatMessage {
    pub timestamp: DateTime<Local>,
    pub sender: String,
    pub text: String,
    /// `/me` messages
    pub is_action: bool,
}

impl ChatMessage {
    pub fn new(timestamp: DateTime<Local>, sender: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            timestamp,
            sender: sender.into(),
            text: text.into(),
            is_action: false,
        }
    }

    pub fn action(timestamp: DateTime<Local>, sender: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            is_action: true,
            ..Self::new(timestamp, sender, text)
        }
    }

    /// Stamped with the current local time.
    pub fn now(sender: impl Into<String>, text: impl Into<String>, is_action: bool) -> Self {
        Self {
            is_action,
            ..Self::new(Local::now(), sender, text)
        }
    }

    pub fn is_blank(&self) -> bool {
        self.text.trim().is_empty()
    }
}

/// Whether a message was typed here or came from someone else
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Direction {
    Inbound,
    Outbound,
}
