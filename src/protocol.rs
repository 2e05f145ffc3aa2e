use crate::message::ChatMessage;

/// Actions sent from a chat tab to the Backend
#[derive(Debug, Clone, PartialEq)]
pub enum ChatAction {
    /// Send a plain message to a channel or player
    SendMessage { receiver: String, text: String },
    /// Send a `/me` action; `text` has the prefix already stripped
    SendAction { receiver: String, text: String },
    /// Join a channel
    JoinChannel(String),
}

/// Events delivered to a chat tab's owning thread
#[derive(Debug, Clone, PartialEq)]
pub enum ChatEvent {
    /// The display surface finished loading and accepts render calls
    DisplayReady,
    /// A message arrived from someone else
    MessageReceived(ChatMessage),
    /// The server accepted our message; `text` is the final text as sent
    SendSucceeded { text: String, is_action: bool },
    /// The server rejected our message or we are not connected
    SendFailed { text: String, cause: String },
    /// A channel join request completed
    JoinedChannel(String),
}
