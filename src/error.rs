//! Error types for the chat pipeline and its collaborators.

/// Failure reported by a [`NetworkMessaging`](crate::services::NetworkMessaging) implementation.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SendError {
    #[error("rejected by server: {0}")]
    Rejected(String),
    #[error("not connected")]
    Disconnected,
}

/// Errors surfaced by the chat tab.
///
/// None of these are fatal: after any of them the tab is left with its input
/// enabled and its queue and style map untouched.
#[derive(Debug, thiserror::Error)]
pub enum ChatError {
    /// Input was empty after trimming. Callers ignore this silently.
    #[error("input is empty")]
    EmptyInput,
    /// Tab completion found no username for the word before the caret.
    #[error("no completion matches")]
    NoCompletionMatch,
    /// A send is already waiting for its acknowledgment.
    #[error("a message is already being sent")]
    SendInFlight,
    #[error("message to {receiver} could not be sent: {cause}")]
    SendFailed { receiver: String, cause: String },
    #[error("invalid color: {0}")]
    InvalidColor(String),
    #[error("could not determine config directory")]
    ConfigDir,
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),
}
