//! Backend event loop: carries chat actions to the network and reports the
//! outcome of each one back to the owning tab.

use crossbeam_channel::{Receiver, Sender, TryRecvError};
use std::time::Duration;
use tokio::runtime::Runtime;

use crate::protocol::{ChatAction, ChatEvent};
use crate::services::NetworkMessaging;

/// How long to sleep when no action is waiting
const POLL_INTERVAL: Duration = Duration::from_millis(10);

/// Run the backend event loop on a tokio runtime.
///
/// Returns once every sender of `action_rx` has been dropped. Every
/// `SendMessage` and `SendAction` yields exactly one `SendSucceeded` or
/// `SendFailed` event.
pub fn run_backend<N: NetworkMessaging>(mut network: N, action_rx: Receiver<ChatAction>, event_tx: Sender<ChatEvent>) {
    let rt = match Runtime::new() {
        Ok(rt) => rt,
        Err(e) => {
            tracing::error!(error = %e, "failed to create tokio runtime");
            // Still answer every send so no tab is left disabled
            while let Ok(action) = action_rx.recv() {
                if let Some(event) = unavailable(action, &e.to_string()) {
                    let _ = event_tx.send(event);
                }
            }
            return;
        }
    };

    rt.block_on(async move {
        loop {
            match action_rx.try_recv() {
                Ok(action) => {
                    if let Some(event) = handle_action(&mut network, action).await {
                        if event_tx.send(event).is_err() {
                            tracing::debug!("event receiver dropped, stopping backend");
                            break;
                        }
                    }
                }
                Err(TryRecvError::Empty) => tokio::time::sleep(POLL_INTERVAL).await,
                Err(TryRecvError::Disconnected) => break,
            }
        }
    });
}

/// Perform one action against the network.
pub async fn handle_action<N: NetworkMessaging>(network: &mut N, action: ChatAction) -> Option<ChatEvent> {
    match action {
        ChatAction::SendMessage { receiver, text } => Some(match network.send_message(&receiver, &text).await {
            Ok(sent) => ChatEvent::SendSucceeded {
                text: sent,
                is_action: false,
            },
            Err(e) => {
                tracing::warn!(%receiver, error = %e, "message could not be sent");
                ChatEvent::SendFailed {
                    text,
                    cause: e.to_string(),
                }
            }
        }),
        ChatAction::SendAction { receiver, text } => Some(match network.send_action(&receiver, &text).await {
            Ok(sent) => ChatEvent::SendSucceeded {
                text: sent,
                is_action: true,
            },
            Err(e) => {
                tracing::warn!(%receiver, error = %e, "action could not be sent");
                ChatEvent::SendFailed {
                    text,
                    cause: e.to_string(),
                }
            }
        }),
        ChatAction::JoinChannel(channel) => match network.join_channel(&channel).await {
            Ok(()) => {
                tracing::info!(%channel, "joined channel");
                Some(ChatEvent::JoinedChannel(channel))
            }
            Err(e) => {
                tracing::warn!(%channel, error = %e, "could not join channel");
                None
            }
        },
    }
}

fn unavailable(action: ChatAction, cause: &str) -> Option<ChatEvent> {
    match action {
        ChatAction::SendMessage { text, .. } | ChatAction::SendAction { text, .. } => Some(ChatEvent::SendFailed {
            text,
            cause: cause.to_string(),
        }),
        ChatAction::JoinChannel(_) => None,
    }
}
