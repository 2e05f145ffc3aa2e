//! Lobby chat library.
//!
//! The chat-tab message pipeline of a game lobby client: buffering until the
//! display is ready, ordered rendering, per-user styling, mention detection
//! and username tab completion. Rendering, networking and notifications sit
//! behind the traits in [`display`], [`services`] and [`directory`].

pub mod backend;
pub mod commands;
pub mod config;
pub mod directory;
pub mod display;
pub mod error;
pub mod input_state;
pub mod mention;
pub mod message;
pub mod protocol;
pub mod render;
pub mod services;
pub mod styles;
pub mod tab;
pub mod transcript;


pub use error::{ChatError, SendError};
pub use message::ChatMessage;
pub use tab::{ChatTab, Submission};
