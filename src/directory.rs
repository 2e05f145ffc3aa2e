//! Known players: completion candidates and per-sender display info.

use std::collections::HashMap;
use std::sync::{PoisonError, RwLock};

/// How a player relates to the local user, which decides their chat color
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PlayerCategory {
    /// Moderates at least one channel
    Moderator,
    Friend,
    /// Connected through IRC rather than the game client
    ChatOnly,
    #[default]
    Other,
}

/// Display information about a player
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlayerInfo {
    pub username: String,
    pub clan: Option<String>,
    pub avatar_url: Option<String>,
    pub category: PlayerCategory,
}

impl PlayerInfo {
    pub fn new(username: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            clan: None,
            avatar_url: None,
            category: PlayerCategory::Other,
        }
    }

    pub fn with_category(mut self, category: PlayerCategory) -> Self {
        self.category = category;
        self
    }

    pub fn with_clan(mut self, clan: impl Into<String>) -> Self {
        self.clan = Some(clan.into());
        self
    }

    pub fn with_avatar(mut self, url: impl Into<String>) -> Self {
        self.avatar_url = Some(url.into());
        self
    }
}

/// Source of known usernames and player details.
pub trait UserDirectory {
    fn all_known_usernames(&self) -> Vec<String>;

    fn player(&self, username: &str) -> Option<PlayerInfo>;
}

/// In-memory [`UserDirectory`] that the network side can update while a tab
/// reads from it.
#[derive(Debug, Default)]
pub struct PlayerRoster {
    players: RwLock<HashMap<String, PlayerInfo>>,
}

impl PlayerRoster {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn upsert(&self, info: PlayerInfo) {
        let mut players = self.players.write().unwrap_or_else(PoisonError::into_inner);
        players.insert(info.username.clone(), info);
    }

    pub fn remove(&self, username: &str) -> Option<PlayerInfo> {
        let mut players = self.players.write().unwrap_or_else(PoisonError::into_inner);
        players.remove(username)
    }

    pub fn len(&self) -> usize {
        self.players.read().unwrap_or_else(PoisonError::into_inner).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl<I: Into<PlayerInfo>> FromIterator<I> for PlayerRoster {
    fn from_iter<T: IntoIterator<Item = I>>(iter: T) -> Self {
        let roster = Self::new();
        for info in iter {
            roster.upsert(info.into());
        }
        roster
    }
}

impl From<&str> for PlayerInfo {
    fn from(username: &str) -> Self {
        PlayerInfo::new(username)
    }
}

impl UserDirectory for PlayerRoster {
    fn all_known_usernames(&self) -> Vec<String> {
        let players = self.players.read().unwrap_or_else(PoisonError::into_inner);
        players.keys().cloned().collect()
    }

    fn player(&self, username: &str) -> Option<PlayerInfo> {
        let players = self.players.read().unwrap_or_else(PoisonError::into_inner);
        players.get(username).cloned()
    }
}
