use std::collections::HashMap;

use crate::config::{ChatPrefs, Color};
use crate::directory::{PlayerCategory, PlayerInfo};

/// Per-tab mapping of username to chat color.
///
/// Seeded with the local user's own color; every other sender is resolved the
/// first time they are rendered and keeps that color for the life of the tab.
#[derive(Debug, Clone)]
pub struct UserStyleMap {
    colors: HashMap<String, Color>,
}

impl UserStyleMap {
    pub fn new(local_user: &str, prefs: &ChatPrefs) -> Self {
        let mut colors = HashMap::new();
        colors.insert(local_user.to_string(), prefs.self_color);
        Self { colors }
    }

    /// Color for `username`, resolving and remembering it on first sight.
    pub fn color_for(&mut self, username: &str, player: Option<&PlayerInfo>, prefs: &ChatPrefs) -> Color {
        *self
            .colors
            .entry(username.to_string())
            .or_insert_with(|| category_color(player.map(|p| p.category).unwrap_or_default(), prefs))
    }

    pub fn get(&self, username: &str) -> Option<Color> {
        self.colors.get(username).copied()
    }

    pub fn len(&self) -> usize {
        self.colors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.colors.is_empty()
    }
}

fn category_color(category: PlayerCategory, prefs: &ChatPrefs) -> Color {
    match category {
        PlayerCategory::Moderator => prefs.mods_color,
        PlayerCategory::Friend => prefs.friends_color,
        PlayerCategory::ChatOnly => prefs.irc_color,
        PlayerCategory::Other => prefs.others_color,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_self_color_seeded() {
        let prefs = ChatPrefs::default();
        let styles = UserStyleMap::new("Alice", &prefs);
        assert_eq!(styles.get("Alice"), Some(prefs.self_color));
        assert_eq!(styles.len(), 1);
    }

    #[test]
    fn test_category_colors() {
        let prefs = ChatPrefs::default();
        let mut styles = UserStyleMap::new("Alice", &prefs);

        let moderator = PlayerInfo::new("mod").with_category(PlayerCategory::Moderator);
        let friend = PlayerInfo::new("pal").with_category(PlayerCategory::Friend);
        let irc = PlayerInfo::new("irc").with_category(PlayerCategory::ChatOnly);

        assert_eq!(styles.color_for("mod", Some(&moderator), &prefs), prefs.mods_color);
        assert_eq!(styles.color_for("pal", Some(&friend), &prefs), prefs.friends_color);
        assert_eq!(styles.color_for("irc", Some(&irc), &prefs), prefs.irc_color);
        assert_eq!(styles.color_for("stranger", None, &prefs), prefs.others_color);
        assert_eq!(styles.len(), 5);
    }

    #[test]
    fn test_first_resolution_sticks() {
        let prefs = ChatPrefs::default();
        let mut styles = UserStyleMap::new("Alice", &prefs);
        assert_eq!(styles.color_for("bob", None, &prefs), prefs.others_color);

        let now_friend = PlayerInfo::new("bob").with_category(PlayerCategory::Friend);
        assert_eq!(styles.color_for("bob", Some(&now_friend), &prefs), prefs.others_color);

        // the local user is never recolored
        let me = PlayerInfo::new("Alice").with_category(PlayerCategory::Moderator);
        assert_eq!(styles.color_for("Alice", Some(&me), &prefs), prefs.self_color);
    }
}
