use serde::{Deserialize, Serialize};
use directories::ProjectDirs;
use std::fmt;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use crate::error::ChatError;

// Default configuration
pub const DEFAULT_USERNAME: &str = "player";
pub const DEFAULT_MAX_MESSAGES: usize = 500;

/// A 24-bit RGB color, stored in settings as `#rrggbb`
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Color {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Color {
    pub const fn rgb(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }

    /// Parse `#rrggbb` or `rrggbb`.
    pub fn parse_hex(s: &str) -> Result<Self, ChatError> {
        let hex = s.trim().trim_start_matches('#');
        if hex.len() != 6 || !hex.chars().all(|c| c.is_ascii_hexdigit()) {
            return Err(ChatError::InvalidColor(s.to_string()));
        }
        let channel = |i: usize| {
            u8::from_str_radix(&hex[i..i + 2], 16).map_err(|_| ChatError::InvalidColor(s.to_string()))
        };
        Ok(Self::rgb(channel(0)?, channel(2)?, channel(4)?))
    }

    /// Lowercase hex digits without the leading `#`.
    pub fn hex_digits(&self) -> String {
        format!("{:02x}{:02x}{:02x}", self.r, self.g, self.b)
    }
}

impl fmt::Display for Color {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.hex_digits())
    }
}

impl TryFrom<String> for Color {
    type Error = ChatError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Color::parse_hex(&value)
    }
}

impl From<Color> for String {
    fn from(color: Color) -> Self {
        color.to_string()
    }
}

/// Chat display preferences
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
#[serde(default)]
pub struct ChatPrefs {
    /// Color of the local user's own messages
    pub self_color: Color,
    pub mods_color: Color,
    pub friends_color: Color,
    /// Players connected through plain IRC rather than the game client
    pub irc_color: Color,
    pub others_color: Color,
    /// Messages retained by the display before the oldest are pruned
    pub max_messages: usize,
    /// Append rendered messages to per-channel log files
    pub log_transcripts: bool,
}

impl Default for ChatPrefs {
    fn default() -> Self {
        Self {
            self_color: Color::rgb(0x7f, 0xbf, 0x7f),
            mods_color: Color::rgb(0xff, 0x6f, 0x6f),
            friends_color: Color::rgb(0xff, 0xd2, 0x4d),
            irc_color: Color::rgb(0x9f, 0x9f, 0xcf),
            others_color: Color::rgb(0xdc, 0xdc, 0xdc),
            max_messages: DEFAULT_MAX_MESSAGES,
            log_transcripts: false,
        }
    }
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct Settings {
    pub username: String,
    #[serde(default)]
    pub prefs: ChatPrefs,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            username: DEFAULT_USERNAME.to_string(),
            prefs: ChatPrefs::default(),
        }
    }
}

pub fn settings_path() -> Result<PathBuf, ChatError> {
    let proj = ProjectDirs::from("com", "lobby-chat", "lobby-chat").ok_or(ChatError::ConfigDir)?;
    let dir = proj.config_dir();
    fs::create_dir_all(dir)?;
    Ok(dir.join("settings.json"))
}

/// Load settings from the default location, falling back to defaults.
pub fn load_settings() -> Settings {
    match settings_path().and_then(|path| load_settings_from(&path)) {
        Ok(settings) => settings,
        Err(e) => {
            tracing::debug!(error = %e, "using default settings");
            Settings::default()
        }
    }
}

pub fn load_settings_from(path: &Path) -> Result<Settings, ChatError> {
    let content = fs::read_to_string(path)?;
    Ok(serde_json::from_str(&content)?)
}

pub fn save_settings(settings: &Settings) -> Result<(), ChatError> {
    save_settings_to(&settings_path()?, settings)
}

pub fn save_settings_to(path: &Path, settings: &Settings) -> Result<(), ChatError> {
    let data = serde_json::to_string_pretty(settings)?;
    let mut file = fs::File::create(path)?;
    file.write_all(data.as_bytes())?;
    Ok(())
}
