//! Turns chat messages into HTML fragments for the display surface.

use once_cell::sync::Lazy;
use regex::Regex;

use crate::config::Color;
use crate::directory::PlayerInfo;
use crate::display::RenderedFragment;
use crate::message::ChatMessage;
use crate::mention::MentionMatcher;

/// Template for one chat line.
pub const MESSAGE_TEMPLATE: &str = concat!(
    "<div class=\"chat-message {css-classes}\">",
    "<span class=\"chat-message-time\">{time}</span>",
    "<img class=\"chat-message-avatar\" src=\"{avatar}\"/>",
    "<span class=\"chat-message-clan\">{clan-tag}</span>",
    "<span class=\"chat-message-username\">{username}</span>",
    "<span class=\"chat-message-text\">{text}</span>",
    "</div>"
);

pub const ACTION_CSS_CLASS: &str = "action";
pub const MESSAGE_CSS_CLASS: &str = "message";

// Runs on already-escaped text, so quotes and angle brackets are entities here
static URL_PATTERN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\b(?:https?://|www\.)[^\s&]+(?:&amp;[^\s&]+)*").expect("valid URL regex"));

/// Renders [`ChatMessage`]s into [`RenderedFragment`]s.
#[derive(Debug, Clone)]
pub struct MessageRenderer {
    mention: MentionMatcher,
    /// The local username as it appears in escaped text
    escaped_username: String,
}

impl MessageRenderer {
    pub fn new(mention: MentionMatcher) -> Self {
        let escaped_username = escape_html(mention.username());
        Self {
            mention,
            escaped_username,
        }
    }

    /// Render `message`.
    ///
    /// `highlight` wraps occurrences of the local username in the text;
    /// `player` supplies the avatar and clan tag when the sender is known.
    pub fn render(
        &self,
        message: &ChatMessage,
        color: Color,
        player: Option<&PlayerInfo>,
        highlight: bool,
    ) -> RenderedFragment {
        let mut text = linkify(&escape_html(&message.text));
        if highlight {
            text = self.mention.highlight(&text, &self.escaped_username);
        }

        let avatar = player
            .and_then(|p| p.avatar_url.as_deref())
            .map(escape_html)
            .unwrap_or_default();
        let clan_tag = player
            .and_then(|p| p.clan.as_deref())
            .filter(|clan| !clan.is_empty())
            .map(|clan| format!("[{}]", escape_html(clan)))
            .unwrap_or_default();

        let kind = if message.is_action {
            ACTION_CSS_CLASS
        } else {
            MESSAGE_CSS_CLASS
        };
        // The closing quote of the class attribute comes from the template
        let css_classes = format!("{}\" style=\"color:#{}", kind, color.hex_digits());

        let html = MESSAGE_TEMPLATE
            .replace("{time}", &message.timestamp.format("%H:%M").to_string())
            .replace("{avatar}", &avatar)
            .replace("{username}", &escape_html(&message.sender))
            .replace("{clan-tag}", &clan_tag)
            .replace("{css-classes}", &css_classes)
            // last, so placeholders typed by users are never expanded
            .replace("{text}", &text);

        RenderedFragment {
            sender: message.sender.clone(),
            html,
        }
    }
}

/// Escape text for inclusion in HTML content or attribute values.
pub fn escape_html(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}

/// Wrap URLs in escaped text in anchor tags.
pub fn linkify(escaped: &str) -> String {
    URL_PATTERN
        .replace_all(escaped, |caps: &regex::Captures| {
            let url = &caps[0];
            let href = if url.starts_with("www.") {
                format!("http://{}", url)
            } else {
                url.to_string()
            };
            format!("<a href=\"{}\" target=\"_blank\">{}</a>", href, url)
        })
        .into_owned()
}
