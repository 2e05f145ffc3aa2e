//! Classification of text typed into the compose field (/me, /join, plain text).

pub const ACTION_PREFIX: &str = "/me ";
pub const JOIN_PREFIX: &str = "/join ";

/// What a line of compose input asks the chat tab to do
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LocalInput {
    /// Nothing to send
    Empty,
    /// `/me <text>`, prefix stripped
    Action(String),
    /// `/join <channel>`, normalized to start with `#`
    Join(String),
    /// Anything else, sent verbatim
    Message(String),
}

/// Classify compose input by its prefix.
pub fn parse_input(text: &str) -> LocalInput {
    if text.trim().is_empty() {
        return LocalInput::Empty;
    }

    if let Some(body) = text.strip_prefix(ACTION_PREFIX) {
        if body.trim().is_empty() {
            return LocalInput::Empty;
        }
        return LocalInput::Action(body.to_string());
    }

    if let Some(rest) = text.strip_prefix(JOIN_PREFIX) {
        let Some(chan) = rest.split_whitespace().next() else {
            return LocalInput::Empty;
        };
        let channel = if chan.starts_with('#') {
            chan.to_string()
        } else {
            format!("#{}", chan)
        };
        return LocalInput::Join(channel);
    }

    LocalInput::Message(text.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_plain_message() {
        assert_eq!(parse_input("hello there"), LocalInput::Message("hello there".into()));
        // only a leading marker counts
        assert_eq!(parse_input("say /me waves"), LocalInput::Message("say /me waves".into()));
    }

    #[test]
    fn test_action() {
        assert_eq!(parse_input("/me waves"), LocalInput::Action("waves".into()));
        assert_eq!(parse_input("/me   "), LocalInput::Empty);
        // "/me" without a trailing space is not an action
        assert_eq!(parse_input("/mew"), LocalInput::Message("/mew".into()));
    }

    #[test]
    fn test_join() {
        assert_eq!(parse_input("/join #aeolus"), LocalInput::Join("#aeolus".into()));
        assert_eq!(parse_input("/join newbie"), LocalInput::Join("#newbie".into()));
        assert_eq!(parse_input("/join "), LocalInput::Empty);
    }

    #[test]
    fn test_empty() {
        assert_eq!(parse_input(""), LocalInput::Empty);
        assert_eq!(parse_input("   "), LocalInput::Empty);
    }
}
