//! Detection and highlighting of the local user's name in message text.

/// Matches the local username as a standalone word.
///
/// Matching is case-sensitive and exact. The name must not be preceded or
/// followed by a word character (alphanumeric or `_`), so `Alice` matches in
/// `"hi Alice!"` but not in `"Alicent"`.
#[derive(Debug, Clone)]
pub struct MentionMatcher {
    username: String,
}

impl MentionMatcher {
    pub fn new(username: impl Into<String>) -> Self {
        Self {
            username: username.into(),
        }
    }

    pub fn username(&self) -> &str {
        &self.username
    }

    pub fn is_match(&self, text: &str) -> bool {
        self.find_all(text, &self.username).next().is_some()
    }

    /// Wrap every whole-word occurrence of `needle` in an `own-username` span.
    ///
    /// `text` is HTML: occurrences that cut into a tag or an entity are left
    /// alone. `needle` is passed separately so callers can highlight the
    /// HTML-escaped form of the name.
    pub fn highlight(&self, text: &str, needle: &str) -> String {
        let markup = markup_ranges(text);
        let mut out = String::with_capacity(text.len() + 32);
        let mut last = 0;
        let starts: Vec<usize> = self
            .find_all(text, needle)
            .filter(|&start| {
                let end = start + needle.len();
                markup
                    .iter()
                    .all(|&(a, b)| b <= start || a >= end || (start <= a && b <= end))
            })
            .collect();
        for start in starts {
            out.push_str(&text[last..start]);
            out.push_str("<span class='own-username'>");
            out.push_str(needle);
            out.push_str("</span>");
            last = start + needle.len();
        }
        out.push_str(&text[last..]);
        out
    }

    fn find_all<'a>(&self, text: &'a str, needle: &'a str) -> impl Iterator<Item = usize> + 'a {
        let mut search_start = 0;
        std::iter::from_fn(move || {
            if needle.is_empty() {
                return None;
            }
            while let Some(pos) = text[search_start..].find(needle) {
                let abs_pos = search_start + pos;
                let end_pos = abs_pos + needle.len();

                let at_start = !text[..abs_pos].chars().next_back().is_some_and(is_word_char);
                let at_end = !text[end_pos..].chars().next().is_some_and(is_word_char);

                if at_start && at_end {
                    search_start = end_pos;
                    return Some(abs_pos);
                }
                // Step past the first char of this occurrence
                search_start = abs_pos + text[abs_pos..].chars().next().map_or(1, char::len_utf8);
            }
            None
        })
    }
}

fn is_word_char(c: char) -> bool {
    c.is_alphanumeric() || c == '_'
}

/// Byte ranges of `<...>` tags and `&...;` entities in `html`.
fn markup_ranges(html: &str) -> Vec<(usize, usize)> {
    let mut ranges = Vec::new();
    let mut pos = 0;
    while let Some(offset) = html[pos..].find(['<', '&']) {
        let start = pos + offset;
        let close = if html[start..].starts_with('<') { '>' } else { ';' };
        match html[start..].find(close) {
            Some(len) => {
                let end = start + len + 1;
                ranges.push((start, end));
                pos = end;
            }
            None => break,
        }
    }
    ranges
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mention_basic() {
        let m = MentionMatcher::new("Alice");
        assert!(m.is_match("hello Alice"));
        assert!(m.is_match("Alice: gg"));
        assert!(m.is_match("(Alice)"));
        assert!(m.is_match("Alice"));
    }

    #[test]
    fn test_mention_word_boundaries() {
        let m = MentionMatcher::new("Alice");
        assert!(!m.is_match("Alicet"));
        assert!(!m.is_match("malice"));
        assert!(!m.is_match("Alice_2"));
        // a later standalone occurrence still counts
        assert!(m.is_match("Alicent and Alice"));
    }

    #[test]
    fn test_mention_case_sensitive() {
        let m = MentionMatcher::new("Alice");
        assert!(!m.is_match("hello alice"));
        assert!(!m.is_match("ALICE"));
    }

    #[test]
    fn test_mention_edge_cases() {
        assert!(!MentionMatcher::new("").is_match("anything"));
        assert!(!MentionMatcher::new("Alice").is_match(""));
        // non-ASCII neighbours are word characters too
        assert!(!MentionMatcher::new("Alice").is_match("éAlice"));
        assert!(MentionMatcher::new("[clan]Bob").is_match("hi [clan]Bob"));
    }

    #[test]
    fn test_highlight_wraps_every_match() {
        let m = MentionMatcher::new("Alice");
        assert_eq!(
            m.highlight("Alice, Alicent and Alice", "Alice"),
            "<span class='own-username'>Alice</span>, Alicent and <span class='own-username'>Alice</span>"
        );
        assert_eq!(m.highlight("nobody here", "Alice"), "nobody here");
    }

    #[test]
    fn test_highlight_leaves_markup_alone() {
        let m = MentionMatcher::new("amp");
        assert_eq!(
            m.highlight("amp: salt &amp; pepper", "amp"),
            "<span class='own-username'>amp</span>: salt &amp; pepper"
        );

        let m = MentionMatcher::new("href");
        assert_eq!(
            m.highlight("<a href=\"x\">href</a>", "href"),
            "<a href=\"x\"><span class='own-username'>href</span></a>"
        );

        // an escaped name that contains an entity still matches whole
        let m = MentionMatcher::new("A&B");
        assert_eq!(
            m.highlight("hi A&amp;B", "A&amp;B"),
            "hi <span class='own-username'>A&amp;B</span>"
        );
    }
}
