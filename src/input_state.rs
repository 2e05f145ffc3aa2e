//! Compose field state: text, caret, send lock and username tab completion.

use crate::error::ChatError;

/// Tab completion state, alive from the first Tab press after a reset until
/// the input is edited, the caret moves elsewhere, or a message is sent.
#[derive(Debug, Default, Clone)]
pub struct AutoComplete {
    /// Sorted candidates for the current partial name
    candidates: Vec<String>,
    /// Index of the candidate the next Tab press will insert
    next_index: usize,
    /// The word that was completed
    partial_name: Option<String>,
}

impl AutoComplete {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn reset(&mut self) {
        self.candidates.clear();
        self.next_index = 0;
        self.partial_name = None;
    }

    pub fn is_active(&self) -> bool {
        self.partial_name.is_some()
    }

    pub fn candidates(&self) -> &[String] {
        &self.candidates
    }

    pub fn partial_name(&self) -> Option<&str> {
        self.partial_name.as_deref()
    }

    /// Complete the word before `caret` against `usernames`.
    ///
    /// Returns the new input text and caret position. The first call captures
    /// the partial name; later calls cycle through the candidates as long as
    /// the text before the caret still ends with the last inserted candidate.
    pub fn complete<I, S>(&mut self, input: &str, caret: usize, usernames: I) -> Result<(String, usize), ChatError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        if input.is_empty() {
            return Err(ChatError::EmptyInput);
        }
        let caret = floor_char_boundary(input, caret);

        if self.is_active() {
            let last_inserted = self
                .next_index
                .checked_sub(1)
                .and_then(|i| self.candidates.get(i))
                .filter(|last| input[..caret].ends_with(last.as_str()));
            if let Some(last) = last_inserted {
                // Candidates may hold characters that end a word, so cycle on
                // the inserted text itself
                let start = caret - last.len();
                if self.candidates.len() == 1 {
                    return Ok((input.to_string(), caret));
                }
                if self.next_index >= self.candidates.len() {
                    self.next_index = 0;
                }
                return Ok(self.insert_next(input, start, caret));
            }
            // The user moved on to another word; start over
            self.reset();
        }

        let (start, word) = word_before_caret(input, caret);

        if word.is_empty() {
            return Err(ChatError::NoCompletionMatch);
        }

        let candidates = collect_candidates(word, usernames);
        if candidates.is_empty() {
            self.reset();
            return Err(ChatError::NoCompletionMatch);
        }
        self.partial_name = Some(word.to_string());
        self.candidates = candidates;
        self.next_index = 0;
        Ok(self.insert_next(input, start, caret))
    }

    fn insert_next(&mut self, input: &str, start: usize, caret: usize) -> (String, usize) {
        let completion = &self.candidates[self.next_index];
        self.next_index += 1;
        let text = format!("{}{}{}", &input[..start], completion, &input[caret..]);
        (text, start + completion.len())
    }
}

/// Usernames whose lowercase form starts with the lowercase `prefix`, sorted
/// case-insensitively with duplicates removed.
pub fn collect_candidates<I, S>(prefix: &str, usernames: I) -> Vec<String>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let prefix_lower = prefix.to_lowercase();
    let mut matches: Vec<String> = usernames
        .into_iter()
        .filter(|name| name.as_ref().to_lowercase().starts_with(&prefix_lower))
        .map(|name| name.as_ref().to_string())
        .collect();
    matches.sort_by(|a, b| a.to_lowercase().cmp(&b.to_lowercase()).then_with(|| a.cmp(b)));
    matches.dedup();
    matches
}

/// Start offset and text of the word that ends at `caret`.
///
/// A word is a run of alphanumerics, `_` and `-`, so leading punctuation
/// such as `@` or `(` stays out of the completed name.
pub fn word_before_caret(input: &str, caret: usize) -> (usize, &str) {
    let before = &input[..caret];
    let start = before
        .char_indices()
        .rev()
        .find(|(_, c)| !is_name_char(*c))
        .map_or(0, |(i, c)| i + c.len_utf8());
    (start, &before[start..])
}

fn is_name_char(c: char) -> bool {
    c.is_alphanumeric() || c == '_' || c == '-'
}

fn floor_char_boundary(s: &str, mut idx: usize) -> usize {
    if idx >= s.len() {
        return s.len();
    }
    while !s.is_char_boundary(idx) {
        idx -= 1;
    }
    idx
}

/// Manages the compose field of one chat tab.
#[derive(Debug, Default)]
pub struct InputState {
    /// Current message being composed
    pub text: String,

    /// Caret position as a byte offset into `text`
    pub caret: usize,

    /// False while a send is waiting for its acknowledgment
    pub enabled: bool,

    pub completion: AutoComplete,
}

impl InputState {
    pub fn new() -> Self {
        Self {
            enabled: true,
            ..Self::default()
        }
    }

    /// Replace the text (user typed), putting the caret at the end.
    /// Ignored while a send is in flight.
    pub fn set_text(&mut self, text: impl Into<String>) {
        if !self.enabled {
            return;
        }
        let text = text.into();
        if text != self.text {
            self.completion.reset();
        }
        self.caret = text.len();
        self.text = text;
    }

    pub fn move_caret(&mut self, caret: usize) {
        if !self.enabled {
            return;
        }
        let caret = floor_char_boundary(&self.text, caret);
        if caret != self.caret {
            self.completion.reset();
        }
        self.caret = caret;
    }

    /// Run tab completion on the current text and apply the result.
    pub fn auto_complete<I, S>(&mut self, usernames: I) -> Result<(), ChatError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        if !self.enabled {
            return Err(ChatError::SendInFlight);
        }
        let (text, caret) = self.completion.complete(&self.text, self.caret, usernames)?;
        self.text = text;
        self.caret = caret;
        Ok(())
    }

    /// Lock the field while a send is in flight.
    pub fn disable(&mut self) {
        self.enabled = false;
    }

    /// Send failed: unlock, keep the text for a retry.
    pub fn enable(&mut self) {
        self.enabled = true;
    }

    /// Send succeeded: unlock and clear.
    pub fn clear(&mut self) {
        self.text.clear();
        self.caret = 0;
        self.enabled = true;
        self.completion.reset();
    }
}
