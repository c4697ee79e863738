//! Title derivation and content statistics.
//!
//! Both are pure functions of a note's content.

use std::fmt;

/// Placeholder shown for notes whose first line is blank.
pub const UNTITLED: &str = "Untitled";

/// Titles are cut to this many characters.
pub const TITLE_MAX_CHARS: usize = 50;

/// Derive a display title from note content.
///
/// The title is the first line, trimmed. A blank first line yields
/// [`UNTITLED`]. Long titles are cut at [`TITLE_MAX_CHARS`] characters.
pub fn derive_title(content: &str) -> String {
    let first_line = content.lines().next().unwrap_or("").trim();
    if first_line.is_empty() {
        return UNTITLED.to_string();
    }

    match first_line.char_indices().nth(TITLE_MAX_CHARS) {
        Some((cut, _)) => first_line[..cut].trim_end().to_string(),
        None => first_line.to_string(),
    }
}

/// Word and character counts for a piece of note content.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct NoteStats {
    pub words: usize,
    pub chars: usize,
}

impl NoteStats {
    pub fn of(content: &str) -> Self {
        let trimmed = content.trim();
        Self {
            words: trimmed.split_whitespace().count(),
            chars: trimmed.chars().count(),
        }
    }
}

impl fmt::Display for NoteStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.words == 0 {
            return write!(f, "0 words");
        }
        let plural = if self.words == 1 { "" } else { "s" };
        write!(f, "{} word{}  ·  {} chars", self.words, plural, self.chars)
    }
}
