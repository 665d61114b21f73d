// WHY: typographic cues on either side of a newline, kept separate from the numeric features
// so the character sets stay configurable and testable on their own

use regex_automata::meta::Regex;

use crate::error::{EndLinesError, Result};

/// Enumeration markers such as "1.", "2)", "a)", "IV." at the start of a line
const ENUMERATION_PATTERN: &str = r"^(?:[0-9]{1,3}|[A-Za-z]|[IVXLC]{1,6}|[ivxlc]{1,6})[.)](?:\s|$)";

/// Characters skipped when looking for the first letter of a line
const OPENING_WRAPPERS: &[char] = &['"', '\'', '\u{201C}', '\u{2018}', '\u{AB}', '(', '['];

/// Characters skipped when looking for the last meaningful character of a line
const CLOSING_WRAPPERS: &[char] = &['"', '\'', '\u{201D}', '\u{2019}', '\u{BB}', ')', ']'];

/// Detects line-start and line-end cues
#[derive(Debug)]
pub struct CueDetector {
    enumeration: Regex,
    bullet_markers: Vec<char>,
    terminal_punctuation: Vec<char>,
    continuation_punctuation: Vec<char>,
}

impl CueDetector {
    pub fn new(
        bullet_markers: Vec<char>,
        terminal_punctuation: Vec<char>,
        continuation_punctuation: Vec<char>,
    ) -> Result<Self> {
        let enumeration = Regex::new(ENUMERATION_PATTERN)
            .map_err(|e| EndLinesError::Config(format!("invalid enumeration pattern: {e}")))?;

        Ok(Self {
            enumeration,
            bullet_markers,
            terminal_punctuation,
            continuation_punctuation,
        })
    }

    /// Line starts with a bullet followed by whitespace, or with an enumeration marker
    pub fn starts_with_marker(&self, line: &str) -> bool {
        let trimmed = line.trim_start();
        let mut chars = trimmed.chars();

        if let Some(first) = chars.next() {
            if self.bullet_markers.contains(&first) {
                // "-5 mg" is a number, "- item" is a bullet
                return chars.next().map_or(true, char::is_whitespace);
            }
        }

        self.enumeration.is_match(trimmed)
    }

    /// Line ends with sentence-final punctuation, ignoring closing quotes and brackets
    pub fn ends_with_terminal(&self, line: &str) -> bool {
        last_visible_char(line).is_some_and(|c| self.terminal_punctuation.contains(&c))
    }

    /// Line ends with a comma or a hyphenation mark
    pub fn ends_with_continuation(&self, line: &str) -> bool {
        // Continuation marks are checked before closing wrappers are stripped
        line.trim_end()
            .chars()
            .next_back()
            .is_some_and(|c| self.continuation_punctuation.contains(&c))
    }
}

/// First character after leading whitespace and opening quotes or brackets
pub fn first_visible_char(line: &str) -> Option<char> {
    line.trim_start()
        .trim_start_matches(OPENING_WRAPPERS)
        .chars()
        .next()
}

/// Last character before trailing whitespace and closing quotes or brackets
pub fn last_visible_char(line: &str) -> Option<char> {
    line.trim_end()
        .trim_end_matches(CLOSING_WRAPPERS)
        .chars()
        .next_back()
}

/// At least two letters and no lowercase letter, e.g. "ANTECEDENTS" or "HISTOIRE DE LA MALADIE"
pub fn is_heading(line: &str) -> bool {
    let mut letters = 0usize;
    for c in line.chars().filter(|c| c.is_alphabetic()) {
        if c.is_lowercase() {
            return false;
        }
        letters += 1;
    }
    letters >= 2
}

/// Line is empty, or its share of non-whitespace characters is below `ratio`
pub fn is_near_empty(line: &str, ratio: f64) -> bool {
    if line.trim().is_empty() {
        return true;
    }
    let total = line.chars().count();
    let visible = line.chars().filter(|c| !c.is_whitespace()).count();
    (visible as f64) < ratio * total as f64
}
