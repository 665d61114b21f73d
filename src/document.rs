// WHY: documents are owned by the caller; events borrow from them so extraction never copies text

use crate::error::{EndLinesError, Result};

/// A block of text with the byte offsets of its newline characters
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Document {
    id: String,
    text: String,
    newline_offsets: Vec<usize>,
    /// Byte offset just past the last non-whitespace character
    content_end: usize,
}

impl Document {
    /// Build a document by scanning the text for `'\n'`
    pub fn new(id: impl Into<String>, text: impl Into<String>) -> Result<Self> {
        let text = text.into();
        let offsets = text
            .bytes()
            .enumerate()
            .filter(|&(_, b)| b == b'\n')
            .map(|(i, _)| i)
            .collect();
        Self::with_newlines(id, text, offsets)
    }

    /// Build a document from host-provided newline offsets
    ///
    /// Offsets must be strictly increasing byte positions of `'\n'` characters.
    /// The host may pass a subset of the newlines in the text; only those are classified.
    pub fn with_newlines(
        id: impl Into<String>,
        text: impl Into<String>,
        newline_offsets: Vec<usize>,
    ) -> Result<Self> {
        let id = id.into();
        let text = text.into();

        if text.is_empty() {
            return Err(EndLinesError::InvalidDocument(format!("document '{id}' is empty")));
        }

        let bytes = text.as_bytes();
        let mut previous: Option<usize> = None;
        for &offset in &newline_offsets {
            if offset >= bytes.len() {
                return Err(EndLinesError::InvalidDocument(format!(
                    "document '{id}': newline offset {offset} is past the end of the text ({} bytes)",
                    bytes.len()
                )));
            }
            if bytes[offset] != b'\n' {
                return Err(EndLinesError::InvalidDocument(format!(
                    "document '{id}': offset {offset} does not hold a newline character"
                )));
            }
            if previous.is_some_and(|p| p >= offset) {
                return Err(EndLinesError::InvalidDocument(format!(
                    "document '{id}': newline offsets must be strictly increasing (at {offset})"
                )));
            }
            previous = Some(offset);
        }

        let content_end = text.trim_end().len();
        Ok(Self {
            id,
            text,
            newline_offsets,
            content_end,
        })
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn newline_offsets(&self) -> &[usize] {
        &self.newline_offsets
    }

    pub fn newline_count(&self) -> usize {
        self.newline_offsets.len()
    }

    /// One event per newline, in offset order
    pub fn events(&self) -> impl Iterator<Item = LineBreakEvent<'_>> + '_ {
        self.newline_offsets
            .iter()
            .map(move |&offset| self.event_at(offset))
    }

    fn event_at(&self, offset: usize) -> LineBreakEvent<'_> {
        let text = self.text.as_str();

        let line_start = text[..offset].rfind('\n').map_or(0, |p| p + 1);
        let next_start = offset + 1;
        let next_end = text[next_start..]
            .find('\n')
            .map_or(text.len(), |p| next_start + p);

        LineBreakEvent {
            document_id: &self.id,
            offset,
            preceding: strip_carriage_return(&text[line_start..offset]),
            following: strip_carriage_return(&text[next_start..next_end]),
            at_document_end: offset >= self.content_end,
        }
    }

    /// Character length of every non-blank line, trailing whitespace trimmed
    pub fn line_lengths(&self) -> Vec<usize> {
        self.text
            .split('\n')
            .map(str::trim_end)
            .filter(|line| !line.trim_start().is_empty())
            .map(|line| line.chars().count())
            .collect()
    }
}

/// One newline occurrence and the lines on either side of it
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LineBreakEvent<'a> {
    pub document_id: &'a str,
    /// Byte offset of the `'\n'`
    pub offset: usize,
    /// Line ending at this newline (without the newline or a `'\r'` before it)
    pub preceding: &'a str,
    /// Line starting after this newline
    pub following: &'a str,
    /// Only whitespace follows this newline
    pub at_document_end: bool,
}

// "\r\n" counts as a single newline located at the '\n'
fn strip_carriage_return(line: &str) -> &str {
    line.strip_suffix('\r').unwrap_or(line)
}
