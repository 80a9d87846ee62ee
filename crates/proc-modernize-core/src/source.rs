//! Source buffers with a precomputed line index.
//!
//! Every buffer handed to a rule is normalized first so that:
//! - line endings are `\n` only (handles `\r\n`, `\r` and `\n`)
//! - byte offsets in [`LineIndex`] are accurate regardless of the original
//!   line terminator style
//!
//! Rust's [`str::lines()`] strips both `\r\n` and `\n` but reports the same
//! `line.len()` either way; code that accumulates offsets with
//! `offset += line.len() + 1` drifts by one byte per `\r\n` line. The index
//! here is built from actual byte positions in the normalized text.

use crate::span::{SourcePos, SourceRange, Span};

/// A named, normalized source text and its line index.
#[derive(Debug, Clone)]
pub struct SourceBuffer {
    /// File name or path the text was read from.
    pub name: String,
    /// Source text with all line endings converted to `\n`.
    pub text: String,
    /// Precomputed line offset index built from the normalized text.
    pub line_index: LineIndex,
}

impl SourceBuffer {
    /// Normalize `raw` and index it.
    pub fn new(name: impl Into<String>, raw: &str) -> Self {
        let text = normalize_line_endings(raw);
        let line_index = LineIndex::new(&text);
        Self {
            name: name.into(),
            text,
            line_index,
        }
    }

    /// Index `text` as given, without normalizing line endings.
    ///
    /// Used for buffers whose byte offsets were computed by another tool;
    /// [`line_text`](Self::line_text) still strips a trailing `\r`.
    pub fn verbatim(name: impl Into<String>, text: impl Into<String>) -> Self {
        let text = text.into();
        let line_index = LineIndex::new(&text);
        Self {
            name: name.into(),
            text,
            line_index,
        }
    }

    /// Number of lines in the buffer.
    pub fn line_count(&self) -> usize {
        self.line_index.line_count()
    }

    /// Text of a 1-indexed line without its terminator.
    ///
    /// Returns `None` when `line` is 0 or past the end of the buffer.
    pub fn line_text(&self, line: u32) -> Option<&str> {
        let idx = (line as usize).checked_sub(1)?;
        let start = self.line_index.line_start(idx)? as usize;
        let end = match self.line_index.line_start(idx + 1) {
            Some(next) => next as usize - 1,
            None => self.text.len(),
        };
        self.text
            .get(start..end)
            .map(|l| l.strip_suffix('\r').unwrap_or(l))
    }

    /// Byte offset of a 1-indexed position, clamped to the end of its line.
    pub fn offset_of(&self, pos: SourcePos) -> Option<u32> {
        let line = self.line_text(pos.line)?;
        let start = self.line_index.line_start(pos.line as usize - 1)?;
        let col = (pos.column.max(1) - 1).min(line.len() as u32);
        Some(start + col)
    }

    /// Byte span covered by a line/column range.
    pub fn span_of(&self, range: SourceRange) -> Option<Span> {
        let start = self.offset_of(range.begin)?;
        let end = match self.offset_of(range.end) {
            Some(end) => end,
            None if range.end.line as usize > self.line_count() => self.text.len() as u32,
            None => return None,
        };
        (start <= end).then(|| Span::new(start, end))
    }

    /// Text covered by a line/column range.
    pub fn slice(&self, range: SourceRange) -> Option<&str> {
        let span = self.span_of(range)?;
        self.text.get(span.to_range())
    }

    /// 1-indexed `(line, column)` of a byte offset.
    pub fn line_col(&self, offset: u32) -> (u32, u32) {
        let (line, col) = self.line_index.offset_to_line_col_0(offset);
        (line + 1, col + 1)
    }
}

/// Precomputed byte-offset index for each line in a source string.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LineIndex {
    /// `offsets[i]` is the byte offset where line `i` (0-indexed) begins.
    offsets: Vec<u32>,
}

impl LineIndex {
    /// Build a line index from (already-normalized) source text.
    pub fn new(text: &str) -> Self {
        let mut offsets = vec![0];
        for (i, byte) in text.as_bytes().iter().enumerate() {
            if *byte == b'\n' {
                offsets.push((i + 1) as u32);
            }
        }
        Self { offsets }
    }

    /// Number of lines in the source.
    pub fn line_count(&self) -> usize {
        self.offsets.len()
    }

    /// Byte offset where the given line (0-indexed) starts.
    pub fn line_start(&self, line: usize) -> Option<u32> {
        self.offsets.get(line).copied()
    }

    /// Convert a byte offset to a 0-indexed `(line, column)` pair.
    pub fn offset_to_line_col_0(&self, offset: u32) -> (u32, u32) {
        let line = match self.offsets.binary_search(&offset) {
            Ok(exact) => exact,
            Err(insert_point) => insert_point.saturating_sub(1),
        };
        let col = offset - self.offsets[line];
        (line as u32, col)
    }
}

/// Normalize line endings to Unix style (`\n`).
pub fn normalize_line_endings(text: &str) -> String {
    if !text.contains('\r') {
        return text.to_string();
    }
    text.replace("\r\n", "\n").replace('\r', "\n")
}
