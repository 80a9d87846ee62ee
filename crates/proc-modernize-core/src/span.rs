//! Source location tracking for diagnostics and fix-its.
//!
//! A [`Span`] is a byte range into the main (pre-processed) buffer. Facts
//! coming from the host pre-processor are expressed as [`SourceRange`]s of
//! 1-indexed line/column pairs and are converted through a
//! [`LineIndex`](crate::LineIndex) when a byte range is needed.

use std::ops::Range;

use serde::{Deserialize, Serialize};

/// A contiguous byte range in the main source buffer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct Span {
    /// Byte offset of the start of this span (0-indexed).
    pub start: u32,
    /// Byte offset of the end of this span (exclusive).
    pub end: u32,
}

impl Span {
    /// Create a new span.
    pub fn new(start: u32, end: u32) -> Self {
        Self { start, end }
    }

    /// Create an empty span at a position.
    pub fn point(pos: u32) -> Self {
        Self::new(pos, pos)
    }

    /// Create a dummy span for synthesized nodes.
    pub fn dummy() -> Self {
        Self::default()
    }

    /// Get the length of this span in bytes.
    pub fn len(&self) -> usize {
        (self.end - self.start) as usize
    }

    /// Check if this span is empty.
    pub fn is_empty(&self) -> bool {
        self.start == self.end
    }

    /// Extend this span to include another span.
    pub fn extend(self, other: Span) -> Self {
        Self {
            start: self.start.min(other.start),
            end: self.end.max(other.end),
        }
    }

    /// Whether two spans share at least one byte.
    pub fn overlaps(&self, other: &Span) -> bool {
        self.start < other.end && other.start < self.end
    }

    /// Convert to a byte range.
    pub fn to_range(&self) -> Range<usize> {
        (self.start as usize)..(self.end as usize)
    }
}

/// A 1-indexed line/column position.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
pub struct SourcePos {
    pub line: u32,
    pub column: u32,
}

impl SourcePos {
    pub fn new(line: u32, column: u32) -> Self {
        Self { line, column }
    }
}

/// An inclusive-begin, exclusive-end range of [`SourcePos`].
///
/// Ordering is by `begin`, then by `end`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
pub struct SourceRange {
    pub begin: SourcePos,
    pub end: SourcePos,
}

impl SourceRange {
    pub fn new(begin: SourcePos, end: SourcePos) -> Self {
        Self { begin, end }
    }

    /// Range covering whole lines `first..=last`, column 1 to column 1 of the next line.
    pub fn lines(first: u32, last: u32) -> Self {
        Self::new(SourcePos::new(first, 1), SourcePos::new(last + 1, 1))
    }
}

/// Resolved location information for display purposes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Location {
    /// Line number (1-indexed).
    pub line: u32,
    /// Column number (1-indexed).
    pub column: u32,
    /// The file name or path.
    pub file_name: String,
}

impl Location {
    /// Create a new location.
    pub fn new(file_name: impl Into<String>, line: u32, column: u32) -> Self {
        Self {
            file_name: file_name.into(),
            line,
            column,
        }
    }
}
