//! Fix-it replacements and their application to a buffer.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::span::Span;

/// A replacement of the bytes covered by `span` with `replacement`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FixIt {
    pub span: Span,
    pub replacement: String,
}

impl FixIt {
    pub fn new(span: Span, replacement: impl Into<String>) -> Self {
        Self {
            span,
            replacement: replacement.into(),
        }
    }
}

/// Reasons a set of fix-its cannot be applied.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FixItError {
    /// The span ends past the end of the buffer or splits a UTF-8 sequence.
    OutOfBounds { span: Span, len: usize },
    /// Two fix-its touch the same bytes.
    Overlap { first: Span, second: Span },
}

impl fmt::Display for FixItError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FixItError::OutOfBounds { span, len } => write!(
                f,
                "fix-it {}..{} is outside the buffer of {} bytes",
                span.start, span.end, len
            ),
            FixItError::Overlap { first, second } => write!(
                f,
                "fix-its {}..{} and {}..{} overlap",
                first.start, first.end, second.start, second.end
            ),
        }
    }
}

impl std::error::Error for FixItError {}

/// Apply non-overlapping fix-its to `text`.
///
/// Fix-its are applied from the end of the buffer towards the start so that
/// earlier offsets stay valid. Identical duplicates are applied once.
pub fn apply_fixits(text: &str, fixits: &[FixIt]) -> Result<String, FixItError> {
    let mut sorted: Vec<&FixIt> = fixits.iter().collect();
    sorted.sort_by_key(|f| (f.span.start, f.span.end));
    sorted.dedup_by(|a, b| a == b);

    for fix in &sorted {
        let range = fix.span.to_range();
        if range.end > text.len()
            || range.start > range.end
            || !text.is_char_boundary(range.start)
            || !text.is_char_boundary(range.end)
        {
            return Err(FixItError::OutOfBounds {
                span: fix.span,
                len: text.len(),
            });
        }
    }
    for pair in sorted.windows(2) {
        if pair[0].span.overlaps(&pair[1].span) {
            return Err(FixItError::Overlap {
                first: pair[0].span,
                second: pair[1].span,
            });
        }
    }

    let mut out = text.to_string();
    for fix in sorted.iter().rev() {
        out.replace_range(fix.span.to_range(), &fix.replacement);
    }
    Ok(out)
}
