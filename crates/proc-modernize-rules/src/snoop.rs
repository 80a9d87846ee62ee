//! # Pre-processor snoop
//!
//! By the time the AST is matched, string-literal macros are expanded and
//! the original spelling is gone. The snoop watches the macro-expansion
//! stream in parallel and remembers every main-file macro whose body holds
//! a string or numeric literal, so the generator can reproduce the literal
//! (and its continuation-line indentation) or reference the macro by name.

use std::cmp::Ordering;
use std::collections::BTreeSet;

use proc_modernize_core::{Diagnostic, SourceBuffer, SourceRange, Span};
use tracing::debug;

use crate::codes;
use crate::host::{MacroExpansion, TokenKind};

/// Kind of literal a recorded macro stands for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LiteralKind {
    String,
    Numeric,
}

/// A macro whose definition holds a literal.
///
/// Records are ordered and compared by definition range only, so one
/// definition is recorded once whatever the number of expansions.
#[derive(Debug, Clone)]
pub struct MacroLiteral {
    pub name: String,
    pub usage: SourceRange,
    pub definition: SourceRange,
    /// From the first literal token to the last one.
    pub literal: SourceRange,
    pub kind: LiteralKind,
}

impl PartialEq for MacroLiteral {
    fn eq(&self, other: &Self) -> bool {
        self.definition == other.definition
    }
}

impl Eq for MacroLiteral {}

impl PartialOrd for MacroLiteral {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for MacroLiteral {
    fn cmp(&self, other: &Self) -> Ordering {
        self.definition.cmp(&other.definition)
    }
}

/// Original text recovered for a recorded macro.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MacroLiteralText {
    pub name: String,
    /// The literal token(s) exactly as written, continuation lines included.
    pub literal: String,
    /// The whole `#define` directive.
    pub define: String,
    pub kind: LiteralKind,
}

/// Ordered set of macro-literal records for one translation unit.
#[derive(Debug, Default)]
pub struct PreprocessorSnoop {
    records: BTreeSet<MacroLiteral>,
}

impl PreprocessorSnoop {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn clear(&mut self) {
        self.records.clear();
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn records(&self) -> impl Iterator<Item = &MacroLiteral> {
        self.records.iter()
    }

    /// Observe one macro expansion.
    ///
    /// Returns an error diagnostic when the definition uses a wide, UTF or
    /// angle string literal; nothing is recorded in that case.
    pub fn on_macro_expanded(
        &mut self,
        expansion: &MacroExpansion,
        buf: &SourceBuffer,
    ) -> Option<Diagnostic> {
        if !expansion.in_main_file {
            return None;
        }
        if let Some(token) = expansion.tokens.iter().find(|t| t.kind.is_unsupported_string()) {
            let span = buf.span_of(token.range).unwrap_or_else(Span::dummy);
            return Some(Diagnostic::error(
                codes::UNSUPPORTED_CHARSET,
                format!(
                    "unsupported charset for string literal {} in macro '{}'",
                    token.text, expansion.name
                ),
                span,
            ));
        }

        let strings: Vec<_> = expansion
            .tokens
            .iter()
            .filter(|t| t.kind == TokenKind::StringLiteral)
            .collect();
        let (literal, kind) = if let (Some(first), Some(last)) = (strings.first(), strings.last()) {
            (
                SourceRange::new(first.range.begin, last.range.end),
                LiteralKind::String,
            )
        } else if let Some(num) = expansion
            .tokens
            .iter()
            .find(|t| t.kind == TokenKind::NumericConstant)
        {
            (num.range, LiteralKind::Numeric)
        } else {
            return None;
        };

        let inserted = self.records.insert(MacroLiteral {
            name: expansion.name.clone(),
            usage: expansion.usage,
            definition: expansion.definition,
            literal,
            kind,
        });
        if inserted {
            debug!(name = %expansion.name, line = expansion.definition.begin.line, "recorded macro literal");
        }
        None
    }

    /// First record whose definition begins on `line` or `line - 1`.
    pub fn find_def_at_line(&self, line: u32) -> Option<&MacroLiteral> {
        self.records.iter().find(|r| {
            let begin = r.definition.begin.line;
            begin == line || begin + 1 == line
        })
    }

    /// First record with a usage on `line` or `line - 1`.
    pub fn find_usage_at_line(&self, line: u32) -> Option<&MacroLiteral> {
        self.records.iter().find(|r| {
            let begin = r.usage.begin.line;
            begin == line || begin + 1 == line
        })
    }

    pub fn find_by_name(&self, name: &str) -> Option<&MacroLiteral> {
        self.records.iter().find(|r| r.name == name)
    }

    /// Slice the literal and the directive out of the main buffer.
    pub fn text_of(&self, record: &MacroLiteral, buf: &SourceBuffer) -> Option<MacroLiteralText> {
        Some(MacroLiteralText {
            name: record.name.clone(),
            literal: buf.slice(record.literal)?.to_string(),
            define: buf.slice(record.definition)?.trim_end().to_string(),
            kind: record.kind,
        })
    }
}
