//! Diagnostic types reported by the refactoring rules.
//!
//! Every rule reports through [`Diagnostic`]: a severity, a stable code, a
//! human-readable message, an optional source location and any number of
//! fix-it replacements.

use std::fmt;

use serde::Serialize;

use crate::fixit::FixIt;
use crate::span::{Location, Span};

/// Diagnostic severity level.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    /// Error: the occurrence produced no artefacts.
    Error,
    /// Warning: normal rewrites and recoverable problems.
    Warning,
    /// Informational: not a problem, but worth noting.
    Info,
}

/// A diagnostic message from a rule.
///
/// # Example
///
/// ```
/// use proc_modernize_core::{Diagnostic, FixIt, Severity, Span};
///
/// let d = Diagnostic::warning("PROC-W100", "EXEC SQL FETCH replaced", Span::new(10, 42))
///     .with_fixit(FixIt::new(Span::new(10, 42), "fetchC();"));
///
/// assert_eq!(d.severity, Severity::Warning);
/// assert_eq!(d.fixits.len(), 1);
/// ```
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Diagnostic {
    /// Severity of the diagnostic.
    pub severity: Severity,
    /// Diagnostic code (e.g. "PROC-W001", "PROC-E010").
    pub code: String,
    /// Human-readable message describing the issue.
    pub message: String,
    /// Byte range in the main buffer the diagnostic points at.
    pub span: Span,
    /// Resolved location, when the emitter knows the file and line.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub location: Option<Location>,
    /// Optional suggestion for how to fix the issue.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub suggestion: Option<String>,
    /// Replacements attached to the diagnostic.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub fixits: Vec<FixIt>,
}

impl Diagnostic {
    fn with_severity(
        severity: Severity,
        code: impl Into<String>,
        message: impl Into<String>,
        span: Span,
    ) -> Self {
        Self {
            severity,
            code: code.into(),
            message: message.into(),
            span,
            location: None,
            suggestion: None,
            fixits: Vec::new(),
        }
    }

    /// Create a new error diagnostic.
    pub fn error(code: impl Into<String>, message: impl Into<String>, span: Span) -> Self {
        Self::with_severity(Severity::Error, code, message, span)
    }

    /// Create a new warning diagnostic.
    pub fn warning(code: impl Into<String>, message: impl Into<String>, span: Span) -> Self {
        Self::with_severity(Severity::Warning, code, message, span)
    }

    /// Create a new info diagnostic.
    pub fn info(code: impl Into<String>, message: impl Into<String>, span: Span) -> Self {
        Self::with_severity(Severity::Info, code, message, span)
    }

    /// Add a suggestion to this diagnostic.
    pub fn with_suggestion(mut self, suggestion: impl Into<String>) -> Self {
        self.suggestion = Some(suggestion.into());
        self
    }

    /// Attach a resolved location.
    pub fn with_location(mut self, location: Location) -> Self {
        self.location = Some(location);
        self
    }

    /// Attach a fix-it replacement.
    pub fn with_fixit(mut self, fixit: FixIt) -> Self {
        self.fixits.push(fixit);
        self
    }

    /// Returns `true` if this diagnostic is an error.
    pub fn is_error(&self) -> bool {
        self.severity == Severity::Error
    }

    /// Returns `true` if this diagnostic is a warning.
    pub fn is_warning(&self) -> bool {
        self.severity == Severity::Warning
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Severity::Error => write!(f, "error"),
            Severity::Warning => write!(f, "warning"),
            Severity::Info => write!(f, "info"),
        }
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(ref loc) = self.location {
            write!(f, "{}:{}:{}: ", loc.file_name, loc.line, loc.column)?;
        }
        write!(f, "{}[{}]: {}", self.severity, self.code, self.message)?;
        if let Some(ref suggestion) = self.suggestion {
            write!(f, " ({})", suggestion)?;
        }
        Ok(())
    }
}
