//! Structured output types for machine-readable CLI responses.
//!
//! When `--format json` is specified, commands emit these types as JSON
//! instead of human-readable text.

use proc_modernize_core::{Diagnostic, Severity};
use serde::Serialize;

/// Output format selection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, clap::ValueEnum)]
pub enum OutputFormat {
    #[default]
    Text,
    Json,
}

impl OutputFormat {
    pub fn is_json(self) -> bool {
        self == OutputFormat::Json
    }
}

/// A single diagnostic message.
#[derive(Debug, Clone, Serialize)]
pub struct DiagnosticEntry {
    pub severity: Severity,
    pub code: String,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub file: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub line: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub col: Option<u32>,
    /// Replacement text of the first fix-it.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fix: Option<String>,
}

impl From<&Diagnostic> for DiagnosticEntry {
    fn from(diag: &Diagnostic) -> Self {
        Self {
            severity: diag.severity,
            code: diag.code.clone(),
            message: diag.message.clone(),
            file: diag.location.as_ref().map(|l| l.file_name.clone()),
            line: diag.location.as_ref().map(|l| l.line),
            col: diag.location.as_ref().map(|l| l.column),
            fix: diag.fixits.first().map(|f| f.replacement.clone()),
        }
    }
}

/// Summary of diagnostic counts.
#[derive(Debug, Clone, Default, Serialize)]
pub struct DiagnosticSummary {
    pub errors: usize,
    pub warnings: usize,
    pub infos: usize,
    /// Blocks that received a rewrite fix-it.
    pub rewrites: usize,
}

impl DiagnosticSummary {
    pub fn of(diags: &[Diagnostic]) -> Self {
        let count = |s: Severity| diags.iter().filter(|d| d.severity == s).count();
        Self {
            errors: count(Severity::Error),
            warnings: count(Severity::Warning),
            infos: count(Severity::Info),
            rewrites: diags.iter().filter(|d| !d.fixits.is_empty()).count(),
        }
    }
}

/// Output from the run command.
#[derive(Debug, Clone, Serialize)]
pub struct RunOutput {
    pub status: String,
    pub unit: String,
    pub diagnostics: Vec<DiagnosticEntry>,
    pub summary: DiagnosticSummary,
    /// Whether the fix-its were written back to the unit's main file.
    pub fixed: bool,
}

/// A rule as listed by the rules command.
#[derive(Debug, Clone, Serialize)]
pub struct RuleEntry {
    pub name: String,
    pub verb: String,
    pub enabled: bool,
}

/// Output from the rules command.
#[derive(Debug, Clone, Serialize)]
pub struct RulesOutput {
    pub rules: Vec<RuleEntry>,
}

/// Print a serializable value as JSON to stdout.
pub fn print_json<T: Serialize>(value: &T) {
    match serde_json::to_string_pretty(value) {
        Ok(json) => println!("{}", json),
        Err(e) => eprintln!("Failed to serialize JSON: {}", e),
    }
}
