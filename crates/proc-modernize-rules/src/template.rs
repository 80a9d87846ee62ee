//! # Template engine
//!
//! Line-oriented `@NAME@` substitution. The only structural construct is
//! a repeat block:
//!
//! ```text
//! @repeat on ANON { NAME, FIELDS }
//! typedef struct {
//! @ANON#FIELDS@
//! } @ANON#NAME@;
//! @
//! ```
//!
//! The block is rendered once per anonymous-struct variant. Every rendered
//! line is followed by `\n`.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::LazyLock;

use regex::Regex;

/// Upper bound on substitution passes over one line.
const MAX_PASSES: usize = 8;

/// Template engine errors.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error, miette::Diagnostic)]
pub enum TemplateError {
    #[error("template {path} is missing or unreadable: {message}")]
    Missing { path: PathBuf, message: String },

    #[error("@repeat block opened at template line {line} is never closed")]
    UnterminatedRepeat { line: usize },
}

/// Placeholder values keyed by `@NAME@` token.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Substitutions {
    values: BTreeMap<String, String>,
}

impl Substitutions {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set `@name@`.
    pub fn set(&mut self, name: &str, value: impl Into<String>) -> &mut Self {
        self.values.insert(format!("@{name}@"), value.into());
        self
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.values.get(&format!("@{name}@")).map(String::as_str)
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Replace placeholders in `line` until nothing changes.
    pub fn apply(&self, line: &str) -> String {
        let mut current = line.to_string();
        for _ in 0..MAX_PASSES {
            if !current.contains('@') {
                break;
            }
            let mut next = current.clone();
            for (token, value) in &self.values {
                if next.contains(token.as_str()) {
                    next = next.replace(token.as_str(), value);
                }
            }
            if next == current {
                break;
            }
            current = next;
        }
        current
    }
}

/// Anonymous-struct variants: variant key, then member name to expansion.
pub type Variants = BTreeMap<String, BTreeMap<String, String>>;

static REPEAT_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"@repeat\s+on\s+(\w+)\s*\{([^}]*)\}").expect("repeat pattern")
});

/// Render a template text.
pub fn render(
    template: &str,
    subs: &Substitutions,
    variants: &Variants,
) -> Result<String, TemplateError> {
    let mut out = String::new();
    let mut lines = template.lines().enumerate();
    while let Some((idx, line)) = lines.next() {
        let Some(caps) = REPEAT_RE.captures(line) else {
            out.push_str(&subs.apply(line));
            out.push('\n');
            continue;
        };
        let base = caps.get(1).map_or("", |m| m.as_str());
        let members: Vec<&str> = caps
            .get(2)
            .map_or("", |m| m.as_str())
            .split(',')
            .map(str::trim)
            .filter(|m| !m.is_empty())
            .collect();

        let mut block = Vec::new();
        let mut closed = false;
        for (_, body_line) in lines.by_ref() {
            if body_line.trim() == "@" {
                closed = true;
                break;
            }
            block.push(body_line);
        }
        if !closed {
            return Err(TemplateError::UnterminatedRepeat { line: idx + 1 });
        }

        for variant in variants.values() {
            for body_line in &block {
                let mut rendered = body_line.to_string();
                for member in &members {
                    let token = format!("@{base}#{member}@");
                    let value = variant.get(*member).map(String::as_str).unwrap_or("");
                    rendered = rendered.replace(&token, value);
                }
                out.push_str(&subs.apply(&rendered));
                out.push('\n');
            }
        }
    }
    Ok(out)
}

/// Read and render a template file.
pub fn render_file(
    path: &Path,
    subs: &Substitutions,
    variants: &Variants,
) -> Result<String, TemplateError> {
    let text = std::fs::read_to_string(path).map_err(|e| TemplateError::Missing {
        path: path.to_path_buf(),
        message: e.to_string(),
    })?;
    render(&text, subs, variants)
}
