//! # Comment locator
//!
//! Recovers the `/* EXEC SQL ... */` comment the Pro*C pre-processor emits
//! next to each generated block, together with the `#line N "file.pc"`
//! directives found on the way. Those directives give the inclusive line
//! range of the original statement in the pre-processor input.

use std::sync::LazyLock;

use proc_modernize_core::SourceBuffer;
use regex::Regex;
use tracing::trace;

// ─────────────────────── Errors ───────────────────────

/// Comment locator errors.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error, miette::Diagnostic)]
pub enum LocatorError {
    /// A line inside the buffer could not be read.
    #[error("cannot access character data at line {line}")]
    BufferAccess { line: u32 },

    /// The walk reached the top of the buffer without seeing `/*`.
    #[error("no /* comment found at or above line {line}")]
    NoComment { line: u32 },

    /// A `/*` was found but never closed.
    #[error("comment opened at line {line} is not terminated")]
    Unterminated { line: u32 },
}

// ─────────────────────── Types ───────────────────────

/// Which side of the generated block the comment is searched on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommentDirection {
    /// Walk up from two lines above the block.
    Upstream,
    /// Walk up from two lines below the block start.
    Downstream,
}

/// Original-file line range recovered from `#line` directives.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PcLineRange {
    pub file: String,
    pub start: u32,
    pub end: u32,
}

/// A recovered statement comment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LocatedComment {
    /// `/* ... */` with embedded newlines turned into spaces.
    pub text: String,
    /// Whether the comment spanned several lines.
    pub had_cr: bool,
    /// Line holding the `/*`.
    pub line: u32,
    pub pc_lines: Option<PcLineRange>,
}

static LINE_DIRECTIVE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"^#line ([0-9]+) "(.*)"$"#).expect("#line pattern"));

/// Parse a `#line N "path"` directive.
pub fn parse_line_directive(line: &str) -> Option<(u32, String)> {
    let caps = LINE_DIRECTIVE_RE.captures(line.trim_end())?;
    let number = caps.get(1)?.as_str().parse().ok()?;
    Some((number, caps.get(2)?.as_str().to_string()))
}

/// Find the statement comment for a block starting on `block_line`.
pub fn locate_comment(
    buf: &SourceBuffer,
    block_line: u32,
    direction: CommentDirection,
) -> Result<LocatedComment, LocatorError> {
    let last_line = buf.line_count() as u32;
    let start = match direction {
        CommentDirection::Upstream => block_line.saturating_sub(2),
        CommentDirection::Downstream => (block_line + 2).min(last_line),
    };

    let mut directives: Vec<(u32, String)> = Vec::new();
    let mut found = None;
    for line in (1..=start).rev() {
        let text = buf
            .line_text(line)
            .ok_or(LocatorError::BufferAccess { line })?;
        if let Some(directive) = parse_line_directive(text) {
            trace!(line, pc_line = directive.0, "captured #line directive");
            directives.push(directive);
            continue;
        }
        if let Some(col) = text.find("/*") {
            found = Some((line, col));
            break;
        }
    }
    let (line, col) = found.ok_or(LocatorError::NoComment { line: start })?;

    let line_start = buf
        .line_index
        .line_start(line as usize - 1)
        .ok_or(LocatorError::BufferAccess { line })? as usize;
    let open = line_start + col;
    let rest = buf
        .text
        .get(open..)
        .ok_or(LocatorError::BufferAccess { line })?;
    let close = rest
        .find("*/")
        .ok_or(LocatorError::Unterminated { line })?;
    let raw = &rest[..close + 2];

    let had_cr = raw.contains('\n');
    let text = raw
        .split('\n')
        .map(|l| l.strip_suffix('\r').unwrap_or(l))
        .collect::<Vec<_>>()
        .join(" ");

    let pc_lines = directives.first().map(|(_, file)| PcLineRange {
        file: file.clone(),
        start: directives.iter().map(|(n, _)| *n).min().unwrap_or_default(),
        end: directives.iter().map(|(n, _)| *n).max().unwrap_or_default(),
    });

    Ok(LocatedComment {
        text,
        had_cr,
        line,
        pc_lines,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    const PROC_OUTPUT: &str = "\
int main() {
    /* EXEC SQL
          FETCH c INTO :a; */
#line 2 \"emp.pc\"
#line 3 \"emp.pc\"

{
#line 3 \"emp.pc\"
    struct sqlexd sqlstm;
}
}
";

    #[test]
    fn test_parse_line_directive() {
        assert_eq!(
            parse_line_directive("#line 42 \"src/emp.pc\""),
            Some((42, "src/emp.pc".to_string()))
        );
        assert_eq!(parse_line_directive("# line 42 \"x\""), None);
        assert_eq!(parse_line_directive("  #line 42 \"x\""), None);
    }

    #[test]
    fn test_upstream_multiline_comment() {
        let buf = SourceBuffer::new("emp.c", PROC_OUTPUT);
        let found = locate_comment(&buf, 7, CommentDirection::Upstream).unwrap();
        assert_eq!(found.line, 2);
        assert!(found.had_cr);
        assert_eq!(found.text, "/* EXEC SQL           FETCH c INTO :a; */");
        assert_eq!(
            found.pc_lines,
            Some(PcLineRange {
                file: "emp.pc".into(),
                start: 2,
                end: 3
            })
        );
    }

    #[test]
    fn test_single_line_comment_without_directives() {
        let src = "/* EXEC SQL CLOSE c; */\n\n\n{\n  struct sqlexd sqlstm;\n}\n";
        let buf = SourceBuffer::new("emp.c", src);
        let found = locate_comment(&buf, 4, CommentDirection::Upstream).unwrap();
        assert_eq!(found.text, "/* EXEC SQL CLOSE c; */");
        assert!(!found.had_cr);
        assert_eq!(found.pc_lines, None);
    }

    #[test]
    fn test_downstream_finds_comment_after_block_start() {
        let src = "int x;\n{\n  /* EXEC SQL DECLARE c CURSOR FOR s; */\n  struct sqlexd sqlstm;\n}\n";
        let buf = SourceBuffer::new("emp.c", src);
        let found = locate_comment(&buf, 2, CommentDirection::Downstream).unwrap();
        assert_eq!(found.line, 3);
        assert_eq!(found.text, "/* EXEC SQL DECLARE c CURSOR FOR s; */");
    }

    #[test]
    fn test_no_comment() {
        let buf = SourceBuffer::new("emp.c", "int a;\nint b;\nint c;\n{\n}\n");
        assert_eq!(
            locate_comment(&buf, 4, CommentDirection::Upstream),
            Err(LocatorError::NoComment { line: 2 })
        );
    }

    #[test]
    fn test_unterminated_comment() {
        let buf = SourceBuffer::new("emp.c", "/* EXEC SQL OPEN c;\nint b;\nint c;\n{\n}\n");
        assert_eq!(
            locate_comment(&buf, 4, CommentDirection::Upstream),
            Err(LocatorError::Unterminated { line: 1 })
        );
    }
}
