//! # EXEC SQL statement parser
//!
//! The comment the Pro*C pre-processor leaves in front of each generated
//! block is the only surviving trace of the source statement. One regular
//! expression per verb classifies it and captures the verb-specific fields.
//! Patterns are case-insensitive, accept any interior whitespace (newlines
//! included), start at the `EXEC SQL` keywords and require the terminating
//! `;`. They are tried in a fixed priority order; the first match wins.

use std::fmt;
use std::sync::LazyLock;

use regex::{Captures, Regex};

use crate::locator::CommentDirection;

// ─────────────────────── Errors ───────────────────────

/// Statement parser errors.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error, miette::Diagnostic)]
pub enum StatementError {
    /// The comment matched none of the verb patterns.
    #[error("comment does not hold a supported EXEC SQL statement: {comment}")]
    Unrecognized { comment: String },
}

// ─────────────────────── Kinds ───────────────────────

/// Supported EXEC SQL verbs, in matching priority order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum StatementKind {
    Allocate,
    Free,
    DeclareCursor,
    Open,
    Close,
    Fetch,
    Prepare,
    LobCreateTemporary,
    LobFreeTemporary,
    LobOpen,
    LobClose,
    LobRead,
}

impl StatementKind {
    pub const ALL: [StatementKind; 12] = [
        StatementKind::Allocate,
        StatementKind::Free,
        StatementKind::DeclareCursor,
        StatementKind::Open,
        StatementKind::Close,
        StatementKind::Fetch,
        StatementKind::Prepare,
        StatementKind::LobCreateTemporary,
        StatementKind::LobFreeTemporary,
        StatementKind::LobOpen,
        StatementKind::LobClose,
        StatementKind::LobRead,
    ];

    /// Name under which the rule handling this verb is registered.
    pub fn rule_name(self) -> &'static str {
        match self {
            StatementKind::Allocate => "proc-exec-sql-allocate",
            StatementKind::Free => "proc-exec-sql-free",
            StatementKind::DeclareCursor => "proc-exec-sql-declare-cursor",
            StatementKind::Open => "proc-exec-sql-open",
            StatementKind::Close => "proc-exec-sql-close",
            StatementKind::Fetch => "proc-exec-sql-fetch",
            StatementKind::Prepare => "proc-exec-sql-prepare",
            StatementKind::LobCreateTemporary => "proc-exec-sql-lob-create-temporary",
            StatementKind::LobFreeTemporary => "proc-exec-sql-lob-free-temporary",
            StatementKind::LobOpen => "proc-exec-sql-lob-open",
            StatementKind::LobClose => "proc-exec-sql-lob-close",
            StatementKind::LobRead => "proc-exec-sql-lob-read",
        }
    }

    /// Lower-camel prefix of the generated function name.
    pub fn function_prefix(self) -> &'static str {
        match self {
            StatementKind::Allocate => "allocate",
            StatementKind::Free => "free",
            StatementKind::DeclareCursor => "declare",
            StatementKind::Open => "open",
            StatementKind::Close => "close",
            StatementKind::Fetch => "fetch",
            StatementKind::Prepare => "prepare",
            StatementKind::LobCreateTemporary => "lobCreateTemporary",
            StatementKind::LobFreeTemporary => "lobFreeTemporary",
            StatementKind::LobOpen => "lobOpen",
            StatementKind::LobClose => "lobClose",
            StatementKind::LobRead => "lobRead",
        }
    }

    /// Where the pre-processor puts the statement comment relative to the
    /// generated block.
    pub fn comment_direction(self) -> CommentDirection {
        match self {
            StatementKind::DeclareCursor => CommentDirection::Downstream,
            _ => CommentDirection::Upstream,
        }
    }

    /// Verbs whose generated function takes run-time arguments.
    pub fn takes_arguments(self) -> bool {
        !matches!(
            self,
            StatementKind::Allocate
                | StatementKind::Free
                | StatementKind::DeclareCursor
                | StatementKind::Close
        )
    }
}

impl fmt::Display for StatementKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let verb = match self {
            StatementKind::Allocate => "ALLOCATE",
            StatementKind::Free => "FREE",
            StatementKind::DeclareCursor => "DECLARE CURSOR",
            StatementKind::Open => "OPEN",
            StatementKind::Close => "CLOSE",
            StatementKind::Fetch => "FETCH",
            StatementKind::Prepare => "PREPARE",
            StatementKind::LobCreateTemporary => "LOB CREATE TEMPORARY",
            StatementKind::LobFreeTemporary => "LOB FREE TEMPORARY",
            StatementKind::LobOpen => "LOB OPEN",
            StatementKind::LobClose => "LOB CLOSE",
            StatementKind::LobRead => "LOB READ",
        };
        f.write_str(verb)
    }
}

/// Access mode of `LOB OPEN`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LobOpenMode {
    ReadOnly,
    ReadWrite,
}

// ─────────────────────── Parsed Statement ───────────────────────

/// Verb-specific fields captured from the comment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Clauses {
    /// `ALLOCATE :var` / `FREE :var`
    CursorVariable { var: String },
    /// `DECLARE cursor CURSOR FOR statement`
    DeclareCursor { cursor: String, statement: String },
    /// `OPEN cursor [USING hostvars]`
    Open { cursor: String, using: Option<String> },
    /// `CLOSE cursor`
    Close { cursor: String },
    /// `FETCH cursor [INTO hostvars]`
    Fetch { cursor: String, into: Option<String> },
    /// `PREPARE statement FROM :hostvar`
    Prepare { statement: String, from: String },
    /// `LOB CREATE TEMPORARY :loc`, `LOB FREE TEMPORARY :loc`, `LOB CLOSE :loc`
    Locator { locator: String },
    /// `LOB OPEN :loc [READ ONLY | READ WRITE]`
    LobOpen {
        locator: String,
        mode: Option<LobOpenMode>,
    },
    /// `LOB READ :amount FROM :src [AT :offset] INTO :dst [WITH LENGTH :len]`
    LobRead {
        amount: String,
        source: String,
        offset: Option<String>,
        target: String,
        length: Option<String>,
    },
}

/// A classified EXEC SQL statement.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExecSqlStatement {
    pub kind: StatementKind,
    /// The verb token exactly as written (`ALLOCATE`, `fetch`, `LOB READ`).
    pub verb: String,
    /// Statement text between `EXEC SQL` and `;`, whitespace collapsed.
    pub body: String,
    pub clauses: Clauses,
}

impl ExecSqlStatement {
    /// `EXEC SQL <body>;`
    pub fn statement(&self) -> String {
        format!("EXEC SQL {};", self.body)
    }

    /// Name of the request: cursor, prepared statement, or leading locator.
    pub fn request_name(&self) -> String {
        let raw = match &self.clauses {
            Clauses::CursorVariable { var } => var.as_str(),
            Clauses::DeclareCursor { cursor, .. } => cursor,
            Clauses::Open { cursor, .. } => cursor,
            Clauses::Close { cursor } => cursor,
            Clauses::Fetch { cursor, .. } => cursor,
            Clauses::Prepare { statement, .. } => statement,
            Clauses::Locator { locator } => locator,
            Clauses::LobOpen { locator, .. } => locator,
            Clauses::LobRead { source, .. } => source,
        };
        simple_name(raw)
    }

    /// Lower-cased verb followed by each capitalized name.
    ///
    /// `ALLOCATE :emp_cv` gives `allocateEmp_cv`, `LOB READ ... FROM :src
    /// INTO :dst` gives `lobReadSrcDst`.
    pub fn function_name(&self) -> String {
        let mut name = self.kind.function_prefix().to_string();
        match &self.clauses {
            Clauses::LobRead { source, target, .. } => {
                name.push_str(&capitalize(&simple_name(source)));
                name.push_str(&capitalize(&simple_name(target)));
            }
            _ => name.push_str(&capitalize(&self.request_name())),
        }
        name
    }

    /// Host-variable lists carried by the statement, in textual order.
    pub fn host_var_lists(&self) -> Vec<&str> {
        match &self.clauses {
            Clauses::Open { using, .. } => using.iter().map(String::as_str).collect(),
            Clauses::Fetch { into, .. } => into.iter().map(String::as_str).collect(),
            Clauses::Prepare { from, .. } => vec![from.as_str()],
            Clauses::Locator { locator } | Clauses::LobOpen { locator, .. } => {
                vec![locator.as_str()]
            }
            Clauses::LobRead {
                amount,
                source,
                offset,
                target,
                length,
            } => {
                let mut lists = vec![amount.as_str(), source.as_str()];
                lists.extend(offset.as_deref());
                lists.push(target.as_str());
                lists.extend(length.as_deref().filter(|l| l.trim_start().starts_with(':')));
                lists
            }
            Clauses::CursorVariable { .. }
            | Clauses::DeclareCursor { .. }
            | Clauses::Close { .. } => Vec::new(),
        }
    }
}

/// Strip the host-variable colon and any dereference path: `:rec->loc` gives `loc`.
fn simple_name(raw: &str) -> String {
    let trimmed = raw.trim().trim_start_matches(':').trim();
    let leaf = trimmed
        .rsplit(|c: char| c == '.' || c == '>')
        .next()
        .unwrap_or(trimmed);
    leaf.trim().to_string()
}

/// Upper-case the first character only.
pub fn capitalize(s: &str) -> String {
    let mut chars = s.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

/// Collapse whitespace runs to one space and drop space before `;` and `,`.
pub fn normalize_whitespace(s: &str) -> String {
    s.split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .replace(" ,", ",")
        .replace(" ;", ";")
}

// ─────────────────────── Patterns ───────────────────────

const HOST_EXPR: &str = r":\s*\w+(?:\s*(?:->|\.)\s*\w+)*";

static ALLOCATE_FREE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(&format!(
        r"(?is)\bEXEC\s+SQL\s+(ALLOCATE|FREE)\s+({HOST_EXPR})\s*;"
    ))
    .expect("allocate/free pattern")
});

static DECLARE_CURSOR_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?is)\bEXEC\s+SQL\s+(DECLARE)\s+(\w+)\s+CURSOR\s+FOR\s+(\w+)\s*;")
        .expect("declare cursor pattern")
});

static OPEN_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(&format!(
        r"(?is)\bEXEC\s+SQL\s+(OPEN)\s+({HOST_EXPR}|\w+)(?:\s+USING\s+([^;]+?))?\s*;"
    ))
    .expect("open pattern")
});

static CLOSE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(&format!(
        r"(?is)\bEXEC\s+SQL\s+(CLOSE)\s+({HOST_EXPR}|\w+)\s*;"
    ))
    .expect("close pattern")
});

static FETCH_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(&format!(
        r"(?is)\bEXEC\s+SQL\s+(FETCH)\s+(?:(?:NEXT|PRIOR|FIRST|LAST|CURRENT)\s+FROM\s+)?({HOST_EXPR}|\w+)(?:\s+INTO\s+([^;]+?))?\s*;"
    ))
    .expect("fetch pattern")
});

static PREPARE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(&format!(
        r"(?is)\bEXEC\s+SQL\s+(PREPARE)\s+(\w+)\s+FROM\s+({HOST_EXPR})\s*;"
    ))
    .expect("prepare pattern")
});

static LOB_CREATE_TEMPORARY_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(&format!(
        r"(?is)\bEXEC\s+SQL\s+(LOB\s+CREATE\s+TEMPORARY)\s+({HOST_EXPR})\s*;"
    ))
    .expect("lob create temporary pattern")
});

static LOB_FREE_TEMPORARY_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(&format!(
        r"(?is)\bEXEC\s+SQL\s+(LOB\s+FREE\s+TEMPORARY)\s+({HOST_EXPR})\s*;"
    ))
    .expect("lob free temporary pattern")
});

static LOB_OPEN_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(&format!(
        r"(?is)\bEXEC\s+SQL\s+(LOB\s+OPEN)\s+({HOST_EXPR})(?:\s+READ\s+(ONLY|WRITE))?\s*;"
    ))
    .expect("lob open pattern")
});

static LOB_CLOSE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(&format!(
        r"(?is)\bEXEC\s+SQL\s+(LOB\s+CLOSE)\s+({HOST_EXPR})\s*;"
    ))
    .expect("lob close pattern")
});

static LOB_READ_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(&format!(
        r"(?is)\bEXEC\s+SQL\s+(LOB\s+READ)\s+({HOST_EXPR})\s+FROM\s+({HOST_EXPR})(?:\s+AT\s+({HOST_EXPR}))?\s+INTO\s+({HOST_EXPR}(?:\s*(?:INDICATOR\s*)?{HOST_EXPR})?)(?:\s+WITH\s+LENGTH\s+({HOST_EXPR}|\w+))?\s*;"
    ))
    .expect("lob read pattern")
});

fn group(caps: &Captures<'_>, i: usize) -> String {
    caps.get(i)
        .map(|m| normalize_whitespace(m.as_str()))
        .unwrap_or_default()
}

fn opt_group(caps: &Captures<'_>, i: usize) -> Option<String> {
    caps.get(i).map(|m| normalize_whitespace(m.as_str()))
}

fn body_of(caps: &Captures<'_>) -> String {
    let whole = caps.get(0).map(|m| m.as_str()).unwrap_or_default();
    let normalized = normalize_whitespace(whole);
    normalized
        .splitn(3, ' ')
        .nth(2)
        .unwrap_or_default()
        .trim_end_matches(';')
        .trim_end()
        .to_string()
}

/// Classify a statement comment.
///
/// The comment may still carry its `/*` and `*/` delimiters.
pub fn parse_statement(comment: &str) -> Result<ExecSqlStatement, StatementError> {
    type Builder = fn(&Captures<'_>) -> (StatementKind, Clauses);
    let table: [(&LazyLock<Regex>, Builder); 11] = [
        (&ALLOCATE_FREE_RE, |c| {
            let kind = if group(c, 1).eq_ignore_ascii_case("allocate") {
                StatementKind::Allocate
            } else {
                StatementKind::Free
            };
            (kind, Clauses::CursorVariable { var: group(c, 2) })
        }),
        (&DECLARE_CURSOR_RE, |c| {
            (
                StatementKind::DeclareCursor,
                Clauses::DeclareCursor {
                    cursor: group(c, 2),
                    statement: group(c, 3),
                },
            )
        }),
        (&OPEN_RE, |c| {
            (
                StatementKind::Open,
                Clauses::Open {
                    cursor: group(c, 2),
                    using: opt_group(c, 3),
                },
            )
        }),
        (&CLOSE_RE, |c| {
            (StatementKind::Close, Clauses::Close { cursor: group(c, 2) })
        }),
        (&FETCH_RE, |c| {
            (
                StatementKind::Fetch,
                Clauses::Fetch {
                    cursor: group(c, 2),
                    into: opt_group(c, 3),
                },
            )
        }),
        (&PREPARE_RE, |c| {
            (
                StatementKind::Prepare,
                Clauses::Prepare {
                    statement: group(c, 2),
                    from: group(c, 3),
                },
            )
        }),
        (&LOB_CREATE_TEMPORARY_RE, |c| {
            (
                StatementKind::LobCreateTemporary,
                Clauses::Locator { locator: group(c, 2) },
            )
        }),
        (&LOB_FREE_TEMPORARY_RE, |c| {
            (
                StatementKind::LobFreeTemporary,
                Clauses::Locator { locator: group(c, 2) },
            )
        }),
        (&LOB_OPEN_RE, |c| {
            let mode = opt_group(c, 3).map(|m| {
                if m.eq_ignore_ascii_case("only") {
                    LobOpenMode::ReadOnly
                } else {
                    LobOpenMode::ReadWrite
                }
            });
            (
                StatementKind::LobOpen,
                Clauses::LobOpen {
                    locator: group(c, 2),
                    mode,
                },
            )
        }),
        (&LOB_CLOSE_RE, |c| {
            (
                StatementKind::LobClose,
                Clauses::Locator { locator: group(c, 2) },
            )
        }),
        (&LOB_READ_RE, |c| {
            (
                StatementKind::LobRead,
                Clauses::LobRead {
                    amount: group(c, 2),
                    source: group(c, 3),
                    offset: opt_group(c, 4),
                    target: group(c, 5),
                    length: opt_group(c, 6),
                },
            )
        }),
    ];

    for (re, build) in table {
        if let Some(caps) = re.captures(comment) {
            let (kind, clauses) = build(&caps);
            return Ok(ExecSqlStatement {
                kind,
                verb: group(&caps, 1),
                body: body_of(&caps),
                clauses,
            });
        }
    }

    Err(StatementError::Unrecognized {
        comment: comment.trim().to_string(),
    })
}
