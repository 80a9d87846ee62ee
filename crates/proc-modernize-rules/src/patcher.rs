//! # Original-file patcher
//!
//! At the end of a translation unit every recorded replacement is carried
//! back into the Pro*C input the unit was generated from. Statements with a
//! known line range are patched by line, keeping the line count; the rest
//! fall back to a regular expression built from the statement text.
//!
//! Each patched file is read once, patched bottom-up, backed up to the
//! first free `<path>.bak` / `<path>-N.bak` and written once.

use std::collections::BTreeMap;
use std::fs::OpenOptions;
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};
use std::sync::LazyLock;

use proc_modernize_core::Span;
use regex::Regex;
use tracing::{debug, info, warn};

use crate::replacement::{PcLines, ReplacementRecord};
use crate::statement::normalize_whitespace;
use crate::writer::source_stem;

/// How far the `EXEC` / `;` search may leave the recorded line range.
const SEARCH_WINDOW: usize = 10;

// ─────────────────────── Errors ───────────────────────

/// Patcher problems. All are reported as warnings.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error, miette::Diagnostic)]
pub enum PatchError {
    #[error("original file {path} does not exist")]
    Missing { path: PathBuf },

    #[error("original file {path} is empty")]
    Empty { path: PathBuf },

    #[error("cannot read {path}: {message}")]
    Read { path: PathBuf, message: String },

    #[error("cannot write {path}: {message}")]
    Write { path: PathBuf, message: String },

    #[error("cannot back up {path}: {message}")]
    Backup { path: PathBuf, message: String },

    #[error("line {line} is outside {path} ({lines} lines)")]
    LineOutOfRange { path: PathBuf, line: u32, lines: usize },

    #[error("statement at {path}:{line} is already replaced")]
    AlreadyReplaced { path: PathBuf, line: u32 },

    #[error("statement already replaced or not found in {path}: {statement}")]
    NotFound { path: PathBuf, statement: String },

    #[error("{count} further occurrence(s) of the statement remain in {path}: {statement}")]
    #[diagnostic(help("only the first occurrence is replaced when no #line information is available"))]
    MoreOccurrences {
        path: PathBuf,
        statement: String,
        count: usize,
    },
}

// ─────────────────────── Backups ───────────────────────

fn with_suffix(path: &Path, suffix: &str) -> PathBuf {
    let mut name = path.as_os_str().to_owned();
    name.push(suffix);
    PathBuf::from(name)
}

/// Backup names in the order they are tried: `.bak`, `-0.bak`, `-1.bak`, ...
pub fn backup_candidate(path: &Path, attempt: usize) -> PathBuf {
    match attempt {
        0 => with_suffix(path, ".bak"),
        n => with_suffix(path, &format!("-{}.bak", n - 1)),
    }
}

/// Save `content` under the first free backup name of `path`.
pub fn create_backup(path: &Path, content: &str) -> Result<PathBuf, PatchError> {
    for attempt in 0.. {
        let candidate = backup_candidate(path, attempt);
        match OpenOptions::new().write(true).create_new(true).open(&candidate) {
            Ok(mut file) => {
                file.write_all(content.as_bytes())
                    .map_err(|e| PatchError::Backup {
                        path: candidate.clone(),
                        message: e.to_string(),
                    })?;
                return Ok(candidate);
            }
            Err(e) if e.kind() == ErrorKind::AlreadyExists => continue,
            Err(e) => {
                return Err(PatchError::Backup {
                    path: candidate,
                    message: e.to_string(),
                })
            }
        }
    }
    unreachable!("backup candidates are unbounded")
}

// ─────────────────────── Path Resolution ───────────────────────

/// File a record patches: its `#line` file, else `<report-dir>/<stem>.pc`.
pub fn resolve_pc_path(
    record: &ReplacementRecord,
    main_file: &str,
    report_dir: Option<&Path>,
) -> PathBuf {
    let main_dir = Path::new(main_file).parent().unwrap_or_else(|| Path::new(""));
    match &record.pc {
        Some(pc) => {
            let path = PathBuf::from(&pc.filename);
            if path.is_relative() && !path.exists() {
                let beside = main_dir.join(&path);
                if beside.exists() {
                    return beside;
                }
            }
            path
        }
        None => {
            let dir = report_dir.unwrap_or(main_dir);
            dir.join(format!("{}.pc", source_stem(main_file)))
        }
    }
}

// ─────────────────────── Line-Range Mode ───────────────────────

static EXEC_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)\bEXEC\b").expect("EXEC pattern"));

/// File content split into lines, remembering `\r\n` endings.
#[derive(Debug, Clone, PartialEq, Eq)]
struct Lines {
    lines: Vec<(String, bool)>,
}

impl Lines {
    fn split(text: &str) -> Self {
        let lines = text
            .split('\n')
            .map(|l| match l.strip_suffix('\r') {
                Some(stripped) => (stripped.to_string(), true),
                None => (l.to_string(), false),
            })
            .collect();
        Self { lines }
    }

    fn join(&self) -> String {
        self.lines
            .iter()
            .map(|(l, cr)| if *cr { format!("{l}\r") } else { l.clone() })
            .collect::<Vec<_>>()
            .join("\n")
    }

    fn len(&self) -> usize {
        self.lines.len()
    }

    /// 1-based.
    fn text(&self, line: usize) -> &str {
        &self.lines[line - 1].0
    }
}

/// Replace the statement on lines `pc.start..=pc.end` of `lines`.
fn apply_line_range(
    lines: &mut Lines,
    record: &ReplacementRecord,
    pc: &PcLines,
    keep_commented: bool,
    path: &Path,
) -> Result<(), PatchError> {
    let n = lines.len();
    let start = pc.start as usize;
    if start == 0 || start > n {
        return Err(PatchError::LineOutOfRange {
            path: path.to_path_buf(),
            line: pc.start,
            lines: n,
        });
    }
    let end = if record.had_cr {
        (pc.end as usize).max(start).min(n)
    } else {
        start
    };
    let already = || PatchError::AlreadyReplaced {
        path: path.to_path_buf(),
        line: pc.start,
    };
    let not_found = || PatchError::NotFound {
        path: path.to_path_buf(),
        statement: record.execsql.clone(),
    };

    if lines.text(start).contains(record.rpltcode.trim()) {
        return Err(already());
    }

    let mut first = start;
    let mut exec_col = EXEC_RE.find(lines.text(first)).map(|m| m.start());
    while exec_col.is_none() {
        if first == 1 || start - first >= SEARCH_WINDOW {
            return Err(not_found());
        }
        first -= 1;
        exec_col = EXEC_RE.find(lines.text(first)).map(|m| m.start());
        if exec_col.is_none() && lines.text(first).contains(';') {
            return Err(not_found());
        }
    }
    let exec_col = exec_col.unwrap_or_default();
    let lead = lines.text(first)[..exec_col].to_string();
    if lead.contains("/*") {
        return Err(already());
    }

    let mut last = end.max(first);
    let semi_in = |lines: &Lines, line: usize| {
        let from = if line == first { exec_col } else { 0 };
        lines.text(line)[from..].find(';').map(|i| i + from)
    };
    let mut semi = semi_in(lines, last);
    while semi.is_none() {
        if last == n || last - end >= SEARCH_WINDOW {
            return Err(not_found());
        }
        last += 1;
        semi = semi_in(lines, last);
    }
    let semi = semi.unwrap_or_default();

    let indent: String = lead.chars().take_while(|c| c.is_whitespace()).collect();
    let suffix = lines.text(last)[semi + 1..].to_string();
    let cr = lines.lines[last - 1].1;
    debug!(path = %path.display(), first, last, "patching line range");

    if keep_commented {
        if first == last {
            let stmt = lines.text(first)[exec_col..=semi].to_string();
            lines.lines[first - 1].0 = format!("{lead}/* {stmt} */{suffix}");
        } else {
            let head = lines.text(first)[exec_col..].to_string();
            let tail = lines.text(last)[..=semi].to_string();
            lines.lines[first - 1].0 = format!("{lead}/* {head}");
            lines.lines[last - 1].0 = format!("{tail} */{suffix}");
        }
        lines
            .lines
            .insert(last, (format!("{indent}{}", record.rpltcode), cr));
    } else {
        lines.lines[first - 1].0 = format!("{lead}{}{suffix}", record.rpltcode);
        for line in first + 1..=last {
            lines.lines[line - 1].0 = indent.clone();
        }
    }
    Ok(())
}

// ─────────────────────── Regex Mode ───────────────────────

static EXEC_SQL_PREFIX_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)^\s*EXEC\s+SQL\s+").expect("EXEC SQL prefix pattern"));

/// Pattern matching `statement` with any whitespace, capturing the indentation.
pub fn statement_pattern(statement: &str) -> Result<Regex, regex::Error> {
    let normalized = normalize_whitespace(statement);
    let body = EXEC_SQL_PREFIX_RE.replace(&normalized, "");
    let body = body.trim_end().trim_end_matches(';').trim_end();
    let body = body
        .split(',')
        .map(|piece| {
            piece
                .split_whitespace()
                .map(regex::escape)
                .collect::<Vec<_>>()
                .join(r"\s+")
        })
        .collect::<Vec<_>>()
        .join(r"\s*,\s*");
    Regex::new(&format!(r"(?i)([ \t]*)EXEC\s+SQL\s+{body}\s*;"))
}

/// Replace the first occurrence of the statement in `text`.
///
/// Returns the new text and the number of further occurrences.
fn apply_regex(
    text: &str,
    record: &ReplacementRecord,
    keep_commented: bool,
    path: &Path,
) -> Result<(String, usize), PatchError> {
    let not_found = || PatchError::NotFound {
        path: path.to_path_buf(),
        statement: record.execsql.clone(),
    };
    let re = statement_pattern(&record.execsql).map_err(|_| not_found())?;

    let live: Vec<_> = re
        .captures_iter(text)
        .filter(|caps| {
            let Some(m) = caps.get(0) else { return false };
            let line_start = text[..m.start()].rfind('\n').map_or(0, |i| i + 1);
            !text[line_start..m.start()].contains("/*")
        })
        .collect();
    let caps = live.first().ok_or_else(not_found)?;
    let (Some(whole), Some(indent)) = (caps.get(0), caps.get(1)) else {
        return Err(not_found());
    };

    let indent = indent.as_str();
    let replacement = if keep_commented {
        let stmt = &text[indent.len() + whole.start()..whole.end()];
        format!("{indent}/* {stmt} */\n{indent}{}", record.rpltcode)
    } else {
        format!("{indent}{}", record.rpltcode)
    };
    let mut out = String::with_capacity(text.len());
    out.push_str(&text[..whole.start()]);
    out.push_str(&replacement);
    out.push_str(&text[whole.end()..]);
    Ok((out, live.len() - 1))
}

// ─────────────────────── Driver ───────────────────────

/// Patcher settings taken from the rule configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PatchOptions {
    pub keep_commented: bool,
    pub report_dir: Option<PathBuf>,
}

/// What one patcher run did.
#[derive(Debug, Default)]
pub struct PatchReport {
    pub patched: Vec<PathBuf>,
    pub backups: Vec<PathBuf>,
    /// Problems, each tied to the block of the record that caused it.
    pub warnings: Vec<(Span, PatchError)>,
}

/// A record together with the patcher settings of the rule that produced it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PatchEntry {
    pub record: ReplacementRecord,
    pub options: PatchOptions,
}

/// Carries replacement records back into the original files.
#[derive(Debug, Clone, Default)]
pub struct Patcher {
    options: PatchOptions,
}

impl Patcher {
    /// `options` apply to records passed to [`run`](Self::run).
    pub fn new(options: PatchOptions) -> Self {
        Self { options }
    }

    /// Patch every record with this patcher's options.
    pub fn run(&self, main_file: &str, records: Vec<ReplacementRecord>) -> PatchReport {
        let entries = records
            .into_iter()
            .map(|record| PatchEntry {
                record,
                options: self.options.clone(),
            })
            .collect();
        self.run_entries(main_file, entries)
    }

    /// Patch every entry; each record is consumed once.
    ///
    /// Entries are grouped by the file they patch, so a file is read, backed
    /// up and written once whatever options its entries carry.
    pub fn run_entries(&self, main_file: &str, entries: Vec<PatchEntry>) -> PatchReport {
        let mut report = PatchReport::default();
        let mut by_file: BTreeMap<PathBuf, Vec<PatchEntry>> = BTreeMap::new();
        for entry in entries {
            let path = resolve_pc_path(&entry.record, main_file, entry.options.report_dir.as_deref());
            by_file.entry(path).or_default().push(entry);
        }
        for (path, entries) in by_file {
            self.patch_file(&path, entries, &mut report);
        }
        report
    }

    fn patch_file(&self, path: &Path, mut entries: Vec<PatchEntry>, report: &mut PatchReport) {
        let span = entries.first().map(|e| e.record.span).unwrap_or_else(Span::dummy);
        let original = match std::fs::read_to_string(path) {
            Ok(text) if text.is_empty() => {
                report.warnings.push((span, PatchError::Empty { path: path.to_path_buf() }));
                return;
            }
            Ok(text) => text,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                report.warnings.push((span, PatchError::Missing { path: path.to_path_buf() }));
                return;
            }
            Err(e) => {
                report.warnings.push((
                    span,
                    PatchError::Read {
                        path: path.to_path_buf(),
                        message: e.to_string(),
                    },
                ));
                return;
            }
        };

        // Bottom-up, so lines inserted for kept statements never shift a
        // range that is still to be patched.
        entries.sort_by_key(|e| std::cmp::Reverse(e.record.pc.as_ref().map(|pc| pc.start)));

        let mut lines = Lines::split(&original);
        for PatchEntry { record, options } in &entries {
            if let Some(pc) = &record.pc {
                if let Err(e) = apply_line_range(&mut lines, record, pc, options.keep_commented, path) {
                    warn!(error = %e, "line-range patch skipped");
                    report.warnings.push((record.span, e));
                }
            }
        }
        let mut text = lines.join();
        for PatchEntry { record, options } in entries.iter().filter(|e| e.record.pc.is_none()) {
            match apply_regex(&text, record, options.keep_commented, path) {
                Ok((patched, more)) => {
                    text = patched;
                    if more > 0 {
                        report.warnings.push((
                            record.span,
                            PatchError::MoreOccurrences {
                                path: path.to_path_buf(),
                                statement: record.execsql.clone(),
                                count: more,
                            },
                        ));
                    }
                }
                Err(e) => report.warnings.push((record.span, e)),
            }
        }

        if text == original {
            return;
        }
        match create_backup(path, &original) {
            Ok(backup) => report.backups.push(backup),
            Err(e) => {
                report.warnings.push((span, e));
                return;
            }
        }
        if let Err(e) = std::fs::write(path, &text) {
            report.warnings.push((
                span,
                PatchError::Write {
                    path: path.to_path_buf(),
                    message: e.to_string(),
                },
            ));
            return;
        }
        info!(path = %path.display(), "patched original file");
        report.patched.push(path.to_path_buf());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(rpltcode: &str, execsql: &str, pc: Option<(&str, u32, u32)>, had_cr: bool) -> ReplacementRecord {
        ReplacementRecord {
            execsql: execsql.into(),
            fullcomment: format!("/* {execsql} */"),
            funcname: rpltcode.trim_end_matches("();").into(),
            originalfile: "emp.c".into(),
            reqname: "c".into(),
            rpltcode: rpltcode.into(),
            pc: pc.map(|(f, s, e)| PcLines {
                filename: f.into(),
                start: s,
                end: e,
            }),
            had_cr,
            span: Span::new(0, 1),
            rule: "proc-exec-sql-fetch",
        }
    }

    const PC: &str = "  /* original comment */\n   EXEC SQL\n      FETCH c INTO :a;\nint x;\n";

    #[test]
    fn test_line_range_patch_with_backup() {
        let tmp = tempfile::tempdir().unwrap();
        let pc = tmp.path().join("emp.pc");
        std::fs::write(&pc, PC).unwrap();
        let pc_name = pc.to_string_lossy().into_owned();

        let rec = record("fetchC();", "EXEC SQL FETCH c INTO :a;", Some((&pc_name, 2, 3)), true);
        let report = Patcher::default().run("emp.c", vec![rec]);
        assert!(report.warnings.is_empty(), "{:?}", report.warnings);
        assert_eq!(
            std::fs::read_to_string(&pc).unwrap(),
            "  /* original comment */\n   fetchC();\n   \nint x;\n"
        );
        assert_eq!(report.backups, vec![with_suffix(&pc, ".bak")]);
        assert_eq!(std::fs::read_to_string(with_suffix(&pc, ".bak")).unwrap(), PC);
    }

    #[test]
    fn test_line_range_is_idempotent() {
        let tmp = tempfile::tempdir().unwrap();
        let pc = tmp.path().join("emp.pc");
        std::fs::write(&pc, PC).unwrap();
        let pc_name = pc.to_string_lossy().into_owned();
        let rec = record("fetchC();", "EXEC SQL FETCH c INTO :a;", Some((&pc_name, 2, 3)), true);

        Patcher::default().run("emp.c", vec![rec.clone()]);
        let once = std::fs::read_to_string(&pc).unwrap();
        let report = Patcher::default().run("emp.c", vec![rec]);
        assert_eq!(std::fs::read_to_string(&pc).unwrap(), once);
        assert!(report.backups.is_empty());
        assert!(matches!(report.warnings[0].1, PatchError::AlreadyReplaced { .. }));
    }

    #[test]
    fn test_keep_commented_out_statement() {
        let mut lines = Lines::split(PC);
        let rec = record("fetchC();", "EXEC SQL FETCH c INTO :a;", None, true);
        let pc = PcLines {
            filename: "emp.pc".into(),
            start: 2,
            end: 3,
        };
        apply_line_range(&mut lines, &rec, &pc, true, Path::new("emp.pc")).unwrap();
        assert_eq!(
            lines.join(),
            "  /* original comment */\n   /* EXEC SQL\n      FETCH c INTO :a; */\n   fetchC();\nint x;\n"
        );

        // the commented statement is recognized on the next run
        let err = apply_line_range(&mut lines, &rec, &pc, true, Path::new("emp.pc")).unwrap_err();
        assert!(matches!(err, PatchError::AlreadyReplaced { .. }));
    }

    #[test]
    fn test_single_line_keeps_suffix_and_crlf() {
        let mut lines = Lines::split("int a;\r\n  EXEC SQL CLOSE c; /* done */\r\n");
        let rec = record("closeC();", "EXEC SQL CLOSE c;", None, false);
        let pc = PcLines {
            filename: "x.pc".into(),
            start: 2,
            end: 2,
        };
        apply_line_range(&mut lines, &rec, &pc, false, Path::new("x.pc")).unwrap();
        assert_eq!(lines.join(), "int a;\r\n  closeC(); /* done */\r\n");
    }

    #[test]
    fn test_exec_searched_upward_and_semicolon_downward() {
        let text = "x = 1;\n  EXEC SQL\n    OPEN c\n    USING :a;\n";
        let mut lines = Lines::split(text);
        let rec = record("openC(a);", "EXEC SQL OPEN c USING :a;", None, true);
        let pc = PcLines {
            filename: "x.pc".into(),
            start: 3,
            end: 3,
        };
        apply_line_range(&mut lines, &rec, &pc, false, Path::new("x.pc")).unwrap();
        assert_eq!(lines.join(), "x = 1;\n  openC(a);\n  \n  \n");
    }

    #[test]
    fn test_line_out_of_range() {
        let mut lines = Lines::split("a\nb");
        let rec = record("f();", "EXEC SQL CLOSE c;", None, false);
        let pc = PcLines {
            filename: "x.pc".into(),
            start: 9,
            end: 9,
        };
        assert!(matches!(
            apply_line_range(&mut lines, &rec, &pc, false, Path::new("x.pc")),
            Err(PatchError::LineOutOfRange { line: 9, lines: 2, .. })
        ));
    }

    #[test]
    fn test_regex_fallback_replaces_first_and_counts_rest() {
        let text = "  EXEC SQL FETCH c\n     INTO :a , :b;\n  exec sql fetch c into :a,:b;\n";
        let rec = record("fetchC(a, b);", "EXEC SQL FETCH c INTO :a, :b;", None, false);
        let (out, more) = apply_regex(text, &rec, false, Path::new("x.pc")).unwrap();
        assert_eq!(out, "  fetchC(a, b);\n  exec sql fetch c into :a,:b;\n");
        assert_eq!(more, 1);
    }

    #[test]
    fn test_regex_fallback_skips_commented_statement() {
        let rec = record("closeC();", "EXEC SQL CLOSE c;", None, false);
        let (out, _) = apply_regex("  EXEC SQL CLOSE c;\n", &rec, true, Path::new("x.pc")).unwrap();
        assert_eq!(out, "  /* EXEC SQL CLOSE c; */\n  closeC();\n");
        assert!(matches!(
            apply_regex(&out, &rec, true, Path::new("x.pc")),
            Err(PatchError::NotFound { .. })
        ));
    }

    #[test]
    fn test_regex_mode_through_report_dir() {
        let tmp = tempfile::tempdir().unwrap();
        let pc = tmp.path().join("emp.pc");
        std::fs::write(&pc, "void f() {\n    EXEC SQL CLOSE c;\n}\n").unwrap();
        let patcher = Patcher::new(PatchOptions {
            keep_commented: false,
            report_dir: Some(tmp.path().to_path_buf()),
        });
        let rec = record("closeC();", "EXEC SQL CLOSE c;", None, false);
        let report = patcher.run("/build/emp.c", vec![rec.clone()]);
        assert_eq!(report.patched, vec![pc.clone()]);
        assert_eq!(std::fs::read_to_string(&pc).unwrap(), "void f() {\n    closeC();\n}\n");

        let again = patcher.run("/build/emp.c", vec![rec]);
        assert!(again.patched.is_empty());
        assert!(matches!(again.warnings[0].1, PatchError::NotFound { .. }));
    }

    #[test]
    fn test_missing_and_empty_files() {
        let tmp = tempfile::tempdir().unwrap();
        let patcher = Patcher::new(PatchOptions {
            keep_commented: false,
            report_dir: Some(tmp.path().to_path_buf()),
        });
        let rec = record("closeC();", "EXEC SQL CLOSE c;", None, false);
        let report = patcher.run("emp.c", vec![rec.clone()]);
        assert!(matches!(report.warnings[0].1, PatchError::Missing { .. }));

        std::fs::write(tmp.path().join("emp.pc"), "").unwrap();
        let report = patcher.run("emp.c", vec![rec]);
        assert!(matches!(report.warnings[0].1, PatchError::Empty { .. }));
    }

    #[test]
    fn test_backups_are_injective() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("emp.pc");
        std::fs::write(&path, "x").unwrap();
        let made: Vec<PathBuf> = (0..4).map(|i| create_backup(&path, &i.to_string()).unwrap()).collect();
        let expected: Vec<PathBuf> = (0..4).map(|i| backup_candidate(&path, i)).collect();
        assert_eq!(made, expected);
        assert_eq!(
            made.iter().map(|p| p.file_name().unwrap().to_string_lossy().into_owned()).collect::<Vec<_>>(),
            vec!["emp.pc.bak", "emp.pc-0.bak", "emp.pc-1.bak", "emp.pc-2.bak"]
        );
        assert_eq!(std::fs::read_to_string(&made[2]).unwrap(), "2");
    }

    #[test]
    fn test_several_statements_in_one_file() {
        let tmp = tempfile::tempdir().unwrap();
        let pc = tmp.path().join("emp.pc");
        std::fs::write(&pc, "  EXEC SQL OPEN c;\n  EXEC SQL\n    CLOSE c;\n  EXEC SQL FETCH c INTO :a;\n").unwrap();
        let name = pc.to_string_lossy().into_owned();
        let records = vec![
            record("openC();", "EXEC SQL OPEN c;", Some((&name, 1, 1)), false),
            record("closeC();", "EXEC SQL CLOSE c;", Some((&name, 2, 3)), true),
            record("fetchC(a);", "EXEC SQL FETCH c INTO :a;", Some((&name, 4, 4)), false),
        ];
        let report = Patcher::new(PatchOptions {
            keep_commented: true,
            report_dir: None,
        })
        .run("emp.c", records);
        assert!(report.warnings.is_empty(), "{:?}", report.warnings);
        assert_eq!(report.backups.len(), 1);
        assert_eq!(
            std::fs::read_to_string(&pc).unwrap(),
            "  /* EXEC SQL OPEN c; */\n  openC();\n  /* EXEC SQL\n    CLOSE c; */\n  closeC();\n  /* EXEC SQL FETCH c INTO :a; */\n  fetchC(a);\n"
        );
    }

    #[test]
    fn test_mixed_options_patch_one_file_in_one_pass() {
        let tmp = tempfile::tempdir().unwrap();
        let pc = tmp.path().join("emp.pc");
        std::fs::write(&pc, " EXEC SQL CLOSE c1;\n x = 1;\n EXEC SQL FETCH c2 INTO :a;\n y = 2;\n").unwrap();
        let name = pc.to_string_lossy().into_owned();
        let keep = PatchOptions {
            keep_commented: true,
            report_dir: None,
        };
        let entries = vec![
            PatchEntry {
                record: record("closeC1();", "EXEC SQL CLOSE c1;", Some((&name, 1, 1)), false),
                options: keep,
            },
            PatchEntry {
                record: record("fetchC2(a);", "EXEC SQL FETCH c2 INTO :a;", Some((&name, 3, 3)), false),
                options: PatchOptions::default(),
            },
        ];
        let report = Patcher::default().run_entries("emp.c", entries);
        assert!(report.warnings.is_empty(), "{:?}", report.warnings);
        assert_eq!(report.backups.len(), 1);
        assert_eq!(report.patched, vec![pc.clone()]);
        assert_eq!(
            std::fs::read_to_string(&pc).unwrap(),
            " /* EXEC SQL CLOSE c1; */\n closeC1();\n x = 1;\n fetchC2(a);\n y = 2;\n"
        );
    }
}
