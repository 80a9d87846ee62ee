//! # Host-variable decoder
//!
//! Decodes the host-variable lists of `INTO`, `USING` and `FROM` clauses:
//!
//! ```text
//! list      := item ( ',' item )*
//! item      := primary indicator?
//! primary   := ':' path
//! indicator := ( 'INDICATOR' )? ':' path
//! path      := ident ( ( '->' | '.' ) ident )*
//! ```
//!
//! Decoding is purely syntactic and total: items that do not start with `:`
//! are skipped and an unexpected character ends the current item.

use std::collections::BTreeMap;
use std::fmt;

/// Dereference operator between two path segments.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Deref {
    #[default]
    None,
    Arrow,
    Dot,
}

impl Deref {
    pub fn as_str(self) -> &'static str {
        match self {
            Deref::None => "",
            Deref::Arrow => "->",
            Deref::Dot => ".",
        }
    }
}

impl fmt::Display for Deref {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A `:a->b.c` expression split into its parts.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HostPath {
    /// Every identifier with the operator that precedes it.
    pub segments: Vec<(Deref, String)>,
}

impl HostPath {
    /// The path without colon or whitespace: `rec->name`.
    pub fn full(&self) -> String {
        self.segments
            .iter()
            .map(|(op, id)| format!("{op}{id}"))
            .collect()
    }

    /// The leading identifier, the variable declared in the function.
    pub fn root(&self) -> &str {
        self.segments.first().map(|(_, id)| id.as_str()).unwrap_or("")
    }

    /// The last identifier.
    pub fn hostvar(&self) -> &str {
        self.segments.last().map(|(_, id)| id.as_str()).unwrap_or("")
    }

    /// Everything before the last dereference (empty without one).
    pub fn hostrecord(&self) -> String {
        if self.segments.len() < 2 {
            return String::new();
        }
        HostPath {
            segments: self.segments[..self.segments.len() - 1].to_vec(),
        }
        .full()
    }

    /// The member named after the last dereference (empty without one).
    pub fn hostmember(&self) -> &str {
        if self.segments.len() < 2 {
            ""
        } else {
            self.hostvar()
        }
    }

    pub fn deref(&self) -> Deref {
        match self.segments.len() {
            0 | 1 => Deref::None,
            n => self.segments[n - 1].0,
        }
    }

    /// Member names following the root, in order.
    pub fn members(&self) -> impl Iterator<Item = &str> {
        self.segments.iter().skip(1).map(|(_, id)| id.as_str())
    }
}

/// One item of a host-variable list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HostVar {
    pub primary: HostPath,
    pub indicator: Option<HostPath>,
}

impl HostVar {
    /// `:path` or `:path:indicator`, as written back into SQL.
    pub fn sql_text(&self) -> String {
        match &self.indicator {
            Some(ind) => format!(":{}:{}", self.primary.full(), ind.full()),
            None => format!(":{}", self.primary.full()),
        }
    }

    /// Key/value view with `full`, `hostvar`, `hostrecord`, `hostmember`,
    /// `deref` and their `i`-suffixed indicator analogues.
    pub fn to_record(&self) -> BTreeMap<String, String> {
        let mut record = BTreeMap::new();
        insert_path(&mut record, &self.primary, "");
        if let Some(ind) = &self.indicator {
            insert_path(&mut record, ind, "i");
        }
        record
    }
}

fn insert_path(record: &mut BTreeMap<String, String>, path: &HostPath, suffix: &str) {
    record.insert(format!("full{suffix}"), path.full());
    record.insert(format!("hostvar{suffix}"), path.hostvar().to_string());
    record.insert(format!("hostrecord{suffix}"), path.hostrecord());
    record.insert(format!("hostmember{suffix}"), path.hostmember().to_string());
    record.insert(format!("deref{suffix}"), path.deref().to_string());
}

/// Decode a host-variable list into a mapping dense from 1.
pub fn decode_host_vars(text: &str) -> BTreeMap<usize, HostVar> {
    text.split(',')
        .filter_map(parse_item)
        .enumerate()
        .map(|(i, var)| (i + 1, var))
        .collect()
}

// ─────────────────────── Scanner ───────────────────────

struct Scanner<'a> {
    rest: &'a str,
}

impl<'a> Scanner<'a> {
    fn skip_ws(&mut self) {
        self.rest = self.rest.trim_start();
    }

    fn eat(&mut self, tok: &str) -> bool {
        match self.rest.strip_prefix(tok) {
            Some(rest) => {
                self.rest = rest;
                true
            }
            None => false,
        }
    }

    fn eat_keyword(&mut self, kw: &str) -> bool {
        let Some(head) = self.rest.get(..kw.len()) else {
            return false;
        };
        let boundary = self.rest[kw.len()..]
            .chars()
            .next()
            .map_or(true, |c| !is_ident_char(c));
        if head.eq_ignore_ascii_case(kw) && boundary {
            self.rest = &self.rest[kw.len()..];
            true
        } else {
            false
        }
    }

    fn ident(&mut self) -> Option<String> {
        let mut chars = self.rest.char_indices();
        match chars.next() {
            Some((_, c)) if c.is_ascii_alphabetic() || c == '_' => {}
            _ => return None,
        }
        let end = chars
            .find(|(_, c)| !is_ident_char(*c))
            .map_or(self.rest.len(), |(i, _)| i);
        let (id, rest) = self.rest.split_at(end);
        self.rest = rest;
        Some(id.to_string())
    }

    /// `':' path`
    fn path(&mut self) -> Option<HostPath> {
        self.skip_ws();
        if !self.eat(":") {
            return None;
        }
        self.skip_ws();
        let mut segments = vec![(Deref::None, self.ident()?)];
        loop {
            let save = self.rest;
            self.skip_ws();
            let op = if self.eat("->") {
                Deref::Arrow
            } else if self.eat(".") {
                Deref::Dot
            } else {
                self.rest = save;
                break;
            };
            self.skip_ws();
            match self.ident() {
                Some(id) => segments.push((op, id)),
                None => {
                    self.rest = save;
                    break;
                }
            }
        }
        Some(HostPath { segments })
    }
}

fn is_ident_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '_'
}

fn parse_item(item: &str) -> Option<HostVar> {
    let mut scanner = Scanner { rest: item };
    let primary = scanner.path()?;
    scanner.skip_ws();
    if scanner.eat_keyword("INDICATOR") {
        scanner.skip_ws();
    }
    let indicator = scanner.path();
    Some(HostVar { primary, indicator })
}
