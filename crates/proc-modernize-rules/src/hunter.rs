//! # Literal and assignment hunter
//!
//! Some statements only make sense together with the code right before
//! them. A `PREPARE ... FROM :buf` runs whatever text was formatted into
//! `buf`, and a `LOB READ ... INTO :dst` reads `dst.len` bytes. The hunter
//! finds that code among the unit's assignment and call facts and recovers
//! the literal (or macro) behind it.

use proc_modernize_core::SourceBuffer;
use tracing::debug;

use crate::host::{CType, ExprFact, TranslationUnit};
use crate::snoop::{LiteralKind, MacroLiteralText, PreprocessorSnoop};
use crate::symbols::{find_symbol, SymbolInfo};

/// Hunter errors.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error, miette::Diagnostic)]
pub enum HuntError {
    #[error("no sprintf into '{buffer}' precedes line {line}")]
    NoSprintf { buffer: String, line: u32 },

    #[error("format of the sprintf into '{buffer}' is not a macro string literal")]
    FormatNotMacro { buffer: String },

    #[error("no macro literal is assigned or copied into '{var}' before line {line}")]
    NoLiteralSource { var: String, line: u32 },

    #[error("no '{target}.len' assignment precedes line {line}")]
    NoLengthAssignment { target: String, line: u32 },
}

/// An argument of the formatting `sprintf`, as a generated parameter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FormatArg {
    /// Expression at the call site.
    pub expr: String,
    /// Parameter name in the generated function.
    pub name: String,
    /// `None` when the type could not be recovered.
    pub declarator: Option<String>,
}

/// `sprintf(buffer, MACRO, args...); prepare_var = buffer;`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FormattedPrepare {
    pub buffer: String,
    pub buffer_type: Option<SymbolInfo>,
    pub prepare_var: String,
    pub prepare_var_type: Option<SymbolInfo>,
    pub format: MacroLiteralText,
    pub args: Vec<FormatArg>,
}

/// `prepare_var = MACRO;` or `strcpy(prepare_var, MACRO);`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LiteralPrepare {
    pub prepare_var: String,
    pub prepare_var_type: Option<SymbolInfo>,
    pub request: MacroLiteralText,
}

/// Right-hand side of `target.len = <size>`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LobLength {
    pub target: String,
    /// Macro name when the size is a macro, else the expression text.
    pub expr: String,
    pub define: Option<MacroLiteralText>,
}

/// Read-only view over the facts a hunt needs.
pub struct Hunter<'a> {
    pub tu: &'a TranslationUnit,
    pub buf: &'a SourceBuffer,
    pub snoop: &'a PreprocessorSnoop,
}

impl<'a> Hunter<'a> {
    pub fn new(tu: &'a TranslationUnit, buf: &'a SourceBuffer, snoop: &'a PreprocessorSnoop) -> Self {
        Self { tu, buf, snoop }
    }

    fn symbol(&self, function: &str, name: &str) -> Option<SymbolInfo> {
        find_symbol(self.tu, function, name).map(SymbolInfo::from_var)
    }

    fn macro_text(&self, expr: &ExprFact, line: u32, kind: LiteralKind) -> Option<MacroLiteralText> {
        let record = match &expr.macro_name {
            Some(name) => self.snoop.find_by_name(name),
            None => self.snoop.find_usage_at_line(line),
        }?;
        if record.kind != kind {
            return None;
        }
        self.snoop.text_of(record, self.buf)
    }

    /// Buffer published into `var` by the latest `var = buffer` before `line`.
    fn published_buffer(&self, function: &str, var: &str, line: u32) -> String {
        self.tu
            .assignments_to(function, var)
            .filter(|a| a.line < line && a.lhs.member.is_none() && a.rhs.macro_name.is_none())
            .max_by_key(|a| a.line)
            .map(|a| a.rhs.name().to_string())
            .unwrap_or_else(|| var.to_string())
    }

    /// Find the `sprintf` that formats the text a `PREPARE` runs.
    pub fn formatted_prepare(
        &self,
        function: &str,
        prepare_var: &str,
        line: u32,
    ) -> Result<FormattedPrepare, HuntError> {
        let buffer = self.published_buffer(function, prepare_var, line);
        let call = self
            .tu
            .calls_to(function, "sprintf")
            .filter(|c| c.line < line && c.args.first().is_some_and(|a| a.name() == buffer))
            .max_by_key(|c| c.line)
            .ok_or_else(|| HuntError::NoSprintf {
                buffer: buffer.clone(),
                line,
            })?;
        debug!(function, buffer = %buffer, line = call.line, "selected sprintf");

        let format = call
            .args
            .get(1)
            .and_then(|fmt| fmt.macro_name.as_ref().map(|_| fmt))
            .and_then(|fmt| self.macro_text(fmt, call.line, LiteralKind::String))
            .ok_or_else(|| HuntError::FormatNotMacro {
                buffer: buffer.clone(),
            })?;

        let mut args: Vec<FormatArg> = Vec::new();
        for arg in call.args.iter().skip(2) {
            let base = arg.name().to_string();
            let mut name = base.clone();
            let mut n = 2;
            while args.iter().any(|a| a.name == name) {
                name = format!("{base}{n}");
                n += 1;
            }
            let ty = arg
                .ty
                .clone()
                .or_else(|| {
                    arg.decl_ref
                        .as_deref()
                        .and_then(|v| find_symbol(self.tu, function, v))
                        .map(|v| v.ty.clone())
                });
            args.push(FormatArg {
                expr: arg.text.trim().to_string(),
                declarator: ty.map(|t| format_param_declarator(&t, &name)),
                name,
            });
        }

        Ok(FormattedPrepare {
            buffer_type: self.symbol(function, &buffer),
            prepare_var_type: self.symbol(function, prepare_var),
            buffer,
            prepare_var: prepare_var.to_string(),
            format,
            args,
        })
    }

    /// Find the macro literal assigned or copied into `prepare_var`.
    pub fn literal_prepare(
        &self,
        function: &str,
        prepare_var: &str,
        line: u32,
    ) -> Result<LiteralPrepare, HuntError> {
        let assigned = self
            .tu
            .assignments_to(function, prepare_var)
            .filter(|a| a.line < line && a.rhs.macro_name.is_some())
            .map(|a| (a.line, &a.rhs));
        let copied = ["strcpy", "strncpy"].into_iter().flat_map(|callee| {
            self.tu
                .calls_to(function, callee)
                .filter(move |c| {
                    c.line < line && c.args.first().is_some_and(|a| a.name() == prepare_var)
                })
                .filter_map(|c| c.args.get(1).map(|src| (c.line, src)))
        });
        let request = assigned
            .chain(copied)
            .filter(|(_, src)| src.macro_name.is_some())
            .max_by_key(|(l, _)| *l)
            .and_then(|(l, src)| self.macro_text(src, l, LiteralKind::String))
            .ok_or_else(|| HuntError::NoLiteralSource {
                var: prepare_var.to_string(),
                line,
            })?;
        Ok(LiteralPrepare {
            prepare_var: prepare_var.to_string(),
            prepare_var_type: self.symbol(function, prepare_var),
            request,
        })
    }

    /// Find the latest `target.len = <size>` before `line`.
    pub fn lob_length(&self, function: &str, target: &str, line: u32) -> Result<LobLength, HuntError> {
        let assignment = self
            .tu
            .assignments_to(function, target)
            .filter(|a| a.line < line && a.lhs.member.as_deref() == Some("len"))
            .max_by_key(|a| a.line)
            .ok_or_else(|| HuntError::NoLengthAssignment {
                target: target.to_string(),
                line,
            })?;
        let define = assignment
            .rhs
            .macro_name
            .as_ref()
            .and_then(|_| self.macro_text(&assignment.rhs, assignment.line, LiteralKind::Numeric));
        let expr = match &define {
            Some(def) => def.name.clone(),
            None => assignment.rhs.text.trim().to_string(),
        };
        Ok(LobLength {
            target: target.to_string(),
            expr,
            define,
        })
    }
}

/// Parameter declarator for a formatted value: arrays become `const T name[N]`.
pub fn format_param_declarator(ty: &CType, name: &str) -> String {
    match ty.as_constant_array() {
        Some((element, size)) => format!("const {} {name}[{size}]", element.spelling()),
        None => declare(&ty.spelling(), name),
    }
}

/// Join a type spelling and a name: `int age`, `struct emp *rec`.
pub fn declare(type_spelling: &str, name: &str) -> String {
    if type_spelling.ends_with('*') || type_spelling.ends_with('&') {
        format!("{type_spelling}{name}")
    } else {
        format!("{type_spelling} {name}")
    }
}

/// `#ifndef NAME` / `#define ...` / `#endif` around a recovered directive.
pub fn guarded_define(text: &MacroLiteralText) -> String {
    format!("#ifndef {}\n{}\n#endif", text.name, text.define)
}
