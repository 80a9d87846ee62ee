//! # Rule orchestrator
//!
//! [`ExecSqlRewriter`] drives one translation unit at a time through the
//! EXEC SQL rules:
//!
//! 1. every macro expansion is fed to the [`PreprocessorSnoop`],
//! 2. every `sqlstm` block is matched back to its statement comment, parsed,
//!    planned into a request function and written out,
//! 3. a fix-it replaces the block with a call to that function and a
//!    replacement record is kept for the unit,
//! 4. at the end of the unit the records are carried back into the `.pc`
//!    files when the rule asks for it.
//!
//! No failure aborts the unit; every problem becomes a [`Diagnostic`].

use std::collections::BTreeMap;
use std::path::PathBuf;

use proc_modernize_core::{Diagnostic, FixIt, Location, SourceBuffer, Span};
use tracing::{debug, info, trace, warn};

use crate::codes;
use crate::config::{ConfigFile, RuleConfig};
use crate::groups::RequestGroups;
use crate::host::{MacroExpansion, SqlstmBlock, TranslationUnit};
use crate::hostvar::decode_host_vars;
use crate::hunter::{guarded_define, Hunter};
use crate::locator::{locate_comment, CommentDirection, LocatedComment};
use crate::params::{plan_params, AnonymousStruct, ParamPlan};
use crate::patcher::{PatchEntry, PatchOptions, Patcher};
use crate::replacement::{occurrence_key, PcLines, ReplacementRecord, ReplacementTable};
use crate::snoop::PreprocessorSnoop;
use crate::statement::{parse_statement, Clauses, ExecSqlStatement, StatementKind};
use crate::symbols::SymbolInfo;
use crate::template::{Substitutions, Variants};
use crate::writer::{ArtefactWriter, Request};

// ─────────────────────── Request Assembly ───────────────────────

/// Everything the templates and the fix-it need for one request.
#[derive(Debug, Default)]
struct Assembly {
    params: String,
    call_args: String,
    exec_sql: String,
    prologue: Vec<String>,
    macro_definitions: Vec<String>,
    anonymous: Vec<AnonymousStruct>,
    extra: Vec<(&'static str, String)>,
    warnings: Vec<Diagnostic>,
}

impl Assembly {
    fn from_plan(plan: ParamPlan, span: Span) -> Self {
        let warnings = plan
            .unresolved
            .iter()
            .map(|e| Diagnostic::warning(codes::UNRESOLVED_HOST_VAR, e.to_string(), span))
            .collect();
        Self {
            params: plan.declarators(),
            call_args: plan.call_args(),
            exec_sql: plan.exec_sql(),
            anonymous: plan.anonymous,
            warnings,
            ..Default::default()
        }
    }
}

/// Declaration of a local copy of `var`, when its type is known.
fn local_decl(info: Option<&SymbolInfo>, var: &str) -> Option<String> {
    info.map(|i| i.declarator(var))
}

/// `strcpy(dst, src);` for arrays, `dst = src;` otherwise.
fn copy_into(info: Option<&SymbolInfo>, dst: &str, src: &str) -> String {
    match info {
        Some(i) if i.array.is_some() => format!("strcpy({dst}, {src});"),
        _ => format!("{dst} = {src};"),
    }
}

/// Leading identifier of a single host-variable list: `:rec->buf` gives `rec`.
fn root_of(list: &str) -> Option<String> {
    decode_host_vars(list)
        .into_values()
        .next()
        .map(|v| v.primary.root().to_string())
}

struct Assembler<'a> {
    tu: &'a TranslationUnit,
    hunter: Hunter<'a>,
    function: &'a str,
    line: u32,
    span: Span,
}

impl Assembler<'_> {
    fn assemble(&self, stmt: &ExecSqlStatement, config: &RuleConfig) -> Assembly {
        let plan = plan_params(self.tu, self.function, stmt, config.simplify_function_args);
        let mut asm = Assembly::from_plan(plan, self.span);
        match &stmt.clauses {
            Clauses::Prepare { from, .. } => {
                if let Some(var) = root_of(from) {
                    self.prepare(stmt, &var, &mut asm);
                }
            }
            Clauses::LobRead { target, .. } => {
                if let Some(var) = root_of(target) {
                    self.lob_read(&var, &mut asm);
                }
            }
            _ => {}
        }
        asm
    }

    /// Dynamic `PREPARE`: inline the formatting or the literal copy.
    fn prepare(&self, stmt: &ExecSqlStatement, var: &str, asm: &mut Assembly) {
        let formatted = match self.hunter.formatted_prepare(self.function, var, self.line) {
            Ok(found) => found,
            Err(format_err) => {
                trace!(error = %format_err, "no formatted prepare");
                match self.hunter.literal_prepare(self.function, var, self.line) {
                    Ok(found) => {
                        let define = guarded_define(&found.request);
                        let info = found.prepare_var_type.as_ref();
                        asm.params.clear();
                        asm.call_args.clear();
                        asm.exec_sql = stmt.statement();
                        asm.prologue.extend(local_decl(info, var).map(|d| format!("{d};")));
                        asm.prologue.push(copy_into(info, var, &found.request.name));
                        asm.macro_definitions.push(define.clone());
                        asm.extra.extend([
                            ("REQUEST_MACRO", found.request.name.clone()),
                            ("REQUEST_DEFINITION", define),
                            ("PREPARE_VAR", var.to_string()),
                            ("PREPARE_VAR_DECL", local_decl(info, var).unwrap_or_default()),
                        ]);
                    }
                    Err(literal_err) => asm.warnings.push(Diagnostic::warning(
                        codes::LITERAL_NOT_FOUND,
                        format!("request text of '{var}' not recovered: {format_err}; {literal_err}"),
                        self.span,
                    )),
                }
                return;
            }
        };

        let mut params = Vec::new();
        let mut call_args = Vec::new();
        for arg in &formatted.args {
            match &arg.declarator {
                Some(declarator) => {
                    params.push(declarator.clone());
                    call_args.push(arg.expr.clone());
                }
                None => asm.warnings.push(Diagnostic::warning(
                    codes::UNRESOLVED_HOST_VAR,
                    format!("type of format argument '{}' not found", arg.expr),
                    self.span,
                )),
            }
        }
        let buffer = &formatted.buffer;
        let sprintf_args = formatted
            .args
            .iter()
            .map(|a| a.name.as_str())
            .collect::<Vec<_>>()
            .join(", ");
        let sprintf = if sprintf_args.is_empty() {
            format!("sprintf({buffer}, {});", formatted.format.name)
        } else {
            format!("sprintf({buffer}, {}, {sprintf_args});", formatted.format.name)
        };
        let buffer_decl = local_decl(formatted.buffer_type.as_ref(), buffer);
        let var_info = formatted.prepare_var_type.as_ref();

        asm.params = params.join(", ");
        asm.call_args = call_args.join(", ");
        asm.exec_sql = stmt.statement();
        asm.prologue.extend(buffer_decl.as_ref().map(|d| format!("{d};")));
        if var != buffer {
            asm.prologue.extend(local_decl(var_info, var).map(|d| format!("{d};")));
        }
        asm.prologue.push(sprintf);
        if var != buffer {
            asm.prologue.push(copy_into(var_info, var, buffer));
        }
        let define = guarded_define(&formatted.format);
        asm.macro_definitions.push(define.clone());
        asm.extra.extend([
            ("FORMAT_MACRO", formatted.format.name.clone()),
            ("FORMAT_DEFINITION", define),
            ("FORMAT_LITERAL", formatted.format.literal.clone()),
            ("SPRINTF_BUFFER", buffer.clone()),
            ("SPRINTF_BUFFER_DECL", buffer_decl.unwrap_or_default()),
            ("SPRINTF_ARGS", sprintf_args),
            ("PREPARE_VAR", var.to_string()),
            ("PREPARE_VAR_DECL", local_decl(var_info, var).unwrap_or_default()),
        ]);
    }

    /// `LOB READ`: set the target length before reading.
    fn lob_read(&self, target: &str, asm: &mut Assembly) {
        let found = match self.hunter.lob_length(self.function, target, self.line) {
            Ok(found) => found,
            Err(e) => {
                asm.warnings.push(Diagnostic::warning(
                    codes::LITERAL_NOT_FOUND,
                    e.to_string(),
                    self.span,
                ));
                return;
            }
        };
        let definition = found.define.as_ref().map(guarded_define).unwrap_or_default();
        asm.prologue.push(format!("{target}.len = {};", found.expr));
        if !definition.is_empty() {
            asm.macro_definitions.push(definition.clone());
        }
        asm.extra.extend([
            ("LOB_TARGET", target.to_string()),
            ("LOB_LENGTH", found.expr.clone()),
            ("LOB_LENGTH_DEFINITION", definition),
        ]);
    }
}

// ─────────────────────── Orchestrator ───────────────────────

/// Runs the `proc-exec-sql-*` rules over translation units.
#[derive(Debug)]
pub struct ExecSqlRewriter {
    config: ConfigFile,
    rules: BTreeMap<&'static str, RuleConfig>,
    groups: BTreeMap<PathBuf, RequestGroups>,
    /// Configuration problems, reported with the first unit.
    setup: Vec<Diagnostic>,
    snoop: PreprocessorSnoop,
    table: ReplacementTable,
    diagnostics: Vec<Diagnostic>,
}

impl ExecSqlRewriter {
    /// Resolve every rule's configuration and load its request groups.
    pub fn new(config: ConfigFile) -> Self {
        let mut rules = BTreeMap::new();
        let mut groups = BTreeMap::new();
        let mut setup = Vec::new();
        for kind in StatementKind::ALL {
            let rule = kind.rule_name();
            let rule_config = config.rule_config(rule);
            if let Some(path) = &rule_config.request_groups {
                if !groups.contains_key(path) && config.is_enabled(rule) {
                    match RequestGroups::load(path) {
                        Ok(loaded) => {
                            debug!(path = %path.display(), groups = loaded.len(), "loaded request groups");
                            groups.insert(path.clone(), loaded);
                        }
                        Err(e) => {
                            warn!(error = %e, "request grouping disabled");
                            setup.push(
                                Diagnostic::error(codes::CONFIGURATION, e.to_string(), Span::dummy())
                                    .with_suggestion("request grouping is disabled for this run"),
                            );
                            groups.insert(path.clone(), RequestGroups::default());
                        }
                    }
                }
            }
            rules.insert(rule, rule_config);
        }
        Self {
            config,
            rules,
            groups,
            setup,
            snoop: PreprocessorSnoop::new(),
            table: ReplacementTable::new(),
            diagnostics: Vec::new(),
        }
    }

    /// Names of the enabled rules.
    pub fn enabled_rules(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.rules
            .keys()
            .copied()
            .filter(|rule| self.config.is_enabled(rule))
    }

    pub fn rule_config(&self, rule: &str) -> Option<&RuleConfig> {
        self.rules.get(rule)
    }

    /// Reset all per-unit state.
    pub fn on_start_translation_unit(&mut self) {
        self.snoop.clear();
        self.table.clear();
        self.diagnostics = std::mem::take(&mut self.setup);
    }

    pub fn on_macro_expanded(&mut self, expansion: &MacroExpansion, buf: &SourceBuffer) {
        if let Some(diag) = self.snoop.on_macro_expanded(expansion, buf) {
            self.diagnostics.push(diag);
        }
    }

    /// Comment for the block on lines `block_line..=block_end`.
    ///
    /// A downstream verb's comment follows the block opening, so it is only
    /// taken from inside the block. Any other comment is taken from above the
    /// block and must belong to an upstream verb.
    fn recover(
        buf: &SourceBuffer,
        block_line: u32,
        block_end: u32,
        span: Span,
    ) -> Result<(LocatedComment, ExecSqlStatement), Diagnostic> {
        if let Ok(found) = locate_comment(buf, block_line, CommentDirection::Downstream) {
            if (block_line..=block_end).contains(&found.line) {
                if let Ok(stmt) = parse_statement(&found.text) {
                    if stmt.kind.comment_direction() == CommentDirection::Downstream {
                        return Ok((found, stmt));
                    }
                }
            }
        }
        let found = locate_comment(buf, block_line, CommentDirection::Upstream)
            .map_err(|e| Diagnostic::warning(codes::COMMENT_NOT_FOUND, e.to_string(), span))?;
        let stmt = parse_statement(&found.text)
            .map_err(|e| Diagnostic::warning(codes::UNRECOGNIZED_STATEMENT, e.to_string(), span))?;
        if stmt.kind.comment_direction() != CommentDirection::Upstream {
            return Err(Diagnostic::warning(
                codes::COMMENT_NOT_FOUND,
                format!(
                    "no statement comment for the block at line {block_line}: the EXEC SQL {} comment on line {} is emitted inside its own block",
                    stmt.kind, found.line
                ),
                span,
            ));
        }
        Ok((found, stmt))
    }

    /// Handle one matched `sqlstm` block.
    pub fn check(&mut self, tu: &TranslationUnit, buf: &SourceBuffer, block: &SqlstmBlock) {
        let (block_line, block_col) = buf.line_col(block.span.start);
        let (block_end, _) = buf.line_col(block.span.end.saturating_sub(1));
        let location = Location::new(&tu.main_file, block_line, block_col);
        let (comment, stmt) = match Self::recover(buf, block_line, block_end, block.span) {
            Ok(found) => found,
            Err(diag) => {
                self.diagnostics.push(diag.with_location(location));
                return;
            }
        };
        let rule = stmt.kind.rule_name();
        if !self.config.is_enabled(rule) {
            trace!(rule, "rule disabled");
            return;
        }
        let key = occurrence_key(&comment.text, block_line);
        if self.table.get(&key).is_some() {
            trace!(key = %key, "occurrence already handled");
            return;
        }
        let Some(config) = self.rules.get(rule) else {
            return;
        };

        let assembler = Assembler {
            tu,
            hunter: Hunter::new(tu, buf, &self.snoop),
            function: &block.function,
            line: block_line,
            span: block.span,
        };
        let asm = assembler.assemble(&stmt, config);
        self.diagnostics.extend(
            asm.warnings
                .iter()
                .cloned()
                .map(|d| d.with_location(location.clone())),
        );

        let func_name = stmt.function_name();
        let request_name = stmt.request_name();
        let original_file = match &comment.pc_lines {
            Some(pc) => format!("{}:{}", pc.file, pc.start),
            None => tu.main_file.clone(),
        };

        let mut subs = Substitutions::new();
        subs.set("FUNCNAME", func_name.as_str())
            .set("REQNAME", request_name.as_str())
            .set("VERB", stmt.kind.to_string())
            .set("EXECSQL", asm.exec_sql.as_str())
            .set("ORIGINAL_EXECSQL", stmt.statement())
            .set("FULLCOMMENT", comment.text.as_str())
            .set("ORIGINALFILE", original_file.as_str())
            .set("FUNCPARAMS", asm.params.as_str())
            .set("CALLARGS", asm.call_args.as_str())
            .set("HEADER_GUARD", format!("{}_H", func_name.to_uppercase()))
            .set("MACRO_DEFINITIONS", asm.macro_definitions.join("\n"))
            .set(
                "ANONYMOUS_STRUCTS",
                asm.anonymous
                    .iter()
                    .map(AnonymousStruct::declaration)
                    .collect::<Vec<_>>()
                    .join("\n"),
            )
            .set(
                "BODY_PROLOGUE",
                asm.prologue
                    .iter()
                    .map(|l| format!("    {l}"))
                    .collect::<Vec<_>>()
                    .join("\n"),
            );
        for (name, value) in &asm.extra {
            subs.set(name, value.as_str());
        }

        let mut variants = Variants::new();
        for (i, anon) in asm.anonymous.iter().enumerate() {
            variants.insert(
                format!("{i:04}"),
                BTreeMap::from([
                    ("NAME".to_string(), anon.name.clone()),
                    ("TYPE".to_string(), anon.host_name.clone()),
                    ("FIELDS".to_string(), anon.fields.clone()),
                ]),
            );
        }

        let groups = config
            .request_groups
            .as_ref()
            .and_then(|path| self.groups.get(path));
        let request = Request {
            func_name: &func_name,
            request_name: &request_name,
            source_file: &tu.main_file,
            subs,
            variants,
        };
        if let Err(e) = ArtefactWriter::new(config, groups).write(request) {
            warn!(error = %e, func = %func_name, "request not generated");
            self.diagnostics.push(
                Diagnostic::error(codes::GENERATION, e.to_string(), block.span).with_location(location),
            );
            return;
        }

        let rpltcode = format!("{func_name}({});", asm.call_args);
        info!(func = %func_name, line = block_line, "outlined EXEC SQL {}", stmt.kind);
        self.diagnostics.push(
            Diagnostic::warning(
                codes::REWRITE,
                format!("'{}' can be replaced by a call to {func_name}", stmt.statement()),
                block.span,
            )
            .with_location(location)
            .with_suggestion(rpltcode.clone())
            .with_fixit(FixIt::new(block.span, rpltcode.clone())),
        );
        self.table.insert(
            key,
            ReplacementRecord {
                execsql: stmt.statement(),
                fullcomment: comment.text,
                funcname: func_name,
                originalfile: original_file,
                reqname: request_name,
                rpltcode,
                pc: comment.pc_lines.map(|pc| PcLines {
                    filename: pc.file,
                    start: pc.start,
                    end: pc.end,
                }),
                had_cr: comment.had_cr,
                span: block.span,
                rule,
            },
        );
    }

    /// Patch the original files and hand back the unit's diagnostics.
    pub fn on_end_translation_unit(&mut self, tu: &TranslationUnit) -> Vec<Diagnostic> {
        let mut entries = Vec::new();
        for record in self.table.drain() {
            let Some(config) = self.rules.get(record.rule) else {
                continue;
            };
            if !config.report_modification_in_pc {
                continue;
            }
            let options = PatchOptions {
                keep_commented: config.keep_commented_out_exec_sql,
                report_dir: config.report_modification_in_dir.clone(),
            };
            entries.push(PatchEntry { record, options });
        }
        if !entries.is_empty() {
            let report = Patcher::default().run_entries(&tu.main_file, entries);
            self.diagnostics.extend(
                report
                    .warnings
                    .into_iter()
                    .map(|(span, e)| Diagnostic::warning(codes::PATCH, e.to_string(), span)),
            );
        }
        std::mem::take(&mut self.diagnostics)
    }

    /// Run every callback for `tu` in order.
    pub fn run(&mut self, tu: &TranslationUnit) -> Vec<Diagnostic> {
        self.on_start_translation_unit();
        let buf = tu.source();
        for expansion in &tu.macro_expansions {
            self.on_macro_expanded(expansion, &buf);
        }
        for block in &tu.sqlstm_blocks {
            self.check(tu, &buf, block);
        }
        self.on_end_translation_unit(tu)
    }
}
