#![forbid(unsafe_code)]
//! Pro*C EXEC SQL refactoring rules.
//!
//! This crate turns the blocks the Pro*C pre-processor emits for
//! `EXEC SQL ...;` statements into calls to outlined request functions:
//!
//! - **Recovery**: the statement comment next to each block is located
//!   ([`locator`]) and classified ([`statement`]); host-variable lists are
//!   decoded ([`hostvar`]) and resolved against the unit ([`symbols`]).
//! - **Generation**: a parameter plan ([`params`]), dynamic request bodies
//!   ([`hunter`], fed by [`snoop`]) and templates ([`template`]) produce a
//!   header and a source per request ([`writer`]).
//! - **Rewrite**: a fix-it replaces the block with the call, and the
//!   original `.pc` file is patched at the end of the unit ([`patcher`]).
//!
//! [`ExecSqlRewriter`] ties these together. The host AST is consumed as a
//! [`TranslationUnit`] fact model.

pub mod config;
pub mod groups;
pub mod host;
pub mod hostvar;
pub mod hunter;
pub mod locator;
pub mod params;
pub mod patcher;
pub mod replacement;
pub mod rewriter;
pub mod snoop;
pub mod statement;
pub mod symbols;
pub mod template;
pub mod writer;

/// Diagnostic codes emitted by the rules.
pub mod codes {
    /// Block can be replaced by a request call; carries the fix-it.
    pub const REWRITE: &str = "PROC-W100";
    pub const COMMENT_NOT_FOUND: &str = "PROC-W101";
    pub const UNRECOGNIZED_STATEMENT: &str = "PROC-W102";
    pub const UNRESOLVED_HOST_VAR: &str = "PROC-W103";
    /// Dynamic request text or LOB length not recovered.
    pub const LITERAL_NOT_FOUND: &str = "PROC-W104";
    pub const PATCH: &str = "PROC-W105";
    pub const GENERATION: &str = "PROC-E001";
    pub const UNSUPPORTED_CHARSET: &str = "PROC-E002";
    pub const CONFIGURATION: &str = "PROC-E003";
}

pub use config::{ConfigError, ConfigFile, OptionValue, RuleConfig};
pub use groups::{GroupsError, RequestGroups};
pub use host::{MacroExpansion, SqlstmBlock, TranslationUnit};
pub use patcher::{PatchEntry, PatchError, PatchOptions, PatchReport, Patcher};
pub use rewriter::ExecSqlRewriter;
pub use statement::{parse_statement, ExecSqlStatement, StatementError, StatementKind};
pub use writer::WriterError;
