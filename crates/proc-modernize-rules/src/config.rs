//! Rule configuration.
//!
//! Options come from a TOML file holding an enabled-rule list and a flat
//! key/value bag:
//!
//! ```toml
//! Checks = ["proc-exec-sql-*"]
//!
//! [CheckOptions]
//! "Generation-directory" = "generated/%B"
//! "proc-exec-sql-fetch.Generation-simplify-function-args" = true
//! ```
//!
//! A rule-scoped key (`<rule>.<Key>`) wins over the global one.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

/// Configuration loading errors.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error, miette::Diagnostic)]
pub enum ConfigError {
    #[error("cannot read configuration {path}: {message}")]
    Io { path: PathBuf, message: String },

    #[error("cannot parse configuration {path}: {message}")]
    #[diagnostic(help("options live under a [CheckOptions] table as \"Key\" = value"))]
    Parse { path: PathBuf, message: String },
}

/// A value in the options bag.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum OptionValue {
    Bool(bool),
    Int(i64),
    Str(String),
}

impl OptionValue {
    /// `true`, non-zero integers, and the strings `1`, `true`, `yes`, `on`.
    pub fn as_bool(&self) -> bool {
        match self {
            OptionValue::Bool(b) => *b,
            OptionValue::Int(i) => *i != 0,
            OptionValue::Str(s) => matches!(
                s.trim().to_ascii_lowercase().as_str(),
                "1" | "true" | "yes" | "on"
            ),
        }
    }

    pub fn as_string(&self) -> String {
        match self {
            OptionValue::Bool(b) => b.to_string(),
            OptionValue::Int(i) => i.to_string(),
            OptionValue::Str(s) => s.clone(),
        }
    }
}

/// Contents of a configuration file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ConfigFile {
    /// Enabled rule names; an entry ending in `*` is a prefix glob.
    #[serde(rename = "Checks")]
    pub checks: Vec<String>,
    #[serde(rename = "CheckOptions")]
    pub check_options: BTreeMap<String, OptionValue>,
}

impl Default for ConfigFile {
    fn default() -> Self {
        Self {
            checks: vec!["proc-exec-sql-*".to_string()],
            check_options: BTreeMap::new(),
        }
    }
}

impl ConfigFile {
    pub fn load_from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::Io {
            path: path.to_path_buf(),
            message: e.to_string(),
        })?;
        toml::from_str(&content).map_err(|e| ConfigError::Parse {
            path: path.to_path_buf(),
            message: e.to_string(),
        })
    }

    pub fn is_enabled(&self, rule: &str) -> bool {
        self.checks.iter().any(|pattern| match pattern.strip_suffix('*') {
            Some(prefix) => rule.starts_with(prefix),
            None => pattern == rule,
        })
    }

    /// Look `key` up for `rule`, rule-scoped first.
    pub fn option(&self, rule: &str, key: &str) -> Option<&OptionValue> {
        self.check_options
            .get(&format!("{rule}.{key}"))
            .or_else(|| self.check_options.get(key))
    }

    /// The resolved configuration of one rule.
    pub fn rule_config(&self, rule: &str) -> RuleConfig {
        let defaults = RuleConfig::default();
        let flag = |key: &str, default: bool| {
            self.option(rule, key).map_or(default, OptionValue::as_bool)
        };
        let path = |key: &str| {
            self.option(rule, key)
                .map(OptionValue::as_string)
                .filter(|s| !s.trim().is_empty())
                .map(PathBuf::from)
        };
        RuleConfig {
            generate_headers: flag(keys::GENERATE_HEADERS, defaults.generate_headers),
            generate_sources: flag(keys::GENERATE_SOURCES, defaults.generate_sources),
            allow_overwrite: flag(keys::ALLOW_OVERWRITE, defaults.allow_overwrite),
            generation_directory: self
                .option(rule, keys::GENERATION_DIRECTORY)
                .map(OptionValue::as_string)
                .unwrap_or(defaults.generation_directory),
            header_template: path(keys::HEADER_TEMPLATE),
            source_template: path(keys::SOURCE_TEMPLATE),
            request_groups: path(keys::REQUEST_GROUPS),
            simplify_function_args: flag(keys::SIMPLIFY_FUNCTION_ARGS, defaults.simplify_function_args),
            report_modification_in_pc: flag(
                keys::REPORT_MODIFICATION_IN_PC,
                defaults.report_modification_in_pc,
            ),
            report_modification_in_dir: path(keys::REPORT_MODIFICATION_IN_DIR),
            keep_commented_out_exec_sql: flag(
                keys::KEEP_COMMENTED_OUT_EXEC_SQL,
                defaults.keep_commented_out_exec_sql,
            ),
        }
    }
}

/// Recognized option keys.
pub mod keys {
    pub const GENERATE_HEADERS: &str = "Generate-requests-headers";
    pub const GENERATE_SOURCES: &str = "Generate-requests-sources";
    pub const ALLOW_OVERWRITE: &str = "Generate-requests-allow-overwrite";
    pub const GENERATION_DIRECTORY: &str = "Generation-directory";
    pub const HEADER_TEMPLATE: &str = "Generation-header-template";
    pub const SOURCE_TEMPLATE: &str = "Generation-source-template";
    pub const REQUEST_GROUPS: &str = "Generation-request-groups";
    pub const SIMPLIFY_FUNCTION_ARGS: &str = "Generation-simplify-function-args";
    pub const REPORT_MODIFICATION_IN_PC: &str = "Generation-do-report-modification-in-PC";
    pub const REPORT_MODIFICATION_IN_DIR: &str = "Generation-report-modification-in-dir";
    pub const KEEP_COMMENTED_OUT_EXEC_SQL: &str = "Generation-keep-commented-out-exec-sql-in-PC";
}

/// Immutable per-rule configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RuleConfig {
    pub generate_headers: bool,
    pub generate_sources: bool,
    pub allow_overwrite: bool,
    /// May contain `%B`, replaced by the source-file stem.
    pub generation_directory: String,
    /// `None` selects the built-in template.
    pub header_template: Option<PathBuf>,
    pub source_template: Option<PathBuf>,
    pub request_groups: Option<PathBuf>,
    pub simplify_function_args: bool,
    pub report_modification_in_pc: bool,
    pub report_modification_in_dir: Option<PathBuf>,
    pub keep_commented_out_exec_sql: bool,
}

impl Default for RuleConfig {
    fn default() -> Self {
        Self {
            generate_headers: true,
            generate_sources: true,
            allow_overwrite: false,
            generation_directory: "generated/%B".to_string(),
            header_template: None,
            source_template: None,
            request_groups: None,
            simplify_function_args: false,
            report_modification_in_pc: false,
            report_modification_in_dir: None,
            keep_commented_out_exec_sql: false,
        }
    }
}
