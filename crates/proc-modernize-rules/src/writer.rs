//! # Artefact writer
//!
//! Writes the header and source generated for one request:
//! `<generation-dir>/<funcName>.h` and `<generation-dir>/<funcName>.pc`,
//! where `%B` in the directory stands for the stem of the unit's file.

use std::path::{Path, PathBuf};

use tracing::{debug, info};

use crate::config::RuleConfig;
use crate::groups::RequestGroups;
use crate::template::{render, render_file, Substitutions, TemplateError, Variants};

/// Built-in header template.
pub const HEADER_TEMPLATE: &str = include_str!("../templates/exec-sql.h.tmpl");
/// Built-in source template.
pub const SOURCE_TEMPLATE: &str = include_str!("../templates/exec-sql.pc.tmpl");

// ─────────────────────── Errors ───────────────────────

/// Artefact writer errors. Each one names the offending path.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error, miette::Diagnostic)]
pub enum WriterError {
    #[error("cannot create generation directory {path}: {message}")]
    CreateDir { path: PathBuf, message: String },

    #[error("{path} already exists")]
    #[diagnostic(help("set Generate-requests-allow-overwrite to replace generated files"))]
    AlreadyExists { path: PathBuf },

    #[error(transparent)]
    #[diagnostic(transparent)]
    Template(#[from] TemplateError),

    #[error("cannot write {path}: {message}")]
    Write { path: PathBuf, message: String },
}

/// Stem of a file name: `src/emp.c` gives `emp`.
pub fn source_stem(file: &str) -> String {
    Path::new(file)
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default()
}

/// Replace every `%B` in `base` with the stem of `source_file`.
pub fn expand_base(base: &str, source_file: &str) -> PathBuf {
    PathBuf::from(base.replace("%B", &source_stem(source_file)))
}

fn create_dir(path: &Path) -> Result<(), WriterError> {
    let mut builder = std::fs::DirBuilder::new();
    builder.recursive(true);
    #[cfg(unix)]
    {
        use std::os::unix::fs::DirBuilderExt;
        builder.mode(0o755);
    }
    builder.create(path).map_err(|e| WriterError::CreateDir {
        path: path.to_path_buf(),
        message: e.to_string(),
    })
}

/// What to generate for one request.
#[derive(Debug, Clone)]
pub struct Request<'a> {
    pub func_name: &'a str,
    pub request_name: &'a str,
    pub source_file: &'a str,
    pub subs: Substitutions,
    pub variants: Variants,
}

/// Paths written for one request.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Written {
    pub header: Option<PathBuf>,
    pub source: Option<PathBuf>,
}

/// Renders and writes request artefacts according to a rule's configuration.
#[derive(Debug, Clone, Copy)]
pub struct ArtefactWriter<'a> {
    config: &'a RuleConfig,
    groups: Option<&'a RequestGroups>,
}

impl<'a> ArtefactWriter<'a> {
    pub fn new(config: &'a RuleConfig, groups: Option<&'a RequestGroups>) -> Self {
        Self { config, groups }
    }

    pub fn group_of(&self, request_name: &str) -> Option<&'a str> {
        self.groups.and_then(|g| g.group_of(request_name))
    }

    /// `<dir>/<group>/<file>` when it exists, else the configured template.
    fn select_template(configured: &Path, group: Option<&str>) -> PathBuf {
        if let (Some(group), Some(file)) = (group, configured.file_name()) {
            let dir = configured.parent().unwrap_or_else(|| Path::new(""));
            let grouped = dir.join(group).join(file);
            if grouped.is_file() {
                return grouped;
            }
        }
        configured.to_path_buf()
    }

    fn render_one(
        &self,
        configured: Option<&Path>,
        builtin: &str,
        group: Option<&str>,
        req: &Request<'_>,
    ) -> Result<String, TemplateError> {
        match configured {
            Some(path) => {
                let path = Self::select_template(path, group);
                debug!(template = %path.display(), "rendering template");
                render_file(&path, &req.subs, &req.variants)
            }
            None => render(builtin, &req.subs, &req.variants),
        }
    }

    /// Render both artefacts, then write them.
    ///
    /// Nothing is written when any check or rendering fails.
    pub fn write(&self, mut req: Request<'_>) -> Result<Written, WriterError> {
        let group = self.group_of(req.request_name);
        req.subs.set("REQUEST_GROUP", group.unwrap_or(""));

        let dir = expand_base(&self.config.generation_directory, req.source_file);
        let mut pending: Vec<(PathBuf, String)> = Vec::new();
        let mut written = Written::default();

        if self.config.generate_headers {
            let path = dir.join(format!("{}.h", req.func_name));
            self.check_overwrite(&path)?;
            let text = self.render_one(
                self.config.header_template.as_deref(),
                HEADER_TEMPLATE,
                group,
                &req,
            )?;
            written.header = Some(path.clone());
            pending.push((path, text));
        }
        if self.config.generate_sources {
            let path = dir.join(format!("{}.pc", req.func_name));
            self.check_overwrite(&path)?;
            let text = self.render_one(
                self.config.source_template.as_deref(),
                SOURCE_TEMPLATE,
                group,
                &req,
            )?;
            written.source = Some(path.clone());
            pending.push((path, text));
        }
        if pending.is_empty() {
            return Ok(written);
        }

        create_dir(&dir)?;
        for (path, text) in pending {
            std::fs::write(&path, text).map_err(|e| WriterError::Write {
                path: path.clone(),
                message: e.to_string(),
            })?;
            info!(path = %path.display(), "generated request artefact");
        }
        Ok(written)
    }

    fn check_overwrite(&self, path: &Path) -> Result<(), WriterError> {
        if path.exists() && !self.config.allow_overwrite {
            return Err(WriterError::AlreadyExists {
                path: path.to_path_buf(),
            });
        }
        Ok(())
    }
}
