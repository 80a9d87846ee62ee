//! Run command implementation - apply the EXEC SQL rules to one translation unit.

use std::path::{Path, PathBuf};

use miette::{IntoDiagnostic, Result, WrapErr};
use proc_modernize_core::{apply_fixits, Diagnostic, FixIt};
use proc_modernize_rules::{ConfigFile, ExecSqlRewriter, TranslationUnit};

use crate::output::{print_json, DiagnosticEntry, DiagnosticSummary, OutputFormat, RunOutput};

/// Load the configuration file, or the default rule set when none is given.
pub fn load_config(config: Option<&Path>) -> Result<ConfigFile> {
    match config {
        Some(path) => {
            tracing::debug!("Loading configuration {}", path.display());
            Ok(ConfigFile::load_from_file(path)?)
        }
        None => Ok(ConfigFile::default()),
    }
}

/// Run the rules over a translation-unit fact dump.
pub fn run(unit: PathBuf, config: Option<PathBuf>, fix: bool, format: OutputFormat) -> Result<()> {
    let json = std::fs::read_to_string(&unit)
        .into_diagnostic()
        .wrap_err_with(|| format!("Failed to read translation unit: {}", unit.display()))?;
    let tu = TranslationUnit::from_json(&json)
        .into_diagnostic()
        .wrap_err_with(|| format!("Failed to parse translation unit: {}", unit.display()))?;

    let config = load_config(config.as_deref())?;

    tracing::info!("Running rules on {}", tu.main_file);

    let mut rewriter = ExecSqlRewriter::new(config);
    let diagnostics = rewriter.run(&tu);

    let fixed = if fix { write_fixits(&tu, &diagnostics)? } else { false };

    let summary = DiagnosticSummary::of(&diagnostics);
    let failed = summary.errors > 0;

    if format.is_json() {
        let output = RunOutput {
            status: if failed { "error" } else { "success" }.to_string(),
            unit: unit.display().to_string(),
            diagnostics: diagnostics.iter().map(DiagnosticEntry::from).collect(),
            summary: summary.clone(),
            fixed,
        };
        print_json(&output);
    } else {
        for diag in &diagnostics {
            println!("{}", diag);
        }
        println!(
            "{} error(s), {} warning(s), {} rewrite(s)",
            summary.errors, summary.warnings, summary.rewrites
        );
        if fixed {
            println!("Fix-its written to {}", tu.main_file);
        }
    }

    if failed {
        return Err(miette::miette!(
            "{} error(s) reported for {}",
            summary.errors,
            tu.main_file
        ));
    }
    Ok(())
}

/// Apply every fix-it to the unit's buffer and write it to the main file.
///
/// Returns `false` when there was nothing to apply.
fn write_fixits(tu: &TranslationUnit, diagnostics: &[Diagnostic]) -> Result<bool> {
    let fixits: Vec<FixIt> = diagnostics
        .iter()
        .flat_map(|d| d.fixits.iter().cloned())
        .collect();
    if fixits.is_empty() {
        return Ok(false);
    }
    let fixed = apply_fixits(&tu.buffer, &fixits)
        .into_diagnostic()
        .wrap_err("Failed to apply fix-its")?;
    std::fs::write(&tu.main_file, fixed)
        .into_diagnostic()
        .wrap_err_with(|| format!("Failed to write {}", tu.main_file))?;
    tracing::info!("Applied {} fix-it(s) to {}", fixits.len(), tu.main_file);
    Ok(true)
}
