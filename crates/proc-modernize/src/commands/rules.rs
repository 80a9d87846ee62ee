//! Rules command implementation - list the rules and whether they are enabled.

use std::path::PathBuf;

use miette::Result;
use proc_modernize_rules::StatementKind;

use crate::commands::run::load_config;
use crate::output::{print_json, OutputFormat, RuleEntry, RulesOutput};

pub fn run(config: Option<PathBuf>, format: OutputFormat) -> Result<()> {
    let config = load_config(config.as_deref())?;

    let rules: Vec<RuleEntry> = StatementKind::ALL
        .iter()
        .map(|kind| RuleEntry {
            name: kind.rule_name().to_string(),
            verb: kind.to_string(),
            enabled: config.is_enabled(kind.rule_name()),
        })
        .collect();

    if format.is_json() {
        print_json(&RulesOutput { rules });
    } else {
        for rule in &rules {
            let mark = if rule.enabled { "✓" } else { " " };
            println!("{} {:<36} EXEC SQL {}", mark, rule.name, rule.verb);
        }
    }
    Ok(())
}
