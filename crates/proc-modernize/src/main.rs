//! proc-modernize - outline Pro*C EXEC SQL statements into request functions.
//!
//! Reads a translation-unit fact dump produced from the Pro*C pre-processor
//! output, reports each rewritable `sqlstm` block, generates the request
//! header and source, and optionally applies the call fix-its.

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use proc_modernize_lib::commands;
use proc_modernize_lib::output::OutputFormat;

/// Pro*C EXEC SQL modernization.
#[derive(Parser, Debug)]
#[command(name = "proc-modernize", author, version, about, long_about = None)]
struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Run the EXEC SQL rules on a translation unit
    Run {
        /// Translation-unit fact dump (JSON)
        unit: PathBuf,

        /// Rule configuration file (TOML)
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// Write the fix-its back to the unit's main file
        #[arg(long)]
        fix: bool,

        /// Output format
        #[arg(long, value_enum, default_value_t = OutputFormat::Text)]
        format: OutputFormat,
    },

    /// List the rules and whether the configuration enables them
    Rules {
        /// Rule configuration file (TOML)
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// Output format
        #[arg(long, value_enum, default_value_t = OutputFormat::Text)]
        format: OutputFormat,
    },
}

fn main() -> miette::Result<()> {
    let cli = Cli::parse();

    let filter = if cli.verbose { "debug" } else { "warn" };
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter)))
        .with_writer(std::io::stderr)
        .init();

    match cli.command {
        Commands::Run {
            unit,
            config,
            fix,
            format,
        } => commands::run::run(unit, config, fix, format),
        Commands::Rules { config, format } => commands::rules::run(config, format),
    }
}
