//! Command-line argument definitions for the sitespec CLI.
//!
//! This module defines the [`Args`] structure parsed from the command line
//! using [`clap`]. Arguments control input/output paths, the dump format,
//! configuration file selection, and logging verbosity.

use clap::Parser;

/// Command-line arguments for the sitespec tool
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Args {
    /// Path to the root site spec file
    #[arg(help = "Path to the input .api file")]
    pub input: String,

    /// Path to the output file; the dump goes to stdout when omitted
    #[arg(short, long)]
    pub output: Option<String>,

    /// Dump format (text, json); overrides the configuration file
    #[arg(short, long)]
    pub format: Option<String>,

    /// Dump the syntax tree instead of the IR
    #[arg(long)]
    pub ast: bool,

    /// Path to configuration file (TOML)
    #[arg(short, long)]
    pub config: Option<String>,

    /// Log level (off, error, warn, info, debug, trace)
    #[arg(long, default_value = "info")]
    pub log_level: String,
}
