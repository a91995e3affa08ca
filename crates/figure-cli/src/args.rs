//! Command-line argument definitions for the Figure CLI.
//!
//! This module defines the [`Args`] structure parsed from the command line
//! using [`clap`]. Arguments control input/output paths, configuration file
//! selection, output formatting, and logging verbosity.

use clap::Parser;

/// Command-line arguments for the Figure compiler
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Args {
    /// Path to the input Figure file
    #[arg(help = "Path to the input file")]
    pub input: String,

    /// Path to the output JSON file (stdout when omitted)
    #[arg(short, long)]
    pub output: Option<String>,

    /// Path to configuration file (TOML)
    #[arg(short, long)]
    pub config: Option<String>,

    /// Log level (off, error, warn, info, debug, trace)
    #[arg(long, default_value = "info")]
    pub log_level: String,

    /// Write compact JSON instead of pretty-printing it
    #[arg(long)]
    pub compact: bool,
}
