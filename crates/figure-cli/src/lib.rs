//! CLI logic for the Figure configuration compiler.
//!
//! This module contains the core CLI logic: load configuration, compile the
//! input file, and write the resulting JSON.

pub mod error_adapter;

mod args;
mod config;

pub use args::Args;

use std::{
    fs,
    io::{self, Write},
};

use log::info;

use figure::{Compiler, FigureError, config::OutputConfig};

/// Run the Figure CLI application
///
/// This function compiles the input file and writes the resulting JSON to
/// the output file, or to stdout when no output file is given.
///
/// # Arguments
///
/// * `args` - Command-line arguments
///
/// # Errors
///
/// Returns `FigureError` for:
/// - File I/O errors
/// - Configuration loading errors
/// - Compile errors
/// - Serialization errors
pub fn run(args: &Args) -> Result<(), FigureError> {
    info!(
        input_path = args.input,
        output_path:? = args.output;
        "Compiling configuration"
    );

    // Load configuration
    let mut app_config = config::load_config(args.config.as_ref())?;
    if args.compact {
        app_config = app_config.with_output(OutputConfig::new(false));
    }

    // Compile and serialize
    let compiler = Compiler::new(app_config);
    let tree = compiler.compile_file(&args.input)?;
    let json = compiler.to_json(&tree)?;

    // Write output
    match &args.output {
        Some(path) => {
            fs::write(path, json)?;
            info!(output_file = path; "JSON written successfully");
        }
        None => {
            let mut stdout = io::stdout().lock();
            writeln!(stdout, "{json}")?;
        }
    }

    Ok(())
}
