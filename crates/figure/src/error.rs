//! Error types for Figure operations.
//!
//! This module provides the main error type [`FigureError`] which wraps the
//! error conditions that can occur while compiling a document.

use std::io;

use thiserror::Error;

use figure_parser::{CompileError, SourceMap};

/// The main error type for Figure operations.
///
/// # Diagnostic Variants
///
/// The `Compile` variant carries the diagnostics together with the
/// [`SourceMap`] of every file read during the compile, so each label can
/// be rendered against the file it points into.
#[derive(Debug, Error)]
pub enum FigureError {
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    #[error("{err}")]
    Compile { err: CompileError, sources: SourceMap },

    #[error("Serialization error: {0}")]
    Serialize(#[from] serde_json::Error),

    #[error("Configuration error: {0}")]
    Config(String),
}

impl FigureError {
    /// Create a new `Compile` error with the files it refers to.
    pub fn new_compile_error(err: CompileError, sources: SourceMap) -> Self {
        Self::Compile { err, sources }
    }
}
