//! Error and diagnostic system for the Figure compiler.
//!
//! This module provides an error handling system with:
//! - Error codes for documentation and searchability
//! - Multiple labeled spans for rich error context
//! - Diagnostic collector for accumulating multiple errors
//!
//! # Overview
//!
//! The error system is built around the [`Diagnostic`] type, which represents
//! a single error with an optional error code, multiple source locations, and
//! help text. One or more diagnostics are wrapped in [`CompileError`] for
//! returning from the compile pipeline.
//!
//! # Example
//!
//! ```
//! # use figure_parser::{Diagnostic, ErrorCode};
//! # use figure_parser::{SourceMap, Span};
//! let mut sources = SourceMap::new();
//! let file = sources.add("main.fig", "port: base.port");
//!
//! let diag = Diagnostic::error("reference `base.port` is not defined")
//!     .with_code(ErrorCode::E400)
//!     .with_label(Span::new(file, 6..15), "not found")
//!     .with_help("define `base.port` before this field");
//! ```

mod collector;
mod compile_error;
mod diagnostic;
mod error_code;
mod label;

pub(crate) use collector::DiagnosticCollector;

pub use compile_error::CompileError;
pub use diagnostic::Diagnostic;
pub use error_code::ErrorCode;
pub use label::Label;
