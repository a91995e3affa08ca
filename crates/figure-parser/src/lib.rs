//! # Figure Parser
//!
//! Parser and compiler passes for the Figure configuration language. This
//! crate turns source text into a [`figure_core::Tree`].
//!
//! Compiling is split in two steps. [`parse`] reads one file into a
//! [`Document`]; [`compile`] splices includes, expands sections, flattens
//! dotted keys and resolves references into the final tree.
//!
//! ## Usage
//!
//! ```
//! # use figure_parser::{compile, parse, CompileConfig, CompileError, MemoryLoader, SourceMap};
//!
//! fn main() -> Result<(), CompileError> {
//!     let loader = MemoryLoader::new().with_file("base.fig", "port: 80");
//!     let source = r#"
//!         #include "base.fig"
//!         [server.%{dev,prod}]
//!         host: "localhost"
//!         port: port
//!     "#;
//!
//!     let mut sources = SourceMap::new();
//!     let file = sources.add("main.fig", source);
//!     let document = parse(source, file)?;
//!     let tree = compile(document, &mut sources, &loader, &CompileConfig::default())?;
//!
//!     assert_eq!(tree.get_path("server.prod.port").and_then(|v| v.as_integer()), Some(80));
//!     Ok(())
//! }
//! ```

mod config;
mod error;
mod expand;
mod flatten;
mod fold;
mod include;
mod lexer;
mod merge;
mod parser;
mod parser_types;
mod resolve;
mod source;
mod span;
mod text;
mod tokens;

pub use config::{
    CompileConfig, DEFAULT_MAX_EXPANSIONS, DEFAULT_MAX_INCLUDE_DEPTH, DEFAULT_MAX_NESTING_DEPTH,
};
pub use error::{CompileError, Diagnostic, ErrorCode, Label};
pub use include::{LoadError, LoadedSource, Loader, MemoryLoader};
pub use parser_types::{
    Document, Entry, Field, Include, Section, SectionChild, SectionRoot, Segment, Value,
    WILDCARD_KEY,
};
pub use source::{FileId, Location, SourceFile, SourceMap};
pub use span::{Span, Spanned};

use figure_core::Tree;
use log::debug;

/// Parse the text of one file into a document.
///
/// Includes and sections are kept as written; see [`compile`] for the
/// passes that remove them.
///
/// # Arguments
///
/// * `source` - The Figure source text
/// * `file` - The id `source` is registered under, stamped on every span
///
/// # Errors
///
/// Returns every lexer error in the file, or the first parser error.
pub fn parse(source: &str, file: FileId) -> Result<Document, CompileError> {
    parse_with_config(source, file, &CompileConfig::default())
}

/// Parse the text of one file, rejecting input nested deeper than
/// `config.max_nesting_depth` (E103).
///
/// # Errors
///
/// Returns every lexer error in the file, or the first parser error.
pub fn parse_with_config(
    source: &str,
    file: FileId,
    config: &CompileConfig,
) -> Result<Document, CompileError> {
    // Step 1: Tokenize
    let tokens = lexer::tokenize(source, file)?;

    // Step 2: Parse
    let document = parser::build_document(&tokens, file, config.max_nesting_depth)?;

    debug!(entries = document.entries.len(); "Parsed document");
    Ok(document)
}

/// Compile a parsed document into a tree.
///
/// It runs the semantic pipeline in order:
///
/// 1. **Include** - Splice included files in place, loaded through `loader`
/// 2. **Expand** - Replace sections with one field per expanded path
/// 3. **Flatten** - Nest dotted keys and turn index-keyed maps into lists
/// 4. **Resolve** - Apply fields in order, resolving references and merging
///
/// Included files are registered in `sources`, which then names every file
/// a returned diagnostic can point into.
///
/// # Errors
///
/// Include and expansion failures are collected and reported together;
/// resolution stops at the first error.
pub fn compile<L: Loader + ?Sized>(
    document: Document,
    sources: &mut SourceMap,
    loader: &L,
    config: &CompileConfig,
) -> Result<Tree, CompileError> {
    // Step 1: Include
    let document = include::resolve_includes(document, sources, loader, config)?;
    debug!(entries = document.entries.len(), files = sources.len(); "Resolved includes");

    // Step 2: Expand
    let document = expand::expand_sections(document, config)?;

    // Step 3: Flatten
    let document = flatten::flatten(document);

    // Step 4: Resolve
    Ok(resolve::resolve(&document)?)
}
