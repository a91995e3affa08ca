//! Include splicing.
//!
//! Every `#include` entry is replaced, in place, by the entries of the files
//! it names. Included files are parsed with the same grammar and have their
//! own includes resolved first. Files are obtained through a [`Loader`], so
//! path resolution stays outside the compiler.

use std::io;

use indexmap::IndexMap;
use log::{debug, trace};
use thiserror::Error;

use crate::{
    config::CompileConfig,
    error::{CompileError, Diagnostic, DiagnosticCollector, ErrorCode},
    fold::Folder,
    parser_types::{Document, Entry, Include},
    source::SourceMap,
    span::{Span, Spanned},
};

/// Text of a loaded file together with its canonical name.
///
/// The canonical name identifies the file for cycle detection and names it
/// in diagnostics, so two paths reaching the same file must produce the
/// same name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoadedSource {
    pub name: String,
    pub text: String,
}

impl LoadedSource {
    pub fn new(name: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            text: text.into(),
        }
    }
}

/// Failure to load an included file.
#[derive(Debug, Error)]
pub enum LoadError {
    #[error("file `{path}` not found")]
    NotFound { path: String },

    #[error("cannot read `{path}`: {source}")]
    Io {
        path: String,
        #[source]
        source: io::Error,
    },
}

/// Source of included files.
pub trait Loader {
    /// Load `path` as written in an include directive.
    ///
    /// `from` is the canonical name of the including file, so relative paths
    /// can be resolved against it.
    ///
    /// # Errors
    ///
    /// Returns [`LoadError::NotFound`] if nothing exists at `path`, or
    /// [`LoadError::Io`] if it exists but cannot be read.
    fn load(&self, path: &str, from: &str) -> Result<LoadedSource, LoadError>;
}

/// A [`Loader`] serving files from memory, keyed by name.
///
/// Paths are looked up verbatim and double as canonical names.
#[derive(Debug, Clone, Default)]
pub struct MemoryLoader {
    files: IndexMap<String, String>,
}

impl MemoryLoader {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a file, returning the loader for chaining.
    pub fn with_file(mut self, name: impl Into<String>, text: impl Into<String>) -> Self {
        self.insert(name, text);
        self
    }

    /// Add or replace a file.
    pub fn insert(&mut self, name: impl Into<String>, text: impl Into<String>) {
        self.files.insert(name.into(), text.into());
    }
}

impl Loader for MemoryLoader {
    fn load(&self, path: &str, _from: &str) -> Result<LoadedSource, LoadError> {
        self.files
            .get(path)
            .map(|text| LoadedSource::new(path, text.as_str()))
            .ok_or_else(|| LoadError::NotFound {
                path: path.to_string(),
            })
    }
}

/// Folder replacing include entries with the included entries.
struct IncludeResolver<'a, L: ?Sized> {
    sources: &'a mut SourceMap,
    loader: &'a L,
    config: &'a CompileConfig,
    /// Canonical names of the files being resolved, root first
    stack: Vec<String>,
    /// Include directives that led to the current file, outermost first
    sites: Vec<Span>,
    diagnostics: DiagnosticCollector,
}

impl<L: Loader + ?Sized> IncludeResolver<'_, L> {
    /// Emit a diagnostic, pointing back at every include that led here.
    fn emit(&mut self, diagnostic: Diagnostic) {
        let diagnostic = self
            .sites
            .iter()
            .rev()
            .fold(diagnostic, |diag, site| {
                diag.with_secondary_label(*site, "included from here")
            });
        self.diagnostics.emit(diagnostic);
    }

    /// Load, parse and resolve one included file.
    ///
    /// Failures are emitted and splice nothing.
    fn splice(&mut self, path: &Spanned<String>) -> Vec<Entry> {
        if self.stack.len() > self.config.max_include_depth {
            self.emit(
                Diagnostic::error(format!(
                    "include depth limit of {} exceeded",
                    self.config.max_include_depth
                ))
                .with_code(ErrorCode::E202)
                .with_label(path.span(), "included here")
                .with_help("flatten the include hierarchy or raise `max_include_depth`"),
            );
            return Vec::new();
        }

        let from = self.stack.last().cloned().unwrap_or_default();
        let loaded = match self.loader.load(path.inner(), &from) {
            Ok(loaded) => loaded,
            Err(err) => {
                self.emit(
                    Diagnostic::error(format!("cannot include `{}`", path.inner()))
                        .with_code(ErrorCode::E200)
                        .with_label(path.span(), err.to_string()),
                );
                return Vec::new();
            }
        };

        if let Some(position) = self.stack.iter().position(|name| *name == loaded.name) {
            let chain: Vec<&str> = self.stack[position..]
                .iter()
                .map(String::as_str)
                .chain(std::iter::once(loaded.name.as_str()))
                .collect();
            self.emit(
                Diagnostic::error(format!("include cycle: `{}` includes itself", loaded.name))
                    .with_code(ErrorCode::E201)
                    .with_label(path.span(), "cycle closes here")
                    .with_help(format!("include chain: {}", chain.join(" -> "))),
            );
            return Vec::new();
        }

        debug!(file = loaded.name.as_str(), depth = self.stack.len(); "Including file");

        let LoadedSource { name, text } = loaded;
        let file = self.sources.add(name.as_str(), text);
        let parsed =
            crate::parse_with_config(self.sources.file(file).text(), file, self.config);

        self.sites.push(path.span());
        let entries = match parsed {
            Ok(document) => {
                self.stack.push(name);
                let entries = self.fold_entries(document.entries);
                self.stack.pop();
                entries
            }
            Err(err) => {
                for diagnostic in err.into_diagnostics() {
                    self.emit(diagnostic);
                }
                Vec::new()
            }
        };
        self.sites.pop();

        entries
    }
}

impl<L: Loader + ?Sized> Folder for IncludeResolver<'_, L> {
    fn fold_include(&mut self, include: Include) -> Vec<Entry> {
        trace!(files = include.files.len(); "Resolving include directive");
        include
            .files
            .iter()
            .flat_map(|path| self.splice(path))
            .collect()
    }
}

/// Replace every include entry with the entries of the included files.
///
/// Included files are registered in `sources`, so diagnostics raised later
/// can point into them.
///
/// # Errors
///
/// Returns every include failure found: missing or unreadable files (E200),
/// cycles (E201), nesting beyond the configured depth (E202), and lexer or
/// parser errors inside included files.
pub(crate) fn resolve_includes<L: Loader + ?Sized>(
    document: Document,
    sources: &mut SourceMap,
    loader: &L,
    config: &CompileConfig,
) -> Result<Document, CompileError> {
    let root = sources
        .get(document.file)
        .map(|file| file.name().to_string())
        .unwrap_or_default();

    let mut resolver = IncludeResolver {
        sources,
        loader,
        config,
        stack: vec![root],
        sites: Vec::new(),
        diagnostics: DiagnosticCollector::new(),
    };
    let document = resolver.fold_document(document);

    resolver.diagnostics.finish()?;
    Ok(document)
}
