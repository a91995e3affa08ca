//! Error adapter for converting FigureError to miette diagnostics.
//!
//! This module provides the bridge between the library's standard error types
//! and miette's rich diagnostic formatting used in the CLI.
//!
//! # Multi-Error Support
//!
//! When a [`figure_parser::CompileError`] contains multiple diagnostics, each
//! diagnostic is rendered independently.
//!
//! # Multi-File Support
//!
//! A diagnostic is rendered against the file holding its primary label.
//! Labels pointing into other files, such as the include directive a file
//! was reached through, are rendered as related notes against their own
//! file.

use std::fmt;

use miette::{
    Diagnostic as MietteDiagnostic, LabeledSpan, NamedSource, Severity, SourceSpan,
};

use figure::FigureError;
use figure_parser::{Diagnostic, FileId, Label, SourceMap, Span};

/// Adapter for a single figure diagnostic.
///
/// This adapter wraps a single [`Diagnostic`] and implements
/// [`MietteDiagnostic`] to enable rich error formatting in the CLI.
pub struct DiagnosticAdapter<'a> {
    /// The wrapped diagnostic
    diag: &'a Diagnostic,
    /// File of the primary label, if known
    file: Option<FileId>,
    /// Source of `file` for displaying snippets
    source: Option<NamedSource<String>>,
    /// Labels pointing outside `file`
    notes: Vec<LabelNote<'a>>,
}

impl<'a> DiagnosticAdapter<'a> {
    /// Create a new diagnostic adapter.
    pub fn new(diag: &'a Diagnostic, sources: &SourceMap) -> Self {
        let file = diag.primary_span().map(|span| span.file());
        let source = file.and_then(|file| named_source(sources, file));

        let notes = diag
            .labels()
            .iter()
            .filter(|label| Some(label.span().file()) != file)
            .map(|label| LabelNote {
                label,
                source: named_source(sources, label.span().file()),
            })
            .collect();

        Self {
            diag,
            file,
            source,
            notes,
        }
    }
}

impl fmt::Debug for DiagnosticAdapter<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DiagnosticAdapter")
            .field("diag", &self.diag)
            .field("file", &self.file)
            .finish()
    }
}

impl fmt::Display for DiagnosticAdapter<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.diag.message())
    }
}

impl std::error::Error for DiagnosticAdapter<'_> {}

impl MietteDiagnostic for DiagnosticAdapter<'_> {
    fn code<'a>(&'a self) -> Option<Box<dyn fmt::Display + 'a>> {
        self.diag
            .code()
            .map(|c| Box::new(c) as Box<dyn fmt::Display>)
    }

    fn help<'a>(&'a self) -> Option<Box<dyn fmt::Display + 'a>> {
        self.diag
            .help()
            .map(|h| Box::new(h) as Box<dyn fmt::Display>)
    }

    fn source_code(&self) -> Option<&dyn miette::SourceCode> {
        self.source
            .as_ref()
            .map(|source| source as &dyn miette::SourceCode)
    }

    fn labels(&self) -> Option<Box<dyn Iterator<Item = LabeledSpan> + '_>> {
        let file = self.file?;

        Some(Box::new(
            self.diag
                .labels()
                .iter()
                .filter(move |label| label.span().file() == file)
                .map(to_labeled_span),
        ))
    }

    fn related<'a>(&'a self) -> Option<Box<dyn Iterator<Item = &'a dyn MietteDiagnostic> + 'a>> {
        if self.notes.is_empty() {
            return None;
        }
        Some(Box::new(
            self.notes.iter().map(|note| note as &dyn MietteDiagnostic),
        ))
    }
}

/// A label rendered against a file other than its diagnostic's.
struct LabelNote<'a> {
    label: &'a Label,
    source: Option<NamedSource<String>>,
}

impl fmt::Debug for LabelNote<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LabelNote")
            .field("label", &self.label)
            .finish()
    }
}

impl fmt::Display for LabelNote<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.label.message())
    }
}

impl std::error::Error for LabelNote<'_> {}

impl MietteDiagnostic for LabelNote<'_> {
    fn severity(&self) -> Option<Severity> {
        Some(Severity::Advice)
    }

    fn source_code(&self) -> Option<&dyn miette::SourceCode> {
        self.source
            .as_ref()
            .map(|source| source as &dyn miette::SourceCode)
    }

    fn labels(&self) -> Option<Box<dyn Iterator<Item = LabeledSpan> + '_>> {
        self.source.as_ref()?;
        Some(Box::new(std::iter::once(to_labeled_span(self.label))))
    }
}

/// Adapter for non-diagnostic [`FigureError`] variants.
///
/// This adapter handles errors that don't have rich diagnostic information,
/// such as I/O, serialization and configuration errors.
pub struct ErrorAdapter<'a>(pub &'a FigureError);

impl fmt::Debug for ErrorAdapter<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(&self.0, f)
    }
}

impl fmt::Display for ErrorAdapter<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.0, f)
    }
}

impl std::error::Error for ErrorAdapter<'_> {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        self.0.source()
    }
}

impl MietteDiagnostic for ErrorAdapter<'_> {
    fn code<'a>(&'a self) -> Option<Box<dyn fmt::Display + 'a>> {
        let code = match &self.0 {
            FigureError::Io(_) => "figure::io",
            FigureError::Compile { .. } => return None,
            FigureError::Serialize(_) => "figure::serialize",
            FigureError::Config(_) => "figure::config",
        };
        Some(Box::new(code))
    }
}

/// A reportable error that can be rendered by miette.
///
/// This enum wraps either a single diagnostic or a non-diagnostic error,
/// providing a uniform interface for error rendering.
#[derive(Debug)]
pub enum Reportable<'a> {
    /// A rich diagnostic with source location information.
    Diagnostic(DiagnosticAdapter<'a>),
    /// A simple error without source location.
    Error(ErrorAdapter<'a>),
}

impl fmt::Display for Reportable<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Reportable::Diagnostic(d) => fmt::Display::fmt(d, f),
            Reportable::Error(e) => fmt::Display::fmt(e, f),
        }
    }
}

impl std::error::Error for Reportable<'_> {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Reportable::Diagnostic(_) => None,
            Reportable::Error(e) => e.source(),
        }
    }
}

impl MietteDiagnostic for Reportable<'_> {
    fn code<'a>(&'a self) -> Option<Box<dyn fmt::Display + 'a>> {
        match self {
            Reportable::Diagnostic(d) => d.code(),
            Reportable::Error(e) => e.code(),
        }
    }

    fn help<'a>(&'a self) -> Option<Box<dyn fmt::Display + 'a>> {
        match self {
            Reportable::Diagnostic(d) => d.help(),
            Reportable::Error(e) => e.help(),
        }
    }

    fn source_code(&self) -> Option<&dyn miette::SourceCode> {
        match self {
            Reportable::Diagnostic(d) => d.source_code(),
            Reportable::Error(e) => e.source_code(),
        }
    }

    fn labels(&self) -> Option<Box<dyn Iterator<Item = LabeledSpan> + '_>> {
        match self {
            Reportable::Diagnostic(d) => d.labels(),
            Reportable::Error(e) => e.labels(),
        }
    }

    fn related<'a>(&'a self) -> Option<Box<dyn Iterator<Item = &'a dyn MietteDiagnostic> + 'a>> {
        match self {
            Reportable::Diagnostic(d) => d.related(),
            Reportable::Error(e) => e.related(),
        }
    }
}

/// Convert a figure [`Span`] to a miette [`SourceSpan`].
fn span_to_miette(span: Span) -> SourceSpan {
    SourceSpan::new(span.start().into(), span.len())
}

fn to_labeled_span(label: &Label) -> LabeledSpan {
    let span = span_to_miette(label.span());
    let message = Some(label.message().to_string());
    if label.is_primary() {
        LabeledSpan::new_primary_with_span(message, span)
    } else {
        LabeledSpan::new_with_span(message, span)
    }
}

fn named_source(sources: &SourceMap, file: FileId) -> Option<NamedSource<String>> {
    sources
        .get(file)
        .map(|file| NamedSource::new(file.name(), file.text().to_string()))
}

/// Convert a [`FigureError`] into a list of reportable errors.
///
/// For [`FigureError::Compile`], this returns one [`Reportable`] for
/// each diagnostic in the error. For other error variants, this returns a
/// single [`Reportable`].
pub fn to_reportables(err: &FigureError) -> Vec<Reportable<'_>> {
    match err {
        FigureError::Compile {
            err: compile_err,
            sources,
        } => compile_err
            .diagnostics()
            .iter()
            .map(|d| Reportable::Diagnostic(DiagnosticAdapter::new(d, sources)))
            .collect(),
        _ => vec![Reportable::Error(ErrorAdapter(err))],
    }
}
