//! Section expansion.
//!
//! Every section becomes one field per concrete path named by its header.
//! Roots are expanded independently and in order; within a root, every
//! `%{a,b}` macro multiplies the paths, with the leftmost macro varying
//! slowest. Each path `a.b.c` becomes the field `a.b.c: { fields... }`.

use log::debug;

use crate::{
    config::CompileConfig,
    error::{CompileError, Diagnostic, DiagnosticCollector, ErrorCode},
    fold::Folder,
    parser_types::{Document, Entry, Field, Section, SectionRoot, Segment, Value, WILDCARD_KEY},
    span::Spanned,
};

/// Folder replacing sections with plain fields.
struct Expander<'a> {
    config: &'a CompileConfig,
    expanded: usize,
    diagnostics: DiagnosticCollector,
}

impl Expander<'_> {
    /// Concrete paths for every root of one section, in root order.
    ///
    /// The limit applies to the section as a whole, summed over its roots.
    fn section_paths(
        &self,
        roots: &[SectionRoot],
    ) -> Result<Vec<Vec<Spanned<String>>>, Diagnostic> {
        let count = roots.iter().try_fold(0usize, |total, root| {
            root.segments()
                .iter()
                .map(|segment| alternatives(segment).len())
                .try_fold(1usize, usize::checked_mul)
                .and_then(|count| total.checked_add(count))
        });

        match count {
            Some(count) if count <= self.config.max_expansions => Ok(roots
                .iter()
                .flat_map(|root| expand_paths(&root.segments()))
                .collect()),
            _ => {
                let span = roots
                    .iter()
                    .map(SectionRoot::span)
                    .reduce(|span, next| span.union(next))
                    .unwrap_or_default();
                Err(Diagnostic::error(format!(
                    "section expands to more than {} paths",
                    self.config.max_expansions
                ))
                .with_code(ErrorCode::E300)
                .with_label(span, "expanded here")
                .with_help("split the section or raise `max_expansions`"))
            }
        }
    }
}

impl Folder for Expander<'_> {
    fn fold_section(&mut self, section: Section) -> Vec<Entry> {
        let Section {
            roots,
            fields,
            span,
        } = section;

        let paths = match self.section_paths(&roots) {
            Ok(paths) => paths,
            Err(diagnostic) => {
                self.diagnostics.emit(diagnostic);
                return Vec::new();
            }
        };

        self.expanded += paths.len();
        paths
            .into_iter()
            .filter_map(|path| {
                path_field(path, Value::Map(Spanned::new(fields.clone(), span))).map(Entry::Field)
            })
            .collect()
    }
}

/// The names a segment stands for
fn alternatives(segment: &Spanned<Segment>) -> Vec<Spanned<String>> {
    let span = segment.span();
    match segment.inner() {
        Segment::Name(name) => vec![Spanned::new(name.clone(), span)],
        Segment::Macro(names) => names
            .iter()
            .map(|name| Spanned::new(name.clone(), span))
            .collect(),
        Segment::Wildcard => vec![Spanned::new(WILDCARD_KEY.to_string(), span)],
    }
}

/// Cartesian product of segment alternatives, leftmost varying slowest
fn expand_paths(segments: &[&Spanned<Segment>]) -> Vec<Vec<Spanned<String>>> {
    segments
        .iter()
        .fold(vec![Vec::new()], |paths, segment| {
            let names = alternatives(segment);
            paths
                .into_iter()
                .flat_map(|prefix| {
                    names.iter().map(move |name| {
                        let mut path = prefix.clone();
                        path.push(name.clone());
                        path
                    })
                })
                .collect()
        })
}

/// Build `a.b.c: value` from the path `[a, b, c]`
fn path_field(path: Vec<Spanned<String>>, value: Value) -> Option<Field> {
    let mut keys = path.into_iter().rev();
    let innermost = Field::with_value(keys.next()?, value);
    Some(keys.fold(innermost, |child, key| Field::with_child(key, child)))
}

/// Replace every section with one field per expanded path.
///
/// # Errors
///
/// Returns an E300 diagnostic for every section whose roots together
/// produce more than `max_expansions` paths.
pub(crate) fn expand_sections(
    document: Document,
    config: &CompileConfig,
) -> Result<Document, CompileError> {
    let mut expander = Expander {
        config,
        expanded: 0,
        diagnostics: DiagnosticCollector::new(),
    };
    let document = expander.fold_document(document);

    debug!(fields = expander.expanded; "Expanded sections");
    expander.diagnostics.finish()?;
    Ok(document)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::source::FileId;

    fn expand(source: &str, config: &CompileConfig) -> Result<Document, CompileError> {
        let document = crate::parse(source, FileId::default()).expect("source parses");
        expand_sections(document, config)
    }

    /// Render a field chain as `a.b.c`
    fn dotted(field: &Field) -> String {
        let mut keys = vec![field.key.inner().clone()];
        let mut child = field.child.as_deref();
        while let Some(next) = child {
            keys.push(next.key.inner().clone());
            child = next.child.as_deref();
        }
        keys.join(".")
    }

    fn paths(document: &Document) -> Vec<String> {
        document
            .entries
            .iter()
            .map(|entry| match entry {
                Entry::Field(field) => dotted(field),
                other => panic!("Expected field entry, got {other:?}"),
            })
            .collect()
    }

    #[test]
    fn test_simple_section() {
        let document = expand(r#"[test] key: "value""#, &CompileConfig::default()).unwrap();

        assert_eq!(paths(&document), ["test"]);
        let Entry::Field(field) = &document.entries[0] else {
            unreachable!()
        };
        let Some(Value::Map(fields)) = &field.value else {
            panic!("Expected map value");
        };
        assert_eq!(fields[0].key.inner(), "key");
    }

    #[test]
    fn test_macro_expansion() {
        let document = expand(r#"[test.%{dev,prod}] key: "value""#, &CompileConfig::default())
            .unwrap();

        assert_eq!(paths(&document), ["test.dev", "test.prod"]);
    }

    #[test]
    fn test_leftmost_macro_varies_slowest() {
        let document = expand("[%{a,b}.%{x,y}] k: 1", &CompileConfig::default()).unwrap();

        assert_eq!(paths(&document), ["a.x", "a.y", "b.x", "b.y"]);
    }

    #[test]
    fn test_multiple_roots() {
        let document = expand("[root1, root2 root3.%{x,y}] k: 1", &CompileConfig::default())
            .unwrap();

        assert_eq!(
            paths(&document),
            ["root1", "root2", "root3.x", "root3.y"]
        );
    }

    #[test]
    fn test_wildcard_segment() {
        let document = expand("[@.%{dev,prod}] k: 1", &CompileConfig::default()).unwrap();

        assert_eq!(paths(&document), ["@.dev", "@.prod"]);
    }

    #[test]
    fn test_surrounding_order_preserved() {
        let document = expand("a: 1 [s] k: 1 [] b: 2", &CompileConfig::default()).unwrap();

        assert_eq!(paths(&document), ["a", "s", "b"]);
    }

    #[test]
    fn test_expansion_limit() {
        let config = CompileConfig::new(64, 3);

        let err = expand("[%{a,b}.%{x,y}] k: 1", &config).unwrap_err();
        assert_eq!(err.diagnostics()[0].code(), Some(ErrorCode::E300));

        let document = expand("[%{a,b,c}] k: 1", &config).unwrap();
        assert_eq!(paths(&document), ["a", "b", "c"]);
    }

    #[test]
    fn test_expansion_limit_counts_all_roots() {
        let config = CompileConfig::new(64, 4);

        let err = expand("[%{a,b}.%{c,d}, %{e,f}.%{g,h}] k: 1", &config).unwrap_err();
        let diagnostics = err.diagnostics();
        assert_eq!(diagnostics.len(), 1);
        assert_eq!(diagnostics[0].code(), Some(ErrorCode::E300));

        let document = expand("[%{a,b}.c, %{d,e}] k: 1", &config).unwrap();
        assert_eq!(paths(&document), ["a.c", "b.c", "d", "e"]);
    }
}
