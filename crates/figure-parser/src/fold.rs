//! Fold-based rewriting of the document AST.
//!
//! Every compiler pass between parsing and resolution is a [`Folder`]. Each
//! method takes ownership of a node and returns its rewritten form; the
//! default implementations rebuild the node unchanged. A pass overrides only
//! the methods for the nodes it rewrites.
//!
//! Entry-level methods return a `Vec<Entry>` so that a pass can splice one
//! entry into many (an include into the included file's entries, a section
//! into one field per expanded path).

use crate::parser_types::{Document, Entry, Field, Include, Section, Value};

/// The main trait for folding/rewriting AST nodes.
pub(crate) trait Folder {
    /// Fold a complete document
    fn fold_document(&mut self, document: Document) -> Document {
        Document {
            file: document.file,
            entries: self.fold_entries(document.entries),
        }
    }

    /// Fold a list of entries, preserving their order
    fn fold_entries(&mut self, entries: Vec<Entry>) -> Vec<Entry> {
        entries
            .into_iter()
            .flat_map(|entry| self.fold_entry(entry))
            .collect()
    }

    /// Fold a single entry into zero or more entries
    fn fold_entry(&mut self, entry: Entry) -> Vec<Entry> {
        match entry {
            Entry::Include(include) => self.fold_include(include),
            Entry::Section(section) => self.fold_section(section),
            Entry::Field(field) => vec![Entry::Field(self.fold_field(field))],
        }
    }

    fn fold_include(&mut self, include: Include) -> Vec<Entry> {
        vec![Entry::Include(include)]
    }

    fn fold_section(&mut self, section: Section) -> Vec<Entry> {
        vec![Entry::Section(Section {
            roots: section.roots,
            fields: self.fold_fields(section.fields),
            span: section.span,
        })]
    }

    /// Fold a list of fields
    fn fold_fields(&mut self, fields: Vec<Field>) -> Vec<Field> {
        fields
            .into_iter()
            .map(|field| self.fold_field(field))
            .collect()
    }

    /// Fold a single field, its child chain, and its value
    fn fold_field(&mut self, field: Field) -> Field {
        Field {
            key: field.key,
            child: field.child.map(|child| Box::new(self.fold_field(*child))),
            value: field.value.map(|value| self.fold_value(value)),
        }
    }

    /// Fold a list of values
    fn fold_values(&mut self, values: Vec<Value>) -> Vec<Value> {
        values
            .into_iter()
            .map(|value| self.fold_value(value))
            .collect()
    }

    /// Fold a value, descending into lists and maps
    fn fold_value(&mut self, value: Value) -> Value {
        match value {
            Value::List(items) => Value::List(items.map(|items| self.fold_values(items))),
            Value::IndexedList(items) => {
                Value::IndexedList(items.map(|items| self.fold_values(items)))
            }
            Value::Map(fields) => Value::Map(fields.map(|fields| self.fold_fields(fields))),
            scalar => scalar,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{lexer::tokenize, parser::build_document, source::FileId};

    // Test-only IdentityFolder for verifying identity transformations
    struct IdentityFolder;

    impl Folder for IdentityFolder {
        // Use default methods: identity behavior for all nodes
    }

    /// Folder that upper-cases every key
    struct UpperKeys;

    impl Folder for UpperKeys {
        fn fold_field(&mut self, field: Field) -> Field {
            Field {
                key: field.key.map(|key| key.to_uppercase()),
                child: field.child.map(|child| Box::new(self.fold_field(*child))),
                value: field.value.map(|value| self.fold_value(value)),
            }
        }
    }

    fn parse(source: &str) -> Document {
        let tokens = tokenize(source, FileId::default()).expect("Failed to tokenize input");
        build_document(&tokens, FileId::default(), crate::DEFAULT_MAX_NESTING_DEPTH)
            .expect("Failed to parse input")
    }

    #[test]
    fn test_identity_folder_preserves_document() {
        let source = r#"
            #include "other.fig"
            a.b: 1
            [s, t.%{x,y}] c: [1, {d: e}] f
        "#;
        let document = parse(source);

        let folded = IdentityFolder.fold_document(document.clone());

        assert_eq!(folded, document);
    }

    #[test]
    fn test_override_reaches_nested_fields() {
        let document = parse("a: {b: [{c: 1}]} [s] d.e: 2");

        let folded = UpperKeys.fold_document(document);

        let Entry::Field(first) = &folded.entries[0] else {
            panic!("Expected field entry");
        };
        assert_eq!(first.key.inner(), "A");
        let Some(Value::Map(fields)) = &first.value else {
            panic!("Expected map value");
        };
        assert_eq!(fields[0].key.inner(), "B");
        let Some(Value::List(items)) = &fields[0].value else {
            panic!("Expected list value");
        };
        let Value::Map(inner) = &items[0] else {
            panic!("Expected map item");
        };
        assert_eq!(inner[0].key.inner(), "C");

        let Entry::Section(section) = &folded.entries[1] else {
            panic!("Expected section entry");
        };
        assert_eq!(section.fields[0].key.inner(), "D");
        assert_eq!(section.fields[0].child.as_ref().unwrap().key.inner(), "E");
    }
}
