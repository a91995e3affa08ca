//! AST types produced by the parser and rewritten by each compiler pass.
//!
//! Leaf values (strings, numbers, names) are wrapped in [`Spanned<T>`].
//! Composite nodes derive their spans from their children.

use std::fmt;

use crate::{
    source::FileId,
    span::{Span, Spanned},
};

/// Key used for broadcast assignment into every existing map.
pub const WILDCARD_KEY: &str = "@";

/// A parsed source file: an ordered sequence of entries.
///
/// Entry order is significant. Later fields merge over earlier ones and
/// references only see what precedes them.
#[derive(Debug, Clone, PartialEq)]
pub struct Document {
    pub file: FileId,
    pub entries: Vec<Entry>,
}

impl Document {
    pub fn new(file: FileId, entries: Vec<Entry>) -> Self {
        Self { file, entries }
    }
}

/// A top-level document entry
#[derive(Debug, Clone, PartialEq)]
pub enum Entry {
    Include(Include),
    Field(Field),
    Section(Section),
}

impl Entry {
    pub fn span(&self) -> Span {
        match self {
            Entry::Include(include) => include.span,
            Entry::Field(field) => field.span(),
            Entry::Section(section) => section.span,
        }
    }
}

/// `#include "a.fig", "b.fig"`
#[derive(Debug, Clone, PartialEq)]
pub struct Include {
    pub files: Vec<Spanned<String>>,
    pub span: Span,
}

/// `[root1, root2.child] fields...`
///
/// Every root receives its own copy of the field list.
#[derive(Debug, Clone, PartialEq)]
pub struct Section {
    pub roots: Vec<SectionRoot>,
    pub fields: Vec<Field>,
    pub span: Span,
}

/// First segment of a section path with its dotted continuation.
#[derive(Debug, Clone, PartialEq)]
pub struct SectionRoot {
    pub segment: Spanned<Segment>,
    pub child: Option<SectionChild>,
}

impl SectionRoot {
    /// All segments of this path, outermost first.
    pub fn segments(&self) -> Vec<&Spanned<Segment>> {
        let mut segments = vec![&self.segment];
        let mut child = self.child.as_ref();
        while let Some(next) = child {
            segments.push(&next.segment);
            child = next.child.as_deref();
        }
        segments
    }

    pub fn span(&self) -> Span {
        self.segments()
            .into_iter()
            .map(|segment| segment.span())
            .reduce(|acc, span| acc.union(span))
            .unwrap_or_default()
    }
}

/// A `.segment` link in a section path.
#[derive(Debug, Clone, PartialEq)]
pub struct SectionChild {
    pub segment: Spanned<Segment>,
    pub child: Option<Box<SectionChild>>,
}

/// One segment of a section path
#[derive(Debug, Clone, PartialEq)]
pub enum Segment {
    /// A literal name (identifier or array index)
    Name(String),
    /// `%{a,b,c}`: one branch per alternative
    Macro(Vec<String>),
    /// `@`: broadcast into every existing map
    Wildcard,
}

impl fmt::Display for Segment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Segment::Name(name) => write!(f, "{name}"),
            Segment::Macro(names) => write!(f, "%{{{}}}", names.join(",")),
            Segment::Wildcard => write!(f, "@"),
        }
    }
}

/// `key`, `key: value`, or `key.child...`
///
/// A field carries either a child or a value, never both. A field with
/// neither is a bare key and deletes the key when merged.
#[derive(Debug, Clone, PartialEq)]
pub struct Field {
    pub key: Spanned<String>,
    pub child: Option<Box<Field>>,
    pub value: Option<Value>,
}

impl Field {
    /// A `key: value` field.
    pub fn with_value(key: Spanned<String>, value: Value) -> Self {
        Self {
            key,
            child: None,
            value: Some(value),
        }
    }

    /// A bare `key` field.
    pub fn bare(key: Spanned<String>) -> Self {
        Self {
            key,
            child: None,
            value: None,
        }
    }

    /// A dotted `key.child` field.
    pub fn with_child(key: Spanned<String>, child: Field) -> Self {
        Self {
            key,
            child: Some(Box::new(child)),
            value: None,
        }
    }

    pub fn is_bare(&self) -> bool {
        self.child.is_none() && self.value.is_none()
    }

    pub fn span(&self) -> Span {
        let span = self.key.span();
        match (&self.child, &self.value) {
            (Some(child), _) => span.union(child.span()),
            (None, Some(value)) => span.union(value.span()),
            (None, None) => span,
        }
    }
}

/// A field value before resolution
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    String(Spanned<String>),
    /// Raw body of a triple-quoted string
    MultilineString(Spanned<String>),
    Integer(Spanned<i64>),
    Float(Spanned<f64>),
    /// Unresolved dotted reference, e.g. `servers.0.host`
    Identifier(Spanned<String>),
    /// A `[...]` literal
    List(Spanned<Vec<Value>>),
    /// A list rebuilt from index keys `0..n`
    IndexedList(Spanned<Vec<Value>>),
    Map(Spanned<Vec<Field>>),
}

impl Value {
    pub fn span(&self) -> Span {
        match self {
            Value::String(s) | Value::MultilineString(s) | Value::Identifier(s) => s.span(),
            Value::Integer(n) => n.span(),
            Value::Float(n) => n.span(),
            Value::List(items) | Value::IndexedList(items) => items.span(),
            Value::Map(fields) => fields.span(),
        }
    }

    /// Short name of the value kind, for diagnostics.
    pub fn kind(&self) -> &'static str {
        match self {
            Value::String(_) | Value::MultilineString(_) => "string",
            Value::Integer(_) => "integer",
            Value::Float(_) => "float",
            Value::Identifier(_) => "reference",
            Value::List(_) | Value::IndexedList(_) => "list",
            Value::Map(_) => "map",
        }
    }
}
