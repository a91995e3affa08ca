//! Field flattening and array materialization.
//!
//! Two folders run back to back:
//!
//! - [`Flattener`] rewrites dotted keys into nested single-key maps, so
//!   `a.b.c: v` becomes `a: {b: {c: v}}`.
//! - [`ArrayBuilder`] rewrites, bottom-up, every map whose keys are exactly
//!   `0..n` into a list ordered by index. Maps with any other key set are
//!   left alone.

use log::debug;

use crate::{
    fold::Folder,
    parser_types::{Document, Field, Value},
    span::Spanned,
};

/// Folder removing child chains from fields.
struct Flattener;

impl Folder for Flattener {
    fn fold_field(&mut self, field: Field) -> Field {
        let Field { key, child, value } = field;

        match child {
            Some(child) => {
                let child = self.fold_field(*child);
                let span = child.span();
                Field::with_value(key, Value::Map(Spanned::new(vec![child], span)))
            }
            None => Field {
                key,
                child: None,
                value: value.map(|value| self.fold_value(value)),
            },
        }
    }
}

/// Folder turning index-keyed maps into lists.
#[derive(Default)]
struct ArrayBuilder {
    built: usize,
}

impl Folder for ArrayBuilder {
    fn fold_value(&mut self, value: Value) -> Value {
        match value {
            Value::Map(fields) => {
                let span = fields.span();
                let fields = self.fold_fields(fields.into_inner());

                match index_order(fields) {
                    Ok(items) => {
                        self.built += 1;
                        Value::IndexedList(Spanned::new(items, span))
                    }
                    Err(fields) => Value::Map(Spanned::new(fields, span)),
                }
            }
            Value::List(items) => Value::List(items.map(|items| self.fold_values(items))),
            Value::IndexedList(items) => {
                Value::IndexedList(items.map(|items| self.fold_values(items)))
            }
            scalar => scalar,
        }
    }
}

/// Parse a key as a list index.
///
/// Only the canonical decimal form counts, so `01` is not an index.
pub(crate) fn parse_index(key: &str) -> Option<usize> {
    key.parse::<usize>()
        .ok()
        .filter(|index| index.to_string() == key)
}

/// Order the values of fields keyed exactly `0..n` by index.
///
/// Gives the fields back unchanged if any key is not an index, an index is
/// missing or repeated, or a field carries no value.
fn index_order(fields: Vec<Field>) -> Result<Vec<Value>, Vec<Field>> {
    if fields.is_empty() {
        return Err(fields);
    }

    let mut slots: Vec<Option<usize>> = vec![None; fields.len()];
    let complete = fields.iter().enumerate().all(|(position, field)| {
        let slot = parse_index(field.key.inner())
            .filter(|_| field.child.is_none() && field.value.is_some())
            .and_then(|index| slots.get_mut(index));
        match slot {
            Some(slot) if slot.is_none() => {
                *slot = Some(position);
                true
            }
            _ => false,
        }
    });
    if !complete {
        return Err(fields);
    }

    let mut values: Vec<Option<Value>> = fields.into_iter().map(|field| field.value).collect();
    Ok(slots
        .into_iter()
        .flatten()
        .filter_map(|position| values[position].take())
        .collect())
}

/// Flatten dotted fields, then materialize index-keyed maps as lists.
pub(crate) fn flatten(document: Document) -> Document {
    let document = Flattener.fold_document(document);

    let mut builder = ArrayBuilder::default();
    let document = builder.fold_document(document);

    debug!(lists = builder.built; "Flattened fields");
    document
}
