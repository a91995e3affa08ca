//! Reference resolution and merging.
//!
//! Fields are applied in document order onto a growing root map. Each
//! assignment merges into whatever the key already holds (see [`merge`]),
//! a bare key deletes, and the `@` key broadcasts its map into every
//! map-valued sibling present at that point.
//!
//! References are looked up through a chain of [`Scope`]s: the map being
//! built, then each enclosing map, ending at the root. The first scope where
//! the whole path exists wins. A map under construction also answers to its
//! full path, so `[server] port: 80 url: server.port` resolves.
//!
//! Runs after flattening, so no field carries a child chain.
//!
//! [`merge`]: crate::merge

use figure_core::{Map, Tree, Value};
use log::debug;

use crate::{
    error::{Diagnostic, ErrorCode},
    flatten::parse_index,
    merge::{self, MergeError},
    parser_types::{self as ast, Document, Entry, Field, WILDCARD_KEY},
    span::{Span, Spanned},
    text::normalize_multiline,
};

/// One level of the lookup chain.
struct Scope<'s> {
    map: &'s Map,
    /// Dotted path of `map` from the root, when it is reachable by one
    path: Option<&'s str>,
    parent: Option<&'s Scope<'s>>,
}

impl<'s> Scope<'s> {
    /// Find `segments` in the innermost scope that holds the whole path.
    ///
    /// Each scope is searched by the path relative to its map, then by the
    /// full path from the root, so a map under construction can name its
    /// own keys either way.
    fn lookup(&self, segments: &[&str]) -> Option<&'s Value> {
        let local = find(self.map, segments)
            .or_else(|| self.strip_path(segments).and_then(|rest| find(self.map, rest)));

        local.or_else(|| self.parent.and_then(|parent| parent.lookup(segments)))
    }

    /// The part of `segments` below this scope's own path.
    fn strip_path<'a>(&self, segments: &'a [&'a str]) -> Option<&'a [&'a str]> {
        let path = self.path.filter(|path| !path.is_empty())?;
        let mut rest = segments;
        for name in path.split('.') {
            let (first, tail) = rest.split_first()?;
            if *first != name {
                return None;
            }
            rest = tail;
        }
        (!rest.is_empty()).then_some(rest)
    }
}

fn find<'s>(map: &'s Map, segments: &[&str]) -> Option<&'s Value> {
    let (first, rest) = segments.split_first()?;
    map.get(*first)
        .and_then(|value| rest.iter().try_fold(value, |value, segment| value.get(segment)))
}

/// Path of `key` inside a map at `path`.
fn child_path(path: Option<&str>, key: &str) -> Option<String> {
    match path? {
        "" => Some(key.to_string()),
        path => Some(format!("{path}.{key}")),
    }
}

/// Apply one field onto `target`, the map at `path`.
fn apply_field(
    target: &mut Map,
    path: Option<&str>,
    field: &Field,
    parent: Option<&Scope<'_>>,
) -> Result<(), Diagnostic> {
    let key = field.key.inner();
    if key == WILDCARD_KEY {
        return broadcast(target, path, field, parent);
    }

    let Some(value) = &field.value else {
        target.shift_remove(key);
        return Ok(());
    };

    let existing = target.get(key).cloned();
    let value_path = child_path(path, key);
    let merged = {
        let scope = Scope {
            map: &*target,
            path,
            parent,
        };
        assign(key, value_path.as_deref(), existing, value, &scope)?
    };
    target.insert(key.clone(), merged);
    Ok(())
}

/// Apply `fields` in order onto `working`, which becomes the innermost scope.
fn apply_fields(
    mut working: Map,
    path: Option<&str>,
    fields: &[Field],
    parent: &Scope<'_>,
) -> Result<Map, Diagnostic> {
    for field in fields {
        apply_field(&mut working, path, field, Some(parent))?;
    }
    Ok(working)
}

/// Merge the `@` field's map into every map-valued entry of `target`.
fn broadcast(
    target: &mut Map,
    path: Option<&str>,
    field: &Field,
    parent: Option<&Scope<'_>>,
) -> Result<(), Diagnostic> {
    let siblings: Vec<String> = target
        .iter()
        .filter(|(_, value)| value.is_map())
        .map(|(key, _)| key.clone())
        .collect();

    match &field.value {
        Some(ast::Value::Map(fields)) => {
            for key in siblings {
                let Some(Value::Map(sibling)) = target.get(&key).cloned() else {
                    continue;
                };
                let sibling_path = child_path(path, &key);
                let merged = {
                    let scope = Scope {
                        map: &*target,
                        path,
                        parent,
                    };
                    Value::Map(apply_fields(sibling, sibling_path.as_deref(), fields, &scope)?)
                };
                target.insert(key, merged);
            }
        }
        Some(ast::Value::Identifier(reference_path)) => {
            let resolved = {
                let scope = Scope {
                    map: &*target,
                    path,
                    parent,
                };
                reference(reference_path, &scope)?
            };
            let Value::Map(incoming) = resolved else {
                return Err(not_a_map(field, resolved.kind()));
            };
            for key in siblings {
                let Some(Value::Map(mut sibling)) = target.get(&key).cloned() else {
                    continue;
                };
                merge::merge_maps(&mut sibling, incoming.clone())
                    .map_err(|err| conflict(err, field.span()))?;
                target.insert(key, Value::Map(sibling));
            }
        }
        Some(other) => return Err(not_a_map(field, other.kind())),
        None => return Err(not_a_map(field, "nothing")),
    }

    debug!(key = field.key.inner().as_str(); "Broadcast applied");
    Ok(())
}

/// Compute the value stored under `key` after assigning `value` over
/// `existing`. `path` is where the value lands, if a reference can name it.
fn assign(
    key: &str,
    path: Option<&str>,
    existing: Option<Value>,
    value: &ast::Value,
    scope: &Scope<'_>,
) -> Result<Value, Diagnostic> {
    match value {
        ast::Value::String(s) => Ok(Value::String(s.inner().clone())),
        ast::Value::MultilineString(raw) => Ok(Value::String(normalize_multiline(raw.inner()))),
        ast::Value::Integer(n) => Ok(Value::Integer(*n.inner())),
        ast::Value::Float(n) => Ok(Value::Float(*n.inner())),
        ast::Value::Identifier(target) => {
            let resolved = reference(target, scope)?;
            merge::merge_value(key, existing, resolved)
                .map_err(|err| conflict(err, target.span()))
        }
        ast::Value::List(items) => {
            if matches!(existing, Some(Value::Map(_))) {
                return Err(conflict(
                    MergeError::ListOntoMap {
                        key: key.to_string(),
                    },
                    items.span(),
                ));
            }
            build_list(items.inner(), scope)
        }
        ast::Value::IndexedList(items) => match existing {
            Some(Value::List(list)) => merge_indexed(list, items.inner(), scope),
            Some(Value::Map(map)) if is_index_map(&map) => {
                merge_indexed_into_map(map, items.inner(), scope)
            }
            Some(Value::Map(_)) => Err(conflict(
                MergeError::ListOntoMap {
                    key: key.to_string(),
                },
                items.span(),
            )),
            _ => build_list(items.inner(), scope),
        },
        ast::Value::Map(fields) => match existing {
            Some(Value::List(list)) => merge_index_map(key, list, fields, scope),
            Some(Value::Map(map)) if !is_index_map(&map) => {
                apply_fields(map, path, fields.inner(), scope).map(Value::Map)
            }
            Some(Value::Map(map)) => apply_fields(map, path, fields.inner(), scope).map(materialize),
            _ => apply_fields(Map::new(), path, fields.inner(), scope).map(materialize),
        },
    }
}

/// Build a list, each element resolved in the enclosing scope.
fn build_list(items: &[ast::Value], scope: &Scope<'_>) -> Result<Value, Diagnostic> {
    items
        .iter()
        .enumerate()
        .map(|(index, item)| assign(&index.to_string(), None, None, item, scope))
        .collect::<Result<Vec<_>, _>>()
        .map(Value::List)
}

/// Merge an index-built list onto `list` element by element.
fn merge_indexed(
    mut list: Vec<Value>,
    items: &[ast::Value],
    scope: &Scope<'_>,
) -> Result<Value, Diagnostic> {
    for (index, item) in items.iter().enumerate() {
        let merged = assign(&index.to_string(), None, list.get(index).cloned(), item, scope)?;
        match list.get_mut(index) {
            Some(slot) => *slot = merged,
            None => list.push(merged),
        }
    }
    Ok(Value::List(list))
}

/// Whether every key of a non-empty `map` is a list index.
fn is_index_map(map: &Map) -> bool {
    !map.is_empty() && map.keys().all(|key| parse_index(key).is_some())
}

/// Merge an index-built list onto a map still waiting for some of its
/// indices, as when `a.1` is declared before `a.0`.
fn merge_indexed_into_map(
    mut map: Map,
    items: &[ast::Value],
    scope: &Scope<'_>,
) -> Result<Value, Diagnostic> {
    for (index, item) in items.iter().enumerate() {
        let key = index.to_string();
        let merged = assign(&key, None, map.get(&key).cloned(), item, scope)?;
        map.insert(key, merged);
    }
    Ok(materialize(map))
}

/// Turn a map keyed by exactly the indices `0..n` into a list in index
/// order. Any other map, the empty one included, is returned unchanged.
fn materialize(map: Map) -> Value {
    let mut indices: Vec<usize> = map.keys().filter_map(|key| parse_index(key)).collect();
    indices.sort_unstable();
    let complete = !indices.is_empty()
        && indices.len() == map.len()
        && indices.iter().enumerate().all(|(position, index)| position == *index);
    if !complete {
        return Value::Map(map);
    }

    let mut entries: Vec<(usize, Value)> = map
        .into_iter()
        .filter_map(|(key, value)| parse_index(&key).map(|index| (index, value)))
        .collect();
    entries.sort_by_key(|(index, _)| *index);
    Value::List(entries.into_iter().map(|(_, value)| value).collect())
}

/// Merge a map keyed by list indices onto `list`.
///
/// Indices are applied in ascending order. An index inside the list merges
/// into that element and an index one past the end appends.
fn merge_index_map(
    key: &str,
    mut list: Vec<Value>,
    fields: &Spanned<Vec<Field>>,
    scope: &Scope<'_>,
) -> Result<Value, Diagnostic> {
    let mut indexed = Vec::with_capacity(fields.len());
    for field in fields.iter() {
        let index = parse_index(field.key.inner()).ok_or_else(|| {
            conflict(
                MergeError::NotAnIndex {
                    list: key.to_string(),
                    key: field.key.inner().clone(),
                },
                field.key.span(),
            )
        })?;
        indexed.push((index, field));
    }
    indexed.sort_by_key(|(index, _)| *index);

    for (index, field) in indexed {
        let Some(value) = &field.value else {
            return Err(conflict(
                MergeError::DeleteListElement {
                    list: key.to_string(),
                    index,
                },
                field.span(),
            ));
        };
        if index > list.len() {
            return Err(conflict(
                MergeError::IndexGap {
                    list: key.to_string(),
                    index,
                    len: list.len(),
                },
                field.span(),
            ));
        }

        let merged = assign(field.key.inner(), None, list.get(index).cloned(), value, scope)?;
        match list.get_mut(index) {
            Some(slot) => *slot = merged,
            None => list.push(merged),
        }
    }
    Ok(Value::List(list))
}

/// Resolve a reference to a copy of its target.
fn reference(path: &Spanned<String>, scope: &Scope<'_>) -> Result<Value, Diagnostic> {
    let segments: Vec<&str> = path.split('.').collect();

    match scope.lookup(&segments) {
        Some(Value::List(_)) => Err(Diagnostic::error(format!(
            "reference `{}` resolves to a list",
            path.inner()
        ))
        .with_code(ErrorCode::E401)
        .with_label(path.span(), "refers to a list")
        .with_help(format!(
            "only scalars and maps can be referenced; try `{}.0`",
            path.inner()
        ))),
        Some(value) => Ok(value.clone()),
        None => Err(
            Diagnostic::error(format!("undefined reference `{}`", path.inner()))
                .with_code(ErrorCode::E400)
                .with_label(path.span(), "not found")
                .with_help("references only see keys defined earlier in the document"),
        ),
    }
}

fn conflict(err: MergeError, span: Span) -> Diagnostic {
    Diagnostic::error(err.to_string())
        .with_code(ErrorCode::E402)
        .with_label(span, "conflicting assignment")
}

fn not_a_map(field: &Field, found: &str) -> Diagnostic {
    Diagnostic::error(format!("broadcast value must be a map, found {found}"))
        .with_code(ErrorCode::E403)
        .with_label(field.span(), "broadcast here")
        .with_help("assign `@` a map, e.g. `@: { key: value }`")
}

/// Apply every field of `document` in order and return the resulting tree.
///
/// # Errors
///
/// Stops at the first undefined reference (E400), reference to a list
/// (E401), list/map conflict (E402), or broadcast of a non-map (E403).
pub(crate) fn resolve(document: &Document) -> Result<Tree, Diagnostic> {
    let mut root = Map::new();

    for entry in &document.entries {
        // Includes and sections are gone by now.
        if let Entry::Field(field) = entry {
            apply_field(&mut root, Some(""), field, None)?;
        }
    }

    debug!(keys = root.len(); "Resolved fields");
    Ok(Tree::from(root))
}
