//! Merging of compiled values.
//!
//! Maps merged onto maps combine key by key, recursively. Any other value
//! replaces what it is assigned over, except that lists and maps never
//! silently replace each other.

use figure_core::{Map, Value};
use thiserror::Error;

/// A list/map conflict found while merging.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub(crate) enum MergeError {
    #[error("cannot assign a list over the map `{key}`")]
    ListOntoMap { key: String },

    #[error("cannot assign a map over the list `{key}`")]
    MapOntoList { key: String },

    #[error("key `{key}` is not an index into the list `{list}`")]
    NotAnIndex { list: String, key: String },

    #[error("index {index} of `{list}` leaves a gap after its {len} elements")]
    IndexGap {
        list: String,
        index: usize,
        len: usize,
    },

    #[error("cannot delete element {index} of the list `{list}`")]
    DeleteListElement { list: String, index: usize },
}

/// Merge `incoming` into the value stored under `key`.
///
/// Returns the value to store. A map onto a map merges deeply; anything
/// else replaces the existing value.
///
/// # Errors
///
/// Fails when a list would replace a map or a map would replace a list.
pub(crate) fn merge_value(
    key: &str,
    existing: Option<Value>,
    incoming: Value,
) -> Result<Value, MergeError> {
    match (existing, incoming) {
        (Some(Value::Map(mut target)), Value::Map(incoming)) => {
            merge_maps(&mut target, incoming)?;
            Ok(Value::Map(target))
        }
        (Some(Value::Map(_)), Value::List(_)) => Err(MergeError::ListOntoMap {
            key: key.to_string(),
        }),
        (Some(Value::List(_)), Value::Map(_)) => Err(MergeError::MapOntoList {
            key: key.to_string(),
        }),
        (_, incoming) => Ok(incoming),
    }
}

/// Deep merge `incoming` into `target`.
///
/// New keys are appended in the order `incoming` lists them; existing keys
/// keep their position.
///
/// # Errors
///
/// Fails on the first list/map conflict. `target` may be partially merged
/// at that point.
pub(crate) fn merge_maps(target: &mut Map, incoming: Map) -> Result<(), MergeError> {
    for (key, value) in incoming {
        let existing = target.get(&key).cloned();
        let merged = merge_value(&key, existing, value)?;
        target.insert(key, merged);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn map(entries: &[(&str, Value)]) -> Map {
        entries
            .iter()
            .map(|(key, value)| (key.to_string(), value.clone()))
            .collect()
    }

    #[test]
    fn test_scalar_replaces() {
        let merged = merge_value("k", Some(Value::from(1)), Value::from("x")).unwrap();

        assert_eq!(merged, Value::from("x"));
    }

    #[test]
    fn test_maps_merge_deeply() {
        let mut target = map(&[
            ("a", Value::from(1)),
            ("nested", Value::Map(map(&[("x", Value::from(1))]))),
        ]);
        let incoming = map(&[
            ("nested", Value::Map(map(&[("y", Value::from(2))]))),
            ("b", Value::from(2)),
        ]);

        merge_maps(&mut target, incoming).unwrap();

        let keys: Vec<&str> = target.keys().map(String::as_str).collect();
        assert_eq!(keys, ["a", "nested", "b"]);
        assert_eq!(
            target["nested"],
            Value::Map(map(&[("x", Value::from(1)), ("y", Value::from(2))]))
        );
    }

    #[test]
    fn test_later_scalar_wins() {
        let mut target = map(&[("a", Value::from(1))]);

        merge_maps(&mut target, map(&[("a", Value::from(2))])).unwrap();

        assert_eq!(target["a"], Value::from(2));
    }

    #[test]
    fn test_map_replaces_scalar() {
        let incoming = Value::Map(map(&[("x", Value::from(1))]));

        let merged = merge_value("k", Some(Value::from("s")), incoming.clone()).unwrap();

        assert_eq!(merged, incoming);
    }

    #[test]
    fn test_list_map_conflicts() {
        let list = Value::List(vec![Value::from(1)]);
        let map_value = Value::Map(Map::new());

        assert_eq!(
            merge_value("k", Some(map_value.clone()), list.clone()),
            Err(MergeError::ListOntoMap { key: "k".into() })
        );
        assert_eq!(
            merge_value("k", Some(list), map_value),
            Err(MergeError::MapOntoList { key: "k".into() })
        );
    }

    #[test]
    fn test_list_replaces_list() {
        let merged = merge_value(
            "k",
            Some(Value::List(vec![Value::from(1), Value::from(2)])),
            Value::List(vec![Value::from(3)]),
        )
        .unwrap();

        assert_eq!(merged, Value::List(vec![Value::from(3)]));
    }

    #[test]
    fn test_error_messages() {
        let err = MergeError::IndexGap {
            list: "servers".into(),
            index: 3,
            len: 1,
        };
        assert_eq!(
            err.to_string(),
            "index 3 of `servers` leaves a gap after its 1 elements"
        );

        let err = MergeError::DeleteListElement {
            list: "servers".into(),
            index: 0,
        };
        assert_eq!(err.to_string(), "cannot delete element 0 of the list `servers`");
    }
}

#[cfg(test)]
mod proptest_tests {
    use proptest::prelude::*;

    use super::*;

    /// Strategy for values built from scalars and maps only, so merges never
    /// conflict.
    fn value_strategy() -> impl Strategy<Value = Value> {
        let leaf = prop_oneof![
            "[a-z]{0,8}".prop_map(Value::from),
            any::<i64>().prop_map(Value::from),
        ];
        leaf.prop_recursive(3, 32, 4, |inner| {
            prop::collection::vec(("[a-z]{1,3}", inner), 0..4)
                .prop_map(|entries| Value::Map(entries.into_iter().collect()))
        })
    }

    fn map_strategy() -> impl Strategy<Value = Map> {
        prop::collection::vec(("[a-z]{1,3}", value_strategy()), 0..6)
            .prop_map(|entries| entries.into_iter().collect())
    }

    proptest! {
        #[test]
        fn merging_twice_equals_merging_once(target in map_strategy(), incoming in map_strategy()) {
            let mut once = target.clone();
            merge_maps(&mut once, incoming.clone()).unwrap();

            let mut twice = once.clone();
            merge_maps(&mut twice, incoming).unwrap();

            prop_assert_eq!(once, twice);
        }

        #[test]
        fn merging_into_empty_copies(incoming in map_strategy()) {
            let mut target = Map::new();
            merge_maps(&mut target, incoming.clone()).unwrap();

            prop_assert_eq!(target, incoming);
        }
    }
}
