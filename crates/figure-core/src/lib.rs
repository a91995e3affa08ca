//! Core types for compiled Figure configuration.
//!
//! A compiled document is a [`Tree`]: an ordered map from string keys to
//! [`Value`]s. Values are scalars, ordered lists, or nested maps. Source
//! positions are not part of this model; they live only in the parser's AST.
//!
//! Both types implement [`serde::Serialize`], so a tree can be handed to any
//! serde serializer (JSON in the `figure` crate). Maps keep insertion order.
//!
//! # Example
//!
//! ```
//! # use figure_core::{Map, Tree, Value};
//! let mut map = Map::new();
//! map.insert("name".to_string(), Value::from("figure"));
//! map.insert("port".to_string(), Value::from(8080));
//!
//! let tree = Tree::from(map);
//! assert_eq!(tree.get_path("port").and_then(Value::as_integer), Some(8080));
//! ```

mod value;

pub use value::{Map, Value};

use serde::Serialize;

/// The result of compiling a Figure document.
///
/// The root is always a map. Keys appear in the order they were first
/// introduced by the document.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct Tree(Map);

impl Tree {
    /// Create an empty tree.
    pub fn new() -> Self {
        Self::default()
    }

    /// Look up a top-level key.
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.get(key)
    }

    /// Look up a dotted path such as `servers.0.host`.
    ///
    /// Numeric segments index into lists; all other segments select map keys.
    pub fn get_path(&self, path: &str) -> Option<&Value> {
        let mut segments = path.split('.');
        let first = self.0.get(segments.next()?)?;
        segments.try_fold(first, |value, segment| value.get(segment))
    }

    /// Number of top-level keys.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Returns `true` if the tree has no keys.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Iterate over top-level keys in order.
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.0.keys().map(String::as_str)
    }

    /// Iterate over top-level entries in order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.0.iter().map(|(key, value)| (key.as_str(), value))
    }

    /// Borrow the root map.
    pub fn as_map(&self) -> &Map {
        &self.0
    }

    /// Consume the tree and return the root map.
    pub fn into_map(self) -> Map {
        self.0
    }
}

impl From<Map> for Tree {
    fn from(map: Map) -> Self {
        Self(map)
    }
}
