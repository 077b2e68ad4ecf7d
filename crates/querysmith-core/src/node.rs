//! The self-describing schema tree.
//!
//! Every persisted artifact (per-table schemas, the overall schema, the
//! join directives) is a nested mapping that a human edits between runs.
//! [`Node`] models that value space explicitly so the reconciler can
//! branch on leaf-vs-subtree with exhaustive pattern matching instead of
//! runtime type inspection.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

/// Ordered mapping used throughout the schema tree.
///
/// Insertion order is the collection order of the source metadata and is
/// preserved across JSON round trips.
pub type NodeMap = IndexMap<String, Node>;

/// A single value in a schema artifact.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Node {
    /// Numeric marker: `0` means "not yet annotated", `1` means
    /// "selected". Any other value is treated as annotated and preserved.
    Flag(u64),
    /// Typed flag inside annotations and join directives.
    Bool(bool),
    /// Free-form text (aliases, aggregation names, file references).
    Text(String),
    /// Ordered `(operator, value)` pairs for predicates and join
    /// bindings. The list is never empty; `("", "")` is the inert
    /// placeholder.
    Pairs(Vec<(String, String)>),
    /// Nested mapping (tables, columns, directive fields).
    Map(NodeMap),
}

impl Node {
    /// Creates an empty mapping node.
    #[must_use]
    pub fn empty_map() -> Self {
        Self::Map(NodeMap::new())
    }

    /// Creates a text node.
    #[must_use]
    pub fn text(value: impl Into<String>) -> Self {
        Self::Text(value.into())
    }

    /// Returns the mapping entries if this node is a map.
    #[must_use]
    pub fn as_map(&self) -> Option<&NodeMap> {
        match self {
            Self::Map(entries) => Some(entries),
            _ => None,
        }
    }

    /// Returns the mutable mapping entries if this node is a map.
    pub fn as_map_mut(&mut self) -> Option<&mut NodeMap> {
        match self {
            Self::Map(entries) => Some(entries),
            _ => None,
        }
    }

    /// Returns the flag value if this node is a numeric marker.
    #[must_use]
    pub fn as_flag(&self) -> Option<u64> {
        match self {
            Self::Flag(value) => Some(*value),
            _ => None,
        }
    }

    /// Returns the text if this node is a text leaf.
    #[must_use]
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Self::Text(value) => Some(value),
            _ => None,
        }
    }

    /// Returns the pair list if this node holds one.
    #[must_use]
    pub fn as_pairs(&self) -> Option<&[(String, String)]> {
        match self {
            Self::Pairs(pairs) => Some(pairs),
            _ => None,
        }
    }

    /// Returns the bool value, accepting the numeric 0/1 spelling a
    /// human may leave behind in an edited artifact.
    #[must_use]
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Self::Bool(value) => Some(*value),
            Self::Flag(value) => Some(*value != 0),
            _ => None,
        }
    }

    /// Looks up a child node by key.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&Self> {
        self.as_map().and_then(|entries| entries.get(key))
    }
}

/// Returns true iff at least one member of at least one pair is non-empty.
///
/// A list holding only the `("", "")` placeholder is inert and contributes
/// nothing to WHERE or JOIN clauses.
#[must_use]
pub fn pairs_active(pairs: &[(String, String)]) -> bool {
    pairs
        .iter()
        .any(|(left, right)| !left.is_empty() || !right.is_empty())
}
