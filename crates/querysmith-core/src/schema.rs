//! Schema construction, selection filtering, and annotation enrichment.
//!
//! A generated schema maps each table to its alias and columns, every
//! column starting at the `0` sentinel. The human flips columns to `1` in
//! the per-table artifacts; the filter turns those flags into the overall
//! schema, and enrichment promotes each selected column into a full
//! annotation record.

use serde::{Deserialize, Serialize};

use crate::metadata::TableIndex;
use crate::node::{Node, NodeMap};

/// Selection flag a human writes next to a column to include it.
pub const SELECTED: u64 = 1;
/// Sentinel for a column that has not been annotated yet.
pub const UNANNOTATED: u64 = 0;

/// Per-column annotation record in the overall schema.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ColumnAnnotation {
    /// Aggregation function name; empty means none.
    pub aggregate: String,
    /// Column alias; empty means none.
    pub alias: String,
    /// Hidden columns are excluded from SELECT and GROUP BY but their
    /// predicates still reach WHERE.
    pub hidden: bool,
    /// Ordered `(operator, value)` filter predicates; holds at least the
    /// inert `("", "")` placeholder.
    pub predicates: Vec<(String, String)>,
}

impl Default for ColumnAnnotation {
    fn default() -> Self {
        Self {
            aggregate: String::new(),
            alias: String::new(),
            hidden: false,
            predicates: vec![(String::new(), String::new())],
        }
    }
}

impl ColumnAnnotation {
    /// Converts the annotation into its artifact representation.
    #[must_use]
    pub fn to_node(&self) -> Node {
        let mut entries = NodeMap::new();
        entries.insert("aggregate".to_string(), Node::text(&self.aggregate));
        entries.insert("alias".to_string(), Node::text(&self.alias));
        entries.insert("hidden".to_string(), Node::Bool(self.hidden));
        entries.insert("predicates".to_string(), Node::Pairs(self.predicates.clone()));
        Node::Map(entries)
    }

    /// Reads an annotation back out of an artifact node, tolerating
    /// missing fields in hand-edited files.
    #[must_use]
    pub fn from_node(node: &Node) -> Option<Self> {
        let entries = node.as_map()?;
        let text = |key: &str| {
            entries
                .get(key)
                .and_then(Node::as_text)
                .unwrap_or_default()
                .to_string()
        };

        Some(Self {
            aggregate: text("aggregate"),
            alias: text("alias"),
            hidden: entries
                .get("hidden")
                .and_then(Node::as_bool)
                .unwrap_or(false),
            predicates: entries
                .get("predicates")
                .and_then(Node::as_pairs)
                .map_or_else(
                    || vec![(String::new(), String::new())],
                    <[(String, String)]>::to_vec,
                ),
        })
    }
}

/// Builds the generated schema from the table descriptors.
///
/// Pure: every column starts at the `0` sentinel and every alias empty.
#[must_use]
pub fn build_schema(index: &TableIndex) -> Node {
    let mut tables = NodeMap::new();

    for descriptor in index.tables() {
        let mut columns = NodeMap::new();
        for column in &descriptor.columns {
            columns.insert(column.clone(), Node::Flag(UNANNOTATED));
        }

        let mut entry = NodeMap::new();
        entry.insert("alias".to_string(), Node::text(""));
        entry.insert("columns".to_string(), Node::Map(columns));
        tables.insert(descriptor.name.clone(), Node::Map(entry));
    }

    Node::Map(tables)
}

/// Filters the edited schema down to the selected columns.
///
/// Keeps only columns flagged `1`, re-keyed as `table.column`; tables with
/// no selected columns are dropped entirely.
#[must_use]
pub fn select_columns(schema: &Node) -> Node {
    let mut result = NodeMap::new();

    let Some(tables) = schema.as_map() else {
        return Node::Map(result);
    };
    for (table, table_schema) in tables {
        let Some(columns) = table_schema.get("columns").and_then(Node::as_map) else {
            continue;
        };

        let mut selected = NodeMap::new();
        for (column, value) in columns {
            if value.as_flag() == Some(SELECTED) {
                selected.insert(format!("{table}.{column}"), value.clone());
            }
        }
        if selected.is_empty() {
            continue;
        }

        let mut entry = NodeMap::new();
        entry.insert(
            "alias".to_string(),
            table_schema
                .get("alias")
                .cloned()
                .unwrap_or_else(|| Node::text("")),
        );
        entry.insert("columns".to_string(), Node::Map(selected));
        result.insert(table.clone(), Node::Map(entry));
    }

    Node::Map(result)
}

/// Replaces each selected column's placeholder flag with a fresh default
/// annotation record.
///
/// Runs on the filtered schema before the overall-tier reconciliation;
/// annotation records already present are left alone. A new record is
/// constructed per slot.
pub fn enrich(selected: &mut Node) {
    replace_column_flags(selected, |_| true);
}

/// Promotes columns that escaped enrichment after the overall-tier merge.
///
/// A human can add a column to the overall artifact by hand as a bare `0`;
/// this pass upgrades exactly those sentinel slots to default annotation
/// records, never touching populated ones.
pub fn promote_unannotated(overall: &mut Node) {
    replace_column_flags(overall, |flag| flag == UNANNOTATED);
}

fn replace_column_flags(schema: &mut Node, should_replace: impl Fn(u64) -> bool) {
    let Some(tables) = schema.as_map_mut() else {
        return;
    };
    for table_schema in tables.values_mut() {
        let Some(columns) = table_schema
            .as_map_mut()
            .and_then(|entries| entries.get_mut("columns"))
            .and_then(Node::as_map_mut)
        else {
            continue;
        };
        for value in columns.values_mut() {
            if let Node::Flag(flag) = value {
                if should_replace(*flag) {
                    *value = ColumnAnnotation::default().to_node();
                }
            }
        }
    }
}
