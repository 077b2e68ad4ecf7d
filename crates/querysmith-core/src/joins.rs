//! Join directives and FROM-clause resolution.
//!
//! Every table gets one directive in the joins artifact: whether it
//! anchors the FROM clause, whether it stands for an externally written
//! subquery, and its ordered join bindings. Resolution turns the edited
//! artifact into rendered join clauses and the FROM-clause expression,
//! expanding subquery references inline.

use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::artifact::ArtifactStore;
use crate::error::{QuerysmithError, Result};
use crate::node::{pairs_active, Node, NodeMap};

/// Per-table join configuration as edited by the human.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JoinDirective {
    /// Marks the table anchoring the FROM clause. Exactly one directive
    /// should carry it; when several do, the last one in artifact order
    /// wins.
    pub default: bool,
    /// Marks the table as a stand-in for an externally written subquery.
    pub subquery: bool,
    /// Workspace-relative file holding the subquery SQL text.
    pub source: String,
    /// Ordered `(join type, predicate)` bindings; holds at least the
    /// inert `("", "")` placeholder.
    pub bindings: Vec<(String, String)>,
}

impl Default for JoinDirective {
    fn default() -> Self {
        Self {
            default: false,
            subquery: false,
            source: String::new(),
            bindings: vec![(String::new(), String::new())],
        }
    }
}

impl JoinDirective {
    /// Converts the directive into its artifact representation.
    #[must_use]
    pub fn to_node(&self) -> Node {
        let mut entries = NodeMap::new();
        entries.insert("default".to_string(), Node::Bool(self.default));
        entries.insert("subquery".to_string(), Node::Bool(self.subquery));
        entries.insert("source".to_string(), Node::text(&self.source));
        entries.insert("bindings".to_string(), Node::Pairs(self.bindings.clone()));
        Node::Map(entries)
    }

    /// Reads a directive back out of an artifact node, tolerating missing
    /// fields in hand-edited files.
    #[must_use]
    pub fn from_node(node: &Node) -> Option<Self> {
        let entries = node.as_map()?;
        Some(Self {
            default: entries
                .get("default")
                .and_then(Node::as_bool)
                .unwrap_or(false),
            subquery: entries
                .get("subquery")
                .and_then(Node::as_bool)
                .unwrap_or(false),
            source: entries
                .get("source")
                .and_then(Node::as_text)
                .unwrap_or_default()
                .to_string(),
            bindings: entries
                .get("bindings")
                .and_then(Node::as_pairs)
                .map_or_else(
                    || vec![(String::new(), String::new())],
                    <[(String, String)]>::to_vec,
                ),
        })
    }
}

/// Seeds one default directive per table for the joins artifact.
#[must_use]
pub fn seed_directives<'a>(names: impl IntoIterator<Item = &'a str>) -> Node {
    let mut entries = NodeMap::new();
    for name in names {
        entries.insert(name.to_string(), JoinDirective::default().to_node());
    }
    Node::Map(entries)
}

/// Output of join resolution, ready for SQL assembly.
#[derive(Debug, Clone, PartialEq)]
pub struct JoinResolution {
    /// Rendered join clauses in artifact order, subqueries expanded.
    pub clauses: Vec<String>,
    /// FROM-clause anchor: the default table name, or a parenthesized
    /// derived table when the anchor is itself a subquery.
    pub from_expr: String,
    /// True iff at least one directive produced a non-inert binding.
    pub has_joins: bool,
}

/// Resolves the edited join directives into clause text.
///
/// Loads the external SQL of every subquery directive, renders the active
/// bindings, and expands subquery table names referenced as join targets
/// into inline derived tables.
pub fn resolve(directives: &Node, store: &ArtifactStore) -> Result<JoinResolution> {
    let entries = directives.as_map().ok_or_else(|| {
        QuerysmithError::InvalidStructure("joins artifact is not a mapping".to_string())
    })?;

    let mut clauses: Vec<String> = Vec::new();
    let mut subqueries: Vec<(String, String)> = Vec::new();
    let mut default_table: Option<String> = None;

    for (table, node) in entries {
        let Some(directive) = JoinDirective::from_node(node) else {
            warn!(table = %table, "Join directive is not a mapping, skipping");
            continue;
        };

        if directive.default {
            default_table = Some(table.clone());
        }

        if directive.subquery {
            if directive.source.is_empty() {
                info!(table = %table, "Subquery directive has no source file");
            } else {
                let lines = store.load_lines(&directive.source)?;
                subqueries.push((table.clone(), lines.join(" ")));
            }
        }

        if pairs_active(&directive.bindings) {
            for (kind, predicate) in &directive.bindings {
                clauses.push(format!("{kind} {predicate}"));
            }
        }
    }

    let anchor = default_table.ok_or(QuerysmithError::NoDefaultTable)?;
    let from_expr = subqueries
        .iter()
        .find(|(table, _)| *table == anchor)
        .map_or_else(|| anchor.clone(), |(table, sql)| format!("({sql}) {table}"));

    for (table, sql) in &subqueries {
        for clause in &mut clauses {
            if clause.contains(table.as_str()) {
                *clause = substitute_subquery(clause, table, sql);
            }
        }
    }

    let has_joins = !clauses.is_empty();
    Ok(JoinResolution {
        clauses,
        from_expr,
        has_joins,
    })
}

/// Expands a subquery table name used as a join target.
///
/// Purely positional and textual: the FIRST exact-substring occurrence of
/// the table name is replaced with `(<subquery>) <table>`, and only when
/// it appears before the first occurrence of `on` in the clause. A name
/// occurring only inside the predicate part is left alone. Names that are
/// substrings of other identifiers, or several subqueries referenced in
/// one clause, are not handled.
fn substitute_subquery(clause: &str, table: &str, subquery: &str) -> String {
    let Some(position) = clause.find(table) else {
        return clause.to_string();
    };
    let Some(on_position) = clause.find("on") else {
        return clause.to_string();
    };
    if position >= on_position {
        return clause.to_string();
    }

    format!(
        "{}({}) {}{}",
        &clause[..position],
        subquery,
        table,
        &clause[position + table.len()..]
    )
}
