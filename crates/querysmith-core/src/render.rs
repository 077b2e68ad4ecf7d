//! SQL text assembly.
//!
//! Walks the annotated overall schema once to collect the SELECT list,
//! aggregate block, GROUP BY list, and WHERE fragments, then renders the
//! final statement together with the resolved joins. Deterministic text
//! rendering only; nothing here validates SQL.

use crate::joins::JoinResolution;
use crate::node::{pairs_active, Node};
use crate::schema::ColumnAnnotation;

const INDENT: &str = "    ";

/// Clause material collected from the annotated overall schema.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SelectParts {
    /// Plain (non-aggregated) select expressions, aliases applied.
    pub columns: Vec<String>,
    /// Aggregated select expressions, aliases applied.
    pub aggregates: Vec<String>,
    /// Non-aggregated, non-hidden column keys for GROUP BY.
    pub group_by: Vec<String>,
    /// Per-column WHERE fragments in collection order.
    pub filters: Vec<String>,
    /// True iff any column carries an aggregation function.
    pub group_by_active: bool,
}

/// Collects clause material from the overall schema.
///
/// Hidden columns are excluded from the select expressions and GROUP BY
/// but their active predicates still contribute WHERE fragments. Column
/// values that are not annotation records are skipped.
#[must_use]
pub fn collect_parts(overall: &Node) -> SelectParts {
    let mut parts = SelectParts::default();

    let Some(tables) = overall.as_map() else {
        return parts;
    };
    for table_schema in tables.values() {
        let Some(columns) = table_schema.get("columns").and_then(Node::as_map) else {
            continue;
        };

        for (key, value) in columns {
            let Some(annotation) = ColumnAnnotation::from_node(value) else {
                continue;
            };

            let alias_suffix = if annotation.alias.is_empty() {
                String::new()
            } else {
                format!(" as {}", annotation.alias)
            };

            if annotation.aggregate.is_empty() {
                if !annotation.hidden {
                    parts.columns.push(format!("{key}{alias_suffix}"));
                    parts.group_by.push(key.clone());
                }
            } else {
                parts.group_by_active = true;
                if !annotation.hidden {
                    parts.aggregates.push(format!(
                        "{}({key}){alias_suffix}",
                        annotation.aggregate.to_uppercase()
                    ));
                }
            }

            if pairs_active(&annotation.predicates) {
                let fragment = annotation
                    .predicates
                    .iter()
                    .map(|(operator, value)| format!("{key} {operator} {value}"))
                    .collect::<Vec<_>>()
                    .join(" AND ");
                parts.filters.push(fragment);
            }
        }
    }

    parts
}

/// Renders the final SELECT statement.
///
/// In GROUP BY mode the plain column block is comma-terminated and the
/// aggregate block follows; otherwise the plain block closes the SELECT
/// list. Join clauses are emitted verbatim. The WHERE clause anchors on
/// `1=1` so fragments concatenate uniformly. No statement terminator is
/// appended.
#[must_use]
pub fn assemble(parts: &SelectParts, joins: &JoinResolution) -> String {
    let mut sql = String::from("SELECT\n");
    sql.push_str(&block(&parts.columns, parts.group_by_active));
    if parts.group_by_active {
        sql.push_str(&block(&parts.aggregates, false));
    }

    sql.push_str("FROM ");
    sql.push_str(&joins.from_expr);
    sql.push('\n');

    if joins.has_joins {
        sql.push_str(&joins.clauses.join("\n"));
        sql.push('\n');
    }

    if !parts.filters.is_empty() {
        sql.push_str("WHERE 1=1\nAND ");
        sql.push_str(&parts.filters.join("\nAND "));
        sql.push('\n');
    }

    if parts.group_by_active {
        sql.push_str("GROUP BY\n");
        sql.push_str(&block(&parts.group_by, false));
    }

    sql
}

fn block(items: &[String], trailing_comma: bool) -> String {
    let separator = format!(",\n{INDENT}");
    let terminator = if trailing_comma { ",\n" } else { "\n" };
    format!("{INDENT}{}{terminator}", items.join(&separator))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(json: &str) -> Node {
        serde_json::from_str(json).unwrap()
    }

    fn no_joins(from_expr: &str) -> JoinResolution {
        JoinResolution {
            clauses: Vec::new(),
            from_expr: from_expr.to_string(),
            has_joins: false,
        }
    }

    fn overall(columns: &[(&str, &str)]) -> Node {
        let entries: Vec<String> = columns
            .iter()
            .map(|(key, ann)| format!(r#""{key}": {ann}"#))
            .collect();
        parse(&format!(
            r#"{{"t": {{"alias": "", "columns": {{{}}}}}}}"#,
            entries.join(",")
        ))
    }

    const PLAIN: &str = r#"{"aggregate": "", "alias": "", "hidden": false,
        "predicates": [["", ""]]}"#;

    #[test]
    fn test_plain_select_no_group_by() {
        let schema = parse(
            r#"{"orders": {"alias": "", "columns": {"orders.total":
                {"aggregate": "", "alias": "", "hidden": false, "predicates": [["", ""]]}}},
                "customers": {"alias": "", "columns": {"customers.id":
                {"aggregate": "", "alias": "", "hidden": false, "predicates": [["", ""]]}}}}"#,
        );

        let parts = collect_parts(&schema);
        assert!(!parts.group_by_active);
        assert!(parts.filters.is_empty());

        let sql = assemble(&parts, &no_joins("orders"));
        assert_eq!(
            sql,
            "SELECT\n    orders.total,\n    customers.id\nFROM orders\n"
        );
    }

    #[test]
    fn test_aggregate_triggers_group_by() {
        let schema = parse(
            r#"{"orders": {"alias": "", "columns": {"orders.total":
                {"aggregate": "sum", "alias": "", "hidden": false, "predicates": [["", ""]]}}},
                "customers": {"alias": "", "columns": {"customers.id":
                {"aggregate": "", "alias": "", "hidden": false, "predicates": [["", ""]]}}}}"#,
        );

        let parts = collect_parts(&schema);
        assert!(parts.group_by_active);
        assert_eq!(parts.aggregates, ["SUM(orders.total)"]);
        assert_eq!(parts.group_by, ["customers.id"]);

        let sql = assemble(&parts, &no_joins("orders"));
        assert_eq!(
            sql,
            "SELECT\n    customers.id,\n    SUM(orders.total)\n\
             FROM orders\nGROUP BY\n    customers.id\n"
        );
    }

    #[test]
    fn test_aliases_are_applied() {
        let parts = collect_parts(&overall(&[
            (
                "t.amount",
                r#"{"aggregate": "sum", "alias": "total_amount", "hidden": false,
                    "predicates": [["", ""]]}"#,
            ),
            (
                "t.name",
                r#"{"aggregate": "", "alias": "customer", "hidden": false,
                    "predicates": [["", ""]]}"#,
            ),
        ]));

        assert_eq!(parts.aggregates, ["SUM(t.amount) as total_amount"]);
        assert_eq!(parts.columns, ["t.name as customer"]);
        // GROUP BY lists the bare key, not the alias.
        assert_eq!(parts.group_by, ["t.name"]);
    }

    #[test]
    fn test_hidden_column_excluded_but_predicates_kept() {
        let parts = collect_parts(&overall(&[
            ("t.visible", PLAIN),
            (
                "t.secret",
                r#"{"aggregate": "", "alias": "", "hidden": true,
                    "predicates": [["=", "'x'"]]}"#,
            ),
        ]));

        assert_eq!(parts.columns, ["t.visible"]);
        assert_eq!(parts.group_by, ["t.visible"]);
        assert_eq!(parts.filters, ["t.secret = 'x'"]);

        let sql = assemble(&parts, &no_joins("t"));
        assert!(sql.contains("WHERE 1=1\nAND t.secret = 'x'\n"));
        assert!(!sql.contains("t.secret,"));
    }

    #[test]
    fn test_where_fragments_join_in_order() {
        let parts = collect_parts(&overall(&[
            (
                "t.total",
                r#"{"aggregate": "", "alias": "", "hidden": false,
                    "predicates": [[">", "100"], ["<", "900"]]}"#,
            ),
            (
                "t.status",
                r#"{"aggregate": "", "alias": "", "hidden": false,
                    "predicates": [["=", "'open'"]]}"#,
            ),
        ]));

        assert_eq!(
            parts.filters,
            ["t.total > 100 AND t.total < 900", "t.status = 'open'"]
        );

        let sql = assemble(&parts, &no_joins("t"));
        assert!(sql.contains(
            "WHERE 1=1\nAND t.total > 100 AND t.total < 900\nAND t.status = 'open'\n"
        ));
    }

    #[test]
    fn test_join_clauses_emitted_verbatim() {
        let parts = collect_parts(&overall(&[("t.id", PLAIN)]));
        let joins = JoinResolution {
            clauses: vec![
                "inner join c on c.id = t.c_id".to_string(),
                "left join a on a.t_id = t.id".to_string(),
            ],
            from_expr: "t".to_string(),
            has_joins: true,
        };

        let sql = assemble(&parts, &joins);
        assert_eq!(
            sql,
            "SELECT\n    t.id\nFROM t\n\
             inner join c on c.id = t.c_id\nleft join a on a.t_id = t.id\n"
        );
    }

    #[test]
    fn test_no_statement_terminator() {
        let parts = collect_parts(&overall(&[("t.id", PLAIN)]));
        let sql = assemble(&parts, &no_joins("t"));
        assert!(!sql.trim_end().ends_with(';'));
    }

    #[test]
    fn test_unannotated_leaves_are_skipped() {
        let schema = parse(r#"{"t": {"alias": "", "columns": {"t.id": 1}}}"#);
        let parts = collect_parts(&schema);
        assert!(parts.columns.is_empty());
    }
}
