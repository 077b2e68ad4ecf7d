//! Reconciliation of freshly generated structure into edited artifacts.
//!
//! Every pipeline tier regenerates its schema from the source metadata and
//! merges it into the persisted, possibly hand-edited counterpart. The
//! merge only ever supplements: a leaf the human wrote is never
//! overwritten, and keys the human added are never pruned.

use crate::node::{Node, NodeMap};

/// Merges newly generated structure into an edited artifact.
///
/// Walks the generated side as the source of truth for *new* keys:
///
/// - a key absent from `edited` gets the whole generated subtree, which is
///   how newly discovered tables and columns show up for annotation;
/// - a key present on both sides recurses when both values are maps;
/// - in every other case the edited value wins unconditionally.
///
/// Keys present only in `edited` are left untouched; pruning stale
/// entries is an explicit separate step where it happens at all.
#[must_use]
pub fn merge(generated: &Node, mut edited: Node) -> Node {
    if let (Node::Map(generated_entries), Node::Map(edited_entries)) = (generated, &mut edited) {
        merge_entries(generated_entries, edited_entries);
    }
    edited
}

fn merge_entries(generated: &NodeMap, edited: &mut NodeMap) {
    for (key, generated_value) in generated {
        match edited.get_mut(key) {
            None => {
                edited.insert(key.clone(), generated_value.clone());
            }
            Some(Node::Map(edited_child)) => {
                if let Node::Map(generated_child) = generated_value {
                    merge_entries(generated_child, edited_child);
                }
            }
            // A leaf on either side: the edited value wins unconditionally.
            Some(_) => {}
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(json: &str) -> Node {
        serde_json::from_str(json).unwrap()
    }

    #[test]
    fn test_new_table_is_absorbed() {
        let generated = parse(r#"{"orders": {"alias": "", "columns": {"id": 0}}}"#);
        let edited = parse(r#"{}"#);

        let merged = merge(&generated, edited);
        assert_eq!(merged, generated);
    }

    #[test]
    fn test_new_column_is_absorbed() {
        let generated = parse(r#"{"orders": {"alias": "", "columns": {"id": 0, "total": 0}}}"#);
        let edited = parse(r#"{"orders": {"alias": "o", "columns": {"id": 1}}}"#);

        let merged = merge(&generated, edited);
        let columns = merged.get("orders").unwrap().get("columns").unwrap();
        assert_eq!(columns.get("id").unwrap().as_flag(), Some(1));
        assert_eq!(columns.get("total").unwrap().as_flag(), Some(0));
    }

    #[test]
    fn test_edited_leaf_wins() {
        let generated = parse(r#"{"orders": {"alias": "", "columns": {"id": 0}}}"#);
        let edited = parse(r#"{"orders": {"alias": "ord", "columns": {"id": 1}}}"#);

        let merged = merge(&generated, edited);
        let orders = merged.get("orders").unwrap();
        assert_eq!(orders.get("alias").unwrap().as_text(), Some("ord"));
        assert_eq!(
            orders.get("columns").unwrap().get("id").unwrap().as_flag(),
            Some(1)
        );
    }

    #[test]
    fn test_edited_only_keys_survive() {
        let generated = parse(r#"{"orders": {"alias": "", "columns": {"id": 0}}}"#);
        let edited = parse(
            r#"{"orders": {"alias": "", "columns": {"id": 0, "legacy_total": 1}},
                "archive": {"alias": "", "columns": {}}}"#,
        );

        let merged = merge(&generated, edited);
        assert!(merged.get("archive").is_some());
        let columns = merged.get("orders").unwrap().get("columns").unwrap();
        assert_eq!(columns.get("legacy_total").unwrap().as_flag(), Some(1));
    }

    #[test]
    fn test_structured_edit_wins_over_generated_leaf() {
        // An annotated column in the edited artifact keeps its record even
        // though the freshly generated side only knows the 0 sentinel.
        let generated = parse(r#"{"orders": {"columns": {"total": 0}}}"#);
        let edited = parse(
            r#"{"orders": {"columns": {"total": {"aggregate": "sum", "alias": "",
                "hidden": false, "predicates": [["", ""]]}}}}"#,
        );

        let merged = merge(&generated, edited.clone());
        assert_eq!(merged, edited);
    }

    #[test]
    fn test_merge_is_idempotent() {
        let generated = parse(r#"{"orders": {"alias": "", "columns": {"id": 0, "total": 0}}}"#);
        let edited = parse(r#"{"orders": {"alias": "o", "columns": {"total": 1}}}"#);

        let once = merge(&generated, edited);
        let twice = merge(&generated, once.clone());
        assert_eq!(once, twice);
    }

    #[test]
    fn test_merge_used_on_join_directives() {
        // The same merge reconciles the structurally different joins tier.
        let generated = parse(
            r#"{"orders": {"default": false, "subquery": false, "source": "",
                "bindings": [["", ""]]},
                "customers": {"default": false, "subquery": false, "source": "",
                "bindings": [["", ""]]}}"#,
        );
        let edited = parse(
            r#"{"orders": {"default": true, "subquery": false, "source": "",
                "bindings": [["", ""]]}}"#,
        );

        let merged = merge(&generated, edited);
        assert_eq!(
            merged.get("orders").unwrap().get("default").unwrap().as_bool(),
            Some(true)
        );
        assert!(merged.get("customers").is_some());
    }
}
