//! The fixed generation pipeline.
//!
//! One run regenerates the schema from the source listing and passes three
//! reconciliation save points: the per-table artifacts, the overall
//! schema, and the join directives. Each save point persists the merged
//! view back to disk, so the human can annotate between runs and re-run
//! without losing edits. A run with no intervening edits changes nothing.
//!
//! Artifact writes that fail are logged and the run continues; losing one
//! save leaves disk state a run behind but never aborts the pipeline.

use tracing::{info, warn};

use crate::artifact::ArtifactStore;
use crate::error::Result;
use crate::joins::{self, seed_directives};
use crate::metadata::TableIndex;
use crate::node::{Node, NodeMap};
use crate::reconcile::merge;
use crate::render::{assemble, collect_parts};
use crate::schema::{build_schema, enrich, promote_unannotated, select_columns};

/// Source listing with `table;column` rows.
pub const METADATA_FILE: &str = "columns.csv";
/// Overall (tier two) schema artifact.
pub const OVERALL_FILE: &str = "overall.json";
/// Join directive (tier three) artifact.
pub const JOINS_FILE: &str = "joins.json";
/// Final assembled statement.
pub const OUTPUT_FILE: &str = "query.sql";

const METADATA_DELIMITER: char = ';';

/// Runs the generation stages in their fixed order.
#[derive(Debug)]
pub struct Pipeline {
    store: ArtifactStore,
}

impl Pipeline {
    /// Creates a pipeline over the given workspace.
    #[must_use]
    pub fn new(store: ArtifactStore) -> Self {
        Self { store }
    }

    /// Runs the whole pipeline once and returns the assembled SQL.
    ///
    /// Absent source metadata ends the run early with empty output: the
    /// tool is legitimately invoked before any metadata exists. A
    /// malformed artifact or an unanchored FROM clause is fatal.
    pub fn run(&self) -> Result<String> {
        info!("Starting query generation run");

        let rows = self.store.load_delimited(METADATA_FILE, METADATA_DELIMITER)?;
        let index = TableIndex::from_rows(&rows);
        if index.is_empty() {
            info!("No source metadata found, nothing to generate yet");
            return Ok(String::new());
        }
        info!(tables = index.tables().len(), "Source metadata loaded");

        let generated = build_schema(&index);
        let edited = self.reconcile_tables(&index, &generated)?;

        let mut selected = select_columns(&edited);
        enrich(&mut selected);
        let overall = self.reconcile_overall(&selected)?;

        let seeded = seed_directives(index.names());
        let directives = self.reconcile_joins(&seeded)?;

        let resolution = joins::resolve(&directives, &self.store)?;
        let parts = collect_parts(&overall);
        let sql = assemble(&parts, &resolution);

        if let Err(error) = self.store.save_text(OUTPUT_FILE, &sql) {
            warn!(artifact = OUTPUT_FILE, %error, "Failed to save output, continuing");
        }

        info!("Query generation run finished");
        Ok(sql)
    }

    /// Tier one: one artifact per table, reconciled and re-saved.
    fn reconcile_tables(&self, index: &TableIndex, generated: &Node) -> Result<Node> {
        // First run for a table: write its generated subtree so the human
        // has something to annotate.
        for table in index.names() {
            let artifact = table_artifact(table);
            if !self.store.exists(&artifact) {
                if let Some(subtree) = generated.get(table) {
                    self.save_or_warn(&artifact, &single_entry(table, subtree.clone()));
                }
            }
        }

        // Gather the edited per-table artifacts into one schema.
        let mut edited = NodeMap::new();
        for table in index.names() {
            match self.store.load_structured(&table_artifact(table))? {
                Some(Node::Map(entries)) => edited.extend(entries),
                Some(_) => {
                    warn!(table = %table, "Per-table artifact is not a mapping, ignoring");
                }
                None => {}
            }
        }

        let merged = merge(generated, Node::Map(edited));

        // Save point: persist the reconciled view back, table by table.
        if let Some(tables) = merged.as_map() {
            for table in index.names() {
                if let Some(subtree) = tables.get(table) {
                    self.save_or_warn(&table_artifact(table), &single_entry(table, subtree.clone()));
                }
            }
        }

        Ok(merged)
    }

    /// Tier two: the overall schema, merged with edits and promoted.
    fn reconcile_overall(&self, enriched: &Node) -> Result<Node> {
        self.save_new_or_warn(OVERALL_FILE, enriched);

        let edited = self
            .store
            .load_structured(OVERALL_FILE)?
            .unwrap_or_else(Node::empty_map);
        let mut overall = merge(enriched, edited);
        promote_unannotated(&mut overall);

        self.save_or_warn(OVERALL_FILE, &overall);
        Ok(overall)
    }

    /// Tier three: the join directives, merged with edits.
    fn reconcile_joins(&self, seeded: &Node) -> Result<Node> {
        self.save_new_or_warn(JOINS_FILE, seeded);

        let edited = self
            .store
            .load_structured(JOINS_FILE)?
            .unwrap_or_else(Node::empty_map);
        let directives = merge(seeded, edited);

        self.save_or_warn(JOINS_FILE, &directives);
        Ok(directives)
    }

    fn save_or_warn(&self, name: &str, node: &Node) {
        if let Err(error) = self.store.save_structured(name, node) {
            warn!(artifact = %name, %error, "Failed to save artifact, continuing");
        }
    }

    fn save_new_or_warn(&self, name: &str, node: &Node) {
        if let Err(error) = self.store.save_structured_new(name, node) {
            warn!(artifact = %name, %error, "Failed to save artifact, continuing");
        }
    }
}

fn table_artifact(table: &str) -> String {
    format!("{table}.json")
}

fn single_entry(key: &str, value: Node) -> Node {
    let mut entries = NodeMap::new();
    entries.insert(key.to_string(), value);
    Node::Map(entries)
}
