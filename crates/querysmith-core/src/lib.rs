//! Human-in-the-loop SQL SELECT generation.
//!
//! `querysmith-core` derives table and column structure from a delimited
//! source listing, persists it as editable JSON schema artifacts, and
//! assembles a SELECT statement from the annotations a human adds between
//! runs. Re-running never discards an edit: freshly discovered structure
//! is merged into the edited artifacts, and edited values always win.
//!
//! # Architecture
//!
//! - **Metadata** - parses the `table;column` listing into descriptors
//! - **Schema** - builds the generated schema, filters selections,
//!   enriches them into annotation records
//! - **Reconcile** - the generic recursive merge behind every save point
//! - **Joins** - directives, subquery expansion, FROM-clause anchoring
//! - **Render** - SELECT/FROM/JOIN/WHERE/GROUP BY text assembly
//! - **Artifact** - the narrow persistence layer for all workspace files
//! - **Pipeline** - the fixed stage sequence with three save points
//!
//! # Workflow
//!
//! ```text
//! run 1: columns.csv -> <table>.json, overall.json, joins.json
//! edit:  flag columns, set aggregations/aliases/predicates, mark the
//!        default table, wire joins
//! run 2: artifacts reconciled (edits kept, new structure absorbed),
//!        query.sql written
//! ```
//!
//! The tool never talks to a database and never validates the SQL it
//! emits beyond producing well-formed text.

pub mod artifact;
pub mod error;
pub mod joins;
pub mod metadata;
pub mod node;
pub mod pipeline;
pub mod reconcile;
pub mod render;
pub mod schema;

/// Prelude for convenient imports.
pub mod prelude {
    pub use crate::artifact::ArtifactStore;
    pub use crate::error::{QuerysmithError, Result};
    pub use crate::joins::{JoinDirective, JoinResolution};
    pub use crate::metadata::{TableDescriptor, TableIndex};
    pub use crate::node::{Node, NodeMap};
    pub use crate::pipeline::Pipeline;
    pub use crate::reconcile::merge;
    pub use crate::render::{assemble, collect_parts, SelectParts};
    pub use crate::schema::ColumnAnnotation;
}
