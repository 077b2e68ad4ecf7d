//! Source metadata: the delimited table/column listing.
//!
//! The listing is produced by running a data-dictionary query against the
//! source database and exporting the result as `table;column` rows. This
//! module turns those rows into table descriptors and can also generate
//! the data-dictionary query itself.

/// Header field marking the table column of the listing.
const TABLE_HEADER: &str = "table";
/// Header field marking the column column of the listing.
const COLUMN_HEADER: &str = "column";

/// A single source table: its name and ordered column list.
///
/// Built once from the listing and immutable afterwards.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableDescriptor {
    /// Table name, lower-cased.
    pub name: String,
    /// Column names in listing order, lower-cased.
    pub columns: Vec<String>,
}

/// All tables discovered in the source listing.
#[derive(Debug, Clone, Default)]
pub struct TableIndex {
    tables: Vec<TableDescriptor>,
}

impl TableIndex {
    /// Builds the index from raw delimited rows.
    ///
    /// Every field is lower-cased first so reconciliation keys stay
    /// comparable across runs. Header rows and rows with a blank table or
    /// column field are skipped. Table names are deduplicated keeping
    /// first-seen order.
    #[must_use]
    pub fn from_rows(rows: &[Vec<String>]) -> Self {
        let rows: Vec<(String, String)> = rows
            .iter()
            .filter(|row| row.len() >= 2)
            .map(|row| (row[0].to_lowercase(), row[1].to_lowercase()))
            .filter(|(table, column)| {
                !table.is_empty()
                    && !column.is_empty()
                    && table != TABLE_HEADER
                    && column != COLUMN_HEADER
            })
            .collect();

        let mut tables: Vec<TableDescriptor> = Vec::new();
        for (table, column) in rows {
            match tables.iter_mut().find(|t| t.name == table) {
                Some(descriptor) => descriptor.columns.push(column),
                None => tables.push(TableDescriptor {
                    name: table,
                    columns: vec![column],
                }),
            }
        }

        Self { tables }
    }

    /// Returns the table descriptors in first-seen order.
    #[must_use]
    pub fn tables(&self) -> &[TableDescriptor] {
        &self.tables
    }

    /// Returns the table names in first-seen order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.tables.iter().map(|t| t.name.as_str())
    }

    /// Returns true when no tables were discovered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.tables.is_empty()
    }
}

/// Builds the data-dictionary statement that produces the column listing.
///
/// Given the plain table list the operator maintains by hand, emits one
/// `UNION ALL` arm per table against `ALL_TAB_COLUMNS`. Running the result
/// against the source database yields the rows [`TableIndex::from_rows`]
/// consumes.
#[must_use]
pub fn listing_statement(tables: &[String], owner: &str) -> String {
    let mut statement = String::new();

    for (position, table) in tables.iter().enumerate() {
        statement.push_str(&format!(
            "SELECT '{}' AS TABLE_NAME, COLUMN_NAME, COLUMN_ID \
             FROM ALL_TAB_COLUMNS WHERE TABLE_NAME='{}' AND OWNER='{}'\n",
            table.to_lowercase(),
            table.to_uppercase(),
            owner,
        ));
        if position != tables.len() - 1 {
            statement.push_str("UNION ALL\n");
        }
    }

    statement.push_str("ORDER BY TABLE_NAME, COLUMN_ID;\n");
    statement
}
