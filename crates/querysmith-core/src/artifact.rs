//! Workspace artifact persistence.
//!
//! All pipeline state lives as plain files in one workspace directory: the
//! delimited source listing, the editable JSON schema artifacts, external
//! subquery SQL files, and the final query text. Reads of optional inputs
//! degrade to empty values; a present-but-malformed JSON artifact is fatal.

use std::fs;
use std::path::{Path, PathBuf};

use tracing::info;

use crate::error::{QuerysmithError, Result};
use crate::node::Node;

/// Reads and writes pipeline artifacts inside one workspace directory.
#[derive(Debug, Clone)]
pub struct ArtifactStore {
    root: PathBuf,
}

impl ArtifactStore {
    /// Creates a store rooted at the given workspace directory.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Returns the full path of a named artifact.
    #[must_use]
    pub fn path(&self, name: &str) -> PathBuf {
        self.root.join(name)
    }

    /// Returns true when the named artifact exists.
    #[must_use]
    pub fn exists(&self, name: &str) -> bool {
        self.path(name).exists()
    }

    /// Loads a delimited file as rows of fields.
    ///
    /// Fields are split on `delimiter` with surrounding double quotes
    /// stripped. An absent file is recoverable and yields no rows.
    pub fn load_delimited(&self, name: &str, delimiter: char) -> Result<Vec<Vec<String>>> {
        let path = self.path(name);
        if !path.exists() {
            info!(file = %path.display(), "Delimited source not found, treating as empty");
            return Ok(Vec::new());
        }

        let content = fs::read_to_string(&path)?;
        let rows = content
            .lines()
            .filter(|line| !line.trim().is_empty())
            .map(|line| {
                line.split(delimiter)
                    .map(|field| field.trim().trim_matches('"').to_string())
                    .collect()
            })
            .collect();
        Ok(rows)
    }

    /// Loads a line-oriented text file, trimming trailing whitespace per
    /// line. An absent file yields no lines.
    pub fn load_lines(&self, name: &str) -> Result<Vec<String>> {
        let path = self.path(name);
        if !path.exists() {
            info!(file = %path.display(), "Text file not found, treating as empty");
            return Ok(Vec::new());
        }

        let content = fs::read_to_string(&path)?;
        Ok(content
            .lines()
            .map(|line| line.trim_end().to_string())
            .collect())
    }

    /// Loads a JSON schema artifact.
    ///
    /// Returns `None` when the file is absent (the pipeline substitutes an
    /// empty structure); a file that exists but does not parse is fatal.
    pub fn load_structured(&self, name: &str) -> Result<Option<Node>> {
        let path = self.path(name);
        if !path.exists() {
            info!(file = %path.display(), "Artifact not found, treating as empty");
            return Ok(None);
        }

        let content = fs::read_to_string(&path)?;
        let node = serde_json::from_str(&content)
            .map_err(|source| QuerysmithError::MalformedArtifact { path, source })?;
        Ok(Some(node))
    }

    /// Writes a JSON schema artifact, overwriting any previous content.
    pub fn save_structured(&self, name: &str, node: &Node) -> Result<()> {
        let content = serde_json::to_string_pretty(node)?;
        self.write(name, &content)
    }

    /// Writes a JSON schema artifact only if it does not exist yet.
    ///
    /// First-generation artifacts are never clobbered before the human had
    /// a chance to edit them; later runs go through reconciliation and
    /// [`save_structured`](Self::save_structured) instead.
    ///
    /// Returns true when the file was written.
    pub fn save_structured_new(&self, name: &str, node: &Node) -> Result<bool> {
        if self.exists(name) {
            info!(file = %self.path(name).display(), "Artifact already exists, not overwriting");
            return Ok(false);
        }
        self.save_structured(name, node)?;
        Ok(true)
    }

    /// Writes plain text, overwriting any previous content.
    pub fn save_text(&self, name: &str, text: &str) -> Result<()> {
        self.write(name, text)
    }

    /// Writes one line per entry, overwriting any previous content.
    pub fn save_lines(&self, name: &str, lines: &[String]) -> Result<()> {
        let mut content = lines.join("\n");
        content.push('\n');
        self.write(name, &content)
    }

    fn write(&self, name: &str, content: &str) -> Result<()> {
        let path = self.path(name);
        if let Some(parent) = path.parent() {
            ensure_dir(parent)?;
        }
        fs::write(&path, content)?;
        Ok(())
    }
}

fn ensure_dir(path: &Path) -> Result<()> {
    if !path.exists() {
        fs::create_dir_all(path)?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::node::NodeMap;

    fn store() -> (tempfile::TempDir, ArtifactStore) {
        let dir = tempfile::tempdir().unwrap();
        let store = ArtifactStore::new(dir.path());
        (dir, store)
    }

    #[test]
    fn test_missing_delimited_is_empty() {
        let (_dir, store) = store();
        assert!(store.load_delimited("columns.csv", ';').unwrap().is_empty());
    }

    #[test]
    fn test_delimited_splits_and_strips_quotes() {
        let (_dir, store) = store();
        store
            .save_text("columns.csv", "\"orders\";\"id\"\norders;total\n\n")
            .unwrap();

        let rows = store.load_delimited("columns.csv", ';').unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0], ["orders", "id"]);
        assert_eq!(rows[1], ["orders", "total"]);
    }

    #[test]
    fn test_lines_trim_trailing_whitespace() {
        let (_dir, store) = store();
        store.save_text("sub.sql", "select id from x  \nwhere id > 0\n").unwrap();

        let lines = store.load_lines("sub.sql").unwrap();
        assert_eq!(lines, ["select id from x", "where id > 0"]);
    }

    #[test]
    fn test_structured_round_trip() {
        let (_dir, store) = store();
        let mut entries = NodeMap::new();
        entries.insert("alias".to_string(), Node::text("o"));
        let node = Node::Map(entries);

        store.save_structured("orders.json", &node).unwrap();
        assert_eq!(store.load_structured("orders.json").unwrap(), Some(node));
    }

    #[test]
    fn test_missing_structured_is_none() {
        let (_dir, store) = store();
        assert_eq!(store.load_structured("overall.json").unwrap(), None);
    }

    #[test]
    fn test_malformed_structured_is_fatal() {
        let (_dir, store) = store();
        store.save_text("overall.json", "{not json").unwrap();

        let err = store.load_structured("overall.json").unwrap_err();
        assert!(matches!(err, QuerysmithError::MalformedArtifact { .. }));
    }

    #[test]
    fn test_save_structured_new_does_not_clobber() {
        let (_dir, store) = store();
        let first = Node::Flag(1);
        let second = Node::Flag(2);

        assert!(store.save_structured_new("joins.json", &first).unwrap());
        assert!(!store.save_structured_new("joins.json", &second).unwrap());
        assert_eq!(store.load_structured("joins.json").unwrap(), Some(first));
    }

    #[test]
    fn test_save_lines_appends_newline() {
        let (_dir, store) = store();
        store
            .save_lines("out.txt", &["a".to_string(), "b".to_string()])
            .unwrap();
        let lines = store.load_lines("out.txt").unwrap();
        assert_eq!(lines, ["a", "b"]);
    }
}
