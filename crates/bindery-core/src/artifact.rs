//! Materialised tabular artifacts.
//!
//! Tables are produced elsewhere (uploads, query engines) and referenced from
//! bindings by [`ArtifactId`]. At execution time a `table` parameter may
//! arrive as an id; the executor resolves it through an [`ArtifactStore`].

use std::collections::HashMap;
use std::fmt;
use std::sync::RwLock;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::value::Value;

/// Identifier of a stored artifact.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ArtifactId(String);

impl ArtifactId {
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Fresh random id.
    #[must_use]
    pub fn generate() -> Self {
        Self(Uuid::new_v4().to_string())
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ArtifactId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Errors from building a [`Table`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TableError {
    /// A row did not have one cell per column.
    RowWidth { expected: usize, found: usize },
    /// The same column name appeared twice.
    DuplicateColumn(String),
}

impl fmt::Display for TableError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::RowWidth { expected, found } => {
                write!(f, "row has {found} cells, table has {expected} columns")
            }
            Self::DuplicateColumn(name) => write!(f, "duplicate column '{name}'"),
        }
    }
}

impl std::error::Error for TableError {}

/// A small row-major table.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Table {
    columns: Vec<String>,
    rows: Vec<Vec<Value>>,
}

impl Table {
    /// Create an empty table with the given columns.
    pub fn new<I, S>(columns: I) -> Result<Self, TableError>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut names: Vec<String> = Vec::new();
        for col in columns {
            let col = col.into();
            if names.contains(&col) {
                return Err(TableError::DuplicateColumn(col));
            }
            names.push(col);
        }
        Ok(Self {
            columns: names,
            rows: Vec::new(),
        })
    }

    /// Append a row; its width must match the column count.
    pub fn push_row(&mut self, row: Vec<Value>) -> Result<(), TableError> {
        if row.len() != self.columns.len() {
            return Err(TableError::RowWidth {
                expected: self.columns.len(),
                found: row.len(),
            });
        }
        self.rows.push(row);
        Ok(())
    }

    #[must_use]
    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    #[must_use]
    pub fn rows(&self) -> &[Vec<Value>] {
        &self.rows
    }

    #[must_use]
    pub fn num_rows(&self) -> usize {
        self.rows.len()
    }

    /// All cells of one column, top to bottom.
    #[must_use]
    pub fn column(&self, name: &str) -> Option<Vec<Value>> {
        let idx = self.columns.iter().position(|c| c == name)?;
        Some(self.rows.iter().map(|row| row[idx].clone()).collect())
    }

    pub(crate) fn to_json(&self) -> serde_json::Value {
        serde_json::json!({
            "columns": self.columns,
            "rows": self
                .rows
                .iter()
                .map(|row| row.iter().map(Value::to_json).collect::<Vec<_>>())
                .collect::<Vec<_>>(),
        })
    }
}

/// Lookup of materialised tables by id.
pub trait ArtifactStore {
    /// Load the table stored under `id`, if any.
    fn load(&self, id: &ArtifactId) -> Option<Table>;
}

/// In-process artifact store.
#[derive(Debug, Default)]
pub struct MemoryArtifacts {
    tables: RwLock<HashMap<ArtifactId, Table>>,
}

impl MemoryArtifacts {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Store a table under a fresh id and return the id.
    pub fn insert(&self, table: Table) -> ArtifactId {
        let id = ArtifactId::generate();
        self.insert_with_id(id.clone(), table);
        id
    }

    /// Store a table under a caller-chosen id, replacing any previous table.
    pub fn insert_with_id(&self, id: ArtifactId, table: Table) {
        let mut tables = self
            .tables
            .write()
            .unwrap_or_else(std::sync::PoisonError::into_inner);
        tables.insert(id, table);
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.tables
            .read()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
            .len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl ArtifactStore for MemoryArtifacts {
    fn load(&self, id: &ArtifactId) -> Option<Table> {
        self.tables
            .read()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
            .get(id)
            .cloned()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Table {
        let mut t = Table::new(["city", "temp"]).unwrap();
        t.push_row(vec![Value::from("Oslo"), Value::Int(4)]).unwrap();
        t.push_row(vec![Value::from("Rome"), Value::Int(19)]).unwrap();
        t
    }

    #[test]
    fn column_extracts_cells_in_order() {
        let t = sample();
        assert_eq!(t.column("temp"), Some(vec![Value::Int(4), Value::Int(19)]));
        assert_eq!(t.column("missing"), None);
    }

    #[test]
    fn row_width_is_checked() {
        let mut t = sample();
        let err = t.push_row(vec![Value::Null]).unwrap_err();
        assert_eq!(
            err,
            TableError::RowWidth {
                expected: 2,
                found: 1
            }
        );
    }

    #[test]
    fn duplicate_columns_rejected() {
        assert_eq!(
            Table::new(["a", "a"]).unwrap_err(),
            TableError::DuplicateColumn("a".into())
        );
    }

    #[test]
    fn memory_store_roundtrip() {
        let store = MemoryArtifacts::new();
        let id = store.insert(sample());
        assert_eq!(store.load(&id), Some(sample()));
        assert_eq!(store.load(&ArtifactId::new("nope")), None);
        assert_eq!(store.len(), 1);
    }
}
