//! Composite key handling for joins, dedupe and diff alignment

use super::table::{CellValue, Row, Table};
use crate::error::Result;

/// A composite key: the cells of the key columns, in key order
pub type RowKey = Vec<CellValue>;

/// Builder for computing composite keys
#[derive(Debug, Clone, Default)]
pub struct KeyBuilder {
    column_indices: Vec<usize>,
}

impl KeyBuilder {
    /// Key over every column of a row
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the key columns by index
    pub fn with_columns(mut self, indices: Vec<usize>) -> Self {
        self.column_indices = indices;
        self
    }

    /// Resolve key columns by name; every name must exist in the table
    pub fn for_table(table: &Table, names: &[String]) -> Result<Self> {
        Ok(Self::new().with_columns(table.require_columns(names)?))
    }

    /// Build a key from a row's cells
    pub fn build_key(&self, cells: &[CellValue]) -> RowKey {
        if self.column_indices.is_empty() {
            // Use all columns if no key columns specified
            cells.to_vec()
        } else {
            self.column_indices
                .iter()
                .map(|&i| cells.get(i).cloned().unwrap_or(CellValue::Null))
                .collect()
        }
    }

    pub fn row_key(&self, row: &Row) -> RowKey {
        self.build_key(&row.cells)
    }

    /// Get the column indices
    pub fn column_indices(&self) -> &[usize] {
        &self.column_indices
    }

    /// Check if key columns are set
    pub fn has_key_columns(&self) -> bool {
        !self.column_indices.is_empty()
    }
}

/// Render a key for messages, e.g. `(1, "Jo")`
pub fn format_key(key: &[CellValue]) -> String {
    let parts: Vec<String> = key
        .iter()
        .map(|c| match c {
            CellValue::String(s) => format!("{:?}", &**s),
            CellValue::Null => "<missing>".to_string(),
            other => other.display().into_owned(),
        })
        .collect();
    format!("({})", parts.join(", "))
}
