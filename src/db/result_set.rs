//! In-memory result sets.
//!
//! A [`StoredResultSet`] is a full snapshot of a query's output, decoupled
//! from the live cursor the moment it is built. Row and column counts are
//! fixed at construction; the grid is never resized.

use serde::Serialize;
use serde_json::Value as JsonValue;

/// A rectangular, fully materialized snapshot of a query result.
///
/// Cell access is 1-based for both row and column, mirroring the cursor
/// convention the bot's data code was written against.
#[derive(Debug, Clone, Serialize, Default)]
pub struct StoredResultSet {
    columns: Vec<String>,
    rows: Vec<Vec<JsonValue>>,
}

impl StoredResultSet {
    /// An empty result set with no columns and no rows.
    pub fn empty() -> Self {
        Self::default()
    }

    /// Build a result set from an ordered column list and row grid.
    ///
    /// Every row must have exactly one cell per column.
    pub(crate) fn new(columns: Vec<String>, rows: Vec<Vec<JsonValue>>) -> Self {
        debug_assert!(rows.iter().all(|r| r.len() == columns.len()));
        Self { columns, rows }
    }

    /// Number of columns in the projection.
    pub fn column_count(&self) -> usize {
        self.columns.len()
    }

    /// Number of rows captured.
    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    /// Ordered column names, as reported by the statement.
    pub fn column_names(&self) -> &[String] {
        &self.columns
    }

    /// Name of the 1-based `column`, if in range.
    pub fn column_name(&self, column: usize) -> Option<&str> {
        column
            .checked_sub(1)
            .and_then(|i| self.columns.get(i))
            .map(String::as_str)
    }

    /// True if at least one row was captured.
    pub fn has_results(&self) -> bool {
        !self.rows.is_empty()
    }

    /// Cell at 1-based `(row, column)`, or `None` when out of range.
    pub fn value(&self, row: usize, column: usize) -> Option<&JsonValue> {
        let row = self.rows.get(row.checked_sub(1)?)?;
        row.get(column.checked_sub(1)?)
    }

    /// Iterate over the captured rows in order.
    pub fn iter_rows(&self) -> impl Iterator<Item = &[JsonValue]> {
        self.rows.iter().map(Vec::as_slice)
    }
}
