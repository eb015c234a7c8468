//! In-memory text table shared by the raw and cleaned stages
//!
//! Every cell is text or missing. Typed conversion happens later, once the
//! columns are canonical.

use crate::error::{PipelineError, Result};

/// A single cell; `None` is a missing value
pub type Cell = Option<String>;

/// Treat empty or whitespace-only text as missing
pub fn clean_cell(value: &str) -> Cell {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_string())
    }
}

/// Column-labelled rows of optional text
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Table {
    columns: Vec<String>,
    rows: Vec<Vec<Cell>>,
}

impl Table {
    /// Create an empty table with the given columns
    pub fn new(columns: Vec<String>) -> Self {
        Self {
            columns,
            rows: Vec::new(),
        }
    }

    /// Create a table, checking every row has one cell per column
    pub fn from_rows(columns: Vec<String>, rows: Vec<Vec<Cell>>) -> Result<Self> {
        let mut table = Self::new(columns);
        for row in rows {
            table.push_row(row)?;
        }
        Ok(table)
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn rows(&self) -> &[Vec<Cell>] {
        &self.rows
    }

    /// Number of rows
    pub fn height(&self) -> usize {
        self.rows.len()
    }

    /// Number of columns
    pub fn width(&self) -> usize {
        self.columns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c == name)
    }

    pub fn push_row(&mut self, row: Vec<Cell>) -> Result<()> {
        if row.len() != self.columns.len() {
            return Err(PipelineError::RowWidth {
                expected: self.columns.len(),
                actual: row.len(),
            });
        }
        self.rows.push(row);
        Ok(())
    }

    /// Value at (row, column name), `None` when missing or the column is absent
    pub fn get(&self, row: usize, column: &str) -> Option<&str> {
        let idx = self.column_index(column)?;
        self.rows.get(row)?.get(idx)?.as_deref()
    }

    /// All values of a column in row order
    pub fn column_values(&self, column: &str) -> Option<Vec<Option<&str>>> {
        let idx = self.column_index(column)?;
        Some(self.rows.iter().map(|r| r[idx].as_deref()).collect())
    }

    /// Overwrite a cell by column index
    pub fn set(&mut self, row: usize, column: usize, value: Cell) {
        if let Some(cell) = self.rows.get_mut(row).and_then(|r| r.get_mut(column)) {
            *cell = value;
        }
    }

    /// Keep only rows matching the predicate, preserving order
    pub fn retain_rows<F>(&mut self, mut keep: F)
    where
        F: FnMut(&[Cell]) -> bool,
    {
        self.rows.retain(|row| keep(row));
    }

    /// Append a column, filling existing rows with `value`
    pub fn add_column(&mut self, name: &str, value: Cell) {
        self.columns.push(name.to_string());
        for row in &mut self.rows {
            row.push(value.clone());
        }
    }

    /// Build a new table whose columns are drawn from this one
    ///
    /// Each output column lists its source column indices; every cell takes
    /// the first non-missing source value. An empty or out-of-range source
    /// list gives an all-missing column.
    pub fn gather(&self, columns: Vec<(String, Vec<usize>)>) -> Table {
        let rows = self
            .rows
            .iter()
            .map(|row| {
                columns
                    .iter()
                    .map(|(_, sources)| {
                        sources
                            .iter()
                            .find_map(|&i| row.get(i).cloned().flatten())
                    })
                    .collect()
            })
            .collect();

        Table {
            columns: columns.into_iter().map(|(name, _)| name).collect(),
            rows,
        }
    }

    /// Stack tables vertically over the union of their columns
    ///
    /// Columns keep first-seen order; cells a table lacks are missing.
    pub fn concat(tables: Vec<Table>) -> Table {
        let mut columns: Vec<String> = Vec::new();
        for table in &tables {
            for col in &table.columns {
                if !columns.contains(col) {
                    columns.push(col.clone());
                }
            }
        }

        let mut out = Table::new(columns);
        for table in tables {
            let mapping: Vec<Option<usize>> = out
                .columns
                .iter()
                .map(|c| table.column_index(c))
                .collect();
            for row in table.rows {
                let new_row = mapping
                    .iter()
                    .map(|idx| idx.and_then(|i| row[i].clone()))
                    .collect();
                out.rows.push(new_row);
            }
        }
        out
    }
}
