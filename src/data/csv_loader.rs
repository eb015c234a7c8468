//! CSV loading and writing for raw and cleaned tables

use polars::prelude::*;
use std::fs;
use std::io::Write;
use std::path::Path;

use super::table::{clean_cell, Table};
use crate::error::{PipelineError, Result};

const UTF8_BOM: &str = "\u{feff}";

/// Load a CSV file keeping every column as text
///
/// Schema inference is disabled so values like `"07"` or `"1:23.456"` are
/// never coerced before the cleaning stage sees them.
pub fn load_table<P: AsRef<Path>>(csv_path: P) -> Result<Table> {
    let path = csv_path.as_ref();
    if !path.exists() {
        return Err(PipelineError::MissingInput(path.to_path_buf()));
    }

    let df = CsvReadOptions::default()
        .with_has_header(true)
        .with_infer_schema_length(Some(0))
        .try_into_reader_with_file_path(Some(path.to_path_buf()))?
        .finish()?;

    dataframe_to_table(&df)
}

/// Convert a string-typed DataFrame into a Table
fn dataframe_to_table(df: &DataFrame) -> Result<Table> {
    let columns: Vec<String> = df
        .get_columns()
        .iter()
        .map(|c| c.name().trim_start_matches(UTF8_BOM).to_string())
        .collect();

    let mut string_cols = Vec::with_capacity(df.width());
    for column in df.get_columns() {
        string_cols.push(column.str()?);
    }

    let mut rows = Vec::with_capacity(df.height());
    for i in 0..df.height() {
        let row = string_cols
            .iter()
            .map(|col| col.get(i).and_then(clean_cell))
            .collect();
        rows.push(row);
    }

    Table::from_rows(columns, rows)
}

/// Quote a CSV field when it holds a delimiter, quote or line break
fn escape_field(value: &str) -> String {
    if value.contains(',') || value.contains('"') || value.contains('\n') || value.contains('\r') {
        format!("\"{}\"", value.replace('"', "\"\""))
    } else {
        value.to_string()
    }
}

/// Render a table as UTF-8 CSV text with a byte-order mark
pub fn table_to_csv(table: &Table) -> String {
    let mut out = String::from(UTF8_BOM);

    let header: Vec<String> = table.columns().iter().map(|c| escape_field(c)).collect();
    out.push_str(&header.join(","));
    out.push('\n');

    for row in table.rows() {
        let values: Vec<String> = row
            .iter()
            .map(|cell| cell.as_deref().map(escape_field).unwrap_or_default())
            .collect();
        out.push_str(&values.join(","));
        out.push('\n');
    }

    out
}

/// Write a table, replacing any previous file in one rename
pub fn write_table<P: AsRef<Path>>(table: &Table, path: P) -> Result<()> {
    let path = path.as_ref();
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)?;
        }
    }

    let tmp_path = path.with_extension("csv.tmp");
    {
        let mut file = fs::File::create(&tmp_path)?;
        file.write_all(table_to_csv(table).as_bytes())?;
        file.sync_all()?;
    }
    fs::rename(&tmp_path, path)?;

    Ok(())
}
