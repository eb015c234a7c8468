//! Raw-to-clean stage: normalize, project, sanitize, write

use std::path::Path;
use tracing::info;

use super::csv_loader::{load_table, write_table};
use super::normalizer::ColumnNormalizer;
use super::sanitizer::sanitize;
use super::schema::{project, TableKind};
use super::table::Table;
use crate::error::Result;

/// Summary of one cleaning run
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CleanSummary {
    pub kind: TableKind,
    pub raw_rows: usize,
    pub clean_rows: usize,
}

/// Turn a raw scraped table into the canonical schema
pub fn clean_table(raw: &Table, kind: TableKind) -> Table {
    let normalized = ColumnNormalizer::new(kind).normalize(raw);
    let projected = project(&normalized, kind.target_columns());
    sanitize(projected, kind)
}

/// Clean one raw CSV file into its canonical CSV file
pub fn clean_file<P: AsRef<Path>, Q: AsRef<Path>>(
    raw_path: P,
    clean_path: Q,
    kind: TableKind,
) -> Result<CleanSummary> {
    info!("Reading raw {} data from {:?}", kind.label(), raw_path.as_ref());
    let raw = load_table(raw_path)?;

    let cleaned = clean_table(&raw, kind);
    write_table(&cleaned, &clean_path)?;

    info!(
        "Saved {} cleaned {} rows ({} raw) to {:?}",
        cleaned.height(),
        kind.label(),
        raw.height(),
        clean_path.as_ref()
    );

    Ok(CleanSummary {
        kind,
        raw_rows: raw.height(),
        clean_rows: cleaned.height(),
    })
}
