//! Column name normalization
//!
//! Scraped tables carry eleven seasons of header drift: multi-row headers
//! serialized as tuple literals, Portuguese and English spellings, and
//! footnote variants. This module maps all of them to one canonical label per
//! concept and coalesces columns that collapse onto the same label.

use std::collections::{BTreeMap, HashMap};

use super::schema::TableKind;
use super::table::Table;

/// Historical race-table spellings mapped to canonical labels
const RACE_RENAMES: &[(&str, &str)] = &[
    ("Pos.", "Pos"),
    ("Nu.", "No"),
    ("No.", "No"),
    ("Nº", "No"),
    ("N.º", "No"),
    ("N°", "No"),
    ("Num.", "No"),
    ("Não.", "No"),
    ("Pilotos", "Piloto"),
    ("Driver", "Piloto"),
    ("Motorista", "Piloto"),
    ("Construtora", "Construtor"),
    ("Equipe", "Construtor"),
    ("Constructor", "Construtor"),
    ("Voltas'", "Voltas"),
    ("Laps", "Voltas"),
    ("Tempo/retirada", "Tempo/Retirado"),
    ("Tempo/Retirada", "Tempo/Retirado"),
    ("Tempo/Aposentado", "Tempo/Retirado"),
    ("Tempo/Abandono", "Tempo/Retirado"),
    ("Tempo/Diferença", "Tempo/Retirado"),
    ("Time/Retired", "Tempo/Retirado"),
    ("Tempo", "Tempo/Retirado"),
    ("Points", "Pontos"),
    ("Pts.", "Pontos"),
    ("Grade", "Grid"),
    ("Grid final", "Grid"),
    ("Final grid", "Grid"),
    ("Grid 1", "Grid"),
    ("Grid 2", "Grid"),
];

/// Historical qualifying-table spellings mapped to canonical labels
const QUALIFYING_RENAMES: &[(&str, &str)] = &[
    ("Pos.", "Pos"),
    ("No.", "No"),
    ("Nº", "No"),
    ("N.º", "No"),
    ("Nu.", "No"),
    ("N°", "No"),
    ("Driver", "Piloto"),
    ("Constructor", "Construtor"),
    ("Construtora", "Construtor"),
    ("Equipe", "Construtor"),
    ("Grid final", "Grid"),
    ("Final grid", "Grid"),
];

/// Parse a Python-style tuple of string literals, e.g. `('Pos.', 'Pos.')`
///
/// Returns `None` for anything that is not a well-formed tuple of strings.
/// A single element followed by a comma (`('Q1',)`) is a one-tuple; a
/// parenthesized string without the comma is not a tuple at all.
pub fn parse_tuple_literal(raw: &str) -> Option<Vec<String>> {
    let inner = raw.trim().strip_prefix('(')?.strip_suffix(')')?;
    let mut chars = inner.chars().peekable();
    let mut items = Vec::new();
    let mut saw_comma = false;

    loop {
        while chars.peek().is_some_and(|c| c.is_whitespace()) {
            chars.next();
        }
        let quote = match chars.next() {
            None => break,
            Some(q @ ('\'' | '"')) => q,
            Some(_) => return None,
        };

        let mut item = String::new();
        loop {
            match chars.next()? {
                '\\' => {
                    let escaped = chars.next()?;
                    match escaped {
                        'n' => item.push('\n'),
                        't' => item.push('\t'),
                        other => item.push(other),
                    }
                }
                c if c == quote => break,
                c => item.push(c),
            }
        }
        items.push(item);

        while chars.peek().is_some_and(|c| c.is_whitespace()) {
            chars.next();
        }
        match chars.next() {
            None => break,
            Some(',') => saw_comma = true,
            Some(_) => return None,
        }
    }

    if items.is_empty() || (items.len() == 1 && !saw_comma) {
        return None;
    }
    Some(items)
}

/// Collapse a possibly tuple-shaped label to a single header level
///
/// Tuples of two or more levels take the second level unless it is empty, in
/// which case the first level is used. Everything else passes through.
pub fn clean_column_name(raw: &str) -> String {
    match parse_tuple_literal(raw) {
        Some(levels) if levels.len() > 1 => {
            if levels[1].is_empty() {
                levels[0].clone()
            } else {
                levels[1].clone()
            }
        }
        _ => raw.to_string(),
    }
}

/// Maps raw labels to canonical labels for one table kind
pub struct ColumnNormalizer {
    renames: HashMap<&'static str, &'static str>,
}

impl ColumnNormalizer {
    pub fn new(kind: TableKind) -> Self {
        let pairs = match kind {
            TableKind::Race => RACE_RENAMES,
            TableKind::Qualifying => QUALIFYING_RENAMES,
        };
        Self {
            renames: pairs.iter().copied().collect(),
        }
    }

    /// Canonical label for one raw label
    pub fn canonical_label(&self, raw: &str) -> String {
        let cleaned = clean_column_name(raw);
        match self.renames.get(cleaned.as_str()) {
            Some(canonical) => canonical.to_string(),
            None => cleaned,
        }
    }

    /// Canonical labels for a header row, one per input label
    pub fn canonical_labels(&self, raw: &[String]) -> Vec<String> {
        raw.iter().map(|label| self.canonical_label(label)).collect()
    }

    /// Rename every column and coalesce the ones sharing a label
    ///
    /// Output columns are in lexicographic label order. For labels backed by
    /// several input columns each row takes the first non-missing value, in
    /// input column order.
    pub fn normalize(&self, table: &Table) -> Table {
        let labels = self.canonical_labels(table.columns());

        let mut groups: BTreeMap<&str, Vec<usize>> = BTreeMap::new();
        for (idx, label) in labels.iter().enumerate() {
            groups.entry(label.as_str()).or_default().push(idx);
        }

        table.gather(
            groups
                .into_iter()
                .map(|(label, sources)| (label.to_string(), sources))
                .collect(),
        )
    }
}
