//! Row sanitization for canonical tables
//!
//! Expects every canonical column to be present (run the schema projector
//! first).

use std::collections::HashMap;

use super::schema::TableKind;
use super::table::{Cell, Table};

/// Substrings that mark a repeated header row parsed as data
const HEADER_ROW_MARKERS: [&str; 2] = ["Piloto", "Driver"];

/// Apply every sanitizing pass for the given table kind
pub fn sanitize(mut table: Table, kind: TableKind) -> Table {
    drop_non_data_rows(&mut table);
    fill_within_group(&mut table, &["Ano", "Piloto"], "No");
    fill_within_group(&mut table, &["Ano", "Piloto"], "Construtor");
    if kind == TableKind::Qualifying {
        fill_position_by_sequence(&mut table);
    }
    normalize_season(&mut table);
    table
}

/// Drop rows with neither a position nor a driver, and embedded header rows
pub fn drop_non_data_rows(table: &mut Table) {
    let pos_idx = table.column_index("Pos");
    let driver_idx = table.column_index("Piloto");

    table.retain_rows(|row| {
        let pos = pos_idx.and_then(|i| row[i].as_deref());
        let driver = driver_idx.and_then(|i| row[i].as_deref());

        if pos.is_none() && driver.is_none() {
            return false;
        }
        match driver {
            Some(name) => !HEADER_ROW_MARKERS.iter().any(|m| name.contains(m)),
            None => true,
        }
    });
}

/// Row indices per group key, in row order
///
/// Rows with any missing key column belong to no group.
fn group_rows(table: &Table, keys: &[&str]) -> Vec<Vec<usize>> {
    let key_idx: Vec<Option<usize>> = keys.iter().map(|k| table.column_index(k)).collect();

    let mut order: Vec<Vec<Option<&str>>> = Vec::new();
    let mut groups: HashMap<Vec<Option<&str>>, Vec<usize>> = HashMap::new();

    for (row_idx, row) in table.rows().iter().enumerate() {
        let key: Vec<Option<&str>> = key_idx
            .iter()
            .map(|idx| idx.and_then(|i| row[i].as_deref()))
            .collect();
        if key.iter().any(Option::is_none) {
            continue;
        }
        if !groups.contains_key(&key) {
            order.push(key.clone());
        }
        groups.entry(key).or_default().push(row_idx);
    }

    order
        .into_iter()
        .filter_map(|key| groups.remove(&key))
        .collect()
}

/// Forward fill then backward fill `column` within each group
///
/// A group with no recorded value stays missing.
pub fn fill_within_group(table: &mut Table, keys: &[&str], column: &str) {
    let Some(col) = table.column_index(column) else {
        return;
    };

    let mut updates: Vec<(usize, Cell)> = Vec::new();
    for members in group_rows(table, keys) {
        let values: Vec<Cell> = members
            .iter()
            .map(|&r| table.rows()[r][col].clone())
            .collect();
        let filled = forward_backward_fill(&values);
        for (&row, (before, after)) in members.iter().zip(values.iter().zip(filled)) {
            if before.is_none() && after.is_some() {
                updates.push((row, after));
            }
        }
    }

    for (row, value) in updates {
        table.set(row, col, value);
    }
}

/// Carry the last value forward, then the next value backward
pub fn forward_backward_fill(values: &[Cell]) -> Vec<Cell> {
    let mut out: Vec<Cell> = Vec::with_capacity(values.len());
    let mut last: Cell = None;
    for value in values {
        if value.is_some() {
            last = value.clone();
        }
        out.push(last.clone());
    }

    let mut next: Cell = None;
    for value in out.iter_mut().rev() {
        if value.is_some() {
            next = value.clone();
        } else {
            *value = next.clone();
        }
    }

    out
}

/// Give rows without a qualifying position their arrival rank in the event
///
/// The rank counts every row of the (`Ano`, `GP`) group, including rows
/// that already had a position.
pub fn fill_position_by_sequence(table: &mut Table) {
    let Some(pos) = table.column_index("Pos") else {
        return;
    };

    let mut updates = Vec::new();
    for members in group_rows(table, &["Ano", "GP"]) {
        for (seq, &row) in members.iter().enumerate() {
            if table.rows()[row][pos].is_none() {
                updates.push((row, Some((seq + 1).to_string())));
            }
        }
    }

    for (row, value) in updates {
        table.set(row, pos, value);
    }
}

/// Parse a season cell written either as an integer or a float
pub fn parse_season(value: &str) -> Option<i32> {
    let number: f64 = value.trim().parse().ok()?;
    if number.is_finite() && number.fract() == 0.0 {
        Some(number as i32)
    } else {
        None
    }
}

/// Rewrite `Ano` as an integer string; unparsable seasons become missing
pub fn normalize_season(table: &mut Table) {
    let Some(col) = table.column_index("Ano") else {
        return;
    };
    for row in 0..table.height() {
        let normalized = table.rows()[row][col]
            .as_deref()
            .and_then(parse_season)
            .map(|season| season.to_string());
        table.set(row, col, normalized);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::schema::{project, QUALIFYING_COLUMNS, RACE_COLUMNS};

    fn s(v: &str) -> Cell {
        Some(v.to_string())
    }

    fn race_table(rows: Vec<Vec<Cell>>) -> Table {
        let columns = ["Ano", "GP", "Pos", "No", "Piloto", "Construtor"];
        let columns = columns.iter().map(|c| c.to_string()).collect();
        let table = Table::from_rows(columns, rows).unwrap();
        project(&table, &RACE_COLUMNS)
    }

    #[test]
    fn test_forward_backward_fill() {
        let filled = forward_backward_fill(&[None, s("44"), None, s("6"), None]);
        assert_eq!(filled, vec![s("44"), s("44"), s("44"), s("6"), s("6")]);

        let empty = forward_backward_fill(&[None, None]);
        assert_eq!(empty, vec![None, None]);
    }

    #[test]
    fn test_drop_non_data_rows() {
        let mut table = race_table(vec![
            vec![s("2014"), s("GP_A"), s("1"), s("6"), s("Nico Rosberg"), s("Mercedes")],
            vec![s("2014"), s("GP_A"), None, None, None, None],
            vec![s("2014"), s("GP_A"), s("Pos."), None, s("Piloto"), s("Construtor")],
            vec![s("2014"), s("GP_A"), s("Pos."), None, s("Driver"), None],
            vec![s("2014"), s("GP_A"), None, s("44"), s("Lewis Hamilton"), s("Mercedes")],
        ]);

        drop_non_data_rows(&mut table);

        assert_eq!(table.height(), 2);
        assert_eq!(table.get(0, "Piloto"), Some("Nico Rosberg"));
        assert_eq!(table.get(1, "Piloto"), Some("Lewis Hamilton"));
    }

    #[test]
    fn test_fill_within_group_by_season_and_driver() {
        let mut table = race_table(vec![
            vec![s("2014"), s("GP_A"), s("1"), None, s("Rosberg"), None],
            vec![s("2014"), s("GP_B"), s("2"), s("6"), s("Rosberg"), s("Mercedes")],
            vec![s("2014"), s("GP_C"), s("1"), None, s("Rosberg"), None],
            vec![s("2015"), s("GP_A"), s("3"), None, s("Rosberg"), None],
            vec![s("2014"), s("GP_A"), s("9"), None, s("Sutil"), None],
        ]);

        fill_within_group(&mut table, &["Ano", "Piloto"], "No");
        fill_within_group(&mut table, &["Ano", "Piloto"], "Construtor");

        assert_eq!(table.get(0, "No"), Some("6"));
        assert_eq!(table.get(2, "No"), Some("6"));
        assert_eq!(table.get(0, "Construtor"), Some("Mercedes"));
        // Other season, no recorded value: stays missing
        assert_eq!(table.get(3, "No"), None);
        assert_eq!(table.get(4, "Construtor"), None);
    }

    #[test]
    fn test_fill_position_by_sequence() {
        let columns: Vec<String> = ["Ano", "GP", "Pos", "Piloto"]
            .iter()
            .map(|c| c.to_string())
            .collect();
        let table = Table::from_rows(
            columns,
            vec![
                vec![s("2016"), s("GP_A"), s("1"), s("Hamilton")],
                vec![s("2016"), s("GP_A"), None, s("Rosberg")],
                vec![s("2016"), s("GP_B"), None, s("Hamilton")],
                vec![s("2016"), s("GP_A"), None, s("Vettel")],
            ],
        )
        .unwrap();
        let mut table = project(&table, &QUALIFYING_COLUMNS);

        fill_position_by_sequence(&mut table);

        assert_eq!(table.get(0, "Pos"), Some("1"));
        assert_eq!(table.get(1, "Pos"), Some("2"));
        assert_eq!(table.get(2, "Pos"), Some("1"));
        assert_eq!(table.get(3, "Pos"), Some("3"));
    }

    #[test]
    fn test_race_positions_not_sequenced() {
        let table = race_table(vec![vec![
            s("2014"),
            s("GP_A"),
            None,
            s("7"),
            s("Kimi Räikkönen"),
            s("Ferrari"),
        ]]);

        let sanitized = sanitize(table, TableKind::Race);
        assert_eq!(sanitized.get(0, "Pos"), None);
    }

    #[test]
    fn test_parse_season() {
        assert_eq!(parse_season("2014"), Some(2014));
        assert_eq!(parse_season("2014.0"), Some(2014));
        assert_eq!(parse_season("2014.5"), None);
        assert_eq!(parse_season("abc"), None);
    }

    #[test]
    fn test_normalize_season() {
        let mut table = race_table(vec![
            vec![s("2019.0"), s("GP_A"), s("1"), None, s("Bottas"), None],
            vec![s("unknown"), s("GP_A"), s("2"), None, s("Hamilton"), None],
        ]);

        normalize_season(&mut table);

        assert_eq!(table.get(0, "Ano"), Some("2019"));
        assert_eq!(table.get(1, "Ano"), None);
    }
}
