//! Target schemas and projection onto them

use serde::{Deserialize, Serialize};

use super::table::Table;

/// Canonical race-result columns, in output order
pub const RACE_COLUMNS: [&str; 10] = [
    "Ano",
    "GP",
    "Pos",
    "No",
    "Piloto",
    "Construtor",
    "Voltas",
    "Tempo/Retirado",
    "Pontos",
    "Grid",
];

/// Canonical qualifying columns, in output order
pub const QUALIFYING_COLUMNS: [&str; 10] = [
    "Ano", "GP", "Pos", "No", "Piloto", "Construtor", "Q1", "Q2", "Q3", "Grid",
];

/// Which source a table was scraped from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TableKind {
    Race,
    Qualifying,
}

impl TableKind {
    pub fn target_columns(&self) -> &'static [&'static str] {
        match self {
            TableKind::Race => &RACE_COLUMNS,
            TableKind::Qualifying => &QUALIFYING_COLUMNS,
        }
    }

    /// File name of the scraped table
    pub fn raw_file_name(&self) -> &'static str {
        match self {
            TableKind::Race => "f1_corrida_bruto.csv",
            TableKind::Qualifying => "f1_classificacao_bruto.csv",
        }
    }

    /// File name of the cleaned table
    pub fn clean_file_name(&self) -> &'static str {
        match self {
            TableKind::Race => "f1_corrida_limpo.csv",
            TableKind::Qualifying => "f1_classificacao_limpo.csv",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            TableKind::Race => "race",
            TableKind::Qualifying => "qualifying",
        }
    }
}

/// Project a table onto exactly `target` columns, in that order
///
/// Absent target columns are inserted as all-missing; columns not in
/// `target` are dropped.
pub fn project(table: &Table, target: &[&str]) -> Table {
    table.gather(
        target
            .iter()
            .map(|c| (c.to_string(), table.column_index(c).into_iter().collect()))
            .collect(),
    )
}
