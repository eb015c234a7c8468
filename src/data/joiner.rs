//! Join cleaned qualifying and race tables per (season, event, driver)

use std::collections::HashMap;
use std::path::Path;
use tracing::{debug, info};

use super::csv_loader::load_table;
use super::sanitizer::parse_season;
use super::table::Table;
use crate::error::{PipelineError, Result};
use crate::models::{EventKey, JoinedRecord, QualifyingRow, RaceRow};

fn text(table: &Table, row: usize, column: &str) -> Option<String> {
    table.get(row, column).map(str::to_string)
}

/// Convert a cleaned qualifying table into typed rows
pub fn qualifying_rows(table: &Table) -> Vec<QualifyingRow> {
    (0..table.height())
        .map(|i| QualifyingRow {
            season: table.get(i, "Ano").and_then(parse_season),
            event: text(table, i, "GP"),
            position: text(table, i, "Pos"),
            car_number: text(table, i, "No"),
            driver: text(table, i, "Piloto"),
            constructor: text(table, i, "Construtor"),
            q1: text(table, i, "Q1"),
            q2: text(table, i, "Q2"),
            q3: text(table, i, "Q3"),
            grid: text(table, i, "Grid"),
        })
        .collect()
}

/// Convert a cleaned race table into typed rows
pub fn race_rows(table: &Table) -> Vec<RaceRow> {
    (0..table.height())
        .map(|i| RaceRow {
            season: table.get(i, "Ano").and_then(parse_season),
            event: text(table, i, "GP"),
            position: text(table, i, "Pos"),
            car_number: text(table, i, "No"),
            driver: text(table, i, "Piloto"),
            constructor: text(table, i, "Construtor"),
            laps: text(table, i, "Voltas"),
            time_or_status: text(table, i, "Tempo/Retirado"),
            points: text(table, i, "Pontos"),
            grid: text(table, i, "Grid"),
        })
        .collect()
}

type JoinKey = (EventKey, String);

fn join_key(
    season: Option<i32>,
    event: &Option<String>,
    driver: &Option<String>,
) -> Option<JoinKey> {
    Some((EventKey::new(season?, event.clone()?), driver.clone()?))
}

/// Inner join on (season, event, driver)
///
/// Output follows qualifying row order; a key matched by several race rows
/// yields one record per race row, in race row order. Rows missing any key
/// field never match.
pub fn join(qualifying: &[QualifyingRow], race: &[RaceRow]) -> Vec<JoinedRecord> {
    let mut race_index: HashMap<JoinKey, Vec<&RaceRow>> = HashMap::new();
    for row in race {
        if let Some(key) = join_key(row.season, &row.event, &row.driver) {
            race_index.entry(key).or_default().push(row);
        }
    }

    let mut joined = Vec::new();
    for quali in qualifying {
        let Some(key) = join_key(quali.season, &quali.event, &quali.driver) else {
            continue;
        };
        let Some(matches) = race_index.get(&key) else {
            continue;
        };
        for race_row in matches {
            joined.push(JoinedRecord {
                event: key.0.clone(),
                driver: key.1.clone(),
                pos_quali: quali.position.clone(),
                grid_final: quali.grid.clone(),
                car_number: quali.car_number.clone(),
                constructor: quali.constructor.clone(),
                q1: quali.q1.clone(),
                q2: quali.q2.clone(),
                q3: quali.q3.clone(),
                pos_corrida: race_row.position.clone(),
                pontos_ganhos: race_row.points.clone(),
                laps: race_row.laps.clone(),
                time_or_status: race_row.time_or_status.clone(),
                race_grid: race_row.grid.clone(),
            });
        }
    }

    joined
}

/// Load both cleaned tables and join them
///
/// Fails with [`PipelineError::MissingInput`] when either file is absent.
pub fn load_and_join<P: AsRef<Path>, Q: AsRef<Path>>(
    qualifying_path: P,
    race_path: Q,
) -> Result<Vec<JoinedRecord>> {
    for path in [qualifying_path.as_ref(), race_path.as_ref()] {
        if !path.exists() {
            return Err(PipelineError::MissingInput(path.to_path_buf()));
        }
    }

    let qualifying = qualifying_rows(&load_table(qualifying_path)?);
    let race = race_rows(&load_table(race_path)?);
    debug!(
        "Loaded {} qualifying rows and {} race rows",
        qualifying.len(),
        race.len()
    );

    let joined = join(&qualifying, &race);
    info!("Joined {} driver-event records", joined.len());

    Ok(joined)
}
