//! Feature Engineering
//!
//! Turns joined qualifying/race records into numeric model features:
//! session times in seconds, session gaps, grid penalty, a chronological
//! event id, leakage-safe momentum averages and one-hot constructors.

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use tracing::{debug, info};

use super::history::{
    compare_present_first, fill_with_median, DriverHistoryIndex, MOMENTUM_WINDOW,
};
use super::table::{Cell, Table};
use crate::error::Result;
use crate::models::{EventKey, FeatureRecord, JoinedRecord};

/// Time assigned to a session with no recorded lap
pub const MISSING_TIME_PENALTY: f64 = 999.0;

/// Prefix of the one-hot constructor columns
pub const CONSTRUCTOR_PREFIX: &str = "Construtor_";

/// Identifying and target columns leading the persisted feature table
const KEY_COLUMNS: [&str; 6] = ["Ano", "GP", "Piloto", "race_id", "Pos_Corrida", "Pontos_Ganhos"];

/// Numeric features every record carries, in model input order
pub const BASE_FEATURE_NAMES: [&str; 11] = [
    "Pos_Quali",
    "Grid_Final",
    "Q1_s",
    "Q2_s",
    "Q3_s",
    "Punicao_Grid",
    "Gap_Q1_Q2",
    "Gap_Q2_Q3",
    "momentum_pos_3r",
    "momentum_pts_3r",
    "momentum_quali_3r",
];

/// Parse a number, treating unparsable or non-finite text as missing
pub fn parse_number(value: Option<&str>) -> Option<f64> {
    let number: f64 = value?.trim().parse().ok()?;
    number.is_finite().then_some(number)
}

/// Convert a lap time (`M:SS.mmm` or `SS.mmm`) to seconds
///
/// The text is split on both `:` and `.`. Three parts read as minutes,
/// seconds and milliseconds; two parts as seconds and milliseconds. Any
/// other shape, or a non-integer part, is missing.
pub fn parse_session_time(value: Option<&str>) -> Option<f64> {
    let normalized = value?.replace(':', ".");
    let parts: Vec<i64> = normalized
        .split('.')
        .map(|p| p.trim().parse::<i64>())
        .collect::<std::result::Result<_, _>>()
        .ok()?;

    match parts.as_slice() {
        [minutes, seconds, millis] => {
            let minutes = minutes.checked_mul(60)?;
            Some(minutes as f64 + *seconds as f64 + *millis as f64 / 1000.0)
        }
        [seconds, millis] => Some(*seconds as f64 + *millis as f64 / 1000.0),
        _ => None,
    }
}

fn numeric_column<F>(joined: &[JoinedRecord], field: F) -> Vec<Option<f64>>
where
    F: Fn(&JoinedRecord) -> Option<&str>,
{
    joined.iter().map(|j| parse_number(field(j))).collect()
}

fn difference(a: Option<f64>, b: Option<f64>) -> Option<f64> {
    Some(a? - b?)
}

/// Dense chronological id per distinct event
///
/// Events are numbered from 0 in (season, event name) order.
pub fn assign_race_ids(events: &[&EventKey]) -> Vec<usize> {
    let distinct: BTreeSet<&EventKey> = events.iter().copied().collect();
    let ids: BTreeMap<&EventKey, usize> = distinct
        .into_iter()
        .enumerate()
        .map(|(id, key)| (key, id))
        .collect();
    events.iter().map(|key| ids[key]).collect()
}

/// Engineered records plus the constructor columns they index into
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FeatureSet {
    pub records: Vec<FeatureRecord>,
    /// Distinct constructors, sorted; `constructor_flags` follow this order
    pub constructors: Vec<String>,
}

impl FeatureSet {
    /// One-hot column names, e.g. `Construtor_Ferrari`
    pub fn indicator_columns(&self) -> Vec<String> {
        self.constructors
            .iter()
            .map(|c| format!("{}{}", CONSTRUCTOR_PREFIX, c))
            .collect()
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Render as a text table for persistence
    pub fn to_table(&self) -> Result<Table> {
        let mut columns: Vec<String> = KEY_COLUMNS.iter().map(|c| c.to_string()).collect();
        columns.extend(BASE_FEATURE_NAMES.iter().map(|c| c.to_string()));
        columns.extend(self.indicator_columns());

        let num = |v: Option<f64>| -> Cell { v.map(|x| x.to_string()) };

        let mut rows = Vec::with_capacity(self.records.len());
        for r in &self.records {
            let mut row: Vec<Cell> = vec![
                Some(r.event.season.to_string()),
                Some(r.event.event.clone()),
                Some(r.driver.clone()),
                Some(r.race_id.to_string()),
                num(Some(r.pos_corrida)),
                num(r.pontos_ganhos),
                num(r.pos_quali),
                num(Some(r.grid_final)),
                num(Some(r.q1_s)),
                num(Some(r.q2_s)),
                num(Some(r.q3_s)),
                num(r.punicao_grid),
                num(Some(r.gap_q1_q2)),
                num(Some(r.gap_q2_q3)),
                num(r.momentum_pos_3r),
                num(r.momentum_pts_3r),
                num(r.momentum_quali_3r),
            ];
            row.extend(r.constructor_flags.iter().map(|f| Some(f.to_string())));
            rows.push(row);
        }
        Table::from_rows(columns, rows)
    }
}

/// Feature engineering for joined records
pub struct FeatureEngineering;

impl FeatureEngineering {
    /// Build the feature set with the default momentum window
    pub fn build(joined: &[JoinedRecord]) -> FeatureSet {
        Self::build_with_window(joined, MOMENTUM_WINDOW)
    }

    /// Build the feature set
    ///
    /// Momentum medians are computed over every joined record, before rows
    /// missing `Pos_Corrida` or `Grid_Final` are dropped.
    pub fn build_with_window(joined: &[JoinedRecord], window: usize) -> FeatureSet {
        let n = joined.len();

        let pos_quali = numeric_column(joined, |j| j.pos_quali.as_deref());
        let grid_final = numeric_column(joined, |j| j.grid_final.as_deref());
        let pos_corrida = numeric_column(joined, |j| j.pos_corrida.as_deref());
        let pontos = numeric_column(joined, |j| j.pontos_ganhos.as_deref());

        let events: Vec<&EventKey> = joined.iter().map(|j| &j.event).collect();
        let race_ids = assign_race_ids(&events);

        let drivers: Vec<&str> = joined.iter().map(|j| j.driver.as_str()).collect();
        let tiebreak: Vec<[Option<f64>; 3]> = (0..n)
            .map(|i| [pos_quali[i], pos_corrida[i], pontos[i]])
            .collect();
        let history = DriverHistoryIndex::build(&drivers, &race_ids, &tiebreak);
        debug!("Indexed history for {} drivers", history.len());

        let mut momentum_pos = history.trailing_mean(&pos_corrida, window);
        let mut momentum_pts = history.trailing_mean(&pontos, window);
        let mut momentum_quali = history.trailing_mean(&pos_quali, window);
        fill_with_median(&mut momentum_pos);
        fill_with_median(&mut momentum_pts);
        fill_with_median(&mut momentum_quali);

        let constructors: Vec<String> = joined
            .iter()
            .filter_map(|j| j.constructor.clone())
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect();

        let mut records = Vec::with_capacity(n);
        for (i, j) in joined.iter().enumerate() {
            let (Some(pos), Some(grid)) = (pos_corrida[i], grid_final[i]) else {
                continue;
            };

            let q1 = parse_session_time(j.q1.as_deref());
            let q2 = parse_session_time(j.q2.as_deref());
            let q3 = parse_session_time(j.q3.as_deref());

            records.push(FeatureRecord {
                event: j.event.clone(),
                driver: j.driver.clone(),
                constructor: j.constructor.clone(),
                race_id: race_ids[i],
                pos_quali: pos_quali[i],
                grid_final: grid,
                pos_corrida: pos,
                pontos_ganhos: pontos[i],
                q1_s: q1.unwrap_or(MISSING_TIME_PENALTY),
                q2_s: q2.unwrap_or(MISSING_TIME_PENALTY),
                q3_s: q3.unwrap_or(MISSING_TIME_PENALTY),
                punicao_grid: difference(Some(grid), pos_quali[i]),
                gap_q1_q2: difference(q1, q2).unwrap_or(0.0),
                gap_q2_q3: difference(q2, q3).unwrap_or(0.0),
                momentum_pos_3r: momentum_pos[i],
                momentum_pts_3r: momentum_pts[i],
                momentum_quali_3r: momentum_quali[i],
                constructor_flags: constructors
                    .iter()
                    .map(|c| j.constructor.as_deref() == Some(c.as_str()))
                    .collect(),
            });
        }

        records.sort_by(|a, b| {
            (a.race_id, &a.driver)
                .cmp(&(b.race_id, &b.driver))
                .then_with(|| compare_present_first(a.pos_quali, b.pos_quali))
                .then_with(|| a.pos_corrida.total_cmp(&b.pos_corrida))
                .then_with(|| compare_present_first(a.pontos_ganhos, b.pontos_ganhos))
        });

        info!(
            "Engineered {} feature records ({} dropped, {} constructors)",
            records.len(),
            n - records.len(),
            constructors.len()
        );

        FeatureSet {
            records,
            constructors,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn joined(
        season: i32,
        event: &str,
        driver: &str,
        pos_quali: &str,
        pos_corrida: &str,
    ) -> JoinedRecord {
        JoinedRecord {
            event: EventKey::new(season, event),
            driver: driver.to_string(),
            pos_quali: Some(pos_quali.to_string()),
            grid_final: Some(pos_quali.to_string()),
            car_number: None,
            constructor: Some("Mercedes".to_string()),
            q1: Some("1:23.456".to_string()),
            q2: Some("1:22.456".to_string()),
            q3: None,
            pos_corrida: Some(pos_corrida.to_string()),
            pontos_ganhos: Some("0".to_string()),
            laps: None,
            time_or_status: None,
            race_grid: None,
        }
    }

    fn find<'a>(set: &'a FeatureSet, event: &str, driver: &str) -> &'a FeatureRecord {
        set.records
            .iter()
            .find(|r| r.event.event == event && r.driver == driver)
            .unwrap()
    }

    #[test]
    fn test_parse_session_time() {
        assert!((parse_session_time(Some("1:23.456")).unwrap() - 83.456).abs() < 1e-9);
        assert!((parse_session_time(Some("23.456")).unwrap() - 23.456).abs() < 1e-9);
        assert_eq!(parse_session_time(Some("RET")), None);
        assert_eq!(parse_session_time(Some("")), None);
        assert_eq!(parse_session_time(None), None);
        assert_eq!(parse_session_time(Some("1:02:03.456")), None);
        assert_eq!(parse_session_time(Some("+1.5s")), None);
        // Minutes too large to convert to seconds
        assert_eq!(parse_session_time(Some("999999999999999999:00.000")), None);
    }

    #[test]
    fn test_parse_number() {
        assert_eq!(parse_number(Some("3")), Some(3.0));
        assert_eq!(parse_number(Some(" 18.0 ")), Some(18.0));
        assert_eq!(parse_number(Some("Ret")), None);
        assert_eq!(parse_number(Some("NaN")), None);
        assert_eq!(parse_number(None), None);
    }

    #[test]
    fn test_assign_race_ids_dense_and_sorted() {
        let a = EventKey::new(2015, "GP_A");
        let b = EventKey::new(2014, "GP_Z");
        let c = EventKey::new(2014, "GP_B");
        let ids = assign_race_ids(&[&a, &b, &c, &a, &b]);
        assert_eq!(ids, vec![2, 1, 0, 2, 1]);
    }

    #[test]
    fn test_derived_features() {
        let mut record = joined(2020, "GP_A", "Hamilton", "1", "1");
        record.grid_final = Some("3".to_string());

        let set = FeatureEngineering::build(&[record]);
        let r = &set.records[0];

        assert!((r.q1_s - 83.456).abs() < 1e-9);
        assert!((r.q2_s - 82.456).abs() < 1e-9);
        assert_eq!(r.q3_s, MISSING_TIME_PENALTY);
        assert!((r.gap_q1_q2 - 1.0).abs() < 1e-9);
        // Q3 missing: gap defaults to 0 rather than 82.456 - 999
        assert_eq!(r.gap_q2_q3, 0.0);
        assert_eq!(r.punicao_grid, Some(2.0));
    }

    #[test]
    fn test_momentum_two_event_scenario() {
        let records = vec![
            joined(2014, "GP_1", "A", "2", "1"),
            joined(2014, "GP_2", "A", "4", "3"),
            joined(2014, "GP_1", "B", "1", "2"),
            joined(2014, "GP_2", "B", "3", "5"),
        ];

        let set = FeatureEngineering::build(&records);

        let a2 = find(&set, "GP_2", "A");
        assert_eq!(a2.momentum_pos_3r, Some(1.0));
        // Medians of the rolled values: pos {1, 2} -> 1.5
        let a1 = find(&set, "GP_1", "A");
        assert_eq!(a1.momentum_pos_3r, Some(1.5));
        assert_eq!(a1.momentum_quali_3r, Some(1.5));
    }

    #[test]
    fn test_momentum_has_no_look_ahead() {
        let base = vec![
            joined(2014, "GP_1", "A", "1", "1"),
            joined(2014, "GP_2", "A", "1", "3"),
            joined(2014, "GP_3", "A", "1", "5"),
            joined(2014, "GP_4", "A", "1", "7"),
        ];
        let mut changed = base.clone();
        changed[1].pos_corrida = Some("19".to_string());

        let before = FeatureEngineering::build(&base);
        let after = FeatureEngineering::build(&changed);

        assert_eq!(
            find(&before, "GP_2", "A").momentum_pos_3r,
            find(&after, "GP_2", "A").momentum_pos_3r
        );
        assert_ne!(
            find(&before, "GP_3", "A").momentum_pos_3r,
            find(&after, "GP_3", "A").momentum_pos_3r
        );
        assert_eq!(find(&after, "GP_4", "A").momentum_pos_3r, Some((1.0 + 19.0 + 5.0) / 3.0));
    }

    #[test]
    fn test_drops_rows_missing_target_or_grid() {
        let mut no_result = joined(2014, "GP_1", "A", "1", "1");
        no_result.pos_corrida = Some("Ret".to_string());
        let mut no_grid = joined(2014, "GP_1", "B", "2", "2");
        no_grid.grid_final = None;
        let kept = joined(2014, "GP_1", "C", "3", "3");

        let set = FeatureEngineering::build(&[no_result, no_grid, kept]);

        assert_eq!(set.len(), 1);
        assert_eq!(set.records[0].driver, "C");
    }

    #[test]
    fn test_one_hot_constructors() {
        let mut ferrari = joined(2019, "GP_1", "Leclerc", "1", "2");
        ferrari.constructor = Some("Ferrari".to_string());
        let mercedes = joined(2019, "GP_1", "Hamilton", "2", "1");
        let mut unknown = joined(2019, "GP_1", "Kubica", "20", "18");
        unknown.constructor = None;

        let set = FeatureEngineering::build(&[ferrari, mercedes, unknown]);

        assert_eq!(set.constructors, vec!["Ferrari", "Mercedes"]);
        assert_eq!(
            set.indicator_columns(),
            vec!["Construtor_Ferrari", "Construtor_Mercedes"]
        );
        assert_eq!(find(&set, "GP_1", "Leclerc").constructor_flags, vec![true, false]);
        assert_eq!(find(&set, "GP_1", "Hamilton").constructor_flags, vec![false, true]);
        assert_eq!(find(&set, "GP_1", "Kubica").constructor_flags, vec![false, false]);
    }

    #[test]
    fn test_output_is_deterministic() {
        let records = vec![
            joined(2014, "GP_2", "B", "2", "2"),
            joined(2014, "GP_1", "A", "1", "1"),
            joined(2014, "GP_2", "A", "1", "1"),
            joined(2014, "GP_1", "B", "2", "2"),
        ];
        let mut reversed = records.clone();
        reversed.reverse();

        let a = FeatureEngineering::build(&records);
        let b = FeatureEngineering::build(&reversed);

        assert_eq!(a.records, b.records);
        let order: Vec<(usize, &str)> = a
            .records
            .iter()
            .map(|r| (r.race_id, r.driver.as_str()))
            .collect();
        assert_eq!(order, vec![(0, "A"), (0, "B"), (1, "A"), (1, "B")]);
    }

    #[test]
    fn test_duplicate_rows_ordered_by_content() {
        let records = vec![
            joined(2014, "GP_1", "A", "2", "6"),
            joined(2014, "GP_1", "A", "1", "2"),
            joined(2014, "GP_2", "A", "3", "4"),
        ];
        let mut reversed = records.clone();
        reversed.reverse();

        let a = FeatureEngineering::build_with_window(&records, 1);
        let b = FeatureEngineering::build_with_window(&reversed, 1);

        assert_eq!(a.records, b.records);
        // Within GP_1 the row qualified 1st comes before the one qualified 2nd
        assert_eq!(a.records[0].pos_quali, Some(1.0));
        assert_eq!(a.records[1].momentum_pos_3r, Some(2.0));
        assert_eq!(find(&a, "GP_2", "A").momentum_pos_3r, Some(6.0));
    }

    #[test]
    fn test_to_table_shape() {
        let set = FeatureEngineering::build(&[joined(2014, "GP_1", "A", "1", "1")]);
        let table = set.to_table().unwrap();

        assert_eq!(table.width(), 6 + BASE_FEATURE_NAMES.len() + 1);
        assert_eq!(table.get(0, "Construtor_Mercedes"), Some("true"));
        assert_eq!(table.get(0, "Q3_s"), Some("999"));
    }
}
