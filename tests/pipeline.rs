//! End-to-end run over small raw tables: clean, join, features, train

use std::fs;
use std::path::Path;

use f1race::config::PipelineConfig;
use f1race::data::{load_table, TableKind, QUALIFYING_COLUMNS, RACE_COLUMNS};
use f1race::pipeline;
use f1race::training::{Hyperparams, Regressor, Trainer};
use f1race::{PipelineError, Result};

const EVENTS: [(i32, &str, [&str; 3]); 4] = [
    (2023, "Grande_Prêmio_da_Austrália", ["Max Verstappen", "Lando Norris", "Charles Leclerc"]),
    (2023, "Grande_Prêmio_do_Barém", ["Lando Norris", "Max Verstappen", "Charles Leclerc"]),
    (2024, "Grande_Prêmio_da_Austrália", ["Max Verstappen", "Charles Leclerc", "Lando Norris"]),
    (2024, "Grande_Prêmio_do_Barém", ["Charles Leclerc", "Max Verstappen", "Lando Norris"]),
];

const RACE_HEADER: &str = "Pos.,Nº,Piloto,Construtor,Voltas,Tempo/Retirada,Grid,Pontos";

fn team(driver: &str) -> &'static str {
    match driver {
        "Max Verstappen" => "Red Bull Racing-Honda RBPT",
        "Lando Norris" => "McLaren-Mercedes",
        _ => "Ferrari",
    }
}

fn number(driver: &str) -> &'static str {
    match driver {
        "Max Verstappen" => "1",
        "Lando Norris" => "4",
        _ => "16",
    }
}

fn write_raw_tables(raw_dir: &Path) {
    fs::create_dir_all(raw_dir).unwrap();

    let mut race = format!("\u{feff}{},Ano,GP\n", RACE_HEADER);
    let mut quali = String::from(concat!(
        "\u{feff}\"('Pos.', 'Pos.')\",\"('Nº', 'Nº')\",\"('Piloto', 'Piloto')\",",
        "\"('Construtor', 'Construtor')\",\"('Tempo', 'Q1')\",\"('Tempo', 'Q2')\",",
        "\"('Tempo', 'Q3')\",\"('Grid final', 'Grid final')\",Ano,GP\n",
    ));

    for (season, gp, order) in EVENTS {
        // Repeated header row inside the body, as scraped pages sometimes have
        race.push_str(&format!("{},{},{}\n", RACE_HEADER, season, gp));
        for (i, driver) in order.iter().enumerate() {
            let pos = i + 1;
            let points = [25, 18, 15][i];
            // Car number missing on the winner's row; filled from the season
            let car = if pos == 1 && season == 2024 { "" } else { number(driver) };
            race.push_str(&format!(
                "{},{},{},{},57,1:3{}:00.000,{},{},{}.0,{}\n",
                pos,
                car,
                driver,
                team(driver),
                i,
                pos,
                points,
                season,
                gp
            ));

            // Third qualifier has no position cell; it is inferred from order
            let quali_pos = if pos == 3 { String::new() } else { pos.to_string() };
            let q3 = if pos == 3 { String::new() } else { format!("1:29.{}00", pos) };
            quali.push_str(&format!(
                "{},{},{},{},1:31.{}00,1:30.{}00,{},{},{},{}\n",
                quali_pos,
                number(driver),
                driver,
                team(driver),
                pos,
                pos,
                q3,
                pos,
                season,
                gp
            ));
        }
    }

    fs::write(raw_dir.join(TableKind::Race.raw_file_name()), race).unwrap();
    fs::write(raw_dir.join(TableKind::Qualifying.raw_file_name()), quali).unwrap();
}

fn config_in(root: &Path) -> PipelineConfig {
    let mut config = PipelineConfig::default();
    config.paths.raw_dir = root.join("raw");
    config.paths.clean_dir = root.join("clean");
    config.paths.output_dir = root.join("output");
    config.training.n_iter = 2;
    config.training.n_splits = 2;
    config
}

/// Predicts the final grid slot as the finishing position
struct GridRegressor;

impl Regressor for GridRegressor {
    fn fit(&mut self, _features: &[Vec<f64>], _target: &[f64]) -> Result<()> {
        Ok(())
    }

    fn predict(&self, features: &[Vec<f64>]) -> Result<Vec<f64>> {
        Ok(features.iter().map(|row| row[1]).collect())
    }
}

#[test]
fn test_clean_produces_canonical_files() {
    let dir = tempfile::tempdir().unwrap();
    let config = config_in(dir.path());
    write_raw_tables(&config.paths.raw_dir);

    let summaries = pipeline::clean_all(&config).unwrap();

    assert_eq!(summaries[0].kind, TableKind::Race);
    assert_eq!(summaries[0].raw_rows, 16);
    assert_eq!(summaries[0].clean_rows, 12);
    assert_eq!(summaries[1].clean_rows, 12);

    let race = load_table(config.paths.clean_path(TableKind::Race)).unwrap();
    assert_eq!(race.columns(), &RACE_COLUMNS);
    assert_eq!(race.get(0, "Ano"), Some("2023"));
    assert_eq!(race.get(0, "Tempo/Retirado"), Some("1:30:00.000"));
    assert!(race.column_values("No").unwrap().iter().all(|v| v.is_some()));

    let quali = load_table(config.paths.clean_path(TableKind::Qualifying)).unwrap();
    assert_eq!(quali.columns(), &QUALIFYING_COLUMNS);
    assert_eq!(quali.get(2, "Pos"), Some("3"));
    assert_eq!(quali.get(0, "Q1"), Some("1:31.100"));
    assert_eq!(quali.get(2, "Q3"), None);
}

#[test]
fn test_clean_is_idempotent_on_clean_files() {
    let dir = tempfile::tempdir().unwrap();
    let config = config_in(dir.path());
    write_raw_tables(&config.paths.raw_dir);
    pipeline::clean_all(&config).unwrap();

    let first = fs::read_to_string(config.paths.clean_path(TableKind::Qualifying)).unwrap();

    let mut again = config.clone();
    again.paths.raw_dir = config.paths.clean_dir.clone();
    again.paths.clean_dir = dir.path().join("clean2");
    fs::copy(
        config.paths.clean_path(TableKind::Qualifying),
        again.paths.raw_path(TableKind::Qualifying),
    )
    .unwrap();
    fs::copy(
        config.paths.clean_path(TableKind::Race),
        again.paths.raw_path(TableKind::Race),
    )
    .unwrap();
    pipeline::clean_all(&again).unwrap();

    let second = fs::read_to_string(again.paths.clean_path(TableKind::Qualifying)).unwrap();
    assert_eq!(first, second);
}

#[test]
fn test_features_from_cleaned_tables() {
    let dir = tempfile::tempdir().unwrap();
    let config = config_in(dir.path());
    write_raw_tables(&config.paths.raw_dir);
    pipeline::clean_all(&config).unwrap();

    let features = pipeline::build_features(&config).unwrap();

    assert_eq!(features.len(), 12);
    assert_eq!(
        features.constructors,
        vec!["Ferrari", "McLaren-Mercedes", "Red Bull Racing-Honda RBPT"]
    );

    let find = |race_id: usize, driver: &str| {
        features
            .records
            .iter()
            .find(|r| r.race_id == race_id && r.driver == driver)
            .unwrap()
    };

    let max_first = find(0, "Max Verstappen");
    assert_eq!(max_first.event.season, 2023);
    assert!((max_first.q1_s - 91.1).abs() < 1e-9);
    assert!((max_first.gap_q1_q2 - 1.0).abs() < 1e-9);
    assert_eq!(max_first.constructor_flags, vec![false, false, true]);

    // Prior results only: 1st at race 0
    assert_eq!(find(1, "Max Verstappen").momentum_pos_3r, Some(1.0));
    // 1st, 2nd, 1st
    let latest = find(3, "Max Verstappen").momentum_pos_3r.unwrap();
    assert!((latest - 4.0 / 3.0).abs() < 1e-9);

    let leclerc_third = find(0, "Charles Leclerc");
    assert_eq!(leclerc_third.q3_s, 999.0);
    assert_eq!(leclerc_third.gap_q2_q3, 0.0);
    assert_eq!(leclerc_third.pos_quali, Some(3.0));

    let out = config.paths.features_path();
    pipeline::save_features(&features, &out).unwrap();
    let table = load_table(&out).unwrap();
    assert_eq!(table.height(), 12);
    assert!(table.column_index("Construtor_Ferrari").is_some());
}

#[test]
fn test_features_require_cleaned_inputs() {
    let dir = tempfile::tempdir().unwrap();
    let config = config_in(dir.path());

    match pipeline::build_features(&config) {
        Err(PipelineError::MissingInput(path)) => {
            assert_eq!(path, config.paths.clean_path(TableKind::Qualifying));
        }
        other => panic!("expected missing input, got {:?}", other.map(|f| f.len())),
    }
}

#[test]
fn test_train_on_held_out_season() {
    let dir = tempfile::tempdir().unwrap();
    let config = config_in(dir.path());
    write_raw_tables(&config.paths.raw_dir);
    pipeline::clean_all(&config).unwrap();
    let features = pipeline::build_features(&config).unwrap();

    let report = Trainer::new(config.training.clone())
        .train_and_evaluate_with(&features, |_: Hyperparams| GridRegressor)
        .unwrap();

    assert_eq!(report.test_season, 2024);
    assert_eq!(report.train_rows, 6);
    assert_eq!(report.test_rows, 6);
    assert_eq!(report.accuracy.total_events, 2);
    // Grid equals finishing order in every event
    assert_eq!(report.accuracy.winner_hits, 2);
    assert_eq!(report.regression.mae, 0.0);

    report.save_json(config.paths.report_path()).unwrap();
    assert!(config.paths.report_path().exists());
}
