//! End-to-end stages over configured paths

use std::path::Path;
use tracing::info;

use crate::config::PipelineConfig;
use crate::data::csv_loader::write_table;
use crate::data::{
    clean_file, load_and_join, CleanSummary, FeatureEngineering, FeatureSet, TableKind,
};
use crate::error::{validate_window, Result};
use crate::training::{SearchResult, Trainer, TrainingReport};

/// Clean both raw tables into their canonical files
pub fn clean_all(config: &PipelineConfig) -> Result<Vec<CleanSummary>> {
    [TableKind::Race, TableKind::Qualifying]
        .into_iter()
        .map(|kind| {
            clean_file(
                config.paths.raw_path(kind),
                config.paths.clean_path(kind),
                kind,
            )
        })
        .collect()
}

/// Join the cleaned tables and engineer features
pub fn build_features(config: &PipelineConfig) -> Result<FeatureSet> {
    validate_window(config.features.momentum_window)?;
    let joined = load_and_join(
        config.paths.clean_path(TableKind::Qualifying),
        config.paths.clean_path(TableKind::Race),
    )?;
    Ok(FeatureEngineering::build_with_window(
        &joined,
        config.features.momentum_window,
    ))
}

/// Persist the feature table as CSV
pub fn save_features<P: AsRef<Path>>(features: &FeatureSet, path: P) -> Result<()> {
    write_table(&features.to_table()?, &path)?;
    info!("Saved {} feature rows to {:?}", features.len(), path.as_ref());
    Ok(())
}

/// Build features and search hyperparameters over every season
pub fn tune(config: &PipelineConfig) -> Result<SearchResult> {
    let features = build_features(config)?;
    Trainer::new(config.training.clone()).tune(&features)
}

/// Build features, train, evaluate and save the report
pub fn train(config: &PipelineConfig) -> Result<TrainingReport> {
    let features = build_features(config)?;
    let report = Trainer::new(config.training.clone()).train_and_evaluate(&features)?;
    report.save_json(config.paths.report_path())?;
    info!("Saved training report to {:?}", config.paths.report_path());
    Ok(report)
}
