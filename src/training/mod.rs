//! Model training and evaluation on a held-out season

pub mod dataset;
pub mod metrics;
pub mod search;

use chrono::Utc;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use tracing::info;

use crate::config::TrainingConfig;
use crate::data::FeatureSet;
use crate::error::{PipelineError, Result};

pub use dataset::{sanitize_feature_name, Dataset, FeatureListBuilder};
pub use metrics::{
    rank_events, EventRanking, PredictionRow, RaceAccuracy, RegressionMetrics,
};
pub use search::{
    time_series_splits, GbdtRegressor, Hyperparams, ParamGrid, RandomizedSearch, Regressor,
    SearchResult,
};

/// Rows shown per side of the example event
pub const EXAMPLE_TOP_N: usize = 5;

/// Outcome of a training run
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrainingReport {
    /// RFC 3339 time the report was produced
    pub generated_at: String,
    pub test_season: i32,
    pub train_rows: usize,
    pub test_rows: usize,
    pub feature_names: Vec<String>,
    pub best_params: Hyperparams,
    /// Mean cross-validated R² of the best configuration
    pub cv_score: f64,
    pub regression: RegressionMetrics,
    pub accuracy: RaceAccuracy,
    /// First test event, top rows by true and by predicted position
    pub example: Option<EventRanking>,
}

impl TrainingReport {
    pub fn save_json<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        if let Some(parent) = path.as_ref().parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(path, serde_json::to_string_pretty(self)?)?;
        Ok(())
    }
}

/// Season-split trainer
pub struct Trainer {
    config: TrainingConfig,
}

impl Trainer {
    pub fn new(config: TrainingConfig) -> Self {
        Self { config }
    }

    fn search(&self) -> RandomizedSearch {
        RandomizedSearch::new(self.config.n_iter, self.config.n_splits, self.config.seed)
    }

    /// Hyperparameter search over every season, with the `gbdt` regressor
    pub fn tune(&self, features: &FeatureSet) -> Result<SearchResult> {
        self.tune_with(features, GbdtRegressor::new)
    }

    /// Hyperparameter search over every season, no hold-out
    ///
    /// Folds follow the chronological record order.
    pub fn tune_with<R, F>(&self, features: &FeatureSet, make: F) -> Result<SearchResult>
    where
        R: Regressor,
        F: Fn(Hyperparams) -> R,
    {
        let dataset = Dataset::from_feature_set(features);
        info!("Tuning on all {} rows ({} features)", dataset.len(), dataset.n_features());
        self.search().run_with(&dataset.features, &dataset.target, make)
    }

    /// Search, refit and evaluate with the `gbdt` regressor
    pub fn train_and_evaluate(&self, features: &FeatureSet) -> Result<TrainingReport> {
        self.train_and_evaluate_with(features, GbdtRegressor::new)
    }

    pub fn train_and_evaluate_with<R, F>(
        &self,
        features: &FeatureSet,
        make: F,
    ) -> Result<TrainingReport>
    where
        R: Regressor,
        F: Fn(Hyperparams) -> R,
    {
        let dataset = Dataset::from_feature_set(features);
        let (train, test) = dataset.split_by_season(self.config.test_season);
        info!(
            "Training on {} rows before {}, testing on {} rows",
            train.len(),
            self.config.test_season,
            test.len()
        );

        if test.is_empty() {
            return Err(PipelineError::Training(format!(
                "No records for test season {}",
                self.config.test_season
            )));
        }

        let result = self.search().run_with(&train.features, &train.target, &make)?;

        let mut model = make(result.best_params);
        model.fit(&train.features, &train.target)?;
        let predicted = model.predict(&test.features)?;

        let regression = RegressionMetrics::compute(&test.target, &predicted);
        info!(
            "Test MAE {:.4}, RMSE {:.4}, R² {:.4}",
            regression.mae, regression.rmse, regression.r2
        );

        let rows: Vec<PredictionRow> = (0..test.len())
            .map(|i| PredictionRow {
                event: test.events[i].event.clone(),
                driver: test.drivers[i].clone(),
                actual: test.target[i],
                predicted: predicted[i],
            })
            .collect();
        let rankings = rank_events(&rows);
        let accuracy = RaceAccuracy::compute(&rankings);

        let example = rankings.into_iter().next().map(|mut r| {
            r.by_actual.truncate(EXAMPLE_TOP_N);
            r.by_predicted.truncate(EXAMPLE_TOP_N);
            r
        });

        Ok(TrainingReport {
            generated_at: Utc::now().to_rfc3339(),
            test_season: self.config.test_season,
            train_rows: train.len(),
            test_rows: test.len(),
            feature_names: dataset.feature_names,
            best_params: result.best_params,
            cv_score: result.best_score,
            regression,
            accuracy,
            example,
        })
    }
}
