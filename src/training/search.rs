//! Randomized hyperparameter search with time-series cross-validation

use gbdt::config::Config as GbdtConfig;
use gbdt::decision_tree::{Data, DataVec};
use gbdt::gradient_boost::GBDT;
use rand::rngs::StdRng;
use rand::SeedableRng;
use serde::{Deserialize, Serialize};
use std::ops::Range;
use tracing::{debug, info};

use super::metrics::r2_score;
use crate::error::{validate_splits, PipelineError, Result};

/// One gradient-boosting configuration
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Hyperparams {
    pub iterations: usize,
    pub shrinkage: f32,
    pub max_depth: u32,
    pub data_sample_ratio: f64,
    pub feature_sample_ratio: f64,
    pub min_leaf_size: usize,
}

impl Default for Hyperparams {
    fn default() -> Self {
        Self {
            iterations: 100,
            shrinkage: 0.1,
            max_depth: 5,
            data_sample_ratio: 1.0,
            feature_sample_ratio: 1.0,
            min_leaf_size: 1,
        }
    }
}

/// Candidate values per hyperparameter
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ParamGrid {
    pub iterations: Vec<usize>,
    pub shrinkage: Vec<f32>,
    pub max_depth: Vec<u32>,
    pub data_sample_ratio: Vec<f64>,
    pub feature_sample_ratio: Vec<f64>,
    pub min_leaf_size: Vec<usize>,
}

impl Default for ParamGrid {
    fn default() -> Self {
        Self {
            iterations: vec![100, 300, 500, 1000],
            shrinkage: vec![0.01, 0.05, 0.1, 0.2],
            max_depth: vec![3, 5, 7, 9],
            data_sample_ratio: vec![0.7, 0.8, 0.9, 1.0],
            feature_sample_ratio: vec![0.7, 0.8, 0.9, 1.0],
            min_leaf_size: vec![1, 5, 10],
        }
    }
}

impl ParamGrid {
    /// Number of distinct combinations
    pub fn size(&self) -> usize {
        self.iterations.len()
            * self.shrinkage.len()
            * self.max_depth.len()
            * self.data_sample_ratio.len()
            * self.feature_sample_ratio.len()
            * self.min_leaf_size.len()
    }

    /// Combination at a flat index, last parameter varying fastest
    pub fn get(&self, mut index: usize) -> Option<Hyperparams> {
        if index >= self.size() {
            return None;
        }
        let mut pick = |len: usize| {
            let i = index % len;
            index /= len;
            i
        };
        let min_leaf_size = self.min_leaf_size[pick(self.min_leaf_size.len())];
        let feature_sample_ratio = self.feature_sample_ratio[pick(self.feature_sample_ratio.len())];
        let data_sample_ratio = self.data_sample_ratio[pick(self.data_sample_ratio.len())];
        let max_depth = self.max_depth[pick(self.max_depth.len())];
        let shrinkage = self.shrinkage[pick(self.shrinkage.len())];
        let iterations = self.iterations[pick(self.iterations.len())];

        Some(Hyperparams {
            iterations,
            shrinkage,
            max_depth,
            data_sample_ratio,
            feature_sample_ratio,
            min_leaf_size,
        })
    }

    /// Draw `n_iter` distinct combinations with a seeded RNG
    ///
    /// Asking for more than the grid holds returns the whole grid.
    pub fn sample(&self, n_iter: usize, seed: u64) -> Vec<Hyperparams> {
        let size = self.size();
        let mut rng = StdRng::seed_from_u64(seed);
        rand::seq::index::sample(&mut rng, size, n_iter.min(size))
            .into_iter()
            .filter_map(|i| self.get(i))
            .collect()
    }
}

/// Train/test index ranges of an expanding-window time-series split
///
/// Each fold tests on the next `n_samples / (n_splits + 1)` rows and trains
/// on every row before them. Leading remainder rows only ever train.
pub fn time_series_splits(
    n_samples: usize,
    n_splits: usize,
) -> Result<Vec<(Range<usize>, Range<usize>)>> {
    validate_splits(n_samples, n_splits)?;

    let test_size = n_samples / (n_splits + 1);
    let first_test = n_samples - n_splits * test_size;

    Ok((0..n_splits)
        .map(|fold| {
            let start = first_test + fold * test_size;
            (0..start, start..start + test_size)
        })
        .collect())
}

/// Regression model seam used by the search and the final fit
pub trait Regressor {
    fn fit(&mut self, features: &[Vec<f64>], target: &[f64]) -> Result<()>;
    fn predict(&self, features: &[Vec<f64>]) -> Result<Vec<f64>>;
}

/// Squared-error gradient boosting backed by the `gbdt` crate
pub struct GbdtRegressor {
    params: Hyperparams,
    model: Option<GBDT>,
}

impl GbdtRegressor {
    pub fn new(params: Hyperparams) -> Self {
        Self { params, model: None }
    }

    pub fn params(&self) -> &Hyperparams {
        &self.params
    }

    fn config(&self, n_features: usize) -> GbdtConfig {
        let mut cfg = GbdtConfig::new();
        cfg.set_feature_size(n_features);
        cfg.set_max_depth(self.params.max_depth);
        cfg.set_iterations(self.params.iterations);
        cfg.set_shrinkage(self.params.shrinkage);
        cfg.set_loss("SquaredError");
        cfg.set_data_sample_ratio(self.params.data_sample_ratio);
        cfg.set_feature_sample_ratio(self.params.feature_sample_ratio);
        cfg.set_min_leaf_size(self.params.min_leaf_size);
        cfg.set_debug(false);
        cfg.set_training_optimization_level(2);
        cfg
    }
}

fn to_f32(row: &[f64]) -> Vec<f32> {
    row.iter().map(|&v| v as f32).collect()
}

impl Regressor for GbdtRegressor {
    fn fit(&mut self, features: &[Vec<f64>], target: &[f64]) -> Result<()> {
        if features.is_empty() || features.len() != target.len() {
            return Err(PipelineError::Training(format!(
                "Cannot fit on {} rows with {} targets",
                features.len(),
                target.len()
            )));
        }

        let n_features = features[0].len();
        let mut data: DataVec = features
            .iter()
            .zip(target)
            .map(|(row, &y)| Data::new_training_data(to_f32(row), 1.0, y as f32, None))
            .collect();

        let mut model = GBDT::new(&self.config(n_features));
        model.fit(&mut data);
        self.model = Some(model);
        Ok(())
    }

    fn predict(&self, features: &[Vec<f64>]) -> Result<Vec<f64>> {
        let model = self
            .model
            .as_ref()
            .ok_or_else(|| PipelineError::Training("Model has not been fitted".to_string()))?;

        let data: DataVec = features
            .iter()
            .map(|row| Data::new_test_data(to_f32(row), None))
            .collect();

        Ok(model.predict(&data).into_iter().map(f64::from).collect())
    }
}

/// Score of one sampled configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CandidateScore {
    pub params: Hyperparams,
    pub fold_scores: Vec<f64>,
    pub mean_score: f64,
}

/// Result of a randomized search
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchResult {
    pub best_params: Hyperparams,
    pub best_score: f64,
    pub candidates: Vec<CandidateScore>,
}

/// Randomized search scored by mean R² over time-series folds
pub struct RandomizedSearch {
    pub grid: ParamGrid,
    pub n_iter: usize,
    pub n_splits: usize,
    pub seed: u64,
}

impl RandomizedSearch {
    pub fn new(n_iter: usize, n_splits: usize, seed: u64) -> Self {
        Self {
            grid: ParamGrid::default(),
            n_iter,
            n_splits,
            seed,
        }
    }

    /// Search with the `gbdt` regressor
    pub fn run(&self, features: &[Vec<f64>], target: &[f64]) -> Result<SearchResult> {
        self.run_with(features, target, GbdtRegressor::new)
    }

    /// Search with any regressor built from a configuration
    ///
    /// The first configuration with the highest mean score wins.
    pub fn run_with<R, F>(
        &self,
        features: &[Vec<f64>],
        target: &[f64],
        make: F,
    ) -> Result<SearchResult>
    where
        R: Regressor,
        F: Fn(Hyperparams) -> R,
    {
        let folds = time_series_splits(target.len(), self.n_splits)?;
        let candidates = self.grid.sample(self.n_iter, self.seed);
        info!(
            "Searching {} of {} configurations over {} folds",
            candidates.len(),
            self.grid.size(),
            folds.len()
        );

        let mut scored: Vec<CandidateScore> = Vec::with_capacity(candidates.len());
        for (i, params) in candidates.into_iter().enumerate() {
            let mut fold_scores = Vec::with_capacity(folds.len());
            for (train, test) in &folds {
                let mut model = make(params);
                model.fit(&features[train.clone()], &target[train.clone()])?;
                let predicted = model.predict(&features[test.clone()])?;
                fold_scores.push(r2_score(&target[test.clone()], &predicted));
            }
            let mean_score = fold_scores.iter().sum::<f64>() / fold_scores.len() as f64;
            debug!("Candidate {} {:?}: mean R² {:.4}", i + 1, params, mean_score);

            scored.push(CandidateScore {
                params,
                fold_scores,
                mean_score,
            });
        }

        let best = scored
            .iter()
            .fold(None::<&CandidateScore>, |best, c| match best {
                Some(b) if b.mean_score >= c.mean_score || c.mean_score.is_nan() => Some(b),
                _ => Some(c),
            })
            .map(|b| (b.params, b.mean_score))
            .ok_or_else(|| PipelineError::Training("No configuration was evaluated".to_string()))?;

        info!("Best mean R² {:.4} with {:?}", best.1, best.0);

        Ok(SearchResult {
            best_params: best.0,
            best_score: best.1,
            candidates: scored,
        })
    }
}
