//! Model input matrices built from engineered features

use regex::Regex;
use std::sync::OnceLock;

use crate::data::{FeatureSet, BASE_FEATURE_NAMES};
use crate::models::{EventKey, FeatureRecord};

fn name_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"\[|\]|<").expect("valid feature name pattern"))
}

/// Replace characters gradient-boosting libraries reject in feature names
pub fn sanitize_feature_name(name: &str) -> String {
    name_pattern().replace_all(name, "_").into_owned()
}

/// Ordered model feature names: base features then constructor indicators
pub struct FeatureListBuilder;

impl FeatureListBuilder {
    pub fn build(set: &FeatureSet) -> Vec<String> {
        BASE_FEATURE_NAMES
            .iter()
            .map(|n| n.to_string())
            .chain(set.indicator_columns())
            .map(|n| sanitize_feature_name(&n))
            .collect()
    }
}

/// Feature vector of one record, in [`FeatureListBuilder`] order
///
/// Values still missing after feature engineering become 0.0.
pub fn feature_vector(record: &FeatureRecord) -> Vec<f64> {
    let mut row = vec![
        record.pos_quali.unwrap_or(0.0),
        record.grid_final,
        record.q1_s,
        record.q2_s,
        record.q3_s,
        record.punicao_grid.unwrap_or(0.0),
        record.gap_q1_q2,
        record.gap_q2_q3,
        record.momentum_pos_3r.unwrap_or(0.0),
        record.momentum_pts_3r.unwrap_or(0.0),
        record.momentum_quali_3r.unwrap_or(0.0),
    ];
    row.extend(
        record
            .constructor_flags
            .iter()
            .map(|&flag| if flag { 1.0 } else { 0.0 }),
    );
    row
}

/// Feature matrix, target and identity columns, row-aligned
#[derive(Debug, Clone, Default)]
pub struct Dataset {
    pub feature_names: Vec<String>,
    pub features: Vec<Vec<f64>>,
    pub target: Vec<f64>,
    pub events: Vec<EventKey>,
    pub drivers: Vec<String>,
}

impl Dataset {
    /// Rows keep the feature set order, which is chronological
    pub fn from_feature_set(set: &FeatureSet) -> Self {
        let mut dataset = Dataset {
            feature_names: FeatureListBuilder::build(set),
            ..Default::default()
        };
        for record in &set.records {
            dataset.features.push(feature_vector(record));
            dataset.target.push(record.pos_corrida);
            dataset.events.push(record.event.clone());
            dataset.drivers.push(record.driver.clone());
        }
        dataset
    }

    pub fn len(&self) -> usize {
        self.target.len()
    }

    pub fn is_empty(&self) -> bool {
        self.target.is_empty()
    }

    pub fn n_features(&self) -> usize {
        self.feature_names.len()
    }

    /// Rows at `indices`, in the given order
    pub fn subset(&self, indices: &[usize]) -> Dataset {
        Dataset {
            feature_names: self.feature_names.clone(),
            features: indices.iter().map(|&i| self.features[i].clone()).collect(),
            target: indices.iter().map(|&i| self.target[i]).collect(),
            events: indices.iter().map(|&i| self.events[i].clone()).collect(),
            drivers: indices.iter().map(|&i| self.drivers[i].clone()).collect(),
        }
    }

    /// Chronological split: seasons before `test_season` train, `test_season` tests
    ///
    /// Later seasons belong to neither side.
    pub fn split_by_season(&self, test_season: i32) -> (Dataset, Dataset) {
        let train: Vec<usize> = (0..self.len())
            .filter(|&i| self.events[i].season < test_season)
            .collect();
        let test: Vec<usize> = (0..self.len())
            .filter(|&i| self.events[i].season == test_season)
            .collect();
        (self.subset(&train), self.subset(&test))
    }
}
