//! Evaluation Metrics
//!
//! Regression error (MAE, RMSE, R²) and race-level accuracy: winner,
//! podium and top-10 overlap between true and predicted finishing order.

use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// Mean absolute error
pub fn mean_absolute_error(y_true: &[f64], y_pred: &[f64]) -> f64 {
    if y_true.is_empty() {
        return 0.0;
    }
    y_true
        .iter()
        .zip(y_pred)
        .map(|(t, p)| (t - p).abs())
        .sum::<f64>()
        / y_true.len() as f64
}

/// Root mean squared error
pub fn root_mean_squared_error(y_true: &[f64], y_pred: &[f64]) -> f64 {
    if y_true.is_empty() {
        return 0.0;
    }
    let mse = y_true
        .iter()
        .zip(y_pred)
        .map(|(t, p)| (t - p).powi(2))
        .sum::<f64>()
        / y_true.len() as f64;
    mse.sqrt()
}

/// Coefficient of determination
///
/// A constant target scores 1.0 when predicted exactly and 0.0 otherwise.
pub fn r2_score(y_true: &[f64], y_pred: &[f64]) -> f64 {
    if y_true.is_empty() {
        return 0.0;
    }
    let mean = y_true.iter().sum::<f64>() / y_true.len() as f64;
    let ss_res: f64 = y_true.iter().zip(y_pred).map(|(t, p)| (t - p).powi(2)).sum();
    let ss_tot: f64 = y_true.iter().map(|t| (t - mean).powi(2)).sum();

    if ss_tot == 0.0 {
        return if ss_res == 0.0 { 1.0 } else { 0.0 };
    }
    1.0 - ss_res / ss_tot
}

/// Regression metrics on a held-out set
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RegressionMetrics {
    pub mae: f64,
    pub rmse: f64,
    pub r2: f64,
}

impl RegressionMetrics {
    pub fn compute(y_true: &[f64], y_pred: &[f64]) -> Self {
        Self {
            mae: mean_absolute_error(y_true, y_pred),
            rmse: root_mean_squared_error(y_true, y_pred),
            r2: r2_score(y_true, y_pred),
        }
    }
}

/// True and predicted position of one driver at one event
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PredictionRow {
    pub event: String,
    pub driver: String,
    pub actual: f64,
    pub predicted: f64,
}

/// Drivers of one event ordered by true and by predicted position
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EventRanking {
    pub event: String,
    pub by_actual: Vec<PredictionRow>,
    pub by_predicted: Vec<PredictionRow>,
}

impl EventRanking {
    fn top_drivers(rows: &[PredictionRow], n: usize) -> HashSet<&str> {
        rows.iter().take(n).map(|r| r.driver.as_str()).collect()
    }

    /// Drivers in both the true and predicted top `n`
    pub fn overlap(&self, n: usize) -> usize {
        Self::top_drivers(&self.by_actual, n)
            .intersection(&Self::top_drivers(&self.by_predicted, n))
            .count()
    }

    pub fn winner_matches(&self) -> bool {
        match (self.by_actual.first(), self.by_predicted.first()) {
            (Some(a), Some(p)) => a.driver == p.driver,
            _ => false,
        }
    }
}

/// Group rows by event, in order of first appearance
///
/// Sorting is stable, so ties keep input order.
pub fn rank_events(rows: &[PredictionRow]) -> Vec<EventRanking> {
    let mut events: Vec<&str> = Vec::new();
    for row in rows {
        if !events.contains(&row.event.as_str()) {
            events.push(&row.event);
        }
    }

    events
        .into_iter()
        .map(|event| {
            let group: Vec<PredictionRow> = rows
                .iter()
                .filter(|r| r.event == event)
                .cloned()
                .collect();

            let mut by_actual = group.clone();
            by_actual.sort_by(|a, b| a.actual.total_cmp(&b.actual));
            let mut by_predicted = group;
            by_predicted.sort_by(|a, b| a.predicted.total_cmp(&b.predicted));

            EventRanking {
                event: event.to_string(),
                by_actual,
                by_predicted,
            }
        })
        .collect()
}

/// Race-level accuracy over a season
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RaceAccuracy {
    pub total_events: usize,
    pub winner_hits: usize,
    pub podium_hits: usize,
    /// 3 per event
    pub podium_slots: usize,
    pub top10_hits: usize,
    /// 10 per event
    pub top10_slots: usize,
}

impl RaceAccuracy {
    pub fn compute(rankings: &[EventRanking]) -> Self {
        let mut accuracy = RaceAccuracy {
            total_events: rankings.len(),
            ..Default::default()
        };
        for ranking in rankings {
            if ranking.winner_matches() {
                accuracy.winner_hits += 1;
            }
            accuracy.podium_hits += ranking.overlap(3);
            accuracy.podium_slots += 3;
            accuracy.top10_hits += ranking.overlap(10);
            accuracy.top10_slots += 10;
        }
        accuracy
    }

    fn rate(hits: usize, total: usize) -> f64 {
        if total > 0 {
            hits as f64 / total as f64
        } else {
            0.0
        }
    }

    pub fn winner_rate(&self) -> f64 {
        Self::rate(self.winner_hits, self.total_events)
    }

    pub fn podium_rate(&self) -> f64 {
        Self::rate(self.podium_hits, self.podium_slots)
    }

    pub fn top10_rate(&self) -> f64 {
        Self::rate(self.top10_hits, self.top10_slots)
    }
}
