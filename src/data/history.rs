//! Driver History Index
//!
//! Orders each driver's records chronologically so trailing aggregates only
//! ever see events that came before the current one.

use std::cmp::Ordering;
use std::collections::BTreeMap;

/// Number of prior events averaged by the momentum features
pub const MOMENTUM_WINDOW: usize = 3;

/// Row indices of every driver, sorted by `race_id`
pub struct DriverHistoryIndex {
    /// driver -> row indices in chronological order
    history: BTreeMap<String, Vec<usize>>,
}

impl DriverHistoryIndex {
    /// Index rows by driver
    ///
    /// `drivers[i]`, `race_ids[i]` and `tiebreak[i]` describe row `i`. Rows
    /// of one driver sharing a `race_id` are ordered by their `tiebreak`
    /// values (missing last), so the order does not depend on input order.
    pub fn build<const K: usize>(
        drivers: &[&str],
        race_ids: &[usize],
        tiebreak: &[[Option<f64>; K]],
    ) -> Self {
        let mut history: BTreeMap<String, Vec<usize>> = BTreeMap::new();
        for (row, driver) in drivers.iter().enumerate() {
            history.entry(driver.to_string()).or_default().push(row);
        }

        for rows in history.values_mut() {
            rows.sort_by(|&a, &b| {
                race_ids[a]
                    .cmp(&race_ids[b])
                    .then_with(|| {
                        tiebreak[a]
                            .iter()
                            .zip(&tiebreak[b])
                            .map(|(x, y)| compare_present_first(*x, *y))
                            .find(|o| o.is_ne())
                            .unwrap_or(Ordering::Equal)
                    })
                    .then_with(|| a.cmp(&b))
            });
        }

        Self { history }
    }

    /// Chronological row indices of one driver
    pub fn rows_for(&self, driver: &str) -> &[usize] {
        self.history.get(driver).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Mean of each row's previous `window` values for the same driver
    ///
    /// The current row never contributes to its own result. Missing values
    /// inside the window are skipped; a window with no values yields `None`.
    pub fn trailing_mean(&self, values: &[Option<f64>], window: usize) -> Vec<Option<f64>> {
        let mut out = vec![None; values.len()];

        for rows in self.history.values() {
            for (pos, &row) in rows.iter().enumerate() {
                let start = pos.saturating_sub(window);
                let prior: Vec<f64> = rows[start..pos].iter().filter_map(|&r| values[r]).collect();
                if !prior.is_empty() {
                    out[row] = Some(prior.iter().sum::<f64>() / prior.len() as f64);
                }
            }
        }

        out
    }

    /// Number of distinct drivers
    pub fn len(&self) -> usize {
        self.history.len()
    }

    pub fn is_empty(&self) -> bool {
        self.history.is_empty()
    }
}

/// Order optional numbers ascending with missing values last
pub fn compare_present_first(a: Option<f64>, b: Option<f64>) -> Ordering {
    match (a, b) {
        (Some(x), Some(y)) => x.total_cmp(&y),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    }
}

/// Median of the present values, `None` when there are none
pub fn median(values: &[Option<f64>]) -> Option<f64> {
    let mut present: Vec<f64> = values.iter().flatten().copied().collect();
    if present.is_empty() {
        return None;
    }
    present.sort_by(|a, b| a.partial_cmp(b).unwrap_or(Ordering::Equal));

    let mid = present.len() / 2;
    if present.len() % 2 == 0 {
        Some((present[mid - 1] + present[mid]) / 2.0)
    } else {
        Some(present[mid])
    }
}

/// Replace missing values with the median of the present ones
///
/// The median is taken over the column as given, before any filling.
pub fn fill_with_median(values: &mut [Option<f64>]) {
    if let Some(m) = median(values) {
        for value in values.iter_mut() {
            if value.is_none() {
                *value = Some(m);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn untied(n: usize) -> Vec<[Option<f64>; 0]> {
        vec![[]; n]
    }

    #[test]
    fn test_rows_sorted_by_race_id() {
        let index = DriverHistoryIndex::build(&["A", "B", "A", "A"], &[5, 1, 2, 9], &untied(4));
        assert_eq!(index.rows_for("A"), &[2, 0, 3]);
        assert_eq!(index.rows_for("B"), &[1]);
        assert!(index.rows_for("C").is_empty());
        assert_eq!(index.len(), 2);
    }

    #[test]
    fn test_same_race_rows_ordered_by_content() {
        let tiebreak = [
            [Some(2.0), Some(6.0)],
            [None, Some(1.0)],
            [Some(1.0), Some(2.0)],
            [Some(5.0), Some(5.0)],
        ];
        let index = DriverHistoryIndex::build(&["A"; 4], &[0, 0, 0, 1], &tiebreak);
        assert_eq!(index.rows_for("A"), &[2, 0, 1, 3]);

        // Same rows fed in reverse: identical content order
        let reversed: Vec<[Option<f64>; 2]> = tiebreak.iter().rev().copied().collect();
        let index = DriverHistoryIndex::build(&["A"; 4], &[1, 0, 0, 0], &reversed);
        assert_eq!(index.rows_for("A"), &[1, 3, 2, 0]);
    }

    #[test]
    fn test_compare_present_first() {
        assert_eq!(compare_present_first(Some(1.0), Some(2.0)), Ordering::Less);
        assert_eq!(compare_present_first(Some(9.0), None), Ordering::Less);
        assert_eq!(compare_present_first(None, Some(1.0)), Ordering::Greater);
        assert_eq!(compare_present_first(None, None), Ordering::Equal);
    }

    #[test]
    fn test_trailing_mean_excludes_current() {
        let index = DriverHistoryIndex::build(&["A"; 5], &[0, 1, 2, 3, 4], &untied(5));
        let values = vec![Some(1.0), Some(3.0), Some(5.0), Some(7.0), Some(9.0)];

        let means = index.trailing_mean(&values, 3);

        assert_eq!(means[0], None);
        assert_eq!(means[1], Some(1.0));
        assert_eq!(means[2], Some(2.0));
        assert_eq!(means[3], Some(3.0));
        // Window slides: (3 + 5 + 7) / 3
        assert_eq!(means[4], Some(5.0));
    }

    #[test]
    fn test_trailing_mean_per_driver() {
        let index = DriverHistoryIndex::build(&["A", "B", "A", "B"], &[0, 0, 1, 1], &untied(4));
        let values = vec![Some(1.0), Some(20.0), Some(2.0), Some(10.0)];

        let means = index.trailing_mean(&values, 3);

        assert_eq!(means, vec![None, None, Some(1.0), Some(20.0)]);
    }

    #[test]
    fn test_trailing_mean_skips_missing() {
        let index = DriverHistoryIndex::build(&["A"; 3], &[0, 1, 2], &untied(3));
        let values = vec![None, Some(4.0), Some(8.0)];

        let means = index.trailing_mean(&values, 3);

        assert_eq!(means, vec![None, None, Some(4.0)]);
    }

    #[test]
    fn test_median() {
        assert_eq!(median(&[Some(3.0), None, Some(1.0), Some(2.0)]), Some(2.0));
        assert_eq!(median(&[Some(4.0), Some(1.0), Some(2.0), Some(3.0)]), Some(2.5));
        assert_eq!(median(&[None, None]), None);
    }

    #[test]
    fn test_fill_with_median() {
        let mut values = vec![None, Some(1.0), Some(5.0), None, Some(3.0)];
        fill_with_median(&mut values);
        assert_eq!(values, vec![Some(3.0), Some(1.0), Some(5.0), Some(3.0), Some(3.0)]);
    }
}
