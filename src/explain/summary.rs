//! Attribution containers and per-feature aggregation

use crate::error::{ExplainError, Result};
use ndarray::Array2;
use serde::Serialize;

/// Per-class attribution scores for a batch of samples.
#[derive(Debug, Clone)]
pub struct AttributionSet {
    /// One samples x features matrix per class
    per_class: Vec<Array2<f64>>,
    /// Expected model output per class
    base_values: Vec<f64>,
}

impl AttributionSet {
    pub(crate) fn new(per_class: Vec<Array2<f64>>, base_values: Vec<f64>) -> Self {
        debug_assert_eq!(per_class.len(), base_values.len());
        Self {
            per_class,
            base_values,
        }
    }

    /// Number of classes.
    pub fn n_classes(&self) -> usize {
        self.per_class.len()
    }

    /// Number of explained samples.
    pub fn n_samples(&self) -> usize {
        self.per_class.first().map_or(0, |m| m.nrows())
    }

    /// Number of features.
    pub fn n_features(&self) -> usize {
        self.per_class.first().map_or(0, |m| m.ncols())
    }

    /// Scores for one class, validated against the class count.
    pub fn class(&self, idx: usize) -> Result<&Array2<f64>> {
        self.per_class
            .get(idx)
            .ok_or(ExplainError::InvalidClassIndex {
                requested: idx,
                n_classes: self.per_class.len(),
            })
    }

    /// Base value for one class, validated against the class count.
    pub fn base_value(&self, idx: usize) -> Result<f64> {
        self.base_values
            .get(idx)
            .copied()
            .ok_or(ExplainError::InvalidClassIndex {
                requested: idx,
                n_classes: self.base_values.len(),
            })
    }
}

/// Mean absolute attribution per feature, the ordering key for both plots.
#[derive(Debug, Clone, Serialize)]
pub struct AttributionSummary {
    /// Mean |score| per feature, in column order
    pub mean_abs: Vec<f64>,
}

impl AttributionSummary {
    /// Aggregate a samples x features score matrix.
    pub fn from_scores(scores: &Array2<f64>) -> Self {
        let n = scores.nrows().max(1) as f64;
        let mean_abs = scores
            .columns()
            .into_iter()
            .map(|col| col.iter().map(|v| v.abs()).sum::<f64>() / n)
            .collect();
        Self { mean_abs }
    }

    /// Feature indices ranked by mean |score|, descending.
    pub fn ranking(&self) -> Vec<(usize, f64)> {
        let mut indexed: Vec<(usize, f64)> =
            self.mean_abs.iter().copied().enumerate().collect();
        indexed.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(std::cmp::Ordering::Equal));
        indexed
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    fn small_set() -> AttributionSet {
        AttributionSet::new(
            vec![
                array![[0.1, -0.2], [0.3, 0.0]],
                array![[-0.1, 0.2], [-0.3, 0.0]],
            ],
            vec![0.6, 0.4],
        )
    }

    #[test]
    fn test_class_selection() {
        let set = small_set();
        assert_eq!(set.n_classes(), 2);
        assert_eq!(set.n_samples(), 2);
        assert_eq!(set.n_features(), 2);
        assert_eq!(set.class(1).unwrap()[[1, 0]], -0.3);
        assert_eq!(set.base_value(0).unwrap(), 0.6);
    }

    #[test]
    fn test_out_of_range_class_rejected() {
        let set = small_set();
        let err = set.class(2).unwrap_err();
        assert!(matches!(
            err,
            ExplainError::InvalidClassIndex {
                requested: 2,
                n_classes: 2
            }
        ));
    }

    #[test]
    fn test_mean_abs() {
        let scores = array![[0.5, 0.5], [-1.5, 0.5]];
        let summary = AttributionSummary::from_scores(&scores);
        assert_eq!(summary.mean_abs, vec![1.0, 0.5]);
    }

    #[test]
    fn test_ranking_descending() {
        let scores = array![[0.1, -2.0, 0.5], [-0.1, 2.0, 0.5]];
        let summary = AttributionSummary::from_scores(&scores);
        let ranking = summary.ranking();
        assert_eq!(ranking[0].0, 1);
        assert_eq!(ranking[1].0, 2);
        assert_eq!(ranking[2].0, 0);
    }
}
