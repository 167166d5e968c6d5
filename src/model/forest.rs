//! Bagged forest classifier

use super::tree::{Criterion, DecisionTree};
use crate::error::{ExplainError, Result};
use ndarray::{Array1, Array2, ArrayView2, Axis};
use rand::{RngCore, SeedableRng};
use rand_chacha::ChaCha8Rng;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};

/// Strategy for the per-split feature subset size
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub enum MaxFeatures {
    /// Square root of n_features
    Sqrt,
    /// Log2 of n_features
    Log2,
    /// Fixed number
    Fixed(usize),
    /// All features
    All,
}

/// Bagged ensemble of decision trees for classification
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ForestClassifier {
    /// Individual trees
    trees: Vec<DecisionTree>,
    /// Number of trees
    pub n_estimators: usize,
    /// Maximum depth per tree
    pub max_depth: Option<usize>,
    /// Minimum samples to split
    pub min_samples_split: usize,
    /// Minimum samples in leaf
    pub min_samples_leaf: usize,
    /// Features considered per split
    pub max_features: MaxFeatures,
    /// Bootstrap sampling
    pub bootstrap: bool,
    /// Impurity criterion
    pub criterion: Criterion,
    /// Random state
    pub random_state: Option<u64>,
    /// Class labels, sorted ascending; tree distributions index into this
    classes: Vec<f64>,
    /// Number of features
    n_features: usize,
}

impl Default for ForestClassifier {
    fn default() -> Self {
        Self::new(100)
    }
}

impl ForestClassifier {
    /// Create a new forest classifier
    pub fn new(n_estimators: usize) -> Self {
        Self {
            trees: Vec::new(),
            n_estimators,
            max_depth: None,
            min_samples_split: 2,
            min_samples_leaf: 1,
            max_features: MaxFeatures::Sqrt,
            bootstrap: true,
            criterion: Criterion::Gini,
            random_state: None,
            classes: Vec::new(),
            n_features: 0,
        }
    }

    /// Set maximum depth
    pub fn with_max_depth(mut self, depth: usize) -> Self {
        self.max_depth = Some(depth);
        self
    }

    /// Set minimum samples to split
    pub fn with_min_samples_split(mut self, min_samples: usize) -> Self {
        self.min_samples_split = min_samples;
        self
    }

    /// Set minimum samples in leaf
    pub fn with_min_samples_leaf(mut self, min_samples: usize) -> Self {
        self.min_samples_leaf = min_samples;
        self
    }

    /// Set max features strategy
    pub fn with_max_features(mut self, max_features: MaxFeatures) -> Self {
        self.max_features = max_features;
        self
    }

    /// Set criterion
    pub fn with_criterion(mut self, criterion: Criterion) -> Self {
        self.criterion = criterion;
        self
    }

    /// Disable bootstrap sampling
    pub fn with_bootstrap(mut self, bootstrap: bool) -> Self {
        self.bootstrap = bootstrap;
        self
    }

    /// Set random state
    pub fn with_random_state(mut self, seed: u64) -> Self {
        self.random_state = Some(seed);
        self
    }

    fn compute_max_features(&self, n_features: usize) -> usize {
        match self.max_features {
            MaxFeatures::Sqrt => (n_features as f64).sqrt().ceil() as usize,
            MaxFeatures::Log2 => (n_features as f64).log2().ceil() as usize,
            MaxFeatures::Fixed(n) => n.min(n_features),
            MaxFeatures::All => n_features,
        }
        .max(1)
    }

    /// Fit the forest to training data. Labels are arbitrary class values;
    /// the sorted distinct set becomes the class list.
    pub fn fit(&mut self, x: &ArrayView2<f64>, y: &Array1<f64>) -> Result<&mut Self> {
        let n_samples = x.nrows();
        let n_features = x.ncols();

        if n_samples != y.len() {
            return Err(ExplainError::ShapeError {
                expected: format!("y length = {}", n_samples),
                actual: format!("y length = {}", y.len()),
            });
        }
        if n_samples == 0 {
            return Err(ExplainError::ValidationError(
                "cannot fit a forest on an empty dataset".to_string(),
            ));
        }
        if self.n_estimators == 0 {
            return Err(ExplainError::ValidationError(
                "n_estimators must be at least 1".to_string(),
            ));
        }

        self.n_features = n_features;

        let mut classes: Vec<f64> = y.iter().copied().collect();
        classes.sort_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal));
        classes.dedup();
        self.classes = classes;

        let class_indices: Vec<usize> = y
            .iter()
            .map(|v| {
                self.classes
                    .iter()
                    .position(|c| c == v)
                    .expect("label came from the class list")
            })
            .collect();

        let n_classes = self.classes.len();
        let max_features = self.compute_max_features(n_features);
        let base_seed = self.random_state.unwrap_or(42);

        let trees: Result<Vec<DecisionTree>> = (0..self.n_estimators)
            .into_par_iter()
            .map(|tree_idx| {
                let seed = base_seed.wrapping_add(tree_idx as u64);
                let mut rng = ChaCha8Rng::seed_from_u64(seed);

                let sample_indices: Vec<usize> = if self.bootstrap {
                    (0..n_samples)
                        .map(|_| (rng.next_u64() % n_samples as u64) as usize)
                        .collect()
                } else {
                    (0..n_samples).collect()
                };

                let x_boot = x.select(Axis(0), &sample_indices);
                let y_boot: Vec<usize> =
                    sample_indices.iter().map(|&i| class_indices[i]).collect();

                let mut tree = DecisionTree::new()
                    .with_min_samples_split(self.min_samples_split)
                    .with_min_samples_leaf(self.min_samples_leaf)
                    .with_criterion(self.criterion)
                    .with_max_features(max_features)
                    .with_random_state(seed ^ 0x9e37_79b9_7f4a_7c15);
                if let Some(d) = self.max_depth {
                    tree = tree.with_max_depth(d);
                }

                tree.fit(&x_boot.view(), &y_boot, n_classes)?;
                Ok(tree)
            })
            .collect();

        self.trees = trees?;
        Ok(self)
    }

    /// Class-probability predictions: the mean of the per-tree leaf
    /// distributions, rows x classes.
    pub fn predict_proba(&self, x: &ArrayView2<f64>) -> Result<Array2<f64>> {
        if self.trees.is_empty() {
            return Err(ExplainError::ModelError("forest is not fitted".to_string()));
        }

        let mut proba = Array2::zeros((x.nrows(), self.classes.len()));
        for tree in &self.trees {
            proba += &tree.predict_proba(x)?;
        }
        proba /= self.trees.len() as f64;
        Ok(proba)
    }

    /// Predicted class values (argmax of probabilities).
    pub fn predict(&self, x: &ArrayView2<f64>) -> Result<Array1<f64>> {
        let proba = self.predict_proba(x)?;
        let predictions: Vec<f64> = proba
            .rows()
            .into_iter()
            .map(|row| {
                let best = row
                    .iter()
                    .enumerate()
                    .max_by(|a, b| a.1.partial_cmp(b.1).unwrap_or(std::cmp::Ordering::Equal))
                    .map(|(i, _)| i)
                    .unwrap_or(0);
                self.classes[best]
            })
            .collect();
        Ok(Array1::from_vec(predictions))
    }

    /// The fitted trees.
    pub fn trees(&self) -> &[DecisionTree] {
        &self.trees
    }

    /// Class values, sorted ascending.
    pub fn classes(&self) -> &[f64] {
        &self.classes
    }

    /// Number of classes.
    pub fn n_classes(&self) -> usize {
        self.classes.len()
    }

    /// Number of features seen at fit time.
    pub fn n_features(&self) -> usize {
        self.n_features
    }

    /// Whether the forest has been fitted.
    pub fn is_fitted(&self) -> bool {
        !self.trees.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    fn separable_data() -> (Array2<f64>, Array1<f64>) {
        let mut rows = Vec::new();
        let mut labels = Vec::new();
        for i in 0..20 {
            let t = i as f64 / 20.0;
            rows.push([t, t * 0.5]);
            labels.push(0.0);
            rows.push([t + 2.0, t * 0.5 + 2.0]);
            labels.push(1.0);
        }
        let x = Array2::from_shape_vec(
            (rows.len(), 2),
            rows.iter().flat_map(|r| r.to_vec()).collect(),
        )
        .unwrap();
        (x, Array1::from_vec(labels))
    }

    #[test]
    fn test_fit_predict_accuracy() {
        let (x, y) = separable_data();

        let mut forest = ForestClassifier::new(15).with_random_state(42);
        forest.fit(&x.view(), &y).unwrap();

        let predictions = forest.predict(&x.view()).unwrap();
        let accuracy = predictions
            .iter()
            .zip(y.iter())
            .filter(|(p, a)| (*p - *a).abs() < 0.5)
            .count() as f64
            / y.len() as f64;

        assert!(accuracy >= 0.9, "accuracy too low: {}", accuracy);
    }

    #[test]
    fn test_predict_proba_rows_sum_to_one() {
        let (x, y) = separable_data();

        let mut forest = ForestClassifier::new(10).with_random_state(42);
        forest.fit(&x.view(), &y).unwrap();

        let proba = forest.predict_proba(&x.view()).unwrap();
        assert_eq!(proba.ncols(), 2);
        for i in 0..proba.nrows() {
            let row_sum: f64 = proba.row(i).sum();
            assert!((row_sum - 1.0).abs() < 1e-9, "row {} sums to {}", i, row_sum);
        }
    }

    #[test]
    fn test_class_discovery_sorted() {
        let x = array![[0.0], [1.0], [2.0], [3.0]];
        let y = array![3.0, 1.0, 3.0, 1.0];

        let mut forest = ForestClassifier::new(3).with_random_state(1);
        forest.fit(&x.view(), &y).unwrap();

        assert_eq!(forest.classes(), &[1.0, 3.0]);
        assert_eq!(forest.n_classes(), 2);
    }

    #[test]
    fn test_deterministic_for_fixed_seed() {
        let (x, y) = separable_data();

        let mut a = ForestClassifier::new(10).with_random_state(42);
        a.fit(&x.view(), &y).unwrap();
        let mut b = ForestClassifier::new(10).with_random_state(42);
        b.fit(&x.view(), &y).unwrap();

        let pa = a.predict_proba(&x.view()).unwrap();
        let pb = b.predict_proba(&x.view()).unwrap();
        assert_eq!(pa, pb);
    }

    #[test]
    fn test_unfitted_predict_is_an_error() {
        let forest = ForestClassifier::new(5);
        let x = array![[0.0, 0.0]];
        assert!(forest.predict_proba(&x.view()).is_err());
    }

    #[test]
    fn test_length_mismatch_rejected() {
        let x = array![[0.0], [1.0]];
        let y = array![0.0];
        let mut forest = ForestClassifier::new(5);
        assert!(matches!(
            forest.fit(&x.view(), &y),
            Err(ExplainError::ShapeError { .. })
        ));
    }
}
