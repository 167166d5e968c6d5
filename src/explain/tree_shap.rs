//! TreeSHAP explainer for forest classifiers
//!
//! Walks every tree's hot and cold branches per sample, accumulating
//! exact Shapley contributions for all classes in a single traversal.

use super::path::PathState;
use super::summary::AttributionSet;
use crate::error::{ExplainError, Result};
use crate::model::{ForestClassifier, TreeNode};
use ndarray::{Array2, ArrayView1, ArrayView2};
use rayon::prelude::*;

/// TreeSHAP explainer over a fitted forest.
pub struct TreeExplainer<'a> {
    forest: &'a ForestClassifier,
    /// Expected probability per class over the training distribution
    base_values: Vec<f64>,
}

impl<'a> TreeExplainer<'a> {
    /// Create an explainer for the given forest.
    pub fn new(forest: &'a ForestClassifier) -> Result<Self> {
        if !forest.is_fitted() {
            return Err(ExplainError::ModelError(
                "cannot explain an unfitted forest".to_string(),
            ));
        }

        let n_classes = forest.n_classes();
        let mut base_values = vec![0.0; n_classes];
        for tree in forest.trees() {
            let root = tree.root().ok_or_else(|| {
                ExplainError::ModelError("forest contains an unfitted tree".to_string())
            })?;
            let expected = expected_distribution(root, n_classes);
            for (c, v) in expected.into_iter().enumerate() {
                base_values[c] += v;
            }
        }
        for v in &mut base_values {
            *v /= forest.trees().len() as f64;
        }

        Ok(Self {
            forest,
            base_values,
        })
    }

    /// Expected probability per class (the attribution baseline).
    pub fn base_values(&self) -> &[f64] {
        &self.base_values
    }

    /// Compute per-class attribution scores for every row of `x`.
    ///
    /// For each class the result has one row per sample and one column
    /// per feature, and `base + row.sum()` equals `predict_proba`.
    pub fn shap_values(&self, x: &ArrayView2<f64>) -> Result<AttributionSet> {
        if x.ncols() != self.forest.n_features() {
            return Err(ExplainError::ShapeError {
                expected: format!("{} features", self.forest.n_features()),
                actual: format!("{} features", x.ncols()),
            });
        }

        let n_samples = x.nrows();
        let n_features = x.ncols();
        let n_classes = self.forest.n_classes();
        let n_trees = self.forest.trees().len() as f64;

        // classes x features contributions, one matrix per sample
        let per_sample: Vec<Array2<f64>> = (0..n_samples)
            .into_par_iter()
            .map(|i| {
                let sample = x.row(i);
                let mut phi = Array2::zeros((n_classes, n_features));
                for tree in self.forest.trees() {
                    let root = tree.root().expect("fitted forest has rooted trees");
                    recurse(root, &sample, &mut phi, PathState::new(), 1.0, 1.0, -1);
                }
                phi /= n_trees;
                phi
            })
            .collect();

        // Reassemble into per-class [samples x features] matrices
        let mut per_class = vec![Array2::zeros((n_samples, n_features)); n_classes];
        for (i, phi) in per_sample.iter().enumerate() {
            for c in 0..n_classes {
                for f in 0..n_features {
                    per_class[c][[i, f]] = phi[[c, f]];
                }
            }
        }

        Ok(AttributionSet::new(per_class, self.base_values.clone()))
    }
}

/// Cover-weighted expected class distribution of a tree.
fn expected_distribution(node: &TreeNode, n_classes: usize) -> Vec<f64> {
    match node {
        TreeNode::Leaf { distribution, .. } => distribution.clone(),
        TreeNode::Split {
            left,
            right,
            n_samples,
            ..
        } => {
            let lv = expected_distribution(left, n_classes);
            let rv = expected_distribution(right, n_classes);
            let lw = left.n_samples() as f64;
            let rw = right.n_samples() as f64;
            let total = (*n_samples as f64).max(lw + rw);
            (0..n_classes)
                .map(|c| (lw * lv[c] + rw * rv[c]) / total)
                .collect()
        }
    }
}

/// One TreeSHAP descent. `phi` is classes x features for a single sample.
fn recurse(
    node: &TreeNode,
    sample: &ArrayView1<f64>,
    phi: &mut Array2<f64>,
    mut path: PathState,
    zero_fraction: f64,
    one_fraction: f64,
    feature: isize,
) {
    path.extend(zero_fraction, one_fraction, feature);

    match node {
        TreeNode::Leaf { distribution, .. } => {
            for i in 1..path.len() {
                let w = path.unwound_sum(i);
                let el = path.element(i);
                let scale = w * (el.one_fraction - el.zero_fraction);
                for (c, &v) in distribution.iter().enumerate() {
                    phi[[c, el.feature as usize]] += scale * v;
                }
            }
        }
        TreeNode::Split {
            feature_idx,
            threshold,
            left,
            right,
            n_samples,
        } => {
            // NaN routes right, as in prediction
            let go_left = sample[*feature_idx] <= *threshold;
            let (hot, cold) = if go_left {
                (left.as_ref(), right.as_ref())
            } else {
                (right.as_ref(), left.as_ref())
            };

            let total = *n_samples as f64;
            let hot_fraction = hot.n_samples() as f64 / total;
            let cold_fraction = cold.n_samples() as f64 / total;

            // A feature met twice on one path folds into a single entry
            let (mut incoming_zero, mut incoming_one) = (1.0, 1.0);
            if let Some(k) = path.position_of(*feature_idx as isize) {
                let el = path.element(k);
                incoming_zero = el.zero_fraction;
                incoming_one = el.one_fraction;
                path.unwind(k);
            }

            recurse(
                hot,
                sample,
                phi,
                path.clone(),
                incoming_zero * hot_fraction,
                incoming_one,
                *feature_idx as isize,
            );
            recurse(
                cold,
                sample,
                phi,
                path,
                incoming_zero * cold_fraction,
                0.0,
                *feature_idx as isize,
            );
        }
    }
}
