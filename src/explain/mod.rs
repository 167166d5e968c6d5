//! Exact TreeSHAP attribution for fitted forests
//!
//! Computes, for every sample and class, how much each feature moved the
//! model's probability output away from the cover-weighted expectation.
//! This is the tree-exact algorithm of Lundberg et al. (2020), not a
//! sampling approximation.

mod path;
mod summary;
mod tree_shap;

pub use summary::{AttributionSet, AttributionSummary};
pub use tree_shap::TreeExplainer;
