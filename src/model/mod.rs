//! Tree-ensemble classifiers and model persistence
//!
//! The decision trees here keep per-node sample counts (covers) and
//! per-leaf class distributions, which is exactly the structure the
//! attribution engine in [`crate::explain`] traverses.

mod forest;
mod store;
mod tree;

pub use forest::{ForestClassifier, MaxFeatures};
pub use store::{ModelArtifact, ModelMetadata, ARTIFACT_SCHEMA_VERSION};
pub use tree::{Criterion, DecisionTree, TreeNode};
