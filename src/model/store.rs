//! Model artifact persistence
//!
//! A fitted forest travels as a bincode blob wrapped in a small metadata
//! envelope, so consumers can validate shape and vintage before use.

use super::forest::ForestClassifier;
use crate::data::FeatureTable;
use crate::error::{ExplainError, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

/// Artifact format version; bump on breaking layout changes.
pub const ARTIFACT_SCHEMA_VERSION: u32 = 1;

/// Metadata describing a serialized model
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelMetadata {
    /// Human-readable model name
    pub name: String,
    /// Artifact format version
    pub schema_version: u32,
    /// Creation timestamp
    pub created_at: DateTime<Utc>,
    /// Number of features the model expects
    pub n_features: usize,
    /// Number of classes the model predicts
    pub n_classes: usize,
    /// Feature names, in training column order
    pub feature_names: Vec<String>,
}

/// A fitted model plus its metadata envelope
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelArtifact {
    pub metadata: ModelMetadata,
    pub model: ForestClassifier,
}

impl ModelArtifact {
    /// Wrap a fitted forest in an artifact envelope.
    pub fn new(name: &str, feature_names: Vec<String>, model: ForestClassifier) -> Result<Self> {
        if !model.is_fitted() {
            return Err(ExplainError::ModelError(
                "cannot package an unfitted model".to_string(),
            ));
        }
        if feature_names.len() != model.n_features() {
            return Err(ExplainError::ShapeError {
                expected: format!("{} feature names", model.n_features()),
                actual: format!("{} feature names", feature_names.len()),
            });
        }

        Ok(Self {
            metadata: ModelMetadata {
                name: name.to_string(),
                schema_version: ARTIFACT_SCHEMA_VERSION,
                created_at: Utc::now(),
                n_features: model.n_features(),
                n_classes: model.n_classes(),
                feature_names,
            },
            model,
        })
    }

    /// Serialize the artifact to a file, overwriting any existing one.
    pub fn save(&self, path: &Path) -> Result<()> {
        let bytes = bincode::serialize(self)?;
        fs::write(path, bytes).map_err(|e| {
            ExplainError::SerializationError(format!("cannot write {}: {e}", path.display()))
        })
    }

    /// Deserialize an artifact from a file.
    pub fn load(path: &Path) -> Result<Self> {
        let bytes = fs::read(path).map_err(|e| {
            ExplainError::ModelError(format!("cannot read model {}: {e}", path.display()))
        })?;
        let artifact: Self = bincode::deserialize(&bytes)?;

        if artifact.metadata.schema_version != ARTIFACT_SCHEMA_VERSION {
            return Err(ExplainError::ModelError(format!(
                "unsupported artifact schema version {} (expected {})",
                artifact.metadata.schema_version, ARTIFACT_SCHEMA_VERSION
            )));
        }

        Ok(artifact)
    }

    /// Check that a feature table matches the model's training schema.
    pub fn validate_features(&self, table: &FeatureTable) -> Result<()> {
        if table.n_features() != self.metadata.n_features {
            return Err(ExplainError::ShapeError {
                expected: format!("{} feature columns", self.metadata.n_features),
                actual: format!("{} feature columns", table.n_features()),
            });
        }
        if table.names() != self.metadata.feature_names.as_slice() {
            return Err(ExplainError::ValidationError(format!(
                "feature columns {:?} do not match the model's training columns {:?}",
                table.names(),
                self.metadata.feature_names
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::{array, Array2};
    use tempfile::tempdir;

    fn fitted_forest() -> ForestClassifier {
        let x = array![
            [0.0, 0.0],
            [0.2, 0.1],
            [0.1, 0.2],
            [1.0, 1.0],
            [1.1, 0.9],
            [0.9, 1.1],
        ];
        let y = array![0.0, 0.0, 0.0, 1.0, 1.0, 1.0];
        let mut forest = ForestClassifier::new(5).with_random_state(42);
        forest.fit(&x.view(), &y).unwrap();
        forest
    }

    #[test]
    fn test_round_trip_preserves_predictions() {
        let forest = fitted_forest();
        let artifact = ModelArtifact::new(
            "credit",
            vec!["a".to_string(), "b".to_string()],
            forest.clone(),
        )
        .unwrap();

        let dir = tempdir().unwrap();
        let path = dir.path().join("model.bin");
        artifact.save(&path).unwrap();

        let loaded = ModelArtifact::load(&path).unwrap();
        assert_eq!(loaded.metadata.name, "credit");
        assert_eq!(loaded.metadata.n_classes, 2);

        let x = array![[0.05, 0.05], [1.05, 1.05]];
        let before = forest.predict_proba(&x.view()).unwrap();
        let after = loaded.model.predict_proba(&x.view()).unwrap();
        assert_eq!(before, after);
    }

    #[test]
    fn test_missing_file_is_an_error() {
        let result = ModelArtifact::load(Path::new("/nonexistent/model.bin"));
        assert!(matches!(result, Err(ExplainError::ModelError(_))));
    }

    #[test]
    fn test_garbage_file_is_an_error() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("model.bin");
        fs::write(&path, b"not a model").unwrap();

        let result = ModelArtifact::load(&path);
        assert!(matches!(result, Err(ExplainError::SerializationError(_))));
    }

    #[test]
    fn test_unfitted_model_rejected() {
        let forest = ForestClassifier::new(5);
        let result = ModelArtifact::new("credit", vec![], forest);
        assert!(matches!(result, Err(ExplainError::ModelError(_))));
    }

    #[test]
    fn test_validate_features_mismatch() {
        let artifact = ModelArtifact::new(
            "credit",
            vec!["a".to_string(), "b".to_string()],
            fitted_forest(),
        )
        .unwrap();

        let narrow =
            FeatureTable::from_parts(vec!["a".to_string()], Array2::zeros((2, 1))).unwrap();
        assert!(matches!(
            artifact.validate_features(&narrow),
            Err(ExplainError::ShapeError { .. })
        ));

        let renamed = FeatureTable::from_parts(
            vec!["a".to_string(), "z".to_string()],
            Array2::zeros((2, 2)),
        )
        .unwrap();
        assert!(matches!(
            artifact.validate_features(&renamed),
            Err(ExplainError::ValidationError(_))
        ));
    }
}
