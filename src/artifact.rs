//! Model artifact persistence
//!
//! A trained model ships as one JSON file holding the fitted classifier, the
//! label codec and the feature spec. Keeping all three together means a
//! loaded artifact can reproduce the exact training-time view of new data.

use crate::error::{GradecastError, Result};
use crate::schema::FeatureSpec;
use crate::training::{LabelCodec, TrainedClassifier};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

/// Bumped whenever the serialized layout changes incompatibly
pub const ARTIFACT_SCHEMA_VERSION: u32 = 1;

/// Everything needed to score new data with a trained model
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelArtifact {
    pub schema_version: u32,
    pub created_at: DateTime<Utc>,
    pub classifier: TrainedClassifier,
    pub labels: LabelCodec,
    pub features: FeatureSpec,
}

impl ModelArtifact {
    pub fn new(classifier: TrainedClassifier, labels: LabelCodec, features: FeatureSpec) -> Self {
        Self {
            schema_version: ARTIFACT_SCHEMA_VERSION,
            created_at: Utc::now(),
            classifier,
            labels,
            features,
        }
    }

    /// Write the artifact to `path` atomically.
    ///
    /// The JSON lands in a sibling temp file first and is renamed into
    /// place, so a crash mid-write never leaves a truncated artifact behind.
    pub fn store(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }

        let json = serde_json::to_string_pretty(self)?;

        let tmp_path = path.with_extension(format!("tmp.{}", std::process::id()));
        fs::write(&tmp_path, json)?;
        fs::rename(&tmp_path, path)?;
        Ok(())
    }

    /// Load an artifact, distinguishing a missing file from a damaged one
    pub fn load(path: &Path) -> Result<Self> {
        let json = fs::read_to_string(path).map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                GradecastError::InputNotFound(path.to_path_buf())
            } else {
                GradecastError::Io(e)
            }
        })?;

        let value: serde_json::Value = serde_json::from_str(&json)
            .map_err(|e| GradecastError::ArtifactCorrupt(format!("not valid JSON: {}", e)))?;

        let version = value
            .get("schema_version")
            .and_then(|v| v.as_u64())
            .ok_or_else(|| {
                GradecastError::ArtifactCorrupt("missing schema_version field".to_string())
            })?;
        if version != ARTIFACT_SCHEMA_VERSION as u64 {
            return Err(GradecastError::ArtifactCorrupt(format!(
                "schema version {} not supported (expected {})",
                version, ARTIFACT_SCHEMA_VERSION
            )));
        }

        serde_json::from_value(value).map_err(|e| {
            GradecastError::ArtifactCorrupt(format!("artifact does not match schema: {}", e))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::grading::GradeLabel;
    use crate::training::DecisionTree;
    use ndarray::array;

    fn fitted_artifact() -> ModelArtifact {
        let x = array![[100.0, 0.0], [250.0, 0.0], [400.0, 1.0], [420.0, 1.0]];
        let y = array![0.0, 0.0, 1.0, 1.0];
        let mut tree = DecisionTree::new();
        tree.fit(&x, &y).unwrap();

        ModelArtifact::new(
            TrainedClassifier::DecisionTree(tree),
            LabelCodec::fit(&[GradeLabel::A, GradeLabel::Fail]),
            FeatureSpec::new(vec!["Math".to_string(), "Science".to_string()], false),
        )
    }

    #[test]
    fn test_store_load_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("models").join("grade_model.json");

        let artifact = fitted_artifact();
        artifact.store(&path).unwrap();
        let loaded = ModelArtifact::load(&path).unwrap();

        assert_eq!(loaded.schema_version, ARTIFACT_SCHEMA_VERSION);
        assert_eq!(loaded.labels, artifact.labels);
        assert_eq!(loaded.features.columns(), artifact.features.columns());

        let probe = array![[120.0, 0.0], [410.0, 1.0]];
        assert_eq!(
            loaded.classifier.predict(&probe).unwrap().to_vec(),
            artifact.classifier.predict(&probe).unwrap().to_vec()
        );
    }

    #[test]
    fn test_no_temp_file_left_behind() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("model.json");
        fitted_artifact().store(&path).unwrap();

        let entries: Vec<_> = std::fs::read_dir(dir.path())
            .unwrap()
            .map(|e| e.unwrap().file_name())
            .collect();
        assert_eq!(entries, vec![std::ffi::OsString::from("model.json")]);
    }

    #[test]
    fn test_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let err = ModelArtifact::load(&dir.path().join("absent.json")).unwrap_err();
        assert!(matches!(err, GradecastError::InputNotFound(_)));
    }

    #[test]
    fn test_truncated_json() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("model.json");
        std::fs::write(&path, "{\"schema_version\": 1, \"classi").unwrap();

        let err = ModelArtifact::load(&path).unwrap_err();
        assert!(matches!(err, GradecastError::ArtifactCorrupt(_)));
    }

    #[test]
    fn test_unsupported_schema_version() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("model.json");

        let artifact = fitted_artifact();
        let mut value = serde_json::to_value(&artifact).unwrap();
        value["schema_version"] = serde_json::json!(99);
        std::fs::write(&path, serde_json::to_string(&value).unwrap()).unwrap();

        let err = ModelArtifact::load(&path).unwrap_err();
        match err {
            GradecastError::ArtifactCorrupt(msg) => assert!(msg.contains("99")),
            other => panic!("unexpected error: {}", other),
        }
    }

    #[test]
    fn test_missing_version_field() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("model.json");
        std::fs::write(&path, "{\"labels\": {\"labels\": []}}").unwrap();

        let err = ModelArtifact::load(&path).unwrap_err();
        assert!(matches!(err, GradecastError::ArtifactCorrupt(_)));
    }
}
