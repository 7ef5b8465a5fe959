//! Model artifact format and disk persistence.
//!
//! Artifacts are plain JSON so they can be inspected and diffed:
//! - Static artifacts hold one 63-value mean keypoint vector per label
//! - Dynamic artifacts hold one resampled, flattened sequence per label

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::Path;

use super::ModelError;

/// Current artifact format version.
pub const ARTIFACT_VERSION: u32 = 1;

/// Which classifier an artifact belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ModelKind {
    Static,
    Dynamic,
}

impl std::fmt::Display for ModelKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ModelKind::Static => write!(f, "static"),
            ModelKind::Dynamic => write!(f, "dynamic"),
        }
    }
}

/// Mean input vector for one label.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LabelTemplate {
    pub label: String,
    pub mean: Vec<f64>,
    /// Number of training samples averaged into `mean`.
    pub samples: usize,
}

impl LabelTemplate {
    pub fn new(label: impl Into<String>, mean: Vec<f64>, samples: usize) -> Self {
        Self {
            label: label.into(),
            mean,
            samples,
        }
    }
}

/// Complete trained model as stored on disk.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelArtifact {
    /// Format version for forward compatibility.
    pub version: u32,
    pub kind: ModelKind,
    /// Length of every template vector (63 for static, 63 x frames for dynamic).
    pub input_len: usize,
    pub created_at: DateTime<Utc>,
    pub templates: Vec<LabelTemplate>,
}

impl ModelArtifact {
    pub fn new(kind: ModelKind, input_len: usize, templates: Vec<LabelTemplate>) -> Self {
        Self {
            version: ARTIFACT_VERSION,
            kind,
            input_len,
            created_at: Utc::now(),
            templates,
        }
    }

    /// Check internal consistency: version, non-empty, template lengths.
    pub fn validate(&self) -> Result<(), ModelError> {
        if self.version != ARTIFACT_VERSION {
            return Err(ModelError::Invalid(format!(
                "unsupported artifact version {} (expected {})",
                self.version, ARTIFACT_VERSION
            )));
        }
        if self.input_len == 0 {
            return Err(ModelError::Invalid("input_len must be > 0".to_string()));
        }
        if self.templates.is_empty() {
            return Err(ModelError::Empty);
        }
        for t in &self.templates {
            if t.mean.len() != self.input_len {
                return Err(ModelError::Invalid(format!(
                    "template '{}' has {} values, expected {}",
                    t.label,
                    t.mean.len(),
                    self.input_len
                )));
            }
            if t.mean.iter().any(|v| !v.is_finite()) {
                return Err(ModelError::Invalid(format!(
                    "template '{}' contains NaN or Inf",
                    t.label
                )));
            }
        }
        Ok(())
    }
}

/// Save an artifact to disk atomically (write temp file, then rename).
pub fn save_to_disk(artifact: &ModelArtifact, path: &Path) -> Result<(), ModelError> {
    let json = serde_json::to_vec_pretty(artifact)?;
    let io_err = |source| ModelError::Io {
        path: path.to_path_buf(),
        source,
    };

    let tmp_path = path.with_extension("json.tmp");
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).map_err(io_err)?;
    }
    std::fs::write(&tmp_path, &json).map_err(io_err)?;
    std::fs::rename(&tmp_path, path).map_err(io_err)?;
    Ok(())
}

/// Load an artifact from disk. Does not validate; see [`ModelArtifact::validate`].
pub fn load_from_disk(path: &Path) -> Result<ModelArtifact, ModelError> {
    let data = std::fs::read(path).map_err(|source| ModelError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    serde_json::from_slice(&data).map_err(|source| ModelError::Parse {
        path: path.to_path_buf(),
        source,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_artifact() -> ModelArtifact {
        ModelArtifact::new(
            ModelKind::Static,
            63,
            vec![
                LabelTemplate::new("hello", vec![0.4; 63], 12),
                LabelTemplate::new("no", vec![0.1; 63], 8),
            ],
        )
    }

    #[test]
    fn test_disk_persistence() {
        let dir = tempfile::tempdir().expect("tmpdir");
        let path = dir.path().join("models").join("isl_model.json");

        save_to_disk(&sample_artifact(), &path).expect("save");
        assert!(!path.with_extension("json.tmp").exists());

        let loaded = load_from_disk(&path).expect("load");
        assert_eq!(loaded.version, ARTIFACT_VERSION);
        assert_eq!(loaded.kind, ModelKind::Static);
        assert_eq!(loaded.templates.len(), 2);
        assert_eq!(loaded.templates[0].label, "hello");
        assert!(loaded.validate().is_ok());
    }

    #[test]
    fn test_validate_rejects_length_mismatch() {
        let mut artifact = sample_artifact();
        artifact.templates[1].mean.pop();
        let err = artifact.validate().unwrap_err();
        assert!(err.to_string().contains("'no'"));
    }

    #[test]
    fn test_validate_rejects_empty_and_future_version() {
        let mut artifact = sample_artifact();
        artifact.templates.clear();
        assert!(matches!(artifact.validate(), Err(ModelError::Empty)));

        let mut artifact = sample_artifact();
        artifact.version = 99;
        assert!(matches!(artifact.validate(), Err(ModelError::Invalid(_))));
    }

    #[test]
    fn test_load_missing_file_is_io_error() {
        let dir = tempfile::tempdir().expect("tmpdir");
        let err = load_from_disk(&dir.path().join("nope.json")).unwrap_err();
        assert!(matches!(err, ModelError::Io { .. }));
    }
}
