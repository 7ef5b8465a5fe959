//! Trained Model Artifacts
//!
//! Static (single pose) and dynamic (gesture sequence) classifiers may each be
//! backed by a trained artifact. When an artifact is absent the pipeline uses
//! deterministic rules for the whole process lifetime.
//!
//! ## Architecture
//! - `artifact`: JSON artifact format with atomic save/load
//! - `template`: nearest-template inference shared by both model kinds
//! - `sequence`: fixed-length resampling of keypoint sequences
//! - `slot`: `Classifier<M>` variant held in an `ArcSwap` for atomic retrain swaps
//!
//! Inference is behind the [`KeypointModel`] and [`SequenceModel`] traits so a
//! different model family can replace the template model without touching
//! the classifiers.

pub mod artifact;
pub mod sequence;
pub mod slot;
pub mod template;

use std::path::PathBuf;
use std::sync::Arc;

use thiserror::Error;
use tracing::{info, warn};

use crate::types::{ClassificationResult, KeypointVector};

pub use artifact::{load_from_disk, save_to_disk, LabelTemplate, ModelArtifact, ModelKind};
pub use sequence::resample;
pub use slot::{Classifier, ModelSlot};
pub use template::TemplateModel;

// ============================================================================
// Error Types
// ============================================================================

#[derive(Error, Debug)]
pub enum ModelError {
    #[error("Model I/O error ({path}): {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Model parse error ({path}): {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("Model serialization error: {0}")]
    Serialize(#[from] serde_json::Error),

    #[error("Invalid model artifact: {0}")]
    Invalid(String),

    #[error("Input dimension mismatch: model expects {expected} values, got {actual}")]
    DimensionMismatch { expected: usize, actual: usize },

    #[error("Model has no label templates")]
    Empty,

    #[error("Cannot run sequence inference on an empty sequence")]
    EmptySequence,
}

// ============================================================================
// Inference Traits
// ============================================================================

/// Single-frame model over a raw keypoint vector.
pub trait KeypointModel: Send + Sync {
    fn predict(&self, keypoints: &KeypointVector) -> Result<ClassificationResult, ModelError>;

    /// Short human-readable description for status endpoints and logs.
    fn describe(&self) -> String;
}

/// Multi-frame model over an ordered keypoint sequence (oldest first).
pub trait SequenceModel: Send + Sync {
    fn predict_sequence(
        &self,
        sequence: &[KeypointVector],
    ) -> Result<ClassificationResult, ModelError>;

    fn describe(&self) -> String;
}

// ============================================================================
// Startup Loading
// ============================================================================

/// Load a template model artifact for startup.
///
/// Absent or unreadable artifacts are logged once and return `None`; the
/// caller then runs rule-based for the rest of the process lifetime.
pub fn load_template(path: &std::path::Path, kind: ModelKind) -> Option<Arc<TemplateModel>> {
    if !path.exists() {
        info!(path = %path.display(), kind = %kind, "No trained model found, using rule-based classification");
        return None;
    }

    match load_from_disk(path).and_then(|artifact| TemplateModel::from_artifact(artifact, kind)) {
        Ok(model) => {
            info!(
                path = %path.display(),
                kind = %kind,
                labels = model.labels().len(),
                "Loaded trained model"
            );
            Some(Arc::new(model))
        }
        Err(e) => {
            warn!(
                path = %path.display(),
                kind = %kind,
                error = %e,
                "Failed to load trained model, using rule-based classification"
            );
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_load_template_missing_file_is_none() {
        let dir = tempfile::tempdir().expect("tmpdir");
        let path = dir.path().join("absent.json");
        assert!(load_template(&path, ModelKind::Static).is_none());
    }

    #[test]
    fn test_load_template_garbage_file_is_none() {
        let dir = tempfile::tempdir().expect("tmpdir");
        let path = dir.path().join("garbage.json");
        std::fs::write(&path, b"not json at all").unwrap();
        assert!(load_template(&path, ModelKind::Static).is_none());
    }

    #[test]
    fn test_load_template_wrong_kind_is_none() {
        let dir = tempfile::tempdir().expect("tmpdir");
        let path = dir.path().join("dynamic.json");
        let artifact = ModelArtifact::new(
            ModelKind::Dynamic,
            63 * 4,
            vec![LabelTemplate::new("wave", vec![0.1; 63 * 4], 3)],
        );
        save_to_disk(&artifact, &path).unwrap();

        assert!(load_template(&path, ModelKind::Static).is_none());
        assert!(load_template(&path, ModelKind::Dynamic).is_some());
    }
}
