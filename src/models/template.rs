//! Nearest-template classifier.
//!
//! Each label is represented by the mean of its training inputs. A query is
//! scored by mean squared distance to every template, and distances are turned
//! into class probabilities with a softmax over `-distance / TEMPERATURE`.

use super::{
    resample, KeypointModel, LabelTemplate, ModelArtifact, ModelError, ModelKind, SequenceModel,
};
use crate::types::{ClassificationResult, KeypointVector, KEYPOINT_LEN};

/// Softmax temperature on mean squared distance (normalized coordinates).
pub const TEMPERATURE: f64 = 0.01;

/// Validated, immutable template model.
#[derive(Debug, Clone)]
pub struct TemplateModel {
    kind: ModelKind,
    input_len: usize,
    templates: Vec<LabelTemplate>,
}

impl TemplateModel {
    /// Build from an artifact, checking consistency and the expected kind.
    pub fn from_artifact(artifact: ModelArtifact, expected: ModelKind) -> Result<Self, ModelError> {
        artifact.validate()?;
        if artifact.kind != expected {
            return Err(ModelError::Invalid(format!(
                "expected a {expected} model, artifact is {}",
                artifact.kind
            )));
        }
        if expected == ModelKind::Static && artifact.input_len != KEYPOINT_LEN {
            return Err(ModelError::Invalid(format!(
                "static model input_len must be {KEYPOINT_LEN}, got {}",
                artifact.input_len
            )));
        }
        if expected == ModelKind::Dynamic && artifact.input_len % KEYPOINT_LEN != 0 {
            return Err(ModelError::Invalid(format!(
                "dynamic model input_len {} is not a multiple of {KEYPOINT_LEN}",
                artifact.input_len
            )));
        }
        Ok(Self {
            kind: artifact.kind,
            input_len: artifact.input_len,
            templates: artifact.templates,
        })
    }

    pub const fn kind(&self) -> ModelKind {
        self.kind
    }

    pub const fn input_len(&self) -> usize {
        self.input_len
    }

    /// Number of frames a dynamic model compares.
    pub const fn sequence_frames(&self) -> usize {
        self.input_len / KEYPOINT_LEN
    }

    pub fn labels(&self) -> Vec<&str> {
        self.templates.iter().map(|t| t.label.as_str()).collect()
    }

    /// Score a flat input vector against every template.
    pub fn predict_vector(&self, input: &[f64]) -> Result<ClassificationResult, ModelError> {
        if input.len() != self.input_len {
            return Err(ModelError::DimensionMismatch {
                expected: self.input_len,
                actual: input.len(),
            });
        }
        if self.templates.is_empty() {
            return Err(ModelError::Empty);
        }

        let logits: Vec<f64> = self
            .templates
            .iter()
            .map(|t| -mean_squared_distance(input, &t.mean) / TEMPERATURE)
            .collect();

        // Stable softmax: subtract the max logit before exponentiating
        let max = logits.iter().copied().fold(f64::NEG_INFINITY, f64::max);
        let exps: Vec<f64> = logits.iter().map(|l| (l - max).exp()).collect();
        let total: f64 = exps.iter().sum();

        let (best, best_exp) = exps
            .iter()
            .enumerate()
            .fold((0, f64::NEG_INFINITY), |acc, (i, &e)| if e > acc.1 { (i, e) } else { acc });

        if !total.is_finite() || total <= 0.0 {
            return Err(ModelError::Invalid("non-finite class scores".to_string()));
        }

        Ok(ClassificationResult::new(
            self.templates[best].label.clone(),
            best_exp / total,
        ))
    }
}

fn mean_squared_distance(a: &[f64], b: &[f64]) -> f64 {
    let sum: f64 = a.iter().zip(b).map(|(x, y)| (x - y) * (x - y)).sum();
    sum / a.len().max(1) as f64
}

impl KeypointModel for TemplateModel {
    fn predict(&self, keypoints: &KeypointVector) -> Result<ClassificationResult, ModelError> {
        self.predict_vector(keypoints.as_slice())
    }

    fn describe(&self) -> String {
        format!("template/{} ({} labels)", self.kind, self.templates.len())
    }
}

impl SequenceModel for TemplateModel {
    fn predict_sequence(
        &self,
        sequence: &[KeypointVector],
    ) -> Result<ClassificationResult, ModelError> {
        if sequence.is_empty() {
            return Err(ModelError::EmptySequence);
        }
        let input = resample(sequence, self.sequence_frames());
        self.predict_vector(&input)
    }

    fn describe(&self) -> String {
        format!(
            "template/{} ({} labels, {} frames)",
            self.kind,
            self.templates.len(),
            self.sequence_frames()
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn static_model() -> TemplateModel {
        let artifact = ModelArtifact::new(
            ModelKind::Static,
            KEYPOINT_LEN,
            vec![
                LabelTemplate::new("open", vec![0.8; KEYPOINT_LEN], 5),
                LabelTemplate::new("fist", vec![0.2; KEYPOINT_LEN], 5),
            ],
        );
        TemplateModel::from_artifact(artifact, ModelKind::Static).unwrap()
    }

    #[test]
    fn test_nearest_template_wins() {
        let model = static_model();
        let r = model
            .predict(&KeypointVector::from_array([0.75; KEYPOINT_LEN]))
            .unwrap();
        assert_eq!(r.label, "open");
        assert!(r.confidence > 0.5 && r.confidence <= 1.0);

        let r = model
            .predict(&KeypointVector::from_array([0.1; KEYPOINT_LEN]))
            .unwrap();
        assert_eq!(r.label, "fist");
    }

    #[test]
    fn test_equidistant_input_splits_probability() {
        let r = static_model()
            .predict(&KeypointVector::from_array([0.5; KEYPOINT_LEN]))
            .unwrap();
        assert!((r.confidence - 0.5).abs() < 1e-9);
    }

    #[test]
    fn test_dimension_mismatch_is_an_error() {
        let err = static_model().predict_vector(&[0.5; 10]).unwrap_err();
        assert!(matches!(
            err,
            ModelError::DimensionMismatch { expected: 63, actual: 10 }
        ));
    }

    #[test]
    fn test_kind_mismatch_rejected() {
        let artifact = ModelArtifact::new(
            ModelKind::Static,
            KEYPOINT_LEN,
            vec![LabelTemplate::new("x", vec![0.0; KEYPOINT_LEN], 1)],
        );
        assert!(TemplateModel::from_artifact(artifact, ModelKind::Dynamic).is_err());
    }

    #[test]
    fn test_sequence_prediction_resamples() {
        let frames = 4;
        let mut rising = Vec::new();
        for i in 0..frames {
            rising.extend(std::iter::repeat(i as f64 / 3.0).take(KEYPOINT_LEN));
        }
        let artifact = ModelArtifact::new(
            ModelKind::Dynamic,
            KEYPOINT_LEN * frames,
            vec![
                LabelTemplate::new("rise", rising, 3),
                LabelTemplate::new("still", vec![0.5; KEYPOINT_LEN * frames], 3),
            ],
        );
        let model = TemplateModel::from_artifact(artifact, ModelKind::Dynamic).unwrap();
        assert_eq!(model.sequence_frames(), 4);

        // 13 frames rising 0 -> 1 resample onto the 4-frame template
        let seq: Vec<_> = (0..13)
            .map(|i| KeypointVector::from_array([i as f64 / 12.0; KEYPOINT_LEN]))
            .collect();
        let r = model.predict_sequence(&seq).unwrap();
        assert_eq!(r.label, "rise");

        assert!(matches!(
            model.predict_sequence(&[]),
            Err(ModelError::EmptySequence)
        ));
    }
}
