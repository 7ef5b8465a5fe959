//! Static pose classifier: single keypoint vector to label.

use std::sync::Arc;

use super::rules::classify_static_rules;
use super::Classified;
use crate::features::FeatureSet;
use crate::models::{Classifier, KeypointModel, ModelSlot};
use crate::types::{ClassificationResult, DetectionResult, ResultSource};

pub struct StaticClassifier {
    slot: ModelSlot<dyn KeypointModel>,
}

impl StaticClassifier {
    pub fn new(model: Option<Arc<dyn KeypointModel>>) -> Self {
        Self {
            slot: ModelSlot::from_model(model),
        }
    }

    pub fn rule_based() -> Self {
        Self::new(None)
    }

    /// Classify one frame. No hand short-circuits to the no-hand sentinel.
    /// Otherwise a loaded model is tried first; if it errors the failure is
    /// logged and the rules answer for this call.
    pub fn classify(&self, detection: &DetectionResult, features: Option<&FeatureSet>) -> Classified {
        if !detection.hand_detected {
            return Classified::new(ClassificationResult::no_hand(), ResultSource::NoHand);
        }
        if let Classifier::Trained(model) = self.slot.current().as_ref() {
            match model.predict(&detection.keypoints) {
                Ok(result) => return Classified::new(result, ResultSource::StaticModel),
                Err(e) => {
                    tracing::warn!(error = %e, model = %model.describe(), "Static model inference failed, using rules");
                }
            }
        }
        Classified::new(classify_static_rules(features), ResultSource::StaticRules)
    }

    /// Swap in a newly trained model. In-flight calls finish on the old one.
    pub fn install(&self, model: Arc<dyn KeypointModel>) {
        tracing::info!(model = %model.describe(), "Installing static model");
        self.slot.install(model);
    }

    pub fn is_trained(&self) -> bool {
        self.slot.is_trained()
    }

    pub fn describe(&self) -> String {
        match self.slot.current().as_ref() {
            Classifier::Trained(m) => m.describe(),
            Classifier::RuleBased => "static rules".to_string(),
        }
    }
}

impl std::fmt::Debug for StaticClassifier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StaticClassifier")
            .field("model", &self.describe())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::ModelError;
    use crate::types::{KeypointVector, NO_HAND_LABEL};

    fn hand() -> DetectionResult {
        DetectionResult::detected(KeypointVector::from_array([0.5; 63]))
    }

    struct Fixed(&'static str);

    impl KeypointModel for Fixed {
        fn predict(&self, _: &KeypointVector) -> Result<ClassificationResult, ModelError> {
            Ok(ClassificationResult::new(self.0, 0.9))
        }
        fn describe(&self) -> String {
            format!("fixed:{}", self.0)
        }
    }

    struct Broken;

    impl KeypointModel for Broken {
        fn predict(&self, _: &KeypointVector) -> Result<ClassificationResult, ModelError> {
            Err(ModelError::Invalid("boom".into()))
        }
        fn describe(&self) -> String {
            "broken".into()
        }
    }

    fn curled_fist() -> FeatureSet {
        FeatureSet {
            thumb_dist: 0.1,
            index_dist: 0.1,
            middle_dist: 0.1,
            ring_dist: 0.1,
            pinky_dist: 0.1,
            thumb_index_angle: 0.0,
            index_middle_angle: 0.0,
            middle_ring_angle: 0.0,
            ring_pinky_angle: 0.0,
        }
    }

    #[test]
    fn test_rule_based_when_no_model() {
        let c = StaticClassifier::rule_based();
        let out = c.classify(&hand(), Some(&curled_fist()));
        assert_eq!(out.result.label, "no");
        assert_eq!(out.source, ResultSource::StaticRules);
        assert!(!c.is_trained());
    }

    #[test]
    fn test_trained_model_wins() {
        let c = StaticClassifier::new(Some(Arc::new(Fixed("A"))));
        let out = c.classify(&hand(), Some(&curled_fist()));
        assert_eq!(out.result.label, "A");
        assert_eq!(out.source, ResultSource::StaticModel);
    }

    #[test]
    fn test_inference_failure_falls_back_per_call() {
        let c = StaticClassifier::new(Some(Arc::new(Broken)));
        let out = c.classify(&hand(), Some(&curled_fist()));
        assert_eq!(out.result.label, "no");
        assert_eq!(out.source, ResultSource::StaticRules);
        // Model stays installed
        assert!(c.is_trained());
        assert_eq!(c.describe(), "broken");
    }

    #[test]
    fn test_no_hand_short_circuits_before_model() {
        let c = StaticClassifier::new(Some(Arc::new(Fixed("A"))));
        let out = c.classify(&DetectionResult::no_hand(), Some(&curled_fist()));
        assert_eq!(out.result.label, NO_HAND_LABEL);
        assert_eq!(out.result.confidence, 0.0);
        assert_eq!(out.source, ResultSource::NoHand);

        let rules = StaticClassifier::rule_based();
        assert!(rules.classify(&DetectionResult::no_hand(), None).result.is_no_hand());
    }

    #[test]
    fn test_install_replaces_rules() {
        let c = StaticClassifier::rule_based();
        c.install(Arc::new(Fixed("B")));
        let out = c.classify(&hand(), None);
        assert_eq!(out.result.label, "B");
    }
}
