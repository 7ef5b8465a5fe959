//! Classification outputs: ClassificationResult, FramePrediction, debug info

use serde::{Deserialize, Serialize};

/// Sentinel label reported when no hand was found in the frame.
pub const NO_HAND_LABEL: &str = "No hand detected";

/// Label reported when no rule or model matched with any certainty.
pub const UNKNOWN_LABEL: &str = "unknown";

/// A sign label with a confidence in [0, 1].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClassificationResult {
    pub label: String,
    pub confidence: f64,
}

impl ClassificationResult {
    pub fn new(label: impl Into<String>, confidence: f64) -> Self {
        Self {
            label: label.into(),
            confidence: confidence.clamp(0.0, 1.0),
        }
    }

    /// `("No hand detected", 0.0)`
    pub fn no_hand() -> Self {
        Self::new(NO_HAND_LABEL, 0.0)
    }

    pub fn is_no_hand(&self) -> bool {
        self.label == NO_HAND_LABEL && self.confidence == 0.0
    }
}

/// Which stage produced a frame's final answer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResultSource {
    /// No hand in frame, short-circuited
    NoHand,
    /// Trained static model
    StaticModel,
    /// Static threshold rules
    StaticRules,
    /// Trained dynamic (sequence) model
    DynamicModel,
    /// Dynamic length-banded rules
    DynamicRules,
}

impl std::fmt::Display for ResultSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ResultSource::NoHand => write!(f, "NoHand"),
            ResultSource::StaticModel => write!(f, "StaticModel"),
            ResultSource::StaticRules => write!(f, "StaticRules"),
            ResultSource::DynamicModel => write!(f, "DynamicModel"),
            ResultSource::DynamicRules => write!(f, "DynamicRules"),
        }
    }
}

/// Diagnostic details attached to a frame prediction.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PredictionDebug {
    /// Stage that produced the returned label
    pub source: ResultSource,
    /// Frames in the session buffer after this frame
    pub buffer_len: usize,
    /// Seconds between oldest and newest buffered frame
    pub buffer_span_secs: f64,
    /// Dynamic result that was computed but not accepted (confidence too low)
    pub rejected_dynamic: Option<ClassificationResult>,
    /// Shape features for this frame, if a hand was present
    pub features: Option<crate::features::FeatureSet>,
}

/// Full per-frame output of the orchestrator.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FramePrediction {
    pub label: String,
    pub confidence: f64,
    pub hand_detected: bool,
    pub debug: PredictionDebug,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_no_hand_sentinel() {
        let r = ClassificationResult::no_hand();
        assert_eq!(r.label, NO_HAND_LABEL);
        assert_eq!(r.confidence, 0.0);
        assert!(r.is_no_hand());
    }

    #[test]
    fn test_confidence_is_clamped() {
        assert_eq!(ClassificationResult::new("hello", 1.7).confidence, 1.0);
        assert_eq!(ClassificationResult::new("hello", -0.2).confidence, 0.0);
    }

    #[test]
    fn test_result_source_serializes_snake_case() {
        let json = serde_json::to_string(&ResultSource::DynamicRules).unwrap();
        assert_eq!(json, "\"dynamic_rules\"");
    }
}
