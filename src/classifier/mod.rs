//! Sign classification
//!
//! Both classifiers hold a [`ModelSlot`](crate::models::ModelSlot): a trained
//! model when one was loaded or trained, otherwise the deterministic rules in
//! [`rules`]. Inference errors fall back to the rules for that call only.

pub mod dynamic;
pub mod rules;
pub mod static_classifier;

pub use dynamic::{DynamicClassifier, GateConfig, GateDecision, GateState};
pub use static_classifier::StaticClassifier;

use crate::types::{ClassificationResult, ResultSource};

/// A classification plus the path that produced it.
#[derive(Debug, Clone, PartialEq)]
pub struct Classified {
    pub result: ClassificationResult,
    pub source: ResultSource,
}

impl Classified {
    pub const fn new(result: ClassificationResult, source: ResultSource) -> Self {
        Self { result, source }
    }
}
