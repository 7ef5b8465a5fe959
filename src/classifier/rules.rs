//! Deterministic rule-based fallbacks.
//!
//! Comparison operators are strict on both sides: a distance of exactly
//! `EXTENDED` is not extended and a distance of exactly `CURLED` is not
//! curled.

use crate::features::FeatureSet;
use crate::types::{ClassificationResult, UNKNOWN_LABEL};

/// Fingertip-to-wrist distance above which a finger counts as extended.
pub const EXTENDED: f64 = 0.2;

/// Fingertip-to-wrist distance below which a finger counts as curled.
pub const CURLED: f64 = 0.15;

fn ext(d: f64) -> bool {
    d > EXTENDED
}

fn curl(d: f64) -> bool {
    d < CURLED
}

/// Static pose rules, first match wins:
///
/// 1. all five extended → `hello` (0.70)
/// 2. index and middle extended, others curled → `yes` (0.65)
/// 3. thumb extended, others curled → `good` (0.70)
/// 4. all five curled → `no` (0.60)
/// 5. otherwise `unknown` (0.30)
pub fn classify_static_rules(features: Option<&FeatureSet>) -> ClassificationResult {
    let Some(f) = features else {
        return ClassificationResult::new(UNKNOWN_LABEL, 0.30);
    };
    let [thumb, index, middle, ring, pinky] = f.distances();

    if [thumb, index, middle, ring, pinky].into_iter().all(ext) {
        ClassificationResult::new("hello", 0.70)
    } else if ext(index) && ext(middle) && curl(thumb) && curl(ring) && curl(pinky) {
        ClassificationResult::new("yes", 0.65)
    } else if ext(thumb) && curl(index) && curl(middle) && curl(ring) && curl(pinky) {
        ClassificationResult::new("good", 0.70)
    } else if [thumb, index, middle, ring, pinky].into_iter().all(curl) {
        ClassificationResult::new("no", 0.60)
    } else {
        ClassificationResult::new(UNKNOWN_LABEL, 0.30)
    }
}

/// Length-banded dynamic heuristic over the number of buffered frames.
pub fn classify_dynamic_rules(sequence_len: usize) -> ClassificationResult {
    if sequence_len > 25 {
        ClassificationResult::new("thank you", 0.70)
    } else if sequence_len > 20 {
        ClassificationResult::new("hello", 0.60)
    } else if sequence_len > 15 {
        ClassificationResult::new("please", 0.60)
    } else {
        ClassificationResult::new(UNKNOWN_LABEL, 0.40)
    }
}
