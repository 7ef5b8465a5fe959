//! Prediction Pipeline
//!
//! ```text
//! frame -> LandmarkExtractor -> DetectionResult
//!            no hand  -> ("No hand detected", 0.0), buffer untouched
//!            hand     -> session buffer append
//!                     -> DynamicClassifier (gated)   accept if conf > 0.5
//!                     -> StaticClassifier            otherwise
//! ```
//!
//! One frame always yields exactly one answer; the pipeline never waits for
//! further frames.

mod recognizer;
mod state;

pub use recognizer::{Recognizer, RecognizerStatus};
pub use state::*;
