//! Shared data structures for the gesture recognition pipeline
//!
//! This module defines the core types that flow between pipeline stages:
//! - Stage 1: KeypointVector / DetectionResult (landmark extractor output)
//! - Stage 2: ClassificationResult (static and dynamic classifier output)
//! - Stage 3: FramePrediction + PredictionDebug (orchestrator output)

mod landmarks;
mod classification;

pub use landmarks::*;
pub use classification::*;
