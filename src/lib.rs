//! SignBridge: sign language gesture recognition
//!
//! Turns camera frames into sign labels. Each frame goes through hand
//! landmark extraction, then either a dynamic (motion) classifier over the
//! session's recent frames or a static (single pose) classifier.
//!
//! ## Architecture
//!
//! - **Landmarks**: hand pose backend behind the `HandLandmarker` trait
//! - **Features**: fingertip distances and inter-finger angles
//! - **Classifier**: trained template models with rule-based fallback
//! - **Temporal**: per-session bounded frame buffers and cooldown gates
//! - **Pipeline**: the per-frame orchestrator (`Recognizer`)
//! - **Training**: sample recording and template fitting
//! - **API**: axum HTTP surface

pub mod api;
pub mod classifier;
pub mod config;
pub mod features;
pub mod landmarks;
pub mod models;
pub mod pipeline;
pub mod temporal;
pub mod training;
pub mod types;

// Re-export configuration
pub use config::AppConfig;

// Re-export commonly used types
pub use types::{
    ClassificationResult, DetectionResult, FramePrediction, KeypointVector, PredictionDebug,
    ResultSource,
};

pub use features::FeatureSet;
pub use landmarks::{Frame, HandLandmarker, LandmarkExtractor, SidecarLandmarker};
pub use pipeline::Recognizer;
