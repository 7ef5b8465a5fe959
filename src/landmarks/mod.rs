//! Landmark Extraction
//!
//! Turns a decoded frame into a [`DetectionResult`]. The hand pose backend is
//! any [`HandLandmarker`]; the shipped one is [`SidecarLandmarker`]. Backend
//! failures never escape [`LandmarkExtractor::extract`]: they are logged and
//! the frame is reported as having no hand.

mod frame;
mod sidecar;

pub use frame::{ColorOrder, Frame};
pub use sidecar::SidecarLandmarker;

use std::sync::Arc;

use thiserror::Error;

use crate::types::{DetectionResult, KeypointVector, Landmark};

// ============================================================================
// Error Types
// ============================================================================

#[derive(Error, Debug)]
pub enum LandmarkError {
    #[error("Invalid frame: {0}")]
    InvalidFrame(String),

    #[error("Failed to start landmark backend: {0}")]
    Spawn(String),

    #[error("Landmark backend I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Landmark backend protocol error: {0}")]
    Protocol(String),

    #[error("Landmark backend reported: {0}")]
    Backend(String),
}

// ============================================================================
// Backend Trait
// ============================================================================

/// A hand pose estimator. Returns every hand found in the RGB frame, most
/// prominent first, each as exactly 21 landmarks.
pub trait HandLandmarker: Send + Sync {
    fn detect(&self, frame: &Frame) -> Result<Vec<Vec<Landmark>>, LandmarkError>;

    fn describe(&self) -> String;
}

// ============================================================================
// Extractor
// ============================================================================

pub struct LandmarkExtractor {
    backend: Arc<dyn HandLandmarker>,
}

impl LandmarkExtractor {
    pub fn new(backend: Arc<dyn HandLandmarker>) -> Self {
        Self { backend }
    }

    /// Extract the first hand's keypoints. No hand, or a failing backend,
    /// yields 63 zeros with `hand_detected = false`.
    pub fn extract(&self, frame: &Frame) -> DetectionResult {
        let rgb = frame.to_rgb();
        match self.backend.detect(&rgb) {
            Ok(hands) => hands
                .first()
                .and_then(|hand| KeypointVector::from_landmarks(hand))
                .map_or_else(DetectionResult::no_hand, DetectionResult::detected),
            Err(e) => {
                tracing::warn!(
                    error = %e,
                    backend = %self.backend.describe(),
                    "Landmark extraction failed, treating frame as no hand"
                );
                DetectionResult::no_hand()
            }
        }
    }

    pub fn describe(&self) -> String {
        self.backend.describe()
    }
}

impl std::fmt::Debug for LandmarkExtractor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LandmarkExtractor")
            .field("backend", &self.backend.describe())
            .finish()
    }
}
