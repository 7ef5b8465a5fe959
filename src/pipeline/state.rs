//! Recognizer status and counters
//!
//! Shared between the frame path (writes counters) and the status endpoint
//! (reads snapshots). Counters are relaxed atomics; a snapshot is a
//! best-effort view, not a consistent cut.

use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicU64, AtomicU8, Ordering};

// ============================================================================
// System Status
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SystemStatus {
    /// Loading artifacts
    Initializing,
    /// Serving predictions
    Ready,
    /// A training run is in progress (predictions continue on the old models)
    Training,
}

impl SystemStatus {
    const fn to_u8(self) -> u8 {
        match self {
            Self::Initializing => 0,
            Self::Ready => 1,
            Self::Training => 2,
        }
    }

    const fn from_u8(v: u8) -> Self {
        match v {
            1 => Self::Ready,
            2 => Self::Training,
            _ => Self::Initializing,
        }
    }
}

impl std::fmt::Display for SystemStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SystemStatus::Initializing => write!(f, "Initializing"),
            SystemStatus::Ready => write!(f, "Ready"),
            SystemStatus::Training => write!(f, "Training"),
        }
    }
}

/// Atomically readable [`SystemStatus`].
#[derive(Debug)]
pub struct StatusCell(AtomicU8);

impl StatusCell {
    pub const fn new(status: SystemStatus) -> Self {
        Self(AtomicU8::new(status.to_u8()))
    }

    pub fn get(&self) -> SystemStatus {
        SystemStatus::from_u8(self.0.load(Ordering::Acquire))
    }

    pub fn set(&self, status: SystemStatus) {
        self.0.store(status.to_u8(), Ordering::Release);
    }
}

// ============================================================================
// Counters
// ============================================================================

#[derive(Debug, Default)]
pub struct RecognizerStats {
    frames_processed: AtomicU64,
    hands_detected: AtomicU64,
    dynamic_accepted: AtomicU64,
    dynamic_rejected: AtomicU64,
    static_predictions: AtomicU64,
    training_runs: AtomicU64,
    training_failures: AtomicU64,
}

impl RecognizerStats {
    pub fn record_frame(&self, hand_detected: bool) {
        self.frames_processed.fetch_add(1, Ordering::Relaxed);
        if hand_detected {
            self.hands_detected.fetch_add(1, Ordering::Relaxed);
        }
    }

    pub fn record_dynamic(&self, accepted: bool) {
        let counter = if accepted {
            &self.dynamic_accepted
        } else {
            &self.dynamic_rejected
        };
        counter.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_static(&self) {
        self.static_predictions.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_training(&self, success: bool) {
        self.training_runs.fetch_add(1, Ordering::Relaxed);
        if !success {
            self.training_failures.fetch_add(1, Ordering::Relaxed);
        }
    }

    pub fn snapshot(&self) -> PipelineStats {
        PipelineStats {
            frames_processed: self.frames_processed.load(Ordering::Relaxed),
            hands_detected: self.hands_detected.load(Ordering::Relaxed),
            dynamic_accepted: self.dynamic_accepted.load(Ordering::Relaxed),
            dynamic_rejected: self.dynamic_rejected.load(Ordering::Relaxed),
            static_predictions: self.static_predictions.load(Ordering::Relaxed),
            training_runs: self.training_runs.load(Ordering::Relaxed),
            training_failures: self.training_failures.load(Ordering::Relaxed),
        }
    }
}

/// Point-in-time copy of [`RecognizerStats`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PipelineStats {
    pub frames_processed: u64,
    pub hands_detected: u64,
    pub dynamic_accepted: u64,
    pub dynamic_rejected: u64,
    pub static_predictions: u64,
    pub training_runs: u64,
    pub training_failures: u64,
}

impl std::fmt::Display for PipelineStats {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "Pipeline: {} frames ({} with hand), {} dynamic ({} rejected), {} static, {} training runs",
            self.frames_processed,
            self.hands_detected,
            self.dynamic_accepted,
            self.dynamic_rejected,
            self.static_predictions,
            self.training_runs,
        )
    }
}
