//! Prediction orchestrator.

use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, TryLockError};
use std::time::Instant;

use serde::Serialize;

use super::state::{PipelineStats, RecognizerStats, StatusCell, SystemStatus};
use crate::classifier::{DynamicClassifier, StaticClassifier};
use crate::config::AppConfig;
use crate::features::FeatureSet;
use crate::landmarks::{Frame, HandLandmarker, LandmarkExtractor};
use crate::models::{
    load_template, save_to_disk, KeypointModel, ModelKind, SequenceModel, TemplateModel,
};
use crate::temporal::SessionStore;
use crate::training::{build_dynamic_artifact, build_static_artifact, TrainingError};
use crate::types::{ClassificationResult, FramePrediction, PredictionDebug, ResultSource};

/// Snapshot for the status endpoint.
#[derive(Debug, Clone, Serialize)]
pub struct RecognizerStatus {
    pub status: SystemStatus,
    pub landmark_backend: String,
    pub static_model: String,
    pub static_trained: bool,
    pub dynamic_model: String,
    pub dynamic_trained: bool,
    pub active_sessions: usize,
    pub uptime_secs: f64,
    pub stats: PipelineStats,
}

/// Owns the extractor, both classifiers and all session state.
pub struct Recognizer {
    extractor: LandmarkExtractor,
    static_classifier: StaticClassifier,
    dynamic_classifier: DynamicClassifier,
    sessions: Arc<SessionStore>,
    accept_confidence: f64,
    static_path: PathBuf,
    dynamic_path: PathBuf,
    sequence_length: usize,
    min_sequence_length: usize,
    stats: RecognizerStats,
    status: StatusCell,
    training: Mutex<()>,
    epoch: Instant,
}

impl Recognizer {
    /// Build the pipeline and load any trained artifacts.
    ///
    /// Missing or unreadable artifacts leave that classifier rule-based; this
    /// never fails.
    pub fn initialize(config: &AppConfig, landmarker: Arc<dyn HandLandmarker>) -> Self {
        let status = StatusCell::new(SystemStatus::Initializing);

        let static_model = load_template(&config.models.static_path, ModelKind::Static)
            .map(|m| m as Arc<dyn KeypointModel>);
        let dynamic_model = load_template(&config.models.dynamic_path, ModelKind::Dynamic)
            .map(|m| m as Arc<dyn SequenceModel>);

        let recognizer = Self {
            extractor: LandmarkExtractor::new(landmarker),
            static_classifier: StaticClassifier::new(static_model),
            dynamic_classifier: DynamicClassifier::new(config.gate_config(), dynamic_model),
            sessions: Arc::new(SessionStore::new(config.temporal.buffer_capacity)),
            accept_confidence: config.temporal.dynamic_accept_confidence,
            static_path: config.models.static_path.clone(),
            dynamic_path: config.models.dynamic_path.clone(),
            sequence_length: config.models.sequence_length,
            min_sequence_length: config.temporal.min_sequence_length,
            stats: RecognizerStats::default(),
            status,
            training: Mutex::new(()),
            epoch: Instant::now(),
        };

        recognizer.status.set(SystemStatus::Ready);
        tracing::info!(
            landmarks = %recognizer.extractor.describe(),
            static_model = %recognizer.static_classifier.describe(),
            dynamic_model = %recognizer.dynamic_classifier.describe(),
            buffer_capacity = config.temporal.buffer_capacity,
            "Recognizer initialized"
        );
        recognizer
    }

    /// Seconds since this recognizer was created.
    pub fn now(&self) -> f64 {
        self.epoch.elapsed().as_secs_f64()
    }

    pub fn sessions(&self) -> &Arc<SessionStore> {
        &self.sessions
    }

    /// Single-frame static classification. Touches no session state.
    pub fn predict_static(&self, frame: &Frame) -> ClassificationResult {
        let detection = self.extractor.extract(frame);
        self.stats.record_frame(detection.hand_detected);
        if detection.hand_detected {
            self.stats.record_static();
        }
        let features = FeatureSet::from_keypoints(detection.keypoints.as_slice());
        self.static_classifier
            .classify(&detection, features.as_ref())
            .result
    }

    /// Full per-frame path for `session`, timestamped with the recognizer clock.
    pub fn predict_frame(&self, session: &str, frame: &Frame) -> FramePrediction {
        self.predict_frame_at(session, frame, self.now())
    }

    /// Full per-frame path with an explicit timestamp in seconds.
    pub fn predict_frame_at(&self, session: &str, frame: &Frame, now: f64) -> FramePrediction {
        let detection = self.extractor.extract(frame);
        self.stats.record_frame(detection.hand_detected);

        if !detection.hand_detected {
            let (buffer_len, buffer_span_secs) = self
                .sessions
                .snapshot(session)
                .map_or((0, 0.0), |s| (s.buffered_frames, s.buffer_span_secs));
            let result = ClassificationResult::no_hand();
            return FramePrediction {
                label: result.label,
                confidence: result.confidence,
                hand_detected: false,
                debug: PredictionDebug {
                    source: ResultSource::NoHand,
                    buffer_len,
                    buffer_span_secs,
                    rejected_dynamic: None,
                    features: None,
                },
            };
        }

        let features = FeatureSet::from_keypoints(detection.keypoints.as_slice());

        // Append and gate check under one session lock
        let (dynamic, buffer_len, buffer_span_secs) = self.sessions.with_session(session, |s| {
            s.buffer.append(detection.keypoints, now);
            s.frames_seen += 1;
            let dynamic = self.dynamic_classifier.classify(&s.buffer, &mut s.gate, now);
            (dynamic, s.buffer.len(), s.buffer.span())
        });

        let mut rejected_dynamic = None;
        if let Some(dynamic) = dynamic {
            if dynamic.result.confidence > self.accept_confidence {
                self.stats.record_dynamic(true);
                tracing::debug!(
                    session = %session,
                    label = %dynamic.result.label,
                    confidence = dynamic.result.confidence,
                    "Dynamic gesture accepted"
                );
                return FramePrediction {
                    label: dynamic.result.label,
                    confidence: dynamic.result.confidence,
                    hand_detected: true,
                    debug: PredictionDebug {
                        source: dynamic.source,
                        buffer_len,
                        buffer_span_secs,
                        rejected_dynamic: None,
                        features,
                    },
                };
            }
            self.stats.record_dynamic(false);
            rejected_dynamic = Some(dynamic.result);
        }

        self.stats.record_static();
        let fallback = self
            .static_classifier
            .classify(&detection, features.as_ref());
        FramePrediction {
            label: fallback.result.label,
            confidence: fallback.result.confidence,
            hand_detected: true,
            debug: PredictionDebug {
                source: fallback.source,
                buffer_len,
                buffer_span_secs,
                rejected_dynamic,
                features,
            },
        }
    }

    /// Empty one session's buffer. Returns false for an unknown session.
    pub fn clear_history(&self, session: &str) -> bool {
        let cleared = self.sessions.clear(session);
        tracing::debug!(session = %session, cleared, "Cleared gesture history");
        cleared
    }

    pub fn clear_all_history(&self) -> usize {
        self.sessions.clear_all()
    }

    /// Fit, persist and install a static template model. Slow; keep it off
    /// the async runtime. Returns false on failure or when another training
    /// run is in progress.
    pub fn train_static_model(&self, training_data_path: &Path) -> bool {
        self.try_train_static_model(training_data_path).unwrap_or(false)
    }

    /// Fit, persist and install a dynamic template model.
    pub fn train_dynamic_model(&self, training_data_path: &Path) -> bool {
        self.try_train_dynamic_model(training_data_path).unwrap_or(false)
    }

    /// Like [`Self::train_static_model`], but `None` when another training
    /// run already holds the recognizer.
    pub fn try_train_static_model(&self, training_data_path: &Path) -> Option<bool> {
        self.run_training(ModelKind::Static, training_data_path, || {
            let artifact = build_static_artifact(&self.extractor, training_data_path)?;
            save_to_disk(&artifact, &self.static_path)?;
            let model = TemplateModel::from_artifact(artifact, ModelKind::Static)?;
            let labels = model.labels().len();
            self.static_classifier.install(Arc::new(model));
            Ok(labels)
        })
    }

    /// Like [`Self::train_dynamic_model`], but `None` when busy.
    pub fn try_train_dynamic_model(&self, training_data_path: &Path) -> Option<bool> {
        self.run_training(ModelKind::Dynamic, training_data_path, || {
            let artifact = build_dynamic_artifact(
                &self.extractor,
                training_data_path,
                self.min_sequence_length,
                self.sequence_length,
            )?;
            save_to_disk(&artifact, &self.dynamic_path)?;
            let model = TemplateModel::from_artifact(artifact, ModelKind::Dynamic)?;
            let labels = model.labels().len();
            self.dynamic_classifier.install(Arc::new(model));
            Ok(labels)
        })
    }

    fn run_training(
        &self,
        kind: ModelKind,
        dir: &Path,
        train: impl FnOnce() -> Result<usize, TrainingError>,
    ) -> Option<bool> {
        // One training run at a time; predictions keep running meanwhile
        let _guard = match self.training.try_lock() {
            Ok(guard) => guard,
            Err(TryLockError::Poisoned(e)) => e.into_inner(),
            Err(TryLockError::WouldBlock) => {
                tracing::warn!(kind = %kind, "Training already in progress, request refused");
                return None;
            }
        };
        self.status.set(SystemStatus::Training);
        let started = Instant::now();
        tracing::info!(kind = %kind, dir = %dir.display(), "Training started");

        let outcome = train();
        self.status.set(SystemStatus::Ready);

        match outcome {
            Ok(labels) => {
                self.stats.record_training(true);
                tracing::info!(
                    kind = %kind,
                    labels,
                    elapsed_ms = started.elapsed().as_millis() as u64,
                    "Training finished, model installed"
                );
                Some(true)
            }
            Err(e) => {
                self.stats.record_training(false);
                tracing::warn!(kind = %kind, error = %e, "Training failed, keeping current model");
                Some(false)
            }
        }
    }

    pub fn stats(&self) -> PipelineStats {
        self.stats.snapshot()
    }

    pub fn status(&self) -> RecognizerStatus {
        RecognizerStatus {
            status: self.status.get(),
            landmark_backend: self.extractor.describe(),
            static_model: self.static_classifier.describe(),
            static_trained: self.static_classifier.is_trained(),
            dynamic_model: self.dynamic_classifier.describe(),
            dynamic_trained: self.dynamic_classifier.is_trained(),
            active_sessions: self.sessions.len(),
            uptime_secs: self.now(),
            stats: self.stats.snapshot(),
        }
    }
}

impl std::fmt::Debug for Recognizer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Recognizer")
            .field("extractor", &self.extractor)
            .field("static_classifier", &self.static_classifier)
            .field("dynamic_classifier", &self.dynamic_classifier)
            .field("sessions", &self.sessions.len())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::landmarks::{ColorOrder, LandmarkError};
    use crate::types::{Landmark, NO_HAND_LABEL};

    /// Hand present when the first byte is non-zero; every fingertip at
    /// distance `byte / 255` to the right of the wrist.
    struct ByteHand;

    impl HandLandmarker for ByteHand {
        fn detect(&self, frame: &Frame) -> Result<Vec<Vec<Landmark>>, LandmarkError> {
            let b = frame.data()[0];
            if b == 0 {
                return Ok(vec![]);
            }
            let d = f64::from(b) / 255.0;
            let mut hand = vec![[0.5, 0.5, 0.0]; 21];
            for tip in crate::types::FINGERTIPS {
                hand[tip] = [0.5 + d, 0.5, 0.0];
            }
            Ok(vec![hand])
        }
        fn describe(&self) -> String {
            "byte".into()
        }
    }

    fn recognizer() -> Recognizer {
        let dir = tempfile::tempdir().unwrap();
        let mut config = AppConfig::default();
        config.models.static_path = dir.path().join("static.json");
        config.models.dynamic_path = dir.path().join("dynamic.json");
        Recognizer::initialize(&config, Arc::new(ByteHand))
    }

    fn frame(b: u8) -> Frame {
        Frame::new(1, 1, vec![b, 0, 0], ColorOrder::Rgb).unwrap()
    }

    #[test]
    fn test_initialize_without_artifacts_is_rule_based() {
        let r = recognizer();
        let status = r.status();
        assert_eq!(status.status, SystemStatus::Ready);
        assert!(!status.static_trained);
        assert!(!status.dynamic_trained);
    }

    #[test]
    fn test_no_hand_leaves_buffer_untouched() {
        let r = recognizer();
        let out = r.predict_frame_at("s", &frame(0), 0.0);
        assert_eq!(out.label, NO_HAND_LABEL);
        assert_eq!(out.confidence, 0.0);
        assert!(!out.hand_detected);
        assert_eq!(out.debug.source, ResultSource::NoHand);
        assert!(r.sessions().snapshot("s").is_none());
    }

    #[test]
    fn test_static_path_for_open_hand() {
        let r = recognizer();
        // Fingertips 0.3 from the wrist: all extended
        let out = r.predict_static(&frame(77));
        assert_eq!(out.label, "hello");
        assert_eq!(out.confidence, 0.70);
        assert!(r.predict_static(&frame(0)).is_no_hand());
    }

    #[test]
    fn test_short_history_falls_back_to_static() {
        let r = recognizer();
        let out = r.predict_frame_at("s", &frame(77), 0.0);
        assert_eq!(out.label, "hello");
        assert_eq!(out.debug.source, ResultSource::StaticRules);
        assert_eq!(out.debug.buffer_len, 1);
        assert!(out.debug.features.is_some());
    }

    #[test]
    fn test_clear_history() {
        let r = recognizer();
        r.predict_frame_at("s", &frame(77), 0.0);
        assert!(r.clear_history("s"));
        assert_eq!(r.sessions().snapshot("s").unwrap().buffered_frames, 0);
        assert!(!r.clear_history("unknown"));
    }

    #[test]
    fn test_training_without_data_fails_gracefully() {
        let r = recognizer();
        let dir = tempfile::tempdir().unwrap();
        assert!(!r.train_static_model(dir.path()));
        assert!(!r.train_dynamic_model(dir.path()));
        assert_eq!(r.stats().training_failures, 2);
        assert_eq!(r.status().status, SystemStatus::Ready);
    }

    #[test]
    fn test_concurrent_training_is_refused() {
        let r = recognizer();
        let dir = tempfile::tempdir().unwrap();

        let held = r.training.lock().unwrap();
        assert_eq!(r.try_train_static_model(dir.path()), None);
        assert_eq!(r.try_train_dynamic_model(dir.path()), None);
        assert!(!r.train_static_model(dir.path()));
        // Refused runs are not counted as attempts
        assert_eq!(r.stats().training_runs, 0);
        assert_eq!(r.stats().training_failures, 0);
        drop(held);

        assert_eq!(r.try_train_static_model(dir.path()), Some(false));
    }
}
