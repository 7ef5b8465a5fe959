//! Template fitting from labelled frames.
//!
//! Static: each frame with a detected hand contributes its 63-value keypoint
//! vector; the label's template is the mean vector.
//!
//! Dynamic: each session's frames (ordered by file name) form one sequence.
//! Sequences with at least `min_sequence_length` detected frames are resampled
//! to `sequence_length` frames; the label's template is the mean of its
//! resampled sequences.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use rayon::prelude::*;

use super::TrainingError;
use crate::landmarks::{Frame, LandmarkExtractor};
use crate::models::{resample, LabelTemplate, ModelArtifact, ModelKind};
use crate::types::{KeypointVector, KEYPOINT_LEN};

/// Sample files per label, both sorted.
pub type TrainingSet = BTreeMap<String, Vec<PathBuf>>;

const IMAGE_EXTENSIONS: &[&str] = &["png", "jpg", "jpeg", "webp"];

fn is_image(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| IMAGE_EXTENSIONS.contains(&e.to_ascii_lowercase().as_str()))
}

fn read_dir_sorted(dir: &Path) -> Result<Vec<PathBuf>, TrainingError> {
    let entries = std::fs::read_dir(dir).map_err(|source| TrainingError::Io {
        path: dir.to_path_buf(),
        source,
    })?;
    let mut paths: Vec<PathBuf> = entries.filter_map(|e| e.ok().map(|e| e.path())).collect();
    paths.sort();
    Ok(paths)
}

/// List `<dir>/<label>/<image>` files. A missing directory is an empty set.
pub fn collect_samples(dir: &Path) -> Result<TrainingSet, TrainingError> {
    let mut set = TrainingSet::new();
    if !dir.exists() {
        return Ok(set);
    }
    for label_dir in read_dir_sorted(dir)?.into_iter().filter(|p| p.is_dir()) {
        let Some(label) = label_dir.file_name().and_then(|n| n.to_str()).map(str::to_string) else {
            continue;
        };
        let files: Vec<PathBuf> = read_dir_sorted(&label_dir)?
            .into_iter()
            .filter(|p| p.is_file() && is_image(p))
            .collect();
        if !files.is_empty() {
            set.insert(label, files);
        }
    }
    Ok(set)
}

/// Session prefix of a sample file: the stem up to its last `_`.
fn session_of(path: &Path) -> String {
    let stem = path.file_stem().and_then(|s| s.to_str()).unwrap_or_default();
    stem.rsplit_once('_').map_or(stem, |(session, _)| session).to_string()
}

fn load_keypoints(extractor: &LandmarkExtractor, path: &Path) -> Option<KeypointVector> {
    let img = match image::open(path) {
        Ok(img) => img,
        Err(e) => {
            tracing::warn!(path = %path.display(), error = %e, "Skipping unreadable training image");
            return None;
        }
    };
    let frame = match Frame::from_rgb_image(img.to_rgb8()) {
        Ok(f) => f,
        Err(e) => {
            tracing::warn!(path = %path.display(), error = %e, "Skipping invalid training image");
            return None;
        }
    };
    let detection = extractor.extract(&frame);
    detection.hand_detected.then_some(detection.keypoints)
}

fn mean_of<'a>(rows: impl IntoIterator<Item = &'a [f64]>, len: usize) -> (Vec<f64>, usize) {
    let mut sum = vec![0.0; len];
    let mut count = 0usize;
    for row in rows {
        for (acc, v) in sum.iter_mut().zip(row) {
            *acc += v;
        }
        count += 1;
    }
    if count > 0 {
        let n = count as f64;
        for v in &mut sum {
            *v /= n;
        }
    }
    (sum, count)
}

/// Fit a static template artifact from `<dir>/<label>/*`.
pub fn build_static_artifact(extractor: &LandmarkExtractor, dir: &Path) -> Result<ModelArtifact, TrainingError> {
    let set = collect_samples(dir)?;
    let mut templates = Vec::new();

    for (label, files) in &set {
        let vectors: Vec<KeypointVector> = files
            .par_iter()
            .filter_map(|path| load_keypoints(extractor, path))
            .collect();
        if vectors.is_empty() {
            tracing::warn!(label = %label, files = files.len(), "No hand detected in any sample, skipping label");
            continue;
        }
        let (mean, samples) = mean_of(vectors.iter().map(KeypointVector::as_slice), KEYPOINT_LEN);
        tracing::info!(label = %label, samples, "Fitted static template");
        templates.push(LabelTemplate::new(label.clone(), mean, samples));
    }

    if templates.is_empty() {
        return Err(TrainingError::NoSamples(dir.to_path_buf()));
    }
    Ok(ModelArtifact::new(ModelKind::Static, KEYPOINT_LEN, templates))
}

/// Fit a dynamic template artifact from per-session frame sequences.
pub fn build_dynamic_artifact(
    extractor: &LandmarkExtractor,
    dir: &Path,
    min_sequence_length: usize,
    sequence_length: usize,
) -> Result<ModelArtifact, TrainingError> {
    let set = collect_samples(dir)?;
    let input_len = sequence_length * KEYPOINT_LEN;
    let mut templates = Vec::new();

    for (label, files) in &set {
        let mut sessions: BTreeMap<String, Vec<&PathBuf>> = BTreeMap::new();
        for path in files {
            sessions.entry(session_of(path)).or_default().push(path);
        }

        let mut sequences: Vec<Vec<f64>> = Vec::new();
        for (session, frames) in &sessions {
            // Ordered parallel map keeps the frame order intact
            let detected: Vec<KeypointVector> = frames
                .par_iter()
                .map(|path| load_keypoints(extractor, path))
                .collect::<Vec<_>>()
                .into_iter()
                .flatten()
                .collect();
            if detected.len() < min_sequence_length {
                tracing::debug!(
                    label = %label,
                    session = %session,
                    detected = detected.len(),
                    required = min_sequence_length,
                    "Sequence too short, skipping"
                );
                continue;
            }
            sequences.push(resample(&detected, sequence_length));
        }

        if sequences.is_empty() {
            tracing::warn!(label = %label, sessions = sessions.len(), "No usable sequence, skipping label");
            continue;
        }
        let (mean, samples) = mean_of(sequences.iter().map(Vec::as_slice), input_len);
        tracing::info!(label = %label, sequences = samples, "Fitted dynamic template");
        templates.push(LabelTemplate::new(label.clone(), mean, samples));
    }

    if templates.is_empty() {
        return Err(TrainingError::NoSamples(dir.to_path_buf()));
    }
    Ok(ModelArtifact::new(ModelKind::Dynamic, input_len, templates))
}
