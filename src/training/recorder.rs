//! Labelled frame recorder.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use chrono::Utc;

use super::TrainingError;
use crate::landmarks::Frame;

/// Normalize a gesture or session name for use as a path component.
///
/// Lowercases, turns whitespace into `_`, and drops everything outside
/// `[a-z0-9_-]`. Returns `None` when nothing is left.
pub fn sanitize_name(raw: &str) -> Option<String> {
    let cleaned: String = raw
        .trim()
        .to_lowercase()
        .chars()
        .filter_map(|c| match c {
            'a'..='z' | '0'..='9' | '_' | '-' => Some(c),
            c if c.is_whitespace() => Some('_'),
            _ => None,
        })
        .collect();
    if cleaned.is_empty() {
        None
    } else {
        Some(cleaned)
    }
}

#[derive(Debug, Clone)]
pub struct TrainingRecorder {
    data_dir: PathBuf,
}

impl TrainingRecorder {
    pub fn new(data_dir: impl Into<PathBuf>) -> Self {
        Self {
            data_dir: data_dir.into(),
        }
    }

    pub fn data_dir(&self) -> &Path {
        &self.data_dir
    }

    /// Save `frame` as `<data_dir>/<gesture>/<session>_<millis>.png`.
    pub fn record(&self, gesture: &str, session: &str, frame: Frame) -> Result<PathBuf, TrainingError> {
        let gesture = sanitize_name(gesture).ok_or_else(|| TrainingError::InvalidName(gesture.to_string()))?;
        let session = sanitize_name(session).ok_or_else(|| TrainingError::InvalidName(session.to_string()))?;

        let dir = self.data_dir.join(&gesture);
        std::fs::create_dir_all(&dir).map_err(|source| TrainingError::Io {
            path: dir.clone(),
            source,
        })?;

        // Two frames within the same millisecond must not overwrite each other
        let mut millis = Utc::now().timestamp_millis();
        let mut path = dir.join(format!("{session}_{millis}.png"));
        while path.exists() {
            millis += 1;
            path = dir.join(format!("{session}_{millis}.png"));
        }

        let img = frame.into_rgb_image()?;
        img.save_with_format(&path, image::ImageFormat::Png)
            .map_err(|source| TrainingError::Encode {
                path: path.clone(),
                source,
            })?;

        tracing::debug!(path = %path.display(), gesture = %gesture, "Recorded training sample");
        Ok(path)
    }

    /// Number of stored samples per gesture.
    pub fn sample_counts(&self) -> Result<BTreeMap<String, usize>, TrainingError> {
        Ok(super::collect_samples(&self.data_dir)?
            .into_iter()
            .map(|(label, files)| (label, files.len()))
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::landmarks::ColorOrder;

    fn frame() -> Frame {
        Frame::new(2, 2, vec![128; 12], ColorOrder::Rgb).unwrap()
    }

    #[test]
    fn test_sanitize_name() {
        assert_eq!(sanitize_name("Thank You").as_deref(), Some("thank_you"));
        assert_eq!(sanitize_name("  hello-1 ").as_deref(), Some("hello-1"));
        assert_eq!(sanitize_name("../../etc").as_deref(), Some("etc"));
        assert_eq!(sanitize_name("!!!"), None);
        assert_eq!(sanitize_name(""), None);
    }

    #[test]
    fn test_record_writes_png_under_gesture_dir() {
        let dir = tempfile::tempdir().unwrap();
        let rec = TrainingRecorder::new(dir.path());

        let path = rec.record("Hello", "Alice", frame()).unwrap();
        assert!(path.starts_with(dir.path().join("hello")));
        let name = path.file_name().unwrap().to_string_lossy().to_string();
        assert!(name.starts_with("alice_"));
        assert!(name.ends_with(".png"));

        let img = image::open(&path).unwrap();
        assert_eq!((img.width(), img.height()), (2, 2));
    }

    #[test]
    fn test_rapid_records_do_not_collide() {
        let dir = tempfile::tempdir().unwrap();
        let rec = TrainingRecorder::new(dir.path());
        let a = rec.record("wave", "s1", frame()).unwrap();
        let b = rec.record("wave", "s1", frame()).unwrap();
        assert_ne!(a, b);
        assert_eq!(rec.sample_counts().unwrap().get("wave"), Some(&2));
    }

    #[test]
    fn test_invalid_names_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let rec = TrainingRecorder::new(dir.path());
        assert!(matches!(
            rec.record("???", "s1", frame()),
            Err(TrainingError::InvalidName(_))
        ));
        assert!(matches!(
            rec.record("wave", "", frame()),
            Err(TrainingError::InvalidName(_))
        ));
    }
}
