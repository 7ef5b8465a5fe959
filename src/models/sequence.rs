//! Fixed-length resampling of keypoint sequences.
//!
//! Gesture sequences arrive with whatever length the temporal buffer held;
//! sequence models compare fixed-length inputs. Frames are linearly
//! interpolated by position (oldest = 0.0, newest = 1.0).

use crate::types::{KeypointVector, KEYPOINT_LEN};

/// Resample `sequence` to `frames` frames and flatten (frame-major).
///
/// Returns an empty vector when the input is empty or `frames` is 0.
pub fn resample(sequence: &[KeypointVector], frames: usize) -> Vec<f64> {
    if sequence.is_empty() || frames == 0 {
        return Vec::new();
    }

    let mut out = Vec::with_capacity(frames * KEYPOINT_LEN);
    let last = sequence.len() - 1;

    for i in 0..frames {
        // Position of output frame i in input index space
        let pos = if frames == 1 {
            last as f64
        } else {
            i as f64 * last as f64 / (frames - 1) as f64
        };
        let lo = pos.floor() as usize;
        let hi = (lo + 1).min(last);
        let t = pos - lo as f64;

        let a = sequence[lo].as_array();
        let b = sequence[hi].as_array();
        out.extend(a.iter().zip(b.iter()).map(|(x, y)| x + (y - x) * t));
    }

    out
}
