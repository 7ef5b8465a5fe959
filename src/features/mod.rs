//! Hand Shape Feature Extraction
//!
//! Derives a fixed set of geometric features from a flattened keypoint
//! vector:
//! - 5 fingertip-to-wrist Euclidean distances (x, y, z)
//! - 4 angles between adjacent finger vectors from the wrist (x, y plane only)
//!
//! Inputs shorter than 63 values yield `None`, which classifiers read as
//! "cannot compute shape features".

use serde::{Deserialize, Serialize};

use crate::types::{
    Landmark, INDEX_TIP, KEYPOINT_LEN, MIDDLE_TIP, PINKY_TIP, RING_TIP, THUMB_TIP, WRIST,
};

/// Geometric shape features of one hand pose.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FeatureSet {
    pub thumb_dist: f64,
    pub index_dist: f64,
    pub middle_dist: f64,
    pub ring_dist: f64,
    pub pinky_dist: f64,
    /// Degrees, [0, 180]
    pub thumb_index_angle: f64,
    pub index_middle_angle: f64,
    pub middle_ring_angle: f64,
    pub ring_pinky_angle: f64,
}

impl FeatureSet {
    /// Compute features from a flat keypoint slice.
    ///
    /// Returns `None` when fewer than 63 values are supplied. Extra values
    /// beyond 63 are ignored.
    pub fn from_keypoints(keypoints: &[f64]) -> Option<Self> {
        if keypoints.len() < KEYPOINT_LEN {
            return None;
        }

        let point = |i: usize| -> Landmark {
            [keypoints[i * 3], keypoints[i * 3 + 1], keypoints[i * 3 + 2]]
        };

        let wrist = point(WRIST);
        let thumb = sub(point(THUMB_TIP), wrist);
        let index = sub(point(INDEX_TIP), wrist);
        let middle = sub(point(MIDDLE_TIP), wrist);
        let ring = sub(point(RING_TIP), wrist);
        let pinky = sub(point(PINKY_TIP), wrist);

        Some(Self {
            thumb_dist: norm(thumb),
            index_dist: norm(index),
            middle_dist: norm(middle),
            ring_dist: norm(ring),
            pinky_dist: norm(pinky),
            thumb_index_angle: angle_between(thumb, index),
            index_middle_angle: angle_between(index, middle),
            middle_ring_angle: angle_between(middle, ring),
            ring_pinky_angle: angle_between(ring, pinky),
        })
    }

    /// Fingertip distances in thumb-to-pinky order.
    pub const fn distances(&self) -> [f64; 5] {
        [
            self.thumb_dist,
            self.index_dist,
            self.middle_dist,
            self.ring_dist,
            self.pinky_dist,
        ]
    }

    pub const fn angles(&self) -> [f64; 4] {
        [
            self.thumb_index_angle,
            self.index_middle_angle,
            self.middle_ring_angle,
            self.ring_pinky_angle,
        ]
    }
}

fn sub(a: Landmark, b: Landmark) -> Landmark {
    [a[0] - b[0], a[1] - b[1], a[2] - b[2]]
}

fn norm(v: Landmark) -> f64 {
    (v[0] * v[0] + v[1] * v[1] + v[2] * v[2]).sqrt()
}

/// Angle in degrees between two vectors, projected onto the x,y plane.
///
/// Returns exactly 0.0 when either projected vector has zero length.
pub fn angle_between(a: Landmark, b: Landmark) -> f64 {
    let (ax, ay) = (a[0], a[1]);
    let (bx, by) = (b[0], b[1]);

    let dot = ax * bx + ay * by;
    let mag = ax.hypot(ay) * bx.hypot(by);
    if mag == 0.0 {
        return 0.0;
    }

    let cos = (dot / mag).clamp(-1.0, 1.0);
    cos.acos().to_degrees()
}
