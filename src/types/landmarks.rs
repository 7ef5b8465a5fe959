//! Hand landmark types: KeypointVector, DetectionResult, landmark indices

use serde::{Deserialize, Serialize};

// ============================================================================
// Hand Landmark Layout
// ============================================================================

/// Number of tracked landmarks on one hand.
pub const NUM_LANDMARKS: usize = 21;

/// Scalars per landmark (x, y, z).
pub const COORDS_PER_LANDMARK: usize = 3;

/// Length of a flattened keypoint vector (21 x 3).
pub const KEYPOINT_LEN: usize = NUM_LANDMARKS * COORDS_PER_LANDMARK;

pub const WRIST: usize = 0;
pub const THUMB_TIP: usize = 4;
pub const INDEX_TIP: usize = 8;
pub const MIDDLE_TIP: usize = 12;
pub const RING_TIP: usize = 16;
pub const PINKY_TIP: usize = 20;

/// Fingertip landmark indices, thumb first.
pub const FINGERTIPS: [usize; 5] = [THUMB_TIP, INDEX_TIP, MIDDLE_TIP, RING_TIP, PINKY_TIP];

/// A single 3-D landmark in normalized image coordinates.
pub type Landmark = [f64; COORDS_PER_LANDMARK];

// ============================================================================
// KeypointVector
// ============================================================================

/// 21 hand landmarks flattened to exactly 63 scalars.
///
/// The fixed-size array makes the length invariant part of the type: a frame
/// without a hand is the all-zero vector, never a shorter one.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct KeypointVector([f64; KEYPOINT_LEN]);

impl KeypointVector {
    /// All-zero vector used when no hand is detected.
    pub const fn zeros() -> Self {
        Self([0.0; KEYPOINT_LEN])
    }

    pub const fn from_array(values: [f64; KEYPOINT_LEN]) -> Self {
        Self(values)
    }

    /// Flatten a list of landmarks. Returns `None` unless exactly 21 are given.
    pub fn from_landmarks(points: &[Landmark]) -> Option<Self> {
        if points.len() != NUM_LANDMARKS {
            return None;
        }
        let mut values = [0.0; KEYPOINT_LEN];
        for (i, p) in points.iter().enumerate() {
            values[i * COORDS_PER_LANDMARK..(i + 1) * COORDS_PER_LANDMARK].copy_from_slice(p);
        }
        Some(Self(values))
    }

    pub fn as_slice(&self) -> &[f64] {
        &self.0
    }

    pub const fn as_array(&self) -> &[f64; KEYPOINT_LEN] {
        &self.0
    }

    /// Landmark `index` as (x, y, z).
    pub fn point(&self, index: usize) -> Landmark {
        let start = index * COORDS_PER_LANDMARK;
        [self.0[start], self.0[start + 1], self.0[start + 2]]
    }

    pub fn is_zero(&self) -> bool {
        self.0.iter().all(|v| *v == 0.0)
    }
}

impl Default for KeypointVector {
    fn default() -> Self {
        Self::zeros()
    }
}

// serde has no impls for [f64; 63]; go through a Vec and check the length.
impl Serialize for KeypointVector {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.0.as_slice().serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for KeypointVector {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let values = Vec::<f64>::deserialize(deserializer)?;
        let array: [f64; KEYPOINT_LEN] = values.try_into().map_err(|v: Vec<f64>| {
            serde::de::Error::invalid_length(v.len(), &"63 keypoint values")
        })?;
        Ok(Self(array))
    }
}

// ============================================================================
// DetectionResult
// ============================================================================

/// Per-frame output of the landmark extractor. Never persisted.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DetectionResult {
    pub keypoints: KeypointVector,
    pub hand_detected: bool,
}

impl DetectionResult {
    pub const fn detected(keypoints: KeypointVector) -> Self {
        Self {
            keypoints,
            hand_detected: true,
        }
    }

    /// The "no hand" outcome: zero vector, `hand_detected = false`.
    pub const fn no_hand() -> Self {
        Self {
            keypoints: KeypointVector::zeros(),
            hand_detected: false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_zeros_has_fixed_length() {
        let kp = KeypointVector::zeros();
        assert_eq!(kp.as_slice().len(), KEYPOINT_LEN);
        assert!(kp.is_zero());
    }

    #[test]
    fn test_from_landmarks_requires_21_points() {
        let points = vec![[0.1, 0.2, 0.3]; 20];
        assert!(KeypointVector::from_landmarks(&points).is_none());

        let mut points = vec![[0.0, 0.0, 0.0]; NUM_LANDMARKS];
        points[INDEX_TIP] = [0.5, 0.25, -0.1];
        let kp = KeypointVector::from_landmarks(&points).expect("21 points");
        assert_eq!(kp.point(INDEX_TIP), [0.5, 0.25, -0.1]);
        assert_eq!(kp.as_slice()[INDEX_TIP * 3 + 1], 0.25);
    }

    #[test]
    fn test_deserialize_rejects_wrong_length() {
        let short = serde_json::to_string(&vec![0.0_f64; 62]).unwrap();
        assert!(serde_json::from_str::<KeypointVector>(&short).is_err());

        let exact = serde_json::to_string(&vec![0.5_f64; 63]).unwrap();
        let kp: KeypointVector = serde_json::from_str(&exact).unwrap();
        assert_eq!(kp.as_slice()[62], 0.5);
    }

    #[test]
    fn test_no_hand_is_zero_and_not_detected() {
        let det = DetectionResult::no_hand();
        assert!(!det.hand_detected);
        assert!(det.keypoints.is_zero());
    }
}
