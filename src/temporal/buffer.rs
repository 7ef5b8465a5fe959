//! Bounded temporal buffer of detected-hand frames.
//!
//! Keypoints and timestamps are stored together as one entry per frame, so
//! the two sequences always have the same length and index correspondence.
//! Appending past capacity evicts the oldest entry first.

use std::collections::VecDeque;

use crate::types::KeypointVector;

/// One buffered frame. `timestamp` is seconds on the caller's clock.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BufferedFrame {
    pub keypoints: KeypointVector,
    pub timestamp: f64,
}

/// FIFO ring of the most recent `capacity` detected-hand frames.
#[derive(Debug, Clone)]
pub struct TemporalBuffer {
    entries: VecDeque<BufferedFrame>,
    capacity: usize,
}

impl TemporalBuffer {
    /// Create an empty buffer. A capacity of 0 is treated as 1.
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            entries: VecDeque::with_capacity(capacity),
            capacity,
        }
    }

    /// Append a frame, evicting the oldest while over capacity.
    pub fn append(&mut self, keypoints: KeypointVector, now: f64) {
        self.entries.push_back(BufferedFrame {
            keypoints,
            timestamp: now,
        });
        while self.entries.len() > self.capacity {
            self.entries.pop_front();
        }
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub const fn capacity(&self) -> usize {
        self.capacity
    }

    /// Frames oldest first.
    pub fn frames(&self) -> impl Iterator<Item = &BufferedFrame> {
        self.entries.iter()
    }

    pub fn keypoints(&self) -> impl Iterator<Item = &KeypointVector> {
        self.entries.iter().map(|e| &e.keypoints)
    }

    pub fn timestamps(&self) -> impl Iterator<Item = f64> + '_ {
        self.entries.iter().map(|e| e.timestamp)
    }

    pub fn oldest_timestamp(&self) -> Option<f64> {
        self.entries.front().map(|e| e.timestamp)
    }

    pub fn newest_timestamp(&self) -> Option<f64> {
        self.entries.back().map(|e| e.timestamp)
    }

    /// `newest - oldest` in seconds; 0.0 when empty.
    pub fn span(&self) -> f64 {
        match (self.oldest_timestamp(), self.newest_timestamp()) {
            (Some(oldest), Some(newest)) => newest - oldest,
            _ => 0.0,
        }
    }

    /// Owned copy of the keypoint sequence, oldest first.
    pub fn sequence(&self) -> Vec<KeypointVector> {
        self.keypoints().copied().collect()
    }
}

impl Default for TemporalBuffer {
    fn default() -> Self {
        Self::new(crate::config::defaults::BUFFER_CAPACITY)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::KEYPOINT_LEN;

    fn frame(v: f64) -> KeypointVector {
        KeypointVector::from_array([v; KEYPOINT_LEN])
    }

    #[test]
    fn test_fifo_eviction_keeps_last_capacity_frames() {
        let mut buf = TemporalBuffer::new(30);
        for i in 0..35 {
            buf.append(frame(i as f64), i as f64 * 0.1);
        }

        assert_eq!(buf.len(), 30);
        let firsts: Vec<f64> = buf.keypoints().map(|k| k.as_slice()[0]).collect();
        let expected: Vec<f64> = (5..35).map(|i| i as f64).collect();
        assert_eq!(firsts, expected);

        // Timestamps stay aligned with keypoints
        for f in buf.frames() {
            assert_eq!(f.timestamp, f.keypoints.as_slice()[0] * 0.1);
        }
        assert_eq!(buf.timestamps().count(), buf.keypoints().count());
    }

    #[test]
    fn test_clear_empties_everything() {
        let mut buf = TemporalBuffer::new(5);
        for i in 0..5 {
            buf.append(frame(1.0), f64::from(i));
        }
        buf.clear();

        assert!(buf.is_empty());
        assert_eq!(buf.keypoints().count(), 0);
        assert_eq!(buf.timestamps().count(), 0);
        assert_eq!(buf.oldest_timestamp(), None);
        assert_eq!(buf.span(), 0.0);
        assert!(buf.sequence().is_empty());
    }

    #[test]
    fn test_span_is_newest_minus_oldest() {
        let mut buf = TemporalBuffer::new(3);
        buf.append(frame(0.0), 1.0);
        assert_eq!(buf.span(), 0.0);
        buf.append(frame(0.0), 1.25);
        buf.append(frame(0.0), 1.5);
        assert_eq!(buf.span(), 0.5);
        // Eviction moves the oldest timestamp forward
        buf.append(frame(0.0), 2.0);
        assert_eq!(buf.oldest_timestamp(), Some(1.25));
        assert_eq!(buf.span(), 0.75);
    }

    #[test]
    fn test_zero_capacity_is_treated_as_one() {
        let mut buf = TemporalBuffer::new(0);
        buf.append(frame(1.0), 0.0);
        buf.append(frame(2.0), 1.0);
        assert_eq!(buf.capacity(), 1);
        assert_eq!(buf.len(), 1);
        assert_eq!(buf.sequence()[0].as_slice()[0], 2.0);
    }
}
