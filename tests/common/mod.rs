//! Shared fixtures for the integration tests.

#![allow(dead_code)]

use std::path::Path;
use std::sync::Arc;

use signbridge::config::AppConfig;
use signbridge::landmarks::{ColorOrder, Frame, HandLandmarker, LandmarkError};
use signbridge::pipeline::Recognizer;
use signbridge::types::{Landmark, FINGERTIPS, NUM_LANDMARKS};

/// Scripted landmark backend driven by the first pixel.
///
/// Red 0 means no hand. Otherwise the wrist and knuckles sit at (0.5, 0.5)
/// and every fingertip is `red / 255` to the right, so the red channel
/// picks the pose: 77 is an open hand, 25 a closed fist.
pub struct PixelHand;

impl HandLandmarker for PixelHand {
    fn detect(&self, frame: &Frame) -> Result<Vec<Vec<Landmark>>, LandmarkError> {
        let red = frame.data()[0];
        if red == 0 {
            return Ok(vec![]);
        }
        let reach = f64::from(red) / 255.0;
        let mut hand = vec![[0.5, 0.5, 0.0]; NUM_LANDMARKS];
        for tip in FINGERTIPS {
            hand[tip] = [0.5 + reach, 0.5, 0.0];
        }
        Ok(vec![hand])
    }

    fn describe(&self) -> String {
        "pixel-hand".into()
    }
}

pub const OPEN_HAND: u8 = 77;
pub const FIST: u8 = 25;
pub const EMPTY: u8 = 0;

/// 1x1 RGB frame with the given red channel.
pub fn frame(red: u8) -> Frame {
    Frame::new(1, 1, vec![red, 0, 0], ColorOrder::Rgb).unwrap()
}

/// Config whose model artifacts live under `dir`.
pub fn config_in(dir: &Path) -> AppConfig {
    let mut config = AppConfig::default();
    config.models.static_path = dir.join("models/static.json");
    config.models.dynamic_path = dir.join("models/dynamic.json");
    config.training.data_dir = dir.join("training_data");
    config
}

pub fn recognizer_in(dir: &Path) -> Recognizer {
    Recognizer::initialize(&config_in(dir), Arc::new(PixelHand))
}
