//! Training Data and Model Fitting
//!
//! - `recorder`: stores labelled frames as PNG files under the data directory
//! - `trainer`: turns a directory of labelled frames into template artifacts
//!
//! Layout on disk: `<data_dir>/<gesture>/<session>_<millis>.png`. Dynamic
//! training treats all files of one gesture that share a session prefix as one
//! recorded sequence, ordered by file name.

pub mod recorder;
pub mod trainer;

pub use recorder::{sanitize_name, TrainingRecorder};
pub use trainer::{build_dynamic_artifact, build_static_artifact, collect_samples, TrainingSet};

use std::path::PathBuf;

use thiserror::Error;

use crate::landmarks::LandmarkError;
use crate::models::ModelError;

#[derive(Error, Debug)]
pub enum TrainingError {
    #[error("Invalid name '{0}': must contain at least one of [a-z0-9_-]")]
    InvalidName(String),

    #[error("I/O error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to encode sample {path}: {source}")]
    Encode {
        path: PathBuf,
        #[source]
        source: image::ImageError,
    },

    #[error(transparent)]
    Frame(#[from] LandmarkError),

    #[error(transparent)]
    Model(#[from] ModelError),

    #[error("No usable training samples under {0}")]
    NoSamples(PathBuf),
}
