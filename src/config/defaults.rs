//! System-wide default constants.
//!
//! Every tunable in `signbridge.toml` takes its default from here. Grouped by
//! subsystem.

// ============================================================================
// Server
// ============================================================================

/// HTTP bind address. Overridden by `SIGNBRIDGE_SERVER_ADDR` or `--addr`.
pub const SERVER_ADDR: &str = "0.0.0.0:5000";

/// Maximum request body (bytes). Base64 frames are roughly 4/3 the image size.
pub const MAX_BODY_BYTES: usize = 10 * 1024 * 1024;

// ============================================================================
// Landmark Backend
// ============================================================================

pub const LANDMARK_COMMAND: &str = "python3";

pub const LANDMARK_SCRIPT: &str = "scripts/hand_landmarker.py";

// ============================================================================
// Models
// ============================================================================

pub const STATIC_MODEL_PATH: &str = "static/models/isl_model.json";

pub const DYNAMIC_MODEL_PATH: &str = "static/models/dynamic_model.json";

/// Frames every dynamic sequence is resampled to before inference.
pub const SEQUENCE_LENGTH: usize = 30;

// ============================================================================
// Temporal Buffer / Dynamic Gates
// ============================================================================

/// Frames kept per session. 30 frames at ~15 fps = 2 seconds of motion.
pub const BUFFER_CAPACITY: usize = 30;

/// Buffered frames required before a dynamic gesture is attempted.
pub const MIN_SEQUENCE_LENGTH: usize = 10;

/// Minimum seconds between successful dynamic attempts in one session.
pub const PREDICTION_COOLDOWN_SECS: f64 = 0.5;

/// Minimum seconds between oldest and newest buffered frame.
pub const MIN_SPAN_SECS: f64 = 0.5;

/// Dynamic results at or below this confidence are discarded.
pub const DYNAMIC_ACCEPT_CONFIDENCE: f64 = 0.5;

// ============================================================================
// Sessions
// ============================================================================

/// Sessions with no frame for this long are evicted (seconds).
pub const SESSION_IDLE_TIMEOUT_SECS: u64 = 300;

/// How often the idle-session sweeper runs (seconds).
pub const SESSION_SWEEP_INTERVAL_SECS: u64 = 60;

// ============================================================================
// Training
// ============================================================================

pub const TRAINING_DATA_DIR: &str = "static/training_data";
