//! Application configuration - every tunable as a TOML value
//!
//! Each section implements `Default` from `config::defaults`, so a missing
//! file or a missing key behaves exactly like the built-in constants.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{info, warn};

use super::defaults;
use crate::classifier::GateConfig;

/// Environment variable naming a config file.
pub const CONFIG_ENV: &str = "SIGNBRIDGE_CONFIG";

/// Config file looked up in the working directory.
pub const LOCAL_CONFIG_FILE: &str = "signbridge.toml";

// ============================================================================
// Top-Level Config
// ============================================================================

/// Root configuration.
///
/// Load with `AppConfig::load()` which searches:
/// 1. `$SIGNBRIDGE_CONFIG` env var
/// 2. `./signbridge.toml`
/// 3. Built-in defaults
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub server: ServerConfig,

    /// Hand landmark helper process
    #[serde(default)]
    pub landmarks: LandmarkConfig,

    /// Trained artifact locations
    #[serde(default)]
    pub models: ModelConfig,

    /// Buffer capacity and dynamic gates
    #[serde(default)]
    pub temporal: TemporalConfig,

    #[serde(default)]
    pub sessions: SessionConfig,

    #[serde(default)]
    pub training: TrainingConfig,
}

impl AppConfig {
    /// Load configuration using the standard search order:
    /// 1. `$SIGNBRIDGE_CONFIG` environment variable
    /// 2. `./signbridge.toml` in the current working directory
    /// 3. Built-in defaults
    pub fn load() -> Self {
        if let Ok(path) = std::env::var(CONFIG_ENV) {
            let p = PathBuf::from(&path);
            if p.exists() {
                match Self::load_from_file(&p) {
                    Ok(config) => {
                        info!(path = %p.display(), "Loaded config from SIGNBRIDGE_CONFIG");
                        return config;
                    }
                    Err(e) => {
                        warn!(path = %p.display(), error = %e, "Failed to load config from SIGNBRIDGE_CONFIG, falling back");
                    }
                }
            } else {
                warn!(path = %path, "SIGNBRIDGE_CONFIG points to non-existent file, falling back");
            }
        }

        let local = PathBuf::from(LOCAL_CONFIG_FILE);
        if local.exists() {
            match Self::load_from_file(&local) {
                Ok(config) => {
                    info!("Loaded config from ./signbridge.toml");
                    return config;
                }
                Err(e) => {
                    warn!(error = %e, "Failed to load ./signbridge.toml, using defaults");
                }
            }
        }

        info!("No signbridge.toml found, using built-in defaults");
        Self::default()
    }

    /// Load from a specific TOML file path.
    pub fn load_from_file(path: &Path) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)
            .map_err(|e| ConfigError::Io(path.to_path_buf(), e))?;
        Self::from_toml_str(&contents).map_err(|e| match e {
            ConfigError::Parse(_, inner) => ConfigError::Parse(path.to_path_buf(), inner),
            other => other,
        })
    }

    /// Parse and validate TOML text. Unknown keys are logged, not rejected.
    pub fn from_toml_str(contents: &str) -> Result<Self, ConfigError> {
        for w in super::validation::validate_unknown_keys(contents) {
            warn!("{}", w);
        }
        let config: Self = toml::from_str(contents)
            .map_err(|e| ConfigError::Parse(PathBuf::from("<inline>"), e))?;
        config.validate()?;
        Ok(config)
    }

    pub fn to_toml(&self) -> Result<String, ConfigError> {
        toml::to_string_pretty(self).map_err(ConfigError::Serialize)
    }

    pub fn save_to_file(&self, path: &Path) -> Result<(), ConfigError> {
        let contents = self.to_toml()?;
        std::fs::write(path, contents).map_err(|e| ConfigError::Io(path.to_path_buf(), e))?;
        info!(path = %path.display(), "Config saved");
        Ok(())
    }

    /// Check every section for values the pipeline cannot run with.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let mut errors: Vec<String> = Vec::new();
        let t = &self.temporal;

        if self.server.addr.parse::<std::net::SocketAddr>().is_err() {
            errors.push(format!("server.addr = '{}' is not a socket address", self.server.addr));
        }
        if self.server.max_body_bytes == 0 {
            errors.push("server.max_body_bytes must be > 0".to_string());
        }
        if self.landmarks.command.trim().is_empty() {
            errors.push("landmarks.command must not be empty".to_string());
        }
        if self.models.sequence_length == 0 {
            errors.push("models.sequence_length must be > 0".to_string());
        }
        if t.buffer_capacity == 0 {
            errors.push("temporal.buffer_capacity must be > 0".to_string());
        }
        if t.min_sequence_length == 0 || t.min_sequence_length > t.buffer_capacity {
            errors.push(format!(
                "temporal.min_sequence_length = {} must be in 1..={} (buffer_capacity)",
                t.min_sequence_length, t.buffer_capacity
            ));
        }
        Self::check_seconds(t.prediction_cooldown_secs, "temporal.prediction_cooldown_secs", &mut errors);
        Self::check_seconds(t.min_span_secs, "temporal.min_span_secs", &mut errors);
        if !(0.0..=1.0).contains(&t.dynamic_accept_confidence) {
            errors.push(format!(
                "temporal.dynamic_accept_confidence = {} must be in [0, 1]",
                t.dynamic_accept_confidence
            ));
        }
        if self.sessions.sweep_interval_secs == 0 {
            errors.push("sessions.sweep_interval_secs must be > 0".to_string());
        }

        let (range_errors, range_warnings) = super::validation::validate_ranges(self);
        errors.extend(range_errors);
        for w in &range_warnings {
            warn!("{}", w);
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(ConfigError::Validation(errors))
        }
    }

    fn check_seconds(value: f64, name: &str, errors: &mut Vec<String>) {
        // NaN comparisons silently pass, so check finiteness explicitly
        if !value.is_finite() || value < 0.0 {
            errors.push(format!("{name} = {value} must be a finite, non-negative number of seconds"));
        }
    }

    /// Dynamic classifier gates from the `[temporal]` section.
    pub const fn gate_config(&self) -> GateConfig {
        GateConfig {
            min_sequence_length: self.temporal.min_sequence_length,
            cooldown_secs: self.temporal.prediction_cooldown_secs,
            min_span_secs: self.temporal.min_span_secs,
        }
    }
}

// ============================================================================
// Error Type
// ============================================================================

#[derive(Debug)]
pub enum ConfigError {
    Io(PathBuf, std::io::Error),
    Parse(PathBuf, toml::de::Error),
    Serialize(toml::ser::Error),
    Validation(Vec<String>),
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigError::Io(path, e) => write!(f, "Config I/O error ({}): {}", path.display(), e),
            ConfigError::Parse(path, e) => {
                write!(f, "Config parse error ({}): {}", path.display(), e)
            }
            ConfigError::Serialize(e) => write!(f, "Config serialization error: {}", e),
            ConfigError::Validation(errors) => {
                writeln!(f, "Config validation failed:")?;
                for e in errors {
                    writeln!(f, "  - {}", e)?;
                }
                Ok(())
            }
        }
    }
}

impl std::error::Error for ConfigError {}

// ============================================================================
// Server
// ============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// HTTP server bind address.
    ///
    /// Can be overridden by `SIGNBRIDGE_SERVER_ADDR` env var or `--addr` CLI flag.
    #[serde(default = "default_server_addr")]
    pub addr: String,

    /// Request body limit in bytes.
    #[serde(default = "default_max_body_bytes")]
    pub max_body_bytes: usize,
}

fn default_server_addr() -> String {
    defaults::SERVER_ADDR.to_string()
}
const fn default_max_body_bytes() -> usize {
    defaults::MAX_BODY_BYTES
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            addr: default_server_addr(),
            max_body_bytes: default_max_body_bytes(),
        }
    }
}

// ============================================================================
// Landmark Backend
// ============================================================================

/// Command line of the hand landmark helper.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LandmarkConfig {
    #[serde(default = "default_landmark_command")]
    pub command: String,

    #[serde(default = "default_landmark_args")]
    pub args: Vec<String>,
}

fn default_landmark_command() -> String {
    defaults::LANDMARK_COMMAND.to_string()
}
fn default_landmark_args() -> Vec<String> {
    vec![defaults::LANDMARK_SCRIPT.to_string()]
}

impl Default for LandmarkConfig {
    fn default() -> Self {
        Self {
            command: default_landmark_command(),
            args: default_landmark_args(),
        }
    }
}

// ============================================================================
// Models
// ============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelConfig {
    #[serde(default = "default_static_path")]
    pub static_path: PathBuf,

    #[serde(default = "default_dynamic_path")]
    pub dynamic_path: PathBuf,

    /// Frames per resampled dynamic sequence
    #[serde(default = "default_sequence_length")]
    pub sequence_length: usize,
}

fn default_static_path() -> PathBuf {
    PathBuf::from(defaults::STATIC_MODEL_PATH)
}
fn default_dynamic_path() -> PathBuf {
    PathBuf::from(defaults::DYNAMIC_MODEL_PATH)
}
const fn default_sequence_length() -> usize {
    defaults::SEQUENCE_LENGTH
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            static_path: default_static_path(),
            dynamic_path: default_dynamic_path(),
            sequence_length: default_sequence_length(),
        }
    }
}

// ============================================================================
// Temporal
// ============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TemporalConfig {
    #[serde(default = "default_buffer_capacity")]
    pub buffer_capacity: usize,

    #[serde(default = "default_min_sequence_length")]
    pub min_sequence_length: usize,

    #[serde(default = "default_prediction_cooldown")]
    pub prediction_cooldown_secs: f64,

    #[serde(default = "default_min_span")]
    pub min_span_secs: f64,

    /// Dynamic results must be strictly above this to replace the static one
    #[serde(default = "default_dynamic_accept")]
    pub dynamic_accept_confidence: f64,
}

const fn default_buffer_capacity() -> usize {
    defaults::BUFFER_CAPACITY
}
const fn default_min_sequence_length() -> usize {
    defaults::MIN_SEQUENCE_LENGTH
}
const fn default_prediction_cooldown() -> f64 {
    defaults::PREDICTION_COOLDOWN_SECS
}
const fn default_min_span() -> f64 {
    defaults::MIN_SPAN_SECS
}
const fn default_dynamic_accept() -> f64 {
    defaults::DYNAMIC_ACCEPT_CONFIDENCE
}

impl Default for TemporalConfig {
    fn default() -> Self {
        Self {
            buffer_capacity: default_buffer_capacity(),
            min_sequence_length: default_min_sequence_length(),
            prediction_cooldown_secs: default_prediction_cooldown(),
            min_span_secs: default_min_span(),
            dynamic_accept_confidence: default_dynamic_accept(),
        }
    }
}

// ============================================================================
// Sessions
// ============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionConfig {
    #[serde(default = "default_idle_timeout")]
    pub idle_timeout_secs: u64,

    #[serde(default = "default_sweep_interval")]
    pub sweep_interval_secs: u64,
}

const fn default_idle_timeout() -> u64 {
    defaults::SESSION_IDLE_TIMEOUT_SECS
}
const fn default_sweep_interval() -> u64 {
    defaults::SESSION_SWEEP_INTERVAL_SECS
}

impl SessionConfig {
    pub const fn idle_timeout(&self) -> Duration {
        Duration::from_secs(self.idle_timeout_secs)
    }

    pub const fn sweep_interval(&self) -> Duration {
        Duration::from_secs(self.sweep_interval_secs)
    }
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            idle_timeout_secs: default_idle_timeout(),
            sweep_interval_secs: default_sweep_interval(),
        }
    }
}

// ============================================================================
// Training
// ============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrainingConfig {
    /// Root of `<gesture>/<session>_<millis>.png` samples
    #[serde(default = "default_training_dir")]
    pub data_dir: PathBuf,
}

fn default_training_dir() -> PathBuf {
    PathBuf::from(defaults::TRAINING_DATA_DIR)
}

impl Default for TrainingConfig {
    fn default() -> Self {
        Self {
            data_dir: default_training_dir(),
        }
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_valid() {
        let config = AppConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.server.addr, "0.0.0.0:5000");
        assert_eq!(config.temporal.buffer_capacity, 30);
        assert_eq!(config.temporal.min_sequence_length, 10);
        assert_eq!(config.models.sequence_length, 30);
        assert_eq!(config.landmarks.args, vec!["scripts/hand_landmarker.py"]);
    }

    #[test]
    fn test_partial_file_keeps_other_defaults() {
        let config = AppConfig::from_toml_str(
            r#"
[temporal]
min_sequence_length = 12

[models]
static_path = "/tmp/static.json"
"#,
        )
        .unwrap();
        assert_eq!(config.temporal.min_sequence_length, 12);
        assert_eq!(config.temporal.buffer_capacity, 30);
        assert_eq!(config.models.static_path, PathBuf::from("/tmp/static.json"));
        assert_eq!(config.models.dynamic_path, PathBuf::from(defaults::DYNAMIC_MODEL_PATH));
    }

    #[test]
    fn test_min_sequence_above_capacity_rejected() {
        let err = AppConfig::from_toml_str(
            r#"
[temporal]
buffer_capacity = 8
min_sequence_length = 10
"#,
        )
        .unwrap_err();
        match err {
            ConfigError::Validation(errors) => {
                assert!(errors.iter().any(|e| e.contains("min_sequence_length")));
            }
            other => panic!("expected validation error, got {other}"),
        }
    }

    #[test]
    fn test_validation_collects_every_error() {
        let mut config = AppConfig::default();
        config.temporal.buffer_capacity = 0;
        config.temporal.prediction_cooldown_secs = -1.0;
        config.temporal.min_span_secs = f64::NAN;
        config.temporal.dynamic_accept_confidence = 1.5;
        config.server.addr = "not-an-addr".into();

        let Err(ConfigError::Validation(errors)) = config.validate() else {
            panic!("expected validation failure");
        };
        assert!(errors.len() >= 5, "got {errors:?}");
    }

    #[test]
    fn test_gate_config_mirrors_temporal_section() {
        let mut config = AppConfig::default();
        config.temporal.min_sequence_length = 7;
        config.temporal.prediction_cooldown_secs = 1.25;
        let gates = config.gate_config();
        assert_eq!(gates.min_sequence_length, 7);
        assert_eq!(gates.cooldown_secs, 1.25);
        assert_eq!(gates.min_span_secs, 0.5);
    }

    #[test]
    fn test_toml_round_trip_through_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("signbridge.toml");
        let mut config = AppConfig::default();
        config.sessions.idle_timeout_secs = 42;
        config.save_to_file(&path).unwrap();

        let loaded = AppConfig::load_from_file(&path).unwrap();
        assert_eq!(loaded.sessions.idle_timeout(), Duration::from_secs(42));
    }

    #[test]
    fn test_parse_error_names_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("bad.toml");
        std::fs::write(&path, "[temporal\n").unwrap();
        let err = AppConfig::load_from_file(&path).unwrap_err();
        assert!(err.to_string().contains("bad.toml"));
    }
}
