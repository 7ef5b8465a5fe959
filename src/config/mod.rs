//! Application Configuration Module
//!
//! Every tunable of the recognizer and its HTTP surface, loaded from TOML.
//!
//! ## Loading Order
//!
//! 1. `SIGNBRIDGE_CONFIG` environment variable (path to TOML file)
//! 2. `signbridge.toml` in the current working directory
//! 3. Built-in defaults (`config::defaults`)
//!
//! ## Usage
//!
//! ```ignore
//! // In main():
//! config::init(AppConfig::load());
//!
//! // Anywhere else:
//! let capacity = config::get().temporal.buffer_capacity;
//! ```

mod app_config;
pub mod defaults;
pub mod validation;

pub use app_config::*;

use std::sync::OnceLock;

static APP_CONFIG: OnceLock<AppConfig> = OnceLock::new();

/// Initialize the global configuration. Later calls are ignored with a warning.
pub fn init(config: AppConfig) {
    if APP_CONFIG.set(config).is_err() {
        tracing::warn!("config::init() called more than once, ignoring");
    }
}

/// The global configuration, or the built-in defaults if `init()` has not run.
pub fn get() -> &'static AppConfig {
    APP_CONFIG.get_or_init(|| {
        tracing::warn!("config::get() called before config::init(), using defaults");
        AppConfig::default()
    })
}

/// Check whether the config has been initialized.
pub fn is_initialized() -> bool {
    APP_CONFIG.get().is_some()
}
