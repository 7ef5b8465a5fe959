//! Config validation: unknown-key detection with Levenshtein suggestions
//! and range checks.
//!
//! Two-pass parse approach: first deserialize raw TOML into `toml::Value`,
//! walk the key tree, compare against known field names, and emit warnings
//! with "did you mean?" suggestions. Then proceed with normal serde
//! deserialization. Warnings never break existing configs.

use std::collections::HashSet;

/// A non-fatal config warning (typo, suspicious value).
#[derive(Debug, Clone)]
pub struct ValidationWarning {
    pub field: String,
    pub message: String,
    pub suggestion: Option<String>,
}

impl std::fmt::Display for ValidationWarning {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.message)?;
        if let Some(ref s) = self.suggestion {
            write!(f, " (did you mean '{s}'?)")?;
        }
        Ok(())
    }
}

// ============================================================================
// Known Config Keys
// ============================================================================

/// Returns the complete set of valid dotted key paths for AppConfig.
///
/// Maintained by hand to match the struct hierarchy in app_config.rs.
pub fn known_config_keys() -> HashSet<&'static str> {
    let keys: &[&str] = &[
        // [server]
        "server",
        "server.addr",
        "server.max_body_bytes",
        // [landmarks]
        "landmarks",
        "landmarks.command",
        "landmarks.args",
        // [models]
        "models",
        "models.static_path",
        "models.dynamic_path",
        "models.sequence_length",
        // [temporal]
        "temporal",
        "temporal.buffer_capacity",
        "temporal.min_sequence_length",
        "temporal.prediction_cooldown_secs",
        "temporal.min_span_secs",
        "temporal.dynamic_accept_confidence",
        // [sessions]
        "sessions",
        "sessions.idle_timeout_secs",
        "sessions.sweep_interval_secs",
        // [training]
        "training",
        "training.data_dir",
    ];
    keys.iter().copied().collect()
}

// ============================================================================
// TOML Key Walking
// ============================================================================

/// Recursively walks a `toml::Value` tree and collects all dotted key paths.
///
/// For example, a table `{ a = { b = 1, c = 2 } }` yields:
/// `["a", "a.b", "a.c"]`
pub fn walk_toml_keys(value: &toml::Value, prefix: &str) -> Vec<String> {
    let mut keys = Vec::new();
    if let Some(table) = value.as_table() {
        for (k, v) in table {
            let path = if prefix.is_empty() {
                k.clone()
            } else {
                format!("{prefix}.{k}")
            };
            keys.push(path.clone());
            if v.is_table() {
                keys.extend(walk_toml_keys(v, &path));
            }
        }
    }
    keys
}

// ============================================================================
// Levenshtein Distance
// ============================================================================

fn levenshtein(a: &str, b: &str) -> usize {
    let a: Vec<char> = a.chars().collect();
    let b: Vec<char> = b.chars().collect();
    if a.is_empty() {
        return b.len();
    }
    if b.is_empty() {
        return a.len();
    }

    let mut prev: Vec<usize> = (0..=b.len()).collect();
    let mut curr = vec![0; b.len() + 1];

    for (i, ca) in a.iter().enumerate() {
        curr[0] = i + 1;
        for (j, cb) in b.iter().enumerate() {
            let cost = usize::from(ca != cb);
            curr[j + 1] = (prev[j + 1] + 1).min(curr[j] + 1).min(prev[j] + cost);
        }
        std::mem::swap(&mut prev, &mut curr);
    }

    prev[b.len()]
}

/// Suggest the closest known key for an unknown key, if within edit distance 3.
/// Ties go to the alphabetically first key so the suggestion is stable.
pub fn suggest_correction(unknown: &str, known: &HashSet<&str>) -> Option<String> {
    known
        .iter()
        .map(|&k| (levenshtein(unknown, k), k))
        .filter(|(d, _)| *d <= 3)
        .min()
        .map(|(_, k)| k.to_string())
}

// ============================================================================
// Unknown Key Validation (entry point)
// ============================================================================

/// Parse a raw TOML string and return warnings for any unknown config keys.
///
/// Never fails on unknown keys. Parse errors are left to serde.
pub fn validate_unknown_keys(raw_toml: &str) -> Vec<ValidationWarning> {
    let Ok(value) = raw_toml.parse::<toml::Value>() else {
        return Vec::new();
    };

    let known = known_config_keys();
    walk_toml_keys(&value, "")
        .into_iter()
        .filter(|key| !known.contains(key.as_str()))
        .map(|key| ValidationWarning {
            suggestion: suggest_correction(&key, &known),
            message: format!("Unknown config key '{key}'"),
            field: key,
        })
        .collect()
}

// ============================================================================
// Range Validation
// ============================================================================

/// Range checks on a parsed AppConfig.
///
/// Returns (errors, warnings): errors must prevent startup; warnings are
/// suspicious but workable.
pub fn validate_ranges(config: &super::AppConfig) -> (Vec<String>, Vec<ValidationWarning>) {
    let mut errors = Vec::new();
    let mut warnings = Vec::new();
    let t = &config.temporal;

    // A sequence model resamples to this many frames; beyond a few seconds
    // of video the template means stop being meaningful
    if config.models.sequence_length > 1_000 {
        errors.push(format!(
            "models.sequence_length = {} is unreasonably large (max 1000)",
            config.models.sequence_length
        ));
    }

    if t.buffer_capacity > 10_000 {
        errors.push(format!(
            "temporal.buffer_capacity = {} is unreasonably large (max 10000)",
            t.buffer_capacity
        ));
    }

    if t.min_span_secs > 10.0 {
        warnings.push(ValidationWarning {
            field: "temporal.min_span_secs".to_string(),
            message: format!(
                "min_span_secs = {:.2} exceeds 10 s; dynamic gestures may never fire",
                t.min_span_secs
            ),
            suggestion: None,
        });
    }

    if t.dynamic_accept_confidence >= 1.0 {
        warnings.push(ValidationWarning {
            field: "temporal.dynamic_accept_confidence".to_string(),
            message: "dynamic_accept_confidence >= 1.0 rejects every dynamic result".to_string(),
            suggestion: None,
        });
    }

    if config.sessions.idle_timeout_secs < config.sessions.sweep_interval_secs {
        warnings.push(ValidationWarning {
            field: "sessions.idle_timeout_secs".to_string(),
            message: format!(
                "idle_timeout_secs ({}) is shorter than sweep_interval_secs ({}); sessions live up to one sweep longer",
                config.sessions.idle_timeout_secs, config.sessions.sweep_interval_secs
            ),
            suggestion: None,
        });
    }

    (errors, warnings)
}

// ============================================================================
// Tests
// ============================================================================
