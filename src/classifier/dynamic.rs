//! Dynamic gesture classifier over the temporal buffer.
//!
//! Three gates run in order before any classification happens:
//!
//! 1. buffer length >= `min_sequence_length`
//! 2. seconds since the session's last successful pass >= `cooldown_secs`
//! 3. buffer span (newest - oldest) >= `min_span_secs`
//!
//! Passing all three records `now` as the session's last success, whatever
//! the classification result turns out to be.

use std::sync::Arc;

use super::rules::classify_dynamic_rules;
use super::Classified;
use crate::models::{Classifier, ModelSlot, SequenceModel};
use crate::temporal::TemporalBuffer;
use crate::types::ResultSource;

/// Gate thresholds.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GateConfig {
    pub min_sequence_length: usize,
    pub cooldown_secs: f64,
    pub min_span_secs: f64,
}

impl Default for GateConfig {
    fn default() -> Self {
        use crate::config::defaults;
        Self {
            min_sequence_length: defaults::MIN_SEQUENCE_LENGTH,
            cooldown_secs: defaults::PREDICTION_COOLDOWN_SECS,
            min_span_secs: defaults::MIN_SPAN_SECS,
        }
    }
}

/// Per-session cooldown state. `None` until the first successful pass.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct GateState {
    last_success: Option<f64>,
}

impl GateState {
    pub const fn last_success(&self) -> Option<f64> {
        self.last_success
    }

    pub fn reset(&mut self) {
        self.last_success = None;
    }
}

/// Outcome of the gate checks.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum GateDecision {
    TooShort { len: usize, required: usize },
    CoolingDown { elapsed: f64, required: f64 },
    SpanTooShort { span: f64, required: f64 },
    Open,
}

impl GateDecision {
    pub const fn is_open(&self) -> bool {
        matches!(self, Self::Open)
    }
}

pub struct DynamicClassifier {
    gates: GateConfig,
    slot: ModelSlot<dyn SequenceModel>,
}

impl DynamicClassifier {
    pub fn new(gates: GateConfig, model: Option<Arc<dyn SequenceModel>>) -> Self {
        Self {
            gates,
            slot: ModelSlot::from_model(model),
        }
    }

    pub const fn gates(&self) -> &GateConfig {
        &self.gates
    }

    /// Evaluate the gates without touching any state.
    pub fn check_gates(&self, buffer: &TemporalBuffer, state: &GateState, now: f64) -> GateDecision {
        let len = buffer.len();
        if len < self.gates.min_sequence_length {
            return GateDecision::TooShort {
                len,
                required: self.gates.min_sequence_length,
            };
        }

        if let Some(last) = state.last_success {
            let elapsed = now - last;
            if elapsed < self.gates.cooldown_secs {
                return GateDecision::CoolingDown {
                    elapsed,
                    required: self.gates.cooldown_secs,
                };
            }
        }

        let span = buffer.span();
        if span < self.gates.min_span_secs {
            return GateDecision::SpanTooShort {
                span,
                required: self.gates.min_span_secs,
            };
        }

        GateDecision::Open
    }

    /// Run the gates and, if they open, classify the buffered sequence.
    ///
    /// Returns `None` when any gate is closed. That is an absence of a
    /// result, not an error.
    pub fn classify(&self, buffer: &TemporalBuffer, state: &mut GateState, now: f64) -> Option<Classified> {
        let decision = self.check_gates(buffer, state, now);
        if !decision.is_open() {
            tracing::trace!(?decision, "Dynamic gates closed");
            return None;
        }
        state.last_success = Some(now);

        if let Classifier::Trained(model) = self.slot.current().as_ref() {
            let sequence = buffer.sequence();
            match model.predict_sequence(&sequence) {
                Ok(result) => return Some(Classified::new(result, ResultSource::DynamicModel)),
                Err(e) => {
                    tracing::warn!(error = %e, model = %model.describe(), "Dynamic model inference failed, using rules");
                }
            }
        }

        Some(Classified::new(
            classify_dynamic_rules(buffer.len()),
            ResultSource::DynamicRules,
        ))
    }

    pub fn install(&self, model: Arc<dyn SequenceModel>) {
        tracing::info!(model = %model.describe(), "Installing dynamic model");
        self.slot.install(model);
    }

    pub fn is_trained(&self) -> bool {
        self.slot.is_trained()
    }

    pub fn describe(&self) -> String {
        match self.slot.current().as_ref() {
            Classifier::Trained(m) => m.describe(),
            Classifier::RuleBased => "dynamic length rules".to_string(),
        }
    }
}

impl std::fmt::Debug for DynamicClassifier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DynamicClassifier")
            .field("gates", &self.gates)
            .field("model", &self.describe())
            .finish()
    }
}
