//! Atomically swappable model slot.
//!
//! `Classifier<M>` is chosen once at startup: `Trained` if an artifact
//! loaded, `RuleBased` otherwise. Retraining replaces the whole value with a
//! single `ArcSwap::store`; readers that already loaded the previous `Arc`
//! finish their inference on it undisturbed.

use arc_swap::ArcSwap;
use std::sync::Arc;

/// A model-backed classifier or the deterministic rule fallback.
pub enum Classifier<M: ?Sized> {
    Trained(Arc<M>),
    RuleBased,
}

impl<M: ?Sized> Classifier<M> {
    pub fn is_trained(&self) -> bool {
        matches!(self, Classifier::Trained(_))
    }
}

impl<M: ?Sized> std::fmt::Debug for Classifier<M> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Classifier::Trained(_) => write!(f, "Trained"),
            Classifier::RuleBased => write!(f, "RuleBased"),
        }
    }
}

/// Lock-free holder for the active [`Classifier`].
pub struct ModelSlot<M: ?Sized> {
    inner: ArcSwap<Classifier<M>>,
}

impl<M: ?Sized> ModelSlot<M> {
    pub fn new(classifier: Classifier<M>) -> Self {
        Self {
            inner: ArcSwap::from_pointee(classifier),
        }
    }

    pub fn rule_based() -> Self {
        Self::new(Classifier::RuleBased)
    }

    pub fn from_model(model: Option<Arc<M>>) -> Self {
        match model {
            Some(m) => Self::new(Classifier::Trained(m)),
            None => Self::rule_based(),
        }
    }

    /// Snapshot of the current classifier.
    pub fn current(&self) -> Arc<Classifier<M>> {
        self.inner.load_full()
    }

    /// Atomically install a newly trained model.
    pub fn install(&self, model: Arc<M>) {
        self.inner.store(Arc::new(Classifier::Trained(model)));
    }

    pub fn is_trained(&self) -> bool {
        self.inner.load().is_trained()
    }
}

impl<M: ?Sized> std::fmt::Debug for ModelSlot<M> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ModelSlot")
            .field("classifier", &*self.inner.load())
            .finish()
    }
}
